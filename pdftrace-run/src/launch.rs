//! Environment handed to the traced command.

use pdftrace_common::{ENV_GRANULARITY, ENV_NO_TERMINAL, ENV_SUFFIX};
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::cli::Args;

pub const ENV_PRELOAD: &str = "LD_PRELOAD";

/// `LD_PRELOAD` value with `library` in front of any existing entries.
///
/// An existing entry naming the same library is dropped so it is not
/// loaded twice.
#[must_use]
pub fn preload_value(library: &Path, existing: Option<&OsStr>) -> OsString {
    let mut value = OsString::from(library.as_os_str());
    let Some(existing) = existing else {
        return value;
    };
    let library = library.as_os_str().as_bytes();
    for entry in existing.as_bytes().split(|b| *b == b':' || *b == b' ') {
        if entry.is_empty() || entry == library {
            continue;
        }
        value.push(":");
        value.push(OsStr::from_bytes(entry));
    }
    value
}

/// Configuration variables derived from the command line
#[must_use]
pub fn trace_env(args: &Args) -> Vec<(&'static str, OsString)> {
    let mut env = Vec::new();
    if let Some(granularity) = args.granularity {
        env.push((ENV_GRANULARITY, OsString::from(granularity.to_string())));
    }
    if let Some(suffix) = &args.suffix {
        env.push((ENV_SUFFIX, OsString::from(suffix)));
    }
    if args.no_terminal {
        env.push((ENV_NO_TERMINAL, OsString::from("1")));
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_preload_alone() {
        assert_eq!(preload_value(Path::new("/lib/a.so"), None), "/lib/a.so");
    }

    #[test]
    fn test_preload_prepends_and_dedups() {
        let existing = OsStr::new("/lib/b.so /lib/a.so:/lib/c.so");
        assert_eq!(
            preload_value(Path::new("/lib/a.so"), Some(existing)),
            "/lib/a.so:/lib/b.so:/lib/c.so"
        );
        assert_eq!(preload_value(Path::new("/lib/a.so"), Some(OsStr::new(""))), "/lib/a.so");
    }

    #[test]
    fn test_trace_env() {
        let args = Args::try_parse_from([
            "pdftrace-run",
            "--granularity",
            "128",
            "--suffix",
            ".PDF",
            "--no-terminal",
            "viewer",
        ])
        .unwrap();
        assert_eq!(
            trace_env(&args),
            vec![
                (ENV_GRANULARITY, OsString::from("128")),
                (ENV_SUFFIX, OsString::from(".PDF")),
                (ENV_NO_TERMINAL, OsString::from("1")),
            ]
        );

        let plain = Args::try_parse_from(["pdftrace-run", "viewer"]).unwrap();
        assert!(trace_env(&plain).is_empty());
    }
}
