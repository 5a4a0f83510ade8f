//! Locate the preload library and the command to run.

use anyhow::{bail, Context, Result};
use log::debug;
use pdftrace_common::PRELOAD_LIBRARY_NAME;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// The command could not be resolved to an executable file
#[derive(Debug, thiserror::Error)]
#[error("{0}: command not found")]
pub struct CommandNotFound(pub String);

/// Places searched for the preload library, in order.
///
/// The working directory first, then next to the launcher itself, then
/// `$HOME/bin`.
#[must_use]
pub fn library_candidates(cwd: &Path, exe_dir: Option<&Path>, home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![cwd.join(PRELOAD_LIBRARY_NAME)];
    if let Some(dir) = exe_dir {
        candidates.push(dir.join(PRELOAD_LIBRARY_NAME));
    }
    if let Some(home) = home {
        candidates.push(home.join("bin").join(PRELOAD_LIBRARY_NAME));
    }
    candidates
}

/// Resolve the preload library to an absolute path.
///
/// An explicit path must exist; otherwise the first existing candidate wins.
///
/// # Errors
/// Returns error if no library is found.
pub fn find_library(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return fs::canonicalize(path)
            .with_context(|| format!("Preload library not found: {}", path.display()));
    }

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let exe = std::env::current_exe().ok();
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let candidates =
        library_candidates(&cwd, exe.as_deref().and_then(Path::parent), home.as_deref());
    first_existing(&candidates)
}

fn first_existing(candidates: &[PathBuf]) -> Result<PathBuf> {
    for candidate in candidates {
        if candidate.is_file() {
            debug!("Using preload library {}", candidate.display());
            return fs::canonicalize(candidate)
                .with_context(|| format!("Cannot resolve {}", candidate.display()));
        }
    }
    let searched: Vec<String> =
        candidates.iter().map(|c| format!("  {}", c.display())).collect();
    bail!(
        "{PRELOAD_LIBRARY_NAME} not found. Searched:\n{}\n\n\
         Build it with: cargo xtask build-preload\n\
         or pass --library <PATH>",
        searched.join("\n")
    )
}

/// Resolve `program` the way a shell would.
///
/// Names containing `/` are taken as paths; anything else is looked up in
/// the directories of `path_var`.
///
/// # Errors
/// Returns [`CommandNotFound`] if nothing executable matches.
pub fn resolve_command(program: &OsStr, path_var: Option<&OsStr>) -> Result<PathBuf, CommandNotFound> {
    let not_found = || CommandNotFound(program.to_string_lossy().into_owned());

    if program.as_bytes().contains(&b'/') {
        let path = PathBuf::from(program);
        return if is_executable(&path) { Ok(path) } else { Err(not_found()) };
    }
    if program.is_empty() {
        return Err(not_found());
    }

    let path_var = path_var.ok_or_else(not_found)?;
    std::env::split_paths(path_var)
        .map(|dir| if dir.as_os_str().is_empty() { PathBuf::from(".") } else { dir })
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(not_found)
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn make_file(path: &Path, mode: u32) {
        fs::write(path, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_candidate_order() {
        let candidates = library_candidates(
            Path::new("/work"),
            Some(Path::new("/opt/pdftrace")),
            Some(Path::new("/home/user")),
        );
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/work/libpdftrace_preload.so"),
                PathBuf::from("/opt/pdftrace/libpdftrace_preload.so"),
                PathBuf::from("/home/user/bin/libpdftrace_preload.so"),
            ]
        );
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("a").join(PRELOAD_LIBRARY_NAME);
        let present = dir.path().join(PRELOAD_LIBRARY_NAME);
        fs::write(&present, b"").unwrap();

        let found = first_existing(&[missing, present.clone()]).unwrap();
        assert_eq!(found, fs::canonicalize(present).unwrap());
    }

    #[test]
    fn test_no_candidate_lists_search() {
        let err = first_existing(&[PathBuf::from("/nonexistent/libpdftrace_preload.so")])
            .unwrap_err()
            .to_string();
        assert!(err.contains("not found"));
        assert!(err.contains("/nonexistent/libpdftrace_preload.so"));
    }

    #[test]
    fn test_explicit_library_must_exist() {
        assert!(find_library(Some(Path::new("/nonexistent/lib.so"))).is_err());
    }

    #[test]
    fn test_resolve_on_path() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(&first.path().join("viewer"), 0o644);
        make_file(&second.path().join("viewer"), 0o755);

        let path_var = std::env::join_paths([first.path(), second.path()]).unwrap();
        let found = resolve_command(OsStr::new("viewer"), Some(&path_var)).unwrap();
        assert_eq!(found, second.path().join("viewer"));
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("render");
        make_file(&script, 0o755);

        let found = resolve_command(script.as_os_str(), None).unwrap();
        assert_eq!(found, script);
    }

    #[test]
    fn test_command_not_found() {
        let path_var = OsString::from("/nonexistent");
        let err = resolve_command(OsStr::new("no-such-viewer"), Some(&path_var)).unwrap_err();
        assert_eq!(err.to_string(), "no-such-viewer: command not found");
        assert!(resolve_command(OsStr::new("viewer"), None).is_err());
    }
}
