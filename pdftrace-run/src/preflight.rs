//! Pre-flight checks for pdftrace-run
//!
//! `LD_PRELOAD` fails quietly: a wrong library, a library built for another
//! architecture or a statically linked command all run untraced with at most
//! a loader warning. These checks turn each case into a clear error before
//! anything is executed.

use anyhow::{bail, Context, Result};
use log::debug;
use object::{Architecture, Object, ObjectKind, ObjectSymbol};
use pdftrace_common::PROBE_SYMBOL;
use std::path::Path;

/// Run all pre-flight checks before executing the command
pub fn run_preflight_checks(library: &Path, command: &Path) -> Result<()> {
    let library_arch = check_library(library)?;
    if let Some(command_arch) = check_dynamically_linked(command)? {
        check_same_architecture(library_arch, command_arch, command)?;
    }
    Ok(())
}

/// Check that the library is a shared object exporting the probe symbol
fn check_library(path: &Path) -> Result<Architecture> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read preload library: {}", path.display()))?;

    let Ok(obj) = object::File::parse(&*data) else {
        bail!("Not an ELF file: {}\n\n--library must point to {}", path.display(), library_hint());
    };
    if obj.kind() != ObjectKind::Dynamic {
        bail!("Not a shared object: {}\n\n--library must point to {}", path.display(), library_hint());
    }

    let probe = probe_name();
    let exports_probe = obj
        .dynamic_symbols()
        .any(|symbol| symbol.is_definition() && symbol.name_bytes().is_ok_and(|name| name == probe));
    if !exports_probe {
        bail!(
            "{} does not export `{}`.\n\n\
             This is not a pdftrace preload library (or an incompatible version).",
            path.display(),
            String::from_utf8_lossy(probe)
        );
    }

    Ok(obj.architecture())
}

/// Check that the command goes through the dynamic loader.
///
/// Returns the command's architecture, or `None` for non-ELF commands such
/// as scripts, which are left to the kernel.
fn check_dynamically_linked(path: &Path) -> Result<Option<Architecture>> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read command: {}", path.display()))?;

    let Ok(obj) = object::File::parse(&*data) else {
        debug!("{} is not ELF, skipping linkage check", path.display());
        return Ok(None);
    };

    if obj.section_by_name(".interp").is_none() {
        bail!(
            "{} is statically linked.\n\n\
             Preloading has no effect on it; use a dynamically linked build.",
            path.display()
        );
    }
    Ok(Some(obj.architecture()))
}

fn check_same_architecture(library: Architecture, command: Architecture, path: &Path) -> Result<()> {
    if library != command {
        bail!(
            "Architecture mismatch: preload library is {library:?}, {} is {command:?}",
            path.display()
        );
    }
    Ok(())
}

fn probe_name() -> &'static [u8] {
    PROBE_SYMBOL.strip_suffix(b"\0").unwrap_or(PROBE_SYMBOL)
}

fn library_hint() -> &'static str {
    "libpdftrace_preload.so (build it with: cargo xtask build-preload)"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_probe_name_has_no_terminator() {
        assert_eq!(probe_name(), b"pdftrace");
    }

    #[test]
    fn test_library_not_found() {
        let err = check_library(Path::new("/nonexistent/libpdftrace_preload.so"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("Failed to read preload library"));
    }

    #[test]
    fn test_library_not_elf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a library").unwrap();
        let err = check_library(file.path()).unwrap_err().to_string();
        assert!(err.contains("Not an ELF file"));
    }

    #[test]
    fn test_executable_is_not_a_preload_library() {
        // The test binary is ELF but does not export the probe
        let exe = std::env::current_exe().unwrap();
        assert!(check_library(&exe).is_err());
    }

    #[test]
    fn test_script_skips_linkage_check() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"#!/bin/sh\nexec true\n").unwrap();
        assert!(check_dynamically_linked(file.path()).unwrap().is_none());
    }

    #[test]
    fn test_test_binary_is_dynamically_linked() {
        let exe = std::env::current_exe().unwrap();
        let arch = check_dynamically_linked(&exe).unwrap();
        assert!(arch.is_some());
    }

    #[test]
    fn test_architecture_mismatch() {
        let err = check_same_architecture(
            Architecture::X86_64,
            Architecture::Aarch64,
            Path::new("/usr/bin/viewer"),
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("Architecture mismatch"));
        assert!(check_same_architecture(Architecture::X86_64, Architecture::X86_64, Path::new("x"))
            .is_ok());
    }
}
