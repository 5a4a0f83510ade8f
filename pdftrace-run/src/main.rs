//! # pdftrace-run - Main Entry Point
//!
//! Resolves everything up front, then `exec`s the command so the traced
//! program inherits this process's terminal and PID.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::os::unix::process::CommandExt;
use std::process::Command;

use pdftrace_run::cli::Args;
use pdftrace_run::launch::{preload_value, trace_env, ENV_PRELOAD};
use pdftrace_run::lookup::{find_library, resolve_command, CommandNotFound};
use pdftrace_run::preflight::run_preflight_checks;

// Exit codes
const EXIT_ERROR: i32 = 1;
const EXIT_NOT_FOUND: i32 = 127;

fn main() {
    env_logger::init();
    // Usage errors exit with 2 inside clap
    let args = Args::parse();
    let err = match run(&args) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    eprintln!("error: {err:#}");
    std::process::exit(exit_code_for(&err));
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<CommandNotFound>().is_some() {
        EXIT_NOT_FOUND
    } else {
        EXIT_ERROR
    }
}

/// Only returns on failure; success replaces the process.
fn run(args: &Args) -> Result<std::convert::Infallible> {
    let library = find_library(args.library.as_deref())?;
    let (program, rest) = args.command.split_first().context("Missing command")?;
    let path = resolve_command(program, std::env::var_os("PATH").as_deref())?;
    run_preflight_checks(&library, &path)?;

    let mut command = Command::new(&path);
    command.arg0(program).args(rest);
    command.env(ENV_PRELOAD, preload_value(&library, std::env::var_os(ENV_PRELOAD).as_deref()));
    for (name, value) in trace_env(args) {
        command.env(name, value);
    }

    info!("Tracing {} with {}", path.display(), library.display());
    let err = command.exec();
    Err(err).with_context(|| format!("Failed to execute {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = anyhow::Error::new(CommandNotFound("viewer".to_string()));
        assert_eq!(exit_code_for(&missing), EXIT_NOT_FOUND);
        assert_eq!(exit_code_for(&anyhow::anyhow!("Not an ELF file")), EXIT_ERROR);
    }
}
