use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::Command;

const PRELOAD_PACKAGE: &str = "pdftrace-preload";
const PRELOAD_LIBRARY: &str = "libpdftrace_preload.so";

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Parser)]
enum Cmd {
    /// Build the LD_PRELOAD library
    BuildPreload {
        /// Debug profile instead of release
        #[arg(long)]
        debug: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Cmd::BuildPreload { debug } => build_preload(debug)?,
    }

    Ok(())
}

fn build_preload(debug: bool) -> Result<()> {
    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let mut cmd = Command::new(cargo);
    cmd.arg("build").arg("--package").arg(PRELOAD_PACKAGE);
    if !debug {
        cmd.arg("--release");
    }

    let status = cmd.status().context("Failed to run cargo build")?;
    if !status.success() {
        anyhow::bail!("Failed to build {PRELOAD_PACKAGE}");
    }

    let profile = if debug { "debug" } else { "release" };
    let library = target_dir().join(profile).join(PRELOAD_LIBRARY);

    println!("✓ preload library built successfully");
    println!("  Library: {}", library.display());
    println!("  Profile: {profile}");
    println!("  Use: LD_PRELOAD={} <command> file.pdf", library.display());

    Ok(())
}

fn target_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("CARGO_TARGET_DIR") {
        return PathBuf::from(dir);
    }
    // xtask lives one level below the workspace root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).parent().map_or_else(
        || PathBuf::from("target"),
        |root| root.join("target"),
    )
}
