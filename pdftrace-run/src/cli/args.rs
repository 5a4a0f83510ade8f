//! CLI argument definitions

use clap::Parser;
use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pdftrace-run",
    about = "Run a program with pdftrace preloaded and watch which PDF objects it reads",
    after_help = "\
EXAMPLES:
    pdftrace-run -- evince report.pdf                 Step through every read
    pdftrace-run --granularity 64 -- pdftoppm a.pdf   Finer-grained reads
    pdftrace-run --no-terminal -- ./render a.pdf      Plain log, no cursor control

KEYS (while paused):
    F3    stop on every read
    F4    stop only when the object changes
    any   continue"
)]
pub struct Args {
    /// Preload library to use (searched for if omitted)
    #[arg(short, long, value_name = "PATH")]
    pub library: Option<PathBuf>,

    /// Forward at most N bytes per read of the traced file
    #[arg(short, long, value_name = "N")]
    pub granularity: Option<NonZeroUsize>,

    /// Filename suffix of the file to trace [default: .pdf]
    #[arg(short, long, value_name = "SUFFIX", value_parser = non_empty)]
    pub suffix: Option<String>,

    /// Append reports instead of redrawing at the top of the screen
    #[arg(long)]
    pub no_terminal: bool,

    /// Program to run, followed by its arguments
    #[arg(value_name = "COMMAND", required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<OsString>,
}

fn non_empty(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        Err("suffix must not be empty".to_string())
    } else {
        Ok(raw.to_string())
    }
}
