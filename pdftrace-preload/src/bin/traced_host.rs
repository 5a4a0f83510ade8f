//! Host program for running the preload library end to end.
//!
//! Reads FILE in chunks of `CHUNK` bytes (default 64) and drives whichever
//! part of the registration protocol the flags ask for. Prints the
//! `DOUBLEBUFFERING` value it was started with to stderr.
//!
//! ```bash
//! LD_PRELOAD=target/debug/libpdftrace_preload.so \
//!     target/debug/traced-host --callback file.pdf
//! ```
//!
//! | Flag | Effect |
//! |------|--------|
//! | `--callback` | Register a callback reporting every read |
//! | `--unregister` | Register one, then hand control back with NULL |
//! | `--no-terminal` | Call `usenoterminal()` |
//! | `--blocked-reader` | Park a thread in `read` on an idle pipe first |

#![allow(unsafe_code)] // pipe(2) for the parked reader

use std::ffi::c_int;
use std::fs::File;
use std::io::Read;
use std::os::fd::FromRawFd;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use pdftrace::host::{TraceHost, TRACE_REPORT};
use pdftrace_common::ENV_DOUBLEBUFFERING;

const USAGE: &str =
    "usage: traced-host [--callback] [--unregister] [--no-terminal] [--blocked-reader] FILE";
const DEFAULT_CHUNK: usize = 64;

/// Time given to the parked reader to enter `read`
const PARK_DELAY: Duration = Duration::from_millis(100);

extern "C" fn report_every_read() -> c_int {
    TRACE_REPORT
}

#[derive(Debug, Default)]
struct Options {
    callback: bool,
    unregister: bool,
    no_terminal: bool,
    blocked_reader: bool,
    path: Option<String>,
}

fn main() -> Result<()> {
    let options = parse_args(std::env::args().skip(1))?;
    let path = options.path.as_deref().context(USAGE)?;

    eprintln!(
        "{ENV_DOUBLEBUFFERING}={}",
        std::env::var(ENV_DOUBLEBUFFERING).unwrap_or_default()
    );

    let host = TraceHost::attach().context("pdftrace preload library not loaded")?;
    if options.no_terminal {
        host.use_no_terminal();
    }
    if options.callback || options.unregister {
        host.register_tracer(report_every_read);
    }
    if options.unregister {
        host.unregister_tracer();
    }

    // Write end stays open until exit so the parked read never returns
    let _parked = if options.blocked_reader { Some(park_reader()?) } else { None };

    let chunk = match std::env::var("CHUNK") {
        Ok(raw) => raw.parse().with_context(|| format!("invalid CHUNK: {raw}"))?,
        Err(_) => DEFAULT_CHUNK,
    };
    let mut file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
    let mut buf = vec![0u8; chunk];
    let mut total = 0usize;
    loop {
        let n = file.read(&mut buf).context("read failed")?;
        if n == 0 {
            break;
        }
        total += n;
    }

    host.traced_final();
    eprintln!("{total} bytes read");
    Ok(())
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Options> {
    let mut options = Options::default();
    for arg in args {
        match arg.as_str() {
            "--callback" => options.callback = true,
            "--unregister" => options.unregister = true,
            "--no-terminal" => options.no_terminal = true,
            "--blocked-reader" => options.blocked_reader = true,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            _ => options.path = Some(arg),
        }
    }
    Ok(options)
}

/// Start a thread blocked in `read` on a pipe nobody writes to.
///
/// Returns the write end; the thread stays blocked while it is open.
fn park_reader() -> Result<File> {
    let mut fds: [c_int; 2] = [-1; 2];
    // SAFETY: `fds` has room for both ends
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(std::io::Error::last_os_error()).context("pipe failed");
    }
    // SAFETY: both descriptors were just created and are owned only here
    let (mut reader, writer) = unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) };

    std::thread::spawn(move || {
        let mut byte = [0u8; 1];
        let _ = reader.read(&mut byte);
    });
    std::thread::sleep(PARK_DELAY);
    Ok(writer)
}
