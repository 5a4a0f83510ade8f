//! Minimal traced host.
//!
//! Reads a file in fixed-size pages. When run under the preload library it
//! registers a callback that reports the last read of each page, so the
//! output is one line per page instead of one per read.
//!
//! ```bash
//! cargo xtask build-preload
//! LD_PRELOAD=target/release/libpdftrace_preload.so \
//!     cargo run -p pdftrace --example chunked_reader -- file.pdf 2048
//! ```

use std::ffi::c_int;
use std::fs::File;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use log::info;
use pdftrace::host::{report_if, TraceHost};

const DEFAULT_PAGE_SIZE: usize = 4096;

static PAGE_CHANGED: AtomicBool = AtomicBool::new(false);

extern "C" fn page_tracer() -> c_int {
    report_if(PAGE_CHANGED.swap(false, Ordering::Relaxed))
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().context("usage: chunked_reader FILE [PAGE_SIZE]")?;
    let page_size = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid page size: {raw}"))?,
        None => DEFAULT_PAGE_SIZE,
    };

    let host = TraceHost::attach();
    match host {
        Some(host) => {
            host.use_no_terminal();
            host.register_tracer(page_tracer);
        }
        None => info!("pdftrace not preloaded, reading untraced"),
    }

    let mut file = File::open(&path).with_context(|| format!("Failed to open {path}"))?;
    let mut page = vec![0u8; page_size];
    let mut pages = 0usize;
    loop {
        let filled = fill_page(&mut file, &mut page)?;
        if filled == 0 {
            break;
        }
        pages += 1;
        PAGE_CHANGED.store(true, Ordering::Relaxed);
    }

    if let Some(host) = host {
        host.traced_final();
    }
    println!("{pages} pages of {page_size} bytes");
    Ok(())
}

fn fill_page(file: &mut File, page: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < page.len() {
        let n = file.read(&mut page[filled..]).context("read failed")?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
