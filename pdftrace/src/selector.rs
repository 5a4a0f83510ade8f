//! Traced-descriptor selection
//!
//! Watches every open and remembers the first descriptor whose file name
//! ends with the configured suffix. Once chosen it never changes.

use log::{debug, info};

use crate::domain::Fd;

/// Picks the single descriptor to trace for the life of the process
#[derive(Debug, Clone)]
pub struct DescriptorSelector {
    suffix: Vec<u8>,
    traced: Option<Fd>,
}

impl DescriptorSelector {
    #[must_use]
    pub fn new(suffix: &str) -> Self {
        Self { suffix: suffix.as_bytes().to_vec(), traced: None }
    }

    /// Inspect an open of `filename` that produced `fd`.
    ///
    /// Returns true if this open selected the traced descriptor. Failed
    /// opens and every open after the first match are ignored.
    pub fn classify_open(&mut self, filename: &[u8], fd: Fd) -> bool {
        debug!("open({}) = {}", String::from_utf8_lossy(filename), fd.0);
        if self.traced.is_some() || !fd.is_valid() || !filename.ends_with(&self.suffix) {
            return false;
        }
        info!("Tracing {} on {fd}", String::from_utf8_lossy(filename));
        self.traced = Some(fd);
        true
    }

    #[must_use]
    pub fn traced(&self) -> Option<Fd> {
        self.traced
    }

    #[must_use]
    pub fn is_traced(&self, fd: Fd) -> bool {
        self.traced == Some(fd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_first_matching_open() {
        let mut selector = DescriptorSelector::new(".pdf");
        assert!(!selector.classify_open(b"/etc/fonts/fonts.conf", Fd(3)));
        assert!(selector.classify_open(b"report.pdf", Fd(4)));
        assert_eq!(selector.traced(), Some(Fd(4)));
        assert!(selector.is_traced(Fd(4)));
        assert!(!selector.is_traced(Fd(3)));
    }

    #[test]
    fn test_selection_is_idempotent() {
        let mut selector = DescriptorSelector::new(".pdf");
        selector.classify_open(b"a.pdf", Fd(5));
        assert!(!selector.classify_open(b"b.pdf", Fd(6)));
        assert_eq!(selector.traced(), Some(Fd(5)));
    }

    #[test]
    fn test_suffix_must_end_the_name() {
        let mut selector = DescriptorSelector::new(".pdf");
        assert!(!selector.classify_open(b"notes.pdf.bak", Fd(3)));
        assert!(!selector.classify_open(b"report.PDF", Fd(3)));
        assert_eq!(selector.traced(), None);
    }

    #[test]
    fn test_failed_open_never_selects() {
        let mut selector = DescriptorSelector::new(".pdf");
        assert!(!selector.classify_open(b"missing.pdf", Fd(-1)));
        assert!(selector.classify_open(b"present.pdf", Fd(3)));
    }

    #[test]
    fn test_custom_suffix() {
        let mut selector = DescriptorSelector::new(".ps");
        assert!(!selector.classify_open(b"doc.pdf", Fd(3)));
        assert!(selector.classify_open(b"doc.ps", Fd(4)));
    }
}
