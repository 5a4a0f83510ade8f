//! Process-start configuration
//!
//! Read once from the environment when the library is loaded. Invalid
//! values are logged and ignored rather than failing the host.

use std::num::NonZeroUsize;

use log::warn;
use pdftrace_common::{
    DEFAULT_SUFFIX, DOUBLEBUFFERING_DEFAULT, ENV_DOUBLEBUFFERING, ENV_GRANULARITY,
    ENV_NO_TERMINAL, ENV_SUFFIX,
};

use crate::domain::ConfigError;

/// Settings of the tracing engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// Filename suffix selecting the traced file
    pub suffix: String,
    /// Maximum bytes forwarded per read of the traced file
    pub granularity: Option<NonZeroUsize>,
    /// Emit cursor-homing escape sequences
    pub use_terminal: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self { suffix: DEFAULT_SUFFIX.to_string(), granularity: None, use_terminal: true }
    }
}

impl TraceConfig {
    /// Load from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_GRANULARITY) {
            match parse_granularity(&raw) {
                Ok(granularity) => config.granularity = granularity,
                Err(e) => warn!("{e}; reads are not split"),
            }
        }

        if let Some(raw) = lookup(ENV_SUFFIX) {
            match parse_suffix(&raw) {
                Ok(suffix) => config.suffix = suffix,
                Err(e) => warn!("{e}; tracing {DEFAULT_SUFFIX} files"),
            }
        }

        if let Some(raw) = lookup(ENV_NO_TERMINAL) {
            config.use_terminal = !is_truthy(&raw);
        }

        config
    }
}

/// Parse a granularity override; zero disables it.
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] for anything but a non-negative integer.
pub fn parse_granularity(raw: &str) -> Result<Option<NonZeroUsize>, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .map(NonZeroUsize::new)
        .map_err(|_| ConfigError::InvalidNumber { variable: ENV_GRANULARITY, value: raw.to_string() })
}

fn parse_suffix(raw: &str) -> Result<String, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::EmptySuffix(ENV_SUFFIX));
    }
    Ok(raw.to_string())
}

fn is_truthy(raw: &str) -> bool {
    !raw.is_empty() && raw != "0"
}

/// Default the host compatibility toggle unless the host already set it.
///
/// Must run before the host reads its environment, i.e. from the library
/// constructor while the process is still single-threaded.
pub fn apply_env_defaults() {
    if std::env::var_os(ENV_DOUBLEBUFFERING).is_none() {
        std::env::set_var(ENV_DOUBLEBUFFERING, DOUBLEBUFFERING_DEFAULT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TraceConfig::from_lookup(lookup(&[]));
        assert_eq!(config, TraceConfig::default());
        assert_eq!(config.suffix, ".pdf");
        assert!(config.use_terminal);
        assert_eq!(config.granularity, None);
    }

    #[test]
    fn test_granularity_override() {
        let config = TraceConfig::from_lookup(lookup(&[("GRANULARITY", "64")]));
        assert_eq!(config.granularity, NonZeroUsize::new(64));
    }

    #[test]
    fn test_granularity_zero_or_invalid_disables() {
        assert_eq!(parse_granularity("0"), Ok(None));
        assert!(parse_granularity("-5").is_err());
        assert!(parse_granularity("lots").is_err());

        let config = TraceConfig::from_lookup(lookup(&[("GRANULARITY", "lots")]));
        assert_eq!(config.granularity, None);
    }

    #[test]
    fn test_suffix_and_no_terminal() {
        let config = TraceConfig::from_lookup(lookup(&[
            ("PDFTRACE_SUFFIX", ".ps"),
            ("PDFTRACE_NOTERMINAL", "1"),
        ]));
        assert_eq!(config.suffix, ".ps");
        assert!(!config.use_terminal);
    }

    #[test]
    fn test_empty_suffix_ignored() {
        let config = TraceConfig::from_lookup(lookup(&[("PDFTRACE_SUFFIX", "")]));
        assert_eq!(config.suffix, ".pdf");
    }

    #[test]
    fn test_no_terminal_zero_keeps_terminal() {
        let config = TraceConfig::from_lookup(lookup(&[("PDFTRACE_NOTERMINAL", "0")]));
        assert!(config.use_terminal);
    }
}
