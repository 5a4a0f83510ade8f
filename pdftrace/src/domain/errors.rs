//! Structured error types for pdftrace
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! None of these ever reach the host program: the interposition layer logs
//! them and carries on, except for a missing original symbol which is fatal.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Original symbol {0} not found after this library")]
    SymbolNotFound(String),

    #[error("Terminal error: {0}")]
    TerminalError(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {variable}: expected a non-negative integer")]
    InvalidNumber { variable: &'static str, value: String },

    #[error("Empty suffix in {0}")]
    EmptySuffix(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_display() {
        let err = TraceError::SymbolNotFound("pread64".to_string());
        assert_eq!(err.to_string(), "Original symbol pread64 not found after this library");
    }

    #[test]
    fn test_invalid_number_display() {
        let err =
            ConfigError::InvalidNumber { variable: "GRANULARITY", value: "lots".to_string() };
        assert!(err.to_string().contains("GRANULARITY"));
        assert!(err.to_string().contains("\"lots\""));
    }
}
