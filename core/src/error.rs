//! Load-time errors.
//!
//! Translation itself never fails; only installing dictionaries can.

use thiserror::Error;

/// Errors reported synchronously by the dictionary load operations.
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// A rule template key or value does not carry exactly one `{0}` slot.
    /// Only raised when `Config::strict_rules` is set.
    #[error("malformed rule template `{key}`: {reason}")]
    MalformedRule { key: String, reason: String },

    /// The matcher built from a rule template failed to compile.
    /// Only raised when `Config::strict_rules` is set.
    #[error("rule template `{key}` does not compile: {source}")]
    InvalidPattern {
        key: String,
        #[source]
        source: regex::Error,
    },

    /// Snapshot bytes could not be decoded.
    #[error("dictionary snapshot is unreadable: {0}")]
    Snapshot(#[from] bincode::Error),
}
