//! Error types for the policy core.

use thiserror::Error;

use crate::record::PolicyField;

/// Errors raised while building, decoding or enforcing a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A field value does not fit its bit width.
    #[error("policy field {field} out of range: {value} > {max}")]
    Range {
        /// The offending field.
        field: PolicyField,
        /// The rejected value.
        value: u32,
        /// Largest value the field can hold.
        max: u32,
    },

    /// A stored integer carries a password mode outside `None..=Strong`.
    #[error("invalid policy encoding {raw:#010x}: unsupported password mode {mode}")]
    InvalidEncoding {
        /// The raw integer that failed to decode.
        raw: u32,
        /// The mode nibble found in it.
        mode: u32,
    },

    /// The operation needs this process to be an active device administrator.
    #[error("device administrator is not active")]
    NotAdmin,
}

/// Result alias used across the crate.
pub type PolicyResult<T> = Result<T, PolicyError>;
