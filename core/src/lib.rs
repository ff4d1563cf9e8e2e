//! Device security policies for multi-account clients.
//!
//! Each account carries a five-field security requirement (password length,
//! password strength, failed attempts before wipe, screen-lock timeout,
//! remote wipe). This crate:
//!
//! - packs and unpacks those requirements to the 26-bit integer stored with
//!   the account ([`PolicyRecord`]);
//! - merges all accounts into one strictest-wins aggregate ([`PolicyAggregator`]);
//! - checks and pushes policies against the device's enforcement authority
//!   ([`PolicyEvaluator`], [`SecurityPolicy`]);
//! - tracks device-admin activation ([`AdminLifecycle`]).
//!
//! ```text
//! stored flags ──decode──▶ PolicyRecord ──merge──▶ aggregate ──▶ evaluate / apply
//!                                                                   │
//!                                                       EnforcementAuthority
//! ```

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

/// Device-admin activation state machine.
pub mod admin;
/// Strictest-wins merge of policy records.
pub mod aggregate;
/// Interfaces of the enforcement authority and the account store.
pub mod authority;
/// Environment-driven configuration.
pub mod config;
/// Error types.
pub mod error;
/// Platform limits, satisfaction checks and policy application.
pub mod evaluator;
/// Policy records and their packed encoding.
pub mod record;
/// The coordinating object with the cached aggregate.
pub mod security_policy;

pub use crate::admin::{AdminEvent, AdminLifecycle, AdminState, Transition};
pub use crate::aggregate::PolicyAggregator;
pub use crate::authority::{AccountId, AccountStore, EnforcementAuthority, PasswordQuality};
pub use crate::config::SecurityPolicyConfig;
pub use crate::error::{PolicyError, PolicyResult};
pub use crate::evaluator::{PolicyEvaluator, PolicyLimits, Verdict};
pub use crate::record::{PasswordMode, PolicyField, PolicyRecord, EMPTY_POLICY};
pub use crate::security_policy::SecurityPolicy;
