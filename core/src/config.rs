//! Configuration for the security-policy authority.
//!
//! Settings come from environment variables. There is exactly one knob: the
//! always-active debug override, which makes satisfaction checks pass while
//! device admin is inactive.
//! It is off unless explicitly switched on.

use std::env;

use anyhow::{anyhow, Result};

use crate::evaluator::{PolicyEvaluator, PolicyLimits};

/// Primary environment variable for the debug override.
pub const DEBUG_ALWAYS_ACTIVE_VAR: &str = "DEVICE_POLICY_DEBUG_ALWAYS_ACTIVE";
/// Shorter alias, checked when the primary variable is unset.
pub const DEBUG_ALWAYS_ACTIVE_ALIAS: &str = "POLICY_DEBUG_ALWAYS_ACTIVE";

/// Runtime configuration of a [`crate::SecurityPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityPolicyConfig {
    /// When `true`, policies are reported as satisfied without consulting the
    /// enforcement authority. Development only.
    pub debug_always_active: bool,
}

impl SecurityPolicyConfig {
    /// Creates a configuration with explicit values.
    #[must_use]
    pub const fn new(debug_always_active: bool) -> Self {
        Self {
            debug_always_active,
        }
    }

    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// Recognised variables:
    ///
    /// - `DEVICE_POLICY_DEBUG_ALWAYS_ACTIVE` or `POLICY_DEBUG_ALWAYS_ACTIVE`
    ///   - `"1"`, `"true"`, `"yes"`, `"on"` (any case) → `true`
    ///   - `"0"`, `"false"`, `"no"`, `"off"` → `false`
    ///   - unset → default (`false`)
    ///
    /// # Errors
    ///
    /// Any other value is rejected rather than guessed at.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Some((key, raw)) = first_env(&[DEBUG_ALWAYS_ACTIVE_VAR, DEBUG_ALWAYS_ACTIVE_ALIAS]) {
            cfg.debug_always_active = parse_bool(&raw)
                .ok_or_else(|| anyhow!("invalid boolean for {key}: {raw:?}"))?;
        }

        Ok(cfg)
    }

    /// Builds the evaluator this configuration describes.
    #[must_use]
    pub const fn evaluator(&self) -> PolicyEvaluator {
        PolicyEvaluator::new(PolicyLimits::PLATFORM, self.debug_always_active)
    }
}

/// Returns the first defined environment variable from the given list,
/// together with its name.
fn first_env<'a>(keys: &[&'a str]) -> Option<(&'a str, String)> {
    keys.iter()
        .find_map(|key| env::var(key).ok().map(|value| (*key, value)))
}

/// Parses a loose boolean; `None` for anything unrecognised.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
