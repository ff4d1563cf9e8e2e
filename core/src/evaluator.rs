//! Checks policies against platform limits and against the live state of
//! the enforcement authority, and pushes policies to it.

use std::fmt;

use tracing::warn;

use crate::authority::{EnforcementAuthority, PasswordQuality};
use crate::record::{PasswordMode, PolicyRecord, SCREEN_LOCK_TIME_MAX};

/// Highest requirements the device's lock screen can honour.
///
/// There is no ceiling on the failure count or on remote wipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyLimits {
    /// Longest minimum password length the lock screen supports.
    pub min_password_length: u32,
    /// Strongest password mode the lock screen supports.
    pub password_mode: PasswordMode,
    /// Longest screen-lock timeout, in seconds.
    pub max_screen_lock_seconds: u32,
}

impl PolicyLimits {
    /// Limits of the stock lock screen.
    pub const PLATFORM: Self = Self {
        min_password_length: 16,
        password_mode: PasswordMode::Strong,
        max_screen_lock_seconds: SCREEN_LOCK_TIME_MAX,
    };
}

impl Default for PolicyLimits {
    fn default() -> Self {
        Self::PLATFORM
    }
}

/// Outcome of checking a policy against the authority's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Admin is inactive and the always-active debug override answered.
    Overridden,
    /// The policy constrains nothing.
    NoPolicy,
    /// Every checked requirement is met.
    Met,
    /// This process is not an active device administrator.
    AdminInactive,
    /// The enforced minimum length is shorter than required.
    PasswordTooShort {
        /// Length the policy requires.
        required: u32,
        /// Length the authority enforces.
        enforced: u32,
    },
    /// The enforced quality class is weaker than required.
    QualityTooLow {
        /// Class the policy requires.
        required: PasswordQuality,
        /// Class the authority enforces.
        enforced: PasswordQuality,
    },
    /// The user's current password does not meet the enforced requirements.
    PasswordInsufficient,
    /// The enforced lock timeout is longer than allowed.
    LockTimeoutTooLong {
        /// Longest timeout the policy allows, in milliseconds.
        required_millis: u64,
        /// Timeout the authority enforces, in milliseconds.
        enforced_millis: u64,
    },
}

impl Verdict {
    /// Returns `true` when the device may proceed.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Overridden | Self::NoPolicy | Self::Met)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overridden => f.write_str("satisfied by debug override"),
            Self::NoPolicy => f.write_str("no policy required"),
            Self::Met => f.write_str("all requirements met"),
            Self::AdminInactive => f.write_str("device administrator not active"),
            Self::PasswordTooShort { required, enforced } => write!(
                f,
                "minimum password length {enforced} below required {required}"
            ),
            Self::QualityTooLow { required, enforced } => write!(
                f,
                "password quality {enforced} below required {required}"
            ),
            Self::PasswordInsufficient => f.write_str("current password is not sufficient"),
            Self::LockTimeoutTooLong {
                required_millis,
                enforced_millis,
            } => write!(
                f,
                "screen lock timeout {enforced_millis}ms above allowed {required_millis}ms"
            ),
        }
    }
}

/// Stateless checks over single policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyEvaluator {
    limits: PolicyLimits,
    debug_always_active: bool,
}

impl Default for PolicyEvaluator {
    fn default() -> Self {
        Self::new(PolicyLimits::PLATFORM, false)
    }
}

impl PolicyEvaluator {
    /// Creates an evaluator.
    ///
    /// * `limits` – ceilings used by [`PolicyEvaluator::is_supported`];
    /// * `debug_always_active` – when `true`, satisfaction checks pass while
    ///   device admin is inactive. Never enable this outside development builds.
    #[must_use]
    pub const fn new(limits: PolicyLimits, debug_always_active: bool) -> Self {
        Self {
            limits,
            debug_always_active,
        }
    }

    /// Ceilings this evaluator checks against.
    #[must_use]
    pub const fn limits(&self) -> PolicyLimits {
        self.limits
    }

    /// Whether the always-active debug override is on.
    #[must_use]
    pub const fn debug_always_active(&self) -> bool {
        self.debug_always_active
    }

    /// Returns `true` when the device could ever honour `policy`.
    ///
    /// Does not look at the authority's live state; used to vet a policy
    /// before it is stored.
    #[must_use]
    pub fn is_supported(&self, policy: &PolicyRecord) -> bool {
        policy.min_password_length() <= self.limits.min_password_length
            && policy.password_mode() <= self.limits.password_mode
            && policy.max_screen_lock_seconds() <= self.limits.max_screen_lock_seconds
    }

    /// Checks `policy` against the authority, stopping at the first unmet
    /// requirement.
    ///
    /// Failure counting and remote wipe are not checked: the former is
    /// tracked elsewhere and the latter is available whenever admin is active.
    pub fn evaluate<A>(&self, policy: &PolicyRecord, authority: &A) -> Verdict
    where
        A: EnforcementAuthority + ?Sized,
    {
        self.admin_verdict(authority)
            .unwrap_or_else(|| Self::check_requirements(policy, authority))
    }

    /// The part of [`PolicyEvaluator::evaluate`] that does not depend on the
    /// policy: the admin status and, without admin, the debug override.
    ///
    /// Returns `None` when admin is active and the policy itself has to be
    /// checked. The override never masks a failed check on an active admin.
    pub fn admin_verdict<A>(&self, authority: &A) -> Option<Verdict>
    where
        A: EnforcementAuthority + ?Sized,
    {
        if authority.is_admin_active() {
            return None;
        }
        if self.debug_always_active {
            warn!("device admin inactive, debug override treats policies as satisfied");
            return Some(Verdict::Overridden);
        }
        Some(Verdict::AdminInactive)
    }

    /// Compares each enforced field of `policy` with the authority's state.
    ///
    /// Assumes admin status was already established.
    pub fn check_requirements<A>(policy: &PolicyRecord, authority: &A) -> Verdict
    where
        A: EnforcementAuthority + ?Sized,
    {
        if policy.is_empty() {
            return Verdict::NoPolicy;
        }

        let required = policy.min_password_length();
        if required > 0 {
            let enforced = authority.password_minimum_length();
            if enforced < required {
                return Verdict::PasswordTooShort { required, enforced };
            }
        }

        if policy.password_mode() > PasswordMode::None {
            let required = PasswordQuality::from(policy.password_mode());
            let enforced = authority.password_quality();
            if enforced < required {
                return Verdict::QualityTooLow { required, enforced };
            }
            if !authority.is_active_password_sufficient() {
                return Verdict::PasswordInsufficient;
            }
        }

        let seconds = policy.max_screen_lock_seconds();
        if seconds > 0 {
            let required_millis = lock_millis(seconds);
            let enforced_millis = authority.maximum_time_to_lock_millis();
            if enforced_millis > required_millis {
                return Verdict::LockTimeoutTooLong {
                    required_millis,
                    enforced_millis,
                };
            }
        }

        Verdict::Met
    }

    /// Shorthand for `evaluate(..).is_satisfied()`.
    pub fn is_satisfied<A>(&self, policy: &PolicyRecord, authority: &A) -> bool
    where
        A: EnforcementAuthority + ?Sized,
    {
        self.evaluate(policy, authority).is_satisfied()
    }

    /// Pushes every requirement of `policy` onto the authority.
    ///
    /// Does not check admin status; see
    /// [`crate::SecurityPolicy::apply_active_policies`] for the checked path.
    pub fn apply<A>(policy: &PolicyRecord, authority: &A)
    where
        A: EnforcementAuthority + ?Sized,
    {
        authority.set_password_quality(PasswordQuality::from(policy.password_mode()));
        authority.set_password_minimum_length(policy.min_password_length());
        authority.set_maximum_time_to_lock_millis(lock_millis(policy.max_screen_lock_seconds()));
        authority.set_maximum_failed_passwords_for_wipe(policy.max_password_failures());
    }
}

/// Policy seconds to authority milliseconds.
fn lock_millis(seconds: u32) -> u64 {
    u64::from(seconds) * 1000
}
