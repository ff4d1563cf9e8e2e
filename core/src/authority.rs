//! Interfaces of the two collaborators the core talks to: the device's
//! enforcement authority and the account store.

use std::fmt;

use crate::record::PasswordMode;

/// Identifier of an account row.
pub type AccountId = i64;

/// The enforcement authority's own password-strength classes.
///
/// Numeric values follow the device policy manager's constants, and the
/// derived order matches them: a higher class is a stricter requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum PasswordQuality {
    /// No requirement on the password.
    #[default]
    Unspecified = 0,
    /// Some kind of password, of any quality.
    Something = 0x1_0000,
    /// At least numeric characters.
    Numeric = 0x2_0000,
    /// At least alphabetic characters.
    Alphabetic = 0x4_0000,
    /// Both letters and digits.
    Alphanumeric = 0x5_0000,
}

impl PasswordQuality {
    /// Raw value understood by the authority.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Maps any raw class reported by the authority to the strongest known
    /// class that does not exceed it.
    ///
    /// Classes between two known ones (numeric-complex, `0x3_0000`) round down
    /// and classes above [`PasswordQuality::Alphanumeric`] (complex,
    /// `0x6_0000`) become `Alphanumeric`. Every class a policy can require is
    /// a known one, so `from_raw(raw) < required` exactly when
    /// `raw < required.as_raw()`.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        if raw >= Self::Alphanumeric.as_raw() {
            Self::Alphanumeric
        } else if raw >= Self::Alphabetic.as_raw() {
            Self::Alphabetic
        } else if raw >= Self::Numeric.as_raw() {
            Self::Numeric
        } else if raw >= Self::Something.as_raw() {
            Self::Something
        } else {
            Self::Unspecified
        }
    }
}

impl From<PasswordMode> for PasswordQuality {
    fn from(mode: PasswordMode) -> Self {
        match mode {
            PasswordMode::None => Self::Unspecified,
            PasswordMode::Simple => Self::Numeric,
            PasswordMode::Strong => Self::Alphanumeric,
        }
    }
}

impl fmt::Display for PasswordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unspecified => "unspecified",
            Self::Something => "something",
            Self::Numeric => "numeric",
            Self::Alphabetic => "alphabetic",
            Self::Alphanumeric => "alphanumeric",
        };
        f.write_str(name)
    }
}

/// The subsystem that measures and enforces lock-screen state on the device.
///
/// Calls are fast, local and blocking. Queries never fail: an unavailable
/// authority reports itself through [`EnforcementAuthority::is_admin_active`].
pub trait EnforcementAuthority: Send + Sync {
    /// Whether this process is an active device administrator.
    fn is_admin_active(&self) -> bool;

    /// Currently enforced minimum password length.
    fn password_minimum_length(&self) -> u32;

    /// Currently enforced password quality class.
    ///
    /// Authorities with finer classes than [`PasswordQuality`] convert their
    /// raw value with [`PasswordQuality::from_raw`].
    fn password_quality(&self) -> PasswordQuality;

    /// Whether the password the user has set meets the enforced requirements.
    fn is_active_password_sufficient(&self) -> bool;

    /// Currently enforced maximum idle time before lock, in milliseconds.
    fn maximum_time_to_lock_millis(&self) -> u64;

    /// Sets the required password quality class.
    fn set_password_quality(&self, quality: PasswordQuality);

    /// Sets the required minimum password length.
    fn set_password_minimum_length(&self, length: u32);

    /// Sets the maximum idle time before lock, in milliseconds.
    fn set_maximum_time_to_lock_millis(&self, millis: u64);

    /// Sets the number of failed unlock attempts before the device is wiped.
    fn set_maximum_failed_passwords_for_wipe(&self, attempts: u32);

    /// Erases all user data on the device.
    fn wipe_data(&self);
}

/// Source of the per-account security flags.
pub trait AccountStore: Send + Sync {
    /// Returns `(account, flags)` for every account whose flags are non-zero.
    fn security_flags(&self) -> Vec<(AccountId, u32)>;
}
