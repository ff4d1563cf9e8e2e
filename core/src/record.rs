//! Policy records and their packed 26-bit encoding.
//!
//! A [`PolicyRecord`] is the five-field security requirement of a single
//! account. It is stored as a `u32` with the fields packed low to high:
//!
//! ```text
//! bit  25     24 ........ 14  13 .... 9  8 .. 5  4 .... 0
//!     [wipe] [screen lock s] [max fails] [mode] [min len]
//! ```
//!
//! The layout is shared with stored account rows and must not change.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};

const PASSWORD_LENGTH_SHIFT: u32 = 0;
const PASSWORD_LENGTH_MASK: u32 = 0x1f;
const PASSWORD_MODE_SHIFT: u32 = 5;
const PASSWORD_MODE_MASK: u32 = 0x0f;
const PASSWORD_MAX_FAILS_SHIFT: u32 = 9;
const PASSWORD_MAX_FAILS_MASK: u32 = 0x1f;
const SCREEN_LOCK_TIME_SHIFT: u32 = 14;
const SCREEN_LOCK_TIME_MASK: u32 = 0x7ff;
const REQUIRE_REMOTE_WIPE: u32 = 1 << 25;

/// Largest minimum password length that fits the encoding.
pub const PASSWORD_LENGTH_MAX: u32 = PASSWORD_LENGTH_MASK;
/// Largest failed-attempt threshold that fits the encoding.
pub const PASSWORD_MAX_FAILS_MAX: u32 = PASSWORD_MAX_FAILS_MASK;
/// Largest screen-lock timeout, in seconds, that fits the encoding.
pub const SCREEN_LOCK_TIME_MAX: u32 = SCREEN_LOCK_TIME_MASK;

/// Names the fields of a [`PolicyRecord`], mainly for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyField {
    /// `min_password_length`
    MinPasswordLength,
    /// `password_mode`
    PasswordMode,
    /// `max_password_failures`
    MaxPasswordFailures,
    /// `max_screen_lock_seconds`
    MaxScreenLockSeconds,
}

impl PolicyField {
    /// Field name as used in logs and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MinPasswordLength => "min_password_length",
            Self::PasswordMode => "password_mode",
            Self::MaxPasswordFailures => "max_password_failures",
            Self::MaxScreenLockSeconds => "max_screen_lock_seconds",
        }
    }
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Required password strength, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PasswordMode {
    /// No password requirement.
    #[default]
    None = 0,
    /// Any password, numeric PINs included.
    Simple = 1,
    /// A password mixing letters and digits.
    Strong = 2,
}

impl PasswordMode {
    /// Value stored in the mode nibble.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Lower-case name, as printed in the display form of a record.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Simple => "simple",
            Self::Strong => "strong",
        }
    }
}

impl TryFrom<u32> for PasswordMode {
    type Error = PolicyError;

    fn try_from(raw: u32) -> PolicyResult<Self> {
        match raw {
            0 => Ok(Self::None),
            1 => Ok(Self::Simple),
            2 => Ok(Self::Strong),
            _ => Err(PolicyError::Range {
                field: PolicyField::PasswordMode,
                value: raw,
                max: Self::Strong.as_raw(),
            }),
        }
    }
}

impl fmt::Display for PasswordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The security requirement of one account.
///
/// Values are validated on construction and never change afterwards. A value
/// of zero in a numeric field means "not enforced". Equality follows the
/// encoding: two records are equal exactly when [`PolicyRecord::encode`]
/// returns the same integer for both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub struct PolicyRecord {
    min_password_length: u32,
    password_mode: PasswordMode,
    max_password_failures: u32,
    max_screen_lock_seconds: u32,
    require_remote_wipe: bool,
}

/// The "no constraints" policy.
///
/// Encodes to `0`, like any record built with all fields unset. Callers can
/// compare against it to skip every further check.
pub const EMPTY_POLICY: PolicyRecord = PolicyRecord {
    min_password_length: 0,
    password_mode: PasswordMode::None,
    max_password_failures: 0,
    max_screen_lock_seconds: 0,
    require_remote_wipe: false,
};

impl PolicyRecord {
    /// Builds a record, rejecting any value that does not fit its field.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Range`] naming the first field that overflows.
    pub fn new(
        min_password_length: u32,
        password_mode: PasswordMode,
        max_password_failures: u32,
        max_screen_lock_seconds: u32,
        require_remote_wipe: bool,
    ) -> PolicyResult<Self> {
        check_range(
            PolicyField::MinPasswordLength,
            min_password_length,
            PASSWORD_LENGTH_MAX,
        )?;
        check_range(
            PolicyField::MaxPasswordFailures,
            max_password_failures,
            PASSWORD_MAX_FAILS_MAX,
        )?;
        check_range(
            PolicyField::MaxScreenLockSeconds,
            max_screen_lock_seconds,
            SCREEN_LOCK_TIME_MAX,
        )?;

        Ok(Self {
            min_password_length,
            password_mode,
            max_password_failures,
            max_screen_lock_seconds,
            require_remote_wipe,
        })
    }

    /// Like [`PolicyRecord::new`], but takes the password mode as its raw
    /// numeric value (`0` none, `1` simple, `2` strong).
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Range`] for an unknown mode or an oversized field.
    pub fn from_raw_parts(
        min_password_length: u32,
        password_mode: u32,
        max_password_failures: u32,
        max_screen_lock_seconds: u32,
        require_remote_wipe: bool,
    ) -> PolicyResult<Self> {
        let mode = PasswordMode::try_from(password_mode)?;
        Self::new(
            min_password_length,
            mode,
            max_password_failures,
            max_screen_lock_seconds,
            require_remote_wipe,
        )
    }

    /// Builds a record from values already known to fit their fields.
    pub(crate) const fn from_validated(
        min_password_length: u32,
        password_mode: PasswordMode,
        max_password_failures: u32,
        max_screen_lock_seconds: u32,
        require_remote_wipe: bool,
    ) -> Self {
        Self {
            min_password_length,
            password_mode,
            max_password_failures,
            max_screen_lock_seconds,
            require_remote_wipe,
        }
    }

    /// Minimum password length; `0` when not enforced.
    #[must_use]
    pub const fn min_password_length(&self) -> u32 {
        self.min_password_length
    }

    /// Required password strength.
    #[must_use]
    pub const fn password_mode(&self) -> PasswordMode {
        self.password_mode
    }

    /// Failed unlock attempts before the device is wiped; `0` when not enforced.
    #[must_use]
    pub const fn max_password_failures(&self) -> u32 {
        self.max_password_failures
    }

    /// Longest idle time before the screen locks, in seconds; `0` when not enforced.
    #[must_use]
    pub const fn max_screen_lock_seconds(&self) -> u32 {
        self.max_screen_lock_seconds
    }

    /// Whether the device must support remote wipe.
    #[must_use]
    pub const fn require_remote_wipe(&self) -> bool {
        self.require_remote_wipe
    }

    /// Returns `true` when this record constrains nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == EMPTY_POLICY
    }

    /// Packs the record into its stored integer form.
    #[must_use]
    pub const fn encode(&self) -> u32 {
        let mut flags = self.min_password_length << PASSWORD_LENGTH_SHIFT;
        flags |= self.password_mode.as_raw() << PASSWORD_MODE_SHIFT;
        flags |= self.max_password_failures << PASSWORD_MAX_FAILS_SHIFT;
        flags |= self.max_screen_lock_seconds << SCREEN_LOCK_TIME_SHIFT;
        if self.require_remote_wipe {
            flags |= REQUIRE_REMOTE_WIPE;
        }
        flags
    }

    /// Unpacks a stored integer. Bits above the layout are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidEncoding`] when the mode nibble holds one
    /// of the reserved values `3..=15`.
    pub fn decode(raw: u32) -> PolicyResult<Self> {
        let mode = (raw >> PASSWORD_MODE_SHIFT) & PASSWORD_MODE_MASK;
        let password_mode =
            PasswordMode::try_from(mode).map_err(|_| PolicyError::InvalidEncoding { raw, mode })?;

        Ok(Self {
            min_password_length: (raw >> PASSWORD_LENGTH_SHIFT) & PASSWORD_LENGTH_MASK,
            password_mode,
            max_password_failures: (raw >> PASSWORD_MAX_FAILS_SHIFT) & PASSWORD_MAX_FAILS_MASK,
            max_screen_lock_seconds: (raw >> SCREEN_LOCK_TIME_SHIFT) & SCREEN_LOCK_TIME_MASK,
            require_remote_wipe: raw & REQUIRE_REMOTE_WIPE != 0,
        })
    }

    /// Stores this record into an account's flags.
    ///
    /// Returns `true` when the stored policy actually changed.
    pub fn write_flags(&self, stored: &mut u32) -> bool {
        let flags = self.encode();
        let changed = flags != *stored;
        *stored = flags;
        changed
    }
}

fn check_range(field: PolicyField, value: u32, max: u32) -> PolicyResult<()> {
    if value > max {
        return Err(PolicyError::Range { field, value, max });
    }
    Ok(())
}

impl From<PolicyRecord> for u32 {
    fn from(record: PolicyRecord) -> Self {
        record.encode()
    }
}

impl TryFrom<u32> for PolicyRecord {
    type Error = PolicyError;

    fn try_from(raw: u32) -> PolicyResult<Self> {
        Self::decode(raw)
    }
}

impl fmt::Display for PolicyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ pw-len-min={} pw-mode={} pw-fails-max={} screenlock-max={} remote-wipe-req={} }}",
            self.min_password_length,
            self.password_mode,
            self.max_password_failures,
            self.max_screen_lock_seconds,
            self.require_remote_wipe,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_policy_encodes_to_zero() {
        assert_eq!(EMPTY_POLICY.encode(), 0);
        assert_eq!(PolicyRecord::decode(0).unwrap(), EMPTY_POLICY);
        assert!(PolicyRecord::default().is_empty());
    }

    #[test]
    fn fields_land_in_their_bits() {
        let record = PolicyRecord::new(31, PasswordMode::None, 0, 0, false).unwrap();
        assert_eq!(record.encode(), 0x1f);

        let record = PolicyRecord::new(0, PasswordMode::Strong, 0, 0, false).unwrap();
        assert_eq!(record.encode(), 2 << 5);

        let record = PolicyRecord::new(0, PasswordMode::None, 31, 0, false).unwrap();
        assert_eq!(record.encode(), 31 << 9);

        let record = PolicyRecord::new(0, PasswordMode::None, 0, 2047, false).unwrap();
        assert_eq!(record.encode(), 2047 << 14);

        let record = PolicyRecord::new(0, PasswordMode::None, 0, 0, true).unwrap();
        assert_eq!(record.encode(), 1 << 25);
    }

    #[test]
    fn full_record_round_trips() {
        let record = PolicyRecord::new(8, PasswordMode::Simple, 5, 900, true).unwrap();
        let raw = record.encode();
        assert_eq!(raw, 8 | (1 << 5) | (5 << 9) | (900 << 14) | (1 << 25));
        assert_eq!(PolicyRecord::decode(raw).unwrap(), record);
    }

    #[test]
    fn oversized_fields_are_rejected() {
        let err = PolicyRecord::new(32, PasswordMode::None, 0, 0, false).unwrap_err();
        assert_eq!(
            err,
            PolicyError::Range {
                field: PolicyField::MinPasswordLength,
                value: 32,
                max: 31,
            }
        );

        let err = PolicyRecord::new(0, PasswordMode::None, 32, 0, false).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::Range { field: PolicyField::MaxPasswordFailures, .. }
        ));

        let err = PolicyRecord::new(0, PasswordMode::None, 0, 2048, false).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::Range { field: PolicyField::MaxScreenLockSeconds, .. }
        ));
    }

    #[test]
    fn unknown_raw_mode_is_a_range_error() {
        let err = PolicyRecord::from_raw_parts(0, 3, 0, 0, false).unwrap_err();
        assert_eq!(
            err,
            PolicyError::Range {
                field: PolicyField::PasswordMode,
                value: 3,
                max: 2,
            }
        );
    }

    #[test]
    fn reserved_mode_nibble_fails_to_decode() {
        for mode in 3..=15_u32 {
            let raw = mode << 5;
            assert_eq!(
                PolicyRecord::decode(raw),
                Err(PolicyError::InvalidEncoding { raw, mode })
            );
        }
    }

    #[test]
    fn bits_above_layout_are_ignored() {
        let record = PolicyRecord::decode((1 << 26) | 4).unwrap();
        assert_eq!(record.min_password_length(), 4);
        assert_eq!(record.encode(), 4);
    }

    #[test]
    fn write_flags_reports_change() {
        let record = PolicyRecord::new(6, PasswordMode::Simple, 0, 0, false).unwrap();
        let mut stored = 0;
        assert!(record.write_flags(&mut stored));
        assert_eq!(stored, record.encode());
        assert!(!record.write_flags(&mut stored));
    }

    #[test]
    fn display_lists_every_field() {
        let record = PolicyRecord::new(4, PasswordMode::Strong, 3, 60, true).unwrap();
        assert_eq!(
            record.to_string(),
            "{ pw-len-min=4 pw-mode=strong pw-fails-max=3 screenlock-max=60 remote-wipe-req=true }"
        );
    }

    #[test]
    fn modes_are_ordered_by_strength() {
        assert!(PasswordMode::None < PasswordMode::Simple);
        assert!(PasswordMode::Simple < PasswordMode::Strong);
    }
}
