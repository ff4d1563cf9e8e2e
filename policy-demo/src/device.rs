//! In-memory stand-ins for the device's enforcement authority and the
//! account table.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use device_policy_core::{AccountId, AccountStore, EnforcementAuthority, PasswordQuality};

/// Lock-screen state of the simulated device.
#[derive(Debug, Clone, Default)]
pub struct LockScreen {
    pub admin_active: bool,
    pub min_length: u32,
    pub quality: PasswordQuality,
    pub password_length: u32,
    pub password_quality: PasswordQuality,
    pub time_to_lock_millis: u64,
    pub max_failed_for_wipe: u32,
    pub wiped: bool,
}

/// A device whose lock screen lives in memory.
#[derive(Debug, Default)]
pub struct SimulatedDevice {
    screen: Mutex<LockScreen>,
}

impl SimulatedDevice {
    fn screen(&self) -> MutexGuard<'_, LockScreen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state, for printing.
    pub fn snapshot(&self) -> LockScreen {
        self.screen().clone()
    }

    /// Grants or revokes device-admin rights.
    pub fn set_admin(&self, active: bool) {
        self.screen().admin_active = active;
    }

    /// Simulates the user choosing a new password.
    pub fn set_password(&self, length: u32, quality: PasswordQuality) {
        let mut screen = self.screen();
        screen.password_length = length;
        screen.password_quality = quality;
    }

    /// Simulates the user changing the idle timeout in settings.
    pub fn set_lock_timeout(&self, millis: u64) {
        self.screen().time_to_lock_millis = millis;
    }
}

impl EnforcementAuthority for SimulatedDevice {
    fn is_admin_active(&self) -> bool {
        self.screen().admin_active
    }

    fn password_minimum_length(&self) -> u32 {
        self.screen().min_length
    }

    fn password_quality(&self) -> PasswordQuality {
        self.screen().quality
    }

    fn is_active_password_sufficient(&self) -> bool {
        let screen = self.screen();
        screen.password_length >= screen.min_length && screen.password_quality >= screen.quality
    }

    fn maximum_time_to_lock_millis(&self) -> u64 {
        self.screen().time_to_lock_millis
    }

    fn set_password_quality(&self, quality: PasswordQuality) {
        self.screen().quality = quality;
    }

    fn set_password_minimum_length(&self, length: u32) {
        self.screen().min_length = length;
    }

    fn set_maximum_time_to_lock_millis(&self, millis: u64) {
        self.screen().time_to_lock_millis = millis;
    }

    fn set_maximum_failed_passwords_for_wipe(&self, attempts: u32) {
        self.screen().max_failed_for_wipe = attempts;
    }

    fn wipe_data(&self) {
        *self.screen() = LockScreen {
            wiped: true,
            ..LockScreen::default()
        };
    }
}

/// Account rows keyed by id.
#[derive(Debug, Default)]
pub struct AccountTable {
    rows: Mutex<BTreeMap<AccountId, u32>>,
}

impl AccountTable {
    fn rows(&self) -> MutexGuard<'_, BTreeMap<AccountId, u32>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored flags for `account`, `0` if the account is unknown.
    pub fn flags(&self, account: AccountId) -> u32 {
        self.rows().get(&account).copied().unwrap_or(0)
    }

    /// Writes `flags` for `account`.
    pub fn write(&self, account: AccountId, flags: u32) {
        self.rows().insert(account, flags);
    }

    /// Deletes `account`; returns whether it existed.
    pub fn remove(&self, account: AccountId) -> bool {
        self.rows().remove(&account).is_some()
    }
}

impl AccountStore for AccountTable {
    fn security_flags(&self) -> Vec<(AccountId, u32)> {
        self.rows()
            .iter()
            .filter(|(_, flags)| **flags != 0)
            .map(|(account, flags)| (*account, *flags))
            .collect()
    }
}
