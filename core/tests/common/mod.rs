//! Fakes for the enforcement authority and the account store.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use device_policy_core::{AccountId, AccountStore, EnforcementAuthority, PasswordQuality};

/// What the fake device currently enforces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub admin_active: bool,
    pub min_length: u32,
    pub quality: PasswordQuality,
    pub password_sufficient: bool,
    pub time_to_lock_millis: u64,
    pub max_failed_for_wipe: u32,
    pub wiped: bool,
    pub setter_calls: usize,
}

#[derive(Debug, Default)]
pub struct FakeAuthority {
    state: Mutex<DeviceState>,
}

impl FakeAuthority {
    pub fn new(state: DeviceState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// An active admin whose device meets nothing beyond the defaults.
    pub fn active() -> Self {
        Self::new(DeviceState {
            admin_active: true,
            password_sufficient: true,
            ..DeviceState::default()
        })
    }

    pub fn snapshot(&self) -> DeviceState {
        self.state.lock().unwrap().clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut DeviceState)) {
        let mut state = self.state.lock().unwrap();
        f(&mut *state);
    }
}

impl EnforcementAuthority for FakeAuthority {
    fn is_admin_active(&self) -> bool {
        self.state.lock().unwrap().admin_active
    }

    fn password_minimum_length(&self) -> u32 {
        self.state.lock().unwrap().min_length
    }

    fn password_quality(&self) -> PasswordQuality {
        self.state.lock().unwrap().quality
    }

    fn is_active_password_sufficient(&self) -> bool {
        self.state.lock().unwrap().password_sufficient
    }

    fn maximum_time_to_lock_millis(&self) -> u64 {
        self.state.lock().unwrap().time_to_lock_millis
    }

    fn set_password_quality(&self, quality: PasswordQuality) {
        self.update(|s| {
            s.quality = quality;
            s.setter_calls += 1;
        });
    }

    fn set_password_minimum_length(&self, length: u32) {
        self.update(|s| {
            s.min_length = length;
            s.setter_calls += 1;
        });
    }

    fn set_maximum_time_to_lock_millis(&self, millis: u64) {
        self.update(|s| {
            s.time_to_lock_millis = millis;
            s.setter_calls += 1;
        });
    }

    fn set_maximum_failed_passwords_for_wipe(&self, attempts: u32) {
        self.update(|s| {
            s.max_failed_for_wipe = attempts;
            s.setter_calls += 1;
        });
    }

    fn wipe_data(&self) {
        self.update(|s| s.wiped = true);
    }
}

/// In-memory account rows that counts how often it is scanned.
#[derive(Debug, Default)]
pub struct FakeStore {
    rows: Mutex<Vec<(AccountId, u32)>>,
    scans: AtomicUsize,
}

impl FakeStore {
    pub fn with_rows(rows: &[(AccountId, u32)]) -> Self {
        Self {
            rows: Mutex::new(rows.to_vec()),
            scans: AtomicUsize::new(0),
        }
    }

    pub fn upsert(&self, account: AccountId, flags: u32) {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|(id, _)| *id == account) {
            Some(row) => row.1 = flags,
            None => rows.push((account, flags)),
        }
    }

    pub fn remove(&self, account: AccountId) {
        self.rows.lock().unwrap().retain(|(id, _)| *id != account);
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl AccountStore for FakeStore {
    fn security_flags(&self) -> Vec<(AccountId, u32)> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .unwrap()
            .iter()
            .copied()
            .filter(|(_, flags)| *flags != 0)
            .collect()
    }
}
