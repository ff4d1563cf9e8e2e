//! Strictest-wins merge of many policy records.
//!
//! | field                     | reducer                        |
//! |---------------------------|--------------------------------|
//! | `min_password_length`     | max                            |
//! | `password_mode`           | max (strongest)                |
//! | `max_password_failures`   | min over enforced (non-zero)   |
//! | `max_screen_lock_seconds` | min over enforced (non-zero)   |
//! | `require_remote_wipe`     | or                             |
//!
//! Every reducer is commutative and associative, so the result does not
//! depend on the order in which records arrive.

use crate::record::{PasswordMode, PolicyRecord, EMPTY_POLICY};

/// Running maximum that remembers whether it saw any value.
#[derive(Debug, Clone, Copy, Default)]
struct MaxField<T> {
    value: Option<T>,
}

impl<T: Ord + Copy> MaxField<T> {
    fn offer(&mut self, candidate: T) {
        self.value = Some(match self.value {
            Some(current) => current.max(candidate),
            None => candidate,
        });
    }

    fn resolve(self, unset: T) -> T {
        self.value.unwrap_or(unset)
    }
}

/// Running minimum over enforced values only; `0` means "not enforced" and
/// never constrains the result.
#[derive(Debug, Clone, Copy, Default)]
struct EnforcedMinField {
    value: Option<u32>,
}

impl EnforcedMinField {
    fn offer(&mut self, candidate: u32) {
        if candidate == 0 {
            return;
        }
        self.value = Some(match self.value {
            Some(current) => current.min(candidate),
            None => candidate,
        });
    }

    fn resolve(self) -> u32 {
        self.value.unwrap_or(0)
    }
}

/// Accumulates policy records into one aggregate.
///
/// Feed records with [`PolicyAggregator::add`] and read the result with
/// [`PolicyAggregator::finish`]. Empty records are skipped; when nothing
/// contributed, the result is exactly [`EMPTY_POLICY`].
#[derive(Debug, Clone, Default)]
pub struct PolicyAggregator {
    contributed: usize,
    min_password_length: MaxField<u32>,
    password_mode: MaxField<PasswordMode>,
    max_password_failures: EnforcedMinField,
    max_screen_lock_seconds: EnforcedMinField,
    require_remote_wipe: bool,
}

impl PolicyAggregator {
    /// Creates an aggregator with no contributions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one record into the aggregate.
    pub fn add(&mut self, record: &PolicyRecord) {
        if record.is_empty() {
            return;
        }
        self.contributed += 1;
        self.min_password_length.offer(record.min_password_length());
        self.password_mode.offer(record.password_mode());
        self.max_password_failures
            .offer(record.max_password_failures());
        self.max_screen_lock_seconds
            .offer(record.max_screen_lock_seconds());
        self.require_remote_wipe |= record.require_remote_wipe();
    }

    /// Number of non-empty records folded in so far.
    #[must_use]
    pub const fn contributed(&self) -> usize {
        self.contributed
    }

    /// Produces the aggregate policy.
    #[must_use]
    pub fn finish(self) -> PolicyRecord {
        if self.contributed == 0 {
            return EMPTY_POLICY;
        }
        // Each reducer only keeps a value some input record already held.
        PolicyRecord::from_validated(
            self.min_password_length.resolve(0),
            self.password_mode.resolve(PasswordMode::None),
            self.max_password_failures.resolve(),
            self.max_screen_lock_seconds.resolve(),
            self.require_remote_wipe,
        )
    }

    /// Merges a whole sequence of records in one call.
    pub fn merge<'a, I>(records: I) -> PolicyRecord
    where
        I: IntoIterator<Item = &'a PolicyRecord>,
    {
        let mut aggregator = Self::new();
        for record in records {
            aggregator.add(record);
        }
        aggregator.finish()
    }
}

impl<'a> Extend<&'a PolicyRecord> for PolicyAggregator {
    fn extend<I: IntoIterator<Item = &'a PolicyRecord>>(&mut self, iter: I) {
        for record in iter {
            self.add(record);
        }
    }
}
