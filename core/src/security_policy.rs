//! The process-wide coordinator for account security policies.
//!
//! [`SecurityPolicy`] owns the enforcement authority, the account store and
//! a cached aggregate of every account's policy. It is built once by the
//! process entry point and shared by reference (or `Arc`) with everything
//! that needs to check or apply policies.
//!
//! All cache reads, writes and lazy recomputes go through one mutex, so only
//! one thread scans the store at a time and an invalidation is never lost to
//! a concurrent recompute.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::aggregate::PolicyAggregator;
use crate::authority::{AccountId, AccountStore, EnforcementAuthority};
use crate::config::SecurityPolicyConfig;
use crate::error::{PolicyError, PolicyResult};
use crate::evaluator::{PolicyEvaluator, Verdict};
use crate::record::PolicyRecord;

/// Mutable state behind the instance lock.
#[derive(Debug, Default)]
struct CacheState {
    aggregate: Option<PolicyRecord>,
    notification_active: bool,
}

/// Coordinates policy checks and enforcement for all accounts.
#[derive(Debug)]
pub struct SecurityPolicy<A, S> {
    authority: A,
    store: S,
    evaluator: PolicyEvaluator,
    state: Mutex<CacheState>,
}

impl<A, S> SecurityPolicy<A, S>
where
    A: EnforcementAuthority,
    S: AccountStore,
{
    /// Creates the coordinator from its collaborators and configuration.
    pub fn new(authority: A, store: S, config: &SecurityPolicyConfig) -> Self {
        Self::with_evaluator(authority, store, config.evaluator())
    }

    /// Creates the coordinator with an explicit evaluator, e.g. custom limits.
    pub fn with_evaluator(authority: A, store: S, evaluator: PolicyEvaluator) -> Self {
        if evaluator.debug_always_active() {
            warn!("security policy created with the always-active debug override");
        }
        Self {
            authority,
            store,
            evaluator,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The enforcement authority.
    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// The account store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The evaluator used for every check.
    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        // The state holds plain values that are never left half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scans the store and merges every account's policy, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidEncoding`] if any stored flags are corrupt.
    pub fn compute_aggregate_policy(&self) -> PolicyResult<PolicyRecord> {
        let mut aggregator = PolicyAggregator::new();
        for (account, flags) in self.store.security_flags() {
            if flags == 0 {
                continue;
            }
            let record = PolicyRecord::decode(flags).map_err(|err| {
                warn!(account, flags, %err, "stored security flags do not decode");
                err
            })?;
            aggregator.add(&record);
        }
        let accounts = aggregator.contributed();
        let aggregate = aggregator.finish();
        debug!(accounts, %aggregate, "computed aggregate policy");
        Ok(aggregate)
    }

    /// The cached aggregate policy, recomputed first if it was invalidated.
    ///
    /// # Errors
    ///
    /// Propagates decode failures from [`SecurityPolicy::compute_aggregate_policy`];
    /// the cache stays empty in that case.
    pub fn aggregate_policy(&self) -> PolicyResult<PolicyRecord> {
        let mut state = self.lock_state();
        if let Some(aggregate) = state.aggregate {
            return Ok(aggregate);
        }
        let aggregate = self.compute_aggregate_policy()?;
        state.aggregate = Some(aggregate);
        Ok(aggregate)
    }

    /// Drops the cached aggregate after an account's policy changed, was
    /// added or was removed.
    pub fn invalidate(&self, account: AccountId) {
        let mut state = self.lock_state();
        state.aggregate = None;
        debug!(account, "aggregate policy invalidated");
    }

    /// Drops the cached aggregate for a change not tied to one account, such
    /// as a device-admin transition.
    pub fn invalidate_all(&self) {
        let mut state = self.lock_state();
        state.aggregate = None;
        debug!("aggregate policy invalidated for all accounts");
    }

    /// Whether the device could ever honour `policy`.
    pub fn is_supported(&self, policy: &PolicyRecord) -> bool {
        self.evaluator.is_supported(policy)
    }

    /// Checks `policy`, or the aggregate of all accounts when `None`, against
    /// the authority's current state.
    ///
    /// # Errors
    ///
    /// Fails only when the aggregate is needed and stored flags are corrupt.
    pub fn evaluate(&self, policy: Option<&PolicyRecord>) -> PolicyResult<Verdict> {
        if let Some(verdict) = self.evaluator.admin_verdict(&self.authority) {
            return Ok(verdict);
        }
        let policy = match policy {
            Some(policy) => *policy,
            None => self.aggregate_policy()?,
        };
        Ok(PolicyEvaluator::check_requirements(&policy, &self.authority))
    }

    /// Shorthand for `evaluate(..)?.is_satisfied()`.
    ///
    /// # Errors
    ///
    /// See [`SecurityPolicy::evaluate`].
    pub fn is_satisfied(&self, policy: Option<&PolicyRecord>) -> PolicyResult<bool> {
        self.evaluate(policy).map(|verdict| verdict.is_satisfied())
    }

    /// Whether this process is an active device administrator.
    pub fn is_active_admin(&self) -> bool {
        self.authority.is_admin_active()
    }

    /// Pushes the aggregate policy onto the authority.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotAdmin`] without touching the authority when
    /// this process is not an active administrator, or a decode error from
    /// the aggregate scan.
    pub fn apply_active_policies(&self) -> PolicyResult<()> {
        if !self.authority.is_admin_active() {
            return Err(PolicyError::NotAdmin);
        }
        let policy = self.aggregate_policy()?;
        PolicyEvaluator::apply(&policy, &self.authority);
        info!(%policy, "applied aggregate policy");
        Ok(())
    }

    /// Erases the device on a server's request. There is no confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotAdmin`] when the wipe cannot be issued.
    pub fn remote_wipe(&self, account: AccountId) -> PolicyResult<()> {
        if !self.authority.is_admin_active() {
            warn!(account, "remote wipe requested without device admin");
            return Err(PolicyError::NotAdmin);
        }
        warn!(account, "remote wipe requested, wiping device");
        self.authority.wipe_data();
        Ok(())
    }

    /// Records that `account` cannot sync because policies are unmet.
    ///
    /// Returns `true` when the caller should post the "security update
    /// needed" notification, i.e. none is currently showing.
    pub fn policies_required(&self, account: AccountId) -> bool {
        let mut state = self.lock_state();
        if state.notification_active {
            return false;
        }
        state.notification_active = true;
        info!(account, "security policies required, notification requested");
        true
    }

    /// Records that the notification was dismissed so a later
    /// [`SecurityPolicy::policies_required`] can raise it again.
    pub fn clear_notification(&self, account: AccountId) {
        let mut state = self.lock_state();
        state.notification_active = false;
        debug!(account, "security notification cleared");
    }
}
