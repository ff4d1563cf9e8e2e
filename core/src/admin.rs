//! Device-administrator lifecycle.
//!
//! The host reports admin activation and deactivation as events; the
//! lifecycle turns them into a two-state machine and runs the matching
//! transition against the [`SecurityPolicy`] it is handed.
//!
//! ```text
//!            Enabled
//!  Disabled ─────────▶ Enabled    invalidate cache, apply aggregate policy
//!  Enabled  ─────────▶ Disabled   invalidate cache
//!           Disabled
//! ```

use std::fmt;

use tracing::info;

use crate::authority::{AccountStore, EnforcementAuthority};
use crate::error::{PolicyError, PolicyResult};
use crate::security_policy::SecurityPolicy;

/// Whether this process currently holds device-admin rights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AdminState {
    /// Not an administrator.
    #[default]
    Disabled,
    /// Active administrator.
    Enabled,
}

impl AdminState {
    /// Human-readable name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
        }
    }
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications delivered by the host about device-admin status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminEvent {
    /// The administrator was enabled.
    Enabled,
    /// The administrator is about to be disabled.
    Disabled,
    /// The user changed the device password.
    PasswordChanged,
    /// The user failed to enter the device password.
    PasswordFailed,
}

/// What handling an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the event.
    pub from: AdminState,
    /// State after the event.
    pub to: AdminState,
}

impl Transition {
    /// Returns `true` when the state actually changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Tracks admin state across host callbacks.
#[derive(Debug, Default)]
pub struct AdminLifecycle {
    state: AdminState,
}

impl AdminLifecycle {
    /// Starts in [`AdminState::Disabled`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts in the given state, e.g. when admin was already active at boot.
    #[must_use]
    pub const fn with_state(state: AdminState) -> Self {
        Self { state }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AdminState {
        self.state
    }

    /// Handles one host event.
    ///
    /// Repeating the event for the current state, and the password
    /// notifications, leave the state and the policy untouched.
    ///
    /// # Errors
    ///
    /// Propagates failures from applying policies on enable. The state still
    /// moves to [`AdminState::Enabled`]: the host has granted the rights
    /// whether or not the first apply succeeded.
    pub fn handle<A, S>(
        &mut self,
        event: AdminEvent,
        policy: &SecurityPolicy<A, S>,
    ) -> PolicyResult<Transition>
    where
        A: EnforcementAuthority,
        S: AccountStore,
    {
        let from = self.state;
        let to = match (from, event) {
            (AdminState::Disabled, AdminEvent::Enabled) => AdminState::Enabled,
            (AdminState::Enabled, AdminEvent::Disabled) => AdminState::Disabled,
            _ => from,
        };
        let transition = Transition { from, to };
        if !transition.changed() {
            return Ok(transition);
        }

        self.state = to;
        info!(%from, %to, "device admin state changed");
        policy.invalidate_all();
        if to == AdminState::Enabled {
            match policy.apply_active_policies() {
                // The host may report the event before the authority agrees.
                Ok(()) | Err(PolicyError::NotAdmin) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(transition)
    }
}
