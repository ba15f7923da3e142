// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight refresh coordinator.
//!
//! At most one refresh call runs per tab. The first caller that finds the
//! state `Idle` moves it to `InFlight` and spawns the network call; everyone
//! arriving while it runs subscribes to the same `watch` channel and gets the
//! identical outcome. The check and the transition happen under a synchronous
//! lock that is never held across an `.await`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::credential::{AuthResponse, ClearReason, Credential, CredentialStore};
use crate::error::SessionError;
use crate::events::SessionEvent;

/// Outcome shared with every waiter of one refresh cycle.
pub type RefreshOutcome = Result<Credential, SessionError>;

pub const EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";

/// What caused a refresh cycle. Startup failures are silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// A request found the stored token expired.
    Expired,
    /// Restoring a session when the app starts.
    Startup,
    /// Explicitly requested by the user.
    Manual,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Startup => "startup",
            Self::Manual => "manual",
        }
    }
}

type OutcomeTx = watch::Sender<Option<RefreshOutcome>>;
type OutcomeRx = watch::Receiver<Option<RefreshOutcome>>;

enum RefreshState {
    Idle,
    InFlight { cycle: u64, outcome: OutcomeRx },
}

pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    store: Arc<CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
    login_path: String,
    cycles: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<CredentialStore>,
        events: broadcast::Sender<SessionEvent>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
            store,
            events,
            login_path: login_path.into(),
            cycles: AtomicU64::new(0),
        }
    }

    /// Return a credential fresher than `current_token`.
    ///
    /// If the store already holds a different, unexpired credential (another
    /// caller refreshed first) it is returned without a network call.
    /// Otherwise this joins the in-flight cycle or starts one with `refresh`.
    pub async fn ensure_fresh_credential<F, Fut>(
        self: &Arc<Self>,
        current_token: &str,
        trigger: RefreshTrigger,
        refresh: F,
    ) -> RefreshOutcome
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<AuthResponse, SessionError>> + Send + 'static,
    {
        let (rx, lead) = {
            let mut state = self.state.lock();
            if matches!(*state, RefreshState::Idle) {
                if let Some(cred) = self.store.get() {
                    if cred.access_token != current_token && !cred.is_expired() {
                        return Ok(cred);
                    }
                }
            }
            self.enter(&mut state, trigger)
        };
        if let Some((cycle, tx)) = lead {
            self.launch(cycle, trigger, tx, refresh);
        }
        wait_outcome(rx).await
    }

    /// Join the in-flight cycle, or start one even if the stored token is
    /// still valid.
    pub async fn refresh<F, Fut>(self: &Arc<Self>, trigger: RefreshTrigger, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<AuthResponse, SessionError>> + Send + 'static,
    {
        let (rx, lead) = self.enter(&mut self.state.lock(), trigger);
        if let Some((cycle, tx)) = lead {
            self.launch(cycle, trigger, tx, refresh);
        }
        wait_outcome(rx).await
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::InFlight { .. })
    }

    /// Number of refresh cycles started so far.
    pub fn cycles_started(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Join the in-flight cycle, or move `Idle -> InFlight` and hand back
    /// the sender the caller must [`launch`](Self::launch). Caller holds the
    /// state lock.
    fn enter(&self, state: &mut RefreshState, trigger: RefreshTrigger) -> (OutcomeRx, Option<(u64, OutcomeTx)>) {
        if let RefreshState::InFlight { outcome, .. } = state {
            return (outcome.clone(), None);
        }
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = watch::channel(None);
        *state = RefreshState::InFlight { cycle, outcome: rx.clone() };
        tracing::debug!(cycle, trigger = trigger.as_str(), "refresh cycle started");
        (rx, Some((cycle, tx)))
    }

    /// Spawn the network call for `cycle`. Must run after the state lock is
    /// released: the guard takes it again if the task is dropped early.
    fn launch<F, Fut>(self: &Arc<Self>, cycle: u64, trigger: RefreshTrigger, tx: OutcomeTx, refresh: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<AuthResponse, SessionError>> + Send + 'static,
    {
        // Spawned so that a cancelled leader never strands its waiters.
        let guard = CycleGuard { coordinator: Arc::clone(self), cycle, trigger, tx };
        tokio::spawn(async move {
            let outcome = refresh()
                .await
                .map(Credential::from)
                .map_err(SessionError::into_session_expired);
            guard.finish(outcome);
        });
    }

    fn finish_cycle(
        &self,
        cycle: u64,
        trigger: RefreshTrigger,
        tx: &OutcomeTx,
        outcome: RefreshOutcome,
    ) {
        match outcome {
            Ok(ref cred) => {
                self.store.set(cred.clone());
                info!(cycle, user = %cred.user.user_id, "session refreshed");
                let _ = self.events.send(SessionEvent::SignedIn { user: cred.user.clone() });
            }
            Err(ref e) => {
                self.store.clear(ClearReason::RefreshFailed);
                if trigger == RefreshTrigger::Startup {
                    tracing::debug!(cycle, err = %e, "no session to restore");
                } else {
                    warn!(cycle, err = %e, "session refresh failed");
                    let _ = self
                        .events
                        .send(SessionEvent::SessionExpired { login_path: self.login_path.clone() });
                    let _ = self.events.send(SessionEvent::warning(None, EXPIRED_NOTICE));
                }
            }
        }

        let mut state = self.state.lock();
        tx.send_replace(Some(outcome));
        if matches!(*state, RefreshState::InFlight { cycle: c, .. } if c == cycle) {
            *state = RefreshState::Idle;
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .field("cycles", &self.cycles_started())
            .finish()
    }
}

/// Owns one cycle's sender. If the refresh task dies before finishing, the
/// cycle is failed like any other refresh failure.
struct CycleGuard {
    coordinator: Arc<RefreshCoordinator>,
    cycle: u64,
    trigger: RefreshTrigger,
    tx: OutcomeTx,
}

impl CycleGuard {
    fn finish(self, outcome: RefreshOutcome) {
        self.coordinator.finish_cycle(self.cycle, self.trigger, &self.tx, outcome);
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        let abandoned = matches!(
            *self.coordinator.state.lock(),
            RefreshState::InFlight { cycle, .. } if cycle == self.cycle
        );
        if abandoned {
            warn!(cycle = self.cycle, "refresh cycle abandoned");
            let err = SessionError::session_expired("refresh was abandoned");
            self.coordinator.finish_cycle(self.cycle, self.trigger, &self.tx, Err(err));
        }
    }
}

async fn wait_outcome(mut rx: OutcomeRx) -> RefreshOutcome {
    match rx.wait_for(Option::is_some).await {
        Ok(outcome) => match &*outcome {
            Some(result) => result.clone(),
            None => Err(SessionError::session_expired("refresh produced no outcome")),
        },
        Err(_) => Err(SessionError::session_expired("refresh was abandoned")),
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
