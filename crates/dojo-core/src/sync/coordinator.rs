//! Runs syncs on demand and when connectivity returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::Reconciler;
use crate::auth::IdentityProvider;
use crate::connectivity::ConnectivityMonitor;
use crate::db::LocalCacheStore;
use crate::remote::RemoteSource;
use crate::state::SyncState;
use crate::util::unix_timestamp_millis;
use crate::{Error, Result};

const DEFAULT_REARM_SECS: u64 = 3;

/// Coordinator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// How long `Success`/`Failed` stay visible before falling back to `Idle`.
    /// `None` keeps them until the next trigger.
    pub rearm_delay: Option<Duration>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            rearm_delay: Some(Duration::from_secs(DEFAULT_REARM_SECS)),
        }
    }
}

/// At most one sync in flight; state is published on a watch channel.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    remote: Arc<dyn RemoteSource>,
    reconciler: Reconciler,
    cache: LocalCacheStore,
    identity: Arc<dyn IdentityProvider>,
    online: watch::Receiver<bool>,
    state: watch::Sender<SyncState>,
    generation: AtomicU64,
    settings: SyncSettings,
}

impl SyncCoordinator {
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        cache: LocalCacheStore,
        identity: Arc<dyn IdentityProvider>,
        connectivity: &dyn ConnectivityMonitor,
        settings: SyncSettings,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            inner: Arc::new(Inner {
                remote,
                reconciler: Reconciler::new(cache.clone()),
                cache,
                identity,
                online: connectivity.observe_connectivity(),
                state,
                generation: AtomicU64::new(0),
                settings,
            }),
        }
    }

    pub fn observe_sync_state(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> SyncState {
        self.inner.state.borrow().clone()
    }

    pub fn is_online(&self) -> bool {
        *self.inner.online.borrow()
    }

    /// Run one sync on the current task and return the state it ended in.
    ///
    /// Offline, this does nothing and returns the current state. While
    /// another sync is running it returns `Running` without starting one.
    pub async fn sync_now(&self) -> SyncState {
        if !self.is_online() {
            tracing::debug!("Offline; sync request ignored");
            return self.current_state();
        }
        if !self.try_begin() {
            tracing::debug!("Sync already in flight; request ignored");
            return SyncState::Running;
        }

        let guard = RunningGuard {
            inner: &self.inner,
            armed: true,
        };
        let next = match self.run_once().await {
            Ok(()) => SyncState::Success,
            Err(error) => self.failure_state(error).await,
        };
        guard.finish(next.clone());
        next
    }

    /// Start a sync on the runtime.
    pub fn trigger_sync(&self) -> JoinHandle<SyncState> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.sync_now().await })
    }

    /// Sync every time connectivity goes from offline to online.
    ///
    /// The task ends when the connectivity source is dropped.
    pub fn watch_connectivity(&self) -> JoinHandle<()> {
        let mut online = self.inner.online.clone();
        let coordinator = self.clone();
        tokio::spawn(async move {
            let mut was_online = *online.borrow_and_update();
            while online.changed().await.is_ok() {
                let is_online = *online.borrow_and_update();
                if is_online && !was_online {
                    tracing::debug!("Connectivity restored; starting sync");
                    coordinator.sync_now().await;
                }
                was_online = is_online;
            }
        })
    }

    fn try_begin(&self) -> bool {
        let started = self.inner.state.send_if_modified(|state| {
            if state.is_running() {
                return false;
            }
            *state = SyncState::Running;
            true
        });
        if started {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
        }
        started
    }

    /// Auth failures without any identity are expected for signed-out
    /// users and end in `Idle`.
    async fn failure_state(&self, error: Error) -> SyncState {
        if is_auth_failure(&error) && !self.inner.identity.has_identity().await {
            tracing::info!("Sync skipped: remote store requires an identity ({})", error);
            return SyncState::Idle;
        }
        tracing::warn!("Sync failed: {}", error);
        SyncState::Failed(error.to_string())
    }

    async fn run_once(&self) -> Result<()> {
        let snapshot = self.inner.remote.fetch_all().await?;
        let summary = self.inner.reconciler.reconcile(snapshot).await?;
        tracing::info!(
            "Sync finished: {} records written, {} favorites kept",
            summary.written,
            summary.favorites_kept
        );

        if let Err(error) = self
            .inner
            .cache
            .record_sync_completed(unix_timestamp_millis())
            .await
        {
            tracing::warn!("Failed to record sync time: {}", error);
        }
        Ok(())
    }
}

fn is_auth_failure(error: &Error) -> bool {
    error.is_authorization() || matches!(error, Error::Auth(_))
}

/// Puts the state back to `Idle` if the sync is dropped before finishing.
struct RunningGuard<'a> {
    inner: &'a Arc<Inner>,
    armed: bool,
}

impl RunningGuard<'_> {
    fn finish(mut self, next: SyncState) {
        self.armed = false;
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let rearm = next.is_terminal();
        self.inner.state.send_replace(next);

        if let (true, Some(delay)) = (rearm, self.inner.settings.rearm_delay) {
            schedule_rearm(Arc::downgrade(self.inner), generation, delay);
        }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::debug!("Sync cancelled; returning to idle");
        self.inner.state.send_if_modified(|state| {
            if !state.is_running() {
                return false;
            }
            *state = SyncState::Idle;
            true
        });
    }
}

/// Return a terminal state to `Idle` unless something newer happened first.
fn schedule_rearm(inner: Weak<Inner>, generation: u64, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        if inner.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        inner.state.send_if_modified(|state| {
            if !state.is_terminal() {
                return false;
            }
            *state = SyncState::Idle;
            true
        });
    });
}
