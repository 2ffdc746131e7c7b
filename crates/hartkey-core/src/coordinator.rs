// ── Sync coordinator ──
//
// Owns the auth context and the device registry, drives the polling loop
// and relays open commands. At most one poll cycle runs at any time: the
// `Schedule` flag is the single-flight guard, and every path that wants a
// cycle (timer, manual refresh, post-open follow-up) goes through it.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use hartkey_api::{HartkeyClient, TransportConfig};
use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::{Mutex, Notify, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::backoff::RetryPolicy;
use crate::config::SyncConfig;
use crate::error::{CoreError, ErrorKind};
use crate::gateway::{self, Gateway, dedupe_devices};
use crate::model::{
    Device, DeviceId, DeviceState, OpenEvent, latest_event, newer_event,
};
use crate::store::{Registry, RegistryDiff, RegistrySnapshot};

const UPDATE_CHANNEL_CAPACITY: usize = 64;

// ── Public state types ───────────────────────────────────────────────

/// Where the coordinator is in its poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    Polling,
    Success,
    Failed(ErrorKind),
    /// Terminal. Set by `shutdown`.
    Stopped,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Polling => f.write_str("polling"),
            Self::Success => f.write_str("success"),
            Self::Failed(kind) => write!(f, "failed ({kind})"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// Published to subscribers once per completed poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SyncUpdate {
    pub added: Vec<Device>,
    pub updated: Vec<DeviceState>,
    pub removed: Vec<DeviceId>,
    /// The cycle failed and every device is now unavailable.
    pub unavailable: bool,
    pub error: Option<ErrorKind>,
    /// The cycle succeeded but at least one device's events could not be
    /// fetched. Holds the first such failure; those devices are unavailable.
    pub degraded: Option<ErrorKind>,
    pub completed_at: DateTime<Utc>,
}

impl SyncUpdate {
    fn success(diff: RegistryDiff, degraded: Option<ErrorKind>) -> Self {
        Self {
            added: diff.added,
            updated: diff.updated,
            removed: diff.removed,
            unavailable: false,
            error: None,
            degraded,
            completed_at: Utc::now(),
        }
    }

    fn failure(kind: ErrorKind, diff: RegistryDiff) -> Self {
        Self {
            added: Vec::new(),
            updated: diff.updated,
            removed: Vec::new(),
            unavailable: true,
            error: Some(kind),
            degraded: None,
            completed_at: Utc::now(),
        }
    }

    /// The device list was fetched. Individual devices may still be
    /// unavailable, see [`degraded`](Self::degraded).
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The failure the next cycle's retry delay is based on, if any.
    pub fn retry_reason(&self) -> Option<ErrorKind> {
        self.error.or(self.degraded)
    }

    /// Cycle outcome as a [`SyncState`].
    pub fn outcome(&self) -> SyncState {
        self.error.map_or(SyncState::Success, SyncState::Failed)
    }

    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty())
    }
}

// ── Coordinator ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Schedule {
    /// A poll cycle is in flight.
    polling: bool,
    /// A cycle was requested and has not started yet.
    pending: bool,
}

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Build with
/// [`new`](Self::new) or [`from_config`](Coordinator::from_config), then
/// [`start`](Self::start) the background loop or drive cycles by hand
/// with [`refresh`](Self::refresh).
pub struct Coordinator<G: Gateway> {
    inner: Arc<CoordinatorInner<G>>,
}

impl<G: Gateway> Clone for Coordinator<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CoordinatorInner<G> {
    config: SyncConfig,
    gateway: G,
    auth: AuthContext,
    registry: Registry,
    state: watch::Sender<SyncState>,
    updates: broadcast::Sender<Arc<SyncUpdate>>,
    last_update: ArcSwapOption<SyncUpdate>,
    schedule: StdMutex<Schedule>,
    /// Wakes the loop for a pending cycle.
    wake: Notify,
    /// Fired whenever a cycle ends, completed or abandoned.
    cycle_done: Notify,
    cycles: AtomicU64,
    /// `start` spawned the loop and it has not exited.
    looping: AtomicBool,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// A coordinator backed by the Hartkey cloud API.
pub type CloudCoordinator = Coordinator<HartkeyClient>;

impl Coordinator<HartkeyClient> {
    /// Build a coordinator backed by the Hartkey cloud API.
    pub fn from_config(config: SyncConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = HartkeyClient::new(config.endpoints.clone(), &transport)?;
        Ok(Self::new(config, client))
    }
}

impl<G: Gateway> Coordinator<G> {
    /// Create a coordinator. Does not poll: call [`start`](Self::start)
    /// or [`refresh`](Self::refresh).
    pub fn new(config: SyncConfig, gateway: G) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let auth = AuthContext::new(config.token.clone());

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                gateway,
                auth,
                registry: Registry::new(),
                state,
                updates,
                last_update: ArcSwapOption::empty(),
                schedule: StdMutex::new(Schedule::default()),
                wake: Notify::new(),
                cycle_done: Notify::new(),
                cycles: AtomicU64::new(0),
                looping: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the polling loop. The first cycle runs immediately.
    /// Calling `start` on a running coordinator is a no-op.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }
        let mut task = self.inner.task.lock().await;
        if task.is_none() {
            info!(
                interval_minutes = self.inner.config.interval_minutes(),
                "starting sync loop"
            );
            self.inner.looping.store(true, Ordering::Release);
            *task = Some(tokio::spawn(sync_task(self.clone())));
        }
        Ok(())
    }

    /// Stop polling for good. Aborts a pending sleep, abandons an
    /// in-flight cycle and waits for the loop to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.inner.state.send_replace(SyncState::Stopped);
        debug!("coordinator stopped");
    }

    // ── Reads ────────────────────────────────────────────────────

    /// The latest complete snapshot. Never blocks.
    pub fn current_snapshot(&self) -> Arc<RegistrySnapshot> {
        self.inner.registry.current()
    }

    /// Receive one [`SyncUpdate`] per completed cycle.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SyncUpdate>> {
        self.inner.updates.subscribe()
    }

    /// Live coordinator state.
    ///
    /// A cycle moves through `Polling` and then `Success` or `Failed` back to
    /// `Idle` in one step, so watchers mostly observe `Idle` and `Polling`.
    /// Read [`last_outcome`](Self::last_outcome) for how the last cycle ended.
    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// The update published by the most recent completed cycle.
    pub fn last_update(&self) -> Option<Arc<SyncUpdate>> {
        self.inner.last_update.load_full()
    }

    /// `Success` or `Failed(kind)` for the most recent completed cycle.
    /// `None` before the first cycle completes.
    pub fn last_outcome(&self) -> Option<SyncState> {
        self.last_update().as_deref().map(SyncUpdate::outcome)
    }

    /// Number of poll cycles that ran to completion.
    pub fn cycles_completed(&self) -> u64 {
        self.inner.cycles.load(Ordering::Acquire)
    }

    pub fn auth(&self) -> &AuthContext {
        &self.inner.auth
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Ask the loop for a cycle as soon as possible.
    ///
    /// Returns `false` when a cycle is already in flight: the request is
    /// coalesced into it rather than queued.
    pub fn request_refresh(&self) -> bool {
        {
            let mut schedule = self.schedule();
            if schedule.polling {
                debug!("refresh coalesced into in-flight cycle");
                return false;
            }
            schedule.pending = true;
        }
        self.inner.wake.notify_one();
        true
    }

    /// Run a poll cycle now and wait for its outcome. Joins the in-flight
    /// cycle if there is one.
    pub async fn refresh(&self) -> Result<Arc<SyncUpdate>, CoreError> {
        let inner = &self.inner;
        loop {
            if inner.cancel.is_cancelled() {
                return Err(CoreError::Stopped);
            }

            let done = inner.cycle_done.notified();
            tokio::pin!(done);
            done.as_mut().enable();
            let seen = inner.cycles.load(Ordering::Acquire);

            if let Some(guard) = self.begin_cycle() {
                let outcome = tokio::select! {
                    biased;
                    () = inner.cancel.cancelled() => None,
                    update = self.run_cycle() => Some(update),
                };
                drop(guard);
                return outcome.ok_or_else(|| {
                    debug!("poll cycle abandoned on shutdown");
                    inner.state.send_replace(SyncState::Stopped);
                    CoreError::Stopped
                });
            }

            debug!("poll cycle already in flight; joining it");
            tokio::select! {
                biased;
                () = inner.cancel.cancelled() => return Err(CoreError::Stopped),
                () = done.as_mut() => {}
            }
            if inner.cycles.load(Ordering::Acquire) != seen {
                if let Some(update) = inner.last_update.load_full() {
                    return Ok(update);
                }
            }
            // The joined cycle was abandoned; try to run one ourselves.
        }
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Open the door or gate behind `device_id`.
    ///
    /// On success a follow-up refresh is scheduled after the configured
    /// settle delay. It always starts after this call returned, even when
    /// a cycle is in flight right now, and it runs whether or not the loop
    /// was [`start`](Self::start)ed. `DeviceBusy` is returned as-is and
    /// leaves the registry untouched.
    pub async fn trigger_open(&self, device_id: &DeviceId) -> Result<(), CoreError> {
        let inner = &self.inner;
        if inner.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }

        let snapshot = inner.registry.current();
        let state = snapshot
            .get(device_id)
            .ok_or_else(|| CoreError::DeviceNotFound {
                device_id: device_id.clone(),
            })?;
        if !state.device.can_open {
            return Err(CoreError::OpenUnsupported {
                device_id: device_id.clone(),
            });
        }

        let token = inner.auth.current_token()?;
        match inner.gateway.trigger_open(&token, device_id).await {
            Ok(()) => {
                info!(device_id = %device_id, "open command accepted");
                self.schedule_follow_up();
                Ok(())
            }
            Err(e) => {
                self.reject_token(&token, &e);
                warn!(device_id = %device_id, error = %e, "open command failed");
                Err(e)
            }
        }
    }

    /// Fetch recent events for one device, newest first, without touching
    /// the registry.
    pub async fn recent_events(
        &self,
        device_id: &DeviceId,
        limit: u32,
    ) -> Result<Vec<OpenEvent>, CoreError> {
        let token = self.inner.auth.current_token()?;
        match self
            .inner
            .gateway
            .list_recent_events(&token, device_id, limit)
            .await
        {
            Ok(mut events) => {
                events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                Ok(events)
            }
            Err(e) => {
                self.reject_token(&token, &e);
                Err(e)
            }
        }
    }

    /// Install a new token and poll with it as soon as possible.
    pub fn replace_token(&self, token: SecretString) {
        self.inner.auth.replace_token(token);
        info!("token replaced");
        // Not coalesced: an in-flight cycle is still using the old token.
        self.mark_pending();
    }

    /// Check a candidate token against the remote without touching any
    /// coordinator state.
    pub async fn validate_token(&self, token: &SecretString) -> Result<usize, CoreError> {
        gateway::validate_token(&self.inner.gateway, token).await
    }

    // ── Internals ────────────────────────────────────────────────

    fn schedule(&self) -> MutexGuard<'_, Schedule> {
        self.inner
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_cycle(&self) -> Option<CycleGuard<'_, G>> {
        let mut schedule = self.schedule();
        if schedule.polling {
            return None;
        }
        schedule.polling = true;
        schedule.pending = false;
        Some(CycleGuard { inner: &self.inner })
    }

    fn is_pending(&self) -> bool {
        self.schedule().pending
    }

    fn mark_pending(&self) {
        self.schedule().pending = true;
        self.inner.wake.notify_one();
    }

    fn is_looping(&self) -> bool {
        self.inner.looping.load(Ordering::Acquire)
    }

    fn schedule_follow_up(&self) {
        let delay = self.inner.config.open_settle_delay;
        if delay.is_zero() && self.is_looping() {
            self.mark_pending();
            return;
        }
        let coordinator = self.clone();
        tokio::spawn(async move {
            let cancel = coordinator.inner.cancel.clone();
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = coordinator.follow_up(delay) => {}
            }
        });
    }

    async fn follow_up(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        debug!("follow-up refresh after open");
        self.mark_pending();
        if self.is_looping() {
            return;
        }
        // Nobody else serves the request. Joining a cycle that was already
        // in flight leaves it pending, so keep going until one started
        // after the mark.
        while self.is_pending() {
            if self.refresh().await.is_err() {
                break;
            }
        }
    }

    fn set_state(&self, next: SyncState) {
        self.inner.state.send_if_modified(|current| {
            if *current == SyncState::Stopped || *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn reject_token(&self, token: &Arc<SecretString>, err: &CoreError) {
        if err.is_auth() && self.inner.auth.reject(token) {
            warn!("token rejected by remote; reauthentication required");
        }
    }

    /// One full poll cycle. Must only run under a [`CycleGuard`].
    async fn run_cycle(&self) -> Arc<SyncUpdate> {
        let inner = &self.inner;
        self.set_state(SyncState::Polling);
        let started = Instant::now();

        let update = match self.poll().await {
            Ok((snapshot, degraded)) => {
                let devices = snapshot.len();
                let diff = inner.registry.replace(snapshot);
                info!(
                    devices,
                    added = diff.added.len(),
                    updated = diff.updated.len(),
                    removed = diff.removed.len(),
                    degraded = ?degraded,
                    elapsed = ?started.elapsed(),
                    "poll cycle succeeded"
                );
                self.set_state(SyncState::Success);
                SyncUpdate::success(diff, degraded)
            }
            Err(e) => {
                let kind = e.kind().unwrap_or(ErrorKind::Protocol);
                warn!(error = %e, %kind, "poll cycle failed");
                let diff = inner.registry.mark_unavailable();
                self.set_state(SyncState::Failed(kind));
                SyncUpdate::failure(kind, diff)
            }
        };

        let update = Arc::new(update);
        inner.last_update.store(Some(Arc::clone(&update)));
        inner.cycles.fetch_add(1, Ordering::AcqRel);
        // No receivers is fine.
        let _ = inner.updates.send(Arc::clone(&update));
        self.set_state(SyncState::Idle);
        update
    }

    /// Fetch devices and events and assemble the next snapshot, plus the
    /// first per-device failure if any. Reads the registry but never
    /// writes it.
    async fn poll(&self) -> Result<(RegistrySnapshot, Option<ErrorKind>), CoreError> {
        let inner = &self.inner;
        let token = inner.auth.current_token()?;

        let devices = match inner.gateway.list_devices(&token).await {
            Ok(devices) => dedupe_devices(devices),
            Err(e) => {
                self.reject_token(&token, &e);
                return Err(e);
            }
        };
        debug!(devices = devices.len(), "device list fetched");

        let previous = inner.registry.current();
        let gateway = &inner.gateway;
        let token_ref: &SecretString = &token;
        let limit = inner.config.event_limit;

        let fetched: Vec<(Device, Result<Vec<OpenEvent>, CoreError>)> = stream::iter(devices)
            .map(move |device| async move {
                let result = gateway
                    .list_recent_events(token_ref, &device.id, limit)
                    .await;
                (device, result)
            })
            .buffered(inner.config.fetch_concurrency.max(1))
            .collect()
            .await;

        let mut states = Vec::with_capacity(fetched.len());
        let mut degraded = None;
        for (device, result) in fetched {
            let cached = previous
                .get(&device.id)
                .and_then(|state| state.last_event.clone());
            match result {
                Ok(events) => {
                    let newest = latest_event(
                        events
                            .into_iter()
                            .filter(|event| event.device_id == device.id),
                    );
                    states.push(DeviceState::new(device, newer_event(cached, newest)));
                }
                Err(e) if e.is_auth() => {
                    self.reject_token(&token, &e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        device_id = %device.id,
                        error = %e,
                        "event fetch failed; keeping cached event"
                    );
                    degraded.get_or_insert(e.kind().unwrap_or(ErrorKind::Protocol));
                    states.push(DeviceState {
                        device,
                        last_event: cached,
                        available: false,
                    });
                }
            }
        }

        Ok((RegistrySnapshot::new(states), degraded))
    }
}

/// Clears the single-flight flag when a cycle ends, including when the
/// cycle future is dropped half-way.
struct CycleGuard<'a, G: Gateway> {
    inner: &'a CoordinatorInner<G>,
}

impl<G: Gateway> Drop for CycleGuard<'_, G> {
    fn drop(&mut self) {
        self.inner
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .polling = false;
        self.inner.state.send_if_modified(|state| {
            if *state == SyncState::Polling {
                *state = SyncState::Idle;
                true
            } else {
                false
            }
        });
        self.inner.cycle_done.notify_waiters();
    }
}

// ── Background task ──────────────────────────────────────────────────

/// Timer-driven loop: sleep until the next deadline or a wake-up, run a
/// cycle, pick the next deadline from the outcome.
async fn sync_task<G: Gateway>(coordinator: Coordinator<G>) {
    let inner = &coordinator.inner;
    let mut retry = RetryPolicy::new(inner.config.retry_base, inner.config.update_interval());
    let mut next_cycle = Instant::now();

    loop {
        tokio::select! {
            biased;
            () = inner.cancel.cancelled() => break,
            () = tokio::time::sleep_until(next_cycle) => {}
            () = inner.wake.notified() => {
                // Stale permit from a request that a cycle already served.
                if !coordinator.is_pending() {
                    continue;
                }
                debug!("refresh requested");
            }
        }

        let Ok(update) = coordinator.refresh().await else {
            break;
        };

        let delay = retry.next_delay(update.retry_reason());
        next_cycle = if coordinator.is_pending() {
            Instant::now()
        } else {
            Instant::now() + delay
        };
        debug!(?delay, failures = retry.consecutive_failures(), "next poll cycle scheduled");
    }

    inner.looping.store(false, Ordering::Release);
    debug!("sync loop exited");
}
