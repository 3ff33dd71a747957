//! Inactivity supervision for one USSD session
//!
//! The last-activity timestamp is an atomic so the watchdog task and the
//! foreground loop can touch it without a lock. Expiry is one-way and is
//! broadcast on a `watch` channel that the input wait races against.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct SessionSupervisor {
    epoch: Instant,
    /// Milliseconds since `epoch`
    last_activity_ms: AtomicU64,
    active: AtomicBool,
    timeout: Duration,
    expired_tx: watch::Sender<bool>,
}

impl SessionSupervisor {
    pub fn new(timeout: Duration) -> Self {
        Self::starting_at(timeout, Instant::now())
    }

    /// Supervisor whose clock starts at `epoch`, with activity recorded there.
    pub fn starting_at(timeout: Duration, epoch: Instant) -> Self {
        let (expired_tx, _) = watch::channel(false);
        Self {
            epoch,
            last_activity_ms: AtomicU64::new(0),
            active: AtomicBool::new(true),
            timeout,
            expired_tx,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn millis_since_epoch(&self, at: Instant) -> u64 {
        at.saturating_duration_since(self.epoch).as_millis() as u64
    }

    pub fn update_activity(&self) {
        self.record_activity_at(Instant::now());
    }

    /// Ignored once the session has expired.
    pub fn record_activity_at(&self, at: Instant) {
        if !self.is_active() {
            return;
        }
        self.last_activity_ms.store(self.millis_since_epoch(at), Ordering::SeqCst);
    }

    pub fn idle_at(&self, now: Instant) -> Duration {
        let last = self.last_activity_ms.load(Ordering::SeqCst);
        Duration::from_millis(self.millis_since_epoch(now).saturating_sub(last))
    }

    pub fn check_session(&self) -> bool {
        self.check_at(Instant::now())
    }

    /// `false` once idle time strictly exceeds the timeout; expires the session on the way.
    pub fn check_at(&self, now: Instant) -> bool {
        if !self.is_active() {
            return false;
        }
        let idle = self.idle_at(now);
        if idle > self.timeout {
            warn!(idle_ms = idle.as_millis() as u64, timeout_ms = self.timeout.as_millis() as u64, "Session expired");
            self.expire();
            return false;
        }
        true
    }

    /// Flip to inactive and notify every subscriber. Idempotent.
    pub fn expire(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.expired_tx.send_replace(true);
        }
    }

    /// Receiver that turns `true` when the session expires
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.expired_tx.subscribe()
    }

    /// Background check on a fixed cadence. The task ends once the session has expired.
    pub fn spawn_watchdog(self: &Arc<Self>, tick: Duration) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                if !supervisor.check_session() {
                    debug!("Watchdog stopped");
                    break;
                }
            }
        })
    }
}
