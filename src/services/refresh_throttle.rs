//! Process-wide gate in front of the session refresh.
//!
//! At most one refresh runs at a time, and unforced requests are dropped while
//! the last successful refresh is younger than the minimum interval. `force`
//! bypasses only the interval, never the in-flight check.

use crate::error::AppResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Refreshes cached session data. Only success or failure is observed.
#[async_trait]
pub trait SessionUpdater: Send + Sync {
    async fn update(&self) -> AppResult<()>;
}

pub struct RefreshThrottle {
    updater: Arc<dyn SessionUpdater>,
    min_interval: Duration,
    call_timeout: Duration,
    in_flight: AtomicBool,
    last_refreshed_at: Mutex<Option<Instant>>,
}

/// Lowers the in-flight flag when the refresh settles, including when the
/// caller's future is dropped mid-call.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RefreshThrottle {
    pub fn new(
        updater: Arc<dyn SessionUpdater>,
        min_interval: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            updater,
            min_interval,
            call_timeout,
            in_flight: AtomicBool::new(false),
            last_refreshed_at: Mutex::new(None),
        }
    }

    /// Returns true only if this call ran the refresh and it succeeded.
    pub async fn request_refresh(&self, force: bool) -> bool {
        if self.in_flight.load(Ordering::Acquire) {
            log::debug!("Session refresh skipped: already in flight");
            return false;
        }
        if !force && self.refreshed_recently() {
            log::debug!("Session refresh skipped: refreshed less than {:?} ago", self.min_interval);
            return false;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Session refresh skipped: lost the race to another caller");
            return false;
        }
        let _guard = InFlightGuard(&self.in_flight);

        // A refresh may have completed between the first check and the swap
        if !force && self.refreshed_recently() {
            return false;
        }

        match tokio::time::timeout(self.call_timeout, self.updater.update()).await {
            Ok(Ok(())) => {
                *self.lock_last_refreshed() = Some(Instant::now());
                log::info!("Session refresh completed (force={force})");
                true
            }
            Ok(Err(e)) => {
                log::error!("Session refresh failed: {e}");
                false
            }
            Err(_) => {
                log::warn!("Session refresh timed out after {:?}", self.call_timeout);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn last_refreshed_at(&self) -> Option<Instant> {
        *self.lock_last_refreshed()
    }

    fn refreshed_recently(&self) -> bool {
        self.lock_last_refreshed()
            .is_some_and(|at| at.elapsed() < self.min_interval)
    }

    fn lock_last_refreshed(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        // The guarded value is a plain timestamp, a poisoned lock still holds a valid one
        self.last_refreshed_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
