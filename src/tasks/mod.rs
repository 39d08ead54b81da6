//! Background scheduled tasks.
//!
//! Call `spawn_all` once during startup.

use crate::services::RefreshThrottle;
use std::sync::Arc;
use std::time::Duration;

/// Spawn all background tasks.
///
/// The periodic subscription sync goes through the same throttle as the
/// session refresh endpoint, so it never overlaps a user-triggered refresh.
pub fn spawn_all(throttle: Arc<RefreshThrottle>) {
    tokio::spawn(async move {
        loop {
            if throttle.request_refresh(false).await {
                log::debug!("Periodic subscription sync completed");
            }
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    });
}
