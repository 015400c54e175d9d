use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};
use vigil_application::RoleAssignmentService;

/// Spawns the background loop revoking lapsed role assignments.
pub fn spawn_expiry_sweep(service: RoleAssignmentService, interval: Duration) -> JoinHandle<()> {
    info!(interval_seconds = interval.as_secs(), "assignment expiry sweep started");

    tokio::spawn(async move {
        loop {
            sweep_once(&service, Utc::now()).await;
            tokio::time::sleep(interval).await;
        }
    })
}

/// Runs one sweep, returning how many assignments were revoked.
///
/// Failures are logged and reported as zero so the loop keeps running.
pub async fn sweep_once(service: &RoleAssignmentService, now: DateTime<Utc>) -> usize {
    match service.revoke_expired_assignments(now).await {
        Ok(0) => 0,
        Ok(revoked) => {
            info!(revoked, "revoked expired role assignments");
            revoked
        }
        Err(error) => {
            error!(error = %error, "failed to revoke expired role assignments");
            0
        }
    }
}
