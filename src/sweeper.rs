use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::SharedState;

/// Rate limiter entries older than this are dropped on each pass.
const LIMITER_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Periodically delete expired reset tokens until shutdown is signaled.
///
/// Expired tokens are already rejected on read; this only keeps the ledger
/// small. Returns `None` when `interval_secs` is zero.
pub fn spawn(
    state: SharedState,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("Reset token sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => run_once(&state).await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Reset token sweep stopped");
    }))
}

async fn run_once(state: &SharedState) {
    match state.password_reset.purge_expired(Utc::now()).await {
        Ok(0) => {}
        Ok(n) => tracing::info!("Purged {n} expired password reset tokens"),
        Err(e) => tracing::error!("Reset token sweep failed: {e}"),
    }
    state.login_limiter.cleanup(LIMITER_MAX_AGE);
    state.confirm_limiter.cleanup(LIMITER_MAX_AGE);
}
