//! Background expiry sweeper (spec section 4.4: "A background expiry
//! sweeper runs at a coarse interval ... moving `now >= expires_at` RFPs
//! from `open`/`bidding_closed` to `expired`.").

use crate::Store;
use marketplace_types::UnixTimestamp;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Spawns the sweeper as a background task. Each tick's panic or I/O
/// failure in timestamp acquisition is logged and the loop continues,
/// rather than bringing down the registry (spec section 4.4's coarse,
/// best-effort sweep).
pub fn spawn_expiry_sweeper(
    store: Store,
    interval: Duration,
    cancellation_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    tracing::info!("expiry sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match UnixTimestamp::try_now() {
                        Ok(now) => {
                            let swept = store.sweep_expired(now);
                            if swept > 0 {
                                tracing::debug!(swept, "expired stale RFPs");
                            }
                        }
                        Err(err) => tracing::warn!(%err, "failed to read system clock in sweeper"),
                    }
                }
            }
        }
    })
}
