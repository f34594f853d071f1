use std::time::Duration as StdDuration;

use chrono::Duration;
use log::*;
use pairline_engine::{MessageSink, PairingApi, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::transport::TelegramTransport;

/// Starts the waiting-pool sweep worker. Do not await the returned JoinHandle, as it will run
/// indefinitely.
pub fn start_sweep_worker(
    pairing: PairingApi<SqliteDatabase, TelegramTransport>,
    sink: TelegramTransport,
    interval: StdDuration,
    max_dwell: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Waiting-pool sweep worker started (dwell limit {} min)", max_dwell.num_minutes());
        loop {
            timer.tick().await;
            let evicted = pairing.evict_stale(max_dwell).await;
            for entry in evicted {
                debug!("🕰️ Evicted {}; waiting since {}", entry.user_id, entry.enqueued_at);
                let text = "⏳ No partner turned up in time. Send the match command to try again.";
                if let Err(e) = sink.send_text(entry.user_id, text).await {
                    debug!("🕰️ Could not notify {} about their eviction: {e}", entry.user_id);
                }
            }
        }
    })
}
