//! Background maintenance tasks
//!
//! - one sweeper per session: heartbeat timeouts and the duration ceiling
//! - one reaper per engine: evicts expired sessions from the registry

use super::handle::SessionHandle;
use super::participants::ParticipantService;
use super::registry::SessionRegistry;
use super::summarize::SessionSummarizer;
use crate::config::{EngineConfig, delta};
use crate::ports::clock::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawn the periodic sweeper of one session.
///
/// The task touches only connection state, except when the duration ceiling
/// passes, in which case it ends the session. It stops once the session has
/// ended or been evicted.
pub fn spawn_session_sweeper(
    handle: Arc<SessionHandle>,
    participants: Arc<ParticipantService>,
    summarizer: SessionSummarizer,
    clock: Arc<dyn Clock>,
    config: Arc<EngineConfig>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let token = handle.shutdown_token();
        let ceiling = delta(config.max_duration);
        let mut ticker = interval(config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            participants.sweep(&handle).await;

            let now = clock.now();
            let (terminal, expired) = {
                let session = handle.read().await;
                (
                    session.status().is_terminal(),
                    session.ceiling_reached(ceiling, now),
                )
            };
            if terminal {
                break;
            }
            if expired {
                info!(session_id = %handle.id(), "Duration ceiling reached; ending session");
                if let Err(e) = summarizer.end(&handle).await {
                    warn!(session_id = %handle.id(), "Failed to end session: {}", e);
                }
            }
        }
        debug!(session_id = %handle.id(), "Sweeper stopped");
    })
}

/// Spawn the registry reaper. Runs until `token` is cancelled.
pub fn spawn_reaper(
    registry: Arc<SessionRegistry>,
    every: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let evicted = registry.reap().await;
            if !evicted.is_empty() {
                info!(count = evicted.len(), "Reaped expired sessions");
            }
        }
    })
}
