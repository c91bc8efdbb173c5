//! Background safety scanning
//!
//! Scans never block the mutation that produced the content; the verdict is
//! attached later through the session handle like any other mutation.

use super::handle::SessionHandle;
use crate::ports::clock::Clock;
use crate::ports::safety_scanner::SafetyScanner;
use huddle_domain::{Applied, SafetyTarget};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct SafetyMonitor {
    scanner: Arc<dyn SafetyScanner>,
    clock: Arc<dyn Clock>,
}

impl SafetyMonitor {
    pub fn new(scanner: Arc<dyn SafetyScanner>, clock: Arc<dyn Clock>) -> Self {
        Self { scanner, clock }
    }

    /// Scan `text` in a spawned task and attach the report to `target`.
    pub fn scan_in_background(
        &self,
        handle: Arc<SessionHandle>,
        target: SafetyTarget,
        text: String,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.scan(&handle, target, &text).await })
    }

    pub async fn scan(&self, handle: &SessionHandle, target: SafetyTarget, text: &str) {
        let verdict = match self.scanner.scan(text).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(session_id = %handle.id(), ?target, "Safety scan failed: {}", e);
                return;
            }
        };
        let report = verdict.into_report(self.clock.now());
        let flagged = !report.is_clean();
        let attached = handle
            .mutate("attach_safety", |s| {
                s.attach_safety(target.clone(), report).map(|event| Applied {
                    value: (),
                    events: event.into_iter().collect(),
                })
            })
            .await;
        match attached {
            Ok(()) if flagged => {
                debug!(session_id = %handle.id(), ?target, "Content flagged for review");
            }
            Ok(()) => {}
            // Ended sessions accept no metadata; the handle already logged it.
            Err(_) => {}
        }
    }
}
