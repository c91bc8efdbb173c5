//! Automatic assistant triggering with velocity backpressure
//!
//! The assistant fires automatically every `base_every` ideas since its last
//! contribution. When ideas arrive faster than `max_ideas_per_window`, the
//! threshold is scaled up so the assistant neither lags nor floods the room.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Tunables for automatic triggering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoTriggerPolicy {
    pub base_every: usize,
    pub velocity_window: TimeDelta,
    pub max_ideas_per_window: usize,
    pub max_threshold: usize,
}

impl Default for AutoTriggerPolicy {
    fn default() -> Self {
        Self {
            base_every: 5,
            velocity_window: TimeDelta::seconds(60),
            max_ideas_per_window: 12,
            max_threshold: 20,
        }
    }
}

impl AutoTriggerPolicy {
    /// Threshold for a given number of ideas seen inside the velocity window.
    pub fn threshold_for(&self, recent_ideas: usize) -> usize {
        let base = self.base_every.max(1);
        if self.max_ideas_per_window == 0 || recent_ideas <= self.max_ideas_per_window {
            return base;
        }
        let factor = recent_ideas.div_ceil(self.max_ideas_per_window);
        (base * factor).min(self.max_threshold.max(base))
    }
}

/// Per-session trigger bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerState {
    ideas_since_last: usize,
    recent: VecDeque<DateTime<Utc>>,
}

impl TriggerState {
    /// Count an appended idea; returns true when the automatic trigger is due.
    pub fn record_idea(&mut self, policy: &AutoTriggerPolicy, now: DateTime<Utc>) -> bool {
        self.ideas_since_last += 1;
        self.recent.push_back(now);
        self.prune(policy, now);
        self.ideas_since_last >= self.current_threshold(policy)
    }

    pub fn current_threshold(&self, policy: &AutoTriggerPolicy) -> usize {
        policy.threshold_for(self.recent.len())
    }

    pub fn ideas_since_last(&self) -> usize {
        self.ideas_since_last
    }

    /// Called when an assistant contribution is published.
    pub fn reset(&mut self) {
        self.ideas_since_last = 0;
    }

    fn prune(&mut self, policy: &AutoTriggerPolicy, now: DateTime<Utc>) {
        while let Some(oldest) = self.recent.front() {
            if now - *oldest > policy.velocity_window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }
}
