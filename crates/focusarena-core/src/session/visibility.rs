//! Inattention detection.
//!
//! Timers in a backgrounded host cannot be trusted to fire on schedule, so
//! absence is measured between two edge-triggered events (hidden, visible)
//! and charged in bulk when the host comes back to the foreground.

use serde::{Deserialize, Serialize};

/// How away time converts into HP penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRules {
    /// One penalty per full interval spent away.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// HP removed per penalty.
    #[serde(default = "default_hp_per_penalty")]
    pub hp_per_penalty: u8,
    /// Absences strictly shorter than this are forgiven. 0 charges every absence.
    #[serde(default)]
    pub grace_ms: u64,
}

fn default_interval_ms() -> u64 {
    3_000
}

fn default_hp_per_penalty() -> u8 {
    5
}

impl Default for PenaltyRules {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            hp_per_penalty: default_hp_per_penalty(),
            grace_ms: 0,
        }
    }
}

impl PenaltyRules {
    /// Number of penalties owed for an absence of `away_ms`.
    ///
    /// `max(1, floor(away_ms / interval_ms))` once the grace period is exceeded.
    pub fn penalties_for(&self, away_ms: u64) -> u32 {
        if away_ms < self.grace_ms {
            return 0;
        }
        let owed = (away_ms / self.interval_ms.max(1)).max(1);
        u32::try_from(owed).unwrap_or(u32::MAX)
    }
}

/// Tracks the away-period marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityWatcher {
    hidden_at_ms: Option<u64>,
}

impl VisibilityWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the moment the host went to the background.
    /// A second hidden edge without a visible one keeps the earlier mark.
    pub fn hidden(&mut self, now_ms: u64) {
        if self.hidden_at_ms.is_none() {
            self.hidden_at_ms = Some(now_ms);
        }
    }

    /// Take the marker and return how long the host was away.
    pub fn visible(&mut self, now_ms: u64) -> Option<u64> {
        self.hidden_at_ms
            .take()
            .map(|since| now_ms.saturating_sub(since))
    }

    pub fn clear(&mut self) {
        self.hidden_at_ms = None;
    }

    pub fn is_away(&self) -> bool {
        self.hidden_at_ms.is_some()
    }
}
