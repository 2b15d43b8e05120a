use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FocusMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Completed,
    GaveUp,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Completed => "completed",
            OutcomeStatus::GaveUp => "gave-up",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(OutcomeStatus::Completed),
            "gave-up" => Some(OutcomeStatus::GaveUp),
            _ => None,
        }
    }
}

/// Record emitted once per session on its terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub mode: FocusMode,
    pub status: OutcomeStatus,
    /// `total` for completed sessions, `total - remaining` otherwise.
    pub elapsed_secs: u64,
    pub xp_earned: u32,
    pub hp_remaining: u8,
    pub penalty_count: u32,
    /// Set when HP exhaustion ended the session rather than the user.
    #[serde(default)]
    pub forced: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == OutcomeStatus::Completed
    }
}
