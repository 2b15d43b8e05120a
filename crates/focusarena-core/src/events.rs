use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{FocusMode, SessionOutcome};

/// Every state change of the focus session produces an Event.
/// The host renders them; the reconciliation worker subscribes to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ModeSelected {
        mode: FocusMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionStarted {
        session_id: Uuid,
        mode: FocusMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        session_id: Uuid,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        session_id: Uuid,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// One inattention penalty was charged.
    HpPenalized {
        session_id: Uuid,
        hp: u8,
        penalty_count: u32,
        away_ms: u64,
        at: DateTime<Utc>,
    },
    /// Terminal transition (completed or gave up).
    SessionEnded { outcome: SessionOutcome },
    SessionReset {
        mode: FocusMode,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short machine name, used for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ModeSelected { .. } => "mode_selected",
            Event::SessionStarted { .. } => "session_started",
            Event::SessionPaused { .. } => "session_paused",
            Event::SessionResumed { .. } => "session_resumed",
            Event::HpPenalized { .. } => "hp_penalized",
            Event::SessionEnded { .. } => "session_ended",
            Event::SessionReset { .. } => "session_reset",
        }
    }
}
