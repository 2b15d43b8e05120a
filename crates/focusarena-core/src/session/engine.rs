//! Focus session state machine.
//!
//! The engine holds no timers and performs no I/O. The caller feeds it one
//! `tick()` per second while running and forwards visibility edges with a
//! monotonic millisecond timestamp. Every transition returns the domain
//! events it produced.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> (Completed | GaveUp) -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = FocusSession::new(FocusMode::DeepWork);
//! session.start();
//! // once per second while running:
//! session.tick(); // Some(Event::SessionEnded { .. }) on the last second
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mode::FocusMode;
use super::outcome::{OutcomeStatus, SessionOutcome};
use super::visibility::{PenaltyRules, VisibilityWatcher};
use crate::events::Event;

pub const MAX_HP: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
    GaveUp,
}

impl SessionState {
    /// Running or paused.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::GaveUp)
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub mode: FocusMode,
    pub session_id: Option<Uuid>,
    pub total_secs: u64,
    pub remaining_secs: u64,
    pub hp: u8,
    pub penalty_count: u32,
    pub away: bool,
    pub progress_pct: f64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FocusSession {
    mode: FocusMode,
    state: SessionState,
    total_secs: u64,
    remaining_secs: u64,
    hp: u8,
    penalty_count: u32,
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    rules: PenaltyRules,
    watcher: VisibilityWatcher,
    outcome: Option<SessionOutcome>,
}

impl FocusSession {
    /// Create an idle session armed with `mode`'s duration.
    pub fn new(mode: FocusMode) -> Self {
        Self::with_rules(mode, PenaltyRules::default())
    }

    pub fn with_rules(mode: FocusMode, rules: PenaltyRules) -> Self {
        let mut session = Self {
            mode,
            state: SessionState::Idle,
            total_secs: 0,
            remaining_secs: 0,
            hp: MAX_HP,
            penalty_count: 0,
            session_id: None,
            started_at: None,
            rules,
            watcher: VisibilityWatcher::new(),
            outcome: None,
        };
        session.enter_idle();
        session
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> FocusMode {
        self.mode
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn hp(&self) -> u8 {
        self.hp
    }

    pub fn penalty_count(&self) -> u32 {
        self.penalty_count
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn is_away(&self) -> bool {
        self.watcher.is_away()
    }

    /// Outcome of the last terminal transition, until the next reset.
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs - self.remaining_secs
    }

    /// 0.0 .. 100.0 progress through the session.
    pub fn progress_pct(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        (self.elapsed_secs() as f64 / self.total_secs as f64 * 100.0).min(100.0)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            mode: self.mode,
            session_id: self.session_id,
            total_secs: self.total_secs,
            remaining_secs: self.remaining_secs,
            hp: self.hp,
            penalty_count: self.penalty_count,
            away: self.watcher.is_away(),
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change the mode for the next start. Ignored while a session is active.
    pub fn select_mode(&mut self, mode: FocusMode) -> Option<Event> {
        if self.state.is_active() {
            return None;
        }
        if self.state == SessionState::Idle && self.mode == mode {
            return None;
        }
        self.mode = mode;
        self.enter_idle();
        Some(Event::ModeSelected {
            mode,
            duration_secs: self.total_secs,
            at: Utc::now(),
        })
    }

    pub fn start(&mut self) -> Option<Event> {
        if self.state != SessionState::Idle {
            return None;
        }
        self.enter_idle();
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.state = SessionState::Running;
        self.session_id = Some(id);
        self.started_at = Some(now);
        Some(Event::SessionStarted {
            session_id: id,
            mode: self.mode,
            duration_secs: self.total_secs,
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        self.state = SessionState::Paused;
        self.watcher.clear();
        Some(Event::SessionPaused {
            session_id: self.session_id?,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != SessionState::Paused {
            return None;
        }
        self.state = SessionState::Running;
        Some(Event::SessionResumed {
            session_id: self.session_id?,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn give_up(&mut self) -> Option<Event> {
        if !self.state.is_active() {
            return None;
        }
        Some(self.finish(OutcomeStatus::GaveUp, false))
    }

    /// Return to idle from a terminal state. Idle stays idle.
    pub fn reset_to_idle(&mut self) -> Option<Event> {
        if !self.state.is_terminal() {
            return None;
        }
        self.enter_idle();
        Some(Event::SessionReset {
            mode: self.mode,
            at: Utc::now(),
        })
    }

    /// Advance one second. Returns the completion event on the last second.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.finish(OutcomeStatus::Completed, false));
        }
        None
    }

    /// The host moved to the background.
    pub fn hidden(&mut self, now_ms: u64) {
        if self.state == SessionState::Running {
            self.watcher.hidden(now_ms);
        }
    }

    /// The host is back in the foreground. Charges penalties for the absence.
    pub fn visible(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(away_ms) = self.watcher.visible(now_ms) else {
            return events;
        };
        if self.state != SessionState::Running {
            return events;
        }
        let owed = self.rules.penalties_for(away_ms);
        for _ in 0..owed {
            if self.state != SessionState::Running {
                break;
            }
            events.extend(self.apply_penalty(away_ms));
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply_penalty(&mut self, away_ms: u64) -> Vec<Event> {
        self.hp = self.hp.saturating_sub(self.rules.hp_per_penalty);
        self.penalty_count += 1;
        let mut events = Vec::with_capacity(2);
        if let Some(session_id) = self.session_id {
            events.push(Event::HpPenalized {
                session_id,
                hp: self.hp,
                penalty_count: self.penalty_count,
                away_ms,
                at: Utc::now(),
            });
        }
        if self.hp == 0 {
            events.push(self.finish(OutcomeStatus::GaveUp, true));
        }
        events
    }

    fn finish(&mut self, status: OutcomeStatus, forced: bool) -> Event {
        let ended_at = Utc::now();
        let (elapsed_secs, xp_earned) = match status {
            OutcomeStatus::Completed => {
                self.remaining_secs = 0;
                (self.total_secs, self.mode.xp_reward())
            }
            OutcomeStatus::GaveUp => (self.elapsed_secs(), 0),
        };
        self.state = match status {
            OutcomeStatus::Completed => SessionState::Completed,
            OutcomeStatus::GaveUp => SessionState::GaveUp,
        };
        self.watcher.clear();
        let outcome = SessionOutcome {
            session_id: self.session_id.unwrap_or_else(Uuid::new_v4),
            mode: self.mode,
            status,
            elapsed_secs,
            xp_earned,
            hp_remaining: self.hp,
            penalty_count: self.penalty_count,
            forced,
            started_at: self.started_at.unwrap_or(ended_at),
            ended_at,
        };
        self.outcome = Some(outcome.clone());
        Event::SessionEnded { outcome }
    }

    fn enter_idle(&mut self) {
        self.state = SessionState::Idle;
        self.total_secs = self.mode.duration_secs();
        self.remaining_secs = self.total_secs;
        self.hp = MAX_HP;
        self.penalty_count = 0;
        self.session_id = None;
        self.started_at = None;
        self.outcome = None;
        self.watcher.clear();
    }
}

impl Default for FocusSession {
    fn default() -> Self {
        Self::new(FocusMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(mode: FocusMode) -> FocusSession {
        let mut session = FocusSession::new(mode);
        session.start().unwrap();
        session
    }

    fn ended(events: &[Event]) -> Option<&SessionOutcome> {
        events.iter().find_map(|e| match e {
            Event::SessionEnded { outcome } => Some(outcome),
            _ => None,
        })
    }

    #[test]
    fn start_pause_resume() {
        let mut session = FocusSession::default();
        assert_eq!(session.state(), SessionState::Idle);

        assert!(session.start().is_some());
        assert_eq!(session.state(), SessionState::Running);

        assert!(session.pause().is_some());
        assert_eq!(session.state(), SessionState::Paused);

        assert!(session.resume().is_some());
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn invalid_commands_are_noops() {
        let mut session = FocusSession::default();
        assert!(session.pause().is_none());
        assert!(session.resume().is_none());
        assert!(session.give_up().is_none());
        assert!(session.reset_to_idle().is_none());
        assert_eq!(session.state(), SessionState::Idle);

        session.start();
        assert!(session.start().is_none());
        assert!(session.resume().is_none());
        assert!(session.reset_to_idle().is_none());
    }

    #[test]
    fn tick_is_noop_unless_running() {
        let mut session = FocusSession::new(FocusMode::QuickSprint);
        assert!(session.tick().is_none());
        assert_eq!(session.remaining_secs(), 1500);

        session.start();
        session.tick();
        session.pause();
        assert!(session.tick().is_none());
        assert_eq!(session.remaining_secs(), 1499);
        assert_eq!(session.state(), SessionState::Paused);
    }

    #[test]
    fn last_tick_completes_without_going_negative() {
        let mut session = running(FocusMode::QuickSprint);
        for _ in 0..1499 {
            assert!(session.tick().is_none());
        }
        assert_eq!(session.remaining_secs(), 1);
        let event = session.tick().unwrap();
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.remaining_secs(), 0);
        match event {
            Event::SessionEnded { outcome } => {
                assert_eq!(outcome.status, OutcomeStatus::Completed);
                assert_eq!(outcome.elapsed_secs, 1500);
                assert_eq!(outcome.xp_earned, 50);
            }
            other => panic!("Expected SessionEnded, got {other:?}"),
        }
        assert!(session.tick().is_none());
        assert_eq!(session.remaining_secs(), 0);
    }

    #[test]
    fn deep_work_full_run() {
        let mut session = FocusSession::default();
        session.select_mode(FocusMode::DeepWork).unwrap();
        assert_eq!(session.total_secs(), 3000);
        assert_eq!(session.remaining_secs(), 3000);

        session.start();
        let mut last = None;
        for _ in 0..3000 {
            if let Some(e) = session.tick() {
                last = Some(e);
            }
        }
        assert_eq!(session.state(), SessionState::Completed);
        let outcome = ended(std::slice::from_ref(last.as_ref().unwrap())).unwrap();
        assert_eq!(outcome.elapsed_secs, 3000);
        assert_eq!(outcome.xp_earned, FocusMode::DeepWork.xp_reward());
        assert_eq!(outcome.hp_remaining, 100);
    }

    #[test]
    fn seven_second_absence_charges_two_penalties() {
        let mut session = running(FocusMode::QuickSprint);
        session.hidden(10_000);
        let events = session.visible(17_000);
        assert_eq!(events.len(), 2);
        assert_eq!(session.hp(), 90);
        assert_eq!(session.penalty_count(), 2);
        assert_eq!(session.state(), SessionState::Running);
        assert!(!session.is_away());
    }

    #[test]
    fn exhausting_hp_forces_give_up_and_stops_the_batch() {
        let mut session = running(FocusMode::Marathon);
        session.hidden(0);
        // 30 penalties owed, only 20 fit in 100 HP.
        let events = session.visible(90_000);
        assert_eq!(session.hp(), 0);
        assert_eq!(session.penalty_count(), 20);
        assert_eq!(session.state(), SessionState::GaveUp);

        let penalized = events
            .iter()
            .filter(|e| matches!(e, Event::HpPenalized { .. }))
            .count();
        assert_eq!(penalized, 20);
        let outcome = ended(&events).unwrap();
        assert!(outcome.forced);
        assert_eq!(outcome.xp_earned, 0);
        assert_eq!(outcome.hp_remaining, 0);
    }

    #[test]
    fn uneven_penalty_clamps_at_zero() {
        let rules = PenaltyRules {
            hp_per_penalty: 30,
            ..PenaltyRules::default()
        };
        let mut session = FocusSession::with_rules(FocusMode::QuickSprint, rules);
        session.start();
        session.hidden(0);
        session.visible(12_000);
        assert_eq!(session.hp(), 0);
        assert_eq!(session.penalty_count(), 4);
        assert_eq!(session.state(), SessionState::GaveUp);
    }

    #[test]
    fn no_penalties_while_paused() {
        let mut session = running(FocusMode::QuickSprint);
        session.pause();
        session.hidden(0);
        assert!(session.visible(60_000).is_empty());
        assert_eq!(session.hp(), 100);
    }

    #[test]
    fn pausing_while_away_cancels_the_absence() {
        let mut session = running(FocusMode::QuickSprint);
        session.hidden(0);
        session.pause();
        session.resume();
        assert!(session.visible(60_000).is_empty());
        assert_eq!(session.penalty_count(), 0);
    }

    #[test]
    fn giving_up_while_away_yields_no_penalties() {
        let mut session = running(FocusMode::QuickSprint);
        session.hidden(0);
        session.give_up();
        assert!(session.visible(60_000).is_empty());
        assert_eq!(session.hp(), 100);
    }

    #[test]
    fn give_up_from_paused_reports_elapsed_at_pause() {
        let mut session = running(FocusMode::QuickSprint);
        for _ in 0..120 {
            session.tick();
        }
        session.pause();
        let event = session.give_up().unwrap();
        assert_eq!(session.state(), SessionState::GaveUp);
        match event {
            Event::SessionEnded { outcome } => {
                assert_eq!(outcome.elapsed_secs, 120);
                assert_eq!(outcome.xp_earned, 0);
                assert!(!outcome.forced);
            }
            other => panic!("Expected SessionEnded, got {other:?}"),
        }
    }

    #[test]
    fn start_resets_hp_after_a_bruised_session() {
        let mut session = running(FocusMode::QuickSprint);
        session.hidden(0);
        session.visible(30_000);
        assert_eq!(session.hp(), 50);
        session.give_up();
        session.reset_to_idle();
        session.start();
        assert_eq!(session.hp(), 100);
        assert_eq!(session.penalty_count(), 0);
    }

    #[test]
    fn reset_twice_from_idle_is_idempotent() {
        let mut session = FocusSession::new(FocusMode::DeepWork);
        assert!(session.reset_to_idle().is_none());
        assert!(session.reset_to_idle().is_none());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.hp(), 100);
        assert_eq!(session.remaining_secs(), 3000);
    }

    #[test]
    fn reset_rearms_with_selected_mode() {
        let mut session = running(FocusMode::QuickSprint);
        session.tick();
        session.give_up();
        session.reset_to_idle().unwrap();
        assert_eq!(session.remaining_secs(), 1500);
        assert!(session.outcome().is_none());
        assert!(session.session_id().is_none());
    }

    #[test]
    fn mode_selection_blocked_while_active() {
        let mut session = running(FocusMode::QuickSprint);
        assert!(session.select_mode(FocusMode::Marathon).is_none());
        assert_eq!(session.mode(), FocusMode::QuickSprint);
        session.pause();
        assert!(session.select_mode(FocusMode::Marathon).is_none());
        assert_eq!(session.total_secs(), 1500);
    }

    #[test]
    fn mode_selection_from_terminal_returns_to_idle() {
        let mut session = running(FocusMode::QuickSprint);
        session.give_up();
        let event = session.select_mode(FocusMode::Marathon).unwrap();
        assert!(matches!(event, Event::ModeSelected { duration_secs: 5400, .. }));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn snapshot_reflects_session() {
        let mut session = running(FocusMode::DeepWork);
        session.tick();
        let snap = session.snapshot();
        assert_eq!(snap.state, SessionState::Running);
        assert_eq!(snap.remaining_secs, 2999);
        assert_eq!(snap.total_secs, 3000);
        assert!(snap.session_id.is_some());
        assert!(snap.progress_pct > 0.0);
    }
}
