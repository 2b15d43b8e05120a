//! Reward reconciliation.
//!
//! The session engine never talks to storage or the network. Terminal
//! outcomes and HP penalties are handed to a [`Reconciler`] by the
//! reconciliation worker, fire-and-forget.

mod http;
mod ledger;
mod worker;

pub use http::HttpReconciler;
pub use ledger::LedgerReconciler;
pub use worker::{spawn_worker, ReconcileJob};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};
use crate::session::SessionOutcome;
use crate::storage::{Config, Database};

/// Gold credited per point of XP, as a divisor.
pub const GOLD_PER_XP_DIVISOR: u32 = 10;
/// HP restored on a completed session.
pub const COMPLETION_HP_BONUS: u8 = 10;
pub const XP_PER_LEVEL: u64 = 500;

pub fn gold_for_xp(xp: u32) -> u64 {
    u64::from(xp / GOLD_PER_XP_DIVISOR)
}

pub fn level_for_xp(xp: u64) -> u32 {
    u32::try_from(1 + xp / XP_PER_LEVEL).unwrap_or(u32::MAX)
}

/// Display counters seeded from the reconciler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusStats {
    pub sessions_completed: u64,
    pub total_focus_secs: u64,
    pub current_streak: u32,
}

impl FocusStats {
    /// Fold a finished session into the local counters.
    pub fn absorb(&mut self, outcome: &SessionOutcome) {
        if outcome.is_completed() {
            self.sessions_completed += 1;
            self.total_focus_secs += outcome.elapsed_secs;
            self.current_streak = self.current_streak.saturating_add(1);
        } else {
            self.current_streak = 0;
        }
    }
}

/// Persistence and reward collaborator.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &'static str;

    /// Durably record a finished session and settle XP, gold and streak.
    async fn record_outcome(&self, outcome: &SessionOutcome) -> Result<(), ReconcileError>;

    /// Persist HP after an inattention penalty.
    async fn persist_hp(&self, hp: u8) -> Result<(), ReconcileError>;

    async fn load_stats(&self) -> Result<FocusStats, ReconcileError>;
}

/// Build the reconciler named by the configuration: the HTTP service when an
/// endpoint is set, the local ledger otherwise.
pub fn from_config(config: &Config) -> Result<Arc<dyn Reconciler>> {
    match config.reconciler.endpoint.as_deref() {
        Some(endpoint) if !endpoint.trim().is_empty() => {
            let http = HttpReconciler::with_timeout(
                endpoint,
                config.reconciler.token.clone(),
                std::time::Duration::from_secs(config.reconciler.timeout_secs),
            )?;
            Ok(Arc::new(http))
        }
        _ => Ok(Arc::new(LedgerReconciler::new(Database::open()?))),
    }
}
