use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{FocusStats, Reconciler};
use crate::error::ReconcileError;
use crate::session::SessionOutcome;
use crate::storage::Database;

/// Reconciler backed by the local SQLite ledger.
pub struct LedgerReconciler {
    db: Mutex<Database>,
}

impl LedgerReconciler {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        // Poisoning does not corrupt the connection.
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn into_inner(self) -> Database {
        self.db.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Reconciler for LedgerReconciler {
    fn name(&self) -> &'static str {
        "ledger"
    }

    async fn record_outcome(&self, outcome: &SessionOutcome) -> Result<(), ReconcileError> {
        let inserted = self.db().record_outcome(outcome)?;
        if !inserted {
            tracing::debug!(session_id = %outcome.session_id, "session already recorded");
        }
        Ok(())
    }

    async fn persist_hp(&self, hp: u8) -> Result<(), ReconcileError> {
        self.db().set_hp(hp)?;
        Ok(())
    }

    async fn load_stats(&self) -> Result<FocusStats, ReconcileError> {
        Ok(self.db().focus_stats()?)
    }
}
