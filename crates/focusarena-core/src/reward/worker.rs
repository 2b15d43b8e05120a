use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{FocusStats, Reconciler};
use crate::events::Event;
use crate::session::SessionOutcome;

/// Side effect owed to the reconciler for one domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileJob {
    RecordOutcome(SessionOutcome),
    PersistHp(u8),
}

impl ReconcileJob {
    pub fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::HpPenalized { hp, .. } => Some(ReconcileJob::PersistHp(*hp)),
            Event::SessionEnded { outcome } => Some(ReconcileJob::RecordOutcome(outcome.clone())),
            _ => None,
        }
    }
}

/// Spawn the reconciliation worker.
///
/// Stats are loaded first and sent on `seed`; a failed load drops the sender
/// so the receiver keeps its defaults. Jobs are then processed in order.
/// Failures are logged and never retried.
pub fn spawn_worker(
    reconciler: Arc<dyn Reconciler>,
    mut jobs: mpsc::UnboundedReceiver<ReconcileJob>,
    seed: Option<oneshot::Sender<FocusStats>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(seed) = seed {
            match reconciler.load_stats().await {
                Ok(stats) => {
                    let _ = seed.send(stats);
                }
                Err(e) => {
                    tracing::warn!(
                        reconciler = reconciler.name(),
                        error = %e,
                        "failed to load focus stats, keeping defaults"
                    );
                }
            }
        }

        while let Some(job) = jobs.recv().await {
            run_job(reconciler.as_ref(), job).await;
        }
        tracing::debug!(reconciler = reconciler.name(), "reconciliation worker stopped");
    })
}

async fn run_job(reconciler: &dyn Reconciler, job: ReconcileJob) {
    match job {
        ReconcileJob::RecordOutcome(outcome) => {
            match reconciler.record_outcome(&outcome).await {
                Ok(()) => tracing::debug!(
                    session_id = %outcome.session_id,
                    status = outcome.status.as_str(),
                    "session outcome recorded"
                ),
                Err(e) => tracing::warn!(
                    reconciler = reconciler.name(),
                    session_id = %outcome.session_id,
                    error = %e,
                    "failed to record session outcome"
                ),
            }
        }
        ReconcileJob::PersistHp(hp) => {
            if let Err(e) = reconciler.persist_hp(hp).await {
                tracing::warn!(reconciler = reconciler.name(), hp, error = %e, "failed to persist hp");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct Recording {
        hp: Mutex<Vec<u8>>,
        fail: bool,
    }

    #[async_trait]
    impl Reconciler for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn record_outcome(&self, _outcome: &SessionOutcome) -> Result<(), ReconcileError> {
            Ok(())
        }

        async fn persist_hp(&self, hp: u8) -> Result<(), ReconcileError> {
            self.hp.lock().unwrap().push(hp);
            if self.fail {
                return Err(ReconcileError::Status {
                    status: 500,
                    body: String::new(),
                });
            }
            Ok(())
        }

        async fn load_stats(&self) -> Result<FocusStats, ReconcileError> {
            if self.fail {
                return Err(ReconcileError::Status {
                    status: 500,
                    body: String::new(),
                });
            }
            Ok(FocusStats {
                sessions_completed: 3,
                total_focus_secs: 4500,
                current_streak: 2,
            })
        }
    }

    #[test]
    fn only_penalties_and_endings_become_jobs() {
        let id = Uuid::new_v4();
        let paused = Event::SessionPaused {
            session_id: id,
            remaining_secs: 10,
            at: Utc::now(),
        };
        assert!(ReconcileJob::from_event(&paused).is_none());

        let penalized = Event::HpPenalized {
            session_id: id,
            hp: 85,
            penalty_count: 3,
            away_ms: 9_000,
            at: Utc::now(),
        };
        assert_eq!(ReconcileJob::from_event(&penalized), Some(ReconcileJob::PersistHp(85)));
    }

    #[tokio::test]
    async fn worker_seeds_stats_then_drains_jobs_in_order() {
        let reconciler = Arc::new(Recording::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let (seed_tx, seed_rx) = oneshot::channel();
        let handle = spawn_worker(reconciler.clone(), rx, Some(seed_tx));

        tx.send(ReconcileJob::PersistHp(95)).unwrap();
        tx.send(ReconcileJob::PersistHp(90)).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(seed_rx.await.unwrap().sessions_completed, 3);
        assert_eq!(*reconciler.hp.lock().unwrap(), vec![95, 90]);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let reconciler = Arc::new(Recording {
            fail: true,
            ..Recording::default()
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let (seed_tx, seed_rx) = oneshot::channel();
        let handle = spawn_worker(reconciler.clone(), rx, Some(seed_tx));

        tx.send(ReconcileJob::PersistHp(95)).unwrap();
        tx.send(ReconcileJob::PersistHp(90)).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert!(seed_rx.await.is_err());
        assert_eq!(reconciler.hp.lock().unwrap().len(), 2);
    }
}
