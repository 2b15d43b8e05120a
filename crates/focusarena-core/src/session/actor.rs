//! Single-writer owner of the focus session.
//!
//! The actor task is the only code that touches [`FocusSession`]. Commands,
//! clock ticks and the stats seed are serialized through one `select!` loop,
//! so no two mutations ever interleave. Domain events fan out to broadcast
//! subscribers and, for penalties and endings, to the reconciliation worker.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::clock::{TickDriver, TICK_PERIOD};
use super::engine::{FocusSession, SessionSnapshot, SessionState};
use super::mode::FocusMode;
use super::outcome::SessionOutcome;
use super::visibility::PenaltyRules;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::reward::{spawn_worker, FocusStats, ReconcileJob, Reconciler};
use crate::storage::Config;

#[derive(Debug)]
pub enum Command {
    SelectMode(FocusMode),
    Start,
    Pause,
    Resume,
    GiveUp,
    Reset,
    Hidden,
    Visible,
    Status(oneshot::Sender<ArenaStatus>),
    Shutdown,
}

/// Session snapshot plus the display counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaStatus {
    pub session: SessionSnapshot,
    pub stats: FocusStats,
}

#[derive(Debug, Clone)]
pub struct ArenaOptions {
    pub mode: FocusMode,
    pub rules: PenaltyRules,
    pub tick_period: Duration,
    pub command_buffer: usize,
    pub event_buffer: usize,
}

impl Default for ArenaOptions {
    fn default() -> Self {
        Self {
            mode: FocusMode::default(),
            rules: PenaltyRules::default(),
            tick_period: TICK_PERIOD,
            command_buffer: 32,
            event_buffer: 256,
        }
    }
}

impl ArenaOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.session.default_mode,
            rules: config.penalty,
            ..Self::default()
        }
    }
}

/// Cloneable front door to the session actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::ActorClosed)
    }

    pub async fn select_mode(&self, mode: FocusMode) -> Result<()> {
        self.send(Command::SelectMode(mode)).await
    }

    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(Command::Resume).await
    }

    pub async fn give_up(&self) -> Result<()> {
        self.send(Command::GiveUp).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    /// The host went to the background.
    pub async fn hidden(&self) -> Result<()> {
        self.send(Command::Hidden).await
    }

    /// The host came back to the foreground.
    pub async fn visible(&self) -> Result<()> {
        self.send(Command::Visible).await
    }

    pub async fn status(&self) -> Result<ArenaStatus> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Status(tx)).await?;
        rx.await.map_err(|_| CoreError::ActorClosed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}

/// Join handles of the actor and its reconciliation worker.
#[derive(Debug)]
pub struct ArenaTasks {
    actor: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl ArenaTasks {
    /// Wait for the actor to stop and the worker to drain its queue.
    pub async fn join(self) -> Result<()> {
        self.actor
            .await
            .map_err(|e| CoreError::Custom(format!("session actor failed: {e}")))?;
        self.worker
            .await
            .map_err(|e| CoreError::Custom(format!("reconciliation worker failed: {e}")))?;
        Ok(())
    }
}

/// Spawn the session actor and its reconciliation worker on the current runtime.
pub fn spawn(reconciler: Arc<dyn Reconciler>, options: ArenaOptions) -> (SessionHandle, ArenaTasks) {
    let (command_tx, command_rx) = mpsc::channel(options.command_buffer.max(1));
    let (event_tx, _) = broadcast::channel(options.event_buffer.max(1));
    let (job_tx, job_rx) = mpsc::unbounded_channel();
    let (seed_tx, seed_rx) = oneshot::channel();

    let worker = spawn_worker(reconciler, job_rx, Some(seed_tx));

    let actor = SessionActor {
        session: FocusSession::with_rules(options.mode, options.rules),
        driver: TickDriver::with_period(options.tick_period),
        commands: command_rx,
        events: event_tx.clone(),
        jobs: job_tx,
        stats: FocusStats::default(),
        unseeded: Some(Vec::new()),
        seed: Some(seed_rx),
        epoch: Instant::now(),
    };
    let actor = tokio::spawn(actor.run());

    let handle = SessionHandle {
        commands: command_tx,
        events: event_tx,
    };
    (handle, ArenaTasks { actor, worker })
}

struct SessionActor {
    session: FocusSession,
    driver: TickDriver,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
    jobs: mpsc::UnboundedSender<ReconcileJob>,
    stats: FocusStats,
    /// Outcomes seen before the stats seed arrived; replayed on top of it.
    unseeded: Option<Vec<SessionOutcome>>,
    seed: Option<oneshot::Receiver<FocusStats>>,
    epoch: Instant,
}

impl SessionActor {
    async fn run(mut self) {
        tracing::debug!(mode = %self.session.mode(), "session actor started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                _ = self.driver.next() => {
                    if let Some(event) = self.session.tick() {
                        self.publish(event);
                    }
                }
                seeded = recv_seed(&mut self.seed) => self.apply_seed(seeded),
            }
            self.driver
                .sync(self.session.state() == SessionState::Running);
        }
        tracing::debug!("session actor stopped");
    }

    fn handle(&mut self, command: Command) {
        let event = match command {
            Command::SelectMode(mode) => self.session.select_mode(mode),
            Command::Start => self.session.start(),
            Command::Pause => self.session.pause(),
            Command::Resume => self.session.resume(),
            Command::GiveUp => self.session.give_up(),
            Command::Reset => self.session.reset_to_idle(),
            Command::Hidden => {
                let now = self.now_ms();
                self.session.hidden(now);
                None
            }
            Command::Visible => {
                let now = self.now_ms();
                for event in self.session.visible(now) {
                    self.publish(event);
                }
                None
            }
            Command::Status(reply) => {
                let _ = reply.send(ArenaStatus {
                    session: self.session.snapshot(),
                    stats: self.stats,
                });
                None
            }
            Command::Shutdown => None,
        };
        if let Some(event) = event {
            self.publish(event);
        }
    }

    fn publish(&mut self, event: Event) {
        if let Some(job) = ReconcileJob::from_event(&event) {
            if self.jobs.send(job).is_err() {
                tracing::warn!(event = event.kind(), "reconciliation worker gone, dropping job");
            }
        }
        if let Event::SessionEnded { outcome } = &event {
            self.stats.absorb(outcome);
            if let Some(pending) = self.unseeded.as_mut() {
                pending.push(outcome.clone());
            }
            tracing::info!(
                session_id = %outcome.session_id,
                mode = %outcome.mode,
                status = outcome.status.as_str(),
                elapsed_secs = outcome.elapsed_secs,
                xp = outcome.xp_earned,
                hp = outcome.hp_remaining,
                "focus session ended"
            );
        } else {
            tracing::debug!(event = event.kind(), "session event");
        }
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn apply_seed(&mut self, seeded: std::result::Result<FocusStats, RecvError>) {
        self.seed = None;
        let pending = self.unseeded.take().unwrap_or_default();
        if let Ok(stats) = seeded {
            self.stats = stats;
            for outcome in &pending {
                self.stats.absorb(outcome);
            }
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

async fn recv_seed(
    seed: &mut Option<oneshot::Receiver<FocusStats>>,
) -> std::result::Result<FocusStats, RecvError> {
    match seed.as_mut() {
        Some(rx) => rx.await,
        None => std::future::pending().await,
    }
}
