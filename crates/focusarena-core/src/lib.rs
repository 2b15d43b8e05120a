//! # Focus Arena Core Library
//!
//! This library provides the focus session engine of Focus Arena, the
//! gamified productivity tracker. Quests, shops and guilds live elsewhere;
//! this crate owns the one piece with real state: a timed focus session that
//! loses HP when the user wanders off, and the reconciliation of its outcome
//! with the reward ledger.
//!
//! ## Architecture
//!
//! - **Session Engine**: a synchronous state machine fed one `tick()` per
//!   second and visibility edges with timestamps
//! - **Session Actor**: a tokio task that owns the engine and its tick driver;
//!   everything else talks to it through a [`SessionHandle`]
//! - **Reward Reconciliation**: a worker that turns domain events into
//!   fire-and-forget calls on a [`Reconciler`] (local SQLite ledger or HTTP)
//! - **Storage**: SQLite ledger and TOML configuration
//!
//! ## Key Components
//!
//! - [`FocusSession`]: session state machine
//! - [`SessionHandle`]: command interface of the running actor
//! - [`Reconciler`]: trait for reward/persistence collaborators
//! - [`Database`]: session history, profile and statistics
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod reward;
pub mod session;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, ReconcileError};
pub use events::Event;
pub use reward::{FocusStats, HttpReconciler, LedgerReconciler, Reconciler};
pub use session::{
    ArenaOptions, ArenaStatus, FocusMode, FocusSession, OutcomeStatus, PenaltyRules,
    SessionHandle, SessionOutcome, SessionSnapshot, SessionState,
};
pub use storage::{Config, Database, Profile, SessionRecord};
