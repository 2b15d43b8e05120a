mod actor;
mod clock;
mod engine;
mod mode;
mod outcome;
mod visibility;

pub use actor::{spawn, ArenaOptions, ArenaStatus, ArenaTasks, Command, SessionHandle};
pub use clock::{TickDriver, TICK_PERIOD};
pub use engine::{FocusSession, SessionSnapshot, SessionState, MAX_HP};
pub use mode::{FocusMode, ModeSpec};
pub use outcome::{OutcomeStatus, SessionOutcome};
pub use visibility::{PenaltyRules, VisibilityWatcher};
