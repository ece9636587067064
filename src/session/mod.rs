//! Session Module
//!
//! Everything with a clock or a task: the match lifecycle state machine,
//! the per-match tokio driver and the registry of live matches.
//!
//! ## Module Structure
//!
//! - `clock`: Injected time sources and the tick-counted match clock
//! - `lifecycle`: Idle, Running, Paused and Ended phases around the simulation
//! - `driver`: One task per match; command queue in, broadcast events out
//! - `manager`: Match registry and supervision

pub mod clock;
pub mod lifecycle;
pub mod driver;
pub mod manager;

pub use clock::{ManualClock, MatchClock, MonotonicClock, TimeSource};
pub use lifecycle::{MatchPhase, MatchSession, SessionConfig, SessionError, TickOutput};
pub use driver::{MatchCommand, MatchHandle};
pub use manager::{ManagerError, SessionManager};
