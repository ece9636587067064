//! Game Logic Module
//!
//! The match simulation. Synchronous, no I/O, no clocks of its own: time
//! comes in as an argument to every tick.
//!
//! ## Module Structure
//!
//! - `field`: Pitch geometry and physics constants
//! - `state`: Ids, teams, players, ball, score, match state
//! - `input`: Input intents and the last-writer-wins buffer
//! - `powerup`: Pickup spawning, expiry and buffs
//! - `action`: Movement, kick and push
//! - `collision`: Player, wall, goal, post and ball contacts
//! - `kickoff`: Kickoff possession gate and reset
//! - `tick`: Authoritative physics step
//! - `events`: Step events and outbound match events
//! - `snapshot`: Per-tick outbound state

pub mod field;
pub mod state;
pub mod input;
pub mod powerup;
pub mod action;
pub mod collision;
pub mod kickoff;
pub mod tick;
pub mod events;
pub mod snapshot;

// Re-export key types
pub use field::FieldConfig;
pub use state::{MatchId, MatchOutcome, MatchState, PlayerId, RosterEntry, RosterSide, Score, Team};
pub use input::{InputIntent, MoveFlags};
pub use powerup::{PowerUpConfig, PowerUpKind};
pub use kickoff::KickoffState;
pub use tick::{tick, MatchConfig, SimulationError, TickResult};
pub use events::{EndReason, GameEvent, GameOverEvent, GoalEvent, MatchEvent};
pub use snapshot::Snapshot;
