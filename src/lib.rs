//! # Pitchside Match Core
//!
//! Authoritative real-time simulation for a multiplayer 2D soccer game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PITCHSIDE CORE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - 2D vector math                            │
//! │  └── rng.rs      - Seeded Xorshift128+ and seed derivation   │
//! │                                                              │
//! │  game/           - Simulation (synchronous, no I/O)          │
//! │  ├── field.rs    - Pitch geometry and physics constants      │
//! │  ├── state.rs    - Players, ball, score, match state         │
//! │  ├── input.rs    - Input intents, last writer wins           │
//! │  ├── powerup.rs  - Pickups and timed buffs                   │
//! │  ├── action.rs   - Kick and push                             │
//! │  ├── collision.rs- Contacts, walls, goals and posts          │
//! │  ├── kickoff.rs  - Kickoff possession gate                   │
//! │  ├── tick.rs     - Authoritative physics step                │
//! │  ├── events.rs   - Step and outbound events                  │
//! │  └── snapshot.rs - Per-tick outbound state                   │
//! │                                                              │
//! │  session/        - Match loop (async)                        │
//! │  ├── clock.rs    - Time sources and match clock              │
//! │  ├── lifecycle.rs- Idle / Running / Paused / Ended           │
//! │  ├── driver.rs   - One tokio task per match                  │
//! │  └── manager.rs  - Registry of live matches                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering Guarantee
//!
//! Every multi-player resolution (actions, player overlap, ball contacts,
//! pickup collection) walks players in ascending `PlayerId` order:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - Power-up randomness from a per-match seeded Xorshift128+
//! - Timers read an injected `TimeSource`, never the wall clock
//!
//! Matches share nothing; each one is owned by a single task.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod session;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rng::DeterministicRng;
pub use game::field::FieldConfig;
pub use game::input::{InputIntent, MoveFlags};
pub use game::state::{MatchId, MatchState, PlayerId, RosterEntry, Score, Team};
pub use game::events::{GameOverEvent, GoalEvent, MatchEvent};
pub use game::snapshot::Snapshot;
pub use session::{MatchSession, SessionConfig, SessionManager};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
