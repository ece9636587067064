//! Game Events
//!
//! `GameEvent` is what a single physics step reports about itself.
//! `MatchEvent` is what leaves a match: snapshots, goals, pause toggles and
//! the final result, fanned out to every subscriber.

use std::sync::Arc;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::powerup::PowerUpKind;
use crate::game::snapshot::Snapshot;
use crate::game::state::{MatchOutcome, PlayerId, Score, Team};

// =============================================================================
// STEP EVENTS
// =============================================================================

/// Something that happened inside one physics step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Ball crossed a goal line inside the mouth
    GoalScored {
        /// Scoring team
        team: Team,
        /// Score after the goal
        score: Score,
    },

    /// Ball left a player's foot
    BallKicked {
        /// Player involved
        player_id: PlayerId,
        /// This kick released the kickoff restriction
        kickoff_touch: bool,
    },

    /// Kickoff restriction released by body contact instead of a kick
    KickoffDribbled {
        /// Player who ran into the ball
        player_id: PlayerId,
    },

    /// A push moved at least one other player
    PlayerPushed {
        /// Player who pushed
        pusher_id: PlayerId,
        /// Players moved
        targets: usize,
    },

    /// Pickup appeared on the field
    PowerUpSpawned {
        /// Pickup id
        pickup_id: u32,
        /// Buff type
        kind: PowerUpKind,
        /// Where it appeared
        position: Vec2,
    },

    /// Pickup vanished uncollected
    PowerUpExpired {
        /// Pickup id
        pickup_id: u32,
    },

    /// Player picked up a buff
    PowerUpCollected {
        /// Player involved
        player_id: PlayerId,
        /// Pickup id
        pickup_id: u32,
        /// Buff type
        kind: PowerUpKind,
    },

    /// Player's buff ran out
    BuffExpired {
        /// Player involved
        player_id: PlayerId,
        /// Buff type
        kind: PowerUpKind,
    },
}

// =============================================================================
// OUTBOUND EVENTS
// =============================================================================

/// A goal, as announced to participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalEvent {
    /// Team that scored
    pub team: Team,
    /// Score after the goal
    pub score: Score,
}

/// Why a match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Match clock ran out
    TimeUp,
    /// Stopped from outside
    Stopped,
    /// Simulation fault; no winner is reported
    Fault,
}

/// Final result, sent exactly once per match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverEvent {
    /// Winner or draw; `None` when the match ended on a fault
    pub winner: Option<MatchOutcome>,
    /// Last known score
    pub score: Score,
    /// What ended the match
    pub reason: EndReason,
}

impl GameOverEvent {
    /// Result computed from `score`.
    pub fn decided(score: Score, reason: EndReason) -> Self {
        Self {
            winner: Some(score.outcome()),
            score,
            reason,
        }
    }

    /// Result of a match that died on a fault.
    pub fn faulted(score: Score) -> Self {
        Self {
            winner: None,
            score,
            reason: EndReason::Fault,
        }
    }
}

/// Everything a match sends to its subscribers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MatchEvent {
    /// Match went from idle to running
    Started,
    /// Pause toggled
    Paused {
        /// True when the match is now paused
        paused: bool,
    },
    /// Once per tick
    Snapshot(Arc<Snapshot>),
    /// Goal this tick
    Goal(GoalEvent),
    /// Match is over
    GameOver(GameOverEvent),
}

// =============================================================================
// TESTS
// =============================================================================
