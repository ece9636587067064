//! Outbound Snapshot
//!
//! The complete per-tick picture of a match handed to the transport layer.
//! Framing is the transport's business; JSON helpers exist for debugging and
//! tests.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::powerup::PowerUpKind;
use crate::game::state::{Animation, MatchState, PlayerId, Score, Team};

/// Player state in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Current position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
}

/// Ball state in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    /// Current position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
}

/// Field pickup in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupSnapshot {
    /// Pickup identifier.
    pub id: u32,
    /// Position.
    pub position: Vec2,
    /// Buff granted on collection.
    pub kind: PowerUpKind,
}

/// Match state sent once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks simulated so far.
    pub tick: u64,
    /// Players in id order.
    pub players: Vec<PlayerSnapshot>,
    /// The ball.
    pub ball: BallSnapshot,
    /// Current score.
    pub score: Score,
    /// Match clock (seconds).
    pub time_remaining: f64,
    /// Team holding kickoff possession.
    pub kickoff_possession: Option<Team>,
    /// First touch since the last reset has happened.
    pub kickoff_touched: bool,
    /// Kick/push markers still showing.
    pub animations: BTreeMap<PlayerId, Animation>,
    /// Pickups on the field.
    pub pickups: Vec<PickupSnapshot>,
    /// Buff held per player.
    pub buffs: BTreeMap<PlayerId, PowerUpKind>,
}

impl Snapshot {
    /// Capture the current state of a match.
    pub fn capture(state: &MatchState, time_remaining: f64) -> Self {
        let players = state
            .entities
            .players
            .values()
            .map(|p| PlayerSnapshot {
                id: p.id,
                name: p.name.clone(),
                team: p.team,
                position: p.position,
                velocity: p.velocity,
            })
            .collect();

        let pickups = state
            .powerups
            .pickups()
            .map(|p| PickupSnapshot {
                id: p.id,
                position: p.position,
                kind: p.kind,
            })
            .collect();

        let buffs = state
            .powerups
            .buffs()
            .map(|(id, buff)| (*id, buff.kind))
            .collect();

        Self {
            tick: state.tick,
            players,
            ball: BallSnapshot {
                position: state.entities.ball.position,
                velocity: state.entities.ball.velocity,
            },
            score: state.score,
            time_remaining,
            kickoff_possession: state.kickoff.possession,
            kickoff_touched: state.kickoff.touched,
            animations: state.animations.clone(),
            pickups,
            buffs,
        }
    }

    /// Look up a player.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// TESTS
// =============================================================================
