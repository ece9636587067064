//! Match State Definitions
//!
//! Typed records for everything one match simulates.
//! Uses BTreeMap keyed by `PlayerId` so every multi-player pass runs in
//! ascending id order.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::field::FieldConfig;
use crate::game::input::InputBuffer;
use crate::game::kickoff::KickoffState;
use crate::game::powerup::PowerUpState;

// =============================================================================
// IDS
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
/// Serializes as a UUID string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create a fresh random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..4]))
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.to_uuid_string()
    }
}

impl TryFrom<String> for PlayerId {
    type Error = uuid::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        uuid::Uuid::parse_str(&s).map(|u| Self(*u.as_bytes()))
    }
}

/// Unique match identifier (UUID as bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MatchId(pub [u8; 16]);

impl MatchId {
    /// Create a fresh random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..4]))
    }
}

impl From<MatchId> for String {
    fn from(id: MatchId) -> Self {
        id.to_uuid_string()
    }
}

impl TryFrom<String> for MatchId {
    type Error = uuid::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        uuid::Uuid::parse_str(&s).map(|u| Self(*u.as_bytes()))
    }
}

// =============================================================================
// TEAMS & ROSTER
// =============================================================================

/// One of the two sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Attacks the bottom goal
    Red,
    /// Attacks the top goal
    Blue,
}

impl Team {
    /// The other side.
    #[inline]
    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Red => f.write_str("red"),
            Team::Blue => f.write_str("blue"),
        }
    }
}

/// Where a roster entry sits when the match starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterSide {
    /// Plays for a team
    Team(Team),
    /// Watches only, never spawned
    Spectator,
}

/// One participant handed over by the room collaborator at match start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Player id
    pub player_id: PlayerId,
    /// Display name
    pub name: String,
    /// Team or spectator
    pub side: RosterSide,
}

impl RosterEntry {
    /// Entry for a playing participant.
    pub fn player(player_id: PlayerId, name: impl Into<String>, team: Team) -> Self {
        Self {
            player_id,
            name: name.into(),
            side: RosterSide::Team(team),
        }
    }

    /// Entry for a spectator.
    pub fn spectator(player_id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            player_id,
            name: name.into(),
            side: RosterSide::Spectator,
        }
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// State of a single player on the pitch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Side the player is on
    pub team: Team,
    /// Current position
    pub position: Vec2,
    /// Current velocity (px/tick)
    pub velocity: Vec2,
    /// Kickoff reset position
    pub spawn: Vec2,
}

/// The match ball.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Current position
    pub position: Vec2,
    /// Current velocity (px/tick)
    pub velocity: Vec2,
}

impl Ball {
    /// Ball at rest on `position`.
    pub fn at_rest(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }
}

/// Kinematic state of every player and the ball.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityStore {
    /// All players (BTreeMap for deterministic order)
    pub players: BTreeMap<PlayerId, Player>,
    /// The ball
    pub ball: Ball,
}

impl EntityStore {
    /// Empty pitch with the ball on the centre spot.
    pub fn new(field: &FieldConfig) -> Self {
        Self {
            players: BTreeMap::new(),
            ball: Ball::at_rest(field.center()),
        }
    }

    /// Add a player on the next spawn slot of its team.
    ///
    /// An id that is already present is replaced and re-slotted.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        team: Team,
        field: &FieldConfig,
    ) -> &Player {
        self.players.remove(&id);

        let slot = self.team_count(team);
        let spawn = field.spawn_position(team, slot);

        self.players.entry(id).or_insert(Player {
            id,
            name: name.into(),
            team,
            position: spawn,
            velocity: Vec2::ZERO,
            spawn,
        })
    }

    /// Remove a player. Unknown ids are ignored.
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
        self.players.remove(id)
    }

    /// Number of players currently on `team`.
    pub fn team_count(&self, team: Team) -> usize {
        self.players.values().filter(|p| p.team == team).count()
    }

    /// Get player by ID.
    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Get mutable player by ID.
    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// Sorted player ids.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    /// Number of players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// True if no players are on the pitch.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Put every player back on its spawn and the ball on the centre spot,
    /// all at rest.
    pub fn reset_positions(&mut self, field: &FieldConfig) {
        for player in self.players.values_mut() {
            player.position = player.spawn;
            player.velocity = Vec2::ZERO;
        }
        self.ball = Ball::at_rest(field.center());
    }

    /// True if every position and velocity is finite.
    pub fn is_finite(&self) -> bool {
        self.ball.position.is_finite()
            && self.ball.velocity.is_finite()
            && self
                .players
                .values()
                .all(|p| p.position.is_finite() && p.velocity.is_finite())
    }
}

// =============================================================================
// SCORE
// =============================================================================

/// Goals per team. Only ever increases within a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Red goals
    pub red: u32,
    /// Blue goals
    pub blue: u32,
}

impl Score {
    /// Create a score.
    pub const fn new(red: u32, blue: u32) -> Self {
        Self { red, blue }
    }

    /// Credit one goal to `team`.
    pub fn increment(&mut self, team: Team) {
        match team {
            Team::Red => self.red += 1,
            Team::Blue => self.blue += 1,
        }
    }

    /// Goals scored by `team`.
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    /// Result if the match ended now.
    pub fn outcome(&self) -> MatchOutcome {
        use std::cmp::Ordering;
        match self.red.cmp(&self.blue) {
            Ordering::Greater => MatchOutcome::Winner(Team::Red),
            Ordering::Less => MatchOutcome::Winner(Team::Blue),
            Ordering::Equal => MatchOutcome::Draw,
        }
    }
}

/// Final result of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    /// One team scored more
    Winner(Team),
    /// Equal scores
    Draw,
}

// =============================================================================
// ANIMATION MARKERS
// =============================================================================

/// Transient action shown to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    /// Player kicked
    Kick,
    /// Player pushed
    Push,
}

/// Animation marker with its remaining lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    /// What the player did
    pub kind: AnimationKind,
    /// Ticks until the marker disappears
    pub ticks_remaining: u8,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete simulation state of one match.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Ticks simulated so far
    pub tick: u64,
    /// Players and ball
    pub entities: EntityStore,
    /// Last-known intent per player
    pub inputs: InputBuffer,
    /// Pickups and buffs
    pub powerups: PowerUpState,
    /// Current score
    pub score: Score,
    /// Kickoff possession gate
    pub kickoff: KickoffState,
    /// Active animation markers
    pub animations: BTreeMap<PlayerId, Animation>,
}

impl MatchState {
    /// Create an empty match.
    pub fn new(field: &FieldConfig, powerups: PowerUpState) -> Self {
        Self {
            tick: 0,
            entities: EntityStore::new(field),
            inputs: InputBuffer::new(),
            powerups,
            score: Score::default(),
            kickoff: KickoffState::default(),
            animations: BTreeMap::new(),
        }
    }

    /// Add a player with zeroed velocity and empty input.
    ///
    /// Re-adding a known id replaces the player and drops its buff and
    /// animation marker.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        team: Team,
        field: &FieldConfig,
    ) {
        self.powerups.remove_player(&id);
        self.animations.remove(&id);
        self.entities.add_player(id, name, team, field);
        self.inputs.insert(id);
    }

    /// Remove a player and everything keyed by it. Unknown ids are ignored.
    pub fn remove_player(&mut self, id: &PlayerId) -> bool {
        let removed = self.entities.remove_player(id).is_some();
        self.inputs.remove(id);
        self.powerups.remove_player(id);
        self.animations.remove(id);
        removed
    }

    /// Show an animation marker for a player.
    pub fn mark(&mut self, id: PlayerId, kind: AnimationKind, ticks: u8) {
        self.animations.insert(id, Animation {
            kind,
            ticks_remaining: ticks,
        });
    }

    /// Count every marker down by one tick, dropping expired ones.
    pub fn age_animations(&mut self) {
        self.animations.retain(|_, anim| {
            anim.ticks_remaining = anim.ticks_remaining.saturating_sub(1);
            anim.ticks_remaining > 0
        });
    }
}

// =============================================================================
// TESTS
// =============================================================================
