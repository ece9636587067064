//! Power-Up Subsystem
//!
//! Timed field pickups and the single buff each player may carry.
//! All timers run on the injected monotonic time passed into every tick,
//! never on the match clock, so pausing a match does not hold them back.

use std::collections::BTreeMap;
use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::events::GameEvent;
use crate::game::field::FieldConfig;
use crate::game::state::{Player, PlayerId};

/// Buff granted by a pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Doubles kick power
    SuperKick,
    /// Doubles push power
    MegaPush,
    /// Multiplies movement speed
    SpeedBoost,
    /// Collectable, no physical effect
    Giant,
}

impl PowerUpKind {
    /// Every kind, in spawn-table order.
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::SuperKick,
        PowerUpKind::MegaPush,
        PowerUpKind::SpeedBoost,
        PowerUpKind::Giant,
    ];
}

/// Configuration for pickup spawning and buff timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerUpConfig {
    /// Time between spawns
    pub spawn_interval: Duration,
    /// Time a pickup stays on the field
    pub pickup_lifetime: Duration,
    /// Time a collected buff lasts
    pub buff_duration: Duration,
    /// Pickup collision radius
    pub pickup_radius: f32,
    /// Distance from every edge pickups keep when spawning
    pub spawn_margin: f32,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            spawn_interval: Duration::from_secs(25),
            pickup_lifetime: Duration::from_secs(30),
            buff_duration: Duration::from_secs(10),
            pickup_radius: 15.0,
            spawn_margin: 60.0,
        }
    }
}

/// A pickup lying on the field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerUpPickup {
    /// Unique within the match
    pub id: u32,
    /// Where it lies
    pub position: Vec2,
    /// Buff it grants
    pub kind: PowerUpKind,
    /// When it appeared
    pub spawned_at: Duration,
}

/// The buff a player currently carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBuff {
    /// Buff type
    pub kind: PowerUpKind,
    /// Last instant at which the buff is active
    pub expires_at: Duration,
}

impl PlayerBuff {
    /// True while `now` has not passed the expiry.
    #[inline]
    pub fn is_active(&self, now: Duration) -> bool {
        now <= self.expires_at
    }
}

/// Pickups on the field and buffs held by players.
#[derive(Clone, Debug)]
pub struct PowerUpState {
    pickups: BTreeMap<u32, PowerUpPickup>,
    buffs: BTreeMap<PlayerId, PlayerBuff>,
    next_pickup_id: u32,
    /// `None` until the match starts running
    last_spawn: Option<Duration>,
    rng: DeterministicRng,
}

impl PowerUpState {
    /// Create an idle subsystem drawing from `rng`.
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            pickups: BTreeMap::new(),
            buffs: BTreeMap::new(),
            next_pickup_id: 0,
            last_spawn: None,
            rng,
        }
    }

    /// Replace the RNG (the seed is only known once the roster is final).
    pub fn reseed(&mut self, rng: DeterministicRng) {
        self.rng = rng;
    }

    /// Start the spawn timer at `now`.
    pub fn start(&mut self, now: Duration) {
        self.last_spawn = Some(now);
    }

    /// Run the timers: spawn at most one pickup, drop stale pickups,
    /// drop expired buffs.
    pub fn maintain(
        &mut self,
        now: Duration,
        field: &FieldConfig,
        config: &PowerUpConfig,
        events: &mut Vec<GameEvent>,
    ) {
        self.maybe_spawn(now, field, config, events);

        self.pickups.retain(|&pickup_id, pickup| {
            let alive = now.saturating_sub(pickup.spawned_at) <= config.pickup_lifetime;
            if !alive {
                events.push(GameEvent::PowerUpExpired { pickup_id });
            }
            alive
        });

        self.buffs.retain(|&player_id, buff| {
            let active = buff.is_active(now);
            if !active {
                events.push(GameEvent::BuffExpired {
                    player_id,
                    kind: buff.kind,
                });
            }
            active
        });
    }

    fn maybe_spawn(
        &mut self,
        now: Duration,
        field: &FieldConfig,
        config: &PowerUpConfig,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(last) = self.last_spawn else {
            return;
        };
        if now.saturating_sub(last) < config.spawn_interval {
            return;
        }

        let margin = config.spawn_margin;
        let position = self.rng.random_position_in(
            Vec2::new(margin, margin),
            Vec2::new(field.width - margin, field.height - margin),
        );
        let kind = self
            .rng
            .choose(&PowerUpKind::ALL)
            .copied()
            .unwrap_or(PowerUpKind::SuperKick);

        let pickup_id = self.spawn_at(position, kind, now);
        self.last_spawn = Some(now);

        events.push(GameEvent::PowerUpSpawned {
            pickup_id,
            kind,
            position,
        });
    }

    /// Place a pickup directly. Returns its id.
    pub fn spawn_at(&mut self, position: Vec2, kind: PowerUpKind, now: Duration) -> u32 {
        let id = self.next_pickup_id;
        self.next_pickup_id += 1;
        self.pickups.insert(id, PowerUpPickup {
            id,
            position,
            kind,
            spawned_at: now,
        });
        id
    }

    /// Hand out pickups to players touching them.
    ///
    /// Players are visited in id order and each collects at most one pickup
    /// per tick. A new buff replaces whatever the player held.
    pub fn collect(
        &mut self,
        players: &BTreeMap<PlayerId, Player>,
        field: &FieldConfig,
        config: &PowerUpConfig,
        now: Duration,
        events: &mut Vec<GameEvent>,
    ) {
        let reach = field.player_radius + config.pickup_radius;
        let reach_sq = reach * reach;

        for player in players.values() {
            let touched = self
                .pickups
                .values()
                .find(|p| p.position.distance_squared(player.position) < reach_sq)
                .map(|p| (p.id, p.kind));

            if let Some((pickup_id, kind)) = touched {
                self.pickups.remove(&pickup_id);
                self.grant(player.id, kind, now, config);
                events.push(GameEvent::PowerUpCollected {
                    player_id: player.id,
                    pickup_id,
                    kind,
                });
            }
        }
    }

    /// Give a player a buff, replacing any buff it holds.
    pub fn grant(&mut self, player: PlayerId, kind: PowerUpKind, now: Duration, config: &PowerUpConfig) {
        self.buffs.insert(player, PlayerBuff {
            kind,
            expires_at: now + config.buff_duration,
        });
    }

    /// Buff kind a player currently carries.
    pub fn active_buff(&self, player: &PlayerId) -> Option<PowerUpKind> {
        self.buffs.get(player).map(|b| b.kind)
    }

    /// True if the player carries `kind`.
    #[inline]
    pub fn has_buff(&self, player: &PlayerId, kind: PowerUpKind) -> bool {
        self.active_buff(player) == Some(kind)
    }

    /// Full buff record of a player.
    pub fn buff(&self, player: &PlayerId) -> Option<&PlayerBuff> {
        self.buffs.get(player)
    }

    /// Forget a player's buff.
    pub fn remove_player(&mut self, player: &PlayerId) {
        self.buffs.remove(player);
    }

    /// Pickups on the field, in id order.
    pub fn pickups(&self) -> impl Iterator<Item = &PowerUpPickup> {
        self.pickups.values()
    }

    /// Held buffs, in player id order.
    pub fn buffs(&self) -> impl Iterator<Item = (&PlayerId, &PlayerBuff)> {
        self.buffs.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================
