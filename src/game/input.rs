//! Input Intents and the Input Buffer
//!
//! The buffer keeps exactly one intent per player: the last one received.
//! Movement is held; kick and push are edge-triggered and are taken out of
//! the buffer by the physics step the first time it reads them.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::state::PlayerId;

// =============================================================================
// MOVEMENT FLAGS
// =============================================================================

/// Held movement keys, packed into four bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveFlags(pub u8);

impl MoveFlags {
    /// Nothing held
    pub const NONE: Self = Self(0);
    /// Up (towards y = 0)
    pub const UP: Self = Self(0x01);
    /// Down (towards y = height)
    pub const DOWN: Self = Self(0x02);
    /// Left
    pub const LEFT: Self = Self(0x04);
    /// Right
    pub const RIGHT: Self = Self(0x08);

    /// Union of two flag sets.
    #[inline]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True if every bit of `other` is held.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Unit direction on each axis, before diagonal scaling.
    ///
    /// Opposing keys cancel.
    #[inline]
    pub fn axes(self) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.contains(Self::UP) {
            dy -= 1.0;
        }
        if self.contains(Self::DOWN) {
            dy += 1.0;
        }
        if self.contains(Self::LEFT) {
            dx -= 1.0;
        }
        if self.contains(Self::RIGHT) {
            dx += 1.0;
        }
        (dx, dy)
    }

    /// Movement direction with diagonals scaled per axis by `diagonal_factor`.
    pub fn direction(self, diagonal_factor: f32) -> Vec2 {
        let (dx, dy) = self.axes();
        if dx != 0.0 && dy != 0.0 {
            Vec2::new(dx * diagonal_factor, dy * diagonal_factor)
        } else {
            Vec2::new(dx, dy)
        }
    }
}

impl std::ops::BitOr for MoveFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}

// =============================================================================
// INPUT INTENT
// =============================================================================

/// Everything a player asked for since the previous tick.
///
/// Missing fields deserialize to "nothing pressed".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputIntent {
    /// Held movement keys
    pub movement: MoveFlags,
    /// One-shot kick request
    pub kick: bool,
    /// One-shot push request
    pub push: bool,
}

impl InputIntent {
    /// Intent with only movement.
    pub const fn moving(movement: MoveFlags) -> Self {
        Self {
            movement,
            kick: false,
            push: false,
        }
    }

    /// Intent with only a kick.
    pub const fn kick() -> Self {
        Self {
            movement: MoveFlags::NONE,
            kick: true,
            push: false,
        }
    }

    /// Intent with only a push.
    pub const fn push() -> Self {
        Self {
            movement: MoveFlags::NONE,
            kick: false,
            push: true,
        }
    }
}

/// One-shot actions taken out of the buffer for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Actions {
    /// Kick was requested
    pub kick: bool,
    /// Push was requested
    pub push: bool,
}

// =============================================================================
// INPUT BUFFER
// =============================================================================

/// Last-known intent per player.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputBuffer {
    intents: BTreeMap<PlayerId, InputIntent>,
}

impl InputBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a player with an empty intent.
    pub fn insert(&mut self, id: PlayerId) {
        self.intents.insert(id, InputIntent::default());
    }

    /// Stop tracking a player.
    pub fn remove(&mut self, id: &PlayerId) {
        self.intents.remove(id);
    }

    /// Overwrite a player's intent. Returns false for unknown players.
    pub fn set(&mut self, id: &PlayerId, intent: InputIntent) -> bool {
        match self.intents.get_mut(id) {
            Some(slot) => {
                *slot = intent;
                true
            }
            None => false,
        }
    }

    /// Current intent of a player.
    pub fn get(&self, id: &PlayerId) -> Option<&InputIntent> {
        self.intents.get(id)
    }

    /// Held movement of a player (none if unknown).
    pub fn movement(&self, id: &PlayerId) -> MoveFlags {
        self.intents
            .get(id)
            .map(|i| i.movement)
            .unwrap_or_default()
    }

    /// Read and clear the one-shot flags of a player.
    ///
    /// After this call neither flag is visible to anyone until the player
    /// sends a new intent.
    pub fn take_actions(&mut self, id: &PlayerId) -> Actions {
        match self.intents.get_mut(id) {
            Some(intent) => Actions {
                kick: std::mem::take(&mut intent.kick),
                push: std::mem::take(&mut intent.push),
            },
            None => Actions::default(),
        }
    }

    /// Number of tracked players.
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// True if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
