//! Player Actions
//!
//! Movement velocity and the two one-shot actions: kick and push.
//! Buff multipliers are decided by the caller and passed in.

use crate::core::vec2::Vec2;
use crate::game::collision::contact_normal;
use crate::game::field::FieldConfig;
use crate::game::input::MoveFlags;
use crate::game::state::{EntityStore, PlayerId};

/// Kick power multiplier while a super kick buff is active
pub const SUPER_KICK_MULTIPLIER: f32 = 2.0;

/// Push power multiplier while a mega push buff is active
pub const MEGA_PUSH_MULTIPLIER: f32 = 2.0;

/// Velocity for held movement keys.
///
/// Single-axis input moves at full speed; diagonals are scaled per axis so
/// their magnitude matches.
pub fn movement_velocity(movement: MoveFlags, field: &FieldConfig, speed_boost: bool) -> Vec2 {
    let speed = if speed_boost {
        field.player_speed * field.speed_boost
    } else {
        field.player_speed
    };
    movement.direction(field.diagonal_factor) * speed
}

/// Kick the ball if it is within reach of `kicker`.
///
/// Returns true if the ball was kicked.
pub fn attempt_kick(
    entities: &mut EntityStore,
    kicker: &PlayerId,
    field: &FieldConfig,
    super_kick: bool,
) -> bool {
    let Some(player) = entities.get(kicker) else {
        return false;
    };
    let player_pos = player.position;
    let player_vel = player.velocity;

    let (dir, dist) = contact_normal(player_pos, entities.ball.position);
    if dist >= field.kick_distance {
        return false;
    }

    let base = if super_kick {
        field.kick_power * SUPER_KICK_MULTIPLIER
    } else {
        field.kick_power
    };
    let power = base + field.kick_speed_bonus * player_vel.length();

    entities.ball.velocity = dir * power + player_vel * field.kick_carry;
    true
}

/// Push every other player within push distance of `pusher`.
///
/// Strength falls off linearly from full power at contact to zero at the
/// push distance. The pusher recoils by a fraction of each impulse.
/// Returns the number of players pushed.
pub fn attempt_push(
    entities: &mut EntityStore,
    pusher: &PlayerId,
    field: &FieldConfig,
    mega_push: bool,
) -> usize {
    let Some(source) = entities.get(pusher) else {
        return 0;
    };
    let source_pos = source.position;

    let power = if mega_push {
        field.push_power * MEGA_PUSH_MULTIPLIER
    } else {
        field.push_power
    };

    // Collect targets first, then mutate
    let impulses: Vec<(PlayerId, Vec2)> = entities
        .players
        .values()
        .filter(|p| p.id != *pusher)
        .filter_map(|p| {
            let (dir, dist) = contact_normal(source_pos, p.position);
            if dist >= field.push_distance {
                return None;
            }
            let strength = power * (1.0 - dist / field.push_distance);
            Some((p.id, dir * strength))
        })
        .collect();

    let mut recoil = Vec2::ZERO;
    for (target_id, impulse) in &impulses {
        if let Some(target) = entities.get_mut(target_id) {
            target.velocity += *impulse;
        }
        recoil -= *impulse * field.push_recoil;
    }
    if let Some(source) = entities.get_mut(pusher) {
        source.velocity += recoil;
    }

    impulses.len()
}

// =============================================================================
// TESTS
// =============================================================================
