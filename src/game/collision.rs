//! Collision Detection and Resolution
//!
//! Player movement with player-player separation, ball integration, and the
//! ball's walls, goal lines, posts and player contacts. Every pass that
//! touches more than one player walks them in ascending `PlayerId` order.

use std::collections::BTreeMap;

use crate::core::vec2::Vec2;
use crate::game::field::FieldConfig;
use crate::game::kickoff::{exclude_from_circle, KickoffState};
use crate::game::state::{Ball, EntityStore, Player, PlayerId, Team};

/// Check if two circles overlap (touching does not count).
#[inline]
pub fn circles_overlap(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> bool {
    let combined = radius_a + radius_b;
    pos_a.distance_squared(pos_b) < combined * combined
}

/// Unit normal pointing from `from` to `to`, and the distance between them.
///
/// Coincident points use +x as the normal.
#[inline]
pub fn contact_normal(from: Vec2, to: Vec2) -> (Vec2, f32) {
    let offset = to - from;
    let dist = offset.length();
    (offset.normalize_or(Vec2::RIGHT), dist)
}

// =============================================================================
// PLAYERS
// =============================================================================

/// Integrate every player for one tick.
///
/// For each player in id order: build the candidate position from its
/// velocity, keep kickoff-restricted players out of the centre circle, then
/// either commit the candidate or, if it overlaps anyone, cancel the move and
/// separate the pair. Afterwards all players are damped and clamped.
pub fn integrate_players(entities: &mut EntityStore, field: &FieldConfig, kickoff: &KickoffState) {
    let restricted = kickoff.restricted_team();

    for id in entities.player_ids() {
        let Some(mover) = entities.get_mut(&id) else {
            continue;
        };

        let mut candidate = mover.position + mover.velocity;
        if restricted == Some(mover.team) {
            if let Some(outside) = exclude_from_circle(candidate, field) {
                candidate = outside;
                mover.velocity = Vec2::ZERO;
            }
        }

        let shifts = overlap_shifts(&entities.players, id, candidate, field.player_radius);
        if shifts.is_empty() {
            if let Some(mover) = entities.get_mut(&id) {
                mover.position = candidate;
            }
            continue;
        }

        let mut mover_shift = Vec2::ZERO;
        for (other_id, shift) in shifts {
            mover_shift += shift;
            if let Some(other) = entities.get_mut(&other_id) {
                other.position -= shift;
            }
        }
        if let Some(mover) = entities.get_mut(&id) {
            mover.position += mover_shift;
            mover.velocity = mover.velocity * field.collision_damping;
        }
    }

    for player in entities.players.values_mut() {
        player.velocity = player.velocity * field.player_damping;
        player.position = field.clamp_player(player.position);
        if restricted == Some(player.team) {
            if let Some(outside) = exclude_from_circle(player.position, field) {
                player.position = outside;
            }
        }
    }
}

/// Half-overlap shifts for every player overlapping `candidate`.
///
/// Each shift is what the mover gains; the other player loses the same.
fn overlap_shifts(
    players: &BTreeMap<PlayerId, Player>,
    mover: PlayerId,
    candidate: Vec2,
    radius: f32,
) -> Vec<(PlayerId, Vec2)> {
    players
        .values()
        .filter(|other| other.id != mover)
        .filter(|other| circles_overlap(candidate, radius, other.position, radius))
        .map(|other| {
            let (normal, dist) = contact_normal(other.position, candidate);
            let overlap = radius * 2.0 - dist;
            (other.id, normal * (overlap / 2.0))
        })
        .collect()
}

// =============================================================================
// BALL
// =============================================================================

/// Move the ball by its velocity, then apply friction.
#[inline]
pub fn integrate_ball(ball: &mut Ball, field: &FieldConfig) {
    ball.position += ball.velocity;
    ball.velocity = ball.velocity * field.ball_friction;
}

/// Bounce off the side walls (x = 0 and x = width).
///
/// Returns true if the ball touched a side wall.
pub fn bounce_side_walls(ball: &mut Ball, field: &FieldConfig) -> bool {
    let r = field.ball_radius;
    if ball.position.x - r < 0.0 || ball.position.x + r > field.width {
        ball.velocity.x *= field.restitution;
        ball.position.x = ball.position.x.clamp(r, field.width - r);
        return true;
    }
    false
}

/// Check both goal lines.
///
/// Inside the mouth the ball scores: top line for blue, bottom line for red.
/// Outside the mouth the line is a wall and the ball bounces.
pub fn resolve_goal_lines(ball: &mut Ball, field: &FieldConfig) -> Option<Team> {
    let r = field.ball_radius;

    if ball.position.y - r < 0.0 {
        if field.in_goal_mouth(ball.position.x) {
            return Some(Team::Blue);
        }
        ball.velocity.y *= field.restitution;
        ball.position.y = r;
    }

    if ball.position.y + r > field.height {
        if field.in_goal_mouth(ball.position.x) {
            return Some(Team::Red);
        }
        ball.velocity.y *= field.restitution;
        ball.position.y = field.height - r;
    }

    None
}

/// Bounce off a goal post.
///
/// Posts are the mouth edges inside the goal-depth band at either end. This
/// check does not know about the goal-line bounce and can fire in the same
/// tick, reflecting the ball on both axes.
pub fn bounce_posts(ball: &mut Ball, field: &FieldConfig) -> bool {
    let r = field.ball_radius;
    let y = ball.position.y;
    let in_band = y - r < field.goal_depth || y + r > field.height - field.goal_depth;
    if !in_band {
        return false;
    }

    for post_x in [field.goal_left(), field.goal_right()] {
        let x = ball.position.x;
        if (x - post_x).abs() < r {
            ball.velocity.x *= field.restitution;
            ball.position.x = if x < post_x { post_x - r } else { post_x + r };
            return true;
        }
    }
    false
}

/// Resolve ball contacts with every player, in id order.
///
/// An approaching ball gets `-bounce * v_rel` along the normal plus a share
/// of the player's velocity. The ball is always separated from the player and
/// finally clamped into the field. Players of the kickoff-restricted team do
/// not touch the ball at all.
///
/// Returns the ids of the players that touched the ball, in id order.
pub fn resolve_ball_players(
    entities: &mut EntityStore,
    field: &FieldConfig,
    kickoff: &KickoffState,
) -> Vec<PlayerId> {
    let restricted = kickoff.restricted_team();
    let reach = field.player_radius + field.ball_radius;
    let ball = &mut entities.ball;
    let mut contacts = Vec::new();

    for player in entities.players.values() {
        if restricted == Some(player.team) {
            continue;
        }
        if !circles_overlap(ball.position, field.ball_radius, player.position, field.player_radius) {
            continue;
        }
        contacts.push(player.id);

        let (normal, dist) = contact_normal(player.position, ball.position);
        let approach = (ball.velocity - player.velocity).dot(normal);
        if approach < 0.0 {
            ball.velocity += normal * (-field.bounce * approach) + player.velocity * field.contact_carry;
        }

        ball.position += normal * (reach - dist);
    }

    ball.position = field.clamp_ball(ball.position);
    contacts
}

// =============================================================================
// TESTS
// =============================================================================
