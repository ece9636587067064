//! Field Configuration
//!
//! Static pitch geometry and every tunable physics constant.
//! Immutable for the lifetime of a match once the session is created.
//!
//! Coordinates are pixels with the origin at the top-left corner, x growing
//! to the right and y growing downward. Velocities are pixels per tick.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::state::Team;

/// Physics constants and pitch geometry for one match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Pitch width
    pub width: f32,
    /// Pitch height
    pub height: f32,
    /// Player collision radius
    pub player_radius: f32,
    /// Ball collision radius
    pub ball_radius: f32,
    /// Base movement speed (px/tick)
    pub player_speed: f32,
    /// Ball velocity retained per tick
    pub ball_friction: f32,
    /// Base kick power
    pub kick_power: f32,
    /// Kick power gained per unit of kicker speed
    pub kick_speed_bonus: f32,
    /// Fraction of kicker velocity carried into the ball
    pub kick_carry: f32,
    /// Base push power at zero distance
    pub push_power: f32,
    /// Fraction of push impulse the pusher receives as recoil
    pub push_recoil: f32,
    /// Maximum player-to-ball distance for a kick
    pub kick_distance: f32,
    /// Maximum player-to-player distance for a push
    pub push_distance: f32,
    /// Width of the goal mouth, centred on the goal line
    pub goal_width: f32,
    /// Depth of the band in which goal posts exist
    pub goal_depth: f32,
    /// Kickoff circle radius around the centre spot
    pub kickoff_radius: f32,
    /// Wall and post restitution (negative: reverses direction)
    pub restitution: f32,
    /// Ball-player bounce coefficient
    pub bounce: f32,
    /// Fraction of player velocity carried into the ball on contact
    pub contact_carry: f32,
    /// Player velocity retained per tick
    pub player_damping: f32,
    /// Mover velocity retained after bumping another player
    pub collision_damping: f32,
    /// Per-axis factor applied to diagonal movement
    pub diagonal_factor: f32,
    /// Movement speed multiplier while a speed boost is active
    pub speed_boost: f32,
    /// Spawn column for the red team
    pub red_spawn_x: f32,
    /// Spawn column for the blue team
    pub blue_spawn_x: f32,
    /// Vertical distance between spawn slots
    pub spawn_spacing: f32,
    /// Ticks an animation marker stays visible
    pub animation_ticks: u8,
}

impl Default for FieldConfig {
    fn default() -> Self {
        let player_radius = 20.0;
        let ball_radius = 12.0;
        Self {
            width: 1200.0,
            height: 600.0,
            player_radius,
            ball_radius,
            player_speed: 4.0,
            ball_friction: 0.98,
            kick_power: 15.0,
            kick_speed_bonus: 0.8,
            kick_carry: 0.3,
            push_power: 10.0,
            push_recoil: 0.2,
            kick_distance: player_radius + ball_radius + 5.0,
            push_distance: player_radius * 3.0,
            goal_width: 200.0,
            goal_depth: 40.0,
            kickoff_radius: 80.0,
            restitution: -0.8,
            bounce: 1.5,
            contact_carry: 0.5,
            player_damping: 0.92,
            collision_damping: 0.8,
            diagonal_factor: 0.707,
            speed_boost: 1.5,
            red_spawn_x: 200.0,
            blue_spawn_x: 1000.0,
            spawn_spacing: 80.0,
            animation_ticks: 10,
        }
    }
}

impl FieldConfig {
    /// Centre spot.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Left edge (and left post) of both goal mouths.
    #[inline]
    pub fn goal_left(&self) -> f32 {
        (self.width - self.goal_width) / 2.0
    }

    /// Right edge (and right post) of both goal mouths.
    #[inline]
    pub fn goal_right(&self) -> f32 {
        self.goal_left() + self.goal_width
    }

    /// True if `x` lies strictly inside the goal mouth span.
    #[inline]
    pub fn in_goal_mouth(&self, x: f32) -> bool {
        x > self.goal_left() && x < self.goal_right()
    }

    /// Bounds a circle of `radius` must stay inside.
    #[inline]
    pub fn bounds_for(&self, radius: f32) -> (Vec2, Vec2) {
        (
            Vec2::new(radius, radius),
            Vec2::new(self.width - radius, self.height - radius),
        )
    }

    /// Clamp a player position into the field.
    #[inline]
    pub fn clamp_player(&self, pos: Vec2) -> Vec2 {
        let (min, max) = self.bounds_for(self.player_radius);
        pos.clamp(min, max)
    }

    /// Clamp a ball position into the field.
    #[inline]
    pub fn clamp_ball(&self, pos: Vec2) -> Vec2 {
        let (min, max) = self.bounds_for(self.ball_radius);
        pos.clamp(min, max)
    }

    /// Spawn position for the `slot`-th player of a team.
    ///
    /// Slots alternate around the vertical centre with growing distance:
    /// 0, -1, +1, -2, +2, ... times the spawn spacing. Once a column is full
    /// the next one starts one spacing behind the spawn line, then one in
    /// front of it, alternating the same way.
    pub fn spawn_position(&self, team: Team, slot: usize) -> Vec2 {
        let (x, sign) = match team {
            Team::Red => (self.red_spawn_x, 1.0),
            Team::Blue => (self.blue_spawn_x, -1.0),
        };

        let rows = if self.spawn_spacing > 0.0 {
            ((self.height / 2.0 - self.player_radius) / self.spawn_spacing)
                .floor()
                .max(0.0) as usize
        } else {
            0
        };
        let per_column = rows.saturating_mul(2).saturating_add(1);
        let (column, row) = (slot / per_column, slot % per_column);

        let x = x + sign * alternating_offset(column, self.spawn_spacing);
        let y = self.height / 2.0 + alternating_offset(row, self.spawn_spacing);
        self.clamp_player(Vec2::new(x, y))
    }
}

/// 0, -1, +1, -2, +2, ... times `spacing` for index 0, 1, 2, 3, 4, ...
fn alternating_offset(index: usize, spacing: f32) -> f32 {
    let step = index.div_ceil(2) as f32 * spacing;
    if index % 2 == 1 { -step } else { step }
}

// =============================================================================
// TESTS
// =============================================================================
