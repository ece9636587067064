//! Authoritative Physics Step
//!
//! One call advances one match by one tick. Synchronous and lock-free: the
//! match loop owns the state exclusively while it runs.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::game::action::{attempt_kick, attempt_push, movement_velocity};
use crate::game::collision::{
    bounce_posts, bounce_side_walls, integrate_ball, integrate_players,
    resolve_ball_players, resolve_goal_lines,
};
use crate::game::events::GameEvent;
use crate::game::field::FieldConfig;
use crate::game::kickoff::kickoff_reset;
use crate::game::powerup::{PowerUpConfig, PowerUpKind};
use crate::game::state::{AnimationKind, MatchState, Team};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Team that scored this tick
    pub scored: Option<Team>,
    /// Events generated this tick
    pub events: Vec<GameEvent>,
}

/// Configuration for match simulation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Geometry and physics constants
    pub field: FieldConfig,
    /// Pickup and buff timing
    pub powerups: PowerUpConfig,
}

/// Simulation fault.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// A position or velocity became NaN or infinite
    #[error("non-finite entity state after tick {tick}")]
    NonFinite {
        /// Tick that produced the bad state
        tick: u64,
    },
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `state` - The match state (will be mutated)
/// * `config` - Match configuration
/// * `now` - Monotonic time for power-up timers
///
/// # Order
///
/// Power-up timers, movement, push and kick, player integration, ball
/// integration, side walls, goal lines, posts, ball-player contacts, pickup
/// collection.
pub fn tick(
    state: &mut MatchState,
    config: &MatchConfig,
    now: Duration,
) -> Result<TickResult, SimulationError> {
    let field = &config.field;
    let mut result = TickResult::default();

    // 0. Advance tick counter and timers
    state.tick += 1;
    state.age_animations();
    state.powerups.maintain(now, field, &config.powerups, &mut result.events);

    // 1. Inputs: movement for everyone first, then one-shot actions
    apply_movement(state, field);
    apply_actions(state, field, &mut result.events);

    // 2-4. Players
    integrate_players(&mut state.entities, field, &state.kickoff);

    // 5. Ball
    integrate_ball(&mut state.entities.ball, field);

    // 6. Side walls
    bounce_side_walls(&mut state.entities.ball, field);

    // 7. Goals
    if let Some(team) = resolve_goal_lines(&mut state.entities.ball, field) {
        state.score.increment(team);
        kickoff_reset(state, field, team);
        result.scored = Some(team);
        result.events.push(GameEvent::GoalScored {
            team,
            score: state.score,
        });
    }

    // 8. Posts
    bounce_posts(&mut state.entities.ball, field);

    // 9. Ball against players; the possessing team's first contact takes the kickoff
    let contacts = resolve_ball_players(&mut state.entities, field, &state.kickoff);
    for id in contacts {
        let Some(team) = state.entities.get(&id).map(|p| p.team) else {
            continue;
        };
        if state.kickoff.register_touch(team) {
            result.events.push(GameEvent::KickoffDribbled { player_id: id });
        }
    }

    // 10. Pickups
    state.powerups.collect(
        &state.entities.players,
        field,
        &config.powerups,
        now,
        &mut result.events,
    );

    if !state.entities.is_finite() {
        return Err(SimulationError::NonFinite { tick: state.tick });
    }

    Ok(result)
}

/// Derive every player's velocity from its held movement keys.
fn apply_movement(state: &mut MatchState, field: &FieldConfig) {
    for player in state.entities.players.values_mut() {
        let movement = state.inputs.movement(&player.id);
        let boosted = state.powerups.has_buff(&player.id, PowerUpKind::SpeedBoost);
        player.velocity = movement_velocity(movement, field, boosted);
    }
}

/// Consume every player's kick and push flags, in id order.
fn apply_actions(state: &mut MatchState, field: &FieldConfig, events: &mut Vec<GameEvent>) {
    for id in state.entities.player_ids() {
        let actions = state.inputs.take_actions(&id);
        let Some(team) = state.entities.get(&id).map(|p| p.team) else {
            continue;
        };

        if actions.push {
            let mega = state.powerups.has_buff(&id, PowerUpKind::MegaPush);
            let targets = attempt_push(&mut state.entities, &id, field, mega);
            if targets > 0 {
                state.mark(id, AnimationKind::Push, field.animation_ticks);
                events.push(GameEvent::PlayerPushed {
                    pusher_id: id,
                    targets,
                });
            }
        }

        if actions.kick {
            if state.kickoff.is_restricted(team) {
                continue;
            }
            state.mark(id, AnimationKind::Kick, field.animation_ticks);

            let super_kick = state.powerups.has_buff(&id, PowerUpKind::SuperKick);
            if attempt_kick(&mut state.entities, &id, field, super_kick) {
                let kickoff_touch = state.kickoff.register_touch(team);
                events.push(GameEvent::BallKicked {
                    player_id: id,
                    kickoff_touch,
                });
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::core::vec2::Vec2;
    use crate::game::input::{InputIntent, MoveFlags};
    use crate::game::powerup::PowerUpState;
    use crate::game::state::{Ball, PlayerId, Score};

    fn pid(n: u8) -> PlayerId {
        PlayerId::new([n; 16])
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn new_match() -> (MatchState, MatchConfig) {
        let config = MatchConfig::default();
        let mut powerups = PowerUpState::new(DeterministicRng::new(11));
        powerups.start(Duration::ZERO);
        let state = MatchState::new(&config.field, powerups);
        (state, config)
    }

    fn place(state: &mut MatchState, id: PlayerId, position: Vec2) {
        let player = state.entities.get_mut(&id).unwrap();
        player.position = position;
    }

    #[test]
    fn test_tick_advances_counter() {
        let (mut state, config) = new_match();
        tick(&mut state, &config, Duration::ZERO).unwrap();
        tick(&mut state, &config, Duration::ZERO).unwrap();
        assert_eq!(state.tick, 2);
    }

    #[test]
    fn test_movement_from_input() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.inputs.set(&pid(1), InputIntent::moving(MoveFlags::RIGHT));

        tick(&mut state, &config, Duration::ZERO).unwrap();

        let p = state.entities.get(&pid(1)).unwrap();
        assert!(approx(p.position.x, 204.0));
        assert!(approx(p.velocity.x, 4.0 * 0.92));
    }

    #[test]
    fn test_speed_boost_moves_faster() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.inputs.set(&pid(1), InputIntent::moving(MoveFlags::DOWN));
        state.powerups.grant(pid(1), PowerUpKind::SpeedBoost, Duration::ZERO, &config.powerups);

        tick(&mut state, &config, Duration::from_secs(1)).unwrap();

        let p = state.entities.get(&pid(1)).unwrap();
        assert!(approx(p.position.y, 306.0));
    }

    #[test]
    fn test_kick_flag_consumed_out_of_range() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.inputs.set(&pid(1), InputIntent {
            movement: MoveFlags::NONE,
            kick: true,
            push: true,
        });

        tick(&mut state, &config, Duration::ZERO).unwrap();

        let intent = state.inputs.get(&pid(1)).unwrap();
        assert!(!intent.kick);
        assert!(!intent.push);
        assert_eq!(state.entities.ball.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_kick_sets_animation_marker() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        place(&mut state, pid(1), Vec2::new(567.0, 300.0));
        state.inputs.set(&pid(1), InputIntent::kick());

        let result = tick(&mut state, &config, Duration::ZERO).unwrap();

        assert_eq!(state.animations[&pid(1)].kind, AnimationKind::Kick);
        assert_eq!(state.animations[&pid(1)].ticks_remaining, 10);
        assert!(result.events.iter().any(|e| matches!(e, GameEvent::BallKicked { .. })));
        assert!(state.entities.ball.velocity.x > 0.0);

        for _ in 0..9 {
            tick(&mut state, &config, Duration::ZERO).unwrap();
        }
        assert_eq!(state.animations[&pid(1)].ticks_remaining, 1);
        tick(&mut state, &config, Duration::ZERO).unwrap();
        assert!(state.animations.is_empty());
    }

    #[test]
    fn test_push_survives_into_same_tick() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.add_player(pid(2), "b", Team::Blue, &config.field);
        place(&mut state, pid(1), Vec2::new(300.0, 300.0));
        place(&mut state, pid(2), Vec2::new(345.0, 300.0));
        state.inputs.set(&pid(1), InputIntent::push());

        tick(&mut state, &config, Duration::ZERO).unwrap();

        // Strength 10 * (1 - 45/60) = 2.5, integrated this tick
        let target = state.entities.get(&pid(2)).unwrap();
        assert!(approx(target.position.x, 347.5));
        assert_eq!(state.animations[&pid(1)].kind, AnimationKind::Push);
    }

    #[test]
    fn test_goal_scores_and_resets() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.add_player(pid(2), "b", Team::Blue, &config.field);
        place(&mut state, pid(1), Vec2::new(600.0, 520.0));
        state.entities.ball = Ball {
            position: Vec2::new(600.0, 585.0),
            velocity: Vec2::new(0.0, 10.0),
        };

        let result = tick(&mut state, &config, Duration::ZERO).unwrap();

        assert_eq!(result.scored, Some(Team::Red));
        assert_eq!(state.score, Score::new(1, 0));
        assert_eq!(state.entities.ball, Ball::at_rest(config.field.center()));
        for player in state.entities.players.values() {
            assert_eq!(player.position, player.spawn);
            assert_eq!(player.velocity, Vec2::ZERO);
        }
        assert_eq!(state.kickoff.possession, Some(Team::Blue));
        assert!(!state.kickoff.touched);
    }

    #[test]
    fn test_restricted_team_cannot_kick() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.add_player(pid(2), "b", Team::Blue, &config.field);
        state.kickoff.award(Team::Blue);
        // Red is restricted; put it next to the ball anyway
        place(&mut state, pid(1), Vec2::new(567.0, 300.0));
        state.inputs.set(&pid(1), InputIntent::kick());

        tick(&mut state, &config, Duration::ZERO).unwrap();

        assert!(!state.inputs.get(&pid(1)).unwrap().kick);
        assert!(!state.animations.contains_key(&pid(1)));
        assert_eq!(state.kickoff.restricted_team(), Some(Team::Red));
        // Pushed out of the circle
        let red = state.entities.get(&pid(1)).unwrap();
        assert!(red.position.distance(config.field.center()) >= 100.0 - 1e-3);
    }

    #[test]
    fn test_possessing_team_kick_releases_restriction() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.add_player(pid(2), "b", Team::Blue, &config.field);
        state.kickoff.award(Team::Blue);
        place(&mut state, pid(2), Vec2::new(633.0, 300.0));
        state.inputs.set(&pid(2), InputIntent::kick());

        let result = tick(&mut state, &config, Duration::ZERO).unwrap();

        assert!(state.kickoff.touched);
        assert_eq!(state.kickoff.restricted_team(), None);
        assert!(result.events.contains(&GameEvent::BallKicked {
            player_id: pid(2),
            kickoff_touch: true,
        }));
    }

    #[test]
    fn test_dribble_out_of_circle_releases_restriction() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.add_player(pid(2), "b", Team::Blue, &config.field);
        state.kickoff.award(Team::Blue);
        // Blue walks into the ball from the right and never kicks
        place(&mut state, pid(2), Vec2::new(640.0, 300.0));
        state.inputs.set(&pid(2), InputIntent::moving(MoveFlags::LEFT));

        let mut released = Vec::new();
        for _ in 0..30 {
            let result = tick(&mut state, &config, Duration::ZERO).unwrap();
            released.extend(
                result
                    .events
                    .into_iter()
                    .filter(|e| matches!(e, GameEvent::KickoffDribbled { .. })),
            );
        }

        assert_eq!(released, vec![GameEvent::KickoffDribbled { player_id: pid(2) }]);
        assert!(state.kickoff.touched);
        assert_eq!(state.kickoff.possession, None);
        assert_eq!(state.kickoff.restricted_team(), None);
        assert!(state.entities.ball.position.x < 600.0);

        // Red may kick again once the ball is within reach
        let ball = state.entities.ball.position;
        place(&mut state, pid(1), ball - Vec2::new(33.0, 0.0));
        state.inputs.set(&pid(2), InputIntent::default());
        state.inputs.set(&pid(1), InputIntent::kick());
        let result = tick(&mut state, &config, Duration::ZERO).unwrap();
        assert!(result.events.contains(&GameEvent::BallKicked {
            player_id: pid(1),
            kickoff_touch: false,
        }));
    }

    #[test]
    fn test_restricted_body_cannot_move_ball() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.add_player(pid(2), "b", Team::Blue, &config.field);
        state.kickoff.award(Team::Blue);
        // Ball already outside the circle, red walking straight into it
        state.entities.ball = Ball::at_rest(Vec2::new(445.0, 300.0));
        place(&mut state, pid(1), Vec2::new(412.0, 300.0));
        state.inputs.set(&pid(1), InputIntent::moving(MoveFlags::RIGHT));

        for _ in 0..5 {
            let result = tick(&mut state, &config, Duration::ZERO).unwrap();
            assert!(!result.events.iter().any(|e| matches!(e, GameEvent::KickoffDribbled { .. })));
        }

        assert_eq!(state.entities.ball, Ball::at_rest(Vec2::new(445.0, 300.0)));
        assert_eq!(state.kickoff.restricted_team(), Some(Team::Red));
        assert!(!state.kickoff.touched);
    }

    #[test]
    fn test_pickup_collected_during_tick() {
        let (mut state, config) = new_match();
        state.add_player(pid(1), "a", Team::Red, &config.field);
        state.powerups.spawn_at(Vec2::new(210.0, 300.0), PowerUpKind::MegaPush, Duration::ZERO);

        let result = tick(&mut state, &config, Duration::from_secs(1)).unwrap();

        assert_eq!(state.powerups.active_buff(&pid(1)), Some(PowerUpKind::MegaPush));
        assert_eq!(state.powerups.pickups().count(), 0);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::PowerUpCollected { .. })));
    }

    #[test]
    fn test_giant_is_inert() {
        let (mut plain, config) = new_match();
        plain.add_player(pid(1), "a", Team::Red, &config.field);
        plain.inputs.set(&pid(1), InputIntent::moving(MoveFlags::RIGHT));
        let mut giant = plain.clone();
        giant.powerups.grant(pid(1), PowerUpKind::Giant, Duration::ZERO, &config.powerups);

        tick(&mut plain, &config, Duration::from_secs(1)).unwrap();
        tick(&mut giant, &config, Duration::from_secs(1)).unwrap();

        assert_eq!(plain.entities.get(&pid(1)), giant.entities.get(&pid(1)));
        assert_eq!(giant.powerups.active_buff(&pid(1)), Some(PowerUpKind::Giant));
    }

    #[test]
    fn test_non_finite_state_is_fault() {
        let (mut state, config) = new_match();
        state.entities.ball.velocity = Vec2::new(f32::NAN, 0.0);

        let err = tick(&mut state, &config, Duration::ZERO).unwrap_err();
        assert_eq!(err, SimulationError::NonFinite { tick: 1 });
    }
}
