//! Property tests for the physics step.

use std::time::Duration;

use proptest::prelude::*;

use pitchside::core::rng::DeterministicRng;
use pitchside::game::action::movement_velocity;
use pitchside::game::powerup::PowerUpState;
use pitchside::game::tick::{tick, MatchConfig};
use pitchside::{FieldConfig, InputIntent, MatchState, MoveFlags, PlayerId, Team};

const EPSILON: f32 = 1e-3;

fn pid(n: u8) -> PlayerId {
    PlayerId::new([n; 16])
}

fn four_player_match(config: &MatchConfig) -> MatchState {
    let mut powerups = PowerUpState::new(DeterministicRng::new(99));
    powerups.start(Duration::ZERO);
    let mut state = MatchState::new(&config.field, powerups);
    for n in 0..4u8 {
        let team = if n % 2 == 0 { Team::Red } else { Team::Blue };
        state.add_player(pid(n), format!("p{n}"), team, &config.field);
    }
    state
}

fn intent_strategy() -> impl Strategy<Value = InputIntent> {
    (0u8..16, any::<bool>(), any::<bool>()).prop_map(|(bits, kick, push)| InputIntent {
        movement: MoveFlags(bits),
        kick,
        push,
    })
}

fn within(value: f32, low: f32, high: f32) -> bool {
    value >= low - EPSILON && value <= high + EPSILON
}

proptest! {
    /// Property: players and ball stay inside the field after every tick
    #[test]
    fn prop_entities_stay_in_bounds(
        frames in prop::collection::vec(prop::collection::vec(intent_strategy(), 4), 1..150),
        ball_vx in -40.0f32..40.0,
        ball_vy in -40.0f32..40.0,
    ) {
        let config = MatchConfig::default();
        let field = &config.field;
        let mut state = four_player_match(&config);
        state.entities.ball.velocity.x = ball_vx;
        state.entities.ball.velocity.y = ball_vy;

        for (t, frame) in frames.iter().enumerate() {
            for (n, intent) in frame.iter().enumerate() {
                state.inputs.set(&pid(n as u8), *intent);
            }
            tick(&mut state, &config, Duration::from_millis(t as u64 * 16)).unwrap();

            for player in state.entities.players.values() {
                prop_assert!(within(player.position.x, field.player_radius, field.width - field.player_radius));
                prop_assert!(within(player.position.y, field.player_radius, field.height - field.player_radius));
            }
            let ball = state.entities.ball.position;
            prop_assert!(within(ball.x, field.ball_radius, field.width - field.ball_radius));
            prop_assert!(within(ball.y, field.ball_radius, field.height - field.ball_radius));
        }
    }

    /// Property: one-shot flags never survive a tick
    #[test]
    fn prop_one_shot_flags_consumed(frame in prop::collection::vec(intent_strategy(), 4)) {
        let config = MatchConfig::default();
        let mut state = four_player_match(&config);
        for (n, intent) in frame.iter().enumerate() {
            state.inputs.set(&pid(n as u8), *intent);
        }

        tick(&mut state, &config, Duration::ZERO).unwrap();

        for (n, intent) in frame.iter().enumerate() {
            let after = state.inputs.get(&pid(n as u8)).unwrap();
            prop_assert!(!after.kick);
            prop_assert!(!after.push);
            prop_assert_eq!(after.movement, intent.movement);
        }
    }

    /// Property: no movement input is ever faster than a single axis
    #[test]
    fn prop_movement_speed_capped(bits in 0u8..16, boosted in any::<bool>()) {
        let field = FieldConfig::default();
        let single = movement_velocity(MoveFlags::RIGHT, &field, boosted).length();
        let speed = movement_velocity(MoveFlags(bits), &field, boosted).length();
        prop_assert!(speed <= single + EPSILON);
    }
}

#[test]
fn test_diagonal_matches_single_axis_speed() {
    let field = FieldConfig::default();
    let single = movement_velocity(MoveFlags::UP, &field, false).length();

    for vertical in [MoveFlags::UP, MoveFlags::DOWN] {
        for horizontal in [MoveFlags::LEFT, MoveFlags::RIGHT] {
            let diagonal = movement_velocity(vertical | horizontal, &field, false).length();
            assert!((diagonal - single).abs() < 0.01, "{diagonal} vs {single}");
        }
    }
}
