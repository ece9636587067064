//! End-to-end match scenarios driven through `MatchSession`.

use std::time::Duration;

use pitchside::core::rng::DeterministicRng;
use pitchside::game::events::EndReason;
use pitchside::game::powerup::{PowerUpKind, PowerUpState};
use pitchside::game::state::{Ball, MatchOutcome};
use pitchside::game::tick::{tick, MatchConfig};
use pitchside::session::{MatchSession, SessionConfig};
use pitchside::{
    GameOverEvent, InputIntent, MatchId, MatchState, MoveFlags, PlayerId, RosterEntry, Score,
    Team, Vec2,
};

fn pid(n: u8) -> PlayerId {
    PlayerId::new([n; 16])
}

fn session(match_secs: u64) -> MatchSession {
    MatchSession::new(
        MatchId([42; 16]),
        SessionConfig {
            tick_rate: 10,
            match_duration: Duration::from_secs(match_secs),
            ..Default::default()
        },
    )
}

fn roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::player(pid(1), "red", Team::Red),
        RosterEntry::player(pid(2), "blue", Team::Blue),
    ]
}

/// Put the ball just short of `team`'s scoring line, heading over it.
fn line_up_goal(session: &mut MatchSession, team: Team) {
    let ball = &mut session.state_mut().entities.ball;
    *ball = match team {
        Team::Red => Ball {
            position: Vec2::new(600.0, 585.0),
            velocity: Vec2::new(0.0, 10.0),
        },
        Team::Blue => Ball {
            position: Vec2::new(600.0, 15.0),
            velocity: Vec2::new(0.0, -10.0),
        },
    };
}

/// Score the given goals in order, then run the clock out.
fn play(goals: &[Team]) -> GameOverEvent {
    let mut session = session(5);
    session.start(&roster(), Duration::ZERO).unwrap();

    let mut now = Duration::ZERO;
    for &team in goals {
        line_up_goal(&mut session, team);
        let out = session.advance(now).unwrap();
        let goal = out.goal.expect("goal should be scored");
        assert_eq!(goal.team, team);
        now += Duration::from_millis(100);
    }

    loop {
        let out = session.advance(now).unwrap();
        if let Some(game_over) = out.game_over {
            assert!(out.snapshot.is_some());
            return game_over;
        }
        now += Duration::from_millis(100);
    }
}

#[test]
fn test_red_wins_two_one() {
    let game_over = play(&[Team::Red, Team::Blue, Team::Red]);

    assert_eq!(game_over.score, Score::new(2, 1));
    assert_eq!(game_over.winner, Some(MatchOutcome::Winner(Team::Red)));
    assert_eq!(game_over.reason, EndReason::TimeUp);
}

#[test]
fn test_three_all_is_a_draw() {
    let game_over = play(&[
        Team::Red,
        Team::Blue,
        Team::Blue,
        Team::Red,
        Team::Red,
        Team::Blue,
    ]);

    assert_eq!(game_over.score, Score::new(3, 3));
    assert_eq!(game_over.winner, Some(MatchOutcome::Draw));
}

#[test]
fn test_goal_hands_kickoff_to_conceding_team() {
    let mut session = session(5);
    session.start(&roster(), Duration::ZERO).unwrap();
    line_up_goal(&mut session, Team::Red);

    let out = session.advance(Duration::ZERO).unwrap();
    let snapshot = out.snapshot.unwrap();

    assert_eq!(snapshot.kickoff_possession, Some(Team::Blue));
    assert!(!snapshot.kickoff_touched);
    assert_eq!(snapshot.ball.position, Vec2::new(600.0, 300.0));
    for player in &snapshot.players {
        assert_eq!(player.velocity, Vec2::ZERO);
    }
}

#[test]
fn test_super_kick_doubles_ball_speed() {
    let config = MatchConfig::default();

    let kick_once = |super_kick: bool| -> f32 {
        let mut powerups = PowerUpState::new(DeterministicRng::new(3));
        powerups.start(Duration::ZERO);
        let mut state = MatchState::new(&config.field, powerups);
        state.add_player(pid(1), "kicker", Team::Red, &config.field);
        // Stationary, 33 units left of the ball
        state.entities.get_mut(&pid(1)).unwrap().position = Vec2::new(567.0, 300.0);
        if super_kick {
            state
                .powerups
                .grant(pid(1), PowerUpKind::SuperKick, Duration::ZERO, &config.powerups);
        }
        state.inputs.set(&pid(1), InputIntent::kick());

        tick(&mut state, &config, Duration::ZERO).unwrap();
        state.entities.ball.velocity.length()
    };

    let plain = kick_once(false);
    let boosted = kick_once(true);

    assert!(plain > 0.0);
    assert!((boosted / plain - 2.0).abs() < 1e-4);
}

#[test]
fn test_removed_player_leaves_snapshots_without_disturbing_others() {
    let mut with_removal = session(5);
    let mut control = session(5);
    let mut roster = roster();
    roster.push(RosterEntry::player(pid(3), "extra", Team::Blue));
    with_removal.start(&roster, Duration::ZERO).unwrap();
    control.start(&roster, Duration::ZERO).unwrap();

    for s in [&mut with_removal, &mut control] {
        s.set_input(&pid(1), InputIntent::moving(MoveFlags::RIGHT | MoveFlags::DOWN))
            .unwrap();
        s.set_input(&pid(3), InputIntent::moving(MoveFlags::UP)).unwrap();
    }

    let mut now = Duration::ZERO;
    for _ in 0..5 {
        with_removal.advance(now).unwrap();
        control.advance(now).unwrap();
        now += Duration::from_millis(100);
    }

    assert!(with_removal.remove_player(&pid(3)).unwrap());

    for _ in 0..5 {
        let a = with_removal.advance(now).unwrap().snapshot.unwrap();
        let b = control.advance(now).unwrap().snapshot.unwrap();
        now += Duration::from_millis(100);

        assert!(a.player(&pid(3)).is_none());
        assert!(b.player(&pid(3)).is_some());
        assert_eq!(a.player(&pid(1)).unwrap().position, b.player(&pid(1)).unwrap().position);
        assert_eq!(a.ball, b.ball);
    }
}

#[test]
fn test_paused_match_does_not_run_the_clock() {
    let mut session = session(1);
    session.start(&roster(), Duration::ZERO).unwrap();
    session.advance(Duration::ZERO).unwrap();

    session.set_paused(true).unwrap();
    for _ in 0..100 {
        assert!(session.advance(Duration::ZERO).is_none());
    }
    assert_eq!(session.clock().remaining_ticks(), 9);

    session.set_paused(false).unwrap();
    let mut ticks = 0;
    while session.advance(Duration::ZERO).map(|o| o.game_over.is_none()).unwrap_or(false) {
        ticks += 1;
    }
    assert_eq!(ticks, 8);
    assert!(session.is_ended());
}
