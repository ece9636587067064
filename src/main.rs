//! Pitchside Match Server
//!
//! Runs a demo match through the session manager: four bots chase the ball
//! and kick it towards the opposing goal until the clock runs out.

use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pitchside::{
    game::{
        events::EndReason,
        snapshot::Snapshot,
    },
    FieldConfig, InputIntent, MatchEvent, MoveFlags, PlayerId, RosterEntry, SessionConfig,
    SessionManager, Team, Vec2, TICK_RATE, VERSION,
};

/// Demo length when `PITCHSIDE_MATCH_SECONDS` is not set.
const DEMO_MATCH: Duration = Duration::from_secs(30);

/// Bots re-aim every this many ticks.
const STEER_EVERY: u64 = 6;

/// Seconds of match time between status lines.
const STATUS_EVERY_SECS: u64 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = SessionConfig::from_env();
    if std::env::var("PITCHSIDE_MATCH_SECONDS").is_err() {
        config.match_duration = DEMO_MATCH;
    }

    info!("Pitchside Server v{}", VERSION);
    info!("Tick Rate: {} Hz (default {})", config.tick_rate, TICK_RATE);
    info!("Match Duration: {} seconds", config.match_duration.as_secs());

    demo_match(config).await
}

/// Drive one scripted match to completion.
async fn demo_match(config: SessionConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let field = config.simulation.field.clone();
    let status_every = status_cadence(config.tick_rate);
    let manager = SessionManager::new(config);
    let match_id = manager.create_match().await;
    let mut events = manager.subscribe(&match_id).await?;

    let roster = vec![
        RosterEntry::player(PlayerId::random(), "ada", Team::Red),
        RosterEntry::player(PlayerId::random(), "bea", Team::Red),
        RosterEntry::player(PlayerId::random(), "cy", Team::Blue),
        RosterEntry::player(PlayerId::random(), "dot", Team::Blue),
        RosterEntry::spectator(PlayerId::random(), "eve"),
    ];
    manager
        .start_match(&match_id, roster)
        .await
        .context("failed to start demo match")?;

    let mut last_snapshot = None;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Demo fell behind by {} events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event {
            MatchEvent::Snapshot(snapshot) => {
                if snapshot.tick % STEER_EVERY == 0 {
                    for player in &snapshot.players {
                        let intent = steer(&field, &snapshot, player.team, player.position);
                        manager.set_input(&match_id, player.id, intent).await?;
                    }
                }
                if snapshot.tick % status_every == 0 {
                    info!(
                        "Tick {}: red {} - blue {}, {:.1}s left, {} pickups",
                        snapshot.tick,
                        snapshot.score.red,
                        snapshot.score.blue,
                        snapshot.time_remaining,
                        snapshot.pickups.len()
                    );
                }
                last_snapshot = Some(snapshot);
            }
            MatchEvent::Goal(goal) => {
                info!("GOAL for {}! red {} - blue {}", goal.team, goal.score.red, goal.score.blue);
            }
            MatchEvent::GameOver(over) => {
                info!("=== Match Results ===");
                match over.winner {
                    Some(outcome) => info!("Outcome: {:?}", outcome),
                    None => warn!("Match ended without a result"),
                }
                info!("Final score: red {} - blue {}", over.score.red, over.score.blue);
                if over.reason != EndReason::TimeUp {
                    warn!("Match ended early: {:?}", over.reason);
                }
                break;
            }
            MatchEvent::Started => info!("Kickoff!"),
            MatchEvent::Paused { paused } => info!("Paused: {}", paused),
        }
    }

    if let Some(snapshot) = last_snapshot {
        let json = snapshot.to_json().context("failed to encode final snapshot")?;
        info!("Final snapshot: {}", json);
    }

    Ok(())
}

/// Ticks between status lines at `tick_rate` Hz.
fn status_cadence(tick_rate: u32) -> u64 {
    u64::from(tick_rate.max(1)) * STATUS_EVERY_SECS
}

/// Head for the spot behind the ball and kick when in reach.
fn steer(field: &FieldConfig, snapshot: &Snapshot, team: Team, position: Vec2) -> InputIntent {
    let ball = snapshot.ball.position;
    // Red scores through the bottom line, blue through the top
    let goal = match team {
        Team::Red => Vec2::new(field.width / 2.0, field.height),
        Team::Blue => Vec2::new(field.width / 2.0, 0.0),
    };
    let behind = (ball - goal).normalize_or(Vec2::RIGHT);
    let target = ball + behind.scale(field.kick_distance * 0.5);

    let delta = target - position;
    let mut movement = MoveFlags::NONE;
    if delta.x > 4.0 {
        movement = movement | MoveFlags::RIGHT;
    } else if delta.x < -4.0 {
        movement = movement | MoveFlags::LEFT;
    }
    if delta.y > 4.0 {
        movement = movement | MoveFlags::DOWN;
    } else if delta.y < -4.0 {
        movement = movement | MoveFlags::UP;
    }

    InputIntent {
        movement,
        kick: position.distance(ball) < field.kick_distance,
        push: false,
    }
}
