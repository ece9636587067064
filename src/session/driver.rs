//! Match Driver
//!
//! One tokio task per match. The task is the only owner of its
//! `MatchSession`: commands arrive over an mpsc channel and are applied in
//! arrival order between ticks, outbound events leave over a broadcast
//! channel.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::game::events::MatchEvent;
use crate::game::input::InputIntent;
use crate::game::state::{MatchId, PlayerId, RosterEntry, Score, Team};
use crate::session::clock::TimeSource;
use crate::session::lifecycle::{MatchPhase, MatchSession, SessionConfig, SessionError};

/// Inbound command for a running match.
#[derive(Debug)]
pub enum MatchCommand {
    /// Add a participant.
    AddPlayer {
        /// Player id.
        player_id: PlayerId,
        /// Display name.
        name: String,
        /// Team.
        team: Team,
    },
    /// Remove a participant.
    RemovePlayer {
        /// Player id.
        player_id: PlayerId,
    },
    /// Replace a player's intent.
    SetInput {
        /// Player id.
        player_id: PlayerId,
        /// New intent.
        intent: InputIntent,
    },
    /// Pause or resume.
    SetPaused(bool),
    /// Start with a roster; the outcome is sent back.
    Start {
        /// Participants.
        roster: Vec<RosterEntry>,
        /// Reply channel.
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    /// Force the match to end.
    Stop,
}

/// Cloneable handle to a match task.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    id: MatchId,
    commands: mpsc::Sender<MatchCommand>,
    events: broadcast::Sender<MatchEvent>,
    score: watch::Receiver<Score>,
}

impl MatchHandle {
    /// Match id.
    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Queue a command. Fails once the task has finished.
    pub async fn send(&self, command: MatchCommand) -> Result<(), MatchCommand> {
        self.commands.send(command).await.map_err(|err| err.0)
    }

    /// Receive every event sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.events.subscribe()
    }

    /// Sender side of the event channel.
    pub fn event_sender(&self) -> broadcast::Sender<MatchEvent> {
        self.events.clone()
    }

    /// Last published score.
    pub fn last_score(&self) -> Score {
        *self.score.borrow()
    }

    /// Watch on the published score.
    pub fn score_watch(&self) -> watch::Receiver<Score> {
        self.score.clone()
    }
}

/// Spawn the task driving a new idle match.
pub fn spawn_match(
    id: MatchId,
    config: SessionConfig,
    time: Arc<dyn TimeSource>,
) -> (MatchHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
    let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
    let (score_tx, score_rx) = watch::channel(Score::default());

    let session = MatchSession::new(id, config);
    let join = tokio::spawn(run_match(session, command_rx, event_tx.clone(), score_tx, time));

    let handle = MatchHandle {
        id,
        commands: command_tx,
        events: event_tx,
        score: score_rx,
    };
    (handle, join)
}

/// Drive one match until it ends.
///
/// While idle or paused the task sleeps on its command queue. While running
/// it drains the queue, runs one tick, publishes the results and sleeps for
/// what is left of the tick interval. An overlong tick makes the next one
/// start late; no tick is skipped. If every command sender is dropped the
/// match is stopped between ticks.
#[instrument(name = "match", skip_all, fields(match_id = %session.id()))]
pub async fn run_match(
    mut session: MatchSession,
    mut commands: mpsc::Receiver<MatchCommand>,
    events: broadcast::Sender<MatchEvent>,
    score: watch::Sender<Score>,
    time: Arc<dyn TimeSource>,
) {
    let interval = session.config().tick_interval();

    loop {
        if session.phase() != MatchPhase::Running {
            match commands.recv().await {
                Some(command) => apply_command(&mut session, command, &events, time.as_ref()),
                None => cancel(&mut session, &events),
            }
            score.send_replace(session.score());
            if session.is_ended() {
                break;
            }
            continue;
        }

        loop {
            match commands.try_recv() {
                Ok(command) => apply_command(&mut session, command, &events, time.as_ref()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    cancel(&mut session, &events);
                    break;
                }
            }
        }
        if session.phase() != MatchPhase::Running {
            score.send_replace(session.score());
            if session.is_ended() {
                break;
            }
            continue;
        }

        let started = Instant::now();
        if let Some(output) = session.advance(time.now()) {
            score.send_replace(session.score());
            for event in output.into_match_events() {
                // No subscribers is fine
                let _ = events.send(event);
            }
        }
        if session.is_ended() {
            break;
        }

        tokio::time::sleep(interval.saturating_sub(started.elapsed())).await;
    }

    info!("Match {} driver finished", session.id());
}

fn apply_command(
    session: &mut MatchSession,
    command: MatchCommand,
    events: &broadcast::Sender<MatchEvent>,
    time: &dyn TimeSource,
) {
    let outcome = match command {
        MatchCommand::AddPlayer { player_id, name, team } => {
            session.add_player(player_id, &name, team)
        }
        MatchCommand::RemovePlayer { player_id } => {
            session.remove_player(&player_id).map(|_| ())
        }
        MatchCommand::SetInput { player_id, intent } => {
            session.set_input(&player_id, intent).map(|_| ())
        }
        MatchCommand::SetPaused(paused) => session.set_paused(paused).map(|event| {
            if let Some(event) = event {
                let _ = events.send(event);
            }
        }),
        MatchCommand::Start { roster, reply } => {
            let result = session.start(&roster, time.now()).map(|event| {
                let _ = events.send(event);
            });
            // Caller may have given up waiting
            let _ = reply.send(result);
            return;
        }
        MatchCommand::Stop => session.stop().map(|game_over| {
            let _ = events.send(MatchEvent::GameOver(game_over));
        }),
    };

    if let Err(err) = outcome {
        warn!("Match {} dropped command: {}", session.id(), err);
    }
}

fn cancel(session: &mut MatchSession, events: &broadcast::Sender<MatchEvent>) {
    if let Ok(game_over) = session.stop() {
        info!("Match {} cancelled: all handles dropped", session.id());
        let _ = events.send(MatchEvent::GameOver(game_over));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::game::events::EndReason;
    use crate::session::clock::MonotonicClock;

    fn pid(n: u8) -> PlayerId {
        PlayerId::new([n; 16])
    }

    fn config(match_secs: u64) -> SessionConfig {
        SessionConfig {
            tick_rate: 20,
            match_duration: Duration::from_secs(match_secs),
            ..Default::default()
        }
    }

    async fn start(handle: &MatchHandle) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        let roster = vec![
            RosterEntry::player(pid(1), "amy", Team::Red),
            RosterEntry::player(pid(2), "bob", Team::Blue),
        ];
        handle.send(MatchCommand::Start { roster, reply }).await.unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_driver_runs_to_time_up() {
        tokio::time::pause();
        let (handle, join) = spawn_match(MatchId([1; 16]), config(1), Arc::new(MonotonicClock::new()));
        let mut events = handle.subscribe();

        start(&handle).await.unwrap();

        let mut snapshots = 0;
        let mut game_over = None;
        while let Ok(event) = events.recv().await {
            match event {
                MatchEvent::Snapshot(_) => snapshots += 1,
                MatchEvent::GameOver(over) => {
                    game_over = Some(over);
                    break;
                }
                _ => {}
            }
        }

        assert_eq!(snapshots, 20);
        assert_eq!(game_over.unwrap().reason, EndReason::TimeUp);
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_started_event_and_double_start() {
        tokio::time::pause();
        let (handle, _join) = spawn_match(MatchId([2; 16]), config(60), Arc::new(MonotonicClock::new()));
        let mut events = handle.subscribe();

        start(&handle).await.unwrap();
        assert!(matches!(events.recv().await.unwrap(), MatchEvent::Started));

        let err = start(&handle).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_pause_stops_snapshots() {
        tokio::time::pause();
        let (handle, _join) = spawn_match(MatchId([3; 16]), config(60), Arc::new(MonotonicClock::new()));
        start(&handle).await.unwrap();

        handle.send(MatchCommand::SetPaused(true)).await.unwrap();
        let mut events = handle.subscribe();

        // Let the pause land, then make sure nothing else is produced
        tokio::time::sleep(Duration::from_millis(200)).await;
        let mut saw_pause = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, MatchEvent::Paused { paused: true }) {
                saw_pause = true;
            }
        }
        assert!(saw_pause);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));

        handle.send(MatchCommand::SetPaused(false)).await.unwrap();
        assert!(matches!(events.recv().await.unwrap(), MatchEvent::Paused { paused: false }));
        assert!(matches!(events.recv().await.unwrap(), MatchEvent::Snapshot(_)));
    }

    #[tokio::test]
    async fn test_stop_sends_game_over() {
        tokio::time::pause();
        let (handle, join) = spawn_match(MatchId([4; 16]), config(60), Arc::new(MonotonicClock::new()));
        let mut events = handle.subscribe();
        start(&handle).await.unwrap();

        handle.send(MatchCommand::Stop).await.unwrap();

        loop {
            match events.recv().await.unwrap() {
                MatchEvent::GameOver(over) => {
                    assert_eq!(over.reason, EndReason::Stopped);
                    break;
                }
                _ => continue,
            }
        }
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropping_handle_cancels_match() {
        tokio::time::pause();
        let (handle, join) = spawn_match(MatchId([5; 16]), config(60), Arc::new(MonotonicClock::new()));
        let mut events = handle.subscribe();
        start(&handle).await.unwrap();

        drop(handle);
        join.await.unwrap();

        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert!(matches!(last, Some(MatchEvent::GameOver(_))));
    }
}
