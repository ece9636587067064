//! Match Session Lifecycle
//!
//! `MatchSession` owns one match end to end: the Idle, Running, Paused and
//! Ended state machine, the simulation state and the match clock. It is
//! synchronous; the driver feeds it commands and calls `advance` once per
//! tick, and tests can do the same without a runtime.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::core::rng::DeterministicRng;
use crate::game::events::{EndReason, GameEvent, GameOverEvent, GoalEvent, MatchEvent};
use crate::game::input::InputIntent;
use crate::game::powerup::PowerUpState;
use crate::game::snapshot::Snapshot;
use crate::game::state::{MatchId, MatchState, PlayerId, RosterEntry, RosterSide, Score, Team};
use crate::game::tick::{tick, MatchConfig, SimulationError};
use crate::session::clock::MatchClock;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Configuration for a match session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    /// Length of a match.
    pub match_duration: Duration,
    /// Inbound command queue size per match.
    pub command_capacity: usize,
    /// Outbound event buffer per match.
    pub event_capacity: usize,
    /// Physics and power-up tuning.
    pub simulation: MatchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            match_duration: Duration::from_secs(600),
            command_capacity: 1024,
            event_capacity: 256,
            simulation: MatchConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    ///
    /// Reads `PITCHSIDE_TICK_RATE`, `PITCHSIDE_MATCH_SECONDS` and
    /// `PITCHSIDE_EVENT_CAPACITY`; anything unset or unparseable keeps its
    /// default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            tick_rate: parse_var(&lookup, "PITCHSIDE_TICK_RATE", defaults.tick_rate)
                .max(1),
            match_duration: Duration::from_secs(parse_var(
                &lookup,
                "PITCHSIDE_MATCH_SECONDS",
                defaults.match_duration.as_secs(),
            )),
            event_capacity: parse_var(&lookup, "PITCHSIDE_EVENT_CAPACITY", defaults.event_capacity)
                .max(1),
            ..defaults
        }
    }

    /// Nominal duration of one tick.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}", key, raw);
                default
            }
        },
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Match lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Created, not ticking yet.
    Idle,
    /// Ticking.
    Running,
    /// Ticking suspended, state frozen.
    Paused,
    /// Terminal.
    Ended,
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// Command not valid in the current phase.
    #[error("Cannot {action} while {phase:?}")]
    InvalidTransition {
        /// Phase the match was in.
        phase: MatchPhase,
        /// What was attempted.
        action: &'static str,
    },

    /// Match is over.
    #[error("Match has ended")]
    MatchEnded,

    /// Simulation failed.
    #[error("Simulation fault: {0}")]
    Simulation(#[from] SimulationError),
}

// =============================================================================
// TICK OUTPUT
// =============================================================================

/// Everything one `advance` produced.
#[derive(Debug, Clone, Default)]
pub struct TickOutput {
    /// Snapshot of the completed tick (none if the tick faulted).
    pub snapshot: Option<Arc<Snapshot>>,
    /// Goal scored this tick.
    pub goal: Option<GoalEvent>,
    /// Match ended this tick.
    pub game_over: Option<GameOverEvent>,
    /// Step-level events, for logging.
    pub events: Vec<GameEvent>,
}

impl TickOutput {
    /// Outbound events in delivery order: snapshot, goal, game over.
    pub fn into_match_events(self) -> Vec<MatchEvent> {
        let mut out = Vec::with_capacity(3);
        if let Some(snapshot) = self.snapshot {
            out.push(MatchEvent::Snapshot(snapshot));
        }
        if let Some(goal) = self.goal {
            out.push(MatchEvent::Goal(goal));
        }
        if let Some(game_over) = self.game_over {
            out.push(MatchEvent::GameOver(game_over));
        }
        out
    }
}

// =============================================================================
// MATCH SESSION
// =============================================================================

/// One match.
pub struct MatchSession {
    id: MatchId,
    phase: MatchPhase,
    config: SessionConfig,
    state: MatchState,
    clock: MatchClock,
    game_over: Option<GameOverEvent>,
}

impl MatchSession {
    /// Create an idle match.
    pub fn new(id: MatchId, config: SessionConfig) -> Self {
        let rng = DeterministicRng::from_match(id.as_bytes(), &[]);
        let state = MatchState::new(&config.simulation.field, PowerUpState::new(rng));
        let clock = MatchClock::new(config.match_duration, config.tick_rate);

        Self {
            id,
            phase: MatchPhase::Idle,
            config,
            state,
            clock,
            game_over: None,
        }
    }

    /// Match id.
    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Simulation state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Mutable simulation state, for replay tooling and scripted tests.
    pub fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current score.
    pub fn score(&self) -> Score {
        self.state.score
    }

    /// Match clock.
    pub fn clock(&self) -> &MatchClock {
        &self.clock
    }

    /// Final result, once ended.
    pub fn game_over(&self) -> Option<&GameOverEvent> {
        self.game_over.as_ref()
    }

    /// True once the match is over.
    pub fn is_ended(&self) -> bool {
        self.phase == MatchPhase::Ended
    }

    /// Snapshot of the current state without ticking.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, self.clock.remaining_secs())
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_ended() {
            return Err(SessionError::MatchEnded);
        }
        Ok(())
    }

    /// Add a participant.
    pub fn add_player(&mut self, id: PlayerId, name: &str, team: Team) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.state.add_player(id, name, team, &self.config.simulation.field);
        debug!("Match {} added player {} ({}) to {}", self.id, id, name, team);
        Ok(())
    }

    /// Remove a participant. Unknown ids are ignored.
    pub fn remove_player(&mut self, id: &PlayerId) -> Result<bool, SessionError> {
        self.ensure_open()?;
        let removed = self.state.remove_player(id);
        if removed {
            debug!("Match {} removed player {}", self.id, id);
        }
        Ok(removed)
    }

    /// Replace a player's intent. Unknown ids are ignored.
    pub fn set_input(&mut self, id: &PlayerId, intent: InputIntent) -> Result<bool, SessionError> {
        self.ensure_open()?;
        Ok(self.state.inputs.set(id, intent))
    }

    /// Pause or resume.
    ///
    /// Returns the event to announce if the phase actually changed.
    pub fn set_paused(&mut self, paused: bool) -> Result<Option<MatchEvent>, SessionError> {
        self.ensure_open()?;
        let next = match (self.phase, paused) {
            (MatchPhase::Running, true) => MatchPhase::Paused,
            (MatchPhase::Paused, false) => MatchPhase::Running,
            _ => return Ok(None),
        };
        self.phase = next;
        if paused {
            info!("Match {} paused", self.id);
        } else {
            info!("Match {} resumed", self.id);
        }
        Ok(Some(MatchEvent::Paused { paused }))
    }

    /// Start the match with `roster`.
    ///
    /// Roster players not already present are added in roster order;
    /// spectators are skipped. The power-up RNG is seeded from the final
    /// player set and the spawn timer starts at `now`.
    pub fn start(&mut self, roster: &[RosterEntry], now: Duration) -> Result<MatchEvent, SessionError> {
        if self.phase != MatchPhase::Idle {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "start",
            });
        }

        for entry in roster {
            let RosterSide::Team(team) = entry.side else {
                continue;
            };
            if self.state.entities.get(&entry.player_id).is_none() {
                self.state.add_player(entry.player_id, entry.name.as_str(), team, &self.config.simulation.field);
            }
        }

        let player_ids: Vec<[u8; 16]> = self
            .state
            .entities
            .players
            .keys()
            .map(|id| *id.as_bytes())
            .collect();
        self.state
            .powerups
            .reseed(DeterministicRng::from_match(self.id.as_bytes(), &player_ids));
        self.state.powerups.start(now);

        self.phase = MatchPhase::Running;
        info!(
            "Match {} started with {} players",
            self.id,
            self.state.entities.len()
        );
        Ok(MatchEvent::Started)
    }

    /// Force the match to end with the current score.
    pub fn stop(&mut self) -> Result<GameOverEvent, SessionError> {
        self.ensure_open()?;
        Ok(self.finish(GameOverEvent::decided(self.state.score, EndReason::Stopped)))
    }

    /// End the match on a fault: no winner.
    pub fn fail(&mut self, reason: &dyn std::fmt::Display) -> Option<GameOverEvent> {
        if self.is_ended() {
            return None;
        }
        error!("Match {} faulted: {}", self.id, reason);
        Some(self.finish(GameOverEvent::faulted(self.state.score)))
    }

    fn finish(&mut self, event: GameOverEvent) -> GameOverEvent {
        self.phase = MatchPhase::Ended;
        self.game_over = Some(event);
        info!(
            "Match {} ended ({:?}): red {} - blue {}",
            self.id, event.reason, event.score.red, event.score.blue
        );
        event
    }

    /// Run one tick at monotonic time `now`.
    ///
    /// Returns `None` unless the match is running. A simulation fault ends
    /// the match and is reported through `game_over`.
    pub fn advance(&mut self, now: Duration) -> Option<TickOutput> {
        if self.phase != MatchPhase::Running {
            return None;
        }

        let result = match tick(&mut self.state, &self.config.simulation, now) {
            Ok(result) => result,
            Err(err) => {
                return Some(TickOutput {
                    game_over: self.fail(&err),
                    ..Default::default()
                });
            }
        };

        for event in &result.events {
            log_step_event(self.id, event);
        }

        let snapshot = Arc::new(Snapshot::capture(&self.state, self.clock.remaining_secs()));
        let goal = result.scored.map(|team| GoalEvent {
            team,
            score: self.state.score,
        });

        self.clock.advance();
        let game_over = if self.clock.is_expired() {
            Some(self.finish(GameOverEvent::decided(self.state.score, EndReason::TimeUp)))
        } else {
            None
        };

        Some(TickOutput {
            snapshot: Some(snapshot),
            goal,
            game_over,
            events: result.events,
        })
    }
}

fn log_step_event(match_id: MatchId, event: &GameEvent) {
    match event {
        GameEvent::GoalScored { team, score } => {
            info!(
                "Match {} goal for {}: red {} - blue {}",
                match_id, team, score.red, score.blue
            );
        }
        GameEvent::PowerUpSpawned { pickup_id, kind, position } => {
            debug!("Match {} spawned {:?} #{} at {}", match_id, kind, pickup_id, position);
        }
        GameEvent::PowerUpCollected { player_id, kind, .. } => {
            debug!("Match {} player {} collected {:?}", match_id, player_id, kind);
        }
        GameEvent::BuffExpired { player_id, kind } => {
            debug!("Match {} player {} lost {:?}", match_id, player_id, kind);
        }
        GameEvent::BallKicked { player_id, kickoff_touch: true } => {
            debug!("Match {} kickoff taken by {}", match_id, player_id);
        }
        GameEvent::KickoffDribbled { player_id } => {
            debug!("Match {} kickoff dribbled by {}", match_id, player_id);
        }
        _ => {}
    }
}

// =============================================================================
// TESTS
// =============================================================================
