//! Session Manager
//!
//! Registry of live matches keyed by `MatchId`. Every call is routed to the
//! owning match task as a command; the manager never touches match state
//! directly. A supervisor task per match removes it from the registry once
//! its driver exits, and turns a driver panic into a faulted `GameOver`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{broadcast, oneshot, RwLock};
use tracing::{error, info};

use crate::game::events::{GameOverEvent, MatchEvent};
use crate::game::input::InputIntent;
use crate::game::state::{MatchId, PlayerId, RosterEntry, Team};
use crate::session::clock::{MonotonicClock, TimeSource};
use crate::session::driver::{spawn_match, MatchCommand, MatchHandle};
use crate::session::lifecycle::{SessionConfig, SessionError};

/// Manager errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ManagerError {
    /// No live match with this id.
    #[error("Unknown match {0}")]
    UnknownMatch(MatchId),

    /// A match with this id already exists.
    #[error("Match {0} already exists")]
    MatchExists(MatchId),

    /// The match task has finished.
    #[error("Match {0} is closed")]
    MatchClosed(MatchId),

    /// The match rejected the command.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Registry of running matches.
pub struct SessionManager {
    config: SessionConfig,
    time: Arc<dyn TimeSource>,
    matches: Arc<RwLock<BTreeMap<MatchId, MatchHandle>>>,
}

impl SessionManager {
    /// Manager whose matches use `config` and the tokio clock.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_time_source(config, Arc::new(MonotonicClock::new()))
    }

    /// Manager with an injected time source.
    pub fn with_time_source(config: SessionConfig, time: Arc<dyn TimeSource>) -> Self {
        Self {
            config,
            time,
            matches: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Configuration new matches are created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create an idle match with a random id.
    pub async fn create_match(&self) -> MatchId {
        loop {
            if let Ok(id) = self.create_match_with_id(MatchId::random()).await {
                return id;
            }
        }
    }

    /// Create an idle match with a caller-chosen id.
    pub async fn create_match_with_id(&self, id: MatchId) -> Result<MatchId, ManagerError> {
        let mut matches = self.matches.write().await;
        if matches.contains_key(&id) {
            return Err(ManagerError::MatchExists(id));
        }

        let (handle, join) = spawn_match(id, self.config.clone(), self.time.clone());
        matches.insert(id, handle.clone());
        drop(matches);

        let registry = self.matches.clone();
        let events = handle.event_sender();
        let score = handle.score_watch();
        tokio::spawn(async move {
            if let Err(err) = join.await {
                if err.is_panic() {
                    error!("Match {} driver panicked", id);
                    let game_over = GameOverEvent::faulted(*score.borrow());
                    let _ = events.send(MatchEvent::GameOver(game_over));
                }
            }
            registry.write().await.remove(&id);
            info!("Match {} closed", id);
        });

        info!("Match {} created", id);
        Ok(id)
    }

    async fn handle(&self, id: &MatchId) -> Result<MatchHandle, ManagerError> {
        let matches = self.matches.read().await;
        matches.get(id).cloned().ok_or(ManagerError::UnknownMatch(*id))
    }

    async fn send(&self, id: &MatchId, command: MatchCommand) -> Result<(), ManagerError> {
        let handle = self.handle(id).await?;
        handle
            .send(command)
            .await
            .map_err(|_| ManagerError::MatchClosed(*id))
    }

    /// Receive the match's outbound events from now on.
    pub async fn subscribe(&self, id: &MatchId) -> Result<broadcast::Receiver<MatchEvent>, ManagerError> {
        Ok(self.handle(id).await?.subscribe())
    }

    /// Queue a player join.
    pub async fn add_player(
        &self,
        id: &MatchId,
        player_id: PlayerId,
        name: impl Into<String>,
        team: Team,
    ) -> Result<(), ManagerError> {
        self.send(id, MatchCommand::AddPlayer {
            player_id,
            name: name.into(),
            team,
        })
        .await
    }

    /// Queue a player removal.
    pub async fn remove_player(&self, id: &MatchId, player_id: PlayerId) -> Result<(), ManagerError> {
        self.send(id, MatchCommand::RemovePlayer { player_id }).await
    }

    /// Queue an input update.
    pub async fn set_input(
        &self,
        id: &MatchId,
        player_id: PlayerId,
        intent: InputIntent,
    ) -> Result<(), ManagerError> {
        self.send(id, MatchCommand::SetInput { player_id, intent }).await
    }

    /// Queue a pause or resume.
    pub async fn set_paused(&self, id: &MatchId, paused: bool) -> Result<(), ManagerError> {
        self.send(id, MatchCommand::SetPaused(paused)).await
    }

    /// Start a match and wait until the driver has accepted or rejected it.
    pub async fn start_match(&self, id: &MatchId, roster: Vec<RosterEntry>) -> Result<(), ManagerError> {
        let (reply, rx) = oneshot::channel();
        self.send(id, MatchCommand::Start { roster, reply }).await?;
        rx.await.map_err(|_| ManagerError::MatchClosed(*id))??;
        Ok(())
    }

    /// Queue a forced stop.
    pub async fn stop_match(&self, id: &MatchId) -> Result<(), ManagerError> {
        self.send(id, MatchCommand::Stop).await
    }

    /// Ids of live matches.
    pub async fn match_ids(&self) -> Vec<MatchId> {
        self.matches.read().await.keys().copied().collect()
    }

    /// Number of live matches.
    pub async fn match_count(&self) -> usize {
        self.matches.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
