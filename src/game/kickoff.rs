//! Kickoff Possession
//!
//! After every goal the conceding team restarts play. Until one of its
//! players touches the ball, by kicking it or running into it, the other
//! team is kept outside the centre circle and cannot kick or touch the ball.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::field::FieldConfig;
use crate::game::state::{MatchState, Team};

/// Kickoff possession gate.
///
/// `possession = None` means play is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickoffState {
    /// Team entitled to the first touch
    pub possession: Option<Team>,
    /// First touch has happened since the last reset
    pub touched: bool,
}

impl KickoffState {
    /// Team currently kept out of the circle, if any.
    #[inline]
    pub fn restricted_team(&self) -> Option<Team> {
        if self.touched {
            return None;
        }
        self.possession.map(Team::opponent)
    }

    /// True if `team` is currently kept out of the circle.
    #[inline]
    pub fn is_restricted(&self, team: Team) -> bool {
        self.restricted_team() == Some(team)
    }

    /// Arm the gate for `possession`.
    pub fn award(&mut self, possession: Team) {
        self.possession = Some(possession);
        self.touched = false;
    }

    /// Record a ball touch (kick or body contact) by `team`.
    ///
    /// Only the possessing team's first touch counts. Returns true if this
    /// touch released the restriction.
    pub fn register_touch(&mut self, team: Team) -> bool {
        if self.touched || self.possession != Some(team) {
            return false;
        }
        self.touched = true;
        self.possession = None;
        true
    }
}

/// Push a position out of the kickoff circle.
///
/// Returns the projected position if `pos` was inside the circle grown by a
/// player radius, `None` if it was already outside. A position exactly on the
/// centre spot is projected along +x.
pub fn exclude_from_circle(pos: Vec2, field: &FieldConfig) -> Option<Vec2> {
    let center = field.center();
    let limit = field.kickoff_radius + field.player_radius;
    let offset = pos - center;
    if offset.length_squared() >= limit * limit {
        return None;
    }
    let dir = offset.normalize_or(Vec2::RIGHT);
    Some(center + dir * limit)
}

/// Full reset after a goal by `scorer`.
///
/// Everyone returns to spawn at rest, the ball goes to the centre spot and
/// the conceding team gets possession.
pub fn kickoff_reset(state: &mut MatchState, field: &FieldConfig, scorer: Team) {
    state.entities.reset_positions(field);
    state.kickoff.award(scorer.opponent());
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_play_restricts_nobody() {
        let kickoff = KickoffState::default();
        assert_eq!(kickoff.restricted_team(), None);
        assert!(!kickoff.is_restricted(Team::Red));
        assert!(!kickoff.is_restricted(Team::Blue));
    }

    #[test]
    fn test_award_restricts_opponent() {
        let mut kickoff = KickoffState::default();
        kickoff.award(Team::Blue);
        assert_eq!(kickoff.restricted_team(), Some(Team::Red));
    }

    #[test]
    fn test_only_possessing_team_releases() {
        let mut kickoff = KickoffState::default();
        kickoff.award(Team::Blue);

        assert!(!kickoff.register_touch(Team::Red));
        assert_eq!(kickoff.restricted_team(), Some(Team::Red));

        assert!(kickoff.register_touch(Team::Blue));
        assert!(kickoff.touched);
        assert_eq!(kickoff.possession, None);
        assert_eq!(kickoff.restricted_team(), None);

        // Later touches are plain touches
        assert!(!kickoff.register_touch(Team::Blue));
    }

    #[test]
    fn test_exclude_from_circle() {
        let field = FieldConfig::default();
        let limit = field.kickoff_radius + field.player_radius;

        let inside = Vec2::new(650.0, 300.0);
        let out = exclude_from_circle(inside, &field).unwrap();
        assert!((out.distance(field.center()) - limit).abs() < 1e-3);
        assert!(out.x > field.center().x);

        assert_eq!(exclude_from_circle(Vec2::new(800.0, 300.0), &field), None);
    }

    #[test]
    fn test_exclude_from_centre_spot() {
        let field = FieldConfig::default();
        let out = exclude_from_circle(field.center(), &field).unwrap();
        assert_eq!(out, Vec2::new(700.0, 300.0));
    }
}
