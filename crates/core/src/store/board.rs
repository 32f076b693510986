//! Board positions and turn rotation.

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::SessionStore;
use crate::{
    error::{StoreError, StoreResult, ValidationError},
    models::{GameSession, Team, GOAL_POSITION},
};

impl SessionStore {
    /// Put every given team on the start field.
    pub fn initialize_board_positions(&self, teams: &[Team]) {
        self.session.send_modify(|session| {
            for team_id in teams.iter().filter_map(|team| team.id) {
                session.team_board_positions.insert(team_id, 0);
                session.finished_team_ids.remove(&team_id);
            }
            normalize_turn(session);
        });
    }

    /// Seed board positions and finished teams from the persisted team records.
    pub fn restore_board_positions_from_backend(&self, teams: &[Team]) {
        self.session.send_modify(|session| {
            for team in teams {
                let Some(team_id) = team.id else { continue };
                let position = team.position.clamp(0, GOAL_POSITION);
                session.team_board_positions.insert(team_id, position);
                if position >= GOAL_POSITION {
                    session.finished_team_ids.insert(team_id);
                } else {
                    session.finished_team_ids.remove(&team_id);
                }
            }
            normalize_turn(session);
        });
        debug!(count = teams.len(), "board positions restored");
    }

    /// Board position of a team, 0 when it has none yet.
    pub fn team_board_position(&self, team_id: i64) -> i32 {
        self.session.borrow().board_position(team_id)
    }

    /// Move a team forward by `points`, stopping at the goal.
    ///
    /// Returns the new position. Reaching the goal finishes the team for the
    /// rest of the session; negative points never move a team back.
    pub fn advance_team(&self, team_id: i64, points: i32) -> StoreResult<i32> {
        let _pending = self.pending.lock();
        let mut outcome = Err(StoreError::team_not_found(team_id));
        self.session.send_if_modified(|session| {
            if !session.teams.iter().any(|team| team.id == Some(team_id)) {
                return false;
            }
            let current = session.board_position(team_id);
            let position = current.saturating_add(points.max(0)).min(GOAL_POSITION);
            session.team_board_positions.insert(team_id, position);
            if position >= GOAL_POSITION && session.finished_team_ids.insert(team_id) {
                info!(team_id, "team reached the goal");
                normalize_turn(session);
            }
            outcome = Ok(position);
            true
        });
        outcome
    }

    /// Whether the team has reached the goal.
    pub fn is_team_finished(&self, team_id: i64) -> bool {
        self.session.borrow().finished_team_ids.contains(&team_id)
    }

    /// Session teams that have not reached the goal.
    pub fn active_teams(&self) -> Vec<Team> {
        self.session.borrow().active_teams()
    }

    /// The game ends once at most one team is still on its way to the goal.
    pub fn is_game_over(&self) -> bool {
        let session = self.session.borrow();
        !session.teams.is_empty() && session.active_teams().len() <= 1
    }

    /// Session teams with their board positions, furthest first.
    ///
    /// Teams on the same field keep their seating order.
    pub fn final_rankings(&self) -> Vec<(Team, i32)> {
        let session = self.session.borrow();
        let mut rankings: Vec<(Team, i32)> = session
            .teams
            .iter()
            .map(|team| {
                let position = team.id.map_or(0, |id| session.board_position(id));
                (team.clone(), position)
            })
            .collect();
        rankings.sort_by(|a, b| b.1.cmp(&a.1));
        rankings
    }

    /// Index into [`Self::active_teams`] of the team whose turn it is.
    pub fn current_team_index(&self) -> Option<usize> {
        self.session.borrow().current_team_index
    }

    /// Team whose turn it is.
    pub fn current_team(&self) -> Option<Team> {
        let session = self.session.borrow();
        let index = session.current_team_index?;
        session.active_teams().into_iter().nth(index)
    }

    /// Hand the turn to the active team at `index`.
    pub fn set_current_team_index(&self, index: usize) -> StoreResult<()> {
        let _pending = self.pending.lock();
        let active = self.session.borrow().active_teams().len();
        if index >= active {
            return Err(ValidationError::TeamIndex { index, active }.into());
        }
        self.session
            .send_modify(|session| session.current_team_index = Some(index));
        Ok(())
    }

    /// Rotate the turn to the next active team and return it.
    ///
    /// The next index is `(current + 1) % active`, computed over the active
    /// list as it is now. When a team finished since the last rotation the
    /// list has shrunk, so the result can skip or repeat a team relative to
    /// the original seating order.
    pub fn advance_to_next_team(&self) -> Option<Team> {
        let _pending = self.pending.lock();
        let mut next_team = None;
        self.session.send_modify(|session| {
            let active = session.active_teams();
            if active.is_empty() {
                session.current_team_index = None;
                return;
            }
            let next = match session.current_team_index {
                Some(current) => (current + 1) % active.len(),
                None => 0,
            };
            session.current_team_index = Some(next);
            next_team = active.into_iter().nth(next);
        });
        if let Some(team) = &next_team {
            debug!(team_id = ?team.id, "turn passed");
        }
        next_team
    }

    /// Persist one team's board position to the backend.
    pub async fn update_team_position_in_backend(&self, team_id: i64) -> StoreResult<Team> {
        let payload = {
            let session = self.session.borrow();
            let mut team = session
                .teams
                .iter()
                .find(|team| team.id == Some(team_id))
                .cloned()
                .ok_or(StoreError::team_not_found(team_id))?;
            team.position = session.board_position(team_id);
            team
        };

        let mut stored = self.api.update_team(team_id, &payload).await?;
        stored.color_index = payload.color_index;
        let _pending = self.pending.lock();
        self.session.send_modify(|session| {
            for team in session.teams.iter_mut() {
                if team.id == Some(team_id) {
                    *team = stored.clone();
                }
            }
        });
        Ok(stored)
    }

    /// Persist every session team's board position.
    pub async fn save_game_state(&self) -> StoreResult<()> {
        let team_ids: Vec<i64> = self
            .session
            .borrow()
            .teams
            .iter()
            .filter_map(|team| team.id)
            .collect();
        for team_id in &team_ids {
            self.update_team_position_in_backend(*team_id).await?;
        }
        info!(teams = team_ids.len(), "game state saved");
        Ok(())
    }
}

/// Forget board state of teams no longer in the session, then re-point the turn.
pub(super) fn prune_board(session: &mut GameSession) {
    let present: BTreeSet<i64> = session.teams.iter().filter_map(|team| team.id).collect();
    session
        .team_board_positions
        .retain(|team_id, _| present.contains(team_id));
    session
        .finished_team_ids
        .retain(|team_id| present.contains(team_id));
    normalize_turn(session);
}

/// Keep the turn index pointing at an active team, or clear it when none remain.
pub(super) fn normalize_turn(session: &mut GameSession) {
    let active = session.active_teams().len();
    session.current_team_index = match (active, session.current_team_index) {
        (0, _) => None,
        (len, Some(index)) => Some(index % len),
        (_, None) => Some(0),
    };
}
