//! Team generation and the pre-game roster.

use std::collections::BTreeMap;

use tracing::info;

use crate::{
    error::{StoreError, StoreResult, ValidationError},
    models::{Game, Player, Team, TeamColor, MAX_TEAMS, MIN_TEAMS, TEAM_COLORS},
    store::SessionStore,
};

/// Teams that need players before a game can start.
pub const MIN_POPULATED_TEAMS: usize = 2;
/// Players each of those teams needs.
pub const MIN_PLAYERS_PER_TEAM: usize = 2;

/// Check that `count` teams can be generated.
pub fn validate_team_count(count: usize) -> Result<(), ValidationError> {
    if (MIN_TEAMS..=MAX_TEAMS).contains(&count) {
        Ok(())
    } else {
        Err(ValidationError::TeamCount(count))
    }
}

/// Make sure `game_id` has exactly `count` teams.
///
/// Existing teams are kept when the count already matches; otherwise they
/// are all deleted and `count` fresh teams are created.
pub async fn generate_teams(
    store: &SessionStore,
    game_id: i64,
    count: usize,
) -> StoreResult<Vec<Team>> {
    validate_team_count(count)?;

    let existing = store.load_teams_for_game(game_id).await?;
    if existing.len() == count {
        return Ok(existing);
    }
    if !existing.is_empty() {
        store.delete_all_teams_for_game(game_id).await?;
    }

    let mut created = Vec::with_capacity(count);
    for _ in 0..count {
        created.push(store.create_team(Team::for_game(game_id)).await?);
    }
    info!(game_id, count, "teams generated");
    Ok(created)
}

/// Delete a game together with its teams and their players.
///
/// Players go first, then teams, then the game itself. When the game is the
/// session's current game the session is cleared afterwards; any other
/// session is left alone apart from dropping the deleted records. Stops at
/// the first failure.
pub async fn delete_game_with_all(store: &SessionStore, game_id: i64) -> StoreResult<()> {
    let team_ids: Vec<i64> = store
        .api()
        .list_teams()
        .await?
        .into_iter()
        .filter(|team| team.game_id == Some(game_id))
        .filter_map(|team| team.id)
        .collect();

    let mut players = 0;
    for team_id in &team_ids {
        for player in store.api().players_by_team(*team_id).await? {
            if let Some(player_id) = player.id {
                store.delete_player(player_id).await?;
                players += 1;
            }
        }
    }
    for team_id in &team_ids {
        store.delete_team(*team_id).await?;
    }
    store.api().delete_game(game_id).await?;

    if store.current_game_id() == Some(game_id) {
        store.clear_session();
    }
    info!(game_id, teams = team_ids.len(), players, "game deleted");
    Ok(())
}

/// A player entered on the setup screen, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPlayer {
    /// Trimmed display name.
    pub name: String,
    /// Colour slot of the team the player joins.
    pub slot: usize,
}

impl DraftPlayer {
    /// Colour of the player's team.
    pub fn color(&self) -> TeamColor {
        TeamColor::from_index(self.slot)
    }
}

/// Local roster assembled before the game exists on the backend.
#[derive(Debug, Clone, Default)]
pub struct RosterDraft {
    players: Vec<DraftPlayer>,
    next_slot: usize,
}

impl RosterDraft {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Players in entry order.
    pub fn players(&self) -> &[DraftPlayer] {
        &self.players
    }

    /// Add a player, dealing teams round-robin.
    pub fn add_player(&mut self, name: &str) -> Result<&DraftPlayer, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.position_of(name).is_some() {
            return Err(ValidationError::DuplicatePlayerName(name.to_string()));
        }

        let slot = self.next_slot % TEAM_COLORS;
        self.next_slot += 1;
        self.players.push(DraftPlayer {
            name: name.to_string(),
            slot,
        });
        Ok(&self.players[self.players.len() - 1])
    }

    /// Remove a player by name, ignoring case.
    pub fn remove_player(&mut self, name: &str) -> Result<DraftPlayer, ValidationError> {
        let index = self
            .position_of(name)
            .ok_or_else(|| ValidationError::UnknownPlayer(name.trim().to_string()))?;
        Ok(self.players.remove(index))
    }

    /// Move a player to the next team colour.
    pub fn cycle_team(&mut self, name: &str) -> Result<&DraftPlayer, ValidationError> {
        let index = self
            .position_of(name)
            .ok_or_else(|| ValidationError::UnknownPlayer(name.trim().to_string()))?;
        let player = &mut self.players[index];
        player.slot = (player.slot + 1) % TEAM_COLORS;
        Ok(&self.players[index])
    }

    /// Player count per occupied slot, in slot order.
    pub fn team_sizes(&self) -> BTreeMap<usize, usize> {
        let mut sizes = BTreeMap::new();
        for player in &self.players {
            *sizes.entry(player.slot).or_insert(0) += 1;
        }
        sizes
    }

    /// Check that enough teams have enough players to start.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let sizes = self.team_sizes();
        if sizes.len() < MIN_POPULATED_TEAMS {
            return Err(ValidationError::NotEnoughTeams {
                required: MIN_POPULATED_TEAMS,
            });
        }
        let full = sizes
            .values()
            .filter(|count| **count >= MIN_PLAYERS_PER_TEAM)
            .count();
        if full < MIN_POPULATED_TEAMS {
            return Err(ValidationError::NotEnoughPlayers {
                teams: MIN_POPULATED_TEAMS,
                players: MIN_PLAYERS_PER_TEAM,
            });
        }
        Ok(())
    }

    /// Create the game, one team per occupied slot and every player.
    ///
    /// Starts a fresh session for the new game. Stops at the first failure;
    /// whatever was created up to then stays on the backend.
    pub async fn persist(&self, store: &SessionStore, game_name: &str) -> StoreResult<Game> {
        self.validate()?;

        let game = store.create_game(game_name).await?;
        let game_id = game.id.ok_or(ValidationError::MissingId("game"))?;
        store.start_new_session(game_id);
        store.load_game(game_id).await?;

        let mut team_by_slot = BTreeMap::new();
        for slot in self.team_sizes().keys() {
            let team = store.create_team(Team::for_game(game_id)).await?;
            let team_id = team.id.ok_or(ValidationError::MissingId("team"))?;
            team_by_slot.insert(*slot, team_id);
        }

        for player in &self.players {
            let team_id = *team_by_slot
                .get(&player.slot)
                .ok_or(StoreError::NotFound {
                    entity: "team slot",
                    id: player.slot as i64,
                })?;
            store
                .create_player(Player::new(player.name.clone(), team_id))
                .await?;
        }

        info!(
            game_id,
            teams = team_by_slot.len(),
            players = self.players.len(),
            "roster persisted"
        );
        Ok(game)
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        let needle = name.trim().to_lowercase();
        self.players
            .iter()
            .position(|player| player.name.to_lowercase() == needle)
    }
}
