//! Client-side state of the game currently being played.
//!
//! [`SessionStore`] owns the session snapshot, publishes every change on a
//! `watch` channel and mediates all backend calls so consumers see one
//! consistent view. The cache is only touched after the backend call that
//! triggered the change succeeded.

mod board;
mod words;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    api::ActivityApi,
    error::{StoreError, StoreResult, ValidationError},
    models::{Game, GameSession, Player, Team, Word, TEAM_COLORS},
};

/// Single source of truth for the session's game, teams, players, word
/// usage and board positions.
pub struct SessionStore {
    api: Arc<dyn ActivityApi>,
    session: watch::Sender<GameSession>,
    pending: Mutex<PendingWrites>,
    words: RwLock<WordCache>,
}

/// State guarded by the store's critical section.
#[derive(Default)]
struct PendingWrites {
    /// Lower-cased player names with a create or rename in flight.
    reserved_names: HashSet<String>,
}

#[derive(Default)]
struct WordCache {
    words: Vec<Word>,
    loaded: bool,
}

impl SessionStore {
    /// Create a store with an empty session backed by `api`.
    pub fn new(api: Arc<dyn ActivityApi>) -> Self {
        let (session, _) = watch::channel(GameSession::default());
        Self {
            api,
            session,
            pending: Mutex::new(PendingWrites::default()),
            words: RwLock::new(WordCache::default()),
        }
    }

    /// The backend this store talks to.
    pub fn api(&self) -> &Arc<dyn ActivityApi> {
        &self.api
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> GameSession {
        self.session.borrow().clone()
    }

    /// Receiver observing the latest session snapshot.
    pub fn subscribe(&self) -> watch::Receiver<GameSession> {
        self.session.subscribe()
    }

    // ----- session lifecycle -----

    /// Reset the session to an empty state scoped to `game_id`.
    ///
    /// The word catalog survives; used words do not.
    pub fn start_new_session(&self, game_id: i64) {
        info!(game_id, "starting new session");
        self.session.send_replace(GameSession::for_game(game_id));
    }

    /// Game the session is scoped to, if any.
    pub fn current_game_id(&self) -> Option<i64> {
        self.session.borrow().game_id
    }

    /// Discard the session entirely.
    pub fn clear_session(&self) {
        debug!("clearing session");
        self.session.send_replace(GameSession::default());
    }

    /// Re-pull game, teams and players for the session's game.
    pub async fn refresh_current_game(&self) -> StoreResult<()> {
        let Some(game_id) = self.current_game_id() else {
            return Ok(());
        };
        self.load_game(game_id).await?;
        self.load_teams_for_game(game_id).await?;
        self.load_players_for_game(game_id).await?;
        Ok(())
    }

    // ----- games -----

    /// Create a game and make it the session's current game.
    pub async fn create_game(&self, name: &str) -> StoreResult<Game> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let created = self.api.create_game(&Game::named(name)).await.map_err(|err| {
            warn!(%err, "failed to create game");
            err
        })?;
        info!(game_id = ?created.id, name, "game created");
        self.session.send_modify(|session| {
            session.game_id = created.id;
            session.game = Some(created.clone());
        });
        Ok(created)
    }

    /// Fetch a game and cache it as the current game.
    pub async fn load_game(&self, game_id: i64) -> StoreResult<Game> {
        let game = self.api.get_game(game_id).await?;
        self.session.send_modify(|session| {
            session.game_id = Some(game_id);
            session.game = Some(game.clone());
        });
        Ok(game)
    }

    /// Rename a game.
    pub async fn update_game(&self, game_id: i64, name: &str) -> StoreResult<Game> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let cached = self
            .session
            .borrow()
            .game
            .clone()
            .filter(|game| game.id == Some(game_id));
        let payload = Game {
            id: Some(game_id),
            name: Some(name.to_string()),
            created_on: cached.as_ref().and_then(|game| game.created_on.clone()),
            team_ids: cached.and_then(|game| game.team_ids),
        };
        let updated = self.api.update_game(game_id, &payload).await?;
        self.session.send_modify(|session| {
            if session.game_id.is_none() || session.game_id == Some(game_id) {
                session.game = Some(updated.clone());
            }
        });
        Ok(updated)
    }

    /// All games known to the backend; not cached.
    pub async fn list_games(&self) -> StoreResult<Vec<Game>> {
        Ok(self.api.list_games().await?)
    }

    // ----- teams -----

    /// Fetch the teams of `game_id`, ordered by creation, with colours assigned.
    pub async fn load_teams_for_game(&self, game_id: i64) -> StoreResult<Vec<Team>> {
        let mut teams: Vec<Team> = self
            .api
            .list_teams()
            .await?
            .into_iter()
            .filter(|team| team.game_id == Some(game_id))
            .collect();
        arrange_teams(&mut teams);
        debug!(game_id, count = teams.len(), "teams loaded");
        let _pending = self.pending.lock();
        self.session.send_modify(|session| {
            session.teams = teams.clone();
            board::prune_board(session);
        });
        Ok(teams)
    }

    /// Create a team and append it to the session.
    pub async fn create_team(&self, team: Team) -> StoreResult<Team> {
        let created = self.api.create_team(&team).await?;
        let _pending = self.pending.lock();
        let mut arranged = created.clone();
        self.session.send_modify(|session| {
            session.teams.push(created);
            arrange_teams(&mut session.teams);
            board::normalize_turn(session);
            if let Some(team) = session.teams.iter().find(|team| team.id == arranged.id) {
                arranged = team.clone();
            }
        });
        info!(team_id = ?arranged.id, color = %arranged.color(), "team created");
        Ok(arranged)
    }

    /// Delete a team and drop it, its players and its board state from the session.
    ///
    /// Players are only removed locally; deleting them on the backend is up
    /// to the caller.
    pub async fn delete_team(&self, team_id: i64) -> StoreResult<()> {
        self.api.delete_team(team_id).await?;
        let _pending = self.pending.lock();
        self.session.send_modify(|session| {
            remove_teams(session, &[team_id]);
        });
        info!(team_id, "team deleted");
        Ok(())
    }

    /// Delete every cached team of `game_id`.
    ///
    /// The session is only updated when all deletions succeeded.
    pub async fn delete_all_teams_for_game(&self, game_id: i64) -> StoreResult<()> {
        let team_ids: Vec<i64> = self
            .session
            .borrow()
            .teams
            .iter()
            .filter(|team| team.game_id == Some(game_id))
            .filter_map(|team| team.id)
            .collect();

        for team_id in &team_ids {
            self.api.delete_team(*team_id).await.map_err(|err| {
                warn!(team_id, %err, "failed to delete team");
                err
            })?;
        }

        let _pending = self.pending.lock();
        self.session.send_modify(|session| {
            remove_teams(session, &team_ids);
            session.teams.retain(|team| team.game_id != Some(game_id));
        });
        info!(game_id, count = team_ids.len(), "teams deleted");
        Ok(())
    }

    /// Cached teams of the session.
    pub fn teams(&self) -> Vec<Team> {
        self.session.borrow().teams.clone()
    }

    // ----- players -----

    /// Fetch the players belonging to the session's teams, loading teams first if needed.
    pub async fn load_players_for_game(&self, game_id: i64) -> StoreResult<Vec<Player>> {
        let cached = self.teams();
        let teams = if cached.is_empty() {
            self.load_teams_for_game(game_id).await?
        } else {
            cached
        };
        let team_ids: HashSet<i64> = teams.iter().filter_map(|team| team.id).collect();

        let players: Vec<Player> = self
            .api
            .list_players()
            .await?
            .into_iter()
            .filter(|player| {
                player
                    .team
                    .map(|team| team_ids.contains(&team))
                    .unwrap_or(false)
            })
            .collect();
        debug!(game_id, count = players.len(), "players loaded");
        self.session
            .send_modify(|session| session.players = players.clone());
        Ok(players)
    }

    /// Create a player, rejecting names already used in the session.
    pub async fn create_player(&self, player: Player) -> StoreResult<Player> {
        let name = player.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let reservation = self.reserve_name(&name, None)?;
        let payload = Player { name, ..player };
        let created = self.api.create_player(&payload).await?;
        reservation.commit(|| {
            self.session
                .send_modify(|session| session.players.push(created.clone()));
        });
        info!(player_id = ?created.id, name = %created.name, "player created");
        Ok(created)
    }

    /// Replace a player on the backend and in the session.
    pub async fn update_player(&self, player: Player) -> StoreResult<Player> {
        let id = player.id.ok_or(ValidationError::MissingId("player"))?;
        let name = player.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let renamed = {
            let session = self.session.borrow();
            session
                .players
                .iter()
                .find(|existing| existing.id == Some(id))
                .map(|existing| name_key(&existing.name) != name_key(&name))
                .unwrap_or(true)
        };
        let reservation = if renamed {
            Some(self.reserve_name(&name, Some(id))?)
        } else {
            None
        };

        let payload = Player { name, ..player };
        let updated = self.api.update_player(id, &payload).await?;
        let apply = || {
            self.session.send_modify(|session| {
                for existing in session.players.iter_mut() {
                    if existing.id == Some(id) {
                        *existing = updated.clone();
                    }
                }
            });
        };
        match reservation {
            Some(reservation) => reservation.commit(apply),
            None => {
                let _pending = self.pending.lock();
                apply();
            }
        }
        Ok(updated)
    }

    /// Delete a player.
    pub async fn delete_player(&self, player_id: i64) -> StoreResult<()> {
        self.api.delete_player(player_id).await?;
        let _pending = self.pending.lock();
        self.session.send_modify(|session| {
            session.players.retain(|player| player.id != Some(player_id));
        });
        Ok(())
    }

    /// Add `points` to a cached player's score and persist it.
    pub async fn award_points(&self, player_id: i64, points: i64) -> StoreResult<Player> {
        let mut player = self
            .session
            .borrow()
            .players
            .iter()
            .find(|player| player.id == Some(player_id))
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "player",
                id: player_id,
            })?;
        player.points_earned = player.points_earned.saturating_add(points.max(0));
        self.update_player(player).await
    }

    /// Cached players of the session.
    pub fn players(&self) -> Vec<Player> {
        self.session.borrow().players.clone()
    }

    /// Cached players of one team.
    pub fn players_for_team(&self, team_id: i64) -> Vec<Player> {
        self.session.borrow().players_for_team(team_id)
    }

    fn reserve_name(&self, name: &str, except: Option<i64>) -> StoreResult<NameReservation<'_>> {
        let key = name_key(name);
        let mut pending = self.pending.lock();
        let taken = {
            let session = self.session.borrow();
            session.players.iter().any(|player| {
                (except.is_none() || player.id != except) && name_key(&player.name) == key
            })
        };
        if taken || !pending.reserved_names.insert(key.clone()) {
            debug!(name, "rejecting duplicate player name");
            return Err(ValidationError::DuplicatePlayerName(name.to_string()).into());
        }
        Ok(NameReservation {
            pending: &self.pending,
            key,
        })
    }
}

/// Holds a player name while the backend call that creates or renames the
/// player is in flight. Dropping it without committing frees the name.
struct NameReservation<'a> {
    pending: &'a Mutex<PendingWrites>,
    key: String,
}

impl NameReservation<'_> {
    /// Apply the cache change and release the name inside one critical section.
    fn commit(self, apply: impl FnOnce()) {
        let mut pending = self.pending.lock();
        apply();
        pending.reserved_names.remove(&self.key);
    }
}

impl Drop for NameReservation<'_> {
    fn drop(&mut self) {
        self.pending.lock().reserved_names.remove(&self.key);
    }
}

/// Form under which player names are compared for uniqueness.
fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Sort teams by creation order and assign colour slots per game.
fn arrange_teams(teams: &mut [Team]) {
    teams.sort_by_key(|team| team.id);
    let mut per_game: HashMap<Option<i64>, usize> = HashMap::new();
    for team in teams.iter_mut() {
        let slot = per_game.entry(team.game_id).or_insert(0);
        team.color_index = (*slot % TEAM_COLORS) as u8;
        *slot += 1;
    }
}

fn remove_teams(session: &mut GameSession, team_ids: &[i64]) {
    session
        .teams
        .retain(|team| team.id.map(|id| !team_ids.contains(&id)).unwrap_or(true));
    session
        .players
        .retain(|player| player.team.map(|id| !team_ids.contains(&id)).unwrap_or(true));
    for team_id in team_ids {
        session.team_board_positions.remove(team_id);
        session.finished_team_ids.remove(team_id);
    }
    arrange_teams(&mut session.teams);
    board::normalize_turn(session);
}


#[cfg(test)]
mod tests {
    use super::test_support::{store, store_with_teams};
    use super::*;
    use crate::{api::MemoryApi, models::GOAL_POSITION};

    #[tokio::test]
    async fn create_game_becomes_current() -> anyhow::Result<()> {
        let (store, _) = store();
        let game = store.create_game("Friday night").await?;
        let session = store.snapshot();
        assert_eq!(session.game_id, game.id);
        assert_eq!(session.game.as_ref().and_then(|g| g.name.clone()).as_deref(), Some("Friday night"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_remote_call_leaves_session_untouched() {
        let (store, api) = store();
        store.start_new_session(7);
        let before = store.snapshot();
        api.fail("create_game");
        let err = store.create_game("Broken").await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn update_game_keeps_creation_metadata() -> anyhow::Result<()> {
        let (store, _) = store();
        let game = store.create_game("Draft").await?;
        let game_id = game.id.expect("id");
        let renamed = store.update_game(game_id, "Final").await?;
        assert_eq!(renamed.name.as_deref(), Some("Final"));
        assert_eq!(renamed.created_on, game.created_on);
        assert_eq!(store.snapshot().game, Some(renamed));
        Ok(())
    }

    #[tokio::test]
    async fn failed_rename_of_game_keeps_cached_game() -> anyhow::Result<()> {
        let (store, api) = store();
        let game = store.create_game("Draft").await?;
        let before = store.snapshot();
        api.fail("update_game");
        let err = store
            .update_game(game.id.expect("id"), "Final")
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert_eq!(store.snapshot(), before);
        Ok(())
    }

    #[tokio::test]
    async fn failed_team_reload_keeps_board() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(2).await;
        let game_id = store.current_game_id().expect("game");
        store.initialize_board_positions(&teams);
        store.advance_team(teams[1].id.expect("id"), 6)?;
        let before = store.snapshot();

        api.fail("list_teams");
        assert!(store.load_teams_for_game(game_id).await.unwrap_err().is_remote());
        assert_eq!(store.snapshot(), before);
        Ok(())
    }

    #[tokio::test]
    async fn start_new_session_discards_previous_state() -> anyhow::Result<()> {
        let (store, _, teams) = store_with_teams(2).await;
        let team_id = teams[0].id.expect("id");
        store.initialize_board_positions(&teams);
        store.advance_team(team_id, 4)?;
        store.mark_word_as_used(1);

        store.start_new_session(99);
        store.start_new_session(99);
        let session = store.snapshot();
        assert_eq!(session, GameSession::for_game(99));
        Ok(())
    }

    #[tokio::test]
    async fn colours_follow_creation_order_not_board_position() -> anyhow::Result<()> {
        let api = Arc::new(MemoryApi::new());
        let game = api.create_game(&Game::named("Colours")).await?;
        let game_id = game.id.expect("id");
        // Insert out of order and with board progress to make sure neither matters.
        for (id, position) in [(15, 2), (11, 16), (13, 0), (12, 9), (14, 5)] {
            api.insert_team(Team {
                id: Some(id),
                position,
                game_id: Some(game_id),
                ..Team::default()
            });
        }
        api.insert_team(Team {
            id: Some(20),
            game_id: Some(game_id + 1000),
            ..Team::default()
        });

        let store = SessionStore::new(api.clone());
        let teams = store.load_teams_for_game(game_id).await?;
        let ids: Vec<_> = teams.iter().filter_map(|team| team.id).collect();
        let colours: Vec<_> = teams.iter().map(|team| team.color_index).collect();
        assert_eq!(ids, vec![11, 12, 13, 14, 15]);
        assert_eq!(colours, vec![0, 1, 2, 3, 0]);

        let reloaded = store.load_teams_for_game(game_id).await?;
        assert_eq!(reloaded, teams);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_team_cascades_players_locally_only() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(2).await;
        let first = teams[0].id.expect("id");
        let second = teams[1].id.expect("id");
        store.create_player(Player::new("Ann", first)).await?;
        store.create_player(Player::new("Ben", second)).await?;

        store.delete_team(first).await?;
        let session = store.snapshot();
        assert_eq!(session.teams.len(), 1);
        assert_eq!(session.teams[0].color_index, 0);
        assert_eq!(session.players.len(), 1);
        assert_eq!(session.players[0].name, "Ben");
        assert_eq!(api.stored_players().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn delete_all_teams_is_all_or_nothing_locally() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(3).await;
        let game_id = store.current_game_id().expect("game");

        api.fail("delete_team");
        assert!(store.delete_all_teams_for_game(game_id).await.is_err());
        assert_eq!(store.teams().len(), 3);

        api.recover("delete_team");
        store.delete_all_teams_for_game(game_id).await?;
        assert!(store.teams().is_empty());
        assert!(api.stored_teams().is_empty());
        assert_eq!(api.calls("delete_team"), 1 + teams.len());
        Ok(())
    }

    #[tokio::test]
    async fn players_are_filtered_to_session_teams() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(2).await;
        let game_id = store.current_game_id().expect("game");
        api.insert_player(Player::new("Ann", teams[0].id.expect("id")));
        api.insert_player(Player::new("Stranger", 9_999));

        // Empty team cache forces a team reload first.
        store.start_new_session(game_id);
        let players = store.load_players_for_game(game_id).await?;
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Ann");
        assert_eq!(store.teams().len(), 2);
        assert_eq!(api.calls("list_teams"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected_case_insensitively() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(2).await;
        let first = teams[0].id.expect("id");
        let second = teams[1].id.expect("id");
        store.create_player(Player::new("Alice", first)).await?;
        let before = store.players();

        let err = store
            .create_player(Player::new("aLiCe", second))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::DuplicatePlayerName(_))
        ));
        assert_eq!(store.players(), before);
        assert_eq!(api.calls("create_player"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_name_admit_one() -> anyhow::Result<()> {
        let (store, _, teams) = store_with_teams(2).await;
        let first = teams[0].id.expect("id");
        let second = teams[1].id.expect("id");

        let (a, b) = tokio::join!(
            store.create_player(Player::new("Max", first)),
            store.create_player(Player::new("MAX", second)),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(store.players().len(), 1);

        // The failed reservation must not block the name afterwards.
        store.delete_player(store.players()[0].id.expect("id")).await?;
        store.create_player(Player::new("max", second)).await?;
        Ok(())
    }

    #[tokio::test]
    async fn failed_create_releases_reserved_name() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(1).await;
        let team_id = teams[0].id.expect("id");
        api.fail("create_player");
        assert!(store.create_player(Player::new("Zoe", team_id)).await.is_err());
        api.recover("create_player");
        store.create_player(Player::new("Zoe", team_id)).await?;
        Ok(())
    }

    #[tokio::test]
    async fn update_player_requires_id() {
        let (store, api) = store();
        let err = store
            .update_player(Player::new("Nobody", 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::MissingId("player"))
        ));
        assert_eq!(api.calls("update_player"), 0);
    }

    #[tokio::test]
    async fn rename_to_taken_name_is_rejected() -> anyhow::Result<()> {
        let (store, _, teams) = store_with_teams(1).await;
        let team_id = teams[0].id.expect("id");
        store.create_player(Player::new("Ann", team_id)).await?;
        let mut ben = store.create_player(Player::new("Ben", team_id)).await?;

        ben.name = "ANN".to_string();
        assert!(store.update_player(ben.clone()).await.unwrap_err().is_validation());

        ben.name = "Benedict".to_string();
        let updated = store.update_player(ben).await?;
        assert_eq!(updated.name, "Benedict");
        assert!(store.players().iter().any(|player| player.name == "Benedict"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_rename_releases_the_new_name() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(1).await;
        let team_id = teams[0].id.expect("id");
        let mut ben = store.create_player(Player::new("Ben", team_id)).await?;
        let before = store.snapshot();

        api.fail("update_player");
        ben.name = "Bob".to_string();
        assert!(store.update_player(ben.clone()).await.unwrap_err().is_remote());
        assert_eq!(store.snapshot(), before);

        api.recover("update_player");
        let bob = store.create_player(Player::new("bob", team_id)).await?;
        assert_eq!(bob.name, "bob");
        Ok(())
    }

    #[tokio::test]
    async fn rename_sends_trimmed_name_and_allows_case_change() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(1).await;
        let team_id = teams[0].id.expect("id");
        let mut ann = store.create_player(Player::new("ann", team_id)).await?;

        ann.name = "  Ann  ".to_string();
        let updated = store.update_player(ann.clone()).await?;
        assert_eq!(updated.name, "Ann");
        assert_eq!(api.stored_players()[0].name, "Ann");

        ann.name = "   ".to_string();
        assert!(matches!(
            store.update_player(ann).await,
            Err(StoreError::Validation(ValidationError::EmptyName))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn failed_position_save_keeps_cached_teams() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(2).await;
        let team_id = teams[0].id.expect("id");
        store.initialize_board_positions(&teams);
        store.advance_team(team_id, 5)?;
        let before = store.snapshot();

        api.fail("update_team");
        assert!(store
            .update_team_position_in_backend(team_id)
            .await
            .unwrap_err()
            .is_remote());
        assert!(store.save_game_state().await.unwrap_err().is_remote());
        assert_eq!(store.snapshot(), before);
        assert!(api.stored_teams().iter().all(|team| team.position == 0));
        Ok(())
    }

    #[tokio::test]
    async fn award_points_accumulates() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(1).await;
        let team_id = teams[0].id.expect("id");
        let player = store.create_player(Player::new("Ann", team_id)).await?;
        let player_id = player.id.expect("id");
        store.award_points(player_id, 3).await?;
        let updated = store.award_points(player_id, 4).await?;
        assert_eq!(updated.points_earned, 7);
        assert_eq!(api.stored_players()[0].points_earned, 7);
        assert!(matches!(
            store.award_points(404, 1).await,
            Err(StoreError::NotFound { entity: "player", .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_without_game_is_a_no_op() -> anyhow::Result<()> {
        let (store, api) = store();
        store.refresh_current_game().await?;
        assert_eq!(api.calls("get_game"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_repulls_everything() -> anyhow::Result<()> {
        let (store, api, teams) = store_with_teams(2).await;
        api.insert_player(Player::new("Late", teams[1].id.expect("id")));
        store.refresh_current_game().await?;
        let session = store.snapshot();
        assert!(session.game.is_some());
        assert_eq!(session.teams.len(), 2);
        assert_eq!(session.players.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn subscribers_observe_latest_snapshot() -> anyhow::Result<()> {
        let (store, _, teams) = store_with_teams(1).await;
        let mut receiver = store.subscribe();
        let team_id = teams[0].id.expect("id");
        store.initialize_board_positions(&teams);
        store.advance_team(team_id, GOAL_POSITION)?;
        assert!(receiver.has_changed()?);
        let latest = receiver.borrow_and_update().clone();
        assert!(latest.finished_team_ids.contains(&team_id));
        Ok(())
    }
}
