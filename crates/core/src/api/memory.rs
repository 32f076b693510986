use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Local;
use parking_lot::Mutex;
use rand::seq::SliceRandom;

use super::{ActivityApi, RemoteResult};
use crate::{
    error::RemoteError,
    models::{Game, Player, Team, Word, WordCategory},
};

/// Backend kept entirely in memory.
///
/// Identifiers are assigned in ascending order per resource, like the real
/// backend's sequences. Every call is counted by operation name and single
/// operations can be made to fail, which lets callers exercise their error
/// paths without a network.
#[derive(Debug, Default)]
pub struct MemoryApi {
    state: Mutex<Tables>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    games: BTreeMap<i64, Game>,
    teams: BTreeMap<i64, Team>,
    players: BTreeMap<i64, Player>,
    words: BTreeMap<i64, Word>,
}

impl Tables {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryApi {
    /// Empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend preloaded with the given word catalog.
    pub fn with_words(words: impl IntoIterator<Item = Word>) -> Self {
        let api = Self::new();
        {
            let mut state = api.state.lock();
            for mut word in words {
                let id = match word.id {
                    Some(id) => {
                        state.next_id = state.next_id.max(id);
                        id
                    }
                    None => state.allocate(),
                };
                word.id = Some(id);
                state.words.insert(id, word);
            }
        }
        api
    }

    /// Backend preloaded with a small catalog covering every category and difficulty.
    pub fn with_sample_catalog() -> Self {
        const SAMPLE: [(&str, WordCategory, i32); 15] = [
            ("House", WordCategory::Draw, 3),
            ("Bicycle", WordCategory::Draw, 4),
            ("Lighthouse", WordCategory::Draw, 5),
            ("Rainbow", WordCategory::Draw, 3),
            ("Volcano", WordCategory::Draw, 4),
            ("Swimming", WordCategory::Act, 3),
            ("Juggling", WordCategory::Act, 4),
            ("Tightrope", WordCategory::Act, 5),
            ("Sneezing", WordCategory::Act, 3),
            ("Fishing", WordCategory::Act, 4),
            ("Library", WordCategory::Describe, 3),
            ("Democracy", WordCategory::Describe, 5),
            ("Homesick", WordCategory::Describe, 4),
            ("Breakfast", WordCategory::Describe, 3),
            ("Gravity", WordCategory::Describe, 5),
        ];
        Self::with_words(SAMPLE.iter().map(|(word, category, points)| Word {
            id: None,
            word: (*word).to_string(),
            category: *category,
            points: *points,
        }))
    }

    /// Number of times `operation` (e.g. `"list_words"`) was invoked.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    /// Make every subsequent `operation` call fail with a 503.
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    /// Let `operation` succeed again.
    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().remove(operation);
    }

    /// Stored teams, in id order.
    pub fn stored_teams(&self) -> Vec<Team> {
        self.state.lock().teams.values().cloned().collect()
    }

    /// Stored players, in id order.
    pub fn stored_players(&self) -> Vec<Player> {
        self.state.lock().players.values().cloned().collect()
    }

    /// Insert a team verbatim, keeping its identifier if one is set.
    pub fn insert_team(&self, mut team: Team) -> Team {
        let mut state = self.state.lock();
        let id = match team.id {
            Some(id) => {
                state.next_id = state.next_id.max(id);
                id
            }
            None => state.allocate(),
        };
        team.id = Some(id);
        state.teams.insert(id, team.clone());
        team
    }

    /// Insert a player verbatim, keeping its identifier if one is set.
    pub fn insert_player(&self, mut player: Player) -> Player {
        let mut state = self.state.lock();
        let id = match player.id {
            Some(id) => {
                state.next_id = state.next_id.max(id);
                id
            }
            None => state.allocate(),
        };
        player.id = Some(id);
        state.players.insert(id, player.clone());
        player
    }

    fn enter(&self, operation: &'static str) -> RemoteResult<()> {
        *self.calls.lock().entry(operation).or_insert(0) += 1;
        if self.failing.lock().contains(operation) {
            return Err(RemoteError::Status {
                status: 503,
                message: format!("{operation} unavailable"),
            });
        }
        Ok(())
    }
}

fn not_found(kind: &str, id: i64) -> RemoteError {
    RemoteError::Status {
        status: 404,
        message: format!("{kind} with id {id} not found"),
    }
}

#[async_trait]
impl ActivityApi for MemoryApi {
    async fn list_games(&self) -> RemoteResult<Vec<Game>> {
        self.enter("list_games")?;
        Ok(self.state.lock().games.values().cloned().collect())
    }

    async fn get_game(&self, id: i64) -> RemoteResult<Game> {
        self.enter("get_game")?;
        let state = self.state.lock();
        let mut game = state.games.get(&id).cloned().ok_or_else(|| not_found("game", id))?;
        game.team_ids = Some(
            state
                .teams
                .values()
                .filter(|team| team.game_id == Some(id))
                .filter_map(|team| team.id)
                .collect(),
        );
        Ok(game)
    }

    async fn create_game(&self, game: &Game) -> RemoteResult<Game> {
        self.enter("create_game")?;
        let mut state = self.state.lock();
        let id = state.allocate();
        let created = Game {
            id: Some(id),
            name: game.name.clone(),
            created_on: Some(
                Local::now()
                    .naive_local()
                    .format("%Y-%m-%dT%H:%M:%S%.f")
                    .to_string(),
            ),
            team_ids: Some(Vec::new()),
        };
        state.games.insert(id, created.clone());
        Ok(created)
    }

    async fn update_game(&self, id: i64, game: &Game) -> RemoteResult<Game> {
        self.enter("update_game")?;
        let mut state = self.state.lock();
        let stored = state.games.get_mut(&id).ok_or_else(|| not_found("game", id))?;
        stored.name = game.name.clone();
        Ok(stored.clone())
    }

    async fn delete_game(&self, id: i64) -> RemoteResult<()> {
        self.enter("delete_game")?;
        let mut state = self.state.lock();
        state.games.remove(&id);
        state.teams.retain(|_, team| team.game_id != Some(id));
        Ok(())
    }

    async fn delete_all_games(&self) -> RemoteResult<()> {
        self.enter("delete_all_games")?;
        let mut state = self.state.lock();
        state.games.clear();
        state.teams.clear();
        Ok(())
    }

    async fn list_teams(&self) -> RemoteResult<Vec<Team>> {
        self.enter("list_teams")?;
        Ok(self.state.lock().teams.values().cloned().collect())
    }

    async fn get_team(&self, id: i64) -> RemoteResult<Team> {
        self.enter("get_team")?;
        self.state
            .lock()
            .teams
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("team", id))
    }

    async fn create_team(&self, team: &Team) -> RemoteResult<Team> {
        self.enter("create_team")?;
        let mut state = self.state.lock();
        if let Some(game_id) = team.game_id {
            if !state.games.contains_key(&game_id) {
                return Err(RemoteError::Status {
                    status: 400,
                    message: format!("game with id {game_id} not found"),
                });
            }
        }
        let id = state.allocate();
        let created = Team {
            id: Some(id),
            color_index: 0,
            ..team.clone()
        };
        state.teams.insert(id, created.clone());
        Ok(created)
    }

    async fn update_team(&self, id: i64, team: &Team) -> RemoteResult<Team> {
        self.enter("update_team")?;
        let mut state = self.state.lock();
        let stored = state.teams.get_mut(&id).ok_or_else(|| not_found("team", id))?;
        stored.position = team.position;
        stored.game_id = team.game_id;
        stored.player_ids = team.player_ids.clone();
        Ok(stored.clone())
    }

    async fn delete_team(&self, id: i64) -> RemoteResult<()> {
        self.enter("delete_team")?;
        self.state.lock().teams.remove(&id);
        Ok(())
    }

    async fn delete_all_teams(&self) -> RemoteResult<()> {
        self.enter("delete_all_teams")?;
        self.state.lock().teams.clear();
        Ok(())
    }

    async fn list_players(&self) -> RemoteResult<Vec<Player>> {
        self.enter("list_players")?;
        Ok(self.state.lock().players.values().cloned().collect())
    }

    async fn get_player(&self, id: i64) -> RemoteResult<Player> {
        self.enter("get_player")?;
        self.state
            .lock()
            .players
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("player", id))
    }

    async fn players_by_team(&self, team_id: i64) -> RemoteResult<Vec<Player>> {
        self.enter("players_by_team")?;
        let state = self.state.lock();
        if !state.teams.contains_key(&team_id) {
            return Err(not_found("team", team_id));
        }
        Ok(state
            .players
            .values()
            .filter(|player| player.team == Some(team_id))
            .cloned()
            .collect())
    }

    async fn create_player(&self, player: &Player) -> RemoteResult<Player> {
        self.enter("create_player")?;
        let mut state = self.state.lock();
        if player.name.trim().is_empty() {
            return Err(RemoteError::Status {
                status: 400,
                message: "player name must not be empty".to_string(),
            });
        }
        let clash = state.players.values().any(|existing| {
            existing.team == player.team && existing.name.eq_ignore_ascii_case(&player.name)
        });
        if clash {
            return Err(RemoteError::Status {
                status: 409,
                message: format!("player '{}' already exists in this team", player.name),
            });
        }
        let id = state.allocate();
        let created = Player {
            id: Some(id),
            ..player.clone()
        };
        state.players.insert(id, created.clone());
        Ok(created)
    }

    async fn update_player(&self, id: i64, player: &Player) -> RemoteResult<Player> {
        self.enter("update_player")?;
        let mut state = self.state.lock();
        let stored = state
            .players
            .get_mut(&id)
            .ok_or_else(|| not_found("player", id))?;
        if !player.name.trim().is_empty() {
            stored.name = player.name.clone();
        }
        stored.team = player.team;
        stored.points_earned = player.points_earned;
        Ok(stored.clone())
    }

    async fn delete_player(&self, id: i64) -> RemoteResult<()> {
        self.enter("delete_player")?;
        self.state.lock().players.remove(&id);
        Ok(())
    }

    async fn list_words(&self) -> RemoteResult<Vec<Word>> {
        self.enter("list_words")?;
        Ok(self.state.lock().words.values().cloned().collect())
    }

    async fn get_word(&self, id: i64) -> RemoteResult<Word> {
        self.enter("get_word")?;
        self.state
            .lock()
            .words
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("word", id))
    }

    async fn random_word(&self) -> RemoteResult<Word> {
        self.enter("random_word")?;
        let state = self.state.lock();
        let words: Vec<&Word> = state.words.values().collect();
        words
            .choose(&mut rand::thread_rng())
            .map(|word| (*word).clone())
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                message: "no words available".to_string(),
            })
    }

    async fn random_word_by_category(&self, category: WordCategory) -> RemoteResult<Word> {
        self.enter("random_word_by_category")?;
        let state = self.state.lock();
        let words: Vec<&Word> = state
            .words
            .values()
            .filter(|word| word.category == category)
            .collect();
        words
            .choose(&mut rand::thread_rng())
            .map(|word| (*word).clone())
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                message: format!("no words in category {}", category.as_path()),
            })
    }

    async fn words_by_min_points(&self, points: i32) -> RemoteResult<Vec<Word>> {
        self.enter("words_by_min_points")?;
        Ok(self
            .state
            .lock()
            .words
            .values()
            .filter(|word| word.points >= points)
            .cloned()
            .collect())
    }

    async fn create_word(&self, word: &Word) -> RemoteResult<Word> {
        self.enter("create_word")?;
        let mut state = self.state.lock();
        let id = state.allocate();
        let created = Word {
            id: Some(id),
            ..word.clone()
        };
        state.words.insert(id, created.clone());
        Ok(created)
    }

    async fn update_word(&self, id: i64, word: &Word) -> RemoteResult<Word> {
        self.enter("update_word")?;
        let mut state = self.state.lock();
        let stored = state.words.get_mut(&id).ok_or_else(|| not_found("word", id))?;
        *stored = Word {
            id: Some(id),
            ..word.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_word(&self, id: i64) -> RemoteResult<()> {
        self.enter("delete_word")?;
        self.state.lock().words.remove(&id);
        Ok(())
    }
}
