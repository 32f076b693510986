//! Remote collaborator exposing the game backend's CRUD surface.

/// JSON-over-HTTP client for the game backend.
pub mod http;
/// In-process backend used offline and by tests.
pub mod memory;

use async_trait::async_trait;

use crate::{
    error::RemoteError,
    models::{Game, Player, Team, Word, WordCategory},
};

pub use http::HttpApi;
pub use memory::MemoryApi;

/// Result of a single backend call.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// CRUD endpoints for games, teams, players and words.
///
/// Create calls take a resource without identifier and return it with the
/// server-assigned one. List calls return the full, unfiltered collection.
#[async_trait]
pub trait ActivityApi: Send + Sync {
    /// All games.
    async fn list_games(&self) -> RemoteResult<Vec<Game>>;
    /// A single game.
    async fn get_game(&self, id: i64) -> RemoteResult<Game>;
    /// Create a game.
    async fn create_game(&self, game: &Game) -> RemoteResult<Game>;
    /// Replace a game.
    async fn update_game(&self, id: i64, game: &Game) -> RemoteResult<Game>;
    /// Delete a game and its teams.
    async fn delete_game(&self, id: i64) -> RemoteResult<()>;
    /// Delete every game.
    async fn delete_all_games(&self) -> RemoteResult<()>;

    /// All teams of all games.
    async fn list_teams(&self) -> RemoteResult<Vec<Team>>;
    /// A single team.
    async fn get_team(&self, id: i64) -> RemoteResult<Team>;
    /// Create a team.
    async fn create_team(&self, team: &Team) -> RemoteResult<Team>;
    /// Replace a team, including its board position.
    async fn update_team(&self, id: i64, team: &Team) -> RemoteResult<Team>;
    /// Delete a team.
    async fn delete_team(&self, id: i64) -> RemoteResult<()>;
    /// Delete every team.
    async fn delete_all_teams(&self) -> RemoteResult<()>;

    /// All players of all teams.
    async fn list_players(&self) -> RemoteResult<Vec<Player>>;
    /// A single player.
    async fn get_player(&self, id: i64) -> RemoteResult<Player>;
    /// Players of one team.
    async fn players_by_team(&self, team_id: i64) -> RemoteResult<Vec<Player>>;
    /// Create a player.
    async fn create_player(&self, player: &Player) -> RemoteResult<Player>;
    /// Replace a player.
    async fn update_player(&self, id: i64, player: &Player) -> RemoteResult<Player>;
    /// Delete a player.
    async fn delete_player(&self, id: i64) -> RemoteResult<()>;

    /// The full word catalog.
    async fn list_words(&self) -> RemoteResult<Vec<Word>>;
    /// A single word.
    async fn get_word(&self, id: i64) -> RemoteResult<Word>;
    /// Any word.
    async fn random_word(&self) -> RemoteResult<Word>;
    /// Any word of the given category.
    async fn random_word_by_category(&self, category: WordCategory) -> RemoteResult<Word>;
    /// Words worth at least `points`.
    async fn words_by_min_points(&self, points: i32) -> RemoteResult<Vec<Word>>;
    /// Add a word to the catalog.
    async fn create_word(&self, word: &Word) -> RemoteResult<Word>;
    /// Replace a word.
    async fn update_word(&self, id: i64, word: &Word) -> RemoteResult<Word>;
    /// Remove a word from the catalog.
    async fn delete_word(&self, id: i64) -> RemoteResult<()>;
}
