use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::{ActivityApi, RemoteResult};
use crate::{
    config::AppConfig,
    error::RemoteError,
    models::{Game, Player, Team, Word, WordCategory},
};

/// Talks to the game backend with JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    /// Build a client rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> RemoteResult<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized)
            .map_err(|err| RemoteError::Other(format!("invalid base url '{base_url}': {err}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteError::from)?;
        Ok(Self { client, base })
    }

    /// Build a client from the application configuration.
    pub fn from_config(config: &AppConfig) -> RemoteResult<Self> {
        Self::new(&config.base_url, config.request_timeout())
    }

    /// Base URL every route is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> RemoteResult<Url> {
        self.base
            .join(path)
            .map_err(|err| RemoteError::Other(format!("invalid route '{path}': {err}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> RemoteResult<T> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> RemoteResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, Some(body)).await?;
        decode(response).await
    }

    async fn delete(&self, path: &str) -> RemoteResult<()> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> RemoteResult<Response>
    where
        B: Serialize + Sync,
    {
        let url = self.url(path)?;
        debug!(%method, %url, "backend request");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        body.trim().to_string()
    };
    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| RemoteError::Decode(err.to_string()))
}

#[async_trait]
impl ActivityApi for HttpApi {
    async fn list_games(&self) -> RemoteResult<Vec<Game>> {
        self.get_json("games").await
    }

    async fn get_game(&self, id: i64) -> RemoteResult<Game> {
        self.get_json(&format!("games/{id}")).await
    }

    async fn create_game(&self, game: &Game) -> RemoteResult<Game> {
        self.send_json(Method::POST, "games", game).await
    }

    async fn update_game(&self, id: i64, game: &Game) -> RemoteResult<Game> {
        self.send_json(Method::PUT, &format!("games/{id}"), game)
            .await
    }

    async fn delete_game(&self, id: i64) -> RemoteResult<()> {
        self.delete(&format!("games/{id}")).await
    }

    async fn delete_all_games(&self) -> RemoteResult<()> {
        self.delete("games").await
    }

    async fn list_teams(&self) -> RemoteResult<Vec<Team>> {
        self.get_json("teams").await
    }

    async fn get_team(&self, id: i64) -> RemoteResult<Team> {
        self.get_json(&format!("teams/{id}")).await
    }

    async fn create_team(&self, team: &Team) -> RemoteResult<Team> {
        self.send_json(Method::POST, "teams", team).await
    }

    async fn update_team(&self, id: i64, team: &Team) -> RemoteResult<Team> {
        self.send_json(Method::PUT, &format!("teams/{id}"), team)
            .await
    }

    async fn delete_team(&self, id: i64) -> RemoteResult<()> {
        self.delete(&format!("teams/{id}")).await
    }

    async fn delete_all_teams(&self) -> RemoteResult<()> {
        self.delete("teams").await
    }

    async fn list_players(&self) -> RemoteResult<Vec<Player>> {
        self.get_json("players").await
    }

    async fn get_player(&self, id: i64) -> RemoteResult<Player> {
        self.get_json(&format!("players/{id}")).await
    }

    async fn players_by_team(&self, team_id: i64) -> RemoteResult<Vec<Player>> {
        self.get_json(&format!("players/team/{team_id}")).await
    }

    async fn create_player(&self, player: &Player) -> RemoteResult<Player> {
        self.send_json(Method::POST, "players", player).await
    }

    async fn update_player(&self, id: i64, player: &Player) -> RemoteResult<Player> {
        self.send_json(Method::PUT, &format!("players/{id}"), player)
            .await
    }

    async fn delete_player(&self, id: i64) -> RemoteResult<()> {
        self.delete(&format!("players/{id}")).await
    }

    async fn list_words(&self) -> RemoteResult<Vec<Word>> {
        self.get_json("api/words").await
    }

    async fn get_word(&self, id: i64) -> RemoteResult<Word> {
        self.get_json(&format!("api/words/{id}")).await
    }

    async fn random_word(&self) -> RemoteResult<Word> {
        self.get_json("api/words/random").await
    }

    async fn random_word_by_category(&self, category: WordCategory) -> RemoteResult<Word> {
        self.get_json(&format!("api/words/random/{}", category.as_path()))
            .await
    }

    async fn words_by_min_points(&self, points: i32) -> RemoteResult<Vec<Word>> {
        self.get_json(&format!("api/words/minpoints/{points}"))
            .await
    }

    async fn create_word(&self, word: &Word) -> RemoteResult<Word> {
        self.send_json(Method::POST, "api/words", word).await
    }

    async fn update_word(&self, id: i64, word: &Word) -> RemoteResult<Word> {
        self.send_json(Method::PUT, &format!("api/words/{id}"), word)
            .await
    }

    async fn delete_word(&self, id: i64) -> RemoteResult<()> {
        self.delete(&format!("api/words/{id}")).await
    }
}
