use anyhow::{anyhow, bail, Context, Result};
use rand::{seq::SliceRandom, Rng};
use tracing::{info, warn};

use activity_core::{
    models::BoardStage,
    setup::{self, RosterDraft},
    turn::{self, TurnOutcome},
    AppConfig, SessionStore,
};

const DEMO_GAME_NAME: &str = "Demo party";
const DEMO_PLAYERS: [&str; 4] = ["Ann", "Ben", "Cid", "Dee"];
const GUESS_RATE: f64 = 0.7;

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the games known to the backend.
    List,
    /// Load a game, restore its board and show it.
    Resume(i64),
    /// Play a whole game offline with simulated guesses.
    Demo,
    /// Delete a game with its teams and players.
    Delete(i64),
}

impl Command {
    pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let command = match args.next() {
            None => Self::List,
            Some(arg) if arg == "demo" => Self::Demo,
            Some(arg) if arg == "delete" => {
                let id = args.next().context("`delete` needs a game id")?;
                Self::Delete(parse_game_id(&id)?)
            }
            Some(arg) => Self::Resume(parse_game_id(&arg)?),
        };
        if let Some(extra) = args.next() {
            bail!("unexpected argument `{extra}`");
        }
        Ok(command)
    }
}

fn parse_game_id(arg: &str) -> Result<i64> {
    arg.parse()
        .with_context(|| format!("expected a game id, `demo` or `delete`, got `{arg}`"))
}

pub struct ActivityApp {
    store: SessionStore,
    config: AppConfig,
}

impl ActivityApp {
    pub fn new(store: SessionStore, config: AppConfig) -> Self {
        Self { store, config }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::List => self.list_games().await,
            Command::Resume(game_id) => self.resume(game_id).await,
            Command::Demo => self.demo(&mut rand::thread_rng()).await,
            Command::Delete(game_id) => self.delete(game_id).await,
        }
    }

    async fn list_games(&self) -> Result<()> {
        let games = self.store.list_games().await?;
        if games.is_empty() {
            println!("No games yet.");
        }
        for game in games {
            let id = game.id.map(|id| id.to_string()).unwrap_or_default();
            let teams = game.team_ids.as_ref().map_or(0, Vec::len);
            println!("{id:>5}  {}  ({teams} teams)", game.display_name());
        }
        Ok(())
    }

    async fn resume(&self, game_id: i64) -> Result<()> {
        self.store.start_new_session(game_id);
        self.store.refresh_current_game().await?;
        let teams = self.store.teams();
        self.store.restore_board_positions_from_backend(&teams);
        info!(game_id, teams = teams.len(), "game resumed");

        self.print_board();
        self.store.save_game_state().await?;
        self.store.clear_session();
        Ok(())
    }

    async fn delete(&self, game_id: i64) -> Result<()> {
        setup::delete_game_with_all(&self.store, game_id).await?;
        println!("Deleted game {game_id}.");
        Ok(())
    }

    async fn demo<R: Rng>(&self, rng: &mut R) -> Result<()> {
        let mut roster = RosterDraft::new();
        for name in DEMO_PLAYERS {
            roster.add_player(name)?;
        }
        // Four players land on four colours; pair them up into two teams.
        for name in &DEMO_PLAYERS[2..] {
            roster.cycle_team(name)?;
            roster.cycle_team(name)?;
        }
        let game = roster.persist(&self.store, DEMO_GAME_NAME).await?;
        info!(game = %game.display_name(), turn_seconds = self.config.turn_seconds, "demo started");

        self.store.load_all_words().await?;
        self.store.initialize_board_positions(&self.store.teams());

        let mut turns = 0;
        while !self.store.is_game_over() {
            let Some(team) = self.store.current_team() else {
                break;
            };
            let team_id = team.id.ok_or_else(|| anyhow!("team without id"))?;
            let category = turn::category_for_team(&self.store, team_id);
            let points = rng.gen_range(3..=5);
            let Some(word) = turn::draw_word(&self.store, category, Some(points), rng) else {
                warn!(%category, "no words left, ending demo");
                break;
            };

            let outcome = if rng.gen_bool(GUESS_RATE) {
                TurnOutcome::Guessed
            } else {
                TurnOutcome::Missed
            };
            let scorer = self
                .store
                .players_for_team(team_id)
                .choose(rng)
                .and_then(|player| player.id);
            let result = turn::resolve_turn(&self.store, team_id, &word, outcome, scorer).await?;
            turns += 1;
            println!(
                "{:<12} {:<9} {:<12} {:?} -> {}",
                team.label(),
                category,
                word.word,
                outcome,
                result.position
            );
        }

        self.store.save_game_state().await?;
        info!(turns, "demo finished");
        self.print_board();
        self.print_rankings();
        Ok(())
    }

    fn print_rankings(&self) {
        println!("== Final ranking ==");
        for (place, (team, position)) in self.store.final_rankings().iter().enumerate() {
            println!("{:>2}. {:<12} {position:>2}", place + 1, team.label());
        }
    }

    fn print_board(&self) {
        let session = self.store.snapshot();
        if let Some(game) = &session.game {
            println!("== {} ==", game.display_name());
        }
        for team in &session.teams {
            let Some(team_id) = team.id else { continue };
            let position = session.board_position(team_id);
            let stage = match BoardStage::of(position) {
                BoardStage::NotStarted => "not started",
                BoardStage::InProgress => "playing",
                BoardStage::Finished => "finished",
            };
            println!("{:<12} {position:>2}  {stage}", team.label());
            for player in session.players_for_team(team_id) {
                println!("    {:<16} {:>3} pts", player.name, player.points_earned);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_core::{GameSession, MemoryApi, StoreError, Team};
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Arc;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_commands() -> Result<()> {
        assert_eq!(Command::parse(args(&[]))?, Command::List);
        assert_eq!(Command::parse(args(&["demo"]))?, Command::Demo);
        assert_eq!(Command::parse(args(&["12"]))?, Command::Resume(12));
        assert_eq!(Command::parse(args(&["delete", "4"]))?, Command::Delete(4));
        assert!(Command::parse(args(&["delete"])).is_err());
        assert!(Command::parse(args(&["twelve"])).is_err());
        assert!(Command::parse(args(&["12", "13"])).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn demo_plays_until_done_and_saves() -> Result<()> {
        let api = Arc::new(MemoryApi::with_sample_catalog());
        let app = ActivityApp::new(SessionStore::new(api.clone()), AppConfig::default());
        app.demo(&mut StdRng::seed_from_u64(3)).await?;

        assert_eq!(api.stored_teams().len(), 2);
        assert_eq!(api.stored_players().len(), 4);
        assert!(api.calls("update_team") >= 2);
        assert!(app.store.used_word_count() > 0);

        let positions: Vec<i32> = app
            .store
            .final_rankings()
            .into_iter()
            .map(|(_, position)| position)
            .collect();
        assert_eq!(positions.len(), 2);
        assert!(positions[0] >= positions[1]);
        Ok(())
    }

    #[tokio::test]
    async fn resume_saves_then_clears_session() -> Result<()> {
        let api = Arc::new(MemoryApi::with_sample_catalog());
        let store = SessionStore::new(api.clone());
        let game = store.create_game("Saved night").await?;
        let game_id = game.id.context("game id")?;
        store.create_team(Team::for_game(game_id)).await?;

        let app = ActivityApp::new(store, AppConfig::default());
        app.resume(game_id).await?;
        assert_eq!(api.calls("update_team"), 1);
        assert_eq!(app.store.snapshot(), GameSession::default());
        Ok(())
    }

    #[tokio::test]
    async fn delete_command_removes_game() -> Result<()> {
        let api = Arc::new(MemoryApi::with_sample_catalog());
        let store = SessionStore::new(api.clone());
        let game = store.create_game("Gone").await?;
        let game_id = game.id.context("game id")?;
        store.create_team(Team::for_game(game_id)).await?;

        let app = ActivityApp::new(store, AppConfig::default());
        app.run(Command::Delete(game_id)).await?;
        assert!(api.stored_teams().is_empty());
        assert!(app.store.list_games().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn resuming_unknown_game_fails() {
        let api = Arc::new(MemoryApi::with_sample_catalog());
        let app = ActivityApp::new(SessionStore::new(api), AppConfig::default());
        let err = app.resume(99).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(err) if err.is_remote()
        ));
    }
}
