//! Shared domain models.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Board position of the goal field; reaching it finishes a team.
pub const GOAL_POSITION: i32 = 16;
/// Number of distinct team colours.
pub const TEAM_COLORS: usize = 4;
/// Smallest number of teams a game can be generated with.
pub const MIN_TEAMS: usize = 1;
/// Largest number of teams a game can be generated with.
pub const MAX_TEAMS: usize = 4;

/// A game record as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Server-assigned identifier, absent before creation.
    pub id: Option<i64>,
    /// Display name chosen by the players.
    pub name: Option<String>,
    /// Creation timestamp as reported by the backend.
    pub created_on: Option<String>,
    /// Identifiers of the teams belonging to this game.
    pub team_ids: Option<Vec<i64>>,
}

impl Game {
    /// Game payload for a create request.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parse `created_on`, accepting timestamps with or without fractional seconds.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        let raw = self.created_on.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }

    /// Returns a user-facing label for the game.
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => match self.id {
                Some(id) => format!("Game #{id}"),
                None => "Untitled game".to_string(),
            },
        }
    }
}

/// A team taking part in a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Server-assigned identifier, absent before creation.
    pub id: Option<i64>,
    /// Persisted board position (0 = start, 16 = goal).
    #[serde(default)]
    pub position: i32,
    /// Owning game.
    pub game_id: Option<i64>,
    /// Identifiers of the team's players.
    pub player_ids: Option<Vec<i64>>,
    /// Display colour slot assigned on load; never sent to the backend.
    #[serde(skip)]
    pub color_index: u8,
}

impl Team {
    /// Team payload for a create request.
    pub fn for_game(game_id: i64) -> Self {
        Self {
            game_id: Some(game_id),
            ..Self::default()
        }
    }

    /// Display colour of the team.
    pub fn color(&self) -> TeamColor {
        TeamColor::from_index(self.color_index as usize)
    }

    /// Label such as `Team Red`.
    pub fn label(&self) -> String {
        self.color().label()
    }
}

/// Display colour derived from a team's creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TeamColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl TeamColor {
    /// Colour for the given slot, wrapping every four teams.
    pub fn from_index(index: usize) -> Self {
        match index % TEAM_COLORS {
            0 => Self::Red,
            1 => Self::Blue,
            2 => Self::Green,
            _ => Self::Yellow,
        }
    }

    /// Colour name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
        }
    }

    /// RGB value used by front-ends.
    pub fn rgb(self) -> u32 {
        match self {
            Self::Red => 0xE5_39_35,
            Self::Blue => 0x1E_88_E5,
            Self::Green => 0x43_A0_47,
            Self::Yellow => 0xFD_D8_35,
        }
    }

    /// Team label for this colour.
    pub fn label(self) -> String {
        format!("Team {}", self.name())
    }
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A player belonging to a team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Server-assigned identifier, absent before creation.
    pub id: Option<i64>,
    /// Display name, unique within a session regardless of case.
    pub name: String,
    /// Identifier of the owning team.
    pub team: Option<i64>,
    /// Points collected over the game.
    #[serde(default)]
    pub points_earned: i64,
}

impl Player {
    /// Player payload for a create request.
    pub fn new(name: impl Into<String>, team: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            team: Some(team),
            points_earned: 0,
        }
    }
}

/// How a word has to be conveyed to the guessing team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum WordCategory {
    Draw,
    Act,
    Describe,
}

impl WordCategory {
    /// Every category in board order.
    pub const ALL: [WordCategory; 3] = [Self::Draw, Self::Act, Self::Describe];

    /// Path segment used by the backend's category routes.
    pub fn as_path(self) -> &'static str {
        match self {
            Self::Draw => "DRAW",
            Self::Act => "ACT",
            Self::Describe => "DESCRIBE",
        }
    }
}

impl fmt::Display for WordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draw => "draw",
            Self::Act => "act",
            Self::Describe => "describe",
        };
        f.write_str(label)
    }
}

/// A word card from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Catalog identifier.
    pub id: Option<i64>,
    /// Text shown on the card.
    pub word: String,
    /// Pool the word is drawn from.
    pub category: WordCategory,
    /// Difficulty, also the number of fields a correct guess advances.
    pub points: i32,
}

/// Progress stage of a single team on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BoardStage {
    NotStarted,
    InProgress,
    Finished,
}

impl BoardStage {
    /// Stage for a board position.
    pub fn of(position: i32) -> Self {
        if position >= GOAL_POSITION {
            Self::Finished
        } else if position <= 0 {
            Self::NotStarted
        } else {
            Self::InProgress
        }
    }
}

/// Snapshot of the game currently being played or administered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSession {
    /// Game the session is scoped to.
    pub game_id: Option<i64>,
    /// Cached game record.
    pub game: Option<Game>,
    /// Cached teams, sorted by creation order once loaded.
    pub teams: Vec<Team>,
    /// Cached players of the session's teams.
    pub players: Vec<Player>,
    /// Words drawn during this session.
    pub used_word_ids: BTreeSet<i64>,
    /// Board position per team id.
    pub team_board_positions: BTreeMap<i64, i32>,
    /// Teams that reached the goal.
    pub finished_team_ids: BTreeSet<i64>,
    /// Index into the active-team list whose turn it is.
    pub current_team_index: Option<usize>,
}

impl GameSession {
    /// Empty session scoped to `game_id`.
    pub fn for_game(game_id: i64) -> Self {
        Self {
            game_id: Some(game_id),
            ..Self::default()
        }
    }

    /// Board position of a team, 0 when unknown.
    pub fn board_position(&self, team_id: i64) -> i32 {
        self.team_board_positions
            .get(&team_id)
            .copied()
            .unwrap_or(0)
    }

    /// Teams that have not reached the goal, in session order.
    pub fn active_teams(&self) -> Vec<Team> {
        self.teams
            .iter()
            .filter(|team| {
                team.id
                    .map(|id| !self.finished_team_ids.contains(&id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect()
    }

    /// Cached players of one team.
    pub fn players_for_team(&self, team_id: i64) -> Vec<Player> {
        self.players
            .iter()
            .filter(|player| player.team == Some(team_id))
            .cloned()
            .collect()
    }

    /// Case-insensitive name lookup among the session's players.
    pub fn has_player_named(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        self.players
            .iter()
            .any(|player| player.name.trim().to_lowercase() == needle)
    }
}
