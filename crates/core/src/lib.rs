#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Activity party game client.
//!
//! This crate hosts the data models, configuration handling, the backend
//! client, the session store that caches the game being played, and the
//! team-setup and per-turn gameplay rules used by front-ends.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod setup;
pub mod store;
pub mod turn;

pub use api::{ActivityApi, HttpApi, MemoryApi};
pub use config::{AppConfig, BackendKind};
pub use error::{RemoteError, StoreError, StoreResult, ValidationError};
pub use models::{
    BoardStage, Game, GameSession, Player, Team, TeamColor, Word, WordCategory, GOAL_POSITION,
};
pub use setup::RosterDraft;
pub use store::SessionStore;
pub use turn::{Countdown, TurnOutcome};
