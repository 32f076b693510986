//! Per-turn gameplay: category choice, word draw, countdown and scoring.

use std::{sync::Arc, time::Duration};

use rand::{seq::SliceRandom, Rng};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{debug, info};

use crate::{
    error::StoreResult,
    models::{Team, Word, WordCategory},
    store::SessionStore,
};

/// Category of the board field at `position`; the fields cycle draw, act, describe.
pub fn category_for_position(position: i32) -> WordCategory {
    match position.rem_euclid(3) {
        0 => WordCategory::Draw,
        1 => WordCategory::Act,
        _ => WordCategory::Describe,
    }
}

/// Category the team has to play next, based on its board position.
pub fn category_for_team(store: &SessionStore, team_id: i64) -> WordCategory {
    category_for_position(store.team_board_position(team_id))
}

/// Draw an unused word of `category`, preferring the requested difficulty.
///
/// Falls back to any unused word of the category when no word with the
/// requested points is left. The drawn word is marked used. Returns `None`
/// once the category is exhausted.
pub fn draw_word<R: Rng + ?Sized>(
    store: &SessionStore,
    category: WordCategory,
    points: Option<i32>,
    rng: &mut R,
) -> Option<Word> {
    store.claim_word(|available| {
        let pool: Vec<&Word> = available
            .iter()
            .filter(|word| word.category == category)
            .collect();
        let preferred: Vec<&Word> = match points {
            Some(points) => pool
                .iter()
                .copied()
                .filter(|word| word.points == points)
                .collect(),
            None => Vec::new(),
        };
        let candidates = if preferred.is_empty() { &pool } else { &preferred };
        candidates.choose(rng).map(|word| (*word).clone())
    })
}

/// Whether the team guessed the word before time ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The word was guessed.
    Guessed,
    /// Time ran out or the team gave up.
    Missed,
}

/// What happened when a turn was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    /// Board position of the playing team afterwards.
    pub position: i32,
    /// Whether the playing team has reached the goal.
    pub finished: bool,
    /// Team whose turn it is now, `None` when every team finished.
    pub next_team: Option<Team>,
}

/// Settle a turn: move the team on a guess, credit the explaining player,
/// then pass the turn on.
pub async fn resolve_turn(
    store: &SessionStore,
    team_id: i64,
    word: &Word,
    outcome: TurnOutcome,
    scorer: Option<i64>,
) -> StoreResult<TurnResult> {
    let position = match outcome {
        TurnOutcome::Guessed => {
            let position = store.advance_team(team_id, word.points)?;
            if let Some(player_id) = scorer {
                store.award_points(player_id, i64::from(word.points)).await?;
            }
            position
        }
        TurnOutcome::Missed => store.team_board_position(team_id),
    };
    let finished = store.is_team_finished(team_id);
    info!(team_id, word = %word.word, ?outcome, position, finished, "turn resolved");

    let next_team = store.advance_to_next_team();
    Ok(TurnResult {
        position,
        finished,
        next_team,
    })
}

/// Lifecycle of a [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Ticking.
    Running,
    /// Stopped before reaching zero.
    Stopped,
    /// Reached zero.
    Expired,
}

/// Published countdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    /// Whole seconds left.
    pub remaining: u32,
    /// Current phase.
    pub phase: TimerPhase,
}

/// Turn timer ticking once per second on a background task.
///
/// The timer is only ever cancelled through [`Countdown::stop`] (or by
/// dropping it); nothing else in the session cancels it.
pub struct Countdown {
    state: Arc<watch::Sender<CountdownState>>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Start counting down from `seconds`. Must be called within a tokio runtime.
    pub fn start(seconds: u32) -> Self {
        let phase = if seconds == 0 {
            TimerPhase::Expired
        } else {
            TimerPhase::Running
        };
        let (sender, _) = watch::channel(CountdownState {
            remaining: seconds,
            phase,
        });
        let state = Arc::new(sender);
        let ticker_state = state.clone();
        let task = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = time::interval_at(Instant::now() + period, period);
            let mut remaining = seconds;
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                let still_running = ticker_state.send_if_modified(|state| {
                    if state.phase != TimerPhase::Running {
                        return false;
                    }
                    state.remaining = remaining;
                    if remaining == 0 {
                        state.phase = TimerPhase::Expired;
                    }
                    true
                });
                if !still_running {
                    return;
                }
            }
            debug!("countdown expired");
        });
        Self { state, task }
    }

    /// Current state.
    pub fn state(&self) -> CountdownState {
        *self.state.borrow()
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.state().remaining
    }

    /// Whether the countdown reached zero.
    pub fn is_expired(&self) -> bool {
        self.state().phase == TimerPhase::Expired
    }

    /// Receiver observing every tick.
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.state.subscribe()
    }

    /// Stop the countdown, keeping the remaining time.
    pub fn stop(&self) {
        self.task.abort();
        self.state.send_if_modified(|state| {
            if state.phase == TimerPhase::Running {
                state.phase = TimerPhase::Stopped;
                true
            } else {
                false
            }
        });
    }

    /// Wait until the countdown expires or is stopped and return the final state.
    pub async fn finished(&self) -> CountdownState {
        let mut receiver = self.state.subscribe();
        let result = receiver
            .wait_for(|state| state.phase != TimerPhase::Running)
            .await
            .map(|state| *state);
        // The sender lives in `self`, so the channel cannot close while we wait.
        result.unwrap_or_else(|_| self.state())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}
