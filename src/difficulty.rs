//! Difficulty tiers and the move-selection entry point used by game loops

use anyhow::{anyhow, bail, Result};
use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::board::{Board, GameState, Piece};
use crate::heuristic::{pick_best_move, Directions};
use crate::minimax::Minimax;

/// Base pause before an engine move is revealed
pub const THINKING_TIME: Duration = Duration::from_millis(500);

/// A named level of play, from random moves up to a deep search
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Difficulty {
    Easy,
    Intermediate,
    Hard,
    Impossible,
    Godmode,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Intermediate,
        Difficulty::Hard,
        Difficulty::Impossible,
        Difficulty::Godmode,
    ];

    /// Search depth of the minimax tiers, `None` for tiers that don't search
    pub fn depth(self) -> Option<usize> {
        match self {
            Difficulty::Easy | Difficulty::Intermediate => None,
            Difficulty::Hard => Some(4),
            Difficulty::Impossible => Some(6),
            Difficulty::Godmode => Some(7),
        }
    }

    /// Artificial pause before the move is played
    ///
    /// The deeper tiers take long enough to search on their own.
    pub fn think_time(self) -> Option<Duration> {
        match self {
            Difficulty::Easy => Some(THINKING_TIME + Duration::from_millis(1000)),
            Difficulty::Intermediate => Some(THINKING_TIME + Duration::from_millis(1200)),
            Difficulty::Hard => Some(THINKING_TIME + Duration::from_millis(1500)),
            Difficulty::Impossible | Difficulty::Godmode => None,
        }
    }

    /// Chooses a valid column for `piece` without any artificial pause
    ///
    /// Returns an error if the game is already over.
    pub fn select_move<R: Rng + ?Sized>(self, board: &Board, piece: Piece, rng: &mut R) -> Result<usize> {
        if piece.is_empty() {
            bail!("cannot choose a move for an empty tile");
        }
        match board.state() {
            GameState::Playing => {}
            state => bail!("cannot choose a move, game is over ({:?})", state),
        }

        let column = match self {
            Difficulty::Easy => board.valid_locations().choose(rng).copied(),
            Difficulty::Intermediate => {
                let directions = Directions::random_pair(rng);
                pick_best_move(board, piece, directions, rng)
            }
            Difficulty::Hard | Difficulty::Impossible | Difficulty::Godmode => {
                let depth = self.depth().unwrap_or_default();
                let mut minimax = Minimax::new(piece, &mut *rng);
                minimax.best_move(board, depth).0
            }
        }
        .ok_or_else(|| anyhow!("no valid column to play"))?;

        debug!(difficulty = %self, column, "engine move selected");
        Ok(column)
    }
}

/// Chooses the engine's next column at the given tier, pausing for the tier's think time
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    difficulty: Difficulty,
    piece: Piece,
    rng: &mut R,
) -> Result<usize> {
    if let Some(pause) = difficulty.think_time() {
        std::thread::sleep(pause);
    }
    difficulty.select_move(board, piece, rng)
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "EASY",
            Difficulty::Intermediate => "INTERMEDIATE",
            Difficulty::Hard => "HARD",
            Difficulty::Impossible => "IMPOSSIBLE",
            Difficulty::Godmode => "GODMODE",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    /// Accepts a tier name in any case, or its number from 1 to 5
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(level @ 1..=5) = s.parse::<usize>() {
            return Ok(Self::ALL[level - 1]);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("unknown difficulty '{}'", s))
    }
}
