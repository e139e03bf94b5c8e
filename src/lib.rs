//! A heuristic agent and opening-sequence optimiser for the board game 'Connect 4'
//!
//! The agent uses a depth-limited game tree search with alpha-beta pruning,
//! scoring truncated positions with a windowed positional heuristic. On top of
//! the search sit five difficulty tiers, and a genetic optimiser that evolves
//! scripted opening sequences by playing them against the search.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_engine::{board::*, difficulty::*};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! // the engine (Ai) to move, with three Player pieces stacked in column 4
//! let board = Board::from_moves("41424")?;
//! let column = Difficulty::Hard.select_move(&board, Piece::Ai, &mut rand::thread_rng())?;
//!
//! assert_eq!(column, 3);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod board;

pub mod heuristic;

pub mod minimax;

pub mod difficulty;

pub mod genetic;


/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

/// The number of tiles in a line needed to win
pub const CONNECT: usize = 4;

// a winning line has to fit on the board in both directions
const_assert!(WIDTH >= CONNECT && HEIGHT >= CONNECT);
// the centre column bonus needs a single middle column
const_assert!(WIDTH % 2 == 1);
