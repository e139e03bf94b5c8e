//! A depth-limited minimax search with alpha-beta pruning

use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use crate::board::{Board, Piece};
use crate::heuristic::{evaluate, Directions};

/// Stands in for an infinite score: a won position for the maximizing side
pub const INFINITY: i32 = i32::MAX;

/// An agent that searches the game tree to a fixed depth
///
/// # Notes
/// The maximizing side is given at construction and the minimizing side is its
/// opponent. Terminal positions score `INFINITY` / `-INFINITY` for a win / loss
/// and 0 for a full board; positions at the depth limit are scored by the
/// heuristic from the maximizing side's perspective.
///
/// # Tie-breaking
/// Before any child is explored the best column is a uniformly random valid
/// column, and it is only replaced by a strictly better child. A node where
/// every explored child equals the starting bound, or which is cut before an
/// improving child is seen, keeps that random column.
pub struct Minimax<'r, R: Rng + ?Sized> {
    maximizing_piece: Piece,
    pruning: bool,
    rng: &'r mut R,

    /// The number of nodes searched by this `Minimax` so far (for diagnostics only)
    pub node_count: usize,
}

impl<'r, R: Rng + ?Sized> Minimax<'r, R> {
    /// Creates a new searcher maximizing for `maximizing_piece`
    pub fn new(maximizing_piece: Piece, rng: &'r mut R) -> Self {
        Self {
            maximizing_piece,
            pruning: true,
            rng,
            node_count: 0,
        }
    }

    /// Disables alpha-beta cutoffs so that every node to the depth limit is visited
    pub fn without_pruning(mut self) -> Self {
        self.pruning = false;
        self
    }

    pub fn maximizing_piece(&self) -> Piece {
        self.maximizing_piece
    }

    /// Searches from `board` with a full window, returning the best column and its score
    pub fn best_move(&mut self, board: &Board, depth: usize) -> (Option<usize>, i32) {
        let nodes_before = self.node_count;
        let result = self.search(board, depth, -INFINITY, INFINITY, true);
        debug!(
            depth,
            column = ?result.0,
            score = result.1,
            nodes = self.node_count - nodes_before,
            "minimax search complete"
        );
        result
    }

    /// Performs game tree search
    ///
    /// Returns the chosen column, which is `None` at a terminal or depth-limited
    /// node, and the backed-up score of the position.
    pub fn search(
        &mut self,
        board: &Board,
        depth: usize,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> (Option<usize>, i32) {
        self.node_count += 1;

        let minimizing_piece = self.maximizing_piece.opponent();
        let valid_locations = board.valid_locations();

        // terminal positions first, then the depth limit
        if board.is_game_over(self.maximizing_piece) {
            return (None, INFINITY);
        }
        if board.is_game_over(minimizing_piece) {
            return (None, -INFINITY);
        }
        if valid_locations.is_empty() {
            return (None, 0);
        }
        if depth == 0 {
            return (None, evaluate(board, self.maximizing_piece, Directions::ALL));
        }

        // the random incumbent, only a strictly better child replaces it
        let mut column = valid_locations.choose(&mut *self.rng).copied();

        if maximizing {
            let mut value = -INFINITY;
            for &c in valid_locations.iter() {
                let mut next = *board;
                next.play(c, self.maximizing_piece);
                let (_, score) = self.search(&next, depth - 1, alpha, beta, false);

                if score > value {
                    value = score;
                    column = Some(c);
                }
                alpha = alpha.max(value);
                if self.pruning && alpha >= beta {
                    break;
                }
            }
            (column, value)
        } else {
            let mut value = INFINITY;
            for &c in valid_locations.iter() {
                let mut next = *board;
                next.play(c, minimizing_piece);
                let (_, score) = self.search(&next, depth - 1, alpha, beta, true);

                if score < value {
                    value = score;
                    column = Some(c);
                }
                beta = beta.min(value);
                if self.pruning && alpha >= beta {
                    break;
                }
            }
            (column, value)
        }
    }
}
