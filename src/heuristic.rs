//! A windowed positional evaluation of Connect 4 boards

use rand::{seq::index::sample, seq::SliceRandom, Rng};

use crate::board::{Board, Orientation, Piece};
use crate::{HEIGHT, WIDTH};

/// Reward for a completed line of our own
pub const FOUR_SCORE: i32 = 100;
/// Reward for a line one move from completion
pub const THREE_SCORE: i32 = 5;
/// Reward for a half-built line with room to grow
pub const TWO_SCORE: i32 = 2;
/// Penalty for an opponent line one move from completion
pub const OPPONENT_THREE_SCORE: i32 = -4;
/// Reward for each of our pieces in the centre column
pub const CENTRE_SCORE: i32 = 3;

/// The centre column takes part in the most winning lines
pub const CENTRE_COLUMN: usize = WIDTH / 2;

/// A set of line orientations to include in an evaluation
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Directions(u8);

impl Directions {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    fn bit(orientation: Orientation) -> u8 {
        match orientation {
            Orientation::Horizontal => 0b0001,
            Orientation::Vertical => 0b0010,
            Orientation::DiagonalUp => 0b0100,
            Orientation::DiagonalDown => 0b1000,
        }
    }

    pub fn from_orientations(orientations: &[Orientation]) -> Self {
        Self(orientations.iter().fold(0, |mask, &o| mask | Self::bit(o)))
    }

    /// A uniformly chosen subset of two of the four orientations
    pub fn random_pair<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let picked: Vec<Orientation> = sample(rng, Orientation::ALL.len(), 2)
            .into_iter()
            .map(|i| Orientation::ALL[i])
            .collect();
        Self::from_orientations(&picked)
    }

    pub fn contains(self, orientation: Orientation) -> bool {
        self.0 & Self::bit(orientation) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for Directions {
    fn default() -> Self {
        Self::ALL
    }
}

fn score_window(window: &[Piece], piece: Piece) -> i32 {
    let opponent = piece.opponent();
    let own = window.iter().filter(|&&tile| tile == piece).count();
    let opp = window.iter().filter(|&&tile| tile == opponent).count();
    let empty = window.iter().filter(|tile| tile.is_empty()).count();

    let mut score = match (own, empty) {
        (4, _) => FOUR_SCORE,
        (3, 1) => THREE_SCORE,
        (2, 2) => TWO_SCORE,
        _ => 0,
    };
    if opp == 3 && empty == 1 {
        score += OPPONENT_THREE_SCORE;
    }
    score
}

/// Scores a board from the perspective of `piece`, higher is better for `piece`
///
/// Every window of four tiles along the included orientations is weighted by
/// how close it is to a line for either side. Pieces in the centre column
/// earn a bonus whatever the orientation mask.
pub fn evaluate(board: &Board, piece: Piece, directions: Directions) -> i32 {
    let mut score = (0..HEIGHT)
        .filter(|&row| board.get(row, CENTRE_COLUMN) == piece)
        .count() as i32
        * CENTRE_SCORE;

    for &orientation in Orientation::ALL.iter() {
        if directions.contains(orientation) {
            board.for_each_window(orientation, |window| {
                score += score_window(&window, piece);
            });
        }
    }
    score
}

/// Picks the column whose drop scores best for `piece` one ply ahead
///
/// The incumbent starts as a random valid column and is only replaced by a
/// strictly better one. Returns `None` on a full board.
pub fn pick_best_move<R: Rng + ?Sized>(
    board: &Board,
    piece: Piece,
    directions: Directions,
    rng: &mut R,
) -> Option<usize> {
    let valid_locations = board.valid_locations();
    let mut best_column = *valid_locations.choose(rng)?;
    let mut best_score = i32::MIN;

    for &column in valid_locations.iter() {
        let mut next = *board;
        next.play(column, piece);
        let score = evaluate(&next, piece, directions);
        if score > best_score {
            best_score = score;
            best_column = column;
        }
    }
    Some(best_column)
}
