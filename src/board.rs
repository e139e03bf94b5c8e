use anyhow::{anyhow, Result};
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::fmt;
use std::io::{stdout, Write};

use crate::{CONNECT, HEIGHT, WIDTH};

/// The contents of a single tile
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Piece {
    Empty,
    Player,
    Ai,
}

impl Piece {
    /// The adversary of this piece, `Empty` has no adversary
    pub fn opponent(self) -> Self {
        match self {
            Piece::Player => Piece::Ai,
            Piece::Ai => Piece::Player,
            Piece::Empty => Piece::Empty,
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Piece::Empty)
    }
}

impl Default for Piece {
    fn default() -> Self {
        Piece::Empty
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GameState {
    Playing,
    Won(Piece),
    Draw,
}

/// The four line orientations a run of tiles can take
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Orientation {
    Horizontal,
    Vertical,
    /// bottom-left to top-right
    DiagonalUp,
    /// top-left to bottom-right
    DiagonalDown,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Horizontal,
        Orientation::Vertical,
        Orientation::DiagonalUp,
        Orientation::DiagonalDown,
    ];

    /// Row and column step between consecutive tiles of a window
    fn step(self) -> (isize, isize) {
        match self {
            Orientation::Horizontal => (0, 1),
            Orientation::Vertical => (1, 0),
            Orientation::DiagonalUp => (-1, 1),
            Orientation::DiagonalDown => (1, 1),
        }
    }
}

/// A Connect 4 grid stored row by row, row 0 being the top of the board
///
/// The board is a plain value: copying it is cheap and the search relies on
/// every branch owning its own copy.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Board {
    cells: [[Piece; WIDTH]; HEIGHT],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[Piece::Empty; WIDTH]; HEIGHT],
        }
    }

    /// Builds a board from a string of 1-indexed column digits, alternating
    /// `Player` and `Ai` starting with `Player`
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();
        let mut piece = Piece::Player;

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    let column = column - 1;
                    if !board.is_valid_location(column) {
                        return Err(anyhow!("Invalid move, column {} full", column + 1));
                    }
                    let row = board.next_open_row(column);
                    board.drop_piece(row, column, piece);
                    piece = piece.opponent();
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(board)
    }

    pub fn get(&self, row: usize, column: usize) -> Piece {
        self.cells[row][column]
    }

    /// A column can take another piece while its top tile is empty
    pub fn is_valid_location(&self, column: usize) -> bool {
        column < WIDTH && self.cells[0][column].is_empty()
    }

    /// The lowest empty row of a column
    ///
    /// # Panics
    /// Panics if the column is full, check `is_valid_location` first
    pub fn next_open_row(&self, column: usize) -> usize {
        match (0..HEIGHT).rev().find(|&row| self.cells[row][column].is_empty()) {
            Some(row) => row,
            None => panic!("no open row in full column {}", column),
        }
    }

    /// Places a piece without re-checking bounds or occupancy
    pub fn drop_piece(&mut self, row: usize, column: usize, piece: Piece) {
        self.cells[row][column] = piece;
    }

    /// Drops a piece into the lowest empty row of a valid column, returning the row
    pub fn play(&mut self, column: usize, piece: Piece) -> usize {
        let row = self.next_open_row(column);
        self.drop_piece(row, column, piece);
        row
    }

    /// All playable columns in ascending order, empty when the board is full
    pub fn valid_locations(&self) -> Vec<usize> {
        (0..WIDTH).filter(|&c| self.is_valid_location(c)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells[0].iter().all(|cell| !cell.is_empty())
    }

    pub fn piece_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    /// Calls `f` with every line of `CONNECT` tiles in the given orientation
    pub fn for_each_window<F: FnMut([Piece; CONNECT])>(&self, orientation: Orientation, mut f: F) {
        let (d_row, d_col) = orientation.step();
        for row in 0..HEIGHT as isize {
            for col in 0..WIDTH as isize {
                let end_row = row + d_row * (CONNECT as isize - 1);
                let end_col = col + d_col * (CONNECT as isize - 1);
                if end_row < 0 || end_row >= HEIGHT as isize || end_col >= WIDTH as isize {
                    continue;
                }
                let mut window = [Piece::Empty; CONNECT];
                for (i, tile) in window.iter_mut().enumerate() {
                    let r = row + d_row * i as isize;
                    let c = col + d_col * i as isize;
                    *tile = self.cells[r as usize][c as usize];
                }
                f(window);
            }
        }
    }

    /// Whether `piece` has `CONNECT` tiles in a row anywhere on the board
    pub fn is_game_over(&self, piece: Piece) -> bool {
        if piece.is_empty() {
            return false;
        }
        let mut won = false;
        for &orientation in Orientation::ALL.iter() {
            self.for_each_window(orientation, |window| {
                won |= window.iter().all(|&tile| tile == piece);
            });
            if won {
                return true;
            }
        }
        false
    }

    pub fn state(&self) -> GameState {
        if self.is_game_over(Piece::Player) {
            GameState::Won(Piece::Player)
        } else if self.is_game_over(Piece::Ai) {
            GameState::Won(Piece::Ai)
        } else if self.is_full() {
            GameState::Draw
        } else {
            GameState::Playing
        }
    }

    /// Plays a 1-indexed column for `piece`, validating the move first
    pub fn play_checked(&mut self, column_one_indexed: usize, piece: Piece) -> Result<GameState> {
        if column_one_indexed < 1 || column_one_indexed > WIDTH {
            return Err(anyhow!(
                "Invalid move, column {} out of range. Columns must be between 1 and {}",
                column_one_indexed,
                WIDTH
            ));
        }
        if piece.is_empty() {
            return Err(anyhow!("Invalid move, cannot drop an empty tile"));
        }
        if self.state() != GameState::Playing {
            return Err(anyhow!("Invalid move, game is over"));
        }
        let column = column_one_indexed - 1;
        if !self.is_valid_location(column) {
            return Err(anyhow!("Invalid move, column {} full", column_one_indexed));
        }

        self.play(column, piece);
        Ok(self.state())
    }

    /// The board as seen by `viewer` in fog of war: only its own pieces show
    pub fn fogged(&self, viewer: Piece) -> Self {
        let mut board = *self;
        for cell in board.cells.iter_mut().flat_map(|row| row.iter_mut()) {
            if *cell != viewer {
                *cell = Piece::Empty;
            }
        }
        board
    }

    pub fn display(&self) -> Result<()> {
        let mut stdout = stdout();

        let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
        stdout.queue(PrintStyledContent(style(cols + "\n")))?;
        for row in self.cells.iter() {
            for cell in row.iter() {
                stdout.queue(PrintStyledContent(
                    style("O")
                        .attribute(Attribute::Bold)
                        .on(Color::DarkBlue)
                        .with(match cell {
                            Piece::Player => Color::Red,
                            Piece::Ai => Color::Yellow,
                            Piece::Empty => Color::DarkBlue,
                        }),
                ))?;
            }
            stdout.queue(PrintStyledContent(style("\n")))?;
        }
        stdout.flush()?;
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.iter() {
            for cell in row.iter() {
                let c = match cell {
                    Piece::Player => 'X',
                    Piece::Ai => 'O',
                    Piece::Empty => '.',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
