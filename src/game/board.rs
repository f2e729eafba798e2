//! Board model: a fixed 10x10 grid of tiles
//!
//! Every occupied cell carries its own [`TileStatus`]. Locked tiles come from
//! earlier turns and never move; pending tiles were placed during the turn in
//! progress and can still be moved or sent back to the rack. The set of
//! pending cells is always derived from the grid, never tracked on the side.

use std::collections::BTreeMap;
use thiserror::Error;

/// Width and height of the board.
pub const BOARD_SIZE: usize = 10;

/// Sparse persisted form of the board: `"row,col"` -> letter, occupied cells only.
pub type SparseBoard = BTreeMap<String, char>;

/// A rejected board or rack mutation. The board is unchanged when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("cell ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("cell ({row}, {col}) is already occupied")]
    Occupied { row: usize, col: usize },
    #[error("cell ({row}, {col}) has no tile placed this turn")]
    NotPending { row: usize, col: usize },
    #[error("rack has no letter at index {index}")]
    RackIndex { index: usize },
}

/// A sparse board that cannot be rebuilt into a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("malformed board key {0:?}")]
    MalformedKey(String),
    #[error("board key {key:?} is outside the {size}x{size} grid", size = BOARD_SIZE)]
    OutOfBounds { key: String },
}

/// A cell coordinate, always inside the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    /// Validate a coordinate pair.
    pub fn new(row: usize, col: usize) -> Result<Self, PlacementError> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Ok(Self { row, col })
        } else {
            Err(PlacementError::OutOfBounds { row, col })
        }
    }

    /// The persisted key for this cell.
    pub fn key(&self) -> String {
        format!("{},{}", self.row, self.col)
    }

    /// Parse a `"row,col"` key.
    pub fn from_key(key: &str) -> Result<Self, BoardError> {
        let malformed = || BoardError::MalformedKey(key.to_string());
        let (row, col) = key.split_once(',').ok_or_else(malformed)?;
        let row: usize = row.trim().parse().map_err(|_| malformed())?;
        let col: usize = col.trim().parse().map_err(|_| malformed())?;
        Self::new(row, col).map_err(|_| BoardError::OutOfBounds {
            key: key.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileStatus {
    /// Committed in an earlier turn.
    Locked,
    /// Placed during the turn in progress.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub letter: char,
    pub status: TileStatus,
}

/// Letter contents of a board with no placement status.
///
/// This is what a turn-start snapshot holds and what word extraction reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterGrid {
    cells: [[Option<char>; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for LetterGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl LetterGrid {
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<char> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    pub fn set(&mut self, pos: Position, letter: Option<char>) {
        self.cells[pos.row][pos.col] = letter;
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }
}

/// The playing grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Tile>; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn tile(&self, pos: Position) -> Option<Tile> {
        self.cells[pos.row][pos.col]
    }

    pub fn letter_at(&self, pos: Position) -> Option<char> {
        self.tile(pos).map(|t| t.letter)
    }

    pub fn is_pending(&self, pos: Position) -> bool {
        matches!(
            self.tile(pos),
            Some(Tile {
                status: TileStatus::Pending,
                ..
            })
        )
    }

    /// Put a letter on an empty cell as a pending tile.
    pub fn place(
        &mut self,
        row: usize,
        col: usize,
        letter: char,
    ) -> Result<Position, PlacementError> {
        let pos = Position::new(row, col)?;
        if self.tile(pos).is_some() {
            return Err(PlacementError::Occupied { row, col });
        }
        self.cells[row][col] = Some(Tile {
            letter,
            status: TileStatus::Pending,
        });
        Ok(pos)
    }

    /// Move a pending tile to another empty cell. Moving onto itself is a no-op.
    pub fn move_tile(
        &mut self,
        from_row: usize,
        from_col: usize,
        to_row: usize,
        to_col: usize,
    ) -> Result<Position, PlacementError> {
        let from = Position::new(from_row, from_col)?;
        let to = Position::new(to_row, to_col)?;
        if !self.is_pending(from) {
            return Err(PlacementError::NotPending {
                row: from_row,
                col: from_col,
            });
        }
        if from == to {
            return Ok(to);
        }
        if self.tile(to).is_some() {
            return Err(PlacementError::Occupied {
                row: to_row,
                col: to_col,
            });
        }
        self.cells[to.row][to.col] = self.cells[from.row][from.col].take();
        Ok(to)
    }

    /// Lift a pending tile off the board, handing its letter back for the rack.
    pub fn return_to_rack(&mut self, row: usize, col: usize) -> Result<char, PlacementError> {
        let pos = Position::new(row, col)?;
        if !self.is_pending(pos) {
            return Err(PlacementError::NotPending { row, col });
        }
        self.cells[row][col]
            .take()
            .map(|tile| tile.letter)
            .ok_or(PlacementError::NotPending { row, col })
    }

    /// Turn every pending tile into a locked one. Returns how many were locked.
    pub fn lock_all_pending(&mut self) -> usize {
        let mut locked = 0;
        for tile in self.cells.iter_mut().flatten().flatten() {
            if tile.status == TileStatus::Pending {
                tile.status = TileStatus::Locked;
                locked += 1;
            }
        }
        locked
    }

    /// Remove every pending tile, returning the letters in board order.
    pub fn take_pending(&mut self) -> Vec<char> {
        let mut letters = Vec::new();
        for cell in self.cells.iter_mut().flatten() {
            if matches!(cell, Some(t) if t.status == TileStatus::Pending) {
                if let Some(tile) = cell.take() {
                    letters.push(tile.letter);
                }
            }
        }
        letters
    }

    /// Coordinates of tiles placed this turn, row-major.
    pub fn pending_positions(&self) -> Vec<Position> {
        Self::positions()
            .filter(|&pos| self.is_pending(pos))
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        Self::positions().any(|pos| self.is_pending(pos))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied_count() == BOARD_SIZE * BOARD_SIZE
    }

    /// Deep copy of the letter contents, used as the turn-start snapshot.
    pub fn snapshot(&self) -> LetterGrid {
        let mut grid = LetterGrid::empty();
        for pos in Self::positions() {
            grid.set(pos, self.letter_at(pos));
        }
        grid
    }

    /// Rebuild the board from a snapshot. Every tile comes back locked.
    pub fn restore_from(snapshot: &LetterGrid) -> Self {
        let mut board = Self::new();
        for pos in Self::positions() {
            board.cells[pos.row][pos.col] = snapshot.get(pos.row, pos.col).map(|letter| Tile {
                letter,
                status: TileStatus::Locked,
            });
        }
        board
    }

    /// Occupied cells only, keyed `"row,col"`.
    pub fn to_sparse_map(&self) -> SparseBoard {
        Self::positions()
            .filter_map(|pos| self.letter_at(pos).map(|letter| (pos.key(), letter)))
            .collect()
    }

    /// Rebuild a full board from its sparse form. Unmapped cells are empty;
    /// mapped cells are locked.
    pub fn from_sparse_map(map: &SparseBoard) -> Result<Self, BoardError> {
        let mut board = Self::new();
        for (key, &letter) in map {
            let pos = Position::from_key(key)?;
            board.cells[pos.row][pos.col] = Some(Tile {
                letter,
                status: TileStatus::Locked,
            });
        }
        Ok(board)
    }

    fn positions() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Position { row, col }))
    }
}
