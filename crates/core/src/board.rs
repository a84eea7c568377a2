//! Board module - manages the game grid
//!
//! The board is a 10x20 grid where each cell can be empty or filled with a piece kind.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom)

use arrayvec::ArrayVec;

use crate::error::EngineError;
use crate::pieces::Piece;
use crate::types::{Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

const ROWS: usize = BOARD_HEIGHT as usize;
const COLS: usize = BOARD_WIDTH as usize;

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * COLS + (x as usize))
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if position is valid (within bounds and empty)
    pub fn is_valid(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(None))
    }

    /// Check if position is occupied (within bounds and filled)
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// True iff every cell of the piece is within bounds and unoccupied
    pub fn is_valid_position(&self, piece: &Piece) -> bool {
        piece.cells().iter().all(|&(x, y)| self.is_valid(x, y))
    }

    /// True iff a piece that was just spawned already collides with the stack
    pub fn is_game_over(&self, spawned: &Piece) -> bool {
        !self.is_valid_position(spawned)
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= ROWS {
            return false;
        }
        let start = y * COLS;
        self.cells[start..start + COLS].iter().all(|cell| cell.is_some())
    }

    /// Write the piece's cells into the grid.
    ///
    /// Locking a piece that is out of bounds or overlaps the stack is a caller bug:
    /// the grid is left untouched and `EngineError::InvalidLock` names the first
    /// offending cell.
    pub fn lock(&mut self, piece: &Piece) -> Result<(), EngineError> {
        let cells = piece.cells();
        if let Some(&(x, y)) = cells.iter().find(|&&(x, y)| !self.is_valid(x, y)) {
            return Err(EngineError::InvalidLock { x, y });
        }

        for (x, y) in cells {
            self.set(x, y, Some(piece.kind));
        }
        Ok(())
    }

    /// Remove every full row at once and return how many were removed
    pub fn clear_lines(&mut self) -> usize {
        self.clear_full_rows().len()
    }

    /// Clear all full rows and return the row indices that were cleared (sorted bottom to top)
    ///
    /// Remaining rows keep their relative order and drop by the number of cleared
    /// rows beneath them. Two-pointer compaction, no allocation.
    pub fn clear_full_rows(&mut self) -> ArrayVec<usize, ROWS> {
        let mut cleared_rows = ArrayVec::new();
        let mut write_y = ROWS;

        for read_y in (0..ROWS).rev() {
            if self.is_row_full(read_y) {
                cleared_rows.push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src_start = read_y * COLS;
                    let dst_start = write_y * COLS;
                    self.cells.copy_within(src_start..src_start + COLS, dst_start);
                }
            }
        }

        // Clear the remaining rows at the top
        for cell in &mut self.cells[..write_y * COLS] {
            *cell = None;
        }

        cleared_rows
    }

    /// Height of each column, measured from the floor to its topmost filled cell
    pub fn column_heights(&self) -> [u8; COLS] {
        let mut heights = [0u8; COLS];
        for (x, height) in heights.iter_mut().enumerate() {
            for y in 0..ROWS {
                if self.cells[y * COLS + x].is_some() {
                    *height = (ROWS - y) as u8;
                    break;
                }
            }
        }
        heights
    }

    /// Whether any cell in the top `rows` rows is filled
    pub fn has_blocks_above(&self, rows: usize) -> bool {
        let end = rows.min(ROWS) * COLS;
        self.cells[..end].iter().any(|cell| cell.is_some())
    }

    /// Number of filled cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Render into a `u8` grid (0 = empty, otherwise the kind's color id)
    pub fn write_u8_grid(&self, out: &mut [[u8; COLS]; ROWS]) {
        for (y, row) in out.iter_mut().enumerate() {
            for (x, value) in row.iter_mut().enumerate() {
                *value = self.cells[y * COLS + x].map_or(0, |kind| kind.color_id());
            }
        }
    }

    /// Build a board from text rows, top row first.
    ///
    /// Missing leading rows are empty. `.` or space is an empty cell, a kind letter
    /// (`I`, `O`, `T`, `S`, `Z`, `J`, `L`) fills with that kind and any other
    /// character fills with `I`. Returns `None` on too many rows or columns.
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        if rows.len() > ROWS {
            return None;
        }
        let mut board = Self::new();
        let offset = ROWS - rows.len();
        for (i, row) in rows.iter().enumerate() {
            if row.chars().count() > COLS {
                return None;
            }
            let y = (offset + i) as i8;
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '.' | ' ' => None,
                    other => Some(
                        PieceKind::from_str(&other.to_string()).unwrap_or(PieceKind::I),
                    ),
                };
                board.set(x as i8, y, cell);
            }
        }
        Some(board)
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
