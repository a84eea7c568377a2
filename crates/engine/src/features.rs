//! Board features scored by the planner
//!
//! Computed on a locked board after line clears. One column scan, no allocation.

use autotris_core::Board;

use crate::types::BOARD_HEIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardFeatures {
    /// Sum of all column heights
    pub aggregate_height: u32,
    /// Sum of absolute height differences between neighbouring columns
    pub bumpiness: u32,
    /// Empty cells with a filled cell somewhere above them in the same column
    pub holes: u32,
    pub max_height: u32,
}

pub fn compute_features(board: &Board) -> BoardFeatures {
    let heights = board.column_heights();

    let mut features = BoardFeatures::default();
    for &h in &heights {
        features.aggregate_height += h as u32;
        features.max_height = features.max_height.max(h as u32);
    }
    features.bumpiness = bumpiness(&heights);
    features.holes = count_holes(board, &heights);
    features
}

pub fn bumpiness(heights: &[u8]) -> u32 {
    heights
        .windows(2)
        .map(|pair| (pair[0] as i32 - pair[1] as i32).unsigned_abs())
        .sum()
}

/// Holes below each column's top cell
pub fn count_holes(board: &Board, heights: &[u8]) -> u32 {
    let rows = BOARD_HEIGHT as i8;
    let mut holes = 0u32;
    for (x, &h) in heights.iter().enumerate() {
        if h == 0 {
            continue;
        }
        let top = rows - h as i8;
        for y in (top + 1)..rows {
            if !board.is_occupied(x as i8, y) {
                holes += 1;
            }
        }
    }
    holes
}
