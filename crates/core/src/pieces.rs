//! Pieces module - Tetromino shapes, the active piece, and clockwise rotation
//!
//! Every orientation is stored as four mino offsets inside a 4x4 box whose
//! top row is always occupied, so a freshly spawned piece sits exactly on
//! board row 0 and can rotate there.
//!
//! Rotation uses a small fixed kick list instead of per-kind kick tables:
//! the rotated shape is tried in place, then one column left, one column
//! right, and finally one row up. The first position that fits wins.

use crate::board::Board;
use crate::types::{PieceKind, Rotation, SPAWN_X};

/// Offset of a single mino relative to piece origin
pub type MinoOffset = (i8, i8);

/// Shape of a piece - 4 mino offsets from piece origin
pub type PieceShape = [MinoOffset; 4];

/// Kick candidates tried in order when rotating: in place, left, right, up
pub const ROTATION_KICKS: [(i8, i8); 4] = [(0, 0), (-1, 0), (1, 0), (0, -1)];

/// Spawn position for new pieces (x, y)
pub const SPAWN_POSITION: (i8, i8) = (SPAWN_X, 0);

/// Get the shape (mino offsets) for a piece kind and rotation
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    match kind {
        PieceKind::I => get_i_shape(rotation),
        PieceKind::O => get_o_shape(rotation),
        PieceKind::T => get_t_shape(rotation),
        PieceKind::S => get_s_shape(rotation),
        PieceKind::Z => get_z_shape(rotation),
        PieceKind::J => get_j_shape(rotation),
        PieceKind::L => get_l_shape(rotation),
    }
}

/// I piece shapes
fn get_i_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(0, 0), (1, 0), (2, 0), (3, 0)],
        // E: vertical, right of center
        Rotation::East => [(2, 0), (2, 1), (2, 2), (2, 3)],
        Rotation::South => [(0, 0), (1, 0), (2, 0), (3, 0)],
        // W: vertical, left of center
        Rotation::West => [(1, 0), (1, 1), (1, 2), (1, 3)],
    }
}

/// O piece shapes (same for all rotations)
fn get_o_shape(_rotation: Rotation) -> PieceShape {
    [(1, 0), (2, 0), (1, 1), (2, 1)]
}

/// T piece shapes
fn get_t_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(1, 0), (0, 1), (1, 1), (2, 1)],
        Rotation::East => [(1, 0), (1, 1), (2, 1), (1, 2)],
        Rotation::South => [(0, 0), (1, 0), (2, 0), (1, 1)],
        Rotation::West => [(1, 0), (0, 1), (1, 1), (1, 2)],
    }
}

/// S piece shapes
fn get_s_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North | Rotation::South => [(1, 0), (2, 0), (0, 1), (1, 1)],
        Rotation::East => [(1, 0), (1, 1), (2, 1), (2, 2)],
        Rotation::West => [(0, 0), (0, 1), (1, 1), (1, 2)],
    }
}

/// Z piece shapes
fn get_z_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North | Rotation::South => [(0, 0), (1, 0), (1, 1), (2, 1)],
        Rotation::East => [(2, 0), (1, 1), (2, 1), (1, 2)],
        Rotation::West => [(1, 0), (0, 1), (1, 1), (0, 2)],
    }
}

/// J piece shapes
fn get_j_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(0, 0), (0, 1), (1, 1), (2, 1)],
        Rotation::East => [(1, 0), (2, 0), (1, 1), (1, 2)],
        Rotation::South => [(0, 0), (1, 0), (2, 0), (2, 1)],
        Rotation::West => [(1, 0), (1, 1), (0, 2), (1, 2)],
    }
}

/// L piece shapes
fn get_l_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(2, 0), (0, 1), (1, 1), (2, 1)],
        Rotation::East => [(1, 0), (1, 1), (1, 2), (2, 2)],
        Rotation::South => [(0, 0), (1, 0), (2, 0), (0, 1)],
        Rotation::West => [(0, 0), (1, 0), (1, 1), (1, 2)],
    }
}

/// Try to rotate a piece clockwise with the fixed kick list
///
/// Returns `Some(new_shape, new_rotation, kick_offset)` if successful, `None` if
/// every kick fails or the piece has a single orientation.
pub fn try_rotate(
    kind: PieceKind,
    rotation: Rotation,
    x: i8,
    y: i8,
    is_valid: impl Fn(i8, i8) -> bool,
) -> Option<(PieceShape, Rotation, (i8, i8))> {
    if kind.orientations() < 2 {
        return None;
    }

    let new_rotation = rotation.rotate_cw();
    let new_shape = get_shape(kind, new_rotation);

    for &(dx, dy) in ROTATION_KICKS.iter() {
        let new_x = x + dx;
        let new_y = y + dy;

        let valid = new_shape
            .iter()
            .all(|&(mx, my)| is_valid(new_x + mx, new_y + my));

        if valid {
            return Some((new_shape, new_rotation, (dx, dy)));
        }
    }

    None
}

/// A piece placed on (or about to enter) the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl Piece {
    /// Create a new piece at the spawn position, rotation state zero
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            x: SPAWN_POSITION.0,
            y: SPAWN_POSITION.1,
        }
    }

    /// Get the shape (mino offsets) for current rotation
    pub fn shape(&self) -> PieceShape {
        get_shape(self.kind, self.rotation)
    }

    /// Board coordinates of the four minos
    pub fn cells(&self) -> [(i8, i8); 4] {
        self.shape().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    /// Copy of this piece translated by (dx, dy)
    pub fn shifted(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Check if all minos are at valid positions on the board
    pub fn is_valid(&self, board: &Board) -> bool {
        board.is_valid_position(self)
    }

    /// Check if the piece is grounded (resting on the stack or the floor)
    pub fn is_grounded(&self, board: &Board) -> bool {
        !self.shifted(0, 1).is_valid(board)
    }

    /// How many rows the piece can fall before it rests
    pub fn drop_distance(&self, board: &Board) -> i8 {
        let mut distance: i8 = 0;
        while self.shifted(0, distance + 1).is_valid(board) {
            distance += 1;
        }
        distance
    }

    /// Copy of this piece at its resting row
    pub fn dropped(&self, board: &Board) -> Self {
        self.shifted(0, self.drop_distance(board))
    }

    /// Clockwise rotation with kicks, or `None` if it has no valid result
    pub fn rotated_cw(&self, board: &Board) -> Option<Self> {
        try_rotate(self.kind, self.rotation, self.x, self.y, |x, y| {
            board.is_valid(x, y)
        })
        .map(|(_shape, rotation, (dx, dy))| Self {
            rotation,
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        })
    }

    /// Horizontal extent of the current shape as (min dx, max dx)
    pub fn column_span(&self) -> (i8, i8) {
        let shape = self.shape();
        let mut min_dx = i8::MAX;
        let mut max_dx = i8::MIN;
        for (dx, _) in shape {
            min_dx = min_dx.min(dx);
            max_dx = max_dx.max(dx);
        }
        (min_dx, max_dx)
    }
}
