//! Pieces module - shape catalogue and the falling piece
//!
//! Offsets are (row, col) relative to the piece anchor, rows growing upwards,
//! so every shape hangs at or below its anchor row. Rotation is in place
//! within the shape's bounding box; there are no wall kicks.

use crate::board::Board;
use crate::types::{Orientation, ShapeId};

/// Offset of one cell from the piece anchor: (row, col).
pub type CellOffset = (i8, i8);

/// The four cells of a piece in one orientation.
pub type PieceShape = [CellOffset; 4];

/// Cell offsets for a shape in a given orientation.
pub fn shape_cells(shape: ShapeId, orientation: Orientation) -> PieceShape {
    let table = match shape {
        ShapeId::I => &I_SHAPES,
        ShapeId::O => &O_SHAPES,
        ShapeId::T => &T_SHAPES,
        ShapeId::S => &S_SHAPES,
        ShapeId::Z => &Z_SHAPES,
        ShapeId::J => &J_SHAPES,
        ShapeId::L => &L_SHAPES,
    };
    table[orientation.index()]
}

const I_SHAPES: [PieceShape; 4] = [
    [(-1, 0), (-1, 1), (-1, 2), (-1, 3)],
    [(0, 2), (-1, 2), (-2, 2), (-3, 2)],
    [(-2, 0), (-2, 1), (-2, 2), (-2, 3)],
    [(0, 1), (-1, 1), (-2, 1), (-3, 1)],
];

const O_SHAPES: [PieceShape; 4] = [[(0, 1), (0, 2), (-1, 1), (-1, 2)]; 4];

const T_SHAPES: [PieceShape; 4] = [
    [(0, 1), (-1, 0), (-1, 1), (-1, 2)],
    [(0, 1), (-1, 1), (-1, 2), (-2, 1)],
    [(-1, 0), (-1, 1), (-1, 2), (-2, 1)],
    [(0, 1), (-1, 0), (-1, 1), (-2, 1)],
];

const S_SHAPES: [PieceShape; 4] = [
    [(0, 1), (0, 2), (-1, 0), (-1, 1)],
    [(0, 1), (-1, 1), (-1, 2), (-2, 2)],
    [(-1, 1), (-1, 2), (-2, 0), (-2, 1)],
    [(0, 0), (-1, 0), (-1, 1), (-2, 1)],
];

const Z_SHAPES: [PieceShape; 4] = [
    [(0, 0), (0, 1), (-1, 1), (-1, 2)],
    [(0, 2), (-1, 1), (-1, 2), (-2, 1)],
    [(-1, 0), (-1, 1), (-2, 1), (-2, 2)],
    [(0, 1), (-1, 0), (-1, 1), (-2, 0)],
];

const J_SHAPES: [PieceShape; 4] = [
    [(0, 0), (-1, 0), (-1, 1), (-1, 2)],
    [(0, 1), (0, 2), (-1, 1), (-2, 1)],
    [(-1, 0), (-1, 1), (-1, 2), (-2, 2)],
    [(0, 1), (-1, 1), (-2, 0), (-2, 1)],
];

const L_SHAPES: [PieceShape; 4] = [
    [(0, 2), (-1, 0), (-1, 1), (-1, 2)],
    [(0, 1), (-1, 1), (-2, 1), (-2, 2)],
    [(-1, 0), (-1, 1), (-1, 2), (-2, 0)],
    [(0, 0), (0, 1), (-1, 1), (-2, 1)],
];

/// A falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub shape: ShapeId,
    pub orientation: Orientation,
    pub row: i16,
    pub col: i16,
}

impl Piece {
    pub fn new(shape: ShapeId, row: i16, col: i16) -> Self {
        Self {
            shape,
            orientation: Orientation::North,
            row,
            col,
        }
    }

    /// Absolute (row, col) of each cell.
    pub fn cells(&self) -> [(i16, i16); 4] {
        shape_cells(self.shape, self.orientation)
            .map(|(dr, dc)| (self.row + dr as i16, self.col + dc as i16))
    }

    pub fn covers(&self, row: i16, col: i16) -> bool {
        self.cells().contains(&(row, col))
    }

    pub fn covers_column(&self, col: i16) -> bool {
        self.cells().iter().any(|&(_, c)| c == col)
    }

    /// Every cell in bounds and unoccupied.
    pub fn fits(&self, board: &Board) -> bool {
        self.cells().iter().all(|&(r, c)| board.is_free(r, c))
    }

    /// Every cell within the visible rows.
    pub fn is_visible(&self, board: &Board) -> bool {
        self.cells().iter().all(|&(r, _)| r < board.visible() as i16)
    }

    pub fn moved(&self, drow: i16, dcol: i16) -> Self {
        Self {
            row: self.row.saturating_add(drow),
            col: self.col.saturating_add(dcol),
            ..*self
        }
    }

    pub fn rotated(&self) -> Self {
        Self {
            orientation: self.orientation.rotate_cw(),
            ..*self
        }
    }
}
