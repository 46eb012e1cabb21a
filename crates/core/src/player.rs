//! One player's board plus the piece falling on it.
//!
//! Piece lifecycle per board: no piece → falling → frozen → no piece.
//! The live piece is never written into the grid; `cell_at` composes it in
//! for display. Every operation either succeeds completely or leaves the
//! board untouched.

use crate::board::{Board, BoardOverflow};
use crate::pieces::Piece;
use crate::types::{BlockType, Cell, ShapeId};

#[derive(Debug, Clone)]
pub struct PlayerBoard {
    board: Board,
    active: Option<Piece>,
    pieces: u32,
}

impl PlayerBoard {
    pub fn new(width: u8, visible: u8) -> Self {
        Self {
            board: Board::new(width, visible),
            active: None,
            pieces: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn active(&self) -> Option<Piece> {
        self.active
    }

    /// Pieces successfully spawned on this board since it was created.
    pub fn pieces_spawned(&self) -> u32 {
        self.pieces
    }

    /// Row where a spawning piece's anchor starts before being lowered.
    pub fn spawn_row(&self) -> i16 {
        self.board.height() as i16 - 1
    }

    pub fn spawn_col(&self) -> i16 {
        self.board.width() as i16 / 2
    }

    /// Place `shape` at top center, lowered until fully visible.
    ///
    /// Returns false (board full, game over) if it collides there. Any piece
    /// still live is frozen first.
    pub fn start_new_piece(&mut self, shape: ShapeId) -> bool {
        self.freeze_piece();
        let mut piece = Piece::new(shape, self.spawn_row(), self.spawn_col());
        while !piece.is_visible(&self.board) {
            piece = piece.moved(-1, 0);
        }
        if !piece.fits(&self.board) {
            return false;
        }
        self.active = Some(piece);
        self.pieces += 1;
        true
    }

    fn try_replace(&mut self, next: impl FnOnce(&Piece) -> Piece) -> bool {
        let Some(current) = self.active else {
            return false;
        };
        let candidate = next(&current);
        if !candidate.fits(&self.board) {
            return false;
        }
        self.active = Some(candidate);
        true
    }

    /// One-step move; `drow` of -1 is down.
    pub fn move_piece(&mut self, drow: i16, dcol: i16) -> bool {
        self.try_replace(|p| p.moved(drow, dcol))
    }

    pub fn rotate_piece(&mut self) -> bool {
        self.try_replace(Piece::rotated)
    }

    /// Slide sideways until blocked. Returns the number of steps taken.
    pub fn slide_piece(&mut self, dcol: i16) -> u32 {
        let mut steps = 0;
        while self.move_piece(0, dcol) {
            steps += 1;
        }
        steps
    }

    /// Move down until blocked, then freeze. Returns rows moved.
    pub fn drop_piece(&mut self) -> u32 {
        let mut rows = 0;
        while self.move_piece(-1, 0) {
            rows += 1;
        }
        self.freeze_piece();
        rows
    }

    /// Turn the live piece into permanent cells. False if there was none.
    pub fn freeze_piece(&mut self) -> bool {
        let Some(piece) = self.active.take() else {
            return false;
        };
        self.board
            .lock_cells(&piece.cells(), BlockType::Piece(piece.shape))
    }

    /// Remove full visible rows. Returns how many were removed.
    pub fn clear_full_lines(&mut self) -> u32 {
        self.board.clear_full_rows().len() as u32
    }

    /// Insert junk rows below the stack; the live piece rides up with it.
    pub fn insert_junk(&mut self, rows: i16, column: i16) -> Result<(), BoardOverflow> {
        if rows <= 0 {
            return Ok(());
        }
        // Anything taller than the grid already buries the whole stack.
        let rows = rows.min(self.board.height() as i16);
        let stack = self.board.insert_junk(rows, column);
        if let Some(piece) = self.active {
            let lifted = piece.moved(rows, 0);
            if !lifted.fits(&self.board) {
                self.active = None;
                return Err(BoardOverflow);
            }
            self.active = Some(lifted);
        }
        stack
    }

    /// What the screen shows at (row, col): the live piece over the grid.
    pub fn cell_at(&self, row: i16, col: i16) -> Cell {
        if let Some(piece) = self.active {
            if piece.covers(row, col) {
                return Some(BlockType::Piece(piece.shape));
            }
        }
        self.board.get(row, col).flatten()
    }

    /// Start over with an empty grid. The spawn counter keeps running.
    pub fn reset(&mut self) {
        self.board.clear();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_lowers_until_visible() {
        let mut pb = PlayerBoard::new(10, 20);
        assert!(pb.start_new_piece(ShapeId::O));
        let piece = pb.active().unwrap();
        assert!(piece.is_visible(pb.board()));
        // One row higher would poke into the hidden rows.
        assert!(!piece.moved(1, 0).is_visible(pb.board()));
        assert_eq!(pb.pieces_spawned(), 1);
    }

    #[test]
    fn blocked_move_changes_nothing() {
        let mut pb = PlayerBoard::new(10, 20);
        assert!(pb.start_new_piece(ShapeId::O));
        pb.slide_piece(1);
        let before = pb.active();
        assert!(!pb.move_piece(0, 1));
        assert_eq!(pb.active(), before);
    }

    #[test]
    fn drop_matches_repeated_down_then_freeze() {
        let mut a = PlayerBoard::new(10, 20);
        let mut b = PlayerBoard::new(10, 20);
        a.board_mut().set(3, 5, Some(BlockType::Junk));
        b.board_mut().set(3, 5, Some(BlockType::Junk));
        assert!(a.start_new_piece(ShapeId::T));
        assert!(b.start_new_piece(ShapeId::T));

        let dropped = a.drop_piece();
        let mut stepped = 0;
        while b.move_piece(-1, 0) {
            stepped += 1;
        }
        b.freeze_piece();

        assert_eq!(dropped, stepped);
        assert_eq!(a.board(), b.board());
        assert!(a.active().is_none());
    }

    #[test]
    fn junk_lifts_live_piece() {
        let mut pb = PlayerBoard::new(10, 20);
        assert!(pb.start_new_piece(ShapeId::I));
        let row = pb.active().unwrap().row;
        assert!(pb.insert_junk(2, 0).is_ok());
        assert_eq!(pb.active().unwrap().row, row + 2);
    }

    #[test]
    fn junk_past_the_top_overflows() {
        let mut pb = PlayerBoard::new(10, 20);
        assert!(pb.start_new_piece(ShapeId::I));
        assert_eq!(pb.insert_junk(8, 0), Err(BoardOverflow));
    }

    #[test]
    fn cell_at_composes_live_piece() {
        let mut pb = PlayerBoard::new(10, 20);
        assert!(pb.start_new_piece(ShapeId::I));
        let (r, c) = pb.active().unwrap().cells()[0];
        assert_eq!(pb.cell_at(r, c), Some(BlockType::Piece(ShapeId::I)));
        assert_eq!(pb.board().get(r, c), Some(None));
    }
}
