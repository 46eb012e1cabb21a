//! Board module - the permanent cell grid of one player
//!
//! Rows are numbered from the bottom (row 0) upwards, columns from the left.
//! The grid is `visible + HIDDEN_ROWS` rows tall; the hidden rows above the
//! visible field give spawning pieces and junk-pushed stacks somewhere to go.
//! Cells are stored in a flat row-major vector (row * width + col).

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::types::{BlockType, Cell, HIDDEN_ROWS, MAX_BOARD_HEIGHT, MAX_BOARD_WIDTH};

/// Row indices removed by a single line clear, bottom first.
pub type ClearedRows = ArrayVec<i16, { MAX_BOARD_HEIGHT as usize }>;

/// The stack (or the live piece) was pushed past the top of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("board overflow: blocks pushed past the top of the field")]
pub struct BoardOverflow;

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    width: u8,
    visible: u8,
    height: u8,
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board. Dimensions are clamped to the supported maxima.
    pub fn new(width: u8, visible: u8) -> Self {
        let width = width.clamp(4, MAX_BOARD_WIDTH);
        let visible = visible.clamp(4, MAX_BOARD_HEIGHT - HIDDEN_ROWS);
        let height = visible + HIDDEN_ROWS;
        Self {
            width,
            visible,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    #[inline(always)]
    fn index(&self, row: i16, col: i16) -> Option<usize> {
        if self.is_out_of_bounds(row, col) {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// Number of rows shown on screen.
    pub fn visible(&self) -> u8 {
        self.visible
    }

    /// Total rows, hidden ones included.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Cell at (row, col), or `None` when out of bounds.
    pub fn get(&self, row: i16, col: i16) -> Option<Cell> {
        self.index(row, col).map(|i| self.cells[i])
    }

    /// Returns false when out of bounds.
    pub fn set(&mut self, row: i16, col: i16, cell: Cell) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// In bounds and empty.
    pub fn is_free(&self, row: i16, col: i16) -> bool {
        matches!(self.get(row, col), Some(None))
    }

    pub fn is_occupied(&self, row: i16, col: i16) -> bool {
        matches!(self.get(row, col), Some(Some(_)))
    }

    pub fn is_out_of_bounds(&self, row: i16, col: i16) -> bool {
        row < 0 || col < 0 || row >= self.height as i16 || col >= self.width as i16
    }

    pub fn is_visible_row(&self, row: i16) -> bool {
        (0..self.visible as i16).contains(&row)
    }

    fn row(&self, row: usize) -> &[Cell] {
        let w = self.width as usize;
        &self.cells[row * w..(row + 1) * w]
    }

    pub fn is_row_full(&self, row: i16) -> bool {
        if row < 0 || row >= self.height as i16 {
            return false;
        }
        self.row(row as usize).iter().all(|c| c.is_some())
    }

    pub fn is_row_empty(&self, row: i16) -> bool {
        if row < 0 || row >= self.height as i16 {
            return true;
        }
        self.row(row as usize).iter().all(|c| c.is_none())
    }

    /// Number of rows holding at least one block.
    pub fn occupied_rows(&self) -> usize {
        (0..self.height as i16).filter(|&r| !self.is_row_empty(r)).count()
    }

    /// Remove every full visible row and compact the grid downwards.
    ///
    /// Rows above a cleared row drop by the number of cleared rows below
    /// them; empty rows enter at the top of the grid. Returns the removed row
    /// indices (pre-clear numbering), bottom first.
    pub fn clear_full_rows(&mut self) -> ClearedRows {
        let mut cleared = ClearedRows::new();
        let width = self.width as usize;
        let mut write = 0usize;

        for read in 0..self.height as usize {
            if self.is_visible_row(read as i16) && self.is_row_full(read as i16) {
                cleared.push(read as i16);
                continue;
            }
            if write != read {
                self.cells
                    .copy_within(read * width..(read + 1) * width, write * width);
            }
            write += 1;
        }

        for cell in &mut self.cells[write * width..] {
            *cell = None;
        }
        cleared
    }

    /// Push the stack up by `rows` and fill the bottom rows with junk,
    /// leaving `gap` empty in each.
    ///
    /// Blocks pushed past the top are lost and reported as overflow; the
    /// shift happens either way so both sides of a match stay in step.
    pub fn insert_junk(&mut self, rows: i16, gap: i16) -> Result<(), BoardOverflow> {
        if rows <= 0 {
            return Ok(());
        }
        let height = self.height as usize;
        let rows = (rows as usize).min(height);
        let width = self.width as usize;
        let gap = gap.rem_euclid(self.width as i16) as usize;

        let overflow = (height - rows..height).any(|r| !self.is_row_empty(r as i16));

        self.cells
            .copy_within(0..(height - rows) * width, rows * width);
        for r in 0..rows {
            for c in 0..width {
                self.cells[r * width + c] = if c == gap { None } else { Some(BlockType::Junk) };
            }
        }

        if overflow {
            Err(BoardOverflow)
        } else {
            Ok(())
        }
    }

    /// Write `block` into every listed cell. Returns false, leaving the
    /// board untouched, if any cell is out of bounds or occupied.
    pub fn lock_cells(&mut self, cells: &[(i16, i16)], block: BlockType) -> bool {
        if !cells.iter().all(|&(r, c)| self.is_free(r, c)) {
            return false;
        }
        for &(r, c) in cells {
            self.set(r, c, Some(block));
        }
        true
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }
}
