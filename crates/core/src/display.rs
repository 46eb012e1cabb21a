//! Display seam between the engine and whatever draws the screen.
//!
//! The engine only pushes changes out; it never reads rendering state back.
//! [`ShownBoard`] remembers what was last plotted so that a refresh only
//! sends the cells that changed.

use anyhow::Result;

use crate::match_state::{MatchState, PauseState};
use crate::player::PlayerBoard;
use crate::types::{BoardId, Cell, ConnFlags, GameType};

/// Everything the status panel shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayInfo {
    pub game_type: GameType,
    pub seed: u32,
    pub interval_us: u32,
    pub robot: bool,
    pub opponent_flags: ConnFlags,
    pub counters: MatchState,
}

pub trait Display {
    /// Lay out a board of the given size.
    fn init_board(&mut self, board: BoardId, width: u8, visible: u8);

    /// Draw one visible cell.
    fn plot_block(&mut self, board: BoardId, row: i16, col: i16, cell: Cell);

    /// Mark (or unmark) a column under the board as covered by the live piece.
    fn plot_underline(&mut self, board: BoardId, col: i16, on: bool);

    fn show_info(&mut self, info: &DisplayInfo);

    fn print_status(&mut self, text: &str);

    fn clear_status(&mut self);

    fn show_pause(&mut self, pause: PauseState);

    /// Scrolling message area, fed by the robot.
    fn message(&mut self, text: &str);

    fn show_opponent(&mut self, name: &str, host: &str);

    /// Game-over highlight for a board.
    fn invert_board(&mut self, board: BoardId);

    fn schedule_full_redraw(&mut self);

    /// Flush pending drawing to the terminal.
    fn refresh(&mut self) -> Result<()>;
}

/// Display that draws nothing. Used headless and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn init_board(&mut self, _board: BoardId, _width: u8, _visible: u8) {}
    fn plot_block(&mut self, _board: BoardId, _row: i16, _col: i16, _cell: Cell) {}
    fn plot_underline(&mut self, _board: BoardId, _col: i16, _on: bool) {}
    fn show_info(&mut self, _info: &DisplayInfo) {}
    fn print_status(&mut self, _text: &str) {}
    fn clear_status(&mut self) {}
    fn show_pause(&mut self, _pause: PauseState) {}
    fn message(&mut self, _text: &str) {}
    fn show_opponent(&mut self, _name: &str, _host: &str) {}
    fn invert_board(&mut self, _board: BoardId) {}
    fn schedule_full_redraw(&mut self) {}
    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Last plotted state of one board.
#[derive(Debug, Clone)]
pub struct ShownBoard {
    id: BoardId,
    width: u8,
    visible: u8,
    cells: Vec<Cell>,
    underline: Vec<bool>,
    stale: bool,
}

impl ShownBoard {
    pub fn new(id: BoardId, width: u8, visible: u8) -> Self {
        Self {
            id,
            width,
            visible,
            cells: vec![None; width as usize * visible as usize],
            underline: vec![false; width as usize],
            stale: true,
        }
    }

    /// Force every cell to be replotted on the next refresh.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Wipe the board on screen. The next refresh replots everything.
    pub fn blank(&mut self, display: &mut dyn Display) {
        for row in 0..self.visible as i16 {
            for col in 0..self.width as i16 {
                display.plot_block(self.id, row, col, None);
            }
        }
        for col in 0..self.width as i16 {
            display.plot_underline(self.id, col, false);
        }
        self.cells.fill(None);
        self.underline.fill(false);
        self.stale = true;
    }

    /// Plot whatever changed since the last call. Returns true if anything
    /// was plotted.
    pub fn refresh(&mut self, player: &PlayerBoard, display: &mut dyn Display) -> bool {
        let mut changed = false;
        let width = self.width as i16;

        for row in 0..self.visible as i16 {
            for col in 0..width {
                let i = row as usize * self.width as usize + col as usize;
                let cell = player.cell_at(row, col);
                if self.stale || self.cells[i] != cell {
                    self.cells[i] = cell;
                    display.plot_block(self.id, row, col, cell);
                    changed = true;
                }
            }
        }

        let active = player.active();
        for col in 0..width {
            let on = active.is_some_and(|p| p.covers_column(col));
            if self.stale || self.underline[col as usize] != on {
                self.underline[col as usize] = on;
                display.plot_underline(self.id, col, on);
                changed = true;
            }
        }

        self.stale = false;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShapeId;

    #[derive(Default)]
    struct CountingDisplay {
        blocks: usize,
    }

    impl Display for CountingDisplay {
        fn init_board(&mut self, _: BoardId, _: u8, _: u8) {}
        fn plot_block(&mut self, _: BoardId, _: i16, _: i16, _: Cell) {
            self.blocks += 1;
        }
        fn plot_underline(&mut self, _: BoardId, _: i16, _: bool) {}
        fn show_info(&mut self, _: &DisplayInfo) {}
        fn print_status(&mut self, _: &str) {}
        fn clear_status(&mut self) {}
        fn show_pause(&mut self, _: PauseState) {}
        fn message(&mut self, _: &str) {}
        fn show_opponent(&mut self, _: &str, _: &str) {}
        fn invert_board(&mut self, _: BoardId) {}
        fn schedule_full_redraw(&mut self) {}
        fn refresh(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn refresh_plots_only_changes() {
        let mut player = PlayerBoard::new(10, 20);
        let mut shown = ShownBoard::new(BoardId::Local, 10, 20);
        let mut display = CountingDisplay::default();

        assert!(shown.refresh(&player, &mut display));
        assert_eq!(display.blocks, 200);

        display.blocks = 0;
        assert!(!shown.refresh(&player, &mut display));
        assert_eq!(display.blocks, 0);

        assert!(player.start_new_piece(ShapeId::O));
        assert!(shown.refresh(&player, &mut display));
        assert_eq!(display.blocks, 4);
    }

    #[test]
    fn blank_wipes_and_forces_a_full_replot() {
        let mut player = PlayerBoard::new(10, 20);
        assert!(player.start_new_piece(ShapeId::O));
        let mut shown = ShownBoard::new(BoardId::Remote, 10, 20);
        let mut display = CountingDisplay::default();
        shown.refresh(&player, &mut display);

        display.blocks = 0;
        shown.blank(&mut display);
        assert_eq!(display.blocks, 200);

        display.blocks = 0;
        assert!(shown.refresh(&player, &mut display));
        assert_eq!(display.blocks, 200);
    }
}
