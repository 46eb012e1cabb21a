//! Netris screen layout on top of the framebuffer.
//!
//! Boards are drawn two characters per cell, bottom row at screen line 22,
//! with the status panel to the right of the last board. Coordinates passed
//! in by the engine are board coordinates (row 0 at the bottom).

use std::io::{self, Write};

use anyhow::Result;

use crate::core::{Display, DisplayInfo, PauseState};
use crate::fb::{Cell, CellStyle, FrameBuffer, Rgb};
use crate::renderer::TerminalRenderer;
use crate::types::{BlockType, BoardId, Cell as BoardCell, ConnFlags, GameType, ShapeId};

const SCREEN_WIDTH: u16 = 80;
const SCREEN_HEIGHT: u16 = 24;

/// Screen line of board row 0.
const BOARD_BOTTOM: u16 = 22;
/// Screen line the status panel is measured from.
const STATUS_Y: u16 = 22;
/// Number of rotating robot message lines.
const MESSAGE_LINES: u16 = 10;

/// Piece colors, one per shape.
fn shape_color(shape: ShapeId) -> Rgb {
    match shape {
        ShapeId::I => Rgb::new(80, 220, 220),
        ShapeId::O => Rgb::new(240, 220, 80),
        ShapeId::T => Rgb::new(200, 120, 220),
        ShapeId::S => Rgb::new(100, 220, 120),
        ShapeId::Z => Rgb::new(220, 80, 80),
        ShapeId::J => Rgb::new(80, 120, 220),
        ShapeId::L => Rgb::new(255, 165, 0),
    }
}

const JUNK_COLOR: Rgb = Rgb::new(200, 200, 200);
const BLOCK_FG: Rgb = Rgb::new(0, 0, 0);

/// Display toggles from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenOptions {
    pub color: bool,
    pub standout: bool,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            color: true,
            standout: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoardGeom {
    /// Screen column of board column 0.
    x: u16,
    width: u8,
    visible: u8,
}

impl BoardGeom {
    fn screen_pos(&self, row: i16, col: i16) -> Option<(u16, u16)> {
        if row < 0 || row >= i16::from(self.visible) || col < 0 || col >= i16::from(self.width) {
            return None;
        }
        Some((self.x + 2 * col as u16, BOARD_BOTTOM - row as u16))
    }

    /// First column to the right of the frame.
    fn right_edge(&self) -> u16 {
        self.x + 2 * u16::from(self.width) + 1
    }
}

pub struct TerminalDisplay<W: Write = io::Stdout> {
    fb: FrameBuffer,
    renderer: TerminalRenderer<W>,
    options: ScreenOptions,
    boards: [Option<BoardGeom>; 2],
    status_x: u16,
    message_line: u16,
}

impl TerminalDisplay<io::Stdout> {
    pub fn new(options: ScreenOptions) -> Self {
        Self::with_renderer(TerminalRenderer::new(), options)
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn with_renderer(renderer: TerminalRenderer<W>, options: ScreenOptions) -> Self {
        let mut display = Self {
            fb: FrameBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            renderer,
            options,
            boards: [None, None],
            status_x: 0,
            message_line: 0,
        };
        display.draw_banner();
        display
    }

    /// Switch the terminal into game mode (raw, alternate screen).
    pub fn enter(&mut self) -> Result<()> {
        self.renderer.enter()
    }

    pub fn exit(&mut self) -> Result<()> {
        self.renderer.exit()
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.fb
    }

    fn draw_banner(&mut self) {
        let title = format!("Netris {}", env!("CARGO_PKG_VERSION"));
        self.fb.put_str(0, 0, &title, CellStyle::PLAIN);
        self.fb
            .put_str(55, 0, "\"netris -h\" for more info", CellStyle::PLAIN);
    }

    fn block_style(&self, block: BlockType) -> CellStyle {
        if !self.options.standout {
            return CellStyle::PLAIN;
        }
        if !self.options.color {
            return CellStyle::PLAIN.reversed();
        }
        let bg = match block {
            BlockType::Piece(shape) => shape_color(shape),
            BlockType::Junk => JUNK_COLOR,
        };
        CellStyle {
            fg: Some(BLOCK_FG),
            bg: Some(bg),
            ..CellStyle::PLAIN
        }
    }

    fn put_line(&mut self, dy: u16, dx: u16, text: &str) {
        let y = STATUS_Y.saturating_sub(dy);
        self.fb.clear_to_eol(self.status_x + dx, y);
        self.fb.put_str(self.status_x + dx, y, text, CellStyle::PLAIN);
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn init_board(&mut self, board: BoardId, width: u8, visible: u8) {
        let x = match board {
            BoardId::Local => 1,
            BoardId::Remote => self.boards[0].map_or(1, |g| g.right_edge() + 2),
        };
        let geom = BoardGeom { x, width, visible };
        self.boards[board.index()] = Some(geom);
        self.status_x = self.status_x.max(geom.right_edge() + 2);

        let w = 2 * u16::from(width);
        let top = BOARD_BOTTOM.saturating_sub(u16::from(visible));
        for y in top + 1..=BOARD_BOTTOM {
            self.fb.put_str(x - 1, y, "|", CellStyle::PLAIN);
            for dx in 0..w {
                self.fb.set(x + dx, y, Cell::BLANK);
            }
            self.fb.put_str(x + w, y, "|", CellStyle::PLAIN);
        }
        for y in [top, BOARD_BOTTOM + 1] {
            let edge = format!("+{}+", "-".repeat(w as usize));
            self.fb.put_str(x - 1, y, &edge, CellStyle::PLAIN);
        }
    }

    fn plot_block(&mut self, board: BoardId, row: i16, col: i16, cell: BoardCell) {
        let Some(geom) = self.boards[board.index()] else {
            return;
        };
        let Some((x, y)) = geom.screen_pos(row, col) else {
            return;
        };
        let (text, style) = match cell {
            None => ("  ", CellStyle::PLAIN),
            Some(block @ BlockType::Piece(_)) => ("[]", self.block_style(block)),
            Some(BlockType::Junk) => ("$$", self.block_style(BlockType::Junk)),
        };
        self.fb.put_str(x, y, text, style);
    }

    fn plot_underline(&mut self, board: BoardId, col: i16, on: bool) {
        let Some(geom) = self.boards[board.index()] else {
            return;
        };
        if let Some((x, _)) = geom.screen_pos(0, col) {
            let mark = if on { "==" } else { "--" };
            self.fb.put_str(x, BOARD_BOTTOM + 1, mark, CellStyle::PLAIN);
        }
    }

    fn show_info(&mut self, info: &DisplayInfo) {
        let c = &info.counters;
        self.put_line(9, 0, &format!("Seed:  {}", info.seed));
        self.put_line(8, 0, &format!("Speed: {}ms", info.interval_us / 1000));

        match info.game_type {
            GameType::OnePlayer => {
                self.put_line(6, 0, &format!("Won         {:3}", c.won));
                self.put_line(5, 0, &format!("Lost        {:3}", c.lost));
                self.put_line(4, 0, &format!("Rows        {:3}", c.my_lines));
                self.put_line(3, 0, &format!("Rows (total){:3}", c.my_total_lines));
            }
            GameType::ClassicTwo => {
                let me = if info.robot { "Robot" } else { "   Me" };
                let them = if !info.opponent_flags.contains(ConnFlags::USING_ROBOT) {
                    "Opponent"
                } else if info.opponent_flags.contains(ConnFlags::FAIR_ROBOT) {
                    "   Robot(fair)"
                } else {
                    "   Robot"
                };
                self.put_line(7, 0, "");
                self.put_line(7, 10, me);
                self.put_line(7, 17, them);
                self.put_line(6, 0, &format!("Won         {:3}       {:3}", c.won, c.lost));
                self.put_line(
                    5,
                    0,
                    &format!("Rows        {:3}       {:3}", c.my_lines, c.opponent_lines),
                );
                self.put_line(
                    4,
                    0,
                    &format!(
                        "Rows (total){:3}       {:3}",
                        c.my_total_lines, c.opponent_total_lines
                    ),
                );
            }
        }
    }

    fn print_status(&mut self, text: &str) {
        self.put_line(1, 0, text);
    }

    fn clear_status(&mut self) {
        self.put_line(1, 0, "");
    }

    fn show_pause(&mut self, pause: PauseState) {
        let text = match (pause.local, pause.remote) {
            (true, true) => "Paused by you & opponent",
            (true, false) => "Paused by you",
            (false, true) => "Paused by opponent",
            (false, false) => "",
        };
        self.put_line(2, 0, text);
    }

    fn message(&mut self, text: &str) {
        let first = STATUS_Y - 20;
        self.put_line(STATUS_Y - (first + self.message_line), 0, text);
        self.message_line = (self.message_line + 1) % MESSAGE_LINES;
        self.put_line(STATUS_Y - (first + self.message_line), 0, "");
    }

    fn show_opponent(&mut self, name: &str, host: &str) {
        self.fb.clear_to_eol(0, 1);
        self.fb
            .put_str(0, 1, &format!("Playing {name}@{host}"), CellStyle::PLAIN);
    }

    fn invert_board(&mut self, board: BoardId) {
        let Some(geom) = self.boards[board.index()] else {
            return;
        };
        for row in 0..i16::from(geom.visible) {
            for col in 0..i16::from(geom.width) {
                let Some((x, y)) = geom.screen_pos(row, col) else {
                    continue;
                };
                for dx in 0..2 {
                    if let Some(cell) = self.fb.get(x + dx, y) {
                        if !cell.is_blank() {
                            self.fb.set(
                                x + dx,
                                y,
                                Cell {
                                    style: cell.style.reversed(),
                                    ..cell
                                },
                            );
                        }
                    }
                }
            }
        }
    }

    fn schedule_full_redraw(&mut self) {
        self.renderer.invalidate();
    }

    fn refresh(&mut self) -> Result<()> {
        self.renderer.draw(&self.fb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MatchState;

    fn display() -> TerminalDisplay<Vec<u8>> {
        TerminalDisplay::with_renderer(
            TerminalRenderer::with_writer(Vec::new()),
            ScreenOptions::default(),
        )
    }

    #[test]
    fn boards_sit_side_by_side() {
        let mut d = display();
        d.init_board(BoardId::Local, 10, 20);
        d.init_board(BoardId::Remote, 10, 20);
        assert_eq!(d.boards[0].map(|g| g.x), Some(1));
        assert_eq!(d.boards[1].map(|g| g.x), Some(24));
        assert_eq!(d.status_x, 47);
        assert_eq!(&d.fb.row_text(2)[0..22], "+--------------------+");
        assert_eq!(&d.fb.row_text(23)[0..22], "+--------------------+");
    }

    #[test]
    fn blocks_use_two_columns_bottom_up() {
        let mut d = display();
        d.init_board(BoardId::Local, 10, 20);
        d.plot_block(BoardId::Local, 0, 0, Some(BlockType::Piece(ShapeId::T)));
        d.plot_block(BoardId::Local, 19, 9, Some(BlockType::Junk));
        d.plot_block(BoardId::Local, 20, 0, Some(BlockType::Junk));

        assert_eq!(&d.fb.row_text(22)[0..3], "|[]");
        assert_eq!(&d.fb.row_text(3)[19..22], "$$|");
        assert_eq!(
            d.fb.get(1, 22).unwrap().style.bg,
            Some(shape_color(ShapeId::T))
        );
    }

    #[test]
    fn pause_banner() {
        let mut d = display();
        d.init_board(BoardId::Local, 10, 20);
        d.show_pause(PauseState {
            local: true,
            remote: true,
        });
        assert!(d.fb.row_text(20).contains("Paused by you & opponent"));
        d.show_pause(PauseState::default());
        assert!(!d.fb.row_text(20).contains("Paused"));
    }

    #[test]
    fn info_panel_two_player() {
        let mut d = display();
        d.init_board(BoardId::Local, 10, 20);
        d.init_board(BoardId::Remote, 10, 20);
        d.show_info(&DisplayInfo {
            game_type: GameType::ClassicTwo,
            seed: 42,
            interval_us: 300_000,
            robot: false,
            opponent_flags: ConnFlags::USING_ROBOT | ConnFlags::FAIR_ROBOT,
            counters: MatchState {
                won: 2,
                lost: 1,
                ..MatchState::default()
            },
        });
        assert!(d.fb.row_text(13).contains("Seed:  42"));
        assert!(d.fb.row_text(14).contains("Speed: 300ms"));
        assert!(d.fb.row_text(15).contains("Robot(fair)"));
        assert!(d.fb.row_text(16).contains("Won           2         1"));
    }

    #[test]
    fn messages_rotate() {
        let mut d = display();
        d.init_board(BoardId::Local, 10, 20);
        d.message("first");
        d.message("second");
        assert!(d.fb.row_text(2).contains("first"));
        assert!(d.fb.row_text(3).contains("second"));
    }

    #[test]
    fn invert_only_touches_blocks() {
        let mut d = display();
        d.init_board(BoardId::Local, 10, 20);
        d.plot_block(BoardId::Local, 0, 0, Some(BlockType::Junk));
        d.invert_board(BoardId::Local);
        assert!(d.fb.get(1, 22).unwrap().style.reverse);
        assert!(d.fb.get(3, 22).unwrap().is_blank());
    }

    #[test]
    fn refresh_writes_to_the_terminal() {
        let mut d = display();
        d.init_board(BoardId::Local, 10, 20);
        d.refresh().unwrap();
        assert!(!d.renderer.writer().is_empty());
    }
}
