//! Terminal key source.
//!
//! crossterm decodes terminal input into key events; the game wants the raw
//! byte a curses-style terminal would have delivered, so events are folded
//! back into bytes here. Reading blocks, so it runs on its own thread and
//! hands bytes to the event multiplexer through a channel.

use std::thread;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

/// Keys buffered between the reader thread and the game.
const KEY_BUFFER: usize = 64;

/// Byte a key event would produce on a raw terminal, if any.
pub fn key_to_byte(key: KeyEvent) -> Option<u8> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let c = c.to_ascii_uppercase();
            if ('@'..='_').contains(&c) {
                Some(c as u8 - b'@')
            } else {
                None
            }
        }
        KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
        KeyCode::Enter => Some(b'\r'),
        KeyCode::Tab => Some(b'\t'),
        KeyCode::Backspace => Some(0x7f),
        KeyCode::Esc => Some(0x1b),
        _ => None,
    }
}

/// Start the reader thread. The receiver yields one byte per keystroke and
/// closes if the terminal can no longer be read.
pub fn spawn_key_reader() -> mpsc::Receiver<u8> {
    let (tx, rx) = mpsc::channel(KEY_BUFFER);
    let spawned = thread::Builder::new()
        .name("netris-keys".to_string())
        .spawn(move || loop {
            match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(b) = key_to_byte(key) {
                        if tx.blocking_send(b).is_err() {
                            return;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("terminal read failed: {e}");
                    return;
                }
            }
        });
    if let Err(e) = spawned {
        log::error!("cannot start key reader: {e}");
    }
    rx
}
