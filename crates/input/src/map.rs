//! Key table: which raw key byte triggers which [`KeyAction`].
//!
//! A key spec lists one key per action in [`KeyAction`] order. `^x` stands
//! for Ctrl-x. A spec shorter than the action list only rebinds the leading
//! actions. Duplicate bindings are a configuration error.

use std::fmt;

use thiserror::Error;

use crate::types::{KeyAction, DEFAULT_KEYS};

/// One key byte per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyTable {
    keys: [u8; KeyAction::COUNT],
}

impl KeyTable {
    pub fn key_for(&self, action: KeyAction) -> u8 {
        self.keys[action.index()]
    }

    /// Reverse lookup. Unbound bytes yield `None`.
    pub fn action_for(&self, key: u8) -> Option<KeyAction> {
        self.keys
            .iter()
            .position(|&k| k == key)
            .map(|i| KeyAction::ALL[i])
    }

    pub fn keys(&self) -> &[u8; KeyAction::COUNT] {
        &self.keys
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        let mut keys = [0u8; KeyAction::COUNT];
        overlay(&mut keys, DEFAULT_KEYS);
        Self { keys }
    }
}

/// Two actions bound to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: u8,
    pub first: KeyAction,
    pub second: KeyAction,
}

impl fmt::Display for KeyCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mapped to both {} and {}",
            describe_key(self.key),
            self.first.name(),
            self.second.name()
        )
    }
}

/// Every colliding pair found in a key spec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct KeyMapError {
    pub collisions: Vec<KeyCollision>,
}

impl fmt::Display for KeyMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duplicate key mappings:")?;
        for c in &self.collisions {
            write!(f, "\n  {c}")?;
        }
        Ok(())
    }
}

/// Human-readable name of a key byte: `Ctrl-L`, `"j"` or `0xFF`.
pub fn describe_key(key: u8) -> String {
    if key < b' ' {
        format!("Ctrl-{}", (key + b'@') as char)
    } else if key.is_ascii_graphic() || key == b' ' {
        format!("\"{}\"", key as char)
    } else {
        format!("0x{key:X}")
    }
}

/// Parse `spec` over the default table.
///
/// ```
/// use netris_input::map_keys;
/// use netris_input::types::KeyAction;
///
/// let table = map_keys("ab").unwrap();
/// assert_eq!(table.key_for(KeyAction::Left), b'a');
/// assert_eq!(table.key_for(KeyAction::FullLeft), b'b');
/// assert_eq!(table.key_for(KeyAction::Rotate), b'k');
/// ```
pub fn map_keys(spec: &str) -> Result<KeyTable, KeyMapError> {
    remap(&KeyTable::default(), spec)
}

/// Parse `spec` over an existing table and validate the result.
pub fn remap(base: &KeyTable, spec: &str) -> Result<KeyTable, KeyMapError> {
    let mut keys = base.keys;
    overlay(&mut keys, spec);

    let collisions = find_collisions(&keys);
    if collisions.is_empty() {
        Ok(KeyTable { keys })
    } else {
        Err(KeyMapError { collisions })
    }
}

fn overlay(keys: &mut [u8; KeyAction::COUNT], spec: &str) {
    let bytes = spec.as_bytes();
    let mut i = 0;
    let mut k = 0;
    while i < bytes.len() && k < keys.len() {
        if bytes[i] == b'^' && i + 1 < bytes.len() {
            i += 1;
            keys[k] = bytes[i].to_ascii_uppercase().wrapping_sub(b'@');
        } else {
            keys[k] = bytes[i];
        }
        i += 1;
        k += 1;
    }
}

fn find_collisions(keys: &[u8; KeyAction::COUNT]) -> Vec<KeyCollision> {
    let mut out = Vec::new();
    for a in 0..keys.len() {
        for b in a + 1..keys.len() {
            if keys[a] == keys[b] {
                out.push(KeyCollision {
                    key: keys[a],
                    first: KeyAction::ALL[a],
                    second: KeyAction::ALL[b],
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let t = KeyTable::default();
        assert_eq!(t.key_for(KeyAction::Left), b'j');
        assert_eq!(t.key_for(KeyAction::FullLeft), b'J');
        assert_eq!(t.key_for(KeyAction::Drop), b' ');
        assert_eq!(t.key_for(KeyAction::Redraw), 12);
        assert_eq!(t.key_for(KeyAction::Quit), b'q');
        assert!(map_keys(DEFAULT_KEYS).is_ok());
    }

    #[test]
    fn caret_means_control() {
        let t = map_keys("^a^Z").unwrap();
        assert_eq!(t.key_for(KeyAction::Left), 1);
        assert_eq!(t.key_for(KeyAction::FullLeft), 26);
    }

    #[test]
    fn trailing_caret_is_literal() {
        let t = map_keys("^").unwrap();
        assert_eq!(t.key_for(KeyAction::Left), b'^');
    }

    #[test]
    fn describe() {
        assert_eq!(describe_key(12), "Ctrl-L");
        assert_eq!(describe_key(b'j'), "\"j\"");
        assert_eq!(describe_key(b' '), "\" \"");
        assert_eq!(describe_key(0xff), "0xFF");
    }

    #[test]
    fn three_way_collision_reports_every_pair() {
        let err = map_keys("aaa").unwrap_err();
        let pairs: Vec<(KeyAction, KeyAction)> =
            err.collisions.iter().map(|c| (c.first, c.second)).collect();
        assert_eq!(
            pairs,
            vec![
                (KeyAction::Left, KeyAction::FullLeft),
                (KeyAction::Left, KeyAction::Rotate),
                (KeyAction::FullLeft, KeyAction::Rotate),
            ]
        );
    }

    #[test]
    fn error_message_lists_collisions() {
        let err = map_keys("jj").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate key mappings:\n  \"j\" mapped to both Left and FullLeft"
        );
    }
}
