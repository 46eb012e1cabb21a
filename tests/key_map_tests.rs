//! Key specs from the command line and terminal key decoding.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

use netris::input::{key_to_byte, map_keys, remap, KeyTable};
use netris::types::{KeyAction, DEFAULT_KEYS};

#[test]
fn test_default_spec_binds_every_action() {
    let table = KeyTable::default();
    for (i, action) in KeyAction::ALL.iter().enumerate() {
        assert_eq!(table.action_for(table.key_for(*action)), Some(*action));
        assert_eq!(table.keys()[i], table.key_for(*action));
    }
    assert_eq!(DEFAULT_KEYS.len(), KeyAction::COUNT + 1);
}

#[test]
fn test_short_spec_only_rebinds_leading_actions() {
    let table = map_keys("hHkl").unwrap();
    assert_eq!(table.action_for(b'h'), Some(KeyAction::Left));
    assert_eq!(table.action_for(b'H'), Some(KeyAction::FullLeft));
    assert_eq!(table.action_for(b'j'), None);
    assert_eq!(table.key_for(KeyAction::FullRight), b'L');
    assert_eq!(table.key_for(KeyAction::Quit), b'q');
}

#[test]
fn test_collision_with_untouched_default_is_reported() {
    // 'q' for Left collides with the default Quit key.
    let err = map_keys("q").unwrap_err();
    assert_eq!(err.collisions.len(), 1);
    assert_eq!(err.collisions[0].first, KeyAction::Left);
    assert_eq!(err.collisions[0].second, KeyAction::Quit);
    assert_eq!(
        err.to_string(),
        "Duplicate key mappings:\n  \"q\" mapped to both Left and Quit"
    );
}

#[test]
fn test_remap_builds_on_an_existing_table() {
    let base = map_keys("a").unwrap();
    let table = remap(&base, "").unwrap();
    assert_eq!(table.key_for(KeyAction::Left), b'a');
    assert_eq!(remap(&base, "z").unwrap().key_for(KeyAction::Left), b'z');
}

#[test]
fn test_key_release_produces_no_byte() {
    let release = KeyEvent {
        code: KeyCode::Char('j'),
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Release,
        state: KeyEventState::NONE,
    };
    assert_eq!(key_to_byte(release), None);

    let press = KeyEvent {
        kind: KeyEventKind::Press,
        ..release
    };
    assert_eq!(key_to_byte(press), Some(b'j'));
}

#[test]
fn test_ctrl_l_reaches_the_redraw_binding() {
    let table = KeyTable::default();
    let ctrl_l = KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL);
    let byte = key_to_byte(ctrl_l).unwrap();
    assert_eq!(table.action_for(byte), Some(KeyAction::Redraw));
}

#[test]
fn test_mapping_the_same_spec_twice_gives_the_same_table() {
    let spec = "^a^bcdefghijk";
    let once = map_keys(spec).unwrap();
    assert_eq!(map_keys(spec).unwrap(), once);
    assert_eq!(remap(&once, spec).unwrap(), once);
}
