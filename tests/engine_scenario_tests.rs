//! Worked examples of the piece lifecycle on a standard 10x20 board.

use netris::core::PlayerBoard;
use netris::types::ShapeId;

#[test]
fn test_i_piece_spawns_top_center_and_is_lowered_into_view() {
    let mut player = PlayerBoard::new(10, 20);
    assert_eq!(player.spawn_row(), 23);
    assert_eq!(player.spawn_col(), 5);

    assert!(player.start_new_piece(ShapeId::I));
    let piece = player.active().unwrap();
    assert_eq!(piece.col, 5);
    assert!(piece.row < 23);
    assert!(piece.cells().iter().all(|&(r, _)| r < 20));
    // Lowered no further than needed.
    assert!(piece.cells().iter().any(|&(r, _)| r == 19));
    assert_eq!(player.pieces_spawned(), 1);
}

#[test]
fn test_left_moves_stop_at_the_wall() {
    let mut player = PlayerBoard::new(10, 20);
    assert!(player.start_new_piece(ShapeId::I));

    for _ in 0..3 {
        assert!(player.move_piece(0, -1));
    }
    assert_eq!(player.active().unwrap().col, 2);

    let moved = (0..3).filter(|_| player.move_piece(0, -1)).count();
    assert_eq!(moved, 2);
    assert_eq!(player.active().unwrap().col, 0);
}

#[test]
fn test_drop_then_next_spawn_counts_pieces() {
    let mut player = PlayerBoard::new(10, 20);
    assert!(player.start_new_piece(ShapeId::I));
    player.slide_piece(-1);

    assert!(player.drop_piece() > 0);
    assert!(player.active().is_none());
    for col in 0..4 {
        assert!(player.board().is_occupied(0, col));
    }

    assert!(player.start_new_piece(ShapeId::T));
    assert_eq!(player.pieces_spawned(), 2);
}

#[test]
fn test_full_row_clears_after_freeze() {
    let mut player = PlayerBoard::new(10, 20);
    for (shape, shift) in [(ShapeId::I, -5i16), (ShapeId::I, -1), (ShapeId::O, 2)] {
        assert!(player.start_new_piece(shape));
        for _ in 0..shift.abs() {
            player.move_piece(0, shift.signum());
        }
        player.drop_piece();
    }
    // Two I pieces fill columns 0..8; the O covers 8..10 on rows 0 and 1.
    assert_eq!(player.clear_full_lines(), 1);
    assert!(player.board().is_occupied(0, 8));
    assert!(player.board().is_row_empty(1));
}
