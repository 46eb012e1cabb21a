use criterion::{black_box, criterion_group, criterion_main, Criterion};
use netris::core::{Board, PlayerBoard, SimpleRng};
use netris::net::{decode_frame, Packet};
use netris::types::{BlockType, ShapeId};

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("clear_4_lines", |b| {
        b.iter(|| {
            let mut board = Board::new(10, 20);
            // Fill bottom 4 rows
            for row in 0..4 {
                for col in 0..10 {
                    board.set(row, col, Some(BlockType::Piece(ShapeId::I)));
                }
            }
            black_box(board.clear_full_rows());
        })
    });
}

fn bench_junk_insertion(c: &mut Criterion) {
    c.bench_function("insert_2_junk_rows", |b| {
        b.iter(|| {
            let mut player = PlayerBoard::new(10, 20);
            player.start_new_piece(ShapeId::T);
            black_box(player.insert_junk(black_box(2), black_box(3)))
        })
    });
}

fn bench_piece_fall(c: &mut Criterion) {
    let mut rng = SimpleRng::new(12345);

    c.bench_function("spawn_and_drop", |b| {
        b.iter(|| {
            let mut player = PlayerBoard::new(10, 20);
            player.start_new_piece(rng.choose_shape());
            black_box(player.drop_piece());
        })
    });
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut wire = bytes::BytesMut::new();
    for _ in 0..64 {
        Packet::InsertJunk { rows: 2, column: 5 }.encode(&mut wire);
        Packet::Left.encode(&mut wire);
    }
    let wire = wire.freeze();

    c.bench_function("decode_128_frames", |b| {
        b.iter(|| {
            let mut buf = bytes::BytesMut::from(&wire[..]);
            let mut n = 0;
            while let Ok(Some(p)) = decode_frame(&mut buf) {
                black_box(p);
                n += 1;
            }
            n
        })
    });
}

criterion_group!(
    benches,
    bench_line_clear,
    bench_junk_insertion,
    bench_piece_fall,
    bench_frame_decode
);
criterion_main!(benches);
