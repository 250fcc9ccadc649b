//! Benchmarks for timeline decoding and frame projection.

use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use trajectory_replay::{
    playback::{CancelToken, FixedDelay, PlaybackEngine, Viewport},
    trajectory::{RawBody, TrajectoryReader, encode_timeline},
};

const CYCLES: usize = 50;

/// Bodies spread over the world, with every tenth one absent.
fn timeline(body_count: usize) -> Vec<u8> {
    let snapshots: Vec<Vec<RawBody>> = (0..CYCLES)
        .map(|n| {
            (0..body_count)
                .map(|i| {
                    if i % 10 == 9 {
                        RawBody::ABSENT
                    } else {
                        let x = ((i * 7919 + n * 31) % 32768) as i32 - 16384;
                        let y = ((i * 104_729 + n * 17) % 32768) as i32 - 16384;
                        let mass = if i == 0 { 2_000_000 } else { (i % 3000) as i32 };
                        RawBody::new(x, y, mass)
                    }
                })
                .collect()
        })
        .collect();
    encode_timeline(body_count as u32, &snapshots).unwrap()
}

fn bench_playback(c: &mut Criterion) {
    let mut group = c.benchmark_group("playback");
    let engine = PlaybackEngine::default();

    for body_count in [100, 1000, 3000] {
        let bytes = timeline(body_count);
        group.throughput(Throughput::Elements((body_count * CYCLES) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} bodies", body_count)),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let reader = TrajectoryReader::from_reader(Cursor::new(bytes.clone())).unwrap();
                    let run = engine
                        .start(
                            reader,
                            Viewport::default(),
                            FixedDelay::default(),
                            CancelToken::new(),
                        )
                        .unwrap();
                    run.map(|f| f.unwrap().visible_count).sum::<usize>()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_playback);
criterion_main!(benches);
