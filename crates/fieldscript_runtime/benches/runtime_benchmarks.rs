//! Benchmarks for the session and snapshots.
//!
//! Run with: `cargo bench --package fieldscript_runtime --bench runtime_benchmarks`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use fieldscript_engine::WaitEvent;
use fieldscript_runtime::{Session, demo_script, from_bytes, to_bytes};

/// A session running `count` copies of the demo script.
fn session_with_instances(count: usize) -> Session {
    let mut session = Session::new(0);
    session.load_script("demo", demo_script().unwrap()).unwrap();
    for i in 0..count {
        let owner = session.create_entity(format!("npc{i}"));
        session.spawn("demo", owner).unwrap();
    }
    session
}

// =============================================================================
// Session Benchmarks
// =============================================================================

fn bench_session_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    for count in [10usize, 100] {
        group.bench_with_input(BenchmarkId::new("tick", count), &count, |b, &count| {
            let mut session = session_with_instances(count);
            b.iter(|| {
                let report = session.tick();
                session.notify(&WaitEvent::DialogueClosed { channel: 0 });
                black_box(report)
            });
        });
    }
    group.finish();
}

// =============================================================================
// Snapshot Benchmarks
// =============================================================================

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    let mut session = session_with_instances(100);
    session.run(3);
    let snapshot = session.snapshot();
    let bytes = to_bytes(&snapshot).unwrap();

    group.bench_function("to_bytes", |b| b.iter(|| to_bytes(black_box(&snapshot))));
    group.bench_function("from_bytes", |b| b.iter(|| from_bytes(black_box(&bytes))));
    group.bench_function("restore", |b| {
        b.iter(|| {
            let mut copy = Session::new(0);
            copy.restore(snapshot.clone()).unwrap();
            copy
        });
    });
    group.finish();
}

criterion_group!(benches, bench_session_tick, bench_snapshot);
criterion_main!(benches);
