use criterion::{black_box, criterion_group, criterion_main, Criterion};
use frametick_timing::{Timer, TimerEngine};

fn bench_timer_tick(c: &mut Criterion) {
    c.bench_function("timer_engine_tick_256_repeating", |b| {
        let engine = TimerEngine::new();
        for id in 0..256 {
            engine.insert(Timer {
                id,
                target_time: (id as u64) % 64,
                interval: 16,
                repeat: true,
            });
        }
        let mut now = 0u64;
        b.iter(|| {
            now += 16;
            black_box(engine.on_tick(black_box(now)));
        });
    });

    c.bench_function("timer_engine_create_delete", |b| {
        let engine = TimerEngine::new();
        b.iter(|| {
            for id in 0..64 {
                engine.create_timer(id, 100, 0.0, false, 0, 0.0);
            }
            for id in 0..64 {
                black_box(engine.delete_timer(id));
            }
        });
    });
}

criterion_group!(benches, bench_timer_tick);
criterion_main!(benches);
