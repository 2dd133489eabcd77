use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use signals::prelude::*;

#[derive(Debug, Copy, Clone, Default)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Copy, Clone, Default)]
struct Velocity {
    x: f32,
    y: f32,
}

#[derive(Debug, Copy, Clone, Default)]
struct Frozen;

declare_component!(Position);
declare_component!(Velocity);
declare_component!(Frozen);

const ENTITIES: usize = 10_000;

fn setup() -> Runtime {
    let mut runtime = Runtime::with_settings(RuntimeSettings {
        notify: false,
        entity_capacity: ENTITIES,
    });

    for i in 0..ENTITIES {
        let e = runtime.create(World::DEFAULT).unwrap();
        runtime.set(e, Position::default()).unwrap();
        if i % 2 == 0 {
            runtime.set(e, Velocity { x: 1.0, y: 1.0 }).unwrap();
        }

        if i % 7 == 0 {
            runtime.set(e, Frozen).unwrap();
        }
    }

    // Component notifications are always sent.
    runtime.read::<ComponentAdded<Position>>(World::DEFAULT);
    runtime.read::<ComponentAdded<Velocity>>(World::DEFAULT);
    runtime.read::<ComponentAdded<Frozen>>(World::DEFAULT);
    runtime
}

fn query(c: &mut Criterion) {
    let runtime = setup();
    let mut group = c.benchmark_group("query");

    group.bench_function("with_2", |b| {
        let query = runtime.query(World::DEFAULT).with::<Position>().with::<Velocity>();
        b.iter(|| black_box(query.iter().count()));
    });

    group.bench_function("with_2_without_1", |b| {
        let query = runtime
            .query(World::DEFAULT)
            .with::<Position>()
            .with::<Velocity>()
            .without::<Frozen>();
        b.iter(|| black_box(query.iter().count()));
    });

    group.bench_function("read_matches", |b| {
        let query = runtime.query(World::DEFAULT).with::<Velocity>();
        b.iter(|| {
            let mut sum = 0.0;
            for e in &query {
                sum += runtime.get::<Velocity>(e).unwrap().x;
            }

            black_box(sum)
        });
    });

    group.finish();
}

fn lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("lifecycle");

    group.bench_function("create_set_destroy", |b| {
        b.iter_batched(
            setup,
            |mut runtime| {
                let entities: Vec<_> = runtime.query(World::DEFAULT).with::<Frozen>().iter().collect();
                for e in entities {
                    runtime.destroy(e);
                }

                for _ in 0..1000 {
                    let e = runtime.create(World::DEFAULT).unwrap();
                    runtime.set(e, Velocity::default()).unwrap();
                }

                black_box(runtime)
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, query, lifecycle);
criterion_main!(benches);
