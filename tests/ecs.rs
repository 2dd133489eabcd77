extern crate env_logger;
extern crate rand;
extern crate signals;

use rand::prng::XorShiftRng;
use rand::{Rng, RngCore, SeedableRng};
use signals::prelude::*;
use std::sync::{Arc, RwLock};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
struct Position {
    x: u32,
    y: u32,
}

#[derive(Debug, Clone, Default)]
struct Reference {
    value: Arc<RwLock<usize>>,
}

impl Drop for Reference {
    fn drop(&mut self) {
        *self.value.write().unwrap() += 1;
    }
}

declare_component!(Position);
declare_component!(Reference);

#[derive(Debug, Clone, PartialEq)]
struct Apple {
    data: i32,
}

#[derive(Debug, Clone, PartialEq)]
struct Orange;

declare_component!(Apple);
declare_component!(Orange);

#[test]
fn basic() {
    let _ = env_logger::try_init();
    let mut runtime = Runtime::new();

    let e1 = runtime.create(World::DEFAULT).unwrap();
    runtime.set(e1, Position { x: 1, y: 2 }).unwrap();
    assert!(runtime.has::<Position>(e1));
    assert_eq!(*runtime.get::<Position>(e1).unwrap(), Position { x: 1, y: 2 });

    {
        let p = runtime.get_mut::<Position>(e1).unwrap();
        p.x = 2;
        p.y = 5;
    }

    assert_eq!(*runtime.get::<Position>(e1).unwrap(), Position { x: 2, y: 5 });

    runtime.remove::<Position>(e1);
    assert!(!runtime.has::<Position>(e1));
    assert!(runtime.get::<Position>(e1).is_err());

    // Removing twice is a no-op.
    assert_eq!(runtime.remove::<Position>(e1), None);
    assert!(runtime.is_valid(e1));
}

#[test]
fn set_remove_set() {
    let mut runtime = Runtime::new();
    let e = runtime.create(World::DEFAULT).unwrap();

    runtime.set(e, Apple { data: 10 }).unwrap();
    runtime.remove::<Apple>(e);
    runtime.set(e, Apple { data: 11 }).unwrap();

    assert_eq!(runtime.get::<Apple>(e).unwrap().data, 11);
}

#[test]
fn free() {
    let _ = env_logger::try_init();
    let mut runtime = Runtime::new();

    let e1 = runtime.create(World::DEFAULT).unwrap();
    assert!(runtime.is_valid(e1));
    assert!(!runtime.has::<Position>(e1));
    assert!(runtime.get::<Position>(e1).is_err());

    runtime.set(e1, Position { x: 1, y: 2 }).unwrap();
    assert!(runtime.has::<Position>(e1));

    runtime.destroy(e1);
    assert!(!runtime.is_valid(e1));
    assert!(!runtime.has::<Position>(e1));
    assert!(runtime.get::<Position>(e1).is_err());

    let mut entities = Vec::new();
    let rc = Arc::new(RwLock::new(0));
    for i in 0..10 {
        let e = runtime.create(World::DEFAULT).unwrap();
        let shadow = rc.clone();
        entities.push(e);

        runtime.set(e, Reference { value: shadow }).unwrap();
        if i % 2 == 0 {
            runtime.set(e, Position { x: 1, y: 2 }).unwrap();
        }
    }

    // Notifications hold clones of every value set.
    runtime.read::<ComponentAdded<Reference>>(World::DEFAULT);
    assert_eq!(*rc.read().unwrap(), 10);

    for i in 0..10 {
        runtime.destroy(entities[i]);
        assert_eq!(*rc.read().unwrap(), 10 + i + 1);
    }

    assert_eq!(*rc.read().unwrap(), 20);
}

#[test]
fn duplicated_set() {
    let mut runtime = Runtime::new();

    let e1 = runtime.create(World::DEFAULT).unwrap();
    runtime.set(e1, Position { x: 1, y: 2 }).unwrap();
    runtime.set(e1, Position { x: 2, y: 4 }).unwrap();

    assert_eq!(*runtime.get::<Position>(e1).unwrap(), Position { x: 2, y: 4 });
    assert_eq!(runtime.component_handles(e1).len(), 1);
    assert_eq!(runtime.sparse_set::<Position>(World::DEFAULT).unwrap().len(), 1);
}

#[test]
fn recycle() {
    let mut runtime = Runtime::new();

    let e1 = runtime.create(World::DEFAULT).unwrap();
    let e2 = runtime.create(World::DEFAULT).unwrap();
    assert_eq!((e1.index(), e1.generation()), (0, 1));
    assert_eq!((e2.index(), e2.generation()), (1, 1));

    runtime.set(e1, Apple { data: 1 }).unwrap();
    runtime.set(e1, Orange).unwrap();
    assert!(runtime.destroy(e1));
    assert!(!runtime.is_valid(e1));

    let e3 = runtime.create(World::DEFAULT).unwrap();
    assert_eq!(e3.index(), e1.index());
    assert_eq!(e3.generation(), e1.generation() + 1);
    assert!(!runtime.has::<Apple>(e3));
    assert!(!runtime.has::<Orange>(e3));

    // A stale handle stays dead even though its slot is alive again.
    assert!(!runtime.is_valid(e1));
    assert!(runtime.set(e1, Orange).is_err());
    assert!(!runtime.has::<Orange>(e3));
}

#[test]
fn random_allocate() {
    let mut generator = XorShiftRng::from_seed([7, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
    let mut runtime = Runtime::new();

    let mut v = vec![];
    let mut dead = vec![];
    for i in 3..10 {
        let p = generator.next_u32() % i + 1;
        let r = generator.next_u32() % i + 1;
        for j in 0..100 {
            if j % p == 0 {
                let e = runtime.create(World::DEFAULT).unwrap();
                runtime
                    .set(
                        e,
                        Position {
                            x: e.index(),
                            y: e.generation(),
                        },
                    )
                    .unwrap();

                if j % r == 0 {
                    runtime.set(e, Reference::default()).unwrap();
                }

                v.push(e);
            }
        }

        let size = v.len() / 2;
        for _ in 0..size {
            let len = v.len();
            let e = v.swap_remove(generator.gen_range(0, len));
            assert!(runtime.destroy(e));
            dead.push(e);
        }
    }

    for e in &v {
        assert_eq!(
            *runtime.get::<Position>(*e).unwrap(),
            Position {
                x: e.index(),
                y: e.generation(),
            }
        );
    }

    for e in &dead {
        assert!(!runtime.is_valid(*e));
    }

    // Every alive entity with a position is one we still hold.
    let mut found: Vec<_> = runtime.query(World::DEFAULT).with::<Position>().iter().collect();
    found.sort();
    v.sort();
    assert_eq!(found, v);
}

#[test]
fn iter_with() {
    let mut runtime = Runtime::new();

    let mut v = vec![];
    for i in 0..100 {
        let e = runtime.create(World::DEFAULT).unwrap();

        if i % 2 == 0 {
            runtime
                .set(
                    e,
                    Position {
                        x: e.index(),
                        y: e.generation(),
                    },
                )
                .unwrap();
        }

        if i % 3 == 0 {
            runtime.set(e, Reference::default()).unwrap();
        }

        if i % 2 == 0 && i % 3 == 0 {
            v.push(e);
        }
    }

    let matches: Vec<_> = runtime
        .query(World::DEFAULT)
        .with::<Position>()
        .with::<Reference>()
        .into_iter()
        .collect();

    assert_eq!(matches, v);

    for e in &matches {
        runtime.get_mut::<Position>(*e).unwrap().x += e.generation();
        *runtime.get::<Reference>(*e).unwrap().value.write().unwrap() += 1;
    }

    for e in &v {
        let p = Position {
            x: e.index() + e.generation(),
            y: e.generation(),
        };

        assert_eq!(*runtime.get::<Position>(*e).unwrap(), p);
        assert_eq!(*runtime.get::<Reference>(*e).unwrap().value.read().unwrap(), 1);
    }
}

#[test]
fn builder() {
    let mut runtime = Runtime::new();

    let e1 = runtime.build(World::DEFAULT).with_default::<Position>().finish().unwrap();
    assert!(runtime.has::<Position>(e1));
    assert!(!runtime.has::<Reference>(e1));
}

#[test]
fn handle_stability() {
    let runtime = Runtime::new();

    let apple = runtime.handle_of::<Apple>();
    assert_eq!(runtime.handle_of::<Apple>(), apple);
    assert_ne!(runtime.handle_of::<Orange>(), apple);
    assert_eq!(runtime.handle_by_name("Apple").unwrap(), apple);

    match runtime.handle_by_name("Banana") {
        Err(Error::UnknownComponentType(name)) => assert_eq!(name, "Banana"),
        other => panic!("unexpected {:?}", other),
    }
}
