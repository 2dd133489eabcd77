extern crate signals;

use signals::prelude::*;
use std::any::Any;

#[derive(Debug, Clone, PartialEq)]
struct Health(u32);

#[derive(Debug, Clone, PartialEq)]
struct Speed(f32);

declare_component!(Health);
declare_component!(Speed);

/// What a data-driven loader would do: resolve components by name and hand over
/// opaque values.
fn load(runtime: &mut Runtime, identifier: &str, fields: Vec<(&str, Box<dyn Any + Send>)>) -> Result<Prefab> {
    let prefab = runtime.create_prefab(identifier)?;
    for (name, value) in fields {
        runtime.set_by_name(prefab.entity(), name, value)?;
    }

    Ok(prefab)
}

#[test]
fn data_driven() {
    let mut runtime = Runtime::new();
    runtime.handle_of::<Health>();
    runtime.handle_of::<Speed>();

    let wolf = load(
        &mut runtime,
        "wolf",
        vec![
            ("Health", Box::new(Health(30)) as Box<dyn Any + Send>),
            ("Speed", Box::new(Speed(2.5)) as Box<dyn Any + Send>),
        ],
    )
    .unwrap();

    let pack: Vec<_> = (0..3)
        .map(|_| runtime.instantiate(wolf, World::DEFAULT).unwrap())
        .collect();

    let found: Vec<_> = runtime
        .query(World::DEFAULT)
        .with::<Health>()
        .with::<Speed>()
        .iter()
        .collect();

    assert_eq!(found, pack);
    assert_eq!(runtime.query(World::DEFAULT).with::<PrefabInfo>().iter().count(), 0);
    assert_eq!(runtime.prefabs().iter().collect::<Vec<_>>(), vec![wolf.entity()]);

    match load(&mut runtime, "bat", vec![("Wings", Box::new(2u8) as Box<dyn Any + Send>)]) {
        Err(Error::UnknownComponentType(name)) => assert_eq!(name, "Wings"),
        other => panic!("unexpected {:?}", other),
    }

    // The prefab was registered before the load failed.
    assert!(runtime.prefab("bat").is_some());
    match load(&mut runtime, "wolf", vec![]) {
        Err(Error::DuplicatePrefab(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn prefab_entities_stay_out_of_world_queries() {
    let mut runtime = Runtime::new();
    let prefab = runtime.create_prefab("lonely").unwrap();
    runtime.set(prefab.entity(), Health(1)).unwrap();

    assert_eq!(runtime.query_across_worlds().with::<Health>().iter().count(), 0);
    assert_eq!(runtime.query(World::PREFAB).with::<Health>().iter().count(), 1);

    let e = runtime.instantiate(prefab, World::DEFAULT).unwrap();
    let worlds: Vec<_> = runtime.query_across_worlds().with::<Health>().iter().collect();
    assert_eq!(worlds, vec![e.world()]);
}
