extern crate serde_json;
extern crate signals;

use signals::prelude::*;

#[test]
fn load() {
    let settings = RuntimeSettings::from_json(r#"{ "entity_capacity": 300 }"#).unwrap();
    assert!(settings.notify);
    assert_eq!(settings.entity_capacity, 300);

    let mut runtime = Runtime::with_settings(settings.clone());
    assert_eq!(runtime.settings(), &settings);

    let options = WorldOptions::from_json(r#"{ "name": "arena", "supports_multithreading": true }"#).unwrap();
    let world = runtime.create_world(options.clone());
    assert_eq!(runtime.world_options(world), Some(&options));

    assert!(RuntimeSettings::from_json(r#"{ "notify": 3 }"#).is_err());
}

#[test]
fn handles_serialize() {
    let mut runtime = Runtime::new();
    let e = runtime.create(World::DEFAULT).unwrap();

    let json = serde_json::to_string(&e).unwrap();
    let back: Entity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, e);
    assert!(runtime.is_valid(back));

    let handle = runtime.handle_of::<PrefabInfo>();
    let json = serde_json::to_string(&handle).unwrap();
    assert_eq!(serde_json::from_str::<ComponentHandle>(&json).unwrap(), handle);
}
