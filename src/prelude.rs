pub use crate::declare_component;
pub use crate::ecs::{
    Component, ComponentAdded, ComponentHandle, ComponentRemoved, Entity, EntityCreated, EntityDestroyed, Filter,
    Prefab, PrefabInfo, Runtime, Signal, World,
};
pub use crate::errors::{Error, Result};
pub use crate::settings::{RuntimeSettings, WorldOptions};
