//! Entity Component System (ECS)
//!
//! Entities are generational handles grouped into isolated worlds. Every world
//! keeps one presence mask per entity, with one bit per registered component type,
//! next to one sparse set per component type holding the actual values. Queries
//! scan the presence masks and never touch the values.
//!
//! All state is owned by a `Runtime`, which starts with a default world and a
//! prefab world.

#[macro_use]
pub mod component;
pub mod bitset;
pub mod entity;
pub mod prefab;
pub mod query;
pub mod signal;
pub mod singleton;
pub mod sparse_set;
pub mod storage;
pub mod view;
pub mod world;

pub use self::bitset::{Bitset256, BitsetArray};
pub use self::component::{Component, ComponentHandle, ComponentInfo, ComponentTypes};
pub use self::entity::Entity;
pub use self::prefab::{Prefab, PrefabInfo};
pub use self::query::{Filter, Query, WorldEntityQuery, WorldQuery};
pub use self::signal::{ComponentAdded, ComponentRemoved, EntityCreated, EntityDestroyed, Signal};
pub use self::sparse_set::SparseSet;
pub use self::view::{EntityBuilder, EntityMut, EntityRef};
pub use self::world::{Runtime, World};
