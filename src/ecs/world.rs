use std::fmt;

use serde::{Deserialize, Serialize};

use super::bitset::{Bitset256, BitsetArray};
use super::component::{Component, ComponentHandle, ComponentInfo, ComponentTypes};
use super::entity::{Entity, EntityTable};
use super::prefab::PrefabRegistry;
use super::signal::{ComponentAdded, ComponentRemoved, EntityCreated, EntityDestroyed, Outbox};
use super::sparse_set::SparseSet;
use super::storage::Storages;
use crate::errors::*;
use crate::settings::{RuntimeSettings, WorldOptions};

/// A handle to an isolated namespace of entities and component storages.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct World {
    index: u32,
}

impl World {
    /// The world every runtime starts with.
    pub const DEFAULT: World = World { index: 0 };
    /// The world holding prefab templates. It is skipped by cross-world entity
    /// queries.
    pub const PREFAB: World = World { index: 1 };

    #[inline]
    pub fn new(index: u32) -> Self {
        World { index }
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "World({})", self.index)
    }
}

pub(crate) struct WorldData {
    pub options: WorldOptions,
    pub entities: EntityTable,
    pub storages: Storages,
    pub singleton_mask: BitsetArray,
    pub signals: Outbox,
}

impl WorldData {
    fn new(options: WorldOptions, stride: usize) -> Self {
        WorldData {
            entities: EntityTable::with_capacity(options.entity_capacity, stride),
            options,
            storages: Storages::new(),
            singleton_mask: BitsetArray::new(),
            signals: Outbox::new(),
        }
    }
}

/// The `Runtime` struct contains all the data, which is worlds, their entities
/// and components, plus the registry of component types shared by all of them.
///
/// Mutation goes through `&mut Runtime`, while queries borrow it shared. That
/// keeps entities from being created or destroyed under a running query.
pub struct Runtime {
    pub(crate) settings: RuntimeSettings,
    pub(crate) types: ComponentTypes,
    pub(crate) worlds: Vec<WorldData>,
    pub(crate) singletons: Storages,
    pub(crate) globals: Storages,
    pub(crate) prefabs: PrefabRegistry,
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

impl Runtime {
    /// Constructs a new `Runtime` with default settings, holding the default
    /// and the prefab world.
    pub fn new() -> Self {
        Runtime::with_settings(RuntimeSettings::default())
    }

    /// Constructs a new `Runtime` with the specified settings.
    pub fn with_settings(settings: RuntimeSettings) -> Self {
        let mut runtime = Runtime {
            types: ComponentTypes::new(),
            worlds: Vec::new(),
            singletons: Storages::new(),
            globals: Storages::new(),
            prefabs: PrefabRegistry::default(),
            settings,
        };

        let defaults = WorldOptions {
            entity_capacity: runtime.settings.entity_capacity,
            ..WorldOptions::named("default")
        };

        runtime.create_world(defaults);
        runtime.create_world(WorldOptions::named("prefab"));

        info!("Runtime initialized with {:?}.", runtime.settings);
        runtime
    }

    #[inline]
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Appends a new world and returns its handle.
    pub fn create_world(&mut self, options: WorldOptions) -> World {
        let world = World::new(self.worlds.len() as u32);
        info!("Created {} with {:?}.", world, options);

        let stride = self.types.blocks_per_entity();
        self.worlds.push(WorldData::new(options, stride));
        world
    }

    /// Returns the handle of the world at `index`.
    pub fn world(&self, index: usize) -> Result<World> {
        if index < self.worlds.len() {
            Ok(World::new(index as u32))
        } else {
            Err(Error::OutOfRange {
                index,
                len: self.worlds.len(),
            })
        }
    }

    #[inline]
    pub fn default_world(&self) -> World {
        World::DEFAULT
    }

    #[inline]
    pub fn prefab_world(&self) -> World {
        World::PREFAB
    }

    /// Returns the number of worlds.
    #[inline]
    pub fn world_count(&self) -> usize {
        self.worlds.len()
    }

    #[inline]
    pub fn contains_world(&self, world: World) -> bool {
        (world.index() as usize) < self.worlds.len()
    }

    pub fn world_options(&self, world: World) -> Option<&WorldOptions> {
        self.data(world).map(|v| &v.options)
    }

    #[inline]
    pub(crate) fn data(&self, world: World) -> Option<&WorldData> {
        self.worlds.get(world.index() as usize)
    }

    #[inline]
    pub(crate) fn data_mut(&mut self, world: World) -> Option<&mut WorldData> {
        self.worlds.get_mut(world.index() as usize)
    }

    pub(crate) fn data_or_err(&mut self, world: World) -> Result<&mut WorldData> {
        let len = self.worlds.len();
        self.worlds
            .get_mut(world.index() as usize)
            .ok_or(Error::OutOfRange {
                index: world.index() as usize,
                len,
            })
    }
}

impl Runtime {
    /// Returns the handle of component `T`, registering it on first use.
    #[inline]
    pub fn handle_of<T: Component>(&self) -> ComponentHandle {
        self.types.handle_of::<T>()
    }

    /// Returns the handle of the component registered under `name`.
    pub fn handle_by_name(&self, name: &str) -> Result<ComponentHandle> {
        self.types
            .by_name(name)
            .ok_or_else(|| Error::UnknownComponentType(name.to_owned()))
    }

    pub fn component_info(&self, handle: ComponentHandle) -> Option<ComponentInfo> {
        self.types.info(handle)
    }

    /// Returns the number of registered component types.
    #[inline]
    pub fn component_count(&self) -> usize {
        self.types.len()
    }
}

impl Runtime {
    /// Creates a new entity in `world`. Emits `EntityCreated` unless notifications
    /// are disabled in the settings.
    pub fn create(&mut self, world: World) -> Result<Entity> {
        let notify = self.settings.notify;
        self.create_with(world, notify)
    }

    /// Creates a new entity in `world` without emitting a notification.
    pub fn create_silent(&mut self, world: World) -> Result<Entity> {
        self.create_with(world, false)
    }

    fn create_with(&mut self, world: World, notify: bool) -> Result<Entity> {
        let stride = self.types.blocks_per_entity();
        let data = self.data_or_err(world)?;

        data.entities.ensure_stride(stride);
        let entity = data.entities.create(world);

        if notify {
            data.signals.send(EntityCreated { entity });
        }

        trace!("Created {}.", entity);
        Ok(entity)
    }

    /// Destroys `entity`, dropping all of its components. Returns false if the
    /// entity is not alive.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        let notify = self.settings.notify;
        self.destroy_with(entity, notify)
    }

    /// Destroys `entity` without emitting a notification.
    pub fn destroy_silent(&mut self, entity: Entity) -> bool {
        self.destroy_with(entity, false)
    }

    fn destroy_with(&mut self, entity: Entity, notify: bool) -> bool {
        if !self.is_valid(entity) {
            warn!("Tried to destroy {} which is not alive.", entity);
            return false;
        }

        let data = &mut self.worlds[entity.world().index() as usize];
        if notify {
            data.signals.send(EntityDestroyed { entity });
        }

        for handle in data.entities.component_handles(entity.index() as usize) {
            if let Some(storage) = data.storages.get_dyn_mut(handle) {
                storage.discard(entity.index());
            }
        }

        data.entities.destroy(entity.world(), entity.index());
        trace!("Destroyed {}.", entity);
        true
    }

    /// Returns true if `entity` is alive: its world exists, its index is in
    /// range, and its generation matches the live occupant of the slot.
    pub fn is_valid(&self, entity: Entity) -> bool {
        self.data(entity.world())
            .map_or(false, |v| v.entities.is_valid(entity))
    }

    /// Returns the number of alive entities in `world`.
    pub fn entity_count(&self, world: World) -> usize {
        self.data(world).map_or(0, |v| v.entities.len())
    }
}

impl Runtime {
    /// Returns true if `entity` is alive and has component `T`.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        match self.types.lookup::<T>() {
            Some(handle) => self.has_handle(entity, handle),
            None => false,
        }
    }

    /// Returns true if `entity` is alive and has the component of `handle`.
    pub fn has_handle(&self, entity: Entity, handle: ComponentHandle) -> bool {
        match self.data(entity.world()) {
            Some(data) if data.entities.is_valid(entity) => {
                data.entities.has_bit(entity.index() as usize, handle)
            }
            _ => false,
        }
    }

    /// Returns true if `entity` is alive and its presence mask holds every bit
    /// of `required`.
    pub fn has_all(&self, entity: Entity, required: &[Bitset256]) -> bool {
        match self.data(entity.world()) {
            Some(data) if data.entities.is_valid(entity) => {
                data.entities.has_all(entity.index() as usize, required)
            }
            _ => false,
        }
    }

    /// Returns true if `entity` is alive and its presence mask shares a bit with
    /// `mask`.
    pub fn has_any(&self, entity: Entity, mask: &[Bitset256]) -> bool {
        match self.data(entity.world()) {
            Some(data) if data.entities.is_valid(entity) => {
                data.entities.has_any(entity.index() as usize, mask)
            }
            _ => false,
        }
    }

    /// Returns a reference to the component `T` of `entity`.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T> {
        let data = match self.data(entity.world()) {
            Some(data) if data.entities.is_valid(entity) => data,
            _ => return Err(Error::InvalidEntity(entity)),
        };

        self.types
            .lookup::<T>()
            .and_then(|handle| data.storages.get::<SparseSet<T>>(handle))
            .and_then(|storage| storage.get(entity.index()))
            .ok_or_else(|| Error::ComponentNotPresent {
                owner: entity.to_string(),
                component: T::name(),
            })
    }

    /// Returns a mutable reference to the component `T` of `entity`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        let handle = self.types.lookup::<T>();
        let data = match self.worlds.get_mut(entity.world().index() as usize) {
            Some(data) if data.entities.is_valid(entity) => data,
            _ => return Err(Error::InvalidEntity(entity)),
        };

        handle
            .and_then(move |handle| data.storages.get_mut::<SparseSet<T>>(handle))
            .and_then(|storage| storage.get_mut(entity.index()))
            .ok_or_else(|| Error::ComponentNotPresent {
                owner: entity.to_string(),
                component: T::name(),
            })
    }

    /// Sets component `T` of `entity`, overwriting any previous value, and
    /// returns a reference to the stored value. Emits `ComponentAdded` once the
    /// value is in place.
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T> {
        if !self.is_valid(entity) {
            return Err(Error::InvalidEntity(entity));
        }

        let handle = self.types.handle_of::<T>();
        let stride = self.types.blocks_per_entity();
        let slot = entity.index() as usize;

        let data = &mut self.worlds[entity.world().index() as usize];
        data.entities.ensure_stride(stride);

        let storage = data
            .storages
            .get_or_insert_with(handle, T::name(), SparseSet::<T>::new)?;
        data.entities.set_bit(slot, handle)?;

        let stored = storage.add(entity.index(), value);
        data.signals.send(ComponentAdded {
            entity,
            value: stored.clone(),
        });

        Ok(stored)
    }

    /// Removes component `T` from `entity` and returns it. Does nothing if the
    /// entity is not alive or does not have `T`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let handle = self.types.lookup::<T>()?;
        let slot = entity.index() as usize;

        let data = self.worlds.get_mut(entity.world().index() as usize)?;
        if !data.entities.is_valid(entity) || !data.entities.has_bit(slot, handle) {
            return None;
        }

        data.entities.clear_bit(slot, handle);
        let value = data
            .storages
            .get_mut::<SparseSet<T>>(handle)?
            .remove(entity.index())?;

        data.signals.send(ComponentRemoved {
            entity,
            value: value.clone(),
        });

        Some(value)
    }

    /// Returns the handles of every component attached to `entity`, in handle
    /// order.
    pub fn component_handles(&self, entity: Entity) -> Vec<ComponentHandle> {
        match self.data(entity.world()) {
            Some(data) if data.entities.is_valid(entity) => {
                data.entities.component_handles(entity.index() as usize)
            }
            _ => Vec::new(),
        }
    }

    /// Returns the storage of component `T` in `world`, if any value was ever set.
    pub fn sparse_set<T: Component>(&self, world: World) -> Option<&SparseSet<T>> {
        let handle = self.types.lookup::<T>()?;
        self.data(world)?.storages.get::<SparseSet<T>>(handle)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("settings", &self.settings)
            .field("types", &self.types)
            .field("worlds", &self.worlds.len())
            .finish()
    }
}
