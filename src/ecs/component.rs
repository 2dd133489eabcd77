//! Abstract `Component` trait and the process-wide registry of component types.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::bitset::Bitset256;
use super::entity::Entity;
use super::world::Runtime;
use crate::errors::*;

/// Abstract component trait. Components are plain data attached to entities.
///
/// `Clone` is required so that prefabs can be copied type-erased, and `name` is
/// the key used by the name-based bridge `Runtime::set_by_name`.
pub trait Component: Any + Clone + Send + Sync {
    /// The name this component type is registered under.
    fn name() -> &'static str {
        ::std::any::type_name::<Self>()
    }
}

/// Declare a struct as component. Internally, this macro will impl the trait
/// `Component` with the bare identifier as the registered name.
#[macro_export]
macro_rules! declare_component {
    ( $CMP:ident ) => {
        impl $crate::ecs::Component for $CMP {
            fn name() -> &'static str {
                stringify!($CMP)
            }
        }
    };
}

/// A small stable integer identifying a registered component type. Id `0` is
/// reserved as invalid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentHandle {
    id: u32,
}

impl ComponentHandle {
    /// The reserved invalid handle.
    pub const INVALID: ComponentHandle = ComponentHandle { id: 0 };

    #[inline]
    pub(crate) fn new(id: u32) -> Self {
        ComponentHandle { id }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// Index of the presence block this handle's bit lives in.
    #[inline]
    pub fn block(&self) -> usize {
        self.id as usize / Bitset256::WIDTH
    }

    /// Bit position inside `block()`.
    #[inline]
    pub fn bit(&self) -> usize {
        self.id as usize % Bitset256::WIDTH
    }
}

impl fmt::Display for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ComponentHandle({})", self.id)
    }
}

/// Type-erased operations captured when a component type is first registered.
#[derive(Clone, Copy)]
pub struct ComponentVTable {
    /// Downcasts a boxed value to the component type and sets it on an entity.
    pub set_boxed: fn(&mut Runtime, Entity, Box<dyn Any + Send>) -> Result<()>,
    /// Clones the component from the first entity onto the second.
    pub copy: fn(&mut Runtime, Entity, Entity) -> Result<()>,
}

impl ComponentVTable {
    fn of<T: Component>() -> Self {
        ComponentVTable {
            set_boxed: set_boxed::<T>,
            copy: copy_component::<T>,
        }
    }
}

fn set_boxed<T: Component>(runtime: &mut Runtime, entity: Entity, value: Box<dyn Any + Send>) -> Result<()> {
    let value = value
        .downcast::<T>()
        .map_err(|_| Error::TypeMismatch(T::name()))?;

    runtime.set(entity, *value)?;
    Ok(())
}

fn copy_component<T: Component>(runtime: &mut Runtime, src: Entity, dst: Entity) -> Result<()> {
    let value = runtime.get::<T>(src)?.clone();
    runtime.set(dst, value)?;
    Ok(())
}

/// Everything the registry knows about a component type.
#[derive(Clone, Copy)]
pub struct ComponentInfo {
    pub handle: ComponentHandle,
    pub name: &'static str,
    pub type_id: TypeId,
    pub vtable: ComponentVTable,
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .finish()
    }
}

struct Registry {
    by_type: HashMap<TypeId, ComponentHandle>,
    by_name: HashMap<&'static str, ComponentHandle>,
    infos: Vec<ComponentInfo>,
    blocks_per_entity: usize,
}

/// Maps component types to handles. Registration happens on first use and is
/// guarded by a lock, so it is safe to race from several threads.
pub struct ComponentTypes {
    inner: RwLock<Registry>,
}

impl Default for ComponentTypes {
    fn default() -> Self {
        ComponentTypes::new()
    }
}

impl ComponentTypes {
    pub fn new() -> Self {
        ComponentTypes {
            inner: RwLock::new(Registry {
                by_type: HashMap::new(),
                by_name: HashMap::new(),
                infos: Vec::new(),
                blocks_per_entity: 1,
            }),
        }
    }

    /// Returns the handle of `T`, registering it on first call.
    pub fn handle_of<T: Component>(&self) -> ComponentHandle {
        if let Some(handle) = self.lookup::<T>() {
            return handle;
        }

        let mut inner = self.inner.write();

        // Someone else may have won the race between the two locks.
        if let Some(handle) = inner.by_type.get(&TypeId::of::<T>()) {
            return *handle;
        }

        let handle = ComponentHandle::new(inner.infos.len() as u32 + 1);
        let name = T::name();

        inner.by_type.insert(TypeId::of::<T>(), handle);
        if inner.by_name.contains_key(name) {
            warn!("Component name {} is shared by several types, name lookups resolve to the first.", name);
        } else {
            inner.by_name.insert(name, handle);
        }

        inner.infos.push(ComponentInfo {
            handle,
            name,
            type_id: TypeId::of::<T>(),
            vtable: ComponentVTable::of::<T>(),
        });

        let blocks = handle.block() + 1;
        if blocks > inner.blocks_per_entity {
            debug!("Presence masks grow from {} to {} blocks per entity.", inner.blocks_per_entity, blocks);
            inner.blocks_per_entity = blocks;
        }

        debug!("Registered component {} as {}.", name, handle);
        handle
    }

    /// Returns the handle of `T` if it has been registered.
    #[inline]
    pub fn lookup<T: Component>(&self) -> Option<ComponentHandle> {
        self.inner.read().by_type.get(&TypeId::of::<T>()).cloned()
    }

    /// Returns the handle registered under `name`.
    pub fn by_name(&self, name: &str) -> Option<ComponentHandle> {
        self.inner.read().by_name.get(name).cloned()
    }

    pub fn info(&self, handle: ComponentHandle) -> Option<ComponentInfo> {
        if !handle.is_valid() {
            return None;
        }

        self.inner.read().infos.get(handle.id() as usize - 1).cloned()
    }

    /// Snapshot of every registered component, in handle order.
    pub fn infos(&self) -> Vec<ComponentInfo> {
        self.inner.read().infos.clone()
    }

    /// Number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.read().infos.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of presence blocks every entity needs to fit the highest handle.
    /// Never shrinks.
    #[inline]
    pub fn blocks_per_entity(&self) -> usize {
        self.inner.read().blocks_per_entity
    }
}

impl fmt::Debug for ComponentTypes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ComponentTypes")
            .field("infos", &inner.infos)
            .field("blocks_per_entity", &inner.blocks_per_entity)
            .finish()
    }
}
