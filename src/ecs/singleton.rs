//! World-level and process-global singleton components.
//!
//! A world singleton is one value of a component type per world, indexed by world
//! directly. Setting or removing one also maintains the world's singleton mask,
//! which is what `Runtime::query_worlds` matches against.

use std::any::Any;

use super::component::Component;
use super::storage::AnyStorage;
use super::world::{Runtime, World};
use crate::errors::*;

/// One optional value per world.
pub struct Singletons<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Singletons<T> {
    fn default() -> Self {
        Singletons { slots: Vec::new() }
    }
}

impl<T> Singletons<T> {
    #[inline]
    pub fn get(&self, world: usize) -> Option<&T> {
        self.slots.get(world)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, world: usize) -> Option<&mut T> {
        self.slots.get_mut(world)?.as_mut()
    }

    /// Stores `value` for `world`, growing to a power-of-two slot count.
    pub fn set(&mut self, world: usize, value: T) -> &mut T {
        if world >= self.slots.len() {
            let len = (world + 1).next_power_of_two();
            self.slots.resize_with(len, || None);
        }

        let slot = &mut self.slots[world];
        *slot = None;
        slot.get_or_insert(value)
    }

    #[inline]
    pub fn remove(&mut self, world: usize) -> Option<T> {
        self.slots.get_mut(world)?.take()
    }
}

impl<T: Any + Send + Sync> AnyStorage for Singletons<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn discard(&mut self, world: u32) {
        self.remove(world as usize);
    }

    fn count(&self) -> usize {
        self.slots.iter().filter(|v| v.is_some()).count()
    }
}

/// A single process-global value.
pub struct Global<T>(Option<T>);

impl<T> Default for Global<T> {
    fn default() -> Self {
        Global(None)
    }
}

impl<T: Any + Send + Sync> AnyStorage for Global<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn discard(&mut self, _: u32) {
        self.0 = None;
    }

    fn count(&self) -> usize {
        self.0.is_some() as usize
    }
}

impl Runtime {
    /// Returns true if `world` holds a singleton `T`.
    pub fn has_singleton<T: Component>(&self, world: World) -> bool {
        self.types
            .lookup::<T>()
            .and_then(|handle| self.singletons.get::<Singletons<T>>(handle))
            .map_or(false, |v| v.get(world.index() as usize).is_some())
    }

    /// Returns a reference to the singleton `T` of `world`.
    pub fn singleton<T: Component>(&self, world: World) -> Result<&T> {
        self.types
            .lookup::<T>()
            .and_then(|handle| self.singletons.get::<Singletons<T>>(handle))
            .and_then(|v| v.get(world.index() as usize))
            .ok_or_else(|| Error::ComponentNotPresent {
                owner: world.to_string(),
                component: T::name(),
            })
    }

    /// Returns a mutable reference to the singleton `T` of `world`.
    pub fn singleton_mut<T: Component>(&mut self, world: World) -> Result<&mut T> {
        let handle = self.types.lookup::<T>();
        let singletons = &mut self.singletons;

        handle
            .and_then(move |handle| singletons.get_mut::<Singletons<T>>(handle))
            .and_then(|v| v.get_mut(world.index() as usize))
            .ok_or_else(|| Error::ComponentNotPresent {
                owner: world.to_string(),
                component: T::name(),
            })
    }

    /// Sets the singleton `T` of `world`, overwriting any previous value.
    pub fn set_singleton<T: Component>(&mut self, world: World, value: T) -> Result<&mut T> {
        let handle = self.types.handle_of::<T>();
        let len = self.worlds.len();

        let data = match self.worlds.get_mut(world.index() as usize) {
            Some(data) => data,
            None => {
                warn!("Tried to set singleton {} on unknown {}.", T::name(), world);
                return Err(Error::OutOfRange {
                    index: world.index() as usize,
                    len,
                });
            }
        };

        let singletons = self
            .singletons
            .get_or_insert_with(handle, T::name(), Singletons::<T>::default)?;

        data.singleton_mask.set(handle.id() as usize);
        Ok(singletons.set(world.index() as usize, value))
    }

    /// Removes the singleton `T` of `world` and returns it.
    pub fn remove_singleton<T: Component>(&mut self, world: World) -> Option<T> {
        let handle = self.types.lookup::<T>()?;
        let value = self
            .singletons
            .get_mut::<Singletons<T>>(handle)?
            .remove(world.index() as usize)?;

        if let Some(data) = self.data_mut(world) {
            data.singleton_mask.clear(handle.id() as usize);
        }

        Some(value)
    }

    /// Returns true if the process-global `T` is set.
    pub fn has_global<T: Component>(&self) -> bool {
        self.global::<T>().is_ok()
    }

    /// Returns a reference to the process-global `T`.
    pub fn global<T: Component>(&self) -> Result<&T> {
        self.types
            .lookup::<T>()
            .and_then(|handle| self.globals.get::<Global<T>>(handle))
            .and_then(|v| v.0.as_ref())
            .ok_or_else(|| Error::ComponentNotPresent {
                owner: "global".to_owned(),
                component: T::name(),
            })
    }

    /// Returns a mutable reference to the process-global `T`.
    pub fn global_mut<T: Component>(&mut self) -> Result<&mut T> {
        let handle = self.types.lookup::<T>();
        let globals = &mut self.globals;

        handle
            .and_then(move |handle| globals.get_mut::<Global<T>>(handle))
            .and_then(|v| v.0.as_mut())
            .ok_or_else(|| Error::ComponentNotPresent {
                owner: "global".to_owned(),
                component: T::name(),
            })
    }

    /// Sets the process-global `T`, overwriting any previous value.
    pub fn set_global<T: Component>(&mut self, value: T) -> Result<&mut T> {
        let handle = self.types.handle_of::<T>();
        let global = self
            .globals
            .get_or_insert_with(handle, T::name(), Global::<T>::default)?;

        global.0 = None;
        Ok(global.0.get_or_insert(value))
    }

    /// Removes the process-global `T` and returns it.
    pub fn remove_global<T: Component>(&mut self) -> Option<T> {
        let handle = self.types.lookup::<T>()?;
        self.globals.get_mut::<Global<T>>(handle)?.0.take()
    }
}
