//! Type-erased containers of component storages, keyed by component handle.

use std::any::Any;

use super::component::ComponentHandle;
use super::sparse_set::SparseSet;
use crate::errors::*;

/// A storage the runtime can hold without knowing its component type.
pub trait AnyStorage: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Drops whatever value is stored under `index`.
    fn discard(&mut self, index: u32);

    /// Number of values stored.
    fn count(&self) -> usize;
}

impl<T: Any + Send + Sync> AnyStorage for SparseSet<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn discard(&mut self, index: u32) {
        self.remove(index);
    }

    fn count(&self) -> usize {
        self.len()
    }
}

/// One optional storage per registered component handle.
#[derive(Default)]
pub struct Storages {
    slots: Vec<Option<Box<dyn AnyStorage>>>,
}

impl Storages {
    pub fn new() -> Self {
        Storages { slots: Vec::new() }
    }

    /// Returns the storage of `handle` if it exists and is of type `S`.
    pub fn get<S: AnyStorage>(&self, handle: ComponentHandle) -> Option<&S> {
        self.slots
            .get(handle.id() as usize)?
            .as_ref()?
            .as_any()
            .downcast_ref::<S>()
    }

    /// Returns the storage of `handle` if it exists and is of type `S`.
    pub fn get_mut<S: AnyStorage>(&mut self, handle: ComponentHandle) -> Option<&mut S> {
        self.slots
            .get_mut(handle.id() as usize)?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<S>()
    }

    /// Returns the storage of `handle`, creating it with `func` if it does not
    /// exist yet.
    pub fn get_or_insert_with<S, F>(&mut self, handle: ComponentHandle, name: &'static str, func: F) -> Result<&mut S>
    where
        S: AnyStorage,
        F: FnOnce() -> S,
    {
        let slot = handle.id() as usize;
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }

        self.slots[slot]
            .get_or_insert_with(|| Box::new(func()) as Box<dyn AnyStorage>)
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or(Error::TypeMismatch(name))
    }

    /// Returns the storage of `handle` without its type.
    pub fn get_dyn_mut(&mut self, handle: ComponentHandle) -> Option<&mut dyn AnyStorage> {
        match self.slots.get_mut(handle.id() as usize) {
            Some(Some(v)) => Some(v.as_mut()),
            _ => None,
        }
    }
}
