//! Per-world notification outboxes.
//!
//! Signals are buffered per world and per signal type until someone reads them.
//! Reading drains the buffer; there is no push-style subscription.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::mem;

use super::component::Component;
use super::entity::Entity;
use super::world::{Runtime, World};
use crate::errors::*;

/// Marker trait of everything that can be sent through an outbox.
pub trait Signal: Any + Send + Sync {}

/// An entity has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityCreated {
    pub entity: Entity,
}

impl Signal for EntityCreated {}

/// An entity is about to be destroyed. It still holds its components when the
/// signal is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDestroyed {
    pub entity: Entity,
}

impl Signal for EntityDestroyed {}

/// A component has been set, carrying the value as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentAdded<T: Component> {
    pub entity: Entity,
    pub value: T,
}

impl<T: Component> Signal for ComponentAdded<T> {}

/// A component has been removed, carrying the removed value.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRemoved<T: Component> {
    pub entity: Entity,
    pub value: T,
}

impl<T: Component> Signal for ComponentRemoved<T> {}

/// Buffers of pending signals, one per signal type.
#[derive(Default)]
pub struct Outbox {
    queues: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Outbox {
    pub fn new() -> Self {
        Outbox {
            queues: HashMap::new(),
        }
    }

    /// Appends `signal` to its buffer.
    pub fn send<S: Signal>(&mut self, signal: S) {
        let queue = self
            .queues
            .entry(TypeId::of::<S>())
            .or_insert_with(|| Box::new(Vec::<S>::new()));

        if let Some(queue) = queue.downcast_mut::<Vec<S>>() {
            queue.push(signal);
        }
    }

    /// Takes every buffered signal of type `S`, oldest first.
    pub fn drain<S: Signal>(&mut self) -> Vec<S> {
        self.queues
            .get_mut(&TypeId::of::<S>())
            .and_then(|v| v.downcast_mut::<Vec<S>>())
            .map(|v| mem::replace(v, Vec::new()))
            .unwrap_or_default()
    }

    /// Number of buffered signals of type `S`.
    pub fn pending<S: Signal>(&self) -> usize {
        self.queues
            .get(&TypeId::of::<S>())
            .and_then(|v| v.downcast_ref::<Vec<S>>())
            .map_or(0, |v| v.len())
    }
}

impl Runtime {
    /// Buffers a signal in the outbox of `world`.
    pub fn send<S: Signal>(&mut self, world: World, signal: S) -> Result<()> {
        self.data_or_err(world)?.signals.send(signal);
        Ok(())
    }

    /// Returns every signal of type `S` buffered in `world` since the last read,
    /// and clears the buffer.
    pub fn read<S: Signal>(&mut self, world: World) -> Vec<S> {
        match self.data_mut(world) {
            Some(data) => data.signals.drain::<S>(),
            None => Vec::new(),
        }
    }

    /// Number of signals of type `S` waiting in `world`.
    pub fn pending<S: Signal>(&self, world: World) -> usize {
        self.data(world).map_or(0, |v| v.signals.pending::<S>())
    }
}
