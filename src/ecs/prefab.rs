//! Prefabs are template entities living in the prefab world. Instantiating one
//! copies its components onto a fresh entity in another world.

use std::any::Any;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::component::Component;
use super::entity::Entity;
use super::query::Query;
use super::world::{Runtime, World};
use crate::errors::*;

/// Tags the entity backing a prefab.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrefabInfo {
    pub identifier: String,
}

impl Component for PrefabInfo {
    fn name() -> &'static str {
        "PrefabInfo"
    }
}

/// A handle to a registered prefab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prefab {
    entity: Entity,
}

impl Prefab {
    /// The template entity in the prefab world.
    #[inline]
    pub fn entity(self) -> Entity {
        self.entity
    }
}

#[derive(Default)]
pub(crate) struct PrefabRegistry {
    by_identifier: HashMap<String, Prefab>,
    by_index: Vec<Prefab>,
}

impl Runtime {
    /// Creates an empty prefab under `identifier`. Components set on its entity
    /// are copied by `instantiate`.
    pub fn create_prefab<T: Into<String>>(&mut self, identifier: T) -> Result<Prefab> {
        let identifier = identifier.into();
        if self.prefabs.by_identifier.contains_key(&identifier) {
            return Err(Error::DuplicatePrefab(identifier));
        }

        let entity = self.create(World::PREFAB)?;
        self.set(
            entity,
            PrefabInfo {
                identifier: identifier.clone(),
            },
        )?;

        let prefab = Prefab { entity };
        debug!("Registered prefab {} as {}.", identifier, entity);

        self.prefabs.by_identifier.insert(identifier, prefab);
        self.prefabs.by_index.push(prefab);
        Ok(prefab)
    }

    /// Returns the prefab registered under `identifier`.
    pub fn prefab(&self, identifier: &str) -> Option<Prefab> {
        self.prefabs.by_identifier.get(identifier).cloned()
    }

    /// Returns the `index`-th registered prefab.
    pub fn prefab_by_index(&self, index: usize) -> Option<Prefab> {
        self.prefabs.by_index.get(index).cloned()
    }

    /// Number of registered prefabs.
    #[inline]
    pub fn prefab_count(&self) -> usize {
        self.prefabs.by_index.len()
    }

    /// A query over every prefab entity.
    pub fn prefabs(&self) -> Query<'_> {
        self.query(World::PREFAB).with::<PrefabInfo>()
    }

    /// Creates an entity in `world` holding a copy of every component of
    /// `prefab`, except its `PrefabInfo`. Either every component is copied or the
    /// new entity is destroyed again.
    pub fn instantiate(&mut self, prefab: Prefab, world: World) -> Result<Entity> {
        if !self.is_valid(prefab.entity) {
            return Err(Error::InvalidEntity(prefab.entity));
        }

        let info = self.types.handle_of::<PrefabInfo>();
        let entity = self.create(world)?;

        for handle in self.component_handles(prefab.entity) {
            if handle == info {
                continue;
            }

            let copy = match self.types.info(handle) {
                Some(v) => v.vtable.copy,
                None => continue,
            };

            if let Err(err) = copy(self, prefab.entity, entity) {
                warn!("Failed to instantiate {:?}: {}", prefab, err);
                self.destroy(entity);
                return Err(err);
            }
        }

        trace!("Instantiated {:?} as {}.", prefab, entity);
        Ok(entity)
    }

    /// Sets a component given its registered name and a boxed value of its type.
    pub fn set_by_name(&mut self, entity: Entity, name: &str, value: Box<dyn Any + Send>) -> Result<()> {
        let handle = self.handle_by_name(name)?;
        let set = match self.types.info(handle) {
            Some(v) => v.vtable.set_boxed,
            None => return Err(Error::UnknownComponentType(name.to_owned())),
        };

        set(self, entity, value)
    }
}
