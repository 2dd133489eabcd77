//! Entity-centric views over a `Runtime`.

use super::component::{Component, ComponentHandle};
use super::entity::Entity;
use super::world::{Runtime, World};
use crate::errors::*;

/// Read-only access to the components of one entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'r> {
    runtime: &'r Runtime,
    entity: Entity,
}

impl<'r> EntityRef<'r> {
    #[inline]
    pub fn id(&self) -> Entity {
        self.entity
    }

    #[inline]
    pub fn valid(&self) -> bool {
        self.runtime.is_valid(self.entity)
    }

    #[inline]
    pub fn has<T: Component>(&self) -> bool {
        self.runtime.has::<T>(self.entity)
    }

    #[inline]
    pub fn get<T: Component>(&self) -> Result<&'r T> {
        self.runtime.get::<T>(self.entity)
    }

    /// Handles of every component attached to this entity.
    pub fn components(&self) -> Vec<ComponentHandle> {
        self.runtime.component_handles(self.entity)
    }
}

/// Mutable access to the components of one entity.
#[derive(Debug)]
pub struct EntityMut<'r> {
    runtime: &'r mut Runtime,
    entity: Entity,
}

impl<'r> EntityMut<'r> {
    #[inline]
    pub fn id(&self) -> Entity {
        self.entity
    }

    #[inline]
    pub fn valid(&self) -> bool {
        self.runtime.is_valid(self.entity)
    }

    #[inline]
    pub fn has<T: Component>(&self) -> bool {
        self.runtime.has::<T>(self.entity)
    }

    #[inline]
    pub fn get<T: Component>(&self) -> Result<&T> {
        self.runtime.get::<T>(self.entity)
    }

    #[inline]
    pub fn get_mut<T: Component>(&mut self) -> Result<&mut T> {
        self.runtime.get_mut::<T>(self.entity)
    }

    #[inline]
    pub fn set<T: Component>(&mut self, value: T) -> Result<&mut T> {
        self.runtime.set(self.entity, value)
    }

    #[inline]
    pub fn remove<T: Component>(&mut self) -> Option<T> {
        self.runtime.remove::<T>(self.entity)
    }

    /// Destroys the entity, consuming the view.
    pub fn destroy(self) -> bool {
        self.runtime.destroy(self.entity)
    }
}

/// Creates an entity and attaches components to it in one expression. The first
/// failure is kept and reported by `finish`, which then destroys the entity.
pub struct EntityBuilder<'r> {
    runtime: &'r mut Runtime,
    entity: Entity,
    error: Option<Error>,
}

impl<'r> EntityBuilder<'r> {
    pub fn with<T: Component>(&mut self, value: T) -> &mut Self {
        if self.error.is_none() {
            if let Err(err) = self.runtime.set(self.entity, value) {
                self.error = Some(err);
            }
        }

        self
    }

    pub fn with_default<T: Component + Default>(&mut self) -> &mut Self {
        self.with(T::default())
    }

    pub fn finish(&mut self) -> Result<Entity> {
        match self.error.take() {
            Some(err) => {
                if self.runtime.is_valid(self.entity) {
                    self.runtime.destroy(self.entity);
                }

                Err(err)
            }
            None => Ok(self.entity),
        }
    }
}

impl Runtime {
    /// Returns a read-only view of `entity`.
    pub fn entity(&self, entity: Entity) -> EntityRef<'_> {
        EntityRef {
            runtime: self,
            entity,
        }
    }

    /// Returns a mutable view of `entity`.
    pub fn entity_mut(&mut self, entity: Entity) -> EntityMut<'_> {
        EntityMut {
            runtime: self,
            entity,
        }
    }

    /// Creates an entity in `world` and returns a builder to attach components.
    pub fn build(&mut self, world: World) -> EntityBuilder<'_> {
        let (entity, error) = match self.create(world) {
            Ok(entity) => (entity, None),
            Err(err) => (Entity::INVALID, Some(err)),
        };

        EntityBuilder {
            runtime: self,
            entity,
            error,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Position {
        x: i32,
        y: i32,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Velocity {
        x: i32,
        y: i32,
    }

    declare_component!(Position);
    declare_component!(Velocity);

    #[test]
    fn views() {
        let mut runtime = Runtime::new();
        let e = runtime.create(World::DEFAULT).unwrap();

        {
            let mut view = runtime.entity_mut(e);
            view.set(Position { x: 1, y: 2 }).unwrap();
            view.get_mut::<Position>().unwrap().x = 3;
            assert!(view.has::<Position>());
            assert_eq!(view.remove::<Velocity>(), None);
        }

        let view = runtime.entity(e);
        assert!(view.valid());
        assert_eq!(view.get::<Position>().unwrap().x, 3);
        assert_eq!(view.components(), vec![runtime.handle_of::<Position>()]);
        assert!(view.get::<Velocity>().is_err());

        assert!(runtime.entity_mut(e).destroy());
        assert!(!runtime.entity(e).valid());
    }

    #[test]
    fn builder() {
        let mut runtime = Runtime::new();
        let e = runtime
            .build(World::DEFAULT)
            .with_default::<Position>()
            .with(Velocity { x: 1, y: 1 })
            .finish()
            .unwrap();

        assert_eq!(*runtime.get::<Position>(e).unwrap(), Position::default());
        assert_eq!(runtime.get::<Velocity>(e).unwrap().x, 1);

        assert!(runtime.build(World::new(12)).with_default::<Position>().finish().is_err());
        assert_eq!(runtime.entity_count(World::DEFAULT), 1);
    }
}
