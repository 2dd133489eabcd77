//! Queries over the entities of a world, or over worlds.
//!
//! Every query is an immutable value: `with` and `without` return a new query and
//! leave the receiver untouched, so partially built queries can be shared and
//! extended independently.
//!
//! ```
//! # use signals::prelude::*;
//! #[derive(Debug, Clone)]
//! struct Apple;
//! declare_component!(Apple);
//!
//! #[derive(Debug, Clone)]
//! struct Orange;
//! declare_component!(Orange);
//!
//! let mut runtime = Runtime::new();
//! let e1 = runtime.create(World::DEFAULT).unwrap();
//! runtime.set(e1, Apple).unwrap();
//! let e2 = runtime.create(World::DEFAULT).unwrap();
//! runtime.set(e2, Apple).unwrap();
//! runtime.set(e2, Orange).unwrap();
//!
//! let apples = runtime.query(World::DEFAULT).with::<Apple>();
//! assert_eq!(apples.iter().collect::<Vec<_>>(), vec![e1, e2]);
//! assert_eq!(apples.without::<Orange>().iter().collect::<Vec<_>>(), vec![e1]);
//! ```

use std::borrow::Cow;

use super::bitset::{self, Bitset256, BitsetArray};
use super::component::{Component, ComponentHandle};
use super::entity::{Entity, EntityTable};
use super::world::{Runtime, World};

/// A pair of required and excluded component masks.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    required: BitsetArray,
    excluded: BitsetArray,
}

impl Filter {
    /// A filter that matches everything.
    pub fn new() -> Self {
        Filter::default()
    }

    /// Returns a copy of this filter that also requires `handle`.
    pub fn with_handle(&self, handle: ComponentHandle) -> Filter {
        Filter {
            required: self.required.clone_and_set(handle.id() as usize),
            excluded: self.excluded.clone(),
        }
    }

    /// Returns a copy of this filter that also excludes `handle`.
    pub fn without_handle(&self, handle: ComponentHandle) -> Filter {
        Filter {
            required: self.required.clone(),
            excluded: self.excluded.clone_and_set(handle.id() as usize),
        }
    }

    /// Returns the union of both filters' requirements and exclusions.
    pub fn merge(&self, other: &Filter) -> Filter {
        Filter {
            required: self.required.clone_merge(other.required.as_slice()),
            excluded: self.excluded.clone_merge(other.excluded.as_slice()),
        }
    }

    #[inline]
    pub fn required(&self) -> &BitsetArray {
        &self.required
    }

    #[inline]
    pub fn excluded(&self) -> &BitsetArray {
        &self.excluded
    }

    /// Returns true if a presence mask holds every required bit and no excluded
    /// one.
    #[inline]
    pub fn matches(&self, blocks: &[Bitset256]) -> bool {
        bitset::has_all(blocks, self.required.as_slice())
            && !bitset::has_any(blocks, self.excluded.as_slice())
    }
}

macro_rules! impl_filter_builder {
    ($QUERY:ident) => {
        impl<'r> $QUERY<'r> {
            /// Returns a new query that also requires component `T`.
            pub fn with<T: Component>(&self) -> Self {
                let handle = self.runtime.handle_of::<T>();
                $QUERY {
                    filter: self.filter.with_handle(handle),
                    ..self.clone()
                }
            }

            /// Returns a new query that also excludes component `T`.
            pub fn without<T: Component>(&self) -> Self {
                let handle = self.runtime.handle_of::<T>();
                $QUERY {
                    filter: self.filter.without_handle(handle),
                    ..self.clone()
                }
            }

            /// Returns a new query combining this query's filter with `filter`.
            pub fn matching(&self, filter: &Filter) -> Self {
                $QUERY {
                    filter: self.filter.merge(filter),
                    ..self.clone()
                }
            }

            #[inline]
            pub fn filter(&self) -> &Filter {
                &self.filter
            }
        }
    };
}

/// A query over the entities of one world.
#[derive(Debug, Clone)]
pub struct Query<'r> {
    runtime: &'r Runtime,
    world: World,
    filter: Filter,
}

impl_filter_builder!(Query);

impl<'r> Query<'r> {
    #[inline]
    pub fn world(&self) -> World {
        self.world
    }

    /// Iterates matching entities in ascending index order.
    pub fn iter(&self) -> QueryIter<'_> {
        QueryIter::new(self.runtime, self.world, Cow::Borrowed(&self.filter))
    }
}

impl<'r> IntoIterator for Query<'r> {
    type Item = Entity;
    type IntoIter = QueryIter<'r>;

    fn into_iter(self) -> Self::IntoIter {
        QueryIter::new(self.runtime, self.world, Cow::Owned(self.filter))
    }
}

impl<'q, 'r> IntoIterator for &'q Query<'r> {
    type Item = Entity;
    type IntoIter = QueryIter<'q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Scans the alive mask of a world block by block, yielding the entities whose
/// presence mask passes the filter.
pub struct QueryIter<'q> {
    world: World,
    table: Option<&'q EntityTable>,
    filter: Cow<'q, Filter>,
    next_block: usize,
    base: usize,
    current: Bitset256,
}

impl<'q> QueryIter<'q> {
    fn new(runtime: &'q Runtime, world: World, filter: Cow<'q, Filter>) -> Self {
        QueryIter {
            world,
            table: runtime.data(world).map(|v| &v.entities),
            filter,
            next_block: 0,
            base: 0,
            current: Bitset256::ZERO,
        }
    }
}

impl<'q> Iterator for QueryIter<'q> {
    type Item = Entity;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table?;

        loop {
            while let Some(bit) = self.current.first_set_bit() {
                self.current.clear(bit);

                let index = self.base + bit;
                if !table.is_alive(index) {
                    continue;
                }

                if self.filter.matches(table.presence(index)) {
                    if let Some(generation) = table.generation(index) {
                        return Some(Entity::new(self.world, index as u32, generation));
                    }
                }
            }

            let block = *table.alive_blocks().get(self.next_block)?;
            self.base = self.next_block * Bitset256::WIDTH;
            self.current = block;
            self.next_block += 1;
        }
    }
}

/// A query yielding every world, except the prefab world, that holds at least
/// one entity passing the filter.
#[derive(Debug, Clone)]
pub struct WorldEntityQuery<'r> {
    runtime: &'r Runtime,
    filter: Filter,
}

impl_filter_builder!(WorldEntityQuery);

impl<'r> WorldEntityQuery<'r> {
    pub fn iter(&self) -> WorldEntityIter<'_> {
        WorldEntityIter {
            runtime: self.runtime,
            filter: Cow::Borrowed(&self.filter),
            next: 0,
        }
    }
}

impl<'r> IntoIterator for WorldEntityQuery<'r> {
    type Item = World;
    type IntoIter = WorldEntityIter<'r>;

    fn into_iter(self) -> Self::IntoIter {
        WorldEntityIter {
            runtime: self.runtime,
            filter: Cow::Owned(self.filter),
            next: 0,
        }
    }
}

pub struct WorldEntityIter<'q> {
    runtime: &'q Runtime,
    filter: Cow<'q, Filter>,
    next: usize,
}

impl<'q> Iterator for WorldEntityIter<'q> {
    type Item = World;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.runtime.world_count() {
            let world = World::new(self.next as u32);
            self.next += 1;

            if world == World::PREFAB {
                continue;
            }

            let mut entities = QueryIter::new(self.runtime, world, Cow::Borrowed(&*self.filter));
            if entities.next().is_some() {
                return Some(world);
            }
        }

        None
    }
}

/// A query yielding every world whose singleton components pass the filter.
#[derive(Debug, Clone)]
pub struct WorldQuery<'r> {
    runtime: &'r Runtime,
    filter: Filter,
}

impl_filter_builder!(WorldQuery);

impl<'r> WorldQuery<'r> {
    pub fn iter(&self) -> impl Iterator<Item = World> + '_ {
        let filter = &self.filter;
        self.runtime
            .worlds
            .iter()
            .enumerate()
            .filter(move |(_, data)| filter.matches(data.singleton_mask.as_slice()))
            .map(|(i, _)| World::new(i as u32))
    }
}

impl Runtime {
    /// Starts a query over the entities of `world`. A query on an unknown world
    /// yields nothing.
    pub fn query(&self, world: World) -> Query<'_> {
        Query {
            runtime: self,
            world,
            filter: Filter::new(),
        }
    }

    /// Starts a query for worlds holding matching entities.
    pub fn query_across_worlds(&self) -> WorldEntityQuery<'_> {
        WorldEntityQuery {
            runtime: self,
            filter: Filter::new(),
        }
    }

    /// Starts a query for worlds by their singleton components.
    pub fn query_worlds(&self) -> WorldQuery<'_> {
        WorldQuery {
            runtime: self,
            filter: Filter::new(),
        }
    }
}
