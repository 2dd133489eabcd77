//! Generational entity handles and the per-world table that hands them out.

use std::cmp::Ordering;
use std::collections::binary_heap::BinaryHeap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::bitset::{self, Bitset256, BitsetArray};
use super::component::ComponentHandle;
use super::world::World;
use crate::errors::*;

/// `Entity` is made up of three fields. `index` addresses a slot in its world's
/// entity table. This value is recycled when an `Entity` is destroyed, which means
/// two different handles could share an index. We solve this by introducing
/// `generation`, which is bumped on every destroy.
///
/// Generation `0` is never handed out, so `Entity::INVALID` never denotes a live
/// entity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    world: u32,
    index: u32,
    generation: u32,
}

impl Entity {
    /// Handle of an entity that was never allocated.
    pub const INVALID: Entity = Entity {
        world: 0,
        index: 0,
        generation: 0,
    };

    /// Constructs a new `Entity`. Whether it denotes a live entity is up to the
    /// runtime that validates it.
    #[inline]
    pub fn new(world: World, index: u32, generation: u32) -> Self {
        Entity {
            world: world.index(),
            index,
            generation,
        }
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn world(self) -> World {
        World::new(self.world)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entity({}:{}v{})", self.world, self.index, self.generation)
    }
}

#[derive(PartialEq, Eq)]
struct InverseIndex(u32);

impl PartialOrd for InverseIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InverseIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}

#[inline]
fn next_generation(generation: u32) -> u32 {
    match generation.wrapping_add(1) {
        0 => 1,
        v => v,
    }
}

/// Per-world bookkeeping of entity slots.
///
/// Each slot owns a generation counter, an alive bit and `stride` blocks of
/// component presence bits stored in one flat array. Freed indices are reused
/// lowest first.
pub struct EntityTable {
    generations: Vec<u32>,
    alive: BitsetArray,
    presence: Vec<Bitset256>,
    stride: usize,
    frees: BinaryHeap<InverseIndex>,
    next: u32,
    len: usize,
}

impl EntityTable {
    /// Constructs an empty table with room for `capacity` entities and `stride`
    /// presence blocks each.
    pub fn with_capacity(capacity: usize, stride: usize) -> Self {
        let mut table = EntityTable {
            generations: Vec::new(),
            alive: BitsetArray::new(),
            presence: Vec::new(),
            stride: stride.max(1),
            frees: BinaryHeap::new(),
            next: 0,
            len: 0,
        };

        if capacity > 0 {
            table.reserve(capacity - 1);
        }

        table
    }

    /// Number of entity slots currently allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of presence blocks per entity.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Widens every entity's presence mask to `stride` blocks. The new blocks are
    /// zero, the existing bits are preserved.
    pub fn ensure_stride(&mut self, stride: usize) {
        if stride <= self.stride {
            return;
        }

        let mut presence = vec![Bitset256::ZERO; self.capacity() * stride];
        for (i, v) in self.presence.chunks(self.stride).enumerate() {
            presence[i * stride..i * stride + self.stride].copy_from_slice(v);
        }

        debug!(
            "Reflowed presence masks of {} entities from {} to {} blocks.",
            self.capacity(),
            self.stride,
            stride
        );

        self.presence = presence;
        self.stride = stride;
    }

    /// Grows storage so that `index` is addressable, rounding the slot count up
    /// to a power of two.
    fn reserve(&mut self, index: usize) {
        if index < self.capacity() {
            return;
        }

        let capacity = (index + 1).next_power_of_two();
        self.generations.resize(capacity, 0);
        self.presence.resize(capacity * self.stride, Bitset256::ZERO);
        self.alive
            .grow((capacity + Bitset256::WIDTH - 1) / Bitset256::WIDTH);
    }

    /// Allocates a slot and returns its live handle.
    pub fn create(&mut self, world: World) -> Entity {
        let index = match self.frees.pop() {
            Some(v) => v.0,
            None => {
                let v = self.next;
                self.next += 1;
                v
            }
        };

        let slot = index as usize;
        self.reserve(slot);

        // Recycled slots carry the generation bumped by `destroy`.
        if self.generations[slot] == 0 {
            self.generations[slot] = 1;
        }

        for v in self.presence_mut(slot) {
            v.reset();
        }

        self.alive.set(slot);
        self.len += 1;

        Entity::new(world, index, self.generations[slot])
    }

    /// Returns true if `entity` denotes the live occupant of its slot. World
    /// membership is checked by the caller.
    #[inline]
    pub fn is_valid(&self, entity: Entity) -> bool {
        let slot = entity.index() as usize;
        slot < self.capacity()
            && entity.generation() != 0
            && self.generations[slot] == entity.generation()
            && self.alive.test(slot)
    }

    /// Returns true if the slot at `index` is occupied.
    #[inline]
    pub fn is_alive(&self, index: usize) -> bool {
        index < self.capacity() && self.generations[index] != 0 && self.alive.test(index)
    }

    /// Returns the current generation of the slot at `index`.
    #[inline]
    pub fn generation(&self, index: usize) -> Option<u32> {
        self.generations.get(index).cloned()
    }

    /// Frees the slot at `index`, returning the handle it denoted.
    pub fn destroy(&mut self, world: World, index: u32) -> Option<Entity> {
        let slot = index as usize;
        if !self.is_alive(slot) {
            return None;
        }

        let entity = Entity::new(world, index, self.generations[slot]);

        for v in self.presence_mut(slot) {
            v.reset();
        }

        self.generations[slot] = next_generation(self.generations[slot]);
        self.alive.clear(slot);
        self.frees.push(InverseIndex(index));
        self.len -= 1;

        Some(entity)
    }

    /// Presence blocks of the slot at `index`.
    #[inline]
    pub fn presence(&self, index: usize) -> &[Bitset256] {
        let start = index * self.stride;
        &self.presence[start..start + self.stride]
    }

    #[inline]
    fn presence_mut(&mut self, index: usize) -> &mut [Bitset256] {
        let start = index * self.stride;
        &mut self.presence[start..start + self.stride]
    }

    /// Returns true if the slot at `index` has the presence bit of `handle`.
    #[inline]
    pub fn has_bit(&self, index: usize, handle: ComponentHandle) -> bool {
        handle.block() < self.stride && self.presence(index)[handle.block()].test(handle.bit())
    }

    /// Sets the presence bit of `handle`. Fails if the mask has not been widened
    /// to fit the handle.
    pub fn set_bit(&mut self, index: usize, handle: ComponentHandle) -> Result<()> {
        if handle.block() >= self.stride {
            return Err(Error::MaskTooLarge {
                handle,
                stride: self.stride,
            });
        }

        self.presence_mut(index)[handle.block()].set(handle.bit());
        Ok(())
    }

    /// Clears the presence bit of `handle`.
    pub fn clear_bit(&mut self, index: usize, handle: ComponentHandle) {
        if handle.block() < self.stride {
            self.presence_mut(index)[handle.block()].clear(handle.bit());
        }
    }

    #[inline]
    pub fn has_all(&self, index: usize, required: &[Bitset256]) -> bool {
        bitset::has_all(self.presence(index), required)
    }

    #[inline]
    pub fn has_any(&self, index: usize, mask: &[Bitset256]) -> bool {
        bitset::has_any(self.presence(index), mask)
    }

    /// Handles of every component present on the slot at `index`, in handle order.
    pub fn component_handles(&self, index: usize) -> Vec<ComponentHandle> {
        let mut handles = Vec::new();
        for (i, block) in self.presence(index).iter().enumerate() {
            let mut bits = *block;
            while let Some(bit) = bits.first_set_bit() {
                bits.clear(bit);
                handles.push(ComponentHandle::new((i * Bitset256::WIDTH + bit) as u32));
            }
        }

        handles
    }

    /// Blocks of the alive mask, one bit per slot.
    #[inline]
    pub fn alive_blocks(&self) -> &[Bitset256] {
        self.alive.as_slice()
    }
}

impl fmt::Debug for EntityTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EntityTable")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("stride", &self.stride)
            .field("alive", &self.alive)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        let mut table = EntityTable::with_capacity(0, 1);
        let world = World::DEFAULT;

        let e1 = table.create(world);
        assert_eq!((e1.index(), e1.generation()), (0, 1));
        assert!(table.is_valid(e1));

        let e2 = table.create(world);
        assert_eq!((e2.index(), e2.generation()), (1, 1));
        assert_eq!(table.len(), 2);

        assert_eq!(table.destroy(world, e1.index()), Some(e1));
        assert!(!table.is_valid(e1));
        assert_eq!(table.generation(0), Some(2));
        assert_eq!(table.destroy(world, e1.index()), None);
        assert_eq!(table.len(), 1);

        let e3 = table.create(world);
        assert_eq!(e3.index(), e1.index());
        assert_eq!(e3.generation(), e1.generation() + 1);
        assert!(table.is_valid(e3));
        assert!(!table.is_valid(e1));
    }

    #[test]
    fn lowest_index_first() {
        let mut table = EntityTable::with_capacity(0, 1);
        let world = World::DEFAULT;

        let entities: Vec<_> = (0..5).map(|_| table.create(world)).collect();
        table.destroy(world, entities[3].index());
        table.destroy(world, entities[1].index());

        assert_eq!(table.create(world).index(), 1);
        assert_eq!(table.create(world).index(), 3);
        assert_eq!(table.create(world).index(), 5);
    }

    #[test]
    fn never_generation_zero() {
        assert_eq!(next_generation(1), 2);
        assert_eq!(next_generation(::std::u32::MAX), 1);

        let table = EntityTable::with_capacity(4, 1);
        assert!(!table.is_valid(Entity::INVALID));
        assert!(!table.is_alive(0));
    }

    #[test]
    fn capacity() {
        let mut table = EntityTable::with_capacity(5, 1);
        assert_eq!(table.capacity(), 8);

        for _ in 0..9 {
            table.create(World::DEFAULT);
        }

        assert_eq!(table.capacity(), 16);
        assert_eq!(table.alive_blocks().len(), 1);

        for _ in 0..300 {
            table.create(World::DEFAULT);
        }

        assert_eq!(table.capacity(), 512);
        assert_eq!(table.alive_blocks().len(), 2);
    }

    #[test]
    fn presence() {
        let mut table = EntityTable::with_capacity(0, 1);
        let e = table.create(World::DEFAULT);
        let slot = e.index() as usize;

        let small = ComponentHandle::new(3);
        let large = ComponentHandle::new(260);

        table.set_bit(slot, small).unwrap();
        assert!(table.has_bit(slot, small));
        assert!(!table.has_bit(slot, large));

        match table.set_bit(slot, large) {
            Err(Error::MaskTooLarge { stride, .. }) => assert_eq!(stride, 1),
            other => panic!("unexpected {:?}", other),
        }

        table.ensure_stride(2);
        assert!(table.has_bit(slot, small));
        table.set_bit(slot, large).unwrap();
        assert_eq!(table.component_handles(slot), vec![small, large]);

        table.clear_bit(slot, small);
        assert_eq!(table.component_handles(slot), vec![large]);

        table.destroy(World::DEFAULT, e.index());
        let e = table.create(World::DEFAULT);
        assert!(table.component_handles(e.index() as usize).is_empty());
    }
}
