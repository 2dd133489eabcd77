//! A sparse set mapping entity indices to component values.

use std::fmt;

const INVALID: u32 = ::std::u32::MAX;

/// Maps a dense key space of entity indices onto packed value slots.
///
/// Removing a value leaves a hole in the dense array instead of compacting it, so
/// a dense slot stays bound to its key until that key is removed. Holes are reused
/// by later insertions before the array grows.
pub struct SparseSet<T> {
    sparse: Vec<u32>,
    dense: Vec<Option<T>>,
    vacant: Vec<u32>,
    len: usize,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        SparseSet::new()
    }
}

impl<T> SparseSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        SparseSet {
            sparse: Vec::new(),
            dense: Vec::new(),
            vacant: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty set able to hold keys below `capacity` without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut set = SparseSet::new();
        set.sparse.resize(capacity, INVALID);
        set.dense.reserve(capacity);
        set
    }

    /// Returns the number of values stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no values are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if a value is stored for `key`.
    #[inline]
    pub fn has(&self, key: u32) -> bool {
        self.slot(key).is_some()
    }

    /// Returns a reference to the value stored for `key`.
    #[inline]
    pub fn get(&self, key: u32) -> Option<&T> {
        let slot = self.slot(key)?;
        self.dense[slot].as_ref()
    }

    /// Returns a mutable reference to the value stored for `key`.
    #[inline]
    pub fn get_mut(&mut self, key: u32) -> Option<&mut T> {
        let slot = self.slot(key)?;
        self.dense[slot].as_mut()
    }

    /// Stores `value` for `key`, overwriting any existing value, and returns a
    /// reference to the stored value.
    pub fn add(&mut self, key: u32, value: T) -> &mut T {
        let slot = self.acquire(key);
        let entry = &mut self.dense[slot];
        *entry = None;
        entry.get_or_insert(value)
    }

    /// Stores `value` for `key`, returning the value it replaced.
    pub fn insert(&mut self, key: u32, value: T) -> Option<T> {
        if let Some(slot) = self.slot(key) {
            return self.dense[slot].replace(value);
        }

        self.add(key, value);
        None
    }

    /// Removes the value stored for `key` and returns it. The dense slot becomes a
    /// hole until a later insertion reuses it.
    pub fn remove(&mut self, key: u32) -> Option<T> {
        let slot = self.slot(key)?;
        self.sparse[key as usize] = INVALID;
        self.vacant.push(slot as u32);
        self.len -= 1;
        self.dense[slot].take()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        for v in &mut self.sparse {
            *v = INVALID;
        }

        self.dense.clear();
        self.vacant.clear();
        self.len = 0;
    }

    /// Returns the raw dense slots, holes included.
    #[inline]
    pub fn dense(&self) -> &[Option<T>] {
        &self.dense
    }

    /// Returns the dense slot bound to `key`, if any.
    #[inline]
    pub fn dense_index(&self, key: u32) -> Option<usize> {
        self.slot(key)
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.sparse
            .iter()
            .enumerate()
            .filter(|(_, slot)| **slot != INVALID)
            .filter_map(move |(key, slot)| {
                self.dense[*slot as usize]
                    .as_ref()
                    .map(|v| (key as u32, v))
            })
    }

    #[inline]
    fn slot(&self, key: u32) -> Option<usize> {
        match self.sparse.get(key as usize) {
            Some(&slot) if slot != INVALID => Some(slot as usize),
            _ => None,
        }
    }

    fn acquire(&mut self, key: u32) -> usize {
        if let Some(slot) = self.slot(key) {
            return slot;
        }

        let index = key as usize;
        if index >= self.sparse.len() {
            let len = (index + 1).next_power_of_two();
            self.sparse.resize(len, INVALID);
        }

        let slot = match self.vacant.pop() {
            Some(slot) => slot as usize,
            None => {
                if self.dense.len() == self.dense.capacity() {
                    let len = (self.dense.len() + 1).next_power_of_two();
                    self.dense.reserve_exact(len - self.dense.len());
                }

                self.dense.push(None);
                self.dense.len() - 1
            }
        };

        self.sparse[index] = slot as u32;
        self.len += 1;
        slot
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
