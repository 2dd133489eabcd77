//! Bit-sets with fixed or growable size for `Ecs`.
//!
//! `Bitset256` is the unit every presence mask is built from: a component handle
//! `id` lives in block `id / 256` at bit `id % 256`. `BitsetArray` strings those
//! blocks together, and is used both for the per-world entity liveness mask and
//! for the immutable required/excluded masks of a query.

use std::fmt;
use std::iter;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use smallvec::SmallVec;

const LANES: usize = 4;
const LANE_BITS: usize = 64;

/// Fixed size bit-set of 256 bits, stored as four 64-bit lanes.
///
/// Bit `i` lives in lane `i / 64` at position `i % 64`, counting from the least
/// significant bit. Indices outside `[0, 256)` are a caller error.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bitset256 {
    lanes: [u64; LANES],
}

impl Bitset256 {
    /// Number of bits in one block.
    pub const WIDTH: usize = LANES * LANE_BITS;

    /// A bit-set with *ZERO* bit.
    pub const ZERO: Bitset256 = Bitset256 { lanes: [0; LANES] };

    /// Create a new `Bitset256` with *ZERO* bit.
    #[inline]
    pub fn new() -> Self {
        Bitset256::ZERO
    }

    /// Creates a bit-set from its raw lanes.
    #[inline]
    pub fn from_lanes(lanes: [u64; LANES]) -> Self {
        Bitset256 { lanes }
    }

    /// Returns the raw lanes of this bit-set.
    #[inline]
    pub fn lanes(&self) -> [u64; LANES] {
        self.lanes
    }

    /// Adds a value to the set.
    #[inline]
    pub fn set(&mut self, index: usize) {
        let (lane, mask) = Self::split(index);
        self.lanes[lane] |= mask;
    }

    /// Removes a value from the set.
    #[inline]
    pub fn clear(&mut self, index: usize) {
        let (lane, mask) = Self::split(index);
        self.lanes[lane] &= !mask;
    }

    /// Returns `true` if this set contains the specified integer.
    #[inline]
    pub fn test(&self, index: usize) -> bool {
        let (lane, mask) = Self::split(index);
        (self.lanes[lane] & mask) != 0
    }

    /// Clears all bits in this set.
    #[inline]
    pub fn reset(&mut self) {
        *self = Bitset256::ZERO;
    }

    /// Returns whether there are no bits set in this set.
    #[inline]
    pub fn is_zero(&self) -> bool {
        (self.lanes[0] | self.lanes[1] | self.lanes[2] | self.lanes[3]) == 0
    }

    /// Returns `true` if every bit of `other` is also set in `self`.
    #[inline]
    pub fn contains(&self, other: &Bitset256) -> bool {
        (self.lanes[0] & other.lanes[0]) == other.lanes[0]
            && (self.lanes[1] & other.lanes[1]) == other.lanes[1]
            && (self.lanes[2] & other.lanes[2]) == other.lanes[2]
            && (self.lanes[3] & other.lanes[3]) == other.lanes[3]
    }

    /// Returns `true` if `self` and `other` share at least one bit.
    #[inline]
    pub fn intersects_any(&self, other: &Bitset256) -> bool {
        ((self.lanes[0] & other.lanes[0])
            | (self.lanes[1] & other.lanes[1])
            | (self.lanes[2] & other.lanes[2])
            | (self.lanes[3] & other.lanes[3]))
            != 0
    }

    /// Returns the number of set bits.
    #[inline]
    pub fn pop_count(&self) -> u32 {
        self.lanes.iter().map(|v| v.count_ones()).sum()
    }

    /// Returns the number of zero bits below the lowest set bit, or `WIDTH` if
    /// the set is empty.
    #[inline]
    pub fn trailing_zero_count(&self) -> usize {
        for (i, lane) in self.lanes.iter().enumerate() {
            if *lane != 0 {
                return i * LANE_BITS + lane.trailing_zeros() as usize;
            }
        }

        Self::WIDTH
    }

    /// Returns the index of the lowest set bit.
    #[inline]
    pub fn first_set_bit(&self) -> Option<usize> {
        let tz = self.trailing_zero_count();
        if tz < Self::WIDTH {
            Some(tz)
        } else {
            None
        }
    }

    /// Returns an iterator over the indices of set bits, from low to high.
    #[inline]
    pub fn iter(&self) -> BitsetIter {
        BitsetIter { bits: *self }
    }

    #[inline]
    fn split(index: usize) -> (usize, u64) {
        debug_assert!(
            index < Self::WIDTH,
            "Bit index {} out of range (WIDTH: {}).",
            index,
            Self::WIDTH
        );

        (index / LANE_BITS, 1u64 << (index % LANE_BITS))
    }
}

impl fmt::Debug for Bitset256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitAnd for Bitset256 {
    type Output = Bitset256;

    #[inline]
    fn bitand(self, rhs: Bitset256) -> Bitset256 {
        let mut bits = self;
        bits &= rhs;
        bits
    }
}

impl BitAndAssign for Bitset256 {
    #[inline]
    fn bitand_assign(&mut self, rhs: Bitset256) {
        for (lhs, rhs) in self.lanes.iter_mut().zip(rhs.lanes.iter()) {
            *lhs &= *rhs;
        }
    }
}

impl BitOr for Bitset256 {
    type Output = Bitset256;

    #[inline]
    fn bitor(self, rhs: Bitset256) -> Bitset256 {
        let mut bits = self;
        bits |= rhs;
        bits
    }
}

impl BitOrAssign for Bitset256 {
    #[inline]
    fn bitor_assign(&mut self, rhs: Bitset256) {
        for (lhs, rhs) in self.lanes.iter_mut().zip(rhs.lanes.iter()) {
            *lhs |= *rhs;
        }
    }
}

impl Not for Bitset256 {
    type Output = Bitset256;

    #[inline]
    fn not(self) -> Bitset256 {
        Bitset256 {
            lanes: [!self.lanes[0], !self.lanes[1], !self.lanes[2], !self.lanes[3]],
        }
    }
}

/// Iterates the set bits of a `Bitset256` by repeatedly taking the lowest one.
pub struct BitsetIter {
    bits: Bitset256,
}

impl Iterator for BitsetIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.bits.first_set_bit()?;
        self.bits.clear(index);
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.bits.pop_count() as usize;
        (n, Some(n))
    }
}

/// Returns `true` if `blocks` contains every bit of `required`. Blocks missing from
/// `blocks` count as zero, so a longer `required` only passes if its extra blocks
/// are zero themselves.
#[inline]
pub fn has_all(blocks: &[Bitset256], required: &[Bitset256]) -> bool {
    for (i, mask) in required.iter().enumerate() {
        match blocks.get(i) {
            Some(v) => {
                if !v.contains(mask) {
                    return false;
                }
            }
            None => {
                if !mask.is_zero() {
                    return false;
                }
            }
        }
    }

    true
}

/// Returns `true` if `blocks` shares at least one bit with `mask`.
#[inline]
pub fn has_any(blocks: &[Bitset256], mask: &[Bitset256]) -> bool {
    blocks
        .iter()
        .zip(mask.iter())
        .any(|(lhs, rhs)| lhs.intersects_any(rhs))
}

/// A growable sequence of `Bitset256` blocks addressed by flat bit index.
///
/// The `clone_*` family never touches `self`, which is what lets query masks be
/// shared freely once issued.
#[derive(Default, Clone, PartialEq, Eq, Hash)]
pub struct BitsetArray {
    blocks: SmallVec<[Bitset256; 2]>,
}

impl BitsetArray {
    /// Creates an empty array.
    #[inline]
    pub fn new() -> Self {
        BitsetArray {
            blocks: SmallVec::new(),
        }
    }

    /// Creates an array of `len` zeroed blocks.
    pub fn with_blocks(len: usize) -> Self {
        BitsetArray {
            blocks: iter::repeat(Bitset256::ZERO).take(len).collect(),
        }
    }

    /// Splits a flat bit index into `(block, bit)`.
    #[inline]
    pub fn split(index: usize) -> (usize, usize) {
        (index / Bitset256::WIDTH, index % Bitset256::WIDTH)
    }

    /// Returns the number of blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if there are no blocks at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns `true` if no bit is set in any block.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.blocks.iter().all(|v| v.is_zero())
    }

    /// Returns the blocks as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Bitset256] {
        &self.blocks
    }

    /// Returns `true` if the bit at `index` is set. Bits beyond the current
    /// length read as unset.
    #[inline]
    pub fn test(&self, index: usize) -> bool {
        let (block, bit) = Self::split(index);
        self.blocks.get(block).map_or(false, |v| v.test(bit))
    }

    /// Sets the bit at `index`, growing to a power-of-two block count if needed.
    pub fn set(&mut self, index: usize) {
        let (block, bit) = Self::split(index);
        if block >= self.blocks.len() {
            self.grow((block + 1).next_power_of_two());
        }

        self.blocks[block].set(bit);
    }

    /// Clears the bit at `index`. Does nothing if it lies beyond the current length.
    #[inline]
    pub fn clear(&mut self, index: usize) {
        let (block, bit) = Self::split(index);
        if let Some(v) = self.blocks.get_mut(block) {
            v.clear(bit);
        }
    }

    /// Grows to at least `len` blocks; new blocks are zero. Never shrinks.
    pub fn grow(&mut self, len: usize) {
        if len > self.blocks.len() {
            let extra = len - self.blocks.len();
            self.blocks.extend(iter::repeat(Bitset256::ZERO).take(extra));
        }
    }

    /// Returns a copy of this array with the bit at `index` set. The copy has at
    /// least `index / 256 + 1` blocks, rounded up to a power of two when it had to
    /// grow.
    pub fn clone_and_set(&self, index: usize) -> BitsetArray {
        let (block, _) = Self::split(index);
        let len = if block >= self.blocks.len() {
            (block + 1).next_power_of_two()
        } else {
            self.blocks.len()
        };

        let mut array = BitsetArray::with_blocks(len);
        array.blocks[..self.blocks.len()].copy_from_slice(&self.blocks);
        array.set(index);
        array
    }

    /// Returns the element-wise union of this array and `other`, sized to the
    /// longer of the two.
    pub fn clone_merge(&self, other: &[Bitset256]) -> BitsetArray {
        if other.is_empty() {
            return self.clone();
        }

        let len = self.blocks.len().max(other.len());
        let mut array = BitsetArray::with_blocks(len);
        for (i, v) in array.blocks.iter_mut().enumerate() {
            let lhs = self.blocks.get(i).cloned().unwrap_or_default();
            let rhs = other.get(i).cloned().unwrap_or_default();
            *v = lhs | rhs;
        }

        array
    }

    /// Returns an iterator over the flat indices of set bits, from low to high.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_zero())
            .flat_map(|(i, v)| v.iter().map(move |bit| i * Bitset256::WIDTH + bit))
    }
}

impl fmt::Debug for BitsetArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
