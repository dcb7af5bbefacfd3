//! # Entity Management
//!
//! Entities are lightweight handles consisting of:
//! - A stable slot id that survives compaction
//! - A generation counter for safe reuse
//!
//! The [`EntityTable`] maps slot ids to the dense index shared by every
//! component column and keeps that mapping correct across swap-removal.

use std::fmt;

use super::component::Signature;

/// Number of bits used for the slot id.
pub const SLOT_BITS: u32 = 24;

/// Number of bits used for the generation.
pub const GENERATION_BITS: u32 = 8;

/// Mask selecting the slot id. Also the reserved "unassigned" slot value.
pub const SLOT_MASK: u32 = (1 << SLOT_BITS) - 1;

/// Generation given to a slot id the first time it is handed out.
const FIRST_GENERATION: u8 = 1;

/// A slot reaching this generation is retired instead of reused.
const RETIRED_GENERATION: u8 = u8::MAX;

/// Dense index value of a slot that is not currently alive.
const UNASSIGNED: u32 = u32::MAX;

/// Smallest capacity the table grows to.
pub(crate) const MIN_CAPACITY: usize = 32;

/// Opaque handle to an entity.
///
/// The handle packs two parts into 32 bits:
/// - Lower 24 bits: stable slot id
/// - Upper 8 bits: generation counter for detecting stale references
///
/// Handles carry no ownership; always check them with
/// [`World::validate`](crate::World::validate) (or rely on the world doing so)
/// before assuming the entity still exists.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// Null/invalid handle. Never validates.
    pub const NULL: Self = Self(u32::MAX);

    /// Creates a handle from slot id and generation.
    ///
    /// # Arguments
    ///
    /// * `slot` - The slot id (only the lower 24 bits are kept)
    /// * `generation` - The generation counter
    #[inline]
    #[must_use]
    pub const fn new(slot: u32, generation: u8) -> Self {
        Self((slot & SLOT_MASK) | ((generation as u32) << SLOT_BITS))
    }

    /// Returns the slot id portion of the handle.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> u32 {
        self.0 & SLOT_MASK
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u8 {
        (self.0 >> SLOT_BITS) as u8
    }

    /// Returns the packed 32-bit representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Rebuilds a handle from its packed representation.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Checks if this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Entity(NULL)")
        } else {
            write!(f, "Entity({}v{})", self.slot(), self.generation())
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("NULL")
        } else {
            write!(f, "{}v{}", self.slot(), self.generation())
        }
    }
}

/// Outcome of removing a dense index from the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Removal {
    /// The entity that was moved into the vacated index, if any.
    pub moved: Option<Entity>,
    /// Whether the freed slot id was retired instead of recycled.
    pub retired: bool,
}

/// Generational handle allocator with a dense live range.
///
/// All per-slot vectors are indexed by slot id, all per-index vectors by
/// dense index. `slot_to_index` and `index_to_handle` are inverses of each
/// other over `[0, len)`.
pub(crate) struct EntityTable {
    /// Dense index of every slot id, or `UNASSIGNED`.
    slot_to_index: Vec<u32>,
    /// Current generation of every slot id.
    generations: Vec<u8>,
    /// Live handle at every dense index.
    index_to_handle: Vec<Entity>,
    /// Attached components at every dense index.
    signatures: Vec<Signature>,
    /// Recycled slot ids (LIFO).
    free_slots: Vec<u32>,
    /// Slots whose generation ran out.
    retired: usize,
}

impl EntityTable {
    /// Creates a table with room for `capacity` live entities.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            slot_to_index: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            index_to_handle: Vec::with_capacity(capacity),
            signatures: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            retired: 0,
        }
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.index_to_handle.len()
    }

    /// Number of live entities the table holds before growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.index_to_handle.capacity()
    }

    /// Returns `true` if the next allocation has to grow the table.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Number of slot ids that were retired.
    #[inline]
    pub fn retired(&self) -> usize {
        self.retired
    }

    /// Doubles the capacity (floor [`MIN_CAPACITY`]) of the slot and dense
    /// mappings. The free list is bounded by the slot count and grows on its own.
    ///
    /// Returns the new capacity.
    pub fn grow(&mut self) -> usize {
        let target = (self.capacity() * 2).max(MIN_CAPACITY);
        reserve_to(&mut self.index_to_handle, target);
        reserve_to(&mut self.signatures, target);
        reserve_to(&mut self.slot_to_index, target);
        reserve_to(&mut self.generations, target);
        self.capacity()
    }

    /// Hands out a slot id and the next dense index.
    ///
    /// Returns `None` when every slot id is either alive or retired.
    pub fn allocate(&mut self) -> Option<(Entity, usize)> {
        let slot = match self.free_slots.pop() {
            Some(slot) => slot,
            None => {
                let slot = u32::try_from(self.slot_to_index.len()).ok()?;
                if slot >= SLOT_MASK {
                    return None;
                }
                self.slot_to_index.push(UNASSIGNED);
                self.generations.push(FIRST_GENERATION);
                slot
            }
        };

        let index = self.len();
        let entity = Entity::new(slot, self.generations[slot as usize]);
        // Dense indices are bounded by the slot count, which fits 24 bits.
        self.slot_to_index[slot as usize] = index as u32;
        self.index_to_handle.push(entity);
        self.signatures.push(Signature::EMPTY);
        Some((entity, index))
    }

    /// Resolves a handle to its current dense index.
    ///
    /// Returns `None` for stale, out-of-range, or null handles.
    #[inline]
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        let index = *self.slot_to_index.get(entity.slot() as usize)?;
        if index == UNASSIGNED {
            return None;
        }
        let index = index as usize;
        (self.index_to_handle.get(index) == Some(&entity)).then_some(index)
    }

    /// Checks whether a handle refers to a live entity.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.index_of(entity).is_some()
    }

    /// Signature stored at a live dense index.
    #[inline]
    pub fn signature_at(&self, index: usize) -> Signature {
        self.signatures[index]
    }

    /// Overwrites the signature stored at a live dense index.
    #[inline]
    pub fn set_signature(&mut self, index: usize, signature: Signature) {
        self.signatures[index] = signature;
    }

    /// Live handles in dense order.
    #[inline]
    pub fn handles(&self) -> &[Entity] {
        &self.index_to_handle
    }

    /// Live handles paired with their signatures, in dense order.
    pub fn iter_with_signatures(&self) -> impl Iterator<Item = (Entity, Signature)> + '_ {
        self.index_to_handle
            .iter()
            .copied()
            .zip(self.signatures.iter().copied())
    }

    /// Removes the entity at `index` by swapping the last live entity into it.
    ///
    /// Component columns must perform the same swap-removal.
    pub fn release(&mut self, index: usize) -> Removal {
        let last = self.len() - 1;
        let removed = self.index_to_handle.swap_remove(index);
        self.signatures.swap_remove(index);

        let moved = (index != last).then(|| {
            let moved = self.index_to_handle[index];
            self.slot_to_index[moved.slot() as usize] = index as u32;
            moved
        });

        let slot = removed.slot();
        self.slot_to_index[slot as usize] = UNASSIGNED;
        let generation = &mut self.generations[slot as usize];
        *generation = generation.saturating_add(1);

        let retired = *generation >= RETIRED_GENERATION;
        if retired {
            self.retired += 1;
        } else {
            self.free_slots.push(slot);
        }

        Removal { moved, retired }
    }
}

/// Reserves so that `vec` can hold at least `target` elements.
fn reserve_to<T>(vec: &mut Vec<T>, target: usize) {
    if target > vec.len() {
        vec.reserve_exact(target - vec.len());
    }
}
