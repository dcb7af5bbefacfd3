//! # Systems
//!
//! A system is a routine that runs once per tick over every entity whose
//! signature contains the system's required components. The registry keeps,
//! per system, a cache of matching entities that is updated on every
//! structural change instead of being recomputed each tick.

use std::fmt;

use tracing::debug;

use super::component::Signature;
use super::entity::{Entity, MIN_CAPACITY};
use super::view::View;

/// Base trait for a processing routine.
///
/// Systems only ever see a [`View`]: packed copies of the components they
/// require, one element per matching entity. They cannot reach the world,
/// so structural changes requested while running go through
/// [`View::commands`] and are applied after the tick.
///
/// Closures taking `&mut View` are systems too.
///
/// # Example
///
/// ```rust
/// use stratum_core::{System, View};
///
/// struct CountSystem {
///     seen: usize,
/// }
///
/// impl System for CountSystem {
///     fn run(&mut self, view: &mut View) {
///         self.seen += view.len();
///     }
/// }
/// ```
pub trait System {
    /// Runs one pass over the entities packed into `view`.
    fn run(&mut self, view: &mut View);

    /// Name used in log output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> System for F
where
    F: FnMut(&mut View),
{
    fn run(&mut self, view: &mut View) {
        self(view);
    }
}

/// Identifier of a registered system. Systems run in id order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SystemId(u32);

impl SystemId {
    /// Returns the registration position of this system.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system#{}", self.0)
    }
}

/// Position marker for slots that are not cached.
const NOT_CACHED: u32 = u32::MAX;

/// Ordered set of entities matching one system.
///
/// `positions` is indexed by slot id so that membership tests and removal
/// are O(1). Removal swaps the last cached entity into the hole, so the
/// iteration order is not creation order and changes on removal.
#[derive(Default)]
pub(crate) struct MembershipCache {
    entities: Vec<Entity>,
    positions: Vec<u32>,
}

impl MembershipCache {
    #[inline]
    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.position(entity).is_some()
    }

    fn position(&self, entity: Entity) -> Option<usize> {
        let position = *self.positions.get(entity.slot() as usize)?;
        if position == NOT_CACHED {
            return None;
        }
        let position = position as usize;
        (self.entities.get(position) == Some(&entity)).then_some(position)
    }

    /// Appends `entity`. Returns `false` if it was already cached.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.contains(entity) {
            return false;
        }
        if self.entities.len() == self.entities.capacity() {
            let additional = self.entities.capacity().max(MIN_CAPACITY);
            self.entities.reserve_exact(additional);
        }
        let slot = entity.slot() as usize;
        if slot >= self.positions.len() {
            self.positions.resize(slot + 1, NOT_CACHED);
        }
        // Cache length is bounded by the slot count, which fits 24 bits.
        self.positions[slot] = self.entities.len() as u32;
        self.entities.push(entity);
        true
    }

    /// Swap-removes `entity`. Returns `false` if it was not cached.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(position) = self.position(entity) else {
            return false;
        };
        self.entities.swap_remove(position);
        if let Some(&moved) = self.entities.get(position) {
            self.positions[moved.slot() as usize] = position as u32;
        }
        self.positions[entity.slot() as usize] = NOT_CACHED;
        true
    }
}

/// A registered system with its requirement and membership cache.
pub(crate) struct SystemEntry {
    system: Box<dyn System>,
    signature: Signature,
    cache: MembershipCache,
}

impl SystemEntry {
    #[inline]
    pub fn signature(&self) -> Signature {
        self.signature
    }

    #[inline]
    pub fn members(&self) -> &[Entity] {
        self.cache.as_slice()
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.system.name()
    }

    #[inline]
    pub fn run(&mut self, view: &mut View) {
        self.system.run(view);
    }

    /// Re-evaluates whether `entity` with `signature` belongs in this cache.
    fn refresh(&mut self, entity: Entity, signature: Signature) {
        if signature.contains_all(self.signature) {
            if self.cache.insert(entity) {
                debug!(system = self.system.name(), %entity, "entity joined system");
            }
        } else if self.cache.remove(entity) {
            debug!(system = self.system.name(), %entity, "entity left system");
        }
    }
}

/// All registered systems in registration order.
#[derive(Default)]
pub(crate) struct SystemRegistry {
    entries: Vec<SystemEntry>,
}

impl SystemRegistry {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Adds a system and seeds its cache from the live entities.
    pub fn register(
        &mut self,
        system: Box<dyn System>,
        signature: Signature,
        live: impl Iterator<Item = (Entity, Signature)>,
    ) -> SystemId {
        let mut cache = MembershipCache::default();
        for (entity, entity_signature) in live {
            if entity_signature.contains_all(signature) {
                cache.insert(entity);
            }
        }
        // System count cannot realistically exceed u32.
        let id = SystemId(self.entries.len() as u32);
        self.entries.push(SystemEntry {
            system,
            signature,
            cache,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: SystemId) -> Option<&SystemEntry> {
        self.entries.get(id.index())
    }

    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SystemEntry> {
        self.entries.iter_mut()
    }

    /// Re-evaluates the membership of `entity` in every system.
    pub fn refresh(&mut self, entity: Entity, signature: Signature) {
        for entry in &mut self.entries {
            entry.refresh(entity, signature);
        }
    }

    /// Removes `entity` from every cache it is part of.
    pub fn forget(&mut self, entity: Entity) {
        for entry in &mut self.entries {
            if entry.cache.remove(entity) {
                debug!(system = entry.system.name(), %entity, "entity left system");
            }
        }
    }
}
