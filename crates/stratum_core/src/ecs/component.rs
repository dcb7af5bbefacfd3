//! # Component Types
//!
//! Components are pure data containers with no behavior.
//! They must be plain old data and have a fixed size so that every record
//! can be copied bytewise between dense columns and views.

use bytemuck::{Pod, Zeroable};
use std::any::TypeId;
use std::fmt;

/// Maximum number of component types per world (width of a [`Signature`]).
pub const MAX_COMPONENTS: usize = 32;

/// Marker trait for typed ECS components.
///
/// Components must be:
/// - `Copy`: No heap allocations, bitwise copyable
/// - `Pod`: Plain old data, safe to view as bytes
/// - `Zeroable`: New column records start zeroed
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use stratum_core::Component;
///
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
///
/// impl Component for Position {}
/// ```
pub trait Component: Copy + Pod + Zeroable + Send + Sync + 'static {}

/// Runtime identifier of a registered component type.
///
/// Ids are handed out in registration order, starting at zero, and index
/// both the component columns and the bits of a [`Signature`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentId(u8);

impl ComponentId {
    /// Creates a component id from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the position of this component in the world's registry.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns the signature bit of this id, or 0 when the id cannot fit.
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u32 {
        if (self.0 as usize) < MAX_COMPONENTS {
            1 << self.0
        } else {
            0
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bitmask of component types.
///
/// Used both for the set attached to an entity and for the set a system
/// requires. An entity matches a system when its signature contains every
/// bit of the system's signature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Signature(u32);

impl Signature {
    /// The signature with no components.
    pub const EMPTY: Self = Self(0);

    /// Creates a signature from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns a copy with `component` added.
    #[inline]
    #[must_use]
    pub const fn with(self, component: ComponentId) -> Self {
        Self(self.0 | component.bit())
    }

    /// Returns a copy with `component` removed.
    #[inline]
    #[must_use]
    pub const fn without(self, component: ComponentId) -> Self {
        Self(self.0 & !component.bit())
    }

    /// Checks whether `component` is part of this signature.
    #[inline]
    #[must_use]
    pub const fn contains(self, component: ComponentId) -> bool {
        let bit = component.bit();
        bit != 0 && self.0 & bit == bit
    }

    /// Checks whether every component of `required` is part of this signature.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Returns `true` if no component is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of components in the signature.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the component ids in ascending order.
    pub fn iter(self) -> impl Iterator<Item = ComponentId> {
        let mut remaining = self.0;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let bit = remaining.trailing_zeros();
            remaining &= remaining - 1;
            // trailing_zeros of a u32 is below 32
            Some(ComponentId(bit as u8))
        })
    }
}

impl FromIterator<ComponentId> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Registration record of one component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    id: ComponentId,
    name: String,
    size: usize,
    rust_type: Option<TypeId>,
}

impl ComponentInfo {
    pub(crate) fn new(id: ComponentId, name: String, size: usize, rust_type: Option<TypeId>) -> Self {
        Self {
            id,
            name,
            size,
            rust_type,
        }
    }

    /// The id assigned at registration.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Registered name (the Rust type name for typed components).
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of one record in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the component was registered from a Rust type.
    #[inline]
    #[must_use]
    pub fn is_typed(&self) -> bool {
        self.rust_type.is_some()
    }
}
