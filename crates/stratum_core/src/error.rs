//! # ECS Error Types
//!
//! All recoverable errors that the world reports. None of them leave the
//! world in a modified state: a rejected call is a no-op.

use thiserror::Error;

use crate::ecs::{ComponentId, Entity};

/// Errors that can occur when operating on a [`World`](crate::World).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The handle is stale, out of range, or null.
    #[error("invalid entity handle {0}")]
    StaleEntity(Entity),

    /// The component id was never registered with this world.
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),

    /// A Rust type was used with the typed API without being registered.
    #[error("component type `{0}` is not registered")]
    UnregisteredType(&'static str),

    /// Attach on an entity that already carries the component.
    #[error("component {component} already attached to entity {entity}")]
    AlreadyAttached {
        /// The target entity.
        entity: Entity,
        /// The component that is already present.
        component: ComponentId,
    },

    /// Detach of a component the entity does not carry.
    #[error("component {component} not attached to entity {entity}")]
    NotAttached {
        /// The target entity.
        entity: Entity,
        /// The missing component.
        component: ComponentId,
    },

    /// Byte payload does not match the registered element size.
    #[error("component {component} expects {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The component being written.
        component: ComponentId,
        /// Registered element size.
        expected: usize,
        /// Size of the payload that was supplied.
        actual: usize,
    },

    /// More component types than a signature can hold.
    #[error("too many component types: {requested} requested, maximum is {max}")]
    TooManyComponents {
        /// Number of types that registration would produce.
        requested: usize,
        /// Signature width.
        max: usize,
    },

    /// The same Rust type or component name was registered twice.
    #[error("component `{0}` registered twice")]
    DuplicateComponent(String),

    /// A size-only component was declared with zero bytes.
    #[error("component `{0}` has zero size")]
    ZeroSizedComponent(String),

    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
