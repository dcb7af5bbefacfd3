//! # Deferred Commands
//!
//! Systems cannot mutate the world while it is iterating. Structural changes
//! requested during a tick are recorded here and applied, in order, once every
//! system has run.

use std::any::TypeId;

use super::component::{Component, ComponentId};
use super::entity::Entity;

/// How a queued command names its component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKey {
    /// A component id (typed or size-only component).
    Id(ComponentId),
    /// A Rust component type, resolved when the command is applied.
    Type {
        /// `TypeId` of the component type.
        type_id: TypeId,
        /// Type name, for error reporting.
        name: &'static str,
    },
}

impl ComponentKey {
    /// Key of the Rust component type `C`.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self::Type {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }
}

/// A recorded structural change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Destroy an entity.
    Destroy(Entity),
    /// Attach a component given as raw record bytes.
    Attach {
        /// Target entity.
        entity: Entity,
        /// Component to attach.
        key: ComponentKey,
        /// Record bytes, exactly the component's size.
        bytes: Vec<u8>,
    },
    /// Detach a component.
    Detach {
        /// Target entity.
        entity: Entity,
        /// Component to detach.
        key: ComponentKey,
    },
}

/// Queue of commands recorded by systems during a tick.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    queue: Vec<Command>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues destruction of `entity`.
    pub fn destroy(&mut self, entity: Entity) {
        self.queue.push(Command::Destroy(entity));
    }

    /// Queues attaching `value` to `entity`.
    pub fn attach<C: Component>(&mut self, entity: Entity, value: C) {
        self.queue.push(Command::Attach {
            entity,
            key: ComponentKey::of::<C>(),
            bytes: bytemuck::bytes_of(&value).to_vec(),
        });
    }

    /// Queues attaching a component given as raw record bytes.
    pub fn attach_bytes(&mut self, entity: Entity, component: ComponentId, bytes: impl Into<Vec<u8>>) {
        self.queue.push(Command::Attach {
            entity,
            key: ComponentKey::Id(component),
            bytes: bytes.into(),
        });
    }

    /// Queues detaching component type `C` from `entity`.
    pub fn detach<C: Component>(&mut self, entity: Entity) {
        self.queue.push(Command::Detach {
            entity,
            key: ComponentKey::of::<C>(),
        });
    }

    /// Queues detaching a component by id.
    pub fn detach_id(&mut self, entity: Entity, component: ComponentId) {
        self.queue.push(Command::Detach {
            entity,
            key: ComponentKey::Id(component),
        });
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued commands in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.queue.iter()
    }

    /// Drops every queued command.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.queue.drain(..)
    }
}
