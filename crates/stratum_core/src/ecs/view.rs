//! # Views
//!
//! A [`View`] is the packed copy of component data a system works on during
//! one pass. Before the system runs, the records of every cached entity are
//! gathered from the dense columns into per-component buffers; afterwards the
//! buffers are scattered back. Position `i` of every buffer belongs to
//! `view.entities()[i]`.
//!
//! Since the system only holds copies, nothing it does can disturb the
//! entity table's compaction or another system's cache.

use super::commands::CommandBuffer;
use super::component::{Component, ComponentId, Signature};
use super::entity::{Entity, EntityTable};
use super::storage::{ComponentColumn, ComponentStore, TypedColumn};

/// Transient component buffers handed to a [`System`](crate::System).
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use stratum_core::{Component, View};
///
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Position { x: f32, y: f32 }
/// impl Component for Position {}
///
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Velocity { x: f32, y: f32 }
/// impl Component for Velocity {}
///
/// fn integrate(view: &mut View) {
///     let dt = view.delta_seconds() as f32;
///     if let Some((positions, velocities)) = view.field_pair_mut::<Position, Velocity>() {
///         for (position, velocity) in positions.iter_mut().zip(velocities.iter()) {
///             position.x += velocity.x * dt;
///             position.y += velocity.y * dt;
///         }
///     }
/// }
/// ```
#[derive(Default)]
pub struct View {
    signature: Signature,
    entities: Vec<Entity>,
    /// Indexed by component id; only ids in `signature` are live.
    buffers: Vec<Option<Box<dyn ComponentColumn>>>,
    delta_seconds: f64,
    commands: CommandBuffer,
}

impl View {
    /// Number of entities in this pass. Every field has this length.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the pass has no entities.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Time step passed to [`World::tick`](crate::World::tick).
    #[inline]
    #[must_use]
    pub fn delta_seconds(&self) -> f64 {
        self.delta_seconds
    }

    /// Handles of the entities in this pass, in pass-local order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Components gathered for this pass.
    #[inline]
    #[must_use]
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// Queue for structural changes applied after the tick.
    #[inline]
    pub fn commands(&mut self) -> &mut CommandBuffer {
        &mut self.commands
    }

    /// Buffer of component type `C`, if the system requires it.
    #[must_use]
    pub fn field<C: Component>(&self) -> Option<&[C]> {
        let index = self.buffer_index::<C>()?;
        self.buffer(index)?
            .as_any()
            .downcast_ref::<TypedColumn<C>>()
            .map(TypedColumn::as_slice)
    }

    /// Mutable buffer of component type `C`, if the system requires it.
    pub fn field_mut<C: Component>(&mut self) -> Option<&mut [C]> {
        let index = self.buffer_index::<C>()?;
        self.buffers[index]
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<TypedColumn<C>>()
            .map(TypedColumn::as_mut_slice)
    }

    /// Two distinct mutable buffers at once.
    ///
    /// Returns `None` if either type is not part of this pass or `A` and `B`
    /// are the same type.
    pub fn field_pair_mut<A: Component, B: Component>(&mut self) -> Option<(&mut [A], &mut [B])> {
        let first = self.buffer_index::<A>()?;
        let second = self.buffer_index::<B>()?;
        if first == second {
            return None;
        }

        let (low, high) = (first.min(second), first.max(second));
        let (head, tail) = self.buffers.split_at_mut(high);
        let low_buffer = head[low].as_deref_mut()?;
        let high_buffer = tail[0].as_deref_mut()?;
        let (a, b) = if first < second {
            (low_buffer, high_buffer)
        } else {
            (high_buffer, low_buffer)
        };

        let a = a.as_any_mut().downcast_mut::<TypedColumn<A>>()?;
        let b = b.as_any_mut().downcast_mut::<TypedColumn<B>>()?;
        Some((a.as_mut_slice(), b.as_mut_slice()))
    }

    /// Raw bytes of a component's buffer: `len()` records back to back.
    #[must_use]
    pub fn field_bytes(&self, component: ComponentId) -> Option<&[u8]> {
        if !self.signature.contains(component) {
            return None;
        }
        self.buffer(component.index()).map(|buffer| buffer.as_bytes())
    }

    /// Mutable raw bytes of a component's buffer.
    pub fn field_bytes_mut(&mut self, component: ComponentId) -> Option<&mut [u8]> {
        if !self.signature.contains(component) {
            return None;
        }
        self.buffers
            .get_mut(component.index())?
            .as_deref_mut()
            .map(|buffer| buffer.as_bytes_mut())
    }

    fn buffer(&self, index: usize) -> Option<&(dyn ComponentColumn + 'static)> {
        self.buffers.get(index)?.as_deref()
    }

    /// Position in `buffers` of the live buffer storing `C`.
    fn buffer_index<C: Component>(&self) -> Option<usize> {
        self.signature.iter().map(ComponentId::index).find(|&index| {
            self.buffer(index)
                .is_some_and(|buffer| buffer.as_any().is::<TypedColumn<C>>())
        })
    }

    /// Copies the records of `members` into fresh buffers.
    ///
    /// Dense indices are resolved from the handles on every call, so the
    /// view follows entities moved by compaction since the last tick.
    pub(crate) fn gather(
        &mut self,
        store: &ComponentStore,
        table: &EntityTable,
        members: &[Entity],
        signature: Signature,
        delta_seconds: f64,
    ) {
        self.signature = signature;
        self.delta_seconds = delta_seconds;
        self.entities.clear();
        self.entities.extend_from_slice(members);
        if self.buffers.len() < store.len() {
            self.buffers.resize_with(store.len(), || None);
        }

        for component in signature.iter() {
            let Some(column) = store.column(component) else {
                continue;
            };
            let buffer = self.buffers[component.index()].get_or_insert_with(|| column.new_empty());
            buffer.clear();
            buffer.reserve(members.len());
            for &entity in members {
                match table.index_of(entity) {
                    Some(index) => buffer.push_record(column.record(index)),
                    None => {
                        debug_assert!(false, "cached entity {entity} is not alive");
                        buffer.push_zeroed();
                    }
                }
            }
        }
    }

    /// Writes every buffer back to the dense columns.
    pub(crate) fn scatter(&self, store: &mut ComponentStore, table: &EntityTable) {
        for component in self.signature.iter() {
            let (Some(buffer), Some(column)) =
                (self.buffer(component.index()), store.column_mut(component))
            else {
                continue;
            };
            for (position, &entity) in self.entities.iter().enumerate() {
                if let Some(index) = table.index_of(entity) {
                    column.record_mut(index).copy_from_slice(buffer.record(position));
                }
            }
        }
    }

    /// Empties the buffers, keeping their allocations for the next pass.
    pub(crate) fn reset(&mut self) {
        for component in self.signature.iter() {
            if let Some(Some(buffer)) = self.buffers.get_mut(component.index()) {
                buffer.clear();
            }
        }
        self.entities.clear();
        self.signature = Signature::EMPTY;
    }

    /// Takes the commands recorded during the tick.
    pub(crate) fn take_commands(&mut self) -> CommandBuffer {
        std::mem::take(&mut self.commands)
    }

    /// Hands an emptied command buffer back for reuse.
    pub(crate) fn restore_commands(&mut self, commands: CommandBuffer) {
        debug_assert!(commands.is_empty());
        self.commands = commands;
    }
}
