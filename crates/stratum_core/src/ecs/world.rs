//! # ECS World
//!
//! The central container for entities, components, and systems.
//!
//! A [`World`] is an explicit value: there is no global state, and several
//! worlds can coexist. It is built once through a [`WorldBuilder`], which
//! fixes the set of component types, and afterwards only entities, their
//! components, and systems change.

use std::any::TypeId;

use super::commands::{Command, CommandBuffer, ComponentKey};
use super::component::{Component, ComponentId, ComponentInfo, Signature};
use super::entity::{Entity, EntityTable, MIN_CAPACITY};
use super::storage::ComponentStore;
use super::system::{System, SystemId, SystemRegistry};
use super::view::View;
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};

/// Logs a rejected operation. The world is unchanged whenever this fires.
fn logged<T>(operation: &'static str, result: EcsResult<T>) -> EcsResult<T> {
    if let Err(error) = &result {
        tracing::warn!("{} rejected: {}", operation, error);
    }
    result
}

/// Declares the component types of a world before it is created.
///
/// Registration errors are kept until [`build`](Self::build), so the builder
/// can be chained freely.
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use stratum_core::{Component, World};
///
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Position { x: f32, y: f32 }
/// impl Component for Position {}
///
/// let world = World::builder()
///     .with_capacity(1024)
///     .component::<Position>()
///     .byte_component("health", 4)
///     .build()
///     .unwrap();
///
/// assert_eq!(world.component_count(), 2);
/// ```
pub struct WorldBuilder {
    capacity: usize,
    store: ComponentStore,
    error: Option<EcsError>,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBuilder {
    /// Creates a builder with no components and the minimum capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capacity: MIN_CAPACITY,
            store: ComponentStore::new(),
            error: None,
        }
    }

    /// Creates a builder from a configuration: its capacity and every
    /// declared byte component, in declaration order.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        config
            .components
            .iter()
            .fold(Self::new().with_capacity(config.initial_capacity), |builder, decl| {
                builder.byte_component(&decl.name, decl.size)
            })
    }

    /// Sets the number of live entities to reserve room for.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Registers the Rust component type `C`.
    #[must_use]
    pub fn component<C: Component>(mut self) -> Self {
        if self.error.is_none() {
            if let Err(error) = self.store.register_typed::<C>() {
                self.error = Some(error);
            }
        }
        self
    }

    /// Registers a component known only by its name and record size.
    #[must_use]
    pub fn byte_component(mut self, name: &str, size: usize) -> Self {
        if self.error.is_none() {
            if let Err(error) = self.store.register_bytes(name, size) {
                self.error = Some(error);
            }
        }
        self
    }

    /// Creates the world.
    ///
    /// # Errors
    ///
    /// Returns the first registration error: more than
    /// [`MAX_COMPONENTS`](crate::MAX_COMPONENTS) types, a duplicate type or
    /// name, or a zero-sized byte component.
    pub fn build(self) -> EcsResult<World> {
        if let Some(error) = self.error {
            tracing::warn!("World build failed: {}", error);
            return Err(error);
        }

        let entities = EntityTable::with_capacity(self.capacity);
        let mut store = self.store;
        store.reserve_total(entities.capacity());

        tracing::info!(
            "World built: {} component types, capacity {}",
            store.len(),
            entities.capacity()
        );
        Ok(World {
            entities,
            store,
            systems: SystemRegistry::default(),
            view: View::default(),
            ticks: 0,
        })
    }
}

/// Container for all entities, component data, and systems.
///
/// Every operation that can be rejected returns an [`EcsResult`] (or
/// `bool`/`Option` for `destroy` and the fetch family) and leaves the world
/// unchanged when it is rejected.
pub struct World {
    entities: EntityTable,
    store: ComponentStore,
    systems: SystemRegistry,
    view: View,
    ticks: u64,
}

impl World {
    /// Starts declaring a new world.
    #[must_use]
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with no components.
    ///
    /// Grows the world when it is at capacity. Returns [`Entity::NULL`] when
    /// every slot id is either alive or retired.
    pub fn create(&mut self) -> Entity {
        if self.entities.is_full() {
            let capacity = self.entities.grow();
            self.store.reserve_total(capacity);
            tracing::info!("World grown to capacity {}", capacity);
        }

        let Some((entity, _)) = self.entities.allocate() else {
            tracing::error!(
                "Entity slots exhausted: {} live, {} retired",
                self.entities.len(),
                self.entities.retired()
            );
            return Entity::NULL;
        };

        self.store.push_zeroed();
        self.systems.refresh(entity, Signature::EMPTY);
        tracing::debug!("Entity {} created", entity);
        entity
    }

    /// Destroys an entity, detaching all of its components.
    ///
    /// The last live entity is moved into the freed dense index, so dense
    /// indices of other entities may change. Returns `false` (and changes
    /// nothing) for an invalid handle.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        let Some(index) = self.entities.index_of(entity) else {
            tracing::warn!("destroy rejected: invalid entity handle {}", entity);
            return false;
        };

        for component in self.entities.signature_at(index).iter() {
            tracing::debug!("Component {} detached from {} on destroy", component, entity);
        }
        self.systems.forget(entity);

        self.store.swap_remove(index);
        let removal = self.entities.release(index);
        if let Some(moved) = removal.moved {
            tracing::trace!("Entity {} moved to dense index {}", moved, index);
        }
        if removal.retired {
            tracing::debug!("Slot {} retired", entity.slot());
        }

        tracing::debug!("Entity {} destroyed", entity);
        true
    }

    /// Checks whether a handle refers to a live entity. O(1).
    #[inline]
    #[must_use]
    pub fn validate(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entity is alive.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.len() == 0
    }

    /// Number of live entities the world holds before growing.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Number of slot ids retired because their generation ran out.
    #[inline]
    #[must_use]
    pub fn retired_slots(&self) -> usize {
        self.entities.retired()
    }

    /// Live handles in dense order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        self.entities.handles()
    }

    /// Current dense index of an entity.
    ///
    /// Only meaningful until the next `destroy`.
    #[inline]
    #[must_use]
    pub fn dense_index(&self, entity: Entity) -> Option<usize> {
        self.entities.index_of(entity)
    }

    /// Components attached to an entity.
    #[must_use]
    pub fn signature(&self, entity: Entity) -> Option<Signature> {
        self.entities
            .index_of(entity)
            .map(|index| self.entities.signature_at(index))
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Id of the registered component type `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredType`] if `C` was never registered.
    pub fn component_id<C: Component>(&self) -> EcsResult<ComponentId> {
        self.store
            .id_of::<C>()
            .ok_or(EcsError::UnregisteredType(std::any::type_name::<C>()))
    }

    /// Id of the component registered under `name`.
    ///
    /// Typed components are registered under their full type name.
    #[must_use]
    pub fn component_named(&self, name: &str) -> Option<ComponentId> {
        self.store.id_named(name)
    }

    /// Registration record of a component.
    #[must_use]
    pub fn component_info(&self, component: ComponentId) -> Option<&ComponentInfo> {
        self.store.info(component)
    }

    /// Registration records of all components, in id order.
    #[must_use]
    pub fn components(&self) -> &[ComponentInfo] {
        self.store.infos()
    }

    /// Number of registered component types.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.store.len()
    }

    /// Attaches `value` to `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredType`], [`EcsError::StaleEntity`], or
    /// [`EcsError::AlreadyAttached`].
    pub fn attach<C: Component>(&mut self, entity: Entity, value: C) -> EcsResult<()> {
        let result = self
            .component_id::<C>()
            .and_then(|component| self.insert(entity, component, bytemuck::bytes_of(&value)));
        logged("attach", result)
    }

    /// Attaches a component given as raw record bytes.
    ///
    /// Works for typed components too; `bytes` is then the component's
    /// in-memory representation.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`], [`EcsError::UnknownComponent`],
    /// [`EcsError::SizeMismatch`], or [`EcsError::AlreadyAttached`].
    pub fn attach_bytes(&mut self, entity: Entity, component: ComponentId, bytes: &[u8]) -> EcsResult<()> {
        let result = self.insert(entity, component, bytes);
        logged("attach", result)
    }

    /// Detaches component type `C` from `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredType`], [`EcsError::StaleEntity`], or
    /// [`EcsError::NotAttached`].
    pub fn detach<C: Component>(&mut self, entity: Entity) -> EcsResult<()> {
        let result = self
            .component_id::<C>()
            .and_then(|component| self.remove(entity, component));
        logged("detach", result)
    }

    /// Detaches a component by id.
    ///
    /// Only the signature bit is cleared; the record keeps its bytes until it
    /// is overwritten.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`], [`EcsError::UnknownComponent`], or
    /// [`EcsError::NotAttached`].
    pub fn detach_id(&mut self, entity: Entity, component: ComponentId) -> EcsResult<()> {
        let result = self.remove(entity, component);
        logged("detach", result)
    }

    /// Borrows component `C` of `entity`, if attached.
    #[must_use]
    pub fn fetch<C: Component>(&self, entity: Entity) -> Option<&C> {
        let component = self.store.id_of::<C>()?;
        let index = self.attached_index(entity, component)?;
        self.store.typed::<C>(component)?.get(index)
    }

    /// Mutably borrows component `C` of `entity`, if attached.
    pub fn fetch_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        let component = self.store.id_of::<C>()?;
        let index = self.attached_index(entity, component)?;
        self.store.typed_mut::<C>(component)?.get_mut(index)
    }

    /// Borrows the record bytes of a component, if attached.
    #[must_use]
    pub fn fetch_bytes(&self, entity: Entity, component: ComponentId) -> Option<&[u8]> {
        let index = self.attached_index(entity, component)?;
        Some(self.store.column(component)?.record(index))
    }

    /// Mutably borrows the record bytes of a component, if attached.
    pub fn fetch_bytes_mut(&mut self, entity: Entity, component: ComponentId) -> Option<&mut [u8]> {
        let index = self.attached_index(entity, component)?;
        Some(self.store.column_mut(component)?.record_mut(index))
    }

    /// Checks whether component type `C` is attached. `false` for invalid
    /// handles and unregistered types.
    #[must_use]
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.store
            .id_of::<C>()
            .is_some_and(|component| self.has_id(entity, component))
    }

    /// Checks whether a component is attached. `false` for invalid handles.
    #[must_use]
    pub fn has_id(&self, entity: Entity, component: ComponentId) -> bool {
        self.attached_index(entity, component).is_some()
    }

    /// Dense index of `entity` if `component` is attached to it.
    fn attached_index(&self, entity: Entity, component: ComponentId) -> Option<usize> {
        let index = self.entities.index_of(entity)?;
        self.entities
            .signature_at(index)
            .contains(component)
            .then_some(index)
    }

    fn live_index(&self, entity: Entity) -> EcsResult<usize> {
        self.entities
            .index_of(entity)
            .ok_or(EcsError::StaleEntity(entity))
    }

    fn known(&self, component: ComponentId) -> EcsResult<&ComponentInfo> {
        self.store
            .info(component)
            .ok_or(EcsError::UnknownComponent(component))
    }

    fn insert(&mut self, entity: Entity, component: ComponentId, bytes: &[u8]) -> EcsResult<()> {
        let index = self.live_index(entity)?;
        let expected = self.known(component)?.size();
        if bytes.len() != expected {
            return Err(EcsError::SizeMismatch {
                component,
                expected,
                actual: bytes.len(),
            });
        }
        let signature = self.entities.signature_at(index);
        if signature.contains(component) {
            return Err(EcsError::AlreadyAttached { entity, component });
        }

        self.store
            .column_mut(component)
            .ok_or(EcsError::UnknownComponent(component))?
            .record_mut(index)
            .copy_from_slice(bytes);

        let signature = signature.with(component);
        self.entities.set_signature(index, signature);
        self.systems.refresh(entity, signature);
        tracing::debug!("Component {} attached to {}", component, entity);
        Ok(())
    }

    fn remove(&mut self, entity: Entity, component: ComponentId) -> EcsResult<()> {
        let index = self.live_index(entity)?;
        self.known(component)?;
        let signature = self.entities.signature_at(index);
        if !signature.contains(component) {
            return Err(EcsError::NotAttached { entity, component });
        }

        let signature = signature.without(component);
        self.entities.set_signature(index, signature);
        self.systems.refresh(entity, signature);
        tracing::debug!("Component {} detached from {}", component, entity);
        Ok(())
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers a system that requires every component in `components`.
    ///
    /// Systems run in registration order. A system with no required
    /// components runs over every live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] for an id that was never
    /// registered; the system is then dropped.
    pub fn register<S: System + 'static>(
        &mut self,
        system: S,
        components: &[ComponentId],
    ) -> EcsResult<SystemId> {
        let mut signature = Signature::EMPTY;
        for &component in components {
            if let Err(error) = self.known(component) {
                return logged("register", Err(error));
            }
            signature = signature.with(component);
        }

        let name = system.name().to_owned();
        let id = self.systems.register(
            Box::new(system),
            signature,
            self.entities.iter_with_signatures(),
        );
        tracing::info!(
            "System {} registered as {} ({} matching entities)",
            name,
            id,
            self.systems.get(id).map_or(0, |entry| entry.members().len())
        );
        Ok(id)
    }

    /// Entities a system currently runs over, in iteration order.
    #[must_use]
    pub fn system_entities(&self, system: SystemId) -> Option<&[Entity]> {
        self.systems.get(system).map(|entry| entry.members())
    }

    /// Components a system requires.
    #[must_use]
    pub fn system_signature(&self, system: SystemId) -> Option<Signature> {
        self.systems.get(system).map(|entry| entry.signature())
    }

    /// Log name of a system.
    #[must_use]
    pub fn system_name(&self, system: SystemId) -> Option<&str> {
        self.systems.get(system).map(|entry| entry.name())
    }

    /// Number of registered systems.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Runs every system once, in registration order.
    ///
    /// Each system receives a [`View`] with copies of its components for
    /// every cached entity; the copies are written back after it returns.
    /// Commands queued through [`View::commands`] are applied after the last
    /// system.
    pub fn tick(&mut self, delta_seconds: f64) {
        let Self {
            entities,
            store,
            systems,
            view,
            ..
        } = self;

        for entry in systems.iter_mut() {
            view.gather(store, entities, entry.members(), entry.signature(), delta_seconds);
            entry.run(view);
            view.scatter(store, entities);
            tracing::trace!("System {} ran over {} entities", entry.name(), view.len());
            view.reset();
        }

        let mut commands = self.view.take_commands();
        if !commands.is_empty() {
            let queued = commands.len();
            let applied = self.apply_commands(&mut commands);
            tracing::debug!("Applied {} of {} queued commands", applied, queued);
        }
        self.view.restore_commands(commands);
        self.ticks += 1;
    }

    /// Applies and drains every command in `commands`, in order.
    ///
    /// Failing commands are logged and skipped. Returns the number of
    /// commands that succeeded.
    pub fn apply_commands(&mut self, commands: &mut CommandBuffer) -> usize {
        let mut applied = 0;
        for command in commands.drain() {
            if self.apply(command) {
                applied += 1;
            }
        }
        applied
    }

    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Destroy(entity) => self.destroy(entity),
            Command::Attach { entity, key, bytes } => match self.resolve(key) {
                Ok(component) => self.attach_bytes(entity, component, &bytes).is_ok(),
                Err(error) => logged::<()>("attach", Err(error)).is_ok(),
            },
            Command::Detach { entity, key } => match self.resolve(key) {
                Ok(component) => self.detach_id(entity, component).is_ok(),
                Err(error) => logged::<()>("detach", Err(error)).is_ok(),
            },
        }
    }

    fn resolve(&self, key: ComponentKey) -> EcsResult<ComponentId> {
        match key {
            ComponentKey::Id(component) => Ok(component),
            ComponentKey::Type { type_id, name } => self.component_by_type(type_id, name),
        }
    }

    fn component_by_type(&self, type_id: TypeId, name: &'static str) -> EcsResult<ComponentId> {
        self.store
            .id_of_type(type_id)
            .ok_or(EcsError::UnregisteredType(name))
    }

    /// Number of completed ticks.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Tears the world down, logging a summary. All storage is released.
    pub fn shutdown(self) {
        tracing::info!(
            "World shut down after {} ticks: {} live entities, {} component types, {} systems",
            self.ticks,
            self.entities.len(),
            self.store.len(),
            self.systems.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Component for Position {}

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    impl Component for Velocity {}

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Unregistered(u8);

    impl Component for Unregistered {}

    fn world() -> World {
        World::builder()
            .component::<Position>()
            .component::<Velocity>()
            .byte_component("tag", 4)
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_and_validate() {
        let mut world = world();
        let a = world.create();
        let b = world.create();

        assert_ne!(a, b);
        assert!(world.validate(a));
        assert!(world.validate(b));
        assert!(!world.validate(Entity::NULL));
        assert_eq!(world.len(), 2);
        assert_eq!(world.signature(a), Some(Signature::EMPTY));
    }

    #[test]
    fn test_destroy_invalidates_and_is_idempotent() {
        let mut world = world();
        let entity = world.create();

        assert!(world.destroy(entity));
        assert!(!world.validate(entity));
        assert!(!world.destroy(entity));
        assert!(!world.destroy(Entity::NULL));
        assert!(world.is_empty());
    }

    #[test]
    fn test_world_grows_past_capacity() {
        let mut world = World::builder().component::<Position>().build().unwrap();
        let initial = world.capacity();

        let entities: Vec<_> = (0..initial + 1).map(|_| world.create()).collect();
        assert!(world.capacity() > initial);
        assert!(entities.iter().all(|&e| world.validate(e)));
    }

    #[test]
    fn test_typed_attach_fetch_detach() {
        let mut world = world();
        let entity = world.create();

        world.attach(entity, Position { x: 1.0, y: 2.0 }).unwrap();
        assert!(world.has::<Position>(entity));
        assert_eq!(world.fetch::<Position>(entity), Some(&Position { x: 1.0, y: 2.0 }));

        world.fetch_mut::<Position>(entity).unwrap().x = 5.0;
        assert_eq!(world.fetch::<Position>(entity).unwrap().x, 5.0);

        world.detach::<Position>(entity).unwrap();
        assert!(!world.has::<Position>(entity));
        assert_eq!(world.fetch::<Position>(entity), None);
    }

    #[test]
    fn test_byte_attach_fetch() {
        let mut world = world();
        let tag = world.component_named("tag").unwrap();
        let entity = world.create();

        world.attach_bytes(entity, tag, &[1, 2, 3, 4]).unwrap();
        assert_eq!(world.fetch_bytes(entity, tag), Some(&[1u8, 2, 3, 4][..]));

        world.fetch_bytes_mut(entity, tag).unwrap()[0] = 9;
        assert_eq!(world.fetch_bytes(entity, tag).unwrap()[0], 9);
    }

    #[test]
    fn test_typed_component_is_reachable_as_bytes() {
        let mut world = world();
        let position = world.component_id::<Position>().unwrap();
        let entity = world.create();

        let value = Position { x: 3.0, y: 4.0 };
        world.attach_bytes(entity, position, bytemuck::bytes_of(&value)).unwrap();
        assert_eq!(world.fetch::<Position>(entity), Some(&value));
    }

    #[test]
    fn test_rejected_operations_change_nothing() {
        let mut world = world();
        let tag = world.component_named("tag").unwrap();
        let entity = world.create();
        let stale = world.create();
        world.destroy(stale);

        assert_eq!(
            world.attach(stale, Position::default()),
            Err(EcsError::StaleEntity(stale))
        );
        assert_eq!(
            world.attach_bytes(entity, ComponentId::new(9), &[0; 4]),
            Err(EcsError::UnknownComponent(ComponentId::new(9)))
        );
        assert_eq!(
            world.attach_bytes(entity, tag, &[0; 3]),
            Err(EcsError::SizeMismatch {
                component: tag,
                expected: 4,
                actual: 3
            })
        );
        assert!(matches!(
            world.attach(entity, Unregistered(1)),
            Err(EcsError::UnregisteredType(_))
        ));
        assert_eq!(
            world.detach_id(entity, tag),
            Err(EcsError::NotAttached { entity, component: tag })
        );

        world.attach_bytes(entity, tag, &[7; 4]).unwrap();
        assert_eq!(
            world.attach_bytes(entity, tag, &[8; 4]),
            Err(EcsError::AlreadyAttached { entity, component: tag })
        );
        assert_eq!(world.fetch_bytes(entity, tag), Some(&[7u8; 4][..]));
        assert_eq!(world.signature(entity), Some(Signature::EMPTY.with(tag)));
    }

    #[test]
    fn test_detach_keeps_record_bytes() {
        let mut world = world();
        let tag = world.component_named("tag").unwrap();
        let entity = world.create();

        world.attach_bytes(entity, tag, &[5; 4]).unwrap();
        world.detach_id(entity, tag).unwrap();
        assert_eq!(world.fetch_bytes(entity, tag), None);

        // Re-attaching overwrites the stale record.
        world.attach_bytes(entity, tag, &[6; 4]).unwrap();
        assert_eq!(world.fetch_bytes(entity, tag), Some(&[6u8; 4][..]));
    }

    #[test]
    fn test_destroy_compacts_payloads() {
        let mut world = world();
        let entities: Vec<_> = (0..3).map(|_| world.create()).collect();
        for (i, &entity) in entities.iter().enumerate() {
            world
                .attach(entity, Position { x: i as f32, y: 0.0 })
                .unwrap();
        }

        world.destroy(entities[0]);
        assert_eq!(world.dense_index(entities[2]), Some(0));
        assert_eq!(world.fetch::<Position>(entities[2]).unwrap().x, 2.0);
        assert_eq!(world.fetch::<Position>(entities[1]).unwrap().x, 1.0);
        assert_eq!(world.entities(), &[entities[2], entities[1]]);
    }

    #[test]
    fn test_register_seeds_and_tracks_members() {
        let mut world = world();
        let position = world.component_id::<Position>().unwrap();
        let velocity = world.component_id::<Velocity>().unwrap();

        let moving = world.create();
        world.attach(moving, Position::default()).unwrap();
        world.attach(moving, Velocity::default()).unwrap();
        let still = world.create();
        world.attach(still, Position::default()).unwrap();

        let system = world
            .register(|_: &mut View| {}, &[position, velocity])
            .unwrap();
        assert_eq!(world.system_entities(system), Some(&[moving][..]));
        assert_eq!(
            world.system_signature(system),
            Some(Signature::EMPTY.with(position).with(velocity))
        );

        world.attach(still, Velocity::default()).unwrap();
        assert_eq!(world.system_entities(system), Some(&[moving, still][..]));

        world.detach::<Velocity>(moving).unwrap();
        assert_eq!(world.system_entities(system), Some(&[still][..]));

        world.destroy(still);
        assert_eq!(world.system_entities(system).map(<[Entity]>::len), Some(0));
    }

    #[test]
    fn test_register_rejects_unknown_component() {
        let mut world = world();
        let result = world.register(|_: &mut View| {}, &[ComponentId::new(20)]);
        assert_eq!(result, Err(EcsError::UnknownComponent(ComponentId::new(20))));
        assert_eq!(world.system_count(), 0);
    }

    #[test]
    fn test_tick_writes_back_view_changes() {
        let mut world = world();
        let position = world.component_id::<Position>().unwrap();
        let velocity = world.component_id::<Velocity>().unwrap();

        let entity = world.create();
        world.attach(entity, Position { x: 0.0, y: 0.0 }).unwrap();
        world.attach(entity, Velocity { x: 2.0, y: -1.0 }).unwrap();

        world
            .register(
                |view: &mut View| {
                    let dt = view.delta_seconds() as f32;
                    if let Some((positions, velocities)) = view.field_pair_mut::<Position, Velocity>() {
                        for (p, v) in positions.iter_mut().zip(velocities.iter()) {
                            p.x += v.x * dt;
                            p.y += v.y * dt;
                        }
                    }
                },
                &[position, velocity],
            )
            .unwrap();

        world.tick(0.5);
        world.tick(0.5);

        assert_eq!(world.fetch::<Position>(entity), Some(&Position { x: 2.0, y: -1.0 }));
        assert_eq!(world.ticks(), 2);
    }

    #[test]
    fn test_systems_run_in_registration_order() {
        let mut world = world();
        let order = Rc::new(RefCell::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            world
                .register(move |_: &mut View| order.borrow_mut().push(label), &[])
                .unwrap();
        }
        world.tick(1.0);

        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_requirement_sees_every_entity() {
        let mut world = world();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        world
            .register(move |view: &mut View| *counter.borrow_mut() += view.len(), &[])
            .unwrap();

        for _ in 0..5 {
            world.create();
        }
        world.tick(1.0);

        assert_eq!(*seen.borrow(), 5);
    }

    #[test]
    fn test_commands_apply_after_tick() {
        let mut world = world();
        let position = world.component_id::<Position>().unwrap();
        let doomed = world.create();
        world.attach(doomed, Position::default()).unwrap();
        let survivor = world.create();

        let seen_during_tick = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&seen_during_tick);
        world
            .register(
                move |view: &mut View| {
                    let entities = view.entities().to_vec();
                    seen.borrow_mut().extend_from_slice(&entities);
                    for entity in entities {
                        view.commands().destroy(entity);
                    }
                    view.commands().attach(survivor, Velocity { x: 1.0, y: 1.0 });
                },
                &[position],
            )
            .unwrap();

        world.tick(1.0);

        assert_eq!(*seen_during_tick.borrow(), vec![doomed]);
        assert!(!world.validate(doomed));
        assert_eq!(world.fetch::<Velocity>(survivor), Some(&Velocity { x: 1.0, y: 1.0 }));
    }

    #[test]
    fn test_failing_commands_are_skipped() {
        let mut world = world();
        let tag = world.component_named("tag").unwrap();
        let entity = world.create();

        let mut commands = CommandBuffer::new();
        commands.attach(entity, Unregistered(3));
        commands.attach_bytes(entity, tag, vec![1, 2]);
        commands.attach_bytes(entity, tag, vec![1, 2, 3, 4]);
        commands.destroy(Entity::NULL);

        assert_eq!(world.apply_commands(&mut commands), 1);
        assert!(commands.is_empty());
        assert_eq!(world.fetch_bytes(entity, tag), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_builder_reports_first_error() {
        let result = World::builder()
            .component::<Position>()
            .component::<Position>()
            .byte_component("empty", 0)
            .build();
        assert!(matches!(result, Err(EcsError::DuplicateComponent(_))));

        let result = World::builder()
            .byte_component("tag", 4)
            .byte_component("tag", 8)
            .build();
        assert_eq!(result.err(), Some(EcsError::DuplicateComponent("tag".to_owned())));
    }

    #[test]
    fn test_builder_from_config() {
        let config = WorldConfig::from_toml_str(
            r#"
            initial_capacity = 100

            [[components]]
            name = "rect"
            size = 16
            "#,
        )
        .unwrap();

        let world = WorldBuilder::from_config(&config).build().unwrap();
        let rect = world.component_named("rect").unwrap();
        assert_eq!(world.component_info(rect).map(ComponentInfo::size), Some(16));
        assert!(world.capacity() >= 100);
        world.shutdown();
    }
}
