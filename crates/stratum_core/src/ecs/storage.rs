//! # Component Storage
//!
//! Dense component columns that share the entity table's dense index.
//!
//! The storage uses a dense array strategy:
//! - Every column holds exactly one record per live entity
//! - Access is O(1) via the dense index
//! - Destroying an entity swap-removes the same index in every column
//!
//! Columns come in two kinds behind [`ComponentColumn`]: [`TypedColumn`] for
//! Rust types and [`ByteColumn`] for components known only by their size.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::component::{Component, ComponentId, ComponentInfo, MAX_COMPONENTS};
use crate::error::{EcsError, EcsResult};

/// Type-erased dense column of fixed-size records.
pub(crate) trait ComponentColumn: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Creates an empty column of the same kind and element size.
    fn new_empty(&self) -> Box<dyn ComponentColumn>;
    fn len(&self) -> usize;
    fn element_size(&self) -> usize;
    fn reserve(&mut self, additional: usize);
    fn push_zeroed(&mut self);
    /// Appends one record given as exactly `element_size` bytes.
    fn push_record(&mut self, bytes: &[u8]);
    fn swap_remove(&mut self, index: usize);
    fn clear(&mut self);
    fn as_bytes(&self) -> &[u8];
    fn as_bytes_mut(&mut self) -> &mut [u8];

    fn record(&self, index: usize) -> &[u8] {
        let size = self.element_size();
        &self.as_bytes()[index * size..(index + 1) * size]
    }

    fn record_mut(&mut self, index: usize) -> &mut [u8] {
        let size = self.element_size();
        &mut self.as_bytes_mut()[index * size..(index + 1) * size]
    }
}

/// Column of a Rust component type.
pub(crate) struct TypedColumn<C: Component> {
    data: Vec<C>,
}

impl<C: Component> TypedColumn<C> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.data.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.data.get_mut(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.data
    }
}

impl<C: Component> ComponentColumn for TypedColumn<C> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn new_empty(&self) -> Box<dyn ComponentColumn> {
        Box::new(Self::new())
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn element_size(&self) -> usize {
        std::mem::size_of::<C>()
    }

    fn reserve(&mut self, additional: usize) {
        self.data.reserve_exact(additional);
    }

    fn push_zeroed(&mut self) {
        self.data.push(C::zeroed());
    }

    fn push_record(&mut self, bytes: &[u8]) {
        self.data.push(bytemuck::pod_read_unaligned(bytes));
    }

    fn swap_remove(&mut self, index: usize) {
        self.data.swap_remove(index);
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.data.as_slice())
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(self.data.as_mut_slice())
    }
}

/// Column of a component declared only by its element size.
pub(crate) struct ByteColumn {
    element_size: usize,
    data: Vec<u8>,
}

impl ByteColumn {
    pub fn new(element_size: usize) -> Self {
        debug_assert!(element_size > 0, "byte columns need a non-zero element size");
        Self {
            element_size,
            data: Vec::new(),
        }
    }
}

impl ComponentColumn for ByteColumn {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn new_empty(&self) -> Box<dyn ComponentColumn> {
        Box::new(Self::new(self.element_size))
    }

    fn len(&self) -> usize {
        self.data.len() / self.element_size
    }

    fn element_size(&self) -> usize {
        self.element_size
    }

    fn reserve(&mut self, additional: usize) {
        self.data.reserve_exact(additional * self.element_size);
    }

    fn push_zeroed(&mut self) {
        self.data.resize(self.data.len() + self.element_size, 0);
    }

    fn push_record(&mut self, bytes: &[u8]) {
        debug_assert_eq!(bytes.len(), self.element_size);
        self.data.extend_from_slice(bytes);
    }

    fn swap_remove(&mut self, index: usize) {
        let size = self.element_size;
        let last = self.len() - 1;
        if index != last {
            self.data
                .copy_within(last * size..(last + 1) * size, index * size);
        }
        self.data.truncate(last * size);
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// All component columns of a world plus their registration records.
///
/// Column `i` stores component id `i`. Every column has the same length as
/// the entity table's live range.
pub(crate) struct ComponentStore {
    columns: Vec<Box<dyn ComponentColumn>>,
    infos: Vec<ComponentInfo>,
    by_type: HashMap<TypeId, ComponentId>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            infos: Vec::new(),
            by_type: HashMap::new(),
        }
    }

    /// Number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Registers a Rust component type.
    pub fn register_typed<C: Component>(&mut self) -> EcsResult<ComponentId> {
        let name = std::any::type_name::<C>();
        if self.by_type.contains_key(&TypeId::of::<C>()) {
            return Err(EcsError::DuplicateComponent(name.to_owned()));
        }
        let id = self.push(
            name.to_owned(),
            std::mem::size_of::<C>(),
            Some(TypeId::of::<C>()),
            Box::new(TypedColumn::<C>::new()),
        )?;
        self.by_type.insert(TypeId::of::<C>(), id);
        Ok(id)
    }

    /// Registers a component known only by name and element size.
    pub fn register_bytes(&mut self, name: &str, size: usize) -> EcsResult<ComponentId> {
        if size == 0 {
            return Err(EcsError::ZeroSizedComponent(name.to_owned()));
        }
        self.push(name.to_owned(), size, None, Box::new(ByteColumn::new(size)))
    }

    fn push(
        &mut self,
        name: String,
        size: usize,
        rust_type: Option<TypeId>,
        column: Box<dyn ComponentColumn>,
    ) -> EcsResult<ComponentId> {
        if self.len() >= MAX_COMPONENTS {
            return Err(EcsError::TooManyComponents {
                requested: self.len() + 1,
                max: MAX_COMPONENTS,
            });
        }
        if self.id_named(&name).is_some() {
            return Err(EcsError::DuplicateComponent(name));
        }
        // MAX_COMPONENTS fits a u8
        let id = ComponentId::new(self.len() as u8);
        self.infos.push(ComponentInfo::new(id, name, size, rust_type));
        self.columns.push(column);
        Ok(id)
    }

    /// Registration record of a component id.
    #[inline]
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// All registration records in id order.
    #[inline]
    pub fn infos(&self) -> &[ComponentInfo] {
        &self.infos
    }

    /// Id of a registered Rust type.
    #[inline]
    pub fn id_of<C: Component>(&self) -> Option<ComponentId> {
        self.id_of_type(TypeId::of::<C>())
    }

    /// Id of a registered Rust type by its `TypeId`.
    #[inline]
    pub fn id_of_type(&self, type_id: TypeId) -> Option<ComponentId> {
        self.by_type.get(&type_id).copied()
    }

    /// Id of the component registered under `name`.
    pub fn id_named(&self, name: &str) -> Option<ComponentId> {
        self.infos
            .iter()
            .find(|info| info.name() == name)
            .map(ComponentInfo::id)
    }

    #[inline]
    pub fn column(&self, id: ComponentId) -> Option<&(dyn ComponentColumn + 'static)> {
        self.columns.get(id.index()).map(Box::as_ref)
    }

    #[inline]
    pub fn column_mut(&mut self, id: ComponentId) -> Option<&mut (dyn ComponentColumn + 'static)> {
        self.columns.get_mut(id.index()).map(Box::as_mut)
    }

    /// Typed column of `C`, if `C` is registered under `id`.
    pub fn typed<C: Component>(&self, id: ComponentId) -> Option<&TypedColumn<C>> {
        self.column(id)?.as_any().downcast_ref::<TypedColumn<C>>()
    }

    /// Mutable typed column of `C`, if `C` is registered under `id`.
    pub fn typed_mut<C: Component>(&mut self, id: ComponentId) -> Option<&mut TypedColumn<C>> {
        self.column_mut(id)?.as_any_mut().downcast_mut::<TypedColumn<C>>()
    }

    /// Reserves every column so it can hold `capacity` records.
    pub fn reserve_total(&mut self, capacity: usize) {
        for column in &mut self.columns {
            let len = column.len();
            if capacity > len {
                column.reserve(capacity - len);
            }
        }
    }

    /// Appends a zeroed record to every column (a new dense index).
    pub fn push_zeroed(&mut self) {
        for column in &mut self.columns {
            column.push_zeroed();
        }
    }

    /// Moves the last record of every column into `index`.
    pub fn swap_remove(&mut self, index: usize) {
        for column in &mut self.columns {
            column.swap_remove(index);
        }
    }
}
