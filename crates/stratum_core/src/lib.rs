//! # STRATUM Core
//!
//! Data-oriented Entity Component System (ECS) for real-time simulations:
//! - Generational entity handles that detect stale references
//! - Dense, swap-compacted component columns with O(1) access
//! - Systems with incrementally cached membership, run once per tick
//!
//! ## Example
//!
//! ```rust
//! use bytemuck::{Pod, Zeroable};
//! use stratum_core::{Component, View, World};
//!
//! #[derive(Clone, Copy, Default, Pod, Zeroable)]
//! #[repr(C)]
//! struct Position { x: f32, y: f32 }
//! impl Component for Position {}
//!
//! #[derive(Clone, Copy, Default, Pod, Zeroable)]
//! #[repr(C)]
//! struct Velocity { x: f32, y: f32 }
//! impl Component for Velocity {}
//!
//! let mut world = World::builder()
//!     .component::<Position>()
//!     .component::<Velocity>()
//!     .build()?;
//!
//! let entity = world.create();
//! world.attach(entity, Position { x: 0.0, y: 0.0 })?;
//! world.attach(entity, Velocity { x: 1.0, y: 0.0 })?;
//!
//! let required = [world.component_id::<Position>()?, world.component_id::<Velocity>()?];
//! world.register(
//!     |view: &mut View| {
//!         let dt = view.delta_seconds() as f32;
//!         if let Some((positions, velocities)) = view.field_pair_mut::<Position, Velocity>() {
//!             for (p, v) in positions.iter_mut().zip(velocities.iter()) {
//!                 p.x += v.x * dt;
//!             }
//!         }
//!     },
//!     &required,
//! )?;
//!
//! world.tick(1.0);
//! assert_eq!(world.fetch::<Position>(entity).map(|p| p.x), Some(1.0));
//! # Ok::<(), stratum_core::EcsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::{ComponentDecl, WorldConfig};
pub use ecs::{
    Command, CommandBuffer, Component, ComponentId, ComponentInfo, ComponentKey, Entity,
    Signature, System, SystemId, View, World, WorldBuilder, GENERATION_BITS, MAX_COMPONENTS,
    SLOT_BITS, SLOT_MASK,
};
pub use error::{EcsError, EcsResult};
