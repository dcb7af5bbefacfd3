//! # Entity Component System
//!
//! A data-oriented ECS with densely packed component columns.
//!
//! ## Design Philosophy
//!
//! - Entity handles are stable slot ids with generation counters
//! - Every component column shares one dense index, compacted on destroy
//! - Systems keep an incrementally maintained cache of matching entities
//! - Systems see packed copies of their components, never the world itself

mod commands;
mod component;
mod entity;
mod storage;
mod system;
mod view;
mod world;

pub use commands::{Command, CommandBuffer, ComponentKey};
pub use component::{Component, ComponentId, ComponentInfo, Signature, MAX_COMPONENTS};
pub use entity::{Entity, GENERATION_BITS, SLOT_BITS, SLOT_MASK};
pub use system::{System, SystemId};
pub use view::View;
pub use world::{World, WorldBuilder};

pub(crate) use entity::MIN_CAPACITY;
