//! # World Configuration
//!
//! Declarative world setup loaded from TOML:
//!
//! ```toml
//! initial_capacity = 64
//!
//! [[components]]
//! name = "rect"
//! size = 16
//! ```
//!
//! Components declared here are size-only byte components. Rust component
//! types are added on the [`WorldBuilder`](crate::WorldBuilder) afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::MIN_CAPACITY;
use crate::error::{EcsError, EcsResult};

/// Declaration of a size-only component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDecl {
    /// Unique component name.
    pub name: String,
    /// Record size in bytes. Must be non-zero.
    pub size: usize,
}

impl ComponentDecl {
    /// Creates a declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Startup configuration of a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Live entities the world reserves room for up front.
    pub initial_capacity: usize,
    /// Byte components registered in declaration order.
    pub components: Vec<ComponentDecl>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            initial_capacity: MIN_CAPACITY,
            components: Vec::new(),
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the text is not valid TOML or
    /// does not match the expected shape.
    pub fn from_toml_str(text: &str) -> EcsResult<Self> {
        toml::from_str(text).map_err(|e| EcsError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EcsError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> EcsResult<String> {
        toml::to_string(self).map_err(|e| EcsError::InvalidConfig(e.to_string()))
    }
}
