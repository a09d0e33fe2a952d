//! # Manager Configuration
//!
//! Initial capacities for a [`Manager`](crate::ecs::Manager), loadable from
//! TOML:
//!
//! ```toml
//! initial_entity_capacity = 4096
//! initial_component_types = 32
//! ```
//!
//! Missing keys fall back to [`ManagerConfig::default`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, EcsResult};

/// Initial capacities reserved by a new manager.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Entity slots to allocate up front.
    pub initial_entity_capacity: usize,
    /// Pool table entries to allocate up front.
    pub initial_component_types: usize,
}

impl ManagerConfig {
    /// Preset for simulation loops: room for a few thousand entities
    /// before the first growth.
    #[must_use]
    pub const fn simulation() -> Self {
        Self {
            initial_entity_capacity: 4096,
            initial_component_types: 32,
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the text is not valid TOML or a key
    /// has the wrong type.
    pub fn from_toml_str(text: &str) -> EcsResult<Self> {
        toml::from_str(text).map_err(|err| EcsError::InvalidConfig(err.to_string()))
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| EcsError::InvalidConfig(format!("{}: {err}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded manager config");
        Ok(config)
    }
}
