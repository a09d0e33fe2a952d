//! # Error Types
//!
//! Recoverable errors of the storage engine.
//!
//! Programmer contract violations (reading a component an entity does not
//! have, using a stale handle) are not represented here: they are debug
//! assertions, see the crate documentation.

use thiserror::Error;

/// Errors that can occur while configuring a manager or moving pool data
/// in and out of an archiver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The injected archiver failed to read or write.
    #[error("archive error: {0}")]
    Archive(String),

    /// Archived pool data breaks the sparse-set invariant.
    #[error("corrupt pool for {type_name}: {reason}")]
    CorruptPool {
        /// Component type stored by the pool.
        type_name: &'static str,
        /// What the validation found.
        reason: String,
    },

    /// The entity has no component of the requested type.
    #[error("entity has no {type_name} component")]
    MissingComponent {
        /// Requested component type.
        type_name: &'static str,
    },

    /// No pool has been registered for the requested type.
    #[error("no pool registered for {type_name}")]
    UnknownComponent {
        /// Requested component type.
        type_name: &'static str,
    },
}

/// Result type for storage engine operations.
pub type EcsResult<T> = Result<T, EcsError>;
