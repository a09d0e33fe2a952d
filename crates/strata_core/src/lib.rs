//! # STRATA Core
//!
//! In-memory entity/component storage for simulation workloads:
//! - Per-type contiguous sparse-set pools
//! - O(1) amortized add / remove / lookup
//! - Generational handles that detect recycled slots
//!
//! ## Architecture Rules
//!
//! 1. **Deferred structure** - entity creation and destruction become
//!    visible only at [`Manager::refresh`]
//! 2. **No dangling handles** - an [`Entity`] is a plain value; every
//!    operation takes the manager explicitly
//! 3. **Contracts are debug assertions** - reading a missing component or
//!    using a stale handle is caught in debug builds, never undefined in
//!    release builds
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::Manager;
//!
//! let mut manager = Manager::new();
//! let entity = manager.create_entity();
//! manager.add(entity, Position(1, 2));
//! manager.refresh();
//! assert_eq!(manager.entities_with::<(Position,)>().count(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod archive;
pub mod bitset;
pub mod config;
pub mod ecs;
pub mod error;

pub use archive::{Archiver, PoolData, PoolSnapshot, Unarchiver};
pub use bitset::DynamicBitset;
pub use config::ManagerConfig;
pub use ecs::{
    All, Component, ComponentSet, ComponentTypeId, Cursor, Entity, EntityMut, EntityRef,
    HookId, HookSlot, Manager, ManagerId, Pool, TypeRegistry, View, ViewMut, With, Without,
};
pub use error::{EcsError, EcsResult};
