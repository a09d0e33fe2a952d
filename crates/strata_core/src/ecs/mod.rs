//! # Entity Component System
//!
//! Sparse-set storage with generational entity handles.
//!
//! ## Design
//!
//! - One [`Pool`] per component type, created the first time the type is used
//! - Entity creation and destruction are deferred until [`Manager::refresh`]
//! - Handles are plain values checked against per-slot versions
//! - Views filter lazily over a slot range pinned at construction

mod component;
mod entity;
mod handle;
mod hooks;
mod manager;
mod pool;
mod registry;
mod view;

pub use component::{Component, ComponentSet};
pub use entity::{Entity, ManagerId};
pub use handle::{EntityMut, EntityRef};
pub use hooks::{Hook, HookId, HookSlot, PoolHooks};
pub use manager::Manager;
pub use pool::{ErasedPool, Pool, PoolTable};
pub use registry::{ComponentTypeId, TypeRegistry};
pub use view::{All, Cursor, Filter, View, ViewIter, ViewMut, With, Without};
