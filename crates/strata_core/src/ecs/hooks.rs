//! # Lifecycle Hooks
//!
//! Per-pool notification sinks fired at three points:
//! - construct: after a new value has been placed in the pool
//! - update: after an existing value has been replaced, or on an explicit
//!   `Manager::update`
//! - destruct: before a value is removed from the pool

use std::fmt;
use std::sync::Arc;

use super::entity::Entity;

/// A connected callback.
pub type Hook<T> = Arc<dyn Fn(Entity, &T) + Send + Sync>;

/// Token returned by [`HookSlot::connect`], used to disconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// A list of callbacks for one lifecycle point of one component type.
pub struct HookSlot<T> {
    hooks: Vec<(HookId, Hook<T>)>,
    next_id: u64,
}

impl<T> HookSlot<T> {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hooks: Vec::new(),
            next_id: 0,
        }
    }

    /// Connects `hook`; it runs after every previously connected hook.
    pub fn connect<F>(&mut self, hook: F) -> HookId
    where
        F: Fn(Entity, &T) + Send + Sync + 'static,
    {
        let id = HookId(self.next_id);
        self.next_id += 1;
        self.hooks.push((id, Arc::new(hook)));
        id
    }

    /// Disconnects the hook registered under `id`.
    ///
    /// Returns `false` if no such hook is connected.
    pub fn disconnect(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(hook_id, _)| *hook_id != id);
        self.hooks.len() != before
    }

    /// Disconnects every hook.
    pub fn clear(&mut self) {
        self.hooks.clear();
    }

    /// Returns the number of connected hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no hook is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    #[inline]
    pub(crate) fn fire(&self, entity: Entity, value: &T) {
        for (_, hook) in &self.hooks {
            hook(entity, value);
        }
    }
}

impl<T> Default for HookSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for HookSlot<T> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
            next_id: self.next_id,
        }
    }
}

impl<T> fmt::Debug for HookSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSlot")
            .field("connected", &self.hooks.len())
            .finish()
    }
}

/// The three hook slots of one pool.
pub struct PoolHooks<T> {
    /// Fired after a value is constructed.
    pub construct: HookSlot<T>,
    /// Fired after a value is replaced or explicitly updated.
    pub update: HookSlot<T>,
    /// Fired before a value is removed.
    pub destruct: HookSlot<T>,
}

impl<T> Default for PoolHooks<T> {
    fn default() -> Self {
        Self {
            construct: HookSlot::new(),
            update: HookSlot::new(),
            destruct: HookSlot::new(),
        }
    }
}

impl<T> Clone for PoolHooks<T> {
    fn clone(&self) -> Self {
        Self {
            construct: self.construct.clone(),
            update: self.update.clone(),
            destruct: self.destruct.clone(),
        }
    }
}

impl<T> fmt::Debug for PoolHooks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHooks")
            .field("construct", &self.construct)
            .field("update", &self.update)
            .field("destruct", &self.destruct)
            .finish()
    }
}
