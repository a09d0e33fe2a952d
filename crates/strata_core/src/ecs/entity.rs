//! # Entity Handles
//!
//! Entities are lightweight values consisting of:
//! - A slot into the manager's per-entity arrays
//! - A version (generation) counter for detecting recycled slots
//! - The id of the manager that issued them
//!
//! Handles carry no pointer. Every operation takes the manager explicitly,
//! so a handle can outlive its manager without dangling; it simply stops
//! resolving.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Source of manager ids. Zero is reserved for [`ManagerId::NONE`].
static NEXT_MANAGER_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of one manager instance.
///
/// Every new manager, every clone and every `clear`/`reset` draws a fresh
/// id, so handles issued before those points never compare equal to handles
/// issued after them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerId(u32);

impl ManagerId {
    /// Id carried by [`Entity::NULL`]; never assigned to a manager.
    pub const NONE: Self = Self(0);

    /// Draws the next unused id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Handle to an entity: `(slot, version, manager)`.
///
/// Equality and hashing cover all three fields. Two handles with the same
/// slot but different versions never refer to the same logical entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    slot: u32,
    version: u32,
    manager: ManagerId,
}

impl Entity {
    /// Null/invalid entity handle. Never alive in any manager.
    pub const NULL: Self = Self {
        slot: u32::MAX,
        version: 0,
        manager: ManagerId::NONE,
    };

    /// Creates a handle from its parts.
    ///
    /// # Arguments
    ///
    /// * `slot` - Row in the manager's per-entity arrays
    /// * `version` - The slot's version at the time the handle was issued
    /// * `manager` - Id of the issuing manager
    #[inline]
    #[must_use]
    pub const fn new(slot: u32, version: u32, manager: ManagerId) -> Self {
        Self {
            slot,
            version,
            manager,
        }
    }

    /// Returns the slot this handle points at.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> u32 {
        self.slot
    }

    /// Returns the slot as an index into per-entity arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.slot as usize
    }

    /// Returns the version the handle was issued with.
    #[inline]
    #[must_use]
    pub const fn version(self) -> u32 {
        self.version
    }

    /// Returns the id of the issuing manager.
    #[inline]
    #[must_use]
    pub const fn manager(self) -> ManagerId {
        self.manager
    }

    /// Checks if this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.manager.0 == ManagerId::NONE.0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("Entity(null)");
        }
        write!(
            f,
            "Entity({}v{}@{})",
            self.slot,
            self.version,
            self.manager.get()
        )
    }
}
