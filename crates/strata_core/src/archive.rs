//! # Archiver Interface
//!
//! The storage engine does not define a persisted format. Pools hand their
//! raw arrays to an injected [`Archiver`] and take them back from an
//! [`Unarchiver`]; the byte or text layout is entirely the archiver's
//! business.
//!
//! What crosses the boundary:
//! - whole pools: the `sparse`, `dense` and `components` arrays
//! - single components: the entity handle and the value

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ecs::Entity;
use crate::error::{EcsError, EcsResult};

/// Borrowed view of a pool handed to [`Archiver::write_pool`].
#[derive(Debug, Serialize)]
pub struct PoolSnapshot<'a, T> {
    /// Slot -> dense index. May contain stale entries.
    pub sparse: &'a [usize],
    /// Dense index -> slot.
    pub dense: &'a [usize],
    /// Dense index -> component.
    pub components: &'a [T],
}

/// Owned pool arrays returned by [`Unarchiver::read_pool`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolData<T> {
    /// Slot -> dense index. May contain stale entries.
    pub sparse: Vec<usize>,
    /// Dense index -> slot.
    pub dense: Vec<usize>,
    /// Dense index -> component.
    pub components: Vec<T>,
}

impl<T> PoolData<T> {
    /// Checks the sparse-set invariant: every dense entry must be reachable
    /// through `sparse`, and `dense` and `components` must line up.
    ///
    /// # Errors
    ///
    /// [`EcsError::CorruptPool`] describing the first violation found.
    pub fn validate(&self, type_name: &'static str) -> EcsResult<()> {
        let corrupt = |reason: String| EcsError::CorruptPool { type_name, reason };

        if self.dense.len() != self.components.len() {
            return Err(corrupt(format!(
                "{} dense entries but {} components",
                self.dense.len(),
                self.components.len()
            )));
        }
        for (index, &slot) in self.dense.iter().enumerate() {
            match self.sparse.get(slot) {
                Some(&back) if back == index => {}
                Some(&back) => {
                    return Err(corrupt(format!(
                        "slot {slot} points at dense index {back}, expected {index}"
                    )))
                }
                None => {
                    return Err(corrupt(format!(
                        "slot {slot} is outside the sparse array of length {}",
                        self.sparse.len()
                    )))
                }
            }
        }
        Ok(())
    }

    /// Returns the highest slot stored, if any.
    #[must_use]
    pub fn max_slot(&self) -> Option<usize> {
        self.dense.iter().copied().max()
    }
}

/// Destination for pool and component data.
pub trait Archiver {
    /// Writes the arrays of the pool storing `type_name`.
    ///
    /// # Errors
    ///
    /// [`EcsError::Archive`] if the data could not be written.
    fn write_pool<T: Serialize>(
        &mut self,
        type_name: &'static str,
        pool: PoolSnapshot<'_, T>,
    ) -> EcsResult<()>;

    /// Writes the `type_name` component of `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::Archive`] if the data could not be written.
    fn write_component<T: Serialize>(
        &mut self,
        type_name: &'static str,
        entity: Entity,
        component: &T,
    ) -> EcsResult<()>;
}

/// Source of pool and component data.
pub trait Unarchiver {
    /// Reads the arrays of the pool storing `type_name`.
    ///
    /// # Errors
    ///
    /// [`EcsError::Archive`] if the data is missing or malformed.
    fn read_pool<T: DeserializeOwned>(&mut self, type_name: &'static str) -> EcsResult<PoolData<T>>;

    /// Reads the `type_name` component for `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::Archive`] if the data is missing or malformed.
    fn read_component<T: DeserializeOwned>(
        &mut self,
        type_name: &'static str,
        entity: Entity,
    ) -> EcsResult<T>;
}
