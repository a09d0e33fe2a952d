//! # Component Pools
//!
//! Sparse-set storage for a single component type.
//!
//! ```text
//! sparse:     slot        -> dense index (or a stale value)
//! dense:      dense index -> slot
//! components: dense index -> T
//! ```
//!
//! A slot has a component iff
//! `slot < sparse.len() && sparse[slot] < dense.len() && dense[sparse[slot]] == slot`.
//! The back-reference check makes stale `sparse` entries harmless, so removal
//! never has to clean them up.
//!
//! - Add / remove / has / get: O(1) amortized
//! - Iteration over `components()`: contiguous, cache-friendly
//! - Removal swaps the last element into the hole: dense order is NOT stable

use std::any::{type_name, Any};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::component::Component;
use super::entity::Entity;
use super::hooks::{HookSlot, PoolHooks};
use super::registry::ComponentTypeId;
use crate::archive::{Archiver, PoolData, PoolSnapshot, Unarchiver};
use crate::bitset::DynamicBitset;
use crate::error::{EcsError, EcsResult};

/// Storage for every live component of type `T`.
///
/// Reads are keyed by slot. Writes take the full [`Entity`] handle so the
/// lifecycle hooks can report which entity changed.
pub struct Pool<T: Component> {
    /// Slot -> dense index. May hold stale values.
    sparse: Vec<usize>,
    /// Dense index -> slot.
    dense: Vec<usize>,
    /// Dense index -> component.
    components: Vec<T>,
    /// Construct / update / destruct notification sinks.
    hooks: PoolHooks<T>,
}

impl<T: Component> Pool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            components: Vec::new(),
            hooks: PoolHooks::default(),
        }
    }

    /// Returns the number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if the pool stores no component.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Checks if `slot` has a component in this pool.
    #[inline]
    #[must_use]
    pub fn has(&self, slot: usize) -> bool {
        match self.sparse.get(slot) {
            Some(&index) => index < self.dense.len() && self.dense[index] == slot,
            None => false,
        }
    }

    /// Returns the component of `slot`.
    ///
    /// `slot` must have a component; see [`try_get`](Self::try_get).
    #[inline]
    #[must_use]
    pub fn get(&self, slot: usize) -> &T {
        debug_assert!(self.has(slot), "slot {slot} has no {} component", type_name::<T>());
        &self.components[self.sparse[slot]]
    }

    /// Returns the component of `slot` mutably.
    ///
    /// `slot` must have a component; see [`try_get_mut`](Self::try_get_mut).
    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> &mut T {
        debug_assert!(self.has(slot), "slot {slot} has no {} component", type_name::<T>());
        &mut self.components[self.sparse[slot]]
    }

    /// Returns the component of `slot`, or `None` if it has none.
    #[inline]
    #[must_use]
    pub fn try_get(&self, slot: usize) -> Option<&T> {
        if self.has(slot) {
            Some(&self.components[self.sparse[slot]])
        } else {
            None
        }
    }

    /// Returns the component of `slot` mutably, or `None` if it has none.
    #[inline]
    pub fn try_get_mut(&mut self, slot: usize) -> Option<&mut T> {
        if self.has(slot) {
            Some(&mut self.components[self.sparse[slot]])
        } else {
            None
        }
    }

    /// Adds `value` to `entity`, replacing any existing value in place.
    ///
    /// A replacement keeps the dense index and fires the update hooks; a new
    /// value is appended and fires the construct hooks.
    pub fn add(&mut self, entity: Entity, value: T) -> &mut T {
        let slot = entity.index();
        if self.has(slot) {
            let index = self.sparse[slot];
            self.components[index] = value;
            self.hooks.update.fire(entity, &self.components[index]);
            return &mut self.components[index];
        }

        let index = self.dense.len();
        if slot < self.sparse.len() {
            // Previously used slot with a stale entry: repoint it.
            self.sparse[slot] = index;
        } else {
            // Never seen: grow, filling with the current dense length.
            self.sparse.resize(slot + 1, index);
        }
        self.dense.push(slot);
        self.components.push(value);
        self.hooks.construct.fire(entity, &self.components[index]);
        &mut self.components[index]
    }

    /// Removes the component of `entity`.
    ///
    /// The destruct hooks fire before the value is dropped. The last element
    /// is swapped into the hole. Returns `false` if there was nothing to
    /// remove.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let slot = entity.index();
        if !self.has(slot) {
            return false;
        }

        let index = self.sparse[slot];
        self.hooks.destruct.fire(entity, &self.components[index]);

        let last = self.dense.len() - 1;
        let moved_slot = self.dense[last];
        self.dense.swap_remove(index);
        self.components.swap_remove(index);
        if index != last {
            self.sparse[moved_slot] = index;
        }
        true
    }

    /// Copies the component of slot `from` onto `to`.
    ///
    /// If `to` already has a value it is overwritten in place (update hooks),
    /// otherwise a copy is added (construct hooks). `from` must have a
    /// component.
    pub fn copy(&mut self, from: usize, to: Entity) -> &mut T {
        let value = self.get(from).clone();
        self.add(to, value)
    }

    /// Fires the update hooks for the current value of `entity`.
    ///
    /// `entity` must have a component.
    pub fn update(&mut self, entity: Entity) -> &mut T {
        debug_assert!(self.has(entity.index()), "{entity:?} has no {} component", type_name::<T>());
        let index = self.sparse[entity.index()];
        self.hooks.update.fire(entity, &self.components[index]);
        &mut self.components[index]
    }

    /// Removes every component, keeping the allocations. Hooks do not fire.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.components.clear();
    }

    /// Removes every component and releases the allocations. Hooks do not
    /// fire and stay connected.
    pub fn reset(&mut self) {
        self.sparse = Vec::new();
        self.dense = Vec::new();
        self.components = Vec::new();
    }

    /// Number of components the pool can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.components.capacity()
    }

    /// Slots in dense order.
    #[inline]
    #[must_use]
    pub fn dense(&self) -> &[usize] {
        &self.dense
    }

    /// Components in dense order.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[T] {
        &self.components
    }

    /// Components in dense order, mutably.
    #[inline]
    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.components
    }

    /// Iterates over `(slot, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.dense.iter().copied().zip(self.components.iter())
    }

    /// Hooks fired after a value is constructed.
    pub fn on_construct(&mut self) -> &mut HookSlot<T> {
        &mut self.hooks.construct
    }

    /// Hooks fired after a value is replaced or explicitly updated.
    pub fn on_update(&mut self) -> &mut HookSlot<T> {
        &mut self.hooks.update
    }

    /// Hooks fired before a value is removed.
    pub fn on_destruct(&mut self) -> &mut HookSlot<T> {
        &mut self.hooks.destruct
    }

    /// Hands the whole pool (sparse, dense and component arrays) to
    /// `archiver`.
    ///
    /// # Errors
    ///
    /// Whatever the archiver reports.
    pub fn serialize<A: Archiver>(&self, archiver: &mut A) -> EcsResult<()>
    where
        T: Serialize,
    {
        archiver.write_pool(
            type_name::<T>(),
            PoolSnapshot {
                sparse: &self.sparse,
                dense: &self.dense,
                components: &self.components,
            },
        )
    }

    /// Replaces the pool contents with data read from `unarchiver`.
    ///
    /// Connected hooks are kept and do not fire.
    ///
    /// # Errors
    ///
    /// [`EcsError::CorruptPool`] if the data breaks the sparse-set
    /// invariant, or whatever the unarchiver reports.
    pub fn deserialize<U: Unarchiver>(&mut self, unarchiver: &mut U) -> EcsResult<()>
    where
        T: DeserializeOwned,
    {
        let data: PoolData<T> = unarchiver.read_pool(type_name::<T>())?;
        self.load(data, None)
    }

    /// Replaces the pool contents with `data` after validating it.
    ///
    /// With `alive`, every stored slot must hold a committed entity.
    pub(crate) fn load(&mut self, data: PoolData<T>, alive: Option<&DynamicBitset>) -> EcsResult<()> {
        let checked = data.validate(type_name::<T>()).and_then(|()| {
            let Some(alive) = alive else {
                return Ok(());
            };
            match data.dense.iter().find(|&&slot| slot >= alive.len() || !alive.get(slot)) {
                Some(slot) => Err(EcsError::CorruptPool {
                    type_name: type_name::<T>(),
                    reason: format!("slot {slot} does not hold an alive entity"),
                }),
                None => Ok(()),
            }
        });
        if let Err(err) = checked {
            tracing::warn!(component = type_name::<T>(), %err, "rejected archived pool");
            return Err(err);
        }
        self.sparse = data.sparse;
        self.dense = data.dense;
        self.components = data.components;
        Ok(())
    }

    /// Hands the component of `entity` to `archiver`.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if `entity` has no component, or
    /// whatever the archiver reports.
    pub fn serialize_component<A: Archiver>(&self, archiver: &mut A, entity: Entity) -> EcsResult<()>
    where
        T: Serialize,
    {
        let value = self.try_get(entity.index()).ok_or(EcsError::MissingComponent {
            type_name: type_name::<T>(),
        })?;
        archiver.write_component(type_name::<T>(), entity, value)
    }

    /// Reads a component for `entity` from `unarchiver` and adds it.
    ///
    /// # Errors
    ///
    /// Whatever the unarchiver reports.
    pub fn deserialize_component<U: Unarchiver>(
        &mut self,
        unarchiver: &mut U,
        entity: Entity,
    ) -> EcsResult<&mut T>
    where
        T: DeserializeOwned,
    {
        let value = unarchiver.read_component(type_name::<T>(), entity)?;
        Ok(self.add(entity, value))
    }
}

impl<T: Component> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            sparse: self.sparse.clone(),
            dense: self.dense.clone(),
            components: self.components.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

/// The type-erased capability set the manager needs from every pool.
pub trait ErasedPool: Any {
    /// Deep-copies the pool.
    fn clone_box(&self) -> Box<dyn ErasedPool>;
    /// Copies the component of slot `from` onto `to`. `from` must have one.
    fn copy(&mut self, from: usize, to: Entity);
    /// Removes every component, keeping allocations.
    fn clear(&mut self);
    /// Removes every component, releasing allocations.
    fn reset(&mut self);
    /// Removes the component of `entity`, if any.
    fn remove(&mut self, entity: Entity) -> bool;
    /// Checks if `slot` has a component.
    fn has(&self, slot: usize) -> bool;
    /// Number of stored components.
    fn len(&self) -> usize;
    /// Returns `true` if no component is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Name of the stored component type.
    fn type_name(&self) -> &'static str;
    /// Upcast for downcasting to `Pool<T>`.
    fn as_any(&self) -> &dyn Any;
    /// Mutable upcast for downcasting to `Pool<T>`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for Pool<T> {
    fn clone_box(&self) -> Box<dyn ErasedPool> {
        Box::new(self.clone())
    }

    fn copy(&mut self, from: usize, to: Entity) {
        Pool::copy(self, from, to);
    }

    fn clear(&mut self) {
        Pool::clear(self);
    }

    fn reset(&mut self) {
        Pool::reset(self);
    }

    fn remove(&mut self, entity: Entity) -> bool {
        Pool::remove(self, entity)
    }

    fn has(&self, slot: usize) -> bool {
        Pool::has(self, slot)
    }

    fn len(&self) -> usize {
        Pool::len(self)
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The manager's pools, indexed by [`ComponentTypeId`].
///
/// Entries are created lazily the first time a type is added.
#[derive(Default)]
pub struct PoolTable {
    pools: Vec<Option<Box<dyn ErasedPool>>>,
}

impl PoolTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { pools: Vec::new() }
    }

    /// Creates an empty table with room for `types` pool entries.
    #[must_use]
    pub fn with_capacity(types: usize) -> Self {
        Self {
            pools: Vec::with_capacity(types),
        }
    }

    /// Returns the pool registered under `id`.
    #[inline]
    #[must_use]
    pub fn get<T: Component>(&self, id: ComponentTypeId) -> Option<&Pool<T>> {
        self.erased(id)?.as_any().downcast_ref()
    }

    /// Returns the pool registered under `id` mutably.
    #[inline]
    pub fn get_mut<T: Component>(&mut self, id: ComponentTypeId) -> Option<&mut Pool<T>> {
        self.pools
            .get_mut(id.index())?
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut()
    }

    /// Returns the type-erased pool registered under `id`.
    #[inline]
    #[must_use]
    pub fn erased(&self, id: ComponentTypeId) -> Option<&dyn ErasedPool> {
        self.pools.get(id.index())?.as_deref()
    }

    /// Returns the pool registered under `id`, creating it on first use.
    pub(crate) fn get_or_insert<T: Component>(&mut self, id: ComponentTypeId) -> &mut Pool<T> {
        let index = id.index();
        if index >= self.pools.len() {
            self.pools.resize_with(index + 1, || None);
        }
        let entry = &mut self.pools[index];
        if entry.is_none() {
            tracing::debug!(component = type_name::<T>(), id = index, "created pool");
            *entry = Some(Box::new(Pool::<T>::new()));
        }
        entry
            .as_deref_mut()
            .and_then(|pool| pool.as_any_mut().downcast_mut())
            .expect("pool type does not match its component id")
    }

    /// Returns distinct mutable pools for `ids`, in the same order.
    ///
    /// `None` if any of the pools is missing.
    ///
    /// # Panics
    ///
    /// Panics if `ids` lists the same id twice.
    pub(crate) fn disjoint_mut(
        &mut self,
        ids: &[ComponentTypeId],
    ) -> Option<Vec<&mut (dyn ErasedPool + 'static)>> {
        assert!(
            ids.iter().enumerate().all(|(i, id)| !ids[..i].contains(id)),
            "component set lists the same type twice"
        );
        let mut found: Vec<Option<&mut (dyn ErasedPool + 'static)>> =
            ids.iter().map(|_| None).collect();
        for (index, entry) in self.pools.iter_mut().enumerate() {
            let Some(pool) = entry.as_deref_mut() else {
                continue;
            };
            if let Some(position) = ids.iter().position(|id| id.index() == index) {
                found[position] = Some(pool);
            }
        }
        found.into_iter().collect()
    }

    /// Number of registered pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.iter().filter(|entry| entry.is_some()).count()
    }

    /// Returns `true` if no pool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the registered pools.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ErasedPool> {
        self.pools.iter().filter_map(|entry| entry.as_deref())
    }

    /// Iterates mutably over the registered pools.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn ErasedPool + 'static)> {
        self.pools.iter_mut().filter_map(|entry| entry.as_deref_mut())
    }

    /// Removes `entity` from every pool.
    pub(crate) fn remove_all(&mut self, entity: Entity) {
        for pool in self.iter_mut() {
            pool.remove(entity);
        }
    }

    /// Clears every pool, keeping allocations.
    pub(crate) fn clear(&mut self) {
        for pool in self.iter_mut() {
            pool.clear();
        }
    }

    /// Empties every pool and releases its storage. Pools stay registered
    /// so connected hooks survive.
    pub(crate) fn reset(&mut self) {
        for pool in self.iter_mut() {
            pool.reset();
        }
        self.pools.shrink_to_fit();
    }
}

impl Clone for PoolTable {
    fn clone(&self) -> Self {
        Self {
            pools: self
                .pools
                .iter()
                .map(|entry| entry.as_ref().map(|pool| pool.clone_box()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::ManagerId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct Position(i32, i32);

    fn entity(slot: u32) -> Entity {
        Entity::new(slot, 1, ManagerId::NONE)
    }

    #[test]
    fn test_add_get_has() {
        let mut pool: Pool<Position> = Pool::new();
        assert!(!pool.has(3));

        pool.add(entity(3), Position(1, 2));
        assert!(pool.has(3));
        assert!(!pool.has(0));
        assert_eq!(*pool.get(3), Position(1, 2));
        assert_eq!(pool.try_get(0), None);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_replace_keeps_single_instance() {
        let mut pool: Pool<Position> = Pool::new();
        pool.add(entity(5), Position(1, 2));
        pool.add(entity(5), Position(3, 4));

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.dense(), &[5]);
        assert_eq!(*pool.get(5), Position(3, 4));
    }

    #[test]
    fn test_swap_remove_repoints_moved_slot() {
        let mut pool: Pool<Position> = Pool::new();
        for slot in 0..4 {
            pool.add(entity(slot), Position(slot as i32, 0));
        }

        assert!(pool.remove(entity(1)));
        assert!(!pool.remove(entity(1)));
        assert_eq!(pool.len(), 3);
        assert!(!pool.has(1));

        // Slot 3 was swapped into the hole left by slot 1.
        assert_eq!(pool.dense(), &[0, 3, 2]);
        assert_eq!(*pool.get(3), Position(3, 0));
        assert_eq!(*pool.get(2), Position(2, 0));
    }

    #[test]
    fn test_stale_sparse_entry_is_not_a_hit() {
        let mut pool: Pool<Position> = Pool::new();
        pool.add(entity(0), Position(0, 0));
        pool.add(entity(1), Position(1, 1));
        pool.remove(entity(1));

        // sparse[1] still says 1, which is now == dense.len().
        assert!(!pool.has(1));
        pool.add(entity(2), Position(2, 2));
        // sparse[1] == 1 < dense.len() again, but dense[1] == 2.
        assert!(!pool.has(1));

        pool.add(entity(1), Position(9, 9));
        assert_eq!(*pool.get(1), Position(9, 9));
        assert_eq!(*pool.get(2), Position(2, 2));
    }

    #[test]
    fn test_copy_adds_or_overwrites() {
        let mut pool: Pool<Position> = Pool::new();
        pool.add(entity(0), Position(7, 7));

        pool.copy(0, entity(1));
        assert_eq!(*pool.get(1), Position(7, 7));
        assert_eq!(pool.len(), 2);

        pool.get_mut(0).0 = 8;
        pool.copy(0, entity(1));
        assert_eq!(*pool.get(1), Position(8, 7));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_hooks_fire_at_lifecycle_points() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let updated = Arc::new(AtomicUsize::new(0));
        let destructed = Arc::new(AtomicUsize::new(0));

        let mut pool: Pool<Position> = Pool::new();
        let counter = Arc::clone(&constructed);
        pool.on_construct().connect(move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let counter = Arc::clone(&updated);
        pool.on_update().connect(move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let counter = Arc::clone(&destructed);
        pool.on_destruct().connect(move |_, value: &Position| {
            // Destruct runs before the value is gone.
            assert_eq!(value.0, 2);
            counter.fetch_add(1, Ordering::Relaxed);
        });

        pool.add(entity(0), Position(1, 1));
        pool.add(entity(0), Position(2, 2));
        pool.copy(0, entity(1));
        pool.update(entity(1));
        pool.remove(entity(0));

        assert_eq!(constructed.load(Ordering::Relaxed), 2);
        assert_eq!(updated.load(Ordering::Relaxed), 2);
        assert_eq!(destructed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_clear_and_reset() {
        let mut pool: Pool<Position> = Pool::new();
        for slot in 0..100 {
            pool.add(entity(slot), Position(0, 0));
        }
        pool.clear();
        assert!(pool.is_empty());
        assert!(!pool.has(5));
        assert!(pool.components.capacity() >= 100);

        pool.add(entity(5), Position(0, 0));
        pool.reset();
        assert!(pool.is_empty());
        assert_eq!(pool.components.capacity(), 0);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut pool: Pool<Position> = Pool::new();
        pool.add(entity(0), Position(1, 1));
        let mut copy = pool.clone();
        copy.get_mut(0).0 = 5;
        assert_eq!(*pool.get(0), Position(1, 1));
        assert_eq!(*copy.get(0), Position(5, 1));
    }

    #[test]
    fn test_pool_table_lazy_creation() {
        let registry = crate::ecs::TypeRegistry::new();
        let id = registry.id_of::<Position>();
        let mut table = PoolTable::new();
        assert!(table.get::<Position>(id).is_none());

        table.get_or_insert::<Position>(id).add(entity(0), Position(1, 1));
        assert_eq!(table.len(), 1);
        assert!(table.erased(id).unwrap().has(0));
        assert_eq!(table.get::<Position>(id).unwrap().len(), 1);

        table.remove_all(entity(0));
        assert!(table.get::<Position>(id).unwrap().is_empty());
    }

    #[test]
    #[should_panic(expected = "same type twice")]
    fn test_disjoint_mut_rejects_duplicates() {
        let registry = crate::ecs::TypeRegistry::new();
        let id = registry.id_of::<Position>();
        let mut table = PoolTable::new();
        table.get_or_insert::<Position>(id);
        let _ = table.disjoint_mut(&[id, id]);
    }
}
