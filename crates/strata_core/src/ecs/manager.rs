//! # Entity Manager
//!
//! Owns the slot table and every component pool.
//!
//! ## Slot lifecycle
//!
//! ```text
//! Free -> create_entity -> PendingCreate -> refresh -> Alive
//! Alive -> destroy -> PendingDestroy -> refresh -> Free (version + 1)
//! PendingCreate -> destroy -> Free (version + 1), immediately
//! ```
//!
//! Creations and destructions are deferred: they only become visible to
//! views and to [`Manager::size`] after [`Manager::refresh`]. Components
//! can be added to a pending entity straight away.
//!
//! ## Handles
//!
//! [`Entity`] handles carry `(slot, version, manager id)`. A handle is
//! valid while the slot still carries its version and the manager still
//! carries its id. Destroying through a stale handle is a silent no-op;
//! every other operation on a stale handle is a contract violation, checked
//! with a debug assertion.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut manager = Manager::new();
//! let entity = manager.create_entity();
//! manager.add(entity, Position { x: 1.0, y: 2.0 });
//! manager.refresh();
//!
//! for (entity, (pos,)) in manager.entities_with::<(Position,)>() {
//!     println!("{entity:?} at {pos:?}");
//! }
//! ```

use std::any::type_name;
use std::collections::VecDeque;
use std::mem;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::component::{Component, ComponentSet};
use super::entity::{Entity, ManagerId};
use super::handle::{EntityMut, EntityRef};
use super::hooks::HookSlot;
use super::pool::{Pool, PoolTable};
use super::registry::TypeRegistry;
use super::view::{All, View, ViewMut, With, Without};
use crate::archive::{Archiver, PoolData, Unarchiver};
use crate::bitset::DynamicBitset;
use crate::config::ManagerConfig;
use crate::error::{EcsError, EcsResult};

/// Entity and component storage.
pub struct Manager {
    /// Identity stamped into every handle this manager issues.
    pub(crate) id: ManagerId,
    /// Component type ids, shared with clones.
    pub(crate) registry: TypeRegistry,
    /// One past the highest slot ever handed out.
    pub(crate) next_slot: usize,
    /// Number of alive (committed) entities.
    count: usize,
    /// Set whenever a slot is marked in `refresh`.
    refresh_required: bool,
    /// Slot -> alive (committed and visible to views).
    pub(crate) alive: DynamicBitset,
    /// Slot -> pending create or pending destroy.
    refresh: DynamicBitset,
    /// Slot -> current version.
    pub(crate) versions: Vec<u32>,
    /// Destroyed slots waiting for reuse, oldest first.
    free_slots: VecDeque<usize>,
    /// Component pools indexed by type id.
    pub(crate) pools: PoolTable,
}

impl Manager {
    /// Creates an empty manager using the process-wide type registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::global())
    }

    /// Creates an empty manager using `registry` for component type ids.
    #[must_use]
    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self {
            id: ManagerId::next(),
            registry,
            next_slot: 0,
            count: 0,
            refresh_required: false,
            alive: DynamicBitset::new(),
            refresh: DynamicBitset::new(),
            versions: Vec::new(),
            free_slots: VecDeque::new(),
            pools: PoolTable::new(),
        }
    }

    /// Creates a manager with the capacities reserved by `config`.
    #[must_use]
    pub fn with_config(config: &ManagerConfig) -> Self {
        Self::with_config_and_registry(config, TypeRegistry::global())
    }

    /// Creates a manager with the capacities reserved by `config`, using
    /// `registry` for component type ids.
    #[must_use]
    pub fn with_config_and_registry(config: &ManagerConfig, registry: TypeRegistry) -> Self {
        let mut manager = Self::with_registry(registry);
        manager.pools = PoolTable::with_capacity(config.initial_component_types);
        manager.reserve(config.initial_entity_capacity);
        manager
    }

    /// Returns this manager's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ManagerId {
        self.id
    }

    /// Returns the registry assigning component type ids.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Returns the number of alive entities.
    ///
    /// Pending creations are not counted until [`refresh`](Self::refresh).
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.count
    }

    /// Returns the number of slots storage is allocated for.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.versions.len()
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates an entity.
    ///
    /// The entity can take components immediately but is not visible to
    /// views until the next [`refresh`](Self::refresh).
    ///
    /// # Panics
    ///
    /// Panics if the slot space (`u32::MAX` slots) is exhausted.
    pub fn create_entity(&mut self) -> Entity {
        let slot = match self.free_slots.pop_front() {
            Some(slot) => slot,
            None => {
                let slot = self.next_slot;
                if slot >= self.capacity() {
                    self.grow((self.capacity() * 2).max(slot + 1));
                }
                self.next_slot += 1;
                slot
            }
        };
        let Ok(raw) = u32::try_from(slot) else {
            panic!("entity slot space exhausted");
        };

        self.refresh.set(slot, true);
        self.refresh_required = true;
        let version = self.versions[slot].wrapping_add(1);
        self.versions[slot] = version;
        Entity::new(raw, version, self.id)
    }

    /// Destroys `entity`.
    ///
    /// An alive entity is only marked: it stays visible and keeps its
    /// components until the next [`refresh`](Self::refresh). An entity that
    /// was never refreshed is recycled on the spot. Stale handles are
    /// ignored.
    pub fn destroy(&mut self, entity: Entity) {
        if !self.is_alive(entity) {
            return;
        }
        let slot = entity.index();
        if self.alive.get(slot) {
            self.refresh.set(slot, true);
            self.refresh_required = true;
        } else {
            self.refresh.set(slot, false);
            self.pools.remove_all(entity);
            self.retire(slot);
        }
    }

    /// Checks if `entity` still refers to a live slot of this manager.
    ///
    /// True from `create_entity` until the destruction is committed, so a
    /// pending entity counts as alive here even though views skip it.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        entity.manager() == self.id && self.versions.get(entity.index()) == Some(&entity.version())
    }

    /// Commits every pending creation and destruction.
    ///
    /// Cheap when nothing is pending.
    pub fn refresh(&mut self) {
        if !self.refresh_required {
            return;
        }
        self.refresh_required = false;

        let mut pending = mem::take(&mut self.refresh);
        let mut created = 0usize;
        let mut destroyed = 0usize;
        for slot in pending.iter_ones() {
            if self.alive.get(slot) {
                // Slots are bounded by `u32` on creation.
                let entity = Entity::new(slot as u32, self.versions[slot], self.id);
                self.pools.remove_all(entity);
                self.alive.set(slot, false);
                self.retire(slot);
                self.count -= 1;
                destroyed += 1;
            } else {
                self.alive.set(slot, true);
                self.count += 1;
                created += 1;
            }
        }

        let len = pending.len();
        pending.clear();
        pending.resize(len, false);
        self.refresh = pending;

        tracing::trace!(created, destroyed, alive = self.count, "refresh committed");
    }

    /// Destroys every entity at once, keeping the allocated storage.
    ///
    /// The manager takes a new identity, so every handle issued before the
    /// call goes stale. Pools stay registered with their hooks; no hook
    /// fires.
    pub fn clear(&mut self) {
        let capacity = self.capacity();
        self.id = ManagerId::next();
        self.next_slot = 0;
        self.count = 0;
        self.refresh_required = false;
        self.alive.clear();
        self.alive.resize(capacity, false);
        self.refresh.clear();
        self.refresh.resize(capacity, false);
        self.versions.iter_mut().for_each(|version| *version = 0);
        self.free_slots.clear();
        self.pools.clear();
        tracing::debug!(manager = self.id.get(), capacity, "cleared manager");
    }

    /// Destroys every entity and releases the storage.
    ///
    /// Like [`clear`](Self::clear), but capacity drops to zero and the pools
    /// give back their memory.
    pub fn reset(&mut self) {
        self.id = ManagerId::next();
        self.next_slot = 0;
        self.count = 0;
        self.refresh_required = false;
        self.alive = DynamicBitset::new();
        self.refresh = DynamicBitset::new();
        self.versions = Vec::new();
        self.free_slots = VecDeque::new();
        self.pools.reset();
        tracing::debug!(manager = self.id.get(), "reset manager");
    }

    /// Allocates slot storage for at least `capacity` entities.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.capacity() {
            self.grow(capacity);
        }
    }

    fn grow(&mut self, capacity: usize) {
        tracing::debug!(from = self.capacity(), to = capacity, "growing entity storage");
        self.alive.resize(capacity, false);
        self.refresh.resize(capacity, false);
        self.versions.resize(capacity, 0);
    }

    fn retire(&mut self, slot: usize) {
        self.versions[slot] = self.versions[slot].wrapping_add(1);
        self.free_slots.push_back(slot);
    }

    #[inline]
    fn debug_assert_valid(&self, entity: Entity) {
        debug_assert!(
            self.is_alive(entity),
            "{entity:?} is stale or belongs to another manager"
        );
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Adds `value` to `entity`, replacing an existing value in place.
    ///
    /// The pool for `T` is created on first use. A replacement fires the
    /// update hooks, a new value the construct hooks.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        self.debug_assert_valid(entity);
        let id = self.registry.id_of::<T>();
        self.pools.get_or_insert::<T>(id).add(entity, value)
    }

    /// Adds `value` to `entity` unless it already has a `T`, in which case
    /// the existing value is kept and `value` is dropped.
    pub fn try_add<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        self.debug_assert_valid(entity);
        let id = self.registry.id_of::<T>();
        let pool = self.pools.get_or_insert::<T>(id);
        if pool.has(entity.index()) {
            pool.get_mut(entity.index())
        } else {
            pool.add(entity, value)
        }
    }

    /// Removes every type of `Q` from `entity`.
    ///
    /// Returns `true` if at least one component was removed.
    pub fn remove<Q: ComponentSet>(&mut self, entity: Entity) -> bool {
        self.debug_assert_valid(entity);
        Q::remove(&self.registry, &mut self.pools, entity)
    }

    /// Checks if `entity` has every type of `Q`.
    #[must_use]
    pub fn has<Q: ComponentSet>(&self, entity: Entity) -> bool {
        self.debug_assert_valid(entity);
        Q::pools(&self.registry, &self.pools)
            .is_some_and(|pools| Q::contains_all(&pools, entity.index()))
    }

    /// Checks if `entity` has at least one type of `Q`.
    #[must_use]
    pub fn has_any<Q: ComponentSet>(&self, entity: Entity) -> bool {
        self.debug_assert_valid(entity);
        Q::contains_any(&self.registry, &self.pools, entity.index())
    }

    /// Returns the `T` of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if no entity ever had a `T`. Reading a `T` the entity does
    /// not have is a contract violation caught by a debug assertion.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        self.debug_assert_valid(entity);
        match self.pool::<T>() {
            Some(pool) => pool.get(entity.index()),
            None => panic!("no pool registered for {}", type_name::<T>()),
        }
    }

    /// Returns the `T` of `entity` mutably. Hooks do not fire.
    ///
    /// # Panics
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.debug_assert_valid(entity);
        match self.pool_mut::<T>() {
            Some(pool) => pool.get_mut(entity.index()),
            None => panic!("no pool registered for {}", type_name::<T>()),
        }
    }

    /// Returns every component of `Q` for `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` lacks one of the types.
    #[must_use]
    pub fn get_many<Q: ComponentSet>(&self, entity: Entity) -> Q::Ref<'_> {
        self.debug_assert_valid(entity);
        match Q::pools(&self.registry, &self.pools).and_then(|pools| Q::fetch(&pools, entity.index())) {
            Some(components) => components,
            None => panic!("{entity:?} lacks a component of {}", type_name::<Q>()),
        }
    }

    /// Returns the `T` of `entity`, or `None` if it has none.
    #[must_use]
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.debug_assert_valid(entity);
        self.pool::<T>()?.try_get(entity.index())
    }

    /// Returns the `T` of `entity` mutably, or `None` if it has none.
    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.debug_assert_valid(entity);
        self.pool_mut::<T>()?.try_get_mut(entity.index())
    }

    /// Fires the update hooks of `T` for `entity` and returns the value.
    ///
    /// # Panics
    ///
    /// Same as [`get`](Self::get).
    pub fn update<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.debug_assert_valid(entity);
        match self.pool_mut::<T>() {
            Some(pool) => pool.update(entity),
            None => panic!("no pool registered for {}", type_name::<T>()),
        }
    }

    /// Returns the pool storing `T`, if one was ever created.
    #[must_use]
    pub fn pool<T: Component>(&self) -> Option<&Pool<T>> {
        self.pools.get(self.registry.get::<T>()?)
    }

    fn pool_mut<T: Component>(&mut self) -> Option<&mut Pool<T>> {
        let id = self.registry.get::<T>()?;
        self.pools.get_mut(id)
    }

    // =========================================================================
    // Copy and compare
    // =========================================================================

    /// Copies every component of `from` onto `to`.
    ///
    /// Types `to` already has are overwritten (update hooks), the others are
    /// added (construct hooks). Types `from` lacks are left alone on `to`.
    pub fn copy_components(&mut self, from: Entity, to: Entity) {
        self.debug_assert_valid(from);
        self.debug_assert_valid(to);
        let source = from.index();
        for pool in self.pools.iter_mut() {
            if pool.has(source) {
                pool.copy(source, to);
            }
        }
    }

    /// Copies the `Q` components of `from` onto `to`.
    ///
    /// `from` must have every type of `Q`.
    pub fn copy_components_of<Q: ComponentSet>(&mut self, from: Entity, to: Entity) {
        self.debug_assert_valid(from);
        self.debug_assert_valid(to);
        Q::copy(&self.registry, &mut self.pools, from.index(), to);
    }

    /// Creates a new entity carrying a copy of every component of `from`.
    pub fn copy_entity(&mut self, from: Entity) -> Entity {
        let to = self.create_entity();
        self.copy_components(from, to);
        to
    }

    /// Creates a new entity carrying a copy of the `Q` components of `from`.
    pub fn copy_entity_of<Q: ComponentSet>(&mut self, from: Entity) -> Entity {
        let to = self.create_entity();
        self.copy_components_of::<Q>(from, to);
        to
    }

    /// Checks if `a` and `b` have exactly the same component types.
    ///
    /// Values are not compared.
    #[must_use]
    pub fn matches(&self, a: Entity, b: Entity) -> bool {
        self.debug_assert_valid(a);
        self.debug_assert_valid(b);
        self.pools
            .iter()
            .all(|pool| pool.has(a.index()) == pool.has(b.index()))
    }

    /// Checks if `a` and `b` are the same entity or have the same component
    /// types.
    #[must_use]
    pub fn is_identical(&self, a: Entity, b: Entity) -> bool {
        a == b || self.matches(a, b)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Every alive entity.
    #[must_use]
    pub fn entities(&self) -> View<'_, All> {
        View::new(self)
    }

    /// Alive entities having every type of `Q`, with their components.
    #[must_use]
    pub fn entities_with<Q: ComponentSet>(&self) -> View<'_, With<Q>> {
        View::new(self)
    }

    /// Alive entities lacking at least one type of `Q`.
    #[must_use]
    pub fn entities_without<Q: ComponentSet>(&self) -> View<'_, Without<Q>> {
        View::new(self)
    }

    /// Every alive entity, borrowing the manager exclusively.
    pub fn entities_mut(&mut self) -> ViewMut<'_, All> {
        ViewMut::new(self)
    }

    /// Alive entities having every type of `Q`, with mutable components.
    ///
    /// # Panics
    ///
    /// Panics if `Q` lists the same type twice.
    pub fn entities_with_mut<Q: ComponentSet>(&mut self) -> ViewMut<'_, With<Q>> {
        ViewMut::new(self)
    }

    /// Alive entities lacking at least one type of `Q`, borrowing the
    /// manager exclusively.
    pub fn entities_without_mut<Q: ComponentSet>(&mut self) -> ViewMut<'_, Without<Q>> {
        ViewMut::new(self)
    }

    // =========================================================================
    // Facades
    // =========================================================================

    /// Read-only facade over `entity`.
    #[must_use]
    pub fn entity(&self, entity: Entity) -> EntityRef<'_> {
        EntityRef::new(self, entity)
    }

    /// Mutable facade over `entity`.
    pub fn entity_mut(&mut self, entity: Entity) -> EntityMut<'_> {
        EntityMut::new(self, entity)
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    /// Hooks fired after a `T` is added to an entity that had none.
    pub fn on_construct<T: Component>(&mut self) -> &mut HookSlot<T> {
        let id = self.registry.id_of::<T>();
        self.pools.get_or_insert::<T>(id).on_construct()
    }

    /// Hooks fired after a `T` is replaced, copied over, or explicitly
    /// updated.
    pub fn on_update<T: Component>(&mut self) -> &mut HookSlot<T> {
        let id = self.registry.id_of::<T>();
        self.pools.get_or_insert::<T>(id).on_update()
    }

    /// Hooks fired before a `T` is removed, including removals caused by a
    /// committed destroy.
    pub fn on_destruct<T: Component>(&mut self) -> &mut HookSlot<T> {
        let id = self.registry.id_of::<T>();
        self.pools.get_or_insert::<T>(id).on_destruct()
    }

    // =========================================================================
    // Archiving
    // =========================================================================

    /// Hands the `T` pool to `archiver`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownComponent`] if no pool for `T` exists, or
    /// whatever the archiver reports.
    pub fn serialize_pool<T, A>(&self, archiver: &mut A) -> EcsResult<()>
    where
        T: Component + Serialize,
        A: Archiver,
    {
        self.pool::<T>()
            .ok_or(EcsError::UnknownComponent {
                type_name: type_name::<T>(),
            })?
            .serialize(archiver)
    }

    /// Replaces the `T` pool with data read from `unarchiver`.
    ///
    /// The pool is created if needed; its hooks are kept and do not fire.
    ///
    /// # Errors
    ///
    /// [`EcsError::CorruptPool`] if the data breaks the sparse-set
    /// invariant or names a slot without an alive entity (free, pending
    /// creation, or never issued), or whatever the unarchiver reports.
    pub fn deserialize_pool<T, U>(&mut self, unarchiver: &mut U) -> EcsResult<()>
    where
        T: Component + DeserializeOwned,
        U: Unarchiver,
    {
        let data: PoolData<T> = unarchiver.read_pool(type_name::<T>())?;
        let id = self.registry.id_of::<T>();
        self.pools.get_or_insert::<T>(id).load(data, Some(&self.alive))
    }

    /// Hands the `T` of `entity` to `archiver`.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if `entity` has no `T`, or whatever
    /// the archiver reports.
    pub fn serialize_component<T, A>(&self, archiver: &mut A, entity: Entity) -> EcsResult<()>
    where
        T: Component + Serialize,
        A: Archiver,
    {
        self.debug_assert_valid(entity);
        match self.pool::<T>() {
            Some(pool) => pool.serialize_component(archiver, entity),
            None => Err(EcsError::MissingComponent {
                type_name: type_name::<T>(),
            }),
        }
    }

    /// Reads a `T` for `entity` from `unarchiver` and adds it.
    ///
    /// # Errors
    ///
    /// Whatever the unarchiver reports; `entity` is left unchanged then.
    pub fn deserialize_component<T, U>(&mut self, unarchiver: &mut U, entity: Entity) -> EcsResult<&mut T>
    where
        T: Component + DeserializeOwned,
        U: Unarchiver,
    {
        self.debug_assert_valid(entity);
        let id = self.registry.id_of::<T>();
        self.pools.get_or_insert::<T>(id).deserialize_component(unarchiver, entity)
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Manager {
    /// Deep-copies every pool and the slot table.
    ///
    /// The clone gets a new identity, so handles of the original are not
    /// valid on it; re-issue them with [`Entity::new`] and the clone's
    /// [`id`](Manager::id) if needed. The registry and hook callbacks are
    /// shared.
    fn clone(&self) -> Self {
        let clone = Self {
            id: ManagerId::next(),
            registry: self.registry.clone(),
            next_slot: self.next_slot,
            count: self.count,
            refresh_required: self.refresh_required,
            alive: self.alive.clone(),
            refresh: self.refresh.clone(),
            versions: self.versions.clone(),
            free_slots: self.free_slots.clone(),
            pools: self.pools.clone(),
        };
        tracing::debug!(
            from = self.id.get(),
            to = clone.id.get(),
            pools = clone.pools.len(),
            "cloned manager"
        );
        clone
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("id", &self.id)
            .field("size", &self.count)
            .field("capacity", &self.capacity())
            .field("next_slot", &self.next_slot)
            .field("pools", &self.pools.len())
            .finish()
    }
}
