//! # Views
//!
//! Lazily filtered enumeration of alive entities.
//!
//! A view is built over the slot range `0..next_slot` as it stands when the
//! view is created. Entities created afterwards are never visited by that
//! view, even once a `refresh` makes them alive.
//!
//! Three criteria:
//! - [`All`]: every alive slot, yields `Entity`
//! - [`With<Q>`]: alive slots having every type of `Q`, yields
//!   `(Entity, Q::Ref)` (or `(Entity, Q::Mut)` through a [`ViewMut`])
//! - [`Without<Q>`]: alive slots lacking at least one type of `Q`, yields
//!   `Entity`
//!
//! ## Mutating while iterating
//!
//! [`View`] and [`ViewMut`] borrow the manager, so structural changes have
//! to go through a [`Cursor`]. A cursor keeps only its position and pinned
//! end, and re-tests the criterion against the manager it is handed on each
//! step:
//!
//! ```rust,ignore
//! let mut cursor = manager.entities_with::<(Health,)>().cursor();
//! while let Some(entity) = cursor.next(&manager) {
//!     if manager.get::<Health>(entity).0 == 0 {
//!         manager.destroy(entity);
//!     }
//! }
//! manager.refresh();
//! ```

use std::marker::PhantomData;

use super::component::ComponentSet;
use super::entity::{Entity, ManagerId};
use super::manager::Manager;
use super::pool::PoolTable;
use super::registry::TypeRegistry;
use crate::bitset::DynamicBitset;

/// A view criterion.
pub trait Filter: 'static {
    /// Pool state resolved once per pass, shared access.
    type State<'m>;
    /// Pool state resolved once per pass, exclusive access.
    type StateMut<'m>;
    /// Item yielded by a shared view.
    type Item<'m>;
    /// Item yielded by a mutable view.
    type ItemMut<'p>;

    /// Resolves the pools the criterion needs.
    fn resolve<'m>(registry: &TypeRegistry, pools: &'m PoolTable) -> Self::State<'m>;

    /// Resolves the pools the criterion needs, mutably.
    fn resolve_mut<'m>(registry: &TypeRegistry, pools: &'m mut PoolTable) -> Self::StateMut<'m>;

    /// Tests an alive slot against the criterion.
    fn matches(state: &Self::State<'_>, slot: usize) -> bool;

    /// Tests an alive slot against the criterion.
    fn matches_mut(state: &Self::StateMut<'_>, slot: usize) -> bool;

    /// Builds the item for a matching entity.
    fn fetch<'m>(state: &Self::State<'m>, entity: Entity) -> Option<Self::Item<'m>>;

    /// Builds the item for a matching entity.
    fn fetch_mut<'p>(state: &'p mut Self::StateMut<'_>, entity: Entity) -> Option<Self::ItemMut<'p>>;
}

/// Every alive entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

/// Alive entities having every type of `Q`.
#[derive(Debug)]
pub struct With<Q>(PhantomData<fn() -> Q>);

/// Alive entities lacking at least one type of `Q`.
#[derive(Debug)]
pub struct Without<Q>(PhantomData<fn() -> Q>);

impl Filter for All {
    type State<'m> = ();
    type StateMut<'m> = ();
    type Item<'m> = Entity;
    type ItemMut<'p> = Entity;

    fn resolve<'m>(_: &TypeRegistry, _: &'m PoolTable) -> Self::State<'m> {}

    fn resolve_mut<'m>(_: &TypeRegistry, _: &'m mut PoolTable) -> Self::StateMut<'m> {}

    #[inline]
    fn matches(_: &(), _: usize) -> bool {
        true
    }

    #[inline]
    fn matches_mut(_: &(), _: usize) -> bool {
        true
    }

    #[inline]
    fn fetch<'m>(_: &Self::State<'m>, entity: Entity) -> Option<Self::Item<'m>> {
        Some(entity)
    }

    #[inline]
    fn fetch_mut<'p>(_: &'p mut Self::StateMut<'_>, entity: Entity) -> Option<Self::ItemMut<'p>> {
        Some(entity)
    }
}

impl<Q: ComponentSet> Filter for With<Q> {
    type State<'m> = Option<Q::Pools<'m>>;
    type StateMut<'m> = Option<Q::PoolsMut<'m>>;
    type Item<'m> = (Entity, Q::Ref<'m>);
    type ItemMut<'p> = (Entity, Q::Mut<'p>);

    fn resolve<'m>(registry: &TypeRegistry, pools: &'m PoolTable) -> Self::State<'m> {
        Q::pools(registry, pools)
    }

    fn resolve_mut<'m>(registry: &TypeRegistry, pools: &'m mut PoolTable) -> Self::StateMut<'m> {
        Q::pools_mut(registry, pools)
    }

    #[inline]
    fn matches(state: &Self::State<'_>, slot: usize) -> bool {
        state.as_ref().is_some_and(|pools| Q::contains_all(pools, slot))
    }

    #[inline]
    fn matches_mut(state: &Self::StateMut<'_>, slot: usize) -> bool {
        state.as_ref().is_some_and(|pools| Q::contains_all_mut(pools, slot))
    }

    #[inline]
    fn fetch<'m>(state: &Self::State<'m>, entity: Entity) -> Option<Self::Item<'m>> {
        let components = Q::fetch(state.as_ref()?, entity.index())?;
        Some((entity, components))
    }

    #[inline]
    fn fetch_mut<'p>(state: &'p mut Self::StateMut<'_>, entity: Entity) -> Option<Self::ItemMut<'p>> {
        let components = Q::fetch_mut(state.as_mut()?, entity.index())?;
        Some((entity, components))
    }
}

impl<Q: ComponentSet> Filter for Without<Q> {
    type State<'m> = Option<Q::Pools<'m>>;
    type StateMut<'m> = Option<Q::Pools<'m>>;
    type Item<'m> = Entity;
    type ItemMut<'p> = Entity;

    fn resolve<'m>(registry: &TypeRegistry, pools: &'m PoolTable) -> Self::State<'m> {
        Q::pools(registry, pools)
    }

    fn resolve_mut<'m>(registry: &TypeRegistry, pools: &'m mut PoolTable) -> Self::StateMut<'m> {
        Q::pools(registry, pools)
    }

    #[inline]
    fn matches(state: &Self::State<'_>, slot: usize) -> bool {
        // A type with no pool is missing from every slot.
        state.as_ref().is_none_or(|pools| !Q::contains_all(pools, slot))
    }

    #[inline]
    fn matches_mut(state: &Self::StateMut<'_>, slot: usize) -> bool {
        Self::matches(state, slot)
    }

    #[inline]
    fn fetch<'m>(_: &Self::State<'m>, entity: Entity) -> Option<Self::Item<'m>> {
        Some(entity)
    }

    #[inline]
    fn fetch_mut<'p>(_: &'p mut Self::StateMut<'_>, entity: Entity) -> Option<Self::ItemMut<'p>> {
        Some(entity)
    }
}

/// Slot-table state a view needs besides the pools.
#[derive(Clone, Copy)]
struct Slots<'m> {
    alive: &'m DynamicBitset,
    versions: &'m [u32],
    manager: ManagerId,
}

impl Slots<'_> {
    #[inline]
    fn is_alive(&self, slot: usize) -> bool {
        slot < self.alive.len() && self.alive.get(slot)
    }

    #[inline]
    fn entity(&self, slot: usize) -> Entity {
        // Slots are bounded by `u32` on creation.
        Entity::new(slot as u32, self.versions[slot], self.manager)
    }
}

/// Shared view over a pinned slot range.
pub struct View<'m, F: Filter> {
    manager: &'m Manager,
    end: usize,
    _filter: PhantomData<fn() -> F>,
}

impl<'m, F: Filter> View<'m, F> {
    pub(crate) fn new(manager: &'m Manager) -> Self {
        Self {
            manager,
            end: manager.next_slot,
            _filter: PhantomData,
        }
    }

    fn slots(&self) -> Slots<'m> {
        Slots {
            alive: &self.manager.alive,
            versions: &self.manager.versions,
            manager: self.manager.id,
        }
    }

    /// Iterates over the matching entities.
    #[must_use]
    pub fn iter(&self) -> ViewIter<'m, F> {
        ViewIter {
            slots: self.slots(),
            state: F::resolve(&self.manager.registry, &self.manager.pools),
            next_slot: 0,
            end: self.end,
        }
    }

    /// Calls `f` for every matching entity.
    pub fn for_each_entity(&self, mut f: impl FnMut(Entity)) {
        let slots = self.slots();
        let state = F::resolve(&self.manager.registry, &self.manager.pools);
        for slot in 0..self.end {
            if slots.is_alive(slot) && F::matches(&state, slot) {
                f(slots.entity(slot));
            }
        }
    }

    /// Counts the matching entities.
    #[must_use]
    pub fn count(&self) -> usize {
        let mut count = 0;
        self.for_each_entity(|_| count += 1);
        count
    }

    /// Collects the matching entities.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Entity> {
        let mut entities = Vec::new();
        self.for_each_entity(|entity| entities.push(entity));
        entities
    }

    /// Detaches the iteration state from the manager borrow.
    #[must_use]
    pub fn cursor(&self) -> Cursor<F> {
        Cursor::new(0, self.end)
    }
}

impl<'m, F: Filter> IntoIterator for View<'m, F> {
    type Item = F::Item<'m>;
    type IntoIter = ViewIter<'m, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'m, F: Filter> IntoIterator for &View<'m, F> {
    type Item = F::Item<'m>;
    type IntoIter = ViewIter<'m, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`View`].
pub struct ViewIter<'m, F: Filter> {
    slots: Slots<'m>,
    state: F::State<'m>,
    next_slot: usize,
    end: usize,
}

impl<'m, F: Filter> Iterator for ViewIter<'m, F> {
    type Item = F::Item<'m>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_slot < self.end {
            let slot = self.next_slot;
            self.next_slot += 1;
            if self.slots.is_alive(slot) && F::matches(&self.state, slot) {
                return F::fetch(&self.state, self.slots.entity(slot));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end.saturating_sub(self.next_slot)))
    }
}

/// Exclusive view over a pinned slot range.
///
/// Items borrow the view, so it is walked with a `while let` loop rather
/// than a `for` loop:
///
/// ```rust,ignore
/// let mut view = manager.entities_with_mut::<(Position, Velocity)>();
/// while let Some((_, (pos, vel))) = view.next() {
///     pos.x += vel.x;
/// }
/// ```
pub struct ViewMut<'m, F: Filter> {
    slots: Slots<'m>,
    state: F::StateMut<'m>,
    next_slot: usize,
    end: usize,
}

impl<'m, F: Filter> ViewMut<'m, F> {
    pub(crate) fn new(manager: &'m mut Manager) -> Self {
        let Manager {
            id,
            registry,
            next_slot,
            alive,
            versions,
            pools,
            ..
        } = manager;
        Self {
            slots: Slots {
                alive,
                versions,
                manager: *id,
            },
            state: F::resolve_mut(registry, pools),
            next_slot: 0,
            end: *next_slot,
        }
    }

    /// Advances to the next matching entity.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<F::ItemMut<'_>> {
        loop {
            if self.next_slot >= self.end {
                return None;
            }
            let slot = self.next_slot;
            self.next_slot += 1;
            if self.slots.is_alive(slot) && F::matches_mut(&self.state, slot) {
                let entity = self.slots.entity(slot);
                return F::fetch_mut(&mut self.state, entity);
            }
        }
    }

    /// Calls `f` for every remaining matching entity.
    pub fn for_each_entity(mut self, mut f: impl FnMut(Entity)) {
        while let Some(entity) = self.next_entity() {
            f(entity);
        }
    }

    /// Counts the remaining matching entities.
    #[must_use]
    pub fn count(mut self) -> usize {
        let mut count = 0;
        while self.next_entity().is_some() {
            count += 1;
        }
        count
    }

    /// Collects the remaining matching entities.
    #[must_use]
    pub fn to_vec(mut self) -> Vec<Entity> {
        let mut entities = Vec::new();
        while let Some(entity) = self.next_entity() {
            entities.push(entity);
        }
        entities
    }

    /// Releases the manager borrow, keeping the position and pinned end.
    #[must_use]
    pub fn cursor(self) -> Cursor<F> {
        Cursor::new(self.next_slot, self.end)
    }

    fn next_entity(&mut self) -> Option<Entity> {
        while self.next_slot < self.end {
            let slot = self.next_slot;
            self.next_slot += 1;
            if self.slots.is_alive(slot) && F::matches_mut(&self.state, slot) {
                return Some(self.slots.entity(slot));
            }
        }
        None
    }
}

/// Detached iteration state: the next slot to test and the pinned end.
///
/// Each [`next`](Self::next) call re-tests the criterion against the
/// manager as it is at that moment.
pub struct Cursor<F: Filter> {
    next_slot: usize,
    end: usize,
    _filter: PhantomData<fn() -> F>,
}

impl<F: Filter> Cursor<F> {
    const fn new(next_slot: usize, end: usize) -> Self {
        Self {
            next_slot,
            end,
            _filter: PhantomData,
        }
    }

    /// Returns the next alive entity of `manager` matching the criterion.
    pub fn next(&mut self, manager: &Manager) -> Option<Entity> {
        let slots = Slots {
            alive: &manager.alive,
            versions: &manager.versions,
            manager: manager.id,
        };
        let state = F::resolve(&manager.registry, &manager.pools);
        while self.next_slot < self.end {
            let slot = self.next_slot;
            self.next_slot += 1;
            if slots.is_alive(slot) && F::matches(&state, slot) {
                return Some(slots.entity(slot));
            }
        }
        None
    }

    /// Slots left to test.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.next_slot)
    }
}

impl<F: Filter> Clone for Cursor<F> {
    fn clone(&self) -> Self {
        Self::new(self.next_slot, self.end)
    }
}

impl<F: Filter> std::fmt::Debug for Cursor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("next_slot", &self.next_slot)
            .field("end", &self.end)
            .finish()
    }
}
