//! # Components
//!
//! Components are plain data attached to entities. Any `Clone + 'static`
//! type is a component: cloning a manager or copying an entity needs to
//! duplicate values, and a type that cannot be cloned is rejected at
//! compile time rather than at run time.
//!
//! Operations that name several component types at once (`has`,
//! `remove`, `copy_components_of`, filtered views) take a tuple of types,
//! a [`ComponentSet`]:
//!
//! ```rust,ignore
//! manager.has::<(Position, Velocity)>(entity);
//! manager.remove::<(Velocity,)>(entity);
//! for (entity, (pos, vel)) in manager.entities_with::<(Position, Velocity)>() {
//!     // ...
//! }
//! ```

use super::entity::Entity;
use super::pool::{Pool, PoolTable};
use super::registry::TypeRegistry;

/// Marker trait for component types.
pub trait Component: Clone + 'static {}

impl<T: Clone + 'static> Component for T {}

/// A tuple of component types, `(A,)` through `(A, B, C, D, E, F, G, H)`.
pub trait ComponentSet: 'static {
    /// Shared pool references, one per type.
    type Pools<'m>;
    /// Mutable pool references, one per type.
    type PoolsMut<'m>;
    /// Shared component references, one per type.
    type Ref<'m>;
    /// Mutable component references, one per type.
    type Mut<'m>;

    /// Number of types in the set.
    const LEN: usize;

    /// Looks up every pool of the set; `None` if any is not registered.
    fn pools<'m>(registry: &TypeRegistry, table: &'m PoolTable) -> Option<Self::Pools<'m>>;

    /// Looks up every pool of the set mutably; `None` if any is not
    /// registered.
    ///
    /// # Panics
    ///
    /// Panics if the set lists the same type twice.
    fn pools_mut<'m>(registry: &TypeRegistry, table: &'m mut PoolTable)
        -> Option<Self::PoolsMut<'m>>;

    /// Checks that `slot` has every type of the set.
    fn contains_all(pools: &Self::Pools<'_>, slot: usize) -> bool;

    /// Checks that `slot` has every type of the set.
    fn contains_all_mut(pools: &Self::PoolsMut<'_>, slot: usize) -> bool;

    /// Checks that `slot` has at least one type of the set.
    fn contains_any(registry: &TypeRegistry, table: &PoolTable, slot: usize) -> bool;

    /// Fetches every component of `slot`; `None` if one is missing.
    fn fetch<'m>(pools: &Self::Pools<'m>, slot: usize) -> Option<Self::Ref<'m>>;

    /// Fetches every component of `slot` mutably; `None` if one is missing.
    fn fetch_mut<'p>(pools: &'p mut Self::PoolsMut<'_>, slot: usize) -> Option<Self::Mut<'p>>;

    /// Removes every type of the set from `entity`. Returns `true` if
    /// anything was removed.
    fn remove(registry: &TypeRegistry, table: &mut PoolTable, entity: Entity) -> bool;

    /// Copies every type of the set from slot `from` onto `to`.
    ///
    /// The pools must exist and `from` must have every type.
    fn copy(registry: &TypeRegistry, table: &mut PoolTable, from: usize, to: Entity);
}

macro_rules! impl_component_set {
    ($len:expr; $($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Pools<'m> = ($(&'m Pool<$name>,)+);
            type PoolsMut<'m> = ($(&'m mut Pool<$name>,)+);
            type Ref<'m> = ($(&'m $name,)+);
            type Mut<'m> = ($(&'m mut $name,)+);

            const LEN: usize = $len;

            fn pools<'m>(registry: &TypeRegistry, table: &'m PoolTable) -> Option<Self::Pools<'m>> {
                Some(($(table.get::<$name>(registry.get::<$name>()?)?,)+))
            }

            fn pools_mut<'m>(
                registry: &TypeRegistry,
                table: &'m mut PoolTable,
            ) -> Option<Self::PoolsMut<'m>> {
                let ids = [$(registry.get::<$name>()?),+];
                let mut erased = table.disjoint_mut(&ids)?.into_iter();
                Some(($(erased.next()?.as_any_mut().downcast_mut::<Pool<$name>>()?,)+))
            }

            #[allow(non_snake_case)]
            fn contains_all(pools: &Self::Pools<'_>, slot: usize) -> bool {
                let ($($name,)+) = pools;
                $($name.has(slot))&&+
            }

            #[allow(non_snake_case)]
            fn contains_all_mut(pools: &Self::PoolsMut<'_>, slot: usize) -> bool {
                let ($($name,)+) = pools;
                $($name.has(slot))&&+
            }

            fn contains_any(registry: &TypeRegistry, table: &PoolTable, slot: usize) -> bool {
                $(
                    registry
                        .get::<$name>()
                        .and_then(|id| table.get::<$name>(id))
                        .is_some_and(|pool| pool.has(slot))
                )||+
            }

            #[allow(non_snake_case)]
            fn fetch<'m>(pools: &Self::Pools<'m>, slot: usize) -> Option<Self::Ref<'m>> {
                let ($($name,)+) = *pools;
                Some(($($name.try_get(slot)?,)+))
            }

            #[allow(non_snake_case)]
            fn fetch_mut<'p>(
                pools: &'p mut Self::PoolsMut<'_>,
                slot: usize,
            ) -> Option<Self::Mut<'p>> {
                let ($($name,)+) = pools;
                Some(($($name.try_get_mut(slot)?,)+))
            }

            fn remove(registry: &TypeRegistry, table: &mut PoolTable, entity: Entity) -> bool {
                let mut removed = false;
                $(
                    if let Some(pool) = registry.get::<$name>().and_then(|id| table.get_mut::<$name>(id)) {
                        removed |= pool.remove(entity);
                    }
                )+
                removed
            }

            fn copy(registry: &TypeRegistry, table: &mut PoolTable, from: usize, to: Entity) {
                $(
                    let pool = registry.get::<$name>().and_then(|id| table.get_mut::<$name>(id));
                    debug_assert!(
                        pool.is_some(),
                        "no pool registered for {}",
                        std::any::type_name::<$name>()
                    );
                    if let Some(pool) = pool {
                        debug_assert!(
                            pool.has(from),
                            "source slot {from} has no {} component",
                            std::any::type_name::<$name>()
                        );
                        if pool.has(from) {
                            pool.copy(from, to);
                        }
                    }
                )+
            }
        }
    };
}

impl_component_set!(1; A);
impl_component_set!(2; A, B);
impl_component_set!(3; A, B, C);
impl_component_set!(4; A, B, C, D);
impl_component_set!(5; A, B, C, D, E);
impl_component_set!(6; A, B, C, D, E, F);
impl_component_set!(7; A, B, C, D, E, F, G);
impl_component_set!(8; A, B, C, D, E, F, G, H);
