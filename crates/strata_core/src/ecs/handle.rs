//! # Entity Facades
//!
//! [`EntityRef`] and [`EntityMut`] pair a handle with a borrowed manager so
//! call sites can chain operations on one entity:
//!
//! ```rust,ignore
//! let mut player = manager.entity_mut(entity);
//! player.add(Position::default());
//! player.add(Health(100));
//! assert!(player.has::<(Position, Health)>());
//! ```
//!
//! Every method forwards to the [`Manager`] method of the same name.

use super::component::{Component, ComponentSet};
use super::entity::Entity;
use super::manager::Manager;

/// Shared facade over one entity.
#[derive(Clone, Copy)]
pub struct EntityRef<'m> {
    manager: &'m Manager,
    entity: Entity,
}

impl<'m> EntityRef<'m> {
    pub(crate) fn new(manager: &'m Manager, entity: Entity) -> Self {
        Self { manager, entity }
    }

    /// The wrapped handle.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// See [`Manager::is_alive`].
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.manager.is_alive(self.entity)
    }

    /// See [`Manager::has`].
    #[must_use]
    pub fn has<Q: ComponentSet>(&self) -> bool {
        self.manager.has::<Q>(self.entity)
    }

    /// See [`Manager::has_any`].
    #[must_use]
    pub fn has_any<Q: ComponentSet>(&self) -> bool {
        self.manager.has_any::<Q>(self.entity)
    }

    /// See [`Manager::get`].
    #[must_use]
    pub fn get<T: Component>(&self) -> &'m T {
        self.manager.get::<T>(self.entity)
    }

    /// See [`Manager::get_many`].
    #[must_use]
    pub fn get_many<Q: ComponentSet>(&self) -> Q::Ref<'m> {
        self.manager.get_many::<Q>(self.entity)
    }

    /// See [`Manager::try_get`].
    #[must_use]
    pub fn try_get<T: Component>(&self) -> Option<&'m T> {
        self.manager.try_get::<T>(self.entity)
    }

    /// See [`Manager::is_identical`].
    #[must_use]
    pub fn is_identical(&self, other: Entity) -> bool {
        self.manager.is_identical(self.entity, other)
    }
}

impl std::fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EntityRef").field(&self.entity).finish()
    }
}

/// Exclusive facade over one entity.
pub struct EntityMut<'m> {
    manager: &'m mut Manager,
    entity: Entity,
}

impl<'m> EntityMut<'m> {
    pub(crate) fn new(manager: &'m mut Manager, entity: Entity) -> Self {
        Self { manager, entity }
    }

    /// The wrapped handle.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// Reborrows as a shared facade.
    #[must_use]
    pub fn as_readonly(&self) -> EntityRef<'_> {
        EntityRef::new(self.manager, self.entity)
    }

    /// See [`Manager::add`].
    pub fn add<T: Component>(&mut self, value: T) -> &mut T {
        self.manager.add(self.entity, value)
    }

    /// See [`Manager::try_add`].
    pub fn try_add<T: Component>(&mut self, value: T) -> &mut T {
        self.manager.try_add(self.entity, value)
    }

    /// See [`Manager::remove`].
    pub fn remove<Q: ComponentSet>(&mut self) -> bool {
        self.manager.remove::<Q>(self.entity)
    }

    /// See [`Manager::has`].
    #[must_use]
    pub fn has<Q: ComponentSet>(&self) -> bool {
        self.manager.has::<Q>(self.entity)
    }

    /// See [`Manager::has_any`].
    #[must_use]
    pub fn has_any<Q: ComponentSet>(&self) -> bool {
        self.manager.has_any::<Q>(self.entity)
    }

    /// See [`Manager::get`].
    #[must_use]
    pub fn get<T: Component>(&self) -> &T {
        self.manager.get::<T>(self.entity)
    }

    /// See [`Manager::get_mut`].
    pub fn get_mut<T: Component>(&mut self) -> &mut T {
        self.manager.get_mut::<T>(self.entity)
    }

    /// See [`Manager::try_get`].
    #[must_use]
    pub fn try_get<T: Component>(&self) -> Option<&T> {
        self.manager.try_get::<T>(self.entity)
    }

    /// See [`Manager::try_get_mut`].
    pub fn try_get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.manager.try_get_mut::<T>(self.entity)
    }

    /// See [`Manager::update`].
    pub fn update<T: Component>(&mut self) -> &mut T {
        self.manager.update::<T>(self.entity)
    }

    /// See [`Manager::is_alive`].
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.manager.is_alive(self.entity)
    }

    /// See [`Manager::destroy`].
    pub fn destroy(&mut self) {
        self.manager.destroy(self.entity);
    }

    /// See [`Manager::copy_entity`].
    pub fn copy(&mut self) -> Entity {
        self.manager.copy_entity(self.entity)
    }

    /// See [`Manager::copy_entity_of`].
    pub fn copy_of<Q: ComponentSet>(&mut self) -> Entity {
        self.manager.copy_entity_of::<Q>(self.entity)
    }

    /// See [`Manager::is_identical`].
    #[must_use]
    pub fn is_identical(&self, other: Entity) -> bool {
        self.manager.is_identical(self.entity, other)
    }
}

impl std::fmt::Debug for EntityMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EntityMut").field(&self.entity).finish()
    }
}
