//! # Component Type Registry
//!
//! Assigns a dense [`ComponentTypeId`] to each component type the first
//! time any manager sharing the registry uses it.
//!
//! Managers built with [`Manager::new`](super::Manager::new) share the
//! process-wide [`TypeRegistry::global`] instance, so separately constructed
//! managers agree on ids. Tests and embedders that want isolated,
//! deterministic numbering inject their own registry with
//! [`Manager::with_registry`](super::Manager::with_registry).

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

/// Dense per-type index into a manager's pool table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(u32);

impl ComponentTypeId {
    /// Returns the id as a pool table index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Default)]
struct RegistryInner {
    ids: HashMap<TypeId, ComponentTypeId>,
    names: Vec<&'static str>,
}

/// Shared mapping from Rust types to [`ComponentTypeId`]s.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide default registry.
    #[must_use]
    pub fn global() -> Self {
        static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new).clone()
    }

    /// Returns the id of `T`, assigning the next free one on first use.
    pub fn id_of<T: 'static>(&self) -> ComponentTypeId {
        let key = TypeId::of::<T>();
        let inner = self.inner.upgradable_read();
        if let Some(&id) = inner.ids.get(&key) {
            return id;
        }

        let mut inner = RwLockUpgradableReadGuard::upgrade(inner);
        let raw = u32::try_from(inner.names.len()).expect("component type ids exhausted");
        let id = ComponentTypeId(raw);
        inner.ids.insert(key, id);
        inner.names.push(type_name::<T>());
        tracing::debug!(component = type_name::<T>(), id = raw, "registered component type");
        id
    }

    /// Returns the id of `T` if it has been assigned.
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.inner.read().ids.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the type name registered under `id`.
    #[must_use]
    pub fn name(&self, id: ComponentTypeId) -> Option<&'static str> {
        self.inner.read().names.get(id.index()).copied()
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().names.len()
    }

    /// Returns `true` if no type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both handles refer to the same registry.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.inner.read().names.iter()).finish()
    }
}
