//! Integration tests for entity copies, composition matching and manager
//! clones.

use strata_core::{Entity, Manager, TypeRegistry};

#[derive(Clone, Debug, PartialEq)]
struct Health(u32);

#[derive(Clone, Debug, PartialEq)]
struct Armor(u32);

#[derive(Clone, Debug, PartialEq)]
struct Tag(&'static str);

fn manager() -> Manager {
    Manager::with_registry(TypeRegistry::new())
}

fn soldier(manager: &mut Manager) -> Entity {
    let entity = manager.create_entity();
    manager.add(entity, Health(100));
    manager.add(entity, Armor(20));
    manager.add(entity, Tag("soldier"));
    entity
}

#[test]
fn test_copy_entity_duplicates_everything() {
    let mut manager = manager();
    let source = soldier(&mut manager);
    let copy = manager.copy_entity(source);

    assert_ne!(copy, source);
    assert!(manager.is_identical(source, copy));
    assert_eq!(*manager.get::<Health>(copy), Health(100));
    assert_eq!(*manager.get::<Armor>(copy), Armor(20));
    assert_eq!(*manager.get::<Tag>(copy), Tag("soldier"));

    // Values are independent.
    manager.get_mut::<Health>(copy).0 = 1;
    assert_eq!(*manager.get::<Health>(source), Health(100));
}

#[test]
fn test_copy_entity_of_selected_types() {
    let mut manager = manager();
    let source = soldier(&mut manager);
    let copy = manager.copy_entity_of::<(Health,)>(source);

    assert!(manager.has::<(Health,)>(copy));
    assert!(!manager.has_any::<(Armor, Tag)>(copy));
    assert!(!manager.is_identical(source, copy));
}

#[test]
fn test_copy_components_overwrites_and_adds() {
    let mut manager = manager();
    let source = soldier(&mut manager);
    let target = manager.create_entity();
    manager.add(target, Health(5));

    manager.copy_components(source, target);
    assert_eq!(*manager.get::<Health>(target), Health(100));
    assert_eq!(manager.pool::<Health>().unwrap().len(), 2);
    assert!(manager.matches(source, target));

    manager.get_mut::<Armor>(source).0 = 50;
    manager.copy_components_of::<(Armor,)>(source, target);
    assert_eq!(*manager.get::<Armor>(target), Armor(50));
    assert_eq!(*manager.get::<Health>(target), Health(100));
}

#[test]
fn test_identity_is_reflexive_and_type_based() {
    let mut manager = manager();
    let a = manager.create_entity();
    let b = manager.create_entity();
    let c = manager.create_entity();
    manager.add(a, Health(1));
    manager.add(b, Health(2));
    manager.add(c, Health(1));
    manager.add(c, Tag("extra"));

    assert!(manager.is_identical(a, a));
    assert!(manager.is_identical(a, b));
    assert!(!manager.is_identical(a, c));

    // Two bare entities share the empty composition.
    let d = manager.create_entity();
    let e = manager.create_entity();
    assert!(manager.is_identical(d, e));
}

#[test]
fn test_clone_is_independent() {
    let mut original = manager();
    let entity = soldier(&mut original);
    original.refresh();

    let mut clone = original.clone();
    assert_ne!(clone.id(), original.id());
    assert!(clone.registry().ptr_eq(original.registry()));
    assert_eq!(clone.size(), 1);
    assert_eq!(clone.capacity(), original.capacity());

    // The original's handle does not resolve in the clone.
    assert!(!clone.is_alive(entity));
    let in_clone = clone.entities().to_vec()[0];
    assert_eq!(in_clone.slot(), entity.slot());
    assert_eq!(in_clone.version(), entity.version());
    assert_eq!(*clone.get::<Tag>(in_clone), Tag("soldier"));

    clone.get_mut::<Health>(in_clone).0 = 0;
    clone.destroy(in_clone);
    clone.refresh();

    assert_eq!(clone.size(), 0);
    assert_eq!(original.size(), 1);
    assert_eq!(*original.get::<Health>(entity), Health(100));
}

#[test]
fn test_clone_keeps_pending_state() {
    let mut original = manager();
    let pending = original.create_entity();
    original.add(pending, Armor(3));

    let mut clone = original.clone();
    clone.refresh();
    assert_eq!(clone.size(), 1);
    assert_eq!(original.size(), 0);
}
