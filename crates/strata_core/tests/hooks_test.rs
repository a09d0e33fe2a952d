//! Integration tests for component lifecycle hooks.

use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::{Entity, Manager, TypeRegistry};

#[derive(Clone, Debug, PartialEq)]
struct Score(u32);

#[derive(Clone, Debug, PartialEq, Eq)]
enum Event {
    Construct(Entity, u32),
    Update(Entity, u32),
    Destruct(Entity, u32),
}

fn recorded_manager() -> (Manager, Arc<Mutex<Vec<Event>>>) {
    let mut manager = Manager::with_registry(TypeRegistry::new());
    let log = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&log);
    manager
        .on_construct::<Score>()
        .connect(move |entity, score| sink.lock().push(Event::Construct(entity, score.0)));
    let sink = Arc::clone(&log);
    manager
        .on_update::<Score>()
        .connect(move |entity, score| sink.lock().push(Event::Update(entity, score.0)));
    let sink = Arc::clone(&log);
    manager
        .on_destruct::<Score>()
        .connect(move |entity, score| sink.lock().push(Event::Destruct(entity, score.0)));

    (manager, log)
}

#[test]
fn test_add_replace_remove() {
    let (mut manager, log) = recorded_manager();
    let entity = manager.create_entity();

    manager.add(entity, Score(1));
    manager.add(entity, Score(2));
    manager.try_add(entity, Score(3));
    manager.remove::<(Score,)>(entity);

    assert_eq!(
        *log.lock(),
        vec![
            Event::Construct(entity, 1),
            Event::Update(entity, 2),
            Event::Destruct(entity, 2),
        ]
    );
}

#[test]
fn test_explicit_update_and_copy() {
    let (mut manager, log) = recorded_manager();
    let source = manager.create_entity();
    manager.add(source, Score(4));
    manager.get_mut::<Score>(source).0 = 5;
    manager.update::<Score>(source);

    let copy = manager.copy_entity(source);
    manager.copy_components(source, copy);

    assert_eq!(
        *log.lock(),
        vec![
            Event::Construct(source, 4),
            Event::Update(source, 5),
            Event::Construct(copy, 5),
            Event::Update(copy, 5),
        ]
    );
}

#[test]
fn test_destroy_fires_destruct_on_commit() {
    let (mut manager, log) = recorded_manager();
    let entity = manager.create_entity();
    manager.add(entity, Score(9));
    manager.refresh();
    log.lock().clear();

    manager.destroy(entity);
    assert!(log.lock().is_empty());
    manager.refresh();
    assert_eq!(*log.lock(), vec![Event::Destruct(entity, 9)]);
}

#[test]
fn test_destroying_pending_entity_fires_destruct_at_once() {
    let (mut manager, log) = recorded_manager();
    let entity = manager.create_entity();
    manager.add(entity, Score(6));

    manager.destroy(entity);
    assert_eq!(
        *log.lock(),
        vec![Event::Construct(entity, 6), Event::Destruct(entity, 6)]
    );
    assert!(!manager.is_alive(entity));

    manager.refresh();
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn test_disconnect() {
    let (mut manager, log) = recorded_manager();
    let extra = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&extra);
    let id = manager.on_construct::<Score>().connect(move |_, _| *counter.lock() += 1);

    let a = manager.create_entity();
    manager.add(a, Score(0));
    assert!(manager.on_construct::<Score>().disconnect(id));
    let b = manager.create_entity();
    manager.add(b, Score(0));

    assert_eq!(*extra.lock(), 1);
    assert_eq!(log.lock().len(), 2);
    assert_eq!(manager.on_construct::<Score>().len(), 1);
}

#[test]
fn test_clear_does_not_fire_and_keeps_hooks() {
    let (mut manager, log) = recorded_manager();
    let entity = manager.create_entity();
    manager.add(entity, Score(1));
    manager.clear();
    assert_eq!(log.lock().len(), 1);

    let entity = manager.create_entity();
    manager.add(entity, Score(2));
    assert_eq!(log.lock().last(), Some(&Event::Construct(entity, 2)));

    manager.reset();
    let entity = manager.create_entity();
    manager.add(entity, Score(3));
    assert_eq!(log.lock().last(), Some(&Event::Construct(entity, 3)));
}

#[test]
fn test_clone_shares_hooks() {
    let (manager, log) = recorded_manager();
    let mut clone = manager.clone();
    let entity = clone.create_entity();
    clone.add(entity, Score(7));
    assert_eq!(*log.lock(), vec![Event::Construct(entity, 7)]);
}
