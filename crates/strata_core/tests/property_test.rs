//! Property tests: random operation sequences checked against a simple model.

use std::collections::HashMap;

use proptest::prelude::*;
use strata_core::{DynamicBitset, Entity, Manager, Pool, TypeRegistry};

#[derive(Clone, Debug, PartialEq)]
struct Score(u16);

#[derive(Clone, Debug)]
enum Op {
    Create,
    Destroy(usize),
    Refresh,
    Add(usize, u16),
    Remove(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Create),
        2 => any::<usize>().prop_map(Op::Destroy),
        1 => Just(Op::Refresh),
        4 => (any::<usize>(), any::<u16>()).prop_map(|(i, v)| Op::Add(i, v)),
        2 => any::<usize>().prop_map(Op::Remove),
    ]
}

/// Model state of one handle ever issued.
#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    PendingCreate,
    Alive,
    PendingDestroy,
    Gone,
}

fn check_pool_invariant(pool: &Pool<Score>) -> Result<(), TestCaseError> {
    prop_assert_eq!(pool.dense().len(), pool.components().len());
    for &slot in pool.dense() {
        prop_assert!(pool.has(slot));
    }
    Ok(())
}

proptest! {
    #[test]
    fn manager_matches_model(ops in prop::collection::vec(arb_op(), 1..200)) {
        let mut manager = Manager::with_registry(TypeRegistry::new());
        let mut handles: Vec<(Entity, State)> = Vec::new();
        let mut values: HashMap<Entity, u16> = HashMap::new();

        for op in ops {
            match op {
                Op::Create => {
                    let entity = manager.create_entity();
                    prop_assert!(handles.iter().all(|(other, _)| *other != entity));
                    handles.push((entity, State::PendingCreate));
                }
                Op::Destroy(i) if !handles.is_empty() => {
                    let i = i % handles.len();
                    let (entity, state) = handles[i];
                    manager.destroy(entity);
                    handles[i].1 = match state {
                        State::PendingCreate => {
                            values.remove(&entity);
                            State::Gone
                        }
                        State::Alive => State::PendingDestroy,
                        other => other,
                    };
                }
                Op::Refresh => {
                    manager.refresh();
                    for (entity, state) in &mut handles {
                        *state = match *state {
                            State::PendingCreate => State::Alive,
                            State::PendingDestroy => {
                                values.remove(&*entity);
                                State::Gone
                            }
                            other => other,
                        };
                    }
                }
                Op::Add(i, v) if !handles.is_empty() => {
                    let (entity, state) = handles[i % handles.len()];
                    if state != State::Gone {
                        manager.add(entity, Score(v));
                        values.insert(entity, v);
                    }
                }
                Op::Remove(i) if !handles.is_empty() => {
                    let (entity, state) = handles[i % handles.len()];
                    if state != State::Gone {
                        let removed = manager.remove::<(Score,)>(entity);
                        prop_assert_eq!(removed, values.remove(&entity).is_some());
                    }
                }
                _ => {}
            }

            let alive = handles.iter().filter(|(_, s)| matches!(s, State::Alive | State::PendingDestroy)).count();
            prop_assert_eq!(manager.size(), alive);
            for &(entity, state) in &handles {
                prop_assert_eq!(manager.is_alive(entity), state != State::Gone);
            }
            if let Some(pool) = manager.pool::<Score>() {
                check_pool_invariant(pool)?;
                prop_assert_eq!(pool.len(), values.len());
            }
            for (&entity, &v) in &values {
                prop_assert_eq!(manager.try_get::<Score>(entity), Some(&Score(v)));
            }
        }

        let visible = manager.entities().to_vec();
        let expected: Vec<Entity> = {
            let mut live: Vec<Entity> = handles
                .iter()
                .filter(|(_, s)| matches!(s, State::Alive | State::PendingDestroy))
                .map(|(e, _)| *e)
                .collect();
            live.sort_by_key(|e| e.slot());
            live
        };
        prop_assert_eq!(visible, expected);
    }

    #[test]
    fn pool_keeps_sparse_set_invariant(
        ops in prop::collection::vec((any::<bool>(), 0u32..64, any::<u16>()), 1..300)
    ) {
        let registry = TypeRegistry::new();
        let mut manager = Manager::with_registry(registry);
        let entities: Vec<Entity> = (0..64).map(|_| manager.create_entity()).collect();
        let mut model: HashMap<u32, u16> = HashMap::new();

        for (add, slot, v) in ops {
            let entity = entities[slot as usize];
            if add {
                manager.add(entity, Score(v));
                model.insert(slot, v);
            } else {
                manager.remove::<(Score,)>(entity);
                model.remove(&slot);
            }
        }

        if let Some(pool) = manager.pool::<Score>() {
            check_pool_invariant(pool)?;
            prop_assert_eq!(pool.len(), model.len());
            for slot in 0..64usize {
                prop_assert_eq!(pool.try_get(slot).map(|value| value.0), model.get(&(slot as u32)).copied());
            }
        }
    }

    #[test]
    fn bitset_matches_vec_of_bool(
        len in 0usize..300,
        fill in any::<bool>(),
        sets in prop::collection::vec((any::<usize>(), any::<bool>()), 0..100),
        new_len in 0usize..300,
    ) {
        let mut bits = DynamicBitset::with_len(len, fill);
        let mut model = vec![fill; len];
        if len > 0 {
            for (index, value) in sets {
                bits.set(index % len, value);
                model[index % len] = value;
            }
        }
        bits.resize(new_len, !fill);
        model.resize(new_len, !fill);

        prop_assert_eq!(bits.len(), model.len());
        for (index, &value) in model.iter().enumerate() {
            prop_assert_eq!(bits.get(index), value);
        }
        let ones: Vec<usize> = bits.iter_ones().collect();
        let expected: Vec<usize> = model.iter().enumerate().filter(|&(_, &v)| v).map(|(i, _)| i).collect();
        prop_assert_eq!(bits.count_ones(), expected.len());
        prop_assert_eq!(ones, expected);
    }
}
