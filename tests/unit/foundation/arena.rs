use super::*;

#[test]
fn insert_get_remove() {
    let mut arena = Arena::new();
    let a = arena.insert("a");
    let b = arena.insert("b");
    assert_eq!(arena.len(), 2);
    assert_eq!(arena.get(a), Some(&"a"));
    assert_eq!(arena.get(b), Some(&"b"));

    assert_eq!(arena.remove(a), Some("a"));
    assert_eq!(arena.len(), 1);
    assert!(!arena.contains(a));
    assert_eq!(arena.remove(a), None);
}

#[test]
fn reused_slot_does_not_alias_stale_key() {
    let mut arena = Arena::new();
    let old = arena.insert(1);
    arena.remove(old);
    let new = arena.insert(2);

    assert_eq!(old.index, new.index);
    assert_ne!(old.generation, new.generation);
    assert_eq!(arena.get(old), None);
    assert_eq!(arena.get(new), Some(&2));
    assert!(arena.get_mut(old).is_none());
}

#[test]
fn keys_are_ascending_and_skip_holes() {
    let mut arena = Arena::new();
    let k0 = arena.insert(0);
    let k1 = arena.insert(1);
    let k2 = arena.insert(2);
    arena.remove(k1);

    assert_eq!(arena.keys(), vec![k0, k2]);
    let values: Vec<i32> = arena.iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![0, 2]);
}

#[test]
fn iter_mut_updates_in_place() {
    let mut arena = Arena::new();
    let k = arena.insert(10);
    for (_, v) in arena.iter_mut() {
        *v += 1;
    }
    assert_eq!(arena.get(k), Some(&11));
    assert_eq!(arena.len(), 1);
}
