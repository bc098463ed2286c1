use crate::error::NumenError;
use crate::registry::{Bounds, Id, Registry, ResetCycle, MAX_RAW_ID, MAX_TYPES};

#[test]
fn test_ids_pack_type_tag_and_raw_id() {
    let mut registry = Registry::new();
    let tag = registry.register_type("stat").unwrap();
    let id = registry.register_name("stat", "atk", 0).unwrap();

    assert_eq!(tag.get(), 1);
    assert_eq!(id.type_tag(), 1);
    assert_eq!(id.raw(), 1);
    assert_eq!(id.bits(), 0x0100_0001);
    assert!(!id.is_ordered());
    assert_eq!(Id::from_bits(id.bits()), Some(id));
}

#[test]
fn test_raw_ids_are_allocated_per_type() {
    let mut registry = Registry::new();
    let a = registry.register_name("stat", "a", 0).unwrap();
    let b = registry.register_name("stat", "b", 0).unwrap();
    let gold = registry.register_name("money", "gold", 0).unwrap();

    assert_eq!((a.raw(), b.raw()), (1, 2));
    assert_eq!(gold.raw(), 1);
    assert_ne!(a.type_tag(), gold.type_tag());
}

#[test]
fn test_explicit_raw_id_moves_allocation_forward() {
    let mut registry = Registry::new();
    let explicit = registry.register_name("stat", "a", 10).unwrap();
    let next = registry.register_name("stat", "b", 0).unwrap();

    assert_eq!(explicit.raw(), 10);
    assert_eq!(next.raw(), 11);
}

#[test]
fn test_duplicate_name_fails() {
    let mut registry = Registry::new();
    registry.register_name("stat", "n", 0).unwrap();

    let result = registry.register_name("other", "n", 0);
    match result {
        Err(NumenError::Registry(message)) => assert!(message.contains("'n'")),
        other => panic!("Expected Registry error, got {:?}", other),
    }
}

#[test]
fn test_duplicate_explicit_raw_id_fails() {
    let mut registry = Registry::new();
    registry.register_name("stat", "a", 5).unwrap();

    let result = registry.register_name("stat", "b", 5);
    assert!(matches!(result, Err(NumenError::Registry(_))));

    // The same raw id in another type is fine
    assert!(registry.register_name("money", "c", 5).is_ok());
}

#[test]
fn test_raw_id_above_limit_fails() {
    let mut registry = Registry::new();
    assert!(registry.register_name("stat", "a", MAX_RAW_ID).is_ok());
    assert!(registry.register_name("stat", "b", MAX_RAW_ID + 1).is_err());
}

#[test]
fn test_type_limit() {
    let mut registry = Registry::new();
    for i in 0..MAX_TYPES {
        registry.register_type(&format!("t{}", i)).unwrap();
    }
    assert_eq!(registry.type_count(), 255);

    let result = registry.register_type("one_too_many");
    assert!(matches!(result, Err(NumenError::Registry(_))));

    // Known labels still resolve
    assert!(registry.register_type("t0").is_ok());
}

#[test]
fn test_register_type_is_idempotent() {
    let mut registry = Registry::new();
    let first = registry.register_type("stat").unwrap();
    let second = registry.register_type("stat").unwrap();
    assert_eq!(first, second);
    assert_eq!(registry.type_count(), 1);
}

#[test]
fn test_empty_name_fails() {
    let mut registry = Registry::new();
    assert!(registry.register_name("stat", "", 0).is_err());
}

#[test]
fn test_lookups() {
    let mut registry = Registry::new();
    let id = registry
        .register_name_by_info("stat", "hp", 0, ResetCycle::Day, Bounds::new(50.0, 0.0, 100.0))
        .unwrap();

    assert_eq!(registry.id_by_name("hp"), Some(id));
    assert_eq!(registry.name_by_id(id), Some("hp"));
    assert_eq!(registry.id_by_name("mp"), None);

    let record = registry.record(id).unwrap();
    assert_eq!(record.cycle(), ResetCycle::Day);
    assert_eq!(record.bounds().init, 50.0);
    assert_eq!(record.bounds().max, 100.0);
}

#[test]
fn test_ordered_names() {
    let mut registry = Registry::new();
    let first = registry.register_ordered("tmp", 0, Bounds::default()).unwrap();
    let second = registry.register_ordered("tmp2", 0, Bounds::default()).unwrap();
    let explicit = registry.register_ordered("tmp9", 9, Bounds::default()).unwrap();

    assert_eq!((first, second, explicit), (1, 2, 9));
    assert_eq!(registry.ordered_count(), 9);

    let id = registry.id_by_name("tmp").unwrap();
    assert!(id.is_ordered());
    assert_eq!(id.type_tag(), 0);

    assert!(registry.register_ordered("again", 2, Bounds::default()).is_err());
}

#[test]
fn test_ordered_names_reject_hooks() {
    let mut registry = Registry::new();
    registry.register_ordered("tmp", 0, Bounds::default()).unwrap();

    let get = registry.register_get_hook_by_name("tmp", |_, _| Ok(1.0));
    let set = registry.register_set_hook_by_name("tmp", |_, _, _, value| Ok(value));
    assert!(matches!(get, Err(NumenError::Registry(_))));
    assert!(matches!(set, Err(NumenError::Registry(_))));
}

#[test]
fn test_type_hooks_apply_to_existing_and_later_names() {
    let mut registry = Registry::new();
    let before = registry.register_name("derived", "a", 0).unwrap();
    registry
        .register_get_hook_by_type("derived", |_, _| Ok(7.0))
        .unwrap();
    let after = registry.register_name("derived", "b", 0).unwrap();

    assert!(registry.record(before).unwrap().get_hook().is_some());
    assert!(registry.record(after).unwrap().get_hook().is_some());
}

#[test]
fn test_hook_on_unknown_type_or_name_fails() {
    let mut registry = Registry::new();
    assert!(registry.register_get_hook_by_type("ghost", |_, _| Ok(0.0)).is_err());
    assert!(registry.register_set_hook_by_name("ghost", |_, _, _, v| Ok(v)).is_err());
}

#[test]
fn test_records_are_sorted_by_id() {
    let mut registry = Registry::new();
    registry.register_name("b_type", "z", 0).unwrap();
    registry.register_name("a_type", "y", 0).unwrap();
    registry.register_ordered("x", 0, Bounds::default()).unwrap();

    let names: Vec<&str> = registry.records().iter().map(|record| record.name()).collect();
    assert_eq!(names, vec!["x", "z", "y"]);
}

#[test]
fn test_bounds_clamp() {
    let bounds = Bounds::new(0.0, -10.0, 100.0);
    assert_eq!(bounds.clamp(150.0), 100.0);
    assert_eq!(bounds.clamp(-50.0), -10.0);
    assert_eq!(bounds.clamp(42.0), 42.0);

    // A zero max does not cap
    let unbounded = Bounds::new(0.0, 0.0, 0.0);
    assert_eq!(unbounded.clamp(1e12), 1e12);
    assert_eq!(unbounded.clamp(-1.0), 0.0);
}

#[test]
fn test_type_label_lookup() {
    let mut registry = Registry::new();
    let gold = registry.register_name("money", "gold", 0).unwrap();
    let raw = registry.register_ordered("slot", 0, Bounds::default()).unwrap();

    assert_eq!(registry.type_label(gold), Some("money"));
    assert_eq!(registry.type_label(Id::ordered(raw).unwrap()), None);
    assert_eq!(ResetCycle::Permanent.to_string(), "permanent");
}
