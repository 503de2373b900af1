use pretty_assertions::assert_eq;
use quill_types::{Ident, LibraryId, TypeManager};

use super::{ListRef, ObjectRef, Value};

#[test]
fn test_defaults_by_type() {
    let types = TypeManager::new();
    let app = LibraryId::new("app");
    let point = types.declare_struct("Point", &app);
    let customer = types.declare_class("Customer", &app);

    assert_eq!(Value::default_for(&types.int()), Value::Int(0));
    assert_eq!(Value::default_for(&types.bool()), Value::Bool(false));
    assert_eq!(Value::default_for(&types.float()), Value::Float(0.0));
    assert_eq!(Value::default_for(&types.unit()), Value::Unit);
    assert_eq!(Value::default_for(&types.str()), Value::Null);
    assert_eq!(Value::default_for(&customer), Value::Null);

    match Value::default_for(&point) {
        Value::Object(obj) => assert_eq!(obj.ty(), &point),
        other => panic!("expected a struct instance, got {}", other),
    }
}

#[test]
fn test_lists_and_objects_share_storage() {
    let types = TypeManager::new();
    let ints = types.array(&types.int());
    let list = ListRef::new(ints, vec![Value::Int(1)]);
    let alias = Value::List(list.clone());
    list.push(Value::Int(2));

    assert_eq!(alias.to_string(), "[1, 2]");
    assert_eq!(alias, Value::List(list.clone()));
    assert!(list.set(0, Value::Int(5)));
    assert!(!list.set(9, Value::Int(5)));
    assert_eq!(list.to_vec(), vec![Value::Int(5), Value::Int(2)]);

    let app = LibraryId::new("app");
    let ty = types.declare_class("Customer", &app);
    let a = ObjectRef::new(ty.clone());
    let b = ObjectRef::new(ty);
    a.set(Ident::new("name"), Value::str("Ada"));
    assert_eq!(a.get(&Ident::new("name")), Some(Value::str("Ada")));
    assert_ne!(Value::Object(a), Value::Object(b));
}

#[test]
fn test_instance_checks() {
    let types = TypeManager::new();
    let app = LibraryId::new("app");
    let animal = types.declare_class("Animal", &app);
    let dog = types.declare_class("Dog", &app);
    types
        .set_supertypes(&dog, Some(animal.clone()), [])
        .unwrap();

    let rex = Value::Object(ObjectRef::new(dog.clone()));
    assert!(rex.is_instance_of(&animal));
    assert!(rex.is_instance_of(&dog));
    assert!(!Value::Null.is_instance_of(&animal));
    assert!(Value::Int(1).is_instance_of(&types.int()));
    assert!(!Value::Int(1).is_instance_of(&types.float()));
}

#[test]
fn test_display_of_self_referencing_values() {
    let types = TypeManager::new();
    let app = LibraryId::new("app");
    let node = types.declare_class("Node", &app);
    let head = ObjectRef::new(node);
    head.set(Ident::new("value"), Value::Int(1));
    head.set(Ident::new("next"), Value::Object(head.clone()));
    assert_eq!(
        Value::Object(head.clone()).to_string(),
        "Node { next: ..., value: 1 }"
    );
    // Fields stay writable after formatting.
    head.set(Ident::new("value"), Value::Int(2));

    let objects = types.array(&types.object());
    let list = ListRef::new(objects, vec![Value::Int(1)]);
    list.push(Value::List(list.clone()));
    assert_eq!(Value::List(list).to_string(), "[1, ...]");

    // A list reachable twice without a cycle is printed in full both times.
    let inner = Value::List(ListRef::new(types.array(&types.int()), vec![Value::Int(7)]));
    let ints = types.array(&types.int());
    let pair = ListRef::new(types.array(&ints), vec![inner.clone(), inner]);
    assert_eq!(Value::List(pair).to_string(), "[[7], [7]]");
}
