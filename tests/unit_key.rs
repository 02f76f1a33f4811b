/// Unit tests for ServiceKey

use service_bridge::ServiceKey;
use std::any::TypeId;
use std::collections::HashSet;

trait Plugin: Send + Sync {}

#[test]
fn test_key_type_name() {
    let key = ServiceKey::of::<String>();
    assert_eq!(key.type_name(), "alloc::string::String");
    assert_eq!(key.to_string(), "alloc::string::String");
    assert_eq!(format!("{:?}", key), "ServiceKey(alloc::string::String)");
}

#[test]
fn test_key_trait_object() {
    let key = ServiceKey::of::<dyn Plugin>();
    assert_eq!(key.type_id(), TypeId::of::<dyn Plugin>());
    assert!(key.type_name().starts_with("dyn "));
    assert!(key.is::<dyn Plugin>());
    assert!(!key.is::<String>());
}

#[test]
fn test_key_equality_uses_type_only() {
    let mut keys = HashSet::new();
    keys.insert(ServiceKey::of::<u32>());
    keys.insert(ServiceKey::of::<u32>());
    keys.insert(ServiceKey::of::<dyn Plugin>());
    assert_eq!(keys.len(), 2);
    assert_ne!(ServiceKey::of::<u32>(), ServiceKey::of::<i32>());
}
