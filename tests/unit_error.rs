/// Unit tests for DiError and DiResult types

use service_bridge::{DiError, DiResult, Lifetime, ServiceKey};
use std::error::Error;

#[test]
fn test_error_display_not_found() {
    let error = DiError::NotFound(ServiceKey::of::<u32>());
    let display_str = format!("{}", error);
    assert_eq!(display_str, "Service not found: u32");
    assert!(error.is_not_found());
    assert!(!error.is_configuration());
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch("std::string::String");
    assert_eq!(error.to_string(), "Type mismatch for: std::string::String");
}

#[test]
fn test_error_display_circular() {
    let path = vec!["ServiceA", "ServiceB", "ServiceA"];
    let error = DiError::Circular(path);
    let display_str = format!("{}", error);
    assert_eq!(display_str, "Circular dependency: ServiceA -> ServiceB -> ServiceA");
}

#[test]
fn test_error_display_lifecycle_and_scope() {
    assert_eq!(DiError::ScopeDisposed.to_string(), "Scope has been disposed");
    assert_eq!(DiError::DepthExceeded(64).to_string(), "Max depth 64 exceeded");
    assert_eq!(
        DiError::NoActiveScope("Session").to_string(),
        "No active scope to resolve scoped service: Session"
    );
}

#[test]
fn test_configuration_errors() {
    let invalid = "pooled".parse::<Lifetime>().unwrap_err();
    assert_eq!(invalid, DiError::InvalidLifetime("pooled".to_string()));
    assert_eq!(invalid.to_string(), "Invalid lifetime: pooled");
    assert!(invalid.is_configuration());

    let malformed = DiError::MalformedDescriptor {
        service: "Widget",
        reason: "no implementation source",
    };
    assert_eq!(malformed.to_string(), "Malformed descriptor for Widget: no implementation source");
    assert!(malformed.is_configuration());

    assert!(DiError::DuplicateRegistration("Widget").is_configuration());
    assert!(!DiError::ScopeDisposed.is_configuration());
}

#[test]
fn test_factory_error_names_service() {
    let error = DiError::factory::<Vec<u8>>("disk full");
    assert_eq!(error.to_string(), "Factory for alloc::vec::Vec<u8> failed: disk full");
}

#[test]
fn test_error_trait_implementation() {
    let error = DiError::NotFound(ServiceKey::of::<String>());
    let as_error: &dyn Error = &error;
    assert!(as_error.source().is_none());

    let result: DiResult<u32> = Err(error.clone());
    assert_eq!(result.unwrap_err(), error);
}
