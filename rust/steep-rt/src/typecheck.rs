//! Checking runtime values against declared types.

use crate::address::AddressValidator;
use crate::values::{RuntimeKind, Value};
use steep_core::{TypeSpec, TypeTag};

/// Check `value` against `spec`. On mismatch returns the category reported
/// to the caller: the container kind for objects, the primary kind otherwise.
///
/// Acceptance runs in tiers: primary category, then container refinement,
/// then a string that is a valid address when `address` is allowed.
pub fn check_value(value: &Value, spec: &TypeSpec, addresses: &dyn AddressValidator) -> Result<(), RuntimeKind> {
    let Some(allowed) = spec.allowed() else { return Ok(()) };
    let accepts = |kind: RuntimeKind| kind.tag().is_some_and(|tag| allowed.contains(&tag));

    let primary = RuntimeKind::of(value);
    if accepts(primary) {
        return Ok(());
    }
    let refined = RuntimeKind::refine(value);
    if primary == RuntimeKind::Object && accepts(refined) {
        return Ok(());
    }
    if let Value::String(s) = value {
        if allowed.contains(&TypeTag::Address) && addresses.is_valid_address(s) {
            return Ok(());
        }
    }
    Err(refined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{PrefixValidator, RejectAll};
    use crate::config::DispatchOptions;
    use std::collections::BTreeMap;

    fn single(tag: TypeTag) -> TypeSpec {
        TypeSpec::Single(tag)
    }

    #[test]
    fn test_any_accepts_everything() {
        assert!(check_value(&Value::Undefined, &TypeSpec::Any, &RejectAll).is_ok());
        assert!(check_value(&Value::Object(BTreeMap::new()), &TypeSpec::Any, &RejectAll).is_ok());
    }

    #[test]
    fn test_primary_tier() {
        assert!(check_value(&Value::from(1), &single(TypeTag::Number), &RejectAll).is_ok());
        assert_eq!(check_value(&Value::from("1"), &single(TypeTag::Number), &RejectAll), Err(RuntimeKind::String));
        assert_eq!(check_value(&Value::Undefined, &single(TypeTag::Number), &RejectAll), Err(RuntimeKind::Undefined));
    }

    #[test]
    fn test_container_tier() {
        let arr = Value::Array(vec![]);
        assert!(check_value(&arr, &single(TypeTag::Array), &RejectAll).is_ok());
        assert_eq!(check_value(&arr, &single(TypeTag::Map), &RejectAll), Err(RuntimeKind::Array));
        let obj = Value::Object(BTreeMap::new());
        assert_eq!(check_value(&obj, &single(TypeTag::Map), &RejectAll), Err(RuntimeKind::Object));
    }

    #[test]
    fn test_nullable_union() {
        let spec = TypeSpec::Union(vec![TypeTag::Undefined, TypeTag::Null, TypeTag::Number]);
        assert!(check_value(&Value::Null, &spec, &RejectAll).is_ok());
        assert!(check_value(&Value::Undefined, &spec, &RejectAll).is_ok());
        assert_eq!(check_value(&Value::Bool(true), &spec, &RejectAll), Err(RuntimeKind::Boolean));
    }

    #[test]
    fn test_address_tier() {
        let validator = PrefixValidator::new(&DispatchOptions::default()).unwrap();
        let good = Value::String(format!("tea1{}", "z".repeat(38)));
        assert!(check_value(&good, &single(TypeTag::Address), &validator).is_ok());
        assert_eq!(check_value(&Value::from("nope"), &single(TypeTag::Address), &validator), Err(RuntimeKind::String));
        assert!(check_value(&good, &single(TypeTag::Address), &RejectAll).is_err());
    }
}
