//! Ancestor chain resolution and registry merging.

use crate::CompileError;
use std::collections::HashMap;
use steep_core::ContractRegistry;

/// Walk `extends` links from `contract` upward. The result starts with the
/// contract itself and ends at the first class with no recorded parent.
pub fn resolve_chain(contract: &str, parents: &HashMap<String, String>) -> Result<Vec<String>, CompileError> {
    let mut chain = vec![contract.to_string()];
    let mut current = contract;
    while let Some(parent) = parents.get(current) {
        if chain.contains(parent) {
            chain.push(parent.clone());
            return Err(CompileError::InheritanceCycle { chain });
        }
        chain.push(parent.clone());
        current = parent.as_str();
    }
    Ok(chain)
}

/// Merge registries along `chain`, most derived first. Names already defined
/// by a more derived class are kept; ancestors missing from `registries`
/// contribute nothing.
pub fn merge(chain: &[String], registries: &HashMap<String, ContractRegistry>) -> ContractRegistry {
    let mut merged = ContractRegistry::new();
    for class in chain {
        match registries.get(class) {
            Some(registry) => {
                tracing::debug!(class = %class, entries = registry.len(), "merging registry");
                merged.inherit(registry);
            }
            None => tracing::debug!(class = %class, "ancestor not declared in unit, skipping"),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use steep_core::{Decorator, DecoratorSet, MemberInfo, TypeSpec, TypeTag};

    fn parents(links: &[(&str, &str)]) -> HashMap<String, String> {
        links.iter().map(|(c, p)| (c.to_string(), p.to_string())).collect()
    }

    fn registry(entries: &[(&str, TypeTag)]) -> ContractRegistry {
        let mut reg = ContractRegistry::new();
        for (name, tag) in entries {
            reg.insert_member(*name, MemberInfo::property(DecoratorSet::from(vec![Decorator::Pure]), TypeSpec::Single(*tag)));
        }
        reg
    }

    #[test]
    fn test_resolve_linear_chain() {
        let chain = resolve_chain("C", &parents(&[("C", "B"), ("B", "A")])).unwrap();
        assert_eq!(chain, vec!["C", "B", "A"]);
        assert_eq!(resolve_chain("Solo", &HashMap::new()).unwrap(), vec!["Solo"]);
    }

    #[test]
    fn test_resolve_detects_cycle() {
        let err = resolve_chain("A", &parents(&[("A", "B"), ("B", "A")])).unwrap_err();
        match err {
            CompileError::InheritanceCycle { chain } => assert_eq!(chain, vec!["A", "B", "A"]),
            other => panic!("expected cycle, got {:?}", other),
        }
        assert!(resolve_chain("A", &parents(&[("A", "A")])).is_err());
    }

    #[test]
    fn test_merge_most_derived_wins() {
        let mut regs = HashMap::new();
        regs.insert("C".to_string(), registry(&[("shared", TypeTag::String), ("own", TypeTag::Number)]));
        regs.insert("A".to_string(), registry(&[("shared", TypeTag::Boolean), ("base", TypeTag::Date)]));
        // B is an undeclared ancestor
        let merged = merge(&["C".into(), "B".into(), "A".into()], &regs);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.member("shared").unwrap().field_type(), Some(&TypeSpec::Single(TypeTag::String)));
        assert!(merged.contains("base"));
    }
}
