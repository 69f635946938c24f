//! Type annotation normalization.
//!
//! Maps a source annotation to the canonical [`TypeSpec`] the dispatcher checks
//! values against. Any branch that names an unsupported type poisons the whole
//! result to `any`, so `?Custom` and `number | Custom` are both unconstrained.

use crate::compiler::ast::TypeAnn;
use crate::CompileOptions;
use std::str::FromStr;
use steep_core::{TypeSpec, TypeTag};

pub fn normalize(annotation: Option<&TypeAnn>, options: &CompileOptions) -> TypeSpec {
    match annotation {
        None => TypeSpec::Any,
        Some(ann) => match collect_tags(ann, options) {
            Some(tags) => TypeSpec::from_tags(tags),
            None => TypeSpec::Any,
        },
    }
}

/// Tags for one annotation, or `None` when it collapses to `any`.
fn collect_tags(ann: &TypeAnn, options: &CompileOptions) -> Option<Vec<TypeTag>> {
    match ann {
        TypeAnn::Void(_) => Some(vec![TypeTag::Undefined]),
        TypeAnn::Null(_) => Some(vec![TypeTag::Null]),
        TypeAnn::Array(..) => Some(vec![TypeTag::Array]),
        TypeAnn::Named(name, _, _) => named_tag(name, options).map(|t| vec![t]),
        TypeAnn::Nullable(inner, _) => {
            let mut tags = vec![TypeTag::Undefined, TypeTag::Null];
            tags.extend(collect_tags(inner, options)?);
            Some(tags)
        }
        TypeAnn::Union(members, _) => {
            let mut tags = Vec::new();
            for member in members {
                tags.extend(collect_tags(member, options)?);
            }
            Some(tags)
        }
        TypeAnn::Literal(..) => None,
    }
}

fn named_tag(name: &str, options: &CompileOptions) -> Option<TypeTag> {
    let tag = TypeTag::from_str(&name.to_lowercase()).ok()?;
    match tag {
        TypeTag::Address if options.recognize_address_type => Some(tag),
        TypeTag::Address => None,
        _ => Some(tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::tokens::Span;

    fn named(n: &str) -> TypeAnn {
        TypeAnn::Named(n.to_string(), vec![], Span::dummy())
    }

    fn norm(ann: TypeAnn) -> TypeSpec {
        normalize(Some(&ann), &CompileOptions::default())
    }

    #[test]
    fn test_absent_annotation_is_any() {
        assert_eq!(normalize(None, &CompileOptions::default()), TypeSpec::Any);
    }

    #[test]
    fn test_named_types_lowercased() {
        assert_eq!(norm(named("number")), TypeSpec::Single(TypeTag::Number));
        assert_eq!(norm(named("Date")), TypeSpec::Single(TypeTag::Date));
        assert_eq!(norm(named("RegExp")), TypeSpec::Single(TypeTag::Regexp));
        assert_eq!(
            norm(TypeAnn::Named("Map".into(), vec![named("string"), named("number")], Span::dummy())),
            TypeSpec::Single(TypeTag::Map)
        );
        assert_eq!(norm(named("CustomType")), TypeSpec::Any);
    }

    #[test]
    fn test_void_null_and_array_shorthand() {
        assert_eq!(norm(TypeAnn::Void(Span::dummy())), TypeSpec::Single(TypeTag::Undefined));
        assert_eq!(norm(TypeAnn::Null(Span::dummy())), TypeSpec::Single(TypeTag::Null));
        assert_eq!(
            norm(TypeAnn::Array(Box::new(named("Custom")), Span::dummy())),
            TypeSpec::Single(TypeTag::Array)
        );
    }

    #[test]
    fn test_nullable() {
        assert_eq!(
            norm(TypeAnn::Nullable(Box::new(named("number")), Span::dummy())),
            TypeSpec::Union(vec![TypeTag::Undefined, TypeTag::Null, TypeTag::Number])
        );
        assert_eq!(norm(TypeAnn::Nullable(Box::new(named("CustomType")), Span::dummy())), TypeSpec::Any);
    }

    #[test]
    fn test_union_dedup_and_poison() {
        let u = TypeAnn::Union(vec![named("string"), TypeAnn::Null(Span::dummy()), named("string")], Span::dummy());
        assert_eq!(norm(u), TypeSpec::Union(vec![TypeTag::String, TypeTag::Null]));
        let poisoned = TypeAnn::Union(vec![named("number"), named("Thing")], Span::dummy());
        assert_eq!(norm(poisoned), TypeSpec::Any);
        let literal = TypeAnn::Union(vec![TypeAnn::Literal("1".into(), Span::dummy()), named("number")], Span::dummy());
        assert_eq!(norm(literal), TypeSpec::Any);
    }

    #[test]
    fn test_single_branch_union_unwrapped() {
        let u = TypeAnn::Union(vec![named("number"), named("number")], Span::dummy());
        assert_eq!(norm(u), TypeSpec::Single(TypeTag::Number));
    }

    #[test]
    fn test_address_recognition_is_opt_in() {
        assert_eq!(norm(named("address")), TypeSpec::Any);
        let opts = CompileOptions { recognize_address_type: true, ..CompileOptions::default() };
        assert_eq!(normalize(Some(&named("address")), &opts), TypeSpec::Single(TypeTag::Address));
    }
}
