//! Per-class metadata extraction and member rewriting.
//!
//! One pass over a class body in source order. Each member yields its registry
//! entry and its rewritten form:
//!
//! - `@state y = 0` becomes a `get y()` / `set y(value)` pair over
//!   `getState` / `setState`, plus `this.y = 0` in the deploy hook.
//! - Any other initialized property moves into the deploy hook as
//!   `this.x = <init>` and disappears from the class body.
//! - The constructor becomes `__on_deployed`, and its top-level `super(...)`
//!   calls become `super.__on_deployed(...)`.
//!
//! When initializers exist but the class has no constructor, a deploy hook is
//! synthesized and registered as `payable`.

use crate::compiler::ast::*;
use crate::compiler::decorators::{classify_method, classify_property, strip_policy};
use crate::compiler::normalize::normalize;
use crate::compiler::tokens::Span;
use crate::{CompileError, CompileOptions};
use steep_core::names::{self, ON_DEPLOYED};
use steep_core::{ContractRegistry, Decorator, DecoratorSet, MemberInfo, ParamInfo};

/// A class after extraction: the rewritten declaration and its own registry
/// (ancestors not yet merged).
#[derive(Debug, Clone)]
pub struct ExtractedClass {
    pub decl: ClassDecl,
    pub registry: ContractRegistry,
}

/// Everything one source member turns into.
struct MemberOutput {
    key: String,
    info: MemberInfo,
    rewritten: Vec<ClassMember>,
    hook_init: Option<Stmt>,
    receives: bool,
}

pub fn extract_class(class: ClassDecl, options: &CompileOptions) -> Result<ExtractedClass, CompileError> {
    let ClassDecl { name, superclass, decorators, members, span } = class;
    check_reserved_names(&members)?;

    let mut registry = ContractRegistry::new();
    let mut body: Vec<ClassMember> = Vec::with_capacity(members.len());
    let mut hook_inits: Vec<Stmt> = Vec::new();
    let mut hook_index: Option<usize> = None;
    let mut receive_target: Option<String> = None;

    for member in members {
        let out = match member {
            ClassMember::Property(prop) => extract_property(prop, options)?,
            ClassMember::Method(method) => extract_method(method, options)?,
        };
        tracing::debug!(class = %name, member = %out.key, method = out.info.is_method(), "extracted member");
        if out.receives {
            receive_target = Some(out.key.clone());
        }
        if out.key == ON_DEPLOYED {
            hook_index = Some(body.len());
        }
        if !registry.insert_member(out.key.clone(), out.info) {
            tracing::debug!(class = %name, member = %out.key, "member already registered, keeping first");
        }
        hook_inits.extend(out.hook_init);
        body.extend(out.rewritten);
    }

    if !hook_inits.is_empty() {
        match hook_index {
            Some(i) => {
                if let ClassMember::Method(hook) = &mut body[i] {
                    hook_inits.append(&mut hook.body);
                    hook.body = hook_inits;
                }
            }
            None => {
                registry.insert_member(
                    ON_DEPLOYED,
                    MemberInfo::method(DecoratorSet::from(vec![Decorator::Payable]), Default::default(), vec![]),
                );
                body.insert(0, ClassMember::Method(synthesized_hook(hook_inits, span)));
            }
        }
    }

    if let Some(target) = receive_target {
        registry.set_receive_handler(target);
    }

    Ok(ExtractedClass { decl: ClassDecl { name, superclass, decorators, members: body, span }, registry })
}

fn check_reserved_names(members: &[ClassMember]) -> Result<(), CompileError> {
    let mut constructors = 0;
    for member in members {
        let span = member.span();
        if let ClassMember::Method(MethodDef { kind: MethodKind::Constructor, .. }) = member {
            constructors += 1;
            if constructors > 1 {
                return Err(CompileError::ReservedLifecycleName { name: ON_DEPLOYED.to_string(), line: span.line, col: span.col });
            }
            continue;
        }
        let key = member.name().key();
        if names::is_lifecycle_hook(&key) {
            return Err(CompileError::ReservedLifecycleName { name: key, line: span.line, col: span.col });
        }
    }
    Ok(())
}

// ── Properties ──

fn extract_property(prop: PropertyDef, options: &CompileOptions) -> Result<MemberOutput, CompileError> {
    let function_valued = prop.function_value().is_some();
    let decorators = classify_property(&prop.name, &prop.decorators, function_valued)?;
    let key = prop.name.key();
    let span = prop.span;

    let info = match prop.function_value() {
        Some(f) => MemberInfo::method(decorators, normalize(f.return_type.as_ref(), options), param_infos(&f.params, options)),
        None => MemberInfo::property(decorators, normalize(prop.type_ann.as_ref(), options)),
    };
    let hook_init = prop.value.clone().map(|value| {
        let target = Expr::this_member(prop.name.clone(), span);
        Stmt::Expr(Expr::Assign(Box::new(target), AssignOp::Assign, Box::new(value), span), span)
    });

    let rewritten = if info.has(&Decorator::State) {
        state_accessors(&prop.name, &key, prop.value, span)
    } else if prop.value.is_none() {
        vec![ClassMember::Property(PropertyDef { decorators: strip_policy(prop.decorators), type_ann: None, ..prop })]
    } else if prop.name.is_private() {
        // private names must stay declared for `this.#x = ...` in the hook
        vec![ClassMember::Property(PropertyDef {
            name: prop.name, decorators: strip_policy(prop.decorators), type_ann: None, value: None, span,
        })]
    } else {
        Vec::new()
    };

    Ok(MemberOutput { key, info, rewritten, hook_init, receives: false })
}

fn state_accessors(name: &MemberName, key: &str, default: Option<Expr>, span: Span) -> Vec<ClassMember> {
    let this_call = |method: &str, args: Vec<Expr>| {
        let callee = Expr::this_member(MemberName::Public(method.to_string()), span);
        Expr::Call(Box::new(callee), args, span)
    };
    let default = default.unwrap_or_else(|| Expr::Ident("undefined".to_string(), span));
    let getter = MethodDef {
        name: name.clone(), kind: MethodKind::Getter, decorators: vec![], is_async: false,
        params: vec![], return_type: None,
        body: vec![Stmt::Return(Some(this_call("getState", vec![Expr::Str(key.to_string(), span), default])), span)],
        span,
    };
    let value_param = Param { name: "value".to_string(), type_ann: None, default_value: None, span };
    let setter = MethodDef {
        name: name.clone(), kind: MethodKind::Setter, decorators: vec![], is_async: false,
        params: vec![value_param], return_type: None,
        body: vec![Stmt::Expr(
            this_call("setState", vec![Expr::Str(key.to_string(), span), Expr::Ident("value".to_string(), span)]),
            span,
        )],
        span,
    };
    vec![ClassMember::Method(getter), ClassMember::Method(setter)]
}

// ── Methods ──

fn extract_method(method: MethodDef, options: &CompileOptions) -> Result<MemberOutput, CompileError> {
    let method = if method.kind == MethodKind::Constructor { into_deploy_hook(method) } else { method };
    let decorators = classify_method(&method.name, &method.decorators)?;
    let key = method.name.key();
    let receives = decorators.contains(&Decorator::OnReceived);
    let info = MemberInfo::method(
        decorators,
        normalize(method.return_type.as_ref(), options),
        param_infos(&method.params, options),
    );
    let rewritten = MethodDef { decorators: strip_policy(method.decorators), ..method };
    Ok(MemberOutput { key, info, rewritten: vec![ClassMember::Method(rewritten)], hook_init: None, receives })
}

fn into_deploy_hook(ctor: MethodDef) -> MethodDef {
    let body = ctor.body.into_iter().map(rewrite_super_call).collect();
    MethodDef { name: MemberName::Public(ON_DEPLOYED.to_string()), kind: MethodKind::Method, body, ..ctor }
}

/// `super(args)` as a whole statement becomes `super.__on_deployed(args)`.
fn rewrite_super_call(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Expr(Expr::Call(callee, args, call_span), span) if matches!(*callee, Expr::Super(_)) => {
            let hook = Expr::Member(callee, MemberName::Public(ON_DEPLOYED.to_string()), call_span);
            Stmt::Expr(Expr::Call(Box::new(hook), args, call_span), span)
        }
        other => other,
    }
}

fn synthesized_hook(body: Vec<Stmt>, span: Span) -> MethodDef {
    MethodDef {
        name: MemberName::Public(ON_DEPLOYED.to_string()), kind: MethodKind::Method,
        decorators: vec![], is_async: false, params: vec![], return_type: None, body, span,
    }
}

fn param_infos(params: &[Param], options: &CompileOptions) -> Vec<ParamInfo> {
    params
        .iter()
        .map(|p| ParamInfo {
            name: p.name.clone(),
            ty: normalize(p.type_ann.as_ref(), options),
            default_value: p.default_value.as_ref().and_then(Expr::literal_value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Lexer;
    use crate::compiler::parser::Parser;
    use steep_core::{TypeSpec, TypeTag};

    fn class_of(src: &str) -> ClassDecl {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        match program.items.into_iter().next() {
            Some(Item::Class(c)) => c,
            other => panic!("expected class, got {:?}", other),
        }
    }

    fn extract(src: &str) -> Result<ExtractedClass, CompileError> {
        extract_class(class_of(src), &CompileOptions::default())
    }

    fn method<'a>(decl: &'a ClassDecl, key: &str, kind: MethodKind) -> Option<&'a MethodDef> {
        decl.members.iter().find_map(|m| match m {
            ClassMember::Method(m) if m.name.key() == key && m.kind == kind => Some(m),
            _ => None,
        })
    }

    #[test]
    fn test_plain_property_moves_to_synthesized_hook() {
        let out = extract("class A { x: number = 5 }").unwrap();
        let x = out.registry.member("x").unwrap();
        assert_eq!(x.field_type(), Some(&TypeSpec::Single(TypeTag::Number)));
        assert!(x.has(&Decorator::Pure));
        assert!(!out.decl.members.iter().any(|m| m.name().key() == "x"));

        let hook = method(&out.decl, ON_DEPLOYED, MethodKind::Method).unwrap();
        assert_eq!(hook.body.len(), 1);
        let deployed = out.registry.member(ON_DEPLOYED).unwrap();
        assert_eq!(deployed.decorators.iter().map(|d| d.name()).collect::<Vec<_>>(), vec!["payable"]);
    }

    #[test]
    fn test_state_property_becomes_accessors() {
        let out = extract("class A { @state y: number = 0 }").unwrap();
        let getter = method(&out.decl, "y", MethodKind::Getter).unwrap();
        match &getter.body[0] {
            Stmt::Return(Some(Expr::Call(_, args, _)), _) => {
                assert!(matches!(&args[0], Expr::Str(k, _) if k == "y"));
                assert!(matches!(&args[1], Expr::Number(n, _) if n == "0"));
            }
            other => panic!("unexpected getter body {:?}", other),
        }
        assert!(method(&out.decl, "y", MethodKind::Setter).is_some());
        let info = out.registry.member("y").unwrap();
        assert!(info.has(&Decorator::State) && info.has(&Decorator::View));
        // the initializer also runs in the deploy hook
        assert_eq!(method(&out.decl, ON_DEPLOYED, MethodKind::Method).unwrap().body.len(), 1);
    }

    #[test]
    fn test_state_without_initializer_defaults_to_undefined() {
        let out = extract("class A { @state owner }").unwrap();
        let getter = method(&out.decl, "owner", MethodKind::Getter).unwrap();
        match &getter.body[0] {
            Stmt::Return(Some(Expr::Call(_, args, _)), _) => assert!(matches!(&args[1], Expr::Ident(n, _) if n == "undefined")),
            other => panic!("unexpected getter body {:?}", other),
        }
        assert!(method(&out.decl, ON_DEPLOYED, MethodKind::Method).is_none());
        assert!(out.registry.member(ON_DEPLOYED).is_none());
    }

    #[test]
    fn test_constructor_renamed_and_inits_prepended_in_order() {
        let out = extract("class A extends B { a = 1\n b = 2\n constructor(x) { super(x); this.c = x } }").unwrap();
        let hook = method(&out.decl, ON_DEPLOYED, MethodKind::Method).unwrap();
        assert_eq!(hook.body.len(), 4);
        let assigned: Vec<String> = hook.body[..2].iter().map(|s| match s {
            Stmt::Expr(Expr::Assign(target, _, _, _), _) => match &**target {
                Expr::Member(_, name, _) => name.key(),
                other => panic!("unexpected target {:?}", other),
            },
            other => panic!("unexpected stmt {:?}", other),
        }).collect();
        assert_eq!(assigned, vec!["a", "b"]);
        match &hook.body[2] {
            Stmt::Expr(Expr::Call(callee, args, _), _) => {
                assert!(matches!(&**callee, Expr::Member(obj, MemberName::Public(n), _) if matches!(**obj, Expr::Super(_)) && n == ON_DEPLOYED));
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected super hook call, got {:?}", other),
        }
        // constructor-derived hook keeps the method default
        assert!(out.registry.member(ON_DEPLOYED).unwrap().has(&Decorator::View));
    }

    #[test]
    fn test_reserved_names_rejected() {
        for src in ["class A { __on_received() {} }", "class A { __on_deployed() {} }", "class A { constructor() {} constructor() {} }"] {
            assert!(matches!(extract(src), Err(CompileError::ReservedLifecycleName { .. })), "{}", src);
        }
    }

    #[test]
    fn test_on_received_alias_and_stripping() {
        let out = extract("class A { @onReceived @payable @logged receive() {} }").unwrap();
        assert_eq!(out.registry.alias(names::ON_RECEIVED), Some("receive"));
        let m = method(&out.decl, "receive", MethodKind::Method).unwrap();
        assert_eq!(m.decorators.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(), vec!["logged"]);
        let info = out.registry.member("receive").unwrap();
        assert!(info.has(&Decorator::Custom("logged".into())));
        assert!(info.has(&Decorator::Payable) && !info.has(&Decorator::View));
    }

    #[test]
    fn test_function_valued_property_is_method_entry() {
        let out = extract("class A { add = (a: number, b = 2): number => a + b }").unwrap();
        let info = out.registry.member("add").unwrap();
        assert!(info.is_method());
        assert!(info.has(&Decorator::View));
        assert_eq!(info.return_type(), Some(&TypeSpec::Single(TypeTag::Number)));
        assert_eq!(info.params()[1].default_value, Some(serde_json::json!(2)));
        assert_eq!(info.params()[1].ty, TypeSpec::Any);
    }

    #[test]
    fn test_private_property_keeps_bare_declaration() {
        let out = extract("class A { #secret = 1 }").unwrap();
        match &out.decl.members[1] {
            ClassMember::Property(p) => {
                assert_eq!(p.name.key(), "#secret");
                assert!(p.value.is_none());
            }
            other => panic!("expected bare private declaration, got {:?}", other),
        }
        assert!(out.registry.member("#secret").is_some());
    }

    #[test]
    fn test_first_writer_wins_for_accessor_pair() {
        let out = extract("class A { get total(): number { return 1 } set total(v: string) {} }").unwrap();
        let info = out.registry.member("total").unwrap();
        assert_eq!(info.return_type(), Some(&TypeSpec::Single(TypeTag::Number)));
        assert!(info.params().is_empty());
    }
}
