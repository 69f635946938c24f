//! Compilation unit controller.
//!
//! Drives one unit through `Idle -> Collecting -> Merging -> Emitting -> Idle`.
//! All accumulated state lives in [`CompilationState`], owned by the
//! controller and cleared whenever a unit finishes, whether it succeeded or not.

use crate::compiler::ast::*;
use crate::compiler::emit::{emit_program, value_to_expr};
use crate::compiler::extract::extract_class;
use crate::compiler::inherit::{merge, resolve_chain};
use crate::compiler::tokens::Span;
use crate::{source_hash, CompileError, CompileOptions};
use std::collections::HashMap;
use steep_core::names::{CONTRACT, METADATA};
use steep_core::ContractRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Collecting,
    Merging,
    Emitting,
}

/// Accumulator for one compilation unit.
#[derive(Debug, Default)]
pub struct CompilationState {
    pub contract_decorators: usize,
    pub contract_name: Option<String>,
    /// Per-class registries, before ancestors are merged in.
    pub registries: HashMap<String, ContractRegistry>,
    /// Child class name to the name it extends.
    pub parents: HashMap<String, String>,
}

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub contract_name: String,
    pub registry: ContractRegistry,
    /// Rewritten program, ending with the `__contract` and `__metadata` statements.
    pub program: Program,
    pub source_hash: String,
}

impl CompiledUnit {
    /// The rewritten program as JavaScript source.
    pub fn source(&self) -> String {
        emit_program(&self.program)
    }
}

pub struct UnitController {
    options: CompileOptions,
    phase: Phase,
    state: CompilationState,
}

impl UnitController {
    pub fn new(options: CompileOptions) -> Self {
        Self { options, phase: Phase::Idle, state: CompilationState::default() }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &CompilationState {
        &self.state
    }

    /// Compile one unit. The controller is back in `Idle` with empty state
    /// afterwards, on success and on failure alike.
    pub fn compile(&mut self, program: Program) -> Result<CompiledUnit, CompileError> {
        let result = self.run(program);
        let finished = std::mem::take(&mut self.state);
        self.enter(Phase::Idle);
        tracing::debug!(classes = finished.registries.len(), ok = result.is_ok(), "compilation unit finished");
        result
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "compile phase");
        self.phase = phase;
    }

    fn run(&mut self, program: Program) -> Result<CompiledUnit, CompileError> {
        self.count_contract_decorators(&program)?;
        self.enter(Phase::Collecting);

        let Program { items, span } = program;
        let mut rewritten = Vec::with_capacity(items.len() + 2);
        for item in items {
            match item {
                Item::Class(class) => rewritten.push(Item::Class(self.collect_class(class)?)),
                stmt => rewritten.push(stmt),
            }
        }

        self.enter(Phase::Merging);
        let contract = self
            .state
            .contract_name
            .clone()
            .ok_or_else(|| CompileError::MissingContractDecorator { decorator: self.options.contract_decorator.clone() })?;
        let chain = resolve_chain(&contract, &self.state.parents)?;
        let registry = merge(&chain, &self.state.registries);

        self.enter(Phase::Emitting);
        rewritten.push(const_stmt(CONTRACT, Expr::New(Box::new(Expr::Ident(contract.clone(), span)), vec![], span), span));
        rewritten.push(const_stmt(METADATA, value_to_expr(&registry.to_json()), span));
        let program = Program { items: rewritten, span };
        let hash = source_hash(&emit_program(&program));
        Ok(CompiledUnit { contract_name: contract, registry, program, source_hash: hash })
    }

    /// Exactly one class in the unit may carry the contract decorator.
    fn count_contract_decorators(&mut self, program: &Program) -> Result<(), CompileError> {
        let marker = self.options.contract_decorator.as_str();
        let marks: Vec<&DecoratorRef> = program
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Class(c) => Some(c.decorators.iter().filter(|d| d.name == marker)),
                Item::Stmt(_) => None,
            })
            .flatten()
            .collect();
        self.state.contract_decorators = marks.len();
        match marks.as_slice() {
            [] => Err(CompileError::MissingContractDecorator { decorator: marker.to_string() }),
            [_] => Ok(()),
            [_, second, ..] => Err(CompileError::MultipleContractDecorators {
                decorator: marker.to_string(), count: marks.len(),
                line: second.span.line, col: second.span.col,
            }),
        }
    }

    fn collect_class(&mut self, mut class: ClassDecl) -> Result<ClassDecl, CompileError> {
        let marker = self.options.contract_decorator.as_str();
        let before = class.decorators.len();
        class.decorators.retain(|d| d.name != marker);
        if class.decorators.len() != before {
            self.state.contract_name = Some(class.name.clone());
        }
        if let Some(ref parent) = class.superclass {
            self.state.parents.insert(class.name.clone(), parent.clone());
        }

        let extracted = extract_class(class, &self.options)?;
        let name = extracted.decl.name.clone();
        tracing::debug!(class = %name, entries = extracted.registry.len(), "collected class");
        match self.state.registries.get_mut(&name) {
            Some(existing) => existing.inherit(&extracted.registry),
            None => { self.state.registries.insert(name, extracted.registry); }
        }
        Ok(extracted.decl)
    }
}

fn const_stmt(name: &str, init: Expr, span: Span) -> Item {
    Item::Stmt(Stmt::Var(VarDecl { kind: VarKind::Const, name: name.to_string(), type_ann: None, init: Some(init), span }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use steep_core::Decorator;

    fn controller() -> UnitController {
        UnitController::new(CompileOptions::default())
    }

    #[test]
    fn test_compile_appends_contract_and_metadata() {
        let mut ctl = controller();
        let unit = ctl.compile(parse("@contract class Counter { @state count: number = 0 }").unwrap()).unwrap();
        assert_eq!(unit.contract_name, "Counter");
        let src = unit.source();
        assert!(src.contains("const __contract = new Counter();"), "{}", src);
        assert!(src.contains("const __metadata = {"), "{}", src);
        assert!(!src.contains("@contract"), "{}", src);
        assert!(unit.registry.member("count").unwrap().has(&Decorator::State));
    }

    #[test]
    fn test_state_cleared_after_success_and_failure() {
        let mut ctl = controller();
        ctl.compile(parse("@contract class A extends B { x = 1 }\nclass B { y = 2 }").unwrap()).unwrap();
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(ctl.state().registries.is_empty() && ctl.state().parents.is_empty());

        let err = ctl.compile(parse("@contract class A { @view x = 1 }").unwrap()).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPropertyDecorator { .. }));
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(ctl.state().contract_name.is_none());
        assert_eq!(ctl.state().contract_decorators, 0);
    }

    #[test]
    fn test_contract_decorator_count() {
        let mut ctl = controller();
        let err = ctl.compile(parse("class A {}").unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Your smart contract does not have @contract.");

        let err = ctl.compile(parse("@contract class A {}\n@contract class B {}").unwrap()).unwrap_err();
        assert!(matches!(err, CompileError::MultipleContractDecorators { count: 2, line: 2, .. }));
        assert_eq!(err.to_string(), "Your smart contract has more than one @contract.");
    }

    #[test]
    fn test_custom_contract_decorator_name() {
        let opts = CompileOptions { contract_decorator: "deployable".into(), ..CompileOptions::default() };
        let unit = UnitController::new(opts).compile(parse("@deployable class A { run() {} }").unwrap()).unwrap();
        assert_eq!(unit.contract_name, "A");
    }

    #[test]
    fn test_inherited_members_merged() {
        let unit = controller()
            .compile(parse("class Base { @transaction withdraw() {} owner = 1 }\n@contract class Vault extends Base { owner: string = \"me\" }").unwrap())
            .unwrap();
        assert!(unit.registry.member("withdraw").unwrap().has(&Decorator::Transaction));
        let owner = unit.registry.member("owner").unwrap();
        assert_eq!(owner.field_type().map(|t| t.to_string()), Some("string".to_string()));
    }

    #[test]
    fn test_inheritance_cycle_rejected() {
        let err = controller()
            .compile(parse("@contract class A extends B {}\nclass B extends A {}").unwrap())
            .unwrap_err();
        assert!(matches!(err, CompileError::InheritanceCycle { .. }));
    }
}
