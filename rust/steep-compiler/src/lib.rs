//! Steep Compiler
//!
//! Compiles a decorated contract class into a metadata registry and a rewritten
//! program whose state properties are backed by an external store.

pub mod compiler;
pub mod config;
pub mod diagnostics;

pub use compiler::unit::{CompilationState, CompiledUnit, Phase, UnitController};

use compiler::ast::Program;
use compiler::lexer::Lexer;
use compiler::parser::Parser;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

// ── Compile options ─────────────────────────────────────────────────

/// Options for one compilation. Loadable from the `[compiler]` table of
/// `steep.toml`, see [`config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Normalize the annotation `address` to the `address` tag instead of `any`.
    pub recognize_address_type: bool,
    /// Class decorator that marks the deployable contract.
    pub contract_decorator: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { recognize_address_type: false, contract_decorator: "contract".to_string() }
    }
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[from] compiler::lexer::LexError),
    #[error("parse error: {0}")]
    Parse(#[from] compiler::parser::ParseError),
    #[error("Your smart contract does not have @{decorator}.")]
    MissingContractDecorator { decorator: String },
    #[error("Your smart contract has more than one @{decorator}.")]
    MultipleContractDecorators { decorator: String, count: usize, line: usize, col: usize },
    #[error("Only @state, @pure for property")]
    InvalidPropertyDecorator { member: String, decorator: String, line: usize, col: usize },
    #[error("function cannot be decorated as @state")]
    StateOnFunctionMember { member: String, line: usize, col: usize },
    #[error("{name} cannot be specified directly.")]
    ReservedLifecycleName { name: String, line: usize, col: usize },
    #[error("Private function cannot be payable")]
    PrivatePayableConflict { member: String, line: usize, col: usize },
    #[error("inheritance cycle: {}", chain.join(" -> "))]
    InheritanceCycle { chain: Vec<String> },
}

impl CompileError {
    /// Stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Lex(_) => "E001",
            CompileError::Parse(_) => "E002",
            CompileError::MissingContractDecorator { .. } => "E101",
            CompileError::MultipleContractDecorators { .. } => "E102",
            CompileError::InvalidPropertyDecorator { .. } => "E201",
            CompileError::StateOnFunctionMember { .. } => "E202",
            CompileError::ReservedLifecycleName { .. } => "E203",
            CompileError::PrivatePayableConflict { .. } => "E204",
            CompileError::InheritanceCycle { .. } => "E301",
        }
    }

    /// 1-based (line, col) of the offending node, when one exists.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            CompileError::Lex(e) => Some(e.position()),
            CompileError::Parse(e) => Some(e.position()),
            CompileError::MultipleContractDecorators { line, col, .. }
            | CompileError::InvalidPropertyDecorator { line, col, .. }
            | CompileError::StateOnFunctionMember { line, col, .. }
            | CompileError::ReservedLifecycleName { line, col, .. }
            | CompileError::PrivatePayableConflict { line, col, .. } => Some((*line, *col)),
            CompileError::MissingContractDecorator { .. } | CompileError::InheritanceCycle { .. } => None,
        }
    }
}

// ── Entry points ────────────────────────────────────────────────────

/// `sha256:<hex>` digest of a source text.
pub fn source_hash(text: &str) -> String {
    format!("sha256:{:x}", Sha256::digest(text.as_bytes()))
}

/// Lex and parse contract source without transforming it.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let tokens = Lexer::new(source).tokenize()?;
    Ok(Parser::new(tokens).parse_program()?)
}

/// Compile contract source with default options.
pub fn compile(source: &str) -> Result<CompiledUnit, CompileError> {
    compile_with_options(source, &CompileOptions::default())
}

pub fn compile_with_options(source: &str, options: &CompileOptions) -> Result<CompiledUnit, CompileError> {
    let program = parse(source)?;
    let mut unit = compile_program(program, options)?;
    unit.source_hash = source_hash(source);
    Ok(unit)
}

/// Compile an already parsed program. The source hash covers the emitted output.
pub fn compile_program(program: Program, options: &CompileOptions) -> Result<CompiledUnit, CompileError> {
    UnitController::new(options.clone()).compile(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_hash_format() {
        let h = source_hash("class A {}");
        assert!(h.starts_with("sha256:"));
        assert_eq!(h.len(), "sha256:".len() + 64);
        assert_eq!(h, source_hash("class A {}"));
    }

    #[test]
    fn test_error_codes_and_positions() {
        let err = CompileError::PrivatePayableConflict { member: "#pay".into(), line: 3, col: 5 };
        assert_eq!(err.code(), "E204");
        assert_eq!(err.position(), Some((3, 5)));
        assert_eq!(err.to_string(), "Private function cannot be payable");

        let err = CompileError::MissingContractDecorator { decorator: "contract".into() };
        assert_eq!(err.to_string(), "Your smart contract does not have @contract.");
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_compile_sets_source_hash_of_input() {
        let src = "@contract class A { @view hello() { return 1 } }";
        let unit = compile(src).unwrap();
        assert_eq!(unit.source_hash, source_hash(src));
    }

    #[test]
    fn test_lex_errors_surface() {
        assert!(matches!(compile("@contract class A { x = \"oops }"), Err(CompileError::Lex(_))));
    }
}
