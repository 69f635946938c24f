pub mod ast;
pub mod decorators;
pub mod emit;
pub mod extract;
pub mod inherit;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod tokens;
pub mod unit;
