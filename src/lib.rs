//! A compiler front-end for a small statically-typed C-like language.
//!
//! The pipeline turns source text into three-address code (TAC):
//! lexing, parsing, name resolution, type checking, and lowering. Each
//! pass either succeeds with its output or fails with the first
//! violation; no pass rewrites the AST.
#![deny(missing_docs)]

pub mod analysis;
pub mod ast;
pub mod irgen;
pub mod lexer;
pub mod parser;

use miette::Result;

/// Parse source text into an AST.
pub fn parse(input: &str) -> Result<ast::Program> {
    let tokens = lexer::Lexer::new(input).tokenize()?;
    let program = parser::Parser::new(tokens).parse_program()?;
    Ok(program)
}

/// Validate a parsed program: name resolution, then type checking.
pub fn check(program: &ast::Program) -> Result<()> {
    analysis::ScopeAnalyzer::new().analyze(program)?;
    analysis::TypeChecker::new().check(program)?;
    Ok(())
}

/// Compile source text to TAC.
pub fn compile(input: &str) -> Result<Vec<irgen::tac::Instruction>> {
    let program = parse(input)?;
    check(&program)?;
    let instructions = irgen::IrGenerator::new().generate(&program)?;
    Ok(instructions)
}
