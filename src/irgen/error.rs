//! Error type for the IR generator.

use miette::Diagnostic;
use thiserror::Error;

/// Error type for the IR generator.
#[derive(Debug, Error, Diagnostic)]
pub enum IrError {
    /// A structural invariant the earlier passes guarantee was violated,
    /// i.e. the caller fed a hand-built AST straight to lowering.
    #[error("malformed AST: {message}")]
    #[diagnostic(code(tacc::ir::malformed_ast))]
    MalformedAst {
        /// What was violated.
        message: String,
    },
}
