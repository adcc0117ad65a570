//! Error types for the analysis passes.

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::Ty;

/// Error type for name resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum ScopeError {
    /// A name declared twice in the same frame.
    #[error("redefinition of `{name}` in the same scope")]
    #[diagnostic(code(tacc::scope::redefinition))]
    Redefinition {
        /// The redeclared name.
        name: String,
    },
    /// An identifier that no visible frame declares.
    #[error("undeclared variable `{name}`")]
    #[diagnostic(code(tacc::scope::undeclared_var))]
    UndeclaredVar {
        /// The unresolved name.
        name: String,
    },
    /// A call whose callee is unresolved or not a function.
    #[error("call of undefined function `{name}`")]
    #[diagnostic(code(tacc::scope::undefined_function))]
    UndefinedFunction {
        /// The callee name.
        name: String,
    },
}

/// Error type for type checking.
#[derive(Debug, Error, Diagnostic)]
pub enum TypeError {
    /// Two types were required to agree and do not.
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    #[diagnostic(code(tacc::types::mismatch))]
    Mismatch {
        /// The required type.
        expected: Ty,
        /// The type actually found.
        found: Ty,
    },
    /// An `if`/`while`/`for` condition that is not `bool`.
    #[error("condition of `{stmt}` must be `bool`, found `{found}`")]
    #[diagnostic(code(tacc::types::non_bool_condition))]
    NonBoolCondition {
        /// The statement keyword.
        stmt: &'static str,
        /// The condition's type.
        found: Ty,
    },
    /// An operator applied to operands outside its domain.
    #[error("invalid operand for `{op}`")]
    #[diagnostic(code(tacc::types::bad_operand))]
    BadOperand {
        /// The operator lexeme.
        op: String,
    },
    /// A call with the wrong number of arguments.
    #[error("function `{name}` takes {expected} argument(s), {found} given")]
    #[diagnostic(code(tacc::types::call_arity))]
    CallArity {
        /// The callee name.
        name: String,
        /// Declared parameter count.
        expected: usize,
        /// Argument count at the call site.
        found: usize,
    },
    /// A call of a function no signature is known for.
    #[error("undefined function `{name}`")]
    #[diagnostic(code(tacc::types::undefined_function))]
    UndefinedFunction {
        /// The callee name.
        name: String,
    },
    /// A function or variable declared twice.
    #[error("redefinition of `{name}`")]
    #[diagnostic(code(tacc::types::redefinition))]
    Redefinition {
        /// The redeclared name.
        name: String,
    },
    /// A `return` whose expression does not match the declared type.
    #[error("return type mismatch: function returns `{expected}`, found `{found}`")]
    #[diagnostic(code(tacc::types::return_mismatch))]
    ReturnMismatch {
        /// The declared return type.
        expected: Ty,
        /// The returned type (`void` for a bare `return`).
        found: Ty,
    },
    /// A name used as a value that no variable binding covers.
    #[error("undeclared variable `{name}` in expression")]
    #[diagnostic(code(tacc::types::undeclared_var))]
    UndeclaredVariable {
        /// The unresolved name.
        name: String,
    },
}
