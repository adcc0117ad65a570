//! Semantic analysis.
//!
//! Two independent traversals over the parsed AST: name resolution
//! ([`ScopeAnalyzer`]) and type checking ([`TypeChecker`]). Both keep a
//! stack of per-frame tables ([`symtable::ChainMap`]); neither rewrites
//! the AST.

pub mod error;
pub mod scope;
pub mod symtable;
pub mod types;

pub use self::error::{ScopeError, TypeError};
pub use self::scope::ScopeAnalyzer;
pub use self::types::TypeChecker;
