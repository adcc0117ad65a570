//! Name resolution.
//!
//! A single traversal over the AST maintaining a stack of symbol tables.
//! Frames open at the root, at each function body, and at each block.
//! The pass only validates; it decorates nothing.

use nolog::*;

use crate::analysis::error::ScopeError;
use crate::analysis::symtable::ChainMap;
use crate::ast;

/// What a name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A top-level function.
    Function,
    /// A variable or parameter.
    Variable,
}

/// Name resolution pass. One instance checks one program.
pub struct ScopeAnalyzer {
    symbols: ChainMap<String, SymbolKind>,
}

impl ScopeAnalyzer {
    /// Create a new analyzer with an empty scope stack.
    pub fn new() -> Self {
        Self {
            symbols: ChainMap::new(),
        }
    }

    /// Validate every declaration and use in `program`.
    ///
    /// All top-level function names are registered in the root frame
    /// before any body is walked, so mutually recursive sibling
    /// functions resolve.
    pub fn analyze(mut self, program: &ast::Program) -> Result<(), ScopeError> {
        self.symbols.push();
        for func in &program.funcs {
            self.declare(&func.name, SymbolKind::Function)?;
        }
        for func in &program.funcs {
            self.analyze_function(func)?;
        }
        self.symbols.pop();
        Ok(())
    }

    fn declare(&mut self, name: &str, kind: SymbolKind) -> Result<(), ScopeError> {
        trace!("SCP " => "declare {:?} `{}` at depth {}", kind, name, self.symbols.depth());
        if self.symbols.insert(name.to_string(), kind).is_some() {
            return Err(ScopeError::Redefinition {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn analyze_function(&mut self, func: &ast::FunctionDecl) -> Result<(), ScopeError> {
        trace!("SCP " => "function `{}`", func.name);
        self.symbols.push();
        for param in &func.params {
            self.declare(&param.name, SymbolKind::Variable)?;
        }
        self.analyze_block(&func.body)?;
        self.symbols.pop();
        Ok(())
    }

    fn analyze_block(&mut self, block: &ast::Block) -> Result<(), ScopeError> {
        self.symbols.push();
        for stmt in &block.stmts {
            self.analyze_stmt(stmt)?;
        }
        self.symbols.pop();
        Ok(())
    }

    fn analyze_stmt(&mut self, stmt: &ast::Stmt) -> Result<(), ScopeError> {
        match stmt {
            ast::Stmt::VarDecl { name, init, .. } => {
                self.declare(name, SymbolKind::Variable)?;
                if let Some(init) = init {
                    self.analyze_expr(init)?;
                }
                Ok(())
            }
            ast::Stmt::Assign { target, value } => {
                match target {
                    ast::AssignTarget::Var(name) => self.resolve(name)?,
                    ast::AssignTarget::Elem { array, index } => {
                        self.resolve(array)?;
                        self.analyze_expr(index)?;
                    }
                }
                self.analyze_expr(value)
            }
            ast::Stmt::If { cond, then, els } => {
                self.analyze_expr(cond)?;
                self.analyze_block(then)?;
                if let Some(els) = els {
                    self.analyze_block(els)?;
                }
                Ok(())
            }
            ast::Stmt::While { cond, body } => {
                self.analyze_expr(cond)?;
                self.analyze_block(body)
            }
            // The `for` header has no frame of its own: an initializer
            // declaration lands in the enclosing frame.
            ast::Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.analyze_stmt(init)?;
                }
                if let Some(cond) = cond {
                    self.analyze_expr(cond)?;
                }
                if let Some(update) = update {
                    self.analyze_stmt(update)?;
                }
                self.analyze_stmt(body)
            }
            ast::Stmt::Return { expr } => match expr {
                Some(expr) => self.analyze_expr(expr),
                None => Ok(()),
            },
            ast::Stmt::Expr { expr } => self.analyze_expr(expr),
            ast::Stmt::Block { block } => self.analyze_block(block),
        }
    }

    fn resolve(&self, name: &str) -> Result<(), ScopeError> {
        if self.symbols.get(name).is_none() {
            return Err(ScopeError::UndeclaredVar {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn analyze_expr(&mut self, expr: &ast::Expr) -> Result<(), ScopeError> {
        match expr {
            ast::Expr::Literal(_) => Ok(()),
            ast::Expr::Var(name) => self.resolve(name),
            ast::Expr::Unary { expr, .. } => self.analyze_expr(expr),
            ast::Expr::Binary { lhs, rhs, .. } => {
                self.analyze_expr(lhs)?;
                self.analyze_expr(rhs)
            }
            ast::Expr::Prefix { target, .. } | ast::Expr::Postfix { target, .. } => {
                self.resolve(target)
            }
            ast::Expr::Call { func, args } => {
                if self.symbols.get(func) != Some(&SymbolKind::Function) {
                    return Err(ScopeError::UndefinedFunction {
                        name: func.to_string(),
                    });
                }
                for arg in args {
                    self.analyze_expr(arg)?;
                }
                Ok(())
            }
            ast::Expr::Index { array, index } => {
                self.resolve(array)?;
                self.analyze_expr(index)
            }
        }
    }
}

impl Default for ScopeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn analyze(src: &str) -> Result<(), ScopeError> {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        ScopeAnalyzer::new().analyze(&program)
    }

    #[test]
    fn undeclared_variable_is_rejected() {
        let err = analyze("fn int u() { return y; }").unwrap_err();
        assert!(matches!(err, ScopeError::UndeclaredVar { name } if name == "y"));
    }

    #[test]
    fn declaration_makes_a_name_visible() {
        analyze("fn int f() { int x = 1; return x; }").unwrap();
    }

    #[test]
    fn parameters_are_visible_in_the_body() {
        analyze("fn int f(int a, int b) { return a + b; }").unwrap();
    }

    #[test]
    fn same_frame_redefinition_is_rejected() {
        let err = analyze("fn int f() { int x = 1; int x = 2; return x; }").unwrap_err();
        assert!(matches!(err, ScopeError::Redefinition { name } if name == "x"));
    }

    #[test]
    fn shadowing_an_outer_frame_is_legal() {
        analyze("fn int f(int x) { int y = x; { int x = 2; y = x; } return y; }").unwrap();
    }

    #[test]
    fn block_locals_expire_with_their_frame() {
        let err = analyze("fn int f() { { int x = 1; } return x; }").unwrap_err();
        assert!(matches!(err, ScopeError::UndeclaredVar { name } if name == "x"));
    }

    #[test]
    fn call_resolves_to_a_function_symbol() {
        analyze("fn int one() { return 1; } fn int f() { return one(); }").unwrap();

        let err = analyze("fn int f() { return g(); }").unwrap_err();
        assert!(matches!(err, ScopeError::UndefinedFunction { name } if name == "g"));

        // A variable is not callable.
        let err = analyze("fn int f() { int g = 1; return g(); }").unwrap_err();
        assert!(matches!(err, ScopeError::UndefinedFunction { .. }));
    }

    #[test]
    fn sibling_functions_may_call_forward() {
        analyze("fn int f() { return g(); } fn int g() { return 1; }").unwrap();
    }

    #[test]
    fn duplicate_function_names_are_rejected() {
        let err = analyze("fn int f() { return 1; } fn int f() { return 2; }").unwrap_err();
        assert!(matches!(err, ScopeError::Redefinition { name } if name == "f"));
    }

    #[test]
    fn for_initializer_declares_into_the_enclosing_frame() {
        // The loop variable outlives the loop...
        analyze("fn int f() { int s = 0; for (int i = 0; i < 3; i++) { s = s + i; } return i; }")
            .unwrap();
        // ...so two sibling loops reusing the name collide.
        let err = analyze(
            "fn int f() { for (int i = 0; i < 3; i++) { } for (int i = 0; i < 3; i++) { } return 0; }",
        )
        .unwrap_err();
        assert!(matches!(err, ScopeError::Redefinition { name } if name == "i"));
    }

    #[test]
    fn step_targets_must_resolve() {
        let err = analyze("fn int f() { q++; return 0; }").unwrap_err();
        assert!(matches!(err, ScopeError::UndeclaredVar { name } if name == "q"));
    }

    #[test]
    fn subscript_resolves_array_and_index() {
        analyze("fn int f(int a, int i) { a[i] = a[i + 1]; return a[0]; }").unwrap();
        let err = analyze("fn int f(int i) { return a[i]; }").unwrap_err();
        assert!(matches!(err, ScopeError::UndeclaredVar { name } if name == "a"));
    }
}
