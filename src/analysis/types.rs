//! Type checking.
//!
//! A traversal parallel to name resolution: a stack of name→type tables
//! plus a global function signature table. Every signature is registered
//! before any body is checked, so forward references between sibling
//! functions are permitted.

use std::collections::HashMap;

use nolog::*;

use crate::analysis::error::TypeError;
use crate::analysis::symtable::ChainMap;
use crate::ast;
use crate::ast::Ty;

/// Declared shape of a function: return type and parameter types in order.
#[derive(Debug, Clone)]
pub struct Signature {
    /// Declared return type.
    pub ret: Ty,
    /// Parameter types in declaration order.
    pub params: Vec<Ty>,
}

/// The sole implicit conversion: `int` widens to `float`.
fn assignable(to: Ty, from: Ty) -> bool {
    to == from || (to == Ty::Float && from == Ty::Int)
}

/// Result type of arithmetic over two numeric operands.
fn promote(lhs: Ty, rhs: Ty) -> Ty {
    if lhs == Ty::Float || rhs == Ty::Float {
        Ty::Float
    } else {
        Ty::Int
    }
}

/// Type checking pass. One instance checks one program.
pub struct TypeChecker {
    vars: ChainMap<String, Ty>,
    functions: HashMap<String, Signature>,
}

impl TypeChecker {
    /// Create a new checker with empty tables.
    pub fn new() -> Self {
        Self {
            vars: ChainMap::new(),
            functions: HashMap::new(),
        }
    }

    /// Check every declaration, statement and expression in `program`.
    pub fn check(mut self, program: &ast::Program) -> Result<(), TypeError> {
        for func in &program.funcs {
            let sig = Signature {
                ret: func.ret_ty,
                params: func.params.iter().map(|p| p.ty).collect(),
            };
            trace!("TYP " => "register `{}`: {:?}", func.name, sig);
            if self.functions.insert(func.name.clone(), sig).is_some() {
                return Err(TypeError::Redefinition {
                    name: func.name.clone(),
                });
            }
        }
        for func in &program.funcs {
            self.check_function(func)?;
        }
        Ok(())
    }

    fn check_function(&mut self, func: &ast::FunctionDecl) -> Result<(), TypeError> {
        self.vars.push();
        for param in &func.params {
            if self.vars.insert(param.name.clone(), param.ty).is_some() {
                return Err(TypeError::Redefinition {
                    name: param.name.clone(),
                });
            }
        }
        self.check_block(&func.body, func.ret_ty)?;
        self.vars.pop();
        Ok(())
    }

    fn check_block(&mut self, block: &ast::Block, ret: Ty) -> Result<(), TypeError> {
        self.vars.push();
        for stmt in &block.stmts {
            self.check_stmt(stmt, ret)?;
        }
        self.vars.pop();
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &ast::Stmt, ret: Ty) -> Result<(), TypeError> {
        match stmt {
            ast::Stmt::VarDecl { ty, name, init } => {
                if self.vars.insert(name.clone(), *ty).is_some() {
                    return Err(TypeError::Redefinition { name: name.clone() });
                }
                if let Some(init) = init {
                    let found = self.type_of(init)?;
                    if !assignable(*ty, found) {
                        return Err(TypeError::Mismatch {
                            expected: *ty,
                            found,
                        });
                    }
                }
                Ok(())
            }
            ast::Stmt::Assign { target, value } => {
                let expected = match target {
                    ast::AssignTarget::Var(name) => self.var_type(name)?,
                    ast::AssignTarget::Elem { array, index } => {
                        let elem = self.var_type(array)?;
                        let index = self.type_of(index)?;
                        if index != Ty::Int {
                            return Err(TypeError::BadOperand {
                                op: "[]".to_string(),
                            });
                        }
                        elem
                    }
                };
                let found = self.type_of(value)?;
                if !assignable(expected, found) {
                    return Err(TypeError::Mismatch { expected, found });
                }
                Ok(())
            }
            ast::Stmt::If { cond, then, els } => {
                self.check_cond(cond, "if")?;
                self.check_block(then, ret)?;
                if let Some(els) = els {
                    self.check_block(els, ret)?;
                }
                Ok(())
            }
            ast::Stmt::While { cond, body } => {
                self.check_cond(cond, "while")?;
                self.check_block(body, ret)
            }
            ast::Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.check_stmt(init, ret)?;
                }
                if let Some(cond) = cond {
                    self.check_cond(cond, "for")?;
                }
                if let Some(update) = update {
                    self.check_stmt(update, ret)?;
                }
                self.check_stmt(body, ret)
            }
            ast::Stmt::Return { expr } => {
                let found = match expr {
                    Some(expr) => self.type_of(expr)?,
                    None => Ty::Void,
                };
                if !assignable(ret, found) {
                    return Err(TypeError::ReturnMismatch {
                        expected: ret,
                        found,
                    });
                }
                Ok(())
            }
            ast::Stmt::Expr { expr } => {
                self.type_of(expr)?;
                Ok(())
            }
            ast::Stmt::Block { block } => self.check_block(block, ret),
        }
    }

    fn check_cond(&mut self, cond: &ast::Expr, stmt: &'static str) -> Result<(), TypeError> {
        let found = self.type_of(cond)?;
        if found != Ty::Bool {
            return Err(TypeError::NonBoolCondition { stmt, found });
        }
        Ok(())
    }

    fn var_type(&self, name: &str) -> Result<Ty, TypeError> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| TypeError::UndeclaredVariable {
                name: name.to_string(),
            })
    }

    /// The type of an expression, or the first violation inside it.
    /// Operands are visited left to right.
    fn type_of(&mut self, expr: &ast::Expr) -> Result<Ty, TypeError> {
        match expr {
            ast::Expr::Literal(lit) => Ok(lit.ty()),
            ast::Expr::Var(name) => self.var_type(name),
            ast::Expr::Unary { op, expr } => {
                let ty = self.type_of(expr)?;
                let ok = match op {
                    ast::UnaryOp::Not => ty == Ty::Bool,
                    ast::UnaryOp::Pos | ast::UnaryOp::Neg => ty.is_numeric(),
                };
                if !ok {
                    return Err(TypeError::BadOperand { op: op.to_string() });
                }
                Ok(ty)
            }
            ast::Expr::Binary { op, lhs, rhs } => {
                let lhs = self.type_of(lhs)?;
                let rhs = self.type_of(rhs)?;
                self.unify_binary(*op, lhs, rhs)
            }
            ast::Expr::Prefix { op, target } | ast::Expr::Postfix { op, target } => {
                let ty = self.var_type(target)?;
                if !ty.is_numeric() {
                    return Err(TypeError::BadOperand { op: op.to_string() });
                }
                Ok(ty)
            }
            ast::Expr::Call { func, args } => {
                let sig = self
                    .functions
                    .get(func)
                    .cloned()
                    .ok_or_else(|| TypeError::UndefinedFunction { name: func.clone() })?;
                if sig.params.len() != args.len() {
                    return Err(TypeError::CallArity {
                        name: func.clone(),
                        expected: sig.params.len(),
                        found: args.len(),
                    });
                }
                for (arg, &param) in args.iter().zip(&sig.params) {
                    let found = self.type_of(arg)?;
                    if !assignable(param, found) {
                        return Err(TypeError::Mismatch {
                            expected: param,
                            found,
                        });
                    }
                }
                Ok(sig.ret)
            }
            ast::Expr::Index { array, index } => {
                let elem = self.var_type(array)?;
                if self.type_of(index)? != Ty::Int {
                    return Err(TypeError::BadOperand {
                        op: "[]".to_string(),
                    });
                }
                Ok(elem)
            }
        }
    }

    fn unify_binary(&self, op: ast::BinaryOp, lhs: Ty, rhs: Ty) -> Result<Ty, TypeError> {
        use ast::BinaryOp::*;
        match op {
            LAnd | LOr => {
                if lhs == Ty::Bool && rhs == Ty::Bool {
                    Ok(Ty::Bool)
                } else {
                    Err(TypeError::BadOperand { op: op.to_string() })
                }
            }
            Eq | Ne => {
                if lhs == rhs {
                    Ok(Ty::Bool)
                } else {
                    Err(TypeError::Mismatch {
                        expected: lhs,
                        found: rhs,
                    })
                }
            }
            Lt | Le | Gt | Ge => {
                let numeric = lhs.is_numeric() && rhs.is_numeric();
                let strings = lhs == Ty::Str && rhs == Ty::Str;
                if numeric || strings {
                    Ok(Ty::Bool)
                } else {
                    Err(TypeError::BadOperand { op: op.to_string() })
                }
            }
            Add if lhs == Ty::Str && rhs == Ty::Str => Ok(Ty::Str),
            Add | Sub | Mul | Div => {
                if lhs.is_numeric() && rhs.is_numeric() {
                    Ok(promote(lhs, rhs))
                } else {
                    Err(TypeError::BadOperand { op: op.to_string() })
                }
            }
            Mod => {
                if lhs == Ty::Int && rhs == Ty::Int {
                    Ok(Ty::Int)
                } else {
                    Err(TypeError::BadOperand { op: op.to_string() })
                }
            }
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}
