//! Build TAC from AST.
//!
//! The generator walks a validated AST and appends to a flat instruction
//! list. Two counters mint fresh names: temporaries `t0, t1, …` and
//! labels `L0, L1, …`. Both are per-instance and reset at construction;
//! identical inputs lower to byte-identical listings.
//!
//! Operands are plain names: literals and variables lower to their own
//! text, everything else to a fresh temporary. `&&` and `||` lower as
//! ordinary binary instructions with both sides evaluated; there is no
//! short-circuiting in the emitted code.

pub mod error;
pub mod tac;

use nolog::*;

use crate::ast;
use self::error::IrError;
use self::tac::Instruction;

/// TAC lowering pass. One instance lowers one program.
pub struct IrGenerator {
    instructions: Vec<Instruction>,
    temp_counter: u32,
    label_counter: u32,
}

impl IrGenerator {
    /// Create a generator with both counters at zero.
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
        }
    }

    /// Lower `program` to a flat instruction list.
    pub fn generate(mut self, program: &ast::Program) -> Result<Vec<Instruction>, IrError> {
        for func in &program.funcs {
            self.gen_function(func)?;
        }
        Ok(self.instructions)
    }

    fn new_temp(&mut self) -> String {
        let name = format!("t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    fn new_label(&mut self) -> String {
        let name = format!("L{}", self.label_counter);
        self.label_counter += 1;
        name
    }

    fn emit(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    fn gen_function(&mut self, func: &ast::FunctionDecl) -> Result<(), IrError> {
        trace!("TAC " => "lower function `{}`", func.name);
        self.emit(Instruction::Label(format!("func_{}", func.name)));
        for param in &func.params {
            self.emit(Instruction::Param(param.name.clone()));
        }
        self.gen_block(&func.body)?;
        // Unconditional epilogue, even after an explicit return.
        self.emit(Instruction::Return(None));
        self.emit(Instruction::Label(format!("end_{}", func.name)));
        Ok(())
    }

    fn gen_block(&mut self, block: &ast::Block) -> Result<(), IrError> {
        for stmt in &block.stmts {
            self.gen_stmt(stmt)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &ast::Stmt) -> Result<(), IrError> {
        match stmt {
            ast::Stmt::VarDecl { name, init, .. } => {
                if let Some(init) = init {
                    let src = self.gen_expr(init)?;
                    self.emit(Instruction::Copy {
                        dst: name.clone(),
                        src,
                    });
                }
                Ok(())
            }
            ast::Stmt::Assign { target, value } => match target {
                ast::AssignTarget::Var(name) => {
                    let src = self.gen_expr(value)?;
                    self.emit(Instruction::Copy {
                        dst: name.clone(),
                        src,
                    });
                    Ok(())
                }
                ast::AssignTarget::Elem { array, index } => {
                    let index = self.gen_expr(index)?;
                    let value = self.gen_expr(value)?;
                    self.emit(Instruction::Store {
                        array: array.clone(),
                        index,
                        value,
                    });
                    Ok(())
                }
            },
            ast::Stmt::If { cond, then, els } => {
                let cond = self.gen_expr(cond)?;
                let l_else = self.new_label();
                let l_end = self.new_label();
                self.emit(Instruction::IfFalse {
                    label: l_else.clone(),
                    cond,
                });
                self.gen_block(then)?;
                self.emit(Instruction::Goto(l_end.clone()));
                self.emit(Instruction::Label(l_else));
                if let Some(els) = els {
                    self.gen_block(els)?;
                }
                self.emit(Instruction::Label(l_end));
                Ok(())
            }
            ast::Stmt::While { cond, body } => {
                let l_start = self.new_label();
                let l_end = self.new_label();
                self.emit(Instruction::Label(l_start.clone()));
                let cond = self.gen_expr(cond)?;
                self.emit(Instruction::IfFalse {
                    label: l_end.clone(),
                    cond,
                });
                self.gen_block(body)?;
                self.emit(Instruction::Goto(l_start));
                self.emit(Instruction::Label(l_end));
                Ok(())
            }
            ast::Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.gen_header_stmt(init, "initializer")?;
                }
                let l_start = self.new_label();
                let l_update = self.new_label();
                let l_end = self.new_label();
                self.emit(Instruction::Label(l_start.clone()));
                if let Some(cond) = cond {
                    let cond = self.gen_expr(cond)?;
                    self.emit(Instruction::IfFalse {
                        label: l_end.clone(),
                        cond,
                    });
                }
                // The body lowers before the update.
                self.gen_stmt(body)?;
                // Nothing branches to the update label; it stays as an
                // anchor for later passes.
                self.emit(Instruction::Label(l_update));
                if let Some(update) = update {
                    self.gen_header_stmt(update, "update")?;
                }
                self.emit(Instruction::Goto(l_start));
                self.emit(Instruction::Label(l_end));
                Ok(())
            }
            ast::Stmt::Return { expr } => {
                let value = match expr {
                    Some(expr) => Some(self.gen_expr(expr)?),
                    None => None,
                };
                self.emit(Instruction::Return(value));
                Ok(())
            }
            ast::Stmt::Expr { expr } => {
                self.gen_expr(expr)?;
                Ok(())
            }
            ast::Stmt::Block { block } => self.gen_block(block),
        }
    }

    /// Lower a `for`-header statement. The parser only puts simple
    /// statements here; anything else is a hand-built AST.
    fn gen_header_stmt(&mut self, stmt: &ast::Stmt, what: &str) -> Result<(), IrError> {
        match stmt {
            ast::Stmt::VarDecl { .. } | ast::Stmt::Assign { .. } | ast::Stmt::Expr { .. } => {
                self.gen_stmt(stmt)
            }
            _ => Err(IrError::MalformedAst {
                message: format!("for-loop {} must be a simple statement", what),
            }),
        }
    }

    /// Lower an expression, returning the operand that names its value.
    fn gen_expr(&mut self, expr: &ast::Expr) -> Result<String, IrError> {
        match expr {
            ast::Expr::Literal(lit) => Ok(literal_operand(lit)),
            ast::Expr::Var(name) => Ok(name.clone()),
            ast::Expr::Binary { op, lhs, rhs } => {
                let lhs = self.gen_expr(lhs)?;
                let rhs = self.gen_expr(rhs)?;
                let dst = self.new_temp();
                self.emit(Instruction::Binary {
                    op: *op,
                    dst: dst.clone(),
                    lhs,
                    rhs,
                });
                Ok(dst)
            }
            ast::Expr::Unary { op, expr } => {
                let src = self.gen_expr(expr)?;
                let dst = self.new_temp();
                self.emit(Instruction::Unary {
                    op: *op,
                    dst: dst.clone(),
                    src,
                });
                Ok(dst)
            }
            // `x++` saves the old value, then steps the variable; the
            // expression's value is the saved temporary.
            ast::Expr::Postfix { op, target } => {
                let saved = self.new_temp();
                self.emit(Instruction::Copy {
                    dst: saved.clone(),
                    src: target.clone(),
                });
                self.step(*op, target);
                Ok(saved)
            }
            // `++x` steps the variable; the expression's value is the
            // variable itself.
            ast::Expr::Prefix { op, target } => {
                self.step(*op, target);
                Ok(target.clone())
            }
            ast::Expr::Call { func, args } => {
                let operands = args
                    .iter()
                    .map(|arg| self.gen_expr(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                for operand in &operands {
                    self.emit(Instruction::Param(operand.clone()));
                }
                let dst = self.new_temp();
                self.emit(Instruction::Call {
                    dst: dst.clone(),
                    func: func.clone(),
                    argc: operands.len(),
                });
                Ok(dst)
            }
            ast::Expr::Index { array, index } => {
                let index = self.gen_expr(index)?;
                let dst = self.new_temp();
                self.emit(Instruction::Load {
                    dst: dst.clone(),
                    array: array.clone(),
                    index,
                });
                Ok(dst)
            }
        }
    }

    /// `<var> = <var> ± tOne` with a fresh temporary holding the 1.
    fn step(&mut self, op: ast::StepOp, target: &str) {
        let one = self.new_temp();
        self.emit(Instruction::Copy {
            dst: one.clone(),
            src: "1".to_string(),
        });
        let op = match op {
            ast::StepOp::Inc => ast::BinaryOp::Add,
            ast::StepOp::Dec => ast::BinaryOp::Sub,
        };
        self.emit(Instruction::Binary {
            op,
            dst: target.to_string(),
            lhs: target.to_string(),
            rhs: one,
        });
    }
}

impl Default for IrGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_operand(lit: &ast::Literal) -> String {
    match lit {
        ast::Literal::Int(text) | ast::Literal::Float(text) => text.clone(),
        ast::Literal::Bool(b) => b.to_string(),
        ast::Literal::Str(content) => content.clone(),
    }
}


#[cfg(test)]
mod properties {
    use std::collections::{HashMap, HashSet};

    use proptest::prelude::*;

    use super::tac::{self, Instruction};
    use super::IrGenerator;
    use crate::analysis::{ScopeAnalyzer, TypeChecker};
    use crate::ast::arbitrary::arb_program;

    proptest! {
        /// Identical compilations yield byte-identical listings with
        /// identical numbering.
        #[test]
        fn lowering_is_deterministic(program in arb_program()) {
            let a = IrGenerator::new().generate(&program).unwrap();
            let b = IrGenerator::new().generate(&program).unwrap();
            prop_assert_eq!(tac::render(&a), tac::render(&b));
        }

        /// Every temporary is defined by exactly one instruction.
        #[test]
        fn temporaries_are_fresh(program in arb_program()) {
            let instructions = IrGenerator::new().generate(&program).unwrap();
            let mut definitions: HashMap<&str, usize> = HashMap::new();
            for inst in &instructions {
                let dst = match inst {
                    Instruction::Copy { dst, .. }
                    | Instruction::Binary { dst, .. }
                    | Instruction::Unary { dst, .. }
                    | Instruction::Load { dst, .. }
                    | Instruction::Call { dst, .. } => dst,
                    _ => continue,
                };
                if dst.starts_with('t') && dst[1..].chars().all(|c| c.is_ascii_digit()) {
                    *definitions.entry(dst).or_default() += 1;
                }
            }
            for (temp, count) in definitions {
                prop_assert_eq!(count, 1, "temporary {} defined {} times", temp, count);
            }
        }

        /// Every jump targets a label that exists in the same function,
        /// and no label is emitted twice.
        #[test]
        fn control_flow_is_closed(program in arb_program()) {
            let instructions = IrGenerator::new().generate(&program).unwrap();

            let mut all_labels: HashSet<&str> = HashSet::new();
            for inst in &instructions {
                if let Instruction::Label(name) = inst {
                    prop_assert!(all_labels.insert(name), "label {} emitted twice", name);
                }
            }

            // Jumps resolve within their own function body.
            let mut labels: HashSet<&str> = HashSet::new();
            let mut targets: Vec<&str> = Vec::new();
            for inst in &instructions {
                match inst {
                    Instruction::Label(name) if name.starts_with("func_") => {
                        labels.clear();
                        targets.clear();
                    }
                    Instruction::Label(name) if name.starts_with("end_") => {
                        for target in &targets {
                            prop_assert!(
                                labels.contains(target),
                                "jump target {} not in function",
                                target
                            );
                        }
                    }
                    Instruction::Label(name) => {
                        labels.insert(name);
                    }
                    Instruction::Goto(label) => targets.push(label),
                    Instruction::IfFalse { label, .. } => targets.push(label),
                    _ => {}
                }
            }
        }

        /// Generated programs pass the whole pipeline.
        #[test]
        fn generated_programs_compile(program in arb_program()) {
            ScopeAnalyzer::new().analyze(&program).unwrap();
            TypeChecker::new().check(&program).unwrap();
            let instructions = IrGenerator::new().generate(&program).unwrap();
            prop_assert!(!instructions.is_empty());
        }
    }
}
