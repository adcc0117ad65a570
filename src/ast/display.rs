use std::fmt::{self, Display};

use super::*;

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in &self.funcs {
            writeln!(f, "{}", func)?;
        }
        Ok(())
    }
}

impl Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {} {}(", self.ret_ty, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") {}", self.body)
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

impl Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "int"),
            Ty::Float => write!(f, "float"),
            Ty::Bool => write!(f, "bool"),
            Ty::Str => write!(f, "string"),
            Ty::Void => write!(f, "void"),
        }
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        for stmt in &self.stmts {
            write!(f, "    {}", stmt)?;
        }
        write!(f, "}}")
    }
}

/// Render a `for`-header statement without its trailing `;` and newline.
fn fmt_simple(stmt: &Stmt, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match stmt {
        Stmt::VarDecl { ty, name, init } => {
            write!(f, "{} {}", ty, name)?;
            if let Some(init) = init {
                write!(f, " = {}", init)?;
            }
            Ok(())
        }
        Stmt::Assign { target, value } => write!(f, "{} = {}", target, value),
        Stmt::Expr { expr } => write!(f, "{}", expr),
        _ => write!(f, "{}", stmt),
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::VarDecl { .. } | Stmt::Assign { .. } | Stmt::Expr { .. } => {
                fmt_simple(self, f)?;
                writeln!(f, ";")
            }
            Stmt::If { cond, then, els } => {
                write!(f, "if ({}) {}", cond, then)?;
                if let Some(els) = els {
                    write!(f, " else {}", els)?;
                }
                writeln!(f)
            }
            Stmt::While { cond, body } => writeln!(f, "while ({}) {}", cond, body),
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                write!(f, "for (")?;
                if let Some(init) = init {
                    fmt_simple(init, f)?;
                }
                write!(f, "; ")?;
                if let Some(cond) = cond {
                    write!(f, "{}", cond)?;
                }
                write!(f, "; ")?;
                if let Some(update) = update {
                    fmt_simple(update, f)?;
                }
                write!(f, ") {}", body)
            }
            Stmt::Return { expr } => match expr {
                Some(expr) => writeln!(f, "return {};", expr),
                None => writeln!(f, "return;"),
            },
            Stmt::Block { block } => writeln!(f, "{}", block),
        }
    }
}

impl Display for AssignTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignTarget::Var(name) => write!(f, "{}", name),
            AssignTarget::Elem { array, index } => write!(f, "{}[{}]", array, index),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Unary { op, expr } => write!(f, "{}{}", op, expr),
            Expr::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            Expr::Prefix { op, target } => write!(f, "{}{}", op, target),
            Expr::Postfix { op, target } => write!(f, "{}{}", target, op),
            Expr::Call { func, args } => {
                write!(f, "{}(", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Index { array, index } => write!(f, "{}[{}]", array, index),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(text) | Literal::Float(text) => write!(f, "{}", text),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Str(content) => write!(f, "\"{}\"", content),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Pos => write!(f, "+"),
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "%"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::Ne => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Le => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Ge => write!(f, ">="),
            BinaryOp::LAnd => write!(f, "&&"),
            BinaryOp::LOr => write!(f, "||"),
        }
    }
}

impl Display for StepOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOp::Inc => write!(f, "++"),
            StepOp::Dec => write!(f, "--"),
        }
    }
}
