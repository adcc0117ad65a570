//! Recursive-descent parser with precedence climbing for binary operators.
//!
//! The parser owns one lookahead token and advances on consumption. It
//! returns a whole [`ast::Program`] or the first error; no partial AST
//! escapes.

use miette::Diagnostic;
use thiserror::Error;

use crate::ast;
use crate::lexer::{Token, TokenKind};

/// Error type for the parser.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    /// Input ended where a construct was still open.
    #[error("unexpected end of file, expected {expected}")]
    #[diagnostic(code(tacc::parse::unexpected_eof))]
    UnexpectedEof {
        /// What would have been accepted.
        expected: TokenKind,
    },
    /// A specific token was required.
    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(tacc::parse::expected_token))]
    ExpectedToken {
        /// The required kind.
        expected: TokenKind,
        /// The token actually seen.
        found: Token,
    },
    /// A type keyword was required.
    #[error("expected a type, found {found}")]
    #[diagnostic(code(tacc::parse::expected_type))]
    ExpectedType {
        /// The token actually seen.
        found: Token,
    },
    /// An identifier was required.
    #[error("expected an identifier, found {found}")]
    #[diagnostic(code(tacc::parse::expected_identifier))]
    ExpectedIdentifier {
        /// The token actually seen.
        found: Token,
    },
    /// An expression was required.
    #[error("expected an expression, found {found}")]
    #[diagnostic(code(tacc::parse::expected_expr))]
    ExpectedExpr {
        /// The token actually seen.
        found: Token,
    },
    /// The left side of `=`, `++` or `--` is not assignable.
    #[error("invalid assignment target `{target}`")]
    #[diagnostic(code(tacc::parse::invalid_assign_target))]
    InvalidAssignTarget {
        /// The offending expression, rendered back to source.
        target: String,
    },
}

type Result<T> = std::result::Result<T, ParseError>;

/// Parser over a token stream produced by [`crate::lexer::Lexer`].
pub struct Parser {
    tokens: std::vec::IntoIter<Token>,
    current: Token,
}

impl Parser {
    /// Create a parser over `tokens`. The stream must end with `Eof`,
    /// which [`crate::lexer::Lexer::tokenize`] guarantees.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens.into_iter();
        let current = tokens
            .next()
            .unwrap_or_else(|| Token {
                kind: TokenKind::Eof,
                text: String::new(),
            });
        Parser { tokens, current }
    }

    fn advance(&mut self) -> Token {
        let next = self.tokens.next().unwrap_or_else(|| Token {
            kind: TokenKind::Eof,
            text: String::new(),
        });
        std::mem::replace(&mut self.current, next)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else if self.at(TokenKind::Eof) {
            Err(ParseError::UnexpectedEof { expected: kind })
        } else {
            Err(ParseError::ExpectedToken {
                expected: kind,
                found: self.current.clone(),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        if self.at(TokenKind::Ident) {
            Ok(self.advance().text)
        } else {
            Err(ParseError::ExpectedIdentifier {
                found: self.current.clone(),
            })
        }
    }

    fn expect_type(&mut self) -> Result<ast::Ty> {
        let ty = match self.current.kind {
            TokenKind::Int => ast::Ty::Int,
            TokenKind::Float => ast::Ty::Float,
            TokenKind::Bool => ast::Ty::Bool,
            TokenKind::Str => ast::Ty::Str,
            _ => {
                return Err(ParseError::ExpectedType {
                    found: self.current.clone(),
                })
            }
        };
        self.advance();
        Ok(ty)
    }

    /// Parse the whole token stream into a program.
    pub fn parse_program(mut self) -> Result<ast::Program> {
        let mut funcs = Vec::new();
        while !self.at(TokenKind::Eof) {
            funcs.push(self.parse_function()?);
        }
        Ok(ast::Program { funcs })
    }

    fn parse_function(&mut self) -> Result<ast::FunctionDecl> {
        self.expect(TokenKind::Fn)?;
        let ret_ty = self.expect_type()?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(ast::FunctionDecl {
            ret_ty,
            name,
            params,
            body,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<ast::Param>> {
        let mut params = Vec::new();
        if self.at(TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            let ty = self.expect_type()?;
            let name = self.expect_ident()?;
            params.push(ast::Param { ty, name });
            if self.at(TokenKind::Comma) {
                self.advance();
            } else {
                return Ok(params);
            }
        }
    }

    fn parse_block(&mut self) -> Result<ast::Block> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = imbl::Vector::new();
        while !self.at(TokenKind::RBrace) {
            if self.at(TokenKind::Eof) {
                return Err(ParseError::UnexpectedEof {
                    expected: TokenKind::RBrace,
                });
            }
            stmts.push_back(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(ast::Block { stmts })
    }

    fn parse_stmt(&mut self) -> Result<ast::Stmt> {
        match self.current.kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                Ok(ast::Stmt::Block { block })
            }
            _ => {
                let stmt = self.parse_simple_stmt()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(stmt)
            }
        }
    }

    /// A statement legal inside a `for` header: a declaration, an
    /// assignment, or an expression. The trailing `;` belongs to the
    /// caller.
    fn parse_simple_stmt(&mut self) -> Result<ast::Stmt> {
        if self.current.kind.is_type() {
            return self.parse_var_decl();
        }

        let expr = self.parse_expr()?;
        if self.at(TokenKind::Assign) {
            self.advance();
            let target = match expr {
                ast::Expr::Var(name) => ast::AssignTarget::Var(name),
                ast::Expr::Index { array, index } => ast::AssignTarget::Elem {
                    array,
                    index: *index,
                },
                other => {
                    return Err(ParseError::InvalidAssignTarget {
                        target: other.to_string(),
                    })
                }
            };
            let value = self.parse_expr()?;
            return Ok(ast::Stmt::Assign { target, value });
        }
        Ok(ast::Stmt::Expr { expr })
    }

    fn parse_var_decl(&mut self) -> Result<ast::Stmt> {
        let ty = self.expect_type()?;
        let name = self.expect_ident()?;
        let init = if self.at(TokenKind::Assign) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(ast::Stmt::VarDecl { ty, name, init })
    }

    fn parse_if(&mut self) -> Result<ast::Stmt> {
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then = self.parse_block()?;
        let els = if self.at(TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(ast::Stmt::If { cond, then, els })
    }

    fn parse_while(&mut self) -> Result<ast::Stmt> {
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(ast::Stmt::While { cond, body })
    }

    fn parse_for(&mut self) -> Result<ast::Stmt> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;
        let init = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_simple_stmt()?))
        };
        self.expect(TokenKind::Semicolon)?;
        let cond = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_simple_stmt()?))
        };
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(ast::Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<ast::Stmt> {
        self.expect(TokenKind::Return)?;
        let expr = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(ast::Stmt::Return { expr })
    }

    fn parse_expr(&mut self) -> Result<ast::Expr> {
        self.parse_binary(0)
    }

    /// Precedence climbing: consume operators binding at least as tight
    /// as `min_prec`. Left associativity comes from recursing with
    /// `prec + 1` on the right.
    fn parse_binary(&mut self, min_prec: u8) -> Result<ast::Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = binary_op(self.current.kind) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = ast::Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<ast::Expr> {
        let op = match self.current.kind {
            TokenKind::Plus => Some(ast::UnaryOp::Pos),
            TokenKind::Minus => Some(ast::UnaryOp::Neg),
            TokenKind::Not => Some(ast::UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = Box::new(self.parse_unary()?);
            return Ok(ast::Expr::Unary { op, expr });
        }

        if let Some(op) = step_op(self.current.kind) {
            self.advance();
            let target = self.parse_unary()?;
            let ast::Expr::Var(target) = target else {
                return Err(ParseError::InvalidAssignTarget {
                    target: target.to_string(),
                });
            };
            return Ok(ast::Expr::Prefix { op, target });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<ast::Expr> {
        let mut expr = self.parse_primary()?;
        while let Some(op) = step_op(self.current.kind) {
            self.advance();
            let ast::Expr::Var(target) = expr else {
                return Err(ParseError::InvalidAssignTarget {
                    target: expr.to_string(),
                });
            };
            expr = ast::Expr::Postfix { op, target };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<ast::Expr> {
        match self.current.kind {
            TokenKind::IntLit => Ok(ast::Expr::Literal(ast::Literal::Int(self.advance().text))),
            TokenKind::FloatLit => Ok(ast::Expr::Literal(ast::Literal::Float(self.advance().text))),
            TokenKind::StrLit => Ok(ast::Expr::Literal(ast::Literal::Str(self.advance().text))),
            TokenKind::BoolLit => {
                let token = self.advance();
                Ok(ast::Expr::Literal(ast::Literal::Bool(token.text == "true")))
            }
            TokenKind::Ident => {
                let name = self.advance().text;
                match self.current.kind {
                    TokenKind::LParen => {
                        self.advance();
                        let args = self.parse_args()?;
                        self.expect(TokenKind::RParen)?;
                        Ok(ast::Expr::Call { func: name, args })
                    }
                    TokenKind::LBracket => {
                        self.advance();
                        let index = Box::new(self.parse_expr()?);
                        self.expect(TokenKind::RBracket)?;
                        Ok(ast::Expr::Index { array: name, index })
                    }
                    _ => Ok(ast::Expr::Var(name)),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof {
                expected: TokenKind::Ident,
            }),
            _ => Err(ParseError::ExpectedExpr {
                found: self.current.clone(),
            }),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<ast::Expr>> {
        let mut args = Vec::new();
        if self.at(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.at(TokenKind::Comma) {
                self.advance();
            } else {
                return Ok(args);
            }
        }
    }
}

/// Binary operator for a token, if any.
fn binary_op(kind: TokenKind) -> Option<ast::BinaryOp> {
    let op = match kind {
        TokenKind::OrOr => ast::BinaryOp::LOr,
        TokenKind::AndAnd => ast::BinaryOp::LAnd,
        TokenKind::Eq => ast::BinaryOp::Eq,
        TokenKind::Ne => ast::BinaryOp::Ne,
        TokenKind::Lt => ast::BinaryOp::Lt,
        TokenKind::Le => ast::BinaryOp::Le,
        TokenKind::Gt => ast::BinaryOp::Gt,
        TokenKind::Ge => ast::BinaryOp::Ge,
        TokenKind::Plus => ast::BinaryOp::Add,
        TokenKind::Minus => ast::BinaryOp::Sub,
        TokenKind::Star => ast::BinaryOp::Mul,
        TokenKind::Slash => ast::BinaryOp::Div,
        TokenKind::Percent => ast::BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

fn step_op(kind: TokenKind) -> Option<ast::StepOp> {
    match kind {
        TokenKind::PlusPlus => Some(ast::StepOp::Inc),
        TokenKind::MinusMinus => Some(ast::StepOp::Dec),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, Stmt};
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Result<ast::Program> {
        Parser::new(Lexer::new(src).tokenize().unwrap()).parse_program()
    }

    fn parse_body(src: &str) -> imbl::Vector<Stmt> {
        let src = format!("fn int main() {{ {} }}", src);
        parse(&src).unwrap().funcs.remove(0).body.stmts
    }

    fn parse_one_expr(src: &str) -> Expr {
        let stmts = parse_body(&format!("return {};", src));
        match stmts.front().unwrap() {
            Stmt::Return { expr: Some(expr) } => expr.clone(),
            other => panic!("expected return, got {:?}", other),
        }
    }

    #[test]
    fn function_shape() {
        let program = parse("fn int add(int a, int b) { return a + b; }").unwrap();
        let func = &program.funcs[0];
        assert_eq!(func.name, "add");
        assert_eq!(func.ret_ty, ast::Ty::Int);
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[1].name, "b");
        assert_eq!(func.body.stmts.len(), 1);
    }

    #[test]
    fn precedence_shapes_the_tree() {
        // 1 + 2 * 3  parses as  1 + (2 * 3)
        let expr = parse_one_expr("1 + 2 * 3");
        let Expr::Binary { op, rhs, .. } = expr else {
            panic!("not a binary expr")
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            *rhs,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));

        // a < b && c < d  parses as  (a < b) && (c < d)
        let expr = parse_one_expr("a < b && c < d");
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::LAnd, .. }));
    }

    #[test]
    fn binary_operators_are_left_associative() {
        // 1 - 2 - 3  parses as  (1 - 2) - 3
        let expr = parse_one_expr("1 - 2 - 3");
        let Expr::Binary { op, lhs, rhs } = expr else {
            panic!("not a binary expr")
        };
        assert_eq!(op, BinaryOp::Sub);
        assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Sub, .. }));
        assert!(matches!(*rhs, Expr::Literal(_)));
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        // -a * b  parses as  (-a) * b
        let expr = parse_one_expr("-a * b");
        let Expr::Binary { op, lhs, .. } = expr else {
            panic!("not a binary expr")
        };
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(*lhs, Expr::Unary { .. }));
    }

    #[test]
    fn parenthesised_grouping() {
        // (1 + 2) * 3
        let expr = parse_one_expr("(1 + 2) * 3");
        let Expr::Binary { op, lhs, .. } = expr else {
            panic!("not a binary expr")
        };
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn statements() {
        let stmts = parse_body("int x = 1; x = x + 1; x++; f(x); { int y; }");
        assert!(matches!(&stmts[0], Stmt::VarDecl { init: Some(_), .. }));
        assert!(matches!(&stmts[1], Stmt::Assign { .. }));
        assert!(matches!(
            &stmts[2],
            Stmt::Expr {
                expr: Expr::Postfix { .. }
            }
        ));
        assert!(matches!(
            &stmts[3],
            Stmt::Expr {
                expr: Expr::Call { .. }
            }
        ));
        assert!(matches!(&stmts[4], Stmt::Block { .. }));
    }

    #[test]
    fn if_else_and_while() {
        let stmts = parse_body("if (x > 0) { return 1; } else { return 0; } while (b) { x--; }");
        assert!(matches!(&stmts[0], Stmt::If { els: Some(_), .. }));
        assert!(matches!(&stmts[1], Stmt::While { .. }));
    }

    #[test]
    fn for_with_all_parts() {
        let stmts = parse_body("for (int i = 0; i < 3; i++) { s = s + i; }");
        let Stmt::For {
            init,
            cond,
            update,
            body,
        } = &stmts[0]
        else {
            panic!("not a for")
        };
        assert!(matches!(init.as_deref(), Some(Stmt::VarDecl { .. })));
        assert!(cond.is_some());
        assert!(matches!(
            update.as_deref(),
            Some(Stmt::Expr {
                expr: Expr::Postfix { .. }
            })
        ));
        assert!(matches!(body.as_ref(), Stmt::Block { .. }));
    }

    #[test]
    fn for_with_empty_parts() {
        let stmts = parse_body("for (;;) { x++; }");
        let Stmt::For {
            init, cond, update, ..
        } = &stmts[0]
        else {
            panic!("not a for")
        };
        assert!(init.is_none() && cond.is_none() && update.is_none());
    }

    #[test]
    fn array_subscript_and_element_assignment() {
        let stmts = parse_body("a[i] = a[i + 1]; x = a[0];");
        let Stmt::Assign { target, value } = &stmts[0] else {
            panic!("not an assignment")
        };
        assert!(matches!(target, ast::AssignTarget::Elem { .. }));
        assert!(matches!(value, Expr::Index { .. }));
    }

    #[test]
    fn prefix_step() {
        let stmts = parse_body("++x;");
        assert!(matches!(
            &stmts[0],
            Stmt::Expr {
                expr: Expr::Prefix { .. }
            }
        ));
    }

    #[test]
    fn missing_semicolon() {
        let err = parse("fn int f() { return 1 }").unwrap_err();
        assert!(matches!(
            err,
            ParseError::ExpectedToken {
                expected: TokenKind::Semicolon,
                ..
            }
        ));
    }

    #[test]
    fn unexpected_eof() {
        let err = parse("fn int f() { return 1;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn expected_type_and_identifier() {
        assert!(matches!(
            parse("fn f() {}").unwrap_err(),
            ParseError::ExpectedType { .. }
        ));
        assert!(matches!(
            parse("fn int () {}").unwrap_err(),
            ParseError::ExpectedIdentifier { .. }
        ));
    }

    #[test]
    fn expected_expression() {
        let err = parse("fn int f() { return ; ; }").unwrap_err();
        // `return ;` is a bare return; the second `;` is the bad statement.
        assert!(matches!(err, ParseError::ExpectedExpr { .. }));
    }

    #[test]
    fn invalid_assignment_targets() {
        assert!(matches!(
            parse("fn int f() { 5++; }").unwrap_err(),
            ParseError::InvalidAssignTarget { .. }
        ));
        assert!(matches!(
            parse("fn int f() { ++f(); }").unwrap_err(),
            ParseError::InvalidAssignTarget { .. }
        ));
        assert!(matches!(
            parse("fn int f() { f() = 1; }").unwrap_err(),
            ParseError::InvalidAssignTarget { .. }
        ));
    }

    #[test]
    fn compound_assignment_is_lexed_but_not_parsed() {
        assert!(parse("fn int f() { x += 1; }").is_err());
    }

    #[test]
    fn break_and_continue_have_no_production() {
        assert!(parse("fn int f() { break; }").is_err());
        assert!(parse("fn int f() { continue; }").is_err());
    }
}
