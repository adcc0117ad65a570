//! Arbitrary AST generator.
//!
//! The strategies here build programs that are well-scoped and well-typed
//! by construction: every name is declared before use, arithmetic stays
//! in `int`, and conditions are comparisons. The property tests lower
//! these programs and check the invariants of the emitted TAC.

use proptest::prelude::*;

use super::*;

/// Names visible to generated statements.
#[derive(Debug, Clone, Default)]
pub struct LocalEnv {
    vars: Vec<String>,
}

impl LocalEnv {
    /// Environment over the given variable names.
    pub fn new(vars: Vec<String>) -> Self {
        Self { vars }
    }

    /// Pick one of the declared variables.
    pub fn arb_var(&self) -> impl Strategy<Value = String> {
        prop::sample::select(self.vars.clone())
    }
}

/// Generate an arbitrary identifier. The pattern cannot collide with a
/// keyword.
pub fn arb_ident() -> impl Strategy<Value = String> {
    "[a-z][0-9]{0,2}".prop_map(String::from)
}

fn arb_int_literal() -> impl Strategy<Value = Expr> {
    (0u32..100).prop_map(|n| Expr::Literal(Literal::Int(n.to_string())))
}

fn arb_arith_op() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        Just(BinaryOp::Add),
        Just(BinaryOp::Sub),
        Just(BinaryOp::Mul),
        Just(BinaryOp::Div),
        Just(BinaryOp::Mod),
    ]
}

fn arb_cmp_op() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        Just(BinaryOp::Lt),
        Just(BinaryOp::Le),
        Just(BinaryOp::Gt),
        Just(BinaryOp::Ge),
        Just(BinaryOp::Eq),
        Just(BinaryOp::Ne),
    ]
}

fn arb_step_op() -> impl Strategy<Value = StepOp> {
    prop_oneof![Just(StepOp::Inc), Just(StepOp::Dec)]
}

/// Generate an arbitrary `int`-typed expression over the environment.
pub fn arb_int_expr(env: LocalEnv) -> impl Strategy<Value = Expr> {
    let leaf = if env.vars.is_empty() {
        arb_int_literal().boxed()
    } else {
        prop_oneof![
            2 => arb_int_literal(),
            3 => env.arb_var().prop_map(Expr::Var),
        ]
        .boxed()
    };
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            3 => (inner.clone(), arb_arith_op(), inner.clone()).prop_map(|(lhs, op, rhs)| {
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }),
            1 => (prop_oneof![Just(UnaryOp::Neg), Just(UnaryOp::Pos)], inner).prop_map(
                |(op, expr)| Expr::Unary {
                    op,
                    expr: Box::new(expr),
                }
            ),
        ]
    })
}

fn arb_cmp(env: LocalEnv) -> BoxedStrategy<Expr> {
    (arb_int_expr(env.clone()), arb_cmp_op(), arb_int_expr(env))
        .prop_map(|(lhs, op, rhs)| Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
        .boxed()
}

/// Generate an arbitrary `bool`-typed condition.
pub fn arb_cond(env: LocalEnv) -> impl Strategy<Value = Expr> {
    prop_oneof![
        5 => arb_cmp(env.clone()),
        1 => (
            arb_cmp(env.clone()),
            prop_oneof![Just(BinaryOp::LAnd), Just(BinaryOp::LOr)],
            arb_cmp(env),
        )
            .prop_map(|(lhs, op, rhs)| Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
        1 => any::<bool>().prop_map(|b| Expr::Literal(Literal::Bool(b))),
    ]
}

/// Generate an assignment, or a step statement, over declared variables.
pub fn arb_simple_stmt(env: LocalEnv) -> impl Strategy<Value = Stmt> {
    prop_oneof![
        3 => (env.arb_var(), arb_int_expr(env.clone())).prop_map(|(name, value)| Stmt::Assign {
            target: AssignTarget::Var(name),
            value,
        }),
        1 => (env.arb_var(), arb_step_op()).prop_map(|(target, op)| Stmt::Expr {
            expr: Expr::Postfix { op, target },
        }),
        1 => (env.arb_var(), arb_step_op()).prop_map(|(target, op)| Stmt::Expr {
            expr: Expr::Prefix { op, target },
        }),
    ]
}

fn arb_simple_block(env: LocalEnv) -> impl Strategy<Value = Block> {
    prop::collection::vec(arb_simple_stmt(env), 0..4).prop_map(|stmts| Block {
        stmts: stmts.into_iter().collect(),
    })
}

/// Generate an arbitrary statement: simple, `if`, `while` or `for`.
pub fn arb_stmt(env: LocalEnv) -> impl Strategy<Value = Stmt> {
    prop_oneof![
        4 => arb_simple_stmt(env.clone()),
        1 => (
            arb_cond(env.clone()),
            arb_simple_block(env.clone()),
            prop::option::of(arb_simple_block(env.clone())),
        )
            .prop_map(|(cond, then, els)| Stmt::If { cond, then, els }),
        1 => (arb_cond(env.clone()), arb_simple_block(env.clone()))
            .prop_map(|(cond, body)| Stmt::While { cond, body }),
        1 => (
            arb_simple_stmt(env.clone()),
            arb_cond(env.clone()),
            arb_simple_stmt(env.clone()),
            arb_simple_block(env),
        )
            .prop_map(|(init, cond, update, body)| Stmt::For {
                init: Some(Box::new(init)),
                cond: Some(cond),
                update: Some(Box::new(update)),
                body: Box::new(Stmt::Block { block: body }),
            }),
    ]
}

/// Generate an arbitrary function: `int` parameters, `int` locals with
/// literal initializers, a run of statements, and a final return.
pub fn arb_function() -> impl Strategy<Value = FunctionDecl> {
    (prop::collection::btree_set(arb_ident(), 2..6), 0usize..=2).prop_flat_map(|(names, nparams)| {
        let names: Vec<String> = names.into_iter().collect();
        let nparams = nparams.min(names.len() - 1);
        let params: Vec<Param> = names[..nparams]
            .iter()
            .map(|name| Param {
                ty: Ty::Int,
                name: name.clone(),
            })
            .collect();
        let locals: Vec<String> = names[nparams..].to_vec();
        let env = LocalEnv::new(names.clone());

        let decls = locals
            .iter()
            .map(|name| {
                let name = name.clone();
                arb_int_literal().prop_map(move |init| Stmt::VarDecl {
                    ty: Ty::Int,
                    name: name.clone(),
                    init: Some(init),
                })
            })
            .collect::<Vec<_>>();

        (
            decls,
            prop::collection::vec(arb_stmt(env.clone()), 0..5),
            arb_int_expr(env),
        )
            .prop_map(move |(decls, stmts, ret)| {
                let mut all: imbl::Vector<Stmt> = decls.into_iter().collect();
                all.extend(stmts);
                all.push_back(Stmt::Return { expr: Some(ret) });
                FunctionDecl {
                    ret_ty: Ty::Int,
                    name: "main".to_string(),
                    params: params.clone(),
                    body: Block { stmts: all },
                }
            })
    })
}

/// Generate an arbitrary single-function program.
pub fn arb_program() -> impl Strategy<Value = Program> {
    arb_function().prop_map(|func| Program { funcs: vec![func] })
}
