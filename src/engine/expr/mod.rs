mod context;
mod expression;

pub use context::EvalContext;
pub use expression::{ArithmeticOp, CompareOp, Expr};

#[cfg(test)]
mod expression_test;
