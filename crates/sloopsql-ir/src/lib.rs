#![feature(coverage_attribute)]
#![coverage(off)]

//! Intermediate representation for the SloopSQL optimizer core.
//!
//! Expressions and logical plans are immutable value trees: rewriting builds
//! new nodes from old children, never mutates in place. Every derived
//! property (expression type, nullability, a plan's output columns) is
//! recomputed from children on demand and never cached.

pub mod conjuncts;
mod expr;
mod plan;
mod visitor;

pub use expr::{BindSide, CompareOp, ConnectiveKind, Expr, Slot, SlotBinding, SlotId};
pub use plan::{JoinType, LogicalPlan};
pub use visitor::ExprVisitor;
