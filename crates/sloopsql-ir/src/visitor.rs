#![coverage(off)]

use sloopsql_common::types::{DataType, Value};

use crate::expr::{CompareOp, ConnectiveKind, Expr, Slot};
use crate::plan::LogicalPlan;

/// Double-dispatch consumer over [`Expr`] trees.
///
/// One method per node kind, so a new expression variant forces every
/// implementor to take a position on it. `R` is the per-node result type
/// and `C` a caller-owned traversal context.
pub trait ExprVisitor<R, C> {
    fn visit_literal(&mut self, value: &Value, ctx: &mut C) -> R;

    fn visit_column(&mut self, slot: &Slot, ctx: &mut C) -> R;

    fn visit_comparison(&mut self, op: CompareOp, left: &Expr, right: &Expr, ctx: &mut C) -> R;

    fn visit_connective(&mut self, kind: ConnectiveKind, args: &[Expr], ctx: &mut C) -> R;

    fn visit_cast(&mut self, target: DataType, operand: &Expr, ctx: &mut C) -> R;

    fn visit_function(
        &mut self,
        name: &str,
        args: &[Expr],
        return_type: DataType,
        nullable: bool,
        ctx: &mut C,
    ) -> R;

    fn visit_aggregate(
        &mut self,
        name: &str,
        distinct: bool,
        args: &[Expr],
        return_type: DataType,
        ctx: &mut C,
    ) -> R;

    fn visit_subquery(&mut self, plan: &LogicalPlan, ctx: &mut C) -> R;
}
