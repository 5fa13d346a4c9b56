#![coverage(off)]

//! Lowering of analyzed expressions onto [`ExecExpr`].

use sloopsql_common::error::{Error, Result};
use sloopsql_common::types::{DataType, Value};
use sloopsql_ir::{CompareOp, ConnectiveKind, Expr, ExprVisitor, LogicalPlan, Slot};
use tracing::debug;

use crate::exec::ExecExpr;
use crate::registry::FunctionRegistry;

/// Translate an analyzed expression into executable form and finalize its
/// derived metadata.
///
/// Subqueries must be unnested before translation; one reaching this point
/// is rejected rather than silently planned.
pub fn translate(expr: &Expr, registry: &dyn FunctionRegistry) -> Result<ExecExpr> {
    debug!(%expr, "translating expression");
    let mut translated = expr.accept(&mut Translator, &mut ())?;
    translated.finalize(registry).map_err(|e| {
        Error::internal(format!("failed to finalize expression {}: {}", expr, e))
    })?;
    Ok(translated)
}

struct Translator;

impl Translator {
    fn translate_all(&mut self, args: &[Expr]) -> Result<Vec<ExecExpr>> {
        args.iter().map(|arg| arg.accept(self, &mut ())).collect()
    }
}

impl ExprVisitor<Result<ExecExpr>, ()> for Translator {
    fn visit_literal(&mut self, value: &Value, _ctx: &mut ()) -> Result<ExecExpr> {
        Ok(ExecExpr::Literal(value.clone()))
    }

    fn visit_column(&mut self, slot: &Slot, _ctx: &mut ()) -> Result<ExecExpr> {
        Ok(ExecExpr::SlotRef {
            slot: slot.id,
            data_type: slot.data_type,
        })
    }

    fn visit_comparison(
        &mut self,
        op: CompareOp,
        left: &Expr,
        right: &Expr,
        _ctx: &mut (),
    ) -> Result<ExecExpr> {
        Ok(ExecExpr::BinaryPred {
            op,
            signature: None,
            children: vec![left.accept(self, &mut ())?, right.accept(self, &mut ())?],
        })
    }

    fn visit_connective(
        &mut self,
        kind: ConnectiveKind,
        args: &[Expr],
        _ctx: &mut (),
    ) -> Result<ExecExpr> {
        Ok(ExecExpr::CompoundPred {
            kind,
            children: self.translate_all(args)?,
        })
    }

    fn visit_cast(&mut self, target: DataType, operand: &Expr, _ctx: &mut ()) -> Result<ExecExpr> {
        Ok(ExecExpr::Cast {
            target,
            child: Box::new(operand.accept(self, &mut ())?),
        })
    }

    fn visit_function(
        &mut self,
        name: &str,
        args: &[Expr],
        return_type: DataType,
        _nullable: bool,
        _ctx: &mut (),
    ) -> Result<ExecExpr> {
        Ok(ExecExpr::FunctionCall {
            name: name.to_string(),
            children: self.translate_all(args)?,
            return_type,
        })
    }

    fn visit_aggregate(
        &mut self,
        name: &str,
        distinct: bool,
        args: &[Expr],
        return_type: DataType,
        _ctx: &mut (),
    ) -> Result<ExecExpr> {
        Ok(ExecExpr::AggregateCall {
            name: name.to_string(),
            distinct,
            children: self.translate_all(args)?,
            return_type,
        })
    }

    fn visit_subquery(&mut self, _plan: &LogicalPlan, _ctx: &mut ()) -> Result<ExecExpr> {
        Err(Error::unsupported_expression(
            "subquery must be unnested before translation",
        ))
    }
}
