#![coverage(off)]

//! Type coercion and literal folding for binary comparisons.

use std::cmp::Ordering;

use sloopsql_common::error::{Error, Result};
use sloopsql_common::types::{DataType, Value};
use sloopsql_ir::{CompareOp, Expr};
use tracing::debug;

use crate::registry::{CompareMode, FunctionRegistry, FunctionSignature};
use crate::selectivity::{self, StatsProvider};

/// Outcome of analyzing one comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonAnalysis {
    /// The common type both operands are compared under.
    pub cmp_type: DataType,
    /// The folded literal, or the comparison with casts inserted.
    pub expr: Expr,
    /// The resolved builtin signature.
    pub signature: FunctionSignature,
    /// Estimated fraction of rows retained.
    pub selectivity: f64,
}

/// The common type a comparison of the two operands is evaluated under.
///
/// Operand types are widened through `result_type()` first; the steps
/// below run in priority order and the ordering is load-bearing.
pub fn comparison_type(left: &Expr, right: &Expr) -> Result<DataType> {
    let lt = left.data_type();
    let rt = right.data_type();

    // 1. Opaque accumulator types never compare.
    if lt.is_opaque() {
        return Err(Error::type_incompatible(format!(
            "{} is not comparable: {}",
            lt, left
        )));
    }
    if rt.is_opaque() {
        return Err(Error::type_incompatible(format!(
            "{} is not comparable: {}",
            rt, right
        )));
    }

    // 2. Date comparisons, checked on the raw types so bounded strings and
    // small integers still qualify.
    if can_compare_date(lt, rt) {
        return Ok(DataType::DateTime);
    }

    let lt = lt.result_type();
    let rt = rt.result_type();

    // 3. String pairs stay in the string family.
    if lt.is_string_like() && rt.is_string_like() {
        if matches!(lt, DataType::Varchar(_)) && matches!(rt, DataType::Varchar(_)) {
            return Ok(DataType::Varchar(None));
        }
        return Ok(DataType::Text);
    }

    // 4. Plain integer comparison.
    if lt == DataType::BigInt && rt == DataType::BigInt {
        return require_compatible(&lt, &rt);
    }

    // 5. DecimalV3 dominates other numerics.
    if lt.is_decimal_v3() || rt.is_decimal_v3() {
        return require_compatible(&lt, &rt);
    }

    // 6. Legacy decimal and oversized integers.
    let big_or = |ty: DataType, other: DataType| {
        (lt == ty || lt == other) && (rt == ty || rt == other)
    };
    if big_or(DataType::BigInt, DataType::DecimalV2) {
        return Ok(DataType::DecimalV2);
    }
    if big_or(DataType::BigInt, DataType::LargeInt) {
        return Ok(DataType::LargeInt);
    }

    // 7. An integer against a string literal that parses cleanly as an
    // integer stays integral, which keeps partition pruning applicable.
    if lt == DataType::BigInt && rt.is_string_like() && parses_as_long(right) {
        return Ok(DataType::BigInt);
    }
    if rt == DataType::BigInt && lt.is_string_like() && parses_as_long(left) {
        return Ok(DataType::BigInt);
    }

    // 8. Everything else compares as floating point.
    Ok(DataType::Double)
}

fn can_compare_date(lt: DataType, rt: DataType) -> bool {
    let other_qualifies =
        |ty: DataType| ty.is_date_like() || ty.is_string_like() || ty.is_integer_like();
    if lt.is_date_like() {
        other_qualifies(rt)
    } else if rt.is_date_like() {
        other_qualifies(lt)
    } else {
        false
    }
}

fn require_compatible(lt: &DataType, rt: &DataType) -> Result<DataType> {
    DataType::assignment_compatible(lt, rt).ok_or_else(|| {
        Error::type_incompatible(format!("no common type for {} and {}", lt, rt))
    })
}

fn parses_as_long(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(Value::String(s)) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

/// Fold a comparison of two literal values under three-valued logic.
///
/// Null-safe equality treats two nulls as equal and never yields null;
/// every other operator propagates null. `None` means the values have no
/// defined ordering and the comparison must stay symbolic.
pub fn fold_comparison(op: CompareOp, left: &Value, right: &Value) -> Option<Expr> {
    if op == CompareOp::NullSafeEq {
        match (left.is_null(), right.is_null()) {
            (true, true) => return Some(Expr::bool_literal(true)),
            (true, false) | (false, true) => return Some(Expr::bool_literal(false)),
            (false, false) => {}
        }
    } else if left.is_null() || right.is_null() {
        return Some(Expr::null_literal());
    }
    let ordering = left.compare(right)?;
    let outcome = match op {
        CompareOp::Eq | CompareOp::NullSafeEq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    };
    Some(Expr::bool_literal(outcome))
}

/// Analyze one binary comparison: validate operands, derive the common
/// type, insert casts, resolve the builtin signature, fold literals, and
/// estimate selectivity.
pub fn analyze_comparison(
    op: CompareOp,
    left: Expr,
    right: Expr,
    registry: &dyn FunctionRegistry,
    stats: &dyn StatsProvider,
) -> Result<ComparisonAnalysis> {
    check_subquery_operand(&left)?;
    check_subquery_operand(&right)?;

    let cmp_type = comparison_type(&left, &right)?;
    debug!(op = op.name(), %cmp_type, "analyzing comparison");

    let signature = registry
        .lookup(op.name(), &[cmp_type, cmp_type], CompareMode::IsSupertypeOf)
        .ok_or_else(|| {
            Error::internal(format!(
                "no builtin signature for {} over {}",
                op.name(),
                cmp_type
            ))
        })?;

    let selectivity = selectivity::estimate(op, &left, &right, stats);

    let expr = match (&left, &right) {
        (Expr::Literal(lv), Expr::Literal(rv)) => fold_comparison(op, lv, rv),
        _ => None,
    }
    .unwrap_or_else(|| {
        Expr::comparison(op, cast_to(left, cmp_type), cast_to(right, cmp_type))
    });

    Ok(ComparisonAnalysis {
        cmp_type,
        expr,
        signature,
        selectivity,
    })
}

fn check_subquery_operand(operand: &Expr) -> Result<()> {
    if let Expr::Subquery { plan } = operand {
        let columns = plan.output().len();
        if columns != 1 {
            return Err(Error::malformed_subquery(format!(
                "scalar subquery must return 1 column, got {}: {}",
                columns, operand
            )));
        }
    }
    Ok(())
}

fn cast_to(expr: Expr, target: DataType) -> Expr {
    if expr.data_type() == target {
        expr
    } else {
        Expr::cast(target, expr)
    }
}
