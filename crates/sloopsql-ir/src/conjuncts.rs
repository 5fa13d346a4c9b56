#![coverage(off)]

//! Flattening and recombination of AND/OR trees.
//!
//! Predicates arrive as arbitrarily nested binary connectives; rewrite
//! rules want flat conjunct lists. `extract_*` flattens, `combine` folds a
//! list back into a left-deep tree with literal short-circuiting and
//! order-preserving deduplication, so flatten-then-combine is idempotent.

use indexmap::IndexSet;
use sloopsql_common::types::Value;

use crate::expr::{ConnectiveKind, Expr};

/// Flatten nested ANDs into a conjunct list, left to right.
pub fn extract_conjuncts(expr: &Expr) -> Vec<Expr> {
    let mut out = Vec::new();
    extract(ConnectiveKind::And, expr, &mut out);
    out
}

/// Flatten nested ORs into a disjunct list, left to right.
pub fn extract_disjuncts(expr: &Expr) -> Vec<Expr> {
    let mut out = Vec::new();
    extract(ConnectiveKind::Or, expr, &mut out);
    out
}

fn extract(kind: ConnectiveKind, expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Connective { kind: k, args } if *k == kind => {
            for arg in args {
                extract(kind, arg, out);
            }
        }
        other => out.push(other.clone()),
    }
}

/// Combine expressions under AND.
pub fn and(exprs: Vec<Expr>) -> Expr {
    combine(ConnectiveKind::And, exprs)
}

/// Combine expressions under OR.
pub fn or(exprs: Vec<Expr>) -> Expr {
    combine(ConnectiveKind::Or, exprs)
}

/// Fold a list of predicates into a left-deep connective tree.
///
/// A short-circuit literal (FALSE for AND, TRUE for OR) wins immediately;
/// identity literals are dropped; duplicates keep only their first
/// occurrence. An empty result collapses to the identity literal.
///
/// Only `And` and `Or` are valid here.
pub fn combine(kind: ConnectiveKind, exprs: Vec<Expr>) -> Expr {
    assert!(
        matches!(kind, ConnectiveKind::And | ConnectiveKind::Or),
        "combine only accepts AND/OR, got {:?}",
        kind
    );
    let short_circuit = Expr::bool_literal(matches!(kind, ConnectiveKind::Or));
    let identity = Expr::bool_literal(matches!(kind, ConnectiveKind::And));

    let mut distinct: IndexSet<Expr> = IndexSet::new();
    for expr in exprs {
        for flat in flatten_one(kind, expr) {
            if flat == short_circuit {
                return short_circuit;
            }
            if flat == identity {
                continue;
            }
            distinct.insert(flat);
        }
    }

    let mut iter = distinct.into_iter();
    let Some(first) = iter.next() else {
        return identity;
    };
    iter.fold(first, |acc, next| Expr::Connective {
        kind,
        args: vec![acc, next],
    })
}

fn flatten_one(kind: ConnectiveKind, expr: Expr) -> Vec<Expr> {
    match expr {
        Expr::Connective { kind: k, args } if k == kind => args
            .into_iter()
            .flat_map(|arg| flatten_one(kind, arg))
            .collect(),
        other => vec![other],
    }
}

/// Whether the expression is the literal TRUE.
pub fn is_literal_true(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Value::Boolean(true)))
}

/// Whether the expression is the literal FALSE.
pub fn is_literal_false(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Value::Boolean(false)))
}

#[cfg(test)]
mod tests {
    use sloopsql_common::types::DataType;

    use super::*;
    use crate::expr::{CompareOp, Slot, SlotId};

    fn pred(id: u32, name: &str, v: i64) -> Expr {
        Expr::comparison(
            CompareOp::Gt,
            Expr::column(Slot::new(SlotId(id), name, DataType::BigInt, false)),
            Expr::literal(Value::BigInt(v)),
        )
    }

    #[test]
    fn test_extract_conjuncts_flattens_nesting() {
        let expr = Expr::and(Expr::and(pred(0, "a", 1), pred(1, "b", 2)), pred(2, "c", 3));
        let conjuncts = extract_conjuncts(&expr);
        assert_eq!(conjuncts, vec![pred(0, "a", 1), pred(1, "b", 2), pred(2, "c", 3)]);
    }

    #[test]
    fn test_extract_conjuncts_stops_at_or() {
        let inner = Expr::or(pred(0, "a", 1), pred(1, "b", 2));
        let expr = Expr::and(inner.clone(), pred(2, "c", 3));
        assert_eq!(extract_conjuncts(&expr), vec![inner, pred(2, "c", 3)]);
    }

    #[test]
    fn test_combine_builds_left_deep_tree() {
        let combined = and(vec![pred(0, "a", 1), pred(1, "b", 2), pred(2, "c", 3)]);
        match &combined {
            Expr::Connective { kind, args } => {
                assert_eq!(*kind, ConnectiveKind::And);
                assert_eq!(args[1], pred(2, "c", 3));
                match &args[0] {
                    Expr::Connective { args, .. } => assert_eq!(args[0], pred(0, "a", 1)),
                    other => panic!("Expected nested Connective, got {:?}", other),
                }
            }
            other => panic!("Expected Connective, got {:?}", other),
        }
    }

    #[test]
    fn test_combine_short_circuit() {
        let combined = and(vec![pred(0, "a", 1), Expr::bool_literal(false)]);
        assert_eq!(combined, Expr::bool_literal(false));

        let combined = or(vec![pred(0, "a", 1), Expr::bool_literal(true)]);
        assert_eq!(combined, Expr::bool_literal(true));
    }

    #[test]
    fn test_combine_drops_identity_literal() {
        let combined = and(vec![Expr::bool_literal(true), pred(0, "a", 1)]);
        assert_eq!(combined, pred(0, "a", 1));

        let combined = or(vec![Expr::bool_literal(false), pred(0, "a", 1)]);
        assert_eq!(combined, pred(0, "a", 1));
    }

    #[test]
    fn test_combine_empty_is_identity() {
        assert_eq!(and(vec![]), Expr::bool_literal(true));
        assert_eq!(or(vec![]), Expr::bool_literal(false));
    }

    #[test]
    fn test_combine_dedups_preserving_order() {
        let combined = and(vec![pred(1, "b", 2), pred(0, "a", 1), pred(1, "b", 2)]);
        assert_eq!(extract_conjuncts(&combined), vec![pred(1, "b", 2), pred(0, "a", 1)]);
    }

    #[test]
    fn test_flatten_combine_idempotent() {
        let expr = Expr::and(Expr::and(pred(0, "a", 1), pred(1, "b", 2)), pred(0, "a", 1));
        let once = and(extract_conjuncts(&expr));
        let twice = and(extract_conjuncts(&once));
        assert_eq!(once, twice);
    }

    #[test]
    #[should_panic]
    fn test_combine_rejects_not() {
        combine(ConnectiveKind::Not, vec![pred(0, "a", 1)]);
    }
}
