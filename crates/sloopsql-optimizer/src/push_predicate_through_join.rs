#![coverage(off)]

use rustc_hash::FxHashSet;
use sloopsql_common::error::Result;
use sloopsql_ir::conjuncts;
use sloopsql_ir::{Expr, JoinType, LogicalPlan, SlotId};
use tracing::debug;

use crate::rule::RewriteRule;

/// Pushes filter conjuncts below an inner join.
///
/// Matches `Filter(Join)` and redistributes the conjuncts of the filter
/// predicate and the join condition: single-side conjuncts move into a
/// filter over that child, slot-free conjuncts move into both, and
/// join conditions spanning both sides stay on the join. Only inner joins
/// are rewritten; every other join kind declines, since pushing through
/// the null-producing side of an outer join changes results.
pub struct PushPredicateThroughJoin;

impl RewriteRule for PushPredicateThroughJoin {
    fn name(&self) -> &'static str {
        "push_predicate_through_join"
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<Option<LogicalPlan>> {
        let LogicalPlan::Filter { predicate, input } = plan else {
            return Ok(None);
        };
        let LogicalPlan::Join {
            join_type,
            condition,
            left,
            right,
        } = input.as_ref()
        else {
            return Ok(None);
        };
        if !join_type.is_inner() {
            return Ok(None);
        }

        let mut incoming = Vec::new();
        if let Some(condition) = condition {
            incoming.extend(conjuncts::extract_conjuncts(condition));
        }
        incoming.extend(conjuncts::extract_conjuncts(predicate));

        let left_output: FxHashSet<SlotId> = left.output().iter().map(|s| s.id).collect();
        let right_output: FxHashSet<SlotId> = right.output().iter().map(|s| s.id).collect();

        let mut left_pushed = Vec::new();
        let mut right_pushed = Vec::new();
        let mut join_conjuncts = Vec::new();
        for conjunct in incoming {
            if is_join_condition(&conjunct, &left_output, &right_output) {
                join_conjuncts.push(conjunct);
                continue;
            }
            let slots = conjunct.slots();
            if slots.is_empty() {
                left_pushed.push(conjunct.clone());
                right_pushed.push(conjunct);
            } else if slots.is_subset(&left_output) {
                left_pushed.push(conjunct);
            } else if slots.is_subset(&right_output) {
                right_pushed.push(conjunct);
            } else {
                join_conjuncts.push(conjunct);
            }
        }

        debug!(
            rule = self.name(),
            left = left_pushed.len(),
            right = right_pushed.len(),
            kept = join_conjuncts.len(),
            "redistributing conjuncts"
        );

        let combined = conjuncts::and(join_conjuncts);
        let condition = if conjuncts::is_literal_true(&combined) {
            None
        } else {
            Some(combined)
        };
        let rewritten = LogicalPlan::join(
            JoinType::Inner,
            condition,
            wrap_in_filter(left_pushed, left.as_ref().clone()),
            wrap_in_filter(right_pushed, right.as_ref().clone()),
        );
        Ok(Some(rewritten))
    }
}

/// A conjunct joins the two children when it is a comparison with slots on
/// both sides, each side's slots wholly produced by one child.
fn is_join_condition(
    conjunct: &Expr,
    left_output: &FxHashSet<SlotId>,
    right_output: &FxHashSet<SlotId>,
) -> bool {
    let Expr::Comparison { left, right, .. } = conjunct else {
        return false;
    };
    let ls = left.slots();
    let rs = right.slots();
    if ls.is_empty() || rs.is_empty() {
        return false;
    }
    (ls.is_subset(left_output) && rs.is_subset(right_output))
        || (ls.is_subset(right_output) && rs.is_subset(left_output))
}

fn wrap_in_filter(pushed: Vec<Expr>, child: LogicalPlan) -> LogicalPlan {
    let combined = conjuncts::and(pushed);
    if conjuncts::is_literal_true(&combined) {
        child
    } else {
        LogicalPlan::filter(combined, child)
    }
}

#[cfg(test)]
mod tests {
    use sloopsql_common::types::{DataType, Value};
    use sloopsql_ir::{CompareOp, Slot};

    use super::*;

    fn slot(id: u32, name: &str) -> Slot {
        Slot::new(SlotId(id), name, DataType::BigInt, false)
    }

    fn scan(table: &str, ids: &[(u32, &str)]) -> LogicalPlan {
        LogicalPlan::scan(table, ids.iter().map(|(id, name)| slot(*id, name)).collect())
    }

    fn gt(id: u32, name: &str, v: i64) -> Expr {
        Expr::comparison(
            CompareOp::Gt,
            Expr::column(slot(id, name)),
            Expr::literal(Value::BigInt(v)),
        )
    }

    fn eq_cols(a: (u32, &str), b: (u32, &str)) -> Expr {
        Expr::comparison(
            CompareOp::Eq,
            Expr::column(slot(a.0, a.1)),
            Expr::column(slot(b.0, b.1)),
        )
    }

    /// Flatten every predicate in the tree back into one conjunct set.
    fn all_conjuncts(plan: &LogicalPlan, out: &mut Vec<Expr>) {
        match plan {
            LogicalPlan::Scan { .. } => {}
            LogicalPlan::Filter { predicate, input } => {
                out.extend(conjuncts::extract_conjuncts(predicate));
                all_conjuncts(input, out);
            }
            LogicalPlan::Project { input, .. } => all_conjuncts(input, out),
            LogicalPlan::Join {
                condition,
                left,
                right,
                ..
            } => {
                if let Some(condition) = condition {
                    out.extend(conjuncts::extract_conjuncts(condition));
                }
                all_conjuncts(left, out);
                all_conjuncts(right, out);
            }
        }
    }

    #[test]
    fn test_pushes_single_side_conjuncts() {
        let join = LogicalPlan::join(
            JoinType::Inner,
            None,
            scan("t1", &[(0, "x")]),
            scan("t2", &[(1, "y")]),
        );
        let predicate = conjuncts::and(vec![
            gt(0, "x", 1),
            gt(1, "y", 2),
            eq_cols((0, "x"), (1, "y")),
        ]);
        let plan = LogicalPlan::filter(predicate.clone(), join);

        let rewritten = PushPredicateThroughJoin.apply(&plan).unwrap().unwrap();
        match &rewritten {
            LogicalPlan::Join {
                join_type,
                condition,
                left,
                right,
            } => {
                assert_eq!(*join_type, JoinType::Inner);
                assert_eq!(condition.as_ref().unwrap(), &eq_cols((0, "x"), (1, "y")));
                match left.as_ref() {
                    LogicalPlan::Filter { predicate, .. } => {
                        assert_eq!(predicate, &gt(0, "x", 1));
                    }
                    other => panic!("Expected Filter, got {:?}", other),
                }
                match right.as_ref() {
                    LogicalPlan::Filter { predicate, .. } => {
                        assert_eq!(predicate, &gt(1, "y", 2));
                    }
                    other => panic!("Expected Filter, got {:?}", other),
                }
            }
            other => panic!("Expected Join, got {:?}", other),
        }

        // No atomic predicate is lost or invented.
        let mut before = Vec::new();
        all_conjuncts(&plan, &mut before);
        let mut after = Vec::new();
        all_conjuncts(&rewritten, &mut after);
        before.sort_by_key(|e| format!("{}", e));
        after.sort_by_key(|e| format!("{}", e));
        assert_eq!(before, after);
    }

    #[test]
    fn test_merges_on_condition_conjuncts() {
        let join = LogicalPlan::join(
            JoinType::Inner,
            Some(conjuncts::and(vec![
                eq_cols((0, "x"), (1, "y")),
                gt(1, "y", 2),
            ])),
            scan("t1", &[(0, "x")]),
            scan("t2", &[(1, "y")]),
        );
        let plan = LogicalPlan::filter(gt(0, "x", 1), join);

        let rewritten = PushPredicateThroughJoin.apply(&plan).unwrap().unwrap();
        match &rewritten {
            LogicalPlan::Join {
                condition,
                left,
                right,
                ..
            } => {
                assert_eq!(condition.as_ref().unwrap(), &eq_cols((0, "x"), (1, "y")));
                assert!(matches!(left.as_ref(), LogicalPlan::Filter { .. }));
                assert!(matches!(right.as_ref(), LogicalPlan::Filter { .. }));
            }
            other => panic!("Expected Join, got {:?}", other),
        }
    }

    #[test]
    fn test_constant_true_conjunct_dropped() {
        let join = LogicalPlan::join(
            JoinType::Inner,
            None,
            scan("t1", &[(0, "x")]),
            scan("t2", &[(1, "y")]),
        );
        let predicate = Expr::and(Expr::bool_literal(true), gt(0, "x", 1));
        let plan = LogicalPlan::filter(predicate, join);

        let rewritten = PushPredicateThroughJoin.apply(&plan).unwrap().unwrap();
        match &rewritten {
            LogicalPlan::Join {
                condition,
                left,
                right,
                ..
            } => {
                assert!(condition.is_none());
                match left.as_ref() {
                    LogicalPlan::Filter { predicate, .. } => {
                        assert_eq!(predicate, &gt(0, "x", 1));
                    }
                    other => panic!("Expected Filter, got {:?}", other),
                }
                assert!(matches!(right.as_ref(), LogicalPlan::Scan { .. }));
            }
            other => panic!("Expected Join, got {:?}", other),
        }
    }

    #[test]
    fn test_slot_free_conjunct_goes_to_both_sides() {
        let join = LogicalPlan::join(
            JoinType::Inner,
            None,
            scan("t1", &[(0, "x")]),
            scan("t2", &[(1, "y")]),
        );
        let constant = Expr::comparison(
            CompareOp::Lt,
            Expr::literal(Value::BigInt(1)),
            Expr::literal(Value::BigInt(2)),
        );
        let plan = LogicalPlan::filter(constant.clone(), join);

        let rewritten = PushPredicateThroughJoin.apply(&plan).unwrap().unwrap();
        match &rewritten {
            LogicalPlan::Join { left, right, .. } => {
                for side in [left, right] {
                    match side.as_ref() {
                        LogicalPlan::Filter { predicate, .. } => assert_eq!(predicate, &constant),
                        other => panic!("Expected Filter, got {:?}", other),
                    }
                }
            }
            other => panic!("Expected Join, got {:?}", other),
        }
    }

    #[test]
    fn test_non_equi_cross_side_conjunct_stays_on_join() {
        let join = LogicalPlan::join(
            JoinType::Inner,
            None,
            scan("t1", &[(0, "x")]),
            scan("t2", &[(1, "y")]),
        );
        // References both sides inside one operand, so it is not a join
        // condition and cannot be pushed to either child.
        let mixed = Expr::comparison(
            CompareOp::Gt,
            Expr::Function {
                name: "bitand".to_string(),
                args: vec![Expr::column(slot(0, "x")), Expr::column(slot(1, "y"))],
                return_type: DataType::BigInt,
                nullable: false,
            },
            Expr::literal(Value::BigInt(0)),
        );
        let plan = LogicalPlan::filter(mixed.clone(), join);

        let rewritten = PushPredicateThroughJoin.apply(&plan).unwrap().unwrap();
        match &rewritten {
            LogicalPlan::Join {
                condition,
                left,
                right,
                ..
            } => {
                assert_eq!(condition.as_ref().unwrap(), &mixed);
                assert!(matches!(left.as_ref(), LogicalPlan::Scan { .. }));
                assert!(matches!(right.as_ref(), LogicalPlan::Scan { .. }));
            }
            other => panic!("Expected Join, got {:?}", other),
        }
    }

    #[test]
    fn test_reversed_join_condition_recognized() {
        let join = LogicalPlan::join(
            JoinType::Inner,
            None,
            scan("t1", &[(0, "x")]),
            scan("t2", &[(1, "y")]),
        );
        let reversed = eq_cols((1, "y"), (0, "x"));
        let plan = LogicalPlan::filter(reversed.clone(), join);

        let rewritten = PushPredicateThroughJoin.apply(&plan).unwrap().unwrap();
        match &rewritten {
            LogicalPlan::Join { condition, .. } => {
                assert_eq!(condition.as_ref().unwrap(), &reversed);
            }
            other => panic!("Expected Join, got {:?}", other),
        }
    }

    #[test]
    fn test_outer_join_declines() {
        for join_type in [
            JoinType::LeftOuter,
            JoinType::RightOuter,
            JoinType::FullOuter,
            JoinType::LeftSemi,
            JoinType::LeftAnti,
        ] {
            let join = LogicalPlan::join(
                join_type,
                Some(eq_cols((0, "x"), (1, "y"))),
                scan("t1", &[(0, "x")]),
                scan("t2", &[(1, "y")]),
            );
            let plan = LogicalPlan::filter(gt(0, "x", 1), join);
            assert_eq!(PushPredicateThroughJoin.apply(&plan).unwrap(), None);
        }
    }

    #[test]
    fn test_non_matching_shapes_decline() {
        let scan_only = scan("t1", &[(0, "x")]);
        assert_eq!(PushPredicateThroughJoin.apply(&scan_only).unwrap(), None);

        let filter_over_scan = LogicalPlan::filter(gt(0, "x", 1), scan("t1", &[(0, "x")]));
        assert_eq!(PushPredicateThroughJoin.apply(&filter_over_scan).unwrap(), None);
    }

    #[test]
    fn test_rewrite_does_not_match_again() {
        let join = LogicalPlan::join(
            JoinType::Inner,
            None,
            scan("t1", &[(0, "x")]),
            scan("t2", &[(1, "y")]),
        );
        let plan = LogicalPlan::filter(
            conjuncts::and(vec![gt(0, "x", 1), eq_cols((0, "x"), (1, "y"))]),
            join,
        );
        let rewritten = PushPredicateThroughJoin.apply(&plan).unwrap().unwrap();
        assert_eq!(PushPredicateThroughJoin.apply(&rewritten).unwrap(), None);
    }
}
