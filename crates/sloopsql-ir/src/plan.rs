#![coverage(off)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::{Expr, Slot};

/// Join kinds recognized by the rewrite rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Cross,
    LeftOuter,
    RightOuter,
    FullOuter,
    LeftSemi,
    RightSemi,
    LeftAnti,
    RightAnti,
}

impl JoinType {
    pub fn is_inner(&self) -> bool {
        matches!(self, JoinType::Inner)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "INNER",
            JoinType::Cross => "CROSS",
            JoinType::LeftOuter => "LEFT OUTER",
            JoinType::RightOuter => "RIGHT OUTER",
            JoinType::FullOuter => "FULL OUTER",
            JoinType::LeftSemi => "LEFT SEMI",
            JoinType::RightSemi => "RIGHT SEMI",
            JoinType::LeftAnti => "LEFT ANTI",
            JoinType::RightAnti => "RIGHT ANTI",
        };
        write!(f, "{}", name)
    }
}

/// Relational operator tree.
///
/// Nodes own their children and are rebuilt, never mutated, by rewrite
/// rules. The output schema is always derived on demand from the node and
/// its children rather than cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalPlan {
    Scan {
        table: String,
        slots: Vec<Slot>,
    },
    Filter {
        predicate: Expr,
        input: Box<LogicalPlan>,
    },
    Project {
        expressions: Vec<Expr>,
        slots: Vec<Slot>,
        input: Box<LogicalPlan>,
    },
    Join {
        join_type: JoinType,
        condition: Option<Expr>,
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
    },
}

impl LogicalPlan {
    pub fn scan(table: impl Into<String>, slots: Vec<Slot>) -> LogicalPlan {
        LogicalPlan::Scan {
            table: table.into(),
            slots,
        }
    }

    pub fn filter(predicate: Expr, input: LogicalPlan) -> LogicalPlan {
        LogicalPlan::Filter {
            predicate,
            input: Box::new(input),
        }
    }

    pub fn project(expressions: Vec<Expr>, slots: Vec<Slot>, input: LogicalPlan) -> LogicalPlan {
        LogicalPlan::Project {
            expressions,
            slots,
            input: Box::new(input),
        }
    }

    pub fn join(
        join_type: JoinType,
        condition: Option<Expr>,
        left: LogicalPlan,
        right: LogicalPlan,
    ) -> LogicalPlan {
        LogicalPlan::Join {
            join_type,
            condition,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The output schema of this node.
    ///
    /// Joins adjust nullability by kind: the non-preserved side of an outer
    /// join becomes nullable, and semi/anti joins pass through one side
    /// untouched.
    pub fn output(&self) -> Vec<Slot> {
        match self {
            LogicalPlan::Scan { slots, .. } => slots.clone(),
            LogicalPlan::Filter { input, .. } => input.output(),
            LogicalPlan::Project { slots, .. } => slots.clone(),
            LogicalPlan::Join {
                join_type,
                left,
                right,
                ..
            } => {
                let left = left.output();
                let right = right.output();
                fn forced_nullable(slots: Vec<Slot>) -> Vec<Slot> {
                    slots.iter().map(|s| s.with_nullable(true)).collect()
                }
                match join_type {
                    JoinType::Inner | JoinType::Cross => {
                        left.into_iter().chain(right).collect()
                    }
                    JoinType::LeftOuter => {
                        left.into_iter().chain(forced_nullable(right)).collect()
                    }
                    JoinType::RightOuter => {
                        let mut out = forced_nullable(left);
                        out.extend(right);
                        out
                    }
                    JoinType::FullOuter => {
                        let mut out = forced_nullable(left);
                        out.extend(forced_nullable(right));
                        out
                    }
                    JoinType::LeftSemi | JoinType::LeftAnti => left,
                    JoinType::RightSemi | JoinType::RightAnti => right,
                }
            }
        }
    }
}
