//! SloopSQL optimizer core.
//!
//! The expression analysis and rule-based rewrite layer of a distributed
//! SQL query optimizer: a typed scalar expression model, comparison type
//! coercion with literal folding, logical plan nodes with derived output
//! schemas, predicate pushdown through inner joins, and translation of
//! analyzed expressions into an execution-time form.
//!
//! The crate is a facade over the workspace members:
//!
//! - [`sloopsql_common`] for shared types and errors
//! - [`sloopsql_ir`] for expressions and logical plans
//! - [`sloopsql_analyzer`] for coercion, registries, and translation
//! - [`sloopsql_optimizer`] for rewrite rules
#![feature(coverage_attribute)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub use sloopsql_analyzer::{
    BuiltinRegistry, CompareMode, ComparisonAnalysis, DEFAULT_SELECTIVITY, ExecExpr,
    FunctionRegistry, FunctionSignature, NoStats, StatsProvider, analyze_comparison,
    comparison_type, fold_comparison, translate,
};
pub use sloopsql_common::{DataType, Error, Result, Value};
pub use sloopsql_ir::{
    BindSide, CompareOp, ConnectiveKind, Expr, ExprVisitor, JoinType, LogicalPlan, Slot,
    SlotBinding, SlotId, conjuncts,
};
pub use sloopsql_optimizer::{PushPredicateThroughJoin, RewriteRule};
