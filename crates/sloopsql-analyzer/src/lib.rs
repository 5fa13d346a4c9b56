//! Comparison analysis and expression translation for SloopSQL.
//!
//! This crate owns the semantic layer between the logical IR and
//! execution: type coercion for binary comparisons, literal folding under
//! three-valued logic, the builtin comparison registry, selectivity
//! estimation, and translation of analyzed expressions into executable
//! form.
#![feature(coverage_attribute)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod coercion;
pub mod exec;
pub mod registry;
pub mod selectivity;
pub mod translate;

pub use coercion::{ComparisonAnalysis, analyze_comparison, comparison_type, fold_comparison};
pub use exec::ExecExpr;
pub use registry::{BuiltinRegistry, CompareMode, FunctionRegistry, FunctionSignature};
pub use selectivity::{DEFAULT_SELECTIVITY, NoStats, StatsProvider};
pub use translate::translate;
