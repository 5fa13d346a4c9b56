//! Rule-based logical plan rewrites for SloopSQL.
#![feature(coverage_attribute)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

mod push_predicate_through_join;
mod rule;

pub use push_predicate_through_join::PushPredicateThroughJoin;
pub use rule::RewriteRule;
