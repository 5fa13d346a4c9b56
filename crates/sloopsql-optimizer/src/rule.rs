#![coverage(off)]

use sloopsql_common::error::Result;
use sloopsql_ir::LogicalPlan;

/// A single logical plan rewrite.
///
/// Rules are pure: they never mutate the input plan and return a freshly
/// owned tree when they fire. `Ok(None)` means the pattern did not match;
/// a declined match is not an error.
pub trait RewriteRule {
    fn name(&self) -> &'static str;

    fn apply(&self, plan: &LogicalPlan) -> Result<Option<LogicalPlan>>;
}
