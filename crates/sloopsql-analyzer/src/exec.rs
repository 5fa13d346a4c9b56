#![coverage(off)]

//! Execution-time expression representation.
//!
//! Analyzed [`sloopsql_ir::Expr`] trees are lowered onto this form by
//! [`crate::translate`]. Nodes carry the metadata execution needs inline
//! instead of reaching back into the logical tree.

use serde::{Deserialize, Serialize};
use sloopsql_common::error::{Error, Result};
use sloopsql_common::types::{DataType, Value};
use sloopsql_ir::{CompareOp, ConnectiveKind, SlotId};

use crate::registry::{CompareMode, FunctionRegistry, FunctionSignature};

/// An executable expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecExpr {
    Literal(Value),
    SlotRef {
        slot: SlotId,
        data_type: DataType,
    },
    BinaryPred {
        op: CompareOp,
        /// Resolved builtin, assigned by [`ExecExpr::finalize`].
        signature: Option<FunctionSignature>,
        children: Vec<ExecExpr>,
    },
    CompoundPred {
        kind: ConnectiveKind,
        children: Vec<ExecExpr>,
    },
    Cast {
        target: DataType,
        child: Box<ExecExpr>,
    },
    FunctionCall {
        name: String,
        children: Vec<ExecExpr>,
        return_type: DataType,
    },
    AggregateCall {
        name: String,
        distinct: bool,
        children: Vec<ExecExpr>,
        return_type: DataType,
    },
}

impl ExecExpr {
    pub fn data_type(&self) -> DataType {
        match self {
            ExecExpr::Literal(value) => value.data_type(),
            ExecExpr::SlotRef { data_type, .. } => *data_type,
            ExecExpr::BinaryPred { .. } | ExecExpr::CompoundPred { .. } => DataType::Boolean,
            ExecExpr::Cast { target, .. } => *target,
            ExecExpr::FunctionCall { return_type, .. }
            | ExecExpr::AggregateCall { return_type, .. } => *return_type,
        }
    }

    /// Resolve derived metadata bottom-up after construction.
    ///
    /// Binary predicates look up their builtin under the relaxed mode the
    /// execution engine accepts. A miss here means analysis let an
    /// unsupported operand pairing through, which is an internal fault
    /// rather than a user error.
    pub fn finalize(&mut self, registry: &dyn FunctionRegistry) -> Result<()> {
        match self {
            ExecExpr::Literal(_) | ExecExpr::SlotRef { .. } => Ok(()),
            ExecExpr::BinaryPred {
                op,
                signature,
                children,
            } => {
                for child in children.iter_mut() {
                    child.finalize(registry)?;
                }
                let arg_types: Vec<DataType> =
                    children.iter().map(ExecExpr::data_type).collect();
                let resolved = registry
                    .lookup(op.name(), &arg_types, CompareMode::IsNonstrictSupertypeOf)
                    .ok_or_else(|| {
                        Error::internal(format!(
                            "no builtin for {} over {:?}",
                            op.name(),
                            arg_types
                        ))
                    })?;
                *signature = Some(resolved);
                Ok(())
            }
            ExecExpr::CompoundPred { children, .. }
            | ExecExpr::FunctionCall { children, .. }
            | ExecExpr::AggregateCall { children, .. } => {
                for child in children.iter_mut() {
                    child.finalize(registry)?;
                }
                Ok(())
            }
            ExecExpr::Cast { child, .. } => child.finalize(registry),
        }
    }
}
