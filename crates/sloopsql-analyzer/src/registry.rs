#![coverage(off)]

//! Builtin function signature resolution.
//!
//! The registry is an explicit collaborator passed into the analysis entry
//! points rather than a process-wide singleton, so tests can swap in their
//! own tables.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use sloopsql_common::types::DataType;
use sloopsql_ir::CompareOp;

/// How strictly a candidate signature must match the queried argument
/// types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMode {
    /// Argument types equal the parameter types exactly.
    IsIdentical,
    /// Each parameter accepts the argument through lossless implicit
    /// widening.
    IsSupertypeOf,
    /// Widening plus the lossy string conversions allowed at execution
    /// time.
    IsNonstrictSupertypeOf,
}

/// A resolved builtin signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub arg_types: Vec<DataType>,
    pub return_type: DataType,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, arg_types: Vec<DataType>, return_type: DataType) -> Self {
        Self {
            name: name.into(),
            arg_types,
            return_type,
        }
    }
}

/// Lookup of builtin signatures by name and argument types.
pub trait FunctionRegistry {
    fn lookup(
        &self,
        name: &str,
        arg_types: &[DataType],
        mode: CompareMode,
    ) -> Option<FunctionSignature>;
}

/// The default builtin table.
///
/// Every comparison operator is registered over each comparable type as
/// `(t, t) -> Boolean`. `Null` is never registered; null operands are
/// promoted to a concrete type during coercion before lookup.
pub struct BuiltinRegistry {
    by_name: FxHashMap<String, Vec<FunctionSignature>>,
}

/// Comparable types, parameterized families represented by a canonical
/// member (`DecimalV3(38, 0)`, unbounded `Varchar`).
const COMPARABLE_TYPES: &[DataType] = &[
    DataType::Boolean,
    DataType::TinyInt,
    DataType::SmallInt,
    DataType::Int,
    DataType::BigInt,
    DataType::LargeInt,
    DataType::Float,
    DataType::Double,
    DataType::DecimalV2,
    DataType::DecimalV3(38, 0),
    DataType::Varchar(None),
    DataType::Text,
    DataType::Date,
    DataType::DateTime,
];

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            by_name: FxHashMap::default(),
        };
        for op in [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Le,
            CompareOp::Ge,
            CompareOp::Lt,
            CompareOp::Gt,
            CompareOp::NullSafeEq,
        ] {
            for &ty in COMPARABLE_TYPES {
                registry.register(FunctionSignature::new(
                    op.name(),
                    vec![ty, ty],
                    DataType::Boolean,
                ));
            }
        }
        registry
    }

    pub fn register(&mut self, signature: FunctionSignature) {
        self.by_name
            .entry(signature.name.clone())
            .or_default()
            .push(signature);
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry for BuiltinRegistry {
    fn lookup(
        &self,
        name: &str,
        arg_types: &[DataType],
        mode: CompareMode,
    ) -> Option<FunctionSignature> {
        let candidates = self.by_name.get(name)?;
        // Exact matches win over widening matches regardless of mode.
        if let Some(exact) = candidates.iter().find(|c| {
            c.arg_types.len() == arg_types.len()
                && c.arg_types.iter().zip(arg_types).all(|(p, a)| p == a)
        }) {
            return Some(exact.clone());
        }
        if mode == CompareMode::IsIdentical {
            return None;
        }
        candidates
            .iter()
            .find(|c| {
                c.arg_types.len() == arg_types.len()
                    && c.arg_types
                        .iter()
                        .zip(arg_types)
                        .all(|(p, a)| accepts(*p, *a, mode))
            })
            .cloned()
    }
}

/// Whether a parameter type accepts an argument type under the given mode.
fn accepts(param: DataType, arg: DataType, mode: CompareMode) -> bool {
    if param == arg || arg == DataType::Null {
        return true;
    }
    // Parameterized families match by family, not by parameters.
    match (param, arg) {
        (DataType::DecimalV3(_, _), DataType::DecimalV3(_, _)) => return true,
        (DataType::Varchar(_), DataType::Varchar(_)) => return true,
        _ => {}
    }
    let widens = match (param, arg) {
        (p, a) if p.is_integer_like() && a.is_integer_like() => {
            integer_rank(a) <= integer_rank(p)
        }
        (DataType::Double, a) => a.is_numeric(),
        (DataType::Float, a) => a.is_integer_like(),
        (DataType::DecimalV2 | DataType::DecimalV3(_, _), a) => a.is_integer_like(),
        (DataType::DateTime, DataType::Date) => true,
        (DataType::Text, DataType::Varchar(_)) => true,
        _ => false,
    };
    if widens {
        return true;
    }
    // Non-strict mode additionally allows string arguments anywhere a
    // runtime parse exists.
    mode == CompareMode::IsNonstrictSupertypeOf
        && arg.is_string_like()
        && (param.is_numeric() || param.is_date_like())
}

fn integer_rank(ty: DataType) -> u8 {
    match ty {
        DataType::TinyInt => 1,
        DataType::SmallInt => 2,
        DataType::Int => 3,
        DataType::BigInt => 4,
        DataType::LargeInt => 5,
        _ => 0,
    }
}
