#![coverage(off)]

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use sloopsql_common::error::{Error, Result};
use sloopsql_common::types::{DataType, Value};

use crate::plan::LogicalPlan;
use crate::visitor::ExprVisitor;

/// Identity of a resolved column reference, stable across rewrites.
///
/// Rewrite rules compare slots by id only; ownership of the referenced
/// column stays with the plan node that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved column reference with its derived metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Slot {
    pub fn new(id: SlotId, name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn with_nullable(&self, nullable: bool) -> Self {
        Self {
            nullable,
            ..self.clone()
        }
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    NullSafeEq,
}

impl CompareOp {
    /// Display symbol used in SQL text.
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::NullSafeEq => "<=>",
        }
    }

    /// Canonical name used for builtin signature lookup.
    pub fn name(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Le => "le",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Gt => "gt",
            CompareOp::NullSafeEq => "eq_for_null",
        }
    }

    /// The operator that preserves meaning when the operands swap sides.
    pub fn converse(&self) -> CompareOp {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Ge => CompareOp::Le,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::NullSafeEq => CompareOp::NullSafeEq,
        }
    }

    /// The logically negated operator.
    ///
    /// `NullSafeEq` has no defined negation under three-valued logic and is
    /// rejected rather than mapped to itself.
    pub fn negated(&self) -> Result<CompareOp> {
        match self {
            CompareOp::Eq => Ok(CompareOp::Ne),
            CompareOp::Ne => Ok(CompareOp::Eq),
            CompareOp::Lt => Ok(CompareOp::Ge),
            CompareOp::Le => Ok(CompareOp::Gt),
            CompareOp::Ge => Ok(CompareOp::Lt),
            CompareOp::Gt => Ok(CompareOp::Le),
            CompareOp::NullSafeEq => Err(Error::invalid_operation(
                "operator <=> has no negated form",
            )),
        }
    }

    pub fn is_equivalence(&self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::NullSafeEq)
    }

    pub fn is_null_unsafe_equivalence(&self) -> bool {
        matches!(self, CompareOp::Eq)
    }

    pub fn is_unequivalence(&self) -> bool {
        matches!(self, CompareOp::Ne)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Boolean connective kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectiveKind {
    And,
    Or,
    Not,
}

impl ConnectiveKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ConnectiveKind::And => "AND",
            ConnectiveKind::Or => "OR",
            ConnectiveKind::Not => "NOT",
        }
    }
}

/// Which operand of a comparison holds a sought slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindSide {
    Left,
    Right,
}

/// Result of slot-binding discovery on a comparison.
///
/// Returned by value instead of being recorded as hidden state on the
/// predicate node during traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotBinding {
    pub bound_side: BindSide,
    pub residual: Expr,
}

/// A scalar expression tree.
///
/// Nodes are immutable once built; structural equality and hashing go by
/// node kind and children, never by identity. `Comparison` always has
/// exactly two children; `Connective` with kind `Not` has exactly one
/// operand, `And`/`Or` have two at construction time (the canonicalizer in
/// [`crate::conjuncts`] flattens them into n-ary lists for analysis).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Literal(Value),
    Column(Slot),
    Comparison {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Connective {
        kind: ConnectiveKind,
        args: Vec<Expr>,
    },
    Cast {
        target: DataType,
        operand: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
        return_type: DataType,
        nullable: bool,
    },
    Aggregate {
        name: String,
        distinct: bool,
        args: Vec<Expr>,
        return_type: DataType,
    },
    Subquery {
        plan: Box<LogicalPlan>,
    },
}

impl Expr {
    pub fn literal(value: Value) -> Expr {
        Expr::Literal(value)
    }

    pub fn bool_literal(value: bool) -> Expr {
        Expr::Literal(Value::Boolean(value))
    }

    pub fn null_literal() -> Expr {
        Expr::Literal(Value::Null)
    }

    pub fn column(slot: Slot) -> Expr {
        Expr::Column(slot)
    }

    pub fn comparison(op: CompareOp, left: Expr, right: Expr) -> Expr {
        Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::Connective {
            kind: ConnectiveKind::And,
            args: vec![left, right],
        }
    }

    pub fn or(left: Expr, right: Expr) -> Expr {
        Expr::Connective {
            kind: ConnectiveKind::Or,
            args: vec![left, right],
        }
    }

    pub fn not(operand: Expr) -> Expr {
        Expr::Connective {
            kind: ConnectiveKind::Not,
            args: vec![operand],
        }
    }

    pub fn cast(target: DataType, operand: Expr) -> Expr {
        Expr::Cast {
            target,
            operand: Box::new(operand),
        }
    }

    /// The expression's derived data type.
    pub fn data_type(&self) -> DataType {
        match self {
            Expr::Literal(value) => value.data_type(),
            Expr::Column(slot) => slot.data_type,
            Expr::Comparison { .. } => DataType::Boolean,
            Expr::Connective { .. } => DataType::Boolean,
            Expr::Cast { target, .. } => *target,
            Expr::Function { return_type, .. } => *return_type,
            Expr::Aggregate { return_type, .. } => *return_type,
            Expr::Subquery { plan } => plan
                .output()
                .first()
                .map(|s| s.data_type)
                .unwrap_or(DataType::Null),
        }
    }

    /// Whether the expression may evaluate to NULL.
    ///
    /// Derived from the children, except for intrinsic overrides: a
    /// null-safe equality is never nullable regardless of its operands.
    pub fn nullable(&self) -> bool {
        match self {
            Expr::Literal(value) => value.is_null(),
            Expr::Column(slot) => slot.nullable,
            Expr::Comparison {
                op: CompareOp::NullSafeEq,
                ..
            } => false,
            Expr::Comparison { left, right, .. } => left.nullable() || right.nullable(),
            Expr::Connective { args, .. } => args.iter().any(Expr::nullable),
            Expr::Cast { operand, .. } => operand.nullable(),
            Expr::Function { nullable, .. } => *nullable,
            Expr::Aggregate { .. } => true,
            Expr::Subquery { plan } => plan.output().first().is_none_or(|s| s.nullable),
        }
    }

    /// Logical negation.
    ///
    /// Comparisons flip to their negated operator; a double negation
    /// unwraps; anything else is wrapped in NOT. Negating a null-safe
    /// equality is rejected.
    pub fn negate(&self) -> Result<Expr> {
        match self {
            Expr::Comparison { op, left, right } => Ok(Expr::Comparison {
                op: op.negated()?,
                left: left.clone(),
                right: right.clone(),
            }),
            Expr::Connective {
                kind: ConnectiveKind::Not,
                args,
            } if args.len() == 1 => Ok(args[0].clone()),
            other => Ok(Expr::not(other.clone())),
        }
    }

    /// All slot ids referenced anywhere in this expression.
    pub fn slots(&self) -> FxHashSet<SlotId> {
        let mut out = FxHashSet::default();
        self.collect_slots(&mut out);
        out
    }

    fn collect_slots(&self, out: &mut FxHashSet<SlotId>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Column(slot) => {
                out.insert(slot.id);
            }
            Expr::Comparison { left, right, .. } => {
                left.collect_slots(out);
                right.collect_slots(out);
            }
            Expr::Connective { args, .. }
            | Expr::Function { args, .. }
            | Expr::Aggregate { args, .. } => {
                for arg in args {
                    arg.collect_slots(out);
                }
            }
            Expr::Cast { operand, .. } => operand.collect_slots(out),
            // Subquery output is produced by its own plan, not by the
            // enclosing one; correlated references are out of scope.
            Expr::Subquery { .. } => {}
        }
    }

    /// If this is a comparison of the form `<slot> <op> <expr>` (slot possibly
    /// under casts) binding the given slot id, report which side binds it and
    /// the opposite operand.
    pub fn slot_binding(&self, id: SlotId) -> Option<SlotBinding> {
        let Expr::Comparison { left, right, .. } = self else {
            return None;
        };
        if Self::unwrap_cast(left).is_some_and(|s| s.id == id) {
            return Some(SlotBinding {
                bound_side: BindSide::Left,
                residual: (**right).clone(),
            });
        }
        if Self::unwrap_cast(right).is_some_and(|s| s.id == id) {
            return Some(SlotBinding {
                bound_side: BindSide::Right,
                residual: (**left).clone(),
            });
        }
        None
    }

    fn unwrap_cast(mut expr: &Expr) -> Option<&Slot> {
        while let Expr::Cast { operand, .. } = expr {
            expr = operand;
        }
        match expr {
            Expr::Column(slot) => Some(slot),
            _ => None,
        }
    }

    /// Double-dispatch entry point for type-specific expression consumers.
    pub fn accept<R, C, V: ExprVisitor<R, C>>(&self, visitor: &mut V, ctx: &mut C) -> R {
        match self {
            Expr::Literal(value) => visitor.visit_literal(value, ctx),
            Expr::Column(slot) => visitor.visit_column(slot, ctx),
            Expr::Comparison { op, left, right } => visitor.visit_comparison(*op, left, right, ctx),
            Expr::Connective { kind, args } => visitor.visit_connective(*kind, args, ctx),
            Expr::Cast { target, operand } => visitor.visit_cast(*target, operand, ctx),
            Expr::Function {
                name,
                args,
                return_type,
                nullable,
            } => visitor.visit_function(name, args, *return_type, *nullable, ctx),
            Expr::Aggregate {
                name,
                distinct,
                args,
                return_type,
            } => visitor.visit_aggregate(name, *distinct, args, *return_type, ctx),
            Expr::Subquery { plan } => visitor.visit_subquery(plan, ctx),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Column(slot) => write!(f, "{}", slot.name),
            Expr::Comparison { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Connective {
                kind: ConnectiveKind::Not,
                args,
            } if args.len() == 1 => write!(f, "(NOT {})", args[0]),
            Expr::Connective { kind, args } => {
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", kind.keyword())?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Cast { target, operand } => write!(f, "CAST({} AS {})", operand, target),
            Expr::Function { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Aggregate {
                name,
                distinct,
                args,
                ..
            } => {
                write!(f, "{}(", name)?;
                if *distinct {
                    write!(f, "DISTINCT ")?;
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Subquery { plan } => {
                write!(f, "(SUBQUERY")?;
                for (i, slot) in plan.output().iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { " " } else { ", " }, slot.name)?;
                }
                write!(f, ")")
            }
        }
    }
}
