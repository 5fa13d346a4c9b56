#![coverage(off)]

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// Scalar column types understood by the optimizer core.
///
/// `DecimalV2` is the legacy fixed-point family with a fixed (27, 9) layout;
/// `DecimalV3` carries explicit precision and scale. `Varchar` is the bounded
/// character type, `Text` the unbounded one. `Hll` and `Bitmap` are opaque
/// aggregate-sketch types that never participate in comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    LargeInt,
    Float,
    Double,
    DecimalV2,
    DecimalV3(u8, u8),
    Varchar(Option<u32>),
    Text,
    Date,
    DateTime,
    Hll,
    Bitmap,
}

impl DataType {
    pub const DECIMAL_MAX_PRECISION: u8 = 38;
    pub const DECIMALV2_PRECISION: u8 = 27;
    pub const DECIMALV2_SCALE: u8 = 9;

    pub fn is_integer_like(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt
                | DataType::SmallInt
                | DataType::Int
                | DataType::BigInt
                | DataType::LargeInt
        )
    }

    pub fn is_string_like(&self) -> bool {
        matches!(self, DataType::Varchar(_) | DataType::Text)
    }

    pub fn is_date_like(&self) -> bool {
        matches!(self, DataType::Date | DataType::DateTime)
    }

    pub fn is_decimal_v3(&self) -> bool {
        matches!(self, DataType::DecimalV3(_, _))
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer_like()
            || matches!(
                self,
                DataType::Float | DataType::Double | DataType::DecimalV2 | DataType::DecimalV3(_, _)
            )
    }

    /// True for types that may never appear as a comparison operand.
    pub fn is_opaque(&self) -> bool {
        matches!(self, DataType::Hll | DataType::Bitmap)
    }

    /// Digits needed to represent the integer family member losslessly.
    fn integer_precision(&self) -> Option<u8> {
        match self {
            DataType::TinyInt => Some(3),
            DataType::SmallInt => Some(5),
            DataType::Int => Some(10),
            DataType::BigInt => Some(19),
            DataType::LargeInt => Some(39),
            DataType::Null
            | DataType::Boolean
            | DataType::Float
            | DataType::Double
            | DataType::DecimalV2
            | DataType::DecimalV3(_, _)
            | DataType::Varchar(_)
            | DataType::Text
            | DataType::Date
            | DataType::DateTime
            | DataType::Hll
            | DataType::Bitmap => None,
        }
    }

    /// The widened type an operand contributes to comparison analysis.
    ///
    /// Small integers widen to `BigInt`, `Float` to `Double`, `Boolean` joins
    /// the integer family, and `Date` joins `DateTime`. Character, decimal and
    /// opaque types keep their family.
    pub fn result_type(&self) -> DataType {
        match self {
            DataType::Boolean
            | DataType::TinyInt
            | DataType::SmallInt
            | DataType::Int
            | DataType::BigInt => DataType::BigInt,
            DataType::LargeInt => DataType::LargeInt,
            DataType::Float | DataType::Double => DataType::Double,
            DataType::DecimalV2 => DataType::DecimalV2,
            DataType::DecimalV3(p, s) => DataType::DecimalV3(*p, *s),
            DataType::Varchar(len) => DataType::Varchar(*len),
            DataType::Text => DataType::Text,
            DataType::Date | DataType::DateTime => DataType::DateTime,
            DataType::Null => DataType::Null,
            DataType::Hll => DataType::Hll,
            DataType::Bitmap => DataType::Bitmap,
        }
    }

    /// Decimal layout a type occupies when drawn into decimal arithmetic.
    fn decimal_shape(&self) -> Option<(u8, u8)> {
        match self {
            DataType::DecimalV3(p, s) => Some((*p, *s)),
            DataType::DecimalV2 => Some((Self::DECIMALV2_PRECISION, Self::DECIMALV2_SCALE)),
            other => other.integer_precision().map(|p| (p, 0)),
        }
    }

    /// Common supertype both operands widen to without loss, if one exists.
    ///
    /// Integer pairs take the wider member; any decimal involvement computes
    /// the merged precision/scale and falls back to `None` when the result
    /// would overflow the decimal range; float involvement takes `Double`.
    pub fn assignment_compatible(a: &DataType, b: &DataType) -> Option<DataType> {
        if a == b {
            return Some(*a);
        }
        if *a == DataType::Null {
            return Some(*b);
        }
        if *b == DataType::Null {
            return Some(*a);
        }

        if a.is_integer_like() && b.is_integer_like() {
            let pa = a.integer_precision()?;
            let pb = b.integer_precision()?;
            return Some(if pa >= pb { *a } else { *b });
        }

        if a.is_decimal_v3() || b.is_decimal_v3() {
            if matches!(a, DataType::Float | DataType::Double)
                || matches!(b, DataType::Float | DataType::Double)
            {
                return Some(DataType::Double);
            }
            let (pa, sa) = a.decimal_shape()?;
            let (pb, sb) = b.decimal_shape()?;
            let scale = sa.max(sb);
            let integral = (pa - sa).max(pb - sb);
            let precision = integral.checked_add(scale)?;
            if precision > Self::DECIMAL_MAX_PRECISION {
                return None;
            }
            return Some(DataType::DecimalV3(precision, scale));
        }

        if (matches!(a, DataType::Float | DataType::Double) && b.is_numeric())
            || (matches!(b, DataType::Float | DataType::Double) && a.is_numeric())
        {
            return Some(DataType::Double);
        }

        None
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "NULL"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::TinyInt => write!(f, "TINYINT"),
            DataType::SmallInt => write!(f, "SMALLINT"),
            DataType::Int => write!(f, "INT"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::LargeInt => write!(f, "LARGEINT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::DecimalV2 => write!(f, "DECIMALV2"),
            DataType::DecimalV3(p, s) => write!(f, "DECIMALV3({}, {})", p, s),
            DataType::Varchar(None) => write!(f, "VARCHAR"),
            DataType::Varchar(Some(len)) => write!(f, "VARCHAR({})", len),
            DataType::Text => write!(f, "STRING"),
            DataType::Date => write!(f, "DATE"),
            DataType::DateTime => write!(f, "DATETIME"),
            DataType::Hll => write!(f, "HLL"),
            DataType::Bitmap => write!(f, "BITMAP"),
        }
    }
}

/// A literal scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    BigInt(i64),
    LargeInt(i128),
    Double(OrderedFloat<f64>),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn double(v: f64) -> Self {
        Value::Double(OrderedFloat(v))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Boolean(_) => DataType::Boolean,
            Value::BigInt(_) => DataType::BigInt,
            Value::LargeInt(_) => DataType::LargeInt,
            Value::Double(_) => DataType::Double,
            Value::Decimal(d) => {
                // Precision comes from the literal's actual significant
                // digits, not the decimal range maximum, so comparisons
                // against narrow decimal columns still find a common type.
                let scale = d.scale() as u8;
                let mut mantissa = d.mantissa().unsigned_abs();
                let mut digits: u8 = 1;
                while mantissa >= 10 {
                    mantissa /= 10;
                    digits += 1;
                }
                let precision = digits
                    .max(scale.saturating_add(1))
                    .min(DataType::DECIMAL_MAX_PRECISION);
                DataType::DecimalV3(precision, scale)
            }
            Value::String(_) => DataType::Varchar(None),
            Value::Date(_) => DataType::Date,
            Value::DateTime(_) => DataType::DateTime,
        }
    }

    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::BigInt(v) => Some(Decimal::from(*v)),
            Value::LargeInt(v) => Decimal::from_i128(*v),
            Value::Decimal(d) => Some(*d),
            Value::String(s) => s.trim().parse::<Decimal>().ok(),
            Value::Null
            | Value::Boolean(_)
            | Value::Double(_)
            | Value::Date(_)
            | Value::DateTime(_) => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::BigInt(v) => Some(*v as f64),
            Value::LargeInt(v) => Some(*v as f64),
            Value::Double(v) => Some(v.0),
            Value::Decimal(d) => d.to_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Null | Value::Boolean(_) | Value::Date(_) | Value::DateTime(_) => None,
        }
    }

    fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => d.and_hms_opt(0, 0, 0),
            Value::DateTime(dt) => Some(*dt),
            Value::String(s) => {
                let s = s.trim();
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .or_else(|| {
                        NaiveDate::parse_from_str(s, "%Y-%m-%d")
                            .ok()
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                    })
            }
            // Integers in compact date form (20200825, 20200825123000)
            // compare against date values chronologically.
            Value::BigInt(v) => datetime_from_digits(&v.to_string()),
            Value::LargeInt(v) => datetime_from_digits(&v.to_string()),
            Value::Null | Value::Boolean(_) | Value::Double(_) | Value::Decimal(_) => None,
        }
    }

    /// Cross-type literal ordering used by constant folding.
    ///
    /// Numeric values compare numerically across representations, strings
    /// lexicographically, date values chronologically (strings parse as
    /// date-times when compared against one). Incomparable pairs return
    /// `None` and are left unfolded by the caller.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Date(_) | Value::DateTime(_), _) | (_, Value::Date(_) | Value::DateTime(_)) => {
                Some(self.as_datetime()?.cmp(&other.as_datetime()?))
            }
            (Value::Double(_), _) | (_, Value::Double(_)) => self
                .as_f64()?
                .partial_cmp(&other.as_f64()?),
            _ => {
                if let (Some(a), Some(b)) = (self.as_decimal(), other.as_decimal()) {
                    Some(a.cmp(&b))
                } else {
                    self.as_f64()?.partial_cmp(&other.as_f64()?)
                }
            }
        }
    }
}

fn datetime_from_digits(digits: &str) -> Option<NaiveDateTime> {
    match digits.len() {
        8 => NaiveDate::parse_from_str(digits, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        14 => NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok(),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::LargeInt(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v.0),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "'{}'", v),
            Value::Date(v) => write!(f, "'{}'", v),
            Value::DateTime(v) => write!(f, "'{}'", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_type_widening() {
        assert_eq!(DataType::TinyInt.result_type(), DataType::BigInt);
        assert_eq!(DataType::Int.result_type(), DataType::BigInt);
        assert_eq!(DataType::BigInt.result_type(), DataType::BigInt);
        assert_eq!(DataType::LargeInt.result_type(), DataType::LargeInt);
        assert_eq!(DataType::Float.result_type(), DataType::Double);
        assert_eq!(DataType::Date.result_type(), DataType::DateTime);
        assert_eq!(
            DataType::Varchar(Some(16)).result_type(),
            DataType::Varchar(Some(16))
        );
    }

    #[test]
    fn test_assignment_compatible_integers() {
        assert_eq!(
            DataType::assignment_compatible(&DataType::Int, &DataType::BigInt),
            Some(DataType::BigInt)
        );
        assert_eq!(
            DataType::assignment_compatible(&DataType::BigInt, &DataType::LargeInt),
            Some(DataType::LargeInt)
        );
    }

    #[test]
    fn test_assignment_compatible_decimal_v3() {
        assert_eq!(
            DataType::assignment_compatible(&DataType::DecimalV3(10, 2), &DataType::BigInt),
            Some(DataType::DecimalV3(21, 2))
        );
        assert_eq!(
            DataType::assignment_compatible(
                &DataType::DecimalV3(10, 4),
                &DataType::DecimalV3(12, 2)
            ),
            Some(DataType::DecimalV3(14, 4))
        );
        // LargeInt integral digits push the merged precision past the range.
        assert_eq!(
            DataType::assignment_compatible(&DataType::DecimalV3(10, 2), &DataType::LargeInt),
            None
        );
    }

    #[test]
    fn test_assignment_compatible_double_absorbs() {
        assert_eq!(
            DataType::assignment_compatible(&DataType::Double, &DataType::BigInt),
            Some(DataType::Double)
        );
        assert_eq!(
            DataType::assignment_compatible(&DataType::DecimalV3(10, 2), &DataType::Double),
            Some(DataType::Double)
        );
    }

    #[test]
    fn test_compare_numeric_cross_representation() {
        assert_eq!(
            Value::BigInt(3).compare(&Value::double(3.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::BigInt(3).compare(&Value::Decimal(Decimal::new(35, 1))),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::LargeInt(100).compare(&Value::BigInt(99)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_string_as_number() {
        assert_eq!(
            Value::String("20200825".to_string()).compare(&Value::BigInt(20200824)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_date_against_string() {
        let date = NaiveDate::from_ymd_opt(2020, 8, 25).unwrap();
        assert_eq!(
            Value::Date(date).compare(&Value::String("2020-08-25".to_string())),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::Date(date).compare(&Value::String("2020-08-26".to_string())),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_compare_date_against_compact_integer() {
        let date = NaiveDate::from_ymd_opt(2020, 8, 25).unwrap();
        assert_eq!(
            Value::Date(date).compare(&Value::BigInt(20200825)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::Date(date).compare(&Value::BigInt(20200826123000)),
            Some(Ordering::Less)
        );
        // An integer with no date shape has no defined ordering.
        assert_eq!(Value::Date(date).compare(&Value::BigInt(5)), None);
    }

    #[test]
    fn test_decimal_literal_precision_from_digits() {
        assert_eq!(
            Value::Decimal(Decimal::new(15, 1)).data_type(),
            DataType::DecimalV3(2, 1)
        );
        assert_eq!(
            Value::Decimal(Decimal::new(12345, 2)).data_type(),
            DataType::DecimalV3(5, 2)
        );
        // Leading-zero fractions still reserve an integral digit.
        assert_eq!(
            Value::Decimal(Decimal::new(5, 2)).data_type(),
            DataType::DecimalV3(3, 2)
        );
        // A literal precision never exceeds a column's reach: merging with
        // a narrow decimal column stays within range.
        assert_eq!(
            DataType::assignment_compatible(
                &Value::Decimal(Decimal::new(15, 1)).data_type(),
                &DataType::DecimalV3(10, 2)
            ),
            Some(DataType::DecimalV3(10, 2))
        );
    }

    #[test]
    fn test_compare_null_is_undefined() {
        assert_eq!(Value::Null.compare(&Value::BigInt(1)), None);
        assert_eq!(Value::BigInt(1).compare(&Value::Null), None);
    }

    #[test]
    fn test_compare_incomparable() {
        assert_eq!(
            Value::Boolean(true).compare(&Value::String("x".to_string())),
            None
        );
    }

    #[test]
    fn test_opaque_types() {
        assert!(DataType::Hll.is_opaque());
        assert!(DataType::Bitmap.is_opaque());
        assert!(!DataType::BigInt.is_opaque());
    }
}
