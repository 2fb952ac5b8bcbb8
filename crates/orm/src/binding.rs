#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use sea_query::Value;
use tabula_sql::DataType;

/// Column bindings of a live entity, keyed by column name.
pub type Fields<'a> = BTreeMap<&'static str, Binding<'a>>;

/// A typed, nullable value slot inside an entity.
///
/// Bindings are read to produce write parameters and written when a result
/// row is scanned. `None` is SQL `NULL`.
#[derive(Debug)]
pub enum Binding<'a> {
    /// Integer column.
    Int(&'a mut Option<i64>),
    /// Floating point column.
    Float(&'a mut Option<f64>),
    /// Text column.
    Text(&'a mut Option<String>),
    /// Boolean column.
    Bool(&'a mut Option<bool>),
    /// Timestamp column.
    Time(&'a mut Option<DateTime<Utc>>),
}

impl Binding<'_> {
    /// The current value, as a statement parameter.
    #[must_use]
    pub fn value(&self) -> Value {
        match self {
            Self::Int(v) => Value::BigInt(**v),
            Self::Float(v) => Value::Double(**v),
            Self::Text(v) => Value::String((**v).clone().map(Box::new)),
            Self::Bool(v) => Value::Bool(**v),
            Self::Time(v) => Value::ChronoDateTimeUtc((**v).map(Box::new)),
        }
    }

    /// Store a scanned value. `NULL` of any type clears the slot.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be represented by the binding.
    pub fn scan(&mut self, value: &DataType) -> Result<()> {
        if value.is_null() {
            self.clear();
            return Ok(());
        }

        match self {
            Self::Int(slot) => **slot = Some(as_i64(value)?),
            Self::Float(slot) => **slot = Some(as_f64(value)?),
            Self::Text(slot) => **slot = Some(as_string(value)?),
            Self::Bool(slot) => **slot = Some(as_bool(value)?),
            Self::Time(slot) => **slot = Some(as_timestamp(value)?),
        }
        Ok(())
    }

    fn clear(&mut self) {
        match self {
            Self::Int(slot) => **slot = None,
            Self::Float(slot) => **slot = None,
            Self::Text(slot) => **slot = None,
            Self::Bool(slot) => **slot = None,
            Self::Time(slot) => **slot = None,
        }
    }
}

// Inbound conversion. Stores report values in their storage class, so each
// conversion accepts the representations a store may reasonably return.

fn as_i64(value: &DataType) -> Result<i64> {
    match value {
        DataType::Int64(Some(v)) => Ok(*v),
        DataType::Int32(Some(v)) => Ok(i64::from(*v)),
        DataType::Uint32(Some(v)) => Ok(i64::from(*v)),
        DataType::Uint64(Some(v)) => Ok(i64::try_from(*v)?),
        DataType::Boolean(Some(v)) => Ok(i64::from(*v)),
        _ => bail!("expected integer data type, got {value:?}"),
    }
}

fn as_f64(value: &DataType) -> Result<f64> {
    match value {
        DataType::Double(Some(v)) => Ok(*v),
        DataType::Float(Some(v)) => Ok(f64::from(*v)),
        DataType::Int64(Some(v)) => Ok(*v as f64),
        DataType::Int32(Some(v)) => Ok(f64::from(*v)),
        _ => bail!("expected float data type, got {value:?}"),
    }
}

fn as_string(value: &DataType) -> Result<String> {
    match value {
        DataType::Str(Some(raw)) | DataType::Timestamp(Some(raw)) => Ok(raw.clone()),
        _ => bail!("expected string data type, got {value:?}"),
    }
}

fn as_bool(value: &DataType) -> Result<bool> {
    match value {
        DataType::Boolean(Some(v)) => Ok(*v),
        DataType::Int64(Some(v)) => Ok(*v != 0),
        DataType::Int32(Some(v)) => Ok(*v != 0),
        _ => bail!("expected boolean data type, got {value:?}"),
    }
}

fn as_timestamp(value: &DataType) -> Result<DateTime<Utc>> {
    match value {
        DataType::Timestamp(Some(raw)) | DataType::Str(Some(raw)) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                return Ok(parsed.with_timezone(&Utc));
            }

            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .map(|parsed| DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc))
                .map_err(|_e| {
                    anyhow!(
                        "unsupported timestamp: {raw}; expected RFC3339 or \"%Y-%m-%d %H:%M:%S%.f\" format"
                    )
                })
        }
        _ => bail!("expected timestamp data type, got {value:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_reflects_slot() {
        let mut id = Some(7);
        let mut name = None;
        assert_eq!(Binding::Int(&mut id).value(), Value::BigInt(Some(7)));
        assert_eq!(Binding::Text(&mut name).value(), Value::String(None));

        let mut title = Some("abc".to_string());
        assert_eq!(Binding::Text(&mut title).value(), Value::String(Some(Box::new("abc".to_string()))));
        assert_eq!(title.as_deref(), Some("abc"));
    }

    #[test]
    fn scan_null_clears_slot() {
        let mut value = Some(1.5);
        Binding::Float(&mut value).scan(&DataType::Str(None)).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn scan_storage_representations() {
        let mut flag = None;
        Binding::Bool(&mut flag).scan(&DataType::Int64(Some(1))).unwrap();
        assert_eq!(flag, Some(true));

        let mut real = None;
        Binding::Float(&mut real).scan(&DataType::Int64(Some(3))).unwrap();
        assert_eq!(real, Some(3.0));

        let mut count = None;
        Binding::Int(&mut count).scan(&DataType::Uint32(Some(9))).unwrap();
        assert_eq!(count, Some(9));
    }

    #[test]
    fn scan_timestamps() {
        let expected = DateTime::from_timestamp(1_000_000, 0).unwrap();

        let mut date = None;
        Binding::Time(&mut date)
            .scan(&DataType::Str(Some("1970-01-12T13:46:40+00:00".to_string())))
            .unwrap();
        assert_eq!(date, Some(expected));

        Binding::Time(&mut date)
            .scan(&DataType::Timestamp(Some("1970-01-12 13:46:40.000".to_string())))
            .unwrap();
        assert_eq!(date, Some(expected));
    }

    #[test]
    fn scan_rejects_mismatched_types() {
        let mut count = None;
        Binding::Int(&mut count).scan(&DataType::Str(Some("x".to_string()))).unwrap_err();

        let mut flag = None;
        Binding::Bool(&mut flag).scan(&DataType::Double(Some(1.0))).unwrap_err();

        let mut date = None;
        let err =
            Binding::Time(&mut date).scan(&DataType::Str(Some("not a date".to_string()))).unwrap_err();
        assert!(err.to_string().contains("unsupported timestamp"));

        let mut big = None;
        Binding::Int(&mut big).scan(&DataType::Uint64(Some(u64::MAX))).unwrap_err();
    }
}
