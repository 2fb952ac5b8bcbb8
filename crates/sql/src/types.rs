//! Values exchanged with a [`Connection`](crate::Connection).

/// A nullable SQL scalar, used both for statement parameters and for the
/// values of returned rows.
///
/// Every variant carries an `Option` so that SQL `NULL` keeps the type it
/// was written with.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// Boolean.
    Boolean(Option<bool>),
    /// 32-bit signed integer.
    Int32(Option<i32>),
    /// 64-bit signed integer.
    Int64(Option<i64>),
    /// 32-bit unsigned integer.
    Uint32(Option<u32>),
    /// 64-bit unsigned integer.
    Uint64(Option<u64>),
    /// Single precision float.
    Float(Option<f32>),
    /// Double precision float.
    Double(Option<f64>),
    /// UTF-8 text.
    Str(Option<String>),
    /// Raw bytes.
    Binary(Option<Vec<u8>>),
    /// Timestamp rendered as text (RFC 3339 or `%Y-%m-%d %H:%M:%S%.f`).
    Timestamp(Option<String>),
}

impl DataType {
    /// Returns `true` when the value is SQL `NULL`, whatever its type.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Boolean(None)
                | Self::Int32(None)
                | Self::Int64(None)
                | Self::Uint32(None)
                | Self::Uint64(None)
                | Self::Float(None)
                | Self::Double(None)
                | Self::Str(None)
                | Self::Binary(None)
                | Self::Timestamp(None)
        )
    }
}

/// A named value within a [`Row`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Column name as reported by the store.
    pub name: String,

    /// Column value.
    pub value: DataType,
}

/// One result row. Fields appear in the order of the statement's
/// projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Position of the row within its result set.
    pub index: String,

    /// Row values.
    pub fields: Vec<Field>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_detection() {
        assert!(DataType::Str(None).is_null());
        assert!(DataType::Int64(None).is_null());
        assert!(DataType::Timestamp(None).is_null());
        assert!(!DataType::Boolean(Some(false)).is_null());
        assert!(!DataType::Str(Some(String::new())).is_null());
    }
}
