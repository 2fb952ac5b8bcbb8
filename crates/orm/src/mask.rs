use std::collections::BTreeSet;

/// Selects the columns an operation touches.
///
/// An include mask names the only participating columns; an exclude mask
/// names the columns left out. The same mask drives read projections and
/// write column sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMask {
    /// Only the named columns participate.
    Include(BTreeSet<&'static str>),
    /// Every column except the named ones participates.
    Exclude(BTreeSet<&'static str>),
}

impl Default for FieldMask {
    /// Every column participates.
    fn default() -> Self {
        Self::Exclude(BTreeSet::new())
    }
}

impl FieldMask {
    /// Creates a mask selecting only `names`.
    #[must_use]
    pub fn include(names: impl IntoIterator<Item = &'static str>) -> Self {
        Self::Include(names.into_iter().collect())
    }

    /// Creates a mask selecting every column except `names`.
    #[must_use]
    pub fn exclude(names: impl IntoIterator<Item = &'static str>) -> Self {
        Self::Exclude(names.into_iter().collect())
    }

    /// Whether `column` takes part in the operation.
    #[must_use]
    pub fn participates(&self, column: &str) -> bool {
        match self {
            Self::Include(names) => names.contains(column),
            Self::Exclude(names) => !names.contains(column),
        }
    }

    /// The column names listed by the mask, whatever its mode.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        match self {
            Self::Include(names) | Self::Exclude(names) => names.iter().copied(),
        }
    }
}
