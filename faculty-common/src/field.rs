use serde::{Deserialize, Serialize};

/// Why a field carries no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Absence {
    /// No element matched the selector.
    Missing { selector: String },
    /// The element exists but its text/attribute is empty.
    Blank,
    /// Content was present but could not be interpreted (e.g. a non-numeric year).
    Malformed { raw: String },
    /// The browser failed while reading the field.
    Unreadable { reason: String },
    /// Extraction never ran for this field (no detail context, failed context, ...).
    NotAttempted,
}

/// Result of extracting one field: either a value or the reason it is absent.
///
/// Absence is never an error; it is flattened to the field's default when the
/// record is aggregated, but stays inspectable until then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Field<T> {
    Present(T),
    Absent(Absence),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent(Absence::NotAttempted)
    }
}

impl<T> Field<T> {
    pub fn missing(selector: &str) -> Self {
        Field::Absent(Absence::Missing {
            selector: selector.to_string(),
        })
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Field::Present(v) => Some(v),
            Field::Absent(_) => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Present(v) => Some(v),
            Field::Absent(_) => None,
        }
    }

    pub fn absence(&self) -> Option<&Absence> {
        match self {
            Field::Present(_) => None,
            Field::Absent(a) => Some(a),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Field::Present(v) => Field::Present(f(v)),
            Field::Absent(a) => Field::Absent(a),
        }
    }
}

impl<T: Default> Field<T> {
    /// Flatten into the plain value, using `T::default()` when absent.
    pub fn value_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

impl Field<String> {
    /// `Present` for non-blank text, `Blank` otherwise.
    pub fn text(value: String) -> Self {
        if value.trim().is_empty() {
            Field::Absent(Absence::Blank)
        } else {
            Field::Present(value)
        }
    }
}
