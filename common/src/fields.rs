//! Form field setter contract

use serde::{Deserialize, Serialize};

/// Fields the core is allowed to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Name,
    City,
    State,
    Lat,
    Lon,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::City => "city",
            FormField::State => "state",
            FormField::Lat => "lat",
            FormField::Lon => "lon",
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait FieldSetter: Send + Sync {
    fn set_value(&self, field: FormField, value: &str);

    /// Write several fields as one batch.
    ///
    /// Implementations backed by shared state should override this so that
    /// readers never observe a partially applied batch.
    fn set_values(&self, values: &[(FormField, String)]) {
        for (field, value) in values {
            self.set_value(*field, value);
        }
    }
}

impl<T: FieldSetter + ?Sized> FieldSetter for std::sync::Arc<T> {
    fn set_value(&self, field: FormField, value: &str) {
        (**self).set_value(field, value)
    }

    fn set_values(&self, values: &[(FormField, String)]) {
        (**self).set_values(values)
    }
}
