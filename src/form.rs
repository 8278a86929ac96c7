use crate::error::{Result, SedekahError};
use sedekah_qr_common::{ExtractionState, FieldSetter, FormField};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValues {
    pub name: String,
    pub city: String,
    pub state: String,
    pub lat: String,
    pub lon: String,
    pub qr_content: Option<String>,
}

impl FormValues {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::City => &self.city,
            FormField::State => &self.state,
            FormField::Lat => &self.lat,
            FormField::Lon => &self.lon,
        }
    }

    fn set(&mut self, field: FormField, value: &str) {
        let slot = match field {
            FormField::Name => &mut self.name,
            FormField::City => &mut self.city,
            FormField::State => &mut self.state,
            FormField::Lat => &mut self.lat,
            FormField::Lon => &mut self.lon,
        };
        *slot = value.to_string();
    }
}

#[derive(Debug, Default)]
pub struct ContributionForm {
    values: Mutex<FormValues>,
}

impl ContributionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> FormValues {
        self.lock().clone()
    }

    pub fn get(&self, field: FormField) -> String {
        self.lock().get(field).to_string()
    }

    /// Wired to the extraction controller's content callback
    pub fn set_qr_content(&self, content: Option<&str>) {
        self.lock().qr_content = content.map(str::to_string);
    }

    /// Build the submission payload; QR content is optional, the rest is not
    pub fn submission(&self, extraction: &ExtractionState) -> Result<Submission> {
        let values = self.values();

        let missing: Vec<&str> = [FormField::Name, FormField::City, FormField::State]
            .into_iter()
            .filter(|f| values.get(*f).trim().is_empty())
            .map(|f| f.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(SedekahError::IncompleteForm(missing.join(", ")));
        }

        Ok(Submission {
            name: values.name.trim().to_string(),
            city: values.city.trim().to_string(),
            state: values.state.trim().to_string(),
            lat: non_empty(values.lat),
            lon: non_empty(values.lon),
            needs_manual_qr: extraction.needs_manual_extraction(),
            qr_content: values.qr_content,
            extraction_failed: extraction.has_failed,
            submitted_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, FormValues> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FieldSetter for ContributionForm {
    fn set_value(&self, field: FormField, value: &str) {
        self.lock().set(field, value);
    }

    fn set_values(&self, values: &[(FormField, String)]) {
        let mut form = self.lock();
        for (field, value) in values {
            form.set(*field, value);
        }
    }
}

/// Payload handed to the directory's submission endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub name: String,
    pub city: String,
    pub state: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub qr_content: Option<String>,
    /// An admin has to pull the QR out of the uploaded image
    pub needs_manual_qr: bool,
    pub extraction_failed: bool,
    pub submitted_at: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
