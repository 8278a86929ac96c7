//! Form-session value types
//!
//! Nothing here is persisted. Every value lives for one contribution form.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot of the QR extraction lifecycle for the current file selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionState {
    pub qr_content: Option<String>,
    pub is_extracting: bool,
    pub has_failed: bool,
    pub has_attempted: bool,
}

impl ExtractionState {
    /// State right after a file is selected, before decoding resolves
    pub fn extracting() -> Self {
        Self {
            qr_content: None,
            is_extracting: true,
            has_failed: false,
            has_attempted: false,
        }
    }

    pub fn extracted(text: String) -> Self {
        Self {
            qr_content: Some(text),
            is_extracting: false,
            has_failed: false,
            has_attempted: true,
        }
    }

    pub fn failed() -> Self {
        Self {
            qr_content: None,
            is_extracting: false,
            has_failed: true,
            has_attempted: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Submission needs an admin to extract the QR by hand
    pub fn needs_manual_extraction(&self) -> bool {
        self.has_attempted && self.qr_content.is_none()
    }
}

/// Outcome of one decode over one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    Decoded { text: String },
    NotFound,
}

/// One device position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Location fields resolved from a single reverse-geocode response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSuggestion {
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Advisory only; written to the form solely through an explicit accept
    pub suggested_name: Option<String>,
}

/// Where the bytes of a selected file live
#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// One image blob handed over by the file input
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            name,
            source: FileSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Memory(bytes),
        }
    }
}
