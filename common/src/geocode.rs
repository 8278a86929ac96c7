//! Reverse-geocoding response handling
//!
//! A response yields a complete `LocationSuggestion` or nothing.

use crate::error::GeocodingFailure;
use crate::types::{Coordinates, LocationSuggestion};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::future::Future;

lazy_static! {
    static ref INSTITUTION_NAME: Regex = Regex::new(
        r"(?i)\b(masjid|surau|mosque|musolla|musalla|madrasah|maahad|tahfiz|pondok|sekolah|pusat|yayasan|rumah|persatuan|gereja|church|kuil|temple|tokong|gurdwara)\b"
    )
    .expect("institution name pattern");
}

/// Coordinates → address lookup
pub trait ReverseGeocoder: Send + Sync + 'static {
    fn reverse(
        &self,
        coords: Coordinates,
    ) -> impl Future<Output = Result<ReverseGeocodeResponse, GeocodingFailure>> + Send;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Address {
    /// city, then town, then village
    pub fn locality(&self) -> Option<&str> {
        [&self.city, &self.town, &self.village]
            .into_iter()
            .find_map(|v| non_blank(v.as_deref()))
    }

    pub fn state(&self) -> Option<&str> {
        non_blank(self.state.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseGeocodeResponse {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Set by Nominatim when nothing is found at the coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReverseGeocodeResponse {
    pub fn from_json(body: &str) -> Result<Self, GeocodingFailure> {
        serde_json::from_str(body).map_err(|e| GeocodingFailure::Parse(e.to_string()))
    }

    /// Build a complete suggestion, or reject the whole response
    pub fn resolve(
        &self,
        coords: Coordinates,
        policy: SuggestionPolicy,
    ) -> Result<LocationSuggestion, GeocodingFailure> {
        let address = self.address.as_ref().ok_or(GeocodingFailure::MissingAddress)?;
        let city = address
            .locality()
            .ok_or(GeocodingFailure::IncompleteAddress("city"))?;
        let state = address
            .state()
            .ok_or(GeocodingFailure::IncompleteAddress("state"))?;

        Ok(LocationSuggestion {
            city: city.to_string(),
            state: state.to_string(),
            latitude: coords.latitude,
            longitude: coords.longitude,
            suggested_name: self.display_name.as_deref().and_then(|d| policy.suggest(d)),
        })
    }
}

/// How strictly a `display_name` prefix is accepted as an institution name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPolicy {
    /// Any non-empty first segment
    #[default]
    Loose,
    /// Only segments that look like a mosque, surau, school, ...
    Institutional,
}

impl SuggestionPolicy {
    pub fn suggest(&self, display_name: &str) -> Option<String> {
        let candidate = non_blank(display_name.split(',').next())?;
        match self {
            SuggestionPolicy::Loose => Some(candidate.to_string()),
            SuggestionPolicy::Institutional => INSTITUTION_NAME
                .is_match(candidate)
                .then(|| candidate.to_string()),
        }
    }
}

impl std::str::FromStr for SuggestionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loose" | "any" => Ok(SuggestionPolicy::Loose),
            "institutional" | "strict" => Ok(SuggestionPolicy::Institutional),
            _ => Err(format!("Unknown suggestion policy: {}. Use loose or institutional", s)),
        }
    }
}

impl std::fmt::Display for SuggestionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionPolicy::Loose => write!(f, "loose"),
            SuggestionPolicy::Institutional => write!(f, "institutional"),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
