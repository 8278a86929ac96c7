//! Nominatim reverse-geocoding client

use crate::config::Config;
use crate::error::Result;
use reqwest::header::ACCEPT_LANGUAGE;
use sedekah_qr_common::{Coordinates, GeocodingFailure, ReverseGeocodeResponse, ReverseGeocoder};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    endpoint: String,
    accept_language: String,
}

impl NominatimClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.geocoder_url.clone(),
            accept_language: config.accept_language.clone(),
        })
    }
}

impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, coords: Coordinates) -> std::result::Result<ReverseGeocodeResponse, GeocodingFailure> {
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();
        debug!(endpoint = %self.endpoint, %lat, %lon, "reverse geocoding");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("format", "jsonv2"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("addressdetails", "1"),
            ])
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .send()
            .await
            .map_err(|e| GeocodingFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodingFailure::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodingFailure::Transport(e.to_string()))?;

        ReverseGeocodeResponse::from_json(&body)
    }
}
