//! # Reverse Geocoding
//!
//! Shelters may pass their location as a raw `"lat,lon"` pair; we resolve it
//! to a display address through a Nominatim-style `/reverse` endpoint before
//! storing. The lookup sits on the request path, so the client carries a
//! bounded timeout and any failure surfaces as a typed error instead of a
//! hang.
//!
//! The provider is configured through `GEOCODER_URL` and only the
//! `display_name` field of its response is read.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<String, AppError>;
}

pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("circleats-backend")
            .build()
            .expect("HTTP client misconfigured!");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: String,
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<String, AppError> {
        let lat = lat.to_string();
        let lon = lon.to_string();

        let response = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::GeocodingFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::GeocodingFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| AppError::GeocodingFailed(e.to_string()))?;

        Ok(body.display_name)
    }
}

/// Parse a `"lat,lon"` pair. Anything else means the string is already an
/// address.
pub fn parse_coords(location: &str) -> Option<(f64, f64)> {
    let (lat, lon) = location.split_once(',')?;

    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

/// Resolve a location string to a display address, geocoding only when it
/// looks like coordinates.
pub async fn resolve_location(
    geocoder: &dyn Geocoder,
    location: String,
) -> Result<String, AppError> {
    match parse_coords(&location) {
        Some((lat, lon)) => geocoder.reverse(lat, lon).await,
        None => Ok(location),
    }
}
