use crate::config::AppConfig;
use crate::error::{AppError, ServiceErrorKind};
use crate::metadata::GeoCoordinate;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const SERVICE: &str = "geocoder";

#[async_trait]
pub trait CoordinateResolver: Send + Sync {
    /// Country name for a position, `None` when the service knows no address there.
    async fn resolve(&self, coord: GeoCoordinate) -> Result<Option<String>, AppError>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    country: Option<String>,
}

pub struct NominatimResolver {
    client: reqwest::Client,
    url: String,
}

impl NominatimResolver {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        log::debug!("Creating reverse geocoding client for URL: {}", config.geocoder_url);
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.source_timeout_secs))
            .build()
            .map_err(|e| AppError::transport(SERVICE, e))?;
        Ok(Self { client, url: config.geocoder_url.clone() })
    }
}

#[async_trait]
impl CoordinateResolver for NominatimResolver {
    async fn resolve(&self, coord: GeoCoordinate) -> Result<Option<String>, AppError> {
        log::debug!("Reverse geocoding {}, {}", coord.latitude, coord.longitude);
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("lat", coord.latitude.to_string()),
                ("lon", coord.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::service(SERVICE, ServiceErrorKind::Status(status.as_u16())));
        }

        let body = response.text().await.map_err(|e| AppError::transport(SERVICE, e))?;
        let country = country_from_body(&body)?;
        log::debug!("Resolved place: {:?}", country);
        Ok(country)
    }
}

fn country_from_body(body: &str) -> Result<Option<String>, AppError> {
    let response: ReverseResponse =
        serde_json::from_str(body).map_err(|e| AppError::parse(SERVICE, e))?;
    match response.address {
        Some(address) => Ok(address.country),
        None => {
            log::warn!("No address information found for the coordinates.");
            Ok(None)
        }
    }
}
