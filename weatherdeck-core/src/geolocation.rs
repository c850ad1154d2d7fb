//! Automatic location detection used for the initial query.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, str::FromStr};

use crate::{error::QueryError, http};

const IP_LOOKUP_URL: &str = "http://ip-api.com/json";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// `"lat,lon"` form accepted as a location query.
    pub fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = value
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("Expected coordinates as LAT,LON, got '{value}'"))?;

        let latitude: f64 = lat.trim().parse().with_context(|| format!("Invalid latitude '{lat}'"))?;
        let longitude: f64 =
            lon.trim().parse().with_context(|| format!("Invalid longitude '{lon}'"))?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            anyhow::bail!("Coordinates out of range: {latitude},{longitude}");
        }

        Ok(Self { latitude, longitude })
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    /// Capability check made before any request.
    fn is_supported(&self) -> bool {
        true
    }

    /// A single location request. No retries.
    async fn locate(&self) -> Result<Coordinates, QueryError>;
}

/// Approximate position of this machine from its public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    http: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpGeolocator {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_endpoint(IP_LOOKUP_URL)
    }

    pub fn with_endpoint(endpoint: &str) -> anyhow::Result<Self> {
        let http = http::client("IP geolocation")?;

        Ok(Self { http, endpoint: endpoint.to_string() })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, QueryError> {
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| QueryError::GeolocationDenied(e.to_string()))?;

        let parsed: IpLookupResponse = res
            .json()
            .await
            .map_err(|e| QueryError::GeolocationDenied(e.to_string()))?;

        match (parsed.status.as_str(), parsed.lat, parsed.lon) {
            ("success", Some(latitude), Some(longitude)) => {
                tracing::info!(latitude, longitude, "located via IP lookup");
                Ok(Coordinates { latitude, longitude })
            }
            _ => Err(QueryError::GeolocationDenied(
                parsed.message.unwrap_or_else(|| "lookup returned no position".to_string()),
            )),
        }
    }
}

/// A position supplied up front, e.g. from the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn locate(&self) -> Result<Coordinates, QueryError> {
        Ok(self.0)
    }
}

/// Location detection switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

#[async_trait]
impl Geolocator for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    async fn locate(&self) -> Result<Coordinates, QueryError> {
        Err(QueryError::GeolocationUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn coordinates_parse_and_format() {
        let coords: Coordinates = "48.8566, 2.3522".parse().expect("valid coordinates");
        assert_eq!(coords.as_query(), "48.8566,2.3522");

        assert!("48.8566".parse::<Coordinates>().is_err());
        assert!("north,south".parse::<Coordinates>().is_err());
        assert!("95,10".parse::<Coordinates>().is_err());
    }

    #[tokio::test]
    async fn ip_lookup_success_yields_coordinates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success", "lat": 59.33, "lon": 18.06
            })))
            .mount(&server)
            .await;

        let geo = IpGeolocator::with_endpoint(&server.uri()).expect("client builds");
        let coords = geo.locate().await.expect("lookup succeeds");

        assert_eq!(coords, Coordinates { latitude: 59.33, longitude: 18.06 });
    }

    #[tokio::test]
    async fn ip_lookup_failure_is_denied() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail", "message": "private range"
            })))
            .mount(&server)
            .await;

        let geo = IpGeolocator::with_endpoint(&server.uri()).expect("client builds");
        let err = geo.locate().await.unwrap_err();

        assert_eq!(err, QueryError::GeolocationDenied("private range".into()));
    }

    #[tokio::test]
    async fn unsupported_reports_missing_capability() {
        assert!(!Unsupported.is_supported());
        assert_eq!(Unsupported.locate().await.unwrap_err(), QueryError::GeolocationUnsupported);
    }
}
