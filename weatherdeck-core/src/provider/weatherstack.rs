use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::QueryError,
    http,
    model::{Query, WeatherResponse},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "http://api.weatherstack.com";

#[derive(Debug, Clone)]
pub struct WeatherstackProvider {
    access_key: String,
    base_url: String,
    http: Client,
}

impl WeatherstackProvider {
    /// `base_url` is the provider root or a proxy forwarding to it.
    pub fn new(access_key: String, base_url: String) -> anyhow::Result<Self> {
        let http = http::client("Weatherstack")?;

        Ok(Self {
            access_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url_for(&self, query: &Query) -> String {
        format!("{}/{}", self.base_url, query.endpoint())
    }
}

#[derive(Debug, Deserialize)]
struct WsErrorBody {
    code: Option<i64>,
    info: Option<String>,
}

#[async_trait]
impl WeatherProvider for WeatherstackProvider {
    async fn fetch(&self, query: &Query) -> Result<WeatherResponse, QueryError> {
        let mut params = vec![("access_key", self.access_key.clone())];
        params.extend(query.params());

        tracing::debug!(mode = %query.mode, location = %query.location, unit = %query.unit, "requesting weather");

        let transport = |status: Option<u16>, reason: String| QueryError::Transport {
            status,
            reason,
            mode: query.mode,
        };

        // `without_url` keeps the access key out of error messages.
        let res = self
            .http
            .get(self.url_for(query))
            .query(&params)
            .send()
            .await
            .map_err(|e| transport(None, e.without_url().to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| transport(Some(status.as_u16()), e.without_url().to_string()))?;

        if !status.is_success() {
            tracing::warn!(%status, body = %truncate_body(&body), "weather request failed");
            return Err(transport(
                Some(status.as_u16()),
                format!("Request failed with status code {}", status.as_u16()),
            ));
        }

        parse_body(&body).inspect_err(|err| tracing::warn!(error = %err, "provider rejected request"))
    }
}

/// Interpret a 2xx body: a provider error object, a bare `success: false`,
/// or one of the weather payload shapes.
pub fn parse_body(body: &str) -> Result<WeatherResponse, QueryError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        QueryError::MalformedResponse(format!("invalid JSON from provider: {e}"))
    })?;

    // Only an error object carrying a code or info counts; `false`, `{}`
    // and `null` are ignored.
    let provider_error = value
        .get("error")
        .and_then(|e| serde_json::from_value::<WsErrorBody>(e.clone()).ok())
        .filter(|e| e.code.is_some() || e.info.is_some());

    if let Some(error) = provider_error {
        return Err(QueryError::from_provider(error.code, error.info));
    }

    if value.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(QueryError::AmbiguousFailure);
    }

    serde_json::from_value(value)
        .map_err(|e| QueryError::MalformedResponse(format!("unexpected payload shape: {e}")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mode, Unit};
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query(location: &str, mode: Mode) -> Query {
        Query {
            location: location.to_string(),
            mode,
            date: NaiveDate::from_ymd_opt(2026, 10, 10).expect("valid date"),
            unit: Unit::Metric,
        }
    }

    fn provider(server: &MockServer) -> WeatherstackProvider {
        WeatherstackProvider::new("test_key".into(), format!("{}/", server.uri()))
            .expect("client builds")
    }

    #[tokio::test]
    async fn current_request_sends_query_and_units() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .and(query_param("access_key", "test_key"))
            .and(query_param("query", "Paris"))
            .and(query_param("units", "m"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": { "name": "Paris", "country": "France", "localtime": "2026-10-17 14:00" },
                "current": {
                    "temperature": 18,
                    "weather_code": 113,
                    "weather_descriptions": ["Sunny"],
                    "weather_icons": ["https://icons.example/113.png"],
                    "humidity": 60,
                    "wind_speed": 9
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .fetch(&query("Paris", Mode::Current))
            .await
            .expect("fetch succeeds");

        let current = response.current.expect("current block");
        assert_eq!(current.temperature, Some(18.0));
        assert_eq!(response.location.and_then(|l| l.name).as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn historical_request_sends_date_and_hourly() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/historical"))
            .and(query_param("historical_date", "2026-10-10"))
            .and(query_param("hourly", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": { "name": "Rome" },
                "historical": { "2026-10-10": { "hourly": [{ "temperature": 21 }] } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .fetch(&query("Rome", Mode::Historical))
            .await
            .expect("fetch succeeds");

        assert_eq!(response.historical.map(|d| d.len()), Some(1));
    }

    #[tokio::test]
    async fn plan_restriction_body_is_classified() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": { "code": 105, "type": "function_access_restricted", "info": "Plan limit" }
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch(&query("Paris", Mode::Forecast))
            .await
            .unwrap_err();

        assert_eq!(err, QueryError::PlanRestriction { info: "Plan limit".into() });
        assert!(err.user_message().contains("Plan limit"));
    }

    #[tokio::test]
    async fn client_error_status_in_forecast_mode_suggests_upgrade() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch(&query("Paris", Mode::Forecast))
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Transport { status: Some(400), .. }));
        assert_eq!(err.user_message(), "Upgrade the API key plan");
    }

    #[tokio::test]
    async fn server_error_in_current_mode_is_a_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch(&query("Paris", Mode::Current))
            .await
            .unwrap_err();

        let msg = err.user_message();
        assert!(msg.starts_with("Network/Server Error"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn parse_body_handles_error_shapes() {
        assert_eq!(
            parse_body(r#"{"success": false}"#).unwrap_err(),
            QueryError::AmbiguousFailure
        );
        assert_eq!(
            parse_body(r#"{"error": {"code": 101, "info": "Invalid key"}}"#).unwrap_err(),
            QueryError::Provider { code: 101, info: "Invalid key".into() }
        );
        assert!(matches!(
            parse_body("<html>proxy error</html>").unwrap_err(),
            QueryError::MalformedResponse(_)
        ));
    }

    #[test]
    fn parse_body_ignores_empty_error_values() {
        for error in ["null", "false", "{}"] {
            let body = format!(r#"{{"error": {error}, "current": {{"temperature": 5}}}}"#);
            let response = parse_body(&body).expect("empty error is not an error");
            assert_eq!(response.current.and_then(|c| c.temperature), Some(5.0), "error {error}");
        }
    }

    #[tokio::test]
    async fn connection_failure_has_no_status() {
        // Bind then drop a listener so nothing accepts on that port.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .expect("free port")
            .port();
        let provider =
            WeatherstackProvider::new("test_key".into(), format!("http://127.0.0.1:{port}"))
                .expect("client builds");

        let err = provider.fetch(&query("Paris", Mode::Forecast)).await.unwrap_err();

        assert!(matches!(err, QueryError::Transport { status: None, .. }));
        let msg = err.user_message();
        assert!(msg.starts_with("Network/Server Error"));
        assert!(!msg.contains("test_key"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }
}
