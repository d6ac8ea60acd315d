use async_trait::async_trait;
use reqwest::{Client, Request};
use tracing::debug;

use crate::{error::FetchError, model::Units};

use super::WeatherProvider;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn/";

/// Rendition of an OpenWeather icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSize {
    X1,
    X2,
}

impl IconSize {
    fn suffix(&self) -> &'static str {
        match self {
            IconSize::X1 => "@1x",
            IconSize::X2 => "@2x",
        }
    }
}

/// URL of the PNG glyph for an icon identifier such as `"04d"`.
pub fn icon_url(icon: &str, size: IconSize) -> String {
    format!("{ICON_BASE_URL}{icon}{}.png", size.suffix())
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    current_url: String,
    forecast_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, current_url: String, forecast_url: String) -> Self {
        Self {
            api_key,
            current_url,
            forecast_url,
            http: Client::new(),
        }
    }

    /// `GET {current_url}?q={city}&appid={key}&units={units}`
    pub fn current_request(&self, city: &str, units: Units) -> Result<Request, FetchError> {
        self.build_request(&self.current_url, city, units)
    }

    /// `GET {forecast_url}?q={city}&appid={key}&units={units}`
    pub fn forecast_request(&self, city: &str, units: Units) -> Result<Request, FetchError> {
        self.build_request(&self.forecast_url, city, units)
    }

    fn build_request(&self, url: &str, city: &str, units: Units) -> Result<Request, FetchError> {
        let request = self
            .http
            .get(url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", units.as_str()),
            ])
            .build()?;

        Ok(request)
    }

    /// Send once and return the whole body; anything but 200 is an error.
    async fn execute(&self, request: Request) -> Result<String, FetchError> {
        debug!(url = %redact(request.url()), "sending weather request");

        let res = self.http.execute(request).await?;

        let status = res.status();
        let body = res.text().await?;

        if status != reqwest::StatusCode::OK {
            debug!(%status, "weather request rejected");
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, city: &str, units: Units) -> Result<String, FetchError> {
        let request = self.current_request(city, units)?;
        self.execute(request).await
    }

    async fn fetch_forecast(&self, city: &str, units: Units) -> Result<String, FetchError> {
        let request = self.forecast_request(city, units)?;
        self.execute(request).await
    }
}

/// Request URL with the API key masked, for logs.
fn redact(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
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
    use crate::config::{DEFAULT_CURRENT_URL, DEFAULT_FORECAST_URL};
    use std::net::SocketAddr;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Answer exactly one HTTP request with `status_line` and `body`.
    async fn serve_once(status_line: &'static str, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;

            let response = format!(
                "HTTP/1.1 {status_line}\r\n\
                 content-type: application/json\r\n\
                 content-length: {}\r\n\
                 connection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        addr
    }

    fn local_provider(addr: SocketAddr) -> OpenWeatherProvider {
        OpenWeatherProvider::new(
            "SECRET".into(),
            format!("http://{addr}/data/2.5/weather"),
            format!("http://{addr}/data/2.5/forecast"),
        )
    }

    fn provider() -> OpenWeatherProvider {
        OpenWeatherProvider::new(
            "SECRET".into(),
            DEFAULT_CURRENT_URL.into(),
            DEFAULT_FORECAST_URL.into(),
        )
    }

    #[test]
    fn current_request_uses_templated_query() {
        let req = provider().current_request("London", Units::Metric).unwrap();

        assert_eq!(req.method(), reqwest::Method::GET);
        assert_eq!(
            req.url().as_str(),
            "https://api.openweathermap.org/data/2.5/weather?q=London&appid=SECRET&units=metric"
        );
    }

    #[test]
    fn forecast_request_encodes_city_and_units() {
        let req = provider()
            .forecast_request("San Jose", Units::Imperial)
            .unwrap();

        assert_eq!(
            req.url().as_str(),
            "https://api.openweathermap.org/data/2.5/forecast?q=San+Jose&appid=SECRET&units=imperial"
        );
    }

    #[test]
    fn invalid_base_url_is_a_connection_error() {
        let p = OpenWeatherProvider::new("K".into(), "not a url".into(), "also not".into());
        let err = p.current_request("London", Units::Metric).unwrap_err();

        assert!(matches!(err, FetchError::Connection(_)));
    }

    #[tokio::test]
    async fn ok_response_returns_whole_body() {
        let addr = serve_once("200 OK", r#"{"name":"London"}"#).await;

        let body = local_provider(addr)
            .fetch_current("London", Units::Metric)
            .await
            .unwrap();

        assert_eq!(body, r#"{"name":"London"}"#);
    }

    #[tokio::test]
    async fn non_200_response_is_a_status_error() {
        let addr = serve_once("404 Not Found", r#"{"cod":"404","message":"city not found"}"#).await;

        let err = local_provider(addr)
            .fetch_forecast("Atlantis", Units::Metric)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Error fetching data: HTTP 404");
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert!(body.contains("city not found"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = local_provider(addr)
            .fetch_current("London", Units::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Connection(_)));
    }

    #[test]
    fn redact_masks_api_key() {
        let req = provider().current_request("Rome", Units::Metric).unwrap();
        let shown = redact(req.url());

        assert!(!shown.contains("SECRET"));
        assert!(shown.contains("q=Rome"));
    }

    #[test]
    fn icon_url_matches_upstream_layout() {
        assert_eq!(
            icon_url("04d", IconSize::X2),
            "https://openweathermap.org/img/wn/04d@2x.png"
        );
        assert_eq!(
            icon_url("10n", IconSize::X1),
            "https://openweathermap.org/img/wn/10n@1x.png"
        );
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let short = truncate_body(&long);

        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
