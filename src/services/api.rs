use crate::config::Config;
use crate::models::{
    connection::ConnectionPoint, error::AppError, power::PowerStationsResponse,
    window::QueryWindow,
};
use chrono::NaiveDate;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::rc::Rc;

// API CONFIGURATION
/// Configuration for the DirtyWatts API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: String,
    sync_origin: Option<String>,
    network_available: bool,
}

impl ApiConfig {
    /// Creates a builder for constructing an `ApiConfig`.
    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Origin of the local server the preview datapoint is mirrored to.
    pub fn sync_origin(&self) -> Option<&str> {
        self.sync_origin.as_deref()
    }

    /// Whether this execution context may make network calls.
    pub fn network_available(&self) -> bool {
        self.network_available
    }

    pub fn live_power_stations_url(&self) -> Result<Url, AppError> {
        self.endpoint(&self.base_url, &["live", "power_stations"])
    }

    pub fn power_stations_history_url(&self, window: &QueryWindow) -> Result<Url, AppError> {
        let mut url = self.endpoint(&self.base_url, &["history", "power_stations"])?;
        Self::set_window_query(&mut url, window, Config::POWER_STATIONS_INTERVAL_MINUTES);
        Ok(url)
    }

    pub fn live_connection_points_url(&self) -> Result<Url, AppError> {
        self.endpoint(&self.base_url, &["live", "grid_connection_points"])
    }

    /// History URL for one connection point; the code is escaped as a path segment.
    pub fn connection_point_history_url(
        &self,
        code: &str,
        window: &QueryWindow,
    ) -> Result<Url, AppError> {
        let mut url = self.endpoint(
            &self.base_url,
            &["history", "grid_connection_points", code],
        )?;
        Self::set_window_query(&mut url, window, Config::CONNECTION_POINTS_INTERVAL_MINUTES);
        Ok(url)
    }

    /// URL the preview datapoint is POSTed to.
    pub fn sync_url(&self) -> Result<Url, AppError> {
        let origin = self
            .sync_origin
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("No sync origin available".to_string()))?;
        let segments: Vec<&str> = Config::SYNC_PATH
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        self.endpoint(origin, &segments)
    }

    fn endpoint(&self, base: &str, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = Url::parse(base)
            .map_err(|e| AppError::ConfigError(format!("Invalid base URL {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| AppError::ConfigError(format!("Base URL cannot take a path: {base}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn set_window_query(url: &mut Url, window: &QueryWindow, interval_minutes: u32) {
        url.set_query(Some(&format!(
            "start={}&end={}&time_interval_minutes={interval_minutes}",
            window.start_iso(),
            window.end_iso()
        )));
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfigBuilder::default().build()
    }
}

// API CONFIGURATION BUILDER
/// Builder for constructing an `ApiConfig` with custom settings.
#[derive(Debug, Default)]
pub struct ApiConfigBuilder {
    base_url: Option<String>,
    sync_origin: Option<String>,
    network_available: Option<bool>,
}

impl ApiConfigBuilder {
    /// Sets a custom base URL (primarily for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the origin of the local sync server.
    pub fn sync_origin(mut self, origin: impl Into<String>) -> Self {
        self.sync_origin = Some(origin.into());
        self
    }

    /// Overrides the detected network capability.
    pub fn network_available(mut self, available: bool) -> Self {
        self.network_available = Some(available);
        self
    }

    /// Builds the `ApiConfig`, filling the sync origin from the browser page.
    pub fn build(self) -> ApiConfig {
        let sync_origin = self.sync_origin.or_else(browser_origin);
        let network_available = self
            .network_available
            .unwrap_or_else(|| browser_origin().is_some());

        ApiConfig {
            base_url: self
                .base_url
                .unwrap_or_else(|| Config::API_BASE_URL.to_string()),
            sync_origin,
            network_available,
        }
    }
}

/// Origin of the page we are running in, if any.
#[cfg(target_arch = "wasm32")]
fn browser_origin() -> Option<String> {
    web_sys::window().and_then(|w| w.location().origin().ok())
}

#[cfg(not(target_arch = "wasm32"))]
fn browser_origin() -> Option<String> {
    None
}

// API SEAMS
/// Read side of the DirtyWatts API.
#[allow(async_fn_in_trait)]
pub trait PowerApi {
    async fn current_power_stations(&self) -> Result<PowerStationsResponse, AppError>;

    async fn power_stations_history(
        &self,
        window: &QueryWindow,
    ) -> Result<Vec<PowerStationsResponse>, AppError>;

    async fn current_connection_points(&self) -> Result<Vec<ConnectionPoint>, AppError>;

    async fn connection_point_history(
        &self,
        code: &str,
        window: &QueryWindow,
    ) -> Result<Vec<ConnectionPoint>, AppError>;
}

/// Destination for the locally edited preview datapoint.
#[allow(async_fn_in_trait)]
pub trait PreviewSink {
    /// Whether pushes can be made at all in this execution context.
    fn can_push(&self) -> bool;

    async fn push_preview(&self, datapoint: &PowerStationsResponse) -> Result<(), AppError>;
}

impl<T: PowerApi> PowerApi for Rc<T> {
    async fn current_power_stations(&self) -> Result<PowerStationsResponse, AppError> {
        (**self).current_power_stations().await
    }

    async fn power_stations_history(
        &self,
        window: &QueryWindow,
    ) -> Result<Vec<PowerStationsResponse>, AppError> {
        (**self).power_stations_history(window).await
    }

    async fn current_connection_points(&self) -> Result<Vec<ConnectionPoint>, AppError> {
        (**self).current_connection_points().await
    }

    async fn connection_point_history(
        &self,
        code: &str,
        window: &QueryWindow,
    ) -> Result<Vec<ConnectionPoint>, AppError> {
        (**self).connection_point_history(code, window).await
    }
}

impl<T: PreviewSink> PreviewSink for Rc<T> {
    fn can_push(&self) -> bool {
        (**self).can_push()
    }

    async fn push_preview(&self, datapoint: &PowerStationsResponse) -> Result<(), AppError> {
        (**self).push_preview(datapoint).await
    }
}

// DIRTYWATTS CLIENT
/// HTTP client for the DirtyWatts API.
pub struct DirtyWattsClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl DirtyWattsClient {
    /// Creates a new client with default configuration.
    pub fn new() -> Result<Self, AppError> {
        Self::with_config(ApiConfig::default())
    }

    /// Creates a new client with the specified configuration.
    pub fn with_config(config: ApiConfig) -> Result<Self, AppError> {
        let builder = reqwest::Client::builder();
        // Test servers listen on loopback and must not go through an env proxy
        #[cfg(test)]
        let builder = builder.no_proxy();

        let http = builder
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Returns a reference to the client's configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// GETs `url` and decodes the JSON body. No retry, no timeout.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(Self::classify_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(status, &body));
        }

        let body = response.text().await.map_err(Self::classify_error)?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::DecodeError(format!("Failed to parse response: {e}")))
    }

    /// Converts a reqwest error into an appropriate `AppError`.
    fn classify_error(error: reqwest::Error) -> AppError {
        if error.is_decode() {
            AppError::DecodeError(format!("Failed to read response: {error}"))
        } else if error.is_timeout() {
            AppError::NetworkError(format!("Request timeout: {error}"))
        } else if error.is_request() {
            AppError::NetworkError(format!("Request error: {error}"))
        } else {
            AppError::NetworkError(format!("Network error: {error}"))
        }
    }

    /// Creates an error based on HTTP status code.
    fn error_for_status(status: StatusCode, body: &str) -> AppError {
        match status.as_u16() {
            429 => AppError::RateLimited,
            404 => AppError::NotFound(format!("Resource not found: {body}")),
            400..=499 => AppError::ApiError(format!("Client error {status}: {body}")),
            500..=599 => AppError::ApiError(format!("Server error {status}: {body}")),
            _ => AppError::ApiError(format!("Unexpected status {status}: {body}")),
        }
    }
}

impl PowerApi for DirtyWattsClient {
    async fn current_power_stations(&self) -> Result<PowerStationsResponse, AppError> {
        self.fetch_json(self.config.live_power_stations_url()?).await
    }

    async fn power_stations_history(
        &self,
        window: &QueryWindow,
    ) -> Result<Vec<PowerStationsResponse>, AppError> {
        self.fetch_json(self.config.power_stations_history_url(window)?)
            .await
    }

    async fn current_connection_points(&self) -> Result<Vec<ConnectionPoint>, AppError> {
        self.fetch_json(self.config.live_connection_points_url()?)
            .await
    }

    async fn connection_point_history(
        &self,
        code: &str,
        window: &QueryWindow,
    ) -> Result<Vec<ConnectionPoint>, AppError> {
        self.fetch_json(self.config.connection_point_history_url(code, window)?)
            .await
    }
}

impl PreviewSink for DirtyWattsClient {
    fn can_push(&self) -> bool {
        self.config.network_available && self.config.sync_origin.is_some()
    }

    async fn push_preview(&self, datapoint: &PowerStationsResponse) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.config.sync_url()?)
            .json(datapoint)
            .send()
            .await
            .map_err(Self::classify_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(status, &body));
        }

        Ok(())
    }
}

// CONVENIENCE FUNCTIONS
/// Fetches half-hourly history of one connection point for the window ending on `date`.
pub async fn fetch_connection_point_history(
    code: &str,
    date: NaiveDate,
) -> Result<Vec<ConnectionPoint>, AppError> {
    DirtyWattsClient::new()?
        .connection_point_history(code, &QueryWindow::ending_on(date))
        .await
}
