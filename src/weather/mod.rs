//! KMA weather integration.
//!
//! Talks to two structurally different government forecast services:
//! the short-range service (grid-coordinate keyed: current conditions
//! and the 3-day forecast) and the mid-range service (region-code
//! keyed: 4–10 day temperature and land/weather outlooks). Responses
//! are normalized into human-readable Korean fragments and cached per
//! (operation, hour, region) so no upstream endpoint is hit more than
//! once per hour per region.

pub mod cache;
pub mod client;
pub mod issuance;
pub mod regions;
pub mod transport;

use async_trait::async_trait;
use serde::Deserialize;

pub use client::WeatherClient;
pub use regions::RegionTables;

/// Both KMA services report success with this header code.
pub const KMA_SUCCESS_CODE: &str = "00";

/// Which upstream endpoint a request targets. The nowcast and village
/// forecast live on the short-range service; the other two live on the
/// mid-range service (separate registration, separate key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// getUltraSrtNcst — hourly current conditions.
    Nowcast,
    /// getVilageFcst — 3-day forecast.
    VillageForecast,
    /// getMidTa — 4–10 day min/max temperature.
    MidTemperature,
    /// getMidLandFcst — 4–10 day weather and rain probability.
    MidLand,
}

impl Endpoint {
    pub fn is_mid_range(self) -> bool {
        matches!(self, Endpoint::MidTemperature | Endpoint::MidLand)
    }
}

/// A single upstream GET, assembled by the client. Domain parameters
/// only — the transport adds authentication and format parameters.
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub endpoint: Endpoint,
    pub params: Vec<(&'static str, String)>,
}

/// Everything that can go wrong at the upstream boundary. Callers in
/// `WeatherClient` convert all of these into placeholder values; none
/// escapes to the HTTP surface.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("unexpected response shape: {0}")]
    Schema(String),
    #[error("upstream result code {0}")]
    ResultCode(String),
}

/// Seam in front of the forecast HTTP calls. The production impl is
/// [`transport::KmaHttpTransport`]; tests substitute counting mocks.
#[async_trait]
pub trait ForecastTransport: Send + Sync {
    async fn fetch(&self, request: ForecastRequest) -> Result<KmaEnvelope, FetchError>;
}

// ---------------------------------------------------------------------------
// Shared KMA response envelope
// ---------------------------------------------------------------------------

/// Outer envelope shared by every KMA endpoint:
/// `response.header.resultCode` + `response.body.items.item`.
#[derive(Debug, Clone, Deserialize)]
pub struct KmaEnvelope {
    pub response: KmaResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KmaResponse {
    pub header: KmaHeader,
    #[serde(default)]
    pub body: Option<KmaBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KmaHeader {
    #[serde(rename = "resultCode", default)]
    pub result_code: String,
    #[serde(rename = "resultMsg", default)]
    pub result_msg: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KmaBody {
    #[serde(default)]
    pub items: KmaItems,
}

/// Item records differ per endpoint (category/value tuples for the
/// short-range service, one wide record for the mid-range service), so
/// they stay as raw JSON here and each operation picks its own fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KmaItems {
    #[serde(default)]
    pub item: Vec<serde_json::Value>,
}

impl KmaEnvelope {
    /// Validate the header and hand back the item list.
    pub fn into_items(self) -> Result<Vec<serde_json::Value>, FetchError> {
        if self.response.header.result_code != KMA_SUCCESS_CODE {
            return Err(FetchError::ResultCode(self.response.header.result_code));
        }
        Ok(self
            .response
            .body
            .map(|b| b.items.item)
            .unwrap_or_default())
    }
}
