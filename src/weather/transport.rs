//! HTTP transport for the KMA forecast services.
//!
//! One reqwest client with a fixed 10-second timeout serves both
//! services. The transport owns the two service keys and the
//! format/paging boilerplate; domain parameters come from the caller.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{Endpoint, FetchError, ForecastRequest, ForecastTransport, KmaEnvelope};

const SHORT_TERM_BASE_URL: &str =
    "http://apis.data.go.kr/1360000/VilageFcstInfoService_2.0";
const MID_TERM_BASE_URL: &str = "http://apis.data.go.kr/1360000/MidFcstInfoService";

const FETCH_TIMEOUT_SECS: u64 = 10;

fn endpoint_url(endpoint: Endpoint) -> String {
    match endpoint {
        Endpoint::Nowcast => format!("{SHORT_TERM_BASE_URL}/getUltraSrtNcst"),
        Endpoint::VillageForecast => format!("{SHORT_TERM_BASE_URL}/getVilageFcst"),
        Endpoint::MidTemperature => format!("{MID_TERM_BASE_URL}/getMidTa"),
        Endpoint::MidLand => format!("{MID_TERM_BASE_URL}/getMidLandFcst"),
    }
}

pub struct KmaHttpTransport {
    http: Client,
    short_api_key: String,
    mid_api_key: String,
}

impl KmaHttpTransport {
    pub fn new(short_api_key: String, mid_api_key: String) -> anyhow::Result<Self> {
        use anyhow::Context;
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent("gyuldam/0.1.0")
            .build()
            .context("Failed to build KMA HTTP client")?;
        Ok(Self {
            http,
            short_api_key,
            mid_api_key,
        })
    }

    fn service_key(&self, endpoint: Endpoint) -> &str {
        if endpoint.is_mid_range() {
            &self.mid_api_key
        } else {
            &self.short_api_key
        }
    }
}

#[async_trait]
impl ForecastTransport for KmaHttpTransport {
    async fn fetch(&self, request: ForecastRequest) -> Result<KmaEnvelope, FetchError> {
        let url = endpoint_url(request.endpoint);
        debug!(endpoint = ?request.endpoint, "Fetching KMA forecast");

        let mut query: Vec<(&str, String)> = vec![
            ("serviceKey", self.service_key(request.endpoint).to_string()),
            ("pageNo", "1".to_string()),
            ("dataType", "JSON".to_string()),
        ];
        query.extend(request.params);

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<KmaEnvelope>()
            .await
            .map_err(|e| FetchError::Schema(e.to_string()))
    }
}
