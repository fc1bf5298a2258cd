//! Weather client: normalized, cached forecast operations.
//!
//! Translates a (region, wall-clock time) pair into upstream requests
//! and upstream JSON into display-ready Korean fragments. Every
//! operation is read-through cached per (operation, hour, region), and
//! every upstream failure (timeout, non-2xx, bad shape, non-success
//! result code) is converted at the call site into an explicit
//! unavailable value. Nothing here returns an error to its caller.

use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use super::cache::{CacheKey, ForecastCache};
use super::issuance::{self, BaseTime};
use super::regions::RegionTables;
use super::{Endpoint, FetchError, ForecastRequest, ForecastTransport};

// ---------------------------------------------------------------------------
// Normalized result types
// ---------------------------------------------------------------------------

/// A fetch outcome: either normalized data or an explicit placeholder.
/// Both variants are cached — a failed hour is not retried until the
/// clock rolls into the next hour bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Ready(T),
    Unavailable { note: String },
}

impl<T> Fetched<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Fetched::Ready(_))
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Fetched::Ready(v) => Some(v),
            Fetched::Unavailable { .. } => None,
        }
    }
}

/// Hourly observation snapshot. Fields missing from the upstream item
/// list stay `None` and render as "N/A".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentConditions {
    pub region: String,
    /// Issuance stamp, `YYYYMMDD HHMM`.
    pub updated: String,
    pub temperature: Option<String>,
    pub rainfall: Option<String>,
    pub humidity: Option<String>,
    pub wind_speed: Option<String>,
    pub precipitation_type: Option<String>,
}

/// One day of the 3-day forecast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayOutlook {
    pub min_temp: Option<String>,
    pub max_temp: Option<String>,
    pub rain_prob: Option<String>,
    pub sky: Option<String>,
}

/// 3-day forecast keyed by `YYYYMMDD` date.
pub type ShortRangeForecast = BTreeMap<String, DayOutlook>;

#[derive(Debug, Clone, PartialEq)]
pub struct TempRange {
    pub min_temp: String,
    pub max_temp: String,
}

/// Mid-range temperatures keyed by days-ahead (4–10).
pub type MidTemperatureForecast = BTreeMap<u8, TempRange>;

/// Mid-range land outlook. The upstream data genuinely changes shape
/// at day 8: days 4–7 carry separate AM/PM forecasts, days 8–10 one
/// all-day value. The split is preserved, not smoothed over.
#[derive(Debug, Clone, PartialEq)]
pub enum LandOutlook {
    AmPm {
        am_weather: String,
        pm_weather: String,
        am_rain_prob: String,
        pm_rain_prob: String,
    },
    AllDay {
        weather: String,
        rain_prob: String,
    },
}

/// Mid-range land forecast keyed by days-ahead (4–10).
pub type MidLandForecast = BTreeMap<u8, LandOutlook>;

// ---------------------------------------------------------------------------
// Code → label tables
// ---------------------------------------------------------------------------

/// PTY (precipitation type) observation codes.
fn pty_label(code: &str) -> &'static str {
    match code {
        "1" => "비",
        "2" => "비/눈",
        "3" => "눈",
        "5" => "빗방울",
        "6" => "빗방울눈날림",
        "7" => "눈날림",
        _ => "없음",
    }
}

/// SKY (sky condition) forecast codes.
fn sky_label(code: &str) -> &'static str {
    match code {
        "1" => "맑음",
        "3" => "구름많음",
        "4" => "흐림",
        _ => "알 수 없음",
    }
}

/// Read a field that may arrive as a JSON string or number.
fn str_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn field_or_na(item: &Value, key: &str) -> String {
    str_field(item, key).unwrap_or_else(|| "N/A".to_string())
}

fn display(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("N/A")
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct WeatherClient {
    transport: Arc<dyn ForecastTransport>,
    tables: Arc<RegionTables>,
    current_cache: ForecastCache<Fetched<CurrentConditions>>,
    short_cache: ForecastCache<Fetched<ShortRangeForecast>>,
    mid_temp_cache: ForecastCache<Fetched<MidTemperatureForecast>>,
    mid_land_cache: ForecastCache<Fetched<MidLandForecast>>,
}

impl WeatherClient {
    pub fn new(transport: Arc<dyn ForecastTransport>, tables: Arc<RegionTables>) -> Self {
        Self {
            transport,
            tables,
            current_cache: ForecastCache::default(),
            short_cache: ForecastCache::default(),
            mid_temp_cache: ForecastCache::default(),
            mid_land_cache: ForecastCache::default(),
        }
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    // -- Current conditions ------------------------------------------------

    pub async fn current_conditions(&self, region: &str) -> Fetched<CurrentConditions> {
        self.current_conditions_at(region, Self::now()).await
    }

    pub async fn current_conditions_at(
        &self,
        region: &str,
        now: NaiveDateTime,
    ) -> Fetched<CurrentConditions> {
        let key = CacheKey::new(issuance::hour_bucket(now), region);
        if let Some(hit) = self.current_cache.get(&key) {
            return hit;
        }

        let result = match self.fetch_current(region, now).await {
            Ok(conditions) => Fetched::Ready(conditions),
            Err(e) => {
                warn!(region, error = %e, "Current conditions fetch failed");
                Fetched::Unavailable {
                    note: "현재 날씨 정보를 불러올 수 없습니다.".to_string(),
                }
            }
        };
        self.current_cache.put(key, result.clone());
        result
    }

    async fn fetch_current(
        &self,
        region: &str,
        now: NaiveDateTime,
    ) -> Result<CurrentConditions, FetchError> {
        let grid = self.tables.grid_for(region);
        let base = issuance::hourly_base(now);
        let request = ForecastRequest {
            endpoint: Endpoint::Nowcast,
            params: vec![
                ("numOfRows", "10".to_string()),
                ("base_date", base.date.clone()),
                ("base_time", base.time.clone()),
                ("nx", grid.nx.to_string()),
                ("ny", grid.ny.to_string()),
            ],
        };
        let items = self.transport.fetch(request).await?.into_items()?;
        Ok(Self::fold_current(region, &base, &items))
    }

    /// Map observation category codes into display fields. Categories
    /// outside the known five are ignored.
    fn fold_current(region: &str, base: &BaseTime, items: &[Value]) -> CurrentConditions {
        let mut out = CurrentConditions {
            region: region.to_string(),
            updated: format!("{} {}", base.date, base.time),
            ..Default::default()
        };

        for item in items {
            let category = str_field(item, "category");
            let value = match str_field(item, "obsrValue") {
                Some(v) => v,
                None => continue,
            };
            match category.as_deref() {
                Some("T1H") => out.temperature = Some(format!("{value}°C")),
                Some("RN1") => out.rainfall = Some(format!("{value}mm")),
                Some("REH") => out.humidity = Some(format!("{value}%")),
                Some("WSD") => out.wind_speed = Some(format!("{value}m/s")),
                Some("PTY") => out.precipitation_type = Some(pty_label(&value).to_string()),
                _ => {}
            }
        }
        out
    }

    // -- Short-range 3-day forecast ----------------------------------------

    pub async fn short_range_forecast(&self, region: &str) -> Fetched<ShortRangeForecast> {
        self.short_range_forecast_at(region, Self::now()).await
    }

    pub async fn short_range_forecast_at(
        &self,
        region: &str,
        now: NaiveDateTime,
    ) -> Fetched<ShortRangeForecast> {
        let key = CacheKey::new(issuance::hour_bucket(now), region);
        if let Some(hit) = self.short_cache.get(&key) {
            return hit;
        }

        let result = match self.fetch_short(region, now).await {
            Ok(daily) => Fetched::Ready(daily),
            Err(e) => {
                warn!(region, error = %e, "Short-range forecast fetch failed");
                Fetched::Unavailable {
                    note: "단기예보를 불러올 수 없습니다.".to_string(),
                }
            }
        };
        self.short_cache.put(key, result.clone());
        result
    }

    async fn fetch_short(
        &self,
        region: &str,
        now: NaiveDateTime,
    ) -> Result<ShortRangeForecast, FetchError> {
        let grid = self.tables.grid_for(region);
        let base = issuance::short_forecast_base(now);
        let request = ForecastRequest {
            endpoint: Endpoint::VillageForecast,
            params: vec![
                ("numOfRows", "100".to_string()),
                ("base_date", base.date.clone()),
                ("base_time", base.time.clone()),
                ("nx", grid.nx.to_string()),
                ("ny", grid.ny.to_string()),
            ],
        };
        let items = self.transport.fetch(request).await?.into_items()?;
        Ok(Self::fold_short(&items))
    }

    /// Fold the flat (date, time, category, value) list into per-date
    /// records. POP and SKY appear once per forecast slot, so the first
    /// value encountered for a date wins; later slots are ignored.
    fn fold_short(items: &[Value]) -> ShortRangeForecast {
        let mut daily = ShortRangeForecast::new();

        for item in items {
            let date = match str_field(item, "fcstDate") {
                Some(d) => d,
                None => continue,
            };
            let value = match str_field(item, "fcstValue") {
                Some(v) => v,
                None => continue,
            };
            let day = daily.entry(date).or_default();

            match str_field(item, "category").as_deref() {
                Some("TMN") => day.min_temp = Some(format!("{value}°C")),
                Some("TMX") => day.max_temp = Some(format!("{value}°C")),
                Some("POP") => {
                    if day.rain_prob.is_none() {
                        day.rain_prob = Some(format!("{value}%"));
                    }
                }
                Some("SKY") => {
                    if day.sky.is_none() {
                        day.sky = Some(sky_label(&value).to_string());
                    }
                }
                _ => {}
            }
        }
        daily
    }

    // -- Mid-range temperature (days 4–10) ---------------------------------

    pub async fn mid_range_temperature(&self, region: &str) -> Fetched<MidTemperatureForecast> {
        self.mid_range_temperature_at(region, Self::now()).await
    }

    pub async fn mid_range_temperature_at(
        &self,
        region: &str,
        now: NaiveDateTime,
    ) -> Fetched<MidTemperatureForecast> {
        let key = CacheKey::new(issuance::hour_bucket(now), region);
        if let Some(hit) = self.mid_temp_cache.get(&key) {
            return hit;
        }

        let result = match self.fetch_mid_temp(region, now).await {
            Ok(forecast) => Fetched::Ready(forecast),
            Err(e) => {
                warn!(region, error = %e, "Mid-range temperature fetch failed");
                Fetched::Unavailable {
                    note: "중기예보를 불러올 수 없습니다.".to_string(),
                }
            }
        };
        self.mid_temp_cache.put(key, result.clone());
        result
    }

    async fn fetch_mid_temp(
        &self,
        region: &str,
        now: NaiveDateTime,
    ) -> Result<MidTemperatureForecast, FetchError> {
        let code = self.tables.mid_temp_code(region);
        let base = issuance::mid_forecast_base(now);
        let request = ForecastRequest {
            endpoint: Endpoint::MidTemperature,
            params: vec![
                ("numOfRows", "10".to_string()),
                ("regId", code.to_string()),
                ("tmFc", base.compact()),
            ],
        };
        let items = self.transport.fetch(request).await?.into_items()?;
        let item = items
            .first()
            .ok_or_else(|| FetchError::Schema("empty mid-temperature item list".to_string()))?;
        Ok(Self::fold_mid_temp(item))
    }

    fn fold_mid_temp(item: &Value) -> MidTemperatureForecast {
        (4..=10)
            .map(|day| {
                (
                    day,
                    TempRange {
                        min_temp: field_or_na(item, &format!("taMin{day}")),
                        max_temp: field_or_na(item, &format!("taMax{day}")),
                    },
                )
            })
            .collect()
    }

    // -- Mid-range land/weather (days 4–10) --------------------------------

    pub async fn mid_range_land(&self, region: &str) -> Fetched<MidLandForecast> {
        self.mid_range_land_at(region, Self::now()).await
    }

    pub async fn mid_range_land_at(
        &self,
        region: &str,
        now: NaiveDateTime,
    ) -> Fetched<MidLandForecast> {
        let key = CacheKey::new(issuance::hour_bucket(now), region);
        if let Some(hit) = self.mid_land_cache.get(&key) {
            return hit;
        }

        let result = match self.fetch_mid_land(region, now).await {
            Ok(forecast) => Fetched::Ready(forecast),
            Err(e) => {
                warn!(region, error = %e, "Mid-range land fetch failed");
                Fetched::Unavailable {
                    note: "중기 육상예보를 불러올 수 없습니다.".to_string(),
                }
            }
        };
        self.mid_land_cache.put(key, result.clone());
        result
    }

    async fn fetch_mid_land(
        &self,
        region: &str,
        now: NaiveDateTime,
    ) -> Result<MidLandForecast, FetchError> {
        let code = self.tables.mid_land_code(region);
        let base = issuance::mid_forecast_base(now);
        let request = ForecastRequest {
            endpoint: Endpoint::MidLand,
            params: vec![
                ("numOfRows", "10".to_string()),
                ("regId", code.to_string()),
                ("tmFc", base.compact()),
            ],
        };
        let items = self.transport.fetch(request).await?.into_items()?;
        let item = items
            .first()
            .ok_or_else(|| FetchError::Schema("empty mid-land item list".to_string()))?;
        Ok(Self::fold_mid_land(item))
    }

    fn fold_mid_land(item: &Value) -> MidLandForecast {
        (4..=10)
            .map(|day| {
                let outlook = if day <= 7 {
                    LandOutlook::AmPm {
                        am_weather: field_or_na(item, &format!("wf{day}Am")),
                        pm_weather: field_or_na(item, &format!("wf{day}Pm")),
                        am_rain_prob: field_or_na(item, &format!("rnSt{day}Am")),
                        pm_rain_prob: field_or_na(item, &format!("rnSt{day}Pm")),
                    }
                } else {
                    LandOutlook::AllDay {
                        weather: field_or_na(item, &format!("wf{day}")),
                        rain_prob: field_or_na(item, &format!("rnSt{day}")),
                    }
                };
                (day, outlook)
            })
            .collect()
    }

    // -- Composed context summary ------------------------------------------

    pub async fn context_summary(&self, region: &str) -> String {
        self.context_summary_at(region, Self::now()).await
    }

    /// Current conditions plus the 3-day forecast as one multi-line
    /// Korean block. When nothing at all is available the caller gets
    /// the fixed unavailable sentence instead of partial output.
    pub async fn context_summary_at(&self, region: &str, now: NaiveDateTime) -> String {
        let current = self.current_conditions_at(region, now).await;
        let short = self.short_range_forecast_at(region, now).await;

        if !current.is_ready() && !short.is_ready() {
            return format!("{region} 날씨 정보를 가져올 수 없습니다.");
        }

        let mut lines = vec![format!("현재 {region} 날씨:")];
        match &current {
            Fetched::Ready(c) => {
                lines.push(format!("- 기온: {}", display(&c.temperature)));
                lines.push(format!("- 습도: {}", display(&c.humidity)));
                lines.push(format!("- 강수: {}", display(&c.rainfall)));
                lines.push(format!("- 강수형태: {}", display(&c.precipitation_type)));
            }
            Fetched::Unavailable { note } => {
                lines.push(format!("- {note}"));
            }
        }

        if let Fetched::Ready(daily) = &short {
            if !daily.is_empty() {
                lines.push(String::new());
                lines.push("3일 예보:".to_string());
                for (date, day) in daily.iter().take(3) {
                    lines.push(format!(
                        "  {date}: 최저 {}, 최고 {}, 강수확률 {}, {}",
                        display(&day.min_temp),
                        display(&day.max_temp),
                        display(&day.rain_prob),
                        display(&day.sky),
                    ));
                }
            }
        }

        lines.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
