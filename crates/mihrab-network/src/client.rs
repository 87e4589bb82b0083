//! Prayer-time client with ordered relay fallback.
//!
//! One logical request is tried against the provider directly and then
//! through each relay in turn. The first candidate that yields a complete
//! timings payload wins; later candidates are never contacted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use mihrab_types::constants::{
    ALADHAN_TIMINGS_URL, MONTHLY_SCHEDULE_MAX_DAYS, PRAYER_REQUEST_TIMEOUT, RELAY_TEMPLATES,
};
use mihrab_types::{CalculationSelection, Coordinate, MihrabError, Prayer, PrayerTimeRecord};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportFailure};

/// Default `User-Agent` for outbound requests.
pub const DEFAULT_USER_AGENT: &str = concat!("mihrab/", env!("CARGO_PKG_VERSION"), " (prayer times)");

/// Client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Provider timings endpoint, without the trailing date segment.
    pub base_url: String,
    /// Relay prefixes tried after the direct call, in order.
    pub relays: Vec<String>,
    /// Bound on each individual attempt.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: ALADHAN_TIMINGS_URL.to_string(),
            relays: RELAY_TEMPLATES.iter().map(|r| r.to_string()).collect(),
            timeout: PRAYER_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder with validation for `ClientConfig`.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    relays: Option<Vec<String>>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self { self.base_url = Some(url.into()); self }
    pub fn relays<I, S>(mut self, relays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relays = Some(relays.into_iter().map(Into::into).collect());
        self
    }
    /// Direct call only.
    pub fn no_relays(mut self) -> Self { self.relays = Some(Vec::new()); self }
    pub fn timeout(mut self, timeout: Duration) -> Self { self.timeout = Some(timeout); self }
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self { self.user_agent = Some(ua.into()); self }

    /// # Errors
    /// Returns `InvalidConfiguration` for an empty base URL, an empty relay
    /// prefix, or a zero timeout.
    pub fn build(self) -> Result<ClientConfig, MihrabError> {
        let defaults = ClientConfig::default();
        let config = ClientConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            relays: self.relays.unwrap_or(defaults.relays),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        };

        if config.base_url.trim().is_empty() {
            return Err(MihrabError::invalid_config("base URL must not be empty"));
        }
        if config.relays.iter().any(|r| r.trim().is_empty()) {
            return Err(MihrabError::invalid_config("relay prefix must not be empty"));
        }
        if config.timeout.is_zero() {
            return Err(MihrabError::invalid_config("request timeout must be greater than zero"));
        }
        Ok(config)
    }
}

/// `encodeURIComponent` set: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes `input` for embedding as a relay query value.
pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Progress through the candidate list.
#[derive(Debug)]
enum TransportState {
    Pending,
    TryNext(usize),
    Success(PrayerTimeRecord),
    Exhausted,
}

/// Provider timings for one day, or `None` when every candidate failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub record: Option<PrayerTimeRecord>,
}

impl DaySchedule {
    /// `HH:MM` for the prayer, `--` when the day or the entry is missing.
    pub fn cell(&self, prayer: Prayer) -> String {
        self.record
            .as_ref()
            .and_then(|r| r.get(prayer))
            .map(|t| t.to_string())
            .unwrap_or_else(|| "--".to_string())
    }
}

/// Fetches daily timings through the direct-then-relay chain.
#[derive(Clone)]
pub struct PrayerTimeClient {
    transport: Arc<dyn HttpTransport>,
    config: ClientConfig,
}

impl std::fmt::Debug for PrayerTimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrayerTimeClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl PrayerTimeClient {
    /// Client over `reqwest` with the given config.
    ///
    /// # Errors
    /// Returns `NetworkError` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, MihrabError> {
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `{base}/{DD-MM-YYYY}?latitude=..&longitude=..&method=..`
    pub fn request_url(&self, coordinate: &Coordinate, selection: CalculationSelection, date: NaiveDate) -> String {
        format!(
            "{}/{}?latitude={}&longitude={}&method={}",
            self.config.base_url.trim_end_matches('/'),
            date.format("%d-%m-%Y"),
            coordinate.latitude,
            coordinate.longitude,
            selection.provider_code()
        )
    }

    /// Direct URL first, then each relay wrapping the encoded URL.
    pub fn candidates(&self, url: &str) -> Vec<String> {
        let encoded = encode_uri_component(url);
        std::iter::once(url.to_string())
            .chain(self.config.relays.iter().map(|relay| format!("{}{}", relay, encoded)))
            .collect()
    }

    /// Fetches the timings for `date` at `coordinate`.
    ///
    /// # Errors
    /// `PrayerTimeUnavailable` once every candidate has failed. Its message
    /// carries the last candidate's failure.
    pub async fn fetch_daily(
        &self,
        coordinate: &Coordinate,
        selection: CalculationSelection,
        date: NaiveDate,
    ) -> Result<PrayerTimeRecord, MihrabError> {
        let url = self.request_url(coordinate, selection, date);
        let candidates = self.candidates(&url);
        let mut last_error: Option<TransportFailure> = None;
        let mut state = TransportState::Pending;

        loop {
            state = match state {
                TransportState::Pending => {
                    debug!(%url, candidates = candidates.len(), "fetching prayer times");
                    TransportState::TryNext(0)
                }
                TransportState::TryNext(i) if i >= candidates.len() => TransportState::Exhausted,
                TransportState::TryNext(i) => {
                    debug!(attempt = i + 1, candidate = %candidates[i], "trying candidate");
                    match self.attempt(&candidates[i]).await {
                        Ok(record) => TransportState::Success(record),
                        Err(e) => {
                            warn!(attempt = i + 1, error = %e, "candidate failed");
                            last_error = Some(e);
                            TransportState::TryNext(i + 1)
                        }
                    }
                }
                TransportState::Success(record) => {
                    info!(%date, "prayer times fetched");
                    return Ok(record);
                }
                TransportState::Exhausted => {
                    let last = last_error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "no candidates".to_string());
                    return Err(MihrabError::prayer_time_unavailable(candidates.len(), last));
                }
            };
        }
    }

    /// [`fetch_daily`](Self::fetch_daily) for the runtime's local date.
    pub async fn fetch_today(
        &self,
        coordinate: &Coordinate,
        selection: CalculationSelection,
    ) -> Result<PrayerTimeRecord, MihrabError> {
        self.fetch_daily(coordinate, selection, Local::now().date_naive()).await
    }

    /// Fetches each date in order, one request at a time.
    ///
    /// A failed day does not abort the range; its entry is `None`.
    pub async fn fetch_range<I>(
        &self,
        coordinate: &Coordinate,
        selection: CalculationSelection,
        dates: I,
    ) -> Vec<DaySchedule>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut days = Vec::new();
        for date in dates {
            let record = match self.fetch_daily(coordinate, selection, date).await {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%date, error = %e, "day skipped in schedule");
                    None
                }
            };
            days.push(DaySchedule { date, record });
        }
        days
    }

    /// The first `min(days_in_month, 15)` days of `today`'s month.
    pub async fn monthly_schedule(
        &self,
        coordinate: &Coordinate,
        selection: CalculationSelection,
        today: NaiveDate,
    ) -> Vec<DaySchedule> {
        self.fetch_range(coordinate, selection, month_prefix(today)).await
    }

    async fn attempt(&self, url: &str) -> Result<PrayerTimeRecord, TransportFailure> {
        let response = tokio::time::timeout(self.config.timeout, self.transport.get(url))
            .await
            .map_err(|_| TransportFailure::Timeout)??;
        parse_timings(response)
    }
}

fn month_prefix(today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let first = today.with_day(1).unwrap_or(today);
    let days = first
        .checked_add_months(chrono::Months::new(1))
        .map(|next| (next - first).num_days() as u32)
        .unwrap_or(28);
    let count = days.min(MONTHLY_SCHEDULE_MAX_DAYS);
    first.iter_days().take(count as usize)
}

/// Validates an Aladhan envelope and extracts the timings.
fn parse_timings(response: HttpResponse) -> Result<PrayerTimeRecord, TransportFailure> {
    if !response.is_success() {
        return Err(TransportFailure::Status { code: response.status, body: response.body });
    }

    let json: Value =
        serde_json::from_str(&response.body).map_err(|e| TransportFailure::MalformedBody(e.to_string()))?;

    let code = json.get("code").and_then(Value::as_i64);
    let status = json.get("status").and_then(Value::as_str);
    if code != Some(200) || status != Some("OK") {
        return Err(TransportFailure::InvalidPayload(format!(
            "API returned error: {}",
            status.filter(|s| !s.is_empty()).unwrap_or("Unknown error")
        )));
    }

    let data = json
        .get("data")
        .filter(|d| !d.is_null())
        .ok_or_else(|| TransportFailure::InvalidPayload("API response missing data field".into()))?;

    let timings = data
        .get("timings")
        .and_then(Value::as_object)
        .ok_or_else(|| TransportFailure::InvalidPayload("API response missing timings field".into()))?;

    let timings: HashMap<String, String> = timings
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect();

    PrayerTimeRecord::from_timings(&timings).map_err(|e| match e {
        MihrabError::InvalidPrayerPayload(msg) => TransportFailure::InvalidPayload(msg),
        other => TransportFailure::InvalidPayload(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::tests::ScriptedTransport;
    use crate::transport::BoxFuture;
    use mihrab_types::{CalculationMethod, School};

    const OK_BODY: &str = r#"{"code":200,"status":"OK","data":{"timings":{
        "Fajr":"05:00","Sunrise":"06:15","Dhuhr":"12:00","Asr":"15:30",
        "Maghrib":"18:00","Isha":"19:30 (EET)","Midnight":"00:00"}}}"#;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn client(transport: Arc<dyn HttpTransport>) -> PrayerTimeClient {
        PrayerTimeClient::with_transport(transport, ClientConfig::default())
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("a b&c=d/e?f"), "a%20b%26c%3Dd%2Fe%3Ff");
        assert_eq!(encode_uri_component("-_.!~*'()"), "-_.!~*'()");
        assert_eq!(encode_uri_component("é"), "%C3%A9");
        assert_eq!(
            encode_uri_component("https://api.aladhan.com/v1/timings/18-10-2026?latitude=-6.2&method=3"),
            "https%3A%2F%2Fapi.aladhan.com%2Fv1%2Ftimings%2F18-10-2026%3Flatitude%3D-6.2%26method%3D3"
        );
    }

    #[test]
    fn test_request_url_and_candidates() {
        let c = client(Arc::new(ScriptedTransport::default()));
        let coord = Coordinate::new_unchecked(21.3891, 39.8579);
        let selection = CalculationSelection::new(CalculationMethod::MuslimWorldLeague, School::Shafi);
        let url = c.request_url(&coord, selection, date());
        assert_eq!(
            url,
            "https://api.aladhan.com/v1/timings/18-10-2026?latitude=21.3891&longitude=39.8579&method=2"
        );

        let candidates = c.candidates(&url);
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], url);
        assert!(candidates[1].starts_with("https://api.allorigins.win/raw?url=https%3A%2F%2Fapi.aladhan.com"));
        assert!(candidates[2].starts_with("https://corsproxy.io/?https%3A%2F%2F"));
        assert!(candidates[3].starts_with("https://api.codetabs.com/v1/proxy?quest="));
    }

    #[tokio::test]
    async fn test_third_candidate_wins_and_fourth_is_never_tried() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportFailure::Network("connection refused".into())),
            Ok(HttpResponse { status: 502, body: "bad gateway".into() }),
            Ok(HttpResponse::ok(OK_BODY)),
            Ok(HttpResponse::ok(OK_BODY)),
        ]));
        let c = client(transport.clone());

        let record = c
            .fetch_daily(&Coordinate::fallback(), CalculationSelection::default(), date())
            .await
            .unwrap();
        assert_eq!(record.isha.to_string(), "19:30");
        assert_eq!(record.sunrise.map(|t| t.to_string()).as_deref(), Some("06:15"));

        let requested = transport.requested();
        assert_eq!(requested.len(), 3);
        assert!(requested[2].starts_with("https://corsproxy.io/?"));
    }

    #[tokio::test]
    async fn test_all_candidates_fail_reports_last_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportFailure::Timeout),
            Ok(HttpResponse::ok("<html>not json</html>")),
            Ok(HttpResponse::ok(r#"{"code":400,"status":"BAD_REQUEST"}"#)),
            Ok(HttpResponse::ok(r#"{"code":200,"status":"OK","data":{"timings":{"Fajr":"05:00"}}}"#)),
        ]));
        let c = client(transport.clone());

        let err = c
            .fetch_daily(&Coordinate::fallback(), CalculationSelection::default(), date())
            .await
            .unwrap_err();
        match &err {
            MihrabError::PrayerTimeUnavailable { attempts, last_error } => {
                assert_eq!(*attempts, 4);
                assert_eq!(
                    last_error,
                    "API response missing required prayer times: Dhuhr, Asr, Maghrib, Isha"
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("missing required prayer times"));
        assert_eq!(transport.requested().len(), 4);
    }

    #[test]
    fn test_payload_classification() {
        let cases = [
            (r#"{"code":200,"status":"OK"}"#, "API response missing data field"),
            (r#"{"code":200,"status":"OK","data":{}}"#, "API response missing timings field"),
            (r#"{"code":500}"#, "API returned error: Unknown error"),
        ];
        for (body, expected) in cases {
            let err = parse_timings(HttpResponse::ok(body)).unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
        let err = parse_timings(HttpResponse::ok("{")).unwrap_err();
        assert!(matches!(err, TransportFailure::MalformedBody(_)));
    }

    struct StalledTransport;

    impl HttpTransport for StalledTransport {
        fn get<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<HttpResponse, TransportFailure>> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_is_bounded_by_timeout() {
        let c = client(Arc::new(StalledTransport));
        let started = tokio::time::Instant::now();
        let err = c
            .fetch_daily(&Coordinate::fallback(), CalculationSelection::default(), date())
            .await
            .unwrap_err();
        assert_eq!(started.elapsed(), PRAYER_REQUEST_TIMEOUT * 4);
        assert_eq!(
            err,
            MihrabError::prayer_time_unavailable(4, "Request timeout: API took too long to respond")
        );
    }

    #[tokio::test]
    async fn test_fetch_range_keeps_order_and_marks_failures() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(HttpResponse::ok(OK_BODY)),
            Err(TransportFailure::Timeout),
            Err(TransportFailure::Timeout),
            Err(TransportFailure::Timeout),
            Err(TransportFailure::Timeout),
            Ok(HttpResponse::ok(OK_BODY)),
        ]));
        let c = client(transport);
        let dates: Vec<_> = date().iter_days().take(3).collect();
        let days = c
            .fetch_range(&Coordinate::fallback(), CalculationSelection::default(), dates.clone())
            .await;

        assert_eq!(days.iter().map(|d| d.date).collect::<Vec<_>>(), dates);
        assert!(days[0].record.is_some());
        assert!(days[1].record.is_none());
        assert_eq!(days[1].cell(Prayer::Fajr), "--");
        assert_eq!(days[2].cell(Prayer::Asr), "15:30");
    }

    #[test]
    fn test_month_prefix_caps_at_fifteen_days() {
        let days: Vec<_> = month_prefix(date()).collect();
        assert_eq!(days.len(), 15);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(days[14], NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
    }

    #[test]
    fn test_config_builder_validation() {
        assert!(ClientConfig::builder().timeout(Duration::ZERO).build().is_err());
        assert!(ClientConfig::builder().base_url("  ").build().is_err());
        assert!(ClientConfig::builder().relays([""]).build().is_err());

        let config = ClientConfig::builder()
            .base_url("http://localhost:1234/v1/timings")
            .no_relays()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        assert!(config.relays.is_empty());
        assert_eq!(config.timeout, Duration::from_secs(2));
    }
}
