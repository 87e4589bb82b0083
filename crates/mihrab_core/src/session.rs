//! One user's prayer-times view.
//!
//! Holds the resolved location, the calculation selection and the day's
//! schedule. Every mutation goes through `&mut self`.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use mihrab_network::{
    ClientConfig, GeoLocator, LocationSensor, LocationStore, LocatorConfig, PrayerTimeClient,
    Resolution, ReverseGeocoder, ReqwestTransport,
};
use mihrab_schedule::{CountdownTimer, DisplayTarget, PrayerScheduleEngine};
use mihrab_types::{
    CalculationMethod, CalculationSelection, CountdownState, MihrabError, PrayerRow, QiblaResult,
    ScheduleStatus, School,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{DateLabels, date_labels};

/// Everything needed to build a [`Session`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub client: ClientConfig,
    pub locator: LocatorConfig,
    pub selection: CalculationSelection,
}

/// Location, selection and schedule state for one view.
#[derive(Debug)]
pub struct Session {
    client: PrayerTimeClient,
    locator: GeoLocator,
    selection: CalculationSelection,
    location: Option<Resolution>,
    engine: Option<PrayerScheduleEngine>,
    last_error: Option<MihrabError>,
}

impl Session {
    pub fn new(client: PrayerTimeClient, locator: GeoLocator, selection: CalculationSelection) -> Self {
        Self { client, locator, selection, location: None, engine: None, last_error: None }
    }

    /// Builds the reqwest-backed client, geocoder and locator from `config`.
    ///
    /// # Errors
    /// `NetworkError` if the HTTP client cannot be created.
    pub fn from_config(
        config: SessionConfig,
        store: Arc<dyn LocationStore>,
        sensor: Option<Arc<dyn LocationSensor>>,
    ) -> Result<Self, MihrabError> {
        let transport = Arc::new(ReqwestTransport::new(&config.client.user_agent)?);
        let geocoder = ReverseGeocoder::with_transport(transport.clone(), config.locator.geocoder_url.clone());
        let mut locator = GeoLocator::new(store, geocoder, config.locator);
        if let Some(sensor) = sensor {
            locator = locator.with_sensor(sensor);
        }
        let client = PrayerTimeClient::with_transport(transport, config.client);
        Ok(Self::new(client, locator, config.selection))
    }

    /// Resolves the location, then loads the schedule for `now`'s date.
    ///
    /// # Errors
    /// The fetch error, if prayer times could not be loaded. The location is
    /// always resolved.
    pub async fn start(&mut self, now: NaiveDateTime) -> Result<&ScheduleStatus, MihrabError> {
        self.locate().await;
        self.refresh(now).await?;
        self.status().ok_or_else(|| MihrabError::prayer_time_unavailable(0, "no schedule"))
    }

    /// Resolves and stores the location.
    pub async fn locate(&mut self) -> &Resolution {
        let resolution = self.locator.resolve().await;
        self.location.insert(resolution)
    }

    /// Forgets the cached location and resolves again.
    pub async fn detect_again(&mut self, now: NaiveDateTime) -> Result<(), MihrabError> {
        if let Err(e) = self.locator.forget() {
            warn!(error = %e, "could not clear cached location");
        }
        self.locate().await;
        self.refresh(now).await
    }

    /// Refetches the schedule for `now`'s date at the current location.
    ///
    /// On failure the previous schedule is discarded so stale times are never
    /// shown, and the error is kept for [`last_error`](Self::last_error).
    ///
    /// # Errors
    /// `LocationUnavailable` if no location has been resolved yet, or the
    /// client's error.
    pub async fn refresh(&mut self, now: NaiveDateTime) -> Result<(), MihrabError> {
        let Some(location) = &self.location else {
            let e = MihrabError::location_unavailable("Location not available");
            self.last_error = Some(e.clone());
            return Err(e);
        };

        match self.client.fetch_daily(&location.coordinate, self.selection, now.date()).await {
            Ok(record) => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.replace_record(record, now);
                } else {
                    self.engine = Some(PrayerScheduleEngine::new(record, now));
                }
                self.last_error = None;
                info!(method = %self.selection.method, school = %self.selection.school, "schedule refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "schedule refresh failed");
                self.engine = None;
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Same as [`refresh`](Self::refresh); the action behind a "try again" button.
    pub async fn retry(&mut self, now: NaiveDateTime) -> Result<(), MihrabError> {
        self.refresh(now).await
    }

    /// Changes the method, refreshing when a location is known.
    pub async fn set_method(&mut self, method: CalculationMethod, now: NaiveDateTime) -> Result<(), MihrabError> {
        self.set_selection(self.selection.method(method), now).await
    }

    /// Changes the school, refreshing when a location is known.
    pub async fn set_school(&mut self, school: School, now: NaiveDateTime) -> Result<(), MihrabError> {
        self.set_selection(self.selection.school(school), now).await
    }

    async fn set_selection(&mut self, selection: CalculationSelection, now: NaiveDateTime) -> Result<(), MihrabError> {
        self.selection = selection;
        if self.location.is_some() {
            self.refresh(now).await
        } else {
            Ok(())
        }
    }

    pub fn selection(&self) -> CalculationSelection {
        self.selection
    }

    pub fn location(&self) -> Option<&Resolution> {
        self.location.as_ref()
    }

    pub fn engine(&self) -> Option<&PrayerScheduleEngine> {
        self.engine.as_ref()
    }

    pub fn status(&self) -> Option<&ScheduleStatus> {
        self.engine.as_ref().map(PrayerScheduleEngine::status)
    }

    pub fn last_error(&self) -> Option<&MihrabError> {
        self.last_error.as_ref()
    }

    /// Countdown at `now`, re-resolving the next prayer as needed.
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<CountdownState> {
        self.engine.as_mut().map(|e| e.tick(now))
    }

    pub fn table(&self, now: NaiveDateTime) -> Option<Vec<PrayerRow>> {
        self.engine.as_ref().map(|e| e.table(now).into_vec())
    }

    /// Qibla from the resolved location.
    pub fn qibla(&self) -> Option<QiblaResult> {
        self.location.as_ref().map(|r| mihrab_qibla::qibla(&r.coordinate))
    }

    /// Header labels for `now`'s date in `now`'s zone.
    pub fn labels(&self, now: DateTime<FixedOffset>) -> DateLabels {
        date_labels(now.date_naive(), *now.offset())
    }

    /// Starts `timer` on a copy of the current schedule.
    ///
    /// Returns `false`, leaving the timer untouched, when there is no schedule.
    pub fn drive_countdown<D>(&self, timer: &mut CountdownTimer, display: D) -> bool
    where
        D: DisplayTarget<CountdownState>,
    {
        match &self.engine {
            Some(engine) => {
                timer.start_countdown(engine.clone(), display);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mihrab_network::{BoxFuture, FixedSensor, HttpResponse, HttpTransport, MemoryStore, TransportFailure};
    use mihrab_types::{Coordinate, Prayer};
    use std::sync::Mutex;

    const OK_BODY: &str = r#"{"code":200,"status":"OK","data":{"timings":{
        "Fajr":"05:00","Sunrise":"06:15","Dhuhr":"12:00","Asr":"15:30","Maghrib":"18:00","Isha":"19:30"}}}"#;

    /// Answers by URL substring; records requests.
    struct Router {
        routes: Vec<(&'static str, Result<HttpResponse, TransportFailure>)>,
        seen: Mutex<Vec<String>>,
    }

    impl HttpTransport for Router {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, TransportFailure>> {
            self.seen.lock().unwrap().push(url.to_string());
            let answer = self
                .routes
                .iter()
                .find(|(needle, _)| url.contains(needle))
                .map(|(_, r)| r.clone())
                .unwrap_or_else(|| Err(TransportFailure::Network("unrouted".into())));
            Box::pin(async move { answer })
        }
    }

    fn session(routes: Vec<(&'static str, Result<HttpResponse, TransportFailure>)>) -> (Session, Arc<Router>) {
        let router = Arc::new(Router { routes, seen: Mutex::default() });
        let client = PrayerTimeClient::with_transport(router.clone(), ClientConfig::builder().no_relays().build().unwrap());
        let geocoder = ReverseGeocoder::with_transport(router.clone(), "http://geo.test/reverse");
        let locator = GeoLocator::new(Arc::new(MemoryStore::new()), geocoder, LocatorConfig::default())
            .with_sensor(Arc::new(FixedSensor::at(Coordinate::new_unchecked(-6.2088, 106.8456))));
        (Session::new(client, locator, CalculationSelection::default()), router)
    }

    fn ten_am() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    #[test]
    fn test_labels_follow_given_instant() {
        let (s, _) = session(Vec::new());
        let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
        let now = ten_am().and_local_timezone(jakarta).unwrap();

        let labels = s.labels(now);
        assert_eq!(labels.gregorian, "Sunday, October 18, 2026");
        assert_eq!(labels.timezone, "UTC+7");

        // 23:30 UTC on the 17th is already the 18th in Jakarta
        let utc_evening = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap().and_hms_opt(23, 30, 0).unwrap();
        let shifted = utc_evening.and_utc().with_timezone(&jakarta);
        assert_eq!(s.labels(shifted).gregorian, "Sunday, October 18, 2026");
    }

    #[tokio::test]
    async fn test_start_resolves_and_schedules() {
        let (mut s, _) = session(vec![
            ("geo.test", Ok(HttpResponse::ok(r#"{"city":"Jakarta"}"#))),
            ("aladhan", Ok(HttpResponse::ok(OK_BODY))),
        ]);
        let status = *s.start(ten_am()).await.unwrap();
        assert_eq!(status.next, Prayer::Dhuhr);
        assert_eq!(s.location().unwrap().coordinate.name.as_deref(), Some("Jakarta"));
        assert_eq!(s.tick(ten_am()).unwrap().to_string(), "02:00:00");
        assert_eq!(s.table(ten_am()).unwrap().len(), 6);
        assert_eq!(s.qibla().unwrap().direction, "WNW");
    }

    #[tokio::test]
    async fn test_failure_clears_schedule_and_retry_recovers() {
        let (mut s, _) = session(vec![("aladhan", Ok(HttpResponse::ok(OK_BODY)))]);
        s.start(ten_am()).await.unwrap();
        assert!(s.engine().is_some());

        // swap in a client whose only candidate fails
        let failing = Arc::new(Router {
            routes: vec![("aladhan", Err(TransportFailure::Timeout))],
            seen: Mutex::default(),
        });
        let good = std::mem::replace(
            &mut s.client,
            PrayerTimeClient::with_transport(failing, ClientConfig::builder().no_relays().build().unwrap()),
        );
        let err = s.retry(ten_am()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(s.engine().is_none());
        assert_eq!(s.last_error(), Some(&err));

        s.client = good;
        s.retry(ten_am()).await.unwrap();
        assert!(s.engine().is_some());
        assert!(s.last_error().is_none());
    }

    #[tokio::test]
    async fn test_selection_change_refreshes_only_with_location() {
        let (mut s, router) = session(vec![("aladhan", Ok(HttpResponse::ok(OK_BODY)))]);

        s.set_school(School::Shafi, ten_am()).await.unwrap();
        assert!(router.seen.lock().unwrap().is_empty());
        assert!(matches!(
            s.refresh(ten_am()).await,
            Err(MihrabError::LocationUnavailable { .. })
        ));

        s.locate().await;
        s.set_method(CalculationMethod::UmmAlQura, ten_am()).await.unwrap();
        let seen = router.seen.lock().unwrap().clone();
        assert!(seen.last().unwrap().ends_with("method=4"));
        assert_eq!(s.selection(), CalculationSelection::new(CalculationMethod::UmmAlQura, School::Shafi));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_countdown() {
        let (mut s, _) = session(vec![("aladhan", Ok(HttpResponse::ok(OK_BODY)))]);
        let mut timer = CountdownTimer::new();
        assert!(!s.drive_countdown(&mut timer, |_c: CountdownState| {}));

        s.start(ten_am()).await.unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        assert!(s.drive_countdown(&mut timer, move |c: CountdownState| {
            let _ = tx.send(c);
        }));
        assert!(rx.recv().await.is_some());
        assert!(timer.is_active());
    }
}
