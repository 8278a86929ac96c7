//! Location enrichment controller
//!
//! One request is one position fix and at most one reverse geocode.

use crate::error::{GeocodingFailure, GeolocationError};
use crate::fields::{FieldSetter, FormField};
use crate::geocode::{ReverseGeocoder, SuggestionPolicy};
use crate::notify::{Notification, Notifier, NullNotifier};
use crate::types::{Coordinates, LocationSuggestion};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Device position capability; may be absent or denied
pub trait GeolocationProvider: Send + Sync + 'static {
    fn is_supported(&self) -> bool;

    fn get_current_position(&self) -> impl Future<Output = Result<Coordinates, GeolocationError>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    Applied(LocationSuggestion),
    /// Another request was still in flight
    Ignored,
    Unsupported,
    Denied,
    PositionUnavailable(GeolocationError),
    GeocodingFailed(GeocodingFailure),
}

type LoadingCallback = Box<dyn Fn(bool) + Send + Sync>;

struct Inner<G, R> {
    geolocation: G,
    geocoder: R,
    fields: Arc<dyn FieldSetter>,
    notifier: Arc<dyn Notifier>,
    policy: SuggestionPolicy,
    on_loading_change: Option<LoadingCallback>,
    loading: AtomicBool,
    suggestion: Mutex<Option<LocationSuggestion>>,
}

pub struct LocationController<G, R> {
    inner: Arc<Inner<G, R>>,
}

impl<G, R> Clone for LocationController<G, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub struct LocationControllerBuilder<G, R> {
    geolocation: G,
    geocoder: R,
    fields: Arc<dyn FieldSetter>,
    notifier: Arc<dyn Notifier>,
    policy: SuggestionPolicy,
    on_loading_change: Option<LoadingCallback>,
}

impl<G: GeolocationProvider, R: ReverseGeocoder> LocationControllerBuilder<G, R> {
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn policy(mut self, policy: SuggestionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn on_loading_change(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_loading_change = Some(Box::new(f));
        self
    }

    pub fn build(self) -> LocationController<G, R> {
        LocationController {
            inner: Arc::new(Inner {
                geolocation: self.geolocation,
                geocoder: self.geocoder,
                fields: self.fields,
                notifier: self.notifier,
                policy: self.policy,
                on_loading_change: self.on_loading_change,
                loading: AtomicBool::new(false),
                suggestion: Mutex::new(None),
            }),
        }
    }
}

/// Holds the loading flag; releasing it on drop covers every exit path
struct LoadingGuard<'a, G, R> {
    inner: &'a Inner<G, R>,
}

impl<'a, G, R> LoadingGuard<'a, G, R> {
    fn acquire(inner: &'a Inner<G, R>) -> Option<Self> {
        inner
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        if let Some(cb) = &inner.on_loading_change {
            cb(true);
        }
        Some(Self { inner })
    }
}

impl<G, R> Drop for LoadingGuard<'_, G, R> {
    fn drop(&mut self) {
        self.inner.loading.store(false, Ordering::Release);
        if let Some(cb) = &self.inner.on_loading_change {
            cb(false);
        }
    }
}

impl<G: GeolocationProvider, R: ReverseGeocoder> LocationController<G, R> {
    pub fn builder(geolocation: G, geocoder: R, fields: Arc<dyn FieldSetter>) -> LocationControllerBuilder<G, R> {
        LocationControllerBuilder {
            geolocation,
            geocoder,
            fields,
            notifier: Arc::new(NullNotifier),
            policy: SuggestionPolicy::default(),
            on_loading_change: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::Acquire)
    }

    pub fn suggestion(&self) -> Option<LocationSuggestion> {
        self.lock_suggestion().clone()
    }

    /// Name waiting for an explicit accept
    pub fn pending_name(&self) -> Option<String> {
        self.lock_suggestion()
            .as_ref()
            .and_then(|s| s.suggested_name.clone())
    }

    pub async fn request_location(&self) -> LocationOutcome {
        let Some(_loading) = LoadingGuard::acquire(&self.inner) else {
            debug!("location request already in flight, ignoring");
            return LocationOutcome::Ignored;
        };
        *self.lock_suggestion() = None;

        if !self.inner.geolocation.is_supported() {
            warn!("geolocation unsupported");
            self.notify_manual_entry("Location is not available on this device.");
            return LocationOutcome::Unsupported;
        }

        let coords = match self.inner.geolocation.get_current_position().await {
            Ok(coords) if coords.is_valid() => coords,
            Ok(coords) => {
                warn!(?coords, "geolocation returned out-of-range coordinates");
                self.notify_manual_entry("Your location could not be determined.");
                return LocationOutcome::PositionUnavailable(GeolocationError::Unavailable(
                    "coordinates out of range".into(),
                ));
            }
            Err(GeolocationError::Unsupported) => {
                warn!("geolocation unsupported");
                self.notify_manual_entry("Location is not available on this device.");
                return LocationOutcome::Unsupported;
            }
            Err(GeolocationError::PermissionDenied) => {
                warn!("geolocation permission denied");
                self.notify_manual_entry("Location permission was denied.");
                return LocationOutcome::Denied;
            }
            Err(e) => {
                warn!(error = %e, "geolocation failed");
                self.notify_manual_entry("Your location could not be determined.");
                return LocationOutcome::PositionUnavailable(e);
            }
        };
        debug!(lat = coords.latitude, lon = coords.longitude, "position acquired");

        // Soft failures from here on: logged, never shown to the user
        let suggestion = match self.inner.geocoder.reverse(coords).await {
            Ok(response) => response.resolve(coords, self.inner.policy),
            Err(failure) => Err(failure),
        };
        let suggestion = match suggestion {
            Ok(suggestion) => suggestion,
            Err(failure) => {
                warn!(%failure, "reverse geocoding gave no usable address");
                return LocationOutcome::GeocodingFailed(failure);
            }
        };

        self.inner.fields.set_values(&[
            (FormField::City, suggestion.city.clone()),
            (FormField::State, suggestion.state.clone()),
            (FormField::Lat, suggestion.latitude.to_string()),
            (FormField::Lon, suggestion.longitude.to_string()),
        ]);
        *self.lock_suggestion() = Some(suggestion.clone());
        info!(city = %suggestion.city, state = %suggestion.state, "location fields applied");

        self.inner.notifier.notify(
            Notification::success("Location detected")
                .with_description(format!("{}, {}", suggestion.city, suggestion.state)),
        );
        if let Some(name) = &suggestion.suggested_name {
            self.inner.notifier.notify(
                Notification::info("Is this the institution's name?")
                    .with_description(name.clone())
                    .with_action("Use this name"),
            );
        }

        LocationOutcome::Applied(suggestion)
    }

    /// Write the pending name suggestion into the `name` field
    pub fn accept_suggestion(&self) -> Option<String> {
        let name = self
            .lock_suggestion()
            .as_mut()
            .and_then(|s| s.suggested_name.take())?;
        self.inner.fields.set_value(FormField::Name, &name);
        debug!(%name, "name suggestion accepted");
        Some(name)
    }

    pub fn dismiss_suggestion(&self) {
        if let Some(s) = self.lock_suggestion().as_mut() {
            s.suggested_name = None;
        }
    }

    fn notify_manual_entry(&self, message: &str) {
        self.inner.notifier.notify(
            Notification::error(message).with_description("Please enter the city and state manually."),
        );
    }

    fn lock_suggestion(&self) -> MutexGuard<'_, Option<LocationSuggestion>> {
        self.inner.suggestion.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::ReverseGeocodeResponse;
    use crate::notify::NotificationKind;
    use crate::test_support::{RecordingFields, RecordingNotifier};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct FakeGeolocation {
        supported: bool,
        result: Result<Coordinates, GeolocationError>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FakeGeolocation {
        fn at(lat: f64, lon: f64) -> Self {
            Self {
                supported: true,
                result: Ok(Coordinates::new(lat, lon)),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: GeolocationError) -> Self {
            Self {
                result: Err(error),
                ..Self::at(0.0, 0.0)
            }
        }
    }

    impl GeolocationProvider for FakeGeolocation {
        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn get_current_position(&self) -> Result<Coordinates, GeolocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.result.clone()
        }
    }

    enum Reply {
        Json(&'static str),
        Fail(GeocodingFailure),
        Panic,
    }

    /// Answers call n with replies[n], repeating the last one
    struct FakeGeocoder {
        replies: Vec<Reply>,
        calls: AtomicUsize,
    }

    impl FakeGeocoder {
        fn new(reply: Reply) -> Self {
            Self {
                replies: vec![reply],
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ReverseGeocoder for FakeGeocoder {
        async fn reverse(&self, _coords: Coordinates) -> Result<ReverseGeocodeResponse, GeocodingFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.replies[call.min(self.replies.len() - 1)] {
                Reply::Json(body) => ReverseGeocodeResponse::from_json(body),
                Reply::Fail(f) => Err(f.clone()),
                Reply::Panic => panic!("geocoder blew up"),
            }
        }
    }

    const SHAH_ALAM: &str = r#"{"address": {"city": "Shah Alam", "state": "Selangor"},
        "display_name": "Masjid X, Shah Alam, Selangor"}"#;

    struct Harness {
        controller: LocationController<FakeGeolocation, FakeGeocoder>,
        fields: Arc<RecordingFields>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(geolocation: FakeGeolocation, geocoder: FakeGeocoder) -> Harness {
        let fields = Arc::new(RecordingFields::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = LocationController::builder(geolocation, geocoder, fields.clone())
            .notifier(notifier.clone())
            .build();
        Harness {
            controller,
            fields,
            notifier,
        }
    }

    #[tokio::test]
    async fn test_applies_location_and_offers_name() {
        let h = harness(FakeGeolocation::at(3.0738, 101.5183), FakeGeocoder::new(Reply::Json(SHAH_ALAM)));

        let outcome = h.controller.request_location().await;

        assert!(matches!(outcome, LocationOutcome::Applied(_)));
        assert_eq!(h.fields.value(FormField::City).as_deref(), Some("Shah Alam"));
        assert_eq!(h.fields.value(FormField::State).as_deref(), Some("Selangor"));
        assert_eq!(h.fields.value(FormField::Lat).as_deref(), Some("3.0738"));
        assert_eq!(h.fields.value(FormField::Lon).as_deref(), Some("101.5183"));
        assert_eq!(h.fields.value(FormField::Name), None);
        assert_eq!(h.controller.pending_name().as_deref(), Some("Masjid X"));
        assert!(!h.controller.is_loading());

        let offers: Vec<_> = h
            .notifier
            .seen
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.action.is_some())
            .cloned()
            .collect();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].description.as_deref(), Some("Masjid X"));
    }

    #[tokio::test]
    async fn test_geo_fields_written_in_one_batch() {
        let h = harness(FakeGeolocation::at(3.0738, 101.5183), FakeGeocoder::new(Reply::Json(SHAH_ALAM)));
        h.controller.request_location().await;

        let batches = h.fields.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        let written: Vec<FormField> = batches[0].iter().map(|(f, _)| *f).collect();
        assert_eq!(
            written,
            vec![FormField::City, FormField::State, FormField::Lat, FormField::Lon]
        );
    }

    #[tokio::test]
    async fn test_accept_writes_name_once() {
        let h = harness(FakeGeolocation::at(3.0738, 101.5183), FakeGeocoder::new(Reply::Json(SHAH_ALAM)));
        h.controller.request_location().await;

        assert_eq!(h.controller.accept_suggestion().as_deref(), Some("Masjid X"));
        assert_eq!(h.fields.value(FormField::Name).as_deref(), Some("Masjid X"));
        assert_eq!(h.controller.accept_suggestion(), None);
        assert_eq!(h.fields.write_count(), 5);
    }

    #[tokio::test]
    async fn test_dismiss_discards_name() {
        let h = harness(FakeGeolocation::at(3.0738, 101.5183), FakeGeocoder::new(Reply::Json(SHAH_ALAM)));
        h.controller.request_location().await;

        h.controller.dismiss_suggestion();
        assert_eq!(h.controller.accept_suggestion(), None);
        assert_eq!(h.fields.value(FormField::Name), None);
        assert_eq!(h.controller.suggestion().unwrap().city, "Shah Alam");
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let h = harness(
            FakeGeolocation::failing(GeolocationError::PermissionDenied),
            FakeGeocoder::new(Reply::Json(SHAH_ALAM)),
        );

        let outcome = h.controller.request_location().await;

        assert_eq!(outcome, LocationOutcome::Denied);
        assert!(!h.controller.is_loading());
        assert_eq!(h.fields.write_count(), 0);
        assert_eq!(h.notifier.count(NotificationKind::Error), 1);
        assert_eq!(h.notifier.total(), 1);
        assert_eq!(h.controller.inner.geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_never_asks_for_position() {
        let geolocation = FakeGeolocation {
            supported: false,
            ..FakeGeolocation::at(3.0, 101.0)
        };
        let h = harness(geolocation, FakeGeocoder::new(Reply::Json(SHAH_ALAM)));

        assert_eq!(h.controller.request_location().await, LocationOutcome::Unsupported);
        assert_eq!(h.controller.inner.geolocation.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.count(NotificationKind::Error), 1);
        assert!(!h.controller.is_loading());
    }

    #[tokio::test]
    async fn test_geocoding_failures_are_silent() {
        let replies = [
            Reply::Fail(GeocodingFailure::Transport("connection refused".into())),
            Reply::Fail(GeocodingFailure::Status(503)),
            Reply::Json("not json"),
            Reply::Json(r#"{"display_name": "Somewhere"}"#),
            Reply::Json(r#"{"address": {"city": "Shah Alam"}, "display_name": "Masjid X"}"#),
        ];

        for reply in replies {
            let h = harness(FakeGeolocation::at(3.0738, 101.5183), FakeGeocoder::new(reply));

            let outcome = h.controller.request_location().await;

            assert!(matches!(outcome, LocationOutcome::GeocodingFailed(_)), "{:?}", outcome);
            assert_eq!(h.fields.write_count(), 0);
            assert_eq!(h.notifier.total(), 0);
            assert_eq!(h.controller.pending_name(), None);
            assert!(!h.controller.is_loading());
            assert_eq!(h.controller.inner.geocoder.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_loading_released_when_geocoder_panics() {
        let h = harness(FakeGeolocation::at(3.0738, 101.5183), FakeGeocoder::new(Reply::Panic));
        let controller = h.controller.clone();

        let joined = tokio::spawn(async move { controller.request_location().await }).await;

        assert!(joined.unwrap_err().is_panic());
        assert!(!h.controller.is_loading());
        assert_eq!(h.fields.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_request_ignored() {
        let geolocation = FakeGeolocation {
            delay: Some(Duration::from_millis(200)),
            ..FakeGeolocation::at(3.0738, 101.5183)
        };
        let h = harness(geolocation, FakeGeocoder::new(Reply::Json(SHAH_ALAM)));

        let (first, second) = tokio::join!(h.controller.request_location(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.controller.request_location().await
        });

        assert!(matches!(first, LocationOutcome::Applied(_)));
        assert_eq!(second, LocationOutcome::Ignored);
        assert_eq!(h.controller.inner.geolocation.calls.load(Ordering::SeqCst), 1);
        assert!(!h.controller.is_loading());
    }

    #[tokio::test]
    async fn test_loading_callback_pairs() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorder = events.clone();
        let controller = LocationController::builder(
            FakeGeolocation::failing(GeolocationError::Timeout),
            FakeGeocoder::new(Reply::Json(SHAH_ALAM)),
            Arc::new(RecordingFields::default()),
        )
        .on_loading_change(move |loading| recorder.lock().unwrap().push(loading))
        .build();

        let outcome = controller.request_location().await;

        assert_eq!(outcome, LocationOutcome::PositionUnavailable(GeolocationError::Timeout));
        assert_eq!(*events.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_new_request_discards_previous_suggestion() {
        let geocoder = FakeGeocoder {
            replies: vec![
                Reply::Json(SHAH_ALAM),
                Reply::Fail(GeocodingFailure::Status(429)),
            ],
            calls: AtomicUsize::new(0),
        };
        let h = harness(FakeGeolocation::at(3.0738, 101.5183), geocoder);

        h.controller.request_location().await;
        assert_eq!(h.controller.pending_name().as_deref(), Some("Masjid X"));

        h.controller.request_location().await;
        assert_eq!(h.controller.pending_name(), None);
        assert_eq!(h.controller.suggestion(), None);
        assert_eq!(h.controller.accept_suggestion(), None);
    }
}
