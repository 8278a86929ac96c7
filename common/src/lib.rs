//! sedekah-qr common library

pub mod types;
pub mod error;
pub mod fields;
pub mod notify;
pub mod decoder;
pub mod extraction;
pub mod geocode;
pub mod location;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::{Coordinates, DecodeResult, ExtractionState, FileSource, LocationSuggestion, SelectedFile};
pub use error::{DecodeError, GeocodingFailure, GeolocationError};
pub use fields::{FieldSetter, FormField};
pub use notify::{Notification, NotificationKind, Notifier, NullNotifier, TracingNotifier};
pub use decoder::{decode_bytes, decode_rgba, QrDecoder};
pub use extraction::{ExtractionController, ExtractionOutcome, FileHandler, ImageLoader};
pub use geocode::{Address, ReverseGeocodeResponse, ReverseGeocoder, SuggestionPolicy};
pub use location::{GeolocationProvider, LocationController, LocationOutcome};
