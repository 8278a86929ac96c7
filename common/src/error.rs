//! Error types

use thiserror::Error;

/// The image could not be loaded or rasterized.
///
/// A readable image without a QR pattern is `DecodeResult::NotFound`, not an error.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to read image file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("pixel buffer is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Device position could not be obtained
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("geolocation is not supported")]
    Unsupported,

    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("timed out waiting for position")]
    Timeout,
}

/// Reverse geocoding gave nothing usable. Always a soft failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeocodingFailure {
    #[error("geocoding request failed: {0}")]
    Transport(String),

    #[error("geocoding service returned HTTP {0}")]
    Status(u16),

    #[error("malformed geocoding response: {0}")]
    Parse(String),

    #[error("geocoding response has no address")]
    MissingAddress,

    #[error("geocoding address is missing {0}")]
    IncompleteAddress(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: DecodeError = io_error.into();
        assert!(matches!(error, DecodeError::Read(_)));
        assert!(format!("{}", error).contains("file not found"));
    }

    #[test]
    fn test_buffer_size_display() {
        let error = DecodeError::BufferSize {
            width: 2,
            height: 2,
            expected: 16,
            actual: 3,
        };
        assert_eq!(
            format!("{}", error),
            "pixel buffer is 3 bytes, expected 16 for 2x2 RGBA"
        );
    }

    #[test]
    fn test_incomplete_address_display() {
        let failure = GeocodingFailure::IncompleteAddress("state");
        assert_eq!(format!("{}", failure), "geocoding address is missing state");
    }
}
