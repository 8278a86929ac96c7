mod exif;

pub use self::exif::read_gps;

use sedekah_qr_common::{Coordinates, GeolocationError, GeolocationProvider};
use std::path::PathBuf;

/// Where the "use my location" action gets its position from
#[derive(Debug, Clone)]
pub enum DeviceLocation {
    /// Coordinates given on the command line
    Fixed(Coordinates),
    /// GPS tags embedded in a photo
    Exif(PathBuf),
    /// No positioning capability at all
    Unavailable,
}

impl GeolocationProvider for DeviceLocation {
    fn is_supported(&self) -> bool {
        !matches!(self, DeviceLocation::Unavailable)
    }

    async fn get_current_position(&self) -> Result<Coordinates, GeolocationError> {
        match self {
            DeviceLocation::Fixed(coords) => Ok(*coords),
            DeviceLocation::Exif(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || read_gps(&path))
                    .await
                    .map_err(|e| GeolocationError::Unavailable(e.to_string()))?
            }
            DeviceLocation::Unavailable => Err(GeolocationError::Unsupported),
        }
    }
}
