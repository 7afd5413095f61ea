use serde::{Deserialize, Serialize};

/// Capture date of a panorama, month resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaptureDate {
    /// Capture year (20xx)
    pub year: u16,
    /// Capture month (1-12)
    pub month: u8,
}

impl std::fmt::Display for CaptureDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// A panorama discovered near a GPS coordinate.
///
/// Records are immutable once date reconciliation has run; two records are
/// duplicates iff all populated fields are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanoramaRecord {
    /// Unique panorama identifier
    pub pano_id: String,
    /// Latitude coordinate
    pub lat: f64,
    /// Longitude coordinate
    pub lon: f64,
    /// Camera heading in degrees, only present for the rich discovery query
    pub heading: Option<f64>,
    /// Camera tilt in degrees, only present for the rich discovery query
    pub tilt: Option<f64>,
    /// Camera roll in degrees, only present for the rich discovery query
    pub roll: Option<f64>,
    /// Capture date, absent when no date could be reconciled
    pub date: Option<CaptureDate>,
}

/// Tile grid configuration.
///
/// The tile service serves a fixed 13-row grid; the column count is a protocol
/// constant too but occasionally needs narrowing to avoid a cropped final
/// column, so it is configurable here rather than baked in.
#[derive(Debug, Clone, Copy)]
pub struct GridConfig {
    /// Number of tile columns (default 26)
    pub columns: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { columns: 26 }
    }
}

/// A single planned tile: grid position, scratch file name, and source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDescriptor {
    /// Column within the grid
    pub column: u32,
    /// Row within the grid
    pub row: u32,
    /// Scratch file name, unique per panorama + position
    pub file_name: String,
    /// Source URL for the tile bytes
    pub url: String,
}

/// GPS location with latitude and longitude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Latitude coordinate
    pub lat: f64,
    /// Longitude coordinate
    pub lng: f64,
}

/// Official metadata for a panorama, from the keyed metadata endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaData {
    /// Date of panorama capture, `YYYY-MM`
    pub date: String,
    /// GPS location
    pub location: Location,
    /// Panorama ID
    pub pano_id: String,
    /// Copyright information
    pub copyright: String,
}

/// Image output format for flat images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG format
    Jpeg,
    /// PNG format
    Png,
}

impl ImageFormat {
    /// File extension used for output names.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_date_ordering() {
        let a = CaptureDate { year: 2013, month: 12 };
        let b = CaptureDate { year: 2014, month: 1 };
        let c = CaptureDate { year: 2014, month: 6 };
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_capture_date_display() {
        let d = CaptureDate { year: 2015, month: 3 };
        assert_eq!(d.to_string(), "2015-03");
    }

    #[test]
    fn test_default_grid() {
        assert_eq!(GridConfig::default().columns, 26);
    }
}
