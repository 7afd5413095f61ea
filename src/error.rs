use thiserror::Error;

/// Result type alias for panoview operations.
pub type Result<T> = std::result::Result<T, PanoViewError>;

/// Errors that can occur when using the panoview library.
#[derive(Error, Debug)]
pub enum PanoViewError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Image processing error
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid response from the provider
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    /// Missing API key
    #[error("API key required for this operation. Use PanoView::with_api_key() to set one.")]
    MissingApiKey,

    /// One or more tiles of the grid never made it to the scratch directory
    #[error("incomplete tile grid: {} tiles missing", .missing.len())]
    PartialGrid {
        /// `(column, row)` positions with no scratch file
        missing: Vec<(u32, u32)>,
    },

    /// Stitching was asked to compose an empty tile set
    #[error("no tiles to stitch")]
    EmptyTileSet,
}
