//! # panoview
//!
//! An async Rust library for discovering and reconstructing street-level
//! panoramas.
//!
//! This library provides:
//! - Discovery of panorama IDs near a GPS coordinate, including historical
//!   captures, by scraping the provider's undocumented search endpoints
//! - Reconciliation of capture dates with the discovered records
//! - Tile-grid planning, concurrent tile download, and stitching into one
//!   equirectangular composite image
//! - Flat (bounded field-of-view) images via the official keyed endpoint
//!
//! ## Example
//!
//! ```no_run
//! use panoview::PanoView;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PanoView::new();
//!
//!     // Resolve a coordinate to nearby panoramas, oldest capture first
//!     let records = client.search_panoramas(48.8584, 2.2945).await;
//!     let record = records.first().expect("no imagery nearby");
//!
//!     // Fetch and stitch the full tile grid
//!     let path = client
//!         .download_panorama(
//!             &record.pano_id,
//!             5,
//!             Path::new("scratch"),
//!             Path::new("panoramas"),
//!             &Default::default(),
//!         )
//!         .await?;
//!     println!("saved {}", path.display());
//!     Ok(())
//! }
//! ```

mod error;
mod fetch;
mod flat;
mod metadata;
mod search;
mod stitch;
mod tiles;
mod types;
pub mod geo;
pub mod parse;

pub use error::{PanoViewError, Result};
pub use fetch::{fetch_tiles, FetchOptions};
pub use flat::{fetch_flat, fetch_flat_quad, FlatOptions, QUAD_HEADINGS};
pub use search::{callback_token, discovery_url, DiscoveryQuery, DEFAULT_RADIUS};
pub use stitch::{delete_tiles, stitch_tiles, StitchOptions};
pub use tiles::{plan_tiles, TileHost, GRID_ROWS, TILE_EDGE};
pub use types::{
    CaptureDate, GridConfig, ImageFormat, Location, MetaData, PanoramaRecord, TileDescriptor,
};

use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-request timeout; a hung socket must not stall the pipeline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for the plan → fetch → stitch → cleanup pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Tile host to plan against
    pub host: TileHost,
    /// Retry and concurrency policy for the download stage
    pub fetch: FetchOptions,
    /// Output settings for the stitch stage
    pub stitch: StitchOptions,
}

/// Main client for panorama discovery and reconstruction.
///
/// Holds a reusable HTTP client for connection pooling, the optional API key
/// for the official endpoints, and the tile-grid configuration.
#[derive(Clone)]
pub struct PanoView {
    client: Client,
    api_key: Option<String>,
    grid: GridConfig,
}

fn default_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .unwrap_or_default()
}

impl PanoView {
    /// Creates a new client without an API key.
    ///
    /// Sufficient for discovery and tile download, which use undocumented
    /// endpoints. An API key is only needed for the official flat-image and
    /// metadata calls.
    pub fn new() -> Self {
        Self {
            client: default_client(),
            api_key: None,
            grid: GridConfig::default(),
        }
    }

    /// Creates a new client with an API key for the official endpoints.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            client: default_client(),
            api_key: Some(api_key.into()),
            grid: GridConfig::default(),
        }
    }

    /// Creates a new client around a custom `reqwest::Client`.
    ///
    /// Use this to configure proxies, custom timeouts, or headers.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            api_key: None,
            grid: GridConfig::default(),
        }
    }

    /// Overrides the tile-grid configuration.
    ///
    /// ```
    /// use panoview::{GridConfig, PanoView};
    /// let client = PanoView::new().with_grid(GridConfig { columns: 25 });
    /// ```
    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    /// Search for panoramas near a GPS coordinate.
    ///
    /// Returns all discovered records within the default radius, deduplicated
    /// and sorted ascending by capture date with undated records last. A
    /// transport failure or unusable response yields an empty list, never an
    /// error; this path is not retried.
    pub async fn search_panoramas(&self, lat: f64, lon: f64) -> Vec<PanoramaRecord> {
        search::search_panoramas(&self.client, lat, lon, DEFAULT_RADIUS, false).await
    }

    /// Search for panoramas with an explicit radius (meters).
    ///
    /// With `closest` set, only as many leading records are returned as the
    /// response carried capture dates — the provider's convention for
    /// "genuinely distinct visits at the nearest spot".
    pub async fn search_panoramas_with(
        &self,
        lat: f64,
        lon: f64,
        radius: u32,
        closest: bool,
    ) -> Vec<PanoramaRecord> {
        search::search_panoramas(&self.client, lat, lon, radius, closest).await
    }

    /// Search for panoramas through the satellite-tile fallback endpoint.
    ///
    /// The coordinate is projected to tile indices at zoom 17 and the
    /// response is parsed with the looser record shape (no orientation data).
    pub async fn search_panoramas_satellite(&self, lat: f64, lon: f64) -> Vec<PanoramaRecord> {
        search::search_panoramas_satellite(&self.client, lat, lon, false).await
    }

    /// Fetch the raw body of a discovery query without parsing it.
    pub async fn fetch_discovery_raw(&self, query: &DiscoveryQuery<'_>) -> Result<String> {
        search::fetch_discovery_raw(&self.client, query).await
    }

    /// Parse panorama records out of a discovery response obtained elsewhere.
    ///
    /// Applies the loose record shape with the same dedupe, date
    /// reconciliation, and ordering as a live search.
    pub fn records_from_response(&self, text: &str, closest: bool) -> Vec<PanoramaRecord> {
        parse::parse_discovery_response_loose(text, closest)
    }

    /// Plan the tile grid for a panorama on the primary tile host.
    pub fn plan_tiles(&self, pano_id: &str, zoom: u8) -> Vec<TileDescriptor> {
        tiles::plan_tiles(pano_id, zoom, &self.grid, TileHost::Primary)
    }

    /// Plan the tile grid on an explicitly chosen host.
    ///
    /// Switch to [`TileHost::Alternate`] when the primary host serves error
    /// tiles for a panorama.
    pub fn plan_tiles_on(&self, pano_id: &str, zoom: u8, host: TileHost) -> Vec<TileDescriptor> {
        tiles::plan_tiles(pano_id, zoom, &self.grid, host)
    }

    /// Download a set of planned tiles into a scratch directory.
    pub async fn download_tiles(
        &self,
        tiles: &[TileDescriptor],
        scratch_dir: &Path,
        opts: &FetchOptions,
    ) -> Result<()> {
        fetch::fetch_tiles(&self.client, tiles, scratch_dir, opts).await
    }

    /// Run the full pipeline: plan, fetch, stitch, clean up.
    ///
    /// The scratch tiles are removed whether or not stitching succeeds; the
    /// composite lands in `output_dir` and its path is returned.
    ///
    /// ```no_run
    /// # use panoview::PanoView;
    /// # use std::path::Path;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = PanoView::new();
    /// let records = client.search_panoramas(41.8982208, 12.4764804).await;
    /// let path = client
    ///     .download_panorama(
    ///         &records[0].pano_id,
    ///         5,
    ///         Path::new("scratch"),
    ///         Path::new("panoramas"),
    ///         &Default::default(),
    ///     )
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn download_panorama(
        &self,
        pano_id: &str,
        zoom: u8,
        scratch_dir: &Path,
        output_dir: &Path,
        opts: &PipelineOptions,
    ) -> Result<PathBuf> {
        let tiles = tiles::plan_tiles(pano_id, zoom, &self.grid, opts.host);
        let fetched = fetch::fetch_tiles(&self.client, &tiles, scratch_dir, &opts.fetch).await;
        let result = match fetched {
            Ok(()) => stitch::stitch_tiles(pano_id, &tiles, scratch_dir, output_dir, &opts.stitch),
            Err(e) => Err(e),
        };
        stitch::delete_tiles(&tiles, scratch_dir);
        result
    }

    /// Fetch a flat image via the official keyed endpoint.
    ///
    /// Requires an API key. Returns `Ok(None)` when the endpoint answers with
    /// a payload that is not a decodable image.
    pub async fn fetch_flat(
        &self,
        pano_id: &str,
        heading: u16,
        out_dir: &Path,
        opts: &FlatOptions,
    ) -> Result<Option<PathBuf>> {
        let api_key = self.api_key.as_ref().ok_or(PanoViewError::MissingApiKey)?;
        flat::fetch_flat(&self.client, pano_id, heading, out_dir, api_key, opts).await
    }

    /// Fetch flat images for the four canonical headings (0/90/180/270).
    pub async fn fetch_flat_quad(
        &self,
        pano_id: &str,
        out_dir: &Path,
        opts: &FlatOptions,
    ) -> Result<Vec<Option<PathBuf>>> {
        let api_key = self.api_key.as_ref().ok_or(PanoViewError::MissingApiKey)?;
        flat::fetch_flat_quad(&self.client, pano_id, out_dir, api_key, opts).await
    }

    /// Get official metadata for a panorama. Requires an API key.
    pub async fn panorama_metadata(&self, pano_id: &str) -> Result<MetaData> {
        let api_key = self.api_key.as_ref().ok_or(PanoViewError::MissingApiKey)?;
        metadata::get_panorama_meta(&self.client, pano_id, api_key).await
    }
}

impl Default for PanoView {
    fn default() -> Self {
        Self::new()
    }
}
