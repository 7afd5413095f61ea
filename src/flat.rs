//! Flat (bounded field-of-view) images via the official keyed endpoint.
//!
//! These are rendered partial views, not panoramas; no discovery or stitching
//! is involved. They exist as the narrower, authenticated alternative to the
//! tile pipeline.

use crate::error::Result;
use crate::types::ImageFormat;
use reqwest::Client;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const STREETVIEW_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview";

/// The four canonical headings that approximate full coverage.
pub const QUAD_HEADINGS: [u16; 4] = [0, 90, 180, 270];

/// Parameters for a flat image request.
#[derive(Debug, Clone)]
pub struct FlatOptions {
    /// Image width in pixels (max 640 for non-premium keys)
    pub width: u32,
    /// Image height in pixels (max 640 for non-premium keys)
    pub height: u32,
    /// Field of view in degrees
    pub fov: u16,
    /// Camera pitch in degrees
    pub pitch: i16,
    /// Output format the fetched bytes are re-encoded to
    pub format: ImageFormat,
    /// Capture year used in the default output name
    pub year: u16,
    /// Caller-supplied file stem; overrides the `<year>_<id>_<heading>` name
    pub file_stem: Option<String>,
}

impl Default for FlatOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 640,
            fov: 120,
            pitch: 0,
            format: ImageFormat::Jpeg,
            year: 2017,
            file_stem: None,
        }
    }
}

fn flat_url(pano_id: &str, heading: u16, api_key: &str, opts: &FlatOptions) -> String {
    format!(
        "{STREETVIEW_ENDPOINT}?size={}x{}&fov={}&pitch={}&heading={heading}&pano={pano_id}&key={api_key}",
        opts.width, opts.height, opts.fov, opts.pitch
    )
}

/// Fetch one flat image and write it to `out_dir`.
///
/// The endpoint sometimes answers with a placeholder payload that is not a
/// decodable image; that case yields `Ok(None)` with a diagnostic instead of
/// an error, and no file is written.
pub async fn fetch_flat(
    client: &Client,
    pano_id: &str,
    heading: u16,
    out_dir: &Path,
    api_key: &str,
    opts: &FlatOptions,
) -> Result<Option<PathBuf>> {
    let url = flat_url(pano_id, heading, api_key, opts);
    let response = client.get(&url).send().await?;
    let bytes = response.bytes().await?;

    let img = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!(pano_id, heading, "flat image payload did not decode: {e}");
            return Ok(None);
        }
    };

    let stem = match &opts.file_stem {
        Some(stem) => stem.clone(),
        None => format!("{}_{pano_id}_{heading}", opts.year),
    };
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{stem}.{}", opts.format.extension()));
    img.save_with_format(&path, opts.format.into())?;
    Ok(Some(path))
}

/// Fetch the four canonical headings of a panorama.
///
/// Returns one entry per heading, `None` where the payload did not decode.
pub async fn fetch_flat_quad(
    client: &Client,
    pano_id: &str,
    out_dir: &Path,
    api_key: &str,
    opts: &FlatOptions,
) -> Result<Vec<Option<PathBuf>>> {
    let mut paths = Vec::with_capacity(QUAD_HEADINGS.len());
    for heading in QUAD_HEADINGS {
        paths.push(fetch_flat(client, pano_id, heading, out_dir, api_key, opts).await?);
    }
    Ok(paths)
}
