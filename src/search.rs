//! Discovery: resolving a GPS coordinate to nearby panorama records.

use crate::geo;
use crate::parse::{self, GRAMMAR_VERSION};
use crate::types::PanoramaRecord;
use rand::Rng;
use reqwest::Client;
use tracing::{debug, warn};

const GEO_PHOTO_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/js/GeoPhotoService";
const PHOTOMETA_ENDPOINT: &str = "https://www.google.com/maps/photometa/ac/v1";

const TOKEN_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LEN: usize = 6;

/// Length of the anti-JSON guard prefix on photometa responses.
const PHOTOMETA_GUARD_LEN: usize = 4;

/// Default search radius in meters.
pub const DEFAULT_RADIUS: u32 = 50;

/// A discovery query in one of the provider's three modes.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryQuery<'a> {
    /// Look up metadata for a known panorama id
    Metadata { pano_id: &'a str },
    /// Search for panoramas within `radius` meters of a coordinate
    ImageSearch { lat: f64, lon: f64, radius: u32 },
    /// Satellite-tile fallback search, addressed by tile indices at zoom 17
    SatelliteZoom { lat: f64, lon: f64 },
}

/// Generate a callback token of the form `_xdc_._` + 6 alphanumerics.
///
/// The token only needs to be a plausible cross-origin callback name, not
/// unpredictable; taking the random source as a parameter keeps URL
/// construction deterministic under test.
pub fn callback_token<R: Rng>(rng: &mut R) -> String {
    let suffix: String = (0..TOKEN_LEN)
        .map(|_| TOKEN_CHARS[rng.gen_range(0..TOKEN_CHARS.len())] as char)
        .collect();
    format!("_xdc_._{suffix}")
}

/// Build the request URL for a discovery query.
///
/// The parameter blob is the provider's own positional encoding; only the
/// coordinate, radius, panorama id, and tile index slots vary.
pub fn discovery_url(query: &DiscoveryQuery<'_>, token: &str) -> String {
    match query {
        DiscoveryQuery::Metadata { pano_id } => format!(
            "{GEO_PHOTO_ENDPOINT}.GetMetadata?pb=!1m5!1sapiv3!5sUS!11m2!1m1!1b0!2m2!1sen!2sUS!3m3!1m2!1e2!2s{pano_id}!4m6!1e1!1e2!1e3!1e4!1e8!1e6&callback={token}"
        ),
        DiscoveryQuery::ImageSearch { lat, lon, radius } => format!(
            "{GEO_PHOTO_ENDPOINT}.SingleImageSearch?pb=!1m5!1sapiv3!5sUS!11m2!1m1!1b0!2m4!1m2!3d{lat}!4d{lon}!2d{radius}!3m20!1m1!3b1!2m2!1sen!2sUS!9m1!1e2!11m12!1m3!1e2!2b1!3e2!1m3!1e3!2b1!3e2!1m3!1e10!2b1!3e2!4m6!1e1!1e2!1e3!1e4!1e8!1e6&callback={token}"
        ),
        DiscoveryQuery::SatelliteZoom { lat, lon } => {
            let (x, y) = geo::tile_indices(*lat, *lon, 17);
            format!("{PHOTOMETA_ENDPOINT}?pb=!1m1!1smaps_sv.tactile!6m3!1i{x}!2i{y}!3i17!8b1")
        }
    }
}

/// Strip the guard prefix a photometa response carries before its payload.
pub fn strip_photometa_guard(text: &str) -> &str {
    text.get(PHOTOMETA_GUARD_LEN..).unwrap_or("")
}

/// Fetch the raw body of a discovery query, without parsing it.
///
/// Useful when responses are collected out-of-band and fed back through
/// [`crate::parse::parse_discovery_response_loose`] later.
pub async fn fetch_discovery_raw(
    client: &Client,
    query: &DiscoveryQuery<'_>,
) -> crate::error::Result<String> {
    let token = callback_token(&mut rand::thread_rng());
    let url = discovery_url(query, &token);
    let response = client.get(&url).send().await?;
    Ok(response.text().await?)
}

/// Search for panoramas near a coordinate.
///
/// Transport failures on this path are not retried; they resolve to an empty
/// record list, the same as a response with no usable fragments.
pub async fn search_panoramas(
    client: &Client,
    lat: f64,
    lon: f64,
    radius: u32,
    closest: bool,
) -> Vec<PanoramaRecord> {
    let query = DiscoveryQuery::ImageSearch { lat, lon, radius };
    let Some(body) = get_body(client, &query).await else {
        return Vec::new();
    };
    debug!(grammar = GRAMMAR_VERSION, lat, lon, "parsing discovery response");
    parse::parse_discovery_response(&body, closest)
}

/// Search for panoramas via the satellite-tile fallback endpoint.
///
/// The response body is guarded rather than callback-wrapped; the guard is
/// stripped and the loose record shape applies.
pub async fn search_panoramas_satellite(
    client: &Client,
    lat: f64,
    lon: f64,
    closest: bool,
) -> Vec<PanoramaRecord> {
    let query = DiscoveryQuery::SatelliteZoom { lat, lon };
    let Some(body) = get_body(client, &query).await else {
        return Vec::new();
    };
    parse::parse_discovery_response_loose(strip_photometa_guard(&body), closest)
}

async fn get_body(client: &Client, query: &DiscoveryQuery<'_>) -> Option<String> {
    match fetch_discovery_raw(client, query).await {
        Ok(body) => Some(body),
        Err(e) => {
            warn!("discovery request failed, treating as no imagery: {e}");
            None
        }
    }
}
