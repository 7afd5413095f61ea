//! Official panorama metadata via the keyed metadata endpoint.

use crate::error::{PanoViewError, Result};
use crate::types::MetaData;
use reqwest::Client;
use serde_json::Value;

const METADATA_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview/metadata";

/// Fetch official metadata for a panorama.
///
/// Unlike the scraping endpoints this one returns plain JSON, but it reports
/// problems in-band through a `status` field, so the body is inspected before
/// deserializing into [`MetaData`].
pub async fn get_panorama_meta(client: &Client, pano_id: &str, api_key: &str) -> Result<MetaData> {
    let url = format!("{METADATA_ENDPOINT}?pano={pano_id}&key={api_key}");
    let response = client.get(&url).send().await?;
    let body: Value = response.json().await?;

    match body.get("status").and_then(|s| s.as_str()) {
        Some("OK") => {}
        Some(status) => {
            return Err(PanoViewError::InvalidResponse(format!(
                "metadata status {status} for panorama {pano_id}"
            )))
        }
        None => {
            return Err(PanoViewError::InvalidResponse(
                "metadata response carries no status field".to_string(),
            ))
        }
    }

    serde_json::from_value(body)
        .map_err(|e| PanoViewError::InvalidResponse(format!("metadata shape changed: {e}")))
}
