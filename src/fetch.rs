//! Concurrent tile downloading with bounded retry.

use crate::error::{PanoViewError, Result};
use crate::types::TileDescriptor;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

const BACKOFF_CAP: Duration = Duration::from_secs(60);

/// Retry and concurrency policy for a tile fetch operation.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Attempts per tile before it is reported as missing (default 6)
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt, capped at 60s
    pub initial_backoff: Duration,
    /// Number of tiles in flight at once (default 8)
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_backoff: Duration::from_secs(2),
            concurrency: 8,
        }
    }
}

fn backoff_delay(opts: &FetchOptions, attempt: u32) -> Duration {
    opts.initial_backoff
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(BACKOFF_CAP)
}

/// Download one tile to the scratch directory, retrying on failure.
async fn fetch_tile(
    client: &Client,
    tile: &TileDescriptor,
    scratch_dir: &Path,
    opts: &FetchOptions,
) -> Result<()> {
    let path = scratch_dir.join(&tile.file_name);
    let mut attempt = 0u32;
    loop {
        let fetched = async {
            let response = client.get(&tile.url).send().await?;
            let response = response.error_for_status()?;
            response.bytes().await
        }
        .await;

        match fetched {
            Ok(bytes) => {
                tokio::fs::write(&path, &bytes).await?;
                return Ok(());
            }
            Err(e) => {
                attempt += 1;
                if attempt >= opts.max_attempts {
                    return Err(e.into());
                }
                let delay = backoff_delay(opts, attempt - 1);
                debug!(
                    column = tile.column,
                    row = tile.row,
                    attempt,
                    "tile fetch failed ({e}), retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Download every planned tile into `scratch_dir`.
///
/// Tiles are fetched by a bounded worker pool; each tile keeps its own retry
/// budget. Tiles that exhaust their attempts are collected and reported
/// together as [`PanoViewError::PartialGrid`], so a flaky host degrades into
/// an explicit incomplete-grid outcome instead of a stalled pipeline.
pub async fn fetch_tiles(
    client: &Client,
    tiles: &[TileDescriptor],
    scratch_dir: &Path,
    opts: &FetchOptions,
) -> Result<()> {
    tokio::fs::create_dir_all(scratch_dir).await?;

    let failures: Vec<(u32, u32)> = stream::iter(tiles)
        .map(|tile| async move {
            match fetch_tile(client, tile, scratch_dir, opts).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(
                        column = tile.column,
                        row = tile.row,
                        "giving up on tile after {} attempts: {e}",
                        opts.max_attempts
                    );
                    Some((tile.column, tile.row))
                }
            }
        })
        .buffer_unordered(opts.concurrency.max(1))
        .filter_map(|outcome| async move { outcome })
        .collect()
        .await;

    if failures.is_empty() {
        Ok(())
    } else {
        let mut missing = failures;
        missing.sort_unstable();
        Err(PanoViewError::PartialGrid { missing })
    }
}
