//! Tile grid planning for panorama reconstruction.

use crate::types::{GridConfig, TileDescriptor};

/// Edge length of one panorama tile in pixels.
pub const TILE_EDGE: u32 = 512;

/// Row count of the panorama tile grid; fixed by the tile service.
pub const GRID_ROWS: u32 = 13;

const PRIMARY_TILE_ENDPOINT: &str = "https://streetviewpixels-pa.googleapis.com/v1/tile";
const ALTERNATE_TILE_ENDPOINT: &str = "https://lh3.ggpht.com/p";

/// Which tile host to plan against.
///
/// Callers switch to [`TileHost::Alternate`] explicitly when the primary host
/// serves error tiles for a given panorama; there is no automatic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileHost {
    /// The main tile-serving endpoint
    #[default]
    Primary,
    /// Secondary host, addressed by a path-encoded template
    Alternate,
}

fn tile_url(host: TileHost, pano_id: &str, zoom: u8, x: u32, y: u32) -> String {
    match host {
        TileHost::Primary => format!(
            "{PRIMARY_TILE_ENDPOINT}?cb_client=maps_sv.tactile&panoid={pano_id}&zoom={zoom}&x={x}&y={y}"
        ),
        TileHost::Alternate => format!("{ALTERNATE_TILE_ENDPOINT}/{pano_id}=x{x}-y{y}-z{zoom}"),
    }
}

/// Enumerate the full tile grid for a panorama.
///
/// Produces one descriptor per `(column, row)` cell of the `columns` × 13
/// grid, column-major, each carrying its scratch file name and source URL.
pub fn plan_tiles(
    pano_id: &str,
    zoom: u8,
    grid: &GridConfig,
    host: TileHost,
) -> Vec<TileDescriptor> {
    let mut tiles = Vec::with_capacity((grid.columns * GRID_ROWS) as usize);
    for x in 0..grid.columns {
        for y in 0..GRID_ROWS {
            tiles.push(TileDescriptor {
                column: x,
                row: y,
                file_name: format!("{pano_id}_{x}x{y}.jpg"),
                url: tile_url(host, pano_id, zoom, x, y),
            });
        }
    }
    tiles
}
