//! Web-Mercator projection onto the provider's tile addressing scheme.

use std::f64::consts::PI;

/// Side length of the projection canvas and of one map tile, in units.
pub const TILE_SIZE: u32 = 256;

/// Clamp for `sin(lat)` to keep the projection finite at the poles.
const SINY_LIMIT: f64 = 0.9999;

/// Project a GPS coordinate onto the 256-unit world canvas.
///
/// Standard spherical Mercator forward projection. Latitudes outside ±90 are
/// not validated; the `sin(lat)` clamp keeps the math finite regardless.
pub fn project(lat: f64, lon: f64) -> (f64, f64) {
    let siny = (lat * PI / 180.0).sin().clamp(-SINY_LIMIT, SINY_LIMIT);
    let x = f64::from(TILE_SIZE) * (0.5 + lon / 360.0);
    let y = f64::from(TILE_SIZE) * (0.5 - ((1.0 + siny) / (1.0 - siny)).ln() / (4.0 * PI));
    (x, y)
}

/// Convert a GPS coordinate to integer tile indices at the given zoom level.
pub fn tile_indices(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    let (x, y) = project(lat, lon);
    let scale = f64::from(1u32 << zoom);
    let tile_x = (x * scale / f64::from(TILE_SIZE)).floor() as u32;
    let tile_y = (y * scale / f64::from(TILE_SIZE)).floor() as u32;
    (tile_x, tile_y)
}
