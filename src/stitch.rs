//! Composing downloaded tiles into one equirectangular panorama.

use crate::error::{PanoViewError, Result};
use crate::tiles::TILE_EDGE;
use crate::types::TileDescriptor;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, GenericImage};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Output settings for a stitch operation.
#[derive(Debug, Clone, Default)]
pub struct StitchOptions {
    /// JPEG quality of the composite (default 30; the full canvas is large)
    pub jpeg_quality: Option<u8>,
    /// Optional coordinate label prefixed to the output file name
    pub label: Option<String>,
}

const DEFAULT_JPEG_QUALITY: u8 = 30;

/// Return the `(column, row)` cells with no file in the scratch directory.
fn missing_tiles(tiles: &[TileDescriptor], scratch_dir: &Path) -> Vec<(u32, u32)> {
    tiles
        .iter()
        .filter(|t| !scratch_dir.join(&t.file_name).exists())
        .map(|t| (t.column, t.row))
        .collect()
}

/// Stitch the scratch tiles of a panorama into a single composite image.
///
/// The canvas spans the planned grid (`columns × 512` by `rows × 512` pixels)
/// and every tile is pasted at the pixel offset dictated by its descriptor,
/// independent of the order it was downloaded in. A tile set is only
/// considered complete when every descriptor has a scratch file; otherwise
/// this fails with [`PanoViewError::PartialGrid`] before any decoding work.
///
/// The scratch files are left in place; pass the same descriptors to
/// [`delete_tiles`] when done (the high-level pipeline does this
/// unconditionally).
pub fn stitch_tiles(
    pano_id: &str,
    tiles: &[TileDescriptor],
    scratch_dir: &Path,
    output_dir: &Path,
    opts: &StitchOptions,
) -> Result<PathBuf> {
    if tiles.is_empty() {
        return Err(PanoViewError::EmptyTileSet);
    }
    let missing = missing_tiles(tiles, scratch_dir);
    if !missing.is_empty() {
        return Err(PanoViewError::PartialGrid { missing });
    }

    let columns = tiles.iter().map(|t| t.column).max().unwrap_or(0) + 1;
    let rows = tiles.iter().map(|t| t.row).max().unwrap_or(0) + 1;
    let mut panorama = DynamicImage::new_rgb8(columns * TILE_EDGE, rows * TILE_EDGE);

    for tile in tiles {
        let img = image::open(scratch_dir.join(&tile.file_name))?;
        panorama.copy_from(&img, tile.column * TILE_EDGE, tile.row * TILE_EDGE)?;
    }

    let name = match &opts.label {
        Some(label) => format!("{label}_{pano_id}.jpg"),
        None => format!("{pano_id}.jpg"),
    };
    fs::create_dir_all(output_dir)?;
    let out_path = output_dir.join(name);

    let rgb = panorama.to_rgb8();
    let (width, height) = rgb.dimensions();
    let writer = BufWriter::new(File::create(&out_path)?);
    let mut encoder =
        JpegEncoder::new_with_quality(writer, opts.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY));
    encoder.encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)?;

    Ok(out_path)
}

/// Remove the scratch files of a tile set.
///
/// Files that are already gone are not an error; any other IO failure is
/// logged and the remaining tiles are still attempted, so a single stubborn
/// file cannot leak the rest of the set.
pub fn delete_tiles(tiles: &[TileDescriptor], scratch_dir: &Path) {
    for tile in tiles {
        let path = scratch_dir.join(&tile.file_name);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("could not remove scratch tile {}: {e}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn descriptor(column: u32, row: u32) -> TileDescriptor {
        TileDescriptor {
            column,
            row,
            file_name: format!("testpano_{column}x{row}.jpg"),
            url: String::new(),
        }
    }

    fn scratch_with_tiles(name: &str, tiles: &[TileDescriptor]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("panoview_{name}_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for (i, t) in tiles.iter().enumerate() {
            let shade = (i * 40 % 256) as u8;
            let img = RgbImage::from_pixel(TILE_EDGE, TILE_EDGE, Rgb([shade, shade, shade]));
            DynamicImage::ImageRgb8(img)
                .save(dir.join(&t.file_name))
                .unwrap();
        }
        dir
    }

    #[test]
    fn test_stitch_dimensions_match_grid() {
        let tiles: Vec<TileDescriptor> = (0..2)
            .flat_map(|x| (0..2).map(move |y| descriptor(x, y)))
            .collect();
        let scratch = scratch_with_tiles("dims", &tiles);
        let out_dir = scratch.join("out");

        let path = stitch_tiles("testpano", &tiles, &scratch, &out_dir, &StitchOptions::default())
            .unwrap();
        let composite = image::open(&path).unwrap().to_rgb8();
        assert_eq!(composite.dimensions(), (2 * TILE_EDGE, 2 * TILE_EDGE));

        delete_tiles(&tiles, &scratch);
        fs::remove_dir_all(&scratch).unwrap();
    }

    #[test]
    fn test_label_prefixes_output_name() {
        let tiles = vec![descriptor(0, 0)];
        let scratch = scratch_with_tiles("label", &tiles);
        let out_dir = scratch.join("out");

        let opts = StitchOptions { label: Some("48.8584_2.2945".to_string()), ..Default::default() };
        let path = stitch_tiles("testpano", &tiles, &scratch, &out_dir, &opts).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "48.8584_2.2945_testpano.jpg"
        );

        delete_tiles(&tiles, &scratch);
        fs::remove_dir_all(&scratch).unwrap();
    }

    #[test]
    fn test_incomplete_set_is_rejected() {
        let tiles = vec![descriptor(0, 0), descriptor(1, 0)];
        // Only create the first tile on disk
        let scratch = scratch_with_tiles("partial", &tiles[..1]);
        let out_dir = scratch.join("out");

        let err = stitch_tiles("testpano", &tiles, &scratch, &out_dir, &StitchOptions::default())
            .unwrap_err();
        match err {
            PanoViewError::PartialGrid { missing } => assert_eq!(missing, vec![(1, 0)]),
            other => panic!("expected PartialGrid, got {other}"),
        }

        delete_tiles(&tiles, &scratch);
        fs::remove_dir_all(&scratch).unwrap();
    }

    #[test]
    fn test_empty_tile_set_is_rejected() {
        let err = stitch_tiles(
            "testpano",
            &[],
            Path::new("/nonexistent"),
            Path::new("/nonexistent"),
            &StitchOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PanoViewError::EmptyTileSet));
    }

    #[test]
    fn test_delete_tiles_ignores_missing_files() {
        let tiles = vec![descriptor(0, 0)];
        delete_tiles(&tiles, Path::new("/nonexistent/scratch"));
    }
}
