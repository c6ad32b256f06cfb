//! Canvas reconstruction from a tile buffer.
//!
//! Pastes tiles at their grid offsets, crops to the non-black content, clamps
//! the aspect ratio to at most 2:1 and resizes (bilinear) to the canonical
//! output resolution. CPU bound; callers run it on the blocking pool.

use super::buffer::TileBuffer;
use super::discovery::Extent;
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Builds the full-grid canvas with every buffered tile pasted in place.
///
/// Missing tiles stay black. Returns `None` if the buffer is empty.
pub fn paste_tiles(buffer: &TileBuffer, extent: Extent) -> Option<RgbImage> {
    let (tile_width, tile_height) = buffer.tile_size()?;
    let mut canvas = RgbImage::new(tile_width * extent.cols(), tile_height * extent.rows());

    for (index, tile) in buffer.iter() {
        if index.col > extent.max_col || index.row > extent.max_row {
            continue;
        }
        imageops::replace(
            &mut canvas,
            tile,
            (index.col * tile_width) as i64,
            (index.row * tile_height) as i64,
        );
    }

    Some(canvas)
}

/// Bounding box `(x, y, width, height)` of pixels with any non-zero channel.
pub fn content_bounds(image: &RgbImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0 == [0, 0, 0] {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    bounds.map(|(min_x, min_y, max_x, max_y)| (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Crops to the non-black content. An all-black image is returned unchanged.
pub fn crop_to_content(image: RgbImage) -> RgbImage {
    match content_bounds(&image) {
        Some((x, y, width, height)) if (width, height) != image.dimensions() => {
            imageops::crop_imm(&image, x, y, width, height).to_image()
        }
        _ => image,
    }
}

/// Clips trailing columns so width is at most twice the height.
pub fn clamp_aspect(image: RgbImage) -> RgbImage {
    let max_width = image.height().saturating_mul(2);
    if image.width() > max_width && max_width > 0 {
        imageops::crop_imm(&image, 0, 0, max_width, image.height()).to_image()
    } else {
        image
    }
}

/// Runs the full reconstruction pipeline.
pub fn reconstruct(
    buffer: &TileBuffer,
    extent: Extent,
    width: u32,
    height: u32,
) -> Option<RgbImage> {
    let canvas = paste_tiles(buffer, extent)?;
    let cropped = clamp_aspect(crop_to_content(canvas));
    Some(imageops::resize(&cropped, width, height, FilterType::Triangle))
}
