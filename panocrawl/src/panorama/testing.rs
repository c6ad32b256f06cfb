//! Synthetic tile pyramid for assembler tests.

use super::GridIndex;
use crate::provider::{ProviderError, TileSource};
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TILE_PX: u32 = 8;

/// Tile source with content inside `[0, max_col] x [0, max_row]` and black
/// tiles everywhere else.
pub struct GridTiles {
    max_col: u32,
    max_row: u32,
    failures: HashSet<GridIndex>,
    fail_after: Option<usize>,
    fetches: AtomicUsize,
}

impl GridTiles {
    pub fn new(max_col: u32, max_row: u32) -> Self {
        Self {
            max_col,
            max_row,
            failures: HashSet::new(),
            fail_after: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Makes the given positions fail with an HTTP error.
    pub fn with_failures(mut self, failures: impl IntoIterator<Item = GridIndex>) -> Self {
        self.failures.extend(failures);
        self
    }

    /// Makes every fetch after the first `n` fail.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

fn encode(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png encoding");
    bytes
}

impl TileSource for GridTiles {
    async fn fetch_tile(
        &self,
        _pano_id: &str,
        col: u32,
        row: u32,
        _zoom: u8,
    ) -> Result<Vec<u8>, ProviderError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| n >= limit)
            || self.failures.contains(&GridIndex::new(col, row))
        {
            return Err(ProviderError::HttpError("HTTP 500".into()));
        }

        let tile = if col <= self.max_col && row <= self.max_row {
            let shade = Rgb([(col % 200) as u8 + 30, (row % 200) as u8 + 30, 128]);
            RgbImage::from_pixel(TILE_PX, TILE_PX, shade)
        } else {
            RgbImage::new(TILE_PX, TILE_PX)
        };
        Ok(encode(&tile))
    }
}
