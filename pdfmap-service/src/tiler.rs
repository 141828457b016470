//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::renderer::RawLevelRaster;
use pdfmap_core::raster::{NativeTile, RetileRequest, Retiler};
use pdfmap_core::{Error, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tile_grid::{tile_count, ExtentInt, GridIterator, NativeScheme, TileAddress};

/// Splits level rasters into tiles
#[derive(Clone)]
pub struct Tiler {
    retiler: Arc<dyn Retiler>,
    pub tile_size: u16,
}

impl Tiler {
    pub fn new(retiler: Arc<dyn Retiler>, tile_size: u16) -> Tiler {
        Tiler { retiler, tile_size }
    }
    pub fn info(&self) -> String {
        self.retiler.info()
    }
    pub fn native_scheme(&self) -> NativeScheme {
        self.retiler.native_scheme()
    }

    /// Native addresses of a complete tiling of `raster`
    pub fn expected_tiles(&self, raster: &RawLevelRaster) -> BTreeSet<TileAddress> {
        let limit = ExtentInt {
            minx: 0,
            miny: 0,
            maxx: tile_count(raster.width, self.tile_size),
            maxy: tile_count(raster.height, self.tile_size),
        };
        let scheme = self.native_scheme();
        GridIterator::new(vec![(raster.level, limit)])
            .map(|address| scheme.native(&address))
            .collect()
    }

    /// Tile `raster` into `target_dir` and delete the raster.
    ///
    /// Output is only accepted when it matches the expected grid exactly.
    pub fn tile(&self, raster: RawLevelRaster, target_dir: &Path) -> Result<Vec<NativeTile>> {
        let level = raster.level;
        let request = RetileRequest {
            level,
            raster: raster.path.clone(),
            tile_size: self.tile_size,
            target_dir: target_dir.to_path_buf(),
        };
        let tiles = self.retiler.retile(&request).map_err(|e| Error::Tiling {
            level,
            reason: e.to_string(),
        })?;

        let expected = self.expected_tiles(&raster);
        let found: BTreeSet<TileAddress> = tiles.iter().map(|tile| tile.address).collect();
        if found.len() != tiles.len() {
            return Err(Error::Tiling {
                level,
                reason: "duplicate tile addresses".to_string(),
            });
        }
        if let Some(address) = expected.difference(&found).next() {
            return Err(Error::Tiling {
                level,
                reason: format!(
                    "missing tile {} ({} of {} tiles written)",
                    address,
                    found.len(),
                    expected.len()
                ),
            });
        }
        if let Some(address) = found.difference(&expected).next() {
            return Err(Error::Tiling {
                level,
                reason: format!("unexpected tile {}", address),
            });
        }
        if let Some(tile) = tiles.iter().find(|tile| !tile.path.starts_with(target_dir)) {
            return Err(Error::Tiling {
                level,
                reason: format!(
                    "tile {} written outside of {}",
                    tile.address,
                    target_dir.display()
                ),
            });
        }

        fs::remove_file(&raster.path)?;
        debug!("Level {}: {} tiles", level, tiles.len());
        Ok(tiles)
    }
}
