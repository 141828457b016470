//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//!Raster level grids

use std::collections::BTreeMap;

/// Guards pixel counts against floating point noise, e.g. `0.3 / 0.1`.
const EPSILON: f64 = 0.0000001;

/// Geographic extent
#[derive(PartialEq, Clone, Debug)]
pub struct Extent {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }
    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }
    /// Finite and strictly ordered on both axes
    pub fn is_valid(&self) -> bool {
        [self.minx, self.miny, self.maxx, self.maxy]
            .iter()
            .all(|v| v.is_finite())
            && self.minx < self.maxx
            && self.miny < self.maxy
    }
}

/// Min and max grid cell numbers
#[derive(PartialEq, Clone, Debug)]
pub struct ExtentInt {
    pub minx: u32,
    pub miny: u32,
    pub maxx: u32,
    pub maxy: u32,
}

impl ExtentInt {
    pub fn is_empty(&self) -> bool {
        self.maxx <= self.minx || self.maxy <= self.miny
    }
    /// Number of cells covered
    pub fn count(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.maxx - self.minx) as u64 * (self.maxy - self.miny) as u64
        }
    }
}

// Max grid cell numbers
type CellIndex = (u32, u32);

/// Number of pixels covering `length` ground units at resolution `res`.
/// None if the count is not finite or exceeds `u32::MAX`.
pub fn pixel_count(length: f64, res: f64) -> Option<u32> {
    if !(length > 0.0) || !(res > 0.0) {
        return Some(0);
    }
    let pixels = (length / res + EPSILON).floor();
    if pixels.is_finite() && pixels <= u32::MAX as f64 {
        Some(pixels as u32)
    } else {
        None
    }
}

/// Number of tiles of `tile_size` pixels needed for `pixels`, partial tiles included
pub fn tile_count(pixels: u32, tile_size: u16) -> u32 {
    if tile_size == 0 {
        return 0;
    }
    let tile_size = tile_size as u32;
    pixels / tile_size + (pixels % tile_size != 0) as u32
}

/// Tile grid of a rendered map.
///
/// Every zoom level renders the full extent at its own resolution, with the
/// raster origin at the top left corner of the extent. Zoom levels are sparse
/// indices; a larger level is a finer resolution.
#[derive(Clone, Debug)]
pub struct Grid {
    /// The width of an individual tile, in pixels.
    width: u16,
    /// The height of an individual tile, in pixels.
    height: u16,
    /// The geographical extent rendered at every level, in ground units.
    pub extent: Extent,
    /// Ground sample distance (units per pixel) for each zoom level.
    resolutions: BTreeMap<u8, f64>,
    /// maxx/maxy for each level
    level_max: BTreeMap<u8, CellIndex>,
}

impl Grid {
    pub fn new(width: u16, height: u16, extent: Extent, resolutions: Vec<(u8, f64)>) -> Grid {
        let mut grid = Grid {
            width,
            height,
            extent,
            resolutions: resolutions.into_iter().collect(),
            level_max: BTreeMap::new(),
        };
        grid.level_max = grid.level_max();
        grid
    }
    /// Grid with square tiles
    pub fn square(tile_size: u16, extent: Extent, resolutions: Vec<(u8, f64)>) -> Grid {
        Grid::new(tile_size, tile_size, extent, resolutions)
    }
    pub fn tile_size(&self) -> (u16, u16) {
        (self.width, self.height)
    }
    pub fn nlevels(&self) -> u8 {
        self.resolutions.len() as u8
    }
    /// Zoom levels, coarsest first
    pub fn levels(&self) -> Vec<u8> {
        self.resolutions.keys().cloned().collect()
    }
    /// Coarsest level
    pub fn minzoom(&self) -> Option<u8> {
        self.resolutions.keys().next().cloned()
    }
    /// Finest level
    pub fn maxzoom(&self) -> Option<u8> {
        self.resolutions.keys().next_back().cloned()
    }
    pub fn resolution(&self, zoom: u8) -> Option<f64> {
        self.resolutions.get(&zoom).cloned()
    }
    /// Print scale denominator when one pixel is printed as 0.1 mm
    pub fn scale_denominator(&self, zoom: u8) -> Option<f64> {
        // pixels per meter of paper
        const PRINT_PIXEL_DENSITY: f64 = 10000.0;
        self.resolution(zoom).map(|res| res * PRINT_PIXEL_DENSITY)
    }
    /// Pixel size of the full extent raster of a level (may be 0 for degenerate windows).
    /// None for unknown levels and rasters too large to address.
    pub fn raster_size(&self, zoom: u8) -> Option<CellIndex> {
        let res = self.resolution(zoom)?;
        Some((
            pixel_count(self.extent.width(), res)?,
            pixel_count(self.extent.height(), res)?,
        ))
    }
    /// Extent of a given tile, column and row counted from the top left corner.
    /// Edge tiles are clipped to the rendered raster.
    pub fn tile_extent(&self, xtile: u32, ytile: u32, zoom: u8) -> Option<Extent> {
        let res = self.resolution(zoom)?;
        let (rw, rh) = self.raster_size(zoom)?;
        let tile_sx = self.width as u32;
        let tile_sy = self.height as u32;
        let px0 = xtile.checked_mul(tile_sx)?;
        let py0 = ytile.checked_mul(tile_sy)?;
        if px0 >= rw || py0 >= rh {
            return None;
        }
        let px1 = std::cmp::min(px0.saturating_add(tile_sx), rw);
        let py1 = std::cmp::min(py0.saturating_add(tile_sy), rh);
        Some(Extent {
            minx: self.extent.minx + res * px0 as f64,
            miny: self.extent.maxy - res * py1 as f64,
            maxx: self.extent.minx + res * px1 as f64,
            maxy: self.extent.maxy - res * py0 as f64,
        })
    }
    /// (maxx, maxy) of grid level
    pub fn level_limit(&self, zoom: u8) -> Option<CellIndex> {
        self.level_max.get(&zoom).cloned()
    }
    /// (maxx, maxy) of all grid levels
    fn level_max(&self) -> BTreeMap<u8, CellIndex> {
        self.resolutions
            .keys()
            .filter_map(|&zoom| {
                self.raster_size(zoom).map(|(rw, rh)| {
                    (
                        zoom,
                        (tile_count(rw, self.width), tile_count(rh, self.height)),
                    )
                })
            })
            .collect()
    }
    /// Tile index limits of a level
    pub fn tile_limit(&self, zoom: u8) -> Option<ExtentInt> {
        self.level_limit(zoom).map(|(maxx, maxy)| ExtentInt {
            minx: 0,
            miny: 0,
            maxx,
            maxy,
        })
    }
    /// Tile index limits of all levels, coarsest first
    pub fn tile_limits(&self) -> Vec<(u8, ExtentInt)> {
        self.levels()
            .into_iter()
            .filter_map(|zoom| self.tile_limit(zoom).map(|limit| (zoom, limit)))
            .collect()
    }
}
