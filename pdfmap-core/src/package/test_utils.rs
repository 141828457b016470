//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::raster::collaborator::NativeTile;
use crate::tiles::{NativeTileSet, TileSet};
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use tile_grid::{NativeScheme, TileAddress};

/// Write PNG tiles of a `cols` x `rows` level and move them to `<root>/tiles`.
///
/// Every tile is `size` pixels wide except the last column, which is `last_width`.
pub fn write_level(
    root: &Path,
    zoom: u8,
    cols: u32,
    rows: u32,
    size: u32,
    last_width: u32,
) -> TileSet {
    let native_dir = root.join("native").join(zoom.to_string());
    fs::create_dir_all(&native_dir).unwrap();
    let mut native = NativeTileSet::new(NativeScheme::one_based());
    for col in 0..cols {
        for row in 0..rows {
            let width = if col + 1 == cols { last_width } else { size };
            let tile =
                RgbaImage::from_pixel(width, size, Rgba([col as u8, row as u8, zoom, 255]));
            let path = native_dir.join(format!("{}_{}_{}.png", zoom, row + 1, col + 1));
            tile.save(&path).unwrap();
            native.extend(vec![NativeTile {
                address: TileAddress::from_cell(zoom, col + 1, row + 1),
                path,
            }]);
        }
    }
    native.remap_into(&root.join("tiles")).unwrap()
}
