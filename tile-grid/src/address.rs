//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Tile addressing

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Zero-based address of a tile within a map package.
///
/// The viewer numbers tiles in the order of gdal_retile names: `column`
/// counts tiles from the top of the level raster, `row` from its left edge.
/// Use [`TileAddress::from_cell`] to address a raster cell.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct TileAddress {
    pub zoom: u8,
    pub column: u32,
    pub row: u32,
}

impl TileAddress {
    pub fn new(zoom: u8, column: u32, row: u32) -> TileAddress {
        TileAddress { zoom, column, row }
    }
    /// Address of the raster cell `x` tiles from the left and `y` tiles from the top
    pub fn from_cell(zoom: u8, x: u32, y: u32) -> TileAddress {
        TileAddress::new(zoom, y, x)
    }
    /// Raster cell `(x, y)` of the tile
    pub fn cell(&self) -> (u32, u32) {
        (self.row, self.column)
    }
    /// File name of the tile in the package (`<zoom>x<column>x<row>.png`)
    pub fn filename(&self) -> String {
        format!("{}x{}x{}.png", self.zoom, self.column, self.row)
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.column, self.row)
    }
}

/// Addressing convention of a retiling tool.
///
/// Column and row numbers are shifted by `offset` compared to the zero-based
/// package addressing. The zoom level is never shifted.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct NativeScheme {
    pub offset: u32,
}

impl NativeScheme {
    /// Scheme of tools counting columns and rows from one
    pub fn one_based() -> NativeScheme {
        NativeScheme { offset: 1 }
    }
    /// Native address of a zero-based address
    pub fn native(&self, address: &TileAddress) -> TileAddress {
        TileAddress::new(
            address.zoom,
            address.column + self.offset,
            address.row + self.offset,
        )
    }
    /// Zero-based address of a native address, `None` below the offset
    pub fn canonical(&self, native: &TileAddress) -> Option<TileAddress> {
        Some(TileAddress::new(
            native.zoom,
            native.column.checked_sub(self.offset)?,
            native.row.checked_sub(self.offset)?,
        ))
    }
}

#[derive(Error, PartialEq, Debug)]
pub enum RemapError {
    #[error("native tile {native} lies below the native offset {offset}")]
    BelowOffset { native: TileAddress, offset: u32 },
    #[error("native tiles {first} and {second} both map to {target}")]
    Collision {
        first: TileAddress,
        second: TileAddress,
        target: TileAddress,
    },
}

/// Convert native addresses into zero-based addresses.
///
/// The mapping is checked to be a bijection over the whole input: an address
/// below the offset or two inputs with the same target abort the remap.
/// Applying this to already corrected addresses shifts them a second time, so
/// it must run exactly once per tile set.
pub fn remap<T>(
    tiles: Vec<(TileAddress, T)>,
    scheme: &NativeScheme,
) -> Result<Vec<(TileAddress, T)>, RemapError> {
    let mut seen: HashMap<TileAddress, TileAddress> = HashMap::with_capacity(tiles.len());
    let mut remapped = Vec::with_capacity(tiles.len());
    for (native, item) in tiles {
        let target = scheme
            .canonical(&native)
            .ok_or(RemapError::BelowOffset {
                native,
                offset: scheme.offset,
            })?;
        if let Some(first) = seen.insert(target, native) {
            return Err(RemapError::Collision {
                first,
                second: native,
                target,
            });
        }
        remapped.push((target, item));
    }
    Ok(remapped)
}
