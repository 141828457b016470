//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::error::{Error, Result};
use crate::raster::collaborator::NativeTile;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tile_grid::{remap, NativeScheme, TileAddress};

/// Tiles of all levels as written by the retiler, not yet corrected
#[derive(Debug)]
pub struct NativeTileSet {
    scheme: NativeScheme,
    tiles: Vec<NativeTile>,
}

impl NativeTileSet {
    pub fn new(scheme: NativeScheme) -> NativeTileSet {
        NativeTileSet {
            scheme,
            tiles: Vec::new(),
        }
    }
    pub fn scheme(&self) -> &NativeScheme {
        &self.scheme
    }
    pub fn extend<I: IntoIterator<Item = NativeTile>>(&mut self, tiles: I) {
        self.tiles.extend(tiles);
    }
    pub fn len(&self) -> usize {
        self.tiles.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Move every tile to `dir` under its zero-based file name.
    ///
    /// All addresses are remapped before the first file is touched, so a
    /// collision leaves the native tiles in place. Consumes the native set:
    /// corrected tiles can't be remapped a second time.
    pub fn remap_into(self, dir: &Path) -> Result<TileSet> {
        let scheme = self.scheme;
        let native: Vec<(TileAddress, PathBuf)> = self
            .tiles
            .into_iter()
            .map(|tile| (tile.address, tile.path))
            .collect();
        let corrected = remap(native, &scheme)?;
        fs::create_dir_all(dir)?;
        let mut tiles = BTreeMap::new();
        for (address, source) in corrected {
            let target = dir.join(address.filename());
            commit(&source, &target).map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    Error::RemapCollision(format!(
                        "{} already exists in {}",
                        address.filename(),
                        dir.display()
                    ))
                } else {
                    Error::Io(e)
                }
            })?;
            tiles.insert(address, target);
        }
        debug!("{} tiles moved to {}", tiles.len(), dir.display());
        Ok(TileSet {
            dir: dir.to_path_buf(),
            tiles,
        })
    }
}

/// Move `source` to `target` without replacing an existing file
fn commit(source: &Path, target: &Path) -> io::Result<()> {
    match fs::hard_link(source, target) {
        Ok(()) => fs::remove_file(source),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(e),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(e),
        Err(_) => {
            // no hard links on this filesystem
            fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(target)?;
            if let Err(e) = fs::copy(source, target) {
                let _ = fs::remove_file(target);
                return Err(e);
            }
            fs::remove_file(source)
        }
    }
}

/// Corrected tiles of a map, keyed by zero-based address
#[derive(Debug)]
pub struct TileSet {
    dir: PathBuf,
    tiles: BTreeMap<TileAddress, PathBuf>,
}

impl TileSet {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
    pub fn len(&self) -> usize {
        self.tiles.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
    /// Tiles in (zoom, column, row) order
    pub fn iter(&self) -> impl Iterator<Item = (&TileAddress, &PathBuf)> {
        self.tiles.iter()
    }
    pub fn path(&self, address: &TileAddress) -> Option<&PathBuf> {
        self.tiles.get(address)
    }
    /// Tiles of zoom level `zoom`
    pub fn level(&self, zoom: u8) -> Vec<(&TileAddress, &PathBuf)> {
        let first = TileAddress::new(zoom, 0, 0);
        self.tiles
            .range(first..)
            .take_while(|(address, _)| address.zoom == zoom)
            .collect()
    }
    pub fn levels(&self) -> Vec<u8> {
        let mut levels: Vec<u8> = self.tiles.keys().map(|address| address.zoom).collect();
        levels.dedup();
        levels
    }
    /// Number of columns and rows of a level, derived from the highest addresses
    pub fn level_limit(&self, zoom: u8) -> Option<(u32, u32)> {
        let level = self.level(zoom);
        let cols = level.iter().map(|(address, _)| address.column).max()?;
        let rows = level.iter().map(|(address, _)| address.row).max()?;
        Some((cols + 1, rows + 1))
    }
    /// Number of tiles across and down the raster of a level
    pub fn raster_grid(&self, zoom: u8) -> Option<(u32, u32)> {
        let level = self.level(zoom);
        let x = level.iter().map(|(address, _)| address.cell().0).max()?;
        let y = level.iter().map(|(address, _)| address.cell().1).max()?;
        Some((x + 1, y + 1))
    }
}
