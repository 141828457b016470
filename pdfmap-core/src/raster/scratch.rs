//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};

pub const TILES_DIR: &str = "tiles";
pub const THUMBNAIL_FILE: &str = "thumb.png";

/// Working storage of one run.
///
/// The directory and everything below is deleted when the value is dropped,
/// on success as well as on failure.
///
/// ```text
/// <root>/
///   <name>.tif.ref      calibration file
///   thumb.png
///   tiles/              corrected tiles
///   work/raw/<level>.png
///   work/native/<level>/
/// ```
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create the scratch area below `parent` (system temp directory by default)
    pub fn create(parent: Option<&Path>) -> io::Result<Scratch> {
        let mut builder = Builder::new();
        builder.prefix("pdfmap-");
        let dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        let scratch = Scratch { dir };
        fs::create_dir_all(scratch.tiles_dir())?;
        fs::create_dir_all(scratch.root().join("work").join("raw"))?;
        fs::create_dir_all(scratch.root().join("work").join("native"))?;
        debug!("Scratch area {}", scratch.root().display());
        Ok(scratch)
    }
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
    /// Full extent raster of a level
    pub fn raw_raster(&self, level: u8) -> PathBuf {
        self.root()
            .join("work")
            .join("raw")
            .join(format!("{}.png", level))
    }
    /// Retiler output of a level, disjoint from every other level
    pub fn native_dir(&self, level: u8) -> PathBuf {
        self.root()
            .join("work")
            .join("native")
            .join(level.to_string())
    }
    pub fn tiles_dir(&self) -> PathBuf {
        self.root().join(TILES_DIR)
    }
    pub fn calibration_file(&self, map_name: &str) -> PathBuf {
        self.root().join(calibration_filename(map_name))
    }
    pub fn thumbnail(&self) -> PathBuf {
        self.root().join(THUMBNAIL_FILE)
    }
    /// Delete the scratch area, reporting failures instead of ignoring them
    pub fn close(self) -> io::Result<()> {
        let root = self.root().to_path_buf();
        self.dir.close()?;
        debug!("Scratch area {} removed", root.display());
        Ok(())
    }
}

/// Calibration file name expected by the viewer
pub fn calibration_filename(map_name: &str) -> String {
    format!("{}.tif.ref", map_name)
}
