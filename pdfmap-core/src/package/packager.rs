//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::ApplicationCfg;
use crate::core::error::{Error, Result};
use crate::raster::scratch::{THUMBNAIL_FILE, TILES_DIR};
use crate::tiles::TileSet;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Written map archive
#[derive(Clone, Debug, PartialEq)]
pub struct MapPackage {
    pub path: PathBuf,
    /// Archive entry names in archive order
    pub entries: Vec<String>,
    pub tile_count: usize,
}

impl MapPackage {
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Assembles the calibration file, the thumbnail and the tiles into a ZIP archive.
///
/// Entries are sorted and carry a fixed timestamp and mode, so the same
/// inputs always produce the same archive.
#[derive(Clone, Debug)]
pub struct Packager {
    pub output: PathBuf,
}

impl Packager {
    pub fn new(output: &Path) -> Packager {
        Packager {
            output: output.to_path_buf(),
        }
    }

    pub fn package(
        &self,
        calibration: &Path,
        thumbnail: &Path,
        tiles: &TileSet,
    ) -> Result<MapPackage> {
        let mut sources: Vec<(String, PathBuf)> = Vec::with_capacity(tiles.len() + 2);
        sources.push((root_entry(calibration)?, calibration.to_path_buf()));
        sources.push((THUMBNAIL_FILE.to_string(), thumbnail.to_path_buf()));
        for (address, path) in tiles.iter() {
            sources.push((
                format!("{}/{}", TILES_DIR, address.filename()),
                path.clone(),
            ));
        }
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, _) in &sources {
            check_entry_name(name)?;
        }

        let dir = match self.output.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| packaging_error(&dir, e))?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".pdfmap-")
            .suffix(".zip")
            .tempfile_in(&dir)
            .map_err(|e| packaging_error(&dir, e))?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);
        {
            let mut zip = ZipWriter::new(tmp.as_file_mut());
            for (name, path) in &sources {
                let mut file = File::open(path).map_err(|e| packaging_error(path, e))?;
                zip.start_file(name.as_str(), options)
                    .map_err(|e| Error::Packaging(format!("{}: {}", name, e)))?;
                io::copy(&mut file, &mut zip).map_err(|e| packaging_error(path, e))?;
            }
            zip.finish()
                .map_err(|e| Error::Packaging(format!("{}: {}", self.output.display(), e)))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| packaging_error(tmp.path(), e))?;
        tmp.persist(&self.output)
            .map_err(|e| packaging_error(&self.output, e.error))?;

        let entries: Vec<String> = sources.into_iter().map(|(name, _)| name).collect();
        info!(
            "Package {} written ({} entries)",
            self.output.display(),
            entries.len()
        );
        Ok(MapPackage {
            path: self.output.clone(),
            entries,
            tile_count: tiles.len(),
        })
    }
}

impl From<&ApplicationCfg> for Packager {
    fn from(config: &ApplicationCfg) -> Packager {
        match config.map.output {
            Some(ref output) => Packager::new(Path::new(output)),
            None => Packager::new(&default_output(&config.map.name)),
        }
    }
}

/// `out/<name>.zip`
pub fn default_output(map_name: &str) -> PathBuf {
    Path::new("out").join(format!("{}.zip", map_name))
}

fn root_entry(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .ok_or_else(|| Error::Packaging(format!("invalid file name {}", path.display())))
}

/// Relative, normalized, forward slash separated
fn check_entry_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    let normal = !name.is_empty()
        && !name.contains('\\')
        && !name.ends_with('/')
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if normal {
        Ok(())
    } else {
        Err(Error::Packaging(format!("invalid archive entry `{}`", name)))
    }
}

fn packaging_error(path: &Path, err: io::Error) -> Error {
    Error::Packaging(format!("{}: {}", path.display(), err))
}

#[test]
fn test_entry_names() {
    assert!(check_entry_name("TestMap.tif.ref").is_ok());
    assert!(check_entry_name("tiles/2x0x0.png").is_ok());
    assert!(check_entry_name("../TestMap.tif.ref").is_err());
    assert!(check_entry_name("tiles/../../x.png").is_err());
    assert!(check_entry_name("/etc/passwd").is_err());
    assert!(check_entry_name("tiles/").is_err());
    assert!(check_entry_name("tiles\\2x0x0.png").is_err());
    assert!(check_entry_name("").is_err());
}
