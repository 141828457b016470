//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::command::run;
use crate::translate::pam_setting;
use pdfmap_core::core::{ApplicationCfg, Config};
use pdfmap_core::raster::{CollaboratorError, NativeTile, RetileRequest, Retiler};
use regex::Regex;
use std::fs;
use std::path::Path;
use tile_grid::{NativeScheme, TileAddress};

/// Tiling with `gdal_retile.py`.
///
/// Tiles are named `<raster basename>_<y>_<x>.png`, with tile numbers counted
/// from one and zero-padded to a common width. The package address keeps this
/// order, so `2_01_05.png` becomes `2x0x4.png`.
#[derive(Clone, Debug)]
pub struct GdalRetile {
    pub program: String,
    pub pam_enabled: bool,
    /// PNG ZLEVEL of the tiles
    pub compression: u8,
}

lazy_static! {
    static ref TILE_NAME: Regex = Regex::new(r"^(\d+)_(\d+)_(\d+)\.png$").unwrap();
}

impl GdalRetile {
    pub fn new(program: &str, pam_enabled: bool, compression: u8) -> GdalRetile {
        GdalRetile {
            program: program.to_string(),
            pam_enabled,
            compression,
        }
    }

    pub fn args(&self, request: &RetileRequest) -> Vec<String> {
        let size = request.tile_size.to_string();
        vec![
            "-of".to_string(),
            "PNG".to_string(),
            "-co".to_string(),
            format!("ZLEVEL={}", self.compression),
            "-ps".to_string(),
            size.clone(),
            size,
            "-targetDir".to_string(),
            request.target_dir.to_string_lossy().to_string(),
            request.raster.to_string_lossy().to_string(),
        ]
    }

    /// Native address of a tile file name
    pub fn parse_tile_name(&self, level: u8, name: &str) -> Option<TileAddress> {
        let caps = TILE_NAME.captures(name)?;
        if caps[1].parse::<u8>().ok()? != level {
            return None;
        }
        let column = caps[2].parse::<u32>().ok()?;
        let row = caps[3].parse::<u32>().ok()?;
        Some(TileAddress::new(level, column, row))
    }

    /// Tiles found in the target directory of a level
    pub fn read_tiles(
        &self,
        level: u8,
        dir: &Path,
    ) -> Result<Vec<NativeTile>, CollaboratorError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            CollaboratorError::Output(format!("reading {}: {}", dir.display(), e))
        })?;
        let mut tiles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CollaboratorError::Output(e.to_string()))?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".aux.xml") {
                continue;
            }
            match self.parse_tile_name(level, &name) {
                Some(address) => tiles.push(NativeTile { address, path }),
                None => {
                    return Err(CollaboratorError::Output(format!(
                        "unexpected file {} in {}",
                        name,
                        dir.display()
                    )))
                }
            }
        }
        tiles.sort_by_key(|tile| tile.address);
        Ok(tiles)
    }
}

impl Retiler for GdalRetile {
    fn info(&self) -> String {
        format!("Retiling: {}", self.program)
    }
    fn native_scheme(&self) -> NativeScheme {
        NativeScheme::one_based()
    }
    fn retile(&self, request: &RetileRequest) -> Result<Vec<NativeTile>, CollaboratorError> {
        fs::create_dir_all(&request.target_dir).map_err(|e| {
            CollaboratorError::Output(format!("{}: {}", request.target_dir.display(), e))
        })?;
        let expected_stem = request.level.to_string();
        let stem = request.raster.file_stem().map(|s| s.to_string_lossy());
        if stem.as_deref() != Some(expected_stem.as_str()) {
            return Err(CollaboratorError::Output(format!(
                "raster {} must be named after its level {}",
                request.raster.display(),
                request.level
            )));
        }
        run(
            &self.program,
            &self.args(request),
            &[("GDAL_PAM_ENABLED", pam_setting(self.pam_enabled))],
        )?;
        self.read_tiles(request.level, &request.target_dir)
    }
}

impl<'a> Config<'a, ApplicationCfg> for GdalRetile {
    fn from_config(config: &ApplicationCfg) -> Result<Self, String> {
        let tiles = &config.tiles;
        if tiles.size == 0 {
            return Err("Tile size must be positive".to_string());
        }
        if tiles.compression > 9 {
            return Err(format!(
                "Invalid PNG compression level {}",
                tiles.compression
            ));
        }
        Ok(GdalRetile::new(
            &config.gdal.retile,
            config.gdal.pam_enabled,
            tiles.compression,
        ))
    }
    fn gen_config() -> String {
        let toml = r#"
[tiles]
# Tile width and height in pixels
size = 256
# PNG compression of the tiles
compression = 9
"#;
        toml.to_string()
    }
}
