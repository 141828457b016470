//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::{ApplicationCfg, LevelCfg};
use crate::core::enum_serializer::EnumString;
use crate::core::Config;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tile_grid::Extent;

/// Resampling method of the raster extraction
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Resampling {
    /// Discrete content (scanned maps, classifications)
    Nearest,
    Bilinear,
    Cubic,
    CubicSpline,
    /// Continuous content, used when downsampling scanned maps
    Lanczos,
    Average,
}

impl Default for Resampling {
    fn default() -> Self {
        Resampling::Nearest
    }
}

impl EnumString<Resampling> for Resampling {
    fn from_str(val: &str) -> Result<Resampling, String> {
        match val {
            "near" | "nearest" => Ok(Resampling::Nearest),
            "bilinear" => Ok(Resampling::Bilinear),
            "cubic" => Ok(Resampling::Cubic),
            "cubicspline" => Ok(Resampling::CubicSpline),
            "lanczos" => Ok(Resampling::Lanczos),
            "average" => Ok(Resampling::Average),
            _ => Err(format!("Unexpected enum value '{}'", val)),
        }
    }
    /// GDAL resampling name
    fn as_str(&self) -> &'static str {
        match *self {
            Resampling::Nearest => "near",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
            Resampling::CubicSpline => "cubicspline",
            Resampling::Lanczos => "lanczos",
            Resampling::Average => "average",
        }
    }
}

enum_string_serialization!(Resampling ResamplingVisitor);

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to render: one per run, immutable
#[derive(Clone, Debug)]
pub struct MapRequest {
    pub name: String,
    pub extent: Extent,
    pub data_dir: PathBuf,
}

impl MapRequest {
    pub fn new(name: &str, extent: Extent, data_dir: &Path) -> Result<MapRequest, String> {
        if name.is_empty() {
            return Err("Map name is empty".to_string());
        }
        if name.contains(|c: char| c == '/' || c == '\\') || name == "." || name == ".." {
            return Err(format!("Map name '{}' is not a valid file name", name));
        }
        if !extent.is_valid() {
            return Err(format!(
                "Invalid bbox: expected finite values with xmin < xmax and ymin < ymax, got xmin={} xmax={} ymin={} ymax={}",
                extent.minx, extent.maxx, extent.miny, extent.maxy
            ));
        }
        Ok(MapRequest {
            name: name.to_string(),
            extent,
            data_dir: data_dir.to_path_buf(),
        })
    }
    /// Same request with another extent
    pub fn with_extent(&self, extent: Extent) -> Result<MapRequest, String> {
        MapRequest::new(&self.name, extent, &self.data_dir)
    }
}

impl<'a> Config<'a, ApplicationCfg> for MapRequest {
    fn from_config(config: &ApplicationCfg) -> Result<Self, String> {
        MapRequest::new(
            &config.map.name,
            Extent::from(&config.map.bbox),
            Path::new(&config.map.data_dir),
        )
    }
    fn gen_config() -> String {
        let toml = r#"
[map]
name = "TestMap"
# Extent in the projected coordinate system of the source data
bbox = { xmin = 500000.0, xmax = 520000.0, ymin = 6500000.0, ymax = 6520000.0 }
data_dir = "{{env.HOME}}/SIG/IGN/SCAN"
#output = "out/TestMap.zip"
"#;
        toml.to_string()
    }
}

/// One resolution tier of the package
#[derive(Clone, Debug)]
pub struct ZoomLevelSpec {
    pub level: u8,
    /// Ground sample distance
    pub scale: f64,
    pub dataset: PathBuf,
    pub method: Resampling,
}

impl ZoomLevelSpec {
    pub fn new(
        level: u8,
        scale: f64,
        dataset: &Path,
        method: Resampling,
    ) -> Result<ZoomLevelSpec, String> {
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(format!(
                "Scale of level {} must be positive, got {}",
                level, scale
            ));
        }
        Ok(ZoomLevelSpec {
            level,
            scale,
            dataset: dataset.to_path_buf(),
            method,
        })
    }
    /// Dataset location, resolved against the data directory
    pub fn dataset_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.dataset)
    }
}

impl<'a> Config<'a, LevelCfg> for ZoomLevelSpec {
    fn from_config(cfg: &LevelCfg) -> Result<Self, String> {
        ZoomLevelSpec::new(cfg.index, cfg.scale, Path::new(&cfg.dataset), cfg.method)
    }
    fn gen_config() -> String {
        let toml = r#"
[[level]]
index = 2
scale = 2.5
dataset = "SC25_TOUR_TIF_LZW_LAMB93/index.vrt"
method = "near"

[[level]]
index = 1
scale = 5.0
dataset = "SC25_TOUR_TIF_LZW_LAMB93/index.vrt"
method = "lanczos"

[[level]]
index = 0
scale = 10.0
dataset = "SC100_TIF_LZW_LAMB93/index.vrt"
method = "lanczos"
"#;
        toml.to_string()
    }
}

/// Level specs of a configuration, in configuration order
pub fn levels_from_config(config: &ApplicationCfg) -> Result<Vec<ZoomLevelSpec>, String> {
    if config.levels.is_empty() {
        return Err("At least one [[level]] is required".to_string());
    }
    let mut levels: Vec<ZoomLevelSpec> = Vec::with_capacity(config.levels.len());
    for cfg in &config.levels {
        if levels.iter().any(|l| l.level == cfg.index) {
            return Err(format!("Duplicate level index {}", cfg.index));
        }
        levels.push(ZoomLevelSpec::from_config(cfg)?);
    }
    Ok(levels)
}
