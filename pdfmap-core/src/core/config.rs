//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::request::Resampling;
use regex::Regex;
use serde::Deserialize;
use std;
use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::prelude::*;
use tera::{Context, Tera};
use tile_grid::Extent;
use toml::Value;

pub trait Config<'a, C: Deserialize<'a>>
where
    Self: std::marker::Sized,
{
    /// Read configuration
    fn from_config(config: &C) -> Result<Self, String>;
    /// Generate configuration template
    fn gen_config() -> String;
    /// Generate configuration template with runtime information
    fn gen_runtime_config(&self) -> String {
        Self::gen_config()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationCfg {
    pub map: MapCfg,
    #[serde(default)]
    pub tiles: TilesCfg,
    pub georeference: GeoreferenceCfg,
    #[serde(default)]
    pub thumbnail: ThumbnailCfg,
    #[serde(default)]
    pub gdal: GdalCfg,
    #[serde(default)]
    pub pipeline: PipelineCfg,
    #[serde(rename = "level")]
    pub levels: Vec<LevelCfg>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct MapCfg {
    /// Map name, used for the calibration file and the default package name
    pub name: String,
    /// Rendered extent in the projected coordinate system of the source data
    pub bbox: BboxCfg,
    /// Base directory of relative level datasets
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Package path (Default: out/<name>.zip)
    pub output: Option<String>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct BboxCfg {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl From<&BboxCfg> for Extent {
    fn from(cfg: &BboxCfg) -> Extent {
        Extent {
            minx: cfg.xmin,
            miny: cfg.ymin,
            maxx: cfg.xmax,
            maxy: cfg.ymax,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TilesCfg {
    /// Width and height of a tile, in pixels
    #[serde(default = "default_tile_size")]
    pub size: u16,
    /// PNG compression level of the tiles (0-9)
    #[serde(default = "default_tile_compression")]
    pub compression: u8,
}

impl Default for TilesCfg {
    fn default() -> Self {
        TilesCfg {
            size: default_tile_size(),
            compression: default_tile_compression(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct GeoreferenceCfg {
    /// Projection header copied into the calibration file
    pub template: String,
    /// Reference resolution of the calibration (Default: finest level scale)
    pub resolution: Option<f64>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ThumbnailCfg {
    /// Level to sample the thumbnail from (Default: finest level)
    pub level: Option<u8>,
    /// Width and height of the thumbnail, in pixels
    #[serde(default = "default_thumbnail_size")]
    pub size: u32,
}

impl Default for ThumbnailCfg {
    fn default() -> Self {
        ThumbnailCfg {
            level: None,
            size: default_thumbnail_size(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct GdalCfg {
    /// Raster extraction command
    #[serde(default = "default_translate")]
    pub translate: String,
    /// Retiling command
    #[serde(default = "default_retile")]
    pub retile: String,
    /// Create *.aux.xml metadata sidecar files
    #[serde(default)]
    pub pam_enabled: bool,
    /// PNG compression level of the intermediate level rasters (0-9)
    #[serde(default = "default_raster_compression")]
    pub compression: u8,
}

impl Default for GdalCfg {
    fn default() -> Self {
        GdalCfg {
            translate: default_translate(),
            retile: default_retile(),
            pam_enabled: false,
            compression: default_raster_compression(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct PipelineCfg {
    /// Number of levels rendered in parallel (Default: number of levels, at most #cores)
    pub workers: Option<usize>,
    /// Parent directory of the scratch area (Default: system temp directory)
    pub scratch_dir: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LevelCfg {
    /// Zoom level, larger is finer
    pub index: u8,
    /// Ground sample distance in map units per pixel
    pub scale: f64,
    /// Source mosaic, relative to `map.data_dir` unless absolute
    pub dataset: String,
    /// Resampling method
    #[serde(default)]
    pub method: Resampling,
}

pub fn default_data_dir() -> String {
    ".".to_string()
}

pub fn default_tile_size() -> u16 {
    256
}

pub fn default_tile_compression() -> u8 {
    9
}

pub fn default_thumbnail_size() -> u32 {
    128
}

pub fn default_translate() -> String {
    "gdal_translate".to_string()
}

pub fn default_retile() -> String {
    "gdal_retile.py".to_string()
}

pub fn default_raster_compression() -> u8 {
    1
}

pub const DEFAULT_CONFIG: &'static str = r#"
[map]
name = "TestMap"
bbox = { xmin = 500000.0, xmax = 520000.0, ymin = 6500000.0, ymax = 6520000.0 }
data_dir = "."

[georeference]
template = "templates/lamb93.ref"

[[level]]
index = 0
scale = 10.0
dataset = "index.vrt"
"#;

/// Load and parse the config file into an config struct.
pub fn read_config<'a, T: Deserialize<'a>>(path: &str) -> Result<T, String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => {
            return Err("Could not find config file!".to_string());
        }
    };
    let mut config_toml = String::new();
    if let Err(err) = file.read_to_string(&mut config_toml) {
        return Err(format!("Error while reading config: [{}]", err));
    };

    parse_config(config_toml, path)
}

/// Parse the configuration into an config struct.
pub fn parse_config<'a, T: Deserialize<'a>>(config_toml: String, path: &str) -> Result<T, String> {
    // Check for old ${var} expressions
    let re = Regex::new(r"\$\{([[:alnum:]]+)\}").map_err(|e| e.to_string())?;
    if re.is_match(&config_toml) {
        return Err(
            "Replace old environment variable syntax ${VARNAME} with `{{env.VARNAME}}`".to_string(),
        );
    }

    // Parse template
    let mut tera = Tera::default();
    tera.add_raw_template(path, &config_toml)
        .map_err(|e| format!("Template error: {}", e))?;
    let mut context = Context::new();
    let mut env = HashMap::new();
    for (key, value) in env::vars() {
        env.insert(key, value);
    }
    context.insert("env", &env);
    let toml = tera.render(path, &context).map_err(|e| match e.source() {
        Some(source) => format!("Template error: {}", source),
        None => format!("Template error: {}", e),
    })?;

    toml.parse::<Value>()
        .and_then(|cfg| cfg.try_into::<T>())
        .map_err(|err| format!("{} - {}", path, err))
}
