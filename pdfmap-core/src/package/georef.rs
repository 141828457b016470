//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::ApplicationCfg;
use crate::core::error::{Error, Result};
use crate::core::Config;
use crate::tiles::TileSet;
use std::fs;
use std::path::{Path, PathBuf};
use tile_grid::{tile_count, Extent};

/// Affine calibration of the package at a reference resolution
#[derive(PartialEq, Clone, Debug)]
pub struct GeoreferenceDescriptor {
    pub origin_x: f64,
    pub origin_y: f64,
    pub resolution: f64,
    pub width: u32,
    pub height: u32,
}

impl GeoreferenceDescriptor {
    pub fn new(extent: &Extent, resolution: f64) -> Result<GeoreferenceDescriptor> {
        if !(resolution > 0.0) || !resolution.is_finite() {
            return Err(Error::Georeference(format!(
                "invalid reference resolution {}",
                resolution
            )));
        }
        let width = (extent.width() / resolution).round();
        let height = (extent.height() / resolution).round();
        if !(width >= 1.0) || !(height >= 1.0) {
            return Err(Error::Georeference(format!(
                "extent smaller than one pixel at resolution {}",
                resolution
            )));
        }
        Ok(GeoreferenceDescriptor {
            origin_x: extent.minx,
            origin_y: extent.maxy,
            resolution,
            width: width as u32,
            height: height as u32,
        })
    }

    /// Origin and pixel size line followed by the grid size line
    pub fn calibration_lines(&self) -> String {
        format!(
            "{},{},0,{},0,{}\n{},{}",
            self.origin_x,
            self.resolution,
            self.origin_y,
            -self.resolution,
            self.width,
            self.height
        )
    }

    /// Number of tiles of the descriptor grid resampled to `scale`
    pub fn tile_grid(&self, scale: f64, tile_size: u16) -> (u32, u32) {
        let factor = self.resolution / scale;
        let width = (self.width as f64 * factor).round() as u32;
        let height = (self.height as f64 * factor).round() as u32;
        (tile_count(width, tile_size), tile_count(height, tile_size))
    }

    /// Compare with the tiles of the finest level, rendered at `scale`
    pub fn check_tile_grid(
        &self,
        tiles: &TileSet,
        zoom: u8,
        scale: f64,
        tile_size: u16,
    ) -> Result<()> {
        let observed = tiles.raster_grid(zoom).ok_or_else(|| {
            Error::Georeference(format!("no tiles at finest level {}", zoom))
        })?;
        self.check_level_grid(observed, zoom, scale, tile_size)
    }

    /// Compare with the `(x, y)` tile grid of the finest level, rendered at `scale`
    pub fn check_level_grid(
        &self,
        observed: (u32, u32),
        zoom: u8,
        scale: f64,
        tile_size: u16,
    ) -> Result<()> {
        let expected = self.tile_grid(scale, tile_size);
        if observed != expected {
            return Err(Error::Georeference(format!(
                "calibration grid {}x{} gives {}x{} tiles at level {}, found {}x{}",
                self.width, self.height, expected.0, expected.1, zoom, observed.0, observed.1
            )));
        }
        Ok(())
    }
}

/// Writes `<name>.tif.ref`: the projection template followed by the calibration
#[derive(Clone, Debug)]
pub struct GeoreferenceBuilder {
    pub template: PathBuf,
    /// Reference resolution, finest level scale when unset
    pub resolution: Option<f64>,
}

impl GeoreferenceBuilder {
    pub fn new(template: &Path, resolution: Option<f64>) -> GeoreferenceBuilder {
        GeoreferenceBuilder {
            template: template.to_path_buf(),
            resolution,
        }
    }

    pub fn descriptor(
        &self,
        extent: &Extent,
        finest_scale: f64,
    ) -> Result<GeoreferenceDescriptor> {
        GeoreferenceDescriptor::new(extent, self.resolution.unwrap_or(finest_scale))
    }

    pub fn build(&self, descriptor: &GeoreferenceDescriptor, target: &Path) -> Result<()> {
        let mut content = fs::read_to_string(&self.template).map_err(|e| {
            Error::Georeference(format!(
                "reading template {}: {}",
                self.template.display(),
                e
            ))
        })?;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&descriptor.calibration_lines());
        fs::write(target, content).map_err(|e| {
            Error::Georeference(format!("writing {}: {}", target.display(), e))
        })?;
        debug!(
            "Calibration {} at resolution {}",
            target.display(),
            descriptor.resolution
        );
        Ok(())
    }
}

impl<'a> Config<'a, ApplicationCfg> for GeoreferenceBuilder {
    fn from_config(config: &ApplicationCfg) -> std::result::Result<Self, String> {
        let cfg = &config.georeference;
        if let Some(resolution) = cfg.resolution {
            if !(resolution > 0.0) {
                return Err(format!("Invalid reference resolution {}", resolution));
            }
        }
        Ok(GeoreferenceBuilder::new(Path::new(&cfg.template), cfg.resolution))
    }
    fn gen_config() -> String {
        let toml = r#"
[georeference]
# Projection header of the calibration file
template = "templates/lamb93.ref"
# Pixel size of the calibration (Default: scale of the finest level)
#resolution = 5.0
"#;
        toml.to_string()
    }
}
