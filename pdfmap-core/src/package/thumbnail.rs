//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::ApplicationCfg;
use crate::core::error::{Error, Result};
use crate::core::Config;
use crate::tiles::TileSet;
use image::{imageops, ImageFormat, RgbaImage};
use rand::Rng;
use std::path::{Path, PathBuf};

/// Preview image cropped from a random tile
#[derive(Clone, Debug)]
pub struct ThumbnailGenerator {
    pub level: u8,
    pub size: u32,
}

impl ThumbnailGenerator {
    pub fn new(level: u8, size: u32) -> ThumbnailGenerator {
        ThumbnailGenerator { level, size }
    }

    /// Pick a tile of the configured level. Returns the source tile.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        tiles: &TileSet,
        rng: &mut R,
        target: &Path,
    ) -> Result<PathBuf> {
        let candidates = tiles.level(self.level);
        if candidates.is_empty() {
            return Err(Error::NoTiles { level: self.level });
        }
        let (address, source) = candidates[rng.random_range(0..candidates.len())];
        debug!("Thumbnail from tile {}", address);
        let tile = image::open(source)
            .map_err(|e| Error::Thumbnail(format!("decoding {}: {}", source.display(), e)))?;
        let crop_width = tile.width().min(self.size);
        let crop_height = tile.height().min(self.size);
        let crop = tile.crop_imm(0, 0, crop_width, crop_height).to_rgba8();

        // edge tiles may be smaller than the thumbnail
        let mut thumb = RgbaImage::new(self.size, self.size);
        imageops::overlay(&mut thumb, &crop, 0, 0);
        thumb
            .save_with_format(target, ImageFormat::Png)
            .map_err(|e| Error::Thumbnail(format!("writing {}: {}", target.display(), e)))?;
        Ok(source.clone())
    }
}

impl<'a> Config<'a, ApplicationCfg> for ThumbnailGenerator {
    fn from_config(config: &ApplicationCfg) -> std::result::Result<Self, String> {
        let cfg = &config.thumbnail;
        if cfg.size == 0 {
            return Err("Thumbnail size must be positive".to_string());
        }
        let finest = config.levels.iter().map(|l| l.index).max();
        let level = match cfg.level.or(finest) {
            Some(level) => level,
            None => return Err("No level configured".to_string()),
        };
        if !config.levels.iter().any(|l| l.index == level) {
            return Err(format!("Thumbnail level {} is not configured", level));
        }
        Ok(ThumbnailGenerator::new(level, cfg.size))
    }
    fn gen_config() -> String {
        let toml = r#"
[thumbnail]
# Level to sample the preview from (Default: finest level)
#level = 2
size = 128
"#;
        toml.to_string()
    }
}
