//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use pdfmap_core::core::{MapRequest, ZoomLevelSpec};
use pdfmap_core::raster::{ExtractRequest, RasterExtractor};
use pdfmap_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tile_grid::pixel_count;

/// Full extent raster of one level, living in the scratch area
#[derive(Clone, Debug, PartialEq)]
pub struct RawLevelRaster {
    pub level: u8,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Extracts the map extent of one level from its source mosaic
#[derive(Clone)]
pub struct LevelRenderer {
    extractor: Arc<dyn RasterExtractor>,
}

impl LevelRenderer {
    pub fn new(extractor: Arc<dyn RasterExtractor>) -> LevelRenderer {
        LevelRenderer { extractor }
    }
    pub fn info(&self) -> String {
        self.extractor.info()
    }

    /// Pixel size of the level raster
    pub fn window(request: &MapRequest, spec: &ZoomLevelSpec) -> Result<(u32, u32)> {
        let pixels = |length: f64| {
            pixel_count(length, spec.scale).ok_or_else(|| Error::Extraction {
                level: spec.level,
                reason: format!(
                    "window of {} units exceeds {} px at scale {}",
                    length,
                    u32::MAX,
                    spec.scale
                ),
            })
        };
        let width = pixels(request.extent.width())?;
        let height = pixels(request.extent.height())?;
        if width == 0 || height == 0 {
            return Err(Error::Extraction {
                level: spec.level,
                reason: format!(
                    "degenerate window {}x{} px at scale {}",
                    width, height, spec.scale
                ),
            });
        }
        Ok((width, height))
    }

    pub fn render(
        &self,
        request: &MapRequest,
        spec: &ZoomLevelSpec,
        output: &Path,
    ) -> Result<RawLevelRaster> {
        let (width, height) = Self::window(request, spec)?;
        info!(
            "Render level {} @ 1:{} (1cm <=> {}m)",
            spec.level,
            (spec.scale * 10000.0) as u64,
            (spec.scale * 100.0) as u64
        );
        let extract = ExtractRequest {
            dataset: spec.dataset_path(&request.data_dir),
            window: request.extent.clone(),
            resolution: spec.scale,
            method: spec.method,
            output: output.to_path_buf(),
        };
        self.extractor
            .extract(&extract)
            .map_err(|e| Error::Extraction {
                level: spec.level,
                reason: e.to_string(),
            })?;

        // exit status 0 doesn't guarantee a usable raster
        let (actual_width, actual_height) =
            image::image_dimensions(output).map_err(|e| Error::Extraction {
                level: spec.level,
                reason: format!("unreadable raster {}: {}", output.display(), e),
            })?;
        if actual_width == 0 || actual_height == 0 {
            return Err(Error::Extraction {
                level: spec.level,
                reason: format!("empty raster {}", output.display()),
            });
        }
        if (actual_width, actual_height) != (width, height) {
            warn!(
                "Level {}: raster is {}x{} px, expected {}x{} px",
                spec.level, actual_width, actual_height, width, height
            );
        }
        debug!(
            "Level {}: {}x{} px raster {}",
            spec.level,
            actual_width,
            actual_height,
            output.display()
        );
        Ok(RawLevelRaster {
            level: spec.level,
            path: output.to_path_buf(),
            width: actual_width,
            height: actual_height,
        })
    }
}
