//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! In-process raster engines writing real PNG files

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};
use pdfmap_core::raster::{
    CollaboratorError, ExtractRequest, NativeTile, RasterExtractor, RetileRequest, Retiler,
};
use std::fs::{self, File};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tile_grid::{pixel_count, tile_count, NativeScheme, TileAddress};

fn write_gray(path: &Path, width: u32, height: u32, value: u8) {
    let img = GrayImage::from_pixel(width, height, Luma([value]));
    let file = File::create(path).unwrap();
    PngEncoder::new_with_quality(file, CompressionType::Fast, FilterType::NoFilter)
        .write_image(img.as_raw(), width, height, ExtendedColorType::L8)
        .unwrap();
}

/// Writes a blank raster of the requested window
#[derive(Default)]
pub struct FakeExtractor {
    pub fail_dataset: Option<String>,
    /// Panics instead of failing
    pub panic_dataset: Option<String>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<ExtractRequest>>,
}

impl RasterExtractor for FakeExtractor {
    fn info(&self) -> String {
        "Raster extraction: fake".to_string()
    }
    fn extract(&self, request: &ExtractRequest) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let dataset = request.dataset.to_string_lossy().to_string();
        if self.panic_dataset.as_ref().map_or(false, |d| dataset.ends_with(d)) {
            panic!("extractor crashed on {}", dataset);
        }
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_dataset.as_ref().map_or(false, |d| dataset.ends_with(d)) {
            return Err(CollaboratorError::Status {
                program: "gdal_translate".to_string(),
                status: "exit status: 1".to_string(),
                diagnostics: format!("ERROR 4: {}: No such file or directory", dataset),
            });
        }
        let width = pixel_count(request.window.width(), request.resolution).unwrap_or(0);
        let height = pixel_count(request.window.height(), request.resolution).unwrap_or(0);
        write_gray(&request.output, width, height, 200);
        Ok(())
    }
}

/// Tiles named like gdal_retile.py: `<level>_<y>_<x>.png`, one-based
#[derive(Default)]
pub struct FakeRetiler {
    /// Stop before the last tile
    pub drop_last: bool,
    /// Declared offset differs from the written addresses
    pub declare_zero_based: bool,
}

impl Retiler for FakeRetiler {
    fn info(&self) -> String {
        "Retiling: fake".to_string()
    }
    fn native_scheme(&self) -> NativeScheme {
        if self.declare_zero_based {
            NativeScheme { offset: 0 }
        } else {
            NativeScheme::one_based()
        }
    }
    fn retile(&self, request: &RetileRequest) -> Result<Vec<NativeTile>, CollaboratorError> {
        let (width, height) = image::image_dimensions(&request.raster)
            .map_err(|e| CollaboratorError::Output(e.to_string()))?;
        fs::create_dir_all(&request.target_dir)
            .map_err(|e| CollaboratorError::Output(e.to_string()))?;
        let size = request.tile_size as u32;
        let cols = tile_count(width, request.tile_size);
        let rows = tile_count(height, request.tile_size);
        let mut tiles = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                if self.drop_last && row + 1 == rows && col + 1 == cols {
                    continue;
                }
                let tile_width = (width - col * size).min(size);
                let tile_height = (height - row * size).min(size);
                let path = request
                    .target_dir
                    .join(format!("{}_{}_{}.png", request.level, row + 1, col + 1));
                write_gray(&path, tile_width, tile_height, request.level);
                tiles.push(NativeTile {
                    address: TileAddress::from_cell(request.level, col + 1, row + 1),
                    path,
                });
            }
        }
        Ok(tiles)
    }
}
