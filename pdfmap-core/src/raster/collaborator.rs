//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Interfaces of the raster engines driven by the pipeline

use crate::core::request::Resampling;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tile_grid::{Extent, NativeScheme, TileAddress};

/// Failure reported by an external raster engine
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("could not run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with {status}: {diagnostics}")]
    Status {
        program: String,
        status: String,
        diagnostics: String,
    },
    #[error("{0}")]
    Output(String),
}

/// Windowed extraction of a source mosaic
#[derive(Clone, Debug)]
pub struct ExtractRequest {
    pub dataset: PathBuf,
    /// Geographic window, clipped exactly
    pub window: Extent,
    /// Sampling step in map units per pixel
    pub resolution: f64,
    pub method: Resampling,
    pub output: PathBuf,
}

pub trait RasterExtractor: Send + Sync {
    fn info(&self) -> String;
    /// Write the raster of the requested window to `request.output`
    fn extract(&self, request: &ExtractRequest) -> Result<(), CollaboratorError>;
}

/// Split of one level raster into tiles
#[derive(Clone, Debug)]
pub struct RetileRequest {
    pub level: u8,
    pub raster: PathBuf,
    pub tile_size: u16,
    /// Empty directory receiving the tiles of this level only
    pub target_dir: PathBuf,
}

/// Tile written by a retiler, in the retiler's own addressing
#[derive(Clone, Debug, PartialEq)]
pub struct NativeTile {
    pub address: TileAddress,
    pub path: PathBuf,
}

pub trait Retiler: Send + Sync {
    fn info(&self) -> String;
    /// Column/row offset of the produced addresses
    fn native_scheme(&self) -> NativeScheme;
    /// Write the tiles of `request.raster` and return them with their native addresses
    fn retile(&self, request: &RetileRequest) -> Result<Vec<NativeTile>, CollaboratorError>;
}
