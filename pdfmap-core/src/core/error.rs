//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use std::io;
use thiserror::Error;
use tile_grid::RemapError;

/// Pipeline failure. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("extraction of level {level} failed: {reason}")]
    Extraction { level: u8, reason: String },
    #[error("tiling of level {level} failed: {reason}")]
    Tiling { level: u8, reason: String },
    #[error("tile address collision: {0}")]
    RemapCollision(String),
    #[error("no tiles at thumbnail level {level}")]
    NoTiles { level: u8 },
    #[error("thumbnail creation failed: {0}")]
    Thumbnail(String),
    #[error("georeference failed: {0}")]
    Georeference(String),
    #[error("packaging failed: {0}")]
    Packaging(String),
    #[error("scratch area failure: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Pipeline stage reporting the error
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration",
            Error::Extraction { .. } => "render",
            Error::Tiling { .. } => "tile",
            Error::RemapCollision(_) => "remap",
            Error::NoTiles { .. } | Error::Thumbnail(_) => "thumbnail",
            Error::Georeference(_) => "georeference",
            Error::Packaging(_) => "package",
            Error::Io(_) => "scratch",
        }
    }
}

impl From<RemapError> for Error {
    fn from(err: RemapError) -> Self {
        Error::RemapCollision(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
