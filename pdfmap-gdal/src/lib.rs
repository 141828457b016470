//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Raster engines backed by the GDAL command line utilities

#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;

mod command;
mod retile;
mod translate;


pub use crate::retile::GdalRetile;
pub use crate::translate::GdalTranslate;
