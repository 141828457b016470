//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod collaborator;
pub mod scratch;


pub use self::collaborator::{
    CollaboratorError, ExtractRequest, NativeTile, RasterExtractor, RetileRequest, Retiler,
};
pub use self::scratch::{calibration_filename, Scratch};
