//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod georef;
pub mod packager;
pub mod thumbnail;

#[cfg(test)]
pub(crate) mod test_utils;

pub use self::georef::{GeoreferenceBuilder, GeoreferenceDescriptor};
pub use self::packager::{default_output, MapPackage, Packager};
pub use self::thumbnail::ThumbnailGenerator;
