//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
mod enum_serializer;
pub mod config;
pub mod error;
pub mod request;

pub use self::config::{parse_config, read_config, ApplicationCfg, Config};
pub use self::request::{levels_from_config, MapRequest, Resampling, ZoomLevelSpec};

#[cfg(test)]
mod config_test;
