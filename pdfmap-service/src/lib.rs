//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate log;

pub mod pipeline;
pub mod renderer;
pub mod tiler;

#[cfg(test)]
mod fake_collaborators;
#[cfg(test)]
mod pipeline_test;

pub use crate::pipeline::{Outcome, Pipeline, PipelinePlan};
pub use crate::renderer::{LevelRenderer, RawLevelRaster};
pub use crate::tiler::Tiler;
