//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::renderer::LevelRenderer;
use crate::tiler::Tiler;
use pbr::ProgressBar;
use pdfmap_core::core::{levels_from_config, ApplicationCfg, Config, MapRequest, ZoomLevelSpec};
use pdfmap_core::package::{
    GeoreferenceBuilder, GeoreferenceDescriptor, MapPackage, Packager, ThumbnailGenerator,
};
use pdfmap_core::raster::{NativeTile, RasterExtractor, Retiler, Scratch};
use pdfmap_core::tiles::{NativeTileSet, TileSet};
use pdfmap_core::{Error, Result};
use rand::Rng;
use std::cmp;
use std::fmt;
use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tile_grid::Grid;
use tokio::task;

/// Terminal state of a run
#[derive(Debug)]
pub enum Outcome {
    Completed(MapPackage),
    Failed(Error),
}

/// Rendering plan of one level
#[derive(Clone, Debug, PartialEq)]
pub struct LevelPlan {
    pub level: u8,
    pub scale: f64,
    pub scale_denominator: f64,
    /// Raster width and height in pixels
    pub raster_size: (u32, u32),
    /// Number of tile columns and rows
    pub tiles: (u32, u32),
}

impl LevelPlan {
    pub fn tile_count(&self) -> u64 {
        self.tiles.0 as u64 * self.tiles.1 as u64
    }
}

/// What a run would produce, computed without rendering anything
#[derive(Clone, Debug)]
pub struct PipelinePlan {
    /// Coarsest level first
    pub levels: Vec<LevelPlan>,
    pub descriptor: GeoreferenceDescriptor,
    pub output: PathBuf,
    pub workers: usize,
}

impl PipelinePlan {
    pub fn tile_count(&self) -> u64 {
        self.levels.iter().map(|l| l.tile_count()).sum()
    }
}

impl fmt::Display for PipelinePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in &self.levels {
            writeln!(
                f,
                "Level {}: 1:{} - {}x{} px - {}x{} tiles ({})",
                level.level,
                level.scale_denominator,
                level.raster_size.0,
                level.raster_size.1,
                level.tiles.0,
                level.tiles.1,
                level.tile_count()
            )?;
        }
        writeln!(
            f,
            "Calibration: {}x{} px at resolution {}",
            self.descriptor.width, self.descriptor.height, self.descriptor.resolution
        )?;
        write!(
            f,
            "Package: {} ({} tiles, {} workers)",
            self.output.display(),
            self.tile_count(),
            self.workers
        )
    }
}

/// Calibration file written by the georeference stage
struct Calibration(PathBuf);

/// Preview image written by the thumbnail stage
struct Thumbnail(PathBuf);

/// Map generation: render and tile every level, then remap, georeference,
/// create the thumbnail and package.
pub struct Pipeline {
    pub request: MapRequest,
    /// Configuration order
    pub levels: Vec<ZoomLevelSpec>,
    pub grid: Grid,
    renderer: LevelRenderer,
    tiler: Tiler,
    pub georeference: GeoreferenceBuilder,
    pub thumbnail: ThumbnailGenerator,
    pub packager: Packager,
    /// Number of levels rendered in parallel
    pub workers: usize,
    /// Parent of the scratch area
    pub scratch_dir: Option<PathBuf>,
    pub progress: bool,
}

impl Pipeline {
    pub fn from_config(
        config: &ApplicationCfg,
        extractor: Arc<dyn RasterExtractor>,
        retiler: Arc<dyn Retiler>,
    ) -> std::result::Result<Pipeline, String> {
        let request = MapRequest::from_config(config)?;
        let levels = levels_from_config(config)?;
        check_level_order(&levels)?;
        let tile_size = config.tiles.size;
        if tile_size == 0 {
            return Err("Tile size must be positive".to_string());
        }
        let workers = match config.pipeline.workers {
            Some(0) => return Err("Number of workers must be positive".to_string()),
            Some(workers) => workers,
            None => cmp::min(levels.len(), num_cpus::get()),
        };
        let grid = Grid::square(
            tile_size,
            request.extent.clone(),
            levels.iter().map(|l| (l.level, l.scale)).collect(),
        );
        Ok(Pipeline {
            request,
            levels,
            grid,
            renderer: LevelRenderer::new(extractor),
            tiler: Tiler::new(retiler, tile_size),
            georeference: GeoreferenceBuilder::from_config(config)?,
            thumbnail: ThumbnailGenerator::from_config(config)?,
            packager: Packager::from(config),
            workers,
            scratch_dir: config.pipeline.scratch_dir.as_ref().map(PathBuf::from),
            progress: false,
        })
    }

    /// Configuration template of the pipeline sections
    pub fn gen_config() -> String {
        let mut config = String::new();
        config.push_str(TOML_HEADER);
        config.push_str(&MapRequest::gen_config());
        config.push_str(&GeoreferenceBuilder::gen_config());
        config.push_str(&ThumbnailGenerator::gen_config());
        config.push_str(TOML_PIPELINE);
        config.push_str(&ZoomLevelSpec::gen_config());
        config
    }

    fn finest_level(&self) -> Result<(u8, f64)> {
        self.grid
            .maxzoom()
            .and_then(|zoom| self.grid.resolution(zoom).map(|res| (zoom, res)))
            .ok_or_else(|| Error::Config("no levels".to_string()))
    }

    pub fn plan(&self) -> Result<PipelinePlan> {
        let mut levels = Vec::new();
        for zoom in self.grid.levels() {
            let spec = self
                .levels
                .iter()
                .find(|spec| spec.level == zoom)
                .ok_or_else(|| Error::Config(format!("unknown level {}", zoom)))?;
            let raster_size = LevelRenderer::window(&self.request, spec)?;
            levels.push(LevelPlan {
                level: zoom,
                scale: spec.scale,
                scale_denominator: self.grid.scale_denominator(zoom).unwrap_or(0.0),
                raster_size,
                tiles: self.grid.level_limit(zoom).unwrap_or((0, 0)),
            });
        }
        let (finest, finest_scale) = self.finest_level()?;
        let descriptor = self
            .georeference
            .descriptor(&self.request.extent, finest_scale)?;
        let finest_tiles = self
            .grid
            .level_limit(finest)
            .ok_or_else(|| Error::Config(format!("unknown level {}", finest)))?;
        descriptor.check_level_grid(finest_tiles, finest, finest_scale, self.tiler.tile_size)?;
        Ok(PipelinePlan {
            levels,
            descriptor,
            output: self.packager.output.clone(),
            workers: self.workers,
        })
    }

    /// Produce the map package. The scratch area is removed on every exit path.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<MapPackage> {
        let plan = self.plan()?;
        info!("{}", self.renderer.info());
        info!("{}", self.tiler.info());
        let scratch = Scratch::create(self.scratch_dir.as_ref().map(|p| p.as_path()))?;
        let result = self.run_stages(&scratch, &plan.descriptor, rng);
        if let Err(e) = scratch.close() {
            warn!("Removing scratch area failed: {}", e);
        }
        result
    }

    pub fn execute<R: Rng + ?Sized>(&self, rng: &mut R) -> Outcome {
        match self.run(rng) {
            Ok(package) => Outcome::Completed(package),
            Err(e) => Outcome::Failed(e),
        }
    }

    fn run_stages<R: Rng + ?Sized>(
        &self,
        scratch: &Scratch,
        descriptor: &GeoreferenceDescriptor,
        rng: &mut R,
    ) -> Result<MapPackage> {
        let native = self.render_levels(scratch)?;
        info!("Renaming {} tiles", native.len());
        let tiles = native.remap_into(&scratch.tiles_dir())?;
        let calibration = self.write_calibration(scratch, &tiles, descriptor)?;
        let thumbnail = self.write_thumbnail(scratch, &tiles, rng)?;
        self.package(calibration, thumbnail, &tiles)
    }

    /// Render and tile all levels. Returns after every worker finished.
    fn render_levels(&self, scratch: &Scratch) -> Result<NativeTileSet> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.render_levels_async(scratch))
    }

    async fn render_levels_async(&self, scratch: &Scratch) -> Result<NativeTileSet> {
        let mut native = NativeTileSet::new(self.tiler.native_scheme());
        let mut failure: Option<Error> = None;
        let mut pb = if self.progress {
            Some(self.progress_bar())
        } else {
            None
        };
        let mut tasks = Vec::with_capacity(self.workers);
        // level of each running task
        let mut running = Vec::with_capacity(self.workers);
        for spec in &self.levels {
            if failure.is_some() {
                break;
            }
            let renderer = self.renderer.clone();
            let tiler = self.tiler.clone();
            let request = self.request.clone();
            let spec = spec.clone();
            let raw = scratch.raw_raster(spec.level);
            let native_dir = scratch.native_dir(spec.level);
            running.push(spec.level);
            tasks.push(task::spawn_blocking(move || {
                let raster = renderer.render(&request, &spec, &raw)?;
                tiler.tile(raster, &native_dir)
            }));
            if tasks.len() >= self.workers {
                let (result, index, remaining) = await_one_task(tasks).await;
                tasks = remaining;
                let level = running.remove(index);
                collect_level(level, result, &mut native, &mut failure, &mut pb);
            }
        }
        // Finish remaining tasks, no cancellation
        let results = futures_util::future::join_all(tasks).await;
        for (level, result) in running.into_iter().zip(results) {
            collect_level(level, result, &mut native, &mut failure, &mut pb);
        }
        if let Some(pb) = pb.as_mut() {
            pb.finish();
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(native),
        }
    }

    fn progress_bar(&self) -> ProgressBar<Stdout> {
        let mut pb = ProgressBar::new(self.levels.len() as u64);
        pb.message("Levels: ");
        pb.show_speed = false;
        pb.show_time_left = false;
        pb.tick();
        pb
    }

    fn write_calibration(
        &self,
        scratch: &Scratch,
        tiles: &TileSet,
        descriptor: &GeoreferenceDescriptor,
    ) -> Result<Calibration> {
        let (finest, finest_scale) = self.finest_level()?;
        descriptor.check_tile_grid(tiles, finest, finest_scale, self.tiler.tile_size)?;
        let path = scratch.calibration_file(&self.request.name);
        self.georeference.build(descriptor, &path)?;
        Ok(Calibration(path))
    }

    fn write_thumbnail<R: Rng + ?Sized>(
        &self,
        scratch: &Scratch,
        tiles: &TileSet,
        rng: &mut R,
    ) -> Result<Thumbnail> {
        let path = scratch.thumbnail();
        let source = self.thumbnail.generate(tiles, rng, &path)?;
        debug!("Thumbnail from {}", source.display());
        Ok(Thumbnail(path))
    }

    fn package(
        &self,
        calibration: Calibration,
        thumbnail: Thumbnail,
        tiles: &TileSet,
    ) -> Result<MapPackage> {
        self.packager.package(&calibration.0, &thumbnail.0, tiles)
    }

    pub fn output(&self) -> &Path {
        &self.packager.output
    }
}

/// Larger level indices must have finer scales
fn check_level_order(levels: &[ZoomLevelSpec]) -> std::result::Result<(), String> {
    let mut sorted: Vec<&ZoomLevelSpec> = levels.iter().collect();
    sorted.sort_by_key(|spec| spec.level);
    for pair in sorted.windows(2) {
        if !(pair[1].scale < pair[0].scale) {
            return Err(format!(
                "Level {} (scale {}) must be finer than level {} (scale {})",
                pair[1].level, pair[1].scale, pair[0].level, pair[0].scale
            ));
        }
    }
    Ok(())
}

type LevelResult = std::result::Result<Result<Vec<NativeTile>>, task::JoinError>;

/// A worker that panicked or was cancelled fails its level
fn level_result(level: u8, result: LevelResult) -> Result<Vec<NativeTile>> {
    result.unwrap_or_else(|e| {
        Err(Error::Extraction {
            level,
            reason: format!("level worker failed: {}", e),
        })
    })
}

fn collect_level(
    level: u8,
    result: LevelResult,
    native: &mut NativeTileSet,
    failure: &mut Option<Error>,
    pb: &mut Option<ProgressBar<Stdout>>,
) {
    let result = level_result(level, result);
    match result {
        Ok(tiles) => {
            native.extend(tiles);
            if let Some(pb) = pb.as_mut() {
                pb.inc();
            }
        }
        Err(e) => {
            error!("{}", e);
            if failure.is_none() {
                *failure = Some(e);
            }
        }
    }
}

async fn await_one_task<T>(
    tasks: Vec<task::JoinHandle<T>>,
) -> (
    std::result::Result<T, task::JoinError>,
    usize,
    Vec<task::JoinHandle<T>>,
) {
    futures_util::future::select_all(tasks).await
}

const TOML_HEADER: &'static str = "# pdfmap configuration\n";

const TOML_PIPELINE: &'static str = r#"
[pipeline]
# Levels rendered in parallel (Default: number of levels, at most #cores)
#workers = 3
# Parent directory of the scratch area (Default: system temp directory)
#scratch_dir = "/var/tmp"
"#;
