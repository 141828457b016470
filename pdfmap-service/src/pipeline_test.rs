//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::fake_collaborators::{FakeExtractor, FakeRetiler};
use crate::pipeline::{Outcome, Pipeline};
use pdfmap_core::core::{parse_config, ApplicationCfg};
use pdfmap_core::Error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const LAMB93_LEVELS: &str = r#"
[map]
name = "TestMap"
bbox = { xmin = 500000.0, xmax = 520000.0, ymin = 6500000.0, ymax = 6520000.0 }
data_dir = "/data/SIG/IGN/SCAN"

[georeference]
template = "{{template}}"
resolution = 5.0

[thumbnail]
level = 2

[pipeline]
workers = 2

[[level]]
index = 2
scale = 2.5
dataset = "SC25_TOUR_TIF_LZW_LAMB93/index.vrt"
method = "near"

[[level]]
index = 1
scale = 5.0
dataset = "SC25_TOUR_TIF_LZW_LAMB93/index.vrt"
method = "lanczos"

[[level]]
index = 0
scale = 10.0
dataset = "SC100_TIF_LZW_LAMB93/index.vrt"
method = "lanczos"
"#;

/// Small map: 256x128 px at level 0
const SMALL_MAP: &str = r#"
[map]
name = "Small"
bbox = { xmin = 0.0, xmax = 2560.0, ymin = 0.0, ymax = 1280.0 }

[georeference]
template = "{{template}}"

[[level]]
index = 0
scale = 10.0
dataset = "coarse.vrt"

[[level]]
index = 1
scale = 5.0
dataset = "fine.vrt"
"#;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Workspace {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("lamb93.ref"),
            "PROJCS[\"RGF93 / Lambert-93\"]\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("scratch")).unwrap();
        Workspace { dir }
    }
    fn path(&self) -> &Path {
        self.dir.path()
    }
    fn config(&self, toml: &str) -> ApplicationCfg {
        let template = self.path().join("lamb93.ref");
        let toml = toml.replace("{{template}}", &template.to_string_lossy());
        let mut config: ApplicationCfg = parse_config(toml, "").unwrap();
        config.map.output = Some(
            self.path()
                .join("out")
                .join(format!("{}.zip", config.map.name))
                .to_string_lossy()
                .to_string(),
        );
        config.pipeline.scratch_dir =
            Some(self.path().join("scratch").to_string_lossy().to_string());
        config
    }
    fn scratch_is_empty(&self) -> bool {
        fs::read_dir(self.path().join("scratch")).unwrap().count() == 0
    }
}

fn pipeline(
    config: &ApplicationCfg,
    extractor: FakeExtractor,
    retiler: FakeRetiler,
) -> Pipeline {
    Pipeline::from_config(config, Arc::new(extractor), Arc::new(retiler)).unwrap()
}

#[test]
fn test_end_to_end() {
    let ws = Workspace::new();
    let config = ws.config(LAMB93_LEVELS);
    let pipeline = pipeline(&config, FakeExtractor::default(), FakeRetiler::default());
    let mut rng = StdRng::seed_from_u64(7);
    let package = pipeline.run(&mut rng).unwrap();

    assert_eq!(package.path, ws.path().join("out/TestMap.zip"));
    assert_eq!(package.tile_count, 32 * 32 + 16 * 16 + 8 * 8);
    assert_eq!(package.entry_count(), package.tile_count + 2);
    assert!(ws.scratch_is_empty());

    let mut archive = zip::ZipArchive::new(File::open(&package.path).unwrap()).unwrap();
    assert_eq!(archive.len(), package.entry_count());
    for name in &[
        "tiles/2x0x0.png",
        "tiles/2x31x31.png",
        "tiles/1x15x15.png",
        "tiles/0x7x7.png",
    ] {
        assert!(archive.by_name(name).is_ok(), "missing {}", name);
    }
    assert!(archive.by_name("tiles/2x32x32.png").is_err());
    assert!(archive.by_name("tiles/2x32x1.png").is_err());
    for i in 0..archive.len() {
        let entry = archive.by_index(i).unwrap();
        assert!(entry.is_file());
        assert!(!entry.name().contains(".."));
    }

    let mut calibration = String::new();
    archive
        .by_name("TestMap.tif.ref")
        .unwrap()
        .read_to_string(&mut calibration)
        .unwrap();
    assert_eq!(
        calibration,
        "PROJCS[\"RGF93 / Lambert-93\"]\n500000,5,0,6520000,0,-5\n4000,4000"
    );

    let mut thumb = Vec::new();
    archive
        .by_name("thumb.png")
        .unwrap()
        .read_to_end(&mut thumb)
        .unwrap();
    let thumb = image::load_from_memory(&thumb).unwrap().to_rgba8();
    assert_eq!(thumb.dimensions(), (128, 128));
    // level 2 tiles have gray value 2
    assert_eq!(thumb.get_pixel(0, 0).0, [2, 2, 2, 255]);

    // right edge tile in the top row of level 1
    let mut edge = Vec::new();
    archive
        .by_name("tiles/1x0x15.png")
        .unwrap()
        .read_to_end(&mut edge)
        .unwrap();
    let edge = image::load_from_memory(&edge).unwrap();
    assert_eq!((edge.width(), edge.height()), (160, 256));
}

#[test]
fn test_plan() {
    let ws = Workspace::new();
    let config = ws.config(LAMB93_LEVELS);
    let extractor = Arc::new(FakeExtractor::default());
    let pipeline =
        Pipeline::from_config(&config, extractor.clone(), Arc::new(FakeRetiler::default()))
            .unwrap();
    let plan = pipeline.plan().unwrap();
    assert_eq!(plan.levels.len(), 3);
    assert_eq!(plan.levels[0].level, 0);
    assert_eq!(plan.levels[2].raster_size, (8000, 8000));
    assert_eq!(plan.levels[2].tiles, (32, 32));
    assert_eq!(plan.levels[2].scale_denominator, 25000.0);
    assert_eq!(plan.levels[1].tiles, (16, 16));
    assert_eq!(plan.tile_count(), 1344);
    assert_eq!((plan.descriptor.width, plan.descriptor.height), (4000, 4000));
    assert_eq!(plan.workers, 2);
    assert!(plan
        .to_string()
        .starts_with("Level 0: 1:100000 - 2000x2000 px - 8x8 tiles (64)"));
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert!(ws.scratch_is_empty());
}

#[test]
fn test_default_reference_resolution() {
    let ws = Workspace::new();
    let config = ws.config(SMALL_MAP);
    let pipeline = pipeline(&config, FakeExtractor::default(), FakeRetiler::default());
    // finest level scale
    let plan = pipeline.plan().unwrap();
    assert_eq!((plan.descriptor.width, plan.descriptor.height), (512, 256));
    assert_eq!(pipeline.thumbnail.level, 1);
    assert_eq!(pipeline.workers, std::cmp::min(2, num_cpus::get()));

    let package = pipeline.run(&mut StdRng::seed_from_u64(1)).unwrap();
    // 1x1 tiles at level 0, one row of two tiles at level 1 named like
    // gdal_retile's 1_1_1.png and 1_1_2.png
    assert_eq!(package.tile_count, 3);
    assert_eq!(
        package.entries,
        vec![
            "Small.tif.ref",
            "thumb.png",
            "tiles/0x0x0.png",
            "tiles/1x0x0.png",
            "tiles/1x0x1.png",
        ]
    );
    let mut archive = zip::ZipArchive::new(File::open(&package.path).unwrap()).unwrap();
    let mut right = Vec::new();
    archive
        .by_name("tiles/1x0x1.png")
        .unwrap()
        .read_to_end(&mut right)
        .unwrap();
    let right = image::load_from_memory(&right).unwrap();
    assert_eq!((right.width(), right.height()), (256, 256));
}

#[test]
fn test_extraction_failure() {
    let ws = Workspace::new();
    let config = ws.config(LAMB93_LEVELS);
    let extractor = FakeExtractor {
        fail_dataset: Some("SC100_TIF_LZW_LAMB93/index.vrt".to_string()),
        ..Default::default()
    };
    let pipeline = pipeline(&config, extractor, FakeRetiler::default());
    match pipeline.execute(&mut StdRng::seed_from_u64(1)) {
        Outcome::Failed(Error::Extraction { level, reason }) => {
            assert_eq!(level, 0);
            assert!(reason.contains("No such file or directory"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(!pipeline.output().exists());
    assert!(ws.scratch_is_empty());
}

#[test]
fn test_worker_panic() {
    let ws = Workspace::new();
    let config = ws.config(SMALL_MAP);
    let extractor = FakeExtractor {
        panic_dataset: Some("fine.vrt".to_string()),
        ..Default::default()
    };
    let pipeline = pipeline(&config, extractor, FakeRetiler::default());
    let err = pipeline.run(&mut StdRng::seed_from_u64(1)).err().unwrap();
    assert_eq!(err.stage(), "render");
    match err {
        Error::Extraction { level, reason } => {
            assert_eq!(level, 1);
            assert!(reason.starts_with("level worker failed"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!pipeline.output().exists());
    assert!(ws.scratch_is_empty());
}

#[test]
fn test_tiling_failure() {
    let ws = Workspace::new();
    let config = ws.config(SMALL_MAP);
    let retiler = FakeRetiler {
        drop_last: true,
        ..Default::default()
    };
    let pipeline = pipeline(&config, FakeExtractor::default(), retiler);
    let err = pipeline.run(&mut StdRng::seed_from_u64(1)).err().unwrap();
    assert_eq!(err.stage(), "tile");
    assert!(!pipeline.output().exists());
    assert!(ws.scratch_is_empty());
}

#[test]
fn test_degenerate_level() {
    let ws = Workspace::new();
    let mut config = ws.config(SMALL_MAP);
    config.map.bbox.ymax = 4.0;
    let extractor = Arc::new(FakeExtractor::default());
    let pipeline =
        Pipeline::from_config(&config, extractor.clone(), Arc::new(FakeRetiler::default()))
            .unwrap();
    match pipeline.run(&mut StdRng::seed_from_u64(1)) {
        Err(Error::Extraction { level, .. }) => assert_eq!(level, 0),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_georeference_failure() {
    let ws = Workspace::new();
    let config = ws.config(SMALL_MAP);
    fs::remove_file(ws.path().join("lamb93.ref")).unwrap();
    let pipeline = pipeline(&config, FakeExtractor::default(), FakeRetiler::default());
    match pipeline.execute(&mut StdRng::seed_from_u64(1)) {
        Outcome::Failed(err) => assert_eq!(err.stage(), "georeference"),
        Outcome::Completed(package) => panic!("unexpected package {:?}", package),
    }
    assert!(ws.scratch_is_empty());
}

#[test]
fn test_calibration_mismatch_before_rendering() {
    let ws = Workspace::new();
    // 256 px wide at scale 2.5, but 214 px at the reference resolution
    // resample to 257 px, one tile more than rendered
    let mut config = ws.config(
        r#"
[map]
name = "Narrow"
bbox = { xmin = 0.0, xmax = 641.5, ymin = 0.0, ymax = 256.0 }

[georeference]
template = "{{template}}"
resolution = 3.0

[[level]]
index = 0
scale = 2.5
dataset = "fine.vrt"
"#,
    );
    config.pipeline.workers = Some(1);
    let extractor = Arc::new(FakeExtractor::default());
    let pipeline =
        Pipeline::from_config(&config, extractor.clone(), Arc::new(FakeRetiler::default()))
            .unwrap();
    let err = pipeline.plan().err().unwrap();
    assert_eq!(err.stage(), "georeference");
    assert!(err.to_string().contains("gives 2x1 tiles at level 0, found 1x1"));

    let err = pipeline.run(&mut StdRng::seed_from_u64(1)).err().unwrap();
    assert_eq!(err.stage(), "georeference");
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert!(ws.scratch_is_empty());
}

#[test]
fn test_config_errors() {
    let ws = Workspace::new();
    let config = ws.config(SMALL_MAP);
    let build = |config: &ApplicationCfg| {
        Pipeline::from_config(
            config,
            Arc::new(FakeExtractor::default()),
            Arc::new(FakeRetiler::default()),
        )
        .err()
    };

    let mut bad = config.clone();
    bad.pipeline.workers = Some(0);
    assert_eq!(
        build(&bad),
        Some("Number of workers must be positive".to_string())
    );

    let mut bad = config.clone();
    bad.levels[1].scale = 20.0;
    assert_eq!(
        build(&bad),
        Some("Level 1 (scale 20) must be finer than level 0 (scale 10)".to_string())
    );

    let mut bad = config.clone();
    bad.thumbnail.level = Some(5);
    assert!(build(&bad).is_some());

    let mut bad = config.clone();
    bad.tiles.size = 0;
    assert!(build(&bad).is_some());

    let mut bad = config.clone();
    bad.map.bbox.xmax = -1.0;
    assert!(build(&bad).unwrap().starts_with("Invalid bbox"));
}

#[test]
fn test_gen_config() {
    let config = Pipeline::gen_config();
    assert!(config.starts_with("# pdfmap configuration"));
    assert!(config.contains("[map]"));
    assert!(config.contains("[georeference]"));
    assert!(config.contains("[thumbnail]"));
    assert!(config.contains("[pipeline]"));
    assert!(config.contains("[[level]]"));
}
