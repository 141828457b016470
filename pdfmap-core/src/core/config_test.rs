//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::{ApplicationCfg, BboxCfg, DEFAULT_CONFIG};
use crate::core::request::Resampling;
use crate::core::{parse_config, read_config};

#[test]
fn test_load_config() {
    let config = read_config("src/test/example.toml");
    println!("{:#?}", config);
    let config: ApplicationCfg = config.expect("load_config returned Err");
    assert_eq!(config.map.name, "TestMap");
    assert_eq!(
        config.map.bbox,
        BboxCfg {
            xmin: 500000.0,
            xmax: 520000.0,
            ymin: 6500000.0,
            ymax: 6520000.0,
        }
    );
    assert_eq!(config.map.output, Some("out/TestMap.zip".to_string()));
    assert_eq!(config.tiles.size, 256);
    assert_eq!(config.georeference.resolution, Some(5.0));
    assert_eq!(config.thumbnail.level, Some(2));
    assert_eq!(config.thumbnail.size, 128);
    assert_eq!(config.gdal.translate, "gdal_translate");
    assert!(!config.gdal.pam_enabled);
    assert_eq!(config.pipeline.workers, Some(3));
    assert_eq!(config.levels.len(), 3);
    assert_eq!(config.levels[0].index, 2);
    assert_eq!(config.levels[0].method, Resampling::Nearest);
    assert_eq!(config.levels[1].method, Resampling::Lanczos);
    assert_eq!(config.levels[2].scale, 10.0);
}

#[test]
fn test_defaults() {
    let config: ApplicationCfg = parse_config(DEFAULT_CONFIG.to_string(), "").unwrap();
    assert_eq!(config.map.data_dir, ".");
    assert_eq!(config.map.output, None);
    assert_eq!(config.tiles.size, 256);
    assert_eq!(config.tiles.compression, 9);
    assert_eq!(config.georeference.resolution, None);
    assert_eq!(config.thumbnail.level, None);
    assert_eq!(config.thumbnail.size, 128);
    assert_eq!(config.gdal.retile, "gdal_retile.py");
    assert_eq!(config.gdal.compression, 1);
    assert_eq!(config.pipeline.workers, None);
    assert_eq!(config.levels[0].method, Resampling::Nearest);
}

#[test]
fn test_parse_error() {
    let config: Result<ApplicationCfg, _> = read_config("src/core/mod.rs");
    let err = config.err().unwrap();
    assert!(err.starts_with("src/core/mod.rs - unexpected character found: `/` at line 1"));

    let config: Result<ApplicationCfg, _> = read_config("wrongfile");
    assert_eq!("Could not find config file!", config.err().unwrap());
}

#[test]
fn test_enum_errors() {
    let toml = r#"
        [map]
        name = "m"
        bbox = { xmin = 0.0, xmax = 1.0, ymin = 0.0, ymax = 1.0 }

        [georeference]
        template = "lamb93.ref"

        [[level]]
        index = 0
        scale = 1.0
        dataset = "index.vrt"
        method = "sharpen"
        "#;
    let config: Result<ApplicationCfg, _> = parse_config(toml.to_string(), "");
    assert!(config
        .err()
        .unwrap()
        .contains("Unexpected enum value 'sharpen'"));
}

#[test]
fn test_env_template() {
    use std::env;

    env::set_var("PDFMAP_TEST_DATA", "/srv/scan");
    let toml = DEFAULT_CONFIG.replace(
        r#"data_dir = ".""#,
        r#"data_dir = "{{env.PDFMAP_TEST_DATA}}""#,
    );
    let config: ApplicationCfg = parse_config(toml, "").unwrap();
    assert_eq!(config.map.data_dir, "/srv/scan");

    let toml = DEFAULT_CONFIG.replace(r#"data_dir = ".""#, r#"data_dir = "${HOME}""#);
    let config: Result<ApplicationCfg, _> = parse_config(toml, "");
    assert_eq!(
        config.err(),
        Some("Replace old environment variable syntax ${VARNAME} with `{{env.VARNAME}}`".to_string())
    );
}
