//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use clap::{App, AppSettings, ArgMatches, SubCommand};
use dotenv::dotenv;
use env_logger::Builder;
use log::Record;
use pdfmap_core::core::config::BboxCfg;
use pdfmap_core::core::{read_config, ApplicationCfg, Config};
use pdfmap_gdal::{GdalRetile, GdalTranslate};
use pdfmap_service::{Outcome, Pipeline};
use std::env;
use std::fmt;
use std::io::Write;
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use time;

fn init_logger(args: &ArgMatches<'_>) {
    let mut builder = Builder::new();
    builder.format(|buf, record: &Record<'_>| {
        let t = time::now();
        writeln!(
            buf,
            "{}.{:03} {} {}",
            time::strftime("%Y-%m-%d %H:%M:%S", &t)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            t.tm_nsec / 1000_000,
            record.level(),
            record.args()
        )
    });

    let rust_log = match (args.value_of("loglevel"), env::var("RUST_LOG")) {
        (None, Ok(rust_log)) => rust_log,
        (loglevel, _) => match loglevel.unwrap_or("info") {
            "debug" => "debug,tokio=info".to_string(),
            loglevel => loglevel.to_string(),
        },
    };
    builder.parse_filters(&rust_log);

    builder.init();
}

fn parse_arg<T: FromStr>(
    args: &ArgMatches<'_>,
    name: &str,
    kind: &str,
) -> Result<Option<T>, String> {
    match args.value_of(name) {
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Error parsing '{}' as {}", name, kind)),
        None => Ok(None),
    }
}

fn parse_bbox(numlist: &str) -> Result<BboxCfg, String> {
    let arr = numlist
        .split(",")
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|_| "Error parsing 'bbox' as list of float values".to_string())?;
    if arr.len() != 4 {
        return Err("'bbox' expects xmin,xmax,ymin,ymax".to_string());
    }
    Ok(BboxCfg {
        xmin: arr[0],
        xmax: arr[1],
        ymin: arr[2],
        ymax: arr[3],
    })
}

/// Read the config file and apply command line overrides
fn config_from_args(args: &ArgMatches<'_>) -> Result<ApplicationCfg, String> {
    let path = args.value_of("config").unwrap_or("pdfmap.toml");
    info!("Reading configuration from '{}'", path);
    let mut config: ApplicationCfg = read_config(path)?;
    if let Some(bbox) = args.value_of("bbox") {
        config.map.bbox = parse_bbox(bbox)?;
    }
    if let Some(output) = args.value_of("output") {
        config.map.output = Some(output.to_string());
    }
    if let Some(workers) = parse_arg::<usize>(args, "workers", "integer value")? {
        config.pipeline.workers = Some(workers);
    }
    Ok(config)
}

fn pipeline_from_args(args: &ArgMatches<'_>) -> Result<Pipeline, String> {
    let config = config_from_args(args)?;
    let extractor = GdalTranslate::from_config(&config)?;
    let retiler = GdalRetile::from_config(&config)?;
    let mut pipeline = Pipeline::from_config(&config, Arc::new(extractor), Arc::new(retiler))?;
    pipeline.progress = parse_arg::<bool>(args, "progress", "boolean value")?.unwrap_or(true);
    Ok(pipeline)
}

fn stage_failure(stage: &str, reason: &dyn fmt::Display) -> String {
    format!("{} stage failed: {}", stage, reason)
}

fn exit_with(msg: &str) -> ! {
    error!("{}", msg);
    process::exit(1)
}

fn configured_pipeline(args: &ArgMatches<'_>) -> Pipeline {
    pipeline_from_args(args).unwrap_or_else(|e| exit_with(&stage_failure("configuration", &e)))
}

fn generate(args: &ArgMatches<'_>) {
    let pipeline = configured_pipeline(args);
    info!(
        "Generating map '{}' with {} levels",
        pipeline.request.name,
        pipeline.levels.len()
    );
    match pipeline.execute(&mut rand::rng()) {
        Outcome::Completed(package) => {
            info!(
                "Map package {} written ({} tiles)",
                package.path.display(),
                package.tile_count
            );
        }
        Outcome::Failed(e) => exit_with(&stage_failure(e.stage(), &e)),
    }
}

fn plan(args: &ArgMatches<'_>) {
    let pipeline = configured_pipeline(args);
    match pipeline.plan() {
        Ok(plan) => println!("{}", plan),
        Err(e) => exit_with(&stage_failure(e.stage(), &e)),
    }
}

fn gen_config() -> String {
    let mut config = Pipeline::gen_config();
    config.push_str(&GdalRetile::gen_config());
    config.push_str(&GdalTranslate::gen_config());
    config
}

fn main() {
    dotenv().ok();
    let mut app = App::new("pdfmap")
        .version(crate_version!())
        .author("Pirmin Kalberer <pka@sourcepole.ch>")
        .about("Renders raster map levels into a tiled, georeferenced offline map package")
        .subcommand(SubCommand::with_name("generate")
                        .setting(AppSettings::AllowLeadingHyphen)
                        .args_from_usage("-c, --config=<FILE> 'Load from custom config file'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'
                                              --bbox=[xmin,xmax,ymin,ymax] 'Extent of the map'
                                              --output=[FILE] 'Map package path'
                                              --workers=[NUM] 'Number of levels rendered in parallel'
                                              --progress=[true|false] 'Show progress bar'")
                        .about("Generate map package"))
        .subcommand(SubCommand::with_name("plan")
                        .setting(AppSettings::AllowLeadingHyphen)
                        .args_from_usage("-c, --config=<FILE> 'Load from custom config file'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'
                                              --bbox=[xmin,xmax,ymin,ymax] 'Extent of the map'
                                              --output=[FILE] 'Map package path'
                                              --workers=[NUM] 'Number of levels rendered in parallel'")
                        .about("Show levels, tiles and calibration without rendering"))
        .subcommand(SubCommand::with_name("genconfig")
                        .args_from_usage("--loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'")
                        .about("Generate configuration template"));

    match app.get_matches_from_safe_borrow(env::args()) {
        //app.get_matches() prohibits later call of app.print_help()
        // Help and version exit with 0, usage errors with 1
        Result::Err(e) => e.exit(),
        Result::Ok(matches) => match matches.subcommand() {
            ("generate", Some(sub_m)) => {
                init_logger(sub_m);
                generate(sub_m);
            }
            ("plan", Some(sub_m)) => {
                init_logger(sub_m);
                plan(sub_m);
            }
            ("genconfig", Some(sub_m)) => {
                init_logger(sub_m);
                println!("{}", gen_config());
            }
            _ => {
                let _ = app.print_help();
                println!("");
            }
        },
    }
}
