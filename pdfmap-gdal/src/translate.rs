//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::command::run;
use pdfmap_core::core::{ApplicationCfg, Config};
use pdfmap_core::raster::{CollaboratorError, ExtractRequest, RasterExtractor};

/// Windowed extraction with `gdal_translate`
#[derive(Clone, Debug)]
pub struct GdalTranslate {
    pub program: String,
    /// Create *.aux.xml sidecar files
    pub pam_enabled: bool,
    /// PNG ZLEVEL
    pub compression: u8,
}

impl GdalTranslate {
    pub fn args(&self, request: &ExtractRequest) -> Vec<String> {
        let window = &request.window;
        let resolution = request.resolution.to_string();
        vec![
            "-of".to_string(),
            "PNG".to_string(),
            "-co".to_string(),
            format!("ZLEVEL={}", self.compression),
            "-projwin".to_string(),
            window.minx.to_string(),
            window.maxy.to_string(),
            window.maxx.to_string(),
            window.miny.to_string(),
            "-tr".to_string(),
            resolution.clone(),
            resolution,
            "-r".to_string(),
            request.method.to_string(),
            request.dataset.to_string_lossy().to_string(),
            request.output.to_string_lossy().to_string(),
        ]
    }
}

impl RasterExtractor for GdalTranslate {
    fn info(&self) -> String {
        format!("Raster extraction: {}", self.program)
    }
    fn extract(&self, request: &ExtractRequest) -> Result<(), CollaboratorError> {
        let pam = pam_setting(self.pam_enabled);
        run(
            &self.program,
            &self.args(request),
            &[("GDAL_PAM_ENABLED", pam)],
        )
    }
}

pub(crate) fn pam_setting(enabled: bool) -> &'static str {
    if enabled {
        "YES"
    } else {
        "NO"
    }
}

impl<'a> Config<'a, ApplicationCfg> for GdalTranslate {
    fn from_config(config: &ApplicationCfg) -> Result<Self, String> {
        let cfg = &config.gdal;
        if cfg.compression > 9 {
            return Err(format!("Invalid PNG compression level {}", cfg.compression));
        }
        Ok(GdalTranslate {
            program: cfg.translate.clone(),
            pam_enabled: cfg.pam_enabled,
            compression: cfg.compression,
        })
    }
    fn gen_config() -> String {
        let toml = r#"
[gdal]
translate = "gdal_translate"
retile = "gdal_retile.py"
# Create *.aux.xml metadata files
pam_enabled = false
# PNG compression of the intermediate level rasters
compression = 1
"#;
        toml.to_string()
    }
}
