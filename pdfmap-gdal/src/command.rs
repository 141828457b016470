//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use pdfmap_core::raster::CollaboratorError;
use std::process::Command;

/// Run a GDAL utility to completion.
///
/// Environment variables are set on the child process only.
pub(crate) fn run(
    program: &str,
    args: &[String],
    env: &[(&str, &str)],
) -> Result<(), CollaboratorError> {
    debug!("{} {}", program, args.join(" "));
    let mut cmd = Command::new(program);
    cmd.args(args);
    for (key, value) in env {
        cmd.env(key, value);
    }
    let output = cmd.output().map_err(|e| CollaboratorError::Spawn {
        program: program.to_string(),
        source: e,
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let diagnostics = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        return Err(CollaboratorError::Status {
            program: program.to_string(),
            status: output.status.to_string(),
            diagnostics,
        });
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        // GDAL reports warnings on stderr with exit status 0
        warn!("{}: {}", program, stderr.trim());
    }
    Ok(())
}
