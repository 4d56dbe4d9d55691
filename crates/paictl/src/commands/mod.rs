//! Command implementations

pub mod dataset;
pub mod image;
pub mod job;
pub mod model;
pub mod pipeline;
pub mod profile;
pub mod run;
pub mod service;
pub mod workspace;

use std::fs;
use std::path::Path;

use colored::Colorize;
use pai_core::{ProgressCallback, ProgressEvent};

use crate::error::{PaictlError, Result};

/// Read a user-supplied input file
pub(crate) fn read_input_file(path: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| PaictlError::FileError {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// True for files named `*.yaml` or `*.yml`
pub(crate) fn is_yaml_path(path: &str) -> bool {
    matches!(
        Path::new(path).extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Progress lines on stderr, so stdout stays machine-readable
pub(crate) fn progress_printer() -> ProgressCallback {
    Box::new(|event| match event {
        ProgressEvent::Started { resource, target } => {
            eprintln!("Waiting for {} to reach {}", resource, target.bold());
        }
        ProgressEvent::Polling {
            resource,
            status,
            elapsed,
        } => {
            eprintln!(
                "  {} {} ({}s)",
                resource,
                status.cyan(),
                elapsed.as_secs()
            );
        }
        ProgressEvent::Completed { resource, status } => {
            eprintln!("{} {} is {}", "✓".green(), resource, status);
        }
        ProgressEvent::Failed { resource, error } => {
            eprintln!("{} {}: {}", "✗".red(), resource, error);
        }
    })
}

/// Confirmation line for mutating commands, skipped for JSON/YAML output
pub(crate) fn print_done(output: crate::output::OutputFormat, message: &str) {
    if output.is_table() {
        println!("{} {}", "✓".green(), message);
    }
}
