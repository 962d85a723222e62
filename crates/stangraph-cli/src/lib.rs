//! stangraph CLI library
//!
//! This module contains the core CLI logic for the stangraph tool: load the
//! configuration and optional label file, parse the model, squish the
//! requested variables, render, and write one file per output format.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, path::PathBuf};

use log::{debug, info};

use stangraph::{GraphBuilder, StangraphError, config::OutputFormat, labels::LabelMapping};

/// Run the stangraph CLI application
///
/// Processes the input model through the stangraph pipeline and writes
/// `<output>.<ext>` for every requested format.
///
/// # Errors
///
/// Returns `StangraphError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed label files
/// - Parsing errors
/// - Unknown squish targets
/// - Dependency cycles
/// - Export errors
pub fn run(args: &Args) -> Result<(), StangraphError> {
    info!(
        input_path = args.input,
        output_base = args.output;
        "Processing model"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let formats = if args.format.is_empty() {
        app_config.render().formats()
    } else {
        args.format.clone()
    };

    let labels = args.labels.as_deref().map(load_labels).transpose()?;

    let builder = GraphBuilder::new(app_config);
    let graph = builder.parse_file(&args.input)?;
    let graph = builder.squish_all(&graph, args.squish.iter().map(String::as_str))?;
    let rendered = builder.render(&graph, labels.as_ref(), args.explicit)?;

    for format in dedup_formats(formats) {
        let bytes = builder.export(&rendered, format)?;
        let path = output_path(&args.output, format);
        fs::write(&path, bytes)?;
        info!(output_file = path.display().to_string(); "Graph written");
    }

    Ok(())
}

fn load_labels(path: &str) -> Result<LabelMapping, StangraphError> {
    info!(path; "Loading label file");
    let content = fs::read_to_string(path)?;
    let labels = LabelMapping::parse(&content)?;
    debug!(labels = labels.len(); "Labels loaded");
    Ok(labels)
}

/// Drops repeated formats, keeping the first occurrence.
fn dedup_formats(formats: Vec<OutputFormat>) -> Vec<OutputFormat> {
    let mut unique = Vec::with_capacity(formats.len());
    for format in formats {
        if !unique.contains(&format) {
            unique.push(format);
        }
    }
    unique
}

fn output_path(base: &str, format: OutputFormat) -> PathBuf {
    PathBuf::from(format!("{base}.{}", format.extension()))
}
