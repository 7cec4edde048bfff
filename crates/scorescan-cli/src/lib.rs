//! CLI logic for the Scorescan tool.
//!
//! `scorescan grid` retrieves the staves of a sheet image and writes them as
//! JSON; `scorescan reduce` reduces the interpretation graphs of a JSON
//! document and writes the surviving interpretations.

pub mod error_adapter;

mod args;
mod config;
mod error;

pub use args::{Args, Command, ModeArg};
pub use error::{CliError, ConfigError};

use std::fs;

use log::info;

use scorescan::{SheetProcessor, config::AppConfig, document::SheetDocument, image::BinaryImage};

/// Run the Scorescan CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Image decoding errors
/// - Malformed JSON documents
/// - Processing errors
pub fn run(args: &Args) -> Result<(), CliError> {
    let app_config = config::load_config(args.config.as_ref())?;

    match &args.command {
        Command::Grid { input, output } => run_grid(app_config, input, output),
        Command::Reduce {
            input,
            output,
            mode,
        } => {
            let app_config = match mode {
                Some(mode) => {
                    let reducer = app_config.reducer().clone().with_mode((*mode).into());
                    app_config.with_reducer(reducer)
                }
                None => app_config,
            };
            run_reduce(app_config, input, output)
        }
    }
}

fn run_grid(config: AppConfig, input: &str, output: &str) -> Result<(), CliError> {
    info!(input_path = input, output_path = output; "Retrieving staves");

    let gray = image::open(input)?.to_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let threshold = config.grid().binarization_threshold();
    let binary = BinaryImage::from_gray(width, height, gray.as_raw(), threshold)
        .map_err(|err| scorescan::ScorescanError::Grid(err.into()))?;

    let processor = SheetProcessor::new(config);
    let layout = processor.retrieve_staves(&binary, None)?;

    fs::write(output, serde_json::to_string_pretty(&layout)?)?;

    info!(output_file = output, staves = layout.staves().len(); "Staves exported successfully");
    Ok(())
}

fn run_reduce(config: AppConfig, input: &str, output: &str) -> Result<(), CliError> {
    info!(input_path = input, output_path = output; "Reducing document");

    let content = fs::read_to_string(input)?;
    let document: SheetDocument = serde_json::from_str(&content)?;

    let processor = SheetProcessor::new(config);
    let reduced = processor.reduce_document(&document)?;

    fs::write(output, serde_json::to_string_pretty(&reduced)?)?;

    info!(output_file = output; "Document exported successfully");
    Ok(())
}
