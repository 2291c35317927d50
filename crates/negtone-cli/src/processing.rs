//! Turning parsed arguments into a conversion.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use negtone_core::{convert_file, load_pipeline_config, PipelineConfig, ToneParameters, ToneReport};

use crate::args::Cli;
use crate::parsers::{parse_sigmoidal, parse_white_balance};

/// Input path: `--input` wins over the positional argument.
pub fn resolve_input(cli: &Cli) -> Result<PathBuf> {
    match cli.input.as_ref().or(cli.input_pos.as_ref()) {
        Some(path) => Ok(path.clone()),
        None => bail!("No input image given (use INPUT or --input)"),
    }
}

/// Output path: `--output`, then the positional argument, then
/// `<input-stem>_positive.png` next to the input.
pub fn determine_output_path(input: &Path, cli: &Cli) -> Result<PathBuf> {
    if let Some(out) = cli.output.as_ref().or(cli.output_pos.as_ref()) {
        return Ok(out.clone());
    }

    let filename = input
        .file_stem()
        .context("Invalid input filename")?
        .to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    Ok(parent.join(format!("{}_positive.png", filename)))
}

/// Apply command-line overrides on top of the loaded tone parameters.
pub fn apply_overrides(cli: &Cli, tone: &mut ToneParameters) -> Result<()> {
    if cli.negate {
        tone.negate = true;
    }
    if cli.keep_color {
        tone.keep_color = true;
    }

    let overrides = [
        (cli.target, &mut tone.target_luma),
        (cli.gamma, &mut tone.gamma),
        (cli.level_max, &mut tone.level_max),
        (cli.level_gamma, &mut tone.level_gamma),
        (cli.contrast_threshold, &mut tone.contrast_threshold),
        (cli.saturation, &mut tone.saturation),
        (cli.hue, &mut tone.hue),
        (cli.evaluate, &mut tone.evaluate_factor),
        (cli.sharpen_sigma, &mut tone.sharpen_sigma),
    ];
    for (value, field) in overrides {
        if let Some(value) = value {
            *field = value;
        }
    }

    if let Some(wb) = &cli.white_balance {
        tone.white_balance = parse_white_balance(wb).map_err(anyhow::Error::msg)?;
    }
    if let Some(sigmoidal) = &cli.sigmoidal {
        let (strength, midpoint) = parse_sigmoidal(sigmoidal).map_err(anyhow::Error::msg)?;
        tone.sigmoidal_strength = strength;
        if let Some(midpoint) = midpoint {
            tone.sigmoidal_midpoint = midpoint;
        }
    }
    Ok(())
}

/// Load configuration, apply overrides and validate once.
pub fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let handle = load_pipeline_config(cli.config.as_deref())?;
    handle.log_usage();

    let mut config = handle.config;
    apply_overrides(cli, &mut config.tone)?;
    config.validate()?;
    Ok(config)
}

/// Run one conversion for `cli` and write the optional JSON report.
pub fn run(cli: &Cli) -> Result<ToneReport> {
    let input = resolve_input(cli)?;
    let output = determine_output_path(&input, cli)?;
    let config = build_config(cli)?;

    let report = convert_file(&input, &output, &config)?;

    if let Some(report_path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(report_path, json)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
    }

    Ok(report)
}
