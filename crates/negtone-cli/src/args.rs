//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "negtone")]
#[command(version, about = "Adaptive negative to positive converter", long_about = None)]
pub struct Cli {
    /// Input image (raw capture, PNG or TIFF)
    #[arg(value_name = "INPUT")]
    pub input_pos: Option<PathBuf>,

    /// Output image (PNG or TIFF)
    #[arg(value_name = "OUTPUT")]
    pub output_pos: Option<PathBuf>,

    /// Input image; takes precedence over the positional INPUT
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output image; defaults to <input-stem>_positive.png next to the input
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Invert the image (negative to positive)
    #[arg(short, long)]
    pub negate: bool,

    /// Keep colour instead of converting to grayscale
    #[arg(short = 'c', long = "color")]
    pub keep_color: bool,

    /// Target mean luma for fine adjustment (0.0-1.0)
    #[arg(short, long, value_name = "FLOAT")]
    pub target: Option<f64>,

    /// Fine adjustment gamma
    #[arg(short, long, value_name = "FLOAT")]
    pub gamma: Option<f64>,

    /// White point of the fine-adjust level remap (0.0-1.0)
    #[arg(short, long, value_name = "FLOAT")]
    pub level_max: Option<f64>,

    /// Gamma of the fine-adjust level remap
    #[arg(short = 'k', long, value_name = "FLOAT")]
    pub level_gamma: Option<f64>,

    /// Luma standard deviation above which an image counts as high contrast
    #[arg(long, value_name = "FLOAT")]
    pub contrast_threshold: Option<f64>,

    /// White balance multipliers (comma-separated: R,G,B)
    #[arg(long, value_name = "R,G,B")]
    pub white_balance: Option<String>,

    /// Sigmoidal contrast strength and optional midpoint
    #[arg(long, value_name = "STRENGTH[,MIDPOINT]")]
    pub sigmoidal: Option<String>,

    /// Saturation in percent (100 = unchanged)
    #[arg(long, value_name = "PERCENT")]
    pub saturation: Option<f64>,

    /// Hue in percent (100 = unchanged)
    #[arg(long, value_name = "PERCENT")]
    pub hue: Option<f64>,

    /// Multiplier applied before normalisation
    #[arg(long, value_name = "FLOAT")]
    pub evaluate: Option<f64>,

    /// Sharpen Gaussian sigma (0 disables sharpening)
    #[arg(long, value_name = "FLOAT")]
    pub sharpen_sigma: Option<f64>,

    /// Configuration file (YAML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the tone report as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Log measurements and decisions
    #[arg(short, long)]
    pub verbose: bool,
}
