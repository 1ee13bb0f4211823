use clap::Parser;
use std::path::PathBuf;

use crate::audio::bands::Band;
use crate::config::LevelsConfig;

#[derive(Parser, Debug)]
#[command(
    name = "lualevels",
    about = "Pre-compute per-band audio levels as a Lua data table"
)]
pub struct Cli {
    /// Song name: reads `<song>.<ext>` and writes `<song>_data.lua`
    pub song: Option<String>,

    /// Input audio file (overrides the path derived from the song name)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output Lua file (overrides the path derived from the song name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (default: ./lualevels.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input file extension used with the song name
    #[arg(long)]
    pub extension: Option<String>,

    /// Name of the Lua table holding the levels
    #[arg(long)]
    pub table_name: Option<String>,

    /// FFT size in samples
    #[arg(long)]
    pub transform_size: Option<usize>,

    /// Samples between the starts of successive frames
    #[arg(long)]
    pub hop_size: Option<usize>,

    /// Lowest output level
    #[arg(long, allow_negative_numbers = true)]
    pub scale_min: Option<f64>,

    /// Highest output level
    #[arg(long, allow_negative_numbers = true)]
    pub scale_max: Option<f64>,

    /// Decimal places kept in the output (0 = integers)
    #[arg(long)]
    pub decimal_places: Option<u32>,

    /// Values per line in each level array
    #[arg(long)]
    pub values_per_line: Option<usize>,

    /// Frequency band as LOW:HIGH in Hz; repeat to replace the default bands
    #[arg(long = "band", value_name = "LOW:HIGH", value_parser = parse_band)]
    pub bands: Vec<Band>,
}

impl Cli {
    /// Layer command-line values over `config`.
    pub fn apply(&self, config: &mut LevelsConfig) {
        if let Some(ref v) = self.song { config.song_name = v.clone(); }
        if let Some(ref v) = self.extension { config.input_extension = v.clone(); }
        if let Some(ref v) = self.table_name { config.table_name = v.clone(); }
        if let Some(v) = self.transform_size { config.transform_size = v; }
        if let Some(v) = self.hop_size { config.hop_size = v; }
        if let Some(v) = self.scale_min { config.scale_min = v; }
        if let Some(v) = self.scale_max { config.scale_max = v; }
        if let Some(v) = self.decimal_places { config.decimal_places = v; }
        if let Some(v) = self.values_per_line { config.values_per_line = v; }
        if !self.bands.is_empty() {
            config.bands = self.bands.clone();
        }
    }

    pub fn input_path(&self, config: &LevelsConfig) -> PathBuf {
        self.input.clone().unwrap_or_else(|| config.input_path())
    }

    pub fn output_path(&self, config: &LevelsConfig) -> PathBuf {
        self.output.clone().unwrap_or_else(|| config.output_path())
    }
}

fn parse_band(s: &str) -> Result<Band, String> {
    let (low, high) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LOW:HIGH, got '{}'", s))?;
    let low: f64 = low
        .trim()
        .parse()
        .map_err(|e| format!("bad low frequency '{}': {}", low, e))?;
    let high: f64 = high
        .trim()
        .parse()
        .map_err(|e| format!("bad high frequency '{}': {}", high, e))?;
    Ok(Band::new(low, high))
}
