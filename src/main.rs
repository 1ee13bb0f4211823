mod audio;
mod cli;
mod config;
mod encode;
mod error;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use config::LevelsConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Defaults, then config file, then command line
    let mut config = LevelsConfig::default();
    if let Some(ref path) = cli.config {
        let file = config::load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        config.apply_file(file);
    } else if let Some(path) = config::discover_config() {
        match config::load_config(&path) {
            Ok(file) => {
                log::info!("Loaded config from {}", path.display());
                config.apply_file(file);
            }
            Err(err) => log::warn!("Ignoring config {}: {}", path.display(), err),
        }
    }
    cli.apply(&mut config);

    let input = cli.input_path(&config);
    let output = cli.output_path(&config);

    log::info!("lualevels - per-band level tables for Lua");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", output.display());
    log::info!(
        "Bands: {}, FFT size {}, hop {}, range [{}, {}]",
        config.bands.len(),
        config.transform_size,
        config.hop_size,
        config.scale_min,
        config.scale_max
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let report = pipeline::run(&config, &input, &output, &pb)
        .with_context(|| format!("Failed to generate levels for {}", input.display()))?;

    log::info!(
        "Done! {} frames from {} samples @ {}Hz -> {}",
        report.frame_count,
        report.num_samples,
        report.sample_rate,
        report.output_path.display()
    );
    Ok(())
}
