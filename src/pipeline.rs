use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

use crate::audio::bands::analyze_bands;
use crate::audio::decode::{decode_audio, AudioData};
use crate::audio::scale::scale_grid;
use crate::audio::stft::FftStft;
use crate::config::LevelsConfig;
use crate::encode::script::{render_script, write_script};
use crate::encode::table::{LuaFormatter, LuaTable};
use crate::error::Result;

/// Lua module text for one waveform, before anything touches the disk.
#[derive(Debug)]
pub struct RenderedScript {
    pub script: String,
    pub frame_count: usize,
    pub min_samples: usize,
}

#[derive(Debug)]
pub struct RunReport {
    pub sample_rate: u32,
    pub num_samples: usize,
    pub frame_count: usize,
    pub min_samples: usize,
    pub output_path: PathBuf,
}

/// Analyze, scale and format `audio` without doing any I/O.
pub fn build_script(
    config: &LevelsConfig,
    audio: &AudioData,
    progress: &ProgressBar,
) -> Result<RenderedScript> {
    let stft = FftStft::new(config.transform_size, config.hop_size);
    let grid = analyze_bands(
        &audio.samples,
        audio.sample_rate,
        &config.bands,
        &stft,
        progress,
    );
    let scaled = scale_grid(&grid, config.scale_min, config.scale_max)?;

    let table = LuaTable::from_scaled(&config.table_name, &scaled);
    let formatter = LuaFormatter {
        decimal_places: config.decimal_places,
        values_per_line: config.values_per_line,
    };
    let table_text = formatter.format_table(&table);

    Ok(RenderedScript {
        script: render_script(&table_text, &config.table_name),
        frame_count: scaled.num_frames(),
        min_samples: table.min_samples(),
    })
}

/// Load `input`, build the level table and write it to `output`.
/// Nothing is written unless every earlier stage succeeded.
pub fn run(
    config: &LevelsConfig,
    input: &Path,
    output: &Path,
    progress: &ProgressBar,
) -> Result<RunReport> {
    config.validate()?;

    let audio = decode_audio(input)?;
    let rendered = build_script(config, &audio, progress)?;
    write_script(output, &rendered.script)?;

    log::info!(
        "{} bands x {} frames (minSamples={})",
        config.bands.len(),
        rendered.frame_count,
        rendered.min_samples
    );

    Ok(RunReport {
        sample_rate: audio.sample_rate,
        num_samples: audio.samples.len(),
        frame_count: rendered.frame_count,
        min_samples: rendered.min_samples,
        output_path: output.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::bands::Band;
    use crate::error::LevelsError;
    use std::f32::consts::PI;

    const SR: u32 = 44100;

    fn tone(freq: f32, seconds: f32) -> Vec<f32> {
        (0..(SR as f32 * seconds) as usize)
            .map(|i| 0.8 * (2.0 * PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn write_wav(path: &Path, samples: &[f32]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SR,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn level_values(script: &str, level: usize) -> Vec<i64> {
        let key = format!("\tLevel{} = {{\n", level);
        let start = script.find(&key).unwrap() + key.len();
        let end = start + script[start..].find("\t},").unwrap();
        script[start..end]
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.parse().unwrap())
            .collect()
    }

    #[test]
    fn single_band_tone_dominates() {
        let config = LevelsConfig::default();
        // 1 kHz sits in the 500-2000 Hz band (Level4)
        let audio = AudioData {
            samples: tone(1000.0, 3.0),
            sample_rate: SR,
        };
        let rendered = build_script(&config, &audio, &ProgressBar::hidden()).unwrap();

        let expected_frames = (audio.samples.len() - 2048) / 4800 + 1;
        assert_eq!(rendered.frame_count, expected_frames);
        assert_eq!(rendered.min_samples, expected_frames);

        for level in 1..=7 {
            let values = level_values(&rendered.script, level);
            assert_eq!(values.len(), expected_frames);
            if level == 4 {
                assert!(values.iter().all(|&v| v >= 28), "Level4 {:?}", values);
            } else {
                assert!(values.iter().all(|&v| v <= 20), "Level{} {:?}", level, values);
            }
        }
        let all: Vec<i64> = (1..=7).flat_map(|l| level_values(&rendered.script, l)).collect();
        assert_eq!(all.iter().min(), Some(&0));
        assert_eq!(all.iter().max(), Some(&32));
    }

    #[test]
    fn band_above_nyquist_is_all_minimum() {
        let config = LevelsConfig {
            bands: vec![Band::new(100.0, 1000.0), Band::new(30000.0, 40000.0)],
            ..Default::default()
        };
        let audio = AudioData {
            samples: tone(440.0, 1.0),
            sample_rate: SR,
        };
        let rendered = build_script(&config, &audio, &ProgressBar::hidden()).unwrap();
        assert!(level_values(&rendered.script, 2).iter().all(|&v| v == 0));
        assert!(level_values(&rendered.script, 1).iter().all(|&v| v > 0));
    }

    #[test]
    fn silence_is_rejected() {
        let audio = AudioData {
            samples: vec![0.0; SR as usize],
            sample_rate: SR,
        };
        let err = build_script(&LevelsConfig::default(), &audio, &ProgressBar::hidden())
            .unwrap_err();
        assert!(matches!(err, LevelsError::InvalidInput(_)));
    }

    #[test]
    fn too_short_input_is_rejected() {
        let audio = AudioData {
            samples: tone(440.0, 0.01),
            sample_rate: SR,
        };
        let err = build_script(&LevelsConfig::default(), &audio, &ProgressBar::hidden())
            .unwrap_err();
        assert!(matches!(err, LevelsError::InvalidInput(_)));
    }

    #[test]
    fn run_writes_deterministic_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.wav");
        let mut samples = tone(100.0, 1.0);
        samples.extend(tone(3000.0, 1.0));
        write_wav(&input, &samples);

        let config = LevelsConfig {
            song_name: "song".into(),
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let output = config.output_path();

        let report = run(&config, &input, &output, &ProgressBar::hidden()).unwrap();
        assert_eq!(report.sample_rate, SR);
        assert_eq!(report.num_samples, samples.len());
        assert_eq!(report.frame_count, (samples.len() - 2048) / 4800 + 1);
        assert_eq!(report.min_samples, report.frame_count);
        assert!(output.ends_with("song_data.lua"));

        let first = std::fs::read(&output).unwrap();
        run(&config, &input, &output, &ProgressBar::hidden()).unwrap();
        let second = std::fs::read(&output).unwrap();
        assert_eq!(first, second);

        let text = String::from_utf8(first).unwrap();
        assert!(text.starts_with("\ntblSong = {\n\tLevel1 = {\n"));
        assert!(text.contains("\tLevel7 = {\n"));
        assert!(!text.contains("NaN") && !text.contains("inf"));
    }

    #[test]
    fn failed_load_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ghost_data.lua");
        let err = run(
            &LevelsConfig::default(),
            &dir.path().join("ghost.ogg"),
            &output,
            &ProgressBar::hidden(),
        )
        .unwrap_err();
        assert!(matches!(err, LevelsError::Load { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn silent_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("quiet.wav");
        write_wav(&input, &vec![0.0; SR as usize]);
        let output = dir.path().join("quiet_data.lua");

        let err = run(&LevelsConfig::default(), &input, &output, &ProgressBar::hidden())
            .unwrap_err();
        assert!(matches!(err, LevelsError::InvalidInput(_)));
        assert!(!output.exists());
    }
}
