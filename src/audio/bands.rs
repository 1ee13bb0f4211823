use indicatif::ProgressBar;
use serde::Deserialize;

use super::features::MagnitudeGrid;
use super::stft::MagnitudeStft;

/// A frequency band in Hz, `[low_hz, high_hz)`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "(f64, f64)")]
pub struct Band {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Band {
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }
}

impl From<(f64, f64)> for Band {
    fn from((low_hz, high_hz): (f64, f64)) -> Self {
        Self { low_hz, high_hz }
    }
}

/// Sub-bass, bass, low-mid, mid, upper-mid, presence, brilliance.
pub const DEFAULT_BANDS: [Band; 7] = [
    Band::new(16.0, 60.0),
    Band::new(60.0, 250.0),
    Band::new(250.0, 500.0),
    Band::new(500.0, 2000.0),
    Band::new(2000.0, 4000.0),
    Band::new(4000.0, 6000.0),
    Band::new(6000.0, 20000.0),
];

/// Bands resolved to STFT bin ranges for one sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct BandLayout {
    ranges: Vec<(usize, usize)>,
}

impl BandLayout {
    pub fn new(bands: &[Band], transform_size: usize, sample_rate: u32) -> Self {
        let num_bins = transform_size / 2 + 1;
        let ranges = bands
            .iter()
            .map(|band| {
                let start = hz_to_bin(band.low_hz, transform_size, sample_rate).min(num_bins);
                let end = hz_to_bin(band.high_hz, transform_size, sample_rate).min(num_bins);
                (start, end)
            })
            .collect();
        Self { ranges }
    }

    #[cfg(test)]
    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    pub fn empty_bands(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .filter(|(_, (start, end))| start >= end)
            .map(|(i, _)| i)
    }

    /// Mean magnitude of each band within one frame; an empty range is 0.
    pub fn average(&self, frame: &[f32]) -> Vec<f64> {
        self.ranges
            .iter()
            .map(|&(start, end)| {
                let end = end.min(frame.len());
                if start >= end {
                    return 0.0;
                }
                let sum: f64 = frame[start..end].iter().map(|&m| m as f64).sum();
                sum / (end - start) as f64
            })
            .collect()
    }
}

/// `floor(frequency * transform_size / sample_rate)`, never negative.
pub fn hz_to_bin(hz: f64, transform_size: usize, sample_rate: u32) -> usize {
    let bin = (hz * transform_size as f64 / sample_rate as f64).floor();
    if bin.is_finite() && bin > 0.0 {
        bin as usize
    } else {
        0
    }
}

pub fn analyze_bands(
    samples: &[f32],
    sample_rate: u32,
    bands: &[Band],
    stft: &dyn MagnitudeStft,
    progress: &ProgressBar,
) -> MagnitudeGrid {
    let layout = BandLayout::new(bands, stft.transform_size(), sample_rate);
    for i in layout.empty_bands() {
        log::warn!(
            "Band {} ({}-{} Hz) has no usable bins at {}Hz; its levels will be 0",
            i + 1,
            bands[i].low_hz,
            bands[i].high_hz,
            sample_rate
        );
    }

    let rows: Vec<Vec<f64>> = stft
        .magnitudes(samples, progress)
        .iter()
        .map(|frame| layout.average(frame))
        .collect();

    log::info!(
        "Band analysis: {} frames x {} bands (size={}, hop={})",
        rows.len(),
        bands.len(),
        stft.transform_size(),
        stft.hop_size()
    );

    MagnitudeGrid {
        rows,
        num_bands: bands.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::stft::FftStft;

    #[test]
    fn bins_use_floor_of_scaled_frequency() {
        assert_eq!(hz_to_bin(16.0, 2048, 44100), 0);
        assert_eq!(hz_to_bin(60.0, 2048, 44100), 2);
        assert_eq!(hz_to_bin(250.0, 2048, 44100), 11);
        assert_eq!(hz_to_bin(20000.0, 2048, 44100), 928);
        assert_eq!(hz_to_bin(-5.0, 2048, 44100), 0);
    }

    #[test]
    fn default_layout_at_cd_rate() {
        let layout = BandLayout::new(&DEFAULT_BANDS, 2048, 44100);
        assert_eq!(
            layout.ranges().to_vec(),
            vec![(0, 2), (2, 11), (11, 23), (23, 92), (92, 185), (185, 278), (278, 928)]
        );
        assert_eq!(layout.empty_bands().count(), 0);
    }

    #[test]
    fn bands_above_nyquist_are_clamped_and_empty() {
        // 8 kHz rate: Nyquist is 4 kHz, bin count 1025
        let layout = BandLayout::new(&DEFAULT_BANDS, 2048, 8000);
        let empty: Vec<usize> = layout.empty_bands().collect();
        assert_eq!(empty, vec![6]);
        assert_eq!(layout.ranges()[5], (1024, 1025));
        assert!(layout.ranges().iter().all(|&(s, e)| s <= 1025 && e <= 1025));
    }

    #[test]
    fn average_is_mean_over_half_open_range() {
        let layout = BandLayout {
            ranges: vec![(0, 2), (1, 4), (3, 3), (10, 12)],
        };
        let frame = [1.0f32, 3.0, 5.0, 7.0];
        assert_eq!(layout.average(&frame), vec![2.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn grid_shape_and_empty_band_zeros() {
        let stft = FftStft::new(2048, 4800);
        let sr = 8000;
        let samples: Vec<f32> = (0..30000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr as f32).sin())
            .collect();
        let grid = analyze_bands(&samples, sr, &DEFAULT_BANDS, &stft, &ProgressBar::hidden());

        assert_eq!(grid.num_frames(), (30000 - 2048) / 4800 + 1);
        assert!(grid.rows.iter().all(|row| row.len() == 7));
        let series = grid.band_series();
        assert!(series[6].iter().all(|&v| v == 0.0));
        // 440 Hz lives in the 250-500 Hz band
        assert!(series[2].iter().all(|&v| v > series[0][0]));
    }
}
