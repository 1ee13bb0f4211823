use indicatif::ProgressBar;
use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude short-time Fourier transform over uncentred frames.
///
/// Frame `t` covers samples `[t * hop, t * hop + size)`. Implementations
/// return `size / 2 + 1` non-negative magnitudes per frame.
pub trait MagnitudeStft {
    fn transform_size(&self) -> usize;
    fn hop_size(&self) -> usize;

    fn num_bins(&self) -> usize {
        self.transform_size() / 2 + 1
    }

    fn frame_count(&self, num_samples: usize) -> usize {
        let size = self.transform_size();
        if num_samples < size {
            0
        } else {
            (num_samples - size) / self.hop_size() + 1
        }
    }

    /// Magnitudes for a single frame starting at `start`.
    fn frame_magnitudes(&self, samples: &[f32], start: usize) -> Vec<f32>;

    fn magnitudes(&self, samples: &[f32], progress: &ProgressBar) -> Vec<Vec<f32>> {
        let frames = self.frame_count(samples.len());
        progress.set_length(frames as u64);
        let out = (0..frames)
            .map(|t| {
                let mags = self.frame_magnitudes(samples, t * self.hop_size());
                progress.inc(1);
                mags
            })
            .collect();
        progress.finish_and_clear();
        out
    }
}

/// `rustfft`-backed STFT with a periodic Hann window.
pub struct FftStft {
    size: usize,
    hop: usize,
    window: Vec<f32>,
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
}

impl FftStft {
    pub fn new(size: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        Self {
            size,
            hop,
            window: hann_window(size),
            fft,
        }
    }
}

impl MagnitudeStft for FftStft {
    fn transform_size(&self) -> usize {
        self.size
    }

    fn hop_size(&self) -> usize {
        self.hop
    }

    fn frame_magnitudes(&self, samples: &[f32], start: usize) -> Vec<f32> {
        let end = (start + self.size).min(samples.len());
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.size];
        for (i, &s) in samples[start.min(end)..end].iter().enumerate() {
            buffer[i] = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut buffer);
        buffer[..self.num_bins()].iter().map(|c| c.norm()).collect()
    }
}

/// Periodic Hann window (the DFT-even form used for spectral analysis).
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
        })
        .collect()
}
