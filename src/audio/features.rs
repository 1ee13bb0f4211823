/// Average band magnitudes, rows = time frames, columns = bands.
#[derive(Clone, Debug, PartialEq)]
pub struct MagnitudeGrid {
    pub rows: Vec<Vec<f64>>,
    pub num_bands: usize,
}

/// Magnitudes after log compression and rescaling into `[min, max]`.
/// Same shape as the [`MagnitudeGrid`] it came from; values are not yet rounded.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledGrid {
    pub rows: Vec<Vec<f64>>,
    pub num_bands: usize,
}

impl MagnitudeGrid {
    pub fn num_frames(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One time series per band, in band order.
    #[cfg(test)]
    pub fn band_series(&self) -> Vec<Vec<f64>> {
        columns(&self.rows, self.num_bands)
    }
}

impl ScaledGrid {
    pub fn num_frames(&self) -> usize {
        self.rows.len()
    }

    pub fn band_series(&self) -> Vec<Vec<f64>> {
        columns(&self.rows, self.num_bands)
    }
}

fn columns(rows: &[Vec<f64>], width: usize) -> Vec<Vec<f64>> {
    (0..width)
        .map(|c| rows.iter().map(|row| row[c]).collect())
        .collect()
}
