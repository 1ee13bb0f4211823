use super::features::{MagnitudeGrid, ScaledGrid};
use crate::error::{LevelsError, Result};

/// Log-compress a magnitude grid and rescale it into `[new_min, new_max]`.
///
/// The minimum and maximum are taken over the whole grid, not per band, so
/// quieter bands stay quieter after scaling. A grid with no spread at all
/// (silence, constant magnitude) cannot be rescaled and is rejected.
pub fn scale_grid(grid: &MagnitudeGrid, new_min: f64, new_max: f64) -> Result<ScaledGrid> {
    if grid.is_empty() {
        return Err(LevelsError::InvalidInput(
            "no analysis frames: audio is shorter than one transform".into(),
        ));
    }
    if grid.rows.iter().flatten().any(|v| !v.is_finite()) {
        return Err(LevelsError::InvalidInput(
            "magnitude grid contains non-finite values".into(),
        ));
    }

    let (raw_min, _) = min_max(&grid.rows);
    let compressed: Vec<Vec<f64>> = grid
        .rows
        .iter()
        .map(|row| row.iter().map(|&v| (v - raw_min).ln_1p()).collect())
        .collect();

    let (old_min, old_max) = min_max(&compressed);
    let old_range = old_max - old_min;
    if old_range <= 0.0 {
        return Err(LevelsError::InvalidInput(
            "cannot scale a constant-magnitude signal".into(),
        ));
    }

    let new_range = new_max - new_min;
    let rows = compressed
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|v| (v - old_min) / old_range * new_range + new_min)
                .collect()
        })
        .collect();

    log::info!(
        "Scaled {} frames into [{}, {}] (log range {:.4}..{:.4})",
        grid.num_frames(),
        new_min,
        new_max,
        old_min,
        old_max
    );

    Ok(ScaledGrid {
        rows,
        num_bands: grid.num_bands,
    })
}

fn min_max(rows: &[Vec<f64>]) -> (f64, f64) {
    rows.iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
