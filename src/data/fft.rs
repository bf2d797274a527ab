use std::sync::Arc;

use log::debug;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{LogError, Result};

use super::model::{DataTable, Series};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Known time-column names, scanned in order when deriving the sampling
/// interval from a table.
const TIME_COLUMNS: &[&str] = &["Time", "time", "time(sec)", "経過時間(sec)"];

/// Single-window spectrum: one amplitude series per numeric column, all
/// aligned to `freqs`.
#[derive(Debug, Clone)]
pub struct FftResult {
    /// Non-negative frequency bins, `floor(n/2) + 1` of them.
    pub freqs: Vec<f64>,
    pub amplitudes: Vec<Series>,
    pub sampling_interval: f64,
}

/// Multi-window (spectrogram-style) spectra.
///
/// Each matrix has `freqs.len()` rows and `segment_start_times.len()`
/// columns.
#[derive(Debug, Clone)]
pub struct FftSegments {
    pub freqs: Vec<f64>,
    pub segment_start_times: Vec<f64>,
    pub spectra: Vec<(String, Vec<Vec<f64>>)>,
    pub sampling_interval: f64,
}

// ---------------------------------------------------------------------------
// Interval detection
// ---------------------------------------------------------------------------

/// Sampling interval from the first recognized time column (difference of
/// the first two values), defaulting to 1.0. Also reports which column was
/// used so it can be excluded from the spectra.
fn detect_interval(table: &DataTable) -> (f64, Option<&'static str>) {
    for &name in TIME_COLUMNS {
        if table.column(name).is_none() {
            continue;
        }
        let dt = table
            .try_numeric_column(name)
            .filter(|v| v.len() >= 2)
            .map(|v| v[1] - v[0])
            .filter(|dt| dt.is_finite() && *dt > 0.0)
            .unwrap_or(1.0);
        return (dt, Some(name));
    }
    (1.0, None)
}

// ---------------------------------------------------------------------------
// Spectrum computation
// ---------------------------------------------------------------------------

/// Normalized single-sided amplitude of one segment.
///
/// `|X[k]| * 2 / n`, with the DC bin halved (no negative-frequency mirror)
/// and, for even `n`, the Nyquist bin halved for the same reason. A pure
/// sinusoid of amplitude A lands at A in its bin.
fn single_sided_amplitude(fft: &Arc<dyn Fft<f64>>, segment: &[f64]) -> Vec<f64> {
    let n = segment.len();
    let mut buffer: Vec<Complex<f64>> =
        segment.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft.process(&mut buffer);

    let half = n / 2 + 1;
    let mut amp: Vec<f64> = buffer[..half]
        .iter()
        .map(|c| c.norm() * 2.0 / n as f64)
        .collect();
    amp[0] /= 2.0;
    if n % 2 == 0 {
        if let Some(last) = amp.last_mut() {
            *last /= 2.0;
        }
    }
    amp
}

fn frequency_bins(n: usize, interval: f64) -> Vec<f64> {
    (0..n / 2 + 1)
        .map(|k| k as f64 / (n as f64 * interval))
        .collect()
}

/// Compute the single-sided amplitude spectrum of one window.
///
/// The window starts at `floor(start_sec / interval)` and is right-clamped:
/// when it would run past the table end it is shifted back so its length is
/// preserved whenever enough samples exist. An empty segment yields an
/// empty result, not an error.
pub fn compute_fft(table: &DataTable, start_sec: f64, window_size: usize) -> Result<FftResult> {
    if window_size == 0 {
        return Err(LogError::InvalidWindow);
    }
    let (interval, time_col) = detect_interval(table);
    let total = table.num_rows();

    let start = if start_sec > 0.0 {
        (start_sec / interval).floor() as usize
    } else {
        0
    };
    let end = start.saturating_add(window_size).min(total);
    let start = end.saturating_sub(window_size);
    let n = end - start;

    if n == 0 {
        debug!("empty FFT segment (table has {total} rows)");
        return Ok(FftResult {
            freqs: Vec::new(),
            amplitudes: Vec::new(),
            sampling_interval: interval,
        });
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);

    let mut amplitudes = Vec::new();
    for col in table.columns() {
        if Some(col.name.as_str()) == time_col {
            continue;
        }
        let Some(values) = table.try_numeric_column(&col.name) else {
            continue;
        };
        amplitudes.push(Series {
            name: col.name.clone(),
            values: single_sided_amplitude(&fft, &values[start..end]),
        });
    }
    debug!(
        "FFT over rows {start}..{end} ({} channels, interval {interval} s)",
        amplitudes.len()
    );

    Ok(FftResult {
        freqs: frequency_bins(n, interval),
        amplitudes,
        sampling_interval: interval,
    })
}

/// Partition the table into `floor(N / window_size)` contiguous windows
/// (trailing partial window dropped) and compute each window's spectrum
/// with the same normalization as [`compute_fft`].
pub fn compute_fft_segments(table: &DataTable, window_size: usize) -> Result<FftSegments> {
    if window_size == 0 {
        return Err(LogError::InvalidWindow);
    }
    let (interval, time_col) = detect_interval(table);
    let n_segments = table.num_rows() / window_size;

    if n_segments == 0 {
        return Ok(FftSegments {
            freqs: Vec::new(),
            segment_start_times: Vec::new(),
            spectra: Vec::new(),
            sampling_interval: interval,
        });
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(window_size);
    let half = window_size / 2 + 1;

    let segment_start_times: Vec<f64> = (0..n_segments)
        .map(|i| (i * window_size) as f64 * interval)
        .collect();

    let mut spectra = Vec::new();
    for col in table.columns() {
        if Some(col.name.as_str()) == time_col {
            continue;
        }
        let Some(values) = table.try_numeric_column(&col.name) else {
            continue;
        };
        // freq bins as rows, segments as columns
        let mut matrix = vec![vec![0.0; n_segments]; half];
        for s in 0..n_segments {
            let segment = &values[s * window_size..(s + 1) * window_size];
            for (k, a) in single_sided_amplitude(&fft, segment).into_iter().enumerate() {
                matrix[k][s] = a;
            }
        }
        spectra.push((col.name.clone(), matrix));
    }
    debug!(
        "segment FFT: {n_segments} windows of {window_size} samples, {} channels",
        spectra.len()
    );

    Ok(FftSegments {
        freqs: frequency_bins(window_size, interval),
        segment_start_times,
        spectra,
        sampling_interval: interval,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
