use crate::error::{LogError, Result};

use super::model::DataTable;

// ---------------------------------------------------------------------------
// Planar rotation
// ---------------------------------------------------------------------------

/// Rotated X/Y pair produced by [`rotate_xy`].
#[derive(Debug, Clone, PartialEq)]
pub struct Rotated {
    pub x_rot: Vec<f64>,
    pub y_rot: Vec<f64>,
}

/// Rotate two columns by `angle_deg` (positive counter-clockwise).
///
/// Pure function over float-coerced columns; output length equals input
/// length.
pub fn rotate_xy(table: &DataTable, x_col: &str, y_col: &str, angle_deg: f64) -> Result<Rotated> {
    let x = table.numeric_column(x_col)?;
    let y = table.numeric_column(y_col)?;
    Ok(rotate_values(&x, &y, angle_deg))
}

fn rotate_values(x: &[f64], y: &[f64], angle_deg: f64) -> Rotated {
    let theta = angle_deg.to_radians();
    let (sin, cos) = theta.sin_cos();
    let x_rot = x.iter().zip(y).map(|(&xi, &yi)| xi * cos - yi * sin).collect();
    let y_rot = x.iter().zip(y).map(|(&xi, &yi)| xi * sin + yi * cos).collect();
    Rotated { x_rot, y_rot }
}

// ---------------------------------------------------------------------------
// Acceleration metrics
// ---------------------------------------------------------------------------

/// Summary metrics of one acceleration channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelMetrics {
    pub rms: f64,
    pub max: f64,
    pub min: f64,
    /// Peak-to-peak: `max - min`.
    pub p2p: f64,
}

/// RMS / max / min / peak-to-peak of a numeric sequence.
///
/// An empty input yields NaN in every field (NaN propagation rather than an
/// error, matching the numeric-library convention downstream charts expect).
pub fn calc_accel_metrics(values: &[f64]) -> AccelMetrics {
    if values.is_empty() {
        return AccelMetrics {
            rms: f64::NAN,
            max: f64::NAN,
            min: f64::NAN,
            p2p: f64::NAN,
        };
    }
    let n = values.len() as f64;
    let rms = (values.iter().map(|v| v * v).sum::<f64>() / n).sqrt();
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    AccelMetrics {
        rms,
        max,
        min,
        p2p: max - min,
    }
}

// ---------------------------------------------------------------------------
// Working-table assembly
// ---------------------------------------------------------------------------

/// Source of one logical axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisSource {
    Column(String),
    Unused,
}

/// Unit of a caller-selected time column; values are divided down to
/// seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Millis,
    Micros,
}

impl TimeUnit {
    fn divisor(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Millis => 1_000.0,
            TimeUnit::Micros => 1_000_000.0,
        }
    }
}

/// Where the working table's `Time` column comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSource {
    /// An existing column, normalized to seconds by the unit divisor.
    Column(String, TimeUnit),
    /// Synthesized as `row_index * interval`.
    FixedInterval(f64),
    /// Bare row index.
    Index,
}

/// Caller selection for assembling the acceleration working table.
#[derive(Debug, Clone, PartialEq)]
pub struct AccelSelection {
    pub x: AxisSource,
    pub y: AxisSource,
    pub z: AxisSource,
    pub time: TimeSource,
    /// Applied only when both X and Y are column-backed.
    pub angle_deg: f64,
}

/// Assemble the derived `X`/`Y`/`Z`/`Time` table from caller selections.
///
/// Rotation is applied when both X and Y sources are selected; otherwise
/// raw values pass through unrotated.
pub fn build_working_table(table: &DataTable, sel: &AccelSelection) -> Result<DataTable> {
    let fetch = |src: &AxisSource| -> Result<Option<Vec<f64>>> {
        match src {
            AxisSource::Column(name) => table.numeric_column(name).map(Some),
            AxisSource::Unused => Ok(None),
        }
    };

    let mut x = fetch(&sel.x)?;
    let mut y = fetch(&sel.y)?;
    let z = fetch(&sel.z)?;

    if x.is_none() && y.is_none() && z.is_none() {
        return Err(LogError::NoAxisSelected);
    }

    if let (Some(xs), Some(ys)) = (&x, &y) {
        let rotated = rotate_values(xs, ys, sel.angle_deg);
        x = Some(rotated.x_rot);
        y = Some(rotated.y_rot);
    }

    let rows = table.num_rows();
    let time: Vec<f64> = match &sel.time {
        TimeSource::Column(name, unit) => {
            let divisor = unit.divisor();
            table
                .numeric_column(name)?
                .into_iter()
                .map(|v| v / divisor)
                .collect()
        }
        TimeSource::FixedInterval(dt) => (0..rows).map(|i| i as f64 * dt).collect(),
        TimeSource::Index => (0..rows).map(|i| i as f64).collect(),
    };

    let mut out = DataTable::new();
    if let Some(values) = x {
        out.set_numeric_column("X", values);
    }
    if let Some(values) = y {
        out.set_numeric_column("Y", values);
    }
    if let Some(values) = z {
        out.set_numeric_column("Z", values);
    }
    out.set_numeric_column("Time", time);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn table_xy() -> DataTable {
        let mut t = DataTable::new();
        t.set_numeric_column("ax", vec![1.0, 0.0, 3.0]);
        t.set_numeric_column("ay", vec![0.0, 1.0, -4.0]);
        t
    }

    fn close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn zero_angle_is_identity() {
        let t = table_xy();
        let r = rotate_xy(&t, "ax", "ay", 0.0).unwrap();
        assert_eq!(r.x_rot, vec![1.0, 0.0, 3.0]);
        assert_eq!(r.y_rot, vec![0.0, 1.0, -4.0]);
    }

    #[test]
    fn ninety_degrees_maps_basis_vectors() {
        let t = table_xy();
        let r = rotate_xy(&t, "ax", "ay", 90.0).unwrap();
        // (1, 0) -> (0, 1)
        close(r.x_rot[0], 0.0);
        close(r.y_rot[0], 1.0);
        // (0, 1) -> (-1, 0)
        close(r.x_rot[1], -1.0);
        close(r.y_rot[1], 0.0);
    }

    #[test]
    fn rotation_preserves_magnitude() {
        let t = table_xy();
        for angle in [-90.0, -37.5, 12.0, 45.0, 90.0, 180.0] {
            let r = rotate_xy(&t, "ax", "ay", angle).unwrap();
            let x = t.numeric_column("ax").unwrap();
            let y = t.numeric_column("ay").unwrap();
            for i in 0..x.len() {
                close(
                    r.x_rot[i].powi(2) + r.y_rot[i].powi(2),
                    x[i].powi(2) + y[i].powi(2),
                );
            }
        }
    }

    #[test]
    fn unknown_column_is_an_error() {
        let t = table_xy();
        let err = rotate_xy(&t, "ax", "nope", 10.0).unwrap_err();
        assert!(matches!(err, LogError::UnknownColumn(_)));
    }

    #[test]
    fn metrics_of_alternating_signal() {
        let m = calc_accel_metrics(&[1.0, -1.0, 1.0, -1.0]);
        close(m.rms, 1.0);
        assert_eq!(m.max, 1.0);
        assert_eq!(m.min, -1.0);
        assert_eq!(m.p2p, 2.0);
    }

    #[test]
    fn metrics_of_empty_input_are_nan() {
        let m = calc_accel_metrics(&[]);
        assert!(m.rms.is_nan() && m.max.is_nan() && m.min.is_nan() && m.p2p.is_nan());
    }

    #[test]
    fn working_table_applies_rotation_only_with_both_axes() {
        let t = table_xy();
        let sel = AccelSelection {
            x: AxisSource::Column("ax".into()),
            y: AxisSource::Unused,
            z: AxisSource::Unused,
            time: TimeSource::Index,
            angle_deg: 90.0,
        };
        let out = build_working_table(&t, &sel).unwrap();
        // no Y selected: X passes through unrotated
        assert_eq!(out.numeric_column("X").unwrap(), vec![1.0, 0.0, 3.0]);
        assert!(out.column("Y").is_none());
        assert_eq!(out.numeric_column("Time").unwrap(), vec![0.0, 1.0, 2.0]);

        let sel = AccelSelection {
            x: AxisSource::Column("ax".into()),
            y: AxisSource::Column("ay".into()),
            z: AxisSource::Unused,
            time: TimeSource::FixedInterval(0.25),
            angle_deg: 90.0,
        };
        let out = build_working_table(&t, &sel).unwrap();
        let x = out.numeric_column("X").unwrap();
        close(x[0], 0.0); // (1, 0) rotated 90°
        assert_eq!(out.numeric_column("Time").unwrap(), vec![0.0, 0.25, 0.5]);
    }

    #[test]
    fn time_column_is_normalized_to_seconds() {
        let mut t = DataTable::new();
        t.set_numeric_column("a", vec![1.0, 2.0]);
        t.set_numeric_column("stamp", vec![0.0, 500_000.0]);
        let sel = AccelSelection {
            x: AxisSource::Column("a".into()),
            y: AxisSource::Unused,
            z: AxisSource::Unused,
            time: TimeSource::Column("stamp".into(), TimeUnit::Micros),
            angle_deg: 0.0,
        };
        let out = build_working_table(&t, &sel).unwrap();
        assert_eq!(out.numeric_column("Time").unwrap(), vec![0.0, 0.5]);
    }

    #[test]
    fn no_axis_selected_is_an_error() {
        let t = table_xy();
        let sel = AccelSelection {
            x: AxisSource::Unused,
            y: AxisSource::Unused,
            z: AxisSource::Unused,
            time: TimeSource::Index,
            angle_deg: 0.0,
        };
        assert!(matches!(
            build_working_table(&t, &sel).unwrap_err(),
            LogError::NoAxisSelected
        ));
    }
}
