//! End-to-end pipeline: GRAPHTEC bytes → parsed table → working table →
//! windowed spectra.

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::io::Write as _;

use logscope::data::fft::{compute_fft, compute_fft_segments, FftResult};
use logscope::data::loader::{parse_strict, FormatTag, DEFAULT_ENCODINGS};
use logscope::data::transform::{build_working_table, AccelSelection, AxisSource, TimeSource, TimeUnit};

const SAMPLES: usize = 256;
const INTERVAL: f64 = 1.0 / 256.0;

/// A GRAPHTEC export carrying 10/20/30 Hz sinusoids on CH1..CH3.
fn graphtec_fixture() -> String {
    let mut out = String::new();
    out.push_str("GRAPHTEC,GL240,Ver1.00\n");
    let _ = writeln!(out, "測定間隔,{INTERVAL}s");
    out.push_str("測定値\n");
    out.push_str("番号,日時,CH1,CH2,CH3\n");
    out.push_str(",,m/s2,m/s2,m/s2\n");
    for i in 0..SAMPLES {
        let t = i as f64 * INTERVAL;
        let _ = writeln!(
            out,
            "{},2024/04/01 00:00:00,{:.10},{:.10},{:.10}",
            i + 1,
            (2.0 * PI * 10.0 * t).sin(),
            (2.0 * PI * 20.0 * t).sin(),
            (2.0 * PI * 30.0 * t).sin(),
        );
    }
    out
}

fn peak_freq(result: &FftResult, name: &str) -> f64 {
    let series = result
        .amplitudes
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("missing channel {name}"));
    let (k, _) = series
        .values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .unwrap();
    result.freqs[k]
}

#[test]
fn graphtec_file_to_spectrum() {
    // round-trip the fixture through a real file
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(graphtec_fixture().as_bytes()).unwrap();
    let bytes = std::fs::read(file.path()).unwrap();

    let parsed = parse_strict(&bytes, DEFAULT_ENCODINGS).unwrap();
    assert_eq!(parsed.format, FormatTag::Graphtec);
    assert_eq!(parsed.sampling_interval, Some(INTERVAL));
    assert_eq!(parsed.table.num_rows(), SAMPLES);

    let selection = AccelSelection {
        x: AxisSource::Column("CH1".into()),
        y: AxisSource::Column("CH2".into()),
        z: AxisSource::Column("CH3".into()),
        time: TimeSource::Column("経過時間(sec)".into(), TimeUnit::Seconds),
        angle_deg: 0.0,
    };
    let working = build_working_table(&parsed.table, &selection).unwrap();
    assert_eq!(working.num_rows(), SAMPLES);

    let result = compute_fft(&working, 0.0, SAMPLES).unwrap();
    assert!((result.sampling_interval - INTERVAL).abs() < 1e-12);
    assert_eq!(peak_freq(&result, "X"), 10.0);
    assert_eq!(peak_freq(&result, "Y"), 20.0);
    assert_eq!(peak_freq(&result, "Z"), 30.0);

    // peak amplitude survives normalization
    let x = result.amplitudes.iter().find(|s| s.name == "X").unwrap();
    let peak = x.values.iter().cloned().fold(0.0_f64, f64::max);
    assert!((peak - 1.0).abs() < 1e-6, "peak amplitude {peak}");

    let segments = compute_fft_segments(&working, 64).unwrap();
    assert_eq!(segments.segment_start_times.len(), 4);
    assert!((segments.segment_start_times[3] - 0.75).abs() < 1e-12);
    for (_, matrix) in &segments.spectra {
        assert_eq!(matrix.len(), 33); // 64/2 + 1 bins
        assert!(matrix.iter().all(|row| row.len() == 4));
    }
}
