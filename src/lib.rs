//! logscope – logger-device CSV normalization and windowed FFT analysis.
//!
//! Ingests CSV exports from data loggers with vendor-specific, non-tabular
//! preambles (GRAPHTEC GL-series, KEYENCE NR-600), normalizes them into a
//! uniform [`data::model::DataTable`], and computes single-sided amplitude
//! spectra over configurable time windows for visualization.
//!
//! The UI layer (file pickers, sliders, chart rendering, settings files) is
//! deliberately not part of this crate: callers feed in raw bytes and a few
//! scalar parameters, and get back tables and frequency/amplitude arrays.

pub mod config;
pub mod data;
pub mod error;

pub use error::{LogError, Result};
