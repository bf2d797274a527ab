/// Data layer: parsing, transformation, and spectral analysis.
///
/// Architecture:
/// ```text
///  raw logger CSV bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  detect encoding + vendor format → ParsedLog
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ DataTable │  named columns, file-order rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ transform │  rotation, metrics, X/Y/Z/Time working table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   fft     │  single-sided amplitude spectra per window
///   └──────────┘
/// ```
pub mod fft;
pub mod loader;
pub mod model;
pub mod transform;
