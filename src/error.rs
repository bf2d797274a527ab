use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogError>;

/// Errors surfaced by the parsing and analysis layers.
///
/// Everything here is returned to the immediate caller; the library never
/// retries and never produces user-visible messaging on its own.
#[derive(Debug, Error)]
pub enum LogError {
    /// None of the candidate text encodings could decode the upload.
    #[error("file could not be decoded with any of the candidate encodings")]
    Decode,

    /// A GRAPHTEC file was recognized but its preamble lacks the
    /// measurement-interval line.
    #[error("measurement interval line not found in GRAPHTEC preamble")]
    MissingInterval,

    /// No structural marker was found and no header decision was supplied.
    #[error("logger format not recognized and no header decision was supplied")]
    AmbiguousFormat,

    #[error("column '{0}' not found in table")]
    UnknownColumn(String),

    #[error("column '{column}', row {row}: '{value}' is not numeric")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("window size must be a positive number of samples")]
    InvalidWindow,

    #[error("no axis column selected")]
    NoAxisSelected,

    #[error("start offset must be a non-negative, finite number of seconds")]
    InvalidStart,

    #[error("setting '{name}' out of range: {value}")]
    InvalidSetting { name: &'static str, value: u32 },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
