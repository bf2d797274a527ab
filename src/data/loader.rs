use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use log::{debug, info};
use std::fmt;

use crate::error::{LogError, Result};

use super::model::DataTable;

// ---------------------------------------------------------------------------
// Format tags and structural markers
// ---------------------------------------------------------------------------

/// Encodings tried, in order, against an uploaded file. The logger vendors
/// export either UTF-8 or CP932 (decoded here via the WHATWG Shift_JIS
/// tables).
pub const DEFAULT_ENCODINGS: &[&Encoding] = &[UTF_8, SHIFT_JIS];

/// "measured value" marker; the header row follows this line.
const GRAPHTEC_HEADER_MARKER: &str = "測定値";
/// "measurement interval" marker; the line reads `測定間隔,<number>s`.
const GRAPHTEC_INTERVAL_MARKER: &str = "測定間隔";
/// Derived elapsed-time column appended to GRAPHTEC tables.
const GRAPHTEC_ELAPSED_COLUMN: &str = "経過時間(sec)";

const NR600_HEADER_MARKER: &str = "#EndHeader";
/// Marks the trailing mark-event section; data ends here (exclusive).
const NR600_MARK_SECTION: &str = "#BeginMark";
/// Microsecond timestamp column; consumed to derive the interval, then
/// dropped.
const NR600_MICROS_COLUMN: &str = "日時(μs)";
const NR600_TIME_COLUMN: &str = "time(sec)";

/// Lines handed back to the caller when the format is ambiguous.
const PREVIEW_LINES: usize = 10;

/// Classification of a logger CSV layout. Dictates the parsing branch and
/// whether a sampling interval is derivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    Graphtec,
    Nr600,
    HeaderPresentUnknown,
    HeaderAbsent,
    PlainCsv,
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormatTag::Graphtec => "GRAPHTEC",
            FormatTag::Nr600 => "NR600",
            FormatTag::HeaderPresentUnknown => "HEADER_PRESENT_UNKNOWN",
            FormatTag::HeaderAbsent => "HEADER_ABSENT",
            FormatTag::PlainCsv => "PLAIN_CSV",
        };
        write!(f, "{s}")
    }
}

/// Output of a successful parse.
#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub table: DataTable,
    /// Seconds between consecutive samples; `None` when underivable.
    pub sampling_interval: Option<f64>,
    pub format: FormatTag,
}

// ---------------------------------------------------------------------------
// Ambiguous-format resolution
// ---------------------------------------------------------------------------

/// Caller-supplied resolution for a file with no structural marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDecision {
    /// Treat the given line index as the header row.
    HeaderAt(usize),
    /// Every line is a data row; columns get positional names.
    NoHeader,
    /// Hand the raw bytes to a general CSV reader.
    PlainCsv,
}

/// Session-scoped cache for the header decision of one upload.
///
/// Lets repeated [`parse`] calls over the same ambiguous input resume
/// without re-prompting. Call [`DetectionContext::clear`] before parsing an
/// unrelated file.
#[derive(Debug, Default)]
pub struct DetectionContext {
    decision: Option<HeaderDecision>,
}

impl DetectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the caller's decision; the next [`parse`] call resumes with it.
    pub fn resolve(&mut self, decision: HeaderDecision) {
        self.decision = Some(decision);
    }

    pub fn clear(&mut self) {
        self.decision = None;
    }

    pub fn decision(&self) -> Option<HeaderDecision> {
        self.decision
    }
}

/// Result of one parse attempt.
#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(ParsedLog),
    /// No structural marker found and no decision cached. Carries the
    /// leading lines so a caller can present them and pick a header row.
    NeedsDecision { preview: Vec<String> },
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse a logger CSV export.
///
/// Tries each candidate encoding in order, classifies the layout by its
/// structural markers, and dispatches to the per-format extraction. When no
/// marker is found the outcome is [`ParseOutcome::NeedsDecision`] unless
/// `ctx` already carries a [`HeaderDecision`].
pub fn parse(
    bytes: &[u8],
    encodings: &[&'static Encoding],
    ctx: &mut DetectionContext,
) -> Result<ParseOutcome> {
    let lines = decode_lines(bytes, encodings)?;

    // An empty upload is a zero-row table, not an error.
    if lines.iter().all(|l| l.trim().is_empty()) {
        debug!("empty upload, returning zero-row table");
        return Ok(ParseOutcome::Parsed(ParsedLog {
            table: DataTable::new(),
            sampling_interval: None,
            format: FormatTag::HeaderAbsent,
        }));
    }

    if let Some(marker) = classify(&lines) {
        let parsed = match marker {
            Marker::Graphtec(i) => parse_graphtec(&lines, i)?,
            Marker::Nr600(i) => parse_nr600(&lines, i)?,
        };
        info!(
            "parsed {} file: {} rows x {} columns, interval {:?} s",
            parsed.format,
            parsed.table.num_rows(),
            parsed.table.num_cols(),
            parsed.sampling_interval
        );
        return Ok(ParseOutcome::Parsed(parsed));
    }

    match ctx.decision() {
        Some(HeaderDecision::HeaderAt(i)) => {
            Ok(ParseOutcome::Parsed(parse_with_header_at(&lines, i)))
        }
        Some(HeaderDecision::NoHeader) => Ok(ParseOutcome::Parsed(parse_headerless(&lines))),
        Some(HeaderDecision::PlainCsv) => {
            let primary = encodings.first().copied().unwrap_or(UTF_8);
            Ok(ParseOutcome::Parsed(parse_plain_csv(bytes, primary)?))
        }
        None => {
            debug!("no structural marker found, requesting header decision");
            Ok(ParseOutcome::NeedsDecision {
                preview: lines.iter().take(PREVIEW_LINES).cloned().collect(),
            })
        }
    }
}

/// Like [`parse`] but with no resolution protocol: an ambiguous file is an
/// error.
pub fn parse_strict(bytes: &[u8], encodings: &[&'static Encoding]) -> Result<ParsedLog> {
    let mut ctx = DetectionContext::new();
    match parse(bytes, encodings, &mut ctx)? {
        ParseOutcome::Parsed(parsed) => Ok(parsed),
        ParseOutcome::NeedsDecision { .. } => Err(LogError::AmbiguousFormat),
    }
}

// ---------------------------------------------------------------------------
// Decoding & classification
// ---------------------------------------------------------------------------

fn decode_lines(bytes: &[u8], encodings: &[&'static Encoding]) -> Result<Vec<String>> {
    for &enc in encodings {
        if let Some(text) = enc.decode_without_bom_handling_and_without_replacement(bytes) {
            debug!("decoded {} bytes as {}", bytes.len(), enc.name());
            return Ok(text.lines().map(str::to_string).collect());
        }
    }
    Err(LogError::Decode)
}

enum Marker {
    Graphtec(usize),
    Nr600(usize),
}

/// First structural marker wins, scanning top to bottom.
fn classify(lines: &[String]) -> Option<Marker> {
    for (i, line) in lines.iter().enumerate() {
        let stripped = line.trim();
        if stripped.starts_with(GRAPHTEC_HEADER_MARKER) {
            return Some(Marker::Graphtec(i));
        }
        if stripped.starts_with(NR600_HEADER_MARKER) {
            return Some(Marker::Nr600(i));
        }
    }
    None
}

fn split_fields(line: &str) -> Vec<String> {
    line.trim().split(',').map(str::to_string).collect()
}

/// Non-blank lines split into fields.
fn data_rows(lines: &[String]) -> Vec<Vec<String>> {
    lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| split_fields(l))
        .collect()
}

// ---------------------------------------------------------------------------
// Per-format extraction
// ---------------------------------------------------------------------------

/// GRAPHTEC: header is the line after the marker, data starts two lines
/// after the header (a units line sits in between). The sampling interval
/// comes from the preamble and yields a derived elapsed-time column.
fn parse_graphtec(lines: &[String], marker: usize) -> Result<ParsedLog> {
    let interval = extract_interval(lines).ok_or(LogError::MissingInterval)?;

    let header_idx = marker + 1;
    let header = lines.get(header_idx).map(|l| split_fields(l)).unwrap_or_default();
    let data_start = (header_idx + 2).min(lines.len());

    let mut table = DataTable::from_rows(header, data_rows(&lines[data_start..]));
    let elapsed: Vec<f64> = (0..table.num_rows()).map(|i| i as f64 * interval).collect();
    table.set_numeric_column(GRAPHTEC_ELAPSED_COLUMN, elapsed);

    Ok(ParsedLog {
        table,
        sampling_interval: Some(interval),
        format: FormatTag::Graphtec,
    })
}

/// Find the `測定間隔,<number>s` preamble line and return the interval in
/// seconds.
fn extract_interval(lines: &[String]) -> Option<f64> {
    lines
        .iter()
        .find_map(|line| interval_from_line(line.trim()))
}

fn interval_from_line(line: &str) -> Option<f64> {
    let rest = line.strip_prefix(GRAPHTEC_INTERVAL_MARKER)?;
    let rest = rest.trim_start().strip_prefix(',')?;
    let value = rest.trim().strip_suffix('s')?.trim();
    let interval: f64 = value.parse().ok()?;
    (interval.is_finite() && interval > 0.0).then_some(interval)
}

/// NR600: the `#EndHeader` line doubles as the header row; data runs until
/// the `#BeginMark` section (exclusive) or EOF. The interval is derived
/// from the first two microsecond timestamps.
fn parse_nr600(lines: &[String], marker: usize) -> Result<ParsedLog> {
    let data_start = marker + 1;
    let data_end = lines
        .iter()
        .position(|l| l.trim().starts_with(NR600_MARK_SECTION))
        .unwrap_or(lines.len());

    let mut header = split_fields(&lines[marker]);
    for cell in &mut header {
        if cell == NR600_HEADER_MARKER {
            *cell = NR600_TIME_COLUMN.to_string();
        }
    }

    let rows = if data_start < data_end {
        data_rows(&lines[data_start..data_end])
    } else {
        Vec::new()
    };
    let mut table = DataTable::from_rows(header, rows);

    let micros = match table.numeric_column(NR600_MICROS_COLUMN) {
        Ok(v) => v,
        Err(LogError::UnknownColumn(_)) => return Err(LogError::MissingInterval),
        Err(e) => return Err(e),
    };
    // Fewer than two samples leave the interval undeterminable.
    let interval = (micros.len() >= 2)
        .then(|| (micros[1] - micros[0]) / 1_000_000.0)
        .filter(|dt| *dt > 0.0);

    table.remove_column(NR600_MICROS_COLUMN);
    if let Some(dt) = interval {
        let time: Vec<f64> = (0..table.num_rows()).map(|i| i as f64 * dt).collect();
        table.set_numeric_column(NR600_TIME_COLUMN, time);
    }

    Ok(ParsedLog {
        table,
        sampling_interval: interval,
        format: FormatTag::Nr600,
    })
}

/// Caller designated an explicit header line; data follows it to EOF.
fn parse_with_header_at(lines: &[String], header_idx: usize) -> ParsedLog {
    let header = lines.get(header_idx).map(|l| split_fields(l)).unwrap_or_default();
    let data_start = (header_idx + 1).min(lines.len());
    ParsedLog {
        table: DataTable::from_rows(header, data_rows(&lines[data_start..])),
        sampling_interval: None,
        format: FormatTag::HeaderPresentUnknown,
    }
}

/// Caller designated no header; every line is a data row.
fn parse_headerless(lines: &[String]) -> ParsedLog {
    ParsedLog {
        table: DataTable::from_rows_positional(data_rows(lines)),
        sampling_interval: None,
        format: FormatTag::HeaderAbsent,
    }
}

/// Graceful-degradation branch: decode with the primary encoding and hand
/// the text to a general CSV reader.
fn parse_plain_csv(bytes: &[u8], primary: &'static Encoding) -> Result<ParsedLog> {
    let (text, _, _) = primary.decode(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(ParsedLog {
        table: DataTable::from_rows(header, rows),
        sampling_interval: None,
        format: FormatTag::PlainCsv,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
