use crate::error::{Result, TidyError};
use encoding_rs::{Encoding, UTF_8};
use polars::prelude::*;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

/// Extensions accepted as input, lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// Character encoding of CSV input, resolved from a WHATWG label such as
/// `utf-8`, `latin1` or `cp1252`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputEncoding(&'static Encoding);

impl Default for InputEncoding {
    fn default() -> Self {
        Self::UTF8
    }
}

impl InputEncoding {
    pub const UTF8: Self = Self(UTF_8);

    /// Looks up an encoding by label. Labels are case-insensitive, and
    /// `-`/`_` separators may be omitted or added (`latin-1` = `latin1`).
    pub fn for_label(label: &str) -> Result<Self> {
        let label = label.trim();
        let compact: String = label.chars().filter(|c| !matches!(c, '-' | '_')).collect();
        Encoding::for_label(label.as_bytes())
            .or_else(|| Encoding::for_label(compact.as_bytes()))
            .map(Self)
            .ok_or_else(|| TidyError::Encoding(format!("unknown encoding label '{label}'")))
    }

    pub fn name(self) -> &'static str {
        self.0.name()
    }

    /// Decodes `bytes` to text. A UTF-8 or UTF-16 byte order mark overrides
    /// the configured encoding and is removed.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((self.0, 0));
        let body = bytes.get(bom_len..).unwrap_or_default();
        encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .map(|text| text.into_owned())
            .ok_or_else(|| TidyError::Encoding(format!("input is not valid {}", encoding.name())))
    }
}

impl fmt::Display for InputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Reads a CSV or Excel file into a frame with inferred column types.
///
/// `encoding` applies to CSV files; workbook cells are already text.
pub fn load_df(path: &Path, encoding: InputEncoding) -> Result<DataFrame> {
    if !path.exists() {
        return Err(TidyError::FileNotFound(path.display().to_string()));
    }

    let ext = extension_of(path);
    let df = match ext.as_str() {
        "csv" => read_csv_bytes(&std::fs::read(path)?, encoding)?,
        "xlsx" | "xls" => read_csv_bytes(&excel_to_csv_bytes(path)?, InputEncoding::UTF8)?,
        _ => return Err(TidyError::UnsupportedFormat(ext)),
    };

    tracing::debug!(
        "Loaded {} ({} rows x {} columns)",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Parses CSV text held in memory. Zero-byte or blank input is an error.
pub fn read_csv_bytes(bytes: &[u8], encoding: InputEncoding) -> Result<DataFrame> {
    let text = encoding.decode(bytes)?;
    if text.trim().is_empty() {
        return Err(TidyError::DataProcessing("file is empty".to_owned()));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()?;
    Ok(df)
}

#[cfg(feature = "excel")]
fn excel_to_csv_bytes(path: &Path) -> Result<Vec<u8>> {
    use calamine::{Data, Reader as _, open_workbook_auto};

    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TidyError::DataProcessing("workbook has no sheets".to_owned()))?;
    let range = workbook.worksheet_range(&sheet)?;
    tracing::debug!("Reading sheet '{sheet}' from {}", path.display());

    let mut out = String::new();
    for row in range.rows() {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| {
                let text = match cell {
                    Data::Empty | Data::Error(_) => String::new(),
                    Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
                    Data::Float(f) => f.to_string(),
                    Data::Int(i) => i.to_string(),
                    Data::Bool(b) => b.to_string(),
                    Data::DateTime(dt) => dt
                        .as_datetime()
                        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| dt.as_f64().to_string()),
                };
                csv_field(&text)
            })
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    Ok(out.into_bytes())
}

#[cfg(not(feature = "excel"))]
fn excel_to_csv_bytes(path: &Path) -> Result<Vec<u8>> {
    Err(TidyError::UnsupportedFormat(format!(
        "{} (built without the `excel` feature)",
        extension_of(path)
    )))
}

/// Quotes a field when it contains a delimiter, quote or newline.
#[cfg(any(feature = "excel", test))]
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_owned()
    }
}

/// Writes a frame as CSV with header; temporal columns use `date_format`.
pub fn save_df(df: &mut DataFrame, path: &Path, date_format: &str) -> Result<()> {
    let file = std::fs::File::create(path)?;
    CsvWriter::new(file)
        .include_header(true)
        .with_date_format(Some(date_format.to_owned()))
        .with_datetime_format(Some(date_format.to_owned()))
        .finish(df)?;
    Ok(())
}
