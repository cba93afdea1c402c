//! Spreadsheet parsing: CSV (UTF-8 with EUC-KR fallback) and XLSX/XLS
//! workbooks, flattened into header-aligned raw rows.

use std::io::Cursor;

use calamine::{Data, Reader, Xls, Xlsx};
use encoding_rs::EUC_KR;
use serde::Serialize;

/// Declared upload format, taken from the uploaded file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    pub fn from_file_name(name: &str) -> Result<Self, ParseError> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "xls" => Ok(FileFormat::Xls),
            _ => Err(ParseError::UnsupportedFormat { extension }),
        }
    }
}

/// A raw cell value before field normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Render the cell as display text (integers without a trailing `.0`).
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{}", *value as i64)
                } else {
                    format!("{value}")
                }
            }
        }
    }
}

/// One data row, positionally aligned to the header list. `number` is the
/// 1-based spreadsheet row (the header row is row 1).
#[derive(Debug, Clone)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<Option<CellValue>>,
}

/// Row-scoped problem captured without aborting the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub message: String,
}

/// Parse output: headers, data rows, and row-scoped errors.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub errors: Vec<RowIssue>,
}

/// Failures fatal to the whole parse. Row-level problems land in
/// [`ParseResult::errors`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported file format '{extension}'")]
    UnsupportedFormat { extension: String },
    #[error("file contains no data")]
    EmptyFile,
    #[error("workbook has no worksheet")]
    MissingWorksheet,
    #[error("failed to read header row: {0}")]
    Header(String),
    #[error("failed to read workbook: {0}")]
    Workbook(String),
}

/// Parse an uploaded spreadsheet into raw rows.
pub fn parse(bytes: &[u8], format: FileFormat) -> Result<ParseResult, ParseError> {
    match format {
        FileFormat::Csv => parse_csv(bytes),
        FileFormat::Xlsx => {
            let workbook = Xlsx::new(Cursor::new(bytes))
                .map_err(|err| ParseError::Workbook(err.to_string()))?;
            first_worksheet_rows(workbook)
        }
        FileFormat::Xls => {
            let workbook = Xls::new(Cursor::new(bytes))
                .map_err(|err| ParseError::Workbook(err.to_string()))?;
            first_worksheet_rows(workbook)
        }
    }
}

fn parse_csv(bytes: &[u8]) -> Result<ParseResult, ParseError> {
    let text = decode_csv_text(bytes);
    if text.trim().is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| ParseError::Header(err.to_string()))?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let number = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                errors.push(RowIssue {
                    row: number,
                    message: err.to_string(),
                });
                continue;
            }
        };

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let cells = headers
            .iter()
            .enumerate()
            .map(|(position, _)| {
                record
                    .get(position)
                    .map(str::trim)
                    .filter(|field| !field.is_empty())
                    .map(|field| CellValue::Text(field.to_string()))
            })
            .collect();
        rows.push(RawRow { number, cells });
    }

    Ok(ParseResult {
        headers,
        rows,
        errors,
    })
}

/// Decode CSV bytes as UTF-8; fall back to EUC-KR when the UTF-8 pass
/// produced replacement characters (common in Korean business exports).
fn decode_csv_text(bytes: &[u8]) -> String {
    let utf8 = String::from_utf8_lossy(bytes);
    let text = if utf8.contains('\u{fffd}') {
        let (decoded, _, _) = EUC_KR.decode(bytes);
        decoded.into_owned()
    } else {
        utf8.into_owned()
    };
    text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text)
}

fn first_worksheet_rows<RS, R>(mut workbook: R) -> Result<ParseResult, ParseError>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(ParseError::MissingWorksheet);
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|err| ParseError::Workbook(err.to_string()))?;

    let mut row_iter = range.rows();
    let Some(header_row) = row_iter.next() else {
        return Err(ParseError::EmptyFile);
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| convert_cell(cell).map(|value| value.as_text()).unwrap_or_default())
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (index, row) in row_iter.enumerate() {
        let cells: Vec<Option<CellValue>> = headers
            .iter()
            .enumerate()
            .map(|(position, _)| row.get(position).and_then(convert_cell))
            .collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }
        rows.push(RawRow {
            number: index + 2,
            cells,
        });
    }

    Ok(ParseResult {
        headers,
        rows,
        errors: Vec::new(),
    })
}

fn convert_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(CellValue::Text(trimmed.to_string()))
            }
        }
        Data::Float(value) => Some(CellValue::Number(*value)),
        Data::Int(value) => Some(CellValue::Number(*value as f64)),
        Data::Bool(value) => Some(CellValue::Text(value.to_string())),
        Data::DateTime(value) => Some(CellValue::Number(value.as_f64())),
        Data::DateTimeIso(text) | Data::DurationIso(text) => {
            Some(CellValue::Text(text.trim().to_string()))
        }
    }
}
