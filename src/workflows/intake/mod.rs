//! Spreadsheet lead intake: parse an uploaded file, normalize cells, and
//! map columns onto lead candidates.

pub mod mapper;
pub mod normalizer;
pub mod parser;

use std::path::Path;

use mapper::{ColumnAudit, FieldMapping, MappedLead};
use parser::{FileFormat, ParseError, RowIssue};

#[derive(Debug)]
pub enum LeadImportError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl std::fmt::Display for LeadImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadImportError::Io(err) => write!(f, "failed to read lead upload: {err}"),
            LeadImportError::Parse(err) => write!(f, "invalid lead spreadsheet: {err}"),
        }
    }
}

impl std::error::Error for LeadImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LeadImportError::Io(err) => Some(err),
            LeadImportError::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LeadImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ParseError> for LeadImportError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

/// Combined parse + mapping result for one upload.
#[derive(Debug)]
pub struct ImportOutcome {
    pub leads: Vec<MappedLead>,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
    pub audit: ColumnAudit,
    /// Data rows seen in the file, including rows that later failed.
    pub total_rows: usize,
}

pub struct LeadImporter;

impl LeadImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        mappings: &[FieldMapping],
    ) -> Result<ImportOutcome, LeadImportError> {
        let path = path.as_ref();
        let format = FileFormat::from_file_name(&path.to_string_lossy())?;
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, format, mappings)
    }

    pub fn from_bytes(
        bytes: &[u8],
        format: FileFormat,
        mappings: &[FieldMapping],
    ) -> Result<ImportOutcome, LeadImportError> {
        let parsed = parser::parse(bytes, format)?;
        let audit = mapper::find_unmapped_columns(&parsed.headers, mappings);
        let total_rows = parsed.rows.len() + parsed.errors.len();

        let mapped = mapper::map_rows(&parsed, mappings);
        let mut errors = parsed.errors;
        errors.extend(mapped.errors);
        errors.sort_by_key(|issue| issue.row);

        Ok(ImportOutcome {
            leads: mapped.leads,
            errors,
            warnings: mapped.warnings,
            audit,
            total_rows,
        })
    }
}
