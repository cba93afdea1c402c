//! Column mapping: applies the configured csv-column → system-field mapping
//! to raw rows, producing normalized lead candidates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::normalizer::{self, NumericRange};
use super::parser::{CellValue, ParseResult, RowIssue};
use crate::workflows::leads::domain::Lead;

/// Lead attributes a spreadsheet column can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemField {
    Phone,
    CompanyName,
    RepresentativeName,
    Industry,
    Region,
    BusinessType,
    AvailableTime,
    TaxDelinquency,
    AnnualRevenue,
    EmployeeCount,
    CampaignName,
    AdName,
    SourceDate,
}

impl SystemField {
    pub const fn label(self) -> &'static str {
        match self {
            SystemField::Phone => "phone",
            SystemField::CompanyName => "company_name",
            SystemField::RepresentativeName => "representative_name",
            SystemField::Industry => "industry",
            SystemField::Region => "region",
            SystemField::BusinessType => "business_type",
            SystemField::AvailableTime => "available_time",
            SystemField::TaxDelinquency => "tax_delinquency",
            SystemField::AnnualRevenue => "annual_revenue",
            SystemField::EmployeeCount => "employee_count",
            SystemField::CampaignName => "campaign_name",
            SystemField::AdName => "ad_name",
            SystemField::SourceDate => "source_date",
        }
    }
}

/// One administrator-configured column mapping. `csv_column` matches
/// case-insensitively against file headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub csv_column: String,
    pub system_field: SystemField,
    pub is_required: bool,
    pub display_order: i32,
}

/// A successfully mapped lead with its source row number.
#[derive(Debug, Clone)]
pub struct MappedLead {
    pub row: usize,
    pub lead: Lead,
}

/// Best-effort mapping output: one bad row never aborts the batch.
#[derive(Debug, Default)]
pub struct MappingOutcome {
    pub leads: Vec<MappedLead>,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
}

/// Informational report on how this file's headers line up with the
/// configured mappings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnAudit {
    /// Headers covered by a mapping.
    pub mapped: Vec<String>,
    /// Headers with no mapping entry (fall back to heuristics upstream).
    pub unmapped: Vec<String>,
    /// Configured columns absent from this file.
    pub missing: Vec<String>,
}

/// Apply the mapping configuration to every parsed row.
pub fn map_rows(parsed: &ParseResult, mappings: &[FieldMapping]) -> MappingOutcome {
    let mut ordered: Vec<&FieldMapping> = mappings.iter().collect();
    ordered.sort_by_key(|mapping| mapping.display_order);

    let lookup: HashMap<String, SystemField> = ordered
        .iter()
        .map(|mapping| (mapping.csv_column.to_lowercase(), mapping.system_field))
        .collect();

    let mut required: Vec<SystemField> = Vec::new();
    for mapping in &ordered {
        if mapping.is_required && !required.contains(&mapping.system_field) {
            required.push(mapping.system_field);
        }
    }

    let header_fields: Vec<Option<SystemField>> = parsed
        .headers
        .iter()
        .map(|header| lookup.get(&header.to_lowercase()).copied())
        .collect();

    let mut outcome = MappingOutcome::default();
    for row in &parsed.rows {
        let mut draft = LeadDraft::default();
        for (position, field) in header_fields.iter().enumerate() {
            let (Some(field), Some(Some(value))) = (field, row.cells.get(position)) else {
                continue;
            };
            draft.apply(*field, value);
        }

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|field| !draft.has(**field))
            .map(|field| field.label())
            .collect();
        if !missing.is_empty() {
            outcome.errors.push(RowIssue {
                row: row.number,
                message: format!("missing required fields: {}", missing.join(", ")),
            });
            continue;
        }

        match draft.finish() {
            Some(lead) => outcome.leads.push(MappedLead {
                row: row.number,
                lead,
            }),
            None => outcome.warnings.push(RowIssue {
                row: row.number,
                message: "no usable phone number; row skipped".to_string(),
            }),
        }
    }

    outcome
}

/// Report unmapped headers and mappings missing from this file's headers.
pub fn find_unmapped_columns(headers: &[String], mappings: &[FieldMapping]) -> ColumnAudit {
    let configured: HashMap<String, &FieldMapping> = mappings
        .iter()
        .map(|mapping| (mapping.csv_column.to_lowercase(), mapping))
        .collect();

    let mut audit = ColumnAudit::default();
    for header in headers {
        if configured.contains_key(&header.to_lowercase()) {
            audit.mapped.push(header.clone());
        } else {
            audit.unmapped.push(header.clone());
        }
    }

    let present: Vec<String> = headers.iter().map(|header| header.to_lowercase()).collect();
    for mapping in mappings {
        if !present.contains(&mapping.csv_column.to_lowercase()) {
            audit.missing.push(mapping.csv_column.clone());
        }
    }

    audit
}

/// Accumulates converted cell values until the row can be finalized.
#[derive(Debug, Default)]
struct LeadDraft {
    phone: Option<String>,
    lead: Lead,
}

impl LeadDraft {
    fn apply(&mut self, field: SystemField, value: &CellValue) {
        match field {
            SystemField::Phone => {
                self.phone = normalizer::normalize_phone(&value.as_text());
            }
            SystemField::CompanyName => self.lead.company_name = text_value(value),
            SystemField::RepresentativeName => self.lead.representative_name = text_value(value),
            SystemField::Industry => self.lead.industry = text_value(value),
            SystemField::Region => self.lead.region = text_value(value),
            SystemField::BusinessType => self.lead.business_type = text_value(value),
            SystemField::AvailableTime => self.lead.available_time = text_value(value),
            SystemField::CampaignName => self.lead.campaign_name = text_value(value),
            SystemField::AdName => self.lead.ad_name = text_value(value),
            SystemField::TaxDelinquency => {
                self.lead.tax_delinquency = tri_state(&value.as_text());
            }
            SystemField::AnnualRevenue => {
                let range = number_range(value);
                self.lead.annual_revenue = range.min;
                self.lead.annual_revenue_min = range.min;
                self.lead.annual_revenue_max = range.max;
            }
            SystemField::EmployeeCount => {
                let range = number_range(value);
                self.lead.employee_count = range.min;
                self.lead.employee_count_min = range.min;
                self.lead.employee_count_max = range.max;
            }
            SystemField::SourceDate => {
                self.lead.source_date = match value {
                    CellValue::Number(serial) => normalizer::date_from_serial(*serial),
                    CellValue::Text(text) => normalizer::parse_date(text),
                };
            }
        }
    }

    fn has(&self, field: SystemField) -> bool {
        match field {
            SystemField::Phone => self.phone.is_some(),
            SystemField::CompanyName => self.lead.company_name.is_some(),
            SystemField::RepresentativeName => self.lead.representative_name.is_some(),
            SystemField::Industry => self.lead.industry.is_some(),
            SystemField::Region => self.lead.region.is_some(),
            SystemField::BusinessType => self.lead.business_type.is_some(),
            SystemField::AvailableTime => self.lead.available_time.is_some(),
            SystemField::TaxDelinquency => self.lead.tax_delinquency.is_some(),
            SystemField::AnnualRevenue => {
                self.lead.annual_revenue_min.is_some() || self.lead.annual_revenue_max.is_some()
            }
            SystemField::EmployeeCount => {
                self.lead.employee_count_min.is_some() || self.lead.employee_count_max.is_some()
            }
            SystemField::CampaignName => self.lead.campaign_name.is_some(),
            SystemField::AdName => self.lead.ad_name.is_some(),
            SystemField::SourceDate => self.lead.source_date.is_some(),
        }
    }

    fn finish(self) -> Option<Lead> {
        let phone = self.phone.filter(|phone| !phone.is_empty())?;
        Some(Lead {
            phone,
            ..self.lead
        })
    }
}

fn text_value(value: &CellValue) -> Option<String> {
    let text = value.as_text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn number_range(value: &CellValue) -> NumericRange {
    match value {
        CellValue::Number(number) => NumericRange::exact(*number),
        CellValue::Text(text) => normalizer::parse_number_range(text),
    }
}

fn tri_state(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "o" | "유" | "있음" | "체납" => Some(true),
        "n" | "no" | "false" | "x" | "무" | "없음" => Some(false),
        _ => None,
    }
}
