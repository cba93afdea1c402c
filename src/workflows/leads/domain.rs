use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::rules::{FieldValue, RuleField};

/// Identifier wrapper for grades.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GradeId(pub String);

/// Ordinal lead classification. Lower `priority` outranks higher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub name: String,
    pub priority: i32,
    pub is_default: bool,
}

/// Whether a lead's grade came from the rule engine or a human override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeSource {
    Auto,
    Manual,
}

impl GradeSource {
    pub const fn label(self) -> &'static str {
        match self {
            GradeSource::Auto => "auto",
            GradeSource::Manual => "manual",
        }
    }
}

/// A normalized lead candidate produced by the column mapper.
///
/// `phone` is the only required attribute and is always in canonical dashed
/// form. Revenue and head-count keep the legacy scalar (the parsed range's
/// lower bound) next to the explicit min/max pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Lead {
    pub phone: String,
    pub company_name: Option<String>,
    pub representative_name: Option<String>,
    pub industry: Option<String>,
    pub region: Option<String>,
    pub business_type: Option<String>,
    pub available_time: Option<String>,
    /// Tri-state: `Some(true)` delinquent, `Some(false)` clear, `None` unknown.
    pub tax_delinquency: Option<bool>,
    pub annual_revenue: Option<f64>,
    pub annual_revenue_min: Option<f64>,
    pub annual_revenue_max: Option<f64>,
    pub employee_count: Option<f64>,
    pub employee_count_min: Option<f64>,
    pub employee_count_max: Option<f64>,
    pub campaign_name: Option<String>,
    pub ad_name: Option<String>,
    pub source_date: Option<NaiveDate>,
}

/// Lead attributes addressable from classification rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    AnnualRevenue,
    EmployeeCount,
    Industry,
    Region,
    BusinessType,
    CompanyName,
    AvailableTime,
    TaxDelinquency,
}

impl RuleField for LeadField {
    fn label(self) -> &'static str {
        match self {
            LeadField::AnnualRevenue => "annual_revenue",
            LeadField::EmployeeCount => "employee_count",
            LeadField::Industry => "industry",
            LeadField::Region => "region",
            LeadField::BusinessType => "business_type",
            LeadField::CompanyName => "company_name",
            LeadField::AvailableTime => "available_time",
            LeadField::TaxDelinquency => "tax_delinquency",
        }
    }
}

impl LeadField {
    /// Resolve this field on a lead. Numeric fields use the legacy scalar.
    pub fn resolve(self, lead: &Lead) -> Option<FieldValue> {
        match self {
            LeadField::AnnualRevenue => lead.annual_revenue.map(FieldValue::Number),
            LeadField::EmployeeCount => lead.employee_count.map(FieldValue::Number),
            LeadField::Industry => lead.industry.clone().map(FieldValue::Text),
            LeadField::Region => lead.region.clone().map(FieldValue::Text),
            LeadField::BusinessType => lead.business_type.clone().map(FieldValue::Text),
            LeadField::CompanyName => lead.company_name.clone().map(FieldValue::Text),
            LeadField::AvailableTime => lead.available_time.clone().map(FieldValue::Text),
            LeadField::TaxDelinquency => lead.tax_delinquency.map(FieldValue::Bool),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_fields_resolve_to_typed_values() {
        let lead = Lead {
            phone: "010-1234-5678".to_string(),
            industry: Some("제조업".to_string()),
            annual_revenue: Some(12.0),
            tax_delinquency: Some(false),
            ..Lead::default()
        };

        assert_eq!(
            LeadField::AnnualRevenue.resolve(&lead),
            Some(FieldValue::Number(12.0))
        );
        assert_eq!(
            LeadField::Industry.resolve(&lead),
            Some(FieldValue::Text("제조업".to_string()))
        );
        assert_eq!(
            LeadField::TaxDelinquency.resolve(&lead),
            Some(FieldValue::Bool(false))
        );
        assert_eq!(LeadField::Region.resolve(&lead), None);
    }
}
