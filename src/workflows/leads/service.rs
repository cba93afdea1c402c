use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::classification::{ClassificationEngine, ClassificationRule};
use super::domain::{Grade, GradeId, GradeSource, LeadField};
use super::repository::{LeadId, LeadRecord, LeadRepository, RepositoryError};
use crate::workflows::intake::mapper::{FieldMapping, SystemField};
use crate::workflows::intake::parser::{FileFormat, RowIssue};
use crate::workflows::intake::{LeadImportError, LeadImporter};
use crate::workflows::rules::{Condition, ConditionValue, LogicOperator, Operator};

/// Configuration read at upload time: column mappings, grades, and the
/// active classification rules.
pub trait IntakeConfigSource: Send + Sync {
    fn field_mappings(&self) -> Vec<FieldMapping>;
    fn grades(&self) -> Vec<Grade>;
    fn rules(&self) -> Vec<ClassificationRule>;
}

/// Built-in configuration mirroring a typical Korean business lead export.
/// Backs the CLI import command and the default server state.
pub struct StandardIntakeConfig;

impl IntakeConfigSource for StandardIntakeConfig {
    fn field_mappings(&self) -> Vec<FieldMapping> {
        const COLUMNS: &[(&str, SystemField, bool)] = &[
            ("연락처", SystemField::Phone, true),
            ("업체명", SystemField::CompanyName, false),
            ("대표자명", SystemField::RepresentativeName, false),
            ("업종", SystemField::Industry, false),
            ("지역", SystemField::Region, false),
            ("사업형태", SystemField::BusinessType, false),
            ("통화가능시간", SystemField::AvailableTime, false),
            ("세금체납", SystemField::TaxDelinquency, false),
            ("연매출", SystemField::AnnualRevenue, false),
            ("직원수", SystemField::EmployeeCount, false),
            ("캠페인명", SystemField::CampaignName, false),
            ("광고명", SystemField::AdName, false),
            ("일자", SystemField::SourceDate, false),
        ];

        COLUMNS
            .iter()
            .enumerate()
            .map(|(index, (column, field, required))| FieldMapping {
                csv_column: (*column).to_string(),
                system_field: *field,
                is_required: *required,
                display_order: index as i32 + 1,
            })
            .collect()
    }

    fn grades(&self) -> Vec<Grade> {
        let grade = |id: &str, priority: i32, is_default: bool| Grade {
            id: GradeId(id.to_string()),
            name: id.to_string(),
            priority,
            is_default,
        };
        vec![
            grade("A", 1, false),
            grade("B", 2, false),
            grade("C", 3, false),
            grade("D", 4, true),
        ]
    }

    fn rules(&self) -> Vec<ClassificationRule> {
        let condition = |field, operator, value| Condition {
            field,
            operator,
            value,
        };
        vec![
            // A: established companies with clean tax standing.
            ClassificationRule {
                grade_id: GradeId("A".to_string()),
                conditions: vec![
                    condition(
                        LeadField::AnnualRevenue,
                        Operator::Gte,
                        ConditionValue::Number(10.0),
                    ),
                    condition(
                        LeadField::TaxDelinquency,
                        Operator::Eq,
                        ConditionValue::Bool(false),
                    ),
                ],
                logic: LogicOperator::And,
            },
            // B: mid-size revenue.
            ClassificationRule {
                grade_id: GradeId("B".to_string()),
                conditions: vec![condition(
                    LeadField::AnnualRevenue,
                    Operator::Gte,
                    ConditionValue::Number(5.0),
                )],
                logic: LogicOperator::And,
            },
            // C: small but staffed.
            ClassificationRule {
                grade_id: GradeId("C".to_string()),
                conditions: vec![condition(
                    LeadField::EmployeeCount,
                    Operator::Gte,
                    ConditionValue::Number(5.0),
                )],
                logic: LogicOperator::And,
            },
        ]
    }
}

/// Which persisted leads a reclassification run may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclassifyMode {
    /// Skip leads whose grade was overridden by a human.
    AutoOnly,
    /// Reclassify everything, reverting manual overrides to `auto`.
    All,
}

/// Duplicate row detail surfaced in the upload report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateLead {
    pub row: usize,
    pub phone: String,
}

/// Summary returned for one upload batch.
#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub batch_id: String,
    pub total_count: usize,
    pub success_count: usize,
    pub duplicate_count: usize,
    pub error_count: usize,
    pub grade_summary: BTreeMap<String, usize>,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
    pub duplicates: Vec<DuplicateLead>,
    pub mapped_columns: Vec<String>,
    pub unmapped_columns: Vec<String>,
    pub missing_columns: Vec<String>,
}

/// Summary returned for a reclassification run.
#[derive(Debug, Serialize)]
pub struct ReclassifyReport {
    pub total_count: usize,
    pub updated_count: usize,
    pub grade_summary: BTreeMap<String, usize>,
}

/// Error raised by the lead intake service.
#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error(transparent)]
    Import(#[from] LeadImportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

static BATCH_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static LEAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_batch_id() -> String {
    let id = BATCH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("batch-{id:06}")
}

fn next_lead_id() -> LeadId {
    let id = LEAD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeadId(format!("lead-{id:06}"))
}

/// Service composing the importer, classification engine, and lead store.
pub struct LeadIntakeService<R, C> {
    repository: Arc<R>,
    config: Arc<C>,
}

impl<R, C> LeadIntakeService<R, C>
where
    R: LeadRepository + 'static,
    C: IntakeConfigSource + 'static,
{
    pub fn new(repository: Arc<R>, config: Arc<C>) -> Self {
        Self { repository, config }
    }

    /// Ingest one uploaded spreadsheet: parse, map, de-duplicate by phone,
    /// classify, and persist. Row failures never abort the batch.
    pub fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<UploadReport, LeadServiceError> {
        let format = FileFormat::from_file_name(file_name).map_err(LeadImportError::from)?;
        let mappings = self.config.field_mappings();
        let outcome = LeadImporter::from_bytes(bytes, format, &mappings)?;

        let engine = ClassificationEngine::new(self.config.grades(), self.config.rules());
        let batch_id = next_batch_id();

        let mut grade_summary: BTreeMap<String, usize> = BTreeMap::new();
        let mut duplicates = Vec::new();
        let mut success_count = 0;
        let mut seen_phones: HashSet<String> = HashSet::new();

        for mapped in outcome.leads {
            let phone = mapped.lead.phone.clone();
            let duplicate_in_batch = !seen_phones.insert(phone.clone());
            if duplicate_in_batch || self.repository.find_by_phone(&phone)?.is_some() {
                duplicates.push(DuplicateLead {
                    row: mapped.row,
                    phone,
                });
                continue;
            }

            let classification = engine.classify(&mapped.lead);
            let summary_key = grade_summary_key(&engine, classification.grade_id.as_ref());
            *grade_summary.entry(summary_key).or_insert(0) += 1;

            self.repository.insert(LeadRecord {
                id: next_lead_id(),
                batch_id: batch_id.clone(),
                lead: mapped.lead,
                grade_id: classification.grade_id,
                grade_source: GradeSource::Auto,
            })?;
            success_count += 1;
        }

        let report = UploadReport {
            batch_id,
            total_count: outcome.total_rows,
            success_count,
            duplicate_count: duplicates.len(),
            error_count: outcome.errors.len(),
            grade_summary,
            errors: outcome.errors,
            warnings: outcome.warnings,
            duplicates,
            mapped_columns: outcome.audit.mapped,
            unmapped_columns: outcome.audit.unmapped,
            missing_columns: outcome.audit.missing,
        };

        info!(
            batch_id = %report.batch_id,
            total = report.total_count,
            success = report.success_count,
            duplicates = report.duplicate_count,
            errors = report.error_count,
            "lead upload processed"
        );

        Ok(report)
    }

    /// Re-run classification over persisted leads.
    pub fn reclassify(&self, mode: ReclassifyMode) -> Result<ReclassifyReport, LeadServiceError> {
        let engine = ClassificationEngine::new(self.config.grades(), self.config.rules());
        let records = self.repository.list()?;
        let total_count = records.len();

        let mut updated_count = 0;
        let mut grade_summary: BTreeMap<String, usize> = BTreeMap::new();

        for mut record in records {
            if mode == ReclassifyMode::AutoOnly && record.grade_source == GradeSource::Manual {
                let key = grade_summary_key(&engine, record.grade_id.as_ref());
                *grade_summary.entry(key).or_insert(0) += 1;
                continue;
            }

            let classification = engine.classify(&record.lead);
            let key = grade_summary_key(&engine, classification.grade_id.as_ref());
            *grade_summary.entry(key).or_insert(0) += 1;

            if classification.grade_id != record.grade_id
                || record.grade_source == GradeSource::Manual
            {
                record.grade_id = classification.grade_id;
                record.grade_source = GradeSource::Auto;
                self.repository.update(record)?;
                updated_count += 1;
            }
        }

        info!(total = total_count, updated = updated_count, ?mode, "reclassification finished");

        Ok(ReclassifyReport {
            total_count,
            updated_count,
            grade_summary,
        })
    }

    /// Human grade override; the lead stops participating in `auto_only`
    /// reclassification from this point on.
    pub fn override_grade(
        &self,
        id: &LeadId,
        grade_id: GradeId,
    ) -> Result<LeadRecord, LeadServiceError> {
        let mut record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        record.grade_id = Some(grade_id);
        record.grade_source = GradeSource::Manual;
        self.repository.update(record.clone())?;
        Ok(record)
    }

    /// Fetch a single lead record for API responses.
    pub fn get(&self, id: &LeadId) -> Result<LeadRecord, LeadServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

fn grade_summary_key(engine: &ClassificationEngine, grade_id: Option<&GradeId>) -> String {
    match grade_id {
        Some(id) => engine
            .grade(id)
            .map(|grade| grade.name.clone())
            .unwrap_or_else(|| id.0.clone()),
        None => "unclassified".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leads::repository::InMemoryLeadRepository;

    fn service() -> LeadIntakeService<InMemoryLeadRepository, StandardIntakeConfig> {
        LeadIntakeService::new(
            Arc::new(InMemoryLeadRepository::new()),
            Arc::new(StandardIntakeConfig),
        )
    }

    const SAMPLE_CSV: &str = "연락처,업체명,연매출,세금체납\n\
010-1234-5678,대형회사,15억,무\n\
010-2222-3333,중형회사,7억,무\n\
010-4444-5555,소형회사,1억,무\n";

    #[test]
    fn upload_classifies_and_persists_leads() {
        let service = service();
        let report = service
            .upload("leads.csv", SAMPLE_CSV.as_bytes())
            .expect("upload succeeds");

        assert_eq!(report.total_count, 3);
        assert_eq!(report.success_count, 3);
        assert_eq!(report.duplicate_count, 0);
        assert_eq!(report.grade_summary.get("A"), Some(&1));
        assert_eq!(report.grade_summary.get("B"), Some(&1));
        // No rule matched the small lead; it falls to the default grade.
        assert_eq!(report.grade_summary.get("D"), Some(&1));
    }

    #[test]
    fn upload_reports_duplicates_within_batch_and_against_store() {
        let service = service();
        service
            .upload("first.csv", SAMPLE_CSV.as_bytes())
            .expect("first upload");

        let csv = "연락처\n010-1234-5678\n010-7777-8888\n010-7777-8888\n";
        let report = service
            .upload("second.csv", csv.as_bytes())
            .expect("second upload");

        assert_eq!(report.total_count, 3);
        assert_eq!(report.success_count, 1);
        assert_eq!(report.duplicate_count, 2);
        let phones: Vec<&str> = report
            .duplicates
            .iter()
            .map(|duplicate| duplicate.phone.as_str())
            .collect();
        assert_eq!(phones, vec!["010-1234-5678", "010-7777-8888"]);
    }

    #[test]
    fn upload_rejects_unsupported_formats() {
        let service = service();
        let error = service
            .upload("leads.pdf", b"whatever")
            .expect_err("pdf rejected");
        assert!(matches!(error, LeadServiceError::Import(_)));
    }

    #[test]
    fn auto_only_reclassification_skips_manual_overrides() {
        let service = service();
        service
            .upload("leads.csv", SAMPLE_CSV.as_bytes())
            .expect("upload");

        let records = service.repository.list().expect("list");
        let target = records
            .iter()
            .find(|record| record.lead.phone == "010-1234-5678")
            .expect("lead present");
        service
            .override_grade(&target.id, GradeId("C".to_string()))
            .expect("override");

        let report = service
            .reclassify(ReclassifyMode::AutoOnly)
            .expect("reclassify");
        assert_eq!(report.total_count, 3);
        assert_eq!(report.updated_count, 0);

        let record = service.get(&target.id).expect("fetch");
        assert_eq!(record.grade_id, Some(GradeId("C".to_string())));
        assert_eq!(record.grade_source, GradeSource::Manual);
    }

    #[test]
    fn full_reclassification_reverts_manual_overrides() {
        let service = service();
        service
            .upload("leads.csv", SAMPLE_CSV.as_bytes())
            .expect("upload");

        let records = service.repository.list().expect("list");
        let target = records
            .iter()
            .find(|record| record.lead.phone == "010-1234-5678")
            .expect("lead present");
        service
            .override_grade(&target.id, GradeId("C".to_string()))
            .expect("override");

        let report = service.reclassify(ReclassifyMode::All).expect("reclassify");
        assert_eq!(report.updated_count, 1);

        let record = service.get(&target.id).expect("fetch");
        assert_eq!(record.grade_id, Some(GradeId("A".to_string())));
        assert_eq!(record.grade_source, GradeSource::Auto);
    }
}
