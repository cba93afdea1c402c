use std::sync::Arc;

use encoding_rs::EUC_KR;
use leadflow::workflows::intake::mapper::{FieldMapping, SystemField};
use leadflow::workflows::intake::parser::FileFormat;
use leadflow::workflows::intake::LeadImporter;
use leadflow::workflows::leads::{
    GradeId, GradeSource, InMemoryLeadRepository, LeadIntakeService, LeadRepository,
    ReclassifyMode, StandardIntakeConfig,
};

fn phone_mapping() -> Vec<FieldMapping> {
    vec![FieldMapping {
        csv_column: "연락처".to_string(),
        system_field: SystemField::Phone,
        is_required: true,
        display_order: 1,
    }]
}

fn service_with_store() -> (
    LeadIntakeService<InMemoryLeadRepository, StandardIntakeConfig>,
    Arc<InMemoryLeadRepository>,
) {
    let repository = Arc::new(InMemoryLeadRepository::new());
    let service = LeadIntakeService::new(repository.clone(), Arc::new(StandardIntakeConfig));
    (service, repository)
}

#[test]
fn korean_header_row_maps_to_a_lead() {
    let csv = "연락처,업체명\n010-1234-5678,테스트회사\n";
    let outcome = LeadImporter::from_bytes(csv.as_bytes(), FileFormat::Csv, &phone_mapping())
        .expect("import succeeds");

    assert_eq!(outcome.leads.len(), 1);
    assert_eq!(outcome.leads[0].lead.phone, "010-1234-5678");
    assert!(outcome.errors.is_empty());
}

#[test]
fn euc_kr_export_round_trips_through_the_full_pipeline() {
    let source = "연락처,업체명,연매출,세금체납\n010-1234-5678,한글상사,12억,무\n";
    let (encoded, _, _) = EUC_KR.encode(source);
    assert!(String::from_utf8(encoded.to_vec()).is_err());

    let (service, _) = service_with_store();
    let report = service
        .upload("한글상사.csv", &encoded)
        .expect("upload succeeds");

    assert_eq!(report.total_count, 1);
    assert_eq!(report.success_count, 1);
    // 12억 with clean tax standing satisfies the grade A rule.
    assert_eq!(report.grade_summary.get("A"), Some(&1));
}

#[test]
fn upload_returns_partial_success_with_itemized_failures() {
    let (service, _) = service_with_store();
    let first = "연락처,업체명\n010-1111-2222,기존회사\n";
    service
        .upload("first.csv", first.as_bytes())
        .expect("seed upload");

    let second = "연락처,업체명\n\
,전화없는회사\n\
010-1111-2222,중복회사\n\
010-3333-4444,신규회사\n";
    let report = service
        .upload("second.csv", second.as_bytes())
        .expect("upload succeeds");

    assert_eq!(report.total_count, 3);
    assert_eq!(report.success_count, 1);
    assert_eq!(report.duplicate_count, 1);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.errors[0].row, 2);
    assert_eq!(report.duplicates[0].phone, "010-1111-2222");
}

#[test]
fn uploaded_leads_carry_auto_grade_source() {
    let (service, repository) = service_with_store();
    let csv = "연락처,연매출,세금체납\n010-1234-5678,15억,무\n";
    service.upload("leads.csv", csv.as_bytes()).expect("upload");

    let records = repository.list().expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].grade_id, Some(GradeId("A".to_string())));
    assert_eq!(records[0].grade_source, GradeSource::Auto);
}

#[test]
fn manual_overrides_survive_auto_only_reclassification() {
    let (service, repository) = service_with_store();
    let csv = "연락처,연매출,세금체납\n010-1234-5678,15억,무\n";
    service.upload("leads.csv", csv.as_bytes()).expect("upload");

    let target = repository.list().expect("list")[0].id.clone();
    service
        .override_grade(&target, GradeId("D".to_string()))
        .expect("override");

    let report = service
        .reclassify(ReclassifyMode::AutoOnly)
        .expect("reclassify");
    assert_eq!(report.updated_count, 0);

    let record = service.get(&target).expect("fetch");
    assert_eq!(record.grade_id, Some(GradeId("D".to_string())));
    assert_eq!(record.grade_source, GradeSource::Manual);

    let report = service.reclassify(ReclassifyMode::All).expect("reclassify");
    assert_eq!(report.updated_count, 1);
    let record = service.get(&target).expect("fetch");
    assert_eq!(record.grade_id, Some(GradeId("A".to_string())));
    assert_eq!(record.grade_source, GradeSource::Auto);
}

#[test]
fn unmapped_and_missing_columns_are_reported_not_fatal() {
    let (service, _) = service_with_store();
    let csv = "연락처,희한한열\n010-1234-5678,값\n";
    let report = service.upload("leads.csv", csv.as_bytes()).expect("upload");

    assert_eq!(report.success_count, 1);
    assert!(report.unmapped_columns.contains(&"희한한열".to_string()));
    assert!(report.missing_columns.contains(&"연매출".to_string()));
}
