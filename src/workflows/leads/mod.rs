//! Lead records, grade classification, and the upload/reclassify service.

pub mod classification;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use classification::{Classification, ClassificationEngine, ClassificationRule};
pub use domain::{Grade, GradeId, GradeSource, Lead, LeadField};
pub use repository::{InMemoryLeadRepository, LeadId, LeadRecord, LeadRepository};
pub use router::lead_router;
pub use service::{
    IntakeConfigSource, LeadIntakeService, LeadServiceError, ReclassifyMode, ReclassifyReport,
    StandardIntakeConfig, UploadReport,
};
