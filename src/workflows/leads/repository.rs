use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::domain::{GradeId, GradeSource, Lead};

/// Identifier wrapper for persisted leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

/// Persisted lead row with its classification metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: LeadId,
    pub batch_id: String,
    pub lead: Lead,
    pub grade_id: Option<GradeId>,
    pub grade_source: GradeSource,
}

/// Storage abstraction so intake and reclassification can be exercised in
/// isolation.
pub trait LeadRepository: Send + Sync {
    fn insert(&self, record: LeadRecord) -> Result<LeadRecord, RepositoryError>;
    fn update(&self, record: LeadRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<LeadRecord>, RepositoryError>;
    fn find_by_phone(&self, phone: &str) -> Result<Option<LeadRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Insertion-ordered in-memory store backing the default server state and
/// the test suites.
#[derive(Default)]
pub struct InMemoryLeadRepository {
    records: Mutex<Vec<LeadRecord>>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeadRepository for InMemoryLeadRepository {
    fn insert(&self, record: LeadRecord) -> Result<LeadRecord, RepositoryError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("lead store poisoned".to_string()))?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        records.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: LeadRecord) -> Result<(), RepositoryError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("lead store poisoned".to_string()))?;
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        let records = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("lead store poisoned".to_string()))?;
        Ok(records.iter().find(|record| &record.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<LeadRecord>, RepositoryError> {
        let records = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("lead store poisoned".to_string()))?;
        Ok(records.clone())
    }

    fn find_by_phone(&self, phone: &str) -> Result<Option<LeadRecord>, RepositoryError> {
        let records = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("lead store poisoned".to_string()))?;
        Ok(records
            .iter()
            .find(|record| record.lead.phone == phone)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, phone: &str) -> LeadRecord {
        LeadRecord {
            id: LeadId(id.to_string()),
            batch_id: "batch-000001".to_string(),
            lead: Lead {
                phone: phone.to_string(),
                ..Lead::default()
            },
            grade_id: None,
            grade_source: GradeSource::Auto,
        }
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let repository = InMemoryLeadRepository::new();
        repository
            .insert(record("lead-1", "010-1234-5678"))
            .expect("first insert");
        let error = repository
            .insert(record("lead-1", "010-9999-0000"))
            .expect_err("duplicate id");
        assert!(matches!(error, RepositoryError::Conflict));
    }

    #[test]
    fn find_by_phone_matches_canonical_form() {
        let repository = InMemoryLeadRepository::new();
        repository
            .insert(record("lead-1", "010-1234-5678"))
            .expect("insert");
        assert!(repository
            .find_by_phone("010-1234-5678")
            .expect("lookup")
            .is_some());
        assert!(repository
            .find_by_phone("010-0000-0000")
            .expect("lookup")
            .is_none());
    }

    #[test]
    fn update_requires_an_existing_record() {
        let repository = InMemoryLeadRepository::new();
        let error = repository
            .update(record("lead-9", "010-1234-5678"))
            .expect_err("missing record");
        assert!(matches!(error, RepositoryError::NotFound));
    }
}
