use serde::{Deserialize, Serialize};

/// Free-text metadata displayed beside a grade tier in the assignment UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierNotes {
    pub title: Option<String>,
    pub description: Option<String>,
    pub note: Option<String>,
}

/// Configurable cutoffs for the fixed A/B/C/D eligibility tiers, in won.
///
/// Bands are contiguous and non-overlapping: grade B's upper bound must
/// equal grade A's lower bound. The invariant is enforced when the
/// configuration is edited, not at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityThresholds {
    pub grade_a_min: i64,
    pub grade_b_min: i64,
    pub grade_b_max: i64,
    #[serde(default)]
    pub grade_a_notes: TierNotes,
    #[serde(default)]
    pub grade_b_notes: TierNotes,
    #[serde(default)]
    pub grade_c_notes: TierNotes,
    #[serde(default)]
    pub grade_d_notes: TierNotes,
}

/// Validation errors raised when thresholds are edited.
#[derive(Debug, thiserror::Error)]
pub enum ThresholdError {
    #[error("grade bands are not contiguous: grade B max {found} must equal grade A min {expected}")]
    InvalidThresholdBand { expected: i64, found: i64 },
    #[error("grade B minimum {min} exceeds its maximum {max}")]
    InvertedBand { min: i64, max: i64 },
}

impl EligibilityThresholds {
    /// Demo configuration used by the CLI and the default server state.
    pub fn standard() -> Self {
        Self {
            grade_a_min: 600_000,
            grade_b_min: 300_000,
            grade_b_max: 600_000,
            grade_a_notes: TierNotes {
                title: Some("상위 등급".to_string()),
                description: Some("전월 납입 60만원 이상".to_string()),
                note: None,
            },
            grade_b_notes: TierNotes {
                title: Some("중위 등급".to_string()),
                description: Some("전월 납입 30만원 이상 60만원 미만".to_string()),
                note: None,
            },
            grade_c_notes: TierNotes {
                title: Some("신입 통과".to_string()),
                description: Some("신입 테스트 통과자".to_string()),
                note: None,
            },
            grade_d_notes: TierNotes {
                title: Some("교육생".to_string()),
                description: Some("신입 테스트 미통과".to_string()),
                note: None,
            },
        }
    }

    /// Enforce the contiguous-band invariant. Called before persisting an
    /// edited configuration.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        if self.grade_b_min > self.grade_b_max {
            return Err(ThresholdError::InvertedBand {
                min: self.grade_b_min,
                max: self.grade_b_max,
            });
        }
        if self.grade_b_max != self.grade_a_min {
            return Err(ThresholdError::InvalidThresholdBand {
                expected: self.grade_a_min,
                found: self.grade_b_max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_configuration_is_contiguous() {
        EligibilityThresholds::standard()
            .validate()
            .expect("standard bands contiguous");
    }

    #[test]
    fn gap_between_bands_is_rejected() {
        let thresholds = EligibilityThresholds {
            grade_b_max: 500_000,
            ..EligibilityThresholds::standard()
        };
        let error = thresholds.validate().expect_err("band gap");
        assert!(matches!(
            error,
            ThresholdError::InvalidThresholdBand {
                expected: 600_000,
                found: 500_000
            }
        ));
    }

    #[test]
    fn inverted_band_is_rejected() {
        let thresholds = EligibilityThresholds {
            grade_b_min: 700_000,
            ..EligibilityThresholds::standard()
        };
        let error = thresholds.validate().expect_err("inverted band");
        assert!(matches!(error, ThresholdError::InvertedBand { .. }));
    }
}
