//! Distribution eligibility: fixed A/B/C/D tiers over configurable
//! thresholds, plus administrator-defined distribution rules.

pub mod directory;
pub mod domain;
pub mod eligibility;
pub mod router;
pub mod rules;
pub mod service;
pub mod thresholds;

pub use directory::{DirectoryError, InMemoryMemberDirectory, MemberDirectory};
pub use domain::{
    previous_period, Member, MemberId, MemberLevel, MemberQualification, MemberStanding,
    MonthlyPerformance, PerformanceDetail, TeamGroup,
};
pub use eligibility::{
    EligibilityEngine, EligibilityPartition, GradeBreakdown, GradeTier, MemberEligibility,
};
pub use router::distribution_router;
pub use rules::{DistributionRule, DistributionRuleSet, ExclusionTag, RulePartition};
pub use service::{DistributionService, DistributionServiceError};
pub use thresholds::{EligibilityThresholds, ThresholdError, TierNotes};
