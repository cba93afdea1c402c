use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use super::directory::{DirectoryError, MemberDirectory};
use super::domain::{previous_period, MemberLevel, MemberStanding};
use super::eligibility::{EligibilityEngine, EligibilityPartition, GradeTier};
use super::rules::{DistributionRuleSet, RulePartition};
use super::thresholds::EligibilityThresholds;

/// Error raised by the distribution service.
#[derive(Debug, thiserror::Error)]
pub enum DistributionServiceError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Service joining the member directory with the eligibility and
/// distribution-rule engines. Everything here is read-side and advisory.
pub struct DistributionService<D> {
    directory: Arc<D>,
    engine: EligibilityEngine,
    rules: DistributionRuleSet,
}

impl<D> DistributionService<D>
where
    D: MemberDirectory + 'static,
{
    pub fn new(
        directory: Arc<D>,
        thresholds: EligibilityThresholds,
        rules: DistributionRuleSet,
    ) -> Self {
        Self {
            directory,
            engine: EligibilityEngine::new(thresholds),
            rules,
        }
    }

    /// Fixed-tier eligibility partition for a grade. Without an explicit
    /// period, performance comes from the month before `today`.
    pub fn eligibility(
        &self,
        tier: GradeTier,
        period: Option<(i32, u32)>,
        today: NaiveDate,
    ) -> Result<EligibilityPartition, DistributionServiceError> {
        let standings = self.standings(period, today)?;
        Ok(self.engine.evaluate(tier, &standings))
    }

    /// Distribution-rule partition for a grade over the same standings.
    pub fn rule_eligibility(
        &self,
        tier: GradeTier,
        period: Option<(i32, u32)>,
        today: NaiveDate,
    ) -> Result<RulePartition, DistributionServiceError> {
        let standings = self.standings(period, today)?;
        Ok(self.rules.evaluate(tier, &standings))
    }

    fn standings(
        &self,
        period: Option<(i32, u32)>,
        today: NaiveDate,
    ) -> Result<Vec<MemberStanding>, DistributionServiceError> {
        let (year, month) = period.unwrap_or_else(|| previous_period(today));

        let mut standings = Vec::new();
        for member in self.directory.members()? {
            let qualification = self.directory.qualification(&member.id)?;
            let (level, newbie_test_passed) = match qualification {
                Some(qualification) => (qualification.level, qualification.newbie_test_passed),
                None => {
                    warn!(member = %member.id.0, "member has no qualification row");
                    (MemberLevel::Trainee, false)
                }
            };

            let monthly_payment = self
                .directory
                .monthly_performance(&member.id, year, month)?
                .map(|performance| performance.total_monthly_payment)
                .unwrap_or(0);

            standings.push(MemberStanding {
                member,
                level,
                newbie_test_passed,
                monthly_payment,
            });
        }

        Ok(standings)
    }
}
