use chrono::NaiveDate;

use super::domain::{
    previous_period, Member, MemberId, MemberLevel, MemberQualification, MonthlyPerformance,
    PerformanceDetail,
};

/// Read-side storage abstraction joining members, qualification, and
/// performance data.
pub trait MemberDirectory: Send + Sync {
    fn members(&self) -> Result<Vec<Member>, DirectoryError>;
    fn qualification(&self, id: &MemberId) -> Result<Option<MemberQualification>, DirectoryError>;
    fn monthly_performance(
        &self,
        id: &MemberId,
        year: i32,
        month: u32,
    ) -> Result<Option<MonthlyPerformance>, DirectoryError>;
}

/// Error enumeration for directory failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("member directory unavailable: {0}")]
    Unavailable(String),
}

/// In-memory directory backing the default server state and tests.
#[derive(Default)]
pub struct InMemoryMemberDirectory {
    members: Vec<Member>,
    qualifications: Vec<MemberQualification>,
    details: Vec<PerformanceDetail>,
}

impl InMemoryMemberDirectory {
    pub fn new(
        members: Vec<Member>,
        qualifications: Vec<MemberQualification>,
        details: Vec<PerformanceDetail>,
    ) -> Self {
        Self {
            members,
            qualifications,
            details,
        }
    }

    /// Demo roster with performance rows landing in the month before
    /// `today`, so eligibility reports have data to show.
    pub fn demo_at(today: NaiveDate) -> Self {
        let (year, month) = previous_period(today);
        let member = |id: &str, name: &str, team: &str| Member {
            id: MemberId(id.to_string()),
            name: name.to_string(),
            team: team.to_string(),
        };
        let qualification = |id: &str, level, passed| MemberQualification {
            member_id: MemberId(id.to_string()),
            level,
            newbie_test_passed: passed,
        };
        let detail = |id: &str, payment: i64, commission: i64| PerformanceDetail {
            member_id: MemberId(id.to_string()),
            year,
            month,
            payment,
            commission,
        };

        Self::new(
            vec![
                member("m-001", "김영업", "1팀"),
                member("m-002", "이성장", "1팀"),
                member("m-003", "박신입", "2팀"),
                member("m-004", "최교육", "2팀"),
            ],
            vec![
                qualification("m-001", MemberLevel::Senior, true),
                qualification("m-002", MemberLevel::Regular, true),
                qualification("m-003", MemberLevel::Regular, true),
                qualification("m-004", MemberLevel::Trainee, false),
            ],
            vec![
                detail("m-001", 450_000, 45_000),
                detail("m-001", 300_000, 30_000),
                detail("m-002", 420_000, 42_000),
                detail("m-003", 120_000, 12_000),
            ],
        )
    }
}

impl MemberDirectory for InMemoryMemberDirectory {
    fn members(&self) -> Result<Vec<Member>, DirectoryError> {
        Ok(self.members.clone())
    }

    fn qualification(&self, id: &MemberId) -> Result<Option<MemberQualification>, DirectoryError> {
        Ok(self
            .qualifications
            .iter()
            .find(|qualification| &qualification.member_id == id)
            .cloned())
    }

    fn monthly_performance(
        &self,
        id: &MemberId,
        year: i32,
        month: u32,
    ) -> Result<Option<MonthlyPerformance>, DirectoryError> {
        let summary = MonthlyPerformance::aggregate(id, year, month, &self.details);
        if summary.contract_count == 0 {
            return Ok(None);
        }
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_directory_reports_prior_month_performance() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 8).expect("valid date");
        let directory = InMemoryMemberDirectory::demo_at(today);

        let top = directory
            .monthly_performance(&MemberId("m-001".to_string()), 2025, 7)
            .expect("lookup")
            .expect("performance present");
        assert_eq!(top.total_monthly_payment, 750_000);
        assert_eq!(top.contract_count, 2);

        // The trainee has no detail rows at all.
        let idle = directory
            .monthly_performance(&MemberId("m-004".to_string()), 2025, 7)
            .expect("lookup");
        assert!(idle.is_none());
    }
}
