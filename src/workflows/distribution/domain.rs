use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::workflows::rules::{FieldValue, RuleField};

/// Identifier wrapper for sales members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(pub String);

/// A sales member eligible to receive distributed leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub team: String,
}

/// Seniority ladder used by the eligibility tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberLevel {
    Trainee,
    Regular,
    Senior,
}

impl MemberLevel {
    pub const fn label(self) -> &'static str {
        match self {
            MemberLevel::Trainee => "trainee",
            MemberLevel::Regular => "regular",
            MemberLevel::Senior => "senior",
        }
    }
}

/// One-to-one qualification data for a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberQualification {
    pub member_id: MemberId,
    pub level: MemberLevel,
    pub newbie_test_passed: bool,
}

/// A single commission-bearing event inside one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceDetail {
    pub member_id: MemberId,
    pub year: i32,
    pub month: u32,
    pub payment: i64,
    pub commission: i64,
}

/// Aggregated commission-bearing activity for a member in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPerformance {
    pub member_id: MemberId,
    pub year: i32,
    pub month: u32,
    pub total_monthly_payment: i64,
    pub total_commission: i64,
    pub contract_count: u32,
}

impl MonthlyPerformance {
    /// Sum the detail rows belonging to one member/period.
    pub fn aggregate(
        member_id: &MemberId,
        year: i32,
        month: u32,
        details: &[PerformanceDetail],
    ) -> Self {
        let mut total_monthly_payment = 0;
        let mut total_commission = 0;
        let mut contract_count = 0;
        for detail in details {
            if &detail.member_id == member_id && detail.year == year && detail.month == month {
                total_monthly_payment += detail.payment;
                total_commission += detail.commission;
                contract_count += 1;
            }
        }

        Self {
            member_id: member_id.clone(),
            year,
            month,
            total_monthly_payment,
            total_commission,
            contract_count,
        }
    }
}

/// The prior calendar month relative to the given date.
pub fn previous_period(today: NaiveDate) -> (i32, u32) {
    if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    }
}

/// A member joined with qualification and prior-period performance.
/// A missing performance row is represented as a zero payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStanding {
    pub member: Member,
    pub level: MemberLevel,
    pub newbie_test_passed: bool,
    pub monthly_payment: i64,
}

/// Member attributes addressable from distribution rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberField {
    MonthlyPayment,
    Level,
    NewbieTestPassed,
}

impl RuleField for MemberField {
    fn label(self) -> &'static str {
        match self {
            MemberField::MonthlyPayment => "monthly_payment",
            MemberField::Level => "level",
            MemberField::NewbieTestPassed => "newbie_test_passed",
        }
    }
}

impl MemberField {
    pub fn resolve(self, standing: &MemberStanding) -> Option<FieldValue> {
        match self {
            MemberField::MonthlyPayment => {
                Some(FieldValue::Number(standing.monthly_payment as f64))
            }
            MemberField::Level => Some(FieldValue::Text(standing.level.label().to_string())),
            MemberField::NewbieTestPassed => Some(FieldValue::Bool(standing.newbie_test_passed)),
        }
    }
}

/// One team's slice of an eligibility partition.
#[derive(Debug, Clone, Serialize)]
pub struct TeamGroup<T> {
    pub team: String,
    pub members: Vec<T>,
}

/// Anything groupable into the team-ordered, payment-ranked display shape.
pub trait TeamRanked {
    fn team(&self) -> &str;
    fn monthly_payment(&self) -> i64;
    fn member_name(&self) -> &str;
}

/// Group items by team (team names ascending) and rank members inside each
/// team by monthly payment descending, name as the tie-break.
pub fn group_by_team<T: TeamRanked>(items: Vec<T>) -> Vec<TeamGroup<T>> {
    let mut by_team: std::collections::BTreeMap<String, Vec<T>> = std::collections::BTreeMap::new();
    for item in items {
        by_team.entry(item.team().to_string()).or_default().push(item);
    }

    by_team
        .into_iter()
        .map(|(team, mut members)| {
            members.sort_by(|a, b| {
                b.monthly_payment()
                    .cmp(&a.monthly_payment())
                    .then_with(|| a.member_name().cmp(b.member_name()))
            });
            TeamGroup { team, members }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_sums_only_the_requested_period() {
        let member = MemberId("m-1".to_string());
        let other = MemberId("m-2".to_string());
        let details = vec![
            PerformanceDetail {
                member_id: member.clone(),
                year: 2025,
                month: 7,
                payment: 400_000,
                commission: 40_000,
            },
            PerformanceDetail {
                member_id: member.clone(),
                year: 2025,
                month: 7,
                payment: 350_000,
                commission: 35_000,
            },
            PerformanceDetail {
                member_id: member.clone(),
                year: 2025,
                month: 6,
                payment: 900_000,
                commission: 90_000,
            },
            PerformanceDetail {
                member_id: other,
                year: 2025,
                month: 7,
                payment: 100_000,
                commission: 10_000,
            },
        ];

        let summary = MonthlyPerformance::aggregate(&member, 2025, 7, &details);
        assert_eq!(summary.total_monthly_payment, 750_000);
        assert_eq!(summary.total_commission, 75_000);
        assert_eq!(summary.contract_count, 2);
    }

    #[test]
    fn previous_period_wraps_the_year_boundary() {
        let january = NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date");
        assert_eq!(previous_period(january), (2024, 12));

        let august = NaiveDate::from_ymd_opt(2025, 8, 8).expect("valid date");
        assert_eq!(previous_period(august), (2025, 7));
    }
}
