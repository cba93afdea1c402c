//! Fixed-tier eligibility evaluation: which members may receive leads of a
//! given grade, based on qualification and prior-month performance.
//!
//! Eligibility is advisory. It annotates the assignment UI and never blocks
//! an assignment.

use serde::{Deserialize, Serialize};

use super::domain::{group_by_team, Member, MemberLevel, MemberStanding, TeamGroup, TeamRanked};
use super::thresholds::EligibilityThresholds;

/// The fixed grade tiers the threshold configuration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeTier {
    A,
    B,
    C,
    D,
}

impl GradeTier {
    pub const fn label(self) -> &'static str {
        match self {
            GradeTier::A => "A",
            GradeTier::B => "B",
            GradeTier::C => "C",
            GradeTier::D => "D",
        }
    }
}

impl std::str::FromStr for GradeTier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(GradeTier::A),
            "B" => Ok(GradeTier::B),
            "C" => Ok(GradeTier::C),
            "D" => Ok(GradeTier::D),
            other => Err(format!("unknown grade tier '{other}'")),
        }
    }
}

/// Per-tier eligibility flags for one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GradeBreakdown {
    pub grade_a: bool,
    pub grade_b: bool,
    pub grade_c: bool,
    pub grade_d: bool,
}

impl GradeBreakdown {
    pub const fn for_tier(self, tier: GradeTier) -> bool {
        match tier {
            GradeTier::A => self.grade_a,
            GradeTier::B => self.grade_b,
            GradeTier::C => self.grade_c,
            GradeTier::D => self.grade_d,
        }
    }
}

/// One member's annotated eligibility result.
#[derive(Debug, Clone, Serialize)]
pub struct MemberEligibility {
    pub member: Member,
    pub monthly_payment: i64,
    pub eligibility: GradeBreakdown,
    pub is_eligible_for_grade: bool,
    pub eligibility_reason: String,
}

impl TeamRanked for MemberEligibility {
    fn team(&self) -> &str {
        &self.member.team
    }

    fn monthly_payment(&self) -> i64 {
        self.monthly_payment
    }

    fn member_name(&self) -> &str {
        &self.member.name
    }
}

/// Advisory partition consumed by the assignment UI.
#[derive(Debug, Serialize)]
pub struct EligibilityPartition {
    pub grade: GradeTier,
    pub eligible_members: Vec<TeamGroup<MemberEligibility>>,
    pub ineligible_members: Vec<TeamGroup<MemberEligibility>>,
}

/// Stateless evaluator applying the threshold configuration to members.
pub struct EligibilityEngine {
    thresholds: EligibilityThresholds,
}

impl EligibilityEngine {
    pub fn new(thresholds: EligibilityThresholds) -> Self {
        Self { thresholds }
    }

    /// Compute the full per-tier breakdown for one member.
    pub fn breakdown(&self, standing: &MemberStanding) -> GradeBreakdown {
        let payment = standing.monthly_payment;
        let grade_a = payment >= self.thresholds.grade_a_min;
        let grade_b = payment >= self.thresholds.grade_b_min && payment < self.thresholds.grade_b_max;
        // C is an explicit exclusion: test passed but not in the A or B band.
        let grade_c = standing.newbie_test_passed && !grade_a && !grade_b;
        let grade_d = standing.level == MemberLevel::Trainee;

        GradeBreakdown {
            grade_a,
            grade_b,
            grade_c,
            grade_d,
        }
    }

    /// Evaluate one member against a target tier.
    pub fn evaluate_member(&self, tier: GradeTier, standing: &MemberStanding) -> MemberEligibility {
        let eligibility = self.breakdown(standing);
        let is_eligible_for_grade = eligibility.for_tier(tier);
        let eligibility_reason = self.reason(tier, standing, eligibility);

        MemberEligibility {
            member: standing.member.clone(),
            monthly_payment: standing.monthly_payment,
            eligibility,
            is_eligible_for_grade,
            eligibility_reason,
        }
    }

    /// Evaluate all candidates and partition them for display, grouped by
    /// team and ranked by payment inside each team.
    pub fn evaluate(&self, tier: GradeTier, standings: &[MemberStanding]) -> EligibilityPartition {
        let mut eligible = Vec::new();
        let mut ineligible = Vec::new();
        for standing in standings {
            let evaluated = self.evaluate_member(tier, standing);
            if evaluated.is_eligible_for_grade {
                eligible.push(evaluated);
            } else {
                ineligible.push(evaluated);
            }
        }

        EligibilityPartition {
            grade: tier,
            eligible_members: group_by_team(eligible),
            ineligible_members: group_by_team(ineligible),
        }
    }

    fn reason(
        &self,
        tier: GradeTier,
        standing: &MemberStanding,
        breakdown: GradeBreakdown,
    ) -> String {
        let payment = standing.monthly_payment;
        match tier {
            GradeTier::A => {
                if breakdown.grade_a {
                    format!(
                        "monthly payment {payment} meets grade A minimum {}",
                        self.thresholds.grade_a_min
                    )
                } else {
                    format!(
                        "monthly payment {payment} below grade A minimum {}",
                        self.thresholds.grade_a_min
                    )
                }
            }
            GradeTier::B => {
                if breakdown.grade_b {
                    format!(
                        "monthly payment {payment} within grade B band [{}, {})",
                        self.thresholds.grade_b_min, self.thresholds.grade_b_max
                    )
                } else if payment >= self.thresholds.grade_b_max {
                    format!(
                        "monthly payment {payment} at or above grade B maximum {}",
                        self.thresholds.grade_b_max
                    )
                } else {
                    format!(
                        "monthly payment {payment} below grade B minimum {}",
                        self.thresholds.grade_b_min
                    )
                }
            }
            GradeTier::C => {
                if breakdown.grade_c {
                    "newbie test passed, below the grade A/B bands".to_string()
                } else if !standing.newbie_test_passed {
                    "newbie test not passed".to_string()
                } else {
                    format!("monthly payment {payment} already qualifies for a higher band")
                }
            }
            GradeTier::D => {
                if breakdown.grade_d {
                    "trainee level".to_string()
                } else {
                    format!("level {} is past trainee", standing.level.label())
                }
            }
        }
    }
}
