//! Administrator-defined distribution rules: arbitrary conditions over
//! member attributes plus named exclusion tags, generalizing the fixed
//! threshold tiers. Like those tiers, the outcome is advisory only.

use serde::{Deserialize, Serialize};

use super::domain::{group_by_team, Member, MemberField, MemberStanding, TeamGroup, TeamRanked};
use super::eligibility::GradeTier;
use crate::workflows::rules::{
    self, Condition, ConditionValue, LogicOperator, Operator, RuleValidationError,
};

/// Named exclusion attached to a rule. A tag is evaluated against the
/// referenced grade's own rule conditions (exclusions are not chased
/// transitively, which keeps cyclic configurations well-defined).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionTag {
    AlreadyEligibleFor(GradeTier),
}

/// One administrator-defined rule for a grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRule {
    pub grade: GradeTier,
    pub conditions: Vec<Condition<MemberField>>,
    pub logic: LogicOperator,
    #[serde(default)]
    pub exclusions: Vec<ExclusionTag>,
}

impl DistributionRule {
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        rules::active_conditions(&self.conditions).map(|_| ())
    }
}

/// One member's assessment against a grade's distribution rules.
#[derive(Debug, Clone, Serialize)]
pub struct RuleAssessment {
    pub member: Member,
    pub monthly_payment: i64,
    pub is_eligible: bool,
    pub reason: String,
}

impl TeamRanked for RuleAssessment {
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

/// Advisory partition produced by the rule engine.
#[derive(Debug, Serialize)]
pub struct RulePartition {
    pub grade: GradeTier,
    pub eligible_members: Vec<TeamGroup<RuleAssessment>>,
    pub ineligible_members: Vec<TeamGroup<RuleAssessment>>,
}

/// The full set of active distribution rules. Construction validates every
/// rule, so blank-only condition lists are rejected before they can match
/// everything or nothing at runtime.
#[derive(Debug)]
pub struct DistributionRuleSet {
    rules: Vec<DistributionRule>,
}

impl DistributionRuleSet {
    pub fn new(rules: Vec<DistributionRule>) -> Result<Self, RuleValidationError> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    /// Demo rule set mirroring the fixed tier semantics, with grade C
    /// expressed through exclusion tags.
    pub fn standard() -> Self {
        let payment = |operator, value| Condition {
            field: MemberField::MonthlyPayment,
            operator,
            value: ConditionValue::Number(value),
        };

        let rules = vec![
            DistributionRule {
                grade: GradeTier::A,
                conditions: vec![payment(Operator::Gte, 600_000.0)],
                logic: LogicOperator::And,
                exclusions: Vec::new(),
            },
            DistributionRule {
                grade: GradeTier::B,
                conditions: vec![
                    payment(Operator::Gte, 300_000.0),
                    payment(Operator::Lt, 600_000.0),
                ],
                logic: LogicOperator::And,
                exclusions: Vec::new(),
            },
            DistributionRule {
                grade: GradeTier::C,
                conditions: vec![Condition {
                    field: MemberField::NewbieTestPassed,
                    operator: Operator::Eq,
                    value: ConditionValue::Bool(true),
                }],
                logic: LogicOperator::And,
                exclusions: vec![
                    ExclusionTag::AlreadyEligibleFor(GradeTier::A),
                    ExclusionTag::AlreadyEligibleFor(GradeTier::B),
                ],
            },
            DistributionRule {
                grade: GradeTier::D,
                conditions: vec![Condition {
                    field: MemberField::Level,
                    operator: Operator::Eq,
                    value: ConditionValue::Text("trainee".to_string()),
                }],
                logic: LogicOperator::And,
                exclusions: Vec::new(),
            },
        ];

        // Literal, non-blank conditions; no runtime validation needed.
        Self { rules }
    }

    /// A member is eligible for a grade iff any of that grade's rules
    /// matches and none of the matching rule's exclusions apply.
    pub fn member_eligible(&self, grade: GradeTier, standing: &MemberStanding) -> (bool, String) {
        let mut excluded_by: Option<GradeTier> = None;
        let mut saw_rule = false;

        for rule in self.rules_for(grade) {
            saw_rule = true;
            if !conditions_match(rule, standing) {
                continue;
            }

            match rule
                .exclusions
                .iter()
                .find(|tag| self.exclusion_applies(tag, standing))
            {
                Some(ExclusionTag::AlreadyEligibleFor(excluding)) => {
                    excluded_by = Some(*excluding);
                }
                None => {
                    return (
                        true,
                        format!("matched distribution rule for grade {}", grade.label()),
                    );
                }
            }
        }

        let reason = match (saw_rule, excluded_by) {
            (_, Some(excluding)) => format!(
                "excluded: already eligible for grade {}",
                excluding.label()
            ),
            (true, None) => "no distribution rule conditions matched".to_string(),
            (false, None) => format!("no distribution rule configured for grade {}", grade.label()),
        };
        (false, reason)
    }

    /// Evaluate all candidates for one grade and partition for display.
    pub fn evaluate(&self, grade: GradeTier, standings: &[MemberStanding]) -> RulePartition {
        let mut eligible = Vec::new();
        let mut ineligible = Vec::new();

        for standing in standings {
            let (is_eligible, reason) = self.member_eligible(grade, standing);
            let assessment = RuleAssessment {
                member: standing.member.clone(),
                monthly_payment: standing.monthly_payment,
                is_eligible,
                reason,
            };
            if is_eligible {
                eligible.push(assessment);
            } else {
                ineligible.push(assessment);
            }
        }

        RulePartition {
            grade,
            eligible_members: group_by_team(eligible),
            ineligible_members: group_by_team(ineligible),
        }
    }

    fn rules_for(&self, grade: GradeTier) -> impl Iterator<Item = &DistributionRule> {
        self.rules.iter().filter(move |rule| rule.grade == grade)
    }

    /// Exclusion tags only consult the referenced grade's conditions.
    fn exclusion_applies(&self, tag: &ExclusionTag, standing: &MemberStanding) -> bool {
        match tag {
            ExclusionTag::AlreadyEligibleFor(grade) => self
                .rules_for(*grade)
                .any(|rule| conditions_match(rule, standing)),
        }
    }
}

fn conditions_match(rule: &DistributionRule, standing: &MemberStanding) -> bool {
    let active: Vec<&Condition<MemberField>> = rule
        .conditions
        .iter()
        .filter(|condition| !condition.is_blank())
        .collect();
    if active.is_empty() {
        return false;
    }

    let results: Vec<bool> = active
        .iter()
        .map(|condition| {
            condition
                .evaluate(condition.field.resolve(standing).as_ref())
                .satisfied
        })
        .collect();
    rules::combine(rule.logic, &results)
}
