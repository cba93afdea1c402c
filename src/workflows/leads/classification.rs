//! First-match grade classification over priority-ordered rules.

use serde::{Deserialize, Serialize};

use super::domain::{Grade, GradeId, Lead, LeadField};
use crate::workflows::rules::{
    self, Condition, ConditionTrace, LogicOperator, RuleValidationError,
};

/// A grade-assignment rule. Evaluation order comes from the owning grade's
/// priority, never from storage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub grade_id: GradeId,
    pub conditions: Vec<Condition<LeadField>>,
    pub logic: LogicOperator,
}

impl ClassificationRule {
    /// Authoring-time check: at least one non-blank condition must remain.
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        rules::active_conditions(&self.conditions).map(|_| ())
    }
}

/// Audit entry for one rule evaluation, keyed by the rule's grade.
#[derive(Debug, Clone, Serialize)]
pub struct GradeEvaluation {
    pub grade_id: GradeId,
    pub grade_name: String,
    pub priority: i32,
    pub matched: bool,
    pub conditions: Vec<ConditionTrace>,
}

/// Result of classifying a single lead.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Winning grade, or the default grade, or `None` without a default.
    pub grade_id: Option<GradeId>,
    /// Whether a rule matched (as opposed to the default-grade fallback).
    pub matched: bool,
    /// Every rule's evaluation in priority order, for the rule-testing UI.
    pub log: Vec<GradeEvaluation>,
}

struct RankedRule {
    priority: i32,
    grade_name: String,
    rule: ClassificationRule,
}

/// Stateless classifier holding the grade list and pre-sorted rules.
pub struct ClassificationEngine {
    grades: Vec<Grade>,
    rules: Vec<RankedRule>,
}

impl ClassificationEngine {
    pub fn new(mut grades: Vec<Grade>, rules: Vec<ClassificationRule>) -> Self {
        grades.sort_by_key(|grade| grade.priority);

        let mut ranked: Vec<RankedRule> = rules
            .into_iter()
            .map(|rule| {
                let grade = grades.iter().find(|grade| grade.id == rule.grade_id);
                RankedRule {
                    // Rules pointing at an unknown grade sink to the bottom.
                    priority: grade.map(|grade| grade.priority).unwrap_or(i32::MAX),
                    grade_name: grade
                        .map(|grade| grade.name.clone())
                        .unwrap_or_else(|| rule.grade_id.0.clone()),
                    rule,
                }
            })
            .collect();
        // Explicit pre-sort; storage ordering is never trusted.
        ranked.sort_by_key(|entry| entry.priority);

        Self {
            grades,
            rules: ranked,
        }
    }

    pub fn grades(&self) -> &[Grade] {
        &self.grades
    }

    pub fn grade(&self, id: &GradeId) -> Option<&Grade> {
        self.grades.iter().find(|grade| &grade.id == id)
    }

    pub fn default_grade(&self) -> Option<&Grade> {
        self.grades.iter().find(|grade| grade.is_default)
    }

    /// Classify a lead. The first matching rule in ascending grade-priority
    /// order wins; later rules are still evaluated for the audit log.
    pub fn classify(&self, lead: &Lead) -> Classification {
        let mut winner: Option<GradeId> = None;
        let mut log = Vec::with_capacity(self.rules.len());

        for entry in &self.rules {
            let active: Vec<&Condition<LeadField>> = entry
                .rule
                .conditions
                .iter()
                .filter(|condition| !condition.is_blank())
                .collect();

            let traces: Vec<ConditionTrace> = active
                .iter()
                .map(|condition| condition.evaluate(condition.field.resolve(lead).as_ref()))
                .collect();

            let results: Vec<bool> = traces.iter().map(|trace| trace.satisfied).collect();
            let matched = !active.is_empty() && rules::combine(entry.rule.logic, &results);

            if matched && winner.is_none() {
                winner = Some(entry.rule.grade_id.clone());
            }

            log.push(GradeEvaluation {
                grade_id: entry.rule.grade_id.clone(),
                grade_name: entry.grade_name.clone(),
                priority: entry.priority,
                matched,
                conditions: traces,
            });
        }

        let matched = winner.is_some();
        let grade_id = winner.or_else(|| self.default_grade().map(|grade| grade.id.clone()));

        Classification {
            grade_id,
            matched,
            log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::rules::{ConditionValue, Operator};

    fn grade(id: &str, priority: i32, is_default: bool) -> Grade {
        Grade {
            id: GradeId(id.to_string()),
            name: id.to_string(),
            priority,
            is_default,
        }
    }

    fn revenue_rule(grade_id: &str, minimum: f64) -> ClassificationRule {
        ClassificationRule {
            grade_id: GradeId(grade_id.to_string()),
            conditions: vec![Condition {
                field: LeadField::AnnualRevenue,
                operator: Operator::Gte,
                value: ConditionValue::Number(minimum),
            }],
            logic: LogicOperator::And,
        }
    }

    fn lead_with_revenue(revenue: f64) -> Lead {
        Lead {
            phone: "010-1234-5678".to_string(),
            annual_revenue: Some(revenue),
            ..Lead::default()
        }
    }

    #[test]
    fn first_matching_rule_wins_in_priority_order() {
        // Grade A (priority 1) requires revenue >= 10, grade B (priority 2)
        // requires revenue >= 5. A lead at 12 satisfies both; A must win.
        let engine = ClassificationEngine::new(
            vec![grade("A", 1, false), grade("B", 2, false), grade("C", 3, true)],
            vec![revenue_rule("B", 5.0), revenue_rule("A", 10.0)],
        );

        let classification = engine.classify(&lead_with_revenue(12.0));
        assert!(classification.matched);
        assert_eq!(classification.grade_id, Some(GradeId("A".to_string())));
    }

    #[test]
    fn storage_order_does_not_leak_into_evaluation_order() {
        let engine = ClassificationEngine::new(
            vec![grade("A", 1, false), grade("B", 2, false)],
            // Deliberately supplied B-first.
            vec![revenue_rule("B", 5.0), revenue_rule("A", 10.0)],
        );

        let log = engine.classify(&lead_with_revenue(3.0)).log;
        assert_eq!(log[0].grade_id, GradeId("A".to_string()));
        assert_eq!(log[1].grade_id, GradeId("B".to_string()));
    }

    #[test]
    fn unmatched_leads_fall_back_to_the_default_grade() {
        let engine = ClassificationEngine::new(
            vec![grade("A", 1, false), grade("D", 4, true)],
            vec![revenue_rule("A", 10.0)],
        );

        let classification = engine.classify(&lead_with_revenue(2.0));
        assert!(!classification.matched);
        assert_eq!(classification.grade_id, Some(GradeId("D".to_string())));
    }

    #[test]
    fn without_a_default_grade_the_result_is_none() {
        let engine = ClassificationEngine::new(
            vec![grade("A", 1, false)],
            vec![revenue_rule("A", 10.0)],
        );

        let classification = engine.classify(&lead_with_revenue(2.0));
        assert_eq!(classification.grade_id, None);
    }

    #[test]
    fn or_rules_match_on_any_condition() {
        let rule = ClassificationRule {
            grade_id: GradeId("A".to_string()),
            conditions: vec![
                Condition {
                    field: LeadField::AnnualRevenue,
                    operator: Operator::Gte,
                    value: ConditionValue::Number(100.0),
                },
                Condition {
                    field: LeadField::Region,
                    operator: Operator::Eq,
                    value: ConditionValue::Text("서울".to_string()),
                },
            ],
            logic: LogicOperator::Or,
        };
        let engine = ClassificationEngine::new(vec![grade("A", 1, false)], vec![rule]);

        let mut lead = lead_with_revenue(1.0);
        lead.region = Some("서울".to_string());
        assert!(engine.classify(&lead).matched);
    }

    #[test]
    fn evaluation_log_captures_expected_and_actual_values() {
        let engine = ClassificationEngine::new(
            vec![grade("A", 1, false), grade("B", 2, true)],
            vec![revenue_rule("A", 10.0)],
        );

        let classification = engine.classify(&lead_with_revenue(7.0));
        let entry = &classification.log[0];
        assert!(!entry.matched);
        assert_eq!(entry.conditions[0].field, "annual_revenue");
        assert_eq!(entry.conditions[0].expected, "10");
        assert_eq!(entry.conditions[0].actual, "7");
    }

    #[test]
    fn blank_only_rules_never_match() {
        let rule = ClassificationRule {
            grade_id: GradeId("A".to_string()),
            conditions: vec![Condition {
                field: LeadField::Region,
                operator: Operator::Eq,
                value: ConditionValue::Text("  ".to_string()),
            }],
            logic: LogicOperator::And,
        };
        assert!(rule.validate().is_err());

        let engine = ClassificationEngine::new(vec![grade("A", 1, false)], vec![rule]);
        assert!(!engine.classify(&lead_with_revenue(50.0)).matched);
    }
}
