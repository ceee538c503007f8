//! Eligibility gate.
//!
//! Decides, before any money is computed, whether the assessment carries a
//! disqualifying factor and whether the minimal business profile is present.
//! Only a disqualifier stops the monetary computation; missing profile data
//! is reported but the calculation still proceeds.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{AssessmentInput, ProfileRequirement};

/// Sentinel selection meaning "no disqualifying factor applies".
pub const NO_DISQUALIFIERS: &str = "None of the above";

/// Disqualifying factors offered by the assessment questionnaire.
///
/// Any other non-blank string is still honoured as a disqualifier.
pub const DISQUALIFYING_FACTORS: [&str; 6] = [
    "Non-profit organization",
    "Government entity",
    "Research funded by grants or contracts",
    "Research conducted outside the United States",
    "Social sciences, arts, or humanities research",
    "Routine testing or quality control only",
];

/// Qualifying activities counted by the advisory score.
pub const QUALIFYING_ACTIVITIES: [&str; 8] = [
    "Developing new products",
    "Improving existing products",
    "Developing new processes",
    "Software development",
    "Building prototypes",
    "Testing and experimentation",
    "Engineering design",
    "Developing formulas or patents",
];

/// Disqualifying-factor selection with last-action-wins set semantics.
///
/// The [`NO_DISQUALIFIERS`] sentinel is mutually exclusive with every other
/// factor: selecting a factor clears the sentinel and selecting the sentinel
/// clears every factor.
///
/// # Example
///
/// ```
/// use rnd_core::calculations::eligibility::{DisqualifierSelection, NO_DISQUALIFIERS};
///
/// let selection = DisqualifierSelection::default()
///     .select("Non-profit organization")
///     .select(NO_DISQUALIFIERS);
///
/// assert!(!selection.has_disqualifier());
/// assert_eq!(selection.factors().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisqualifierSelection(BTreeSet<String>);

impl DisqualifierSelection {
    pub fn from_set(factors: BTreeSet<String>) -> Self {
        Self(factors)
    }

    /// Returns a new selection with `factor` added.
    pub fn select(
        mut self,
        factor: &str,
    ) -> Self {
        let factor = factor.trim();
        if factor.is_empty() {
            return self;
        }
        if factor == NO_DISQUALIFIERS {
            self.0.clear();
        } else {
            self.0.remove(NO_DISQUALIFIERS);
        }
        self.0.insert(factor.to_string());
        self
    }

    /// Returns a new selection with `factor` removed.
    pub fn deselect(
        mut self,
        factor: &str,
    ) -> Self {
        self.0.remove(factor.trim());
        self
    }

    pub fn factors(&self) -> &BTreeSet<String> {
        &self.0
    }

    pub fn into_set(self) -> BTreeSet<String> {
        self.0
    }

    /// Real disqualifiers: every non-blank entry other than the sentinel.
    pub fn disqualifiers(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .map(|factor| factor.trim())
            .filter(|factor| !factor.is_empty() && *factor != NO_DISQUALIFIERS)
    }

    pub fn has_disqualifier(&self) -> bool {
        self.disqualifiers().next().is_some()
    }
}

/// Outcome of the eligibility gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityOutcome {
    pub is_qualified: bool,
    pub has_disqualifier: bool,
    /// Advisory 0–100 score; never gates the computation.
    pub qualification_score: u8,
    pub disqualifiers: Vec<String>,
    pub missing_requirements: Vec<ProfileRequirement>,
}

/// Evaluates disqualifying factors and minimal profile requirements.
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityGate;

impl EligibilityGate {
    /// Runs the gate over an assessment snapshot.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use rnd_core::AssessmentInput;
    /// use rnd_core::calculations::eligibility::EligibilityGate;
    ///
    /// let mut input = AssessmentInput::default();
    /// input.current_wages = dec!(500000);
    /// input.rd_wage_percentage = dec!(20);
    /// input.disqualifying_factors.insert("Non-profit organization".to_string());
    ///
    /// let outcome = EligibilityGate.evaluate(&input);
    ///
    /// assert!(outcome.has_disqualifier);
    /// assert!(!outcome.is_qualified);
    /// ```
    pub fn evaluate(
        &self,
        input: &AssessmentInput,
    ) -> EligibilityOutcome {
        let disqualifiers = self.disqualifiers(input);
        let has_disqualifier = !disqualifiers.is_empty();
        let missing_requirements = self.missing_requirements(input);
        let qualification_score = self.qualification_score(&input.qualifying_activities);

        if has_disqualifier {
            debug!(?disqualifiers, "assessment carries disqualifying factors");
        }

        EligibilityOutcome {
            is_qualified: !has_disqualifier && missing_requirements.is_empty(),
            has_disqualifier,
            qualification_score,
            disqualifiers,
            missing_requirements,
        }
    }

    /// Collects explicit disqualifiers plus the one implied by the entity type.
    fn disqualifiers(
        &self,
        input: &AssessmentInput,
    ) -> Vec<String> {
        let selection = DisqualifierSelection::from_set(input.disqualifying_factors.clone());

        if selection.factors().contains(NO_DISQUALIFIERS) && selection.has_disqualifier() {
            warn!(
                factors = ?selection.factors(),
                "sentinel selected alongside disqualifying factors; factors take precedence"
            );
        }

        let mut found: BTreeSet<String> =
            selection.disqualifiers().map(str::to_string).collect();
        if let Some(implied) = input.entity_type.implied_disqualifier() {
            found.insert(implied.to_string());
        }
        found.into_iter().collect()
    }

    fn missing_requirements(
        &self,
        input: &AssessmentInput,
    ) -> Vec<ProfileRequirement> {
        let mut missing = Vec::new();
        if input.current_wages <= Decimal::ZERO {
            missing.push(ProfileRequirement::CurrentWages);
        }
        if input.rd_wage_percentage <= Decimal::ZERO {
            missing.push(ProfileRequirement::RdWagePercentage);
        }
        missing
    }

    /// Share of the qualifying activities selected, as a 0–100 score rounded
    /// half-up.
    fn qualification_score(
        &self,
        activities: &BTreeSet<String>,
    ) -> u8 {
        let total = QUALIFYING_ACTIVITIES.len();
        let selected = activities
            .iter()
            .map(|activity| activity.trim())
            .filter(|activity| !activity.is_empty())
            .collect::<BTreeSet<_>>()
            .len()
            .min(total);

        let score = (selected * 100 + total / 2) / total;
        u8::try_from(score.min(100)).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::EntityType;

    fn profiled_input() -> AssessmentInput {
        AssessmentInput {
            current_wages: dec!(500000),
            rd_wage_percentage: dec!(20),
            ..AssessmentInput::default()
        }
    }

    fn activities(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    // =========================================================================
    // DisqualifierSelection tests
    // =========================================================================

    #[test]
    fn selecting_factor_clears_sentinel() {
        let selection = DisqualifierSelection::default()
            .select(NO_DISQUALIFIERS)
            .select("Government entity");

        assert_eq!(
            selection.into_set(),
            activities(&["Government entity"])
        );
    }

    #[test]
    fn selecting_sentinel_clears_all_factors() {
        let selection = DisqualifierSelection::default()
            .select("Government entity")
            .select("Non-profit organization")
            .select(NO_DISQUALIFIERS);

        assert_eq!(selection.into_set(), activities(&[NO_DISQUALIFIERS]));
    }

    #[test]
    fn blank_selection_is_ignored() {
        let selection = DisqualifierSelection::default().select("   ");

        assert!(selection.factors().is_empty());
    }

    #[test]
    fn deselect_removes_factor() {
        let selection = DisqualifierSelection::default()
            .select("Government entity")
            .deselect("Government entity");

        assert!(!selection.has_disqualifier());
    }

    #[test]
    fn sentinel_alone_is_not_a_disqualifier() {
        let selection = DisqualifierSelection::from_set(activities(&[NO_DISQUALIFIERS]));

        assert!(!selection.has_disqualifier());
    }

    // =========================================================================
    // EligibilityGate::evaluate tests
    // =========================================================================

    #[test]
    fn empty_factor_list_qualifies() {
        let outcome = EligibilityGate.evaluate(&profiled_input());

        assert!(outcome.is_qualified);
        assert!(!outcome.has_disqualifier);
        assert!(outcome.disqualifiers.is_empty());
    }

    #[test]
    fn listed_factor_disqualifies() {
        let mut input = profiled_input();
        input.disqualifying_factors = activities(&["Non-profit organization"]);

        let outcome = EligibilityGate.evaluate(&input);

        assert!(outcome.has_disqualifier);
        assert!(!outcome.is_qualified);
        assert_eq!(outcome.disqualifiers, vec!["Non-profit organization"]);
    }

    #[test]
    fn unknown_factor_still_disqualifies() {
        let mut input = profiled_input();
        input.disqualifying_factors = activities(&["Foreign-owned shell company"]);

        let outcome = EligibilityGate.evaluate(&input);

        assert!(outcome.has_disqualifier);
    }

    #[test]
    fn factor_wins_over_sentinel_in_malformed_snapshot() {
        let _guard = crate::test_support::init_test_tracing();
        let mut input = profiled_input();
        input.disqualifying_factors = activities(&[NO_DISQUALIFIERS, "Government entity"]);

        let outcome = EligibilityGate.evaluate(&input);

        assert!(outcome.has_disqualifier);
        assert_eq!(outcome.disqualifiers, vec!["Government entity"]);
    }

    #[test]
    fn government_entity_type_implies_disqualifier() {
        let mut input = profiled_input();
        input.entity_type = EntityType::Government;

        let outcome = EligibilityGate.evaluate(&input);

        assert!(outcome.has_disqualifier);
        assert_eq!(outcome.disqualifiers, vec!["Government entity"]);
    }

    #[test]
    fn implied_and_explicit_disqualifier_are_not_duplicated() {
        let mut input = profiled_input();
        input.entity_type = EntityType::NonProfit;
        input.disqualifying_factors = activities(&["Non-profit organization"]);

        let outcome = EligibilityGate.evaluate(&input);

        assert_eq!(outcome.disqualifiers, vec!["Non-profit organization"]);
    }

    #[test]
    fn missing_wages_reported_without_disqualifying() {
        let outcome = EligibilityGate.evaluate(&AssessmentInput::default());

        assert!(!outcome.is_qualified);
        assert!(!outcome.has_disqualifier);
        assert_eq!(
            outcome.missing_requirements,
            vec![
                ProfileRequirement::CurrentWages,
                ProfileRequirement::RdWagePercentage
            ]
        );
    }

    // =========================================================================
    // qualification_score tests
    // =========================================================================

    #[test]
    fn score_is_zero_without_activities() {
        let result = EligibilityGate.qualification_score(&BTreeSet::new());

        assert_eq!(result, 0);
    }

    #[test]
    fn score_rounds_half_up() {
        let result = EligibilityGate.qualification_score(&activities(&["Software development"]));

        assert_eq!(result, 13); // 12.5 rounds up
    }

    #[test]
    fn score_is_proportional_to_selection_count() {
        let result = EligibilityGate.qualification_score(&activities(&QUALIFYING_ACTIVITIES[..4]));

        assert_eq!(result, 50);
    }

    #[test]
    fn score_caps_at_one_hundred() {
        let mut selected = activities(&QUALIFYING_ACTIVITIES);
        selected.insert("Custom activity".to_string());

        let result = EligibilityGate.qualification_score(&selected);

        assert_eq!(result, 100);
    }

    #[test]
    fn score_ignores_blank_entries() {
        let result = EligibilityGate.qualification_score(&activities(&["", "  "]));

        assert_eq!(result, 0);
    }
}
