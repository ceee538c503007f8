//! End-to-end scenarios against the public engine API.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use rnd_core::calculations::common::round_half_up;
use rnd_core::{
    AssessmentInput, CreditEngine, CreditMethod, EngineConfig, EntityType, HistoricalYear,
    StateCreditMethod, StateCreditRow, StateCreditTable, YearKind,
};

fn engine() -> CreditEngine {
    let states = StateCreditTable::new(
        "test",
        [StateCreditRow {
            state_code: "AZ".to_string(),
            state_name: "Arizona".to_string(),
            credit_rate: dec!(0.24),
            method: StateCreditMethod::ExcessOverAverage,
            available: true,
        }],
    );
    CreditEngine::new(EngineConfig::default(), Arc::new(states)).unwrap()
}

fn base_input() -> AssessmentInput {
    AssessmentInput {
        company_name: "Acme Robotics".to_string(),
        tax_year: 2025,
        entity_type: EntityType::CCorporation,
        current_revenue: dec!(2500000),
        current_wages: dec!(500000),
        rd_wage_percentage: dec!(20),
        ..AssessmentInput::default()
    }
}

fn history(
    revenue: Decimal,
    wages: Decimal,
) -> Vec<HistoricalYear> {
    (1..=3)
        .map(|offset| HistoricalYear {
            year: 2025 - offset,
            revenue,
            w2_wages: wages,
            ..HistoricalYear::default()
        })
        .collect()
}

// =============================================================================
// Scenario A: first-year company
// =============================================================================

#[test]
fn first_year_company_uses_startup_asc_rate() {
    let input = AssessmentInput {
        qualifying_activity_years: 0,
        ..base_input()
    };

    let result = engine().calculate(&input);
    let current = &result.current_year;

    assert_eq!(current.qualified_wages, dec!(100000.00));
    assert_eq!(current.asc_rate, dec!(0.06));
    assert_eq!(current.asc_credit, round_half_up(current.total_qre * dec!(0.06)));
    assert!(!current.traditional_available);
    assert_eq!(current.traditional_credit, dec!(0));
    assert_eq!(current.best_method, CreditMethod::Asc);
    assert!(result.is_qualified);
}

// =============================================================================
// Scenario B: disqualifying factor
// =============================================================================

#[test]
fn non_profit_factor_zeroes_every_credit() {
    let mut input = AssessmentInput {
        qualifying_activity_years: 6,
        growth_rate: dec!(25),
        historical_years: history(dec!(2000000), dec!(450000)),
        state: "AZ".to_string(),
        ..base_input()
    };
    input
        .disqualifying_factors
        .insert("Non-profit organization".to_string());

    let result = engine().calculate(&input);

    assert_eq!(result.total_credit, dec!(0));
    assert_eq!(result.total_value_n_years, dec!(0));
    assert!(!result.is_qualified);
    assert!(result.has_disqualifier);
    assert_eq!(result.disqualifiers, vec!["Non-profit organization".to_string()]);
}

// =============================================================================
// Scenario C: growth floor
// =============================================================================

#[test]
fn low_growth_rate_is_floored_at_five_percent() {
    let input = AssessmentInput {
        growth_rate: dec!(2),
        ..base_input()
    };

    let result = engine().calculate(&input);

    assert_eq!(result.future.growth_rate_applied, dec!(0.05));
    let wages: Vec<Decimal> = result.future.years.iter().map(|y| y.total_wages).collect();
    assert_eq!(wages, vec![dec!(525000.00), dec!(551250.00), dec!(578812.50)]);
    assert!(result.future.years.iter().all(|y| y.kind == YearKind::Projected));
}

// =============================================================================
// Scenario D: no usable history
// =============================================================================

#[test]
fn zero_history_closes_lookback() {
    let input = AssessmentInput {
        historical_years: history(Decimal::ZERO, Decimal::ZERO),
        ..base_input()
    };

    let result = engine().calculate(&input);

    assert!(!result.lookback.can_lookback);
    assert_eq!(result.lookback.total, dec!(0));
    assert!(result.lookback.years.is_empty());
}

// =============================================================================
// Further end-to-end behaviour
// =============================================================================

#[test]
fn established_company_with_history_gets_lookback_and_state_credit() {
    let input = AssessmentInput {
        state: "az".to_string(),
        qualifying_activity_years: 8,
        historical_years: history(dec!(2000000), dec!(450000)),
        ..base_input()
    };

    let result = engine().calculate(&input);

    assert!(result.state.program_available);
    assert!(result.current_year.state_credit > Decimal::ZERO);
    assert!(result.current_year.traditional_available);
    let lookback: Vec<i32> = result.lookback.years.iter().map(|y| y.tax_year).collect();
    assert_eq!(lookback, vec![2024, 2023, 2022]);
    assert_eq!(
        result.lookback.total,
        result.lookback.years.iter().map(|y| y.total_credit).sum::<Decimal>()
    );
}

#[test]
fn state_credit_is_a_share_of_the_chosen_credit() {
    let input = AssessmentInput {
        state: "AZ".to_string(),
        ..base_input()
    };

    let result = engine().calculate(&input);

    for year in result.all_years() {
        assert_eq!(year.federal_credit + year.state_credit, year.chosen_credit);
        assert_eq!(year.total_credit, year.chosen_credit);
        assert_eq!(year.net_benefit, year.chosen_credit - year.fees.total);
    }
    assert_eq!(result.total_credit, result.total_value_n_years);
}

#[test]
fn previously_claimed_years_close_lookback() {
    let input = AssessmentInput {
        rd_credit_years_previously_claimed: 3,
        historical_years: history(dec!(2000000), dec!(450000)),
        ..base_input()
    };

    let result = engine().calculate(&input);

    assert!(!result.lookback.can_lookback);
}

#[test]
fn empty_snapshot_is_computed_without_panicking() {
    let result = engine().calculate(&AssessmentInput::default());

    assert!(!result.is_qualified);
    assert_eq!(result.total_credit, dec!(0));
    assert_eq!(result.roi, dec!(0));
    assert_eq!(result.future.years.len(), 3);
}

#[test]
fn small_business_gets_payroll_offset() {
    let result = engine().calculate(&base_input());

    assert!(result.qsb.eligible);
    assert_eq!(
        result.qsb.applicable_offset,
        result.current_year.federal_credit.min(dec!(500000))
    );
}

#[test]
fn result_serializes_in_camel_case() {
    let result = engine().calculate(&base_input());

    let json = serde_json::to_value(&result).unwrap();

    assert!(json.get("isQualified").is_some());
    assert!(json.get("totalValueNYears").is_some());
    assert_eq!(json["currentYear"]["bestMethod"], "ASC");
    assert_eq!(json["future"]["years"].as_array().map(Vec::len), Some(3));
}
