use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a state computes its R&D credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCreditMethod {
    /// Rate applied to the full year's QRE.
    FlatQre,
    /// Rate applied to QRE above the 3-year average prior QRE.
    ExcessOverAverage,
    /// Rate applied to the federal credit.
    PercentOfFederal,
}

impl StateCreditMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlatQre => "flat_qre",
            Self::ExcessOverAverage => "excess_over_average",
            Self::PercentOfFederal => "percent_of_federal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat_qre" => Some(Self::FlatQre),
            "excess_over_average" => Some(Self::ExcessOverAverage),
            "percent_of_federal" => Some(Self::PercentOfFederal),
            _ => None,
        }
    }
}

/// Static credit parameters for one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCreditRow {
    pub state_code: String,
    pub state_name: String,
    /// Credit rate as a fraction (e.g. `0.15`).
    pub credit_rate: Decimal,
    pub method: StateCreditMethod,
    pub available: bool,
}

/// Read-only reference table of state credit programs, keyed by state code.
///
/// Built once at startup; there is no write path after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCreditTable {
    version: String,
    rows: BTreeMap<String, StateCreditRow>,
}

impl StateCreditTable {
    /// Builds a table from rows. Codes are normalised to upper case; when a
    /// code appears twice the later row wins.
    pub fn new(
        version: impl Into<String>,
        rows: impl IntoIterator<Item = StateCreditRow>,
    ) -> Self {
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.state_code = normalize_code(&row.state_code);
                (row.state_code.clone(), row)
            })
            .collect();

        Self {
            version: version.into(),
            rows,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Case-insensitive lookup by state code.
    pub fn get(
        &self,
        state_code: &str,
    ) -> Option<&StateCreditRow> {
        self.rows.get(&normalize_code(state_code))
    }

    /// Row for `state_code` only when that state runs a credit program.
    pub fn available_program(
        &self,
        state_code: &str,
    ) -> Option<&StateCreditRow> {
        self.get(state_code).filter(|row| row.available)
    }

    /// Rows ordered by state code.
    pub fn rows(&self) -> impl Iterator<Item = &StateCreditRow> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn row(
        code: &str,
        rate: Decimal,
        available: bool,
    ) -> StateCreditRow {
        StateCreditRow {
            state_code: code.to_string(),
            state_name: format!("State {code}"),
            credit_rate: rate,
            method: StateCreditMethod::FlatQre,
            available,
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = StateCreditTable::new("test", [row("ca", dec!(0.15), true)]);

        assert_eq!(table.get("CA").map(|r| r.credit_rate), Some(dec!(0.15)));
        assert_eq!(table.get(" ca ").map(|r| r.state_code.as_str()), Some("CA"));
    }

    #[test]
    fn later_duplicate_row_wins() {
        let table = StateCreditTable::new(
            "test",
            [row("TX", dec!(0.05), true), row("tx", dec!(0.0874), true)],
        );

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("TX").map(|r| r.credit_rate), Some(dec!(0.0874)));
    }

    #[test]
    fn available_program_skips_states_without_credit() {
        let table = StateCreditTable::new(
            "test",
            [row("WA", dec!(0), false), row("AZ", dec!(0.24), true)],
        );

        assert!(table.available_program("WA").is_none());
        assert!(table.available_program("AZ").is_some());
        assert!(table.available_program("ZZ").is_none());
    }

    #[test]
    fn rows_are_ordered_by_code() {
        let table = StateCreditTable::new(
            "test",
            [row("TX", dec!(0.05), true), row("AZ", dec!(0.24), true)],
        );

        let codes: Vec<_> = table.rows().map(|r| r.state_code.as_str()).collect();

        assert_eq!(codes, vec!["AZ", "TX"]);
    }

    #[test]
    fn method_codes_parse() {
        assert_eq!(
            StateCreditMethod::parse("Excess_Over_Average"),
            Some(StateCreditMethod::ExcessOverAverage)
        );
        assert_eq!(StateCreditMethod::parse("bogus"), None);
    }
}
