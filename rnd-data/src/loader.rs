use std::io::Read;

use rnd_core::{StateCreditMethod, StateCreditRow, StateCreditTable};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading state credit reference data.
#[derive(Debug, Error)]
pub enum StateCreditLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid state code '{0}': expected two letters")]
    InvalidStateCode(String),

    #[error("Invalid credit method '{method}' for state {state_code}")]
    InvalidMethod { state_code: String, method: String },

    #[error("Invalid credit rate {rate} for state {state_code}: must be between 0 and 1")]
    InvalidRate { state_code: String, rate: Decimal },
}

impl From<csv::Error> for StateCreditLoaderError {
    fn from(err: csv::Error) -> Self {
        StateCreditLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the state credits CSV file.
///
/// - `state_code`: two-letter postal code (e.g., `CA`)
/// - `state_name`: display name
/// - `credit_rate`: credit rate as a fraction (e.g., `0.15` for 15%)
/// - `method`: `flat_qre`, `excess_over_average` or `percent_of_federal`
/// - `available`: whether the state runs a credit program (`true`/`false`,
///   `yes`/`no`, `1`/`0`; empty means no)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateCreditRecord {
    pub state_code: String,
    pub state_name: String,
    pub credit_rate: Decimal,
    pub method: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub available: bool,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") => Ok(false),
        Some("true" | "yes" | "y" | "1") => Ok(true),
        Some("false" | "no" | "n" | "0") => Ok(false),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid availability flag '{other}'"
        ))),
    }
}

impl StateCreditRecord {
    fn into_row(self) -> Result<StateCreditRow, StateCreditLoaderError> {
        let state_code = self.state_code.trim().to_ascii_uppercase();
        if state_code.len() != 2 || !state_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(StateCreditLoaderError::InvalidStateCode(self.state_code));
        }

        let method = StateCreditMethod::parse(&self.method).ok_or_else(|| {
            StateCreditLoaderError::InvalidMethod {
                state_code: state_code.clone(),
                method: self.method.clone(),
            }
        })?;

        if self.credit_rate < Decimal::ZERO || self.credit_rate > Decimal::ONE {
            return Err(StateCreditLoaderError::InvalidRate {
                state_code,
                rate: self.credit_rate,
            });
        }

        Ok(StateCreditRow {
            state_code,
            state_name: self.state_name.trim().to_string(),
            credit_rate: self.credit_rate,
            method,
            available: self.available,
        })
    }
}

/// Loader for the per-state credit reference table.
pub struct StateCreditLoader;

impl StateCreditLoader {
    /// Parse state credit records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<StateCreditRecord>, StateCreditLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: StateCreditRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Validate records and build an immutable table.
    ///
    /// When a state appears more than once the last record wins.
    pub fn build(
        version: &str,
        records: Vec<StateCreditRecord>,
    ) -> Result<StateCreditTable, StateCreditLoaderError> {
        let rows = records
            .into_iter()
            .map(StateCreditRecord::into_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StateCreditTable::new(version, rows))
    }

    /// Parse and build in one step.
    pub fn load<R: Read>(
        version: &str,
        reader: R,
    ) -> Result<StateCreditTable, StateCreditLoaderError> {
        let records = Self::parse(reader)?;
        Self::build(version, records)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "state_code,state_name,credit_rate,method,available\n";

    fn csv(body: &str) -> String {
        format!("{HEADER}{body}")
    }

    #[test]
    fn test_parse_single_record() {
        let records = StateCreditLoader::parse(csv("CA,California,0.15,excess_over_average,true").as_bytes())
            .expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![StateCreditRecord {
                state_code: "CA".to_string(),
                state_name: "California".to_string(),
                credit_rate: dec!(0.15),
                method: "excess_over_average".to_string(),
                available: true,
            }]
        );
    }

    #[test]
    fn test_parse_flag_variants() {
        let records = StateCreditLoader::parse(
            csv("AZ,Arizona,0.24,flat_qre,yes\nWA,Washington,0,flat_qre,\nTX,Texas,0.0874,flat_qre,1")
                .as_bytes(),
        )
        .expect("Failed to parse CSV");

        let flags: Vec<bool> = records.iter().map(|r| r.available).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_parse_invalid_flag() {
        let result = StateCreditLoader::parse(csv("AZ,Arizona,0.24,flat_qre,maybe").as_bytes());

        let err = result.expect_err("Should fail for invalid flag");
        let StateCreditLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("maybe"), "Expected flag in error, got: {}", msg);
    }

    #[test]
    fn test_parse_bad_decimal() {
        let result = StateCreditLoader::parse(csv("AZ,Arizona,abc,flat_qre,true").as_bytes());

        assert!(matches!(result, Err(StateCreditLoaderError::CsvParse(_))));
    }

    #[test]
    fn test_parse_missing_column() {
        let result = StateCreditLoader::parse("state_code,state_name\nAZ,Arizona".as_bytes());

        let err = result.expect_err("Should fail for missing column");
        let StateCreditLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "got: {}", msg);
    }

    #[test]
    fn test_load_normalises_codes_and_trims() {
        let table = StateCreditLoader::load("v1", csv(" ca , California ,0.15,flat_qre,true").as_bytes())
            .expect("Failed to load");

        let row = table.get("CA").expect("CA present");
        assert_eq!(row.state_code, "CA");
        assert_eq!(row.state_name, "California");
        assert_eq!(table.version(), "v1");
    }

    #[test]
    fn test_load_rejects_unknown_method() {
        let result = StateCreditLoader::load("v1", csv("CA,California,0.15,bogus,true").as_bytes());

        match result {
            Err(StateCreditLoaderError::InvalidMethod { state_code, method }) => {
                assert_eq!(state_code, "CA");
                assert_eq!(method, "bogus");
            }
            other => panic!("expected InvalidMethod, got {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_rate_above_one() {
        let result = StateCreditLoader::load("v1", csv("CA,California,15,flat_qre,true").as_bytes());

        assert!(matches!(
            result,
            Err(StateCreditLoaderError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_load_rejects_bad_state_code() {
        let result = StateCreditLoader::load("v1", csv("CAL,California,0.15,flat_qre,true").as_bytes());

        assert!(matches!(
            result,
            Err(StateCreditLoaderError::InvalidStateCode(code)) if code == "CAL"
        ));
    }

    #[test]
    fn test_load_empty_csv() {
        let table = StateCreditLoader::load("v1", HEADER.as_bytes()).expect("Failed to load");

        assert!(table.is_empty());
    }
}
