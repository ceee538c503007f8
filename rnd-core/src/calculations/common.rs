//! Common utility functions for credit calculations.
//!
//! This module provides the rounding, clamping and zero-guarded arithmetic
//! shared by every stage of the engine. All helpers are total: they never
//! panic on a zero divisor and never return a negative amount where a
//! non-negative one is required.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// One hundred, the divisor for converting percent inputs to rates.
pub const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Largest amount accepted for any single money input ($1 quadrillion).
///
/// Keeps every product and sum the engine forms well inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero, matching the cent
/// rounding used on credit forms.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rnd_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rnd_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Floors a value at zero.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

/// Clamps a user-supplied percentage into `[0, 100]`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rnd_core::calculations::common::clamp_percentage;
///
/// assert_eq!(clamp_percentage(dec!(150)), dec!(100));
/// assert_eq!(clamp_percentage(dec!(-5)), dec!(0));
/// assert_eq!(clamp_percentage(dec!(42.5)), dec!(42.5));
/// ```
pub fn clamp_percentage(percent: Decimal) -> Decimal {
    percent.clamp(Decimal::ZERO, ONE_HUNDRED)
}

/// Clamps a money input into `[0, MAX_AMOUNT]`.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use rnd_core::calculations::common::{MAX_AMOUNT, clamp_amount};
///
/// assert_eq!(clamp_amount(dec!(-10)), dec!(0));
/// assert_eq!(clamp_amount(dec!(2500.50)), dec!(2500.50));
/// assert_eq!(clamp_amount(Decimal::MAX), MAX_AMOUNT);
/// ```
pub fn clamp_amount(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, MAX_AMOUNT)
}

/// Converts a percent value (`20` meaning 20%) into a fraction (`0.20`).
pub fn percent_to_rate(percent: Decimal) -> Decimal {
    percent / ONE_HUNDRED
}

/// Divides `numerator` by `denominator`, returning zero when the denominator
/// is zero (or the quotient does not fit in a `Decimal`).
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use rnd_core::calculations::common::safe_div;
///
/// assert_eq!(safe_div(dec!(10), dec!(4)), dec!(2.5));
/// assert_eq!(safe_div(dec!(10), Decimal::ZERO), Decimal::ZERO);
/// ```
pub fn safe_div(
    numerator: Decimal,
    denominator: Decimal,
) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}
