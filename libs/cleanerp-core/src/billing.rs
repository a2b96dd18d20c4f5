//! Billing frequency conversion
//!
//! Prices are quoted per billing cycle. Conversion pivots through the weekly
//! rate using a fixed weeks-per-cycle factor for each frequency. The monthly
//! factor (4.33) approximates 52/12, so converting there and back is not
//! exact; [`ROUND_TRIP_TOLERANCE`] bounds the accepted drift.

use crate::error::CleanErpError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted difference after a weekly → monthly → weekly round trip
/// of an amount with two decimal places.
pub const ROUND_TRIP_TOLERANCE: f64 = 0.01;

/// Billing cadence of a recurring price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingFrequency {
    Weekly,
    Fortnightly,
    Monthly,
    Quarterly,
    Annually,
}

impl BillingFrequency {
    /// All frequencies, shortest cycle first
    pub const ALL: [Self; 5] = [
        Self::Weekly,
        Self::Fortnightly,
        Self::Monthly,
        Self::Quarterly,
        Self::Annually,
    ];

    /// Number of weeks in one billing cycle
    #[must_use]
    pub const fn weeks_factor(self) -> f64 {
        match self {
            Self::Weekly => 1.0,
            Self::Fortnightly => 2.0,
            Self::Monthly => 4.33,
            Self::Quarterly => 13.0,
            Self::Annually => 52.0,
        }
    }

    /// Storage and wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Fortnightly => "fortnightly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annually => "annually",
        }
    }
}

impl fmt::Display for BillingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingFrequency {
    type Err = CleanErpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" => Ok(Self::Weekly),
            "fortnightly" | "fortnight" | "biweekly" => Ok(Self::Fortnightly),
            "monthly" | "month" => Ok(Self::Monthly),
            "quarterly" | "quarter" => Ok(Self::Quarterly),
            "annually" | "annual" | "yearly" => Ok(Self::Annually),
            _ => Err(CleanErpError::InvalidFrequency {
                value: s.to_string(),
            }),
        }
    }
}

/// Equivalent amounts for the three cadences shown on quotes and contracts
///
/// `weekly_rate` is the unrounded weekly pivot. The fortnightly and quarterly
/// views are computed from it, so they agree with [`convert_billing_amount`]
/// on the source amount.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BillingAmounts {
    pub weekly: f64,
    pub monthly: f64,
    pub annually: f64,
    #[serde(rename = "weeklyRate", default)]
    pub weekly_rate: f64,
}

impl BillingAmounts {
    /// Fortnightly equivalent of the source amount
    #[must_use]
    pub fn fortnightly(&self) -> f64 {
        self.at_rate(BillingFrequency::Fortnightly)
    }

    /// Quarterly equivalent of the source amount
    #[must_use]
    pub fn quarterly(&self) -> f64 {
        self.at_rate(BillingFrequency::Quarterly)
    }

    fn at_rate(&self, frequency: BillingFrequency) -> f64 {
        round_to_cents(self.weekly_rate * frequency.weeks_factor())
    }

    /// Amount for an arbitrary frequency
    #[must_use]
    pub fn for_frequency(&self, frequency: BillingFrequency) -> f64 {
        match frequency {
            BillingFrequency::Weekly => self.weekly,
            BillingFrequency::Fortnightly => self.fortnightly(),
            BillingFrequency::Monthly => self.monthly,
            BillingFrequency::Quarterly => self.quarterly(),
            BillingFrequency::Annually => self.annually,
        }
    }
}

impl std::ops::Add for BillingAmounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            weekly: round_to_cents(self.weekly + rhs.weekly),
            monthly: round_to_cents(self.monthly + rhs.monthly),
            annually: round_to_cents(self.annually + rhs.annually),
            weekly_rate: self.weekly_rate + rhs.weekly_rate,
        }
    }
}

impl std::iter::Sum for BillingAmounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, x| acc + x)
    }
}

/// Round to two decimal places, halves rounding towards positive infinity.
///
/// This matches `Math.round(x * 100) / 100`, which differs from
/// [`f64::round`] for negative halves.
#[must_use]
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Convert `amount` billed every `from` cycle into the amount billed every
/// `to` cycle.
///
/// No validation is performed: negative amounts convert like positive ones and
/// NaN or infinite amounts propagate.
#[must_use]
pub fn convert_billing_amount(amount: f64, from: BillingFrequency, to: BillingFrequency) -> f64 {
    let weekly_rate = amount / from.weeks_factor();
    round_to_cents(weekly_rate * to.weeks_factor())
}

/// Weekly, monthly and annual equivalents of `amount` billed at `frequency`.
///
/// Zero and NaN amounts yield all-zero amounts.
#[must_use]
pub fn calculate_all_billing_frequencies(amount: f64, frequency: BillingFrequency) -> BillingAmounts {
    if amount == 0.0 || amount.is_nan() {
        return BillingAmounts::default();
    }

    BillingAmounts {
        weekly: convert_billing_amount(amount, frequency, BillingFrequency::Weekly),
        monthly: convert_billing_amount(amount, frequency, BillingFrequency::Monthly),
        annually: convert_billing_amount(amount, frequency, BillingFrequency::Annually),
        weekly_rate: amount / frequency.weeks_factor(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weeks_factors() {
        assert_eq!(BillingFrequency::Weekly.weeks_factor(), 1.0);
        assert_eq!(BillingFrequency::Fortnightly.weeks_factor(), 2.0);
        assert_eq!(BillingFrequency::Monthly.weeks_factor(), 4.33);
        assert_eq!(BillingFrequency::Quarterly.weeks_factor(), 13.0);
        assert_eq!(BillingFrequency::Annually.weeks_factor(), 52.0);
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!(
            "Weekly".parse::<BillingFrequency>().unwrap(),
            BillingFrequency::Weekly
        );
        assert_eq!(
            " annually ".parse::<BillingFrequency>().unwrap(),
            BillingFrequency::Annually
        );
        assert_eq!(
            "yearly".parse::<BillingFrequency>().unwrap(),
            BillingFrequency::Annually
        );
        let err = "hourly".parse::<BillingFrequency>().unwrap_err();
        assert!(matches!(err, CleanErpError::InvalidFrequency { value } if value == "hourly"));
    }

    #[test]
    fn test_frequency_display_round_trip() {
        for frequency in BillingFrequency::ALL {
            assert_eq!(
                frequency.to_string().parse::<BillingFrequency>().unwrap(),
                frequency
            );
        }
    }

    #[test]
    fn test_frequency_serde() {
        let json = serde_json::to_string(&BillingFrequency::Fortnightly).unwrap();
        assert_eq!(json, "\"fortnightly\"");
        let parsed: BillingFrequency = serde_json::from_str("\"quarterly\"").unwrap();
        assert_eq!(parsed, BillingFrequency::Quarterly);
    }

    #[test]
    fn test_round_to_cents_matches_math_round() {
        assert_eq!(round_to_cents(1.005), 1.0);
        assert_eq!(round_to_cents(0.125), 0.13);
        assert_eq!(round_to_cents(-0.125), -0.12);
        assert_eq!(round_to_cents(-0.005), 0.0);
        assert_eq!(round_to_cents(10.0), 10.0);
    }

    #[test]
    fn test_weekly_to_monthly() {
        assert_eq!(
            convert_billing_amount(500.0, BillingFrequency::Weekly, BillingFrequency::Monthly),
            2165.0
        );
    }

    #[test]
    fn test_monthly_to_weekly() {
        assert_eq!(
            convert_billing_amount(2165.0, BillingFrequency::Monthly, BillingFrequency::Weekly),
            500.0
        );
        assert_eq!(
            convert_billing_amount(1000.0, BillingFrequency::Monthly, BillingFrequency::Weekly),
            round_to_cents(1000.0 / 4.33)
        );
    }

    #[test]
    fn test_quarterly_to_fortnightly() {
        assert_eq!(
            convert_billing_amount(
                1300.0,
                BillingFrequency::Quarterly,
                BillingFrequency::Fortnightly
            ),
            200.0
        );
    }

    #[test]
    fn test_negative_amount_converts() {
        assert_eq!(
            convert_billing_amount(-100.0, BillingFrequency::Weekly, BillingFrequency::Annually),
            -5200.0
        );
    }

    #[test]
    fn test_non_finite_amount_propagates() {
        assert!(
            convert_billing_amount(f64::NAN, BillingFrequency::Weekly, BillingFrequency::Monthly)
                .is_nan()
        );
        assert_eq!(
            convert_billing_amount(
                f64::INFINITY,
                BillingFrequency::Weekly,
                BillingFrequency::Monthly
            ),
            f64::INFINITY
        );
    }

    #[test]
    fn test_calculate_all_for_weekly_500() {
        let amounts = calculate_all_billing_frequencies(500.0, BillingFrequency::Weekly);
        assert_eq!(
            amounts,
            BillingAmounts {
                weekly: 500.0,
                monthly: 2165.0,
                annually: 26000.0,
                weekly_rate: 500.0,
            }
        );
        assert_eq!(amounts.fortnightly(), 1000.0);
        assert_eq!(amounts.quarterly(), 6500.0);
        assert_eq!(amounts.for_frequency(BillingFrequency::Monthly), 2165.0);
    }

    #[test]
    fn test_calculate_all_zero_and_nan() {
        for frequency in BillingFrequency::ALL {
            assert_eq!(
                calculate_all_billing_frequencies(0.0, frequency),
                BillingAmounts::default()
            );
            assert_eq!(
                calculate_all_billing_frequencies(f64::NAN, frequency),
                BillingAmounts::default()
            );
        }
    }

    #[test]
    fn test_derived_views_match_direct_conversion() {
        let amounts = calculate_all_billing_frequencies(100.0, BillingFrequency::Monthly);
        assert_eq!(amounts.fortnightly(), 46.19);
        assert_eq!(amounts.quarterly(), 300.23);
        assert_eq!(
            amounts.for_frequency(BillingFrequency::Fortnightly),
            convert_billing_amount(100.0, BillingFrequency::Monthly, BillingFrequency::Fortnightly)
        );
    }

    #[test]
    fn test_amounts_sum() {
        let total: BillingAmounts = [
            calculate_all_billing_frequencies(100.0, BillingFrequency::Weekly),
            calculate_all_billing_frequencies(200.0, BillingFrequency::Weekly),
        ]
        .into_iter()
        .sum();
        assert_eq!(total.weekly, 300.0);
        assert_eq!(total.annually, 15600.0);
    }
}
