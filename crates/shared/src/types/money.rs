//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g. shillings, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "KES", "USD").
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Kenyan Shilling
    Kes,
    /// Ugandan Shilling
    Ugx,
    /// Tanzanian Shilling
    Tzs,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
}

impl Currency {
    /// Number of decimal places printed for this currency.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Ugx => 0,
            Self::Kes | Self::Tzs | Self::Usd | Self::Eur => 2,
        }
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

impl std::fmt::Display for Money {
    /// Formats as `KES 1,234.50`, negatives as `KES -1,234.50`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.currency, group_thousands(self.amount, self.currency.minor_units()))
    }
}

/// Rounds half away from zero and inserts thousands separators.
#[must_use]
pub fn group_thousands(amount: Decimal, dp: u32) -> String {
    let rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = format!("{:.*}", dp as usize, rounded.abs());
    let (whole, fraction) = match digits.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    if negative {
        grouped.push('-');
    }
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kes => write!(f, "KES"),
            Self::Ugx => write!(f, "UGX"),
            Self::Tzs => write!(f, "TZS"),
            Self::Usd => write!(f, "USD"),
            Self::Eur => write!(f, "EUR"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "KES" => Ok(Self::Kes),
            "UGX" => Ok(Self::Ugx),
            "TZS" => Ok(Self::Tzs),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::Kes);
        assert!(money.is_zero());
        assert!(!money.is_negative());
        assert_eq!(money.amount, Decimal::ZERO);
    }

    #[test]
    fn test_money_is_negative() {
        assert!(Money::new(dec!(-10), Currency::Usd).is_negative());
        assert!(!Money::new(dec!(10), Currency::Usd).is_negative());
    }

    #[rstest]
    #[case(dec!(0), "KES 0.00")]
    #[case(dec!(999.999), "KES 1,000.00")]
    #[case(dec!(1234.5), "KES 1,234.50")]
    #[case(dec!(1234567.891), "KES 1,234,567.89")]
    #[case(dec!(-3500), "KES -3,500.00")]
    #[case(dec!(-0.001), "KES 0.00")]
    fn test_money_display(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(Money::new(amount, Currency::Kes).to_string(), expected);
    }

    #[test]
    fn test_money_display_without_minor_units() {
        assert_eq!(Money::new(dec!(1500000.6), Currency::Ugx).to_string(), "UGX 1,500,001");
    }

    #[test]
    fn test_group_thousands_short_numbers() {
        assert_eq!(group_thousands(dec!(12), 2), "12.00");
        assert_eq!(group_thousands(dec!(123), 0), "123");
        assert_eq!(group_thousands(dec!(1000), 0), "1,000");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("KES").unwrap(), Currency::Kes);
        assert_eq!(Currency::from_str("kes").unwrap(), Currency::Kes);
        assert_eq!(Currency::from_str("ugx").unwrap(), Currency::Ugx);
        assert_eq!(Currency::from_str("USD").unwrap(), Currency::Usd);

        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn test_currency_display_round_trips() {
        for currency in [
            Currency::Kes,
            Currency::Ugx,
            Currency::Tzs,
            Currency::Usd,
            Currency::Eur,
        ] {
            assert_eq!(Currency::from_str(&currency.to_string()).unwrap(), currency);
        }
    }
}
