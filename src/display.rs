//! Locale-aware formatting of monetary amounts.
//!
//! The calculator is currency-agnostic: it never converts between
//! currencies.  This module only decides how an already computed amount
//! is shown to a user of a given market.

use crate::models::round_output;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Currencies the product is sold in, each with the display conventions
/// of its primary locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Brazilian real, pt-BR.
    Brl,
    /// Euro, es-ES.
    Eur,
    /// US dollar, en-US.
    Usd,
    /// Mexican peso, es-MX.
    Mxn,
}

struct Conventions {
    symbol: &'static str,
    thousands: char,
    decimal: char,
    symbol_first: bool,
    space: bool,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Mxn => "MXN",
        }
    }

    pub fn locale(&self) -> &'static str {
        match self {
            Currency::Brl => "pt-BR",
            Currency::Eur => "es-ES",
            Currency::Usd => "en-US",
            Currency::Mxn => "es-MX",
        }
    }

    fn conventions(&self) -> Conventions {
        match self {
            Currency::Brl => Conventions {
                symbol: "R$",
                thousands: '.',
                decimal: ',',
                symbol_first: true,
                space: true,
            },
            Currency::Eur => Conventions {
                symbol: "€",
                thousands: '.',
                decimal: ',',
                symbol_first: false,
                space: true,
            },
            Currency::Usd | Currency::Mxn => Conventions {
                symbol: "$",
                thousands: ',',
                decimal: '.',
                symbol_first: true,
                space: false,
            },
        }
    }

    /// Formats `amount` rounded to two decimal places, e.g. `R$ 1.234,56`.
    pub fn format_amount(&self, amount: Decimal) -> String {
        let conv = self.conventions();
        let rounded = round_output(amount);
        let negative = rounded < Decimal::ZERO;
        // Always two fractional digits, then split on the plain '.' separator.
        let plain = format!("{:.2}", rounded.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, digit) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(conv.thousands);
            }
            grouped.push(digit);
        }
        let number = format!("{}{}{}", grouped, conv.decimal, frac_part);
        let sep = if conv.space { " " } else { "" };
        let body = if conv.symbol_first {
            format!("{}{}{}", conv.symbol, sep, number)
        } else {
            format!("{}{}{}", number, sep, conv.symbol)
        };
        if negative {
            format!("-{}", body)
        } else {
            body
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Brl
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BRL" => Ok(Currency::Brl),
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "MXN" => Ok(Currency::Mxn),
            other => Err(format!("unsupported currency '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn formats_brazilian_real() {
        assert_eq!(Currency::Brl.format_amount(dec!(1234.567)), "R$ 1.234,57");
        assert_eq!(Currency::Brl.format_amount(dec!(79.03)), "R$ 79,03");
        assert_eq!(Currency::Brl.format_amount(dec!(0)), "R$ 0,00");
    }

    #[test]
    fn formats_euro_with_trailing_symbol() {
        assert_eq!(Currency::Eur.format_amount(dec!(10700)), "10.700,00 €");
    }

    #[test]
    fn formats_dollar_and_negative_amounts() {
        assert_eq!(Currency::Usd.format_amount(dec!(1234567.8)), "$1,234,567.80");
        assert_eq!(Currency::Mxn.format_amount(dec!(-3210.004)), "-$3,210.00");
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("brl".parse::<Currency>().unwrap(), Currency::Brl);
        assert_eq!("EUR".parse::<Currency>().unwrap().locale(), "es-ES");
        assert!("GBP".parse::<Currency>().is_err());
    }
}
