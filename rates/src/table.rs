//! Immutable rate table snapshots.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kantor_common::{Currency, ExchangeError, Money, Result};

/// An immutable snapshot of mid-rates against a fixed base currency.
///
/// Each entry means "1 unit of the listed currency = `mid` units of the base
/// currency"; the base itself has an implicit rate of 1. A snapshot is never
/// edited in place: a refresh builds a whole new table and swaps it in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    base: Currency,
    as_of: NaiveDate,
    rates: BTreeMap<Currency, Decimal>,
}

impl RateTable {
    /// Build a snapshot, rejecting non-positive rates.
    pub fn new(
        base: Currency,
        as_of: NaiveDate,
        rates: BTreeMap<Currency, Decimal>,
    ) -> Result<Self> {
        for (currency, mid) in &rates {
            if *mid <= Decimal::ZERO {
                return Err(ExchangeError::Feed(format!(
                    "non-positive rate {mid} for {currency}"
                )));
            }
        }
        Ok(Self { base, as_of, rates })
    }

    /// An empty snapshot. Only the base currency converts (to itself).
    pub fn empty(base: Currency) -> Self {
        Self {
            base,
            as_of: NaiveDate::default(),
            rates: BTreeMap::new(),
        }
    }

    /// The base currency of this snapshot (implicit rate 1).
    pub fn base(&self) -> &Currency {
        &self.base
    }

    /// The effective date of the snapshot, as stated by the upstream feed.
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Mid-rate for a currency, `None` if absent from the snapshot.
    pub fn rate(&self, currency: &Currency) -> Option<Decimal> {
        if *currency == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(currency).copied()
    }

    fn rate_required(&self, currency: &Currency) -> Result<Decimal> {
        self.rate(currency)
            .ok_or_else(|| ExchangeError::RateUnavailable(currency.clone()))
    }

    /// Convert an amount into another currency.
    ///
    /// The general rule is a two-hop path through the base: value the source
    /// in base units, then price the destination out of it. The single-hop
    /// cases fall out of the same arithmetic with the base leg at rate 1.
    pub fn convert(&self, amount: &Money, to: &Currency) -> Result<Money> {
        let from_rate = self.rate_required(&amount.currency)?;
        let to_rate = self.rate_required(to)?;

        let converted = (amount.amount * from_rate) / to_rate;
        Ok(Money::new(converted, to.clone()))
    }

    /// Currencies present in the snapshot, base excluded, in code order.
    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.rates.keys()
    }

    /// Number of quoted currencies (base excluded).
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if the snapshot quotes no currencies.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn table(entries: &[(&str, Decimal)]) -> RateTable {
        let rates = entries
            .iter()
            .map(|(code, mid)| (Currency::new(*code), *mid))
            .collect();
        RateTable::new(
            Currency::pln(),
            NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
            rates,
        )
        .unwrap()
    }

    #[test]
    fn test_base_rate_implicit_one() {
        let t = table(&[("USD", dec!(4.00))]);
        assert_eq!(t.rate(&Currency::pln()), Some(Decimal::ONE));
        assert_eq!(t.rate(&Currency::usd()), Some(dec!(4.00)));
        assert_eq!(t.rate(&Currency::new("XYZ")), None);
    }

    #[test]
    fn test_convert_from_base() {
        // 1 USD = 4.00 PLN, so 100 PLN buys 25 USD.
        let t = table(&[("USD", dec!(4.00))]);
        let out = t
            .convert(&Money::new(dec!(100), Currency::pln()), &Currency::usd())
            .unwrap();
        assert_eq!(out.amount, dec!(25));
        assert_eq!(out.currency, Currency::usd());
    }

    #[test]
    fn test_convert_to_base() {
        let t = table(&[("USD", dec!(4.00))]);
        let out = t
            .convert(&Money::new(dec!(25), Currency::usd()), &Currency::pln())
            .unwrap();
        assert_eq!(out.amount, dec!(100));
    }

    #[test]
    fn test_convert_cross_pair_via_base() {
        // 1 USD = 4.00 PLN, 1 EUR = 5.00 PLN: 50 USD -> 200 PLN -> 40 EUR.
        let t = table(&[("USD", dec!(4.00)), ("EUR", dec!(5.00))]);
        let out = t
            .convert(&Money::new(dec!(50), Currency::usd()), &Currency::eur())
            .unwrap();
        assert_eq!(out.amount, dec!(40));
    }

    #[test]
    fn test_convert_unknown_currency() {
        let t = table(&[("USD", dec!(4.00))]);
        let result = t.convert(&Money::new(dec!(10), Currency::pln()), &Currency::new("XYZ"));
        assert!(matches!(result, Err(ExchangeError::RateUnavailable(c)) if c.code() == "XYZ"));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let mut rates = BTreeMap::new();
        rates.insert(Currency::usd(), dec!(0));
        let result = RateTable::new(
            Currency::pln(),
            NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
            rates,
        );
        assert!(matches!(result, Err(ExchangeError::Feed(_))));
    }

    #[test]
    fn test_empty_snapshot() {
        let t = RateTable::empty(Currency::pln());
        assert!(t.is_empty());
        assert!(t
            .convert(&Money::new(dec!(1), Currency::pln()), &Currency::usd())
            .is_err());
    }

    proptest! {
        // convert(convert(x, A, B), B, A) comes back to x within rounding
        // drift of the two divisions.
        #[test]
        fn round_trip_converges(
            cents in 1u64..1_000_000_000,
            from_rate in 1u64..100_000,
            to_rate in 1u64..100_000,
        ) {
            let t = table(&[
                ("USD", Decimal::new(from_rate as i64, 4)),
                ("EUR", Decimal::new(to_rate as i64, 4)),
            ]);
            let start = Money::new(Decimal::new(cents as i64, 2), Currency::usd());

            let there = t.convert(&start, &Currency::eur()).unwrap();
            let back = t.convert(&there, &Currency::usd()).unwrap();

            let drift = (back.amount - start.amount).abs();
            prop_assert!(drift < dec!(0.0001), "drift {} too large", drift);
        }
    }
}
