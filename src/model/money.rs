use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, PartialEq)]
pub enum MoneyAmountError {
    ParseAmount(String, String),
    ParseRate(String, String),
    Overflow(String),
}

/// exchange-rate snapshot between the storefront base currency and the
/// currency the shopper actually pays in, captured when the cart is built
#[derive(Debug, Clone)]
pub struct CurrencyContextModel {
    pub base_currency: String,
    pub order_currency: String,
    pub rate: Decimal,
}

impl CurrencyContextModel {
    pub fn try_build(
        base_currency: String,
        order_currency: String,
        raw_rate: &str,
    ) -> Result<Self, MoneyAmountError> {
        let rate = Decimal::from_str(raw_rate)
            .map_err(|e| MoneyAmountError::ParseRate(raw_rate.to_string(), e.to_string()))?;
        Ok(Self {
            base_currency,
            order_currency,
            rate,
        })
    }

    // conversion happens in decimal space, rounding to minor units is
    // deferred until the very last step at each line boundary
    pub fn convert(&self, amount: Decimal) -> Decimal {
        if self.base_currency == self.order_currency {
            amount
        } else {
            amount * self.rate
        }
    }
} // end of impl CurrencyContextModel

/// scale a decimal major-unit amount to integer minor units, rounding
/// halfway cases away from zero
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyAmountError> {
    let scaled = (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let wholenum = scaled.trunc().mantissa();
    i64::try_from(wholenum).map_err(|_e| MoneyAmountError::Overflow(amount.to_string()))
}

/// a tax percentage like `25.00` maps to `2500` on the wire
pub fn tax_rate_basis_points(percent: Decimal) -> Result<i64, MoneyAmountError> {
    to_minor_units(percent)
}

pub fn exclude_vat(amount_inc: Decimal, tax_percent: Decimal) -> Decimal {
    let divisor = Decimal::ONE + (tax_percent / Decimal::ONE_HUNDRED);
    if divisor.is_zero() {
        amount_inc
    } else {
        amount_inc / divisor
    }
}

pub fn include_vat(amount_ex: Decimal, tax_percent: Decimal) -> Decimal {
    amount_ex * (Decimal::ONE + (tax_percent / Decimal::ONE_HUNDRED))
}

/// derive an effective tax percentage from a pair of amounts, used for
/// shipping fees whose rate the storefront does not expose directly
pub fn derive_tax_percent(amount_ex: Decimal, tax_amount: Decimal) -> Decimal {
    if amount_ex.is_zero() {
        Decimal::ZERO
    } else {
        (tax_amount / amount_ex) * Decimal::ONE_HUNDRED
    }
}

pub fn parse_amount(raw: &str) -> Result<Decimal, MoneyAmountError> {
    Decimal::from_str(raw)
        .map_err(|e| MoneyAmountError::ParseAmount(raw.to_string(), e.to_string()))
}
