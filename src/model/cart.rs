use rust_decimal::Decimal;

use crate::api::web::dto::{CartItemDto, CheckoutCartDto, ShippingFeeDto};
use crate::config::AppCheckoutCfg;
use crate::constant::{cartline_suffix, CARTLINE_REFERENCE_MAX_LEN};
use crate::model::money::{
    self, derive_tax_percent, to_minor_units, CurrencyContextModel, MoneyAmountError,
};

const DEFAULT_QUANTITY_UNIT: &str = "pc";
const ROUNDING_LINE_REFERENCE: &str = "rounding";
const ROUNDING_LINE_NAME: &str = "Rounding";

#[derive(Debug)]
pub enum CartModelError {
    EmptyCart,
    Amount(String, MoneyAmountError),
    // the gap between summed line totals and the storefront grand total
    // exceeded the configured tolerance without strict rounding enabled
    RoundingResidual { header: i64, line_sum: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartLineType {
    Physical,
    Digital,
    ShippingFee,
    Discount,
    Surcharge,
}

impl CartLineType {
    pub fn wire_label(&self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Digital => "digital",
            Self::ShippingFee => "shipping_fee",
            Self::Discount => "discount",
            Self::Surcharge => "surcharge",
        }
    }
}

/// one provider-facing cart line, all monetary fields in integer minor
/// units, `unit_price` exclusive of VAT and `tax_rate` in basis points
#[derive(Debug, Clone)]
pub struct CartLineModel {
    pub line_type: CartLineType,
    pub reference: String,
    pub name: String,
    pub quantity: u32,
    pub quantity_unit: String,
    pub unit_price: i64,
    pub tax_rate: i64,
    pub discount_percentage: i64,
    pub unit_price_inc_vat: i64,
}

fn truncate_reference(sku: &str, suffix: &str) -> String {
    let mut out = sku.to_string();
    if out.len() > CARTLINE_REFERENCE_MAX_LEN {
        let mut cut = CARTLINE_REFERENCE_MAX_LEN;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
    }
    out + suffix
}

#[rustfmt::skip]
impl CartLineModel {
    pub fn total_amount(&self) -> i64 {
        self.unit_price_inc_vat * (self.quantity as i64)
    }
    pub fn total_ex_vat(&self) -> i64 {
        self.unit_price * (self.quantity as i64)
    }
    pub fn total_vat_amount(&self) -> i64 {
        self.total_amount() - self.total_ex_vat()
    }

    pub fn product_item(
        item: &CartItemDto, quantity: u32, currency: &CurrencyContextModel,
    ) -> Result<Self, CartModelError> {
        let map_e = |e| CartModelError::Amount(item.sku.clone(), e);
        let unit_ex = money::parse_amount(item.unit_price.as_str()).map_err(map_e)?;
        let tax_percent = money::parse_amount(item.tax_percent.as_str()).map_err(map_e)?;
        let unit_inc = money::include_vat(unit_ex, tax_percent);
        let line_type = if item.is_virtual { CartLineType::Digital } else { CartLineType::Physical };
        Ok(Self {
            line_type,
            reference: truncate_reference(item.sku.as_str(), ""),
            name: item.name.clone(),
            quantity,
            quantity_unit: DEFAULT_QUANTITY_UNIT.to_string(),
            unit_price: to_minor_units(currency.convert(unit_ex)).map_err(map_e)?,
            tax_rate: money::tax_rate_basis_points(tax_percent).map_err(map_e)?,
            discount_percentage: 0,
            unit_price_inc_vat: to_minor_units(currency.convert(unit_inc)).map_err(map_e)?,
        })
    } // end of fn product_item

    /// row-level discount expressed as one negative line, the storefront
    /// stores the amount inclusive of VAT so it is shifted back to the
    /// exclusive base before minor-unit rounding. The tax-compensation
    /// component has to be added back first, otherwise line sums drift
    /// away from the inclusive-VAT header the provider validates.
    pub fn discount_for(
        item: &CartItemDto, currency: &CurrencyContextModel,
    ) -> Result<Option<Self>, CartModelError> {
        let map_e = |e| CartModelError::Amount(item.sku.clone(), e);
        let disc_raw = match item.discount_inc_vat.as_ref() {
            Some(d) => money::parse_amount(d.as_str()).map_err(map_e)?,
            None => return Ok(None),
        };
        if disc_raw <= Decimal::ZERO {
            return Ok(None);
        }
        let compensation = match item.discount_tax_compensation.as_ref() {
            Some(c) => money::parse_amount(c.as_str()).map_err(map_e)?,
            None => Decimal::ZERO,
        };
        let tax_percent = money::parse_amount(item.tax_percent.as_str()).map_err(map_e)?;
        let disc_inc = disc_raw + compensation;
        let disc_ex = money::exclude_vat(disc_inc, tax_percent);
        Ok(Some(Self {
            line_type: CartLineType::Discount,
            reference: truncate_reference(item.sku.as_str(), cartline_suffix::DISCOUNT),
            name: format!("Discount for {}", item.name),
            quantity: 1,
            quantity_unit: DEFAULT_QUANTITY_UNIT.to_string(),
            unit_price: -to_minor_units(currency.convert(disc_ex)).map_err(map_e)?,
            tax_rate: money::tax_rate_basis_points(tax_percent).map_err(map_e)?,
            discount_percentage: 0,
            unit_price_inc_vat: -to_minor_units(currency.convert(disc_inc)).map_err(map_e)?,
        }))
    } // end of fn discount_for

    /// per-unit eco-tax surcharge, taxed at the item rate only when the
    /// store treats the surcharge itself as taxable
    pub fn weee_for(
        item: &CartItemDto, quantity: u32, currency: &CurrencyContextModel,
    ) -> Result<Option<Self>, CartModelError> {
        let map_e = |e| CartModelError::Amount(item.sku.clone(), e);
        let unit_weee = match item.weee_applied.as_ref() {
            Some(w) => money::parse_amount(w.as_str()).map_err(map_e)?,
            None => return Ok(None),
        };
        if unit_weee <= Decimal::ZERO {
            return Ok(None);
        }
        let (tax_rate, unit_inc) = if item.weee_taxable {
            let tax_percent = money::parse_amount(item.tax_percent.as_str()).map_err(map_e)?;
            let inc = money::include_vat(unit_weee, tax_percent);
            (money::tax_rate_basis_points(tax_percent).map_err(map_e)?, inc)
        } else {
            (0i64, unit_weee)
        };
        Ok(Some(Self {
            line_type: CartLineType::Surcharge,
            reference: truncate_reference(item.sku.as_str(), cartline_suffix::WEEE),
            name: format!("WEEE Tax for {}", item.name),
            quantity,
            quantity_unit: DEFAULT_QUANTITY_UNIT.to_string(),
            unit_price: to_minor_units(currency.convert(unit_weee)).map_err(map_e)?,
            tax_rate,
            discount_percentage: 0,
            unit_price_inc_vat: to_minor_units(currency.convert(unit_inc)).map_err(map_e)?,
        }))
    } // end of fn weee_for

    pub fn shipping(
        fee: &ShippingFeeDto, currency: &CurrencyContextModel,
    ) -> Result<Option<Self>, CartModelError> {
        let map_e = |e| CartModelError::Amount("shipping".to_string(), e);
        let amount_ex = money::parse_amount(fee.amount.as_str()).map_err(map_e)?;
        if amount_ex <= Decimal::ZERO {
            return Ok(None);
        }
        // some storefront tax setups report a zero shipping tax percent
        // even when a tax amount was charged, fall back to deriving it
        let mut tax_percent = match fee.tax_percent.as_ref() {
            Some(p) => money::parse_amount(p.as_str()).map_err(map_e)?,
            None => Decimal::ZERO,
        };
        if tax_percent.is_zero() {
            if let Some(t) = fee.tax_amount.as_ref() {
                let tax_amount = money::parse_amount(t.as_str()).map_err(map_e)?;
                tax_percent = derive_tax_percent(amount_ex, tax_amount);
            }
        }
        let amount_inc = money::include_vat(amount_ex, tax_percent);
        Ok(Some(Self {
            line_type: CartLineType::ShippingFee,
            reference: "shipping".to_string(),
            name: fee.description.clone(),
            quantity: 1,
            quantity_unit: DEFAULT_QUANTITY_UNIT.to_string(),
            unit_price: to_minor_units(currency.convert(amount_ex)).map_err(map_e)?,
            tax_rate: money::tax_rate_basis_points(tax_percent).map_err(map_e)?,
            discount_percentage: 0,
            unit_price_inc_vat: to_minor_units(currency.convert(amount_inc)).map_err(map_e)?,
        }))
    } // end of fn shipping

    fn rounding(residual_minor: i64) -> Self {
        Self {
            line_type: CartLineType::Surcharge,
            reference: ROUNDING_LINE_REFERENCE.to_string(),
            name: ROUNDING_LINE_NAME.to_string(),
            quantity: 1,
            quantity_unit: DEFAULT_QUANTITY_UNIT.to_string(),
            unit_price: -residual_minor,
            tax_rate: 0,
            discount_percentage: 0,
            unit_price_inc_vat: -residual_minor,
        }
    }
} // end of impl CartLineModel

/// full provider-facing cart with header totals, the headers are always
/// derived from the lines so the provider's line-sum validation holds
#[derive(Debug)]
pub struct CartModel {
    pub currency: String,
    pub lines: Vec<CartLineModel>,
    pub amount_inc_vat: i64,
    pub amount_ex_vat: i64,
}

impl CartModel {
    pub fn try_build(
        cfg: &AppCheckoutCfg,
        dto: &CheckoutCartDto,
    ) -> Result<Self, CartModelError> {
        if dto.items.is_empty() {
            return Err(CartModelError::EmptyCart);
        }
        let currency = CurrencyContextModel::try_build(
            dto.base_currency.clone(),
            dto.currency.clone(),
            dto.currency_rate.as_str(),
        )
        .map_err(|e| CartModelError::Amount("currency-rate".to_string(), e))?;

        let mut lines = Vec::with_capacity(dto.items.len() * 2 + 2);
        for item in dto.items.iter() {
            lines.push(CartLineModel::product_item(item, item.quantity, &currency)?);
            if let Some(d) = CartLineModel::discount_for(item, &currency)? {
                lines.push(d);
            }
        }
        if cfg.weee_surcharge_enable {
            for item in dto.items.iter() {
                if let Some(w) = CartLineModel::weee_for(item, item.quantity, &currency)? {
                    lines.push(w);
                }
            }
        }
        if let Some(fee) = dto.shipping.as_ref() {
            if let Some(s) = CartLineModel::shipping(fee, &currency)? {
                lines.push(s);
            }
        }

        let grand_total = money::parse_amount(dto.grand_total.as_str())
            .map_err(|e| CartModelError::Amount("grand-total".to_string(), e))?;
        let header_inc = to_minor_units(currency.convert(grand_total))
            .map_err(|e| CartModelError::Amount("grand-total".to_string(), e))?;
        let line_sum: i64 = lines.iter().map(CartLineModel::total_amount).sum();
        let residual = line_sum - header_inc;
        if residual != 0 {
            if cfg.strict_rounding {
                lines.push(CartLineModel::rounding(residual));
            } else if residual.unsigned_abs() > cfg.rounding_tolerance_minor as u64 {
                return Err(CartModelError::RoundingResidual {
                    header: header_inc,
                    line_sum,
                });
            }
        }
        Ok(Self::from_lines(dto.currency.clone(), lines))
    } // end of fn try_build

    // header totals re-derived from the given lines, used directly by the
    // partial capture / refund paths which scope lines to requested
    // quantities instead of the original order
    pub fn from_lines(currency: String, lines: Vec<CartLineModel>) -> Self {
        let amount_inc_vat = lines.iter().map(CartLineModel::total_amount).sum();
        let amount_ex_vat = lines.iter().map(CartLineModel::total_ex_vat).sum();
        Self {
            currency,
            lines,
            amount_inc_vat,
            amount_ex_vat,
        }
    }
} // end of impl CartModel
