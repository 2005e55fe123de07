// darkroom/src/pricing.rs

//! Cart and order arithmetic. All amounts are integer cents, and every sum and product is
//! checked: an amount that does not fit is a validation error, never a wrap or a panic.

use crate::error::{ShopError, ShopResult};
use crate::models::{CartItem, OrderLine};
use serde::Serialize;

/// Flat tax applied client-side to every order.
pub const TAX_RATE_PERCENT: i64 = 10;

/// Largest quantity a single cart or order line may carry.
pub const MAX_LINE_QUANTITY: i64 = 999;

fn too_large() -> ShopError {
  ShopError::Validation("Order amount is too large.".to_string())
}

/// Rejects quantities outside `1..=MAX_LINE_QUANTITY`.
pub fn check_quantity(quantity: i64) -> ShopResult<()> {
  if quantity < 1 {
    return Err(ShopError::Validation("Quantity must be a positive number.".to_string()));
  }
  if quantity > MAX_LINE_QUANTITY {
    return Err(ShopError::Validation(format!(
      "Quantity cannot exceed {}.",
      MAX_LINE_QUANTITY
    )));
  }
  Ok(())
}

/// `unit price x quantity`.
pub fn line_total(price_cents: i64, quantity: i64) -> ShopResult<i64> {
  price_cents.checked_mul(quantity).ok_or_else(too_large)
}

/// `round(subtotal * 0.1)`, halves rounded up.
pub fn tax_for(subtotal_cents: i64) -> ShopResult<i64> {
  let scaled = subtotal_cents.checked_mul(TAX_RATE_PERCENT).ok_or_else(too_large)?;
  div_round_half_up(scaled, 100)
}

/// `round(subtotal * 1.1)`: the tax-inclusive amount stored on an order.
pub fn total_with_tax(subtotal_cents: i64) -> ShopResult<i64> {
  subtotal_cents
    .checked_add(tax_for(subtotal_cents)?)
    .ok_or_else(too_large)
}

pub fn cart_total(items: &[CartItem]) -> ShopResult<i64> {
  sum_checked(items.iter().map(CartItem::line_total_cents))
}

/// Bounded by `MAX_LINE_QUANTITY` per line.
pub fn cart_count(items: &[CartItem]) -> i64 {
  items.iter().map(|item| item.quantity).sum()
}

fn sum_checked(mut amounts: impl Iterator<Item = ShopResult<i64>>) -> ShopResult<i64> {
  amounts.try_fold(0i64, |acc, amount| acc.checked_add(amount?).ok_or_else(too_large))
}

// Rounds like Math.round: toward +infinity on exact halves.
fn div_round_half_up(numerator: i64, denominator: i64) -> ShopResult<i64> {
  let doubled = numerator
    .checked_mul(2)
    .and_then(|n| n.checked_add(denominator))
    .ok_or_else(too_large)?;
  Ok(doubled.div_euclid(2 * denominator))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
  pub subtotal_cents: i64,
  pub tax_cents: i64,
  pub total_cents: i64,
}

impl OrderSummary {
  pub fn from_subtotal(subtotal_cents: i64) -> ShopResult<Self> {
    let tax_cents = tax_for(subtotal_cents)?;
    Ok(Self {
      subtotal_cents,
      tax_cents,
      total_cents: subtotal_cents.checked_add(tax_cents).ok_or_else(too_large)?,
    })
  }

  pub fn for_cart(items: &[CartItem]) -> ShopResult<Self> {
    Self::from_subtotal(cart_total(items)?)
  }

  pub fn for_lines(lines: &[OrderLine]) -> ShopResult<Self> {
    Self::from_subtotal(sum_checked(lines.iter().map(OrderLine::line_total_cents))?)
  }
}

/// Renders cents for display: `$126.50` for USD, `EUR 126.50` otherwise.
pub fn format_cents(cents: i64, currency: &str) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  let amount = format!("{}.{:02}", abs / 100, abs % 100);
  if currency.eq_ignore_ascii_case("usd") {
    format!("{}${}", sign, amount)
  } else {
    format!("{}{} {}", sign, currency.to_ascii_uppercase(), amount)
  }
}
