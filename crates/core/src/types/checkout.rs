//! Checkout pricing: delivery tiers, payment methods and order totals.
//!
//! Totals are derived data. They are recomputed from the cart lines and the
//! selected delivery method every time either changes and are never stored.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cart::CartLine;
use super::money::Clp;

/// Error returned when a delivery or payment code is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code: {code:?}")]
pub struct UnknownMethod {
    kind: &'static str,
    code: String,
}

/// How the order reaches the customer. Each tier has a flat cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeliveryMethod {
    /// In-store pickup, free.
    #[default]
    #[serde(rename = "retiro")]
    Pickup,
    /// Standard shipping.
    #[serde(rename = "estandar")]
    Standard,
    /// Express shipping.
    #[serde(rename = "express")]
    Express,
}

impl DeliveryMethod {
    /// Every delivery method, in display order.
    pub const ALL: [Self; 3] = [Self::Pickup, Self::Standard, Self::Express];

    /// Flat shipping cost for this tier.
    #[must_use]
    pub const fn cost(self) -> Clp {
        match self {
            Self::Pickup => Clp::ZERO,
            Self::Standard => Clp::new(3_990),
            Self::Express => Clp::new(6_990),
        }
    }

    /// Form and wire code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pickup => "retiro",
            Self::Standard => "estandar",
            Self::Express => "express",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pickup => "Retiro en tienda",
            Self::Standard => "Envío estándar",
            Self::Express => "Envío express",
        }
    }

    /// Returns `true` if the tier costs nothing.
    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Self::Pickup)
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeliveryMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMethod {
                kind: "delivery",
                code: s.to_string(),
            })
    }
}

/// How the customer intends to pay.
///
/// `Unselected` is a real state: the checkout starts there and refuses to
/// confirm until something else is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Nothing chosen yet.
    #[default]
    #[serde(rename = "")]
    Unselected,
    /// Debit or credit card.
    #[serde(rename = "tarjeta")]
    Card,
    /// Bank transfer.
    #[serde(rename = "transferencia")]
    BankTransfer,
    /// Cash on pickup.
    #[serde(rename = "efectivo")]
    Cash,
}

impl PaymentMethod {
    /// Every selectable payment method, in display order.
    pub const SELECTABLE: [Self; 3] = [Self::Card, Self::BankTransfer, Self::Cash];

    /// Form and wire code. `Unselected` is the empty string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Unselected => "",
            Self::Card => "tarjeta",
            Self::BankTransfer => "transferencia",
            Self::Cash => "efectivo",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unselected => "Selecciona método de pago",
            Self::Card => "Tarjeta débito/crédito",
            Self::BankTransfer => "Transferencia bancaria",
            Self::Cash => "Efectivo (solo retiro)",
        }
    }

    /// Returns `true` unless this is [`PaymentMethod::Unselected`].
    #[must_use]
    pub const fn is_selected(self) -> bool {
        !matches!(self, Self::Unselected)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.is_empty() {
            return Ok(Self::Unselected);
        }
        Self::SELECTABLE
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| UnknownMethod {
                kind: "payment",
                code: s.to_string(),
            })
    }
}

/// Derived order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of every line subtotal.
    pub subtotal: Clp,
    /// Flat cost of the selected delivery tier.
    pub shipping_cost: Clp,
    /// `subtotal + shipping_cost`.
    pub total: Clp,
}

/// Compute order totals for a cart and a delivery tier.
///
/// Pure and deterministic: the same inputs always give the same output, and
/// line order has no effect.
///
/// ```
/// use hazel_lab_core::{CartLine, Clp, DeliveryMethod, compute_totals};
///
/// let lines = vec![CartLine::new("1", "Mesa", Clp::new(50_000), 2)];
/// let totals = compute_totals(&lines, DeliveryMethod::Standard);
/// assert_eq!(totals.subtotal, Clp::new(100_000));
/// assert_eq!(totals.total.to_string(), "$103.990");
/// ```
#[must_use]
pub fn compute_totals(lines: &[CartLine], delivery: DeliveryMethod) -> OrderTotals {
    let subtotal: Clp = lines.iter().map(CartLine::subtotal).sum();
    let shipping_cost = delivery.cost();

    OrderTotals {
        subtotal,
        shipping_cost,
        total: subtotal + shipping_cost,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mesa_line() -> CartLine {
        CartLine::new("1", "Mesa", Clp::new(50_000), 2)
    }

    #[test]
    fn test_shipping_cost_per_tier() {
        assert_eq!(DeliveryMethod::Pickup.cost(), Clp::ZERO);
        assert_eq!(DeliveryMethod::Standard.cost(), Clp::new(3_990));
        assert_eq!(DeliveryMethod::Express.cost(), Clp::new(6_990));
    }

    #[test]
    fn test_default_methods() {
        assert_eq!(DeliveryMethod::default(), DeliveryMethod::Pickup);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Unselected);
        assert!(!PaymentMethod::default().is_selected());
    }

    #[test]
    fn test_mesa_standard_scenario() {
        let totals = compute_totals(&[mesa_line()], DeliveryMethod::Standard);
        assert_eq!(totals.subtotal, Clp::new(100_000));
        assert_eq!(totals.shipping_cost, Clp::new(3_990));
        assert_eq!(totals.total, Clp::new(103_990));
        assert_eq!(totals.total.to_string(), "$103.990");
    }

    #[test]
    fn test_changing_delivery_keeps_subtotal() {
        let lines = vec![mesa_line()];
        let pickup = compute_totals(&lines, DeliveryMethod::Pickup);
        let express = compute_totals(&lines, DeliveryMethod::Express);
        assert_eq!(pickup.subtotal, express.subtotal);
        assert_eq!(pickup.total, Clp::new(100_000));
        assert_eq!(express.total, Clp::new(106_990));
    }

    #[test]
    fn test_totals_are_order_independent_and_idempotent() {
        let a = CartLine::new("1", "Mesa", Clp::new(50_000), 2);
        let b = CartLine::new("2", "Silla", Clp::new(19_990), 4);
        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b, a];

        let first = compute_totals(&forward, DeliveryMethod::Express);
        assert_eq!(first, compute_totals(&forward, DeliveryMethod::Express));
        assert_eq!(first, compute_totals(&backward, DeliveryMethod::Express));
    }

    #[test]
    fn test_empty_cart_has_zero_subtotal() {
        for method in DeliveryMethod::ALL {
            let totals = compute_totals(&[], method);
            assert_eq!(totals.subtotal, Clp::ZERO);
            assert_eq!(totals.total, method.cost());
        }
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(
            "estandar".parse::<DeliveryMethod>().unwrap(),
            DeliveryMethod::Standard
        );
        assert_eq!("".parse::<PaymentMethod>().unwrap(), PaymentMethod::Unselected);
        assert_eq!(
            "transferencia".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!("drone".parse::<DeliveryMethod>().is_err());
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_serde_uses_form_codes() {
        assert_eq!(
            serde_json::to_string(&DeliveryMethod::Express).unwrap(),
            "\"express\""
        );
        let payment: PaymentMethod = serde_json::from_str("\"efectivo\"").unwrap();
        assert_eq!(payment, PaymentMethod::Cash);
        let unselected: PaymentMethod = serde_json::from_str("\"\"").unwrap();
        assert_eq!(unselected, PaymentMethod::Unselected);
    }
}
