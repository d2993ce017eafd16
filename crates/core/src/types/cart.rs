//! Cart lines and the sanitation step that produces them.
//!
//! The backend's cart payload is loosely typed: numbers occasionally arrive as
//! strings, fields go missing, and the body itself is not always an array.
//! Everything is normalised here, at the boundary, so the pricing code in
//! [`super::checkout`] only ever sees well-formed [`CartLine`]s.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::id::ProductId;
use super::money::Clp;

/// Name shown for a line whose product has no name.
pub const FALLBACK_PRODUCT_NAME: &str = "Producto";

/// Opaque cart line identifier, unique within one cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLineId(String);

impl CartLineId {
    /// Create a line id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part of a product a cart line needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Backend product id, when the payload carried one.
    pub id: Option<ProductId>,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub cost: Clp,
    /// Image URL, if any.
    pub image: Option<String>,
}

/// One product-and-quantity entry of a cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identifier.
    pub id: CartLineId,
    /// The product on this line.
    pub product: ProductSummary,
    /// Units. Zero only when the backend itself sent zero.
    pub quantity: u32,
}

impl CartLine {
    /// Build a line from already-clean values.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, cost: Clp, quantity: u32) -> Self {
        Self {
            id: CartLineId::new(id),
            product: ProductSummary {
                id: None,
                name: name.into(),
                cost,
                image: None,
            },
            quantity,
        }
    }

    /// `product.cost × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Clp {
        self.product.cost.times(self.quantity)
    }
}

/// What to do with a missing or malformed `cost` / `quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Substitute cost 0 / quantity 1 for a missing or non-numeric value.
    /// Numbers are kept as sent, rounded to whole pesos and whole units.
    #[default]
    Lenient,
    /// Reject the whole payload, including numbers out of range.
    Strict,
}

impl FromStr for CoercionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("expected 'lenient' or 'strict', got '{other}'")),
        }
    }
}

/// A cart line field rejected under [`CoercionPolicy::Strict`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    /// The field is absent or null.
    #[error("cart line {line}: missing {field}")]
    MissingField {
        /// Offending line.
        line: CartLineId,
        /// Field name.
        field: &'static str,
    },
    /// The field is present but not a usable number.
    #[error("cart line {line}: invalid {field} ({value})")]
    InvalidField {
        /// Offending line.
        line: CartLineId,
        /// Field name.
        field: &'static str,
        /// The raw JSON value.
        value: String,
    },
}

/// Turn a raw cart payload into cart lines.
///
/// A body that is not a JSON array yields an empty cart under either policy.
/// Line order is preserved.
///
/// # Errors
///
/// Only under [`CoercionPolicy::Strict`]: returns the first line whose cost
/// is missing, non-numeric or negative, or whose quantity is missing,
/// non-integral or below 1.
pub fn sanitize_lines(body: &Value, policy: CoercionPolicy) -> Result<Vec<CartLine>, SanitizeError> {
    let Some(items) = body.as_array() else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .enumerate()
        .map(|(position, item)| sanitize_line(position, item, policy))
        .collect()
}

fn sanitize_line(
    position: usize,
    item: &Value,
    policy: CoercionPolicy,
) -> Result<CartLine, SanitizeError> {
    let id = line_id(item.get("id"), position);
    let product = item.get("producto");

    let strict = policy == CoercionPolicy::Strict;

    let raw_cost = product.and_then(|p| p.get("cost"));
    let cost = match numeric(raw_cost) {
        Numeric::Number(amount) if strict && amount < Decimal::ZERO => Err(Numeric::Invalid),
        Numeric::Number(amount) => Clp::from_decimal(amount).ok_or(Numeric::Invalid),
        other => Err(other),
    }
    .or_else(|found| reject(found, policy, &id, "cost", raw_cost).map(|()| Clp::ZERO))?;

    let raw_quantity = item.get("quantity");
    let quantity = match numeric(raw_quantity) {
        Numeric::Number(units) if strict && (!units.fract().is_zero() || units < Decimal::ONE) => {
            Err(Numeric::Invalid)
        }
        Numeric::Number(units) => whole_units(units).ok_or(Numeric::Invalid),
        other => Err(other),
    }
    .or_else(|found| reject(found, policy, &id, "quantity", raw_quantity).map(|()| 1))?;

    let name = product
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(FALLBACK_PRODUCT_NAME)
        .to_string();

    Ok(CartLine {
        id,
        product: ProductSummary {
            id: product
                .and_then(|p| p.get("id"))
                .and_then(Value::as_i64)
                .map(ProductId::new),
            name,
            cost,
            image: product
                .and_then(|p| p.get("image"))
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(String::from),
        },
        quantity,
    })
}

/// A JSON value read as a number the way the storefront has always read it:
/// numbers and numeric strings count, everything else does not.
enum Numeric {
    Missing,
    Invalid,
    Number(Decimal),
}

fn numeric(value: Option<&Value>) -> Numeric {
    match value {
        None | Some(Value::Null) => Numeric::Missing,
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
            .map_or(Numeric::Invalid, Numeric::Number),
        Some(Value::String(s)) => {
            Decimal::from_str(s.trim()).map_or(Numeric::Invalid, Numeric::Number)
        }
        Some(_) => Numeric::Invalid,
    }
}

/// Round half away from zero. A negative count holds no units; a count past
/// `u32::MAX` is not a usable number.
fn whole_units(units: Decimal) -> Option<u32> {
    units
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .max(Decimal::ZERO)
        .to_u32()
}

/// Lenient: accept (caller substitutes the default). Strict: fail.
fn reject(
    found: Numeric,
    policy: CoercionPolicy,
    line: &CartLineId,
    field: &'static str,
    raw: Option<&Value>,
) -> Result<(), SanitizeError> {
    match (policy, found) {
        (CoercionPolicy::Lenient, _) => Ok(()),
        (CoercionPolicy::Strict, Numeric::Missing) => Err(SanitizeError::MissingField {
            line: line.clone(),
            field,
        }),
        (CoercionPolicy::Strict, _) => Err(invalid(line, field, raw)),
    }
}

fn invalid(line: &CartLineId, field: &'static str, raw: Option<&Value>) -> SanitizeError {
    SanitizeError::InvalidField {
        line: line.clone(),
        field,
        value: raw.map_or_else(|| "null".to_string(), Value::to_string),
    }
}

fn line_id(value: Option<&Value>, position: usize) -> CartLineId {
    match value {
        Some(Value::Number(n)) => CartLineId::new(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => CartLineId::new(s.clone()),
        _ => CartLineId::new(format!("linea-{position}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_well_formed_line() {
        let body = json!([
            {"id": 11, "producto": {"id": 4, "name": "Mesa", "cost": 50000}, "quantity": 2}
        ]);
        let lines = sanitize_lines(&body, CoercionPolicy::Strict).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id.as_str(), "11");
        assert_eq!(lines[0].product.id, Some(ProductId::new(4)));
        assert_eq!(lines[0].product.name, "Mesa");
        assert_eq!(lines[0].subtotal(), Clp::new(100_000));
    }

    #[test]
    fn test_non_array_body_is_empty() {
        for body in [json!(null), json!({"items": []}), json!("oops"), json!(3)] {
            assert!(sanitize_lines(&body, CoercionPolicy::Lenient).unwrap().is_empty());
            assert!(sanitize_lines(&body, CoercionPolicy::Strict).unwrap().is_empty());
        }
    }

    #[test]
    fn test_missing_quantity_defaults_to_one() {
        let body = json!([{"id": 1, "producto": {"name": "Lámpara", "cost": 12990}}]);
        let lines = sanitize_lines(&body, CoercionPolicy::Lenient).unwrap();
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(lines[0].subtotal(), Clp::new(12_990));
    }

    #[test]
    fn test_missing_cost_defaults_to_zero() {
        let body = json!([{"id": 1, "producto": {"name": "Regalo"}, "quantity": 3}]);
        let lines = sanitize_lines(&body, CoercionPolicy::Lenient).unwrap();
        assert_eq!(lines[0].product.cost, Clp::ZERO);
        assert_eq!(lines[0].subtotal(), Clp::ZERO);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let body = json!([{"id": "a", "producto": {"cost": " 1990 "}, "quantity": "3"}]);
        let lines = sanitize_lines(&body, CoercionPolicy::Strict).unwrap();
        assert_eq!(lines[0].product.cost, Clp::new(1_990));
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].product.name, FALLBACK_PRODUCT_NAME);
    }

    #[test]
    fn test_garbage_numbers_fall_back_when_lenient() {
        let body = json!([
            {"id": 1, "producto": {"cost": "gratis"}, "quantity": "dos"},
            {"id": 2, "producto": {"cost": [5]}, "quantity": {"n": 2}},
            {"id": 3, "producto": {"cost": true}, "quantity": "99999999999"},
        ]);
        let lines = sanitize_lines(&body, CoercionPolicy::Lenient).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.quantity == 1));
        assert!(lines.iter().all(|l| l.product.cost == Clp::ZERO));
    }

    #[test]
    fn test_numbers_out_of_range_are_kept_when_lenient() {
        let body = json!([
            {"id": 1, "producto": {"cost": -5}, "quantity": 0},
            {"id": 2, "producto": {"cost": 1000}, "quantity": 1.5},
            {"id": 3, "producto": {"cost": "1990.5"}, "quantity": -3},
        ]);
        let lines = sanitize_lines(&body, CoercionPolicy::Lenient).unwrap();

        assert_eq!(lines[0].product.cost, Clp::new(-5));
        assert_eq!(lines[0].quantity, 0);
        assert_eq!(lines[0].subtotal(), Clp::ZERO);

        assert_eq!(lines[1].quantity, 2);
        assert_eq!(lines[1].subtotal(), Clp::new(2_000));

        assert_eq!(lines[2].product.cost, Clp::new(1_991));
        assert_eq!(lines[2].quantity, 0);
    }

    #[test]
    fn test_strict_rejects_numbers_out_of_range() {
        for (line, field) in [
            (json!({"id": 1, "producto": {"cost": -5}, "quantity": 1}), "cost"),
            (json!({"id": 1, "producto": {"cost": 5}, "quantity": 0}), "quantity"),
            (json!({"id": 1, "producto": {"cost": 5}, "quantity": 1.5}), "quantity"),
        ] {
            let err = sanitize_lines(&json!([line]), CoercionPolicy::Strict).unwrap_err();
            assert!(
                matches!(err, SanitizeError::InvalidField { field: f, .. } if f == field),
                "{err}"
            );
        }
    }

    #[test]
    fn test_strict_rejects_missing_quantity() {
        let body = json!([{"id": 9, "producto": {"cost": 1000}}]);
        let err = sanitize_lines(&body, CoercionPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            SanitizeError::MissingField {
                line: CartLineId::new("9"),
                field: "quantity",
            }
        );
    }

    #[test]
    fn test_strict_rejects_invalid_cost() {
        let body = json!([{"id": 9, "producto": {"cost": "n/a"}, "quantity": 1}]);
        let err = sanitize_lines(&body, CoercionPolicy::Strict).unwrap_err();
        assert!(matches!(err, SanitizeError::InvalidField { field: "cost", .. }));
        assert_eq!(err.to_string(), "cart line 9: invalid cost (\"n/a\")");
    }

    #[test]
    fn test_missing_ids_are_positional() {
        let body = json!([{"producto": {"cost": 1}}, {"producto": {"cost": 2}}]);
        let lines = sanitize_lines(&body, CoercionPolicy::Lenient).unwrap();
        assert_eq!(lines[0].id.as_str(), "linea-0");
        assert_eq!(lines[1].id.as_str(), "linea-1");
    }

    #[test]
    fn test_order_is_preserved() {
        let body = json!([
            {"id": 3, "producto": {"name": "C", "cost": 1}, "quantity": 1},
            {"id": 1, "producto": {"name": "A", "cost": 1}, "quantity": 1},
            {"id": 2, "producto": {"name": "B", "cost": 1}, "quantity": 1},
        ]);
        let names: Vec<_> = sanitize_lines(&body, CoercionPolicy::Lenient)
            .unwrap()
            .into_iter()
            .map(|l| l.product.name)
            .collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn test_coercion_policy_from_str() {
        assert_eq!("STRICT".parse::<CoercionPolicy>(), Ok(CoercionPolicy::Strict));
        assert_eq!(" lenient".parse::<CoercionPolicy>(), Ok(CoercionPolicy::Lenient));
        assert!("loose".parse::<CoercionPolicy>().is_err());
    }
}
