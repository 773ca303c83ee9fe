//! Shared primitive types used across the reporting core.

/// A reporting bucket. One period = one enrollment month.
pub type Period = u32;

/// Stable identifier of a priced teacher (`user_id`, else row `id`).
pub type EntityId = String;

/// Unit price per student per period. Plain f64, no currency.
pub type Price = f64;

/// Default unit price when neither the teacher row nor the
/// override store has one.
pub const DEFAULT_PRICE: Price = 20.0;

/// Namespace of the durable override slot.
pub const OVERRIDE_NAMESPACE: &str = "stemify_price_per_teacher";

/// True if `value` may be used as a price: finite and >= 0.
pub fn is_valid_price(value: Price) -> bool {
    value.is_finite() && value >= 0.0
}
