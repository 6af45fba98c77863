//! Cart quantity rules. A line exists only while its quantity is at least 1.

use crate::models::CartItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Write the new quantity.
    Set(i32),
    /// Delete the line.
    Remove,
}

pub fn increment(quantity: i32) -> QuantityChange {
    QuantityChange::Set(quantity.saturating_add(1).max(1))
}

/// Decrementing from 1 removes the line rather than storing 0.
pub fn decrement(quantity: i32) -> QuantityChange {
    let next = quantity.saturating_sub(1);
    if next <= 0 {
        QuantityChange::Remove
    } else {
        QuantityChange::Set(next)
    }
}

pub fn subtotal(items: &[CartItem]) -> i64 {
    items.iter().map(CartItem::line_total).sum()
}
