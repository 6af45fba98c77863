use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub subtotal: i64,
}

impl CartView {
    pub fn new(items: Vec<CartItem>) -> Self {
        let subtotal = crate::cart::subtotal(&items);
        Self { items, subtotal }
    }
}

/// Outcome of a `+`/`-` on a cart line.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum QuantityUpdate {
    Updated { item: CartItem },
    Removed { id: Uuid },
}
