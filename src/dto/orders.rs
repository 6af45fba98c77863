use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderStatus};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// What a shopper may do to one of their orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClientAction {
    Delivered,
    Cancel,
}

impl ClientAction {
    pub fn target(self) -> OrderStatus {
        match self {
            ClientAction::Delivered => OrderStatus::Delivered,
            ClientAction::Cancel => OrderStatus::Cancelled,
        }
    }
}

/// Row actions on the vendor orders table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SellerAction {
    Refund,
    Cancel,
    Ship,
}

impl SellerAction {
    pub fn target(self) -> OrderStatus {
        match self {
            SellerAction::Refund => OrderStatus::Refunded,
            SellerAction::Cancel => OrderStatus::Cancelled,
            SellerAction::Ship => OrderStatus::Shipping,
        }
    }
}
