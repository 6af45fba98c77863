use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{cart_items, orders, products, users};

pub const ROLE_SELLER: &str = "seller";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub roles: Vec<String>,
    pub shop_name: Option<String>,
    pub shop_address: Option<String>,
    pub shop_phone: Option<String>,
    pub brand_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn is_seller(&self) -> bool {
        self.roles.iter().any(|role| role == ROLE_SELLER)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub description: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub image_url: Option<String>,
    pub seller_name: String,
    pub shop_name: Option<String>,
    pub shop_address: Option<String>,
    pub shop_phone: Option<String>,
    pub brand_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

/// One product-plus-quantity entry frozen into an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub image_url: Option<String>,
}

impl OrderLine {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            seller_id: item.seller_id,
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            image_url: item.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Shipping,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Shipping,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Shipping => "shipping",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn badge_color(&self) -> &'static str {
        match self {
            OrderStatus::Refunded => "red",
            OrderStatus::Cancelled => "gray",
            OrderStatus::Delivered => "green",
            OrderStatus::Shipping => "yellow",
        }
    }

    /// Refunded is terminal; a cancelled order may be re-shipped.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Shipping, Delivered)
                | (Shipping, Cancelled)
                | (Shipping, Refunded)
                | (Delivered, Refunded)
                | (Cancelled, Shipping)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub seller_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub items: Vec<OrderLine>,
    pub total_payment: i64,
    pub status: OrderStatus,
    pub badge_color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn string_list(value: Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

impl From<users::Model> for UserProfile {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            roles: string_list(model.roles),
            shop_name: model.shop_name,
            shop_address: model.shop_address,
            shop_phone: model.shop_phone,
            brand_image: model.brand_image,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            seller_id: model.seller_id,
            name: model.name,
            category: model.category,
            price: model.price,
            description: model.description,
            sizes: string_list(model.sizes),
            colors: string_list(model.colors),
            image_url: model.image_url,
            seller_name: model.seller_name,
            shop_name: model.shop_name,
            shop_address: model.shop_address,
            shop_phone: model.shop_phone,
            brand_image: model.brand_image,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            product_id: model.product_id,
            seller_id: model.seller_id,
            name: model.name,
            category: model.category,
            price: model.price,
            sizes: string_list(model.sizes),
            colors: string_list(model.colors),
            image_url: model.image_url,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        let status = model.status.parse().unwrap_or_else(|err: String| {
            tracing::warn!(order_id = %model.id, error = %err, "falling back to shipping");
            OrderStatus::Shipping
        });
        Self {
            id: model.id,
            client_id: model.client_id,
            seller_id: model.seller_id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            address: model.address,
            city: model.city,
            items: serde_json::from_value(model.items).unwrap_or_default(),
            total_payment: model.total_payment,
            status,
            badge_color: status.badge_color().to_string(),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
