//! Checkout state machine: `AddressEntry -> OrderSummary -> Confirmation`.
//!
//! Entering the summary freezes the cart into a [`PendingOrder`]; later cart edits do not
//! reach it. Confirmation is terminal until the session is reset.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use serde::Serialize;
use tokio::{sync::Mutex, time::Instant};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::checkout::ShippingForm,
    error::{AppError, AppResult},
    models::{CartItem, OrderLine},
    validation,
};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PendingOrder {
    pub shipping: ShippingForm,
    pub lines: Vec<OrderLine>,
    pub total_payment: i64,
}

/// Lines and subtotal belonging to one seller.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerShare {
    pub seller_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub total_payment: i64,
}

impl PendingOrder {
    pub fn snapshot(shipping: ShippingForm, cart: &[CartItem]) -> Self {
        let lines: Vec<OrderLine> = cart.iter().map(OrderLine::from).collect();
        let total_payment = lines.iter().map(OrderLine::line_total).sum();
        Self {
            shipping,
            lines,
            total_payment,
        }
    }

    /// Splits the snapshot per seller, keeping first-seen seller order.
    pub fn by_seller(&self) -> Vec<SellerShare> {
        let mut order: Vec<Uuid> = Vec::new();
        let mut grouped: BTreeMap<Uuid, Vec<OrderLine>> = BTreeMap::new();
        for line in &self.lines {
            if !grouped.contains_key(&line.seller_id) {
                order.push(line.seller_id);
            }
            grouped.entry(line.seller_id).or_default().push(line.clone());
        }

        order
            .into_iter()
            .filter_map(|seller_id| {
                grouped.remove(&seller_id).map(|lines| SellerShare {
                    seller_id,
                    total_payment: lines.iter().map(OrderLine::line_total).sum(),
                    lines,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CheckoutState {
    AddressEntry {
        form: ShippingForm,
    },
    OrderSummary {
        pending: PendingOrder,
    },
    Confirmation {
        order_ids: Vec<Uuid>,
        total_payment: i64,
    },
}

impl Default for CheckoutState {
    fn default() -> Self {
        CheckoutState::AddressEntry {
            form: ShippingForm::default(),
        }
    }
}

impl CheckoutState {
    pub fn step_index(&self) -> u8 {
        match self {
            CheckoutState::AddressEntry { .. } => 0,
            CheckoutState::OrderSummary { .. } => 1,
            CheckoutState::Confirmation { .. } => 2,
        }
    }

    pub fn pending(&self) -> Option<&PendingOrder> {
        match self {
            CheckoutState::OrderSummary { pending } => Some(pending),
            _ => None,
        }
    }

    /// Validates the shipping form and freezes `cart` into the pending order.
    ///
    /// A rejected form is still kept so the caller can show it back with its errors.
    pub fn submit_address(&mut self, form: ShippingForm, cart: &[CartItem]) -> AppResult<()> {
        if !matches!(self, CheckoutState::AddressEntry { .. }) {
            return Err(AppError::BadRequest(
                "shipping address can only be submitted from the address step".into(),
            ));
        }

        if let Err(err) = validation::validate_shipping(&form) {
            *self = CheckoutState::AddressEntry { form };
            return Err(err);
        }
        if cart.is_empty() {
            *self = CheckoutState::AddressEntry { form };
            return Err(AppError::BadRequest("Cart is empty".into()));
        }

        *self = CheckoutState::OrderSummary {
            pending: PendingOrder::snapshot(form, cart),
        };
        Ok(())
    }

    /// Steps back once. The address step stays put; confirmation cannot go back.
    pub fn back(&mut self) -> AppResult<()> {
        match self {
            CheckoutState::AddressEntry { .. } => Ok(()),
            CheckoutState::OrderSummary { pending } => {
                let form = pending.shipping.clone();
                *self = CheckoutState::AddressEntry { form };
                Ok(())
            }
            CheckoutState::Confirmation { .. } => {
                Err(AppError::BadRequest("order already placed".into()))
            }
        }
    }

    pub fn confirm(&mut self, order_ids: Vec<Uuid>) -> AppResult<()> {
        let total_payment = match self {
            CheckoutState::OrderSummary { pending } => pending.total_payment,
            _ => {
                return Err(AppError::BadRequest(
                    "no order summary to confirm".into(),
                ));
            }
        };
        *self = CheckoutState::Confirmation {
            order_ids,
            total_payment,
        };
        Ok(())
    }
}

/// Sessions untouched for this long are dropped on the next lookup.
pub const SESSION_IDLE: Duration = Duration::from_secs(2 * 60 * 60);

struct SessionEntry {
    state: Arc<Mutex<CheckoutState>>,
    touched: Instant,
}

/// Per-user checkout sessions held in memory.
#[derive(Clone, Default)]
pub struct CheckoutSessions {
    inner: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
}

impl CheckoutSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `user_id`, created in the address step on first use. Idle sessions
    /// nobody holds are evicted first.
    pub async fn session(&self, user_id: Uuid) -> Arc<Mutex<CheckoutState>> {
        let now = Instant::now();
        let mut sessions = self.inner.lock().await;
        sessions.retain(|_, entry| {
            now.duration_since(entry.touched) < SESSION_IDLE || Arc::strong_count(&entry.state) > 1
        });

        let entry = sessions.entry(user_id).or_insert_with(|| SessionEntry {
            state: Arc::new(Mutex::new(CheckoutState::default())),
            touched: now,
        });
        entry.touched = now;
        entry.state.clone()
    }

    pub async fn reset(&self, user_id: Uuid) {
        self.inner.lock().await.remove(&user_id);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
