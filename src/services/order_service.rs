use chrono::Utc;
use futures::Stream;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{ClientAction, OrderList},
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    live::{self, Change, Collection},
    middleware::auth::AuthUser,
    models::{Order, OrderStatus},
    response::ApiResponse,
    state::AppState,
};

/// Which side of an order the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Client(Uuid),
    Seller(Uuid),
}

impl Party {
    fn column(self) -> (OrderCol, Uuid) {
        match self {
            Party::Client(id) => (OrderCol::ClientId, id),
            Party::Seller(id) => (OrderCol::SellerId, id),
        }
    }
}

/// Orders visible to `party`, newest first.
pub async fn load_orders(state: &AppState, party: Party) -> AppResult<Vec<Order>> {
    let (column, id) = party.column();
    let items = Orders::find()
        .filter(column.eq(id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();
    Ok(items)
}

pub async fn list_client_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let items = load_orders(state, Party::Client(user.user_id)).await?;
    Ok(ApiResponse::success("Ok", OrderList { items }, None))
}

pub fn live_orders(state: AppState, party: Party) -> impl Stream<Item = Vec<Order>> {
    let owner = match party {
        Party::Client(id) | Party::Seller(id) => id,
    };
    let ticks = state.hub.watch(Collection::Orders, Some(owner));
    live::snapshots(ticks, move || {
        let state = state.clone();
        async move { load_orders(&state, party).await }
    })
}

/// Moves one order owned by `party` to `next`, if the status table allows it.
pub async fn transition(
    state: &AppState,
    party: Party,
    order_id: Uuid,
    next: OrderStatus,
) -> AppResult<Order> {
    let (column, id) = party.column();
    // Row lock: two actions racing on one order are checked one after the other.
    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(order_id)
        .filter(column.eq(id))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = Order::from(existing.clone()).status;
    if !current.can_transition_to(next) {
        tracing::warn!(%order_id, from = %current, to = %next, "rejected status change");
        return Err(AppError::Conflict(format!(
            "order cannot move from {current} to {next}"
        )));
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(%order_id, from = %current, to = %next, "order status changed");
    state.hub.publish(Change::new(
        Collection::Orders,
        [updated.client_id, updated.seller_id],
    ));
    Ok(Order::from(updated))
}

pub async fn client_action(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    action: ClientAction,
) -> AppResult<ApiResponse<Order>> {
    let order = transition(state, Party::Client(user.user_id), order_id, action.target()).await?;
    Ok(ApiResponse::success(
        format!("Order {}", order.status),
        order,
        None,
    ))
}
