use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    checkout::{CheckoutState, PendingOrder},
    dto::checkout::ShippingForm,
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        orders::ActiveModel as OrderActive,
    },
    error::{AppError, AppResult},
    live::{Change, Collection},
    middleware::auth::AuthUser,
    models::OrderStatus,
    response::{ApiResponse, Meta},
    services::cart_service,
    state::AppState,
};

pub async fn current(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CheckoutState>> {
    let session = state.checkouts.session(user.user_id).await;
    let snapshot = session.lock().await.clone();
    Ok(ApiResponse::success("OK", snapshot, None))
}

/// Validates the form and freezes the current cart into the order summary.
pub async fn submit_address(
    state: &AppState,
    user: &AuthUser,
    form: ShippingForm,
) -> AppResult<ApiResponse<CheckoutState>> {
    let cart = cart_service::load_cart(state, user.user_id).await?;
    let session = state.checkouts.session(user.user_id).await;
    let mut checkout = session.lock().await;
    checkout.submit_address(form, &cart)?;

    if let Some(pending) = checkout.pending() {
        tracing::info!(
            user_id = %user.user_id,
            lines = pending.lines.len(),
            total_payment = pending.total_payment,
            "checkout summary ready"
        );
    }
    Ok(ApiResponse::success("Order summary", checkout.clone(), None))
}

pub async fn back(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CheckoutState>> {
    let session = state.checkouts.session(user.user_id).await;
    let mut checkout = session.lock().await;
    checkout.back()?;
    Ok(ApiResponse::success("OK", checkout.clone(), None))
}

/// Writes one `shipping` order per seller in the summary and empties the cart, atomically.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CheckoutState>> {
    let session = state.checkouts.session(user.user_id).await;
    let mut checkout = session.lock().await;
    let pending: PendingOrder = checkout
        .pending()
        .cloned()
        .ok_or_else(|| AppError::BadRequest("no order summary to confirm".into()))?;

    let shares = pending.by_seller();
    let txn = state.orm.begin().await?;
    let mut order_ids = Vec::with_capacity(shares.len());
    for share in &shares {
        let items = serde_json::to_value(&share.lines)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        let order = OrderActive {
            id: Set(Uuid::new_v4()),
            client_id: Set(user.user_id),
            seller_id: Set(share.seller_id),
            first_name: Set(pending.shipping.first_name.trim().to_string()),
            last_name: Set(pending.shipping.last_name.trim().to_string()),
            email: Set(pending.shipping.email.trim().to_string()),
            address: Set(pending.shipping.address.trim().to_string()),
            city: Set(pending.shipping.city.trim().to_string()),
            items: Set(items),
            total_payment: Set(share.total_payment),
            status: Set(OrderStatus::Shipping.as_str().to_string()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_ids.push(order.id);
    }

    CartItems::delete_many()
        .filter(CartCol::ClientId.eq(user.user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    let mut owners = vec![user.user_id];
    owners.extend(shares.iter().map(|share| share.seller_id));
    state.hub.publish(Change::new(Collection::Orders, owners));
    state.hub.publish(Change::new(Collection::Carts, [user.user_id]));

    tracing::info!(
        user_id = %user.user_id,
        orders = order_ids.len(),
        total_payment = pending.total_payment,
        "order placed"
    );
    checkout.confirm(order_ids)?;
    Ok(ApiResponse::success("Order placed", checkout.clone(), None))
}

pub async fn reset(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    state.checkouts.reset(user.user_id).await;
    Ok(ApiResponse::success(
        "Checkout reset",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
