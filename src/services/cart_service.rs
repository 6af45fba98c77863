use chrono::Utc;
use futures::Stream;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::NotSet,
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::{
    cart::{self, QuantityChange},
    dto::cart::{AddToCartRequest, CartView, QuantityUpdate},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    live::{self, Change, Collection},
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Cart lines for `client_id`, oldest first.
pub async fn load_cart(state: &AppState, client_id: Uuid) -> AppResult<Vec<CartItem>> {
    let items = CartItems::find()
        .filter(CartCol::ClientId.eq(client_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();
    Ok(items)
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let items = load_cart(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", CartView::new(items), None))
}

pub fn live_cart(state: AppState, client_id: Uuid) -> impl Stream<Item = CartView> {
    let ticks = state.hub.watch(Collection::Carts, Some(client_id));
    live::snapshots(ticks, move || {
        let state = state.clone();
        async move { load_cart(&state, client_id).await.map(CartView::new) }
    })
}

fn carts_changed(state: &AppState, client_id: Uuid) {
    state.hub.publish(Change::new(Collection::Carts, [client_id]));
}

/// Copies the product into the cart with quantity 1, or bumps the existing line. The
/// `(client_id, product_id)` key makes concurrent adds land on one line.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;

    let line = CartActive {
        id: Set(Uuid::new_v4()),
        client_id: Set(user.user_id),
        product_id: Set(product.id),
        seller_id: Set(product.seller_id),
        name: Set(product.name),
        category: Set(product.category),
        price: Set(product.price),
        sizes: Set(product.sizes),
        colors: Set(product.colors),
        image_url: Set(product.image_url),
        quantity: Set(1),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let item = CartItems::insert(line)
        .on_conflict(
            OnConflict::columns([CartCol::ClientId, CartCol::ProductId])
                .value(
                    CartCol::Quantity,
                    Expr::col((CartItems, CartCol::Quantity)).add(1),
                )
                .value(CartCol::UpdatedAt, Expr::current_timestamp())
                .to_owned(),
        )
        .exec_with_returning(&state.orm)
        .await?;

    tracing::info!(user_id = %user.user_id, product_id = %item.product_id, quantity = item.quantity, "added to cart");
    carts_changed(state, user.user_id);
    Ok(ApiResponse::success("Added to cart", CartItem::from(item), None))
}

/// Applies `rule` to one line under a row lock, so concurrent `+`/`-` see each other.
async fn change_quantity(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    rule: fn(i32) -> QuantityChange,
) -> AppResult<ApiResponse<QuantityUpdate>> {
    let txn = state.orm.begin().await?;
    let line = CartItems::find_by_id(id)
        .filter(CartCol::ClientId.eq(user.user_id))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let update = match rule(line.quantity) {
        QuantityChange::Set(quantity) => {
            let mut active: CartActive = line.into();
            active.quantity = Set(quantity);
            active.updated_at = Set(Utc::now().into());
            let item = active.update(&txn).await?;
            QuantityUpdate::Updated {
                item: CartItem::from(item),
            }
        }
        QuantityChange::Remove => {
            CartItems::delete_by_id(line.id).exec(&txn).await?;
            QuantityUpdate::Removed { id: line.id }
        }
    };
    txn.commit().await?;

    tracing::debug!(user_id = %user.user_id, cart_item_id = %id, "cart quantity changed");
    carts_changed(state, user.user_id);
    Ok(ApiResponse::success("OK", update, None))
}

pub async fn increment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<QuantityUpdate>> {
    change_quantity(state, user, id, cart::increment).await
}

pub async fn decrement(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<QuantityUpdate>> {
    change_quantity(state, user, id, cart::decrement).await
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(id))
        .filter(CartCol::ClientId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %user.user_id, cart_item_id = %id, "removed from cart");
    carts_changed(state, user.user_id);
    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::ClientId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    tracing::info!(user_id = %user.user_id, removed = result.rows_affected, "cart emptied");
    carts_changed(state, user.user_id);
    Ok(ApiResponse::success(
        "Cart emptied",
        serde_json::json!({ "removed": result.rows_affected }),
        Some(Meta::empty()),
    ))
}
