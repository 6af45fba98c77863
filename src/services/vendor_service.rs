//! Seller-side products and orders, presented as live tables.

use chrono::Utc;
use futures::Stream;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::SellerAction,
        products::{PendingImage, ProductForm},
    },
    entity::products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
    error::{AppError, AppResult},
    live::{self, Change, Collection},
    middleware::auth::{AuthUser, ensure_seller},
    models::{Order, OrderStatus, Product, UserProfile},
    response::{ApiResponse, Meta},
    services::{
        auth_service,
        order_service::{self, Party},
    },
    state::AppState,
    storage::{ObjectStore, StoredObject},
    table::{
        ColumnSpec, Record, Table, TablePage, TableState,
        control::TableCommand,
        live::{LiveTable, live_pages},
        to_record,
    },
    validation,
};

pub const PRODUCT_COLUMNS: ColumnSpec = ColumnSpec {
    hidden: &[
        "id",
        "seller_id",
        "sizes",
        "colors",
        "seller_name",
        "shop_name",
        "shop_address",
        "shop_phone",
        "brand_image",
        "created_at",
    ],
    headers: &[("image_url", "PRODUCT IMAGE"), ("updated_at", "DATE")],
};

pub const ORDER_COLUMNS: ColumnSpec = ColumnSpec {
    hidden: &[
        "id",
        "client_id",
        "seller_id",
        "items",
        "badge_color",
        "updated_at",
    ],
    headers: &[("first_name", "NAME")],
};

pub async fn product_records(state: &AppState, seller_id: Uuid) -> AppResult<Vec<Record>> {
    let records = Products::find()
        .filter(ProductCol::SellerId.eq(seller_id))
        .order_by_desc(ProductCol::UpdatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| to_record(&Product::from(model)))
        .collect();
    Ok(records)
}

/// Seller's orders, optionally narrowed to one status.
pub async fn order_records(
    state: &AppState,
    seller_id: Uuid,
    status: Option<OrderStatus>,
) -> AppResult<Vec<Record>> {
    let records = order_service::load_orders(state, Party::Seller(seller_id))
        .await?
        .iter()
        .filter(|order| status.is_none_or(|status| order.status == status))
        .map(to_record)
        .collect();
    Ok(records)
}

pub async fn products_table(
    state: &AppState,
    user: &AuthUser,
    table_state: TableState,
) -> AppResult<ApiResponse<TablePage>> {
    ensure_seller(user)?;
    let records = product_records(state, user.user_id).await?;
    let page = Table::new(records, &PRODUCT_COLUMNS).view(&table_state);
    let meta = Meta::from(&page);
    Ok(ApiResponse::success("Products", page, Some(meta)))
}

pub async fn orders_table(
    state: &AppState,
    user: &AuthUser,
    table_state: TableState,
    status: Option<OrderStatus>,
) -> AppResult<ApiResponse<TablePage>> {
    ensure_seller(user)?;
    let records = order_records(state, user.user_id, status).await?;
    let page = Table::new(records, &ORDER_COLUMNS).view(&table_state);
    let meta = Meta::from(&page);
    Ok(ApiResponse::success("Orders", page, Some(meta)))
}

/// Opens a control session for the grid; its id goes to the client first.
pub fn live_products_table(
    state: AppState,
    seller_id: Uuid,
    table_state: TableState,
) -> (Uuid, impl Stream<Item = TablePage>) {
    let inputs = state.tables.open(seller_id);
    let session = inputs.session();
    let (filters, commands) = inputs.into_streams();
    let ticks = state.hub.watch(Collection::Products, Some(seller_id));
    let snapshots = live::snapshots(ticks, move || {
        let state = state.clone();
        async move { product_records(&state, seller_id).await }
    });
    let pages = live_pages(
        LiveTable::new(PRODUCT_COLUMNS, table_state),
        snapshots,
        filters,
        commands,
    );
    (session, pages)
}

pub fn live_orders_table(
    state: AppState,
    seller_id: Uuid,
    table_state: TableState,
    status: Option<OrderStatus>,
) -> (Uuid, impl Stream<Item = TablePage>) {
    let inputs = state.tables.open(seller_id);
    let session = inputs.session();
    let (filters, commands) = inputs.into_streams();
    let ticks = state.hub.watch(Collection::Orders, Some(seller_id));
    let snapshots = live::snapshots(ticks, move || {
        let state = state.clone();
        async move { order_records(&state, seller_id, status).await }
    });
    let pages = live_pages(
        LiveTable::new(ORDER_COLUMNS, table_state),
        snapshots,
        filters,
        commands,
    );
    (session, pages)
}

pub async fn table_command(
    state: &AppState,
    user: &AuthUser,
    session: Uuid,
    command: TableCommand,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_seller(user)?;
    state.tables.send(user.user_id, session, command).await?;
    Ok(ApiResponse::success("Table updated", serde_json::Value::Null, None))
}

async fn store_product_image(
    state: &AppState,
    seller_id: Uuid,
    image: &PendingImage,
) -> AppResult<StoredObject> {
    let is_image = image
        .content_type
        .as_deref()
        .is_none_or(|content_type| content_type.starts_with("image/"));
    if !is_image {
        return Err(AppError::field("image", "must be an image"));
    }
    let key = ObjectStore::object_key("product", seller_id, &image.file_name);
    state.storage.put_logged(&key, &image.bytes).await
}

async fn discard_image(state: &AppState, stored: Option<&StoredObject>) {
    if let Some(stored) = stored {
        state.storage.discard(&stored.key).await;
    }
}

fn products_changed(state: &AppState) {
    state.hub.publish(Change::everyone(Collection::Products));
}

/// Validates, uploads the image (if any), then writes the record with the seller's shop details.
pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    form: ProductForm,
    image: Option<PendingImage>,
) -> AppResult<ApiResponse<Product>> {
    ensure_seller(user)?;
    validation::validate_product(&form)?;
    let seller: UserProfile = auth_service::find_user(state, user.user_id).await?;

    let stored = match &image {
        Some(image) => Some(store_product_image(state, seller.id, image).await?),
        None => None,
    };

    let result = ProductActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller.id),
        name: Set(form.name.trim().to_string()),
        category: Set(form.category.trim().to_string()),
        price: Set(form.price.unwrap_or_default()),
        description: Set(form.description.filter(|d| !d.trim().is_empty())),
        sizes: Set(serde_json::json!(form.sizes.as_slice())),
        colors: Set(serde_json::json!(form.colors.as_slice())),
        image_url: Set(stored.as_ref().map(|stored| stored.url.clone())),
        seller_name: Set(seller.name),
        shop_name: Set(seller.shop_name),
        shop_address: Set(seller.shop_address),
        shop_phone: Set(seller.shop_phone),
        brand_image: Set(seller.brand_image),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await;

    let product = match result {
        Ok(product) => product,
        Err(err) => {
            tracing::warn!(seller_id = %user.user_id, error = %err, "product create failed");
            discard_image(state, stored.as_ref()).await;
            return Err(err.into());
        }
    };

    tracing::info!(seller_id = %user.user_id, product_id = %product.id, "product created");
    products_changed(state);
    Ok(ApiResponse::success(
        "Product added",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Same rules as create; the stored image is kept unless a new one is sent.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    form: ProductForm,
    image: Option<PendingImage>,
) -> AppResult<ApiResponse<Product>> {
    ensure_seller(user)?;
    let existing = Products::find_by_id(id)
        .filter(ProductCol::SellerId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    validation::validate_product(&form)?;

    let stored = match &image {
        Some(image) => Some(store_product_image(state, user.user_id, image).await?),
        None => None,
    };
    let image_url = match &stored {
        Some(stored) => Some(stored.url.clone()),
        None => existing.image_url.clone(),
    };

    let mut active: ProductActive = existing.into();
    active.name = Set(form.name.trim().to_string());
    active.category = Set(form.category.trim().to_string());
    active.price = Set(form.price.unwrap_or_default());
    active.description = Set(form.description.filter(|d| !d.trim().is_empty()));
    active.sizes = Set(serde_json::json!(form.sizes.as_slice()));
    active.colors = Set(serde_json::json!(form.colors.as_slice()));
    active.image_url = Set(image_url);
    active.updated_at = Set(Utc::now().into());

    let product = match active.update(&state.orm).await {
        Ok(product) => product,
        Err(err) => {
            tracing::warn!(product_id = %id, error = %err, "product update failed");
            discard_image(state, stored.as_ref()).await;
            return Err(err.into());
        }
    };

    tracing::info!(seller_id = %user.user_id, product_id = %id, "product updated");
    products_changed(state);
    Ok(ApiResponse::success(
        "Product updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_seller(user)?;
    let result = Products::delete_many()
        .filter(ProductCol::Id.eq(id))
        .filter(ProductCol::SellerId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(seller_id = %user.user_id, product_id = %id, "product delete found nothing");
        return Err(AppError::NotFound);
    }

    tracing::info!(seller_id = %user.user_id, product_id = %id, "product deleted");
    products_changed(state);
    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn seller_action(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    action: SellerAction,
) -> AppResult<ApiResponse<Order>> {
    ensure_seller(user)?;
    let order =
        order_service::transition(state, Party::Seller(user.user_id), order_id, action.target())
            .await?;
    Ok(ApiResponse::success(
        format!("Order {}", order.status),
        order,
        Some(Meta::empty()),
    ))
}
