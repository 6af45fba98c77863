use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    checkout::{CheckoutState, PendingOrder},
    dto::{
        account::{BecomeSellerRequest, UpdateAccountRequest},
        auth::{ChangePasswordRequest, SignInRequest, SignInResponse, SignUpRequest},
        cart::{AddToCartRequest, CartView, QuantityUpdate},
        checkout::ShippingForm,
        orders::{ClientAction, OrderList, SellerAction},
        products::{OptionList, ProductForm, ProductList, UploadedFile},
    },
    models::{CartItem, Order, OrderLine, OrderStatus, Product, UserProfile},
    response::{ApiResponse, Meta},
    routes::{account, auth, cart, checkout, health, orders, params, products, vendor},
    table::{Column, PageNav, SortBy, SortDirection, TablePage, control::TableCommand},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::sign_up,
        auth::sign_in,
        auth::sign_out,
        auth::me,
        auth::change_password,
        products::list_products,
        products::live_products,
        products::get_product,
        cart::cart_list,
        cart::live_cart,
        cart::add_to_cart,
        cart::increment,
        cart::decrement,
        cart::remove_from_cart,
        cart::clear_cart,
        checkout::current,
        checkout::submit_address,
        checkout::back,
        checkout::place_order,
        checkout::reset,
        orders::list_orders,
        orders::live_orders,
        orders::mark_delivered,
        orders::cancel_order,
        vendor::products_table,
        vendor::live_products_table,
        vendor::create_product,
        vendor::update_product,
        vendor::delete_product,
        vendor::orders_table,
        vendor::live_orders_table,
        vendor::order_action,
        vendor::table_command,
        account::get_account,
        account::live_account,
        account::update_account,
        account::become_seller,
        account::upload_brand_image
    ),
    components(
        schemas(
            UserProfile,
            Product,
            CartItem,
            Order,
            OrderLine,
            OrderStatus,
            SignUpRequest,
            SignInRequest,
            SignInResponse,
            ChangePasswordRequest,
            UpdateAccountRequest,
            BecomeSellerRequest,
            AddToCartRequest,
            CartView,
            QuantityUpdate,
            ShippingForm,
            PendingOrder,
            CheckoutState,
            ClientAction,
            SellerAction,
            OrderList,
            OptionList,
            ProductForm,
            ProductList,
            UploadedFile,
            Column,
            SortBy,
            SortDirection,
            PageNav,
            TableCommand,
            TablePage,
            health::HealthData,
            params::Pagination,
            params::CatalogQuery,
            params::TableQuery,
            Meta,
            ApiResponse<UserProfile>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<CheckoutState>,
            ApiResponse<OrderList>,
            ApiResponse<TablePage>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Sign up, sign in, tokens and passwords"),
        (name = "Products", description = "Public catalog"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Checkout", description = "Address, summary and confirmation steps"),
        (name = "Orders", description = "Orders placed by the current user"),
        (name = "Vendor", description = "Seller product and order tables"),
        (name = "Account", description = "Profile and seller onboarding"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
