use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub shop_name: Option<String>,
    pub shop_address: Option<String>,
    pub shop_phone: Option<String>,
    pub brand_image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BecomeSellerRequest {
    pub shop_name: String,
    pub shop_address: String,
    pub shop_phone: String,
    pub brand_image: Option<String>,
}
