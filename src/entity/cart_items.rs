use sea_orm::entity::prelude::*;

/// A cart line: a denormalized copy of the product plus the quantity.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub category: String,
    pub price: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub sizes: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub colors: Json,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ClientId",
        to = "super::users::Column::Id"
    )]
    Client,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
