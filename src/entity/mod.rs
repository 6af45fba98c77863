pub mod cart_items;
pub mod orders;
pub mod products;
pub mod revoked_tokens;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use revoked_tokens::Entity as RevokedTokens;
pub use users::Entity as Users;
