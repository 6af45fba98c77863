use ladeno_storefront::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    models::ROLE_SELLER,
    services::auth_service::hash_password,
    validation::format_phone_number,
};
use uuid::Uuid;

struct Shop<'a> {
    name: &'a str,
    address: &'a str,
    phone: &'a str,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm_from_pool(&pool)).await?;

    let seller_id = ensure_user(
        &pool,
        "Lara Dizon",
        "seller@example.com",
        "09171234567",
        "Seller123",
        Some(Shop {
            name: "Habi Crafts",
            address: "Poblacion, Makati City",
            phone: "09281234567",
        }),
    )
    .await?;
    let shopper_id = ensure_user(
        &pool,
        "Nico Santos",
        "shopper@example.com",
        "+639171112222",
        "Shopper123",
        None,
    )
    .await?;
    seed_products(&pool, seller_id).await?;

    println!("Seed completed. Seller ID: {seller_id}, Shopper ID: {shopper_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    phone: &str,
    password: &str,
    shop: Option<Shop<'_>>,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let roles = if shop.is_some() {
        serde_json::json!([ROLE_SELLER])
    } else {
        serde_json::json!([])
    };

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, phone, password_hash, roles, shop_name, shop_address, shop_phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (email) DO UPDATE SET roles = EXCLUDED.roles
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(format_phone_number(phone))
    .bind(password_hash)
    .bind(roles)
    .bind(shop.as_ref().map(|s| s.name))
    .bind(shop.as_ref().map(|s| s.address))
    .bind(shop.as_ref().map(|s| format_phone_number(s.phone)))
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email}");
    Ok(row.0)
}

async fn seed_products(pool: &sqlx::PgPool, seller_id: Uuid) -> anyhow::Result<()> {
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE seller_id = $1")
        .bind(seller_id)
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        println!("Products already seeded");
        return Ok(());
    }

    let products = vec![
        ("Abaca Tote Bag", "Accessories", 850, "Hand-woven abaca fiber", vec!["S", "M"], vec!["Natural"]),
        ("Barong Tagalog", "Clothing", 3200, "Pina cloth with calado embroidery", vec!["M", "L", "XL"], vec!["Ecru"]),
        ("Dried Mangoes", "Delicacy", 180, "Cebu dried mangoes, 200 g", vec![], vec![]),
        ("Narra Side Table", "Furnitures", 5400, "Solid narra, oil finish", vec![], vec!["Walnut"]),
        ("Running Shoe", "Clothing", 2100, "Lightweight trainer", vec!["40", "41", "42"], vec!["Black", "White"]),
    ];

    for (name, category, price, description, sizes, colors) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, name, category, price, description, sizes, colors,
                                  seller_name, shop_name, shop_address, shop_phone)
            SELECT $1, u.id, $3, $4, $5, $6, $7, $8, u.name, u.shop_name, u.shop_address, u.shop_phone
            FROM users u WHERE u.id = $2
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(name)
        .bind(category)
        .bind(price as i64)
        .bind(description)
        .bind(serde_json::json!(sizes))
        .bind(serde_json::json!(colors))
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
