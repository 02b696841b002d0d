//! Database connection pool, migrations and demo data.

use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

/// PostgreSQL connection pool shared by every handler.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if the connection string is invalid or the server
/// cannot be reached.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run the SQL migrations embedded from `migrations/`.
///
/// Applied migrations are tracked in `_sqlx_migrations`, so each file runs once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Demo menu: (category, product, price in cents, description, image file).
const DEMO_PRODUCTS: &[(&str, &str, i64, &str, &str)] = &[
    ("Coffee", "Espresso", 14900, "Strong and bold single shot.", "espressocoffee.jpg"),
    ("Coffee", "Cappuccino", 19900, "Rich and foamy.", "cappuccino.jpg"),
    ("Coffee", "Latte", 18900, "Smooth milk coffee blend.", "latte.jpg"),
    ("Desserts", "Chocolate Cake", 24900, "Rich chocolate delight.", "chocolatecake.jpg"),
    ("Desserts", "Cheesecake", 25900, "Creamy classic treat.", "cheesecake.jpg"),
    ("Snacks", "Club Sandwich", 22900, "Toasted & layered goodness.", "clubsandwich.jpg"),
    ("Snacks", "Croissant", 12900, "Buttery flaky pastry.", "croissant.jpg"),
    ("Drinks", "Iced Coffee", 17900, "Chilled & refreshing.", "icedcoffee.jpg"),
    ("Drinks", "Lemon Iced Tea", 14900, "Zesty cool tea.", "lemonicetea.jpg"),
];

const DEMO_CATEGORIES: &[&str] = &["Coffee", "Desserts", "Snacks", "Drinks"];

/// Insert the demo café catalog.
///
/// Idempotent: categories are matched by name and products by
/// (name, category), so re-running only fills in what is missing.
///
/// Returns the number of products inserted.
pub async fn seed_demo_catalog(pool: &DbPool) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    for name in DEMO_CATEGORIES {
        sqlx::query("INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    let mut inserted = 0;
    for (category, name, cents, description, image) in DEMO_PRODUCTS {
        let result = sqlx::query(
            r#"
            INSERT INTO products (name, price, description, image_url, category_id)
            SELECT $1, $2, $3, $4, c.id
            FROM categories c
            WHERE c.name = $5
              AND NOT EXISTS (
                  SELECT 1 FROM products p WHERE p.name = $1 AND p.category_id = c.id
              )
            "#,
        )
        .bind(name)
        .bind(Decimal::new(*cents, 2))
        .bind(description)
        .bind(format!("/images/products/{image}"))
        .bind(category)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;

    Ok(inserted)
}
