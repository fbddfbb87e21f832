//! # Product Repository
//!
//! Read paths for products, plus the fixture insert.
//!
//! ## Category Join
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How the Category Filter Works                        │
//! │                                                                         │
//! │  products                          categories                          │
//! │  ┌──────┬─────────┬─────────────┐  ┌──────┬────────┐                   │
//! │  │ id   │ name    │ category_id │  │ id   │ name   │                   │
//! │  ├──────┼─────────┼─────────────┤  ├──────┼────────┤                   │
//! │  │ p1   │ Dune    │ c1 ─────────┼─►│ c1   │ books  │ ← name = ?1       │
//! │  │ p2   │ Yo-yo   │ c2 ─────────┼─►│ c2   │ toys   │                   │
//! │  └──────┴─────────┴─────────────┘  └──────┴────────┘                   │
//! │                                                                         │
//! │  The filter matches the human-readable category name, exactly and      │
//! │  case-sensitively (SQLite `=` on TEXT is a binary comparison).          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopgate_core::Product;

/// A product row joined with its category name.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_cents: i64,
    category: String,
    attributes: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        let attributes: Map<String, Value> = serde_json::from_str(&row.attributes)?;

        Ok(Product {
            id: row.id,
            name: row.name,
            price_cents: row.price_cents,
            category: row.category,
            attributes,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT
                p.id,
                p.name,
                p.price_cents,
                c.name AS category,
                p.attributes
            FROM products p
            INNER JOIN categories c ON c.id = p.category_id
            WHERE p.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Lists products, optionally restricted to one category name.
    pub async fn list(&self, category: Option<&str>) -> DbResult<Vec<Product>> {
        debug!(category = ?category, "Listing products");

        let rows = match category {
            Some(category) => {
                sqlx::query_as::<_, ProductRow>(
                    r#"
                    SELECT
                        p.id,
                        p.name,
                        p.price_cents,
                        c.name AS category,
                        p.attributes
                    FROM products p
                    INNER JOIN categories c ON c.id = p.category_id
                    WHERE c.name = ?1
                    ORDER BY p.id
                    "#,
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(
                    r#"
                    SELECT
                        p.id,
                        p.name,
                        p.price_cents,
                        c.name AS category,
                        p.attributes
                    FROM products p
                    INNER JOIN categories c ON c.id = p.category_id
                    ORDER BY p.id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(count = rows.len(), "Listed products");
        into_products(rows)
    }

    /// Picks one product uniformly at random.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - The collection is non-empty
    /// * `Ok(None)` - There are no products
    pub async fn random(&self) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT
                p.id,
                p.name,
                p.price_cents,
                c.name AS category,
                p.attributes
            FROM products p
            INNER JOIN categories c ON c.id = p.category_id
            ORDER BY RANDOM()
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Inserts a product, resolving its category by name.
    ///
    /// Used by fixture loading; products are read-only through the contract.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::NotFound)` - No category with that name
    /// * `Err(DbError::UniqueViolation)` - Product id already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, category = %product.category, "Inserting product");

        let attributes = serde_json::to_string(&product.attributes)?;

        let result = sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, category_id, attributes)
            SELECT ?1, ?2, ?3, c.id, ?5
            FROM categories c
            WHERE c.name = ?4
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(attributes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &product.category));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::pool::{Database, DbConfig};
    use shopgate_core::Category;

    use super::*;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (id, name) in [("c1", "books"), ("c2", "toys")] {
            db.categories()
                .insert(&Category {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .await
                .unwrap();
        }
        db
    }

    fn product(id: &str, category: &str) -> Product {
        let mut attributes = Map::new();
        attributes.insert("color".to_string(), json!("red"));
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            price_cents: 1099,
            category: category.to_string(),
            attributes,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trips_attributes() {
        let db = setup().await;
        let repo = db.products();

        repo.insert(&product("p1", "books")).await.unwrap();

        let found = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found, product("p1", "books"));
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_category_name() {
        let db = setup().await;
        let repo = db.products();
        repo.insert(&product("p1", "books")).await.unwrap();
        repo.insert(&product("p2", "toys")).await.unwrap();

        let books = repo.list(Some("books")).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "p1");

        assert!(repo.list(Some("Books")).await.unwrap().is_empty());
        assert_eq!(repo.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_insert_with_unknown_category_fails() {
        let db = setup().await;

        let err = db.products().insert(&product("p1", "garden")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_random_on_empty_collection() {
        let db = setup().await;
        assert!(db.products().random().await.unwrap().is_none());

        db.products().insert(&product("p1", "books")).await.unwrap();
        assert_eq!(db.products().random().await.unwrap().unwrap().id, "p1");
    }
}
