//! # Fixture Data
//!
//! A small, fixed catalog that can be loaded into either store. The `seed`
//! binary and the integration tests use it, so both backends start from the
//! same logical content.
//!
//! ```text
//! Categories   c1 books    c2 toys    c3 games
//! Products     p1 books    p2 toys    p3 games    p4 games
//! Users        u1 Ada      u2 Grace   u3 Linus
//! Orders       o1 u1 [p1 x2]          o2 u1 [p2, p3]
//!              o3 u2 [p4]
//! ```
//!
//! Loading goes around the contract: products, categories and users have no
//! insert operation there.

use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::DbResult;
use crate::key_value::to_document;
use crate::kv::{tables, KvStore};
use crate::patch::{hash_password, PASSWORD_FIELD};
use crate::pool::Database;
use shopgate_core::{Category, Order, OrderItem, Product, User};

/// A user plus the plain-text credential it is seeded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub user: User,
    pub password: String,
}

/// One consistent set of rows/documents for every collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSet {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub users: Vec<SeedUser>,
    pub orders: Vec<Order>,
}

fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn product(id: &str, name: &str, price_cents: i64, category: &str, attributes: Value) -> Product {
    let attributes = match attributes {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price_cents,
        category: category.to_string(),
        attributes,
    }
}

fn seed_user(id: &str, name: &str, email: &str, password: &str) -> SeedUser {
    SeedUser {
        user: User {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        },
        password: password.to_string(),
    }
}

fn item(product_id: &str, quantity: i64, unit_price_cents: i64) -> OrderItem {
    OrderItem {
        product_id: product_id.to_string(),
        quantity,
        unit_price_cents,
    }
}

impl FixtureSet {
    /// The standard sample catalog.
    pub fn sample() -> Self {
        FixtureSet {
            categories: vec![
                category("c1", "books"),
                category("c2", "toys"),
                category("c3", "games"),
            ],
            products: vec![
                product("p1", "Dune", 1299, "books", json!({ "author": "Frank Herbert", "pages": 412 })),
                product("p2", "Yo-yo", 499, "toys", json!({ "color": "red" })),
                product("p3", "Chess Set", 2499, "games", json!({})),
                product("p4", "Go Board", 3999, "games", json!({ "size": "19x19" })),
            ],
            users: vec![
                seed_user("u1", "Ada", "ada@example.com", "analytical"),
                seed_user("u2", "Grace", "grace@example.com", "cobol"),
                seed_user("u3", "Linus", "linus@example.com", "kernel"),
            ],
            orders: vec![
                Order {
                    id: "o1".to_string(),
                    user_id: "u1".to_string(),
                    items: vec![item("p1", 2, 1299)],
                    total_amount_cents: 2598,
                },
                Order {
                    id: "o2".to_string(),
                    user_id: "u1".to_string(),
                    items: vec![item("p2", 1, 499), item("p3", 1, 2499)],
                    total_amount_cents: 2998,
                },
                Order {
                    id: "o3".to_string(),
                    user_id: "u2".to_string(),
                    items: vec![item("p4", 1, 3999)],
                    total_amount_cents: 3999,
                },
            ],
        }
    }

    /// Loads every collection into the relational store.
    ///
    /// Categories go first so products can resolve them by name.
    pub async fn load_relational(&self, db: &Database) -> DbResult<()> {
        for category in &self.categories {
            db.categories().insert(category).await?;
        }
        for product in &self.products {
            db.products().insert(product).await?;
        }
        for seed in &self.users {
            let hash = hash_password(&seed.password)?;
            db.users().insert(&seed.user, Some(&hash)).await?;
        }
        for order in &self.orders {
            db.orders().insert(order).await?;
        }

        info!(
            categories = self.categories.len(),
            products = self.products.len(),
            users = self.users.len(),
            orders = self.orders.len(),
            "Loaded fixtures into relational store"
        );
        Ok(())
    }

    /// Loads every collection into a key-value store.
    ///
    /// User documents carry the hashed credential under `password`.
    pub async fn load_key_value<S: KvStore + ?Sized>(&self, store: &S) -> DbResult<()> {
        for category in &self.categories {
            store.put(tables::CATEGORIES, to_document(category)?).await?;
        }
        for product in &self.products {
            store.put(tables::PRODUCTS, to_document(product)?).await?;
        }
        for seed in &self.users {
            let mut document = to_document(&seed.user)?;
            document.insert(
                PASSWORD_FIELD.to_string(),
                Value::String(hash_password(&seed.password)?),
            );
            store.put(tables::USERS, document).await?;
        }
        for order in &self.orders {
            store.put(tables::ORDERS, to_document(order)?).await?;
        }

        info!(
            categories = self.categories.len(),
            products = self.products.len(),
            users = self.users.len(),
            orders = self.orders.len(),
            "Loaded fixtures into key-value store"
        );
        Ok(())
    }

    /// Users as returned by reads (no credentials).
    pub fn read_users(&self) -> Vec<User> {
        self.users.iter().map(|seed| seed.user.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;
    use crate::patch::verify_password;
    use crate::pool::DbConfig;
    use shopgate_core::validation::validate_order;

    #[test]
    fn test_sample_orders_are_valid() {
        for order in &FixtureSet::sample().orders {
            validate_order(order).unwrap();
        }
    }

    #[test]
    fn test_only_p1_is_a_book() {
        let books: Vec<_> = FixtureSet::sample()
            .products
            .into_iter()
            .filter(|p| p.category == "books")
            .map(|p| p.id)
            .collect();
        assert_eq!(books, vec!["p1"]);
    }

    #[tokio::test]
    async fn test_load_relational() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fixtures = FixtureSet::sample();
        fixtures.load_relational(&db).await.unwrap();

        assert_eq!(db.products().count().await.unwrap(), 4);
        assert_eq!(db.users().list().await.unwrap(), fixtures.read_users());

        let hash = db.users().password_hash("u1").await.unwrap().unwrap();
        assert!(verify_password("analytical", &hash));
    }

    #[tokio::test]
    async fn test_load_key_value() {
        let store = MemoryKvStore::new();
        FixtureSet::sample().load_key_value(&store).await.unwrap();

        assert_eq!(store.len(tables::PRODUCTS).await, 4);
        assert_eq!(store.len(tables::ORDERS).await, 3);

        let user = store.get(tables::USERS, "u2", None).await.unwrap().unwrap();
        let hash = user[PASSWORD_FIELD].as_str().unwrap();
        assert!(verify_password("cobol", hash));
    }
}
