//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ProductStore` port from the `core` crate backed by PostgreSQL via `sqlx`.
//!
//! The database owns id generation (`BIGSERIAL`), the name uniqueness constraint and
//! the non-negativity checks. Every operation touches a single row atomically; there
//! is no cross-record transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use perfumery_core::domain::{NewProduct, Product, ProductId, ProductPatch};
use perfumery_core::ports::{PortError, PortResult, ProductStore};
use sqlx::{FromRow, PgPool};
use tracing::info;

const PRODUCT_COLUMNS: &str =
    "id, name, price, stock, image, notes, description, created_at, updated_at";

// SQLSTATE codes.
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ProductStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Struct
//=========================================================================================

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: f64,
    stock: i32,
    image: String,
    notes: Vec<String>,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn to_domain(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            price: self.price,
            // The CHECK constraint keeps the column non-negative.
            stock: self.stock.max(0) as u32,
            image: self.image,
            notes: self.notes,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn stock_column(stock: u32) -> PortResult<i32> {
    i32::try_from(stock)
        .map_err(|_| PortError::Validation(format!("`stock` must be at most {}", i32::MAX)))
}

fn not_found(id: ProductId) -> PortError {
    PortError::NotFound(format!("Product {} not found", id))
}

/// Maps driver errors onto the port taxonomy. Unique violations can only come
/// from the `name` constraint.
fn map_db_error(e: sqlx::Error, name: Option<&str>) -> PortError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            PortError::DuplicateName(name.unwrap_or_default().to_string())
        }
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(CHECK_VIOLATION) => {
            PortError::Validation(db_err.message().to_string())
        }
        _ => PortError::StorageUnavailable(e.to_string()),
    }
}

//=========================================================================================
// `ProductStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProductStore for DbAdapter {
    async fn list_all(&self) -> PortResult<Vec<Product>> {
        let records = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, None))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_by_id(&self, id: ProductId) -> PortResult<Product> {
        let record = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, None))?
        .ok_or_else(|| not_found(id))?;

        Ok(record.to_domain())
    }

    async fn create(&self, product: NewProduct) -> PortResult<Product> {
        let product = product.validated()?;
        let now = Utc::now();

        let record = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, price, stock, image, notes, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(stock_column(product.stock)?)
        .bind(&product.image)
        .bind(&product.notes)
        .bind(&product.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, Some(&product.name)))?;

        info!(product_id = record.id, name = %record.name, "Product created");
        Ok(record.to_domain())
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> PortResult<Product> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error(e, None))?;

        let mut product = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, None))?
        .ok_or_else(|| not_found(id))?
        .to_domain();

        patch.apply_to(&mut product, Utc::now())?;

        let record = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET price = $2, stock = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(product.price)
        .bind(stock_column(product.stock)?)
        .bind(product.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, None))?;

        tx.commit().await.map_err(|e| map_db_error(e, None))?;

        info!(product_id = id, "Product updated");
        Ok(record.to_domain())
    }

    async fn delete(&self, id: ProductId) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, None))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        info!(product_id = id, "Product deleted");
        Ok(())
    }
}
