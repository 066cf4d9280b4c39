//! services/api/src/adapters/json_file.rs
//!
//! The flat-file adapter: the whole product collection is one pretty-printed JSON
//! array, read in full and rewritten in full on every mutation. It implements the
//! `ProductStore` port from the `core` crate.
//!
//! All writers go through one mutex, so read-modify-write cycles never interleave
//! and two creates can never compute the same id. Each snapshot is written to a
//! sibling temp file and renamed into place, so lock-free readers always see a
//! complete file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use perfumery_core::domain::{NewProduct, Notes, Product, ProductId, ProductPatch};
use perfumery_core::ports::{PortError, PortResult, ProductStore};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed adapter that implements the `ProductStore` port.
pub struct JsonFileAdapter {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileAdapter {
    /// Creates a new `JsonFileAdapter`. The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> PortResult<Vec<Product>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist yet, treating as empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.unavailable(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<ProductRecord> =
            serde_json::from_str(&raw).map_err(|e| self.unavailable(e))?;
        Ok(records.into_iter().map(ProductRecord::to_domain).collect())
    }

    async fn write_all(&self, products: &[Product]) -> PortResult<()> {
        let records: Vec<ProductRecord> = products.iter().map(ProductRecord::from_domain).collect();
        let json = serde_json::to_string_pretty(&records).map_err(|e| self.unavailable(e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.unavailable(e))?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| self.unavailable(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.unavailable(e))?;
        Ok(())
    }

    fn unavailable(&self, e: impl std::fmt::Display) -> PortError {
        PortError::StorageUnavailable(format!("{}: {}", self.path.display(), e))
    }
}

/// New ids are `1 + max(existing)`. Gaps left by deletions are never refilled.
fn next_id(products: &[Product]) -> PortResult<ProductId> {
    products
        .iter()
        .map(|p| p.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| PortError::StorageUnavailable("product id space exhausted".to_string()))
}

fn not_found(id: ProductId) -> PortError {
    PortError::NotFound(format!("Product {} not found", id))
}

//=========================================================================================
// On-Disk Record Struct
//=========================================================================================

/// The serialized shape of one entry in the collection file.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    id: ProductId,
    name: String,
    price: f64,
    #[serde(default)]
    stock: u32,
    #[serde(default)]
    image: String,
    #[serde(default)]
    notes: Option<StoredNotes>,
    #[serde(default)]
    description: Option<String>,
    // Older files may lack either timestamp.
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Older files keep `notes` as the raw string the client sent.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredNotes {
    Text(String),
    List(Vec<String>),
}

impl From<StoredNotes> for Notes {
    fn from(stored: StoredNotes) -> Self {
        match stored {
            StoredNotes::Text(raw) => Notes::Delimited(raw),
            StoredNotes::List(items) => Notes::List(items),
        }
    }
}

impl ProductRecord {
    fn to_domain(self) -> Product {
        // Records without any timestamp load at the epoch.
        let created_at = self
            .created_at
            .or(self.updated_at)
            .unwrap_or_default();
        Product {
            id: self.id,
            name: self.name,
            price: self.price,
            stock: self.stock,
            image: self.image,
            notes: self
                .notes
                .map(|notes| Notes::from(notes).normalize())
                .unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        }
    }

    fn from_domain(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            image: product.image.clone(),
            notes: Some(StoredNotes::List(product.notes.clone())),
            description: Some(product.description.clone()),
            created_at: Some(product.created_at),
            updated_at: Some(product.updated_at),
        }
    }
}

//=========================================================================================
// `ProductStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProductStore for JsonFileAdapter {
    async fn list_all(&self) -> PortResult<Vec<Product>> {
        self.read_all().await
    }

    async fn get_by_id(&self, id: ProductId) -> PortResult<Product> {
        self.read_all()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, product: NewProduct) -> PortResult<Product> {
        let product = product.validated()?;

        let _guard = self.write_lock.lock().await;
        let mut products = self.read_all().await?;
        if products.iter().any(|p| p.name == product.name) {
            return Err(PortError::DuplicateName(product.name));
        }

        let stored = Product::from_new(next_id(&products)?, product, Utc::now());
        products.push(stored.clone());
        self.write_all(&products).await?;

        info!(product_id = stored.id, name = %stored.name, "Product created");
        Ok(stored)
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> PortResult<Product> {
        let _guard = self.write_lock.lock().await;
        let mut products = self.read_all().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;

        patch.apply_to(product, Utc::now())?;
        let updated = product.clone();
        self.write_all(&products).await?;

        info!(product_id = id, "Product updated");
        Ok(updated)
    }

    async fn delete(&self, id: ProductId) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut products = self.read_all().await?;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(not_found(id));
        }
        self.write_all(&products).await?;

        info!(product_id = id, "Product deleted");
        Ok(())
    }
}
