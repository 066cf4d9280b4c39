//! crates/perfumery_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the storefront's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete persistence strategy (flat file or database).

use async_trait::async_trait;

use crate::domain::{NewProduct, Product, ProductId, ProductPatch};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the backing store (file system, database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("A product named '{0}' already exists")]
    DuplicateName(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Returns every stored product, in the store's natural order.
    async fn list_all(&self) -> PortResult<Vec<Product>>;

    async fn get_by_id(&self, id: ProductId) -> PortResult<Product>;

    /// Validates the fields, assigns the id and timestamps, and persists the record.
    async fn create(&self, product: NewProduct) -> PortResult<Product>;

    /// Applies a patch to an existing record. Only `price` and `stock` may change.
    async fn update(&self, id: ProductId, patch: ProductPatch) -> PortResult<Product>;

    /// Hard-deletes a record. Deleting an unknown id is `NotFound`, never a no-op.
    async fn delete(&self, id: ProductId) -> PortResult<()>;
}
