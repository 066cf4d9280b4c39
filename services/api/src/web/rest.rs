//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the product endpoints and the master
//! definition for the OpenAPI specification.

use crate::{
    error::{ApiError, ErrorResponse},
    web::{
        auth::{Claims, LoginRequest, LoginResponse},
        payload::{
            CatalogQuery, CreateProductRequest, NotesPayload, ProductResponse,
            UpdateProductRequest,
        },
        state::AppState,
    },
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    Extension,
};
use perfumery_core::{domain::ProductId, ports::PortError};
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

/// Registers the bearer scheme used by the admin routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::login_handler,
        list_products_handler,
        get_product_handler,
        create_product_handler,
        update_product_handler,
        delete_product_handler,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            ProductResponse,
            CreateProductRequest,
            UpdateProductRequest,
            NotesPayload,
            ErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "catalog", description = "Public product catalog."),
        (name = "admin", description = "Product management, admin bearer token required."),
        (name = "auth", description = "Admin login.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Helpers
//=========================================================================================

fn parse_id(raw: &str) -> Result<ProductId, ApiError> {
    raw.trim()
        .parse::<ProductId>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid product id '{}'", raw)))
}

fn path_id(path: Result<Path<String>, PathRejection>) -> Result<ProductId, ApiError> {
    let Path(raw) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    parse_id(&raw)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

//=========================================================================================
// Public Catalog Handlers
//=========================================================================================

/// List the catalog, optionally filtered by name or note.
///
/// If the store cannot be read the catalog is served as empty.
#[utoipa::path(
    get,
    path = "/products",
    params(CatalogQuery),
    responses(
        (status = 200, description = "All matching products", body = [ProductResponse])
    ),
    tag = "catalog"
)]
pub async fn list_products_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let products = match state.store.list_all().await {
        Ok(products) => products,
        Err(PortError::StorageUnavailable(detail)) => {
            warn!("Catalog unavailable, serving it empty: {}", detail);
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    let term = query.q.unwrap_or_default();
    let products = products
        .into_iter()
        .filter(|p| p.matches(&term))
        .map(ProductResponse::from)
        .collect();
    Ok(Json(products))
}

/// Fetch a single product.
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ProductResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No product with this id", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_product_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = path_id(path)?;
    let product = state.store.get_by_id(id).await?;
    Ok(Json(product.into()))
}

//=========================================================================================
// Admin Handlers
//=========================================================================================

/// Create a product. The store assigns the id and timestamps.
#[utoipa::path(
    post,
    path = "/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation failure or duplicate name", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Token lacks the admin role", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let new_product = body(payload)?.into_new_product()?;
    debug!(admin_id = claims.id, name = %new_product.name, "Creating product");

    let product = state.store.create(new_product).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Update the price and/or stock of a product.
#[utoipa::path(
    put,
    path = "/admin/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Malformed id or payload, or a fixed field was changed", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Token lacks the admin role", body = ErrorResponse),
        (status = 404, description = "No product with this id", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = path_id(path)?;
    let patch = body(payload)?.into_patch()?;
    debug!(admin_id = claims.id, product_id = id, "Updating product");

    let product = state.store.update(id, patch).await?;
    Ok(Json(product.into()))
}

/// Delete a product permanently.
#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Token lacks the admin role", body = ErrorResponse),
        (status = 404, description = "No product with this id", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(path)?;
    debug!(admin_id = claims.id, product_id = id, "Deleting product");

    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(matches!(parse_id("abc"), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_id("1.5"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/products",
            "/products/{id}",
            "/admin/products",
            "/admin/products/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
