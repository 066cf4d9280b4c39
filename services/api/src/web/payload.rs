//! services/api/src/web/payload.rs
//!
//! Wire types for the product endpoints and their conversion into the core
//! domain types.
//!
//! Clients are admin forms: numbers may arrive as strings and the notes as one
//! delimited string, so request bodies are accepted loosely here and coerced
//! before reaching the store.

use chrono::{DateTime, Utc};
use perfumery_core::domain::{NewProduct, Notes, Product, ProductId, ProductPatch};
use perfumery_core::ports::{PortError, PortResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Responses
//=========================================================================================

/// A product as served to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub stock: u32,
    pub image: String,
    pub notes: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            stock: p.stock,
            image: p.image,
            notes: p.notes,
            description: p.description,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

//=========================================================================================
// Requests
//=========================================================================================

/// Notes as either `"rose, wood"` or `["rose", "wood"]`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum NotesPayload {
    Text(String),
    List(Vec<String>),
}

impl From<NotesPayload> for Notes {
    fn from(payload: NotesPayload) -> Self {
        match payload {
            NotesPayload::Text(raw) => Notes::Delimited(raw),
            NotesPayload::List(items) => Notes::List(items),
        }
    }
}

/// Body of `POST /admin/products`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    #[schema(value_type = f64)]
    pub price: Option<Value>,
    #[schema(value_type = Option<u32>)]
    pub stock: Option<Value>,
    pub image: Option<String>,
    pub notes: Option<NotesPayload>,
    pub description: Option<String>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> PortResult<NewProduct> {
        let price = self
            .price
            .as_ref()
            .map(|v| number("price", v))
            .transpose()?
            .ok_or_else(|| PortError::Validation("`price` is required".to_string()))?;
        let stock = self.stock.as_ref().map(stock_count).transpose()?.unwrap_or(0);

        Ok(NewProduct {
            name: self.name.unwrap_or_default(),
            price,
            stock,
            image: self.image.unwrap_or_default(),
            notes: self
                .notes
                .map(|n| Notes::from(n).normalize())
                .unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        })
    }
}

/// Body of `PUT /admin/products/{id}`. Only `price` and `stock` may differ from
/// the stored record; the other fields are accepted when echoed back unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    #[schema(value_type = Option<f64>)]
    pub price: Option<Value>,
    #[schema(value_type = Option<u32>)]
    pub stock: Option<Value>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub notes: Option<NotesPayload>,
    pub description: Option<String>,
}

impl UpdateProductRequest {
    pub fn into_patch(self) -> PortResult<ProductPatch> {
        Ok(ProductPatch {
            price: self.price.as_ref().map(|v| number("price", v)).transpose()?,
            stock: self.stock.as_ref().map(stock_count).transpose()?,
            name: self.name,
            image: self.image,
            notes: self.notes.map(|n| Notes::from(n).normalize()),
            description: self.description,
        })
    }
}

/// Query string of `GET /products`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Case-insensitive filter on the product name and notes.
    pub q: Option<String>,
}

//=========================================================================================
// Coercion
//=========================================================================================

fn number(field: &str, value: &Value) -> PortResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| PortError::Validation(format!("`{field}` must be a number")))
}

fn stock_count(value: &Value) -> PortResult<u32> {
    let n = number("stock", value)?;
    if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
        return Err(PortError::Validation(
            "`stock` must be a non-negative integer".to_string(),
        ));
    }
    Ok(n as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: Value) -> PortResult<NewProduct> {
        serde_json::from_value::<CreateProductRequest>(body)
            .unwrap()
            .into_new_product()
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let product = create(json!({
            "name": "Aqua", "price": "29.99", "stock": "10",
            "image": "https://cdn.example.com/aqua.png",
            "notes": "citrus, marine", "description": "fresh"
        }))
        .unwrap();
        assert_eq!(product.price, 29.99);
        assert_eq!(product.stock, 10);
        assert_eq!(product.notes, vec!["citrus", "marine"]);
    }

    #[test]
    fn notes_may_arrive_as_a_list() {
        let product = create(json!({
            "name": "Aqua", "price": 10, "image": "i", "description": "d",
            "notes": ["citrus", "marine"]
        }))
        .unwrap();
        assert_eq!(product.notes, vec!["citrus", "marine"]);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn missing_or_non_numeric_price_is_rejected() {
        assert!(matches!(
            create(json!({ "name": "Aqua" })),
            Err(PortError::Validation(_))
        ));
        assert!(matches!(
            create(json!({ "name": "Aqua", "price": "cheap" })),
            Err(PortError::Validation(_))
        ));
        assert!(matches!(
            create(json!({ "name": "Aqua", "price": true })),
            Err(PortError::Validation(_))
        ));
    }

    #[test]
    fn fractional_or_negative_stock_is_rejected() {
        assert!(matches!(
            stock_count(&json!(1.5)),
            Err(PortError::Validation(_))
        ));
        assert!(matches!(stock_count(&json!(-1)), Err(PortError::Validation(_))));
        assert_eq!(stock_count(&json!(4.0)).unwrap(), 4);
    }

    #[test]
    fn update_payload_keeps_fixed_fields_for_the_store_to_check() {
        let patch = serde_json::from_value::<UpdateProductRequest>(json!({
            "price": 24.99, "name": "Aqua", "notes": "citrus marine"
        }))
        .unwrap()
        .into_patch()
        .unwrap();
        assert_eq!(patch.price, Some(24.99));
        assert_eq!(patch.stock, None);
        assert_eq!(patch.name.as_deref(), Some("Aqua"));
        assert_eq!(
            patch.notes,
            Some(vec!["citrus".to_string(), "marine".to_string()])
        );
    }
}
