//! crates/perfumery_core/src/domain.rs
//!
//! Defines the pure, core data structures for the storefront.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

use crate::ports::{PortError, PortResult};

pub type ProductId = i64;

/// A perfume as it is stored and served by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
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

impl Product {
    /// Builds a stored record from validated fields plus store-assigned metadata.
    pub fn from_new(id: ProductId, new: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            price: new.price,
            stock: new.stock,
            image: new.image,
            notes: new.notes,
            description: new.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive catalog filter on the name and the olfactory notes.
    /// A blank term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term)
            || self.notes.iter().any(|n| n.to_lowercase().contains(&term))
    }
}

/// Olfactory notes as submitted by a client.
#[derive(Debug, Clone, PartialEq)]
pub enum Notes {
    /// A single string such as `"rose, wood citrus"`.
    Delimited(String),
    /// An already structured sequence.
    List(Vec<String>),
}

impl Notes {
    /// Normalizes the input to the stored form. Applying it to its own output is a no-op.
    pub fn normalize(self) -> Vec<String> {
        match self {
            Notes::Delimited(raw) => raw
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
            Notes::List(items) => items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        }
    }
}

/// The caller-supplied fields of a product about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub stock: u32,
    pub image: String,
    pub notes: Vec<String>,
    pub description: String,
}

impl NewProduct {
    /// Trims the text fields and checks the required ones and the price invariant.
    pub fn validated(self) -> PortResult<Self> {
        check_price(self.price)?;
        Ok(Self {
            name: required("name", &self.name)?,
            price: self.price,
            stock: self.stock,
            image: required("image", &self.image)?,
            notes: Notes::List(self.notes).normalize(),
            description: required("description", &self.description)?,
        })
    }
}

/// A partial update. Only `price` and `stock` are mutable after creation; the
/// fixed fields may be echoed back (the admin form resends them) but not changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub notes: Option<Vec<String>>,
    pub description: Option<String>,
}

impl ProductPatch {
    /// Applies the patch in place. On error the product is left untouched.
    pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) -> PortResult<()> {
        if self.price.is_none() && self.stock.is_none() {
            return Err(PortError::Validation(
                "an update must set `price` and/or `stock`".to_string(),
            ));
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }

        unchanged("name", self.name.as_deref().map(str::trim), &product.name)?;
        unchanged("image", self.image.as_deref().map(str::trim), &product.image)?;
        unchanged(
            "description",
            self.description.as_deref().map(str::trim),
            &product.description,
        )?;
        // The admin form rejoins and resplits the notes, so "black pepper" comes
        // back as two tokens. Compare at token level.
        if let Some(notes) = &self.notes {
            if note_tokens(notes) != note_tokens(&product.notes) {
                return Err(fixed_field("notes"));
            }
        }

        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        product.updated_at = now;
        Ok(())
    }
}

fn required(field: &str, value: &str) -> PortResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortError::Validation(format!("`{field}` is required")));
    }
    Ok(trimmed.to_string())
}

fn check_price(price: f64) -> PortResult<()> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(PortError::Validation(
            "`price` must be a non-negative number".to_string(),
        ))
    }
}

fn unchanged(field: &str, submitted: Option<&str>, stored: &str) -> PortResult<()> {
    match submitted {
        Some(value) if value != stored => Err(fixed_field(field)),
        _ => Ok(()),
    }
}

fn note_tokens(notes: &[String]) -> Vec<String> {
    Notes::Delimited(notes.join(" ")).normalize()
}

fn fixed_field(field: &str) -> PortError {
    PortError::Validation(format!("`{field}` cannot be changed after creation"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aqua() -> NewProduct {
        NewProduct {
            name: "  Aqua ".to_string(),
            price: 29.99,
            stock: 10,
            image: "https://cdn.example.com/aqua.png".to_string(),
            notes: vec!["citrus".to_string(), "marine".to_string()],
            description: "fresh".to_string(),
        }
    }

    fn stored() -> Product {
        let now = Utc::now();
        Product::from_new(7, aqua().validated().unwrap(), now)
    }

    #[test]
    fn delimited_notes_split_on_commas_and_whitespace() {
        let notes = Notes::Delimited("rose, wood,  citrus,,".to_string()).normalize();
        assert_eq!(notes, vec!["rose", "wood", "citrus"]);
    }

    #[test]
    fn normalizing_a_list_is_idempotent() {
        let once = Notes::Delimited("rose, wood, citrus".to_string()).normalize();
        let twice = Notes::List(once.clone()).normalize();
        assert_eq!(once, twice);
    }

    #[test]
    fn list_items_are_trimmed_but_not_split() {
        let notes = Notes::List(vec![" black pepper ".to_string(), "".to_string()]).normalize();
        assert_eq!(notes, vec!["black pepper"]);
    }

    #[test]
    fn validated_trims_required_fields() {
        let product = aqua().validated().unwrap();
        assert_eq!(product.name, "Aqua");
    }

    #[test]
    fn validated_rejects_blank_name_and_negative_price() {
        let blank = NewProduct {
            name: "   ".to_string(),
            ..aqua()
        };
        assert!(matches!(blank.validated(), Err(PortError::Validation(_))));

        let negative = NewProduct {
            price: -1.0,
            ..aqua()
        };
        assert!(matches!(negative.validated(), Err(PortError::Validation(_))));

        let nan = NewProduct {
            price: f64::NAN,
            ..aqua()
        };
        assert!(matches!(nan.validated(), Err(PortError::Validation(_))));
    }

    #[test]
    fn validated_requires_image_and_description() {
        let no_image = NewProduct {
            image: String::new(),
            ..aqua()
        };
        assert!(matches!(no_image.validated(), Err(PortError::Validation(_))));

        let no_description = NewProduct {
            description: " ".to_string(),
            ..aqua()
        };
        assert!(matches!(
            no_description.validated(),
            Err(PortError::Validation(_))
        ));
    }

    #[test]
    fn patch_updates_price_and_keeps_other_fields() {
        let mut product = stored();
        let before = product.clone();
        let later = before.updated_at + chrono::Duration::seconds(5);

        let patch = ProductPatch {
            price: Some(24.99),
            ..Default::default()
        };
        patch.apply_to(&mut product, later).unwrap();

        assert_eq!(product.price, 24.99);
        assert_eq!(product.updated_at, later);
        assert_eq!(
            Product {
                price: before.price,
                updated_at: before.updated_at,
                ..product
            },
            before
        );
    }

    #[test]
    fn patch_accepts_echoed_fixed_fields() {
        let mut product = stored();
        let patch = ProductPatch {
            stock: Some(3),
            name: Some("Aqua".to_string()),
            notes: Some(vec!["citrus".to_string(), "marine".to_string()]),
            description: Some("fresh".to_string()),
            ..Default::default()
        };
        patch.apply_to(&mut product, Utc::now()).unwrap();
        assert_eq!(product.stock, 3);
    }

    #[test]
    fn patch_accepts_multi_word_notes_resplit_by_the_form() {
        let mut product = Product {
            notes: vec!["black pepper".to_string(), "rose".to_string()],
            ..stored()
        };
        let resplit = Notes::Delimited(product.notes.join(", ")).normalize();
        assert_eq!(resplit, vec!["black", "pepper", "rose"]);

        let patch = ProductPatch {
            price: Some(45.0),
            notes: Some(resplit),
            ..Default::default()
        };
        patch.apply_to(&mut product, Utc::now()).unwrap();
        assert_eq!(product.price, 45.0);
        assert_eq!(product.notes, vec!["black pepper", "rose"]);
    }

    #[test]
    fn patch_rejects_different_notes() {
        let mut product = stored();
        let patch = ProductPatch {
            stock: Some(1),
            notes: Some(vec!["citrus".to_string(), "vanilla".to_string()]),
            ..Default::default()
        };
        let err = patch.apply_to(&mut product, Utc::now()).unwrap_err();
        assert!(matches!(err, PortError::Validation(msg) if msg.contains("notes")));
    }

    #[test]
    fn patch_rejects_changed_fixed_field_without_mutating() {
        let mut product = stored();
        let before = product.clone();
        let patch = ProductPatch {
            price: Some(1.0),
            name: Some("Terra".to_string()),
            ..Default::default()
        };
        let err = patch.apply_to(&mut product, Utc::now()).unwrap_err();
        assert!(matches!(err, PortError::Validation(msg) if msg.contains("name")));
        assert_eq!(product, before);
    }

    #[test]
    fn patch_without_mutable_fields_is_rejected() {
        let mut product = stored();
        let patch = ProductPatch {
            name: Some("Aqua".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            patch.apply_to(&mut product, Utc::now()),
            Err(PortError::Validation(_))
        ));
    }

    #[test]
    fn matches_name_or_notes_case_insensitively() {
        let product = stored();
        assert!(product.matches("aq"));
        assert!(product.matches("MARINE"));
        assert!(product.matches("  "));
        assert!(!product.matches("vanilla"));
    }
}
