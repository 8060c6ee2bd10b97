//! Seller submissions: loose input mapped to a strict product description.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use kivu_core::{DomainError, DomainResult, FieldViolation, Money};

/// Locale used when a submission only carries localized text.
pub const DEFAULT_LOCALE: &str = "en";

/// Highest rating a product can carry.
pub const MAX_RATING: f64 = 5.0;

/// Product fields as submitted by a seller, before validation.
///
/// Numbers are kept wide and signed so that out-of-range input surfaces as a
/// field violation instead of a decoding failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub name_localized: BTreeMap<String, String>,
    pub description: String,
    pub description_localized: BTreeMap<String, String>,
    pub category: String,
    /// Main image; placed first in the image sequence.
    pub image: Option<String>,
    /// Gallery images.
    pub images: Vec<String>,
    pub regular_price: f64,
    pub per_item_price: f64,
    pub pool_price: f64,
    pub pool_size: i64,
    pub pool_current: Option<i64>,
    pub rating: Option<f64>,
}

/// Validated, normalized product description (everything but identity,
/// moderation state and the pool counter).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    pub name_localized: BTreeMap<String, String>,
    pub description: String,
    pub description_localized: BTreeMap<String, String>,
    pub category: String,
    pub images: Vec<String>,
    pub regular_price: Money,
    pub per_item_price: Money,
    pub pool_price: Money,
    pub pool_size: u32,
    pub rating: f64,
}

/// Output of [`ProductDraft::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub details: ProductDetails,
    pub pool_current: u32,
}

impl ProductDraft {
    /// Validate and normalize the draft, collecting every violation.
    pub fn validate(&self, default_locale: &str) -> DomainResult<ValidatedDraft> {
        let mut violations = Vec::new();

        let name_localized = non_blank_entries(&self.name_localized);
        let description_localized = non_blank_entries(&self.description_localized);

        let name = primary_text(&self.name, &name_localized, default_locale);
        if name.is_empty() {
            violations.push(FieldViolation::new(
                "name",
                format!("is required (or a '{default_locale}' entry in nameLocalized)"),
            ));
        }

        let description = primary_text(&self.description, &description_localized, default_locale);
        if description.is_empty() {
            violations.push(FieldViolation::new(
                "description",
                format!("is required (or a '{default_locale}' entry in descriptionLocalized)"),
            ));
        }

        let category = self.category.trim().to_string();
        if category.is_empty() {
            violations.push(FieldViolation::new("category", "is required"));
        }

        let images: Vec<String> = self
            .image
            .iter()
            .chain(self.images.iter())
            .map(|i| i.trim())
            .filter(|i| !i.is_empty())
            .map(str::to_string)
            .collect();
        if images.is_empty() {
            violations.push(FieldViolation::new("image", "at least one image is required"));
        }

        let regular_price = collect(&mut violations, Money::from_decimal("regularPrice", self.regular_price));
        let per_item_price =
            collect(&mut violations, Money::from_decimal("perItemPrice", self.per_item_price));
        let pool_price = collect(&mut violations, Money::from_decimal("poolPrice", self.pool_price));

        if let (Some(regular), Some(per_item)) = (regular_price, per_item_price) {
            if per_item > regular {
                violations.push(FieldViolation::new("perItemPrice", "must not exceed regularPrice"));
            }
        }
        if let (Some(per_item), Some(pool)) = (per_item_price, pool_price) {
            if pool > per_item {
                violations.push(FieldViolation::new("poolPrice", "must not exceed perItemPrice"));
            }
        }

        let pool_size = if self.pool_size < 1 {
            violations.push(FieldViolation::new("poolSize", "must be at least 1"));
            None
        } else {
            match u32::try_from(self.pool_size) {
                Ok(size) => Some(size),
                Err(_) => {
                    violations.push(FieldViolation::new("poolSize", "is too large"));
                    None
                }
            }
        };

        let pool_current = match self.pool_current {
            None => Some(0),
            Some(n) if n < 0 => {
                violations.push(FieldViolation::new("poolCurrent", "must not be negative"));
                None
            }
            Some(n) => match u32::try_from(n) {
                Ok(n) => Some(n),
                Err(_) => {
                    violations.push(FieldViolation::new("poolCurrent", "is too large"));
                    None
                }
            },
        };

        let rating = self.rating.unwrap_or(0.0);
        if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
            violations.push(FieldViolation::new("rating", "must be between 0 and 5"));
        }

        if !violations.is_empty() {
            return Err(DomainError::Validation(violations));
        }

        // Every Option above is Some once no violation was recorded.
        match (regular_price, per_item_price, pool_price, pool_size, pool_current) {
            (Some(regular_price), Some(per_item_price), Some(pool_price), Some(pool_size), Some(pool_current)) => {
                Ok(ValidatedDraft {
                    details: ProductDetails {
                        name,
                        name_localized,
                        description,
                        description_localized,
                        category,
                        images,
                        regular_price,
                        per_item_price,
                        pool_price,
                        pool_size,
                        rating,
                    },
                    pool_current,
                })
            }
            _ => Err(DomainError::validation("draft", "incomplete product draft")),
        }
    }
}

fn collect<T>(violations: &mut Vec<FieldViolation>, result: DomainResult<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            violations.extend(e.violations().iter().cloned());
            None
        }
    }
}

fn non_blank_entries(map: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.iter()
        .map(|(locale, text)| (locale.trim().to_string(), text.trim().to_string()))
        .filter(|(locale, text)| !locale.is_empty() && !text.is_empty())
        .collect()
}

fn primary_text(text: &str, localized: &BTreeMap<String, String>, default_locale: &str) -> String {
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    localized.get(default_locale).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Solar Lantern".to_string(),
            description: "Charges in four hours".to_string(),
            category: "Home".to_string(),
            image: Some("lantern.jpg".to_string()),
            regular_price: 120.0,
            per_item_price: 99.99,
            pool_price: 79.99,
            pool_size: 10,
            ..ProductDraft::default()
        }
    }

    fn fields(err: DomainError) -> Vec<String> {
        err.violations().iter().map(|v| v.field.clone()).collect()
    }

    #[test]
    fn valid_draft_is_normalized() {
        let mut d = draft();
        d.name = "  Solar Lantern ".to_string();
        d.images = vec!["side.jpg".to_string(), "  ".to_string()];
        d.name_localized.insert("rw".to_string(), "Itara".to_string());
        d.name_localized.insert("sw".to_string(), "   ".to_string());

        let v = d.validate(DEFAULT_LOCALE).unwrap();
        assert_eq!(v.details.name, "Solar Lantern");
        assert_eq!(v.details.images, vec!["lantern.jpg", "side.jpg"]);
        assert_eq!(v.details.name_localized.len(), 1);
        assert_eq!(v.details.regular_price, Money::from_cents(12000));
        assert_eq!(v.details.pool_price, Money::from_cents(7999));
        assert_eq!(v.pool_current, 0);
        assert_eq!(v.details.rating, 0.0);
    }

    #[test]
    fn default_locale_text_stands_in_for_missing_name() {
        let mut d = draft();
        d.name = String::new();
        d.name_localized.insert("en".to_string(), "Lantern".to_string());
        assert_eq!(d.validate("en").unwrap().details.name, "Lantern");

        let err = d.validate("rw").unwrap_err();
        assert_eq!(fields(err), vec!["name"]);
    }

    #[test]
    fn rejects_per_item_price_above_regular_price() {
        let mut d = draft();
        d.per_item_price = 130.0;
        d.pool_price = 100.0;
        assert_eq!(fields(d.validate(DEFAULT_LOCALE).unwrap_err()), vec!["perItemPrice"]);
    }

    #[test]
    fn rejects_pool_price_above_per_item_price() {
        let mut d = draft();
        d.pool_price = 100.0;
        assert_eq!(fields(d.validate(DEFAULT_LOCALE).unwrap_err()), vec!["poolPrice"]);
    }

    #[test]
    fn rejects_negative_prices() {
        let mut d = draft();
        d.pool_price = -1.0;
        assert_eq!(fields(d.validate(DEFAULT_LOCALE).unwrap_err()), vec!["poolPrice"]);
    }

    #[test]
    fn equal_prices_are_allowed() {
        let mut d = draft();
        d.regular_price = 50.0;
        d.per_item_price = 50.0;
        d.pool_price = 50.0;
        assert!(d.validate(DEFAULT_LOCALE).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let d = ProductDraft {
            pool_size: 0,
            pool_current: Some(-3),
            rating: Some(7.5),
            ..ProductDraft::default()
        };
        let got = fields(d.validate(DEFAULT_LOCALE).unwrap_err());
        assert_eq!(
            got,
            vec!["name", "description", "category", "image", "poolSize", "poolCurrent", "rating"]
        );
    }

    #[test]
    fn explicit_pool_current_is_kept() {
        let mut d = draft();
        d.pool_current = Some(4);
        assert_eq!(d.validate(DEFAULT_LOCALE).unwrap().pool_current, 4);
    }

    #[test]
    fn oversized_pool_size_is_reported() {
        let mut d = draft();
        d.pool_size = i64::from(u32::MAX) + 1;
        assert_eq!(fields(d.validate(DEFAULT_LOCALE).unwrap_err()), vec!["poolSize"]);
    }
}
