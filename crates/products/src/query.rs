//! Catalog query helpers over product snapshots.

use std::collections::BTreeSet;

use kivu_core::{Money, UserId};

use crate::Product;

/// Optional catalog filters. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Case-insensitive substring match on the name and every localized name.
    pub text_query: Option<String>,
    /// Inclusive lower bound on the pool price.
    pub min_price: Option<Money>,
    /// Inclusive upper bound on the pool price.
    pub max_price: Option<Money>,
    pub seller_id: Option<UserId>,
}

impl ProductFilter {
    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn by_text(query: impl Into<String>) -> Self {
        Self {
            text_query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Whether `product` passes every set criterion.
    ///
    /// Moderation state is not considered here.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = non_blank(self.category.as_deref()) {
            if product.category() != category {
                return false;
            }
        }

        if let Some(query) = non_blank(self.text_query.as_deref()) {
            let needle = query.to_lowercase();
            let hit = std::iter::once(product.name())
                .chain(product.name_localized().values().map(String::as_str))
                .any(|text| text.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if self.min_price.is_some_and(|min| product.pool_price() < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.pool_price() > max) {
            return false;
        }

        if self
            .seller_id
            .is_some_and(|seller| product.seller_id() != Some(seller))
        {
            return false;
        }

        true
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Distinct categories across approved products.
pub fn derived_categories<'a>(products: impl IntoIterator<Item = &'a Product>) -> BTreeSet<String> {
    products
        .into_iter()
        .filter(|p| p.is_approved())
        .map(|p| p.category().to_string())
        .collect()
}

/// Reorder an insertion-ordered list newest first by `created_at`.
///
/// Products created at the same instant keep reverse insertion order.
pub fn newest_first(mut products: Vec<Product>) -> Vec<Product> {
    products.reverse();
    // Stable sort: equal timestamps stay in the reversed order.
    products.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    products
}
