//! Product grid filtering.

use serde::Deserialize;

use crate::backend::Product;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "todas";

/// Filters taken from the product page query string.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    /// Category id as a string, or [`ALL_CATEGORIES`].
    pub categoria: String,
    /// Free-text search over name and description.
    pub q: String,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            categoria: ALL_CATEGORIES.to_string(),
            q: String::new(),
        }
    }
}

impl CatalogFilter {
    /// Whether neither a category nor a search term is set.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        let category = self.categoria.trim();
        (category.is_empty() || category == ALL_CATEGORIES) && self.q.trim().is_empty()
    }

    /// Whether `product` passes both the category and the search filter.
    ///
    /// The search is a case-insensitive substring match on name or
    /// description; a blank term matches everything.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let category = self.categoria.trim();
        let category_ok = category.is_empty()
            || category == ALL_CATEGORIES
            || product.category_key().as_deref() == Some(category);

        let term = self.q.trim().to_lowercase();
        let contains = |field: Option<&String>| {
            field.is_some_and(|value| value.to_lowercase().contains(&term))
        };
        let term_ok = term.is_empty()
            || contains(product.name.as_ref())
            || contains(product.description.as_ref());

        category_ok && term_ok
    }

    /// Keep the products that match, in their original order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<Product> {
        serde_json::from_value(serde_json::json!([
            {"id": 1, "name": "Mesa de Roble", "description": "Comedor", "category": {"id": 1, "nombre": "Muebles"}},
            {"id": 2, "name": "Vela", "description": "Aroma a ROBLE", "category": {"id": 2, "nombre": "Deco"}},
            {"id": 3, "name": null, "description": null}
        ]))
        .unwrap()
    }

    fn ids(products: &[&Product]) -> Vec<i64> {
        products.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let products = catalogue();
        assert_eq!(ids(&CatalogFilter::default().apply(&products)), vec![1, 2, 3]);
    }

    #[test]
    fn test_is_unfiltered() {
        assert!(CatalogFilter::default().is_unfiltered());
        let blank = CatalogFilter {
            categoria: String::new(),
            q: "  ".to_string(),
        };
        assert!(blank.is_unfiltered());
        let searching = CatalogFilter {
            q: "mesa".to_string(),
            ..CatalogFilter::default()
        };
        assert!(!searching.is_unfiltered());
    }

    #[test]
    fn test_category_filter_compares_ids_as_strings() {
        let products = catalogue();
        let filter = CatalogFilter {
            categoria: "2".to_string(),
            q: String::new(),
        };
        assert_eq!(ids(&filter.apply(&products)), vec![2]);
    }

    #[test]
    fn test_search_matches_name_or_description_case_insensitively() {
        let products = catalogue();
        let filter = CatalogFilter {
            q: "roble".to_string(),
            ..CatalogFilter::default()
        };
        assert_eq!(ids(&filter.apply(&products)), vec![1, 2]);
    }

    #[test]
    fn test_filters_combine() {
        let products = catalogue();
        let filter = CatalogFilter {
            categoria: "1".to_string(),
            q: "aroma".to_string(),
        };
        assert!(filter.apply(&products).is_empty());
    }
}
