//! # Catalog Filter
//!
//! Case-insensitive search over the products of a snapshot. The filtered
//! list is what "select all" means: `toggle_all` is fed [`visible_skus`].

use serde::{Deserialize, Serialize};

use crate::types::Product;

/// Which field a search query is matched against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "field", content = "key", rename_all = "camelCase")]
pub enum SearchField {
    /// Name, SKU or any attribute value.
    #[default]
    All,
    Name,
    Sku,
    /// A named type-specific attribute, e.g. `author` or `hardness`.
    Attribute(String),
}

impl SearchField {
    fn matches(&self, product: &Product, needle: &str) -> bool {
        let hit = |value: &str| value.to_lowercase().contains(needle);
        match self {
            SearchField::All => {
                hit(&product.name)
                    || hit(&product.sku)
                    || product.details.values().iter().any(|v| hit(v))
            }
            SearchField::Name => hit(&product.name),
            SearchField::Sku => hit(&product.sku),
            SearchField::Attribute(key) => product
                .details
                .attribute(key)
                .map(|v| hit(&v))
                .unwrap_or(false),
        }
    }
}

/// Products whose `field` contains `query`. A blank query keeps everything.
pub fn filter_products<'a, I>(products: I, query: &str, field: &SearchField) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    let needle = query.trim().to_lowercase();
    products
        .into_iter()
        .filter(|p| needle.is_empty() || field.matches(p, &needle))
        .collect()
}

/// SKUs of the products that pass the filter, in input order.
pub fn visible_skus<'a, I>(products: I, query: &str, field: &SearchField) -> Vec<String>
where
    I: IntoIterator<Item = &'a Product>,
{
    filter_products(products, query, field)
        .into_iter()
        .map(|p| p.sku.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::ProductDetails;

    fn catalog() -> Vec<Product> {
        let mut book = Product::generic("BK-1984", "Nineteen Eighty-Four", Money::from_cents(1299));
        book.details = ProductDetails::Book {
            author: Some("George Orwell".to_string()),
            isbn: None,
            publisher: None,
            genre: Some("Dystopia".to_string()),
            publication_date: None,
            description: None,
        };

        let mut pencil = Product::generic("PN-HB", "Drawing Pencil", Money::from_cents(120));
        pencil.details = ProductDetails::Stationery {
            brand: Some("Faber".to_string()),
            hardness: Some("HB".to_string()),
            material: None,
            eraser_included: Some(false),
        };

        vec![book, pencil, Product::generic("GEN-BAG", "Tote Bag", Money::from_cents(900))]
    }

    #[test]
    fn test_blank_query_keeps_everything() {
        let products = catalog();
        assert_eq!(filter_products(&products, "  ", &SearchField::All).len(), 3);
    }

    #[test]
    fn test_search_all_fields_case_insensitive() {
        let products = catalog();
        assert_eq!(visible_skus(&products, "orwell", &SearchField::All), vec!["BK-1984"]);
        assert_eq!(visible_skus(&products, "pn-", &SearchField::All), vec!["PN-HB"]);
    }

    #[test]
    fn test_search_specific_field() {
        let products = catalog();
        assert!(visible_skus(&products, "orwell", &SearchField::Name).is_empty());
        assert_eq!(visible_skus(&products, "bag", &SearchField::Name), vec!["GEN-BAG"]);
        assert_eq!(
            visible_skus(&products, "hb", &SearchField::Attribute("hardness".to_string())),
            vec!["PN-HB"]
        );
        assert!(
            visible_skus(&products, "hb", &SearchField::Attribute("author".to_string())).is_empty()
        );
    }
}
