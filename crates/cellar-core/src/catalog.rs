//! # Catalog Filter
//!
//! Decides which catalog query the explore screen runs for the current
//! search box and price inputs.
//!
//! ## Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  min + max both present, both numbers, min <= max?                      │
//! │       │ yes ──────────────► PriceRange { min, max }  (keyword ignored)  │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  keyword non-blank?                                                     │
//! │       │ yes ──────────────► Keyword(trimmed keyword)                    │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  All                                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two filters are alternatives, not a conjunction: an active price
//! range suppresses the keyword.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Current state of the explore screen's filter inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilter {
    pub keyword: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// The single query a [`CatalogFilter`] resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogQuery {
    /// Every product.
    All,
    /// Name / category substring search.
    Keyword(String),
    /// Inclusive price range.
    PriceRange { min: f64, max: f64 },
}

impl CatalogFilter {
    pub fn new() -> Self {
        CatalogFilter::default()
    }

    /// Builds a filter from raw text inputs. Price boxes that are blank or
    /// do not parse as numbers count as absent.
    ///
    /// ## Example
    /// ```rust
    /// use cellar_core::catalog::{CatalogFilter, CatalogQuery};
    ///
    /// let filter = CatalogFilter::from_inputs("margaux", "100", "");
    /// assert_eq!(filter.resolve(), CatalogQuery::Keyword("margaux".to_string()));
    /// ```
    pub fn from_inputs(keyword: &str, min_price: &str, max_price: &str) -> Self {
        CatalogFilter {
            keyword: keyword.to_string(),
            min_price: parse_price(min_price),
            max_price: parse_price(max_price),
        }
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    pub fn price_range(mut self, min: f64, max: f64) -> Self {
        self.min_price = Some(min);
        self.max_price = Some(max);
        self
    }

    /// Resolves the inputs to one query, price range first.
    pub fn resolve(&self) -> CatalogQuery {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if !min.is_nan() && !max.is_nan() && min <= max {
                return CatalogQuery::PriceRange { min, max };
            }
        }

        let keyword = self.keyword.trim();
        if !keyword.is_empty() {
            return CatalogQuery::Keyword(keyword.to_string());
        }

        CatalogQuery::All
    }
}

fn parse_price(input: &str) -> Option<f64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    input.parse::<f64>().ok().filter(|value| !value.is_nan())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_resolves_to_all() {
        assert_eq!(CatalogFilter::new().resolve(), CatalogQuery::All);
        assert_eq!(CatalogFilter::new().keyword("   ").resolve(), CatalogQuery::All);
    }

    #[test]
    fn test_keyword_is_trimmed() {
        let query = CatalogFilter::new().keyword("  cloudy ").resolve();
        assert_eq!(query, CatalogQuery::Keyword("cloudy".to_string()));
    }

    #[test]
    fn test_price_range_takes_precedence_over_keyword() {
        let query = CatalogFilter::new()
            .keyword("margaux")
            .price_range(15.0, 25.0)
            .resolve();
        assert_eq!(query, CatalogQuery::PriceRange { min: 15.0, max: 25.0 });
    }

    #[test]
    fn test_inverted_range_falls_back_to_keyword() {
        let query = CatalogFilter::new()
            .keyword("margaux")
            .price_range(25.0, 15.0)
            .resolve();
        assert_eq!(query, CatalogQuery::Keyword("margaux".to_string()));
    }

    #[test]
    fn test_half_range_is_ignored() {
        let filter = CatalogFilter::from_inputs("", "100", "");
        assert_eq!(filter.min_price, Some(100.0));
        assert_eq!(filter.resolve(), CatalogQuery::All);
    }

    #[test]
    fn test_from_inputs_ignores_garbage() {
        let filter = CatalogFilter::from_inputs("grange", "abc", "500");
        assert_eq!(filter.min_price, None);
        assert_eq!(filter.resolve(), CatalogQuery::Keyword("grange".to_string()));

        let filter = CatalogFilter::from_inputs("", " 10 ", "30");
        assert_eq!(filter.resolve(), CatalogQuery::PriceRange { min: 10.0, max: 30.0 });
    }
}
