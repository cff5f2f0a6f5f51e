//! Product collection view.
//!
//! Holds the last fetched product list and a client-side filter over it.

use std::fmt;
use std::str::FromStr;

use tokio_util::sync::CancellationToken;

use crate::error::TransportResult;
use crate::services::ApiClient;
use crate::types::{Notice, Product, RiskLevel, Route};

/// Category filter, matched as a literal substring of the top issue descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Small,
    Large,
    Color,
    Shrink,
}

impl CategoryFilter {
    pub const ALL: [CategoryFilter; 5] = [
        CategoryFilter::All,
        CategoryFilter::Small,
        CategoryFilter::Large,
        CategoryFilter::Color,
        CategoryFilter::Shrink,
    ];

    /// Substring looked for in the descriptor; `None` matches everything.
    pub fn needle(&self) -> Option<&'static str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Small => Some("small"),
            CategoryFilter::Large => Some("large"),
            CategoryFilter::Color => Some("color"),
            CategoryFilter::Shrink => Some("shrink"),
        }
    }

    pub fn matches(&self, descriptor: &str) -> bool {
        self.needle().map_or(true, |needle| descriptor.contains(needle))
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.needle().unwrap_or("all"))
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryFilter::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}' (expected all, small, large, color or shrink)", s))
    }
}

/// Search term AND category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: String,
    pub category: CategoryFilter,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let term = self.search.to_lowercase();
        let matches_search = product.product_id.to_lowercase().contains(&term)
            || product.top_issue_descriptor.to_lowercase().contains(&term);

        matches_search && self.category.matches(&product.top_issue_descriptor)
    }
}

/// Counts over the whole snapshot, ignoring the filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub total: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
}

/// Why the filtered listing is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyListing {
    /// Nothing has been processed yet.
    NoProducts,
    /// Products exist but none pass the filter.
    NoMatches,
}

impl EmptyListing {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyListing::NoProducts => "No products have been processed yet.",
            EmptyListing::NoMatches => "No products match your current filters.",
        }
    }

    /// Suggested next step, if any.
    pub fn action(&self) -> Option<Route> {
        match self {
            EmptyListing::NoProducts => Some(Route::Upload),
            EmptyListing::NoMatches => None,
        }
    }
}

/// The collection view's state.
#[derive(Clone, Debug, Default)]
pub struct ProductCollection {
    products: Vec<Product>,
    filter: ProductFilter,
    loaded: bool,
}

impl ProductCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the full list and replace the snapshot.
    ///
    /// On failure the previous snapshot is kept.
    pub async fn load(&mut self, api: &ApiClient, cancel: &CancellationToken) -> TransportResult<usize> {
        log::info!("📋 Loading products...");
        match api.products(cancel).await {
            Ok(products) => {
                log::info!("✅ Loaded {} products", products.len());
                self.set_products(products);
                Ok(self.products.len())
            }
            Err(e) => {
                log::error!("❌ Failed to fetch products: {}", e);
                Err(e)
            }
        }
    }

    /// Re-issue the fetch; no merging with the old list.
    pub async fn refresh(&mut self, api: &ApiClient, cancel: &CancellationToken) -> TransportResult<usize> {
        self.load(api, cancel).await
    }

    pub fn set_products(&mut self, products: Vec<Product>) {
        self.products = products;
        self.loaded = true;
    }

    /// Whether at least one fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn filter(&self) -> &ProductFilter {
        &self.filter
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filter.search = term.into();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.filter.category = category;
    }

    /// Products passing the current filter, in backend order.
    pub fn visible(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| self.filter.matches(p)).collect()
    }

    /// `None` while at least one product is visible.
    pub fn empty_listing(&self) -> Option<EmptyListing> {
        if self.products.is_empty() {
            Some(EmptyListing::NoProducts)
        } else if self.visible().is_empty() {
            Some(EmptyListing::NoMatches)
        } else {
            None
        }
    }

    pub fn stats(&self) -> CollectionStats {
        self.products.iter().fold(
            CollectionStats { total: self.products.len(), ..Default::default() },
            |mut stats, product| {
                match product.risk_level() {
                    RiskLevel::High => stats.high_risk += 1,
                    RiskLevel::Medium => stats.medium_risk += 1,
                    RiskLevel::Low => stats.low_risk += 1,
                }
                stats
            },
        )
    }
}

pub fn load_failed_notice() -> Notice {
    Notice::error("Failed to load products. Please try again.")
}
