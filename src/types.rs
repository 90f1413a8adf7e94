//! Domain types for shopping-mission.
//!
//! Plain data: products, cart entries, budget tiers, image probe results
//! and the configuration structs. No I/O lives here.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// CATALOG
// ============================================================================

/// One row of the product catalog.
///
/// Immutable for the whole session once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Price in won. Non-negative by construction.
    pub price: u64,
    pub image_url: String,
}

/// A product copied into the cart at the moment it was added.
///
/// Adding the same product twice yields two equal entries; nothing is merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    pub price: u64,
    #[serde(default)]
    pub image_url: String,
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        CartItem {
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
        }
    }
}

// ============================================================================
// BUDGET
// ============================================================================

/// The three mission tiers offered on the start screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetTier {
    Basic,
    Intermediate,
    Advanced,
}

impl BudgetTier {
    /// All tiers in display order.
    pub const ALL: [BudgetTier; 3] = [
        BudgetTier::Basic,
        BudgetTier::Intermediate,
        BudgetTier::Advanced,
    ];

    /// Budget in won granted by this tier.
    pub fn amount(self) -> u64 {
        match self {
            BudgetTier::Basic => 10_000,
            BudgetTier::Intermediate => 20_000,
            BudgetTier::Advanced => 30_000,
        }
    }

    /// Radio-button label shown on the start screen.
    pub fn label(self) -> &'static str {
        match self {
            BudgetTier::Basic => "기본 미션 (예산 10,000원)",
            BudgetTier::Intermediate => "중급 미션 (예산 20,000원)",
            BudgetTier::Advanced => "고급 미션 (예산 30,000원)",
        }
    }

    /// Tier at a zero-based position in [`BudgetTier::ALL`].
    pub fn from_index(index: usize) -> Option<BudgetTier> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// PRODUCT IMAGES
// ============================================================================

/// Dimensions of a product image that decoded successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Why a product image could not be shown.
///
/// Never fatal: the shop screen substitutes a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("image not found: {0}")]
    Missing(PathBuf),
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("cannot fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

/// Outcome of probing one product image.
pub type ProductImage = Result<ImageInfo, LoadError>;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Output format for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable pretty output.
    #[default]
    Human,
    /// Machine-readable JSON.
    Json,
}

/// Configuration for an interactive mission session.
#[derive(Debug, Clone)]
pub struct MissionConfig {
    /// CSV file with `name,price,image_url` columns.
    pub catalog_path: PathBuf,
    /// Explicit font for the result image. None = discover one.
    pub font_path: Option<PathBuf>,
    /// Where tracing output goes while the TUI owns the terminal.
    pub log_file: Option<PathBuf>,
}

/// Default catalog file name, looked up in the working directory.
pub const DEFAULT_CATALOG: &str = "products.csv";

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG),
            font_path: None,
            log_file: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
