//! Text formatting for prices, cart lines and catalog listings.
//!
//! Pure functions: data in, String out. No I/O.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::types::{CartItem, OutputFormat, ProductImage};

/// Placeholder shown where a product image could not be loaded.
pub const IMAGE_PLACEHOLDER: &str = "(이미지 로드 불가)";

/// Format an amount with comma thousands separators: `30000` → `"30,000"`.
pub fn format_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format an amount in won: `3500` → `"3,500원"`.
pub fn format_won(amount: u64) -> String {
    format!("{}원", format_thousands(amount))
}

/// One cart line as it appears on screen and in the result image.
pub fn cart_line(item: &CartItem) -> String {
    format!("- {} / {}", item.name, format_won(item.price))
}

/// Short status for a probed image.
pub fn image_status(image: &ProductImage) -> String {
    match image {
        Ok(info) => format!("[{}x{}]", info.width, info.height),
        Err(_) => IMAGE_PLACEHOLDER.to_string(),
    }
}

/// Format the catalog for the `catalog` command.
///
/// `images`, when given, must be parallel to `catalog.products`.
pub fn format_catalog(
    catalog: &Catalog,
    images: Option<&[ProductImage]>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Human => format_human(catalog, images),
        OutputFormat::Json => format_json(catalog, images),
    }
}

// ============================================================================
// HUMAN FORMAT
// ============================================================================

fn format_human(catalog: &Catalog, images: Option<&[ProductImage]>) -> String {
    let mut out = String::new();

    out.push_str("=== Catalog ===\n");
    for (i, product) in catalog.products.iter().enumerate() {
        out.push_str(&format!("{:>3}. {} / {}", i + 1, product.name, format_won(product.price)));
        if let Some(image) = images.and_then(|imgs| imgs.get(i)) {
            out.push_str(&format!("  {}", image_status(image)));
        }
        out.push('\n');
    }
    out.push('\n');

    out.push_str(&format!("Products: {}\n", catalog.len()));
    if let Some(images) = images {
        let broken = images.iter().filter(|r| r.is_err()).count();
        if broken > 0 {
            out.push_str(&format!("Broken images: {}\n", broken));
        }
    }

    out
}

// ============================================================================
// JSON FORMAT
// ============================================================================

#[derive(Serialize)]
struct ListingRow<'a> {
    name: &'a str,
    price: u64,
    image_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<ImageRow>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ImageRow {
    Ok { width: u32, height: u32 },
    Unavailable { error: String },
}

fn format_json(catalog: &Catalog, images: Option<&[ProductImage]>) -> String {
    let rows: Vec<ListingRow<'_>> = catalog
        .products
        .iter()
        .enumerate()
        .map(|(i, p)| ListingRow {
            name: &p.name,
            price: p.price,
            image_url: &p.image_url,
            image: images.and_then(|imgs| imgs.get(i)).map(|r| match r {
                Ok(info) => ImageRow::Ok {
                    width: info.width,
                    height: info.height,
                },
                Err(e) => ImageRow::Unavailable { error: e.to_string() },
            }),
        })
        .collect();

    let mut out = serde_json::to_string_pretty(&rows)
        .unwrap_or_else(|e| panic!("Failed to serialize catalog to JSON: {}", e));
    out.push('\n');
    out
}

// ============================================================================
// TESTS
// ============================================================================
