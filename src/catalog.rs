//! Product catalog loading.
//!
//! The catalog is a CSV file with `name`, `price` and `image_url` columns.
//! A missing or malformed file is fatal for the session: there is nothing
//! to shop from.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Product;

/// Failure to load the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot open catalog {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("malformed catalog {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// The loaded product list plus the directory relative image paths resolve against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub base_dir: PathBuf,
}

impl Catalog {
    /// Build a catalog from already-parsed products (base dir = cwd).
    pub fn from_products(products: Vec<Product>) -> Self {
        Catalog {
            products,
            base_dir: PathBuf::from("."),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Product> {
        self.products.get(index)
    }
}

/// Load the catalog from a CSV file.
///
/// Cells are trimmed; extra columns are ignored. Row order is preserved.
///
/// # Errors
/// [`CatalogError::Open`] if the file cannot be opened, [`CatalogError::Parse`]
/// if a row is missing a column or has a non-integer / negative price.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CatalogError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let products = reader
        .deserialize::<Product>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    tracing::info!(path = %path.display(), products = products.len(), "catalog loaded");

    Ok(Catalog { products, base_dir })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("products.csv");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_rows_in_order() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "name,price,image_url\nApple,1000,img/apple.png\nBread,2500,https://example.com/bread.jpg\n",
        );

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.products[0].name, "Apple");
        assert_eq!(catalog.products[0].price, 1000);
        assert_eq!(catalog.products[1].image_url, "https://example.com/bread.jpg");
        assert_eq!(catalog.base_dir, dir.path());
    }

    #[test]
    fn trims_cells_and_ignores_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "name,price,image_url,stock\n  우유 , 1800 ,milk.png,3\n");

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.products[0].name, "우유");
        assert_eq!(catalog.products[0].price, 1800);
    }

    #[test]
    fn header_only_is_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "name,price,image_url\n");
        assert!(load_catalog(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = TempDir::new().unwrap();
        let err = load_catalog(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, CatalogError::Open { .. }));
    }

    #[test]
    fn negative_price_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "name,price,image_url\nApple,-5,a.png\n");
        assert!(matches!(load_catalog(&path), Err(CatalogError::Parse { .. })));
    }

    #[test]
    fn non_numeric_price_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "name,price,image_url\nApple,cheap,a.png\n");
        assert!(matches!(load_catalog(&path), Err(CatalogError::Parse { .. })));
    }

    #[test]
    fn missing_column_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "name,image_url\nApple,a.png\n");
        assert!(matches!(load_catalog(&path), Err(CatalogError::Parse { .. })));
    }
}
