//! Product image probing.
//!
//! The terminal cannot show pictures, so the shop screen only needs to know
//! whether each image is displayable and how large it is. Every failure
//! becomes a [`LoadError`] that the view turns into a placeholder.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::ImageReader;
use rayon::prelude::*;

use crate::catalog::Catalog;
use crate::types::{ImageInfo, LoadError, ProductImage};

/// Upper bound for fetching one remote image.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Where an `image_url` cell points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(String),
    Local(PathBuf),
}

/// Classify an `image_url` cell. Relative paths resolve against `base_dir`.
pub fn classify(image_url: &str, base_dir: &Path) -> ImageSource {
    let url = image_url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        ImageSource::Remote(url.to_string())
    } else {
        let path = Path::new(url);
        if path.is_absolute() {
            ImageSource::Local(path.to_path_buf())
        } else {
            ImageSource::Local(base_dir.join(path))
        }
    }
}

/// Probes product images, sharing one HTTP client.
pub struct ImageProber {
    base_dir: PathBuf,
    client: Result<reqwest::blocking::Client, String>,
}

impl ImageProber {
    pub fn new(base_dir: &Path) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| e.to_string());
        ImageProber {
            base_dir: base_dir.to_path_buf(),
            client,
        }
    }

    /// Probe a single `image_url` cell.
    pub fn probe(&self, image_url: &str) -> ProductImage {
        let result = match classify(image_url, &self.base_dir) {
            ImageSource::Local(path) => probe_local(&path),
            ImageSource::Remote(url) => self.probe_remote(&url),
        };
        if let Err(e) = &result {
            tracing::warn!(image_url, error = %e, "product image unavailable");
        }
        result
    }

    fn probe_remote(&self, url: &str) -> ProductImage {
        let fetch_err = |reason: String| LoadError::Fetch {
            url: url.to_string(),
            reason,
        };
        let client = self.client.as_ref().map_err(|e| fetch_err(e.clone()))?;
        let bytes = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| fetch_err(e.to_string()))?;
        decode_dimensions(&bytes)
    }
}

fn probe_local(path: &Path) -> ProductImage {
    if !path.is_file() {
        return Err(LoadError::Missing(path.to_path_buf()));
    }
    let (width, height) =
        image::image_dimensions(path).map_err(|e| LoadError::Decode(e.to_string()))?;
    Ok(ImageInfo { width, height })
}

fn decode_dimensions(bytes: &[u8]) -> ProductImage {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LoadError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| LoadError::Decode(e.to_string()))?;
    Ok(ImageInfo { width, height })
}

/// Probe every product image in parallel. Output order matches the catalog.
pub fn probe_catalog(catalog: &Catalog) -> Vec<ProductImage> {
    let prober = ImageProber::new(&catalog.base_dir);
    catalog
        .products
        .par_iter()
        .map(|p| prober.probe(&p.image_url))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) {
        RgbImage::from_pixel(w, h, Rgb([200, 10, 10]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn classify_http_as_remote() {
        assert_eq!(
            classify("https://example.com/a.png", Path::new(".")),
            ImageSource::Remote("https://example.com/a.png".into())
        );
    }

    #[test]
    fn classify_relative_joins_base_dir() {
        assert_eq!(
            classify("img/a.png", Path::new("/data")),
            ImageSource::Local(PathBuf::from("/data/img/a.png"))
        );
    }

    #[test]
    fn local_png_reports_dimensions() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "apple.png", 12, 7);

        let prober = ImageProber::new(dir.path());
        assert_eq!(prober.probe("apple.png"), Ok(ImageInfo { width: 12, height: 7 }));
    }

    #[test]
    fn missing_file_is_missing_error() {
        let dir = TempDir::new().unwrap();
        let prober = ImageProber::new(dir.path());
        assert!(matches!(prober.probe("ghost.png"), Err(LoadError::Missing(_))));
    }

    #[test]
    fn garbage_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.png"), b"definitely not a png").unwrap();
        let prober = ImageProber::new(dir.path());
        assert!(matches!(prober.probe("bad.png"), Err(LoadError::Decode(_))));
    }

    #[test]
    fn one_failure_does_not_affect_others() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "ok.png", 3, 3);

        let catalog = Catalog {
            products: vec![
                Product { name: "A".into(), price: 1, image_url: "missing.png".into() },
                Product { name: "B".into(), price: 2, image_url: "ok.png".into() },
            ],
            base_dir: dir.path().to_path_buf(),
        };

        let probed = probe_catalog(&catalog);
        assert_eq!(probed.len(), 2);
        assert!(probed[0].is_err());
        assert_eq!(probed[1], Ok(ImageInfo { width: 3, height: 3 }));
    }
}
