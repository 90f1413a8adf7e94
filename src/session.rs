//! The per-user session record and the operations that mutate it.
//!
//! One [`Session`] exists per interactive run. The budget is written once,
//! the cart only grows, and nothing survives the process except the result
//! images written by a successful submission.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::Catalog;
use crate::render::{RenderError, ResultRenderer};
use crate::report::cart_line;
use crate::types::{BudgetTier, CartItem, ProductImage};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("budget already set to {0}")]
    BudgetAlreadySet(u64),
    #[error("no product at index {0}")]
    NoSuchProduct(usize),
    #[error("구매 이유를 입력해주세요.")]
    EmptyReason,
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A written result image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Everything the result screen shows about the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<String>,
    pub total: u64,
    pub budget: Option<u64>,
    pub over_budget: bool,
}

/// Reject reasons that are empty or whitespace-only.
pub fn validate_reason(reason: &str) -> Result<(), SessionError> {
    if reason.trim().is_empty() {
        tracing::debug!("submission rejected: empty reason");
        return Err(SessionError::EmptyReason);
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct Session {
    catalog: Catalog,
    images: Vec<ProductImage>,
    budget: Option<u64>,
    cart: Vec<CartItem>,
}

impl Session {
    /// Start a session over a loaded catalog.
    ///
    /// `images` is parallel to the catalog; missing entries mean "not probed".
    pub fn new(catalog: Catalog, images: Vec<ProductImage>) -> Self {
        Session {
            catalog,
            images,
            budget: None,
            cart: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn image(&self, index: usize) -> Option<&ProductImage> {
        self.images.get(index)
    }

    pub fn budget(&self) -> Option<u64> {
        self.budget
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// Fix the budget for the rest of the session.
    ///
    /// # Errors
    /// [`SessionError::BudgetAlreadySet`] on any second call.
    pub fn choose_budget(&mut self, tier: BudgetTier) -> Result<u64, SessionError> {
        if let Some(existing) = self.budget {
            return Err(SessionError::BudgetAlreadySet(existing));
        }
        let amount = tier.amount();
        self.budget = Some(amount);
        tracing::info!(tier = tier.label(), budget = amount, "mission chosen");
        Ok(amount)
    }

    /// Append a copy of the product at `index`. Repeats append repeats.
    pub fn add_to_cart(&mut self, index: usize) -> Result<CartItem, SessionError> {
        let item = self
            .catalog
            .get(index)
            .map(CartItem::from)
            .ok_or(SessionError::NoSuchProduct(index))?;
        self.cart.push(item.clone());
        tracing::info!(product = %item.name, price = item.price, cart_len = self.cart.len(), "added to cart");
        Ok(item)
    }

    /// Sum of cart prices. No tax, no discounts, no budget check.
    pub fn total(&self) -> u64 {
        self.cart.iter().map(|item| item.price).sum()
    }

    pub fn summary(&self) -> CartSummary {
        let total = self.total();
        CartSummary {
            lines: self.cart.iter().map(cart_line).collect(),
            total,
            budget: self.budget,
            over_budget: self.budget.is_some_and(|b| total > b),
        }
    }

    /// Validate the reason and render the result image.
    ///
    /// Never mutates the session. Blank reasons are rejected before the
    /// renderer runs; renderer failures are passed through, and so is a
    /// written file that cannot be stat'ed afterwards.
    pub fn submit(
        &self,
        reason: &str,
        renderer: &dyn ResultRenderer,
    ) -> Result<Submission, SessionError> {
        validate_reason(reason)?;
        let path = renderer.render(reason, &self.cart)?;
        let size_bytes = fs::metadata(&path).map_err(RenderError::from)?.len();
        Ok(Submission { path, size_bytes })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::NullPainter;
    use crate::render::PngRenderer;
    use crate::types::Product;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        Catalog::from_products(vec![
            Product { name: "Apple".into(), price: 1000, image_url: "a.png".into() },
            Product { name: "Bread".into(), price: 2500, image_url: "b.png".into() },
            Product { name: "Cake".into(), price: 9000, image_url: "c.png".into() },
        ])
    }

    struct CountingRenderer {
        calls: Cell<usize>,
    }

    impl ResultRenderer for CountingRenderer {
        fn render(&self, _reason: &str, _items: &[CartItem]) -> Result<PathBuf, RenderError> {
            self.calls.set(self.calls.get() + 1);
            Ok(PathBuf::from("no-such-dir/result_20260101_000000.png"))
        }
    }

    #[test]
    fn basic_tier_sets_budget_10000() {
        let mut session = Session::new(catalog(), vec![]);
        assert_eq!(session.choose_budget(BudgetTier::Basic).unwrap(), 10_000);
        assert_eq!(session.budget(), Some(10_000));
    }

    #[test]
    fn budget_cannot_be_set_twice() {
        let mut session = Session::new(catalog(), vec![]);
        session.choose_budget(BudgetTier::Basic).unwrap();
        let err = session.choose_budget(BudgetTier::Advanced).unwrap_err();
        assert!(matches!(err, SessionError::BudgetAlreadySet(10_000)));
        assert_eq!(session.budget(), Some(10_000));
    }

    #[test]
    fn same_product_twice_gives_two_entries() {
        let mut session = Session::new(catalog(), vec![]);
        session.add_to_cart(0).unwrap();
        session.add_to_cart(0).unwrap();
        assert_eq!(session.cart().len(), 2);
        assert_eq!(session.cart()[0], session.cart()[1]);
    }

    #[test]
    fn add_returns_the_appended_item() {
        let mut session = Session::new(catalog(), vec![]);
        let item = session.add_to_cart(1).unwrap();
        assert_eq!(item.name, "Bread");
        assert_eq!(item.price, 2500);
        assert_eq!(session.cart(), &[item]);
    }

    #[test]
    fn add_out_of_range_is_error() {
        let mut session = Session::new(catalog(), vec![]);
        assert!(matches!(session.add_to_cart(9), Err(SessionError::NoSuchProduct(9))));
        assert!(session.cart().is_empty());
    }

    #[test]
    fn total_is_plain_sum() {
        let mut session = Session::new(catalog(), vec![]);
        session.add_to_cart(0).unwrap();
        session.add_to_cart(1).unwrap();
        assert_eq!(session.total(), 3500);
    }

    #[test]
    fn over_budget_cart_is_accepted() {
        let mut session = Session::new(catalog(), vec![]);
        session.choose_budget(BudgetTier::Basic).unwrap();
        session.add_to_cart(2).unwrap();
        session.add_to_cart(2).unwrap();

        let summary = session.summary();
        assert_eq!(summary.total, 18_000);
        assert_eq!(summary.budget, Some(10_000));
        assert!(summary.over_budget);
        assert_eq!(summary.lines, vec!["- Cake / 9,000원", "- Cake / 9,000원"]);
    }

    #[test]
    fn blank_reasons_never_reach_renderer() {
        let mut session = Session::new(catalog(), vec![]);
        session.choose_budget(BudgetTier::Basic).unwrap();
        session.add_to_cart(0).unwrap();
        let renderer = CountingRenderer { calls: Cell::new(0) };

        for reason in ["", "   ", "\n\t "] {
            let err = session.submit(reason, &renderer).unwrap_err();
            assert!(matches!(err, SessionError::EmptyReason));
        }

        assert_eq!(renderer.calls.get(), 0);
        assert_eq!(session.cart().len(), 1);
        assert_eq!(session.budget(), Some(10_000));
    }

    #[test]
    fn validate_reason_accepts_text_with_spaces() {
        assert!(validate_reason("  For breakfast  ").is_ok());
        assert!(matches!(validate_reason(" \n "), Err(SessionError::EmptyReason)));
    }

    #[test]
    fn blank_reason_writes_no_file() {
        let dir = TempDir::new().unwrap();
        let session = Session::new(catalog(), vec![]);
        let renderer = PngRenderer::with_output_dir(NullPainter, dir.path());

        assert!(session.submit("   ", &renderer).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn submit_writes_file_and_reports_size() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(catalog(), vec![]);
        session.add_to_cart(0).unwrap();
        session.add_to_cart(1).unwrap();
        let renderer = PngRenderer::with_output_dir(NullPainter, dir.path());

        let submission = session.submit("For breakfast", &renderer).unwrap();

        assert!(submission.path.is_file());
        assert!(submission.size_bytes > 0);
        assert_eq!(session.total(), 3500);
    }

    #[test]
    fn missing_output_file_is_an_error_not_an_empty_submission() {
        let session = Session::new(catalog(), vec![]);
        let renderer = CountingRenderer { calls: Cell::new(0) };

        let err = session.submit("because", &renderer).unwrap_err();

        assert_eq!(renderer.calls.get(), 1);
        assert!(matches!(err, SessionError::Render(RenderError::Io(_))));
    }

    #[test]
    fn render_failure_is_passed_through() {
        struct Broken;
        impl ResultRenderer for Broken {
            fn render(&self, _: &str, _: &[CartItem]) -> Result<PathBuf, RenderError> {
                Err(RenderError::NoFont)
            }
        }

        let session = Session::new(catalog(), vec![]);
        let err = session.submit("because", &Broken).unwrap_err();
        assert!(matches!(err, SessionError::Render(RenderError::NoFont)));
    }
}
