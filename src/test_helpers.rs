//! Shared test utilities for the gallery-manager test suite.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let site = setup_site();
//! let gallery = Gallery::new(site.path(), ManagerConfig::default());
//! assert_eq!(card_ids(&gallery.load().unwrap()), ["1", "2"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::card::{Card, CardType, Category, Spec};

/// The fixture storefront page: two cards (`1` desktop, `2` laptop) inside
/// `#gallery-grid`, plus header, filters and a `#contact` section.
pub const SAMPLE_PAGE: &str = include_str!("../fixtures/site/index.html");

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Card builders
// =========================================================================

/// A card that passes `validate_for_save(false)`.
pub fn sample_card(id: &str, card_type: CardType, category: Category) -> Card {
    Card::new(id, card_type, category)
        .with_title(format!("Machine {id}"))
        .with_price("$799")
        .with_image(format!("./assets/gallery/{card_type}-{id}.jpg"))
        .with_specs([Spec::new("CPU", "i7"), Spec::new("RAM", "16GB")])
}

pub fn card_ids(cards: &[Card]) -> Vec<&str> {
    cards.iter().map(|c| c.id.as_str()).collect()
}
