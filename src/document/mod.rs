//! The gallery document: a static HTML page treated as a card store.
//!
//! The page stays the source of truth. A [`Document`] wraps the parsed HTML
//! tree together with the node id of the container element; the card list is
//! a view derived from it on demand ([`Document::cards`]). Mutations edit the
//! tree in place and [`Document::to_html`] re-serialises the whole page, so
//! markup outside the container survives every operation.
//!
//! ## Markup contract
//!
//! ```text
//! div#gallery-grid                         container (id is configurable)
//! └── div.gallery-card[data-type][data-category][data-computer-id]
//!     └── div.gallery-card-inner
//!         ├── div.gallery-card-front
//!         │   ├── div.gallery-card-badge.badge-<category>
//!         │   └── div.gallery-card-image > img[src][alt]
//!         └── div.gallery-card-back
//!             ├── h3.gallery-card-title
//!             ├── div.gallery-card-price
//!             └── div.gallery-card-specs > div.spec-item × 4
//! ```
//!
//! Re-serialisation does not preserve the original byte layout of untouched
//! regions; only structure and content are guaranteed.

mod mutate;
mod parse;
pub mod render;

use crate::card::Card;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;

/// Structural class carried by every card element.
pub const CARD_CLASS: &str = "gallery-card";
/// Attribute holding the card id.
pub const ID_ATTR: &str = "data-computer-id";
pub const TYPE_ATTR: &str = "data-type";
pub const CATEGORY_ATTR: &str = "data-category";

static CARD: LazyLock<Selector> = LazyLock::new(|| selector(".gallery-card"));
static WITH_ID: LazyLock<Selector> = LazyLock::new(|| selector("[id]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Document structure error: no element with id '{0}'")]
    Structure(String),
    #[error("No card with id '{0}'")]
    NotFound(String),
}

/// A parsed gallery page plus a handle on its container element.
pub struct Document {
    html: Html,
    container: NodeId,
}

impl Document {
    /// Parse `text` and locate the container element with id `container_id`.
    ///
    /// Only a missing container is fatal. Everything inside it is read
    /// leniently by [`Document::cards`].
    pub fn parse(text: &str, container_id: &str) -> Result<Self, DocumentError> {
        let html = Html::parse_document(text);
        let container = html
            .select(&WITH_ID)
            .find(|el| el.value().id() == Some(container_id))
            .map(|el| el.id())
            .ok_or_else(|| DocumentError::Structure(container_id.to_string()))?;
        Ok(Self { html, container })
    }

    /// All cards in the container, in document order.
    pub fn cards(&self) -> Vec<Card> {
        self.card_elements()
            .filter_map(|el| match parse::read_card(el) {
                Ok(card) => Some(card),
                Err(e) => {
                    tracing::warn!("Dropping card: {e}");
                    None
                }
            })
            .collect()
    }

    /// Serialise the full page, surrounding markup included.
    pub fn to_html(&self) -> String {
        self.html.html()
    }

    fn container_ref(&self) -> ElementRef<'_> {
        self.html
            .tree
            .get(self.container)
            .and_then(ElementRef::wrap)
            .expect("container node id stays valid for the document's lifetime")
    }

    fn card_elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.container_ref().select(&CARD)
    }

    /// Node id of the first card whose id attribute equals `card_id`.
    fn find_card(&self, card_id: &str) -> Result<NodeId, DocumentError> {
        self.card_elements()
            .find(|el| el.value().attr(ID_ATTR) == Some(card_id))
            .map(|el| el.id())
            .ok_or_else(|| DocumentError::NotFound(card_id.to_string()))
    }
}

/// Parse `text` and return its cards in one step.
pub fn parse_cards(text: &str, container_id: &str) -> Result<Vec<Card>, DocumentError> {
    Ok(Document::parse(text, container_id)?.cards())
}
