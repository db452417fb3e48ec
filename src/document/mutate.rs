//! In-place card insert / replace / delete on the parsed tree.
//!
//! New card markup is rendered with maud, parsed as a fragment, and its nodes
//! are copied into the document tree. Nothing outside the container is ever
//! touched; the caller re-serialises with [`Document::to_html`].

use super::{Document, DocumentError, render, selector};
use crate::card::Card;
use ego_tree::{NodeMut, NodeRef};
use scraper::{Html, Node, Selector};
use std::sync::LazyLock;

static FRAGMENT_CARD: LazyLock<Selector> = LazyLock::new(|| selector(".gallery-card"));

impl Document {
    /// Append `card` as the last child of the container.
    pub fn insert(&mut self, card: &Card, fallback_image: &str) {
        let fragment = card_fragment(card, fallback_image);
        let Some(source) = fragment_card(&fragment) else {
            return;
        };
        if let Some(mut container) = self.html.tree.get_mut(self.container) {
            graft(&mut container, source);
        }
    }

    /// Swap the card with id `card_id` for a fresh rendering of `card`,
    /// keeping its position.
    pub fn replace(
        &mut self,
        card_id: &str,
        card: &Card,
        fallback_image: &str,
    ) -> Result<(), DocumentError> {
        let old = self.find_card(card_id)?;
        let fragment = card_fragment(card, fallback_image);
        let Some(source) = fragment_card(&fragment) else {
            return Ok(());
        };

        if let Some(mut old_node) = self.html.tree.get_mut(old) {
            let mut new_node = old_node.insert_before(source.value().clone());
            for child in source.children() {
                graft(&mut new_node, child);
            }
        }
        if let Some(mut old_node) = self.html.tree.get_mut(old) {
            old_node.detach();
        }
        Ok(())
    }

    /// Remove the card with id `card_id`.
    pub fn delete(&mut self, card_id: &str) -> Result<(), DocumentError> {
        let target = self.find_card(card_id)?;
        if let Some(mut node) = self.html.tree.get_mut(target) {
            node.detach();
        }
        Ok(())
    }
}

fn card_fragment(card: &Card, fallback_image: &str) -> Html {
    Html::parse_fragment(&render::card_markup(card, fallback_image).into_string())
}

fn fragment_card(fragment: &Html) -> Option<NodeRef<'_, Node>> {
    fragment.select(&FRAGMENT_CARD).next().map(|el| *el)
}

/// Deep-copy `source` (from another tree) as the last child of `parent`.
fn graft(parent: &mut NodeMut<'_, Node>, source: NodeRef<'_, Node>) {
    let mut copy = parent.append(source.value().clone());
    for child in source.children() {
        graft(&mut copy, child);
    }
}
