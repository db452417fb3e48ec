//! Reading one card element into a [`Card`].
//!
//! Every field is optional in the markup. A role element that is missing
//! reads as an empty string and spec items without a colon are skipped. The
//! one hard failure is a card that carries neither an id attribute nor a
//! title: it can't be shown or targeted, so the caller logs and drops it.

use super::{CATEGORY_ATTR, ID_ATTR, TYPE_ATTR, selector};
use crate::card::{Card, SPEC_SLOTS, Spec, collapse_whitespace, normalize_specs};
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use thiserror::Error;

static BADGE: LazyLock<Selector> = LazyLock::new(|| selector(".gallery-card-badge"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".gallery-card-title"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| selector(".gallery-card-price"));
static SPEC_ITEM: LazyLock<Selector> = LazyLock::new(|| selector(".spec-item"));

#[derive(Error, Debug)]
pub(super) enum CardParseError {
    #[error("card element has neither an id attribute nor a title")]
    Unidentifiable,
}

pub(super) fn read_card(el: ElementRef<'_>) -> Result<Card, CardParseError> {
    let attrs = el.value();
    let title = first_text(el, &TITLE);

    if attrs.attr(ID_ATTR).is_none() && title.is_empty() {
        return Err(CardParseError::Unidentifiable);
    }

    let image_path = el
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .unwrap_or_default()
        .to_string();

    let specs = el
        .select(&SPEC_ITEM)
        .take(SPEC_SLOTS)
        .filter_map(|item| Spec::split(&collapsed_text(item)));

    Ok(Card {
        id: attr(el, ID_ATTR),
        card_type: attr(el, TYPE_ATTR),
        category: attr(el, CATEGORY_ATTR),
        badge_text: first_text(el, &BADGE),
        image_path,
        title,
        price: first_text(el, &PRICE),
        specs: normalize_specs(specs),
    })
}

fn attr(el: ElementRef<'_>, name: &str) -> String {
    el.value().attr(name).unwrap_or_default().to_string()
}

fn first_text(el: ElementRef<'_>, role: &Selector) -> String {
    el.select(role)
        .next()
        .map(collapsed_text)
        .unwrap_or_default()
}

/// Text content with runs of whitespace collapsed to single spaces.
fn collapsed_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    collapse_whitespace(&raw)
}
