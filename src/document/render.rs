//! Card markup generation.
//!
//! Uses [maud](https://maud.lambda.xyz/) so the fragment is checked at compile
//! time and every interpolated field is escaped. The role order (badge, image,
//! title, price, specs) mirrors what [`read_card`](super::parse) looks for.

use super::CARD_CLASS;
use crate::card::{Card, normalize_specs};
use maud::{Markup, html};

/// Render one card as a `div.gallery-card` fragment.
///
/// Specs are normalised first, so the fragment always has exactly four
/// `spec-item` slots; blank slots are empty elements. The `data-*` names here
/// must match [`ID_ATTR`](super::ID_ATTR), [`TYPE_ATTR`](super::TYPE_ATTR) and
/// [`CATEGORY_ATTR`](super::CATEGORY_ATTR).
pub fn card_markup(card: &Card, fallback_image: &str) -> Markup {
    let specs = normalize_specs(card.specs.iter().cloned());
    let onerror = format!("this.src='{fallback_image}'");

    html! {
        div class=(CARD_CLASS)
            data-type=(card.card_type)
            data-category=(card.category)
            data-computer-id=(card.id) {
            div class="gallery-card-inner" {
                div class="gallery-card-front" {
                    div class={ "gallery-card-badge badge-" (card.category) } { (card.badge_text) }
                    div class="gallery-card-image" {
                        img src=(card.image_path) alt=(card.title) onerror=(onerror);
                    }
                }
                div class="gallery-card-back" {
                    h3 class="gallery-card-title" { (card.title) }
                    div class="gallery-card-price" { (card.price) }
                    div class="gallery-card-specs" {
                        @for spec in &specs {
                            div class="spec-item" {
                                @if !spec.is_empty() {
                                    strong { (spec.label) ":" }
                                    " " (spec.value)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Category, CardType, Spec};

    fn laptop() -> Card {
        Card::new("3", CardType::Laptop, Category::New)
            .with_title("X1 <Carbon>")
            .with_price("$999")
            .with_image("./assets/gallery/laptop-3.jpg")
            .with_specs([Spec::new("CPU", "i7")])
    }

    #[test]
    fn carries_identifying_attributes() {
        let html = card_markup(&laptop(), "./assets/logo.png").into_string();
        assert!(html.starts_with(r#"<div class="gallery-card""#));
        assert!(html.contains(r#"data-type="laptop""#));
        assert!(html.contains(r#"data-category="new""#));
        assert!(html.contains(r#"data-computer-id="3""#));
        assert!(html.contains(r#"class="gallery-card-badge badge-new""#));
    }

    #[test]
    fn always_four_spec_slots() {
        let html = card_markup(&laptop(), "./assets/logo.png").into_string();
        assert_eq!(html.matches(r#"class="spec-item""#).count(), 4);
        assert!(html.contains("<strong>CPU:</strong> i7"));
    }

    #[test]
    fn escapes_text_and_sets_fallback() {
        let html = card_markup(&laptop(), "./assets/logo.png").into_string();
        assert!(html.contains("X1 &lt;Carbon&gt;"));
        assert!(html.contains("this.src='./assets/logo.png'"));
    }
}
