//! The card model: one product listing embedded in the gallery document.
//!
//! A [`Card`] has no persistence of its own. It is read out of the document by
//! [`document`](crate::document), edited in memory, and written back as a fresh
//! markup fragment. Fields that come from the document are kept as raw strings
//! so a hand-edited page with odd attribute values still loads; the typed
//! [`CardType`] and [`Category`] enums are used at the editing boundary.
//!
//! ## Type / category matrix
//!
//! | Type | Legal categories |
//! |------|------------------|
//! | desktop | custom, refurbished |
//! | laptop | new, refurbished |
//!
//! The matrix is only enforced by [`Card::validate_for_save`]. Parsing never
//! rejects an illegal combination that is already on disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of spec slots every card carries.
pub const SPEC_SLOTS: usize = 4;

/// Prices must start with this marker.
pub const CURRENCY_MARKER: &str = "$";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {field} '{value}'")]
pub struct ParseFieldError {
    field: &'static str,
    value: String,
}

/// Kind of machine a card lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Desktop,
    Laptop,
}

impl CardType {
    pub fn as_str(self) -> &'static str {
        match self {
            CardType::Desktop => "desktop",
            CardType::Laptop => "laptop",
        }
    }

    /// Categories an operator may pick for this type.
    pub fn categories(self) -> &'static [Category] {
        match self {
            CardType::Desktop => &[Category::Custom, Category::Refurbished],
            CardType::Laptop => &[Category::New, Category::Refurbished],
        }
    }

    /// Category to fall back to when switching type leaves an illegal one behind.
    pub fn default_category(self) -> Category {
        match self {
            CardType::Desktop => Category::Custom,
            CardType::Laptop => Category::Refurbished,
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardType {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(CardType::Desktop),
            "laptop" => Ok(CardType::Laptop),
            _ => Err(ParseFieldError {
                field: "type",
                value: s.to_string(),
            }),
        }
    }
}

/// Sales category, shown as the card badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Custom,
    Refurbished,
    New,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Custom => "custom",
            Category::Refurbished => "refurbished",
            Category::New => "new",
        }
    }

    pub fn badge_text(self) -> &'static str {
        match self {
            Category::Custom => "Custom Build",
            Category::New => "New",
            Category::Refurbished => "Refurbished",
        }
    }

    pub fn is_legal_for(self, card_type: CardType) -> bool {
        card_type.categories().contains(&self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "custom" => Ok(Category::Custom),
            "refurbished" => Ok(Category::Refurbished),
            "new" => Ok(Category::New),
            _ => Err(ParseFieldError {
                field: "category",
                value: s.to_string(),
            }),
        }
    }
}

/// Badge label for a raw category string. Unknown categories get no badge.
pub fn badge_for(category: &str) -> &'static str {
    category
        .parse::<Category>()
        .map(Category::badge_text)
        .unwrap_or("")
}

/// One `label: value` line on the back of a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    pub label: String,
    pub value: String,
}

impl Spec {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Both halves present.
    pub fn is_populated(&self) -> bool {
        !self.label.is_empty() && !self.value.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.value.is_empty()
    }

    /// Split `text` on its first colon. Text without a colon is not a spec.
    pub fn split(text: &str) -> Option<Self> {
        let (label, value) = text.split_once(':')?;
        Some(Self::new(label.trim(), value.trim()))
    }
}

impl FromStr for Spec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Spec::split(s).ok_or_else(|| format!("expected 'Label: value', got '{s}'"))
    }
}

/// Runs of whitespace become single spaces; ends are trimmed.
///
/// This is how the page text reads back after parsing, so stored values are
/// kept in this form.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pad or truncate to exactly [`SPEC_SLOTS`] entries.
///
/// Only pairs with both halves filled are kept, so populated specs stay at the
/// front in their original order and only trailing slots are blank.
pub fn normalize_specs(specs: impl IntoIterator<Item = Spec>) -> Vec<Spec> {
    let mut out: Vec<Spec> = specs
        .into_iter()
        .map(|s| Spec::new(collapse_whitespace(&s.label), collapse_whitespace(&s.value)))
        .filter(Spec::is_populated)
        .take(SPEC_SLOTS)
        .collect();
    out.resize(SPEC_SLOTS, Spec::default());
    out
}

/// A product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub category: String,
    pub badge_text: String,
    pub image_path: String,
    pub title: String,
    pub price: String,
    pub specs: Vec<Spec>,
}

/// A single violated field constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Card id is required")]
    MissingId,
    #[error("Title is required")]
    MissingTitle,
    #[error("Price is required")]
    MissingPrice,
    #[error("Price must start with $")]
    PriceWithoutCurrency,
    #[error("At least one specification is required")]
    NoSpecs,
    #[error("Image is required for new cards")]
    MissingImage,
    #[error("Image is required: the card has no existing image")]
    MissingExistingImage,
    #[error("Unknown card type '{0}'")]
    UnknownType(String),
    #[error("Category '{category}' is not available for {card_type} cards")]
    IllegalCategory { card_type: String, category: String },
    #[error("Spec label '{0}' must not contain ':'")]
    SpecLabelWithColon(String),
}

impl Card {
    /// A blank card with badge derived from `category` and empty spec slots.
    pub fn new(id: impl Into<String>, card_type: CardType, category: Category) -> Self {
        Self {
            id: id.into(),
            card_type: card_type.as_str().to_string(),
            category: category.as_str().to_string(),
            badge_text: category.badge_text().to_string(),
            specs: normalize_specs(Vec::new()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    pub fn with_image(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = image_path.into();
        self
    }

    pub fn with_specs(mut self, specs: impl IntoIterator<Item = Spec>) -> Self {
        self.set_specs(specs);
        self
    }

    pub fn set_specs(&mut self, specs: impl IntoIterator<Item = Spec>) {
        self.specs = normalize_specs(specs);
    }

    /// Set category and recompute the badge.
    pub fn set_category(&mut self, category: Category) {
        self.category = category.as_str().to_string();
        self.badge_text = category.badge_text().to_string();
    }

    pub fn kind(&self) -> Option<CardType> {
        self.card_type.parse().ok()
    }

    pub fn parsed_category(&self) -> Option<Category> {
        self.category.parse().ok()
    }

    /// Whether the card passes the optional type and category filters.
    pub fn matches(&self, card_type: Option<CardType>, category: Option<Category>) -> bool {
        card_type.is_none_or(|t| self.kind() == Some(t))
            && category.is_none_or(|c| self.parsed_category() == Some(c))
    }

    /// The form the card takes once written and read back: whitespace
    /// collapsed in title, price and specs, specs re-normalised.
    pub fn normalized(&self) -> Card {
        Card {
            title: collapse_whitespace(&self.title),
            price: collapse_whitespace(&self.price),
            specs: normalize_specs(self.specs.iter().cloned()),
            ..self.clone()
        }
    }

    pub fn populated_specs(&self) -> impl Iterator<Item = &Spec> {
        self.specs.iter().filter(|s| s.is_populated())
    }

    /// Every violated constraint, in a stable order. Never fails itself.
    ///
    /// `existing` is true when the card replaces one already in the document;
    /// such a card may keep the image it already has.
    pub fn validate_for_save(&self, existing: bool) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.id.trim().is_empty() {
            errors.push(ValidationError::MissingId);
        }

        match self.kind() {
            None => errors.push(ValidationError::UnknownType(self.card_type.clone())),
            Some(kind) => {
                let legal = self.parsed_category().is_some_and(|c| c.is_legal_for(kind));
                if !legal {
                    errors.push(ValidationError::IllegalCategory {
                        card_type: self.card_type.clone(),
                        category: self.category.clone(),
                    });
                }
            }
        }

        if self.title.trim().is_empty() {
            errors.push(ValidationError::MissingTitle);
        }

        let price = self.price.trim();
        if price.is_empty() {
            errors.push(ValidationError::MissingPrice);
        }
        if !price.starts_with(CURRENCY_MARKER) {
            errors.push(ValidationError::PriceWithoutCurrency);
        }

        if self.populated_specs().next().is_none() {
            errors.push(ValidationError::NoSpecs);
        }
        for spec in self.populated_specs() {
            if spec.label.contains(':') {
                errors.push(ValidationError::SpecLabelWithColon(spec.label.clone()));
            }
        }

        if self.image_path.trim().is_empty() {
            errors.push(if existing {
                ValidationError::MissingExistingImage
            } else {
                ValidationError::MissingImage
            });
        }

        errors
    }
}

/// Next free id: one past the largest numeric id, `"1"` if there is none.
pub fn next_id(cards: &[Card]) -> String {
    cards
        .iter()
        .filter_map(|c| c.id.trim().parse::<u64>().ok())
        .max()
        .map(|n| (n + 1).to_string())
        .unwrap_or_else(|| "1".to_string())
}
