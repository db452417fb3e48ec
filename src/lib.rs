//! # Gallery Manager
//!
//! Maintains the product gallery of a static storefront page. The page itself
//! is the database: every product is a `gallery-card` fragment inside one
//! container element, and the manager reads, adds, edits and removes those
//! fragments in place while leaving the rest of the page alone. Publishing
//! stages, commits and pushes the page with git.
//!
//! # Architecture: One File, Full Round-Trips
//!
//! Every operation starts from the file on disk:
//!
//! ```text
//! read page → parse tree → find #gallery-grid → cards
//!                                  │
//!             insert / replace / delete (in memory)
//!                                  │
//! snapshot old page → serialise tree → temp file → rename over page
//! ```
//!
//! Nothing is cached between operations, so an edit made by hand between two
//! commands is always picked up. Markup outside the container survives every
//! operation; formatting of untouched regions may be normalised by the
//! serialiser.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`card`] | Card model: types, categories, badges, spec slots, save validation, next id |
//! | [`document`] | HTML tree: parse cards out of the container, render and splice card fragments |
//! | [`store`] | [`Gallery`](store::Gallery): validated read → mutate → backup → atomic write cycle |
//! | [`backup`] | Timestamped, never-overwritten page snapshots |
//! | [`publish`] | Fixed git step sequence, benign-failure handling, background worker |
//! | [`imaging`] | Card image import: decode, downscale, JPEG encode into the asset directory |
//! | [`config`] | `gallery.toml` loading, defaults, merging, validation |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup for the binary |
//!
//! # Design Decisions
//!
//! ## Cards Live in the Page
//!
//! There is no side file or JSON index. The storefront renders straight from
//! `index.html`, so keeping the cards there means the page a visitor sees and
//! the data the manager edits cannot drift apart. The cost is that parsing is
//! lenient: a card fragment missing some roles still loads with empty fields,
//! and a fragment that can't be identified at all is logged and skipped.
//!
//! ## Four Spec Slots, Always
//!
//! The card back has room for four `label: value` lines. Cards always carry
//! exactly four slots; unused ones are written as empty `spec-item` elements
//! and read back as empty pairs.
//!
//! ## Validation at the Edge
//!
//! [`Card`](card::Card) holds plain strings so a page with odd values still
//! loads. [`Card::validate_for_save`](card::Card::validate_for_save) collects
//! every problem at once, and [`Gallery`](store::Gallery) refuses to write a
//! card that has any.
//!
//! ## Publishing Is a Straight Line
//!
//! `publish` runs a fixed list of git commands in order and stops at the first
//! real failure. "Nothing to commit" and "already up to date" are not
//! failures. Completed steps are never undone; the report shows exactly how
//! far the run got.

pub mod backup;
pub mod card;
pub mod config;
pub mod document;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod publish;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
