//! High-level image operations.
//!
//! [`import_card_image`] takes an operator-supplied picture, fits it within
//! the configured size and writes it into the site's asset directory under a
//! name derived from the card, returning the path the card markup should use.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::params::{ImportParams, Quality};
use super::rust_backend::is_supported_source;
use crate::card::CardType;
use crate::config::AssetsConfig;
use std::fs;
use std::path::{Component, Path};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// `<type>-<id>.jpg`.
pub fn image_file_name(card_type: CardType, card_id: &str) -> Result<String> {
    let id = card_id.trim();
    let usable = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !usable {
        return Err(BackendError::InvalidName(card_id.to_string()));
    }
    Ok(format!("{card_type}-{id}.jpg"))
}

/// Card-relative reference for an image in the asset directory: `./<dir>/<file>`.
fn markup_path(asset_dir: &Path, file_name: &str) -> String {
    let mut parts: Vec<String> = asset_dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.push(file_name.to_string());
    format!("./{}", parts.join("/"))
}

/// Import `source` as the image for card `card_id` of `card_type`.
///
/// The file lands in `<site_root>/<assets.dir>/<type>-<id>.jpg`, replacing
/// any previous image for that card. Returns the path to store in
/// [`Card::image_path`](crate::card::Card::image_path).
pub fn import_card_image(
    backend: &impl ImageBackend,
    source: &Path,
    site_root: &Path,
    assets: &AssetsConfig,
    card_type: CardType,
    card_id: &str,
) -> Result<String> {
    if !is_supported_source(source) {
        return Err(BackendError::UnsupportedFormat(source.display().to_string()));
    }
    let file_name = image_file_name(card_type, card_id)?;

    let dims = backend.identify(source)?;
    let (width, height) = fit_within((dims.width, dims.height), assets.max_dimension);

    let output_dir = site_root.join(&assets.dir);
    fs::create_dir_all(&output_dir)?;
    let output = output_dir.join(&file_name);

    backend.import(&ImportParams {
        source: source.to_path_buf(),
        output: output.clone(),
        width,
        height,
        quality: Quality::new(assets.quality),
    })?;
    tracing::info!(
        "Imported {} as {} ({}x{})",
        source.display(),
        output.display(),
        width,
        height
    );

    Ok(markup_path(&assets.dir, &file_name))
}
