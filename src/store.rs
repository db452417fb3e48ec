//! The gallery as a card store backed by one HTML file.
//!
//! Every operation re-reads the page from disk. A mutation runs the full cycle:
//!
//! ```text
//! validate → read → parse → mutate tree → snapshot → serialise → atomic replace
//! ```
//!
//! Validation failures stop before the file is read. Structure and not-found
//! errors stop before a snapshot is taken. The new page is written to a temp
//! file in the same directory and renamed over the original, so a failure
//! never leaves a half-written document behind.
//!
//! There is no locking: the manager assumes it is the only writer between
//! read and replace.

use crate::backup::{self, BackupError, BackupPolicy};
use crate::card::{Card, ValidationError, next_id};
use crate::config::ManagerConfig;
use crate::document::{Document, DocumentError};
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Card is not valid:\n{}", format_validation(.0))]
    Validation(Vec<ValidationError>),
    #[error("Backup failed, change not applied: {0}")]
    Backup(#[source] BackupError),
    #[error("Image path escapes the site root: {0}")]
    UnsafeAssetPath(String),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> GalleryError + '_ {
    move |source| GalleryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// How the pre-write snapshot went.
#[derive(Debug)]
pub enum BackupOutcome {
    Created(PathBuf),
    /// Snapshot failed and the policy let the change through.
    Failed(String),
}

/// Result of a successful mutation.
#[derive(Debug)]
pub enum Mutation {
    Inserted,
    Replaced,
    Deleted,
}

#[derive(Debug)]
pub struct MutationReport {
    pub mutation: Mutation,
    pub card_id: String,
    pub backup: BackupOutcome,
    /// Cards in the document after the change.
    pub card_count: usize,
}

/// A site root plus its configuration.
pub struct Gallery {
    root: PathBuf,
    config: ManagerConfig,
}

impl Gallery {
    pub fn new(root: impl Into<PathBuf>, config: ManagerConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn document_path(&self) -> PathBuf {
        self.root.join(&self.config.document)
    }

    pub fn asset_dir(&self) -> PathBuf {
        self.root.join(&self.config.assets.dir)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(&self.config.backup.dir)
    }

    /// All cards, in display order.
    pub fn load(&self) -> Result<Vec<Card>, GalleryError> {
        Ok(self.read_document()?.cards())
    }

    pub fn find(&self, card_id: &str) -> Result<Card, GalleryError> {
        self.load()?
            .into_iter()
            .find(|c| c.id == card_id)
            .ok_or_else(|| DocumentError::NotFound(card_id.to_string()).into())
    }

    /// Id to give the next new card.
    pub fn next_id(&self) -> Result<String, GalleryError> {
        Ok(next_id(&self.load()?))
    }

    /// Append `card` to the end of the gallery.
    ///
    /// An existing card with the same id is not checked for; both end up in
    /// the page. Text is stored whitespace-collapsed, see [`Card::normalized`].
    pub fn insert(&self, card: &Card) -> Result<MutationReport, GalleryError> {
        let card = card.normalized();
        check(&card, false)?;
        self.mutate(Mutation::Inserted, &card.id, |doc, fallback| {
            doc.insert(&card, fallback);
            Ok(())
        })
    }

    /// Replace the card with id `card_id` by `card`, keeping its position.
    pub fn replace(&self, card_id: &str, card: &Card) -> Result<MutationReport, GalleryError> {
        let card = card.normalized();
        check(&card, true)?;
        self.mutate(Mutation::Replaced, card_id, |doc, fallback| {
            doc.replace(card_id, &card, fallback)
        })
    }

    /// Remove the card with id `card_id`.
    pub fn delete(&self, card_id: &str) -> Result<MutationReport, GalleryError> {
        self.mutate(Mutation::Deleted, card_id, |doc, _| doc.delete(card_id))
    }

    /// Take a snapshot outside of a mutation.
    pub fn snapshot(&self) -> Result<PathBuf, BackupError> {
        backup::snapshot(&self.document_path(), &self.backup_dir())
    }

    /// Delete the image file a card points at.
    ///
    /// Returns the removed path, or `None` when the card has no image or the
    /// file is already gone.
    pub fn remove_image(&self, card: &Card) -> Result<Option<PathBuf>, GalleryError> {
        let Some(path) = self.image_file(card)? else {
            return Ok(None);
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Removed image {}", path.display());
                Ok(Some(path))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    /// Where the card's image lives on disk, if it has one.
    ///
    /// Fails with [`GalleryError::UnsafeAssetPath`] when the page path would
    /// leave the site root.
    pub fn image_file(&self, card: &Card) -> Result<Option<PathBuf>, GalleryError> {
        if card.image_path.trim().is_empty() {
            return Ok(None);
        }
        self.resolve_site_path(&card.image_path).map(Some)
    }

    /// Resolve a page-relative path (`./assets/x.jpg`) inside the site root.
    fn resolve_site_path(&self, relative: &str) -> Result<PathBuf, GalleryError> {
        let rel = Path::new(relative.trim());
        let escapes = rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(GalleryError::UnsafeAssetPath(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn read_document(&self) -> Result<Document, GalleryError> {
        let path = self.document_path();
        let text = fs::read_to_string(&path).map_err(io_error(&path))?;
        Ok(Document::parse(&text, &self.config.container_id)?)
    }

    fn mutate<F>(
        &self,
        mutation: Mutation,
        card_id: &str,
        apply: F,
    ) -> Result<MutationReport, GalleryError>
    where
        F: FnOnce(&mut Document, &str) -> Result<(), DocumentError>,
    {
        let mut doc = self.read_document()?;
        apply(&mut doc, &self.config.assets.fallback_image)?;
        let html = doc.to_html();
        let card_count = doc.cards().len();

        let backup = match self.snapshot() {
            Ok(path) => BackupOutcome::Created(path),
            Err(e) => match self.config.backup.on_failure {
                BackupPolicy::Abort => return Err(GalleryError::Backup(e)),
                BackupPolicy::Continue => {
                    tracing::warn!("Backup failed, continuing: {e}");
                    BackupOutcome::Failed(e.to_string())
                }
            },
        };

        let path = self.document_path();
        write_atomic(&path, html.as_bytes()).map_err(io_error(&path))?;
        tracing::info!("{mutation:?} card {card_id} in {}", path.display());

        Ok(MutationReport {
            mutation,
            card_id: card_id.to_string(),
            backup,
            card_count,
        })
    }
}

fn check(card: &Card, existing: bool) -> Result<(), GalleryError> {
    let errors = card.validate_for_save(existing);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(GalleryError::Validation(errors))
    }
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardType, Category, Spec};
    use crate::test_helpers::{card_ids, sample_card, setup_site};

    fn gallery(root: &Path) -> Gallery {
        Gallery::new(root, ManagerConfig::default())
    }

    fn backup_count(g: &Gallery) -> usize {
        fs::read_dir(g.backup_dir()).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn load_fixture_cards() {
        let site = setup_site();
        let cards = gallery(site.path()).load().unwrap();
        assert_eq!(card_ids(&cards), ["1", "2"]);
    }

    #[test]
    fn missing_document_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = gallery(tmp.path()).load().unwrap_err();
        assert!(matches!(err, GalleryError::Io { .. }));
    }

    #[test]
    fn insert_writes_backup_and_card() {
        let site = setup_site();
        let g = gallery(site.path());
        let card = sample_card("3", CardType::Laptop, Category::New);

        let report = g.insert(&card).unwrap();
        assert!(matches!(report.backup, BackupOutcome::Created(_)));
        assert_eq!(report.card_count, 3);

        let cards = g.load().unwrap();
        assert_eq!(card_ids(&cards), ["1", "2", "3"]);
        assert_eq!(cards[2], card);
        assert_eq!(backup_count(&g), 1);
    }

    #[test]
    fn invalid_card_never_touches_disk() {
        let site = setup_site();
        let g = gallery(site.path());
        let before = fs::read_to_string(g.document_path()).unwrap();
        let card = sample_card("3", CardType::Laptop, Category::New).with_price("999");

        let err = g.insert(&card).unwrap_err();
        assert!(matches!(
            err,
            GalleryError::Validation(ref v) if v == &[ValidationError::PriceWithoutCurrency]
        ));
        assert_eq!(fs::read_to_string(g.document_path()).unwrap(), before);
        assert_eq!(backup_count(&g), 0);
    }

    #[test]
    fn delete_missing_takes_no_backup() {
        let site = setup_site();
        let g = gallery(site.path());
        let before = fs::read_to_string(g.document_path()).unwrap();

        let err = g.delete("42").unwrap_err();
        assert!(matches!(err, GalleryError::Document(DocumentError::NotFound(_))));
        assert_eq!(fs::read_to_string(g.document_path()).unwrap(), before);
        assert_eq!(backup_count(&g), 0);
    }

    #[test]
    fn wrong_container_is_structure_error() {
        let site = setup_site();
        let mut config = ManagerConfig::default();
        config.container_id = "products".into();
        let err = Gallery::new(site.path(), config).load().unwrap_err();
        assert!(matches!(err, GalleryError::Document(DocumentError::Structure(_))));
    }

    #[test]
    fn backup_failure_continues_by_default() {
        let site = setup_site();
        // A file where the backup directory should be makes the snapshot fail.
        fs::write(site.path().join("backups"), "not a directory").unwrap();
        let g = gallery(site.path());

        let report = g.delete("1").unwrap();
        assert!(matches!(report.backup, BackupOutcome::Failed(_)));
        assert_eq!(card_ids(&g.load().unwrap()), ["2"]);
    }

    #[test]
    fn backup_failure_aborts_under_strict_policy() {
        let site = setup_site();
        fs::write(site.path().join("backups"), "not a directory").unwrap();
        let mut config = ManagerConfig::default();
        config.backup.on_failure = BackupPolicy::Abort;
        let g = Gallery::new(site.path(), config);

        let err = g.delete("1").unwrap_err();
        assert!(matches!(err, GalleryError::Backup(_)));
        assert_eq!(card_ids(&g.load().unwrap()), ["1", "2"]);
    }

    #[test]
    fn replace_validates_as_existing() {
        let site = setup_site();
        let g = gallery(site.path());
        let card = sample_card("2", CardType::Laptop, Category::Refurbished).with_image("");
        let err = g.replace("2", &card).unwrap_err();
        assert!(matches!(
            err,
            GalleryError::Validation(ref v) if v == &[ValidationError::MissingExistingImage]
        ));
    }

    #[test]
    fn next_id_follows_highest() {
        let site = setup_site();
        assert_eq!(gallery(site.path()).next_id().unwrap(), "3");
    }

    #[test]
    fn colon_label_is_rejected_before_writing() {
        let site = setup_site();
        let g = gallery(site.path());
        let card = sample_card("3", CardType::Laptop, Category::New)
            .with_specs([Spec::new("Ports: USB-C", "2")]);

        let err = g.insert(&card).unwrap_err();
        assert!(matches!(
            err,
            GalleryError::Validation(ref v)
                if v == &[ValidationError::SpecLabelWithColon("Ports: USB-C".into())]
        ));
        assert!(matches!(g.find("3"), Err(GalleryError::Document(DocumentError::NotFound(_)))));
    }

    #[test]
    fn half_filled_spec_is_not_written() {
        let site = setup_site();
        let g = gallery(site.path());
        let gpu_mentions = || fs::read_to_string(g.document_path()).unwrap().matches("GPU").count();
        let before = gpu_mentions();
        let card = sample_card("3", CardType::Laptop, Category::New)
            .with_specs([Spec::new("GPU", ""), Spec::new("CPU", "i7")]);
        g.insert(&card).unwrap();

        assert_eq!(gpu_mentions(), before);
        let stored = g.find("3").unwrap();
        assert_eq!(stored.specs[0], Spec::new("CPU", "i7"));
        assert_eq!(stored, card.normalized());
    }

    #[test]
    fn stored_card_reads_back_equal_after_whitespace_collapse() {
        let site = setup_site();
        let g = gallery(site.path());
        let mut card = sample_card("3", CardType::Laptop, Category::New);
        card.title = "X1  Pro".into();
        card.specs[0] = Spec::new("CPU", "i7\t vPro");
        g.insert(&card).unwrap();

        let stored = g.find("3").unwrap();
        assert_eq!(stored.title, "X1 Pro");
        assert_eq!(stored, card.normalized());

        card.title = " X1   Carbon ".into();
        g.replace("3", &card).unwrap();
        assert_eq!(g.find("3").unwrap().title, "X1 Carbon");
    }

    #[test]
    fn remove_image_deletes_file_inside_root() {
        let site = setup_site();
        let g = gallery(site.path());
        fs::create_dir_all(g.asset_dir()).unwrap();
        let image = g.asset_dir().join("desktop-1.jpg");
        fs::write(&image, b"jpeg").unwrap();

        let card = g.find("1").unwrap();
        assert_eq!(g.remove_image(&card).unwrap(), Some(site.path().join("./assets/gallery/desktop-1.jpg")));
        assert!(!image.exists());
        // Second call: already gone
        assert_eq!(g.remove_image(&card).unwrap(), None);
    }

    #[test]
    fn remove_image_refuses_escaping_paths() {
        let site = setup_site();
        let g = gallery(site.path());
        let card = sample_card("9", CardType::Laptop, Category::New).with_image("../../etc/passwd");
        assert!(matches!(
            g.remove_image(&card),
            Err(GalleryError::UnsafeAssetPath(_))
        ));
    }
}
