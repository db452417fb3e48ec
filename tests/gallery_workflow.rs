//! End-to-end card workflows against a copy of the fixture site.

use gallery_manager::backup::list_backups;
use gallery_manager::card::{Card, CardType, Category, SPEC_SLOTS, Spec};
use gallery_manager::config::{ManagerConfig, load_config};
use gallery_manager::document::{DocumentError, parse_cards};
use gallery_manager::imaging::{RustBackend, import_card_image};
use gallery_manager::store::{Gallery, GalleryError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site/index.html");
    fs::copy(fixture, tmp.path().join("index.html")).unwrap();
    tmp
}

fn ids(cards: &[Card]) -> Vec<String> {
    cards.iter().map(|c| c.id.clone()).collect()
}

#[test]
fn insert_third_card_scenario() {
    let site = site();
    let gallery = Gallery::new(site.path(), ManagerConfig::default());

    let card = Card::new("3", CardType::Laptop, Category::New)
        .with_title("X1")
        .with_price("$999")
        .with_image("./assets/gallery/laptop-3.jpg")
        .with_specs([Spec::new("CPU", "i7")]);
    gallery.insert(&card).unwrap();

    let cards = gallery.load().unwrap();
    assert_eq!(ids(&cards), ["1", "2", "3"]);

    let third = &cards[2];
    assert_eq!(third.badge_text, "New");
    assert_eq!(third.title, "X1");
    assert_eq!(third.specs.len(), SPEC_SLOTS);
    assert_eq!(third.specs[0], Spec::new("CPU", "i7"));
    assert!(third.specs[1..].iter().all(Spec::is_empty));
}

#[test]
fn untouched_markup_survives_every_mutation() {
    let site = site();
    let gallery = Gallery::new(site.path(), ManagerConfig::default());

    let mut card = gallery.find("2").unwrap();
    card.price = "$499".into();
    gallery.replace("2", &card).unwrap();
    gallery.delete("1").unwrap();

    let html = fs::read_to_string(gallery.document_path()).unwrap();
    assert!(html.contains("Computer Store"));
    assert!(html.contains(r#"id="contact""#));
    assert!(html.contains(r#"data-filter="laptop""#));
    assert!(html.contains("./script.js"));

    let cards = parse_cards(&html, "gallery-grid").unwrap();
    assert_eq!(ids(&cards), ["2"]);
    assert_eq!(cards[0].price, "$499");
}

#[test]
fn every_mutation_leaves_a_backup() {
    let site = site();
    let gallery = Gallery::new(site.path(), ManagerConfig::default());
    let original = fs::read_to_string(gallery.document_path()).unwrap();

    gallery.delete("2").unwrap();

    let backups = list_backups(&gallery.document_path(), &gallery.backup_dir()).unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), original);
}

#[test]
fn replace_missing_card_is_not_found() {
    let site = site();
    let gallery = Gallery::new(site.path(), ManagerConfig::default());
    let card = gallery.find("1").unwrap();

    let err = gallery.replace("77", &card).unwrap_err();
    assert!(matches!(err, GalleryError::Document(DocumentError::NotFound(id)) if id == "77"));
}

#[test]
fn config_file_moves_document_and_container() {
    let site = site();
    let html = fs::read_to_string(site.path().join("index.html"))
        .unwrap()
        .replace(r#"id="gallery-grid""#, r#"id="products""#);
    fs::write(site.path().join("shop.html"), html).unwrap();
    fs::write(
        site.path().join("gallery.toml"),
        "document = \"shop.html\"\ncontainer_id = \"products\"\n",
    )
    .unwrap();

    let config = load_config(site.path(), None).unwrap();
    let gallery = Gallery::new(site.path(), config);
    assert_eq!(ids(&gallery.load().unwrap()), ["1", "2"]);
}

#[test]
fn imported_image_backs_a_new_card() {
    let site = site();
    let gallery = Gallery::new(site.path(), ManagerConfig::default());

    let source = site.path().join("photo.png");
    image::RgbImage::from_pixel(1600, 1200, image::Rgb([40, 90, 160]))
        .save(&source)
        .unwrap();

    let id = gallery.next_id().unwrap();
    let image_path = import_card_image(
        &RustBackend::new(),
        &source,
        gallery.root(),
        &gallery.config().assets,
        CardType::Desktop,
        &id,
    )
    .unwrap();
    assert_eq!(image_path, "./assets/gallery/desktop-3.jpg");

    let written = image::open(gallery.asset_dir().join("desktop-3.jpg")).unwrap();
    assert_eq!((written.width(), written.height()), (1200, 900));

    let card = Card::new(id, CardType::Desktop, Category::Refurbished)
        .with_title("Office Mini")
        .with_price("$299")
        .with_image(image_path)
        .with_specs([Spec::new("CPU", "i5-8500T")]);
    gallery.insert(&card).unwrap();

    let stored = gallery.find("3").unwrap();
    assert_eq!(stored.image_path, "./assets/gallery/desktop-3.jpg");

    assert!(gallery.remove_image(&stored).unwrap().is_some());
    assert!(!gallery.asset_dir().join("desktop-3.jpg").exists());
}
