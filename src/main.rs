use clap::{Args, Parser, Subcommand};
use gallery_manager::card::{Card, CardType, Category, Spec, ValidationError};
use gallery_manager::imaging::{RustBackend, import_card_image};
use gallery_manager::publish::{self, DuctRunner, PublishGate, Publisher};
use gallery_manager::store::{Gallery, GalleryError};
use gallery_manager::{backup, config, logging, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gallery-manager")]
#[command(about = "Manage the product gallery of a static storefront page")]
#[command(long_about = "\
Manage the product gallery of a static storefront page

The page is the database. Each product is a card inside the gallery
container (id \"gallery-grid\" by default); everything else in the page is
left alone.

Site layout:

  site/
  ├── gallery.toml          # Optional settings (see 'gen-config')
  ├── index.html            # Page holding the gallery
  ├── assets/gallery/       # Imported card images: <type>-<id>.jpg
  └── backups/              # index_<YYYYMMDD_HHMMSS>.html, one per change

Card types and categories:
  desktop: custom (\"Custom Build\"), refurbished (\"Refurbished\")
  laptop:  new (\"New\"), refurbished (\"Refurbished\")

Every change snapshots the page first. 'publish' commits the page and images
and pushes them; from a branch other than main it also merges into main.")]
#[command(version)]
struct Cli {
    /// Site root (the directory holding the page)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/gallery.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Card fields shared by `add` and `edit`.
#[derive(Args, Clone, Default)]
struct CardFields {
    /// Category (desktop: custom|refurbished, laptop: new|refurbished)
    #[arg(long)]
    category: Option<Category>,

    /// Display name
    #[arg(long)]
    title: Option<String>,

    /// Price, starting with $
    #[arg(long)]
    price: Option<String>,

    /// Spec line "Label: value"; repeat up to 4 times, in display order
    #[arg(long = "spec", value_name = "LABEL: VALUE")]
    specs: Vec<Spec>,

    /// Picture to import into the asset directory
    #[arg(long, value_name = "FILE", conflicts_with = "image_path")]
    image: Option<PathBuf>,

    /// Use an image already on the site, as written in the page
    #[arg(long, value_name = "PATH")]
    image_path: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List cards in display order
    List {
        /// Only cards of this type
        #[arg(long = "type")]
        card_type: Option<CardType>,
        /// Only cards in this category
        #[arg(long)]
        category: Option<Category>,
        /// Print cards as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show every field of one card
    Show { id: String },
    /// Add a card at the end of the gallery
    Add {
        /// desktop or laptop
        #[arg(long = "type")]
        card_type: CardType,
        /// Card id (default: next free number)
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        fields: CardFields,
    },
    /// Change a card in place
    Edit {
        id: String,
        /// desktop or laptop
        #[arg(long = "type")]
        card_type: Option<CardType>,
        #[command(flatten)]
        fields: CardFields,
    },
    /// Remove a card
    Delete {
        id: String,
        /// Also delete the card's image file
        #[arg(long)]
        with_image: bool,
    },
    /// Print the id the next added card would get
    NextId,
    /// Snapshot the page now
    Backup,
    /// List page snapshots, newest first
    Backups,
    /// Show uncommitted changes in the site repository
    Status,
    /// Commit and push the page and images
    Publish,
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let settings = config::load_config(&cli.root, cli.config.as_deref())?;
    let gallery = Gallery::new(&cli.root, settings);

    match cli.command {
        Command::List {
            card_type,
            category,
            json,
        } => {
            let cards: Vec<Card> = gallery
                .load()?
                .into_iter()
                .filter(|c| c.matches(card_type, category))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
            } else {
                output::print_card_list(&cards);
            }
        }
        Command::Show { id } => {
            output::print_card_detail(&gallery.find(&id)?);
        }
        Command::Add {
            card_type,
            id,
            fields,
        } => {
            let id = match id {
                Some(id) => id,
                None => gallery.next_id()?,
            };
            let category = fields
                .category
                .unwrap_or_else(|| card_type.default_category());
            let card = Card::new(id, card_type, category);
            let card = apply_fields(&gallery, card, &fields, false)?;
            let report = gallery.insert(&card)?;
            output::print_mutation_report(&report, gallery.root());
        }
        Command::Edit {
            id,
            card_type,
            fields,
        } => {
            let mut card = gallery.find(&id)?;
            if let Some(new_type) = card_type {
                card.card_type = new_type.to_string();
                let legal = card
                    .parsed_category()
                    .is_some_and(|c| c.is_legal_for(new_type));
                if !legal && fields.category.is_none() {
                    card.set_category(new_type.default_category());
                }
            }
            let card = apply_fields(&gallery, card, &fields, true)?;
            let report = gallery.replace(&id, &card)?;
            output::print_mutation_report(&report, gallery.root());
        }
        Command::Delete { id, with_image } => {
            let card = gallery.find(&id)?;
            if with_image {
                // Refuse an unsafe image path before the card is gone.
                gallery.image_file(&card)?;
            }
            let report = gallery.delete(&id)?;
            output::print_mutation_report(&report, gallery.root());
            if with_image {
                match gallery.remove_image(&card)? {
                    Some(path) => println!("Removed image {}", path.display()),
                    None => println!("No image file to remove"),
                }
            }
        }
        Command::NextId => {
            println!("{}", gallery.next_id()?);
        }
        Command::Backup => {
            let path = gallery.snapshot()?;
            println!("Backup: {}", path.display());
        }
        Command::Backups => {
            let entries = backup::list_backups(&gallery.document_path(), &gallery.backup_dir())?;
            output::print_backups(&entries, gallery.root());
        }
        Command::Status => {
            let status = Publisher::for_gallery(DuctRunner, &gallery).status()?;
            output::print_status(&status);
        }
        Command::Publish => {
            let gate = PublishGate::new();
            let publisher = Publisher::for_gallery(DuctRunner, &gallery);
            let handle = publish::worker::spawn(publisher, &gate)?;
            for event in handle.events() {
                output::print_publish_event(&event);
            }
            let report = handle.join()?;
            output::print_publish_report(&report);
            if let Some(error) = report.error {
                return Err(error.into());
            }
        }
        Command::GenConfig => unreachable!("handled before loading config"),
    }

    Ok(())
}

/// Overlay the given fields on `card`, importing a picture if one was passed.
///
/// The card is checked before the import so a rejected card never leaves an
/// image behind in the asset directory.
fn apply_fields(
    gallery: &Gallery,
    mut card: Card,
    fields: &CardFields,
    existing: bool,
) -> Result<Card, Box<dyn std::error::Error>> {
    if let Some(category) = fields.category {
        card.set_category(category);
    }
    if let Some(title) = &fields.title {
        card.title = title.clone();
    }
    if let Some(price) = &fields.price {
        card.price = price.clone();
    }
    if !fields.specs.is_empty() {
        card.set_specs(fields.specs.iter().cloned());
    }
    if let Some(path) = &fields.image_path {
        card.image_path = path.clone();
    }

    let Some(source) = &fields.image else {
        return Ok(card);
    };

    let errors: Vec<ValidationError> = card
        .validate_for_save(existing)
        .into_iter()
        .filter(|e| {
            !matches!(
                e,
                ValidationError::MissingImage | ValidationError::MissingExistingImage
            )
        })
        .collect();
    if !errors.is_empty() {
        return Err(GalleryError::Validation(errors).into());
    }

    let card_type = card
        .kind()
        .ok_or_else(|| GalleryError::Validation(vec![ValidationError::UnknownType(
            card.card_type.clone(),
        )]))?;
    card.image_path = import_card_image(
        &RustBackend::new(),
        source,
        gallery.root(),
        &gallery.config().assets,
        card_type,
        &card.id,
    )?;
    Ok(card)
}

