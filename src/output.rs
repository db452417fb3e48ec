//! CLI output formatting for every subcommand.
//!
//! # Card-First Display
//!
//! The primary line for a card is its position and title, with the id, type
//! and badge alongside. Price, image and specs follow as indented context
//! lines, so `list` reads like the storefront and still lets the operator
//! find the id to pass to `edit` or `delete`.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! Cards (2)
//! 001 Gaming Tower [#1 desktop, Custom Build]
//!     Price: $1,499
//!     Image: ./assets/gallery/desktop-1.jpg
//!     CPU: Ryzen 7 7800X3D
//! 002 ThinkPad T14 [#2 laptop, Refurbished]
//!     ...
//! ```
//!
//! ## Mutations
//!
//! ```text
//! Added card 3 (3 cards)
//!     Backup: backups/index_20251110_093000.html
//! ```
//!
//! ## Publish
//!
//! ```text
//! Branch: feature-x
//! [1/8] Adding index.html
//!     git add index.html
//!     ok
//! [3/8] Creating commit
//!     git commit -m "Update gallery via Gallery Manager"
//!     nothing to do
//! ...
//! Published feature-x
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure and do no I/O.

use crate::backup::BackupEntry;
use crate::card::Card;
use crate::publish::{GitStatus, PublishEvent, PublishReport, StepResult, StepStatus};
use crate::store::{BackupOutcome, Mutation, MutationReport};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Path relative to `root` when possible, for shorter lines.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() { "(none)" } else { value }
}

/// `001 Gaming Tower [#1 desktop, Custom Build]`
fn card_header(index: usize, card: &Card) -> String {
    let title = if card.title.is_empty() {
        "(untitled)"
    } else {
        card.title.as_str()
    };
    let mut tags = format!("#{}", card.id);
    if !card.card_type.is_empty() {
        tags.push(' ');
        tags.push_str(&card.card_type);
    }
    if !card.badge_text.is_empty() {
        tags.push_str(", ");
        tags.push_str(&card.badge_text);
    }
    format!("{} {} [{}]", format_index(index), title, tags)
}

fn card_context(card: &Card, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    let mut lines = vec![
        format!("{pad}Price: {}", or_placeholder(&card.price)),
        format!("{pad}Image: {}", or_placeholder(&card.image_path)),
    ];
    lines.extend(
        card.populated_specs()
            .map(|spec| format!("{pad}{}: {}", spec.label, spec.value)),
    );
    lines
}

// ============================================================================
// Cards
// ============================================================================

/// Format the `list` output.
pub fn format_card_list(cards: &[Card]) -> Vec<String> {
    if cards.is_empty() {
        return vec!["No cards".to_string()];
    }
    let mut lines = vec![format!("Cards ({})", cards.len())];
    for (i, card) in cards.iter().enumerate() {
        lines.push(card_header(i + 1, card));
        lines.extend(card_context(card, 1));
    }
    lines
}

pub fn print_card_list(cards: &[Card]) {
    print_lines(format_card_list(cards));
}

/// Format the `show` output: every field, including empty spec slots.
pub fn format_card_detail(card: &Card) -> Vec<String> {
    let mut lines = vec![
        format!("Card {}", card.id),
        format!("{}Title: {}", indent(1), or_placeholder(&card.title)),
        format!("{}Type: {}", indent(1), or_placeholder(&card.card_type)),
        format!(
            "{}Category: {} ({})",
            indent(1),
            or_placeholder(&card.category),
            or_placeholder(&card.badge_text)
        ),
        format!("{}Price: {}", indent(1), or_placeholder(&card.price)),
        format!("{}Image: {}", indent(1), or_placeholder(&card.image_path)),
        format!("{}Specs", indent(1)),
    ];
    for (i, spec) in card.specs.iter().enumerate() {
        let text = if spec.is_empty() {
            "(empty)".to_string()
        } else {
            format!("{}: {}", spec.label, spec.value)
        };
        lines.push(format!("{}{} {}", indent(2), i + 1, text));
    }
    lines
}

pub fn print_card_detail(card: &Card) {
    print_lines(format_card_detail(card));
}

// ============================================================================
// Mutations and backups
// ============================================================================

/// Format the result of add/edit/delete.
pub fn format_mutation_report(report: &MutationReport, root: &Path) -> Vec<String> {
    let verb = match report.mutation {
        Mutation::Inserted => "Added",
        Mutation::Replaced => "Updated",
        Mutation::Deleted => "Deleted",
    };
    let noun = if report.card_count == 1 { "card" } else { "cards" };
    let backup = match &report.backup {
        BackupOutcome::Created(path) => format!("Backup: {}", display_path(path, root)),
        BackupOutcome::Failed(reason) => format!("Backup FAILED: {reason}"),
    };
    vec![
        format!(
            "{verb} card {} ({} {noun})",
            report.card_id, report.card_count
        ),
        format!("{}{backup}", indent(1)),
    ]
}

pub fn print_mutation_report(report: &MutationReport, root: &Path) {
    print_lines(format_mutation_report(report, root));
}

/// Format the `backups` output, newest first.
pub fn format_backups(entries: &[BackupEntry], root: &Path) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No backups".to_string()];
    }
    let mut lines = vec![format!("Backups ({})", entries.len())];
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "{} {}",
            format_index(i + 1),
            entry.taken_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push(format!("{}{}", indent(1), display_path(&entry.path, root)));
    }
    lines
}

pub fn print_backups(entries: &[BackupEntry], root: &Path) {
    print_lines(format_backups(entries, root));
}

// ============================================================================
// Publishing
// ============================================================================

fn status_word(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Succeeded => "ok",
        StepStatus::NothingToDo => "nothing to do",
        StepStatus::Failed => "FAILED",
    }
}

fn step_outcome(result: &StepResult) -> Vec<String> {
    let mut lines = vec![format!("{}{}", indent(1), status_word(result.status))];
    if result.status == StepStatus::Failed {
        let text = if result.stderr.trim().is_empty() {
            &result.stdout
        } else {
            &result.stderr
        };
        lines.extend(
            text.lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| format!("{}{}", indent(2), l.trim_end())),
        );
    }
    lines
}

/// Format one progress event from the publish worker.
pub fn format_publish_event(event: &PublishEvent) -> Vec<String> {
    match event {
        PublishEvent::Branch(branch) => vec![format!("Branch: {branch}")],
        PublishEvent::StepStarted {
            index,
            total,
            description,
            command,
        } => vec![
            format!("[{}/{}] {}", index + 1, total, description),
            format!("{}{}", indent(1), command),
        ],
        PublishEvent::StepFinished(result) => step_outcome(result),
        PublishEvent::Finished { .. } => Vec::new(),
    }
}

pub fn print_publish_event(event: &PublishEvent) {
    print_lines(format_publish_event(event));
}

/// Format the closing summary of a publish run.
///
/// A failure after the commit step is called out, since the commit then
/// exists locally without having reached the remote.
pub fn format_publish_report(report: &PublishReport) -> Vec<String> {
    let branch = report.branch.as_deref().unwrap_or("(unknown branch)");
    let Some(error) = &report.error else {
        return vec![format!("Published {branch}")];
    };

    let mut lines = vec![format!("Publish failed: {error}")];
    let done: Vec<&StepResult> = report
        .steps
        .iter()
        .filter(|s| s.status != StepStatus::Failed)
        .collect();
    if !done.is_empty() {
        lines.push(format!(
            "{}Completed before the failure (not rolled back):",
            indent(1)
        ));
        lines.extend(
            done.iter()
                .map(|s| format!("{}{}", indent(2), s.description)),
        );
    }
    let committed = done
        .iter()
        .any(|s| s.description == "Creating commit" && s.status == StepStatus::Succeeded);
    if committed {
        lines.push(format!(
            "{}The commit exists locally; push it once the problem is fixed.",
            indent(1)
        ));
    }
    lines
}

pub fn print_publish_report(report: &PublishReport) {
    print_lines(format_publish_report(report));
}

/// Format the `status` output.
pub fn format_status(status: &GitStatus) -> Vec<String> {
    if status.is_clean() {
        return vec!["Working tree clean".to_string()];
    }
    let mut lines = vec![format!("Changes ({})", status.entries.len())];
    lines.extend(
        status
            .entries
            .iter()
            .map(|e| format!("{}{}", indent(1), e)),
    );
    lines
}

pub fn print_status(status: &GitStatus) {
    print_lines(format_status(status));
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}
