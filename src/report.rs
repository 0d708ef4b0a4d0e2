//! What a run did, or would do, rendered for people or machines.

use std::fmt::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::engine::link::LinkKind;
use crate::engine::unlink::{Disposition, EntryKind, SkipReason};

/// One per-element observation, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// An element directory was (or would be) created.
    DirectoryCreated {
        /// The new directory.
        path: PathBuf,
    },
    /// A container directory was (or would be) created with its marker.
    ContainerCreated {
        /// The new directory.
        path: PathBuf,
    },
    /// A link was (or would be) created.
    LinkCreated {
        /// File linked to.
        source: PathBuf,
        /// The new link.
        link: PathBuf,
        /// Link flavour.
        kind: LinkKind,
    },
    /// The destination was already there and was left alone.
    AlreadyExists {
        /// Element the path belongs to.
        element: String,
        /// The existing path.
        path: PathBuf,
    },
    /// An optional element does not exist for this dataset.
    AbsentInSource {
        /// Element name.
        element: String,
        /// Where it was looked for.
        path: PathBuf,
    },
    /// A container entry that is not a regular file (a symbolic link,
    /// dangling or not) was skipped.
    NotRegularFile {
        /// Element the entry belongs to.
        element: String,
        /// The skipped entry in the source container.
        path: PathBuf,
    },
    /// A path was judged unsafe or unnecessary to remove.
    Kept {
        /// The evaluated path.
        path: PathBuf,
        /// Why it stays.
        #[serde(flatten)]
        reason: SkipReason,
    },
}

/// Full account of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Canonical dataset name.
    pub dataset: String,
    /// Workspace linked from.
    pub source_workspace: String,
    /// Workspace linked into.
    pub destination_workspace: String,
    /// Whether this was a preview.
    pub dry_run: bool,
    /// Per-element events.
    pub events: Vec<Event>,
    /// What happened to unlink candidates.
    pub unlink: Disposition,
}

impl RunReport {
    /// Number of links created.
    #[must_use]
    pub fn links_created(&self) -> usize {
        self.count(|e| matches!(e, Event::LinkCreated { .. }))
    }

    /// Number of element and container directories created.
    #[must_use]
    pub fn directories_created(&self) -> usize {
        self.count(|e| matches!(e, Event::DirectoryCreated { .. } | Event::ContainerCreated { .. }))
    }

    /// Number of warnings (destinations that already existed).
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.count(|e| matches!(e, Event::AlreadyExists { .. }))
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

/// Output format of the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// Human-readable lines.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::NoSuchLink => "no link to remove".to_string(),
        SkipReason::SoleCopy { inode } => format!("only hardlink for inode {inode}"),
        SkipReason::NotLinkedToSource => "not a hardlink of the source".to_string(),
        SkipReason::NoSuchDirectory => "no directory to remove".to_string(),
        SkipReason::Unmarked => "not created by maplink".to_string(),
        SkipReason::HoldsSoleCopy { path } => format!("holds sole copy {}", path.display()),
    }
}

/// Renders the report as human-readable text.
#[must_use]
pub fn format_text(report: &RunReport) -> String {
    let would = if report.dry_run { "WOULD " } else { "" };
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} from {} into {}{}",
        report.dataset,
        report.source_workspace,
        report.destination_workspace,
        if report.dry_run { " (dry run)" } else { "" }
    );

    for event in &report.events {
        let line = match event {
            Event::DirectoryCreated { path } => format!("  {would}CREATE DIR {}", path.display()),
            Event::ContainerCreated { path } => {
                format!("  {would}CREATE SUB-ELEMENT {}", path.display())
            }
            Event::LinkCreated { source, link, .. } => {
                format!("  {would}LINK {} -> {}", link.display(), source.display())
            }
            Event::AlreadyExists { element, path } => {
                format!("  EXISTS {element}: {}", path.display())
            }
            Event::AbsentInSource { element, .. } => format!("  ABSENT {element}"),
            Event::NotRegularFile { element, path } => {
                format!("  IGNORE {element}: {} (not a regular file)", path.display())
            }
            Event::Kept { path, reason } => {
                format!("  KEEP {} ({})", path.display(), describe_skip(reason))
            }
        };
        let _ = writeln!(out, "{line}");
    }

    match &report.unlink {
        Disposition::NotRequested => {
            let _ = writeln!(
                out,
                "{} link(s) created, {} director(ies) created, {} warning(s)",
                report.links_created(),
                report.directories_created(),
                report.warnings()
            );
        }
        Disposition::NothingToUnlink => {
            let _ = writeln!(out, "The list of raster map files to unlink is empty!");
        }
        Disposition::Preview { candidates, warning } => {
            let _ = writeln!(out, "The following links would be removed:");
            for candidate in candidates {
                let suffix = if candidate.kind == EntryKind::Directory { "/" } else { "" };
                let _ = writeln!(out, "  {}{suffix}", candidate.path.display());
            }
            let _ = writeln!(out, "{warning}");
        }
        Disposition::Removed { removed, covered } => {
            for candidate in removed {
                let _ = writeln!(out, "  REMOVED {}", candidate.path.display());
            }
            let _ = writeln!(
                out,
                "{} link(s) removed, {} removed along with their directory",
                removed.len(),
                covered.len()
            );
        }
    }
    out
}

/// Renders the report as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error string if serialization fails.
pub fn format_json(report: &RunReport) -> Result<String, String> {
    serde_json::to_string_pretty(report).map_err(|e| format!("Failed to serialize report: {e}"))
}
