//! Drives a whole run: resolve the two workspaces, walk the element
//! catalog, link or evaluate each element, then dispose of the collected
//! unlink candidates.

use std::path::{Path, PathBuf};

use crate::catalog::{self, Element};
use crate::engine::link::{
    is_valid_suffix, with_suffix, LinkKind, LinkOutcome, LinkRequest, Linker, Status,
};
use crate::engine::marker;
use crate::engine::unlink::{
    apply_unlink, evaluate_directory_for_unlink, evaluate_for_unlink, Disposition,
    UnlinkCandidate, UnlinkDecision,
};
use crate::error::{MapLinkError, Result};
use crate::ports::{DatasetCatalog, FileSystem};
use crate::report::{Event, RunReport};

/// Link or unlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Mirror the dataset into the destination workspace.
    Link {
        /// Flavour of the links to create.
        kind: LinkKind,
    },
    /// Remove a previous mirror.
    Unlink {
        /// Actually remove; otherwise only preview.
        force: bool,
    },
}

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Dataset name, optionally qualified as `name@workspace`.
    pub dataset: String,
    /// Workspace holding the original dataset.
    pub source_workspace: String,
    /// Workspace receiving (or holding) the mirror.
    pub destination_workspace: String,
    /// Suffix for mirrored names; required when both workspaces are the same.
    pub suffix: Option<String>,
    /// Link or unlink.
    pub mode: Mode,
    /// Report intentions without touching the filesystem.
    pub dry_run: bool,
}

/// Source and destination layout of one dataset.
struct Layout {
    name: String,
    source_root: PathBuf,
    destination_root: PathBuf,
    suffix: Option<String>,
}

impl Layout {
    fn source(&self, element: Element) -> PathBuf {
        self.source_root.join(element.name).join(&self.name)
    }

    /// Destination before the suffix is applied.
    fn destination(&self, element: Element) -> PathBuf {
        self.destination_root.join(element.name).join(&self.name)
    }
}

fn resolve(catalog: &dyn DatasetCatalog, invocation: &Invocation) -> Result<Layout> {
    if let Some(suffix) = invocation.suffix.as_deref().filter(|s| !is_valid_suffix(s)) {
        return Err(MapLinkError::InvalidSuffix { suffix: suffix.to_string() });
    }
    let located = catalog.locate(&invocation.dataset, &invocation.source_workspace);
    if !located.found {
        return Err(MapLinkError::DatasetNotFound {
            dataset: invocation.dataset.clone(),
            workspace: invocation.source_workspace.clone(),
        });
    }
    let name = located.canonical_name;
    let source_root = catalog.workspace_root(&name, &invocation.source_workspace);
    let destination_root = catalog.workspace_root(&name, &invocation.destination_workspace);
    let suffix = invocation.suffix.clone().filter(|s| !s.is_empty());

    if source_root == destination_root && suffix.is_none() {
        return Err(MapLinkError::SuffixRequired {
            workspace: invocation.destination_workspace.clone(),
            path: source_root.join(catalog::CELL.name).join(&name),
        });
    }
    Ok(Layout { name, source_root, destination_root, suffix })
}

/// Runs one invocation to completion.
///
/// The first fatal error aborts the run; informational outcomes are
/// collected in the returned report.
///
/// # Errors
///
/// Returns [`MapLinkError`] for an invalid suffix, an unknown dataset, a
/// missing required element, a cross-volume hardlink or any filesystem
/// failure.
pub fn run(
    fs: &dyn FileSystem,
    catalog: &dyn DatasetCatalog,
    invocation: &Invocation,
) -> Result<RunReport> {
    let layout = resolve(catalog, invocation)?;
    if invocation.dry_run {
        tracing::info!(" >>> Dry run: show intentions, yet do nothing!");
    }
    tracing::info!(
        "{} {} from mapset {} into mapset {}",
        match invocation.mode {
            Mode::Link { .. } => "Linking",
            Mode::Unlink { .. } => "Unlinking",
        },
        layout.name,
        invocation.source_workspace,
        invocation.destination_workspace
    );

    let mut events = Vec::new();
    let unlink = match invocation.mode {
        Mode::Link { kind } => {
            if kind != LinkKind::Hard {
                tracing::info!("Creating symbolic links instead of hard links");
            }
            let mut linker = Linker::new(fs);
            for element in catalog::elements() {
                let dry_run = invocation.dry_run;
                link_element(fs, &mut linker, &layout, *element, kind, dry_run, &mut events)?;
            }
            Disposition::NotRequested
        }
        Mode::Unlink { force } => {
            let mut candidates = Vec::new();
            for element in catalog::elements() {
                candidates = evaluate_element(fs, &layout, *element, candidates, &mut events)?;
            }
            apply_unlink(fs, candidates, force && !invocation.dry_run)?
        }
    };

    Ok(RunReport {
        dataset: layout.name,
        source_workspace: invocation.source_workspace.clone(),
        destination_workspace: invocation.destination_workspace.clone(),
        dry_run: invocation.dry_run,
        events,
        unlink,
    })
}

/// Checks an element's source; `Ok(false)` means an optional element is absent.
fn source_present(
    fs: &dyn FileSystem,
    element: Element,
    source: &Path,
    events: &mut Vec<Event>,
) -> Result<bool> {
    if fs.is_file(source) {
        return Ok(true);
    }
    if element.required {
        return Err(MapLinkError::SourceMissing { path: source.to_path_buf() });
    }
    tracing::debug!("Element '{element}' does not exist for this map; skipping");
    events.push(Event::AbsentInSource {
        element: element.name.to_string(),
        path: source.to_path_buf(),
    });
    Ok(false)
}

fn record_link(
    events: &mut Vec<Event>,
    element: Element,
    label: &str,
    source: PathBuf,
    outcome: LinkOutcome,
    kind: LinkKind,
) {
    if let Some(path) = outcome.created_dir {
        events.push(Event::DirectoryCreated { path });
    }
    match outcome.status {
        Status::Created => events.push(Event::LinkCreated { source, link: outcome.link, kind }),
        Status::AlreadyExists => {
            tracing::warn!("{label} '{}' already exists", outcome.link.display());
            events.push(Event::AlreadyExists {
                element: element.name.to_string(),
                path: outcome.link,
            });
        }
    }
}

/// Every auxiliary file under a source container, as (source, relative path).
fn auxiliary_files<'a>(
    fs: &'a dyn FileSystem,
    container: &'a Path,
) -> Result<impl Iterator<Item = Result<(PathBuf, PathBuf)>> + 'a> {
    let walk = if fs.is_dir(container) {
        Some(
            fs.walk_files(container)
                .map_err(|e| MapLinkError::system("Failed to scan", container, e))?,
        )
    } else {
        None
    };
    Ok(walk.into_iter().flatten().filter_map(move |entry| {
        let path = match entry {
            Ok(path) => path,
            Err(e) => return Some(Err(MapLinkError::system("Failed to scan", container, e))),
        };
        if marker::is_marker(&path) {
            return None;
        }
        let relative = path.strip_prefix(container).ok()?.to_path_buf();
        Some(Ok((path, relative)))
    }))
}

/// Only regular files inside a container are mirrored. Symbolic links
/// (dangling or not) and other entries are reported and left alone.
fn is_linkable(
    fs: &dyn FileSystem,
    element: Element,
    path: &Path,
    events: &mut Vec<Event>,
) -> bool {
    if !fs.is_symlink(path) && fs.is_file(path) {
        return true;
    }
    tracing::info!("'{}' is not a regular file; not linking it", path.display());
    events.push(Event::NotRegularFile {
        element: element.name.to_string(),
        path: path.to_path_buf(),
    });
    false
}

fn link_element(
    fs: &dyn FileSystem,
    linker: &mut Linker<'_>,
    layout: &Layout,
    element: Element,
    kind: LinkKind,
    dry_run: bool,
    events: &mut Vec<Event>,
) -> Result<()> {
    let source = layout.source(element);
    if !catalog::is_container(element) {
        if !source_present(fs, element, &source, events)? {
            return Ok(());
        }
        let request = LinkRequest {
            source: source.clone(),
            destination: layout.destination(element),
            suffix: layout.suffix.clone(),
            kind,
            dry_run,
        };
        let outcome = linker.create_link(&request)?;
        record_link(events, element, "Element", source, outcome, kind);
        return Ok(());
    }

    let container = with_suffix(&layout.destination(element), layout.suffix.as_deref());
    match linker.create_container(&container, dry_run)? {
        Status::Created => events.push(Event::ContainerCreated { path: container.clone() }),
        Status::AlreadyExists => {
            tracing::warn!("Sub-element '{}' already exists", container.display());
            events.push(Event::AlreadyExists {
                element: element.name.to_string(),
                path: container.clone(),
            });
        }
    }
    for entry in auxiliary_files(fs, &source)? {
        let (aux_source, relative) = entry?;
        if !is_linkable(fs, element, &aux_source, events) {
            continue;
        }
        let request = LinkRequest {
            source: aux_source.clone(),
            destination: container.join(relative),
            suffix: None,
            kind,
            dry_run,
        };
        let outcome = linker.create_link(&request)?;
        record_link(events, element, "Meta-element", aux_source, outcome, kind);
    }
    Ok(())
}

fn collect(
    decision: UnlinkDecision,
    mut candidates: Vec<UnlinkCandidate>,
    events: &mut Vec<Event>,
) -> Vec<UnlinkCandidate> {
    match decision {
        UnlinkDecision::Candidate(candidate) => candidates.push(candidate),
        UnlinkDecision::Skip { path, reason } => events.push(Event::Kept { path, reason }),
    }
    candidates
}

fn evaluate_element(
    fs: &dyn FileSystem,
    layout: &Layout,
    element: Element,
    mut candidates: Vec<UnlinkCandidate>,
    events: &mut Vec<Event>,
) -> Result<Vec<UnlinkCandidate>> {
    let source = layout.source(element);
    if !catalog::is_container(element) {
        if source_present(fs, element, &source, events)? {
            let link = with_suffix(&layout.destination(element), layout.suffix.as_deref());
            candidates = collect(evaluate_for_unlink(fs, &source, &link)?, candidates, events);
        }
        return Ok(candidates);
    }

    let container = with_suffix(&layout.destination(element), layout.suffix.as_deref());
    if fs.exists(&container) {
        candidates = collect(evaluate_directory_for_unlink(fs, &container)?, candidates, events);
    }
    for entry in auxiliary_files(fs, &source)? {
        let (aux_source, relative) = entry?;
        if !is_linkable(fs, element, &aux_source, events) {
            continue;
        }
        let decision = evaluate_for_unlink(fs, &aux_source, &container.join(relative))?;
        candidates = collect(decision, candidates, events);
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::ports::Located;

    struct FakeCatalog;

    impl DatasetCatalog for FakeCatalog {
        fn locate(&self, dataset: &str, workspace: &str) -> Located {
            Located {
                found: dataset == "elevation" && workspace == "A",
                canonical_name: dataset.to_string(),
            }
        }

        fn workspace_root(&self, _dataset: &str, workspace: &str) -> PathBuf {
            Path::new("/db/nc").join(workspace)
        }
    }

    fn invocation(mode: Mode) -> Invocation {
        Invocation {
            dataset: "elevation".into(),
            source_workspace: "A".into(),
            destination_workspace: "B".into(),
            suffix: None,
            mode,
            dry_run: false,
        }
    }

    const LINK: Mode = Mode::Link { kind: LinkKind::Hard };

    fn workspace_a() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_file("/db/nc/A/cell/elevation")
            .with_file("/db/nc/A/cellhd/elevation")
            .with_file("/db/nc/A/cell_misc/elevation/range")
            .with_file("/db/nc/A/cell_misc/elevation/stats/histogram")
            .with_dir("/db/nc/B")
    }

    #[test]
    fn links_every_present_element() {
        let fs = workspace_a();
        let report = run(&fs, &FakeCatalog, &invocation(LINK)).unwrap();

        assert_eq!(report.links_created(), 4);
        assert!(fs.is_file(Path::new("/db/nc/B/cell/elevation")));
        assert!(fs.is_file(Path::new("/db/nc/B/cell_misc/elevation/stats/histogram")));
        assert!(fs.is_file(Path::new("/db/nc/B/cell_misc/elevation/maplink.owned")));
        assert!(report.events.contains(&Event::AbsentInSource {
            element: "colr".into(),
            path: "/db/nc/A/colr/elevation".into(),
        }));
        assert_eq!(report.unlink, Disposition::NotRequested);
    }

    #[test]
    fn unknown_dataset_aborts_before_mutation() {
        let fs = workspace_a();
        let before = fs.listing();
        let mut inv = invocation(LINK);
        inv.dataset = "slope".into();

        let err = run(&fs, &FakeCatalog, &inv).unwrap_err();
        assert!(matches!(err, MapLinkError::DatasetNotFound { .. }));
        assert_eq!(fs.listing(), before);
    }

    #[test]
    fn same_workspace_requires_suffix() {
        let fs = workspace_a();
        let mut inv = invocation(LINK);
        inv.destination_workspace = "A".into();
        assert!(matches!(
            run(&fs, &FakeCatalog, &inv).unwrap_err(),
            MapLinkError::SuffixRequired { .. }
        ));

        inv.suffix = Some("mirror".into());
        let report = run(&fs, &FakeCatalog, &inv).unwrap();
        assert_eq!(report.links_created(), 4);
        assert!(fs.is_file(Path::new("/db/nc/A/cell/elevation_mirror")));
        assert!(fs.is_file(Path::new("/db/nc/A/cell_misc/elevation_mirror/range")));
    }

    #[test]
    fn second_link_run_only_reports_existing() {
        let fs = workspace_a();
        run(&fs, &FakeCatalog, &invocation(LINK)).unwrap();
        let after_first = fs.listing();

        let report = run(&fs, &FakeCatalog, &invocation(LINK)).unwrap();
        assert_eq!(fs.listing(), after_first);
        assert_eq!(report.links_created(), 0);
        assert_eq!(report.directories_created(), 0);
        assert!(report
            .events
            .iter()
            .all(|e| matches!(e, Event::AlreadyExists { .. } | Event::AbsentInSource { .. })));
    }

    #[test]
    fn dry_run_matches_real_run_without_mutation() {
        let dry_fs = workspace_a();
        let before = dry_fs.listing();
        let mut inv = invocation(LINK);
        inv.dry_run = true;
        let preview = run(&dry_fs, &FakeCatalog, &inv).unwrap();
        assert_eq!(dry_fs.listing(), before);

        let real_fs = workspace_a();
        let real = run(&real_fs, &FakeCatalog, &invocation(LINK)).unwrap();
        assert_eq!(preview.events, real.events);
    }

    #[test]
    fn unlink_candidates_do_not_depend_on_force() {
        let fs = workspace_a();
        run(&fs, &FakeCatalog, &invocation(LINK)).unwrap();
        let linked = fs.listing();

        let preview = run(&fs, &FakeCatalog, &invocation(Mode::Unlink { force: false })).unwrap();
        assert_eq!(fs.listing(), linked);
        let Disposition::Preview { candidates, .. } = preview.unlink else {
            panic!("expected preview");
        };

        let forced = run(&fs, &FakeCatalog, &invocation(Mode::Unlink { force: true })).unwrap();
        let Disposition::Removed { removed, covered } = forced.unlink else {
            panic!("expected removal");
        };
        let mut forced_paths: Vec<_> = removed.iter().map(|c| c.path.clone()).collect();
        forced_paths.extend(covered);
        let mut preview_paths: Vec<_> = candidates.iter().map(|c| c.path.clone()).collect();
        forced_paths.sort();
        preview_paths.sort();
        assert_eq!(forced_paths, preview_paths);

        assert!(!fs.exists(Path::new("/db/nc/B/cell/elevation")));
        assert!(!fs.exists(Path::new("/db/nc/B/cell_misc/elevation")));
        assert_eq!(fs.identity(Path::new("/db/nc/A/cell/elevation")).unwrap().link_count, 1);
    }

    #[test]
    fn dry_run_unlink_never_removes() {
        let fs = workspace_a();
        run(&fs, &FakeCatalog, &invocation(LINK)).unwrap();
        let linked = fs.listing();
        let mut inv = invocation(Mode::Unlink { force: true });
        inv.dry_run = true;

        let report = run(&fs, &FakeCatalog, &inv).unwrap();
        assert!(matches!(report.unlink, Disposition::Preview { .. }));
        assert_eq!(fs.listing(), linked);
    }

    #[test]
    fn unlink_with_nothing_linked_is_empty() {
        let fs = workspace_a();
        let report = run(&fs, &FakeCatalog, &invocation(Mode::Unlink { force: true })).unwrap();
        assert_eq!(report.unlink, Disposition::NothingToUnlink);
    }

    #[test]
    fn missing_required_element_is_fatal() {
        let fs = MemoryFileSystem::new().with_dir("/db/nc/A/cell").with_dir("/db/nc/B");
        struct AlwaysFound;
        impl DatasetCatalog for AlwaysFound {
            fn locate(&self, dataset: &str, _workspace: &str) -> Located {
                Located { found: true, canonical_name: dataset.to_string() }
            }
            fn workspace_root(&self, _dataset: &str, workspace: &str) -> PathBuf {
                Path::new("/db/nc").join(workspace)
            }
        }

        let err = run(&fs, &AlwaysFound, &invocation(LINK)).unwrap_err();
        assert!(matches!(err, MapLinkError::SourceMissing { .. }));
    }

    fn workspace_a_with_symlinks() -> MemoryFileSystem {
        let fs = workspace_a().with_dir("/db/nc/A/cell_misc/other");
        let container = Path::new("/db/nc/A/cell_misc/elevation");
        fs.symlink(Path::new("/db/nc/gone"), &container.join("zz_dangling")).unwrap();
        fs.symlink(Path::new("/db/nc/A/cell_misc/other"), &container.join("dir")).unwrap();
        fs
    }

    #[test]
    fn symlinks_in_container_are_skipped() {
        let fs = workspace_a_with_symlinks();
        let report = run(&fs, &FakeCatalog, &invocation(LINK)).unwrap();

        assert_eq!(report.links_created(), 4);
        assert!(fs.is_file(Path::new("/db/nc/B/cell_misc/elevation/range")));
        assert!(!fs.exists(Path::new("/db/nc/B/cell_misc/elevation/zz_dangling")));
        assert!(!fs.exists(Path::new("/db/nc/B/cell_misc/elevation/dir")));
        assert!(report.events.contains(&Event::NotRegularFile {
            element: "cell_misc".into(),
            path: "/db/nc/A/cell_misc/elevation/zz_dangling".into(),
        }));
        assert!(report.events.contains(&Event::NotRegularFile {
            element: "cell_misc".into(),
            path: "/db/nc/A/cell_misc/elevation/dir".into(),
        }));
    }

    #[test]
    fn symlinks_in_container_do_not_block_unlink() {
        let fs = workspace_a_with_symlinks();
        run(&fs, &FakeCatalog, &invocation(LINK)).unwrap();

        let report = run(&fs, &FakeCatalog, &invocation(Mode::Unlink { force: true })).unwrap();
        assert!(matches!(report.unlink, Disposition::Removed { .. }));
        assert!(!fs.exists(Path::new("/db/nc/B/cell_misc/elevation")));
        assert!(fs.is_symlink(Path::new("/db/nc/A/cell_misc/elevation/zz_dangling")));
    }

    #[test]
    fn suffix_with_path_separator_is_rejected() {
        let fs = workspace_a();
        let before = fs.listing();
        for suffix in ["../escape", "a/b", ".."] {
            let mut inv = invocation(LINK);
            inv.suffix = Some(suffix.into());
            assert!(matches!(
                run(&fs, &FakeCatalog, &inv).unwrap_err(),
                MapLinkError::InvalidSuffix { .. }
            ));
        }
        assert_eq!(fs.listing(), before);
    }
}
