//! The one `maplink` command: link a dataset into a workspace, or unlink it.

use crate::cli::Cli;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::engine::{self, Invocation, LinkKind, Mode};
use crate::report::{self, Format};

/// Link flavour selected by the flags.
#[must_use]
pub fn link_kind(cli: &Cli) -> LinkKind {
    match (cli.symbolic, cli.relative) {
        (true, true) => LinkKind::RelativeSymbolic,
        (true, false) => LinkKind::Symbolic,
        (false, _) => LinkKind::Hard,
    }
}

/// Translates parsed flags into an engine invocation.
#[must_use]
pub fn invocation(cli: &Cli, settings: &Settings) -> Invocation {
    let mode = if cli.unlink {
        Mode::Unlink { force: cli.force }
    } else {
        Mode::Link { kind: link_kind(cli) }
    };
    Invocation {
        dataset: cli.input.clone(),
        source_workspace: cli.mapset.clone(),
        destination_workspace: settings.current_workspace.clone(),
        suffix: cli.suffix.clone(),
        mode,
        dry_run: cli.dry_run,
    }
}

/// Runs the command against `ctx` and returns the rendered report.
///
/// # Errors
///
/// Returns the error message of a fatal run failure, or a report
/// serialization failure.
pub fn run(ctx: &ServiceContext, cli: &Cli, settings: &Settings) -> Result<String, String> {
    let invocation = invocation(cli, settings);
    let report = engine::run(ctx.fs.as_ref(), ctx.catalog.as_ref(), &invocation)
        .map_err(|e| e.to_string())?;
    match cli.format {
        Format::Text => Ok(report::format_text(&report)),
        Format::Json => report::format_json(&report),
    }
}
