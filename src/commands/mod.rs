//! Command dispatch.

pub mod mirror;

use std::env;

use crate::cassette::session::RecordingSession;
use crate::cli::Cli;
use crate::config::{self, Overrides, Settings};
use crate::context::ServiceContext;

/// Resolves the GIS environment, wires the ports and runs the command.
///
/// When `MAPLINK_RECORD` names a directory, every port interaction is
/// recorded to per-port cassette files in that directory.
///
/// # Errors
///
/// Returns an error string if configuration fails, the run fails or the
/// recording cannot be written.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let settings = Settings::resolve(Overrides {
        database: cli.gisdbase.clone(),
        location: cli.location.clone(),
        current_workspace: cli.target_mapset.clone(),
    })
    .map_err(|e| e.to_string())?;

    let (ctx, session) = match env::var(config::RECORD) {
        Ok(dir) if !dir.is_empty() => {
            let (ctx, session) = ServiceContext::recording_at(dir, &settings)?;
            (ctx, Some(session))
        }
        _ => (ServiceContext::live(&settings), None),
    };

    let result = mirror::run(&ctx, cli, &settings);

    // Finish recording even when the run failed.
    if let Some(session) = session {
        drop(ctx);
        finish_recording(session)?;
    }

    let output = result?;
    print!("{output}");
    Ok(())
}

fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    tracing::info!("Recording saved to: {}", output_dir.display());
    Ok(())
}
