//! Core library for the `maplink` CLI: mirror a raster dataset from one
//! GIS workspace into another with links instead of copies, and remove
//! such mirrors safely.

pub mod adapters;
pub mod cassette;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod logging;
pub mod ports;
pub mod report;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or the run fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    logging::init(cli.verbose, cli.quiet);
    commands::dispatch(&cli)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_without_input() {
        let result = run(["maplink", "--mapset", "PERMANENT"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_errors_on_unknown_flag() {
        let result = run(["maplink", "--input", "a", "--mapset", "b", "--bogus"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_links_into_a_temporary_database() {
        let dir = tempfile::tempdir().unwrap();
        let cell = dir.path().join("nc/PERMANENT/cell");
        std::fs::create_dir_all(&cell).unwrap();
        std::fs::write(cell.join("elevation"), b"raster").unwrap();
        let db = dir.path().display().to_string();

        let result = run([
            "maplink",
            "--input",
            "elevation",
            "--mapset",
            "PERMANENT",
            "--gisdbase",
            db.as_str(),
            "--location",
            "nc",
            "--target-mapset",
            "user1",
            "-q",
        ]);
        assert!(result.is_ok(), "{result:?}");
        assert!(dir.path().join("nc/user1/cell/elevation").is_file());
    }
}
