//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::engine::link::is_valid_suffix;
use crate::report::Format;

/// Top-level CLI parser for `maplink`.
#[derive(Debug, Parser)]
#[command(
    name = "maplink",
    version,
    about = "Link raster maps existing in other mapsets",
    long_about = "Mirror a raster map from another mapset into the current one with hard \
                  (or symbolic) links instead of copies, and safely remove such mirrors later."
)]
pub struct Cli {
    /// Dry run: do not link, show only what would be linked.
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Create symbolic links instead of hard links.
    #[arg(short = 's', long = "symbolic", conflicts_with_all = ["unlink", "force"])]
    pub symbolic: bool,

    /// Make symbolic links relative to the link's directory.
    #[arg(short = 'r', long, requires = "symbolic")]
    pub relative: bool,

    /// Remove previously linked raster map files (preview unless --force).
    #[arg(short = 'u', long)]
    pub unlink: bool,

    /// Actually remove the files listed by --unlink.
    #[arg(short = 'f', long, requires = "unlink", conflicts_with = "dry_run")]
    pub force: bool,

    /// Input raster map to link to.
    #[arg(long, value_name = "NAME")]
    pub input: String,

    /// Mapset of the input raster map.
    #[arg(long, value_name = "MAPSET")]
    pub mapset: String,

    /// Suffix added after the input raster map name; required when linking
    /// within the input's own mapset.
    #[arg(long, value_name = "SUFFIX", value_parser = parse_suffix)]
    pub suffix: Option<String>,

    /// GIS database directory (default: $GISDBASE or the GISRC file).
    #[arg(long, value_name = "DIR")]
    pub gisdbase: Option<PathBuf>,

    /// Location inside the GIS database (default: $LOCATION_NAME or GISRC).
    #[arg(long, value_name = "NAME")]
    pub location: Option<String>,

    /// Mapset receiving the links (default: $MAPSET or GISRC).
    #[arg(long, value_name = "MAPSET")]
    pub target_mapset: Option<String>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Increase verbosity (show every link and directory intention).
    #[arg(short = 'v', long, action = ArgAction::SetTrue, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors.
    #[arg(short = 'q', long, action = ArgAction::SetTrue)]
    pub quiet: bool,
}

fn parse_suffix(value: &str) -> Result<String, String> {
    if is_valid_suffix(value) {
        Ok(value.to_string())
    } else {
        Err("must not contain path separators or '..'".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    const BASE: [&str; 5] = ["maplink", "--input", "elevation", "--mapset", "PERMANENT"];

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(BASE.iter().chain(extra))
    }

    #[test]
    fn parses_required_options() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.input, "elevation");
        assert_eq!(cli.mapset, "PERMANENT");
        assert!(!cli.dry_run && !cli.symbolic && !cli.unlink && !cli.force);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["maplink", "--mapset", "PERMANENT"]).is_err());
    }

    #[test]
    fn symbolic_excludes_unlink_and_force() {
        assert!(parse(&["-s", "-u"]).is_err());
        assert!(parse(&["-s", "-u", "-f"]).is_err());
    }

    #[test]
    fn force_requires_unlink() {
        assert!(parse(&["-f"]).is_err());
        assert!(parse(&["-u", "-f"]).is_ok());
    }

    #[test]
    fn force_excludes_dry_run() {
        assert!(parse(&["-u", "-f", "-d"]).is_err());
        assert!(parse(&["-u", "-d"]).is_ok());
    }

    #[test]
    fn relative_requires_symbolic() {
        assert!(parse(&["-r"]).is_err());
        assert!(parse(&["-s", "-r"]).is_ok());
    }

    #[test]
    fn suffix_stays_inside_the_element_directory() {
        assert_eq!(parse(&["--suffix", "copy"]).unwrap().suffix.as_deref(), Some("copy"));
        assert!(parse(&["--suffix", "../escape"]).is_err());
        assert!(parse(&["--suffix", "a/b"]).is_err());
        assert!(parse(&["--suffix", ".."]).is_err());
    }
}
