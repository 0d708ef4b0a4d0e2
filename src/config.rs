//! Resolution of the GIS environment: database, location and the mapset
//! receiving the links.
//!
//! Each setting comes from the first source that has it: command-line
//! option, environment variable, then the GISRC file. A `.env` file in the
//! working directory is loaded into the environment first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::MapLinkError;

/// Environment variable naming the GIS database directory.
pub const GISDBASE: &str = "GISDBASE";
/// Environment variable naming the location.
pub const LOCATION_NAME: &str = "LOCATION_NAME";
/// Environment variable naming the current mapset.
pub const MAPSET: &str = "MAPSET";
/// Environment variable pointing at the GISRC file.
pub const GISRC: &str = "GISRC";
/// Environment variable enabling cassette recording into a directory.
pub const RECORD: &str = "MAPLINK_RECORD";

/// Fully resolved GIS environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// GIS database directory.
    pub database: PathBuf,
    /// Location inside the database.
    pub location: String,
    /// Mapset receiving the links.
    pub current_workspace: String,
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--gisdbase`.
    pub database: Option<PathBuf>,
    /// `--location`.
    pub location: Option<String>,
    /// `--target-mapset`.
    pub current_workspace: Option<String>,
}

/// Parses a GISRC file: one `KEY: value` pair per line.
///
/// # Errors
///
/// Returns [`MapLinkError::Config`] if the file cannot be read or parsed.
pub fn read_gisrc(path: &Path) -> Result<BTreeMap<String, String>, MapLinkError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        MapLinkError::Config(format!("Failed to read GISRC file {}: {e}", path.display()))
    })?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(&contents).map_err(|e| {
        MapLinkError::Config(format!("Failed to parse GISRC file {}: {e}", path.display()))
    })?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key, value))
        })
        .collect())
}

impl Settings {
    /// Resolves settings from overrides and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`MapLinkError::Config`] if a setting is missing everywhere or
    /// the GISRC file is unreadable.
    pub fn resolve(overrides: Overrides) -> Result<Self, MapLinkError> {
        let _ = dotenvy::dotenv();
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolves settings with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// See [`Settings::resolve`].
    pub fn resolve_with(
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, MapLinkError> {
        let gisrc = match env(GISRC).filter(|p| !p.is_empty()) {
            Some(path) => read_gisrc(Path::new(&path))?,
            None => BTreeMap::new(),
        };
        let lookup = |key: &str| {
            env(key).filter(|v| !v.is_empty()).or_else(|| gisrc.get(key).cloned())
        };
        let missing = |key: &str, flag: &str| {
            MapLinkError::Config(format!("{key} is not set (use {flag}, the environment or GISRC)"))
        };

        let database = overrides
            .database
            .or_else(|| lookup(GISDBASE).map(PathBuf::from))
            .ok_or_else(|| missing(GISDBASE, "--gisdbase"))?;
        let location = overrides
            .location
            .or_else(|| lookup(LOCATION_NAME))
            .ok_or_else(|| missing(LOCATION_NAME, "--location"))?;
        let current_workspace = overrides
            .current_workspace
            .or_else(|| lookup(MAPSET))
            .ok_or_else(|| missing(MAPSET, "--target-mapset"))?;

        tracing::debug!(
            database = %database.display(),
            %location,
            mapset = %current_workspace,
            "resolved GIS environment"
        );
        Ok(Self { database, location, current_workspace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn environment_supplies_every_setting() {
        let env = env_from(&[(GISDBASE, "/grassdata"), (LOCATION_NAME, "nc"), (MAPSET, "user1")]);
        let settings = Settings::resolve_with(Overrides::default(), env).unwrap();
        assert_eq!(
            settings,
            Settings {
                database: "/grassdata".into(),
                location: "nc".into(),
                current_workspace: "user1".into(),
            }
        );
    }

    #[test]
    fn overrides_win_over_environment() {
        let env = env_from(&[(GISDBASE, "/grassdata"), (LOCATION_NAME, "nc"), (MAPSET, "user1")]);
        let overrides =
            Overrides { current_workspace: Some("scratch".into()), ..Overrides::default() };
        let settings = Settings::resolve_with(overrides, env).unwrap();
        assert_eq!(settings.current_workspace, "scratch");
        assert_eq!(settings.location, "nc");
    }

    #[test]
    fn gisrc_fills_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join("rc");
        std::fs::write(
            &rc,
            "GISDBASE: /data/grass\nLOCATION_NAME: utm\nMAPSET: PERMANENT\nGRASS_DB_ENCODING: 8\n",
        )
        .unwrap();
        let rc_path = rc.display().to_string();
        let env = env_from(&[(GISRC, rc_path.as_str()), (MAPSET, "user1")]);

        let settings = Settings::resolve_with(Overrides::default(), env).unwrap();
        assert_eq!(settings.database, PathBuf::from("/data/grass"));
        assert_eq!(settings.location, "utm");
        assert_eq!(settings.current_workspace, "user1");
    }

    #[test]
    fn missing_setting_is_a_config_error() {
        let env = env_from(&[(GISDBASE, "/grassdata")]);
        let err = Settings::resolve_with(Overrides::default(), env).unwrap_err();
        assert!(err.to_string().contains(LOCATION_NAME));
    }

    #[test]
    fn unreadable_gisrc_is_reported() {
        let env = env_from(&[(GISRC, "/nonexistent/maplink/rc")]);
        let err = Settings::resolve_with(Overrides::default(), env).unwrap_err();
        assert!(err.to_string().contains("GISRC"));
    }
}
