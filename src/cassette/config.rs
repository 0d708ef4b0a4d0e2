//! Which cassette feeds which port during replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Per-port cassette paths. A port without a cassette panics if it is
/// called during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Cassette for the filesystem port.
    pub fs: Option<PathBuf>,
    /// Cassette for the dataset catalog port.
    pub catalog: Option<PathBuf>,
}

/// Loaded replayers, one per configured port.
#[derive(Debug)]
pub struct PortReplayers {
    /// Replayer for the filesystem port.
    pub fs: Option<CassetteReplayer>,
    /// Replayer for the dataset catalog port.
    pub catalog: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// A config with no cassettes: every port call panics.
    #[must_use]
    pub fn panic_on_unspecified() -> Self {
        Self::default()
    }

    /// Uses the `fs.cassette.yaml` and `catalog.cassette.yaml` files a
    /// recording session wrote into `dir`, when present.
    #[must_use]
    pub fn from_session_dir(dir: &Path) -> Self {
        let existing = |port: &str| {
            let path = dir.join(format!("{port}.cassette.yaml"));
            path.is_file().then_some(path)
        };
        Self { fs: existing("fs"), catalog: existing("catalog") }
    }

    /// Loads one cassette file into a replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cassette(path: &Path) -> Result<CassetteReplayer, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
        Ok(CassetteReplayer::new(&cassette))
    }

    /// Loads every configured cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        Ok(PortReplayers {
            fs: self.fs.as_deref().map(Self::load_cassette).transpose()?,
            catalog: self.catalog.as_deref().map(Self::load_cassette).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Interaction;
    use chrono::Utc;
    use serde_json::json;

    fn write_cassette(path: &Path, port: &str, method: &str, output: serde_json::Value) {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            tool_version: "0.1.0".into(),
            interactions: vec![Interaction {
                seq: 0,
                port: port.into(),
                method: method.into(),
                input: json!({}),
                output,
            }],
        };
        std::fs::write(path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    }

    #[test]
    fn no_cassettes_load_to_no_replayers() {
        let replayers = CassetteConfig::panic_on_unspecified().load_all().unwrap();
        assert!(replayers.fs.is_none());
        assert!(replayers.catalog.is_none());
    }

    #[test]
    fn session_dir_picks_up_present_ports_only() {
        let dir = tempfile::tempdir().unwrap();
        write_cassette(&dir.path().join("fs.cassette.yaml"), "fs", "exists", json!(true));

        let config = CassetteConfig::from_session_dir(dir.path());
        assert!(config.fs.is_some());
        assert!(config.catalog.is_none());

        let mut replayers = config.load_all().unwrap();
        let fs = replayers.fs.as_mut().unwrap();
        assert_eq!(fs.next_interaction("fs", "exists").output, json!(true));
    }

    #[test]
    fn unreadable_cassette_is_an_error() {
        let config = CassetteConfig {
            catalog: Some("/nonexistent/catalog.cassette.yaml".into()),
            ..CassetteConfig::default()
        };
        let err = config.load_all().unwrap_err();
        assert!(err.contains("Failed to read cassette file"));
    }
}
