//! Live dataset catalog over a GIS database directory tree.

use std::path::PathBuf;

use crate::catalog::CELL;
use crate::ports::catalog::{DatasetCatalog, Located};

/// Resolves workspaces as `<database>/<location>/<workspace>`.
#[derive(Debug, Clone)]
pub struct GisDatabase {
    database: PathBuf,
    location: String,
}

impl GisDatabase {
    /// Creates a catalog for one location inside a GIS database.
    pub fn new(database: impl Into<PathBuf>, location: impl Into<String>) -> Self {
        Self { database: database.into(), location: location.into() }
    }
}

/// Splits `name@workspace` into its parts.
fn split_qualified(dataset: &str) -> (&str, Option<&str>) {
    match dataset.split_once('@') {
        Some((name, workspace)) => (name, Some(workspace)),
        None => (dataset, None),
    }
}

impl DatasetCatalog for GisDatabase {
    fn locate(&self, dataset: &str, workspace: &str) -> Located {
        let (name, qualifier) = split_qualified(dataset);
        let canonical_name = name.to_string();
        if name.is_empty() || qualifier.is_some_and(|q| q != workspace) {
            return Located { found: false, canonical_name };
        }
        let found = self.workspace_root(name, workspace).join(CELL.name).join(name).is_file();
        Located { found, canonical_name }
    }

    fn workspace_root(&self, _dataset: &str, workspace: &str) -> PathBuf {
        self.database.join(&self.location).join(workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_with(dataset: &str, workspace: &str) -> (tempfile::TempDir, GisDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let cell = dir.path().join("nc").join(workspace).join("cell");
        std::fs::create_dir_all(&cell).unwrap();
        std::fs::write(cell.join(dataset), "raster").unwrap();
        let catalog = GisDatabase::new(dir.path(), "nc");
        (dir, catalog)
    }

    #[test]
    fn locates_plain_and_qualified_names() {
        let (_dir, catalog) = database_with("elevation", "PERMANENT");
        assert_eq!(
            catalog.locate("elevation", "PERMANENT"),
            Located { found: true, canonical_name: "elevation".into() }
        );
        assert!(catalog.locate("elevation@PERMANENT", "PERMANENT").found);
    }

    #[test]
    fn qualifier_for_other_workspace_is_not_found() {
        let (_dir, catalog) = database_with("elevation", "PERMANENT");
        let located = catalog.locate("elevation@user1", "PERMANENT");
        assert!(!located.found);
        assert_eq!(located.canonical_name, "elevation");
    }

    #[test]
    fn missing_dataset_is_not_found() {
        let (_dir, catalog) = database_with("elevation", "PERMANENT");
        assert!(!catalog.locate("slope", "PERMANENT").found);
        assert!(!catalog.locate("", "PERMANENT").found);
    }

    #[test]
    fn workspace_root_joins_location_and_workspace() {
        let catalog = GisDatabase::new("/grassdata", "nc");
        assert_eq!(
            catalog.workspace_root("elevation", "user1"),
            PathBuf::from("/grassdata/nc/user1")
        );
    }
}
