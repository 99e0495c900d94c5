use std::path::{Path, PathBuf};

use serde::Serialize;

const EXPORT_MARKER: &str = " Slack export ";

/// Display names for an ingested export, derived from the bundle file name.
///
/// Exports are conventionally named `"<Workspace> Slack export <dates>.zip"`;
/// other names fall back to the name without its extension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportInfo {
    pub readable_path: PathBuf,
    pub basename: String,
    pub stripped_name: String,
    pub workspace_name: String,
}

impl ExportInfo {
    pub fn from_source(source: &Path, readable_path: impl Into<PathBuf>) -> Self {
        let basename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stripped_name = Path::new(&basename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let workspace_name = stripped_name
            .split_once(EXPORT_MARKER)
            .map_or_else(|| stripped_name.clone(), |(name, _)| name.to_string());

        Self {
            readable_path: readable_path.into(),
            basename,
            stripped_name,
            workspace_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventional_name() {
        let info = ExportInfo::from_source(
            Path::new("/downloads/My Friends and Family Slack export Jul 21 2018 - Sep 06 2018.zip"),
            "/cache/abc",
        );
        assert_eq!(
            info.basename,
            "My Friends and Family Slack export Jul 21 2018 - Sep 06 2018.zip"
        );
        assert_eq!(
            info.stripped_name,
            "My Friends and Family Slack export Jul 21 2018 - Sep 06 2018"
        );
        assert_eq!(info.workspace_name, "My Friends and Family");
        assert_eq!(info.readable_path, PathBuf::from("/cache/abc"));
    }

    #[test]
    fn unconventional_name_falls_back() {
        let info = ExportInfo::from_source(Path::new("backup.zip"), "/cache/abc");
        assert_eq!(info.stripped_name, "backup");
        assert_eq!(info.workspace_name, "backup");
    }

    #[test]
    fn directory_source() {
        let info = ExportInfo::from_source(Path::new("/exports/Acme Slack export 2020"), "/exports/Acme Slack export 2020");
        assert_eq!(info.workspace_name, "Acme");
    }
}
