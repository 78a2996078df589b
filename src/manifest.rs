use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::read_json_file;
use crate::error::ContextError;
use crate::pagination::ContentBlock;

/// What a serial issue contains beyond the fixed pages.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueManifest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    /// Publication date as `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    /// Replaces the inaugural sections when present.
    #[serde(default)]
    pub sections: Vec<ManifestSection>,
    #[serde(default)]
    pub essays: Vec<ContentBlock>,
    /// PDF files inserted before the back cover, relative to the manifest's directory.
    #[serde(default)]
    pub supplements: Vec<PathBuf>,
    #[serde(default)]
    pub next_issue_preview: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSection {
    pub heading: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

impl IssueManifest {
    /// Reads the manifest. A missing file is fatal; relative supplement paths are resolved against
    /// the manifest's directory.
    pub fn from_path(manifest_file_path: &Path) -> Result<Self, ContextError> {
        if !manifest_file_path.exists() {
            return Err(ContextError::with_context(format!(
                "Manifest not found: {}",
                manifest_file_path.display()
            )));
        }
        let mut manifest: IssueManifest = read_json_file(manifest_file_path, "manifest")?;

        let manifest_directory = manifest_file_path.parent().unwrap_or(Path::new(""));
        for supplement in manifest.supplements.iter_mut() {
            if supplement.is_relative() {
                *supplement = manifest_directory.join(&*supplement);
            }
        }

        Ok(manifest)
    }
}

/// Input of a QR special issue.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QrMaterials {
    pub serial: u32,
    pub volume: u32,
    pub number: u32,
    #[serde(default)]
    pub series_name: String,
    #[serde(default)]
    pub title: String,
    /// Absolute URLs, or paths below the QR base URL.
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl QrMaterials {
    pub fn from_path(materials_file_path: &Path) -> Result<Self, ContextError> {
        read_json_file(materials_file_path, "materials")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manifest_is_reported_by_path() {
        let error = IssueManifest::from_path(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert_eq!(error.context, "Manifest not found: /nonexistent/manifest.json");
    }

    #[test]
    fn supplements_are_resolved_next_to_the_manifest() {
        let directory = tempfile::tempdir().unwrap();
        let manifest_path = directory.path().join("2026-02.json");
        std::fs::write(
            &manifest_path,
            r#"{
                "title": "第2号",
                "essays": [
                    { "title": "声の記録", "body": "一段落目\n二段落目" },
                    { "title": "リンク付き", "body": "本文", "link": "https://tokistorage.github.io/lp/" }
                ],
                "supplements": ["customers/TQ-00001.pdf", "/absolute/TQ-00002.pdf"]
            }"#,
        )
        .unwrap();

        let manifest = IssueManifest::from_path(&manifest_path).unwrap();
        assert_eq!(manifest.title.as_deref(), Some("第2号"));
        assert_eq!(manifest.essays.len(), 2);
        assert_eq!(manifest.essays[0].link, None);
        assert_eq!(
            manifest.supplements,
            [
                directory.path().join("customers/TQ-00001.pdf"),
                PathBuf::from("/absolute/TQ-00002.pdf"),
            ]
        );
        assert!(manifest.sections.is_empty());
    }

    #[test]
    fn materials_require_the_numbering_keys() {
        let materials: QrMaterials = serde_json::from_str(
            r#"{ "serial": 12, "volume": 1, "number": 3, "seriesName": "Voices", "urls": ["abc"] }"#,
        )
        .unwrap();
        assert_eq!(materials.series_name, "Voices");
        assert_eq!(materials.title, "");
        assert_eq!(materials.date, None);

        let missing_serial = serde_json::from_str::<QrMaterials>(r#"{ "volume": 1, "number": 3 }"#);
        assert!(missing_serial.is_err());
    }
}
