use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::content::{self, palette};
use crate::error::ContextError;
use crate::fonts::FontCandidates;
use crate::pdf::Color;

/// Per-client overrides for the generated issues.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default)]
    pub branding: Branding,
    #[serde(default)]
    pub colophon: ColophonFields,
    #[serde(default)]
    pub fonts: FontCandidates,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    #[serde(default)]
    pub accent_color: Option<Color>,
    #[serde(default)]
    pub publication_name_ja: Option<String>,
}

/// Colophon values shown instead of the publisher defaults. Empty strings hide a row.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColophonFields {
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub content_originator: Option<String>,
    #[serde(default)]
    pub publisher_address: Option<String>,
    #[serde(default)]
    pub legal_basis: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ClientConfig {
    pub fn from_path(client_config_file_path: &Path) -> Result<Self, ContextError> {
        read_json_file(client_config_file_path, "client configuration")
    }

    pub fn accent_color(&self) -> Color {
        self.branding.accent_color.unwrap_or(palette::TOKI_BLUE)
    }

    /// The Japanese publication name, or `default` when the branding leaves it out.
    pub fn publication_name_ja(&self, default: &str) -> String {
        self.branding
            .publication_name_ja
            .clone()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn publisher(&self) -> String {
        self.colophon
            .publisher
            .clone()
            .unwrap_or_else(|| content::PUBLISHER.to_string())
    }

    pub fn legal_basis(&self) -> String {
        self.colophon
            .legal_basis
            .clone()
            .unwrap_or_else(|| content::LEGAL_BASIS.to_string())
    }
}

/// Reads and deserializes a JSON file, naming `description` in the errors.
pub(crate) fn read_json_file<T: DeserializeOwned>(
    file_path: &Path,
    description: &str,
) -> Result<T, ContextError> {
    let file_contents = std::fs::read_to_string(file_path).map_err(|error| {
        ContextError::with_path_error(
            &format!("Failed to read the {} file", description),
            file_path,
            &error,
        )
    })?;
    let parsed = serde_json::from_str(&file_contents).map_err(|error| {
        ContextError::with_path_error(
            &format!("Failed to parse the {} file", description),
            file_path,
            &error,
        )
    })?;
    log::debug!("Loaded the {} from {:?}", description, file_path);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_every_default() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.accent_color(), palette::TOKI_BLUE);
        assert_eq!(config.publisher(), "TokiStorage（佐藤卓也）");
        assert_eq!(config.publication_name_ja("Voices ニュースレター"), "Voices ニュースレター");
        assert!(!config.fonts.regular.is_empty());
    }

    #[test]
    fn camel_case_keys_and_color_arrays() {
        let config: ClientConfig = serde_json::from_str(
            r#"{
                "branding": { "accentColor": [22, 163, 74], "publicationNameJa": "みらい通信" },
                "colophon": { "contentOriginator": "みらい合同会社", "publisherAddress": "", "note": "非売品" },
                "fonts": { "regular": ["/fonts/a.ttf"] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.accent_color(), palette::EMERALD);
        assert_eq!(config.publication_name_ja("unused"), "みらい通信");
        assert_eq!(
            config.colophon.content_originator.as_deref(),
            Some("みらい合同会社")
        );
        assert_eq!(config.colophon.publisher_address.as_deref(), Some(""));
        assert_eq!(config.fonts.regular, [std::path::PathBuf::from("/fonts/a.ttf")]);
        assert_eq!(config.fonts, FontCandidates {
            regular: vec!["/fonts/a.ttf".into()],
            ..FontCandidates::default()
        });
    }

    #[test]
    fn unreadable_and_malformed_files_are_reported() {
        let directory = tempfile::tempdir().unwrap();
        let missing = ClientConfig::from_path(&directory.path().join("missing.json")).unwrap_err();
        assert!(missing.context.starts_with("Failed to read the client configuration file"));

        let malformed_path = directory.path().join("malformed.json");
        std::fs::write(&malformed_path, "{ \"branding\": ").unwrap();
        let malformed = ClientConfig::from_path(&malformed_path).unwrap_err();
        assert!(malformed.context.starts_with("Failed to parse the client configuration file"));
        assert!(malformed.source_error.is_some());
    }
}
