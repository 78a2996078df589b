use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ContextError;

/// Regular-weight Japanese fonts, macOS first and then the Linux package locations.
pub const REGULAR_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "/System/Library/Fonts/ヒラギノ角ゴシック W6.ttc",
    "/usr/share/fonts/opentype/ipafont-gothic/ipagp.ttf",
    "/usr/share/fonts/truetype/ipafont-gothic/ipagp.ttf",
];

pub const BOLD_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/ヒラギノ角ゴシック W6.ttc",
    "/usr/share/fonts/opentype/ipafont-gothic/ipagp.ttf",
    "/usr/share/fonts/truetype/ipafont-gothic/ipagp.ttf",
];

/// Ordered lists of font paths to try, overridable from the client configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FontCandidates {
    #[serde(default = "default_regular_candidates")]
    pub regular: Vec<PathBuf>,
    #[serde(default = "default_bold_candidates")]
    pub bold: Vec<PathBuf>,
}

impl Default for FontCandidates {
    fn default() -> Self {
        FontCandidates {
            regular: default_regular_candidates(),
            bold: default_bold_candidates(),
        }
    }
}

fn default_regular_candidates() -> Vec<PathBuf> {
    REGULAR_FONT_CANDIDATES.iter().map(PathBuf::from).collect()
}

fn default_bold_candidates() -> Vec<PathBuf> {
    BOLD_FONT_CANDIDATES.iter().map(PathBuf::from).collect()
}

/// The font files chosen for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFiles {
    pub regular: PathBuf,
    pub bold: PathBuf,
}

/// Returns the first candidate that exists on disk.
pub fn find_font<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|candidate| candidate.as_ref())
        .find(|candidate| candidate.exists())
        .map(Path::to_path_buf)
}

impl FontCandidates {
    /// Resolves the regular and bold fonts. A missing bold font falls back to the regular one,
    /// while a missing regular font is fatal.
    pub fn resolve(&self) -> Result<FontFiles, ContextError> {
        let regular = find_font(&self.regular).ok_or_else(|| {
            ContextError::with_context(format!(
                "No Japanese font found, install IPA Gothic or run on macOS (tried {:?})",
                self.regular
            ))
        })?;
        let bold = find_font(&self.bold).unwrap_or_else(|| {
            log::debug!("No bold font found, using {:?} for bold text", regular);
            regular.clone()
        });
        log::debug!("Using the fonts {:?} and {:?}", regular, bold);

        Ok(FontFiles { regular, bold })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_first_existing_candidate_wins() {
        let directory = tempfile::tempdir().unwrap();
        let missing = directory.path().join("missing.ttf");
        let first = directory.path().join("first.ttf");
        let second = directory.path().join("second.ttf");
        std::fs::write(&first, b"").unwrap();
        std::fs::write(&second, b"").unwrap();

        assert_eq!(
            find_font(&[missing.clone(), first.clone(), second]),
            Some(first)
        );
        assert_eq!(find_font(&[missing]), None);
    }

    #[test]
    fn bold_falls_back_to_regular() {
        let directory = tempfile::tempdir().unwrap();
        let regular = directory.path().join("regular.ttf");
        std::fs::write(&regular, b"").unwrap();

        let candidates = FontCandidates {
            regular: vec![regular.clone()],
            bold: vec![directory.path().join("bold.ttf")],
        };
        let files = candidates.resolve().unwrap();
        assert_eq!(files.regular, regular);
        assert_eq!(files.bold, regular);
    }

    #[test]
    fn missing_regular_font_is_fatal() {
        let candidates = FontCandidates {
            regular: vec![PathBuf::from("/nonexistent/font.ttf")],
            bold: vec![],
        };
        let error = candidates.resolve().unwrap_err();
        assert!(error.context.starts_with("No Japanese font found"));
    }
}
