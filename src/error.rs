use std::path::Path;

use serde::{Deserialize, Serialize};

/// A struct that represents an error with a context and possibly the propagated source error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContextError {
    pub context: String,
    pub source_error: Option<String>,
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_error {
            Some(source_error) => write!(
                formatter,
                "{}: {}",
                self.context,
                minimize_first_letter(source_error.to_string()),
            ),
            None => write!(formatter, "{}", self.context),
        }
    }
}

impl std::error::Error for ContextError {}

impl ContextError {
    /// Create a new `ContextError` with the given context.
    pub fn with_context<S: Into<String>>(context: S) -> ContextError {
        ContextError {
            context: context.into(),
            source_error: None,
        }
    }

    /// Create a new `ContextError` with the given context and source error.
    pub fn with_error<S: Into<String>>(context: S, error: &dyn std::error::Error) -> ContextError {
        ContextError {
            context: context.into(),
            source_error: Some(error.to_string()),
        }
    }

    /// Create a new `ContextError` about the file at the given path, which is appended to the context.
    pub fn with_path_error(
        context: &str,
        path: &Path,
        error: &dyn std::error::Error,
    ) -> ContextError {
        ContextError::with_error(format!("{} {:?}", context, path), error)
    }
}

/// Minimizes the first letter of a string, it is used for standardizing the error message.
fn minimize_first_letter(string: String) -> String {
    let mut characters = string.chars();
    match characters.next() {
        None => String::new(),
        Some(character) => character.to_lowercase().chain(characters).collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::ContextError;

    #[test]
    fn display_joins_context_and_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file");
        let error = ContextError::with_error("Failed to read the manifest", &source);
        assert_eq!(
            error.to_string(),
            "Failed to read the manifest: no such file"
        );
    }

    #[test]
    fn path_errors_name_the_file() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "Missing");
        let error =
            ContextError::with_path_error("Failed to read the font", Path::new("a.ttf"), &source);
        assert_eq!(error.context, "Failed to read the font \"a.ttf\"");
        assert_eq!(error.to_string(), "Failed to read the font \"a.ttf\": missing");
    }

    #[test]
    fn display_without_source_is_the_context() {
        let error = ContextError::with_context("No usable font was found");
        assert_eq!(error.to_string(), "No usable font was found");
        assert!(error.source_error.is_none());
    }
}
