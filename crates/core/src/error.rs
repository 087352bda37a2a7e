//! Error types for unity-ci
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type shared by the unity-ci crates
#[derive(Error, Debug)]
pub enum CiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Project error: {0}")]
    Project(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for unity-ci operations
pub type Result<T> = std::result::Result<T, CiError>;

impl CiError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CiError::Io(e) => format!("File operation failed: {}", e),
            CiError::Config(msg) => format!("Configuration error: {}", msg),
            CiError::Project(msg) => format!("Unity project issue: {}", msg),
            CiError::NotFound(msg) => format!("Not found: {}", msg),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let err = CiError::NotFound("ProjectSettings.asset".into());
        assert_eq!(err.user_message(), "Not found: ProjectSettings.asset");

        let err = CiError::Project("bad field".into());
        assert!(err.user_message().starts_with("Unity project issue"));
    }
}
