//! エラー型定義
//!
//! Errors raised by the pure layer (normalization, matching, alias tables).

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("no candidate options to match \"{target}\" against")]
    NoCandidates { target: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_no_candidates() {
        let error = Error::NoCandidates { target: "Asphalt".to_string() };
        let display = format!("{}", error);
        assert!(display.contains("no candidate options"));
        assert!(display.contains("Asphalt"));
    }

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_display_config() {
        let error = Error::Config("alias file is not an object".to_string());
        assert_eq!(format!("{}", error), "Config error: alias file is not an object");
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
