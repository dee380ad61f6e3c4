//! Pre-flight checks before expensive operations.
//!
//! Validates that the API key and input file are available before starting
//! a session that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{PagewiseError, Result};
use std::path::Path;

/// Find the API key: the `--api-key` flag wins over the configured variable.
pub fn resolve_api_key(flag: Option<&str>, settings: &Settings) -> Result<String> {
    let var = &settings.provider.api_key_env;
    let key = match flag {
        Some(key) => key.to_string(),
        None => std::env::var(var).unwrap_or_default(),
    };

    if key.trim().is_empty() {
        return Err(PagewiseError::Config(format!(
            "No API key found. Pass --api-key or set it with: export {}='...'",
            var
        )));
    }
    Ok(key)
}

/// Check that the document exists and is a regular file.
pub fn check_document(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PagewiseError::InvalidInput(format!(
            "File not found: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(PagewiseError::InvalidInput(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins() {
        let key = resolve_api_key(Some("from-flag"), &Settings::default()).unwrap();
        assert_eq!(key, "from-flag");
    }

    #[test]
    fn test_missing_key_names_variable() {
        let mut settings = Settings::default();
        settings.provider.api_key_env = "PAGEWISE_TEST_KEY_THAT_IS_NOT_SET".to_string();

        match resolve_api_key(None, &settings) {
            Err(PagewiseError::Config(msg)) => {
                assert!(msg.contains("PAGEWISE_TEST_KEY_THAT_IS_NOT_SET"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_check_document() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello").unwrap();

        assert!(check_document(&file).is_ok());
        assert!(check_document(dir.path()).is_err());
        assert!(check_document(&dir.path().join("missing.pdf")).is_err());
    }
}
