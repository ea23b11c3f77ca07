use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    Missing,
    ReadFile,
    JsonMalformed,
    InvalidValue,
}

#[derive(Debug, Clone)]
pub struct ContentLoadError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub json_path: Option<String>,
}

impl ContentLoadError {
    pub fn invalid_value(
        file_path: &Path,
        json_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: ContentErrorCode::InvalidValue,
            message: message.into(),
            file_path: file_path.to_path_buf(),
            json_path: Some(json_path.into()),
        }
    }
}

impl fmt::Display for ContentLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.json_path {
            Some(json_path) => write!(
                f,
                "{:?}: {} (file={}, at={})",
                self.code,
                self.message,
                self.file_path.display(),
                json_path
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentLoadError {}

pub fn load_json_document<T: DeserializeOwned>(path: &Path) -> Result<T, ContentLoadError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        let code = if error.kind() == io::ErrorKind::NotFound {
            ContentErrorCode::Missing
        } else {
            ContentErrorCode::ReadFile
        };
        ContentLoadError {
            code,
            message: error.to_string(),
            file_path: path.to_path_buf(),
            json_path: None,
        }
    })?;
    parse_json_document(&raw, path)
}

/// Parses `raw` as the content of `path`, reporting the JSON path of the first mismatch.
pub fn parse_json_document<T: DeserializeOwned>(
    raw: &str,
    path: &Path,
) -> Result<T, ContentLoadError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        let source = error.into_inner();
        ContentLoadError {
            code: ContentErrorCode::JsonMalformed,
            message: source.to_string(),
            file_path: path.to_path_buf(),
            json_path: (!json_path.is_empty() && json_path != ".").then_some(json_path),
        }
    })
}

/// Loads `path`, degrading to `T::default()` when the file is absent or invalid.
pub fn load_json_document_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json_document(path) {
        Ok(document) => document,
        Err(error) if error.code == ContentErrorCode::Missing => {
            warn!(path = %path.display(), "content_file_missing_using_default");
            T::default()
        }
        Err(error) => {
            error!(error = %error, "content_file_invalid_using_default");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;
    use tempfile::TempDir;

    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Doc {
        name: String,
        size: u32,
    }

    #[test]
    fn missing_file_reports_missing_code() {
        let temp = TempDir::new().expect("tempdir");
        let error = load_json_document::<Doc>(&temp.path().join("absent.json"))
            .expect_err("missing file");
        assert_eq!(error.code, ContentErrorCode::Missing);
    }

    #[test]
    fn type_mismatch_reports_json_path() {
        let error = parse_json_document::<BTreeMap<String, Doc>>(
            r#"{"world": {"name": "w", "size": "big"}}"#,
            Path::new("maps.json"),
        )
        .expect_err("bad size");

        assert_eq!(error.code, ContentErrorCode::JsonMalformed);
        assert_eq!(error.json_path.as_deref(), Some("world.size"));
        assert!(error.to_string().contains("maps.json"));
    }

    #[test]
    fn malformed_file_degrades_to_default() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("doc.json");
        fs::write(&path, "{ not json").expect("write");

        let doc: Doc = load_json_document_or_default(&path);
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn valid_file_loads() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("doc.json");
        fs::write(&path, r#"{"name": "n", "size": 3}"#).expect("write");

        let doc: Doc = load_json_document(&path).expect("load");
        assert_eq!(
            doc,
            Doc {
                name: "n".to_string(),
                size: 3
            }
        );
    }
}
