//! Format detection (RON/JSON/TOML), file discovery, and deserialization
//! helpers used by the economy loading pipeline.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use millwork_core::recipe::RecipeError;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A recipe failed validation.
    #[error("invalid recipe in {file}: {source}")]
    InvalidRecipe {
        file: PathBuf,
        #[source]
        source: RecipeError,
    },

    /// A numeric field is out of range.
    #[error("invalid value for '{field}' in {file}: {detail}")]
    InvalidValue {
        file: PathBuf,
        field: &'static str,
        detail: String,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Deserialize `content` according to `format`.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
) -> Result<T, DataLoadError> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(path, e)),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

/// Deserialize a list from a file. TOML has no top-level arrays, so TOML
/// files keep the list under `toml_key`; RON and JSON hold it directly.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron | Format::Json => deserialize_str(&content, format, path),
        Format::Toml => {
            let mut table: toml::Table =
                toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table.remove(toml_key).ok_or_else(|| {
                parse_error(path, format!("missing key '{toml_key}' in TOML file"))
            })?;
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "millwork_loader_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("recipes.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("recipes.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("recipes.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["recipes.yaml", "recipes"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    #[test]
    fn find_data_file_found_and_missing() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "recipes").unwrap(), None);

        fs::write(dir.join("recipes.toml"), "").unwrap();
        assert_eq!(
            find_data_file(&dir, "recipes").unwrap(),
            Some(dir.join("recipes.toml"))
        );

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("conflict");
        fs::write(dir.join("recipes.ron"), "[]").unwrap();
        fs::write(dir.join("recipes.json"), "[]").unwrap();

        assert!(matches!(
            find_data_file(&dir, "recipes"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require");
        assert!(matches!(
            require_data_file(&dir, "recipes"),
            Err(DataLoadError::MissingRequired { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_all_formats() {
        let dir = make_test_dir("list");
        let ron_path = dir.join("a.ron");
        let json_path = dir.join("b.json");
        let toml_path = dir.join("c.toml");
        fs::write(&ron_path, r#"[(name: "sawmill")]"#).unwrap();
        fs::write(&json_path, r#"[{"name": "sawmill"}]"#).unwrap();
        fs::write(&toml_path, "[[things]]\nname = \"sawmill\"\n").unwrap();

        let expected = vec![Named {
            name: "sawmill".to_string(),
        }];
        assert_eq!(deserialize_list::<Named>(&ron_path, "things").unwrap(), expected);
        assert_eq!(deserialize_list::<Named>(&json_path, "things").unwrap(), expected);
        assert_eq!(deserialize_list::<Named>(&toml_path, "things").unwrap(), expected);

        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_toml_missing_key() {
        let dir = make_test_dir("toml_key");
        let path = dir.join("c.toml");
        fs::write(&path, "[[other]]\nname = \"x\"\n").unwrap();

        assert!(matches!(
            deserialize_list::<Named>(&path, "things"),
            Err(DataLoadError::Parse { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn deserialize_file_parse_error_names_file() {
        let dir = make_test_dir("parse_err");
        let path = dir.join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = deserialize_file::<Named>(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));

        cleanup(&dir);
    }
}
