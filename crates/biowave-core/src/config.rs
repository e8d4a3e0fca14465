//! Configuration for the BioWave test database
//!
//! Provides TOML-based configuration for the database file location, the
//! raw data sources used by `create` and the defaults used when printing
//! file paths.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DatabaseError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BiowaveConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Location of the SQLite file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_file")]
    pub file: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: default_database_file(),
        }
    }
}

fn default_database_file() -> PathBuf {
    PathBuf::from("db.sql3")
}

/// Raw data read when the database is created
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default = "default_imagedir")]
    pub imagedir: PathBuf,
    #[serde(default = "default_devfile")]
    pub devfile: PathBuf,
    #[serde(default = "default_evalfile")]
    pub evalfile: PathBuf,
    #[serde(default = "default_image_extension")]
    pub image_extension: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            imagedir: default_imagedir(),
            devfile: default_devfile(),
            evalfile: default_evalfile(),
            image_extension: default_image_extension(),
        }
    }
}

fn default_imagedir() -> PathBuf {
    PathBuf::from("/idiap/project/biowave/biowave_test/database/")
}
fn default_devfile() -> PathBuf {
    PathBuf::from("/idiap/project/biowave/biowave_test/devSetGenuine.txt")
}
fn default_evalfile() -> PathBuf {
    PathBuf::from("/idiap/project/biowave/biowave_test/evalSetGenuine.txt")
}
fn default_image_extension() -> String {
    ".png".to_string()
}

/// Defaults for turning stored paths into full file names
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub original_directory: PathBuf,
    #[serde(default = "default_image_extension")]
    pub original_extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            original_directory: PathBuf::new(),
            original_extension: default_image_extension(),
        }
    }
}

impl BiowaveConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| DatabaseError::io(path, e))?;
        let config: BiowaveConfig = toml::from_str(&content).map_err(|e| DatabaseError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.database.file.as_os_str().is_empty() {
            return Err(DatabaseError::Config {
                path: path.to_path_buf(),
                message: "database.file must not be empty".to_string(),
            });
        }
        if !self.sources.image_extension.starts_with('.') {
            return Err(DatabaseError::Config {
                path: path.to_path_buf(),
                message: format!(
                    "sources.image_extension must start with '.', got '{}'",
                    self.sources.image_extension
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BiowaveConfig::default();
        assert_eq!(config.database.file, PathBuf::from("db.sql3"));
        assert_eq!(config.sources.image_extension, ".png");
        assert!(config.sources.devfile.ends_with("devSetGenuine.txt"));
        assert_eq!(config.output.original_extension, ".png");
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [database]
            file = "/tmp/biowave/db.sql3"

            [sources]
            imagedir = "./data/images"
        "#;

        let config: BiowaveConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.file, PathBuf::from("/tmp/biowave/db.sql3"));
        assert_eq!(config.sources.imagedir, PathBuf::from("./data/images"));
        assert!(config.sources.evalfile.ends_with("evalSetGenuine.txt"));
        assert_eq!(config.output.original_directory, PathBuf::new());
    }

    #[test]
    fn test_load_rejects_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biowave.toml");
        std::fs::write(&path, "[sources]\nimage_extension = \"png\"\n").unwrap();

        let err = BiowaveConfig::load(&path).unwrap_err();
        assert!(matches!(err, DatabaseError::Config { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = BiowaveConfig::load(Path::new("/nonexistent/biowave.toml")).unwrap_err();
        assert!(matches!(err, DatabaseError::Io { .. }));
        assert!(BiowaveConfig::load_or_default(None).is_ok());
    }
}
