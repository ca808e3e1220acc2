//! Configuration management
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (fulmen.toml)
//! - Environment variables (FULMEN__*)
//!
//! ## Example config file (fulmen.toml):
//! ```toml
//! [schemas]
//! root = "./schemas"
//! vendor_domain = "schemas.fulmenhq.dev"
//!
//! [similarity]
//! min_score = 0.6
//! max_suggestions = 3
//! normalize = true
//! algorithm = "levenshtein"
//!
//! [export]
//! format = "auto"
//! provenance_style = "object"
//! overwrite = false
//! validate_schema = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::schema::export::{ExportFormat, ProvenanceStyle};
use crate::similarity::{Algorithm, SuggestOptions, DEFAULT_MAX_SUGGESTIONS, DEFAULT_MIN_SCORE};

pub const DEFAULT_VENDOR_DOMAIN: &str = "schemas.fulmenhq.dev";

/// Library configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FulmenConfig {
    #[serde(default)]
    pub schemas: SchemasConfig,

    #[serde(default)]
    pub similarity: SimilarityConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Schema catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemasConfig {
    /// Catalog root; unset means search the working directory and its ancestors
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Host whose `$ref` URLs resolve under the catalog root
    #[serde(default = "default_vendor_domain")]
    pub vendor_domain: String,
}

/// Suggestion defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    #[serde(default = "default_true")]
    pub normalize: bool,

    #[serde(default)]
    pub algorithm: Algorithm,
}

/// Exporter defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: ExportFormat,

    #[serde(default)]
    pub provenance_style: ProvenanceStyle,

    #[serde(default)]
    pub overwrite: bool,

    #[serde(default = "default_true")]
    pub validate_schema: bool,
}

fn default_vendor_domain() -> String {
    DEFAULT_VENDOR_DOMAIN.to_string()
}

fn default_min_score() -> f64 {
    DEFAULT_MIN_SCORE
}

fn default_max_suggestions() -> usize {
    DEFAULT_MAX_SUGGESTIONS
}

fn default_true() -> bool {
    true
}

impl Default for SchemasConfig {
    fn default() -> Self {
        Self {
            root: None,
            vendor_domain: default_vendor_domain(),
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            normalize: true,
            algorithm: Algorithm::default(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            provenance_style: ProvenanceStyle::default(),
            overwrite: false,
            validate_schema: true,
        }
    }
}

impl SimilarityConfig {
    pub fn suggest_options(&self) -> SuggestOptions {
        SuggestOptions {
            min_score: self.min_score,
            max_suggestions: self.max_suggestions,
            normalize: self.normalize,
            algorithm: self.algorithm,
        }
    }
}

impl FulmenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["fulmen.toml", ".fulmen.toml", "config/fulmen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "fulmenhq", "fulmen") {
            let xdg_config = config_dir.config_dir().join("fulmen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("FULMEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Configured catalog root, resolved against the working directory
    pub fn schema_root(&self) -> Option<PathBuf> {
        self.schemas.root.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FulmenConfig::default();
        assert!(config.schemas.root.is_none());
        assert_eq!(config.schemas.vendor_domain, DEFAULT_VENDOR_DOMAIN);
        assert_eq!(config.similarity.suggest_options(), SuggestOptions::default());
        assert!(!config.export.overwrite);
    }

    #[test]
    fn test_serialize_config() {
        let config = FulmenConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[schemas]"));
        assert!(toml_str.contains("[similarity]"));
        assert!(toml_str.contains("[export]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[similarity]\nmin_score = 0.8\nalgorithm = \"damerau_osa\"\n\n[export]\nprovenance_style = \"comment\"\n",
        )
        .unwrap();

        let config = FulmenConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.similarity.min_score, 0.8);
        assert_eq!(config.similarity.algorithm, Algorithm::DamerauOsa);
        assert_eq!(config.similarity.max_suggestions, DEFAULT_MAX_SUGGESTIONS);
        assert_eq!(config.export.provenance_style, ProvenanceStyle::Comment);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fulmen.toml");
        let mut config = FulmenConfig::default();
        config.schemas.root = Some(PathBuf::from("/opt/schemas"));
        config.save(&path).unwrap();

        let loaded = FulmenConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.schemas.root, Some(PathBuf::from("/opt/schemas")));
    }
}
