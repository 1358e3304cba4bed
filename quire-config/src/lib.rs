//! Shared configuration loader for the quire tools.
//!
//! `defaults/quire.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`QuireConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use quire_doc::{EditorOptions, HtmlOptions};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/quire.default.toml");

/// Name of the optional per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = "quire.toml";

/// Top-level configuration consumed by quire applications.
#[derive(Debug, Clone, Deserialize)]
pub struct QuireConfig {
    pub editor: EditorConfig,
    pub convert: ConvertConfig,
    pub logging: LoggingConfig,
}

/// Mirrors [`EditorOptions`].
#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    pub max_list_indent_depth: usize,
    pub default_layout_columns: usize,
    pub lock_aspect_ratio: bool,
}

impl From<&EditorConfig> for EditorOptions {
    fn from(config: &EditorConfig) -> Self {
        EditorOptions {
            max_list_indent_depth: config.max_list_indent_depth,
            default_layout_columns: config.default_layout_columns,
            lock_aspect_ratio: config.lock_aspect_ratio,
        }
    }
}

impl From<EditorConfig> for EditorOptions {
    fn from(config: EditorConfig) -> Self {
        EditorOptions::from(&config)
    }
}

/// Format-specific conversion knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub html: HtmlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HtmlConfig {
    pub standalone: bool,
    pub title: String,
    #[serde(default)]
    pub custom_css: Option<String>,
}

impl From<&HtmlConfig> for HtmlOptions {
    fn from(config: &HtmlConfig) -> Self {
        HtmlOptions {
            standalone: config.standalone,
            title: config.title.clone(),
            custom_css: config.custom_css.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. `editor.max_list_indent_depth`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<QuireConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<QuireConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.editor.max_list_indent_depth, 7);
        assert_eq!(config.editor.default_layout_columns, 2);
        assert!(config.convert.html.standalone);
        assert_eq!(config.convert.html.custom_css, None);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn defaults_match_library_defaults() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(EditorOptions::from(&config.editor), EditorOptions::default());
        assert_eq!(HtmlOptions::from(&config.convert.html), HtmlOptions::default());
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("editor.max_list_indent_depth", 3i64)
            .expect("override to apply")
            .set_override("convert.html.standalone", false)
            .expect("override to apply")
            .build()
            .expect("config to build");
        let options: EditorOptions = config.editor.into();
        assert_eq!(options.max_list_indent_depth, 3);
        assert!(options.lock_aspect_ratio);
        assert!(!config.convert.html.standalone);
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/quire.toml")
            .build()
            .expect("config to build");
        assert_eq!(config.editor.default_layout_columns, 2);
    }

    #[test]
    fn missing_required_file_fails() {
        assert!(Loader::new().with_file("/nonexistent/quire.toml").build().is_err());
    }
}
