//! Configuration loading for phix.
//!
//! `defaults/phix.default.toml` is embedded into the binary so the shipped
//! rule set and the documented one cannot drift apart. Applications layer a
//! project file (conventionally `.phix.toml`) and command-line overrides on
//! top via [`Loader`] before deserializing into [`PhixConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

use phix_engine::RuleSet;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/phix.default.toml");

/// Top-level configuration consumed by the phix command line.
#[derive(Debug, Clone, Deserialize)]
pub struct PhixConfig {
    /// Rule name to enablement flag or option table; feeds
    /// [`phix_engine::resolve_fixers`].
    pub rules: RuleSet,
    pub whitespace: WhitespaceSettings,
    pub runner: RunnerSettings,
    pub cache: CacheSettings,
    pub linter: LinterSettings,
}

/// Indentation and line endings handed to whitespace-aware fixers.
#[derive(Debug, Clone, Deserialize)]
pub struct WhitespaceSettings {
    pub indent: String,
    pub line_ending: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSettings {
    pub workers: usize,
    pub max_passes: u32,
    pub allow_risky: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub enabled: bool,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinterSettings {
    pub mode: LinterMode,
    /// Interpreter used in `process` mode.
    pub binary: String,
    pub timeout_ms: u64,
}

/// Which syntax check gates files before fixing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinterMode {
    Tokenizer,
    Process,
}

/// Helper for layering project files and CLI overrides over the built-in
/// defaults.
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

    /// Apply a single key/value override (useful for CLI flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<PhixConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<PhixConfig, ConfigError> {
    Loader::new().build()
}
