//! Configuration file parsing.
//!
//! Parses individual `.sift.toml` files into `RawConfig` structures that keep
//! every value optional until merging.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};
use sift_backend::UnknownFieldPolicy;
#[cfg(test)]
use toml::de::Error as TomlError;

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
///
/// Mirrors the TOML schema; every value is optional so partial files merge.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// When true, stop discovery here and ignore parent and global configs.
    pub root: Option<bool>,
    /// `[parser]` section.
    pub parser: Option<RawParserSettings>,
    /// `[compiler]` section.
    pub compiler: Option<RawCompilerSettings>,
    /// `[fields]` section: field name to one or many prefixes.
    #[serde_as(as = "Option<BTreeMap<_, OneOrMany<_>>>")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

/// Raw `[parser]` settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawParserSettings {
    /// Field given to the root of every parsed equation.
    pub default_field: Option<String>,
    /// Gap of `NEAR` nodes.
    pub near_window: Option<u32>,
    /// Gap of `ADJ` nodes.
    pub adj_window: Option<u32>,
    /// Gap of quoted phrases.
    pub phrase_gap: Option<u32>,
    /// Deepest parenthesis nesting honoured.
    pub max_depth: Option<usize>,
    /// Reject unterminated phrases.
    pub strict_quotes: Option<bool>,
}

/// Raw `[compiler]` settings.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawCompilerSettings {
    /// Prefixes searched when no field is in scope.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub default_prefixes: Option<Vec<String>>,
    /// Handling of unmapped fields.
    pub unknown_field: Option<UnknownFieldPolicy>,
    /// Most terms a wildcard expands to, per prefix.
    pub max_expansions: Option<usize>,
    /// Whether the backend has a match-nothing primitive.
    pub native_match_nothing: Option<bool>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a TOML string without path context.
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}
