//! Configuration system for sift.
//!
//! sift uses TOML configuration files named `.sift.toml`. Configuration is
//! resolved by walking up the directory tree from the current working
//! directory, collecting any `.sift.toml` files found, then loading
//! `~/.sift.toml` as the global config with lowest precedence.
//!
//! A file holds three sections: `[parser]` options for reading equations,
//! `[compiler]` options for lowering them, and `[fields]`, the map from field
//! names to backend prefixes.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawCompilerSettings, RawConfig, RawParserSettings, parse_config_file, parse_config_str,
};
use serde::{Deserialize, Serialize};
use sift_backend::{CompilerOptions, FieldMap, UnknownFieldPolicy};
use sift_query::ParserOptions;
pub use templates::{global_template, local_template};
use tracing::debug;
pub use validate::ConfigWarning;
use validate::validate_config;

/// Top-level merged configuration for sift.
///
/// This represents the fully resolved configuration after merging all
/// discovered `.sift.toml` files according to precedence rules.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Equation parsing settings.
    pub parser: ParserSettings,
    /// Backend compilation settings.
    pub compiler: CompilerSettings,
    /// Field name to backend prefixes.
    pub fields: BTreeMap<String, Vec<String>>,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
    /// Files the configuration was merged from, highest precedence first.
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant
    /// `.sift.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let config = merge_configs(&parsed)?;
        debug!(
            files = parsed.len(),
            fields = config.fields.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings to TOML format, in the same layout
    /// as a `.sift.toml` file.
    pub fn settings_to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableConfig {
            parser: &self.parser,
            compiler: &self.compiler,
            fields: &self.fields,
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }

    /// Field applied to the root of every parsed equation.
    pub fn default_field(&self) -> Option<&str> {
        self.parser.default_field.as_deref()
    }

    /// Parser options for these settings.
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            near_window: self.parser.near_window,
            adj_window: self.parser.adj_window,
            phrase_gap: self.parser.phrase_gap,
            max_depth: self.parser.max_depth,
            strict_quotes: self.parser.strict_quotes,
        }
    }

    /// Compiler options for these settings.
    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions {
            default_prefixes: self.compiler.default_prefixes.clone(),
            unknown_field: self.compiler.unknown_field,
            max_expansions: self.compiler.max_expansions,
            native_match_nothing: self.compiler.native_match_nothing,
        }
    }

    /// The field map for the compiler.
    pub fn field_map(&self) -> FieldMap {
        self.fields
            .iter()
            .map(|(name, prefixes)| (name.clone(), prefixes.clone()))
            .collect()
    }
}

/// Settings for reading equations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Field given to the root of every parsed equation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,
    /// Gap of `NEAR` nodes.
    pub near_window: u32,
    /// Gap of `ADJ` nodes.
    pub adj_window: u32,
    /// Gap of quoted phrases.
    pub phrase_gap: u32,
    /// Deepest parenthesis nesting honoured.
    pub max_depth: usize,
    /// Reject unterminated phrases.
    pub strict_quotes: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        let options = ParserOptions::default();
        Self {
            default_field: None,
            near_window: options.near_window,
            adj_window: options.adj_window,
            phrase_gap: options.phrase_gap,
            max_depth: options.max_depth,
            strict_quotes: options.strict_quotes,
        }
    }
}

/// Settings for lowering trees to backend queries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Prefixes searched by clauses with no field in scope.
    pub default_prefixes: Vec<String>,
    /// Handling of unmapped fields.
    pub unknown_field: UnknownFieldPolicy,
    /// Most terms a wildcard expands to, per prefix.
    pub max_expansions: usize,
    /// Whether the backend has a match-nothing primitive.
    pub native_match_nothing: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        let options = CompilerOptions::default();
        Self {
            default_prefixes: options.default_prefixes,
            unknown_field: options.unknown_field,
            max_expansions: options.max_expansions,
            native_match_nothing: options.native_match_nothing,
        }
    }
}

/// Borrowed view of the effective settings for TOML output.
#[derive(Serialize)]
struct SerializableConfig<'a> {
    /// Parser settings.
    parser: &'a ParserSettings,
    /// Compiler settings.
    compiler: &'a CompilerSettings,
    /// Field map.
    fields: &'a BTreeMap<String, Vec<String>>,
}
