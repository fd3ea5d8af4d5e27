//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules and rejecting values the compiler cannot use.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::{
    CompilerSettings, Config, ConfigError, ParserSettings,
    parse::{RawCompilerSettings, RawConfig, RawParserSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first
/// (closest to CWD), lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar settings: first defined value wins (highest precedence)
/// - Fields: merged by name, first definition wins completely
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    if configs.is_empty() {
        return Ok(Config::default());
    }

    let mut parser = ParserSettings::default();
    let mut compiler = CompilerSettings::default();

    // Iterate in reverse (lowest precedence first) so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.parser {
            apply_raw_parser(&mut parser, raw, &parsed.path)?;
        }
        if let Some(ref raw) = parsed.config.compiler {
            apply_raw_compiler(&mut compiler, raw, &parsed.path)?;
        }
    }

    let config_root = configs
        .first()
        .and_then(|c| c.path.parent())
        .map(Path::to_path_buf);

    Ok(Config {
        parser,
        compiler,
        fields: merge_fields(configs),
        config_root,
        sources: configs.iter().map(|c| c.path.clone()).collect(),
    })
}

/// Applies raw parser settings to result, overwriting any present values.
fn apply_raw_parser(
    result: &mut ParserSettings,
    raw: &RawParserSettings,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(ref v) = raw.default_field {
        result.default_field = Some(v.clone());
    }
    if let Some(v) = raw.near_window {
        result.near_window = v;
    }
    if let Some(v) = raw.adj_window {
        result.adj_window = v;
    }
    if let Some(v) = raw.phrase_gap {
        result.phrase_gap = v;
    }
    if let Some(v) = raw.max_depth {
        if v == 0 {
            return Err(invalid(path, "parser.max_depth", "must be at least 1"));
        }
        result.max_depth = v;
    }
    if let Some(v) = raw.strict_quotes {
        result.strict_quotes = v;
    }
    Ok(())
}

/// Applies raw compiler settings to result, overwriting any present values.
fn apply_raw_compiler(
    result: &mut CompilerSettings,
    raw: &RawCompilerSettings,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(ref v) = raw.default_prefixes {
        if v.is_empty() {
            return Err(invalid(
                path,
                "compiler.default_prefixes",
                "must name at least one prefix",
            ));
        }
        result.default_prefixes = v.clone();
    }
    if let Some(v) = raw.unknown_field {
        result.unknown_field = v;
    }
    if let Some(v) = raw.max_expansions {
        if v == 0 {
            return Err(invalid(path, "compiler.max_expansions", "must be at least 1"));
        }
        result.max_expansions = v;
    }
    if let Some(v) = raw.native_match_nothing {
        result.native_match_nothing = v;
    }
    Ok(())
}

/// Merges field maps. A field defined in a closer file replaces the whole
/// definition from farther files.
fn merge_fields(configs: &[ParsedConfig]) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    for parsed in configs {
        if let Some(ref raw) = parsed.config.fields {
            for (name, prefixes) in raw {
                fields
                    .entry(name.clone())
                    .or_insert_with(|| prefixes.clone());
            }
        }
    }
    fields
}

/// Builds an `InvalidSetting` error.
fn invalid(path: &Path, key: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidSetting {
        path: path.to_path_buf(),
        key,
        reason,
    }
}
