//! Configuration validation.
//!
//! Reports settings that load fine but probably do not do what was meant.

use std::{collections::BTreeSet, fmt};

use crate::Config;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A proximity window of zero makes the operator behave like a phrase.
    ZeroWindow {
        /// Dotted key of the setting.
        key: &'static str,
    },
    /// A field maps to no prefix and can never match.
    FieldWithoutPrefixes {
        /// Name of the field.
        field: String,
    },
    /// A field lists the same prefix twice.
    DuplicatePrefix {
        /// Name of the field.
        field: String,
        /// The repeated prefix.
        prefix: String,
    },
    /// The default field is not in the field map.
    DefaultFieldUnmapped {
        /// Name of the default field.
        field: String,
    },
    /// No fields are defined, so every field-scoped clause hits the
    /// unknown-field policy.
    NoFieldsDefined,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroWindow { key } => {
                write!(f, "{key} is 0; the operator only matches adjacent terms")
            }
            Self::FieldWithoutPrefixes { field } => {
                write!(f, "field '{field}' maps to no prefix and never matches")
            }
            Self::DuplicatePrefix { field, prefix } => {
                write!(f, "field '{field}' lists prefix '{prefix}' more than once")
            }
            Self::DefaultFieldUnmapped { field } => {
                write!(f, "default field '{field}' is not defined in [fields]")
            }
            Self::NoFieldsDefined => {
                write!(f, "no fields are defined in configuration")
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.parser.near_window == 0 {
        warnings.push(ConfigWarning::ZeroWindow {
            key: "parser.near_window",
        });
    }
    if config.parser.adj_window == 0 {
        warnings.push(ConfigWarning::ZeroWindow {
            key: "parser.adj_window",
        });
    }

    if config.fields.is_empty() {
        warnings.push(ConfigWarning::NoFieldsDefined);
    }

    for (field, prefixes) in &config.fields {
        if prefixes.is_empty() {
            warnings.push(ConfigWarning::FieldWithoutPrefixes {
                field: field.clone(),
            });
        }
        let mut seen = BTreeSet::new();
        for prefix in prefixes {
            if !seen.insert(prefix) {
                warnings.push(ConfigWarning::DuplicatePrefix {
                    field: field.clone(),
                    prefix: prefix.clone(),
                });
            }
        }
    }

    if let Some(ref field) = config.parser.default_field
        && !config.fields.contains_key(field)
    {
        warnings.push(ConfigWarning::DefaultFieldUnmapped {
            field: field.clone(),
        });
    }

    warnings
}
