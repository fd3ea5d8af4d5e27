//! Shared context for running CLI commands.

use std::{
    env, fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

use sift_config::Config;
use sift_query::{Node, QueryParser, optimize};
use tracing::debug;

use crate::cli::args::EquationArgs;

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (may be default if no config files found).
    pub config: Config,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    pub fn load() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config = load_config_or_failure(&cwd)?;
        Ok(Self { cwd, config })
    }

    /// Loads only the current directory, skipping configuration parsing.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        Ok(Self {
            cwd,
            config: Config::default(),
        })
    }

    /// Returns the equation from the arguments, or reads it from stdin.
    pub fn equation(&self, args: &EquationArgs) -> Result<String, ExitCode> {
        if let Some(ref equation) = args.equation {
            return Ok(equation.clone());
        }
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(|e| {
            eprintln!("error: failed to read equation from stdin: {e}");
            ExitCode::FAILURE
        })?;
        Ok(buf.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Parses an equation with the configured parser options.
    ///
    /// `field` overrides the configured default field. Strict quote checking
    /// follows `parser.strict_quotes`.
    pub fn parse(
        &self,
        equation: &str,
        field: Option<&str>,
        flatten: bool,
    ) -> Result<Node, ExitCode> {
        let parser = QueryParser::new(self.config.parser_options());
        let field = field.or_else(|| self.config.default_field());
        let tree = parser.try_parse(equation, field).map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        })?;
        debug!(depth = tree.depth(), leaves = tree.leaf_count(), "parsed equation");
        Ok(if flatten { optimize(tree) } else { tree })
    }
}

/// Reads a newline-separated term list, skipping blank lines.
pub fn read_terms(path: &Path) -> Result<Vec<String>, ExitCode> {
    let contents = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        ExitCode::FAILURE
    })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}

/// Loads configuration from the provided directory or exits with an error.
fn load_config_or_failure(cwd: &Path) -> Result<Config, ExitCode> {
    Config::load(cwd).map_err(|e| {
        eprintln!("error: failed to load configuration: {e}");
        ExitCode::FAILURE
    })
}
