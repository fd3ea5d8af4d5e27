//! Clap argument definitions for the `sift` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Parse search equations and compile them into backend queries")]
pub struct Cli {
    /// Log verbosity (-v for debug, -vv for trace); RUST_LOG overrides
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// The equation to work on.
#[derive(Args, Debug, Clone, Default)]
pub struct EquationArgs {
    /// Search equation; read from stdin when omitted
    pub equation: Option<String>,
}

/// Arguments for `sift tokens`.
#[derive(Args, Debug, Clone)]
pub struct TokensCommand {
    #[command(flatten)]
    /// Equation input.
    pub input: EquationArgs,

    /// Fail on an unterminated quote
    #[arg(long)]
    pub strict: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `sift parse`.
#[derive(Args, Debug, Clone)]
pub struct ParseCommand {
    #[command(flatten)]
    /// Equation input.
    pub input: EquationArgs,

    /// Field applied to the root, overriding parser.default_field
    #[arg(short = 'f', long)]
    pub field: Option<String>,

    /// Show the raw tree without flattening
    #[arg(long)]
    pub no_optimize: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `sift compile`.
#[derive(Args, Debug, Clone)]
pub struct CompileCommand {
    #[command(flatten)]
    /// Equation input.
    pub input: EquationArgs,

    /// Field applied to the root, overriding parser.default_field
    #[arg(short = 'f', long)]
    pub field: Option<String>,

    /// Output an Elasticsearch-like JSON query instead of the query description
    #[arg(long)]
    pub dsl: bool,

    /// Expand wildcards against the indexed terms in FILE (one per line)
    #[arg(long, value_name = "FILE")]
    pub terms: Option<PathBuf>,
}

/// Arguments for `sift init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.sift.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `sift` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the tokens of an equation
    Tokens(TokensCommand),

    /// Show the query tree of an equation
    #[command(after_help = "\
EQUATION SYNTAX:
  a b               Either term (juxtaposition is OR)
  a AND b           Both terms (also: ET)
  a OR b            Either term (also: OU)
  a NOT b           a without b (also: SAUF, BUT)
  +a b              a required, b optional
  -a                Exclude a
  \"a b\"             Phrase
  a NEAR b          Within near_window positions
  a ADJ b           Within adj_window positions, in order
  field:term        Scope to a field
  dev*  te?t        Wildcards

EXAMPLES:
  sift parse 'title:\"hello world\" AND status:publish -archived'
  sift parse --json 'rust NEAR async'")]
    Parse(ParseCommand),

    /// Compile an equation into a backend query
    Compile(CompileCommand),

    /// Show effective configuration settings
    Config,

    /// Validate configuration and diagnose issues
    Check,

    /// Initialize sift configuration in current directory
    Init(InitCommand),
}

impl Commands {
    /// Whether the command needs the discovered configuration loaded.
    ///
    /// `init` must work when an existing config file is broken.
    pub fn needs_config(&self) -> bool {
        !matches!(self, Self::Init(_))
    }
}
