//! Implementation of `sift parse`.

use std::process::ExitCode;

use crate::cli::{args::ParseCommand, context::CommandContext, output::print_json};

/// Parses an equation and prints the query tree.
pub fn run(ctx: &CommandContext, cmd: &ParseCommand) -> ExitCode {
    let equation = match ctx.equation(&cmd.input) {
        Ok(equation) => equation,
        Err(code) => return code,
    };
    let tree = match ctx.parse(&equation, cmd.field.as_deref(), !cmd.no_optimize) {
        Ok(tree) => tree,
        Err(code) => return code,
    };

    if cmd.json {
        return print_json(&tree);
    }

    print!("{tree}");
    println!();
    println!("Query:  {}", tree.to_query_string());
    println!("Depth:  {}", tree.depth());
    println!("Leaves: {}", tree.leaf_count());
    ExitCode::SUCCESS
}
