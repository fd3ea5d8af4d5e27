//! Implementation of `sift compile`.

use std::process::ExitCode;

use sift_backend::{MemoryDictionary, QueryCompiler};

use crate::cli::{
    args::CompileCommand,
    context::{CommandContext, read_terms},
    output::print_json,
};

/// Parses, flattens, and compiles an equation for the backend.
pub fn run(ctx: &CommandContext, cmd: &CompileCommand) -> ExitCode {
    let equation = match ctx.equation(&cmd.input) {
        Ok(equation) => equation,
        Err(code) => return code,
    };
    let tree = match ctx.parse(&equation, cmd.field.as_deref(), true) {
        Ok(tree) => tree,
        Err(code) => return code,
    };

    let dictionary: Option<MemoryDictionary> = match cmd.terms {
        Some(ref path) => match read_terms(path) {
            Ok(terms) => Some(terms.into_iter().collect()),
            Err(code) => return code,
        },
        None => None,
    };

    let mut compiler = QueryCompiler::new(ctx.config.field_map(), ctx.config.compiler_options());
    if let Some(ref dictionary) = dictionary {
        compiler = compiler.with_dictionary(dictionary);
    }

    let query = match compiler.compile(&tree) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cmd.dsl {
        return print_json(&query.to_dsl());
    }
    println!("{query}");
    ExitCode::SUCCESS
}
