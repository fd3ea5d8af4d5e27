//! Implementation of `sift tokens`.

use std::process::ExitCode;

use comfy_table::Cell;
use sift_query::{LexError, Lexer, LexerOptions, Token, TokenKind};

use crate::cli::{
    args::TokensCommand,
    context::CommandContext,
    output::{print_json, table},
};

/// Lexes an equation and prints its tokens.
pub fn run(ctx: &CommandContext, cmd: &TokensCommand) -> ExitCode {
    let equation = match ctx.equation(&cmd.input) {
        Ok(equation) => equation,
        Err(code) => return code,
    };

    let options = LexerOptions {
        strict_quotes: cmd.strict || ctx.config.parser.strict_quotes,
    };
    let tokens = match lex(&equation, options) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cmd.json {
        return print_json(&tokens);
    }

    let mut out = table(&["Kind", "Code", "Text", "Span"]);
    for token in &tokens {
        out.add_row(vec![
            Cell::new(token.kind.name()),
            Cell::new(token.kind as u8),
            Cell::new(&token.text),
            Cell::new(format!("{}..{}", token.span.0, token.span.1)),
        ]);
    }
    println!("{out}");
    ExitCode::SUCCESS
}

/// Reads every token of `equation`, including the final end marker.
fn lex(equation: &str, options: LexerOptions) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(options);
    let mut tokens = vec![lexer.read(Some(equation))?];
    while tokens.last().is_some_and(|t| t.kind != TokenKind::End) {
        tokens.push(lexer.read(None)?);
    }
    Ok(tokens)
}
