//! # silt
//!
//! silt is a tiny dynamically-typed scripting language with a tree-walking
//! interpreter. The pipeline is a position-tracking tokenizer, a two-tier
//! parser (operator-precedence expressions under a recursive statement
//! parser), and an evaluator with a flat, copy-based closure model.
//!
//! Four thin drivers sit on top of this library and differ only in which
//! stage's output they print: `silt-lex` (tokens), `silt-fmt` (the parsed
//! program rendered back to canonical text), `silt` (parse and evaluate
//! with buffered print output), and `silt-calc` (a line-at-a-time
//! expression evaluator).

#![warn(clippy::redundant_clone,
        clippy::needless_pass_by_value,
        clippy::match_same_arms,
        clippy::perf,
        clippy::style,
        clippy::suspicious,
        clippy::correctness,
        clippy::complexity,
        clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

use crate::interpreter::{environment::EnvRef,
                         evaluator::{Flow, Runtime},
                         lexer::TokenKind,
                         parser::{expression, statement}};

/// Defines the structure of parsed code.
///
/// Declares the closed `Ast` node set, block kinds, and function
/// declarations, together with the canonical pretty rendering used by the
/// formatter and for round-trip testing.
pub mod ast;
/// Provides the error types for every pipeline stage.
///
/// Lexical, syntax and runtime errors each carry the data their stage can
/// know (positions, the offending token, or a message), expose the stable
/// status codes 1/2/3, and unify into one `Error` for the drivers.
pub mod error;
/// Orchestrates tokenizing, parsing and evaluating code.
///
/// Ties together the lexer, both parsers, the value and environment
/// models, and the evaluator; the submodules are the pipeline stages.
pub mod interpreter;

pub use error::Error;

/// What running a whole program produced: everything `print` buffered, and
/// the error that stopped execution, if any.
#[derive(Debug)]
pub struct RunOutcome {
    /// Output accumulated by `print`, one line per statement, including
    /// everything buffered before a failure.
    pub output: String,
    /// The error that stopped the run, or `None` on success.
    pub error:  Option<Error>,
}

impl RunOutcome {
    /// Gets the process status code for this outcome: the failing error's
    /// code, or 0.
    #[must_use]
    pub fn status(&self) -> i32 {
        self.error.as_ref().map_or(0, Error::code)
    }
}

/// Tokenizes, parses and evaluates a whole program.
///
/// On failure the outcome still carries everything `print` had buffered
/// before the error, which the driver flushes ahead of the diagnostic.
#[must_use]
pub fn run_program(source: &str) -> RunOutcome {
    let tokens = match interpreter::lexer::tokenize(source, 0) {
        Ok(tokens) => tokens,
        Err(e) => {
            return RunOutcome { output: String::new(),
                                error:  Some(e.into()), };
        },
    };
    let (program, env) = match statement::Parser::new(tokens).parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            return RunOutcome { output: String::new(),
                                error:  Some(e), };
        },
    };

    let mut runtime = Runtime::new();
    let error = match runtime.eval(&program, &env) {
        Ok(Flow::Normal(_)) => None,
        Ok(Flow::Return(_)) => {
            Some(error::RuntimeError::ReturnOutsideFunction.into())
        },
        Err(e) => Some(e.into()),
    };
    RunOutcome { output: runtime.into_output(),
                 error }
}

/// Tokenizes and parses a whole program, rendering it back to canonical
/// text without evaluating anything.
///
/// The rendering is deterministic: reparsing it yields a structurally
/// identical program.
pub fn format_program(source: &str) -> Result<String, Error> {
    let tokens = interpreter::lexer::tokenize(source, 0)?;
    let (program, _env) = statement::Parser::new(tokens).parse()?;
    Ok(program.render())
}

/// Evaluates one expression line against a persistent environment,
/// returning the status code and the rendered value or error text.
///
/// The line is wrapped in parentheses and tokenized with a column offset
/// of 1 so reported positions match the unwrapped input. Statement
/// keywords are rejected. A failed line has zero observable effect on the
/// environment (rollback contract), so later lines still work.
#[must_use]
pub fn eval_line(env: &EnvRef, line: &str) -> (i32, String) {
    let wrapped = format!("({line})");
    let tokens = match interpreter::lexer::tokenize(&wrapped, 1) {
        Ok(tokens) => tokens,
        Err(e) => {
            let error = Error::from(e);
            return (error.code(), error.to_string());
        },
    };
    if let Some(keyword) = tokens.iter().find(|t| t.kind == TokenKind::Keyword) {
        let error = Error::from(error::SyntaxError::new(keyword.clone()));
        return (error.code(), error.to_string());
    }
    expression::Parser::new(tokens).eval(env)
}
