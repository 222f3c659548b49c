use std::{fs,
          io::{self, BufRead},
          path::PathBuf};

use clap::Parser;
use silt::{error::SyntaxError,
           interpreter::{environment::Environment,
                         lexer::{TokenKind, tokenize},
                         parser::expression}};

/// Evaluates expressions line by line against one persistent environment,
/// printing each expression's canonical rendering and its value.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File of expression lines; standard input is read when omitted.
    file: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    let reader: Box<dyn BufRead> = match &args.file {
        Some(path) => {
            let file = fs::File::open(path).unwrap_or_else(|_| {
                           eprintln!("Failed to read the input file '{}'. Perhaps this file does not exist?",
                                     path.display());
                           std::process::exit(1);
                       });
            Box::new(io::BufReader::new(file))
        },
        None => Box::new(io::stdin().lock()),
    };

    let env = Environment::new_ref();
    for line in reader.lines() {
        let Ok(line) = line else { break };

        // The wrapper parens bound the run; offset 1 keeps reported
        // columns aligned with the unwrapped line.
        let wrapped = format!("({line})");
        let tokens = match tokenize(&wrapped, 1) {
            Ok(tokens) => tokens,
            Err(error) => {
                println!("{error}");
                continue;
            },
        };

        // Statements are not supported line-wise.
        if let Some(keyword) = tokens.iter().find(|t| t.kind == TokenKind::Keyword) {
            println!("{}", SyntaxError::new(keyword.clone()));
            continue;
        }

        let parser = expression::Parser::new(tokens);
        match parser.parse(&env) {
            Ok(expression) => println!("{}", expression.render()),
            Err(error) => {
                println!("{error}");
                continue;
            },
        }

        let (_status, text) = parser.eval(&env);
        println!("{text}");
    }
}
