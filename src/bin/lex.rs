use std::{fs, path::{Path, PathBuf}};

use clap::Parser;
use silt::{error::Error,
           interpreter::lexer::{format_tokens, tokenize}};

/// Tokenizes a silt script and prints the token table: one token per line
/// with its line and column numbers.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script file to tokenize; standard input is read when omitted.
    file: Option<PathBuf>,
}

fn read_source(file: Option<&Path>) -> String {
    match file {
        Some(path) => fs::read_to_string(path).unwrap_or_else(|_| {
                          eprintln!("Failed to read the input file '{}'. Perhaps this file does not exist?",
                                    path.display());
                          std::process::exit(1);
                      }),
        None => std::io::read_to_string(std::io::stdin()).unwrap_or_else(|_| {
                    eprintln!("Failed to read standard input.");
                    std::process::exit(1);
                }),
    }
}

fn main() {
    let args = Args::parse();
    let source = read_source(args.file.as_deref());

    match tokenize(&source, 0) {
        Ok(tokens) => print!("{}", format_tokens(&tokens)),
        Err(e) => {
            let error = Error::from(e);
            println!("{error}");
            std::process::exit(error.code());
        },
    }
}
