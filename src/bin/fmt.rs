use std::{fs, path::{Path, PathBuf}};

use clap::Parser;
use silt::format_program;

/// Parses a silt script without evaluating it and prints the canonical
/// rendering: 4-space indentation, explicit semicolons, fully
/// parenthesized expressions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script file to format; standard input is read when omitted.
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

    match format_program(&source) {
        Ok(text) => println!("{text}"),
        Err(error) => {
            println!("{error}");
            std::process::exit(error.code());
        },
    }
}
