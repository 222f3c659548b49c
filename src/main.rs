use std::{fs, path::{Path, PathBuf}};

use clap::Parser;
use silt::run_program;

/// Runs a silt script: parses the whole program, evaluates it, and prints
/// everything the program printed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script file to execute; standard input is read when omitted.
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

    let outcome = run_program(&source);
    print!("{}", outcome.output);
    if let Some(error) = &outcome.error {
        println!("{error}");
        std::process::exit(outcome.status());
    }
}
