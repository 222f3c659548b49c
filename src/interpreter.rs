/// The environment module stores name→value bindings.
///
/// An environment is a flat mutable map used both as the global scope and
/// as a closure's captured bindings; there is no parent chain. Shared
/// handles (`EnvRef`/`EnvWeak`) encode the ownership model: the AST owns
/// environments, functions and call sites only reference them.
pub mod environment;
/// The evaluator module executes AST nodes and computes results.
///
/// The evaluator walks the tree, threads the `return` control signal
/// through block execution, maintains per-call activation frames, and
/// buffers `print` output. It is the core execution engine.
pub mod evaluator;
/// The lexer module tokenizes source code for further parsing.
///
/// The lexer reads raw text and produces a stream of classified tokens
/// with 1-based line/column positions, terminated by an end marker. It
/// reports lexical errors for unrecognized characters and malformed
/// numerals.
pub mod lexer;
/// The parser module builds the abstract syntax tree from tokens.
///
/// Split in two tiers: an operator-precedence expression parser working on
/// bounded token runs, and a recursive statement/block parser that drives
/// it. Both report syntax errors with the offending token.
pub mod parser;
/// The value module defines the runtime data types for evaluation.
///
/// Declares the `Value` tagged union (numbers, booleans, null, function
/// references) with its accessors and the canonical textual rendering.
pub mod value;
