/// Operator-precedence parsing of bounded expression token runs.
///
/// Works with a pending-operator stack and a pending-operand stack over a
/// run wrapped in synthetic parentheses, validating the whole run before
/// building the tree. Also hosts the line-evaluator entry point with its
/// environment rollback contract.
pub mod expression;
/// Recursive parsing of statements and blocks.
///
/// Recognizes the statement forms (`if`/`else`, `while`, `print`,
/// `return`, `def`, bare expressions), extracts braced sub-blocks by
/// balanced counting, and delegates every expression to the expression
/// parser.
pub mod statement;
