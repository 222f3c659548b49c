use std::fs;

use silt::{error::Error,
           eval_line, format_program,
           interpreter::{environment::{EnvRef, Environment},
                         lexer::{TokenKind, format_tokens, tokenize},
                         parser::expression},
           run_program};
use walkdir::WalkDir;

fn run_ok(source: &str) -> String {
    let outcome = run_program(source);
    if let Some(e) = &outcome.error {
        panic!("Script failed: {e}\n{source}");
    }
    outcome.output
}

fn run_status(source: &str) -> i32 {
    let outcome = run_program(source);
    if outcome.error.is_none() {
        panic!("Script succeeded but was expected to fail:\n{source}");
    }
    outcome.status()
}

fn line_ok(env: &EnvRef, line: &str) -> String {
    let (status, text) = eval_line(env, line);
    assert_eq!(status, 0, "line failed: {line} -> {text}");
    text
}

fn line_err(env: &EnvRef, line: &str) -> (i32, String) {
    let (status, text) = eval_line(env, line);
    assert_ne!(status, 0, "line succeeded but was expected to fail: {line}");
    (status, text)
}

#[test]
fn precedence_orders_operators() {
    let env = Environment::new_ref();
    assert_eq!(line_ok(&env, "2 + 3 * 4"), "14");
    assert_eq!(line_ok(&env, "(2 + 3) * 4"), "20");
    assert_eq!(line_ok(&env, "2 * 3 % 4"), "2");
    assert_eq!(line_ok(&env, "1 + 2 < 4"), "true");
    assert_eq!(line_ok(&env, "1 < 2 == true"), "true");
    assert_eq!(line_ok(&env, "true & false | true"), "true");
    assert_eq!(line_ok(&env, "true | false ^ true"), "true");
}

#[test]
fn subtraction_is_left_associative() {
    let env = Environment::new_ref();
    assert_eq!(line_ok(&env, "10 - 3 - 2"), "5");
    assert_eq!(line_ok(&env, "100 / 10 / 2"), "5");
}

#[test]
fn chained_assignment_binds_every_target() {
    let env = Environment::new_ref();
    assert_eq!(line_ok(&env, "a = b = 5"), "5");
    assert_eq!(line_ok(&env, "a"), "5");
    assert_eq!(line_ok(&env, "b"), "5");
    assert_eq!(line_ok(&env, "a = b = c = a + 1"), "6");
    assert_eq!(line_ok(&env, "c"), "6");
}

#[test]
fn division_and_modulo_by_zero_fail() {
    let env = Environment::new_ref();
    let (status, text) = line_err(&env, "1 / 0");
    assert_eq!(status, 3);
    assert_eq!(text, "Runtime error: division by zero.");
    let (status, _) = line_err(&env, "1 % 0");
    assert_eq!(status, 3);
}

#[test]
fn failed_lines_leave_the_environment_intact() {
    let env = Environment::new_ref();
    let (status, _) = line_err(&env, "x");
    assert_eq!(status, 3);
    assert_eq!(line_ok(&env, "x = 1"), "1");
    assert_eq!(line_ok(&env, "x"), "1");

    // A failure rolls back bindings the same line already made.
    let (status, _) = line_err(&env, "y = (z = 2) + (1 / 0)");
    assert_eq!(status, 3);
    let (status, _) = line_err(&env, "z");
    assert_eq!(status, 3);
    assert_eq!(line_ok(&env, "x"), "1");
}

#[test]
fn heterogeneous_equality_never_errors() {
    let env = Environment::new_ref();
    assert_eq!(line_ok(&env, "1 == true"), "false");
    assert_eq!(line_ok(&env, "1 != true"), "false");
    assert_eq!(line_ok(&env, "null == null"), "false");
    assert_eq!(line_ok(&env, "1 == 1"), "true");
    assert_eq!(line_ok(&env, "true == true"), "true");
    assert_eq!(line_ok(&env, "2 != 3"), "true");
}

#[test]
fn logical_operators_require_booleans() {
    let env = Environment::new_ref();
    assert_eq!(line_ok(&env, "true ^ true"), "false");
    assert_eq!(line_ok(&env, "true ^ false"), "true");
    let (status, text) = line_err(&env, "1 & true");
    assert_eq!(status, 3);
    assert_eq!(text, "Runtime error: invalid operand type.");
}

#[test]
fn relational_operators_require_numbers() {
    let env = Environment::new_ref();
    assert_eq!(line_ok(&env, "2 <= 2"), "true");
    let (status, _) = line_err(&env, "true < false");
    assert_eq!(status, 3);
}

#[test]
fn division_by_zero_beats_left_operand_type() {
    let env = Environment::new_ref();
    let (_, text) = line_err(&env, "true / 0");
    assert_eq!(text, "Runtime error: division by zero.");
    let (_, text) = line_err(&env, "true / 2");
    assert_eq!(text, "Runtime error: invalid operand type.");
}

#[test]
fn invalid_assignment_targets_fail() {
    let env = Environment::new_ref();
    let (status, text) = line_err(&env, "5 = 3");
    assert_eq!(status, 3);
    assert_eq!(text, "Runtime error: invalid assignee.");
    let (status, _) = line_err(&env, "a + 1 = 3");
    assert_eq!(status, 3);
}

#[test]
fn statement_keywords_are_rejected_line_wise() {
    let env = Environment::new_ref();
    let (status, _) = line_err(&env, "print 1");
    assert_eq!(status, 2);
    let (status, _) = line_err(&env, "if true");
    assert_eq!(status, 2);
}

#[test]
fn unbalanced_brackets_fail_at_every_depth() {
    let env = Environment::new_ref();
    for line in ["(1 + 2", "((1 + 2)", "1 + 2)", "(((", "f(1", "f(1, (2"] {
        let (status, _) = line_err(&env, line);
        assert_eq!(status, 2, "expected a syntax error for: {line}");
    }
    assert_eq!(run_status("if 1 { "), 2);
    assert_eq!(run_status("if 1 { print 1; "), 2);
    assert_eq!(run_status("while true { { } "), 2);
    assert_eq!(run_status("x = 1; }"), 2);
    assert_eq!(run_status("print (1; "), 2);
}

#[test]
fn degenerate_inputs_are_syntax_errors() {
    let env = Environment::new_ref();
    let (status, _) = line_err(&env, "");
    assert_eq!(status, 2);
    let (status, _) = line_err(&env, "1 +");
    assert_eq!(status, 2);
    let (status, _) = line_err(&env, "+ 1");
    assert_eq!(status, 2);
    assert_eq!(run_status(""), 2);
    assert_eq!(run_status("x = 1"), 2); // missing semicolon
    assert_eq!(run_status("else { }"), 2); // stray else
    assert_eq!(run_status("def (a) { }"), 2); // missing name
    assert_eq!(run_status("def f(a, ) { }"), 2); // malformed parameters
    assert_eq!(run_status("def f(a { }"), 2);
    assert_eq!(run_status("if true print 1;"), 2); // missing brace
}

#[test]
fn functions_declare_capture_and_call() {
    let output = run_ok("def add(a, b) {\n    return a + b;\n}\nprint add(2, 3);\n");
    assert_eq!(output, "5\n");
}

#[test]
fn functions_fall_through_to_null() {
    assert_eq!(run_ok("def noop() { }\nprint noop();\n"), "null\n");
    assert_eq!(run_ok("def bare() {\n    return;\n}\nprint bare();\n"), "null\n");
}

#[test]
fn recursion_is_safe() {
    let source = r"
def factorial(n) {
    if n < 2 {
        return 1;
    }
    return n * factorial(n - 1);
}
print factorial(5);
";
    assert_eq!(run_ok(source), "120\n");
}

#[test]
fn parameters_do_not_leak_between_recursive_calls() {
    // The left operand is read before and after the nested call completes;
    // with per-call activations the outer `n` must survive the inner call.
    let source = r"
def probe(n) {
    if n == 0 {
        return 0;
    }
    ignored = probe(n - 1);
    return n;
}
print probe(3);
";
    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn functions_pass_as_values() {
    let source = r"
def double(x) {
    return x * 2;
}
def apply(f, v) {
    return f(v);
}
print apply(double, 5);
";
    assert_eq!(run_ok(source), "10\n");
}

#[test]
fn nested_declarations_capture_the_enclosing_call() {
    let source = r"
def outer(a) {
    def inner() {
        return a;
    }
    return inner();
}
print outer(7);
";
    assert_eq!(run_ok(source), "7\n");
}

#[test]
fn closures_copy_on_first_execution() {
    let source = r"
x = 1;
def f() {
    return x;
}
x = 2;
print f();
";
    assert_eq!(run_ok(source), "1\n");
}

#[test]
fn closure_and_defining_scope_mutate_independently() {
    let source = r"
x = 1;
def g() {
    x = 99;
    return x;
}
print g();
print x;
";
    assert_eq!(run_ok(source), "99\n1\n");
}

#[test]
fn closure_state_persists_across_calls() {
    let source = r"
count = 0;
def bump() {
    count = count + 1;
    return count;
}
print bump();
print bump();
print count;
";
    assert_eq!(run_ok(source), "1\n2\n0\n");
}

#[test]
fn call_errors_have_status_three() {
    assert_eq!(run_status("def f(a) {\n    return a;\n}\nprint f(1, 2);\n"), 3);
    assert_eq!(run_status("x = 1;\nprint x(2);\n"), 3);
    assert_eq!(run_status("print missing(1);\n"), 3);
}

#[test]
fn conditions_must_be_boolean() {
    assert_eq!(run_status("if 1 {\n    print 1;\n}\n"), 3);
    assert_eq!(run_status("while 0 {\n    print 1;\n}\n"), 3);
}

#[test]
fn while_loops_iterate() {
    let source = r"
i = 3;
while i > 0 {
    print i;
    i = i - 1;
}
";
    assert_eq!(run_ok(source), "3\n2\n1\n");
}

#[test]
fn if_else_chains_pick_one_branch() {
    let source = r"
n = 7;
if n % 2 == 0 {
    print 0;
}
else if n % 3 == 0 {
    print 1;
}
else if n % 7 == 0 {
    print 2;
}
else {
    print 3;
}
";
    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn top_level_return_is_a_runtime_error() {
    let outcome = run_program("return 1;");
    assert_eq!(outcome.status(), 3);
    assert_eq!(outcome.error.map(|e| e.to_string()).as_deref(),
               Some("Runtime error: return used outside of a function."));
}

#[test]
fn output_is_flushed_before_a_failure() {
    let outcome = run_program("print 1;\nprint 2;\nboom;\n");
    assert_eq!(outcome.output, "1\n2\n");
    assert_eq!(outcome.status(), 3);
}

#[test]
fn numbers_render_shortest_round_trip() {
    let env = Environment::new_ref();
    assert_eq!(line_ok(&env, "3 / 2"), "1.5");
    assert_eq!(line_ok(&env, "10 / 5"), "2");
    assert_eq!(line_ok(&env, "0.5 + 0.25"), "0.75");
    assert_eq!(line_ok(&env, "1000000 * 1000000"), "1000000000000");
    assert_eq!(line_ok(&env, "0 - 1.5"), "-1.5");
}

#[test]
fn value_model_predicates_and_rendering() {
    use silt::interpreter::value::Value;
    assert!(Value::Number(1.0).is_number());
    assert!(Value::Bool(true).is_bool());
    assert!(Value::Null.is_null());
    assert!(!Value::Null.is_number());
    assert!(!Value::Null.is_function());
    assert_eq!(Value::Number(1.5).to_string(), "1.5");
    assert_eq!(Value::Number(2.0).to_string(), "2");
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::Bool(false).to_string(), "false");
    assert_eq!(Value::Number(1.0), Value::Number(1.0));
    assert_ne!(Value::Number(1.0), Value::Bool(true));
    assert_ne!(Value::Null, Value::Bool(false));
}

#[test]
fn lexer_reports_positions() {
    let tokens = tokenize("x = 1;\nprint x;", 0).expect("tokenize failed");
    let positions: Vec<(usize, usize, &str)> =
        tokens.iter().map(|t| (t.line, t.column, t.text.as_str())).collect();
    assert_eq!(positions,
               vec![(1, 1, "x"),
                    (1, 3, "="),
                    (1, 5, "1"),
                    (1, 6, ";"),
                    (2, 1, "print"),
                    (2, 7, "x"),
                    (2, 8, ";"),
                    (2, 9, "END")]);
}

#[test]
fn lexer_offset_shifts_first_line_columns() {
    let plain = tokenize("1+2", 0).expect("tokenize failed");
    let shifted = tokenize("1+2", 1).expect("tokenize failed");
    let columns = |tokens: &[silt::interpreter::lexer::Token]| {
        tokens.iter().map(|t| t.column).collect::<Vec<_>>()
    };
    assert_eq!(columns(&plain), vec![1, 2, 3, 4]);
    assert_eq!(columns(&shifted), vec![0, 1, 2, 3]);
}

#[test]
fn malformed_numerals_are_lexical_errors() {
    let error = tokenize("1.", 0).expect_err("expected a lexical error");
    assert_eq!((error.line(), error.column()), (1, 3));
    assert_eq!(Error::from(error).code(), 1);

    let error = tokenize("1..2", 0).expect_err("expected a lexical error");
    assert_eq!((error.line(), error.column()), (1, 3));

    let error = tokenize(".5", 0).expect_err("expected a lexical error");
    assert_eq!((error.line(), error.column()), (1, 1));

    let error = tokenize("x = 1.2.3;", 0).expect_err("expected a lexical error");
    assert_eq!((error.line(), error.column()), (1, 8));
}

#[test]
fn unrecognized_characters_are_lexical_errors() {
    let error = tokenize("x = @;", 0).expect_err("expected a lexical error");
    assert_eq!((error.line(), error.column()), (1, 5));
    assert_eq!(error.to_string(), "Syntax error on line 1 column 5.");

    let error = tokenize("!x", 0).expect_err("a bare ! is not an operator");
    assert_eq!((error.line(), error.column()), (1, 1));
}

#[test]
fn two_character_operators_lex_as_one_token() {
    let tokens = tokenize("a <= b >= c == d != e", 0).expect("tokenize failed");
    let ops: Vec<&str> = tokens.iter()
                               .filter(|t| t.kind == TokenKind::Op)
                               .map(|t| t.text.as_str())
                               .collect();
    assert_eq!(ops, vec!["<=", ">=", "==", "!="]);
}

#[test]
fn token_dump_uses_the_fixed_width_layout() {
    let tokens = tokenize("print 12;", 0).expect("tokenize failed");
    assert_eq!(format_tokens(&tokens),
               "   1    1  print\n   1    7  12\n   1    9  ;\n   1   10  END\n");
}

#[test]
fn expressions_render_fully_parenthesized() {
    let env = Environment::new_ref();
    let render = |line: &str| {
        let tokens = tokenize(&format!("({line})"), 1).expect("tokenize failed");
        expression::Parser::new(tokens).parse(&env)
                                       .expect("parse failed")
                                       .render()
    };
    assert_eq!(render("2 + 3 * 4"), "(2 + (3 * 4))");
    assert_eq!(render("(2 + 3) * 4"), "((2 + 3) * 4)");
    assert_eq!(render("a = b = 5"), "(a = (b = 5))");
    assert_eq!(render("f(1, 2 + 3)"), "f(1, (2 + 3))");
    assert_eq!(render("1 < 2 == true"), "((1 < 2) == true)");
}

#[test]
fn programs_format_canonically() {
    let source = "x=1;if x<5{print x;}else if x<10{print 0;}else{print 1;}\
                  def f(a,b){return a+b;}while x<3{x=x+1;}";
    let expected = "(x = 1);\n\
                    if (x < 5) {\n    print x;\n}\n\
                    else if (x < 10) {\n    print 0;\n}\n\
                    else {\n    print 1;\n}\n\
                    def f(a, b) {\n    return (a + b);\n}\n\
                    while (x < 3) {\n    (x = (x + 1));\n}";
    assert_eq!(format_program(source).expect("format failed"), expected);
}

#[test]
fn formatting_round_trips() {
    let sources = ["x = 1; y = 2; print x + y;",
                   "def f() { }",
                   "def fib(n) { if n < 2 { return n; } return fib(n - 1) + fib(n - 2); }",
                   "if true { if false { print 1; } } else { print 2; }",
                   "while false { print 0; }",
                   "print 1 + 2 * 3 - 4 / 5;",
                   "a = b = c = 1; return;",
                   "print;"];
    for source in sources {
        let once = format_program(source)
            .unwrap_or_else(|e| panic!("format failed for {source}: {e}"));
        let twice = format_program(&once)
            .unwrap_or_else(|e| panic!("reformat failed for {once}: {e}"));
        assert_eq!(once, twice, "formatting is not a fixed point for: {source}");
    }
}

#[test]
fn fixture_programs_match_expected_output() {
    let mut count = 0;

    for entry in WalkDir::new("tests/programs").into_iter()
                                               .filter_map(Result::ok)
                                               .filter(|e| {
                                                   e.path()
                                                    .extension()
                                                    .is_some_and(|ext| ext == "silt")
                                               })
    {
        count += 1;
        let path = entry.path();
        let source =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
        let expected_path = path.with_extension("out");
        let expected = fs::read_to_string(&expected_path).unwrap_or_else(|e| {
                           panic!("Failed to read {expected_path:?}: {e}")
                       });

        let outcome = run_program(&source);
        if let Some(error) = &outcome.error {
            panic!("Fixture {path:?} failed: {error}");
        }
        assert_eq!(outcome.output, expected, "output mismatch for {path:?}");

        // Every fixture also has to survive the formatter unchanged.
        let once =
            format_program(&source).unwrap_or_else(|e| panic!("format failed for {path:?}: {e}"));
        let twice =
            format_program(&once).unwrap_or_else(|e| panic!("reformat failed for {path:?}: {e}"));
        assert_eq!(once, twice, "formatting is not a fixed point for {path:?}");
    }

    assert!(count > 0, "No fixture programs found in tests/programs");
}
