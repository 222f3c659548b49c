use std::rc::Rc;

use crate::{ast::Ast,
            error::{Error, RuntimeError, SyntaxError},
            interpreter::{environment::{EnvRef, Environment},
                          evaluator::Runtime,
                          lexer::{Token, TokenKind},
                          value::Value}};

/// Binding strength of an operator spelling; higher binds tighter.
///
/// Parentheses sit above everything, assignment below everything. All
/// levels are left-associative except assignment.
fn precedence(text: &str) -> u8 {
    match text {
        "(" | ")" => 100,
        "*" | "/" | "%" => 10,
        "+" | "-" => 9,
        "<" | "<=" | ">" | ">=" => 8,
        "==" | "!=" => 7,
        "&" => 6,
        "^" => 5,
        "|" => 4,
        // assignment
        _ => 0,
    }
}

/// Wraps a raw expression run in the synthetic bounding parentheses and end
/// marker the parser operates on. Positions are derived from the run itself
/// so errors still point into the source.
pub(crate) fn bound(run: &[Token]) -> Vec<Token> {
    let (first_line, first_column) = run.first().map_or((1, 1), |t| (t.line, t.column));
    let (last_line, last_column) = run.last().map_or((1, 1), |t| (t.line, t.end_column()));
    let mut tokens = Vec::with_capacity(run.len() + 3);
    tokens.push(Token::new(TokenKind::LParen, "(", first_line, first_column));
    tokens.extend_from_slice(run);
    tokens.push(Token::new(TokenKind::RParen, ")", last_line, last_column));
    tokens.push(Token::end(last_line, last_column + 1));
    tokens
}

/// Precedence-driven parser for one bounded expression token run.
///
/// The run is expected to be wrapped by [`bound`] (or to be a whole
/// tokenized line that a driver wrapped in real parentheses) and to end
/// with the `END` marker.
pub struct Parser {
    input: Vec<Token>,
}

impl Parser {
    /// Creates a parser over one bounded token run.
    #[must_use]
    pub fn new(input: Vec<Token>) -> Self {
        Self { input }
    }

    /// Validates and parses the run into an expression tree.
    ///
    /// `env` is captured (non-owning) by any function-call nodes, which
    /// resolve their callee through the environment their call site was
    /// parsed in.
    ///
    /// # Errors
    /// [`SyntaxError`] for any structural violation; the stack-imbalance
    /// [`RuntimeError`] if the builder finishes in an impossible state.
    pub fn parse(&self, env: &EnvRef) -> Result<Ast, Error> {
        self.validate()?;
        self.build(env)
    }

    /// Validates the whole run before any tree is built.
    ///
    /// Checks, in stream order: parens stay balanced, operators never
    /// outnumber operands, no operator sits outside all parentheses, and
    /// the run does not end early (`END` at open depth, or as many
    /// operators as operands overall).
    fn validate(&self) -> Result<(), SyntaxError> {
        let tokens = &self.input;
        if tokens.len() == 1 && tokens[0].kind == TokenKind::End {
            return Err(SyntaxError::before(tokens[0].clone()));
        }

        let mut open: i64 = 0;
        let mut operators = 0usize;
        let mut operands = 0usize;
        for token in tokens {
            match token.kind {
                TokenKind::LParen => open += 1,
                TokenKind::RParen => open -= 1,
                TokenKind::Number
                | TokenKind::Identifier
                | TokenKind::Boolean
                | TokenKind::Null => operands += 1,
                TokenKind::Op | TokenKind::Assign => operators += 1,
                _ => {},
            }
            if operators > operands {
                return Err(SyntaxError::new(token.clone()));
            }
            if open < 0 {
                return Err(SyntaxError::before(token.clone()));
            }
            if open > 0 && token.kind == TokenKind::End {
                return Err(SyntaxError::before(token.clone()));
            }
            if open == 0 && token.kind == TokenKind::Op {
                return Err(SyntaxError::before(token.clone()));
            }
        }
        if operands == operators
           && let Some(last) = tokens.last()
        {
            return Err(SyntaxError::before(last.clone()));
        }
        if open > 0
           && let Some(last) = tokens.last()
        {
            return Err(SyntaxError::before(last.clone()));
        }
        Ok(())
    }

    /// Builds the expression tree with a pending-operator stack and a
    /// pending-operand stack.
    ///
    /// Each new operator reduces every pending operator that binds at
    /// least as tightly; assignment reduces only strictly tighter ones, so
    /// a chain like `a = b = 5` folds right-to-left. A closing paren
    /// reduces down to its opening partner.
    fn build(&self, env: &EnvRef) -> Result<Ast, Error> {
        let tokens = &self.input;
        let mut operators: Vec<Token> = Vec::new();
        let mut operands: Vec<Ast> = Vec::new();
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index];
            match token.kind {
                TokenKind::LParen => {
                    operators.push(token.clone());
                    index += 1;
                },
                TokenKind::RParen => {
                    loop {
                        let Some(top) = operators.last() else { break };
                        if top.kind == TokenKind::LParen {
                            operators.pop();
                            break;
                        }
                        Self::reduce(&mut operators, &mut operands, token)?;
                    }
                    index += 1;
                },
                TokenKind::Number => {
                    let value: f64 = token.text
                                          .parse()
                                          .map_err(|_| SyntaxError::new(token.clone()))?;
                    operands.push(Ast::Literal { value: Value::Number(value) });
                    index += 1;
                },
                TokenKind::Boolean => {
                    operands.push(Ast::Literal { value: Value::Bool(token.text == "true") });
                    index += 1;
                },
                TokenKind::Null => {
                    operands.push(Ast::Literal { value: Value::Null });
                    index += 1;
                },
                TokenKind::Assign => {
                    if operands.is_empty() {
                        return Err(SyntaxError::new(token.clone()).into());
                    }
                    loop {
                        let Some(top) = operators.last() else { break };
                        if top.kind == TokenKind::LParen
                           || precedence(&top.text) <= precedence(&token.text)
                        {
                            break;
                        }
                        Self::reduce(&mut operators, &mut operands, token)?;
                    }
                    operators.push(token.clone());
                    index += 1;
                },
                TokenKind::Op => {
                    if operands.is_empty() {
                        return Err(SyntaxError::new(token.clone()).into());
                    }
                    loop {
                        let Some(top) = operators.last() else { break };
                        if top.kind == TokenKind::LParen
                           || precedence(&top.text) < precedence(&token.text)
                        {
                            break;
                        }
                        if operands.len() == 1 {
                            return Err(SyntaxError::new(token.clone()).into());
                        }
                        Self::reduce(&mut operators, &mut operands, token)?;
                    }
                    operators.push(token.clone());
                    index += 1;
                },
                TokenKind::Identifier => {
                    if tokens.get(index + 1)
                             .is_some_and(|next| next.kind == TokenKind::LParen)
                    {
                        let call = self.parse_call(&mut index, env)?;
                        operands.push(call);
                    } else {
                        operands.push(Ast::Identifier { name: token.text.clone() });
                        index += 1;
                    }
                },
                TokenKind::End => {
                    index += 1;
                },
                TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Keyword
                | TokenKind::Comma
                | TokenKind::Semicolon => {
                    return Err(SyntaxError::new(token.clone()).into());
                },
            }
        }

        if let Some(top) = operators.last() {
            return Err(SyntaxError::before(top.clone()).into());
        }
        if operands.len() != 1 {
            return Err(RuntimeError::StackImbalance.into());
        }
        operands.pop()
                .ok_or_else(|| RuntimeError::StackImbalance.into())
    }

    /// Pops one pending operator and folds the top two operands under it.
    ///
    /// Left-associative reduction makes the second-popped operand the left
    /// child; assignment (right-associative) keeps the first-popped operand
    /// first, so the assigned value leads and the target follows.
    fn reduce(operators: &mut Vec<Token>,
              operands: &mut Vec<Ast>,
              at: &Token)
              -> Result<(), SyntaxError> {
        let Some(operator) = operators.pop() else {
            return Err(SyntaxError::new(at.clone()));
        };
        let (Some(first), Some(second)) = (operands.pop(), operands.pop()) else {
            return Err(SyntaxError::new(at.clone()));
        };
        let children = if operator.kind == TokenKind::Assign {
            vec![first, second]
        } else {
            vec![second, first]
        };
        operands.push(Ast::Operator { token:    operator,
                                      operands: children, });
        Ok(())
    }

    /// Parses a call starting at an identifier followed by `(`.
    ///
    /// Arguments are split on top-level commas (nested parens tracked),
    /// and each argument run is independently wrapped and re-parsed as its
    /// own bounded expression. The call consumes its closing paren. An
    /// empty or doubled argument is a syntax error at the comma; a
    /// trailing comma is tolerated.
    fn parse_call(&self, index: &mut usize, env: &EnvRef) -> Result<Ast, Error> {
        let tokens = &self.input;
        let name_token = tokens[*index].clone();
        *index += 2; // the name and its opening paren

        let mut arguments = Vec::new();
        loop {
            let Some(token) = tokens.get(*index) else {
                return Err(SyntaxError::before(name_token).into());
            };
            match token.kind {
                TokenKind::RParen => {
                    *index += 1;
                    break;
                },
                TokenKind::Comma => return Err(SyntaxError::new(token.clone()).into()),
                TokenKind::End => return Err(SyntaxError::before(token.clone()).into()),
                _ => {},
            }

            let start = *index;
            let mut depth = 0usize;
            while let Some(current) = tokens.get(*index) {
                match current.kind {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen if depth == 0 => break,
                    TokenKind::RParen => depth -= 1,
                    TokenKind::Comma if depth == 0 => break,
                    TokenKind::End => break,
                    _ => {},
                }
                *index += 1;
            }

            let run = &tokens[start..*index];
            arguments.push(Parser::new(bound(run)).parse(env)?);

            if tokens.get(*index)
                     .is_some_and(|t| t.kind == TokenKind::Comma)
            {
                *index += 1;
            }
        }

        Ok(Ast::FunctionCall { name:      name_token.text.clone(),
                               arguments,
                               env:       Rc::downgrade(env), })
    }

    /// Line-evaluator entry point: parse and evaluate this run against
    /// `env`, returning the status code and the rendered value or error.
    ///
    /// A failed run has zero observable effect: the environment is
    /// restored to its pre-call snapshot before the error is reported, so
    /// later runs against the same environment still work.
    #[must_use]
    pub fn eval(&self, env: &EnvRef) -> (i32, String) {
        let snapshot = env.borrow().clone();
        match self.parse(env) {
            Ok(expression) => {
                let mut runtime = Runtime::new();
                match runtime.eval_value(&expression, env) {
                    Ok(value) => (0, value.to_string()),
                    Err(error) => {
                        Self::roll_back(env, &snapshot);
                        let error = Error::from(error);
                        (error.code(), error.to_string())
                    },
                }
            },
            Err(error) => {
                Self::roll_back(env, &snapshot);
                (error.code(), error.to_string())
            },
        }
    }

    /// Restores `env` to the snapshot taken before a failed run.
    fn roll_back(env: &EnvRef, snapshot: &Environment) {
        let mut bindings = env.borrow_mut();
        bindings.clear();
        bindings.copy(snapshot);
    }
}
