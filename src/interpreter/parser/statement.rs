use std::rc::Rc;

use crate::{ast::{Ast, Block, BlockKind, FunctionDecl},
            error::{Error, SyntaxError},
            interpreter::{environment::{EnvRef, Environment},
                          lexer::{Token, TokenKind},
                          parser::expression},
            };

/// Recursive parser turning a full token stream into a program block.
///
/// Statements are recognized by their leading keyword; everything else is a
/// bare expression statement. Expressions are scanned greedily and handed
/// to the expression parser as bounded runs; braced sub-blocks are
/// extracted by balanced-brace counting and parsed recursively.
pub struct Parser {
    input: Vec<Token>,
}

impl Parser {
    /// Creates a parser over a tokenized program.
    #[must_use]
    pub fn new(input: Vec<Token>) -> Self {
        Self { input }
    }

    /// Parses the whole input into a program block.
    ///
    /// The global environment is created here; the returned program block
    /// owns it, and the second element of the pair hands the caller a
    /// handle for evaluation.
    ///
    /// # Errors
    /// [`SyntaxError`] for empty input, unbalanced brackets at any depth,
    /// or any malformed statement.
    pub fn parse(&self) -> Result<(Ast, EnvRef), Error> {
        let tokens = &self.input;
        if tokens.len() == 1 && tokens[0].kind == TokenKind::End {
            return Err(SyntaxError::before(tokens[0].clone()).into());
        }

        let mut open_paren: i64 = 0;
        let mut open_brace: i64 = 0;
        for token in tokens {
            match token.kind {
                TokenKind::LParen => open_paren += 1,
                TokenKind::RParen => open_paren -= 1,
                TokenKind::LBrace => open_brace += 1,
                TokenKind::RBrace => open_brace -= 1,
                _ => {},
            }
            if open_paren < 0 || open_brace < 0 {
                return Err(SyntaxError::new(token.clone()).into());
            }
        }
        if (open_paren > 0 || open_brace > 0)
           && let Some(last) = tokens.last()
        {
            return Err(SyntaxError::before(last.clone()).into());
        }

        let env = Environment::new_ref();
        let program = self.parse_block(tokens, &env, BlockKind::Program)?;
        Ok((program, env))
    }

    /// Parses one statement sequence into a block of the given kind.
    fn parse_block(&self, tokens: &[Token], env: &EnvRef, kind: BlockKind) -> Result<Ast, Error> {
        let mut block = Block::new(kind, env.clone());
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index];
            match token.kind {
                TokenKind::End => break,
                TokenKind::Keyword => match token.text.as_str() {
                    "if" => {
                        index += 1;
                        let statement = self.parse_if(tokens, &mut index, env)?;
                        block.statements.push(statement);
                    },
                    "while" => {
                        index += 1;
                        let condition = self.next_expression(tokens, &mut index, env)?;
                        let body = self.next_block(tokens, &mut index, env)?;
                        let mut repeat = Block::new(BlockKind::While, env.clone());
                        repeat.statements.push(condition);
                        repeat.statements.push(body);
                        block.statements.push(Ast::Block(repeat));
                    },
                    "print" | "return" => {
                        let statement_kind = if token.text == "print" {
                            BlockKind::Print
                        } else {
                            BlockKind::Return
                        };
                        index += 1;
                        let expression = self.next_expression(tokens, &mut index, env)?;
                        Self::expect_semicolon(tokens, &mut index)?;
                        let mut statement = Block::new(statement_kind, env.clone());
                        statement.statements.push(expression);
                        block.statements.push(Ast::Block(statement));
                    },
                    "def" => {
                        index += 1;
                        let function = self.parse_function(tokens, &mut index)?;
                        block.functions.push(Rc::clone(&function));
                        block.statements.push(Ast::FunctionDecl(function));
                    },
                    // a stray `else` has no `if` to attach to
                    _ => return Err(SyntaxError::new(token.clone()).into()),
                },
                _ => {
                    let expression = self.next_expression(tokens, &mut index, env)?;
                    Self::expect_semicolon(tokens, &mut index)?;
                    block.statements.push(expression);
                },
            }
        }

        Ok(Ast::Block(block))
    }

    /// Parses `if <expr> { … }` plus any `else if` / `else` continuation
    /// into a right-nested chain. `index` sits just past the `if` keyword.
    fn parse_if(&self, tokens: &[Token], index: &mut usize, env: &EnvRef) -> Result<Ast, Error> {
        let condition = self.next_expression(tokens, index, env)?;
        let body = self.next_block(tokens, index, env)?;
        let mut branch = Block::new(BlockKind::If, env.clone());
        branch.statements.push(condition);
        branch.statements.push(body);

        if tokens.get(*index).is_some_and(|t| t.is_keyword("else")) {
            *index += 1;
            let alternative = if tokens.get(*index).is_some_and(|t| t.is_keyword("if")) {
                *index += 1;
                self.parse_if(tokens, index, env)?
            } else {
                self.next_block(tokens, index, env)?
            };
            let mut arm = Block::new(BlockKind::Else, env.clone());
            arm.statements.push(alternative);
            branch.statements.push(Ast::Block(arm));
        }

        Ok(Ast::Block(branch))
    }

    /// Parses `def <name> ( <params> ) { … }`. `index` sits just past the
    /// `def` keyword.
    ///
    /// The closure environment is allocated here and the body is parsed
    /// against it, which makes the body block its owner; the declaration
    /// itself keeps only a non-owning handle.
    fn parse_function(&self,
                      tokens: &[Token],
                      index: &mut usize)
                      -> Result<Rc<FunctionDecl>, Error> {
        let name = match tokens.get(*index) {
            Some(token) if token.kind == TokenKind::Identifier => token.text.clone(),
            Some(token) => return Err(SyntaxError::new(token.clone()).into()),
            None => return Err(Self::unexpected_end(tokens).into()),
        };
        *index += 1;

        match tokens.get(*index) {
            Some(token) if token.kind == TokenKind::LParen => *index += 1,
            Some(token) => return Err(SyntaxError::new(token.clone()).into()),
            None => return Err(Self::unexpected_end(tokens).into()),
        }

        let mut params = Vec::new();
        if tokens.get(*index)
                 .is_some_and(|t| t.kind == TokenKind::RParen)
        {
            *index += 1;
        } else {
            loop {
                match tokens.get(*index) {
                    Some(token) if token.kind == TokenKind::Identifier => {
                        params.push(token.text.clone());
                        *index += 1;
                    },
                    Some(token) => return Err(SyntaxError::new(token.clone()).into()),
                    None => return Err(Self::unexpected_end(tokens).into()),
                }
                match tokens.get(*index) {
                    Some(token) if token.kind == TokenKind::Comma => *index += 1,
                    Some(token) if token.kind == TokenKind::RParen => {
                        *index += 1;
                        break;
                    },
                    Some(token) => return Err(SyntaxError::new(token.clone()).into()),
                    None => return Err(Self::unexpected_end(tokens).into()),
                }
            }
        }

        let closure = Environment::new_ref();
        let body = self.next_block(tokens, index, &closure)?;
        Ok(Rc::new(FunctionDecl { name,
                                  params,
                                  body,
                                  closure: Rc::downgrade(&closure) }))
    }

    /// Greedily scans the next expression run — up to a semicolon, a
    /// keyword, a `{`, or the end marker — and parses it as a bounded
    /// expression. An empty run yields the blank sentinel.
    fn next_expression(&self,
                       tokens: &[Token],
                       index: &mut usize,
                       env: &EnvRef)
                       -> Result<Ast, Error> {
        let start = *index;
        while let Some(token) = tokens.get(*index) {
            match token.kind {
                TokenKind::Semicolon
                | TokenKind::Keyword
                | TokenKind::LBrace
                | TokenKind::End => break,
                _ => *index += 1,
            }
        }

        let run = &tokens[start..*index];
        if run.is_empty() {
            return Ok(Ast::blank());
        }
        expression::Parser::new(expression::bound(run)).parse(env)
    }

    /// Extracts the next braced sub-block by balanced-brace counting and
    /// parses it recursively against `env`. `index` must sit on the `{`.
    fn next_block(&self, tokens: &[Token], index: &mut usize, env: &EnvRef) -> Result<Ast, Error> {
        let Some(open) = tokens.get(*index) else {
            return Err(Self::unexpected_end(tokens).into());
        };
        if open.kind != TokenKind::LBrace {
            return Err(SyntaxError::new(open.clone()).into());
        }

        let start = *index;
        let mut depth = 0usize;
        loop {
            let Some(token) = tokens.get(*index) else {
                return Err(Self::unexpected_end(tokens).into());
            };
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                TokenKind::End => return Err(SyntaxError::before(token.clone()).into()),
                _ => {},
            }
            *index += 1;
            if depth == 0 {
                break;
            }
        }

        let interior = &tokens[start + 1..*index - 1];
        if interior.is_empty() {
            return Ok(Ast::Block(Block::new(BlockKind::Bare, env.clone())));
        }

        let mut run = interior.to_vec();
        let last = &interior[interior.len() - 1];
        run.push(Token::end(last.line, last.end_column()));
        self.parse_block(&run, env, BlockKind::Bare)
    }

    /// Requires a semicolon at `index` and consumes it.
    fn expect_semicolon(tokens: &[Token], index: &mut usize) -> Result<(), SyntaxError> {
        match tokens.get(*index) {
            Some(token) if token.kind == TokenKind::Semicolon => {
                *index += 1;
                Ok(())
            },
            Some(token) => Err(SyntaxError::new(token.clone())),
            None => Err(Self::unexpected_end(tokens)),
        }
    }

    /// Flags running off the end of a token run. Runs are end-marker
    /// terminated, so this is a defensive report at the last position.
    fn unexpected_end(tokens: &[Token]) -> SyntaxError {
        let token = tokens.last().cloned().unwrap_or_else(|| Token::end(1, 1));
        SyntaxError::before(token)
    }
}
