use logos::Logos;

use crate::error::LexicalError;

/// Internal scanning alphabet used by the logos-generated lexer.
///
/// These variants only describe what a run of characters *is*; positions and
/// the public token kinds are attached by [`tokenize`], which wraps the raw
/// scanner output into [`Token`] values.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = ScanError)]
#[logos(extras = LexerExtras)]
enum Lexeme {
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
    /// Numeric literal tokens, such as `42` or `3.14`.
    ///
    /// A digit run ending in a dot (`1.`, or the first half of `1..2`) is a
    /// maximal match of the second pattern and reported as a malformed
    /// numeral; a dot with no leading digits matches nothing at all.
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    #[regex(r"[0-9]+\.", malformed_number)]
    Number,
    /// `true` or `false`
    #[token("true")]
    #[token("false")]
    Boolean,
    /// `null`
    #[token("null")]
    Null,
    /// Reserved statement keywords.
    #[token("if")]
    #[token("else")]
    #[token("while")]
    #[token("print")]
    #[token("return")]
    #[token("def")]
    Keyword,
    /// Binary operators. `==` and `!=` win over `=` and a bare `!` by
    /// longest match; a bare `!` matches nothing and is a lexical error.
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("&")]
    #[token("^")]
    #[token("|")]
    #[token("<")]
    #[token("<=")]
    #[token(">")]
    #[token(">=")]
    #[token("==")]
    #[token("!=")]
    Op,
    /// `=`
    #[token("=")]
    Assign,
    /// Identifier tokens; names such as `x` or `countdown`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,
    /// Line breaks advance the line counter and reset the column origin.
    #[token("\n", newline)]
    Newline,
    /// Other whitespace only advances the column.
    #[regex(r"[ \t\r\f]+", logos::skip)]
    Whitespace,
}

/// Additional information carried by the lexer during tokenization.
///
/// Tracks the current line number and the byte offset where that line
/// starts, so token byte spans can be turned into 1-based columns.
#[derive(Debug, Default, Clone)]
pub struct LexerExtras {
    /// The current line number in the source being tokenized.
    pub line:       usize,
    /// Byte offset of the first character of the current line.
    pub line_start: usize,
}

/// Raw scanner failure, refined into [`LexicalError`] by [`tokenize`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ScanError {
    /// A character no rule accepts.
    #[default]
    UnexpectedCharacter,
    /// A digit run ending in a dot.
    MalformedNumber,
}

/// Rejects a digit run that ends in a dot.
fn malformed_number(_lex: &mut logos::Lexer<Lexeme>) -> Result<(), ScanError> {
    Err(ScanError::MalformedNumber)
}

/// Advances the line counter and marks the start of the next line.
fn newline(lex: &mut logos::Lexer<Lexeme>) -> logos::Skip {
    lex.extras.line += 1;
    lex.extras.line_start = lex.span().end;
    logos::Skip
}

/// The classification of a [`Token`], as consumed by both parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// A numeric literal such as `42` or `3.14`.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `null`.
    Null,
    /// A reserved statement keyword: `if else while print return def`.
    Keyword,
    /// A binary operator: `+ - * / % & ^ | < <= > >= == !=`.
    Op,
    /// The assignment operator `=`.
    Assign,
    /// A user-defined name.
    Identifier,
    /// The end-of-input marker appended to every token sequence.
    End,
}

/// A single classified token with its 1-based source position.
///
/// Tokens are immutable once produced; `text` preserves the exact source
/// spelling and is what error messages and the token dump print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The classification of this token.
    pub kind:   TokenKind,
    /// The exact source text that produced this token.
    pub text:   String,
    /// The 1-based line number where this token starts.
    pub line:   usize,
    /// The 1-based column where this token starts (shifted by the
    /// tokenizer's column offset on the first line).
    pub column: usize,
}

impl Token {
    /// Creates a token, cloning the given spelling.
    ///
    /// The parsers use this to synthesize the bounding parentheses and end
    /// markers around expression runs.
    #[must_use]
    pub fn new(kind: TokenKind, text: &str, line: usize, column: usize) -> Self {
        Self { kind,
               text: text.to_string(),
               line,
               column }
    }

    /// Creates the end-of-input marker at the given position.
    #[must_use]
    pub fn end(line: usize, column: usize) -> Self {
        Self::new(TokenKind::End, "END", line, column)
    }

    /// Tests whether this token is the reserved keyword `word`.
    #[must_use]
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    /// Gets the column one past the end of this token's text.
    #[must_use]
    pub fn end_column(&self) -> usize {
        self.column + self.text.chars().count()
    }
}

/// Converts a byte position into a 1-based column.
///
/// The caller-supplied offset shifts columns on the first line only: a
/// newline resets the column origin and cancels it. Callers that wrap a raw
/// line in synthetic parentheses pass offset 1 so the reported columns match
/// the unwrapped input.
fn column_at(extras: &LexerExtras, position: usize, offset: usize) -> usize {
    let column = position - extras.line_start + 1;
    if extras.line == 1 {
        column.saturating_sub(offset)
    } else {
        column
    }
}

/// Tokenizes `source` into an ordered token sequence ending in `END`.
///
/// Line and column numbering is 1-based; `offset` shifts the reported
/// columns of the first line left (see [`column_at`]).
///
/// # Errors
/// Returns a [`LexicalError`] carrying the position of the first
/// unrecognized character or malformed numeral; a malformed numeral is
/// reported one column past its digits, matching where the scan stopped.
pub fn tokenize(source: &str, offset: usize) -> Result<Vec<Token>, LexicalError> {
    let mut lexer = Lexeme::lexer_with_extras(source,
                                              LexerExtras { line:       1,
                                                            line_start: 0, });
    let mut tokens = Vec::new();

    while let Some(scanned) = lexer.next() {
        let span = lexer.span();
        let line = lexer.extras.line;
        match scanned {
            Ok(lexeme) => {
                let kind = match lexeme {
                    Lexeme::LParen => TokenKind::LParen,
                    Lexeme::RParen => TokenKind::RParen,
                    Lexeme::LBrace => TokenKind::LBrace,
                    Lexeme::RBrace => TokenKind::RBrace,
                    Lexeme::Comma => TokenKind::Comma,
                    Lexeme::Semicolon => TokenKind::Semicolon,
                    Lexeme::Number => TokenKind::Number,
                    Lexeme::Boolean => TokenKind::Boolean,
                    Lexeme::Null => TokenKind::Null,
                    Lexeme::Keyword => TokenKind::Keyword,
                    Lexeme::Op => TokenKind::Op,
                    Lexeme::Assign => TokenKind::Assign,
                    Lexeme::Identifier => TokenKind::Identifier,
                    // Consumed by skip callbacks, never yielded.
                    Lexeme::Newline | Lexeme::Whitespace => continue,
                };
                tokens.push(Token { kind,
                                    text: lexer.slice().to_string(),
                                    line,
                                    column: column_at(&lexer.extras, span.start, offset) });
            },
            Err(ScanError::MalformedNumber) => {
                return Err(LexicalError::MalformedNumber { line,
                                                           column: column_at(&lexer.extras,
                                                                             span.end,
                                                                             offset) });
            },
            Err(ScanError::UnexpectedCharacter) => {
                return Err(LexicalError::UnexpectedCharacter { line,
                                                               column:
                                                                   column_at(&lexer.extras,
                                                                             span.start,
                                                                             offset) });
            },
        }
    }

    let column = column_at(&lexer.extras, source.len(), offset);
    tokens.push(Token::end(lexer.extras.line, column));
    Ok(tokens)
}

/// Renders the token-dump table: one line per token, line number width 4,
/// column number width 5, both right-aligned, two spaces, then the text.
#[must_use]
pub fn format_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&format!("{:>4}{:>5}  {}\n", token.line, token.column, token.text));
    }
    out
}
