use std::{cell::Cell, rc::Rc};

use crate::interpreter::{environment::{EnvRef, EnvWeak},
                         lexer::{Token, TokenKind},
                         value::Value};

/// Placeholder name standing in for an absent expression.
///
/// `return;` and a bare `;` scan an empty expression run; the parser
/// represents it as an identifier with this name so the node set stays
/// closed. `return` treats it as "no value"; anything that actually
/// evaluates it fails the usual unknown-identifier way.
pub const BLANK: &str = "__blank__";

/// An abstract syntax tree node.
///
/// This closed set of variants covers the whole language: literal values,
/// name references, operator applications, statement blocks, function
/// declarations and function calls. One dispatch in the evaluator and one
/// in the renderer handle all of them.
#[derive(Debug)]
pub enum Ast {
    /// A literal value, precomputed at parse time.
    Literal {
        /// The constant value.
        value: Value,
    },
    /// Reference to a name in the environment.
    Identifier {
        /// The referenced name.
        name: String,
    },
    /// A binary operator application, or an assignment.
    ///
    /// Ordinary operators carry exactly two operands. For assignment the
    /// first operand is the assigned value and the remaining operands are
    /// the targets, which lets a right-folded chain like `a = b = 5`
    /// cascade one evaluated value into every assignee.
    Operator {
        /// The operator token; its text selects the operation.
        token:    Token,
        /// Ordered operand subtrees.
        operands: Vec<Ast>,
    },
    /// A statement block (program, braced block, or statement form).
    Block(Block),
    /// A function declaration statement.
    ///
    /// Shared between the statement list and the enclosing block's function
    /// table; the environment stores non-owning references to it.
    FunctionDecl(Rc<FunctionDecl>),
    /// A call of a named function.
    FunctionCall {
        /// The resolved callee name.
        name:      String,
        /// Ordered argument expression subtrees.
        arguments: Vec<Ast>,
        /// The environment the call site was parsed in, used to resolve the
        /// callee at evaluation time. Non-owning.
        env:       EnvWeak,
    },
}

/// What a [`Block`] means, and therefore how it executes and renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// The whole program.
    Program,
    /// A braced statement sequence.
    Bare,
    /// `if <cond> { … }` with an optional trailing else child.
    If,
    /// `while <cond> { … }`.
    While,
    /// `print <expr> ;`
    Print,
    /// `return [<expr>] ;`
    Return,
    /// The `else` arm of an `if`; its single child is either the else body
    /// or the next `if` of the chain.
    Else,
}

/// A statement sequence tagged with its meaning.
#[derive(Debug)]
pub struct Block {
    /// How this block executes and renders.
    pub kind:          BlockKind,
    /// Ordered child statements. For `If`/`While` the first child is the
    /// condition and the second the body; `If` may carry an `Else` third.
    pub statements:    Vec<Ast>,
    /// Function declarations registered in this block, in statement order.
    pub functions:     Vec<Rc<FunctionDecl>>,
    /// How many entries of `functions` have already taken effect.
    ///
    /// Declarations bind their name and capture their closure the first
    /// time the block executes past them; re-executions are no-ops.
    pub next_function: Cell<usize>,
    /// The environment this block was parsed against. Strong: the AST is
    /// what keeps closure environments alive.
    pub env:           EnvRef,
}

impl Block {
    /// Creates an empty block of the given kind over `env`.
    #[must_use]
    pub fn new(kind: BlockKind, env: EnvRef) -> Self {
        Self { kind,
               statements: Vec::new(),
               functions: Vec::new(),
               next_function: Cell::new(0),
               env }
    }

    /// Renders the statements of this block, one per line, each statement
    /// form carrying its own terminator.
    fn render_interior(&self) -> String {
        self.statements
            .iter()
            .map(Ast::render_statement)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders this block in the canonical source form.
    #[must_use]
    pub fn render(&self) -> String {
        match self.kind {
            BlockKind::Program => self.render_interior(),
            BlockKind::Bare => {
                if self.statements.is_empty() {
                    "{\n}".to_string()
                } else {
                    format!("{{\n{}\n}}", indent(&self.render_interior()))
                }
            },
            BlockKind::If => {
                let mut out = format!("if {} {}",
                                      self.statements[0].render(),
                                      self.statements[1].render());
                if let Some(alternative) = self.statements.get(2) {
                    out.push('\n');
                    out.push_str(&alternative.render());
                }
                out
            },
            BlockKind::While => {
                format!("while {} {}",
                        self.statements[0].render(),
                        self.statements[1].render())
            },
            BlockKind::Print => {
                if self.statements[0].is_blank() {
                    "print;".to_string()
                } else {
                    format!("print {};", self.statements[0].render())
                }
            },
            BlockKind::Return => {
                if self.statements[0].is_blank() {
                    "return;".to_string()
                } else {
                    format!("return {};", self.statements[0].render())
                }
            },
            // `else if` stays on one line so the rendering reparses to the
            // same right-nested chain.
            BlockKind::Else => format!("else {}", self.statements[0].render()),
        }
    }
}

/// A user-defined function.
///
/// Owns its parameter list and body strongly. The closure environment
/// reference is non-owning: the body block (parsed against that
/// environment) is what owns it, and the environment may hold this
/// function as a value.
#[derive(Debug)]
pub struct FunctionDecl {
    /// The declared name.
    pub name:    String,
    /// Parameter names, in order.
    pub params:  Vec<String>,
    /// The function body: a braced block parsed against the closure
    /// environment.
    pub body:    Ast,
    /// The closure environment allocated at parse time and populated the
    /// first time the declaration executes.
    pub closure: EnvWeak,
}

impl FunctionDecl {
    /// Renders the declaration in the canonical source form.
    #[must_use]
    pub fn render(&self) -> String {
        format!("def {}({}) {}", self.name, self.params.join(", "), self.body.render())
    }
}

impl Ast {
    /// Creates the blank sentinel standing for an absent expression.
    #[must_use]
    pub fn blank() -> Self {
        Self::Identifier { name: BLANK.to_string() }
    }

    /// Tests whether this node is the blank sentinel.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Identifier { name } if name == BLANK)
    }

    /// Renders this node to canonical source text.
    ///
    /// The rendering is deterministic and reparses to a structurally
    /// identical tree: 4-space indentation per brace level, explicit
    /// semicolons, every operator application fully parenthesized, and
    /// assignment chains shown target-first.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Literal { value } => value.to_string(),
            Self::Identifier { name } => {
                if name == BLANK {
                    String::new()
                } else {
                    name.clone()
                }
            },
            Self::Operator { token, operands } => {
                let rendered: Vec<String> = if token.kind == TokenKind::Assign {
                    // Operand order is value-first; source order is
                    // target-first.
                    operands.iter().rev().map(Self::render).collect()
                } else {
                    operands.iter().map(Self::render).collect()
                };
                format!("({})", rendered.join(&format!(" {} ", token.text)))
            },
            Self::Block(block) => block.render(),
            Self::FunctionDecl(function) => function.render(),
            Self::FunctionCall { name, arguments, .. } => {
                let rendered: Vec<String> = arguments.iter().map(Self::render).collect();
                format!("{}({})", name, rendered.join(", "))
            },
        }
    }

    /// Renders this node in statement position: expression statements get
    /// their terminating semicolon, statement forms render themselves.
    fn render_statement(&self) -> String {
        match self {
            Self::Block(_) | Self::FunctionDecl(_) => self.render(),
            _ => format!("{};", self.render()),
        }
    }
}

/// Indents every line of `text` by one 4-space level.
fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
