use std::rc::{Rc, Weak};

use crate::{ast::FunctionDecl, error::RuntimeError, interpreter::evaluator::EvalResult};

/// Represents a runtime value in the interpreter.
///
/// This is the tagged union that flows through evaluation: every expression
/// ultimately produces one of these, and environments map names to them.
#[derive(Debug, Clone)]
pub enum Value {
    /// A numeric value (double precision floating-point).
    Number(f64),
    /// A boolean value, `true` or `false`.
    Bool(bool),
    /// The absent value, `null`.
    Null,
    /// A reference to a declared function.
    ///
    /// The reference is non-owning: the AST owns function declarations, and
    /// a function's closure environment may hold the function itself as a
    /// value, so ownership has to break here to stay acyclic.
    Function(Weak<FunctionDecl>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Function(a), Self::Function(b)) => Weak::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl Value {
    /// Tests whether this value is a number.
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Tests whether this value is a boolean.
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Tests whether this value is `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Tests whether this value references a function.
    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// Converts the value to an `f64`, or fails with an operand-type error.
    pub fn as_number(&self) -> EvalResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            _ => Err(RuntimeError::InvalidOperandType),
        }
    }

    /// Converts the value to a `bool`, or fails with an operand-type error.
    pub fn as_bool(&self) -> EvalResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(RuntimeError::InvalidOperandType),
        }
    }

    /// Resolves the referenced function declaration.
    ///
    /// # Errors
    /// - [`RuntimeError::NotAFunction`] if the value is of another kind.
    /// - [`RuntimeError::StaleEnvironment`] if the declaration that backed
    ///   this reference no longer exists.
    pub fn as_function(&self) -> EvalResult<Rc<FunctionDecl>> {
        match self {
            Self::Function(weak) => weak.upgrade().ok_or(RuntimeError::StaleEnvironment),
            _ => Err(RuntimeError::NotAFunction),
        }
    }
}

impl std::fmt::Display for Value {
    /// Renders the value the way `print` and the line evaluator show it.
    ///
    /// Numbers use shortest-round-trip formatting with no forced trailing
    /// zeros; function references render as nothing.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Self::Null => write!(f, "null"),
            Self::Function(_) => Ok(()),
        }
    }
}
