#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can be raised while evaluating a program.
pub enum RuntimeError {
    /// Looked up a name with no binding in the environment.
    UnknownIdentifier {
        /// The name that failed to resolve.
        name: String,
    },
    /// An operator was applied to a value of the wrong kind.
    InvalidOperandType,
    /// Division or modulo by zero.
    DivisionByZero,
    /// An `if` or `while` condition evaluated to a non-boolean.
    ConditionNotBool,
    /// A call target did not resolve to a function value.
    NotAFunction,
    /// A call supplied the wrong number of arguments.
    ArgumentCountMismatch,
    /// The target of an assignment was not an identifier.
    InvalidAssignee,
    /// An operator node carried something other than two operands.
    IllegalOperation,
    /// A call went through a function whose environment is gone.
    StaleEnvironment,
    /// A `return` escaped to somewhere with no enclosing function.
    ReturnOutsideFunction,
    /// The expression builder finished with a leftover operand.
    ///
    /// Validation is supposed to make this unreachable; it is surfaced
    /// rather than recovered from.
    StackImbalance,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownIdentifier { name } => {
                write!(f, "Runtime error: unknown identifier {name}")
            },
            Self::InvalidOperandType => write!(f, "Runtime error: invalid operand type."),
            Self::DivisionByZero => write!(f, "Runtime error: division by zero."),
            Self::ConditionNotBool => write!(f, "Runtime error: condition is not a bool."),
            Self::NotAFunction => write!(f, "Runtime error: not a function."),
            Self::ArgumentCountMismatch => {
                write!(f, "Runtime error: incorrect argument count.")
            },
            Self::InvalidAssignee => write!(f, "Runtime error: invalid assignee."),
            Self::IllegalOperation => write!(f, "Runtime error: illegal operation."),
            Self::StaleEnvironment => {
                write!(f, "Runtime error: function environment no longer exists.")
            },
            Self::ReturnOutsideFunction => {
                write!(f, "Runtime error: return used outside of a function.")
            },
            Self::StackImbalance => {
                write!(f,
                       "Runtime error: expression stack should only have one remaining element.")
            },
        }
    }
}

impl std::error::Error for RuntimeError {}
