use std::{collections::HashMap, rc::Rc};

use crate::{ast::{Ast, Block, BlockKind},
            error::RuntimeError,
            interpreter::{environment::{EnvRef, EnvWeak},
                          lexer::{Token, TokenKind},
                          value::Value}};

/// Result type used by the evaluator.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Outcome of executing a node.
///
/// `return` is ordinary control flow, not an error: block execution
/// threads this signal upward until the nearest enclosing function call
/// intercepts it. Expression nodes always complete normally.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// The node completed and produced a value.
    Normal(Value),
    /// A `return` is unwinding toward the nearest call boundary.
    Return(Value),
}

/// One function activation: the callee's closure environment plus this
/// call's own parameter bindings.
///
/// Giving every call its own parameter map is what makes recursion safe;
/// free names still resolve (and write) through the single shared closure
/// environment.
struct Frame {
    env:    EnvRef,
    params: HashMap<String, Value>,
}

/// Holds the mutable state of one evaluation: the buffered `print` output
/// and the stack of function activations.
#[derive(Default)]
pub struct Runtime {
    output: String,
    frames: Vec<Frame>,
}

impl Runtime {
    /// Creates a runtime with an empty output buffer and no activations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets everything `print` has buffered so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Consumes the runtime, yielding the buffered output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }

    /// Evaluates one node against `env`.
    ///
    /// This is the single dispatch over the node kinds; blocks route to
    /// [`Self::eval_block`]. Declarations are inert here — their effect
    /// happens when the enclosing block walks past them.
    pub fn eval(&mut self, node: &Ast, env: &EnvRef) -> EvalResult<Flow> {
        match node {
            Ast::Literal { value } => Ok(Flow::Normal(value.clone())),
            Ast::Identifier { name } => Ok(Flow::Normal(self.lookup(name, env)?)),
            Ast::Operator { token, operands } => {
                self.eval_operator(token, operands, env).map(Flow::Normal)
            },
            Ast::Block(block) => self.eval_block(block),
            Ast::FunctionDecl(_) => Ok(Flow::Normal(Value::Null)),
            Ast::FunctionCall { name,
                                arguments,
                                env: site, } => {
                self.eval_call(name, arguments, site, env).map(Flow::Normal)
            },
        }
    }

    /// Evaluates a node in value position.
    ///
    /// A `Return` surfacing here has escaped every function body, which is
    /// the unguarded-`return` case; it is reported as a runtime error
    /// rather than guessed at.
    pub fn eval_value(&mut self, node: &Ast, env: &EnvRef) -> EvalResult<Value> {
        match self.eval(node, env)? {
            Flow::Normal(value) => Ok(value),
            Flow::Return(_) => Err(RuntimeError::ReturnOutsideFunction),
        }
    }

    /// Executes a block according to its kind.
    fn eval_block(&mut self, block: &Block) -> EvalResult<Flow> {
        let env = &block.env;
        match block.kind {
            BlockKind::Program | BlockKind::Bare | BlockKind::Else => {
                for statement in &block.statements {
                    if matches!(statement, Ast::FunctionDecl(_)) {
                        self.declare_next_function(block)?;
                    }
                    if let Flow::Return(value) = self.eval(statement, env)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal(Value::Null))
            },
            BlockKind::If => {
                let Value::Bool(test) = self.eval_value(&block.statements[0], env)? else {
                    return Err(RuntimeError::ConditionNotBool);
                };
                if test {
                    self.eval(&block.statements[1], env)
                } else if let Some(alternative) = block.statements.get(2) {
                    self.eval(alternative, env)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            },
            BlockKind::While => {
                loop {
                    let Value::Bool(test) = self.eval_value(&block.statements[0], env)? else {
                        return Err(RuntimeError::ConditionNotBool);
                    };
                    if !test {
                        break;
                    }
                    if let Flow::Return(value) = self.eval(&block.statements[1], env)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal(Value::Null))
            },
            BlockKind::Print => {
                let value = self.eval_value(&block.statements[0], env)?;
                self.output.push_str(&value.to_string());
                self.output.push('\n');
                Ok(Flow::Normal(Value::Null))
            },
            BlockKind::Return => {
                let expression = &block.statements[0];
                if expression.is_blank() {
                    Ok(Flow::Return(Value::Null))
                } else {
                    let value = self.eval_value(expression, env)?;
                    Ok(Flow::Return(value))
                }
            },
        }
    }

    /// Runs the next pending function declaration of `block`, if any.
    ///
    /// First execution only: binds the function value into the block's
    /// environment, then copies that environment's bindings into the
    /// function's closure environment (so the closure captures the
    /// function itself, and recursion resolves). The cursor makes every
    /// later execution of the block a no-op.
    fn declare_next_function(&mut self, block: &Block) -> EvalResult<()> {
        let index = block.next_function.get();
        if index >= block.functions.len() {
            return Ok(());
        }
        let function = &block.functions[index];
        block.env
             .borrow_mut()
             .add(&function.name, Value::Function(Rc::downgrade(function)));
        let closure = function.closure
                              .upgrade()
                              .ok_or(RuntimeError::StaleEnvironment)?;
        closure.borrow_mut().copy(&block.env.borrow());
        // A declaration executing inside a call also captures that call's
        // parameters; they shadow any same-named environment bindings.
        if let Some(frame) = self.frames.last()
           && Rc::ptr_eq(&frame.env, &block.env)
        {
            let mut captured = closure.borrow_mut();
            for (name, value) in &frame.params {
                captured.add(name, value.clone());
            }
        }
        block.next_function.set(index + 1);
        Ok(())
    }

    /// Applies an operator node: assignment if the token is `=`, otherwise
    /// a binary operation over exactly two eagerly evaluated operands.
    fn eval_operator(&mut self,
                     token: &Token,
                     operands: &[Ast],
                     env: &EnvRef)
                     -> EvalResult<Value> {
        if token.kind == TokenKind::Assign {
            return self.eval_assignment(operands, env);
        }
        if operands.len() != 2 {
            return Err(RuntimeError::IllegalOperation);
        }
        let left = self.eval_value(&operands[0], env)?;
        let right = self.eval_value(&operands[1], env)?;
        self.apply_binary(&token.text, &left, &right)
    }

    /// Evaluates the assigned value (the first operand, the innermost of a
    /// chain), then binds it to every remaining operand, each of which
    /// must be an identifier. The value is the expression's result, which
    /// is how a chain cascades it outward.
    fn eval_assignment(&mut self, operands: &[Ast], env: &EnvRef) -> EvalResult<Value> {
        if operands.len() < 2 {
            return Err(RuntimeError::IllegalOperation);
        }
        let value = self.eval_value(&operands[0], env)?;
        for target in &operands[1..] {
            let Ast::Identifier { name } = target else {
                return Err(RuntimeError::InvalidAssignee);
            };
            self.assign(name, env, value.clone());
        }
        Ok(value)
    }

    /// Applies one non-assignment binary operator to two values.
    ///
    /// Arithmetic and relational operators require numbers; `& ^ |`
    /// require booleans (`^` is logical XOR). Equality never fails:
    /// mismatched kinds compare unequal, and both `==` and `!=` answer
    /// `false` for them. For `/` and `%` the divisor is checked before the
    /// left operand's type.
    #[allow(clippy::float_cmp)]
    fn apply_binary(&self, op: &str, left: &Value, right: &Value) -> EvalResult<Value> {
        match op {
            "+" => Ok(Value::Number(left.as_number()? + right.as_number()?)),
            "-" => Ok(Value::Number(left.as_number()? - right.as_number()?)),
            "*" => Ok(Value::Number(left.as_number()? * right.as_number()?)),
            "/" => {
                let divisor = right.as_number()?;
                if divisor == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok(Value::Number(left.as_number()? / divisor))
            },
            "%" => {
                let divisor = right.as_number()?;
                if divisor == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok(Value::Number(left.as_number()? % divisor))
            },
            "<" => Ok(Value::Bool(left.as_number()? < right.as_number()?)),
            "<=" => Ok(Value::Bool(left.as_number()? <= right.as_number()?)),
            ">" => Ok(Value::Bool(left.as_number()? > right.as_number()?)),
            ">=" => Ok(Value::Bool(left.as_number()? >= right.as_number()?)),
            "==" => Ok(Value::Bool(match (left, right) {
                           (Value::Number(a), Value::Number(b)) => a == b,
                           (Value::Bool(a), Value::Bool(b)) => a == b,
                           _ => false,
                       })),
            "!=" => Ok(Value::Bool(match (left, right) {
                           (Value::Number(a), Value::Number(b)) => a != b,
                           (Value::Bool(a), Value::Bool(b)) => a != b,
                           _ => false,
                       })),
            "&" => Ok(Value::Bool(left.as_bool()? && right.as_bool()?)),
            "^" => Ok(Value::Bool(left.as_bool()? != right.as_bool()?)),
            "|" => Ok(Value::Bool(left.as_bool()? || right.as_bool()?)),
            _ => Err(RuntimeError::IllegalOperation),
        }
    }

    /// Calls the function `name` resolves to in the call-site environment.
    ///
    /// Arguments are evaluated left-to-right in the caller's environment,
    /// then bound into a fresh activation frame over the callee's closure
    /// environment. The body's `Return` signal is intercepted exactly
    /// here; falling through yields `null`.
    fn eval_call(&mut self,
                 name: &str,
                 arguments: &[Ast],
                 site: &EnvWeak,
                 env: &EnvRef)
                 -> EvalResult<Value> {
        let site_env = site.upgrade().ok_or(RuntimeError::StaleEnvironment)?;
        let callee = match self.lookup_param(name, &site_env) {
            Some(value) => value,
            None => {
                let bindings = site_env.borrow();
                if !bindings.contains(name) {
                    return Err(RuntimeError::NotAFunction);
                }
                bindings.get(name)?
            },
        };
        let function = callee.as_function()?;
        let closure = function.closure
                              .upgrade()
                              .ok_or(RuntimeError::StaleEnvironment)?;

        if arguments.len() != function.params.len() {
            return Err(RuntimeError::ArgumentCountMismatch);
        }

        let mut params = HashMap::new();
        for (param, argument) in function.params.iter().zip(arguments) {
            params.insert(param.clone(), self.eval_value(argument, env)?);
        }

        let body_env = closure.clone();
        self.frames.push(Frame { env: closure, params });
        let outcome = self.eval(&function.body, &body_env);
        self.frames.pop();

        match outcome? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) => Ok(Value::Null),
        }
    }

    /// Reads the name through the current activation, if it is a parameter
    /// of the innermost call executing in this environment.
    fn lookup_param(&self, name: &str, env: &EnvRef) -> Option<Value> {
        let frame = self.frames.last()?;
        if Rc::ptr_eq(&frame.env, env) {
            frame.params.get(name).cloned()
        } else {
            None
        }
    }

    /// Resolves a name: the current activation's parameters first, then
    /// the environment the code was parsed against.
    fn lookup(&self, name: &str, env: &EnvRef) -> EvalResult<Value> {
        if let Some(value) = self.lookup_param(name, env) {
            return Ok(value);
        }
        env.borrow().get(name)
    }

    /// Binds a name: a parameter of the current activation rebinds in the
    /// frame; every other name writes through to the environment.
    fn assign(&mut self, name: &str, env: &EnvRef, value: Value) {
        if let Some(frame) = self.frames.last_mut()
           && Rc::ptr_eq(&frame.env, env)
           && frame.params.contains_key(name)
        {
            frame.params.insert(name.to_string(), value);
            return;
        }
        env.borrow_mut().add(name, value);
    }
}
