use std::{cell::RefCell,
          collections::HashMap,
          rc::{Rc, Weak}};

use crate::{error::RuntimeError, interpreter::value::Value};

/// Shared handle to an [`Environment`].
///
/// Blocks hold these strongly (an AST keeps every environment it was parsed
/// against alive); functions and call sites hold [`EnvWeak`] to keep
/// ownership acyclic.
pub type EnvRef = Rc<RefCell<Environment>>;

/// Non-owning handle to an [`Environment`].
pub type EnvWeak = Weak<RefCell<Environment>>;

/// A flat, mutable name→value store.
///
/// Used both as the global scope and as a function's captured bindings.
/// There is deliberately no parent chain: a closure receives a one-time
/// shallow copy of its defining scope instead of a lookup path into it.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    values: HashMap<String, Value>,
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty environment behind a shared handle.
    #[must_use]
    pub fn new_ref() -> EnvRef {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Binds `name` to `value`, overwriting any previous binding.
    pub fn add(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks up `name` and clones its value out.
    ///
    /// # Errors
    /// [`RuntimeError::UnknownIdentifier`] if no binding exists.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownIdentifier { name: name.to_string() })
    }

    /// Tests whether `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Merges all of `other`'s bindings into `self`, overwriting on
    /// collision. This is the one-time shallow copy a closure environment
    /// receives when its declaration first executes.
    pub fn copy(&mut self, other: &Self) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
