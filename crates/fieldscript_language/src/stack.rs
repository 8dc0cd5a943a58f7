//! The decode-time expression stack.
//!
//! One stack lives for one decode pass and is passed explicitly to every
//! decode step. It never outlives the pass.

use fieldscript_foundation::DecodeError;

use crate::expr::Expr;

/// Default maximum depth of the expression stack.
pub const DEFAULT_STACK_LIMIT: usize = 64;

/// LIFO workspace holding expression nodes until an instruction consumes them.
#[derive(Clone, Debug)]
pub struct ExprStack {
    nodes: Vec<Expr>,
    limit: usize,
}

impl Default for ExprStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprStack {
    /// Creates an empty stack with the default depth limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_STACK_LIMIT)
    }

    /// Creates an empty stack with the given depth limit.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            nodes: Vec::new(),
            limit,
        }
    }

    /// Pushes a node decoded from the word at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::StackOverflow`] if the stack is full.
    pub fn push(&mut self, node: Expr, offset: usize) -> Result<(), DecodeError> {
        if self.nodes.len() >= self.limit {
            return Err(DecodeError::StackOverflow {
                offset,
                limit: self.limit,
            });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Pops the most recently pushed node.
    pub fn pop(&mut self) -> Option<Expr> {
        self.nodes.pop()
    }

    /// Pops exactly `n` nodes and returns them in push order.
    ///
    /// Leaves the stack untouched and returns `None` if fewer than `n` nodes
    /// are present.
    pub fn pop_n(&mut self, n: usize) -> Option<Vec<Expr>> {
        let split = self.nodes.len().checked_sub(n)?;
        Some(self.nodes.split_off(split))
    }

    /// Returns the top node without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Expr> {
        self.nodes.last()
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no nodes are pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
