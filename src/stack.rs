//! Last-in-first-out stack shared by the parser and the evaluator
//!
//! The parser keeps pending operators on it while the evaluator keeps
//! operands. Expressions rarely nest deeply, so the first elements live
//! inline without a heap allocation.

use smallvec::SmallVec;

const INLINE_CAPACITY: usize = 16;

/// Generic LIFO container
#[derive(Debug, Clone, PartialEq)]
pub struct Stack<T> {
    items: SmallVec<[T; INLINE_CAPACITY]>,
}

impl<T> Stack<T> {
    /// Create an empty stack
    pub fn new() -> Self {
        Self {
            items: SmallVec::new(),
        }
    }

    /// Push a value on top
    #[inline]
    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    /// Remove and return the top value
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Borrow the top value
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    /// Pop the top value only if `predicate` accepts it
    pub fn pop_if(&mut self, predicate: impl FnOnce(&T) -> bool) -> Option<T> {
        if self.peek().is_some_and(predicate) {
            self.pop()
        } else {
            None
        }
    }

    /// Number of values on the stack
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the stack holds nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}
