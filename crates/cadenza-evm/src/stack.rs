//! Word stack

use crate::error::ExceptionalHalt;
use cadenza_primitives::U256;

/// Maximum number of words on the stack
pub const STACK_LIMIT: usize = 1024;

/// EVM stack (max 1024 words)
#[derive(Clone, Debug)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(STACK_LIMIT),
        }
    }

    /// Push a word
    #[inline]
    pub fn push(&mut self, value: U256) -> Result<(), ExceptionalHalt> {
        if self.data.len() >= STACK_LIMIT {
            return Err(ExceptionalHalt::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop the top word
    #[inline]
    pub fn pop(&mut self) -> Result<U256, ExceptionalHalt> {
        self.data.pop().ok_or(ExceptionalHalt::StackUnderflow)
    }

    /// Pop `N` words; index 0 is the former top
    #[inline]
    pub fn pop_n<const N: usize>(&mut self) -> Result<[U256; N], ExceptionalHalt> {
        if self.data.len() < N {
            return Err(ExceptionalHalt::StackUnderflow);
        }
        let mut out = [U256::zero(); N];
        for slot in out.iter_mut() {
            *slot = self.data.pop().ok_or(ExceptionalHalt::StackUnderflow)?;
        }
        Ok(out)
    }

    /// Word at `depth` below the top without removing it (0 = top)
    #[inline]
    pub fn peek(&self, depth: usize) -> Result<&U256, ExceptionalHalt> {
        if depth >= self.data.len() {
            return Err(ExceptionalHalt::StackUnderflow);
        }
        Ok(&self.data[self.data.len() - 1 - depth])
    }

    /// Top `n` words, top last; fails if fewer than `n` are present
    pub fn peek_n(&self, n: usize) -> Result<&[U256], ExceptionalHalt> {
        if n > self.data.len() {
            return Err(ExceptionalHalt::StackUnderflow);
        }
        Ok(&self.data[self.data.len() - n..])
    }

    /// Duplicate the word at 1-indexed `position` onto the top
    #[inline]
    pub fn dup(&mut self, position: usize) -> Result<(), ExceptionalHalt> {
        if position == 0 || position > self.data.len() {
            return Err(ExceptionalHalt::StackUnderflow);
        }
        let value = self.data[self.data.len() - position];
        self.push(value)
    }

    /// Exchange the top with the word `position` below it
    #[inline]
    pub fn swap(&mut self, position: usize) -> Result<(), ExceptionalHalt> {
        let len = self.data.len();
        if position == 0 || position >= len {
            return Err(ExceptionalHalt::StackUnderflow);
        }
        self.data.swap(len - 1, len - 1 - position);
        Ok(())
    }

    /// Current depth
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Contents, bottom first
    pub fn as_slice(&self) -> &[U256] {
        &self.data
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
