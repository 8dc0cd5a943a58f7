//! Error types for the Fieldscript system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Two failure classes matter to the engine and are kept apart:
//! - [`DecodeError`] is fatal to loading one script. A script that fails to
//!   decode never becomes a program and is never scheduled.
//! - [`RuntimeFault`] is fatal to one running instance only. Every other
//!   instance keeps running.

use std::fmt;

use thiserror::Error;

use crate::bank::VarBank;
use crate::entity::EntityId;

/// The main error type for Fieldscript operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an unknown script error.
    #[must_use]
    pub fn unknown_script(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownScript(name.into()))
    }

    /// Creates an unknown instance error.
    #[must_use]
    pub fn unknown_instance(id: u64) -> Self {
        Self::new(ErrorKind::UnknownInstance(id))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Self::new(ErrorKind::Decode(err))
    }
}

impl From<RuntimeFault> for Error {
    fn from(fault: RuntimeFault) -> Self {
        Self::new(ErrorKind::Fault(fault))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A script failed to decode.
    #[error("decode error: {0}")]
    Decode(DecodeError),

    /// A script instance faulted.
    #[error("runtime fault: {0}")]
    Fault(RuntimeFault),

    /// No script is registered under this name.
    #[error("unknown script: {0}")]
    UnknownScript(String),

    /// No live instance has this id.
    #[error("unknown instance: #{0}")]
    UnknownInstance(u64),

    /// A script could not be assembled.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// The instance exists but is not waiting on anything.
    #[error("instance #{0} is not suspended")]
    NotSuspended(u64),

    /// File system failure.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Snapshot encoding or decoding failure.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures while turning a byte stream into a program.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream ended in the middle of a word or before a wide literal.
    #[error("truncated stream at offset {offset:#06x}: needed {needed} more byte(s)")]
    Truncated {
        /// Byte offset of the incomplete read.
        offset: usize,
        /// Bytes missing.
        needed: usize,
    },

    /// The opcode is not in the table.
    #[error("unknown opcode {opcode:#06x} at offset {offset:#06x}")]
    UnknownOpcode {
        /// Byte offset of the word.
        offset: usize,
        /// The opcode found.
        opcode: u16,
    },

    /// `CAL` named an operator code that does not exist.
    #[error("unknown operator {operator} at offset {offset:#06x}")]
    UnknownOperator {
        /// Byte offset of the word.
        offset: usize,
        /// The operator code found.
        operator: i16,
    },

    /// Fewer expression nodes were available than the opcode consumes.
    #[error(
        "stack underflow at offset {offset:#06x}: {mnemonic} needs {arity} operand(s), {available} available"
    )]
    StackUnderflow {
        /// Byte offset of the word.
        offset: usize,
        /// Mnemonic of the consuming opcode.
        mnemonic: &'static str,
        /// Operands the opcode consumes.
        arity: usize,
        /// Operands that were on the stack.
        available: usize,
    },

    /// Nodes were left on the stack after an instruction consumed its operands.
    #[error("stack imbalance after {mnemonic} at offset {offset:#06x}: {depth} node(s) left")]
    StackImbalance {
        /// Byte offset of the instruction word.
        offset: usize,
        /// Mnemonic of the instruction.
        mnemonic: &'static str,
        /// Depth remaining after it.
        depth: usize,
    },

    /// The stream ended with nodes still pushed.
    #[error("stream ended with {depth} unconsumed expression node(s)")]
    DanglingOperands {
        /// Depth at end of stream.
        depth: usize,
    },

    /// More nodes were pushed than the decoder allows.
    #[error("expression stack overflow at offset {offset:#06x} (limit {limit})")]
    StackOverflow {
        /// Byte offset of the push.
        offset: usize,
        /// Configured maximum depth.
        limit: usize,
    },

    /// The immediate parameter is not valid for the opcode.
    #[error("invalid operand for {mnemonic} at offset {offset:#06x}: {reason}")]
    InvalidOperand {
        /// Byte offset of the word.
        offset: usize,
        /// Mnemonic of the opcode.
        mnemonic: &'static str,
        /// What was wrong.
        reason: String,
    },
}

impl DecodeError {
    /// Byte offset the error refers to, if it names one.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Truncated { offset, .. }
            | Self::UnknownOpcode { offset, .. }
            | Self::UnknownOperator { offset, .. }
            | Self::StackUnderflow { offset, .. }
            | Self::StackImbalance { offset, .. }
            | Self::StackOverflow { offset, .. }
            | Self::InvalidOperand { offset, .. } => Some(*offset),
            Self::DanglingOperands { .. } => None,
        }
    }
}

/// Failures that move one script instance to its faulted state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuntimeFault {
    /// A jump or call named an offset that is not an instruction boundary.
    #[error("unresolved jump target {target}")]
    UnresolvedJump {
        /// The byte offset that failed to resolve.
        target: i64,
    },

    /// `RET` with an empty call stack.
    #[error("call stack underflow")]
    CallStackUnderflow,

    /// `CALL` beyond the configured depth.
    #[error("call stack overflow (limit {limit})")]
    CallStackOverflow {
        /// Configured maximum depth.
        limit: usize,
    },

    /// Division or modulo by zero while evaluating an expression.
    #[error("division by zero")]
    DivisionByZero,

    /// A variable index past the end of its bank.
    #[error("address out of range: {bank}[{index}]")]
    AddressOutOfRange {
        /// The bank addressed.
        bank: VarBank,
        /// The index used.
        index: u16,
    },

    /// The context cannot serve this bank.
    #[error("bank {0} is not addressable here")]
    InvalidBank(VarBank),

    /// The entity handle does not name a live entity.
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Script name or file path.
    pub source: Option<String>,
    /// Byte offset within the script.
    pub offset: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the byte offset.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
            if let Some(offset) = self.offset {
                write!(f, " at {offset:#06x}")?;
            }
        }
        Ok(())
    }
}
