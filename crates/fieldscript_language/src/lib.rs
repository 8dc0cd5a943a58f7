//! Fieldscript bytecode: expressions, decoding, and execution.
//!
//! This crate provides:
//! - [`Expr`] - Immutable expression nodes, evaluated lazily
//! - [`ExprStack`] - The decode-time operand stack
//! - [`opcode`] - The opcode table with per-instruction arity
//! - [`Instruction`] - The closed instruction catalog
//! - [`Decoder`] - Byte stream to [`Program`] conversion
//! - [`Vm`] - Single-instance interpreter over an [`ExecutionContext`]
//! - [`ScriptWriter`] - Script assembly for tools and tests
//!
//! # Example
//!
//! ```
//! use fieldscript_language::{Cursor, Step, Vm, decode_program};
//! use fieldscript_language::opcode::{codes, encode_word};
//! use fieldscript_storage::FieldState;
//!
//! let bytes = encode_word(codes::THROUGHON, 0).to_le_bytes();
//! let program = decode_program("door", &bytes).unwrap();
//!
//! let mut field = FieldState::new(0);
//! let door = field.spawn_entity("door");
//! let mut cursor = Cursor::new();
//! let (step, _) = Vm::new().run(&program, &mut cursor, door, &mut field, 16).unwrap();
//! assert_eq!(step, Step::Halt);
//! assert!(field.is_passable(door).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod decoder;
pub mod disasm;
pub mod expr;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod stack;
pub mod vm;
pub mod writer;

pub use decoder::{Decoder, DecoderConfig, WordReader, decode_instruction, decode_program};
pub use expr::{BinaryOp, Expr, Operator, UnaryOp};
pub use instruction::Instruction;
pub use opcode::{OpcodeInfo, OpcodeKind, PushKind};
pub use program::Program;
pub use stack::{DEFAULT_STACK_LIMIT, ExprStack};
pub use vm::{Cursor, DEFAULT_MAX_CALL_DEPTH, ExecutionContext, Step, SuspendReason, Vm};
pub use writer::ScriptWriter;
