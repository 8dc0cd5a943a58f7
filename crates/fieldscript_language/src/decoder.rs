//! Byte stream decoder.
//!
//! Decoding walks the stream word by word. Push opcodes and `CAL` build
//! expression nodes on an [`ExprStack`]; every other opcode pops exactly its
//! declared arity and becomes one [`Instruction`]. The run of pushes feeding
//! an instruction, plus the instruction word itself, is a *group*. Jump
//! targets address group starts.
//!
//! The stack is created per decode pass and passed explicitly to each step.

#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use fieldscript_foundation::{DecodeError, TEMP_SLOTS, VarBank};

use crate::expr::{Expr, Operator};
use crate::instruction::Instruction;
use crate::opcode::{self, OpcodeInfo, OpcodeKind, Operands, PushKind};
use crate::program::Program;
use crate::stack::{DEFAULT_STACK_LIMIT, ExprStack};

// =============================================================================
// Configuration
// =============================================================================

/// Decoder settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum depth of the expression stack.
    pub max_stack_depth: usize,
    /// Require the stack to be empty after every instruction.
    ///
    /// When false, leftover nodes carry into the next group; the stream must
    /// still end with an empty stack.
    pub strict_balance: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: DEFAULT_STACK_LIMIT,
            strict_balance: true,
        }
    }
}

impl DecoderConfig {
    /// Sets the maximum stack depth.
    #[must_use]
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    /// Sets strict group balancing.
    #[must_use]
    pub fn with_strict_balance(mut self, strict: bool) -> Self {
        self.strict_balance = strict;
        self
    }
}

// =============================================================================
// Word reader
// =============================================================================

/// Reads little-endian 32-bit words from a byte slice.
#[derive(Clone, Debug)]
pub struct WordReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> WordReader<'a> {
    /// Creates a reader positioned at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Byte offset of the next word.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns true once every byte has been consumed.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Reads the next word, returning its offset.
    ///
    /// Returns `Ok(None)` at the end of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than four bytes remain.
    pub fn next_word(&mut self) -> Result<Option<(usize, u32)>, DecodeError> {
        let rest = &self.bytes[self.offset.min(self.bytes.len())..];
        if rest.is_empty() {
            return Ok(None);
        }
        let Some(chunk) = rest.first_chunk::<4>() else {
            return Err(DecodeError::Truncated {
                offset: self.offset,
                needed: 4 - rest.len(),
            });
        };
        let offset = self.offset;
        self.offset += 4;
        Ok(Some((offset, u32::from_le_bytes(*chunk))))
    }

    /// Reads a word that must be present, such as a wide literal.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] at the end of the stream.
    pub fn expect_word(&mut self) -> Result<u32, DecodeError> {
        let offset = self.offset;
        self.next_word()?
            .map(|(_, word)| word)
            .ok_or(DecodeError::Truncated { offset, needed: 4 })
    }
}

// =============================================================================
// Decode steps
// =============================================================================

/// Decodes one instruction word, popping exactly its arity from `stack`.
///
/// `offset` is the byte offset of the instruction word; relative jump
/// targets are computed from it.
///
/// # Errors
///
/// - [`DecodeError::UnknownOpcode`] if the opcode is not in the table or is
///   not an instruction opcode.
/// - [`DecodeError::StackUnderflow`] if fewer than `arity` nodes are pushed.
///   The stack is left untouched.
/// - [`DecodeError::InvalidOperand`] if the parameter is out of range.
pub fn decode_instruction(
    opcode: u16,
    parameter: i16,
    offset: usize,
    stack: &mut ExprStack,
) -> Result<Instruction, DecodeError> {
    let info = opcode::lookup(opcode).ok_or(DecodeError::UnknownOpcode { offset, opcode })?;
    let OpcodeKind::Instruction { arity, build } = info.kind else {
        return Err(DecodeError::UnknownOpcode { offset, opcode });
    };
    build_instruction(info, arity, build, parameter, offset, stack)
}

fn build_instruction(
    info: &'static OpcodeInfo,
    arity: usize,
    build: opcode::Build,
    parameter: i16,
    offset: usize,
    stack: &mut ExprStack,
) -> Result<Instruction, DecodeError> {
    let available = stack.len();
    let args = stack.pop_n(arity).ok_or(DecodeError::StackUnderflow {
        offset,
        mnemonic: info.mnemonic,
        arity,
        available,
    })?;
    build(Operands {
        info,
        parameter,
        offset,
        args,
    })
}

/// Decodes a push opcode into one node and pushes it.
fn decode_push(
    info: &'static OpcodeInfo,
    kind: PushKind,
    parameter: i16,
    offset: usize,
    reader: &mut WordReader<'_>,
    stack: &mut ExprStack,
) -> Result<(), DecodeError> {
    let node = match kind {
        PushKind::Literal => Expr::Constant(i32::from(parameter)),
        PushKind::WideLiteral => Expr::Constant(reader.expect_word()? as i32),
        PushKind::Var(VarBank::Temp) => {
            let slot = usize::try_from(parameter)
                .ok()
                .filter(|slot| *slot < TEMP_SLOTS)
                .ok_or_else(|| DecodeError::InvalidOperand {
                    offset,
                    mnemonic: info.mnemonic,
                    reason: format!("temp slot {parameter} out of range 0..{TEMP_SLOTS}"),
                })?;
            Expr::var(VarBank::Temp, slot as u16)
        }
        PushKind::Var(bank) => Expr::var(bank, parameter as u16),
    };
    stack.push(node, offset)
}

/// Pops the operands of a `CAL` and pushes the combined node.
fn decode_calc(parameter: i16, offset: usize, stack: &mut ExprStack) -> Result<(), DecodeError> {
    let operator = Operator::from_code(parameter).ok_or(DecodeError::UnknownOperator {
        offset,
        operator: parameter,
    })?;
    let arity = operator.arity();
    let available = stack.len();
    let underflow = DecodeError::StackUnderflow {
        offset,
        mnemonic: "CAL",
        arity,
        available,
    };
    let mut operands = stack.pop_n(arity).ok_or(underflow)?.into_iter();
    let node = match (operator, operands.next(), operands.next()) {
        (Operator::Unary(op), Some(operand), None) => Expr::unary(op, operand),
        (Operator::Binary(op), Some(left), Some(right)) => Expr::binary(op, left, right),
        _ => {
            return Err(DecodeError::StackUnderflow {
                offset,
                mnemonic: "CAL",
                arity,
                available,
            });
        }
    };
    stack.push(node, offset)
}

// =============================================================================
// Decoder
// =============================================================================

/// Turns byte streams into [`Program`]s.
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Creates a decoder with the given settings.
    #[must_use]
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Returns the decoder settings.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes a whole script.
    ///
    /// # Errors
    ///
    /// Returns the first [`DecodeError`] found. No partial program is built.
    pub fn decode(&self, name: &str, bytes: &[u8]) -> Result<Program, DecodeError> {
        let mut reader = WordReader::new(bytes);
        let mut stack = ExprStack::with_limit(self.config.max_stack_depth);
        let mut entries = Vec::new();
        let mut group_start = 0;

        while let Some((offset, word)) = reader.next_word()? {
            let (code, parameter) = opcode::split_word(word);
            let info = opcode::lookup(code).ok_or(DecodeError::UnknownOpcode {
                offset,
                opcode: code,
            })?;
            match info.kind {
                OpcodeKind::Push(kind) => {
                    decode_push(info, kind, parameter, offset, &mut reader, &mut stack)?;
                }
                OpcodeKind::Calc => decode_calc(parameter, offset, &mut stack)?,
                OpcodeKind::Instruction { arity, build } => {
                    let instruction =
                        build_instruction(info, arity, build, parameter, offset, &mut stack)?;
                    if self.config.strict_balance && !stack.is_empty() {
                        return Err(DecodeError::StackImbalance {
                            offset,
                            mnemonic: info.mnemonic,
                            depth: stack.len(),
                        });
                    }
                    entries.push((group_start, instruction));
                    group_start = reader.offset();
                }
            }
        }

        if !stack.is_empty() {
            return Err(DecodeError::DanglingOperands { depth: stack.len() });
        }
        Ok(Program::new(name, entries, bytes.len()))
    }
}

/// Decodes a script with the default settings.
///
/// # Errors
///
/// Returns the first [`DecodeError`] found.
pub fn decode_program(name: &str, bytes: &[u8]) -> Result<Program, DecodeError> {
    Decoder::default().decode(name, bytes)
}
