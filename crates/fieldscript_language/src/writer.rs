//! Script assembly.
//!
//! [`ScriptWriter`] emits words in the on-disk format. Jumps name a label
//! and are patched when the script is finished, so forward references work.
//! Labels mark group starts: place a label before the pushes that feed the
//! target instruction.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::collections::HashMap;

use fieldscript_foundation::{Error, ErrorKind, Result, VarBank};

use crate::expr::{BinaryOp, UnaryOp};
use crate::opcode::{codes, encode_word};

/// A jump word waiting for its label.
#[derive(Clone, Debug)]
struct Fixup {
    word: usize,
    opcode: u16,
    label: String,
}

/// Builds a script byte stream word by word.
#[derive(Clone, Debug, Default)]
pub struct ScriptWriter {
    words: Vec<u32>,
    labels: HashMap<String, usize>,
    fixups: Vec<Fixup>,
}

impl ScriptWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte offset of the next word.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.words.len() * 4
    }

    /// Emits an opcode word.
    pub fn op(&mut self, opcode: u16, parameter: i16) -> &mut Self {
        self.words.push(encode_word(opcode, parameter));
        self
    }

    /// Emits a raw word.
    pub fn raw(&mut self, word: u32) -> &mut Self {
        self.words.push(word);
        self
    }

    /// Pushes a constant, using the wide form when it does not fit 16 bits.
    pub fn push_const(&mut self, value: i32) -> &mut Self {
        match i16::try_from(value) {
            Ok(short) => self.op(codes::PSHN_L, short),
            Err(_) => self.op(codes::PSHN_X, 0).raw(value as u32),
        }
    }

    /// Pushes a variable, flag, or temp reference.
    pub fn push_var(&mut self, bank: VarBank, index: u16) -> &mut Self {
        let opcode = match bank {
            VarBank::Byte => codes::PSHM_B,
            VarBank::Word => codes::PSHM_W,
            VarBank::Long => codes::PSHM_L,
            VarBank::SignedByte => codes::PSHSM_B,
            VarBank::SignedWord => codes::PSHSM_W,
            VarBank::Flag => codes::PSHF,
            VarBank::Temp => codes::PSHI_L,
        };
        self.op(opcode, index as i16)
    }

    /// Combines the top two nodes.
    pub fn binary(&mut self, op: BinaryOp) -> &mut Self {
        self.op(codes::CAL, op.code())
    }

    /// Applies a unary operator to the top node.
    pub fn unary(&mut self, op: UnaryOp) -> &mut Self {
        self.op(codes::CAL, op.code())
    }

    /// Marks the current offset.
    pub fn label(&mut self, name: impl Into<String>) -> &mut Self {
        let offset = self.offset();
        self.labels.insert(name.into(), offset);
        self
    }

    /// Emits an unconditional jump.
    pub fn jmp(&mut self, label: impl Into<String>) -> &mut Self {
        self.jump(codes::JMP, label.into())
    }

    /// Emits a jump taken when the top node evaluates to zero.
    pub fn jpf(&mut self, label: impl Into<String>) -> &mut Self {
        self.jump(codes::JPF, label.into())
    }

    /// Emits a subroutine call.
    pub fn call(&mut self, label: impl Into<String>) -> &mut Self {
        self.jump(codes::CALL, label.into())
    }

    fn jump(&mut self, opcode: u16, label: String) -> &mut Self {
        self.fixups.push(Fixup {
            word: self.words.len(),
            opcode,
            label,
        });
        self.op(opcode, 0)
    }

    /// Patches jumps and returns the encoded stream.
    ///
    /// # Errors
    ///
    /// Fails if a jump names an undefined label or its distance does not fit
    /// the parameter.
    pub fn finish(&self) -> Result<Vec<u8>> {
        let mut words = self.words.clone();
        for fixup in &self.fixups {
            let target = *self.labels.get(&fixup.label).ok_or_else(|| {
                Error::new(ErrorKind::Assembly(format!("undefined label {}", fixup.label)))
            })?;
            let delta = (target as i64 - (fixup.word * 4) as i64) / 4;
            let parameter = i16::try_from(delta).map_err(|_| {
                Error::new(ErrorKind::Assembly(format!(
                    "jump to {} is too far",
                    fixup.label
                )))
            })?;
            words[fixup.word] = encode_word(fixup.opcode, parameter);
        }
        Ok(words.iter().flat_map(|w| w.to_le_bytes()).collect())
    }
}
