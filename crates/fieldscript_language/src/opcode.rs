//! Opcode table and word encoding.
//!
//! Every script word is 32 bits, little-endian: the high half is the opcode
//! and the low half is a signed immediate parameter.
//!
//! Opcodes fall in two groups:
//! - push opcodes build one expression node on the decode stack;
//! - instruction opcodes pop exactly `arity` nodes and become an
//!   [`Instruction`].
//!
//! The arity is the compatibility contract with the binary format. An
//! opcode whose behavior is not modeled still declares its true arity and
//! decodes to [`Instruction::Placeholder`], so every following word stays
//! aligned.

#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::unnecessary_wraps)]

use fieldscript_foundation::{DecodeError, TEMP_SLOTS, VarBank, VarRef};

use crate::expr::Expr;
use crate::instruction::Instruction;

/// Opcode numbers.
pub mod codes {
    #![allow(missing_docs)]

    pub const NOP: u16 = 0x0000;
    pub const CAL: u16 = 0x0001;
    pub const JMP: u16 = 0x0002;
    pub const JPF: u16 = 0x0003;
    pub const CALL: u16 = 0x0004;
    pub const RET: u16 = 0x0006;
    pub const PSHN_L: u16 = 0x0007;
    pub const PSHI_L: u16 = 0x0008;
    pub const POPI_L: u16 = 0x0009;
    pub const PSHM_B: u16 = 0x000A;
    pub const PSHM_W: u16 = 0x000B;
    pub const PSHM_L: u16 = 0x000C;
    pub const PSHSM_B: u16 = 0x000D;
    pub const PSHSM_W: u16 = 0x000E;
    pub const POPM_B: u16 = 0x0010;
    pub const POPM_W: u16 = 0x0011;
    pub const POPM_L: u16 = 0x0012;
    pub const HALT: u16 = 0x001C;
    pub const BITON: u16 = 0x001D;
    pub const BITOFF: u16 = 0x001E;
    pub const PSHN_X: u16 = 0x0020;
    pub const PSHF: u16 = 0x0021;
    pub const WAIT: u16 = 0x0023;
    pub const MESW: u16 = 0x0024;
    pub const ANIME: u16 = 0x0025;
    pub const RND: u16 = 0x0026;
    pub const THROUGHON: u16 = 0x0027;
    pub const THROUGHOFF: u16 = 0x0028;
    pub const UNKNOWN1: u16 = 0x0030;
    pub const UNKNOWN2: u16 = 0x0031;
    pub const UNKNOWN3: u16 = 0x0032;
    pub const UNKNOWN4: u16 = 0x0033;
    pub const MUSICLOAD: u16 = 0x0040;
    pub const MUSICCHANGE: u16 = 0x0041;
    pub const FADEIN: u16 = 0x0042;
    pub const FADEOUT: u16 = 0x0043;
    pub const SHAKE: u16 = 0x0044;
}

/// Splits a script word into its opcode and immediate parameter.
#[must_use]
pub const fn split_word(word: u32) -> (u16, i16) {
    ((word >> 16) as u16, word as u16 as i16)
}

/// Packs an opcode and immediate parameter into a script word.
#[must_use]
pub const fn encode_word(opcode: u16, parameter: i16) -> u32 {
    ((opcode as u32) << 16) | (parameter as u16 as u32)
}

/// What a push opcode produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PushKind {
    /// A 16-bit literal from the immediate parameter.
    Literal,
    /// A 32-bit literal taken from the following word.
    WideLiteral,
    /// A reference into a variable bank, indexed by the parameter.
    Var(VarBank),
}

/// Everything an instruction constructor receives.
#[derive(Clone, Debug)]
pub struct Operands {
    /// The table entry being decoded.
    pub info: &'static OpcodeInfo,
    /// Immediate parameter from the word.
    pub parameter: i16,
    /// Byte offset of the instruction word.
    pub offset: usize,
    /// Popped operands, in push order.
    pub args: Vec<Expr>,
}

impl Operands {
    /// Takes the next operand in push order.
    fn take(&mut self) -> Expr {
        // `decode_instruction` pops exactly `arity` nodes before calling a
        // constructor, and every constructor takes no more than its arity.
        self.args.remove(0)
    }

    /// Byte offset a relative jump parameter points at.
    fn target(&self) -> i64 {
        self.offset as i64 + i64::from(self.parameter) * 4
    }

    fn temp_slot(&self) -> Result<u8, DecodeError> {
        match usize::try_from(self.parameter) {
            Ok(slot) if slot < TEMP_SLOTS => Ok(slot as u8),
            _ => Err(DecodeError::InvalidOperand {
                offset: self.offset,
                mnemonic: self.info.mnemonic,
                reason: format!("temp slot {} out of range 0..{TEMP_SLOTS}", self.parameter),
            }),
        }
    }
}

/// Instruction constructor stored in the table.
pub type Build = fn(Operands) -> Result<Instruction, DecodeError>;

/// The role an opcode plays while decoding.
#[derive(Copy, Clone, Debug)]
pub enum OpcodeKind {
    /// Pushes one expression node.
    Push(PushKind),
    /// Pops one or two nodes and pushes the combined expression.
    Calc,
    /// Pops `arity` nodes and yields an instruction.
    Instruction {
        /// Nodes consumed.
        arity: usize,
        /// Constructor.
        build: Build,
    },
}

/// One entry of the opcode table.
#[derive(Copy, Clone, Debug)]
pub struct OpcodeInfo {
    /// Opcode number.
    pub code: u16,
    /// Mnemonic used in diagnostics.
    pub mnemonic: &'static str,
    /// Decode role.
    pub kind: OpcodeKind,
    /// Decoded as a [`Instruction::Placeholder`] with no effect.
    pub placeholder: bool,
}

impl OpcodeInfo {
    /// Operands an instruction opcode consumes; `None` for push and `CAL`.
    #[must_use]
    pub const fn arity(&self) -> Option<usize> {
        match self.kind {
            OpcodeKind::Instruction { arity, .. } => Some(arity),
            OpcodeKind::Push(_) | OpcodeKind::Calc => None,
        }
    }

    /// Returns true if this opcode decodes to a placeholder.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

const fn push(code: u16, mnemonic: &'static str, kind: PushKind) -> OpcodeInfo {
    OpcodeInfo {
        code,
        mnemonic,
        kind: OpcodeKind::Push(kind),
        placeholder: false,
    }
}

const fn instr(code: u16, mnemonic: &'static str, arity: usize, build: Build) -> OpcodeInfo {
    OpcodeInfo {
        code,
        mnemonic,
        kind: OpcodeKind::Instruction { arity, build },
        placeholder: false,
    }
}

const fn stub(code: u16, mnemonic: &'static str, arity: usize) -> OpcodeInfo {
    OpcodeInfo {
        code,
        mnemonic,
        kind: OpcodeKind::Instruction {
            arity,
            build: placeholder,
        },
        placeholder: true,
    }
}

/// The opcode table, sorted by code.
pub static OPCODES: &[OpcodeInfo] = &[
    instr(codes::NOP, "NOP", 0, |_| Ok(Instruction::Nop)),
    OpcodeInfo {
        code: codes::CAL,
        mnemonic: "CAL",
        kind: OpcodeKind::Calc,
        placeholder: false,
    },
    instr(codes::JMP, "JMP", 0, |ops| {
        Ok(Instruction::Jmp {
            target: ops.target(),
        })
    }),
    instr(codes::JPF, "JPF", 1, |mut ops| {
        let condition = ops.take();
        Ok(Instruction::Jpf {
            condition,
            target: ops.target(),
        })
    }),
    instr(codes::CALL, "CALL", 0, |ops| {
        Ok(Instruction::Call {
            target: ops.target(),
        })
    }),
    instr(codes::RET, "RET", 0, |_| Ok(Instruction::Ret)),
    push(codes::PSHN_L, "PSHN_L", PushKind::Literal),
    push(codes::PSHI_L, "PSHI_L", PushKind::Var(VarBank::Temp)),
    instr(codes::POPI_L, "POPI_L", 1, |mut ops| {
        let slot = ops.temp_slot()?;
        Ok(Instruction::PopTemp {
            slot,
            value: ops.take(),
        })
    }),
    push(codes::PSHM_B, "PSHM_B", PushKind::Var(VarBank::Byte)),
    push(codes::PSHM_W, "PSHM_W", PushKind::Var(VarBank::Word)),
    push(codes::PSHM_L, "PSHM_L", PushKind::Var(VarBank::Long)),
    push(codes::PSHSM_B, "PSHSM_B", PushKind::Var(VarBank::SignedByte)),
    push(codes::PSHSM_W, "PSHSM_W", PushKind::Var(VarBank::SignedWord)),
    instr(codes::POPM_B, "POPM_B", 1, |ops| pop_mem(ops, VarBank::Byte)),
    instr(codes::POPM_W, "POPM_W", 1, |ops| pop_mem(ops, VarBank::Word)),
    instr(codes::POPM_L, "POPM_L", 1, |ops| pop_mem(ops, VarBank::Long)),
    instr(codes::HALT, "HALT", 0, |_| Ok(Instruction::Halt)),
    instr(codes::BITON, "BITON", 0, |ops| {
        Ok(Instruction::SetFlag {
            flag: ops.parameter as u16,
            value: true,
        })
    }),
    instr(codes::BITOFF, "BITOFF", 0, |ops| {
        Ok(Instruction::SetFlag {
            flag: ops.parameter as u16,
            value: false,
        })
    }),
    push(codes::PSHN_X, "PSHN_X", PushKind::WideLiteral),
    push(codes::PSHF, "PSHF", PushKind::Var(VarBank::Flag)),
    instr(codes::WAIT, "WAIT", 1, |mut ops| {
        Ok(Instruction::Wait { frames: ops.take() })
    }),
    instr(codes::MESW, "MESW", 2, |mut ops| {
        let channel = ops.take();
        let message = ops.take();
        Ok(Instruction::Mesw { channel, message })
    }),
    instr(codes::ANIME, "ANIME", 0, |ops| {
        Ok(Instruction::Anime {
            animation: ops.parameter as u16,
        })
    }),
    instr(codes::RND, "RND", 0, |ops| {
        Ok(Instruction::Rnd {
            slot: ops.temp_slot()?,
        })
    }),
    instr(codes::THROUGHON, "THROUGHON", 0, |_| Ok(Instruction::ThroughOn)),
    instr(codes::THROUGHOFF, "THROUGHOFF", 0, |_| {
        Ok(Instruction::ThroughOff)
    }),
    stub(codes::UNKNOWN1, "UNKNOWN1", 0),
    stub(codes::UNKNOWN2, "UNKNOWN2", 2),
    stub(codes::UNKNOWN3, "UNKNOWN3", 3),
    stub(codes::UNKNOWN4, "UNKNOWN4", 1),
    stub(codes::MUSICLOAD, "MUSICLOAD", 1),
    stub(codes::MUSICCHANGE, "MUSICCHANGE", 0),
    stub(codes::FADEIN, "FADEIN", 0),
    stub(codes::FADEOUT, "FADEOUT", 0),
    stub(codes::SHAKE, "SHAKE", 5),
];

fn pop_mem(mut ops: Operands, bank: VarBank) -> Result<Instruction, DecodeError> {
    Ok(Instruction::PopMem {
        var: VarRef::new(bank, ops.parameter as u16),
        value: ops.take(),
    })
}

fn placeholder(ops: Operands) -> Result<Instruction, DecodeError> {
    Ok(Instruction::Placeholder {
        opcode: ops.info.code,
        mnemonic: ops.info.mnemonic,
        args: ops.args,
    })
}

/// Looks up an opcode in the table.
#[must_use]
pub fn lookup(code: u16) -> Option<&'static OpcodeInfo> {
    OPCODES
        .binary_search_by_key(&code, |info| info.code)
        .ok()
        .map(|idx| &OPCODES[idx])
}

/// Looks up an opcode by mnemonic (case-insensitive).
#[must_use]
pub fn lookup_mnemonic(mnemonic: &str) -> Option<&'static OpcodeInfo> {
    OPCODES
        .iter()
        .find(|info| info.mnemonic.eq_ignore_ascii_case(mnemonic))
}

/// Arity of an instruction opcode, `None` for push opcodes and unknown codes.
#[must_use]
pub fn arity(code: u16) -> Option<usize> {
    lookup(code).and_then(OpcodeInfo::arity)
}
