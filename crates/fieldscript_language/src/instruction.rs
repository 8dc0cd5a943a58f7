//! The instruction catalog.
//!
//! Each variant owns the expression operands it popped when it was
//! decoded. Instructions are never mutated after decoding; running a
//! script again re-executes the same values against a changed context.

use std::fmt;

use fieldscript_foundation::{VarBank, VarRef};

use crate::expr::Expr;

/// A decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Does nothing.
    Nop,
    /// Unconditional jump to a byte offset.
    Jmp {
        /// Target byte offset, resolved when executed.
        target: i64,
    },
    /// Jump when the condition evaluates to zero.
    Jpf {
        /// Tested value.
        condition: Expr,
        /// Target byte offset, resolved when executed.
        target: i64,
    },
    /// Subroutine call.
    Call {
        /// Target byte offset, resolved when executed.
        target: i64,
    },
    /// Return from a subroutine.
    Ret,
    /// Ends the script.
    Halt,
    /// Stores a value into one of the instance's temp slots.
    PopTemp {
        /// Temp slot, always below `TEMP_SLOTS`.
        slot: u8,
        /// Stored value.
        value: Expr,
    },
    /// Stores a value into field memory.
    PopMem {
        /// Destination bank and address.
        var: VarRef,
        /// Stored value.
        value: Expr,
    },
    /// Sets or clears a flag.
    SetFlag {
        /// Flag number.
        flag: u16,
        /// New value.
        value: bool,
    },
    /// Blocks until the host reports the timer elapsed.
    Wait {
        /// Requested frame count.
        frames: Expr,
    },
    /// Opens a message window and blocks until it is closed.
    Mesw {
        /// Window channel.
        channel: Expr,
        /// Message id.
        message: Expr,
    },
    /// Plays an animation on the owning entity and blocks until it ends.
    Anime {
        /// Animation id.
        animation: u16,
    },
    /// Draws a random byte into a temp slot.
    Rnd {
        /// Temp slot, always below `TEMP_SLOTS`.
        slot: u8,
    },
    /// Makes the owning entity passable.
    ThroughOn,
    /// Makes the owning entity solid.
    ThroughOff,
    /// An opcode whose behavior is not modeled. Keeps its operands so the
    /// stream stays aligned and the instruction can still be rendered.
    Placeholder {
        /// Opcode the placeholder was decoded from.
        opcode: u16,
        /// Mnemonic from the opcode table.
        mnemonic: &'static str,
        /// Operands in push order.
        args: Vec<Expr>,
    },
}

impl Instruction {
    /// Mnemonic used in renderings and listings.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Jmp { .. } => "JMP",
            Self::Jpf { .. } => "JPF",
            Self::Call { .. } => "CALL",
            Self::Ret => "RET",
            Self::Halt => "HALT",
            Self::PopTemp { .. } => "POPI_L",
            Self::PopMem { var, .. } => match var.bank {
                VarBank::Byte | VarBank::SignedByte => "POPM_B",
                VarBank::Word | VarBank::SignedWord => "POPM_W",
                _ => "POPM_L",
            },
            Self::SetFlag { value: true, .. } => "BITON",
            Self::SetFlag { value: false, .. } => "BITOFF",
            Self::Wait { .. } => "WAIT",
            Self::Mesw { .. } => "MESW",
            Self::Anime { .. } => "ANIME",
            Self::Rnd { .. } => "RND",
            Self::ThroughOn => "THROUGHON",
            Self::ThroughOff => "THROUGHOFF",
            Self::Placeholder { mnemonic, .. } => *mnemonic,
        }
    }

    /// The expression operands captured at decode time, in push order.
    #[must_use]
    pub fn operands(&self) -> Vec<&Expr> {
        match self {
            Self::Jpf { condition, .. } => vec![condition],
            Self::PopTemp { value, .. } | Self::PopMem { value, .. } => vec![value],
            Self::Wait { frames } => vec![frames],
            Self::Mesw { channel, message } => vec![channel, message],
            Self::Placeholder { args, .. } => args.iter().collect(),
            Self::Nop
            | Self::Jmp { .. }
            | Self::Call { .. }
            | Self::Ret
            | Self::Halt
            | Self::SetFlag { .. }
            | Self::Anime { .. }
            | Self::Rnd { .. }
            | Self::ThroughOn
            | Self::ThroughOff => Vec::new(),
        }
    }

    /// Returns true for opcodes decoded without modeled behavior.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }

    /// Returns true if executing this instruction may suspend the script.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Wait { .. } | Self::Mesw { .. } | Self::Anime { .. })
    }

    /// Returns the jump or call target, if this instruction transfers control.
    #[must_use]
    pub fn target(&self) -> Option<i64> {
        match self {
            Self::Jmp { target } | Self::Jpf { target, .. } | Self::Call { target } => {
                Some(*target)
            }
            _ => None,
        }
    }
}

/// Writes `NAME(field: value, ...)`.
fn write_call(f: &mut fmt::Formatter<'_>, name: &str, fields: &[(&str, String)]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, (field, value)) in fields.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{field}: {value}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.mnemonic();
        match self {
            Self::Jmp { target } | Self::Call { target } => {
                write_call(f, name, &[("target", target.to_string())])
            }
            Self::Jpf { condition, target } => write_call(
                f,
                name,
                &[
                    ("condition", condition.to_string()),
                    ("target", target.to_string()),
                ],
            ),
            Self::PopTemp { slot, value } => write_call(
                f,
                name,
                &[("slot", slot.to_string()), ("value", value.to_string())],
            ),
            Self::PopMem { var, value } => write_call(
                f,
                name,
                &[
                    ("address", var.index.to_string()),
                    ("value", value.to_string()),
                ],
            ),
            Self::SetFlag { flag, .. } => write_call(f, name, &[("flag", flag.to_string())]),
            Self::Wait { frames } => write_call(f, name, &[("frames", frames.to_string())]),
            Self::Mesw { channel, message } => write_call(
                f,
                name,
                &[
                    ("channel", channel.to_string()),
                    ("message", message.to_string()),
                ],
            ),
            Self::Anime { animation } => {
                write_call(f, name, &[("animation", animation.to_string())])
            }
            Self::Rnd { slot } => write_call(f, name, &[("slot", slot.to_string())]),
            Self::Placeholder { args, .. } => {
                let labels: Vec<String> = (0..args.len()).map(|i| format!("arg{i}")).collect();
                let fields: Vec<(&str, String)> = labels
                    .iter()
                    .zip(args)
                    .map(|(label, arg)| (label.as_str(), arg.to_string()))
                    .collect();
                write_call(f, name, &fields)
            }
            Self::Nop | Self::Ret | Self::Halt | Self::ThroughOn | Self::ThroughOff => {
                write_call(f, name, &[])
            }
        }
    }
}
