//! The script interpreter.
//!
//! [`Vm::step`] executes one instruction of a [`Program`] at a [`Cursor`]
//! against an [`ExecutionContext`]. The cursor is the whole execution point
//! of an instance (program counter, call stack, temp slots) and is plain
//! data, so a suspended script can be serialized and restored without any
//! host concurrency primitive.
//!
//! # Blocking
//!
//! `WAIT`, `MESW` and `ANIME` advance the program counter and then report
//! [`Step::Suspend`]. Whoever drives the VM keeps the cursor until the
//! matching event arrives and then continues stepping from the saved
//! position; nothing is decoded again.

#![allow(clippy::cast_possible_truncation)]

mod context;

pub use context::ExecutionContext;

use std::fmt;

use fieldscript_foundation::{EntityId, RuntimeFault, TEMP_SLOTS, VarBank};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::instruction::Instruction;
use crate::program::Program;

/// Default bound on nested `CALL`s.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 16;

// =============================================================================
// Suspension
// =============================================================================

/// Why a script is waiting.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SuspendReason {
    /// Waiting for a number of frames to elapse.
    Timer {
        /// Frames requested, never negative.
        frames: i32,
    },
    /// Waiting for a message window to close.
    Dialogue {
        /// Window channel.
        channel: i32,
        /// Message id shown.
        message: i32,
    },
    /// Waiting for an animation to finish.
    Animation {
        /// Animated entity.
        entity: EntityId,
        /// Animation id.
        animation: u16,
    },
}

impl fmt::Display for SuspendReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer { frames } => write!(f, "timer({frames})"),
            Self::Dialogue { channel, message } => {
                write!(f, "dialogue(channel {channel}, message {message})")
            }
            Self::Animation { entity, animation } => {
                write!(f, "animation({animation} on {entity})")
            }
        }
    }
}

/// The outcome of executing one instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Execution can continue at the cursor.
    Continue,
    /// The script is blocked; the cursor already points past the blocking
    /// instruction.
    Suspend(SuspendReason),
    /// The script has ended.
    Halt,
}

// =============================================================================
// Cursor
// =============================================================================

/// The execution point of one script instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cursor {
    pc: usize,
    call_stack: Vec<usize>,
    temps: [i32; TEMP_SLOTS],
}

impl Cursor {
    /// Creates a cursor at the first instruction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cursor at an instruction index.
    #[must_use]
    pub fn at(pc: usize) -> Self {
        Self {
            pc,
            ..Self::default()
        }
    }

    /// Index of the next instruction.
    #[must_use]
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Number of pending returns.
    #[must_use]
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Return indices, innermost last.
    #[must_use]
    pub fn call_stack(&self) -> &[usize] {
        &self.call_stack
    }

    /// Temp slots.
    #[must_use]
    pub fn temps(&self) -> &[i32; TEMP_SLOTS] {
        &self.temps
    }

    fn temp_mut(&mut self, slot: u8) -> Result<&mut i32, RuntimeFault> {
        self.temps
            .get_mut(usize::from(slot))
            .ok_or(RuntimeFault::AddressOutOfRange {
                bank: VarBank::Temp,
                index: u16::from(slot),
            })
    }
}

// =============================================================================
// Vm
// =============================================================================

/// Executes decoded programs.
#[derive(Clone, Debug)]
pub struct Vm {
    max_call_depth: usize,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Creates a VM with the default call depth bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_call_depth(DEFAULT_MAX_CALL_DEPTH)
    }

    /// Creates a VM with a call depth bound.
    #[must_use]
    pub fn with_max_call_depth(max_call_depth: usize) -> Self {
        Self { max_call_depth }
    }

    /// Returns the call depth bound.
    #[must_use]
    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Executes the instruction at the cursor.
    ///
    /// `owner` is the entity the script runs on; passability and animation
    /// instructions act on it.
    ///
    /// # Errors
    ///
    /// Returns a [`RuntimeFault`] if the instruction cannot complete. The
    /// cursor is left at the faulting instruction.
    pub fn step<C>(
        &self,
        program: &Program,
        cursor: &mut Cursor,
        owner: EntityId,
        ctx: &mut C,
    ) -> Result<Step, RuntimeFault>
    where
        C: ExecutionContext + ?Sized,
    {
        let Some(instruction) = program.get(cursor.pc) else {
            return Ok(Step::Halt);
        };
        let next = cursor.pc + 1;

        match instruction {
            Instruction::Nop | Instruction::Placeholder { .. } => {}
            Instruction::Halt => return Ok(Step::Halt),
            Instruction::Jmp { target } => {
                cursor.pc = resolve(program, *target)?;
                return Ok(Step::Continue);
            }
            Instruction::Jpf { condition, target } => {
                if condition.evaluate(&*ctx, &cursor.temps)? == 0 {
                    cursor.pc = resolve(program, *target)?;
                    return Ok(Step::Continue);
                }
            }
            Instruction::Call { target } => {
                let dest = resolve(program, *target)?;
                if cursor.call_stack.len() >= self.max_call_depth {
                    return Err(RuntimeFault::CallStackOverflow {
                        limit: self.max_call_depth,
                    });
                }
                cursor.call_stack.push(next);
                cursor.pc = dest;
                return Ok(Step::Continue);
            }
            Instruction::Ret => {
                cursor.pc = cursor
                    .call_stack
                    .pop()
                    .ok_or(RuntimeFault::CallStackUnderflow)?;
                return Ok(Step::Continue);
            }
            Instruction::PopTemp { slot, value } => {
                let value = value.evaluate(&*ctx, &cursor.temps)?;
                *cursor.temp_mut(*slot)? = value;
            }
            Instruction::PopMem { var, value } => {
                let value = value.evaluate(&*ctx, &cursor.temps)?;
                ctx.write_var(var.bank, var.index, value)?;
            }
            Instruction::SetFlag { flag, value } => ctx.set_flag(*flag, *value)?,
            Instruction::Rnd { slot } => {
                let byte = ctx.random_byte();
                *cursor.temp_mut(*slot)? = i32::from(byte);
            }
            Instruction::ThroughOn => ctx.set_passable(owner, true)?,
            Instruction::ThroughOff => ctx.set_passable(owner, false)?,
            Instruction::Wait { frames } => {
                let frames = frames.evaluate(&*ctx, &cursor.temps)?.max(0);
                cursor.pc = next;
                return Ok(Step::Suspend(SuspendReason::Timer { frames }));
            }
            Instruction::Mesw { channel, message } => {
                let channel = channel.evaluate(&*ctx, &cursor.temps)?;
                let message = message.evaluate(&*ctx, &cursor.temps)?;
                cursor.pc = next;
                return Ok(Step::Suspend(SuspendReason::Dialogue { channel, message }));
            }
            Instruction::Anime { animation } => {
                cursor.pc = next;
                return Ok(Step::Suspend(SuspendReason::Animation {
                    entity: owner,
                    animation: *animation,
                }));
            }
        }

        cursor.pc = next;
        Ok(Step::Continue)
    }

    /// Steps until the script suspends, halts, or `limit` instructions ran.
    ///
    /// Returns [`Step::Continue`] when the limit was reached, along with the
    /// number of instructions executed.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuntimeFault`].
    pub fn run<C>(
        &self,
        program: &Program,
        cursor: &mut Cursor,
        owner: EntityId,
        ctx: &mut C,
        limit: usize,
    ) -> Result<(Step, usize), RuntimeFault>
    where
        C: ExecutionContext + ?Sized,
    {
        for executed in 0..limit {
            match self.step(program, cursor, owner, ctx)? {
                Step::Continue => {}
                Step::Halt if program.get(cursor.pc).is_none() => return Ok((Step::Halt, executed)),
                stop => return Ok((stop, executed + 1)),
            }
        }
        Ok((Step::Continue, limit))
    }
}

fn resolve(program: &Program, target: i64) -> Result<usize, RuntimeFault> {
    program
        .resolve(target)
        .ok_or(RuntimeFault::UnresolvedJump { target })
}
