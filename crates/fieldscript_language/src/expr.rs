//! Expression nodes.
//!
//! Push opcodes build these on the decode stack and instructions capture
//! them as operands. A node is never evaluated while decoding: a variable
//! reference is read from the context each time the owning instruction
//! executes, so re-entering a script observes the current flags.

use std::fmt;

use fieldscript_foundation::{RuntimeFault, TEMP_SLOTS, VarBank, VarRef};

use crate::vm::ExecutionContext;

/// Unary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Two's complement negation (wrapping).
    Neg,
    /// Logical not: `1` if the operand is zero, else `0`.
    Not,
}

impl UnaryOp {
    /// The `CAL` parameter code for this operator.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Neg => 5,
            Self::Not => 15,
        }
    }

    fn apply(self, value: i32) -> i32 {
        match self {
            Self::Neg => value.wrapping_neg(),
            Self::Not => i32::from(value == 0),
        }
    }
}

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Wrapping multiplication.
    Mul,
    /// Truncating division; a zero divisor faults.
    Div,
    /// Remainder; a zero divisor faults.
    Mod,
    /// Equal.
    Eq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Not equal.
    Ne,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise exclusive or.
    Xor,
}

impl BinaryOp {
    /// The `CAL` parameter code for this operator.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Add => 0,
            Self::Sub => 1,
            Self::Mul => 2,
            Self::Div => 3,
            Self::Mod => 4,
            Self::Eq => 6,
            Self::Gt => 7,
            Self::Ge => 8,
            Self::Lt => 9,
            Self::Le => 10,
            Self::Ne => 11,
            Self::And => 12,
            Self::Or => 13,
            Self::Xor => 14,
        }
    }

    /// Infix symbol used when rendering.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Ne => "!=",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
        }
    }

    fn apply(self, left: i32, right: i32) -> Result<i32, RuntimeFault> {
        let value = match self {
            Self::Add => left.wrapping_add(right),
            Self::Sub => left.wrapping_sub(right),
            Self::Mul => left.wrapping_mul(right),
            Self::Div => {
                if right == 0 {
                    return Err(RuntimeFault::DivisionByZero);
                }
                left.wrapping_div(right)
            }
            Self::Mod => {
                if right == 0 {
                    return Err(RuntimeFault::DivisionByZero);
                }
                left.wrapping_rem(right)
            }
            Self::Eq => i32::from(left == right),
            Self::Gt => i32::from(left > right),
            Self::Ge => i32::from(left >= right),
            Self::Lt => i32::from(left < right),
            Self::Le => i32::from(left <= right),
            Self::Ne => i32::from(left != right),
            Self::And => left & right,
            Self::Or => left | right,
            Self::Xor => left ^ right,
        };
        Ok(value)
    }
}

/// An operator selected by a `CAL` parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    /// Pops one node.
    Unary(UnaryOp),
    /// Pops two nodes; the first popped is the right operand.
    Binary(BinaryOp),
}

impl Operator {
    /// Looks up an operator by its `CAL` parameter code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        let op = match code {
            0 => Self::Binary(BinaryOp::Add),
            1 => Self::Binary(BinaryOp::Sub),
            2 => Self::Binary(BinaryOp::Mul),
            3 => Self::Binary(BinaryOp::Div),
            4 => Self::Binary(BinaryOp::Mod),
            5 => Self::Unary(UnaryOp::Neg),
            6 => Self::Binary(BinaryOp::Eq),
            7 => Self::Binary(BinaryOp::Gt),
            8 => Self::Binary(BinaryOp::Ge),
            9 => Self::Binary(BinaryOp::Lt),
            10 => Self::Binary(BinaryOp::Le),
            11 => Self::Binary(BinaryOp::Ne),
            12 => Self::Binary(BinaryOp::And),
            13 => Self::Binary(BinaryOp::Or),
            14 => Self::Binary(BinaryOp::Xor),
            15 => Self::Unary(UnaryOp::Not),
            _ => return None,
        };
        Some(op)
    }

    /// Number of nodes the operator pops.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
        }
    }
}

/// An expression node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// A literal value.
    Constant(i32),
    /// A read of a variable, flag, or temp slot.
    Var(VarRef),
    /// A unary operation.
    Unary(UnaryOp, Box<Expr>),
    /// A binary operation.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Creates a variable reference node.
    #[must_use]
    pub const fn var(bank: VarBank, index: u16) -> Self {
        Self::Var(VarRef::new(bank, index))
    }

    /// Creates a unary node.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::Unary(op, Box::new(operand))
    }

    /// Creates a binary node.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary(op, Box::new(left), Box::new(right))
    }

    /// Evaluates the expression against the current world state.
    ///
    /// `temps` are the scratch slots of the instance doing the evaluation.
    ///
    /// # Errors
    ///
    /// Returns a fault on division by zero or an unreadable variable.
    pub fn evaluate<C>(&self, ctx: &C, temps: &[i32; TEMP_SLOTS]) -> Result<i32, RuntimeFault>
    where
        C: ExecutionContext + ?Sized,
    {
        match self {
            Self::Constant(value) => Ok(*value),
            Self::Var(var) => match var.bank {
                VarBank::Flag => Ok(i32::from(ctx.flag(var.index)?)),
                VarBank::Temp => temps.get(usize::from(var.index)).copied().ok_or(
                    RuntimeFault::AddressOutOfRange {
                        bank: var.bank,
                        index: var.index,
                    },
                ),
                bank => ctx.read_var(bank, var.index),
            },
            Self::Unary(op, operand) => Ok(op.apply(operand.evaluate(ctx, temps)?)),
            Self::Binary(op, left, right) => {
                let l = left.evaluate(ctx, temps)?;
                let r = right.evaluate(ctx, temps)?;
                op.apply(l, r)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{value}"),
            Self::Var(var) => write!(f, "{var}"),
            Self::Unary(UnaryOp::Neg, operand) => write!(f, "-{operand}"),
            Self::Unary(UnaryOp::Not, operand) => write!(f, "!{operand}"),
            Self::Binary(op, left, right) => write!(f, "({left} {} {right})", op.symbol()),
        }
    }
}
