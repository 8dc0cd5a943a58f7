//! Variable banks addressed by field scripts.
//!
//! The memory banks are typed views over one byte-addressed field memory:
//! `Word` reads two bytes little-endian starting at the index, and so on.
//! `Flag` is a separate boolean bank and `Temp` names the per-instance
//! scratch slots.

use std::fmt;

/// Number of scratch slots owned by each running script instance.
pub const TEMP_SLOTS: usize = 8;

/// A bank of script-visible variables.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarBank {
    /// Unsigned byte.
    Byte,
    /// Unsigned 16-bit word.
    Word,
    /// Signed 32-bit long.
    Long,
    /// Signed byte.
    SignedByte,
    /// Signed 16-bit word.
    SignedWord,
    /// Boolean flag, read as `0` or `1`.
    Flag,
    /// Per-instance scratch slot.
    Temp,
}

impl VarBank {
    /// Width in bytes for memory-backed banks, `None` for flags and temps.
    #[must_use]
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::Byte | Self::SignedByte => Some(1),
            Self::Word | Self::SignedWord => Some(2),
            Self::Long => Some(4),
            Self::Flag | Self::Temp => None,
        }
    }

    /// Returns true if values read from this bank are sign-extended.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::SignedByte | Self::SignedWord | Self::Long)
    }

    /// Short name used in diagnostic renderings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Word => "word",
            Self::Long => "long",
            Self::SignedByte => "sbyte",
            Self::SignedWord => "sword",
            Self::Flag => "flag",
            Self::Temp => "temp",
        }
    }

    /// Parses a bank from its diagnostic name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "byte" => Some(Self::Byte),
            "word" => Some(Self::Word),
            "long" => Some(Self::Long),
            "sbyte" => Some(Self::SignedByte),
            "sword" => Some(Self::SignedWord),
            "flag" => Some(Self::Flag),
            "temp" => Some(Self::Temp),
            _ => None,
        }
    }
}

impl fmt::Display for VarBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reference to one variable: a bank and an index into it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarRef {
    /// The bank being addressed.
    pub bank: VarBank,
    /// Byte address, flag number, or temp slot.
    pub index: u16,
}

impl VarRef {
    /// Creates a reference into the given bank.
    #[must_use]
    pub const fn new(bank: VarBank, index: u16) -> Self {
        Self { bank, index }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.bank, self.index)
    }
}
