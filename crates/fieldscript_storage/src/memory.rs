//! Byte-addressed field memory.
//!
//! Scripts see the same bytes through several typed banks: a `Word` at
//! index 4 overlaps the `Byte`s at 4 and 5. Multi-byte values are stored
//! little-endian. Writes truncate the value to the bank's width.

use fieldscript_foundation::{RuntimeFault, VarBank};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default size of the field memory in bytes.
pub const MEMORY_SIZE: usize = 4096;

/// Byte-addressed memory backing the typed variable banks.
///
/// Backed by a persistent vector, so cloning for a snapshot is O(1).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldMemory {
    bytes: im::Vector<u8>,
}

impl Default for FieldMemory {
    fn default() -> Self {
        Self::new(MEMORY_SIZE)
    }
}

impl FieldMemory {
    /// Creates zeroed memory of the given size.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            bytes: std::iter::repeat_n(0u8, size).collect(),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the memory has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn span(&self, bank: VarBank, index: u16) -> Result<(usize, usize), RuntimeFault> {
        let width = bank.width().ok_or(RuntimeFault::InvalidBank(bank))?;
        let start = usize::from(index);
        if start + width > self.bytes.len() {
            return Err(RuntimeFault::AddressOutOfRange { bank, index });
        }
        Ok((start, width))
    }

    /// Reads a value through a memory bank.
    ///
    /// # Errors
    ///
    /// Returns a fault if the bank is not memory-backed or the read runs past
    /// the end of memory.
    pub fn read(&self, bank: VarBank, index: u16) -> Result<i32, RuntimeFault> {
        let (start, width) = self.span(bank, index)?;
        let mut raw = [0u8; 4];
        for (i, slot) in raw.iter_mut().take(width).enumerate() {
            *slot = self.bytes[start + i];
        }

        let value = match bank {
            VarBank::Byte => i32::from(raw[0]),
            VarBank::SignedByte => i32::from(i8::from_le_bytes([raw[0]])),
            VarBank::Word => i32::from(u16::from_le_bytes([raw[0], raw[1]])),
            VarBank::SignedWord => i32::from(i16::from_le_bytes([raw[0], raw[1]])),
            VarBank::Long => i32::from_le_bytes(raw),
            VarBank::Flag | VarBank::Temp => return Err(RuntimeFault::InvalidBank(bank)),
        };
        Ok(value)
    }

    /// Writes a value through a memory bank, truncating it to the bank's width.
    ///
    /// # Errors
    ///
    /// Returns a fault if the bank is not memory-backed or the write runs past
    /// the end of memory.
    pub fn write(&mut self, bank: VarBank, index: u16, value: i32) -> Result<(), RuntimeFault> {
        let (start, width) = self.span(bank, index)?;
        for (i, byte) in value.to_le_bytes().into_iter().take(width).enumerate() {
            self.bytes[start + i] = byte;
        }
        Ok(())
    }

    /// Returns a copy of a byte range, for inspection tools.
    #[must_use]
    pub fn dump(&self, start: usize, len: usize) -> Vec<u8> {
        self.bytes.iter().skip(start).take(len).copied().collect()
    }
}
