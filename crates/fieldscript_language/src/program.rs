//! Decoded script programs.
//!
//! A [`Program`] is built once when a script is loaded and is read-only from
//! then on; every instance running the script shares it behind an `Arc`.

use std::collections::BTreeMap;

use crate::instruction::Instruction;

/// An ordered, addressable sequence of decoded instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    name: String,
    instructions: Vec<Instruction>,
    /// Group start offset of each instruction, parallel to `instructions`.
    offsets: Vec<usize>,
    /// Group start offset -> instruction index.
    index: BTreeMap<usize, usize>,
    /// Byte length of the stream; resolves to one past the last instruction.
    end_offset: usize,
}

impl Program {
    /// Builds a program from `(group start offset, instruction)` pairs.
    ///
    /// Offsets are expected to be strictly increasing and below `end_offset`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        entries: Vec<(usize, Instruction)>,
        end_offset: usize,
    ) -> Self {
        let mut instructions = Vec::with_capacity(entries.len());
        let mut offsets = Vec::with_capacity(entries.len());
        let mut index = BTreeMap::new();
        for (i, (offset, instruction)) in entries.into_iter().enumerate() {
            index.insert(offset, i);
            offsets.push(offset);
            instructions.push(instruction);
        }
        Self {
            name: name.into(),
            instructions,
            offsets,
            index,
            end_offset,
        }
    }

    /// Builds a program where every instruction occupies one word.
    ///
    /// Convenient for hand-assembled programs whose instructions have no
    /// operand pushes in front of them.
    #[must_use]
    pub fn from_instructions(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        let end_offset = instructions.len() * 4;
        let entries = instructions
            .into_iter()
            .enumerate()
            .map(|(i, instruction)| (i * 4, instruction))
            .collect();
        Self::new(name, entries, end_offset)
    }

    /// Script name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Byte length of the source stream.
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    /// Returns the instruction at an index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Returns the group start offset of the instruction at an index.
    #[must_use]
    pub fn offset_of(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    /// Resolves a byte offset to an instruction index.
    ///
    /// The end offset resolves to `len()`, which halts the script when
    /// reached. Offsets inside a group, past the end, or negative do not
    /// resolve.
    #[must_use]
    pub fn resolve(&self, target: i64) -> Option<usize> {
        let offset = usize::try_from(target).ok()?;
        if offset == self.end_offset {
            return Some(self.instructions.len());
        }
        self.index.get(&offset).copied()
    }

    /// Iterates `(offset, instruction)` pairs in program order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Instruction)> + '_ {
        self.offsets.iter().copied().zip(self.instructions.iter())
    }

    /// Returns true if any instruction is a placeholder.
    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        self.instructions.iter().any(Instruction::is_placeholder)
    }
}
