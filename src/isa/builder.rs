//! Helpers for assembling instruction and system-register records in memory, without going
//! through an external table loader.

use crate::isa::diagram::{BitField, BitNumbering};
use crate::isa::error::IsaError;
use crate::isa::machine::{
    DecodeOptions, Disassembler, InstructionRecord, InstructionTable, OperationKind,
    SystemRegisterRecord, SystemRegisterTable,
};

/// Collects records for both tables in declaration order.
#[derive(Debug, Default)]
pub struct TableBuilder {
    instructions: Vec<InstructionRecord>,
    registers: Vec<SystemRegisterRecord>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins an instruction record; call [`InstructionBuilder::finish`] to push it.
    pub fn instruction(&mut self, name: impl Into<String>) -> InstructionBuilder<'_> {
        let record = InstructionRecord {
            name: name.into(),
            ..Default::default()
        };
        InstructionBuilder {
            builder: self,
            record,
        }
    }

    /// Appends a system register. `op0: None` declares a legacy 14-bit encoding.
    pub fn system_register(
        &mut self,
        name: impl Into<String>,
        op0: Option<&str>,
        subfields: [&str; 4],
    ) -> &mut Self {
        self.push_register(Some(name.into()), op0, subfields)
    }

    /// Appends a register that is only known by its encoding.
    pub fn unnamed_system_register(&mut self, op0: Option<&str>, subfields: [&str; 4]) -> &mut Self {
        self.push_register(None, op0, subfields)
    }

    fn push_register(
        &mut self,
        name: Option<String>,
        op0: Option<&str>,
        [op1, crn, crm, op2]: [&str; 4],
    ) -> &mut Self {
        self.registers.push(SystemRegisterRecord {
            name,
            op0: op0.map(str::to_owned),
            op1: op1.into(),
            crn: crn.into(),
            crm: crm.into(),
            op2: op2.into(),
        });
        self
    }

    pub fn records(self) -> (Vec<InstructionRecord>, Vec<SystemRegisterRecord>) {
        (self.instructions, self.registers)
    }

    /// Compiles both tables.
    pub fn build(self) -> Result<(InstructionTable, SystemRegisterTable), IsaError> {
        Ok((
            InstructionTable::build(self.instructions)?,
            SystemRegisterTable::build(self.registers)?,
        ))
    }

    /// Compiles both tables and wraps them in a [`Disassembler`].
    pub fn finish(self, options: DecodeOptions) -> Result<Disassembler, IsaError> {
        Disassembler::from_records(self.instructions, self.registers, options)
    }
}

pub struct InstructionBuilder<'a> {
    builder: &'a mut TableBuilder,
    record: InstructionRecord,
}

impl<'a> InstructionBuilder<'a> {
    pub fn kind(mut self, kind: OperationKind) -> Self {
        self.record.kind = kind;
        self
    }

    pub fn numbering(mut self, numbering: BitNumbering) -> Self {
        self.record.numbering = numbering;
        self
    }

    /// Appends the next field, most-significant first.
    pub fn field(mut self, field: BitField) -> Self {
        self.record.fields.push(field);
        self
    }

    pub fn named(self, hibit: u32, width: u32, name: impl Into<String>) -> Self {
        self.field(BitField::named(hibit, width, name))
    }

    pub fn fixed(self, hibit: u32, width: u32, pattern: impl Into<String>) -> Self {
        self.field(BitField::fixed(hibit, width, pattern))
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.record.template = template.into();
        self
    }

    /// Pushes the record into the owning builder.
    pub fn finish(self) -> &'a mut TableBuilder {
        self.builder.instructions.push(self.record);
        self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_records_in_declaration_order() {
        let mut builder = TableBuilder::new();
        builder
            .instruction("NOP")
            .kind(OperationKind::Alias)
            .fixed(31, 32, "11010101000000110010000000011111")
            .template("NOP")
            .finish()
            .system_register("TPIDR_EL0", Some("11"), ["011", "1101", "0000", "010"])
            .unnamed_system_register(None, ["000", "0000", "0000", "000"]);
        let (instructions, registers) = builder.records();
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].kind, OperationKind::Alias);
        assert_eq!(registers[0].name.as_deref(), Some("TPIDR_EL0"));
        assert_eq!(registers[1].name, None);
    }

    #[test]
    fn finish_compiles_a_disassembler() {
        let mut builder = TableBuilder::new();
        builder
            .instruction("NOP")
            .fixed(31, 32, "11010101000000110010000000011111")
            .template("NOP")
            .finish();
        let disassembler = builder.finish(DecodeOptions::default()).unwrap();
        let lines: Vec<String> = disassembler
            .decode_word(0xd503_201f, Some(0x80))
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(lines, ["00000080:d503201f NOP"]);
    }

    #[test]
    fn malformed_fields_fail_the_build() {
        let mut builder = TableBuilder::new();
        builder
            .instruction("BROKEN")
            .fixed(31, 16, "1111000011110000")
            .named(15, 8, "imm8")
            .template("BROKEN #<imm8>")
            .finish();
        assert!(matches!(builder.build(), Err(IsaError::MalformedPattern(_))));
    }
}
