//! Decoding layer. [`Disassembler`] owns the compiled instruction and system-register
//! tables and turns 32-bit words into every rendered interpretation they admit.
//!
//! Tables are immutable once built and shared through `Arc`, so one disassembler can decode
//! from many threads at once; [`Disassembler::decode_batch`] does exactly that with rayon.

mod disassembly;
mod fields;
mod format;
mod instruction;
mod options;
mod sysreg;
mod template;

pub use disassembly::{Disassembly, WordListing};
pub use fields::{FieldId, FieldNames, FieldValues};
pub use format::Renderer;
pub use instruction::{
    INSTRUCTION_WORD_BITS, InstructionRecord, InstructionSpec, InstructionTable, Matches,
    OperationKind,
};
pub use options::{DecodeFlags, DecodeOptions, TransferForm, UnknownRegister};
pub use sysreg::{
    SYSREG_FIELD_WIDTHS, SystemRegisterRecord, SystemRegisterResolver, SystemRegisterSpec,
    SystemRegisterTable, SystemRegisterTuple,
};
pub use template::{AsmTemplate, Placeholder, RegisterRef, SYSTEM_REGISTER_SLOT, TemplateToken};

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::isa::error::IsaError;

use format::TRANSFER_FIELDS;

/// Bytes per instruction word; the program counter advances by this much.
pub const INSTRUCTION_BYTES: u64 = 4;

#[derive(Debug, Clone)]
pub struct Disassembler {
    instructions: Arc<InstructionTable>,
    registers: Arc<SystemRegisterTable>,
    renderer: Renderer,
}

impl Disassembler {
    pub fn new(
        instructions: Arc<InstructionTable>,
        registers: Arc<SystemRegisterTable>,
        options: DecodeOptions,
    ) -> Result<Self, IsaError> {
        validate_transfer_forms(&instructions, &options)?;
        let renderer = Renderer::new(instructions.field_names(), options);
        Ok(Self {
            instructions,
            registers,
            renderer,
        })
    }

    /// Compiles both tables and wires them into a disassembler.
    pub fn from_records(
        instructions: impl IntoIterator<Item = InstructionRecord>,
        registers: impl IntoIterator<Item = SystemRegisterRecord>,
        options: DecodeOptions,
    ) -> Result<Self, IsaError> {
        Self::new(
            Arc::new(InstructionTable::build(instructions)?),
            Arc::new(SystemRegisterTable::build(registers)?),
            options,
        )
    }

    pub fn instructions(&self) -> &Arc<InstructionTable> {
        &self.instructions
    }

    pub fn registers(&self) -> &Arc<SystemRegisterTable> {
        &self.registers
    }

    pub fn options(&self) -> &DecodeOptions {
        self.renderer.options()
    }

    /// Specs accepting `word` under the configured exclusion mode.
    pub fn match_all(&self, word: u32) -> Matches<'_> {
        self.instructions
            .match_all_with(word, self.options().is_strict())
    }

    pub fn render(&self, spec: &InstructionSpec, word: u32) -> String {
        let values = spec.decompose(word);
        self.renderer.render(spec, &values, self.registers.as_ref())
    }

    /// Renders every spec matching `word`. An empty result means the word is undefined for
    /// this table.
    pub fn decode_word(&self, word: u32, pc: Option<u64>) -> Vec<Disassembly> {
        let address = pc.unwrap_or(0);
        let entries: Vec<Disassembly> = self
            .match_all(word)
            .map(|spec| {
                trace!(address, word, instruction = %spec.name, "matched encoding");
                Disassembly {
                    address,
                    word,
                    name: spec.name.clone(),
                    text: self.render(spec, word),
                }
            })
            .collect();
        if entries.is_empty() {
            debug!(address, word, "no encoding matches word");
        }
        entries
    }

    /// Decodes `words` in parallel. Word `i` sits at `base + 4 * i`; a missing `base`
    /// counts from 0.
    pub fn decode_batch(&self, words: &[u32], base: Option<u64>) -> Vec<WordListing> {
        words
            .par_iter()
            .enumerate()
            .map(|(index, &word)| {
                let pc = base
                    .unwrap_or(0)
                    .wrapping_add(INSTRUCTION_BYTES * index as u64);
                WordListing {
                    address: pc,
                    word,
                    entries: self.decode_word(word, Some(pc)),
                }
            })
            .collect()
    }

    /// Splits a little-endian stream into words starting at `base`. A trailing partial
    /// word is ignored.
    pub fn disassemble_bytes(&self, bytes: &[u8], base: u64) -> Vec<WordListing> {
        let words: Vec<u32> = bytes
            .chunks_exact(INSTRUCTION_BYTES as usize)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        self.decode_batch(&words, Some(base))
    }
}

fn validate_transfer_forms(
    table: &InstructionTable,
    options: &DecodeOptions,
) -> Result<(), IsaError> {
    let names = table.field_names();
    for spec in table.iter() {
        if !matches!(
            options.transfer_form(&spec.name),
            Some(TransferForm::ToSystemRegister | TransferForm::FromSystemRegister)
        ) {
            continue;
        }
        if spec.template().source().trim().is_empty() {
            return Err(IsaError::MalformedPattern(format!(
                "register-transfer form '{}' has an empty template",
                spec.name
            )));
        }
        let missing: Vec<&str> = TRANSFER_FIELDS
            .iter()
            .copied()
            .filter(|field| names.lookup(field).is_none_or(|id| !spec.has_field(id)))
            .collect();
        if !missing.is_empty() {
            return Err(IsaError::Machine(format!(
                "register-transfer form '{}' lacks fields {}",
                spec.name,
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::diagram::BitField;

    fn transfer_record(name: &str, fields: Vec<BitField>, template: &str) -> InstructionRecord {
        InstructionRecord {
            name: name.into(),
            fields,
            template: template.into(),
            ..Default::default()
        }
    }

    fn msr_reg_fields() -> Vec<BitField> {
        vec![
            BitField::fixed(31, 10, "1101010100"),
            BitField::named(21, 1, "L").with_fixed("0"),
            BitField::fixed(20, 1, "1"),
            BitField::named(19, 1, "o0"),
            BitField::named(18, 3, "op1"),
            BitField::named(15, 4, "CRn"),
            BitField::named(11, 4, "CRm"),
            BitField::named(7, 3, "op2"),
            BitField::named(4, 5, "Rt"),
        ]
    }

    #[test]
    fn transfer_forms_need_their_tuple_fields() {
        let mut fields = msr_reg_fields();
        fields.pop();
        fields.push(BitField::fixed(4, 5, "xxxxx"));
        let err = Disassembler::from_records(
            vec![transfer_record("MSR_reg", fields, "MSR  <systemreg>, <Xt>")],
            Vec::new(),
            DecodeOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            IsaError::Machine("register-transfer form 'MSR_reg' lacks fields Rt".into())
        );
    }

    #[test]
    fn transfer_forms_need_a_template() {
        let err = Disassembler::from_records(
            vec![transfer_record("MRS", msr_reg_fields(), "  ")],
            Vec::new(),
            DecodeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IsaError::MalformedPattern(msg) if msg.contains("'MRS'")));
    }

    #[test]
    fn renamed_transfer_forms_are_not_checked_under_old_names() {
        let mut fields = msr_reg_fields();
        fields.truncate(3);
        fields.push(BitField::fixed(19, 20, "x".repeat(20)));
        let disassembler = Disassembler::from_records(
            vec![transfer_record("MSR_reg", fields, "MSR  <systemreg>")],
            Vec::new(),
            DecodeOptions::default().with_transfer_names("msr_i", "msr_r", "mrs"),
        );
        assert!(disassembler.is_ok());
    }

    #[test]
    fn truncated_streams_drop_the_partial_word() {
        let disassembler =
            Disassembler::from_records(Vec::new(), Vec::new(), DecodeOptions::default())
                .unwrap();
        let listing = disassembler.disassemble_bytes(&[0x1f, 0x20, 0x03, 0xd5, 0xff], 0x1000);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].word, 0xd503_201f);
        assert_eq!(listing[0].address, 0x1000);
        assert!(listing[0].is_unmatched());
    }

    #[test]
    fn disassembler_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Disassembler>();
    }
}
