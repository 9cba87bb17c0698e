pub mod isa;

pub use isa::{
    BitField, BitNumbering, Disassembler, Disassembly, IsaError, TableBuilder, WordListing,
    machine::{DecodeFlags, DecodeOptions, InstructionRecord, SystemRegisterRecord},
};
