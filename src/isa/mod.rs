//! Table-driven decoding of fixed-width instruction words.
//!
//! Encoding diagrams compile into mask/value patterns once, at table-build time. A
//! [`Disassembler`] then matches words against every pattern, decomposes the named fields
//! of each hit and renders its assembly template, resolving system-register operands
//! through a second table keyed by the `(op0, op1, CRn, CRm, op2)` tuple.

pub mod builder;
pub mod coding;
pub mod diagram;
pub mod error;
pub mod machine;


pub use builder::TableBuilder;
pub use coding::CompiledPattern;
pub use diagram::{BitField, BitNumbering, EncodingDiagram};
pub use error::IsaError;
pub use machine::{Disassembler, Disassembly, WordListing};
