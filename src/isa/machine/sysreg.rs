//! System-register encodings keyed by the `(op0, op1, CRn, CRm, op2)` tuple.
//!
//! Each register compiles its five sub-field codings into one 16-bit pattern (14 bits for
//! legacy encodings that omit `op0`). Resolution picks the most specific match.

use std::fmt;

use tracing::info;

use crate::isa::coding::{CompiledPattern, mask_for_width};
use crate::isa::error::IsaError;

/// Widths of `op0, op1, CRn, CRm, op2`, most-significant first.
pub const SYSREG_FIELD_WIDTHS: [u32; 5] = [2, 3, 4, 4, 3];

/// One decoded system-register coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SystemRegisterTuple {
    pub op0: u64,
    pub op1: u64,
    pub crn: u64,
    pub crm: u64,
    pub op2: u64,
}

impl SystemRegisterTuple {
    pub fn new(op0: u64, op1: u64, crn: u64, crm: u64, op2: u64) -> Self {
        Self {
            op0,
            op1,
            crn,
            crm,
            op2,
        }
    }

    /// Concatenates the five fields into the 16-bit `op0:op1:CRn:CRm:op2` value.
    pub fn encode(&self) -> u64 {
        let parts = [self.op0, self.op1, self.crn, self.crm, self.op2];
        parts
            .iter()
            .zip(SYSREG_FIELD_WIDTHS)
            .fold(0u64, |acc, (part, width)| {
                (acc << width) | (part & mask_for_width(width))
            })
    }

    fn from_encoding(value: u64) -> Self {
        let mut parts = [0u64; 5];
        let mut shift = 0;
        for (part, width) in parts.iter_mut().zip(SYSREG_FIELD_WIDTHS).rev() {
            *part = (value >> shift) & mask_for_width(width);
            shift += width;
        }
        let [op0, op1, crn, crm, op2] = parts;
        Self::new(op0, op1, crn, crm, op2)
    }
}

/// Generic `S<op0>_<op1>_C<CRn>_C<CRm>_<op2>` name.
impl fmt::Display for SystemRegisterTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "S{}_{}_C{}_C{}_{}",
            self.op0, self.op1, self.crn, self.crm, self.op2
        )
    }
}

/// Already-parsed sub-field codings of one system register.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemRegisterRecord {
    pub name: Option<String>,
    pub op0: Option<String>,
    pub op1: String,
    pub crn: String,
    pub crm: String,
    pub op2: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemRegisterSpec {
    pub name: String,
    encoding: String,
    pattern: CompiledPattern,
}

impl SystemRegisterSpec {
    fn compile(record: SystemRegisterRecord) -> Result<Self, IsaError> {
        let SystemRegisterRecord {
            name,
            op0,
            op1,
            crn,
            crm,
            op2,
        } = record;
        let subfields = [
            op0.as_deref(),
            Some(op1.as_str()),
            Some(crn.as_str()),
            Some(crm.as_str()),
            Some(op2.as_str()),
        ];
        let mut encoding = String::with_capacity(16);
        for ((label, coding), width) in ["op0", "op1", "CRn", "CRm", "op2"]
            .iter()
            .zip(subfields)
            .zip(SYSREG_FIELD_WIDTHS)
        {
            let Some(coding) = coding else {
                continue;
            };
            if coding.len() != width as usize {
                return Err(IsaError::MalformedPattern(format!(
                    "system register {}: {label} coding '{coding}' is not {width} bits",
                    name.as_deref().unwrap_or("<unnamed>")
                )));
            }
            encoding.push_str(coding);
        }
        let pattern = CompiledPattern::compile(&encoding, encoding.len() as u32)?;
        let name = name.unwrap_or_else(|| {
            SystemRegisterTuple::from_encoding(pattern.value).to_string()
        });
        Ok(Self {
            name,
            encoding,
            pattern,
        })
    }

    /// Concatenated coding string (16 characters, or 14 without `op0`).
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn is_legacy(&self) -> bool {
        self.pattern.width == 14
    }

    /// Literal bits in the concatenated coding.
    pub fn specificity(&self) -> u32 {
        self.pattern.specificity()
    }

    pub fn matches(&self, encoded: u64) -> bool {
        self.pattern.matches(encoded)
    }
}

/// Seam between the renderer and whatever answers system-register lookups.
pub trait SystemRegisterResolver {
    fn resolve(&self, tuple: SystemRegisterTuple) -> Result<&str, IsaError>;
}

/// Immutable system-register table, kept in input order.
#[derive(Clone, Debug, Default)]
pub struct SystemRegisterTable {
    specs: Vec<SystemRegisterSpec>,
}

impl SystemRegisterTable {
    pub fn build(
        records: impl IntoIterator<Item = SystemRegisterRecord>,
    ) -> Result<Self, IsaError> {
        let specs = records
            .into_iter()
            .map(SystemRegisterSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;
        info!(registers = specs.len(), "compiled system register table");
        Ok(Self { specs })
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SystemRegisterSpec> {
        self.specs.iter()
    }

    /// Every spec accepting `tuple`, in table order.
    pub fn candidates(
        &self,
        tuple: SystemRegisterTuple,
    ) -> impl Iterator<Item = &SystemRegisterSpec> + '_ {
        let encoded = tuple.encode();
        self.specs.iter().filter(move |spec| spec.matches(encoded))
    }

    /// The candidate with the most literal bits. Among equally specific candidates the first
    /// one in table order wins.
    pub fn resolve_spec(
        &self,
        tuple: SystemRegisterTuple,
    ) -> Result<&SystemRegisterSpec, IsaError> {
        let mut best: Option<&SystemRegisterSpec> = None;
        for spec in self.candidates(tuple) {
            if best.is_none_or(|current| spec.specificity() > current.specificity()) {
                best = Some(spec);
            }
        }
        best.ok_or(IsaError::UnresolvedRegister {
            op0: tuple.op0,
            op1: tuple.op1,
            crn: tuple.crn,
            crm: tuple.crm,
            op2: tuple.op2,
        })
    }
}

impl SystemRegisterResolver for SystemRegisterTable {
    fn resolve(&self, tuple: SystemRegisterTuple) -> Result<&str, IsaError> {
        self.resolve_spec(tuple).map(|spec| spec.name.as_str())
    }
}
