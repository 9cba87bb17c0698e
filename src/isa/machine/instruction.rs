//! Compiled instruction encodings and the word matcher.

use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::isa::coding::CompiledPattern;
use crate::isa::diagram::{BitField, BitNumbering, BitSlice, EncodingDiagram};
use crate::isa::error::IsaError;

use super::fields::{FieldId, FieldNames, FieldValues};
use super::template::AsmTemplate;

/// Width of every instruction word.
pub const INSTRUCTION_WORD_BITS: u32 = 32;

/// Kind of the section an encoding was taken from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OperationKind {
    #[default]
    Instruction,
    Alias,
    Other(String),
}

impl FromStr for OperationKind {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "instruction" => OperationKind::Instruction,
            "alias" => OperationKind::Alias,
            other => OperationKind::Other(other.to_owned()),
        })
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Instruction => f.write_str("instruction"),
            OperationKind::Alias => f.write_str("alias"),
            OperationKind::Other(kind) => f.write_str(kind),
        }
    }
}

/// Already-parsed description of one instruction class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstructionRecord {
    pub name: String,
    pub kind: OperationKind,
    pub numbering: BitNumbering,
    pub fields: Vec<BitField>,
    pub template: String,
}

#[derive(Clone, Debug)]
pub struct InstructionSpec {
    pub name: String,
    pub kind: OperationKind,
    diagram: EncodingDiagram,
    pattern: CompiledPattern,
    exclusions: SmallVec<[CompiledPattern; 2]>,
    slots: SmallVec<[(FieldId, BitSlice); 8]>,
    template: AsmTemplate,
}

impl InstructionSpec {
    fn compile(record: InstructionRecord, names: &mut FieldNames) -> Result<Self, IsaError> {
        let InstructionRecord {
            name,
            kind,
            numbering,
            fields,
            template,
        } = record;
        let in_context = |err: IsaError| match err {
            IsaError::MalformedPattern(msg) => {
                IsaError::MalformedPattern(format!("instruction '{name}': {msg}"))
            }
            other => other,
        };

        let diagram =
            EncodingDiagram::new(INSTRUCTION_WORD_BITS, numbering, fields).map_err(in_context)?;
        let pattern = diagram.compile().map_err(in_context)?;
        let exclusions = diagram.exclusions().map_err(in_context)?;
        let mut slots = SmallVec::new();
        for (field, slice) in diagram.named_fields() {
            slots.push((names.intern(field)?, slice));
        }
        let template = AsmTemplate::parse(&template, names);

        Ok(Self {
            name,
            kind,
            diagram,
            pattern,
            exclusions,
            slots,
            template,
        })
    }

    pub fn diagram(&self) -> &EncodingDiagram {
        &self.diagram
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn exclusions(&self) -> &[CompiledPattern] {
        &self.exclusions
    }

    pub fn template(&self) -> &AsmTemplate {
        &self.template
    }

    /// `(word & mask) == value`, plus the field exclusions when `strict` is set.
    pub fn matches(&self, word: u32, strict: bool) -> bool {
        let word = u64::from(word);
        self.pattern.matches(word)
            && (!strict || !self.exclusions.iter().any(|excluded| excluded.matches(word)))
    }

    /// Extracts every named field of the diagram from `word`.
    pub fn decompose(&self, word: u32) -> FieldValues {
        let word = u64::from(word);
        let mut values = FieldValues::new();
        for (id, slice) in &self.slots {
            values.insert(*id, slice.extract(word));
        }
        values
    }

    pub fn has_field(&self, id: FieldId) -> bool {
        self.slots.iter().any(|(existing, _)| *existing == id)
    }
}

/// Lazy, restartable sequence of the specs matching one word, in table order.
#[derive(Clone)]
pub struct Matches<'a> {
    specs: std::slice::Iter<'a, InstructionSpec>,
    word: u32,
    strict: bool,
}

impl<'a> Iterator for Matches<'a> {
    type Item = &'a InstructionSpec;

    fn next(&mut self) -> Option<Self::Item> {
        let (word, strict) = (self.word, self.strict);
        self.specs.find(|spec| spec.matches(word, strict))
    }
}

/// Immutable instruction table, kept in input order.
#[derive(Clone, Debug, Default)]
pub struct InstructionTable {
    specs: Vec<InstructionSpec>,
    names: FieldNames,
    by_name: AHashMap<String, SmallVec<[usize; 2]>>,
}

impl InstructionTable {
    /// Compiles every record. One malformed record fails the whole table.
    pub fn build(records: impl IntoIterator<Item = InstructionRecord>) -> Result<Self, IsaError> {
        let mut table = InstructionTable::default();
        for record in records {
            let spec = InstructionSpec::compile(record, &mut table.names)?;
            table
                .by_name
                .entry(spec.name.clone())
                .or_default()
                .push(table.specs.len());
            table.specs.push(spec);
        }

        let overlaps = table.overlapping_pairs();
        if !overlaps.is_empty() {
            warn!(
                pairs = overlaps.len(),
                "instruction table contains overlapping encodings; every match will be reported"
            );
            for (first, second) in &overlaps {
                debug!(
                    first = %table.specs[*first].name,
                    second = %table.specs[*second].name,
                    "overlapping encodings"
                );
            }
        }
        info!(
            instructions = table.specs.len(),
            field_names = table.names.len(),
            "compiled instruction table"
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstructionSpec> {
        self.specs.iter()
    }

    pub fn field_names(&self) -> &FieldNames {
        &self.names
    }

    /// Every spec whose mask/value accepts `word`.
    pub fn match_all(&self, word: u32) -> Matches<'_> {
        self.match_all_with(word, false)
    }

    /// Like [`match_all`](Self::match_all); `strict` also applies field exclusions.
    pub fn match_all_with(&self, word: u32, strict: bool) -> Matches<'_> {
        Matches {
            specs: self.specs.iter(),
            word,
            strict,
        }
    }

    pub fn decompose(&self, spec: &InstructionSpec, word: u32) -> FieldValues {
        spec.decompose(word)
    }

    /// Specs registered under exactly `name`.
    pub fn lookup<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a InstructionSpec> + 'a {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|index| &self.specs[*index])
    }

    /// Specs whose name contains `fragment`, in table order.
    pub fn search<'a>(&'a self, fragment: &'a str) -> impl Iterator<Item = &'a InstructionSpec> {
        self.specs
            .iter()
            .filter(move |spec| spec.name.contains(fragment))
    }

    /// Index pairs of specs that some word could match at the same time.
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (first, lhs) in self.specs.iter().enumerate() {
            for (offset, rhs) in self.specs[first + 1..].iter().enumerate() {
                if lhs.pattern.overlaps(&rhs.pattern) {
                    pairs.push((first, first + 1 + offset));
                }
            }
        }
        pairs
    }
}
