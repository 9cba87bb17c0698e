//! Encoding diagrams: ordered bit fields that tile a fixed-width word.

use std::borrow::Cow;
use std::fmt;

use smallvec::SmallVec;

use super::coding::{
    CompiledPattern, MAX_CODING_BITS, coding_contains, mask_for_width, validate_coding,
};
use super::error::IsaError;

/// Bit numbering used by a diagram's `hibit` values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BitNumbering {
    /// Bit 0 is the least-significant bit; `hibit` is the field's highest bit index.
    #[default]
    LsbZero,
    /// Bit 0 is the most-significant bit; `hibit` is the field's first bit from the top.
    MsbZero,
}

impl BitNumbering {
    /// Least-significant bit (counted from the word's LSB) of a field, or `None` when the field
    /// does not fit inside a `word_bits` word.
    pub fn low_bit(self, word_bits: u32, hibit: u32, width: u32) -> Option<u32> {
        if width == 0 {
            return None;
        }
        let low = match self {
            BitNumbering::LsbZero => hibit.checked_add(1)?.checked_sub(width)?,
            BitNumbering::MsbZero => word_bits.checked_sub(hibit.checked_add(width)?)?,
        };
        (low + width <= word_bits).then_some(low)
    }
}

/// Precomputed shift/mask pair that reads one field out of a word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitSlice {
    pub low: u32,
    pub width: u32,
    pub mask: u64,
}

impl BitSlice {
    pub fn new(low: u32, width: u32) -> Self {
        Self {
            low,
            width,
            mask: mask_for_width(width),
        }
    }

    pub fn extract(&self, word: u64) -> u64 {
        (word >> self.low) & self.mask
    }
}

/// Reads the unsigned `width`-bit field whose most-significant bit is `hibit`.
///
/// No sign extension is applied. Fields that fall outside the word read as zero.
pub fn extract(word: u64, word_bits: u32, numbering: BitNumbering, hibit: u32, width: u32) -> u64 {
    match numbering.low_bit(word_bits, hibit, width) {
        Some(low) => BitSlice::new(low, width).extract(word),
        None => 0,
    }
}

/// One box of an encoding diagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitField {
    pub hibit: u32,
    pub width: u32,
    pub name: Option<String>,
    pub fixed: Option<String>,
    pub excluded: Option<String>,
}

impl BitField {
    /// An anonymous, unconstrained field.
    pub fn new(hibit: u32, width: u32) -> Self {
        Self {
            hibit,
            width,
            name: None,
            fixed: None,
            excluded: None,
        }
    }

    pub fn named(hibit: u32, width: u32, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(hibit, width)
        }
    }

    /// An anonymous field constrained to `pattern` (typically opcode bits).
    pub fn fixed(hibit: u32, width: u32, pattern: impl Into<String>) -> Self {
        Self::new(hibit, width).with_fixed(pattern)
    }

    pub fn with_fixed(mut self, pattern: impl Into<String>) -> Self {
        self.fixed = Some(pattern.into());
        self
    }

    pub fn with_excluded(mut self, pattern: impl Into<String>) -> Self {
        self.excluded = Some(pattern.into());
        self
    }

    /// Builds a field from the raw cell text of an encoding box.
    ///
    /// `(0)`/`(1)` should-be bits become wildcards, `!= 0101` becomes an exclusion, and empty
    /// text leaves the field unconstrained.
    pub fn from_box_text(
        hibit: u32,
        width: u32,
        name: Option<&str>,
        text: &str,
    ) -> Result<Self, IsaError> {
        let mut field = BitField::new(hibit, width);
        field.name = name.map(str::to_owned);
        let text = text.trim();
        if let Some(negated) = text.strip_prefix("!=") {
            field.excluded = Some(negated.trim().to_owned());
        } else if !text.is_empty() {
            field.fixed = Some(text.replace("(0)", "x").replace("(1)", "x"));
        }
        field.validate()?;
        Ok(field)
    }

    /// The field's contribution to the word coding string.
    pub fn coding_str(&self) -> Cow<'_, str> {
        match &self.fixed {
            Some(pattern) => Cow::Borrowed(pattern.as_str()),
            None => Cow::Owned("x".repeat(self.width as usize)),
        }
    }

    /// Checks a concrete bit string for this field against both the fixed and the excluded
    /// pattern.
    pub fn matches(&self, candidate: &str) -> bool {
        self.fixed
            .as_deref()
            .is_none_or(|pattern| coding_contains(pattern, candidate))
            && self
                .excluded
                .as_deref()
                .is_none_or(|pattern| !coding_contains(pattern, candidate))
    }

    fn validate(&self) -> Result<(), IsaError> {
        if self.width == 0 || self.width > MAX_CODING_BITS {
            return Err(IsaError::MalformedPattern(format!(
                "field {} has unsupported width {}",
                self.label(),
                self.width
            )));
        }
        for pattern in [&self.fixed, &self.excluded].into_iter().flatten() {
            validate_coding(pattern, self.width).map_err(|err| {
                IsaError::MalformedPattern(format!("field {}: {err}", self.label()))
            })?;
        }
        Ok(())
    }

    fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("'{name}'@{}", self.hibit),
            None => format!("@{}", self.hibit),
        }
    }
}

impl fmt::Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.fixed) {
            (Some(name), Some(pattern)) => write!(f, "<0b{pattern}.{name}>"),
            (Some(name), None) => write!(f, "<{}.{name}>", self.width),
            (None, _) => f.write_str(&self.coding_str()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PlacedField {
    field: BitField,
    slice: BitSlice,
}

/// Ordered fields covering a whole word, most-significant field first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodingDiagram {
    word_bits: u32,
    numbering: BitNumbering,
    fields: SmallVec<[PlacedField; 8]>,
}

impl EncodingDiagram {
    /// Places every field and checks that the fields tile `word_bits` exactly, without gaps or
    /// overlap.
    pub fn new(
        word_bits: u32,
        numbering: BitNumbering,
        fields: impl IntoIterator<Item = BitField>,
    ) -> Result<Self, IsaError> {
        if word_bits == 0 || word_bits > MAX_CODING_BITS {
            return Err(IsaError::MalformedPattern(format!(
                "unsupported word width {word_bits}"
            )));
        }
        let mut placed: SmallVec<[PlacedField; 8]> = SmallVec::new();
        let mut next_top = word_bits;
        let mut total = 0u32;
        for field in fields {
            field.validate()?;
            let low = numbering
                .low_bit(word_bits, field.hibit, field.width)
                .ok_or_else(|| {
                    IsaError::MalformedPattern(format!(
                        "field {} (width {}) lies outside the {word_bits}-bit word",
                        field.label(),
                        field.width
                    ))
                })?;
            if low + field.width != next_top {
                return Err(IsaError::MalformedPattern(format!(
                    "field {} starts at bit {} but the previous field ended at bit {next_top}",
                    field.label(),
                    low + field.width
                )));
            }
            next_top = low;
            total += field.width;
            placed.push(PlacedField {
                slice: BitSlice::new(low, field.width),
                field,
            });
        }
        if total != word_bits {
            return Err(IsaError::MalformedPattern(format!(
                "field widths sum to {total} bits, expected {word_bits}"
            )));
        }
        Ok(Self {
            word_bits,
            numbering,
            fields: placed,
        })
    }

    pub fn word_bits(&self) -> u32 {
        self.word_bits
    }

    pub fn numbering(&self) -> BitNumbering {
        self.numbering
    }

    pub fn fields(&self) -> impl Iterator<Item = &BitField> {
        self.fields.iter().map(|placed| &placed.field)
    }

    /// Named fields with the slice that reads them.
    pub fn named_fields(&self) -> impl Iterator<Item = (&str, BitSlice)> {
        self.fields
            .iter()
            .filter_map(|placed| placed.field.name.as_deref().map(|name| (name, placed.slice)))
    }

    /// Concatenated coding string, one character per bit from the MSB down.
    pub fn coding_str(&self) -> String {
        let mut coding = String::with_capacity(self.word_bits as usize);
        for placed in &self.fields {
            coding.push_str(&placed.field.coding_str());
        }
        coding
    }

    /// Word-level mask/value from the fixed patterns only.
    pub fn compile(&self) -> Result<CompiledPattern, IsaError> {
        CompiledPattern::compile(&self.coding_str(), self.word_bits)
    }

    /// Word-level patterns for every field exclusion, each positioned on its field.
    pub fn exclusions(&self) -> Result<SmallVec<[CompiledPattern; 2]>, IsaError> {
        let mut patterns = SmallVec::new();
        for placed in &self.fields {
            if let Some(excluded) = &placed.field.excluded {
                let pattern = CompiledPattern::compile(excluded, placed.field.width)?;
                patterns.push(pattern.shifted(placed.slice.low));
            }
        }
        Ok(patterns)
    }

    /// Reads a field of this diagram's word using its width and numbering.
    pub fn extract(&self, word: u64, hibit: u32, width: u32) -> u64 {
        extract(word, self.word_bits, self.numbering, hibit, width)
    }

    /// Checks every field in isolation against its slice of `word`, honouring exclusions.
    pub fn accepts(&self, word: u64) -> bool {
        self.fields.iter().all(|placed| {
            let value = placed.slice.extract(word);
            let bits = format!("{value:0width$b}", width = placed.slice.width as usize);
            placed.field.matches(&bits)
        })
    }
}

impl fmt::Display for EncodingDiagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for placed in &self.fields {
            write!(f, "{}", placed.field)?;
        }
        Ok(())
    }
}
