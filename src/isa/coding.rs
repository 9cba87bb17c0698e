//! Coding strings over `0`/`1`/`x` and their compiled mask/value form.
//!
//! A coding string lists bits from the most-significant position down to bit 0, so the last
//! character always lands on bit 0 of the compiled pattern.

use super::error::IsaError;

/// Widest pattern a [`CompiledPattern`] can hold.
pub const MAX_CODING_BITS: u32 = 64;

pub(crate) fn mask_for_width(width: u32) -> u64 {
    if width == 0 {
        0
    } else if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Mask/value pair compiled from a coding string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompiledPattern {
    pub mask: u64,
    pub value: u64,
    pub width: u32,
}

impl CompiledPattern {
    /// Compiles `coding` into a mask/value pair, requiring exactly `width` characters.
    pub fn compile(coding: &str, width: u32) -> Result<Self, IsaError> {
        validate_coding(coding, width)?;
        let mut mask = 0u64;
        let mut value = 0u64;
        for (idx, ch) in coding.bytes().enumerate() {
            let bit = 1u64 << (width - 1 - idx as u32);
            match ch {
                b'0' => mask |= bit,
                b'1' => {
                    mask |= bit;
                    value |= bit;
                }
                _ => {}
            }
        }
        Ok(Self { mask, value, width })
    }

    pub fn matches(&self, word: u64) -> bool {
        word & self.mask == self.value
    }

    /// Number of literal (non-wildcard) bits.
    pub fn specificity(&self) -> u32 {
        self.mask.count_ones()
    }

    /// Moves the pattern `shift` bits towards the most-significant end.
    pub fn shifted(self, shift: u32) -> Self {
        Self {
            mask: self.mask << shift,
            value: self.value << shift,
            width: self.width + shift,
        }
    }

    /// True when some word satisfies both patterns.
    pub fn overlaps(&self, other: &CompiledPattern) -> bool {
        (self.value ^ other.value) & (self.mask & other.mask) == 0
    }
}

/// Shorthand for [`CompiledPattern::compile`].
pub fn compile(coding: &str, width: u32) -> Result<CompiledPattern, IsaError> {
    CompiledPattern::compile(coding, width)
}

/// Wildcard containment: every non-`x` character of `pattern` must equal the character at the
/// same position of `candidate`. An `x` in the candidate is an ordinary character here.
///
/// `"xx101xx01"` contains `"10101x101"`, and strings of different length never contain each
/// other.
pub fn coding_contains(pattern: &str, candidate: &str) -> bool {
    if pattern.len() != candidate.len() {
        return false;
    }
    pattern
        .bytes()
        .zip(candidate.bytes())
        .all(|(p, c)| p == b'x' || p == c)
}

pub(crate) fn validate_coding(coding: &str, width: u32) -> Result<(), IsaError> {
    if width == 0 || width > MAX_CODING_BITS {
        return Err(IsaError::MalformedPattern(format!(
            "coding '{coding}' declares unsupported width {width}"
        )));
    }
    if coding.len() != width as usize {
        return Err(IsaError::MalformedPattern(format!(
            "coding '{coding}' has {} character(s) but declares width {width}",
            coding.len()
        )));
    }
    if let Some(bad) = coding.chars().find(|ch| !matches!(ch, '0' | '1' | 'x')) {
        return Err(IsaError::MalformedPattern(format!(
            "coding '{coding}' contains '{bad}' outside the 0/1/x alphabet"
        )));
    }
    Ok(())
}
