use std::fmt;

/// One rendered interpretation of an instruction word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    pub address: u64,
    pub word: u32,
    pub name: String,
    pub text: String,
}

/// Listing line: `{address:08x}:{word:08x} {text}`.
impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}:{:08x} {}", self.address, self.word, self.text)
    }
}

/// Every interpretation of one word. An empty `entries` means no encoding matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListing {
    pub address: u64,
    pub word: u32,
    pub entries: Vec<Disassembly>,
}

impl WordListing {
    pub fn is_unmatched(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_line_pads_address_and_word() {
        let entry = Disassembly {
            address: 0x40,
            word: 0xd503_201f,
            name: "NOP".into(),
            text: "NOP".into(),
        };
        assert_eq!(entry.to_string(), "00000040:d503201f NOP");

        let listing = WordListing {
            address: 0x40,
            word: 0xd503_201f,
            entries: vec![entry],
        };
        assert!(!listing.is_unmatched());
        assert_eq!(listing.lines().collect::<Vec<_>>(), ["00000040:d503201f NOP"]);
    }
}
