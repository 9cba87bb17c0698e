//! Decoder configuration fixed when a [`Disassembler`](super::Disassembler) is built.

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DecodeFlags: u8 {
        /// Reject words whose field bits equal that field's excluded pattern.
        const STRICT_EXCLUSION = 0b001;
        /// Render `<Wt>`/`<Xt>` style placeholders as `<prefix><Rt>`.
        const REGISTER_REFS = 0b010;
        /// Render `<`/`>` inside system-register names as `[`/`]`.
        const BRACKET_SYSREG_NAMES = 0b100;
    }
}

impl Default for DecodeFlags {
    fn default() -> Self {
        DecodeFlags::REGISTER_REFS | DecodeFlags::BRACKET_SYSREG_NAMES
    }
}

/// What to splice in when no system register matches a decoded tuple.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UnknownRegister {
    /// The generic `S<op0>_<op1>_C<CRn>_C<CRm>_<op2>` name of the tuple.
    #[default]
    EncodingName,
    Literal(String),
}

/// Instruction forms whose rendering bypasses their own template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferForm {
    /// Move-immediate to a PSTATE pseudo-register.
    PStateImmediate,
    /// General register to system register.
    ToSystemRegister,
    /// System register to general register.
    FromSystemRegister,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    pub flags: DecodeFlags,
    pub register_prefix: String,
    pub pstate_register: String,
    pub msr_immediate: String,
    pub msr_register: String,
    pub mrs_register: String,
    pub unknown_register: UnknownRegister,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            flags: DecodeFlags::default(),
            register_prefix: "R".into(),
            pstate_register: "PStateField".into(),
            msr_immediate: "MSR_imm".into(),
            msr_register: "MSR_reg".into(),
            mrs_register: "MRS".into(),
            unknown_register: UnknownRegister::default(),
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(mut self, flags: DecodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Switches on field exclusions during word matching.
    pub fn strict(mut self) -> Self {
        self.flags |= DecodeFlags::STRICT_EXCLUSION;
        self
    }

    pub fn with_register_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.register_prefix = prefix.into();
        self
    }

    pub fn with_pstate_register(mut self, name: impl Into<String>) -> Self {
        self.pstate_register = name.into();
        self
    }

    /// Renames the instructions that receive system-register special handling.
    pub fn with_transfer_names(
        mut self,
        msr_immediate: impl Into<String>,
        msr_register: impl Into<String>,
        mrs_register: impl Into<String>,
    ) -> Self {
        self.msr_immediate = msr_immediate.into();
        self.msr_register = msr_register.into();
        self.mrs_register = mrs_register.into();
        self
    }

    pub fn with_unknown_register(mut self, marker: UnknownRegister) -> Self {
        self.unknown_register = marker;
        self
    }

    pub fn transfer_form(&self, name: &str) -> Option<TransferForm> {
        if name == self.msr_immediate {
            Some(TransferForm::PStateImmediate)
        } else if name == self.msr_register {
            Some(TransferForm::ToSystemRegister)
        } else if name == self.mrs_register {
            Some(TransferForm::FromSystemRegister)
        } else {
            None
        }
    }

    pub fn is_strict(&self) -> bool {
        self.flags.contains(DecodeFlags::STRICT_EXCLUSION)
    }
}
