//! Template substitution and the system-register special forms.

use tracing::debug;

use super::fields::{FieldId, FieldNames, FieldValues};
use super::instruction::InstructionSpec;
use super::options::{DecodeFlags, DecodeOptions, TransferForm, UnknownRegister};
use super::sysreg::{SystemRegisterResolver, SystemRegisterTuple};
use super::template::{AsmTemplate, Placeholder, TemplateToken};

/// Fields of a register-transfer form that feed the system-register tuple.
pub(super) const TRANSFER_FIELDS: [&str; 6] = ["o0", "op1", "CRn", "CRm", "op2", "Rt"];

/// `o0` selects between the two halves of the `op0` space sharing one opcode.
const OP0_BIAS: u64 = 2;

#[derive(Clone, Copy, Debug, Default)]
struct TransferFields {
    o0: Option<FieldId>,
    op1: Option<FieldId>,
    crn: Option<FieldId>,
    crm: Option<FieldId>,
    op2: Option<FieldId>,
}

impl TransferFields {
    fn new(names: &FieldNames) -> Self {
        Self {
            o0: names.lookup("o0"),
            op1: names.lookup("op1"),
            crn: names.lookup("CRn"),
            crm: names.lookup("CRm"),
            op2: names.lookup("op2"),
        }
    }

    fn tuple(&self, values: &FieldValues) -> SystemRegisterTuple {
        let read = |id: Option<FieldId>| id.and_then(|id| values.get(id)).unwrap_or(0);
        SystemRegisterTuple::new(
            read(self.o0) + OP0_BIAS,
            read(self.op1),
            read(self.crn),
            read(self.crm),
            read(self.op2),
        )
    }
}

/// Renders matched instructions for one table and one set of options.
#[derive(Clone, Debug)]
pub struct Renderer {
    options: DecodeOptions,
    pstate: AsmTemplate,
    to_system: AsmTemplate,
    from_system: AsmTemplate,
    transfer: TransferFields,
}

impl Renderer {
    pub fn new(names: &FieldNames, options: DecodeOptions) -> Self {
        let pstate = AsmTemplate::parse(", #<CRm>", names)
            .with_leading_text(&format!("MSR {}", options.pstate_register));
        Self {
            pstate,
            to_system: AsmTemplate::parse("MSR <systemreg>, <Xt>", names),
            from_system: AsmTemplate::parse("MRS <Xt>, <systemreg>", names),
            transfer: TransferFields::new(names),
            options,
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn render<R>(&self, spec: &InstructionSpec, values: &FieldValues, resolver: &R) -> String
    where
        R: SystemRegisterResolver + ?Sized,
    {
        match self.options.transfer_form(&spec.name) {
            Some(TransferForm::PStateImmediate) => self.substitute(&self.pstate, values, None),
            Some(form) => {
                let tuple = self.transfer.tuple(values);
                let name = self.system_register_name(tuple, resolver);
                let template = if form == TransferForm::ToSystemRegister {
                    &self.to_system
                } else {
                    &self.from_system
                };
                self.substitute(template, values, Some(&name))
            }
            None => self.substitute(spec.template(), values, None),
        }
    }

    fn system_register_name<R>(&self, tuple: SystemRegisterTuple, resolver: &R) -> String
    where
        R: SystemRegisterResolver + ?Sized,
    {
        match resolver.resolve(tuple) {
            Ok(name) if self.options.flags.contains(DecodeFlags::BRACKET_SYSREG_NAMES) => {
                name.replace('<', "[").replace('>', "]")
            }
            Ok(name) => name.to_owned(),
            Err(err) => {
                debug!(%err, "rendering unknown system register");
                match &self.options.unknown_register {
                    UnknownRegister::EncodingName => tuple.to_string(),
                    UnknownRegister::Literal(marker) => marker.clone(),
                }
            }
        }
    }

    fn substitute(
        &self,
        template: &AsmTemplate,
        values: &FieldValues,
        system_register: Option<&str>,
    ) -> String {
        let mut result = String::with_capacity(template.source().len() + 16);
        for token in template.tokens() {
            match token {
                TemplateToken::Text(text) => result.push_str(text),
                TemplateToken::SystemRegister => {
                    result.push_str(system_register.unwrap_or("<systemreg>"));
                }
                TemplateToken::Placeholder(placeholder) => {
                    self.push_placeholder(&mut result, placeholder, values);
                }
            }
        }
        result
    }

    fn push_placeholder(&self, result: &mut String, placeholder: &Placeholder, values: &FieldValues) {
        if self.options.flags.contains(DecodeFlags::REGISTER_REFS)
            && let Some(register) = &placeholder.register
        {
            result.push_str(&self.options.register_prefix);
            match register.field.and_then(|id| values.get(id)) {
                Some(value) => result.push_str(&value.to_string()),
                None => push_verbatim(result, &register.field_name),
            }
            return;
        }
        match placeholder.field.and_then(|id| values.get(id)) {
            Some(value) => result.push_str(&value.to_string()),
            None => push_verbatim(result, &placeholder.name),
        }
    }
}

fn push_verbatim(result: &mut String, name: &str) {
    result.push('<');
    result.push_str(name);
    result.push('>');
}
