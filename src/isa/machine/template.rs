//! Assembly templates split into literal text and `<name>` placeholders.
//!
//! Placeholders are resolved against the table's interned field names once, when the
//! template is compiled, so rendering never looks names up again.

use super::fields::{FieldId, FieldNames};

/// Placeholder that receives a resolved system-register name.
pub const SYSTEM_REGISTER_SLOT: &str = "systemreg";

/// Register-file reference such as `<Xt>`, read from the `Rt` field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterRef {
    pub field_name: String,
    pub field: Option<FieldId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub field: Option<FieldId>,
    pub register: Option<RegisterRef>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateToken {
    Text(String),
    Placeholder(Placeholder),
    SystemRegister,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Text,
    Name,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsmTemplate {
    source: String,
    tokens: Vec<TemplateToken>,
}

impl AsmTemplate {
    pub fn parse(source: &str, names: &FieldNames) -> Self {
        let mut tokens = Vec::new();
        let mut text = String::new();
        let mut name = String::new();
        let mut state = ScanState::Text;

        for ch in source.chars() {
            match state {
                ScanState::Text if ch == '<' => state = ScanState::Name,
                ScanState::Text => text.push(ch),
                ScanState::Name if ch.is_ascii_alphanumeric() || ch == '_' => name.push(ch),
                ScanState::Name if ch == '>' && !name.is_empty() => {
                    if !text.is_empty() {
                        tokens.push(TemplateToken::Text(std::mem::take(&mut text)));
                    }
                    tokens.push(placeholder_token(std::mem::take(&mut name), names));
                    state = ScanState::Text;
                }
                ScanState::Name => {
                    text.push('<');
                    text.push_str(&name);
                    name.clear();
                    if ch != '<' {
                        text.push(ch);
                        state = ScanState::Text;
                    }
                }
            }
        }
        if state == ScanState::Name {
            text.push('<');
            text.push_str(&name);
        }
        if !text.is_empty() {
            tokens.push(TemplateToken::Text(text));
        }

        Self {
            source: source.to_owned(),
            tokens,
        }
    }

    /// Prepends literal text that is never scanned for placeholders.
    pub(crate) fn with_leading_text(mut self, text: &str) -> Self {
        if text.is_empty() {
            return self;
        }
        self.source.insert_str(0, text);
        match self.tokens.first_mut() {
            Some(TemplateToken::Text(existing)) => existing.insert_str(0, text),
            _ => self.tokens.insert(0, TemplateToken::Text(text.to_owned())),
        }
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[TemplateToken] {
        &self.tokens
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.tokens.iter().filter_map(|token| match token {
            TemplateToken::Placeholder(placeholder) => Some(placeholder),
            _ => None,
        })
    }
}

fn placeholder_token(name: String, names: &FieldNames) -> TemplateToken {
    if name == SYSTEM_REGISTER_SLOT {
        return TemplateToken::SystemRegister;
    }
    let register = register_field_name(&name).map(|field_name| RegisterRef {
        field: names.lookup(&field_name),
        field_name,
    });
    TemplateToken::Placeholder(Placeholder {
        field: names.lookup(&name),
        register,
        name,
    })
}

/// `Wd`/`Xn`/... name the general register held in `Rd`/`Rn`/...
fn register_field_name(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let (Some(bank), Some(slot), None) = (chars.next(), chars.next(), chars.next()) else {
        return None;
    };
    (matches!(bank, 'W' | 'X') && matches!(slot, 'd' | 'm' | 'n' | 't')).then(|| format!("R{slot}"))
}
