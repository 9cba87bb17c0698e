//! Interned field identifiers and the decoded field/value map.

use std::fmt;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::isa::error::IsaError;

/// Identifier of a field name interned when the instruction table is compiled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u16);

impl FieldId {
    fn from_index(index: usize) -> Option<Self> {
        u16::try_from(index).ok().map(Self)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of field names known to a table.
#[derive(Clone, Debug, Default)]
pub struct FieldNames {
    names: Vec<String>,
    lookup: AHashMap<String, FieldId>,
}

impl FieldNames {
    pub(crate) fn intern(&mut self, name: &str) -> Result<FieldId, IsaError> {
        if let Some(existing) = self.lookup.get(name) {
            return Ok(*existing);
        }
        let id = FieldId::from_index(self.names.len()).ok_or_else(|| {
            IsaError::Machine(format!("too many distinct field names to intern '{name}'"))
        })?;
        self.names.push(name.to_owned());
        self.lookup.insert(name.to_owned(), id);
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<FieldId> {
        self.lookup.get(name).copied()
    }

    pub fn resolve(&self, id: FieldId) -> &str {
        &self.names[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Decoded values of one instruction's named fields, in diagram order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldValues {
    entries: SmallVec<[(FieldId, u64); 8]>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `id`, replacing an earlier value for the same field.
    pub fn insert(&mut self, id: FieldId, value: u64) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((id, value)),
        }
    }

    pub fn get(&self, id: FieldId) -> Option<u64> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, value)| *value)
    }

    pub fn get_by_name(&self, names: &FieldNames, name: &str) -> Option<u64> {
        names.lookup(name).and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, u64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
