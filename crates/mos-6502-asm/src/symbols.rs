//! Label table produced by the layout pass.

use std::collections::BTreeMap;

use crate::AsmError;

/// Label name to address, fixed once layout is done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: BTreeMap<String, u16>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` at `address`. Redefinition is an error; the first
    /// definition is kept.
    pub fn define(&mut self, name: &str, address: u16) -> Result<(), AsmError> {
        if self.symbols.contains_key(name) {
            return Err(AsmError::DuplicateLabel(name.to_string()));
        }
        self.symbols.insert(name.to_string(), address);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).copied()
    }

    /// Address of `name`, or `UndefinedLabel`.
    pub fn resolve(&self, name: &str) -> Result<u16, AsmError> {
        self.get(name)
            .ok_or_else(|| AsmError::UndefinedLabel(name.to_string()))
    }

    /// Labels in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> {
        self.symbols.iter().map(|(name, &addr)| (name.as_str(), addr))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
