//! The set of declared variable names.
//!
//! A name is a valid dependency target only if some block declares it with a
//! type. The set is computed once over all blocks before any statement is
//! parsed, so that a variable referenced before its declaration still
//! resolves.

use indexmap::IndexMap;

use crate::identifier::Id;

/// Declared variable names, each with the block that first declared it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredSet {
    names: IndexMap<Id, String>,
}

impl DeclaredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` as declared in `block`. Returns `false` if the name was
    /// already declared; the first declaring block is kept.
    pub fn insert(&mut self, name: Id, block: &str) -> bool {
        if self.names.contains_key(&name) {
            return false;
        }
        self.names.insert(name, block.to_string());
        true
    }

    pub fn contains(&self, name: Id) -> bool {
        self.names.contains_key(&name)
    }

    /// Resolves a raw token to a declared name, without interning the token.
    pub fn resolve(&self, token: &str) -> Option<Id> {
        Id::lookup(token).filter(|id| self.contains(*id))
    }

    /// The block that first declared `name`.
    pub fn block_of(&self, name: Id) -> Option<&str> {
        self.names.get(&name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over declared names in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        self.names.keys().copied()
    }
}
