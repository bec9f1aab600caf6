//! Ordered collection of adapters.
//!
//! An [`AdapterSet`] holds at most one [`AdapterKind::Defaults`] adapter, which
//! must sit at index 0, and at most one [`AdapterKind::Overrides`] adapter,
//! which must sit at the last index. Every mutation checks the resulting order
//! before touching the set, so a rejected call leaves it unchanged.

use std::fmt;

use super::adapter::{Adapter, AdapterKind};
use super::fixed::Defaults;
use super::{ConfigError, Result};

#[derive(Default)]
pub struct AdapterSet {
    adapters: Vec<Box<dyn Adapter>>,
    defaults: Option<usize>,
    overrides: Option<usize>,
}

impl fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.adapters.iter()).finish()
    }
}

/// Checks the positional rules against a candidate kind sequence.
///
/// Duplicates are reported before misplacements.
fn validate(kinds: &[AdapterKind]) -> Result<()> {
    for special in [AdapterKind::Defaults, AdapterKind::Overrides] {
        if kinds.iter().filter(|kind| **kind == special).count() > 1 {
            return Err(ConfigError::DuplicateAdapter(special));
        }
    }

    let last = kinds.len().saturating_sub(1);
    for (index, kind) in kinds.iter().enumerate() {
        let misplaced = match kind {
            AdapterKind::Defaults => index != 0,
            AdapterKind::Overrides => index != last,
            AdapterKind::Ordinary => false,
        };
        if misplaced {
            return Err(ConfigError::MisplacedAdapter { kind: *kind, index });
        }
    }

    Ok(())
}

impl AdapterSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding `adapters` in the given order.
    pub fn from_adapters(adapters: Vec<Box<dyn Adapter>>) -> Result<Self> {
        let kinds: Vec<_> = adapters.iter().map(|a| a.kind()).collect();
        validate(&kinds)?;

        let mut set = Self {
            adapters,
            defaults: None,
            overrides: None,
        };
        set.reindex();
        Ok(set)
    }

    pub(crate) fn from_defaults(defaults: Defaults) -> Self {
        Self {
            adapters: vec![Box::new(defaults)],
            defaults: Some(0),
            overrides: None,
        }
    }

    fn reindex(&mut self) {
        self.defaults = self
            .adapters
            .first()
            .filter(|a| a.kind() == AdapterKind::Defaults)
            .map(|_| 0);
        self.overrides = self
            .adapters
            .last()
            .filter(|a| a.kind() == AdapterKind::Overrides)
            .map(|_| self.adapters.len() - 1);
    }

    fn check_insert(&self, index: usize, kind: AdapterKind) -> Result<()> {
        if index > self.adapters.len() {
            return Err(ConfigError::IndexOutOfBounds {
                index,
                len: self.adapters.len(),
            });
        }
        let mut kinds = self.kinds();
        kinds.insert(index, kind);
        validate(&kinds)
    }

    fn check_replace(&self, index: usize, kind: AdapterKind) -> Result<()> {
        if index >= self.adapters.len() {
            return Err(ConfigError::IndexOutOfBounds {
                index,
                len: self.adapters.len(),
            });
        }
        let mut kinds = self.kinds();
        kinds[index] = kind;
        validate(&kinds)
    }

    /// Appends an adapter at the end.
    pub fn push<A: Adapter + 'static>(&mut self, adapter: A) -> Result<()> {
        self.push_boxed(Box::new(adapter))
    }

    pub fn push_boxed(&mut self, adapter: Box<dyn Adapter>) -> Result<()> {
        self.insert_boxed(self.adapters.len(), adapter)
    }

    /// Inserts an adapter at the front.
    pub fn push_front<A: Adapter + 'static>(&mut self, adapter: A) -> Result<()> {
        self.insert_boxed(0, Box::new(adapter))
    }

    /// Inserts an adapter so that it ends up at `index`.
    ///
    /// Fails if `index > len`, or if the resulting order breaks the
    /// defaults-first / overrides-last rule.
    pub fn insert<A: Adapter + 'static>(&mut self, index: usize, adapter: A) -> Result<()> {
        self.insert_boxed(index, Box::new(adapter))
    }

    pub fn insert_boxed(&mut self, index: usize, adapter: Box<dyn Adapter>) -> Result<()> {
        self.check_insert(index, adapter.kind())?;
        self.adapters.insert(index, adapter);
        self.reindex();
        Ok(())
    }

    /// Replaces the adapter at `index`, returning the previous one.
    pub fn replace<A: Adapter + 'static>(
        &mut self,
        index: usize,
        adapter: A,
    ) -> Result<Box<dyn Adapter>> {
        self.replace_boxed(index, Box::new(adapter))
    }

    pub fn replace_boxed(
        &mut self,
        index: usize,
        adapter: Box<dyn Adapter>,
    ) -> Result<Box<dyn Adapter>> {
        self.check_replace(index, adapter.kind())?;
        let previous = std::mem::replace(&mut self.adapters[index], adapter);
        self.reindex();
        Ok(previous)
    }

    /// Removes and returns the adapter at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Box<dyn Adapter>> {
        if index >= self.adapters.len() {
            return Err(ConfigError::IndexOutOfBounds {
                index,
                len: self.adapters.len(),
            });
        }
        let removed = self.adapters.remove(index);
        self.reindex();
        Ok(removed)
    }

    pub fn defaults(&self) -> Option<&dyn Adapter> {
        self.defaults.map(|i| self.adapters[i].as_ref())
    }

    pub fn overrides(&self) -> Option<&dyn Adapter> {
        self.overrides.map(|i| self.adapters[i].as_ref())
    }

    /// Installs `adapter` as the defaults member, replacing the current one or
    /// inserting it at the front.
    pub fn set_defaults<A: Adapter + 'static>(&mut self, adapter: A) -> Result<()> {
        self.set_defaults_boxed(Box::new(adapter))
    }

    pub fn set_defaults_boxed(&mut self, adapter: Box<dyn Adapter>) -> Result<()> {
        if adapter.kind() != AdapterKind::Defaults {
            return Err(ConfigError::WrongAdapterKind {
                expected: AdapterKind::Defaults,
                found: adapter.kind(),
            });
        }
        match self.defaults {
            Some(index) => self.replace_boxed(index, adapter).map(drop),
            None => self.insert_boxed(0, adapter),
        }
    }

    /// Installs `adapter` as the overrides member, replacing the current one or
    /// appending it at the end.
    pub fn set_overrides<A: Adapter + 'static>(&mut self, adapter: A) -> Result<()> {
        self.set_overrides_boxed(Box::new(adapter))
    }

    pub fn set_overrides_boxed(&mut self, adapter: Box<dyn Adapter>) -> Result<()> {
        if adapter.kind() != AdapterKind::Overrides {
            return Err(ConfigError::WrongAdapterKind {
                expected: AdapterKind::Overrides,
                found: adapter.kind(),
            });
        }
        match self.overrides {
            Some(index) => self.replace_boxed(index, adapter).map(drop),
            None => self.push_boxed(adapter),
        }
    }

    /// Index of the overrides member, if any.
    pub fn overrides_index(&self) -> Option<usize> {
        self.overrides
    }

    pub fn get(&self, index: usize) -> Option<&dyn Adapter> {
        self.adapters.get(index).map(|a| a.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Adapter + 'static)> {
        self.adapters.get_mut(index).map(|a| a.as_mut())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn kinds(&self) -> Vec<AdapterKind> {
        self.adapters.iter().map(|a| a.kind()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn Adapter + 'static)> {
        self.adapters.iter().map(|a| a.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn Adapter + 'static)> {
        self.adapters.iter_mut().map(|a| a.as_mut())
    }
}
