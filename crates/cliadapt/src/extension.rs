//! Deferred subcommand groups supplied by an extension enumerator.
//!
//! An adaptor can name extension groups instead of listing subcommands. Just
//! before its parser is assembled (or its subcommands are listed) the
//! registry asks its [`ExtensionSource`] for the entries of each group and
//! loads them. Loading hands back the [`AdaptorId`] of the extension's
//! command.
//!
//! Some load failures only mean the extension is not available: the code is
//! missing, the loaded object carries no adaptor, or its metadata is
//! malformed. Those are skipped under the default
//! [`MissingExtension::Skip`](crate::MissingExtension) policy. Anything else
//! fails assembly.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::registry::{AdaptorId, Registry};

/// Error loading one extension.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("extension not found: {0}")]
    NotFound(String),

    #[error("no adaptor attached to {0}")]
    MissingAdaptor(String),

    #[error("malformed extension metadata: {0}")]
    Malformed(String),

    #[error(transparent)]
    Other(anyhow::Error),
}

impl LoadError {
    /// True for the kinds that mean "not available" rather than broken.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, LoadError::Other(_))
    }
}

/// Loads an extension into the registry.
pub type LoadFn = Box<dyn FnOnce(&mut Registry) -> Result<AdaptorId, LoadError>>;

/// One `(name, loader)` pair yielded by an enumerator.
pub struct ExtensionEntry {
    name: String,
    loader: LoadFn,
}

impl ExtensionEntry {
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: FnOnce(&mut Registry) -> Result<AdaptorId, LoadError> + 'static,
    {
        Self {
            name: name.into(),
            loader: Box::new(loader),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn load(self, registry: &mut Registry) -> Result<AdaptorId, LoadError> {
        (self.loader)(registry)
    }
}

impl fmt::Debug for ExtensionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Enumerates the extensions registered under a group name.
pub trait ExtensionSource {
    fn entries(&self, group: &str) -> Vec<ExtensionEntry>;
}

type SharedLoadFn = Rc<dyn Fn(&mut Registry) -> Result<AdaptorId, LoadError>>;

/// An in-memory extension enumerator.
///
/// Entries come back in registration order; registering the same name twice
/// yields it twice.
///
/// ```rust
/// use cliadapt::{ExtensionTable, LoadError};
///
/// let table = ExtensionTable::new()
///     .entry("tasks.plugins", "export", |reg| {
///         reg.find("export").ok_or_else(|| LoadError::MissingAdaptor("export".into()))
///     });
/// ```
#[derive(Clone, Default)]
pub struct ExtensionTable {
    groups: HashMap<String, Vec<(String, SharedLoadFn)>>,
}

impl ExtensionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry to `group`.
    pub fn entry<F>(mut self, group: &str, name: &str, loader: F) -> Self
    where
        F: Fn(&mut Registry) -> Result<AdaptorId, LoadError> + 'static,
    {
        self.groups
            .entry(group.to_string())
            .or_default()
            .push((name.to_string(), Rc::new(loader)));
        self
    }
}

impl ExtensionSource for ExtensionTable {
    fn entries(&self, group: &str) -> Vec<ExtensionEntry> {
        self.groups
            .get(group)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(name, loader)| {
                        let loader = loader.clone();
                        ExtensionEntry::new(name.clone(), move |reg: &mut Registry| loader(reg))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Debug for ExtensionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionTable")
            .field("group_count", &self.groups.len())
            .finish()
    }
}
