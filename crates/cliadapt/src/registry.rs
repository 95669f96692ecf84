//! The adaptor registry.
//!
//! Every callable the engine knows about gets an [`Adaptor`]: its argument
//! declarations, subcommands, hooks and help metadata. Adaptors live in an
//! application-owned [`Registry`] and are addressed by [`AdaptorId`]. Two
//! registries never share state.
//!
//! Parent/child links are plain ids. A subcommand's adaptor is an ordinary
//! registry entry, so the same command can be reachable from several parents.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::args::{ArgumentSpecs, SubparsersSpec};
use crate::display::DisplayMeta;
use crate::extension::ExtensionSource;
use crate::hooks::{ArgsHook, Processor};
use crate::settings::Settings;
use crate::target::Target;

/// Handle to an adaptor inside a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdaptorId(usize);

impl AdaptorId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AdaptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-callable configuration.
#[derive(Debug)]
pub struct Adaptor {
    target: Rc<Target>,
    pub(crate) specs: ArgumentSpecs,
    pub(crate) subcommands: Vec<(String, AdaptorId)>,
    pub(crate) extensions: Vec<String>,
    pub(crate) has_subcommands: bool,
    pub(crate) subparsers: SubparsersSpec,
    pub(crate) args_hook: Option<ArgsHook>,
    pub(crate) processor: Option<Processor>,
    pub(crate) display: DisplayMeta,
}

impl Adaptor {
    fn new(target: Target) -> Self {
        let display = DisplayMeta::from_doc(target.doc());
        Self {
            target: Rc::new(target),
            specs: ArgumentSpecs::new(),
            subcommands: Vec::new(),
            extensions: Vec::new(),
            has_subcommands: false,
            subparsers: SubparsersSpec::new(),
            args_hook: None,
            processor: None,
            display,
        }
    }

    pub fn target(&self) -> &Rc<Target> {
        &self.target
    }

    pub fn name(&self) -> &str {
        self.target.name()
    }

    pub fn specs(&self) -> &ArgumentSpecs {
        &self.specs
    }

    pub fn display(&self) -> &DisplayMeta {
        &self.display
    }

    pub fn subparsers(&self) -> &SubparsersSpec {
        &self.subparsers
    }

    /// Whether a sub-parser collection is created for this adaptor.
    pub fn has_subcommands(&self) -> bool {
        self.has_subcommands
    }

    /// Registered subcommands in registration order.
    pub fn subcommands(&self) -> &[(String, AdaptorId)] {
        &self.subcommands
    }

    /// Extension groups not yet resolved.
    pub fn pending_extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn args_hook(&self) -> Option<&ArgsHook> {
        self.args_hook.as_ref()
    }

    pub fn processor(&self) -> Option<&Processor> {
        self.processor.as_ref()
    }

    /// Re-registering a name replaces the earlier child in place.
    pub(crate) fn add_subcommand(&mut self, name: String, child: AdaptorId) {
        match self.subcommands.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = child,
            None => self.subcommands.push((name, child)),
        }
        self.has_subcommands = true;
    }

    pub(crate) fn add_extensions(&mut self, group: String) {
        self.extensions.push(group);
        self.has_subcommands = true;
    }

    pub(crate) fn enable_subparsers(&mut self, spec: SubparsersSpec) {
        self.subparsers = spec;
        self.has_subcommands = true;
    }
}

/// Owner of all adaptors of an application.
#[derive(Default)]
pub struct Registry {
    adaptors: Vec<Adaptor>,
    pub(crate) settings: Settings,
    pub(crate) extensions: Option<Rc<dyn ExtensionSource>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Installs the enumerator consulted for extension groups.
    pub fn with_extensions(mut self, source: impl ExtensionSource + 'static) -> Self {
        self.extensions = Some(Rc::new(source));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Creates the adaptor for `target` and returns its handle.
    pub fn register(&mut self, target: Target) -> AdaptorId {
        let id = AdaptorId(self.adaptors.len());
        tracing::trace!(target_name = target.name(), %id, "registering adaptor");
        self.adaptors.push(Adaptor::new(target));
        id
    }

    pub fn get(&self, id: AdaptorId) -> Option<&Adaptor> {
        self.adaptors.get(id.0)
    }

    /// Looks up the first adaptor whose target is called `name`.
    pub fn find(&self, name: &str) -> Option<AdaptorId> {
        self.adaptors
            .iter()
            .position(|a| a.name() == name)
            .map(AdaptorId)
    }

    pub fn len(&self) -> usize {
        self.adaptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adaptors.is_empty()
    }

    /// # Panics
    ///
    /// If `id` was issued by another registry.
    pub fn adaptor(&self, id: AdaptorId) -> &Adaptor {
        &self.adaptors[id.0]
    }

    pub(crate) fn id_at(&self, index: usize) -> Option<AdaptorId> {
        (index < self.adaptors.len()).then_some(AdaptorId(index))
    }

    pub(crate) fn adaptor_mut(&mut self, id: AdaptorId) -> &mut Adaptor {
        &mut self.adaptors[id.0]
    }

    /// Registers `child` as a subcommand of `parent`, named after its target.
    pub fn subcommand(&mut self, parent: AdaptorId, child: AdaptorId) -> AdaptorId {
        let name = self.adaptor(child).name().to_string();
        self.subcommand_named(parent, name, child)
    }

    /// Registers `child` as subcommand `name` of `parent`.
    ///
    /// Returns `child` so registration can be chained.
    pub fn subcommand_named(
        &mut self,
        parent: AdaptorId,
        name: impl Into<String>,
        child: AdaptorId,
    ) -> AdaptorId {
        let name = name.into();
        tracing::trace!(%parent, %child, name = %name, "adding subcommand");
        self.adaptor_mut(parent).add_subcommand(name, child);
        child
    }

    /// The hidden namespace key naming the subcommand chosen under `id`.
    pub fn backref_key(&self, id: AdaptorId) -> String {
        format!("{}{}", self.settings.backref_prefix, id.0)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("adaptor_count", &self.adaptors.len())
            .field("settings", &self.settings)
            .field("has_extension_source", &self.extensions.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Signature;

    fn noop(name: &str) -> Target {
        Target::function(name, Signature::new(), |_| Ok::<_, anyhow::Error>(()))
    }

    #[test]
    fn test_register_and_find() {
        let mut registry = Registry::new();
        let a = registry.register(noop("a"));
        let b = registry.register(noop("b"));

        assert_ne!(a, b);
        assert_eq!(registry.find("b"), Some(b));
        assert_eq!(registry.find("c"), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_description_from_doc() {
        let mut registry = Registry::new();
        let id = registry.register(noop("a").with_doc("Does a thing.\n\nDetails."));
        assert_eq!(
            registry.adaptor(id).display().description.as_deref(),
            Some("Does a thing.")
        );
    }

    #[test]
    fn test_fresh_adaptor() {
        let mut registry = Registry::new();
        let id = registry.register(noop("a"));
        let adaptor = registry.adaptor(id);

        assert!(adaptor.specs().is_empty());
        assert!(!adaptor.has_subcommands());
        assert!(adaptor.subcommands().is_empty());
        assert!(adaptor.args_hook().is_none());
        assert!(adaptor.processor().is_none());
    }

    #[test]
    fn test_subcommand_derived_name() {
        let mut registry = Registry::new();
        let root = registry.register(noop("root"));
        let child = registry.register(noop("child"));

        assert_eq!(registry.subcommand(root, child), child);
        assert!(registry.adaptor(root).has_subcommands());
        assert_eq!(
            registry.adaptor(root).subcommands(),
            &[("child".to_string(), child)]
        );
    }

    #[test]
    fn test_subcommand_same_name_replaces() {
        let mut registry = Registry::new();
        let root = registry.register(noop("root"));
        let first = registry.register(noop("first"));
        let second = registry.register(noop("second"));
        let other = registry.register(noop("other"));

        registry.subcommand_named(root, "x", first);
        registry.subcommand(root, other);
        registry.subcommand_named(root, "x", second);

        assert_eq!(
            registry.adaptor(root).subcommands(),
            &[("x".to_string(), second), ("other".to_string(), other)]
        );
    }

    #[test]
    fn test_registries_are_independent() {
        let mut one = Registry::new();
        let mut two = Registry::new();
        let root = one.register(noop("root"));
        let child = one.register(noop("child"));
        one.subcommand(root, child);

        let root_two = two.register(noop("root"));
        assert!(!two.adaptor(root_two).has_subcommands());
        assert_eq!(two.len(), 1);
    }

    #[test]
    fn test_backref_key() {
        let mut registry = Registry::with_settings(Settings::default().backref_prefix("__via_"));
        let id = registry.register(noop("a"));
        assert_eq!(registry.backref_key(id), "__via_0");
    }
}
