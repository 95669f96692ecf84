//! Replays an adaptor's declarations onto a parser builder.
//!
//! Assembly of one adaptor runs in a fixed order:
//!
//! 1. the before step of a two-phase args hook
//! 2. arguments and groups, in source order
//! 3. if the adaptor has subcommands: pending extensions are resolved, the
//!    sub-parser collection is created and every child is assembled into its
//!    own parser, tagged with a hidden back-reference to the child
//! 4. a plain args hook, or the continuation of a two-phase one
//!
//! A group marker is replayed as a group handle followed by its members. If
//! no group of that name is declared the marker is skipped.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::args::{Entry, GroupKind};
use crate::builder::ParserBuilder;
use crate::error::AssembleError;
use crate::registry::{AdaptorId, Registry};
use crate::settings::MissingExtension;
use crate::target::Target;

impl Registry {
    /// Assembles adaptor `id` and its subcommand tree into `parser`.
    pub fn setup_args(
        &mut self,
        id: AdaptorId,
        parser: &mut dyn ParserBuilder,
    ) -> Result<(), AssembleError> {
        trace!(adaptor = %id, name = self.adaptor(id).name(), "assembling parser");

        let finish = match self.adaptor(id).args_hook.clone() {
            Some(hook) => Some(hook.begin(parser)?),
            None => None,
        };

        self.replay(id, parser)?;

        if self.adaptor(id).has_subcommands {
            self.wire_subcommands(id, parser)?;
        }

        if let Some(finish) = finish {
            finish.finish(parser)?;
        }
        Ok(())
    }

    fn replay(&self, id: AdaptorId, parser: &mut dyn ParserBuilder) -> Result<(), AssembleError> {
        let specs = &self.adaptor(id).specs;
        for entry in specs.entries() {
            match entry {
                Entry::Argument(spec) => parser.add_argument(spec)?,
                Entry::Group { name, spec } => {
                    let Some(group) = specs.group(name) else {
                        continue;
                    };
                    let mut handle = match group.kind {
                        Some(GroupKind::Plain) => parser.add_argument_group(name, spec)?,
                        Some(GroupKind::MutuallyExclusive) => {
                            parser.add_mutually_exclusive_group(name, spec)?
                        }
                        None => {
                            trace!(group = %name, "skipping undeclared group");
                            continue;
                        }
                    };
                    for member in &group.arguments {
                        handle.add_argument(member)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn wire_subcommands(
        &mut self,
        id: AdaptorId,
        parser: &mut dyn ParserBuilder,
    ) -> Result<(), AssembleError> {
        self.resolve_extensions(id)?;

        let key = self.backref_key(id);
        let adaptor = self.adaptor(id);
        let children = adaptor.subcommands.clone();
        let spec = adaptor.subparsers.clone();

        let subparsers = parser.add_subparsers(&spec)?;
        for (name, child) in children {
            let display = self.adaptor(child).display.clone();
            let child_parser = subparsers.add_parser(&name, &display)?;
            self.setup_args(child, child_parser)?;

            let mut defaults = Map::new();
            defaults.insert(key.clone(), Value::from(child.index()));
            child_parser.set_defaults(defaults);
        }
        Ok(())
    }

    /// Loads the extension groups pending on `id` into its subcommands.
    ///
    /// Each pending group entry is queried at most once. After a failure,
    /// groups not yet reached stay pending for the next call.
    pub(crate) fn resolve_extensions(&mut self, id: AdaptorId) -> Result<(), AssembleError> {
        let pending = self.adaptor(id).extensions.len();
        if pending == 0 {
            return Ok(());
        }

        let Some(source) = self.extensions.clone() else {
            debug!(adaptor = %id, "no extension source installed, skipping {} groups", pending);
            self.adaptor_mut(id).extensions.clear();
            return Ok(());
        };

        // Each group leaves the pending list before it is queried, so a
        // failed pass never reloads the entries it already registered.
        while !self.adaptor(id).extensions.is_empty() {
            let group = self.adaptor_mut(id).extensions.remove(0);
            for entry in source.entries(&group) {
                let name = entry.name().to_string();
                match entry.load(self) {
                    Ok(child) => {
                        debug!(group = %group, name = %name, "loaded extension");
                        self.adaptor_mut(id).add_subcommand(name, child);
                    }
                    Err(err)
                        if err.is_unavailable()
                            && self.settings.missing_extension == MissingExtension::Skip =>
                    {
                        debug!(group = %group, name = %name, error = %err, "extension unavailable");
                    }
                    Err(err) => {
                        return Err(AssembleError::Extension {
                            group,
                            name,
                            source: err,
                        })
                    }
                }
            }
        }
        Ok(())
    }

    /// Name to target map of the subcommands of `id`.
    ///
    /// Pending extensions are resolved first. An adaptor without subcommands
    /// yields an empty map.
    pub fn subcommands(
        &mut self,
        id: AdaptorId,
    ) -> Result<BTreeMap<String, Rc<Target>>, AssembleError> {
        if !self.adaptor(id).has_subcommands {
            return Ok(BTreeMap::new());
        }
        self.resolve_extensions(id)?;

        Ok(self
            .adaptor(id)
            .subcommands
            .iter()
            .map(|(name, child)| (name.clone(), self.adaptor(*child).target().clone()))
            .collect())
    }
}
