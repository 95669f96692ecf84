//! Declarative configuration of adaptors.
//!
//! Each function here builds a [`Decorator`]. A decorator list reads like a
//! stack of annotations above a function: the first entry is the topmost
//! one. [`Registry::decorate`] applies the list bottom-up, which is what
//! leaves arguments and groups in source order.
//!
//! ```rust
//! use cliadapt::decorators::{argument, description, prog};
//! use cliadapt::{ArgSpec, Registry, Signature, Target};
//!
//! let mut registry = Registry::new();
//! let cmd = Target::function("cmd", Signature::new().required("a").required("b"), |_| {
//!     Ok::<_, anyhow::Error>(())
//! });
//! let id = registry
//!     .decorate(cmd, [
//!         prog("cmd"),
//!         description("Demo."),
//!         argument(ArgSpec::new(["a"])),
//!         argument(ArgSpec::new(["b"])),
//!     ])
//!     .unwrap();
//!
//! let names: Vec<_> = registry
//!     .adaptor(id)
//!     .specs()
//!     .entries()
//!     .iter()
//!     .filter_map(|e| match e {
//!         cliadapt::Entry::Argument(spec) => Some(spec.dest_name()),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(names, ["a", "b"]);
//! ```

use crate::args::{ArgSpec, GroupKind, GroupSpec, SubparsersSpec};
use crate::display::Formatter;
use crate::error::SetupError;
use crate::hooks::{ArgsHook, Processor};
use crate::registry::{Adaptor, AdaptorId, Registry};
use crate::target::Target;

/// One declaration applied to an adaptor.
#[derive(Debug, Clone)]
pub enum Decorator {
    Prog(String),
    Usage(String),
    Description(String),
    Epilog(String),
    Formatter(Formatter),
    Argument {
        spec: ArgSpec,
        group: Option<String>,
    },
    Group {
        name: String,
        kind: GroupKind,
        spec: GroupSpec,
    },
    Subparsers(SubparsersSpec),
    LoadSubcommands(String),
    ArgsHook(ArgsHook),
    Processor(Processor),
}

impl Decorator {
    pub(crate) fn apply(self, adaptor: &mut Adaptor) -> Result<(), SetupError> {
        match self {
            Decorator::Prog(text) => adaptor.display.prog = Some(text),
            Decorator::Usage(text) => adaptor.display.usage = Some(text),
            Decorator::Description(text) => adaptor.display.description = Some(text),
            Decorator::Epilog(text) => adaptor.display.epilog = Some(text),
            Decorator::Formatter(formatter) => adaptor.display.formatter = formatter,
            Decorator::Argument { spec, group } => {
                adaptor.specs.add_argument(spec, group.as_deref())
            }
            Decorator::Group { name, kind, spec } => adaptor.specs.add_group(&name, kind, spec)?,
            Decorator::Subparsers(spec) => adaptor.enable_subparsers(spec),
            Decorator::LoadSubcommands(group) => adaptor.add_extensions(group),
            Decorator::ArgsHook(hook) => adaptor.args_hook = Some(hook),
            Decorator::Processor(processor) => adaptor.processor = Some(processor),
        }
        Ok(())
    }
}

pub fn prog(text: impl Into<String>) -> Decorator {
    Decorator::Prog(text.into())
}

pub fn usage(text: impl Into<String>) -> Decorator {
    Decorator::Usage(text.into())
}

/// Overrides the description derived from the target's doc text.
pub fn description(text: impl Into<String>) -> Decorator {
    Decorator::Description(text.into())
}

pub fn epilog(text: impl Into<String>) -> Decorator {
    Decorator::Epilog(text.into())
}

pub fn formatter(formatter: Formatter) -> Decorator {
    Decorator::Formatter(formatter)
}

/// Declares an argument.
pub fn argument(spec: ArgSpec) -> Decorator {
    Decorator::Argument { spec, group: None }
}

/// Declares an argument belonging to group `group`.
///
/// The group may be declared by a decorator further up the list, or not at
/// all; members of a group that is never declared are not replayed.
pub fn argument_in(group: impl Into<String>, spec: ArgSpec) -> Decorator {
    Decorator::Argument {
        spec,
        group: Some(group.into()),
    }
}

pub fn argument_group(name: impl Into<String>, spec: GroupSpec) -> Decorator {
    Decorator::Group {
        name: name.into(),
        kind: GroupKind::Plain,
        spec,
    }
}

pub fn mutually_exclusive_group(name: impl Into<String>, spec: GroupSpec) -> Decorator {
    Decorator::Group {
        name: name.into(),
        kind: GroupKind::MutuallyExclusive,
        spec,
    }
}

/// Configures the sub-parser collection and forces it to be created.
pub fn subparsers(spec: SubparsersSpec) -> Decorator {
    Decorator::Subparsers(spec)
}

/// Names an extension group whose entries become subcommands.
pub fn load_subcommands(group: impl Into<String>) -> Decorator {
    Decorator::LoadSubcommands(group.into())
}

pub fn args_hook(hook: ArgsHook) -> Decorator {
    Decorator::ArgsHook(hook)
}

pub fn processor(processor: Processor) -> Decorator {
    Decorator::Processor(processor)
}

impl Registry {
    /// Registers `target` and applies `decorators` to its new adaptor.
    pub fn decorate<I>(&mut self, target: Target, decorators: I) -> Result<AdaptorId, SetupError>
    where
        I: IntoIterator<Item = Decorator>,
    {
        let id = self.register(target);
        self.apply(id, decorators)?;
        Ok(id)
    }

    /// Applies `decorators` to an existing adaptor, last entry first.
    pub fn apply<I>(&mut self, id: AdaptorId, decorators: I) -> Result<(), SetupError>
    where
        I: IntoIterator<Item = Decorator>,
    {
        let decorators: Vec<_> = decorators.into_iter().collect();
        let adaptor = self.adaptor_mut(id);
        for decorator in decorators.into_iter().rev() {
            decorator.apply(adaptor)?;
        }
        Ok(())
    }
}
