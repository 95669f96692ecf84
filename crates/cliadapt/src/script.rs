//! A borrowed view of one adaptor.
//!
//! [`Script`] bundles a registry with an adaptor id so the adaptor's
//! operations read like methods on the command itself.
//!
//! ```rust
//! use cliadapt::decorators::argument;
//! use cliadapt::{kwarg, ArgSpec, Registry, ScriptApi, Signature, Target};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! let greet = Target::function("greet", Signature::new().required("name"), |kw| {
//!     let name: String = kwarg(&kw, "name")?;
//!     Ok::<_, anyhow::Error>(format!("hello {}", name))
//! });
//! let id = registry.decorate(greet, [argument(ArgSpec::new(["name"]))]).unwrap();
//!
//! let value = registry.script(id).console(["ana"]).unwrap();
//! assert_eq!(value, json!("hello ana"));
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::rc::Rc;

use serde_json::Value;

use crate::builder::ParserBuilder;
use crate::error::{AssembleError, BindingError, ConsoleError, DispatchError};
use crate::hooks::{ArgsHook, Outcome, Processor};
use crate::namespace::Namespace;
use crate::registry::{Adaptor, AdaptorId, Registry};
use crate::signature::Kwargs;
use crate::target::Target;

/// Operations available on a registered command.
pub trait ScriptApi {
    fn id(&self) -> AdaptorId;

    /// Installs the hook run around argument assembly.
    fn args_hook(&mut self, hook: ArgsHook) -> &mut Self;

    /// Installs the hook run around the target call.
    fn processor(&mut self, processor: Processor) -> &mut Self;

    /// Registers `child` as a subcommand named after its target.
    fn subcommand(&mut self, child: AdaptorId) -> AdaptorId;

    /// Registers `child` as subcommand `name`.
    fn subcommand_named(&mut self, name: &str, child: AdaptorId) -> AdaptorId;

    fn setup_args(&mut self, parser: &mut dyn ParserBuilder) -> Result<(), AssembleError>;

    fn get_kwargs(&self, ns: &Namespace) -> Result<Kwargs, BindingError>;

    fn safe_call(&self, ns: &mut Namespace) -> Result<Outcome, DispatchError>;

    fn console<I, T>(&mut self, argv: I) -> Result<Value, ConsoleError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone;

    fn subcommands(&mut self) -> Result<BTreeMap<String, Rc<Target>>, AssembleError>;
}

/// An adaptor together with the registry that owns it.
pub struct Script<'r> {
    registry: &'r mut Registry,
    id: AdaptorId,
}

impl Registry {
    pub fn script(&mut self, id: AdaptorId) -> Script<'_> {
        Script { registry: self, id }
    }
}

impl Script<'_> {
    pub fn adaptor(&self) -> &Adaptor {
        self.registry.adaptor(self.id)
    }
}

impl ScriptApi for Script<'_> {
    fn id(&self) -> AdaptorId {
        self.id
    }

    fn args_hook(&mut self, hook: ArgsHook) -> &mut Self {
        self.registry.adaptor_mut(self.id).args_hook = Some(hook);
        self
    }

    fn processor(&mut self, processor: Processor) -> &mut Self {
        self.registry.adaptor_mut(self.id).processor = Some(processor);
        self
    }

    fn subcommand(&mut self, child: AdaptorId) -> AdaptorId {
        self.registry.subcommand(self.id, child)
    }

    fn subcommand_named(&mut self, name: &str, child: AdaptorId) -> AdaptorId {
        self.registry.subcommand_named(self.id, name, child)
    }

    fn setup_args(&mut self, parser: &mut dyn ParserBuilder) -> Result<(), AssembleError> {
        self.registry.setup_args(self.id, parser)
    }

    fn get_kwargs(&self, ns: &Namespace) -> Result<Kwargs, BindingError> {
        self.registry.get_kwargs(self.id, ns)
    }

    fn safe_call(&self, ns: &mut Namespace) -> Result<Outcome, DispatchError> {
        self.registry.safe_call(self.id, ns)
    }

    fn console<I, T>(&mut self, argv: I) -> Result<Value, ConsoleError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.registry.console(self.id, argv)
    }

    fn subcommands(&mut self) -> Result<BTreeMap<String, Rc<Target>>, AssembleError> {
        self.registry.subcommands(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::hooks::Resume;
    use crate::signature::Signature;

    fn constant(name: &str, value: i64) -> Target {
        Target::function(name, Signature::new(), move |_| Ok::<_, anyhow::Error>(value))
    }

    #[test]
    fn test_hooks_through_script() {
        let mut registry = Registry::new();
        let id = registry.register(constant("one", 1));

        registry
            .script(id)
            .args_hook(ArgsHook::plain(|_| Ok(())))
            .processor(Processor::two_phase(|_| {
                Ok(Some(|_: &Namespace, _: &Outcome| Ok(Resume::Replace(json!(2)))))
            }));

        assert!(registry.adaptor(id).args_hook().is_some());
        let outcome = registry.script(id).safe_call(&mut Namespace::new()).unwrap();
        assert_eq!(outcome.value(), Some(&json!(2)));
    }

    #[test]
    fn test_subcommands_through_script() {
        let mut registry = Registry::new();
        let root = registry.register(constant("root", 0));
        let child = registry.register(constant("child", 1));

        let mut script = registry.script(root);
        assert_eq!(script.subcommand(child), child);
        assert_eq!(script.subcommand_named("other", child), child);

        let names: Vec<_> = script.subcommands().unwrap().into_keys().collect();
        assert_eq!(names, vec!["child", "other"]);
        assert_eq!(script.id(), root);
        assert_eq!(script.adaptor().name(), "root");
    }
}
