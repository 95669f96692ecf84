//! Declarative argument binding and guarded dispatch for clap-based CLIs.
//!
//! `cliadapt` turns ordinary functions into command-line commands. Each
//! function is registered with an adaptor that records its argument
//! declarations, subcommands and hooks. At run time the adaptor tree is
//! replayed onto a parser, `argv` is parsed, the selected command's keyword
//! arguments are bound from the parsed values and the command is called.
//!
//! # Features
//!
//! - **Declarations**: arguments, plain and mutually exclusive groups, help
//!   metadata, declared as a decorator list in source order
//! - **Subcommands**: nested command trees, with lazily loaded extensions
//! - **Binding**: keyword arguments derived from declared signatures, with
//!   class-style commands built before they run
//! - **Hooks**: two-phase args hooks around parser assembly and two-phase
//!   processors around the call, able to keep or replace the result
//! - **Guarded calls**: failures are captured and reported as text unless
//!   debug mode asks for them to propagate
//! - **Clap integration**: [`ClapParser`] builds the clap command tree
//!
//! # Example
//!
//! ```rust
//! use cliadapt::decorators::{argument, description};
//! use cliadapt::{kwarg, ArgAction, ArgSpec, Registry, Signature, Target};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//!
//! let root = registry
//!     .decorate(
//!         Target::function("tasks", Signature::new(), |_| Ok::<_, anyhow::Error>("no command")),
//!         [argument(ArgSpec::new(["--debug"]).action(ArgAction::StoreTrue))],
//!     )
//!     .unwrap();
//!
//! let add = registry
//!     .decorate(
//!         Target::function("add", Signature::new().required("title"), |kw| {
//!             let title: String = kwarg(&kw, "title")?;
//!             Ok::<_, anyhow::Error>(format!("added {}", title))
//!         }),
//!         [description("Add a task."), argument(ArgSpec::new(["title"]))],
//!     )
//!     .unwrap();
//! registry.subcommand(root, add);
//!
//! assert_eq!(registry.console(root, ["add", "milk"]).unwrap(), json!("added milk"));
//! assert_eq!(registry.console(root, Vec::<String>::new()).unwrap(), json!("no command"));
//! ```
//!
//! # Logging
//!
//! Assembly and dispatch emit `tracing` events at `debug` and `trace`
//! level. Install any subscriber to see them.

// Core modules
mod args;
mod assemble;
mod builder;
mod clap_backend;
mod display;
mod error;
mod extension;
mod hooks;
mod invoke;
mod namespace;
mod registry;
mod script;
mod settings;
mod signature;
mod target;

pub mod decorators;

// Re-export core types
pub use args::{
    ArgAction, ArgSpec, ArgumentSpecs, Entry, GroupDecl, GroupKind, GroupSpec, Nargs,
    SubparsersSpec, ValueType,
};

pub use builder::{ArgumentSink, ParserBuilder, RootParser, SubparserSink};

pub use clap_backend::{ClapParser, ClapSubparsers};

pub use display::{clean_text, DisplayMeta, Formatter};

pub use error::{AssembleError, BindingError, ConsoleError, DispatchError, SetupError};

pub use extension::{ExtensionEntry, ExtensionSource, ExtensionTable, LoadError, LoadFn};

pub use hooks::{
    AfterProcessFn, ArgsAfterFn, ArgsBeforeFn, ArgsFn, ArgsHook, HookError, HookPhase, Outcome,
    Processor, ProcessorFn, Resume,
};

pub use namespace::Namespace;

pub use registry::{Adaptor, AdaptorId, Registry};

pub use script::{Script, ScriptApi};

pub use settings::{MissingExtension, Settings};

pub use signature::{bind, ConstructorSignature, Kwargs, Param, Signature};

pub use target::{kwarg, CallFn, Command, ConstructFn, IntoCallResult, Target};
