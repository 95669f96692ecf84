//! Guarded invocation of targets.
//!
//! [`Registry::safe_call`] is the heart of dispatch: it runs the processor's
//! before step, binds keyword arguments from the namespace, calls the target,
//! captures any failure into an [`Outcome`] and finally hands that outcome to
//! the processor's continuation.
//!
//! When the namespace's debug entry is truthy, target failures are not
//! captured. They propagate as [`DispatchError::Invocation`] and the
//! continuation never runs.

use std::ffi::OsString;

use serde_json::Value;
use tracing::{debug, trace};

use crate::builder::RootParser;
use crate::clap_backend::ClapParser;
use crate::error::{BindingError, ConsoleError, DispatchError};
use crate::hooks::Outcome;
use crate::namespace::Namespace;
use crate::registry::{AdaptorId, Registry};
use crate::signature::{bind, Kwargs};
use crate::target::TargetKind;

/// Lets a target failure through in debug mode, otherwise keeps it.
fn guard<T>(result: anyhow::Result<T>, debug: bool) -> Result<anyhow::Result<T>, DispatchError> {
    match result {
        Err(err) if debug => Err(DispatchError::Invocation(err)),
        other => Ok(other),
    }
}

impl Registry {
    /// Keyword arguments for the target of `id`, read from `ns`.
    ///
    /// For class targets this binds against the resolved constructor.
    pub fn get_kwargs(&self, id: AdaptorId, ns: &Namespace) -> Result<Kwargs, BindingError> {
        bind(&self.adaptor(id).target().signature(), ns)
    }

    /// The adaptor that should handle `ns`, starting from `id`.
    ///
    /// Follows the hidden back-references left by subcommand parsers down to
    /// the deepest selected subcommand.
    pub fn select(&self, id: AdaptorId, ns: &Namespace) -> AdaptorId {
        let mut current = id;
        for _ in 0..self.len() {
            let next = ns
                .get(&self.backref_key(current))
                .and_then(Value::as_u64)
                .and_then(|index| usize::try_from(index).ok())
                .and_then(|index| self.id_at(index));
            match next {
                Some(child) if child != current => current = child,
                _ => break,
            }
        }
        current
    }

    /// Calls the target of `id` with arguments from `ns`.
    ///
    /// Binding and hook errors are returned as errors. Failures of the target
    /// come back as [`Outcome::Failure`], or as
    /// [`DispatchError::Invocation`] when debug mode is on.
    pub fn safe_call(&self, id: AdaptorId, ns: &mut Namespace) -> Result<Outcome, DispatchError> {
        let adaptor = self.adaptor(id);
        let target = adaptor.target().clone();
        trace!(adaptor = %id, name = target.name(), "calling target");

        let after = match adaptor.processor() {
            Some(processor) => processor.begin(ns)?,
            None => None,
        };

        let debug = ns.is_truthy(&self.settings.debug_key);
        let kwargs = bind(&target.signature(), ns)?;

        let outcome = match &target.kind {
            TargetKind::Function { call, .. } => Outcome::from(guard(call(kwargs), debug)?),
            TargetKind::Class { construct, .. } => match guard(construct(kwargs), debug)? {
                Ok(mut command) => {
                    let run_kwargs = bind(&command.run_signature(), ns)?;
                    Outcome::from(guard(command.run(run_kwargs), debug)?)
                }
                Err(err) => Outcome::Failure(err),
            },
        };

        if let Outcome::Failure(err) = &outcome {
            debug!(name = target.name(), error = %err, "target failed");
        }

        Ok(match after {
            Some(after) => after.finish(ns, outcome),
            None => outcome,
        })
    }

    /// Dispatches an already parsed namespace.
    ///
    /// Returns the target's value, or the failure's message as a string.
    pub fn console_with(&self, id: AdaptorId, mut ns: Namespace) -> Result<Value, DispatchError> {
        let handler = self.select(id, &ns);
        match self.safe_call(handler, &mut ns)? {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Ok(Value::String(err.to_string())),
        }
    }

    /// Assembles a clap parser for `id`, parses `argv` and dispatches.
    ///
    /// `argv` excludes the program name.
    pub fn console<I, T>(&mut self, id: AdaptorId, argv: I) -> Result<Value, ConsoleError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.console_using::<ClapParser, _, _>(id, argv)
    }

    /// [`console`](Registry::console) with the process arguments.
    pub fn console_env(&mut self, id: AdaptorId) -> Result<Value, ConsoleError> {
        self.console(id, std::env::args_os().skip(1))
    }

    /// [`console`](Registry::console) with a parser builder of choice.
    pub fn console_using<P, I, T>(&mut self, id: AdaptorId, argv: I) -> Result<Value, ConsoleError>
    where
        P: RootParser,
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut parser = P::new(self.adaptor(id).display());
        self.setup_args(id, &mut parser)?;
        let ns = parser.parse(argv)?;
        Ok(self.console_with(id, ns)?)
    }
}
