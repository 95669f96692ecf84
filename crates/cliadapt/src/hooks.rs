//! Two-phase hooks around argument setup and invocation.
//!
//! Hooks let a command run code on either side of a bracketed region without
//! touching the command itself. There are two hook points:
//!
//! ```text
//! parser assembly
//!   → ARGS HOOK before phase ← (prepend global flags)
//!   → declared arguments, groups, subcommands
//!   → ARGS HOOK after phase  ← (final adjustments)
//!
//! parsed namespace
//!   → PROCESSOR before phase ← (set up state, mutate the namespace)
//!   → target call
//!   → PROCESSOR after phase  ← (observe or replace the outcome)
//! ```
//!
//! # Plain vs two-phase
//!
//! A plain hook is a single function. A plain args hook runs once every
//! declaration has been replayed; a plain processor runs just before the
//! target is called.
//!
//! A two-phase hook is a before step that may hand back a continuation. The
//! continuation is an `FnOnce`, so any state the before step sets up moves
//! into it and is dropped on every exit path. A before step that returns
//! `None` has no after phase.
//!
//! # Outcome replacement
//!
//! A processor continuation receives the [`Outcome`] of the call:
//!
//! | Continuation returns | New outcome |
//! |----------------------|-------------|
//! | `Ok(Resume::Keep)` | unchanged |
//! | `Ok(Resume::Replace(v))` | `Success(v)`, clearing any failure |
//! | `Err(e)` | `Failure(e)` |

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::builder::ParserBuilder;
use crate::namespace::Namespace;

/// The result of a guarded call: exactly one of a value or an error.
#[derive(Debug)]
pub enum Outcome {
    Success(Value),
    Failure(anyhow::Error),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Returns the value if this is a success.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Success(v) => Some(v),
            Outcome::Failure(_) => None,
        }
    }

    /// Returns the error if this is a failure.
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(e) => Some(e),
        }
    }

    pub fn into_result(self) -> anyhow::Result<Value> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure(e) => Err(e),
        }
    }
}

impl From<anyhow::Result<Value>> for Outcome {
    fn from(result: anyhow::Result<Value>) -> Self {
        match result {
            Ok(v) => Outcome::Success(v),
            Err(e) => Outcome::Failure(e),
        }
    }
}

/// What a processor continuation does with the outcome it observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Resume {
    /// Leave the outcome as it is.
    Keep,
    /// Replace the outcome with a successful value.
    Replace(Value),
}

/// The phase at which a hook error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// Args hook before phase, or a plain args hook
    ArgsBefore,
    /// Args hook continuation
    ArgsAfter,
    /// Processor before phase, or a plain processor
    Processor,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::ArgsBefore => write!(f, "args-before"),
            HookPhase::ArgsAfter => write!(f, "args-after"),
            HookPhase::Processor => write!(f, "processor"),
        }
    }
}

/// Error returned by a hook outside of the guarded region.
#[derive(Debug, Error)]
#[error("hook error ({phase}): {message}")]
pub struct HookError {
    /// Human-readable error message
    pub message: String,
    /// The hook phase where the error occurred
    pub phase: HookPhase,
    /// The underlying error source, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HookError {
    pub fn new(phase: HookPhase, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase,
            source: None,
        }
    }

    /// Wraps an error returned by hook code.
    pub fn from_anyhow(phase: HookPhase, err: anyhow::Error) -> Self {
        Self::new(phase, err.to_string()).with_source(err)
    }

    /// Sets the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }
}

/// Continuation of a two-phase processor.
pub type AfterProcessFn = Box<dyn FnOnce(&Namespace, &Outcome) -> anyhow::Result<Resume>>;

/// Before step of a processor.
pub type ProcessorFn = Rc<dyn Fn(&mut Namespace) -> anyhow::Result<Option<AfterProcessFn>>>;

/// A hook run around the guarded call of a target.
#[derive(Clone)]
pub struct Processor {
    before: ProcessorFn,
}

impl Processor {
    /// A processor that runs once, just before the target.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cliadapt::Processor;
    ///
    /// let processor = Processor::plain(|ns| {
    ///     ns.insert("verbose", true);
    ///     Ok(())
    /// });
    /// ```
    pub fn plain<F>(f: F) -> Self
    where
        F: Fn(&mut Namespace) -> anyhow::Result<()> + 'static,
    {
        Self {
            before: Rc::new(
                move |ns: &mut Namespace| -> anyhow::Result<Option<AfterProcessFn>> {
                    f(ns)?;
                    Ok(None)
                },
            ),
        }
    }

    /// A processor with a before step and an optional continuation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cliadapt::{Namespace, Outcome, Processor, Resume};
    /// use serde_json::json;
    ///
    /// // Doubles whatever the target returns.
    /// let processor = Processor::two_phase(|_ns| {
    ///     Ok(Some(|_ns: &Namespace, outcome: &Outcome| {
    ///         let value = outcome.value().and_then(|v| v.as_i64()).unwrap_or(0);
    ///         Ok(Resume::Replace(json!(value * 2)))
    ///     }))
    /// });
    /// ```
    pub fn two_phase<F, A>(f: F) -> Self
    where
        F: Fn(&mut Namespace) -> anyhow::Result<Option<A>> + 'static,
        A: FnOnce(&Namespace, &Outcome) -> anyhow::Result<Resume> + 'static,
    {
        Self {
            before: Rc::new(
                move |ns: &mut Namespace| -> anyhow::Result<Option<AfterProcessFn>> {
                    Ok(f(ns)?.map(|after| Box::new(after) as AfterProcessFn))
                },
            ),
        }
    }

    /// Runs the before step, returning the pending after phase, if any.
    pub(crate) fn begin(&self, ns: &mut Namespace) -> Result<Option<AfterProcess>, HookError> {
        (self.before)(ns)
            .map(|after| after.map(AfterProcess))
            .map_err(|e| HookError::from_anyhow(HookPhase::Processor, e))
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor").finish_non_exhaustive()
    }
}

/// A processor's pending after phase.
pub(crate) struct AfterProcess(AfterProcessFn);

impl AfterProcess {
    /// Resumes the processor with the call's outcome.
    pub(crate) fn finish(self, ns: &Namespace, outcome: Outcome) -> Outcome {
        match (self.0)(ns, &outcome) {
            Ok(Resume::Keep) => outcome,
            Ok(Resume::Replace(value)) => Outcome::Success(value),
            Err(e) => Outcome::Failure(e),
        }
    }
}

/// Continuation of a two-phase args hook.
pub type ArgsAfterFn = Box<dyn FnOnce(&mut dyn ParserBuilder) -> anyhow::Result<()>>;

/// A plain args hook.
pub type ArgsFn = Rc<dyn Fn(&mut dyn ParserBuilder) -> anyhow::Result<()>>;

/// Before step of a two-phase args hook.
pub type ArgsBeforeFn = Rc<dyn Fn(&mut dyn ParserBuilder) -> anyhow::Result<Option<ArgsAfterFn>>>;

#[derive(Clone)]
enum ArgsHookKind {
    Plain(ArgsFn),
    TwoPhase(ArgsBeforeFn),
}

/// A hook run around the replay of declarations onto a parser builder.
#[derive(Clone)]
pub struct ArgsHook {
    kind: ArgsHookKind,
}

impl ArgsHook {
    /// A hook that runs after every declaration and subcommand is in place.
    pub fn plain<F>(f: F) -> Self
    where
        F: Fn(&mut dyn ParserBuilder) -> anyhow::Result<()> + 'static,
    {
        Self {
            kind: ArgsHookKind::Plain(Rc::new(f)),
        }
    }

    /// A hook whose before step runs ahead of all declarations.
    ///
    /// The continuation, if returned, runs after subcommand wiring.
    pub fn two_phase<F, A>(f: F) -> Self
    where
        F: Fn(&mut dyn ParserBuilder) -> anyhow::Result<Option<A>> + 'static,
        A: FnOnce(&mut dyn ParserBuilder) -> anyhow::Result<()> + 'static,
    {
        Self {
            kind: ArgsHookKind::TwoPhase(Rc::new(
                move |parser: &mut dyn ParserBuilder| -> anyhow::Result<Option<ArgsAfterFn>> {
                    Ok(f(parser)?.map(|after| Box::new(after) as ArgsAfterFn))
                },
            )),
        }
    }

    pub fn is_two_phase(&self) -> bool {
        matches!(self.kind, ArgsHookKind::TwoPhase(_))
    }

    /// Runs whatever belongs before the declarations.
    pub(crate) fn begin(&self, parser: &mut dyn ParserBuilder) -> Result<ArgsFinish, HookError> {
        match &self.kind {
            ArgsHookKind::Plain(f) => Ok(ArgsFinish::Plain(f.clone())),
            ArgsHookKind::TwoPhase(before) => match before(parser) {
                Ok(Some(after)) => Ok(ArgsFinish::Continue(after)),
                Ok(None) => Ok(ArgsFinish::Done),
                Err(e) => Err(HookError::from_anyhow(HookPhase::ArgsBefore, e)),
            },
        }
    }
}

impl fmt::Debug for ArgsHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgsHook")
            .field("two_phase", &self.is_two_phase())
            .finish()
    }
}

/// What is left of an args hook once the before step has run.
pub(crate) enum ArgsFinish {
    Done,
    Plain(ArgsFn),
    Continue(ArgsAfterFn),
}

impl ArgsFinish {
    pub(crate) fn finish(self, parser: &mut dyn ParserBuilder) -> Result<(), HookError> {
        match self {
            ArgsFinish::Done => Ok(()),
            ArgsFinish::Plain(f) => {
                f(parser).map_err(|e| HookError::from_anyhow(HookPhase::ArgsBefore, e))
            }
            ArgsFinish::Continue(after) => {
                after(parser).map_err(|e| HookError::from_anyhow(HookPhase::ArgsAfter, e))
            }
        }
    }
}
