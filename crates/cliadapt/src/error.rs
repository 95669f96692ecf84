//! Error types.
//!
//! Declaration and binding mistakes are programmer errors and surface
//! immediately. Failures raised by the target itself are not errors at this
//! level: they are captured into an [`Outcome`](crate::Outcome) unless debug
//! mode asks for them to propagate as [`DispatchError::Invocation`].

use thiserror::Error;

use crate::extension::LoadError;
use crate::hooks::HookError;

/// Error raised while declaring arguments on an adaptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// A group name was given a kind twice.
    #[error("group {0}: conflicting groups")]
    GroupConflict(String),
}

/// A required parameter had no value in the parsed namespace.
///
/// This means the declared arguments do not provide what the target's
/// signature needs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("missing value for required parameter `{parameter}`")]
pub struct BindingError {
    pub parameter: String,
}

impl BindingError {
    pub fn new(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
        }
    }
}

/// Error raised while replaying declarations onto a parser builder.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Hook(#[from] HookError),

    /// An extension failed to load and the failure was not skippable.
    #[error("extension {name} in group {group}: {source}")]
    Extension {
        group: String,
        name: String,
        #[source]
        source: LoadError,
    },

    /// The parser builder rejected a declaration.
    #[error("parser builder: {0}")]
    Builder(String),
}

/// Error raised while dispatching a parsed invocation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Hook(#[from] HookError),

    /// The target failed while debug mode was on.
    #[error(transparent)]
    Invocation(anyhow::Error),
}

/// Error returned by the console entry points.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// `argv` did not match the assembled parser. Callers usually `exit()`.
    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SetupError::GroupConflict("output".into());
        assert_eq!(err.to_string(), "group output: conflicting groups");

        let err = BindingError::new("name");
        assert_eq!(
            err.to_string(),
            "missing value for required parameter `name`"
        );
    }

    #[test]
    fn test_invocation_is_transparent() {
        let err = DispatchError::Invocation(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "boom");
    }
}
