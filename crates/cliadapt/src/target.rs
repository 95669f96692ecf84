//! Callable targets.
//!
//! A [`Target`] is what an adaptor ultimately calls. It is either a plain
//! function, or a class-style command: a constructor that builds a value
//! implementing [`Command`], whose `run` method is the real entry point.
//!
//! Targets declare their parameters up front with a
//! [`Signature`](crate::Signature); the binder never inspects the callable
//! itself.
//!
//! # Return values
//!
//! Function targets may return any `Result<T, E>` where `T: Serialize` and
//! `E: Into<anyhow::Error>`. The value is converted to JSON for hooks and for
//! the console entry point.

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::signature::{ConstructorSignature, Kwargs, Signature};

/// Trait for values a target may return.
pub trait IntoCallResult {
    fn into_call_result(self) -> anyhow::Result<Value>;
}

impl<T, E> IntoCallResult for Result<T, E>
where
    T: Serialize,
    E: Into<anyhow::Error>,
{
    fn into_call_result(self) -> anyhow::Result<Value> {
        let value = self.map_err(Into::into)?;
        Ok(serde_json::to_value(value)?)
    }
}

/// A class-style command: constructed first, then run.
///
/// # Example
///
/// ```rust
/// use cliadapt::{kwarg, Command, Kwargs, Signature};
/// use serde_json::{json, Value};
///
/// struct Greet { name: String }
///
/// impl Command for Greet {
///     fn run_signature(&self) -> Signature {
///         Signature::method("self").optional("shout")
///     }
///
///     fn run(&mut self, kwargs: Kwargs) -> anyhow::Result<Value> {
///         let shout = kwargs.get("shout").and_then(Value::as_bool).unwrap_or(false);
///         let text = format!("hello {}", self.name);
///         Ok(json!(if shout { text.to_uppercase() } else { text }))
///     }
/// }
/// ```
pub trait Command {
    /// Parameters of [`run`](Command::run).
    fn run_signature(&self) -> Signature {
        Signature::method("self")
    }

    fn run(&mut self, kwargs: Kwargs) -> anyhow::Result<Value>;
}

/// Function target body.
pub type CallFn = Rc<dyn Fn(Kwargs) -> anyhow::Result<Value>>;

/// Class target constructor.
pub type ConstructFn = Rc<dyn Fn(Kwargs) -> anyhow::Result<Box<dyn Command>>>;

#[derive(Clone)]
pub(crate) enum TargetKind {
    Function {
        signature: Signature,
        call: CallFn,
    },
    Class {
        constructor: ConstructorSignature,
        construct: ConstructFn,
    },
}

/// A registered callable.
#[derive(Clone)]
pub struct Target {
    name: String,
    doc: Option<String>,
    pub(crate) kind: TargetKind,
}

impl Target {
    /// A function target.
    ///
    /// ```rust
    /// use cliadapt::{kwarg, Signature, Target};
    ///
    /// let add = Target::function("add", Signature::new().required("a").required("b"), |kw| {
    ///     let a: i64 = kwarg(&kw, "a")?;
    ///     let b: i64 = kwarg(&kw, "b")?;
    ///     Ok::<_, anyhow::Error>(a + b)
    /// });
    /// assert!(!add.is_class());
    /// ```
    pub fn function<F, R>(name: impl Into<String>, signature: Signature, f: F) -> Self
    where
        F: Fn(Kwargs) -> R + 'static,
        R: IntoCallResult,
    {
        Self {
            name: name.into(),
            doc: None,
            kind: TargetKind::Function {
                signature,
                call: Rc::new(move |kwargs: Kwargs| f(kwargs).into_call_result()),
            },
        }
    }

    /// A class-style target built by `construct`.
    pub fn class<F, C>(name: impl Into<String>, constructor: ConstructorSignature, construct: F) -> Self
    where
        F: Fn(Kwargs) -> anyhow::Result<C> + 'static,
        C: Command + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            kind: TargetKind::Class {
                constructor,
                construct: Rc::new(
                    move |kwargs: Kwargs| -> anyhow::Result<Box<dyn Command>> {
                        Ok(Box::new(construct(kwargs)?))
                    },
                ),
            },
        }
    }

    /// Attaches the doc text the default description is taken from.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, TargetKind::Class { .. })
    }

    /// The signature keyword arguments are bound against.
    ///
    /// For classes this is the resolved constructor signature.
    pub fn signature(&self) -> Signature {
        match &self.kind {
            TargetKind::Function { signature, .. } => signature.clone(),
            TargetKind::Class { constructor, .. } => constructor.resolve(),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("is_class", &self.is_class())
            .finish_non_exhaustive()
    }
}

/// Reads keyword argument `name` as a `T`.
///
/// Returns an error if the argument is missing or has the wrong shape.
pub fn kwarg<T: DeserializeOwned>(kwargs: &Kwargs, name: &str) -> anyhow::Result<T> {
    let value = kwargs
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("argument missing: {}", name))?;
    serde_json::from_value(value.clone())
        .map_err(|e| anyhow::anyhow!("argument {} has the wrong type: {}", name, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo {
        prefix: String,
    }

    impl Command for Echo {
        fn run_signature(&self) -> Signature {
            Signature::method("self").required("text")
        }

        fn run(&mut self, kwargs: Kwargs) -> anyhow::Result<Value> {
            let text: String = kwarg(&kwargs, "text")?;
            Ok(json!(format!("{}{}", self.prefix, text)))
        }
    }

    #[test]
    fn test_function_target() {
        let target = Target::function("double", Signature::new().required("n"), |kw| {
            let n: i64 = kwarg(&kw, "n")?;
            Ok::<_, anyhow::Error>(n * 2)
        });

        assert_eq!(target.name(), "double");
        assert!(!target.is_class());
        assert_eq!(target.signature(), Signature::new().required("n"));

        let TargetKind::Function { call, .. } = &target.kind else {
            panic!("Expected a function target");
        };
        let mut kwargs = Kwargs::new();
        kwargs.insert("n".into(), json!(21));
        assert_eq!(call(kwargs).unwrap(), json!(42));
    }

    #[test]
    fn test_function_custom_error() {
        #[derive(Debug)]
        struct CustomError(String);

        impl fmt::Display for CustomError {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "CustomError: {}", self.0)
            }
        }

        impl std::error::Error for CustomError {}

        let target = Target::function("fail", Signature::new(), |_| {
            Err::<(), _>(CustomError("oops".into()))
        });
        let TargetKind::Function { call, .. } = &target.kind else {
            panic!("Expected a function target");
        };
        let err = call(Kwargs::new()).unwrap_err();
        assert_eq!(err.to_string(), "CustomError: oops");
    }

    #[test]
    fn test_class_target() {
        let ctor = ConstructorSignature::new().with_init(Signature::method("self").required("prefix"));
        let target = Target::class("echo", ctor, |kw| {
            Ok(Echo {
                prefix: kwarg(&kw, "prefix")?,
            })
        })
        .with_doc("Echo text.");

        assert!(target.is_class());
        assert_eq!(target.doc(), Some("Echo text."));
        assert_eq!(
            target.signature(),
            Signature::method("self").required("prefix")
        );

        let TargetKind::Class { construct, .. } = &target.kind else {
            panic!("Expected a class target");
        };
        let mut kwargs = Kwargs::new();
        kwargs.insert("prefix".into(), json!("> "));
        let mut command = construct(kwargs).unwrap();

        let mut run_kwargs = Kwargs::new();
        run_kwargs.insert("text".into(), json!("hi"));
        assert_eq!(command.run(run_kwargs).unwrap(), json!("> hi"));
    }

    #[test]
    fn test_kwarg_errors() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("n".into(), json!("not a number"));

        let missing = kwarg::<i64>(&kwargs, "m").unwrap_err();
        assert!(missing.to_string().contains("argument missing: m"));

        let wrong = kwarg::<i64>(&kwargs, "n").unwrap_err();
        assert!(wrong.to_string().contains("wrong type"));
    }
}
