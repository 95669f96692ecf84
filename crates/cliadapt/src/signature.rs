//! Declared parameter lists and keyword-argument binding.
//!
//! Every registered callable carries a [`Signature`] describing the keyword
//! parameters it accepts. [`bind`] walks that list against a parsed
//! [`Namespace`] and produces the exact [`Kwargs`] to call it with.
//!
//! # Binding rules
//!
//! | Parameter | In namespace | Result |
//! |-----------|--------------|--------|
//! | required  | yes          | included |
//! | required  | no           | [`BindingError`] |
//! | optional  | yes          | included |
//! | optional  | no           | omitted (callable's default applies) |
//!
//! A signature with a catch-all additionally receives every namespace entry
//! not already consumed.

use serde_json::{Map, Value};

use crate::error::BindingError;
use crate::namespace::Namespace;

/// Keyword arguments passed to a target.
pub type Kwargs = Map<String, Value>;

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub required: bool,
}

/// The parameter list of a callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
    catch_all: bool,
    receiver: bool,
}

impl Signature {
    /// A signature with no parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signature whose first parameter is an implicit receiver.
    ///
    /// The receiver is bound like any optional parameter but is never
    /// required, matching bound methods and constructors.
    pub fn method(receiver: impl Into<String>) -> Self {
        Self {
            params: vec![Param {
                name: receiver.into(),
                required: false,
            }],
            catch_all: false,
            receiver: true,
        }
    }

    /// Appends a parameter without a default.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            required: true,
        });
        self
    }

    /// Appends a parameter with a default.
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            required: false,
        });
        self
    }

    /// Accepts any extra keyword arguments.
    pub fn catch_all(mut self) -> Self {
        self.catch_all = true;
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn accepts_catch_all(&self) -> bool {
        self.catch_all
    }

    pub fn has_receiver(&self) -> bool {
        self.receiver
    }

    /// Names of the parameters that must be present in the namespace.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }
}

/// Constructor signatures of a class-style target.
///
/// Resolution prefers the constructor-selection hook (`new`), falls back to
/// the initializer (`init`), and otherwise treats the class as having a
/// zero-argument constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructorSignature {
    pub new: Option<Signature>,
    pub init: Option<Signature>,
}

impl ConstructorSignature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a constructor-selection hook.
    pub fn with_new(mut self, signature: Signature) -> Self {
        self.new = Some(signature);
        self
    }

    /// Declares an initializer.
    pub fn with_init(mut self, signature: Signature) -> Self {
        self.init = Some(signature);
        self
    }

    /// The signature used to bind constructor arguments.
    pub fn resolve(&self) -> Signature {
        self.new
            .as_ref()
            .or(self.init.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

/// Derives the keyword arguments for `signature` from `ns`.
pub fn bind(signature: &Signature, ns: &Namespace) -> Result<Kwargs, BindingError> {
    let mut kwargs = Kwargs::new();

    for (index, param) in signature.params.iter().enumerate() {
        let is_receiver = signature.receiver && index == 0;
        match ns.get(&param.name) {
            Some(value) => {
                kwargs.insert(param.name.clone(), value.clone());
            }
            None if param.required && !is_receiver => {
                return Err(BindingError::new(&param.name));
            }
            None => {}
        }
    }

    if signature.catch_all {
        for (key, value) in ns.iter() {
            if !kwargs.contains_key(key) {
                kwargs.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(kwargs)
}
