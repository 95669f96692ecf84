//! Argument and group declarations for one callable.
//!
//! Declarations arrive through decorators, which apply bottom-up: the one
//! written last in source runs first. [`ArgumentSpecs`] therefore records
//! every new declaration at the front of its list, so the final order equals
//! the order the decorators were written in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SetupError;

/// What the parser does with an argument's occurrences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgAction {
    /// Store the (last) value given
    #[default]
    Store,
    /// Flag: `true` when present
    StoreTrue,
    /// Flag: `false` when present
    StoreFalse,
    /// Number of occurrences
    Count,
    /// Collect every occurrence into a list
    Append,
}

/// How many values an argument consumes per occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nargs {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    Exactly(usize),
}

/// Type a value is parsed into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    String,
    Int,
    Float,
}

/// One argument declaration: the name or flag tokens plus keyword options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
    /// Option strings (`-v`, `--verbose`) or a single positional name.
    pub flags: Vec<String>,
    pub dest: Option<String>,
    pub help: Option<String>,
    pub action: ArgAction,
    pub nargs: Option<Nargs>,
    pub default: Option<Value>,
    pub required: Option<bool>,
    pub choices: Vec<String>,
    pub metavar: Option<String>,
    pub value_type: ValueType,
}

impl ArgSpec {
    /// Creates a declaration from its option strings or positional name.
    ///
    /// ```rust
    /// use cliadapt::{ArgAction, ArgSpec};
    ///
    /// let verbose = ArgSpec::new(["-v", "--verbose"]).action(ArgAction::Count);
    /// assert_eq!(verbose.dest_name(), "verbose");
    ///
    /// let name = ArgSpec::new(["name"]);
    /// assert!(name.is_positional());
    /// ```
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn action(mut self, action: ArgAction) -> Self {
        self.action = action;
        self
    }

    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// True when the declaration names a positional rather than option strings.
    pub fn is_positional(&self) -> bool {
        self.flags
            .first()
            .map(|f| !f.starts_with('-'))
            .unwrap_or(false)
    }

    /// The namespace key the parsed value lands under.
    ///
    /// An explicit `dest` wins. Positionals use their name. Options use the
    /// first long flag, else the first short flag, with leading dashes
    /// stripped and inner dashes turned into underscores.
    pub fn dest_name(&self) -> String {
        if let Some(dest) = &self.dest {
            return dest.clone();
        }
        if self.is_positional() {
            return self.flags[0].clone();
        }
        let flag = self
            .flags
            .iter()
            .find(|f| f.starts_with("--"))
            .or_else(|| self.flags.first())
            .map(String::as_str)
            .unwrap_or_default();
        flag.trim_start_matches('-').replace('-', "_")
    }

    /// Whether the parser must see this argument.
    pub fn is_required(&self) -> bool {
        if let Some(required) = self.required {
            return required;
        }
        self.is_positional()
            && !matches!(self.nargs, Some(Nargs::Optional) | Some(Nargs::ZeroOrMore))
    }

    /// Whether the parsed value is a list.
    pub fn takes_many(&self) -> bool {
        match self.action {
            ArgAction::Append => true,
            ArgAction::StoreTrue | ArgAction::StoreFalse | ArgAction::Count => false,
            ArgAction::Store => matches!(
                self.nargs,
                Some(Nargs::ZeroOrMore) | Some(Nargs::OneOrMore)
            ) || matches!(self.nargs, Some(Nargs::Exactly(n)) if n > 1),
        }
    }
}

/// Keyword options of an argument group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Only meaningful for mutually exclusive groups.
    pub required: bool,
}

impl GroupSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// The kind of an argument group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Plain,
    MutuallyExclusive,
}

/// Keyword options for the sub-parser collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubparsersSpec {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Namespace key that receives the selected subcommand's name.
    pub dest: Option<String>,
    pub required: bool,
    pub metavar: Option<String>,
    pub help: Option<String>,
}

impl SubparsersSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// One entry of the top-level declaration list.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Argument(ArgSpec),
    /// Marker standing in for the named group at this position.
    Group { name: String, spec: GroupSpec },
}

/// A named group and its members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupDecl {
    /// `None` while members reference a group not yet declared.
    pub kind: Option<GroupKind>,
    pub arguments: Vec<ArgSpec>,
}

/// Ordered argument and group declarations for one callable.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSpecs {
    entries: Vec<Entry>,
    groups: HashMap<String, GroupDecl>,
}

impl ArgumentSpecs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an argument at the front of its owning list.
    ///
    /// With a group name the argument joins that group's members; the group
    /// need not be declared yet.
    pub fn add_argument(&mut self, spec: ArgSpec, group: Option<&str>) {
        match group {
            Some(name) => self
                .groups
                .entry(name.to_string())
                .or_default()
                .arguments
                .insert(0, spec),
            None => self.entries.insert(0, Entry::Argument(spec)),
        }
    }

    /// Declares a group and records its marker at the front of the list.
    pub fn add_group(
        &mut self,
        name: &str,
        kind: GroupKind,
        spec: GroupSpec,
    ) -> Result<(), SetupError> {
        let group = self.groups.entry(name.to_string()).or_default();
        if group.kind.is_some() {
            return Err(SetupError::GroupConflict(name.to_string()));
        }
        group.kind = Some(kind);

        self.entries.insert(
            0,
            Entry::Group {
                name: name.to_string(),
                spec,
            },
        );
        Ok(())
    }

    /// Top-level entries in source order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn group(&self, name: &str) -> Option<&GroupDecl> {
        self.groups.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.groups.is_empty()
    }
}
