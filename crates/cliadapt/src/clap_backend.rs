//! The bundled parser builder, backed by clap.
//!
//! [`ClapParser`] records declarations as clap [`Arg`]s and [`ArgGroup`]s and
//! only builds the [`Command`] tree when it is asked to parse. Parsed
//! [`ArgMatches`] are walked level by level into a flat [`Namespace`]:
//!
//! - every declared destination gets an entry, `null` when absent and
//!   without a default
//! - flags become booleans, counters become numbers, multi-valued arguments
//!   become arrays
//! - defaults attached with `set_defaults` are merged in for every parser on
//!   the chosen subcommand path
//!
//! Declaration defaults are applied when the namespace is built rather than
//! handed to clap, so they keep their JSON type.

use std::ffi::OsString;
use std::path::Path;

use clap::builder::{PossibleValuesParser, TypedValueParser, ValueParser};
use clap::{value_parser, Arg, ArgAction as ClapAction, ArgGroup, ArgMatches, Command};
use serde_json::{Map, Value};

use crate::args::{ArgAction, ArgSpec, GroupSpec, Nargs, SubparsersSpec, ValueType};
use crate::builder::{ArgumentSink, ParserBuilder, RootParser, SubparserSink};
use crate::display::{DisplayMeta, Formatter};
use crate::error::AssembleError;
use crate::namespace::Namespace;

const GROUP_ID_PREFIX: &str = "group:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Flag,
    Count,
    One,
    Many,
}

impl Shape {
    fn of(spec: &ArgSpec) -> Self {
        match spec.action {
            ArgAction::StoreTrue | ArgAction::StoreFalse => Shape::Flag,
            ArgAction::Count => Shape::Count,
            _ if spec.takes_many() => Shape::Many,
            _ => Shape::One,
        }
    }
}

/// How to read one destination back out of the matches.
#[derive(Debug, Clone)]
struct Field {
    dest: String,
    shape: Shape,
    value_type: ValueType,
    default: Option<Value>,
}

impl Field {
    fn extract(&self, matches: &ArgMatches) -> Value {
        let id = self.dest.as_str();
        let value = match self.shape {
            Shape::Flag => matches
                .try_get_one::<bool>(id)
                .ok()
                .flatten()
                .map(|b| Value::Bool(*b)),
            Shape::Count => matches
                .try_get_one::<u8>(id)
                .ok()
                .flatten()
                .filter(|n| **n > 0)
                .map(|n| Value::from(*n)),
            Shape::One => self.one(matches),
            Shape::Many => self.many(matches),
        };

        value
            .or_else(|| self.default.clone())
            .unwrap_or(match self.shape {
                Shape::Count => Value::from(0),
                _ => Value::Null,
            })
    }

    fn one(&self, matches: &ArgMatches) -> Option<Value> {
        let id = self.dest.as_str();
        match self.value_type {
            ValueType::String => matches
                .try_get_one::<String>(id)
                .ok()
                .flatten()
                .map(|s| Value::from(s.as_str())),
            ValueType::Int => matches
                .try_get_one::<i64>(id)
                .ok()
                .flatten()
                .map(|n| Value::from(*n)),
            ValueType::Float => matches
                .try_get_one::<f64>(id)
                .ok()
                .flatten()
                .map(|n| Value::from(*n)),
        }
    }

    fn many(&self, matches: &ArgMatches) -> Option<Value> {
        let id = self.dest.as_str();
        let values: Vec<Value> = match self.value_type {
            ValueType::String => matches
                .try_get_many::<String>(id)
                .ok()
                .flatten()?
                .map(|s| Value::from(s.as_str()))
                .collect(),
            ValueType::Int => matches
                .try_get_many::<i64>(id)
                .ok()
                .flatten()?
                .map(|n| Value::from(*n))
                .collect(),
            ValueType::Float => matches
                .try_get_many::<f64>(id)
                .ok()
                .flatten()?
                .map(|n| Value::from(*n))
                .collect(),
        };
        Some(Value::Array(values))
    }
}

fn parser_for(spec: &ArgSpec) -> ValueParser {
    if spec.choices.is_empty() {
        return match spec.value_type {
            ValueType::String => ValueParser::string(),
            ValueType::Int => value_parser!(i64).into(),
            ValueType::Float => ValueParser::new(|s: &str| s.parse::<f64>()),
        };
    }

    let choices = PossibleValuesParser::new(spec.choices.clone());
    match spec.value_type {
        ValueType::String => choices.into(),
        ValueType::Int => choices.try_map(|s: String| s.parse::<i64>()).into(),
        ValueType::Float => choices.try_map(|s: String| s.parse::<f64>()).into(),
    }
}

fn with_option_strings(mut arg: Arg, flags: &[String]) -> Result<Arg, AssembleError> {
    let (mut has_long, mut has_short) = (false, false);
    for flag in flags {
        if let Some(long) = flag.strip_prefix("--").filter(|l| !l.is_empty()) {
            arg = if has_long {
                arg.visible_alias(long.to_string())
            } else {
                arg.long(long.to_string())
            };
            has_long = true;
            continue;
        }

        let mut chars = flag.strip_prefix('-').unwrap_or_default().chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) => {
                arg = if has_short {
                    arg.visible_short_alias(short)
                } else {
                    arg.short(short)
                };
                has_short = true;
            }
            _ => {
                return Err(AssembleError::Builder(format!(
                    "unsupported option string {:?}",
                    flag
                )))
            }
        }
    }
    Ok(arg)
}

fn with_nargs(arg: Arg, spec: &ArgSpec) -> Arg {
    let positional = spec.is_positional();
    match spec.nargs {
        None => arg,
        Some(Nargs::Optional) if positional => arg,
        Some(Nargs::Optional) => arg.num_args(0..=1),
        Some(Nargs::ZeroOrMore) if positional => arg.num_args(1..),
        Some(Nargs::ZeroOrMore) => arg.num_args(0..),
        Some(Nargs::OneOrMore) => arg.num_args(1..),
        Some(Nargs::Exactly(n)) => arg.num_args(n),
    }
}

/// Clap shares one id space between groups and arguments, so group ids
/// carry a prefix that destinations are not allowed to use.
fn group_id(name: &str) -> String {
    format!("{}{}", GROUP_ID_PREFIX, name)
}

fn default_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A parser builder producing a clap command tree.
#[derive(Debug, Clone, Default)]
pub struct ClapParser {
    display: DisplayMeta,
    args: Vec<Arg>,
    groups: Vec<ArgGroup>,
    fields: Vec<Field>,
    defaults: Map<String, Value>,
    subparsers: Option<ClapSubparsers>,
}

/// Sub-parser collection of a [`ClapParser`].
#[derive(Debug, Clone, Default)]
pub struct ClapSubparsers {
    spec: SubparsersSpec,
    children: Vec<(String, ClapParser)>,
}

impl ClapParser {
    pub fn new(display: &DisplayMeta) -> Self {
        Self {
            display: display.clone(),
            ..Self::default()
        }
    }

    /// The clap command this parser would run, for rendering help.
    pub fn command(&self) -> Command {
        self.build(self.program_name())
    }

    /// Destinations declared directly on this parser, in order.
    pub fn dests(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.dest.as_str())
    }

    fn program_name(&self) -> String {
        self.display
            .prog
            .clone()
            .or_else(|| {
                std::env::args_os().next().and_then(|arg0| {
                    Path::new(&arg0)
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                })
            })
            .unwrap_or_else(|| "cli".to_string())
    }

    fn help_text(&self, spec: &ArgSpec) -> Option<String> {
        let default = spec
            .default
            .as_ref()
            .filter(|_| self.display.formatter == Formatter::ArgumentDefaults)
            .map(|value| format!("(default: {})", default_text(value)));

        match (spec.help.clone(), default) {
            (Some(help), Some(default)) => Some(format!("{} {}", help, default)),
            (help, default) => help.or(default),
        }
    }

    fn build_arg(&self, spec: &ArgSpec) -> Result<(Arg, Field), AssembleError> {
        let dest = spec.dest_name();
        if dest.is_empty() {
            return Err(AssembleError::Builder(
                "argument declared without a name".to_string(),
            ));
        }

        let positional = spec.is_positional();
        let mut arg = Arg::new(dest.clone());
        if positional {
            if spec.flags.len() != 1 {
                return Err(AssembleError::Builder(format!(
                    "positional argument {} takes exactly one name",
                    dest
                )));
            }
        } else {
            arg = with_option_strings(arg, &spec.flags)?;
        }

        let shape = Shape::of(spec);
        arg = match shape {
            Shape::Flag if spec.action == ArgAction::StoreFalse => arg.action(ClapAction::SetFalse),
            Shape::Flag => arg.action(ClapAction::SetTrue),
            Shape::Count => arg.action(ClapAction::Count),
            Shape::One | Shape::Many => {
                let action = match spec.action {
                    ArgAction::Append => ClapAction::Append,
                    _ => ClapAction::Set,
                };
                let arg = arg
                    .action(action)
                    .value_parser(parser_for(spec))
                    .required(spec.is_required());
                let arg = with_nargs(arg, spec);
                match &spec.metavar {
                    Some(metavar) => arg.value_name(metavar.clone()),
                    None if !positional => arg.value_name(dest.to_uppercase()),
                    None => arg,
                }
            }
        };

        if let Some(help) = self.help_text(spec) {
            arg = arg.help(help);
        }

        // An absent `*` positional is an empty list
        let default = spec.default.clone().or_else(|| {
            (positional && spec.nargs == Some(Nargs::ZeroOrMore)).then_some(Value::Array(Vec::new()))
        });
        let field = Field {
            dest,
            shape,
            value_type: spec.value_type,
            default,
        };
        Ok((arg, field))
    }

    fn push(&mut self, arg: Arg, field: Field) -> Result<(), AssembleError> {
        if field.dest.starts_with(GROUP_ID_PREFIX) {
            return Err(AssembleError::Builder(format!(
                "argument {} uses the reserved prefix {}",
                field.dest, GROUP_ID_PREFIX
            )));
        }
        if self.fields.iter().any(|f| f.dest == field.dest) {
            return Err(AssembleError::Builder(format!(
                "argument {} declared twice",
                field.dest
            )));
        }
        self.args.push(arg);
        self.fields.push(field);
        Ok(())
    }

    fn build(&self, name: String) -> Command {
        let mut command = Command::new(name);
        if let Some(usage) = &self.display.usage {
            command = command.override_usage(usage.clone());
        }
        if let Some(description) = &self.display.description {
            command = command.about(description.clone());
        }
        if let Some(epilog) = &self.display.epilog {
            command = command.after_help(epilog.clone());
        }

        command = command
            .groups(self.groups.iter().cloned())
            .args(self.args.iter().cloned());

        if let Some(subs) = &self.subparsers {
            command = command
                .subcommand_required(subs.spec.required)
                .disable_help_subcommand(true);
            if let Some(title) = &subs.spec.title {
                command = command.subcommand_help_heading(title.clone());
            }
            if let Some(metavar) = &subs.spec.metavar {
                command = command.subcommand_value_name(metavar.clone());
            }
            command = command.subcommands(
                subs.children
                    .iter()
                    .map(|(name, child)| child.build(name.clone())),
            );
        }
        command
    }

    fn collect(&self, matches: &ArgMatches, ns: &mut Namespace) {
        ns.merge(self.defaults.clone());
        for field in &self.fields {
            ns.insert(field.dest.clone(), field.extract(matches));
        }

        let Some(subs) = &self.subparsers else {
            return;
        };
        match matches.subcommand() {
            Some((name, sub_matches)) => {
                if let Some(dest) = &subs.spec.dest {
                    ns.insert(dest.clone(), name);
                }
                if let Some((_, child)) = subs.children.iter().find(|(n, _)| n == name) {
                    child.collect(sub_matches, ns);
                }
            }
            None => {
                if let Some(dest) = &subs.spec.dest {
                    ns.insert(dest.clone(), Value::Null);
                }
            }
        }
    }
}

/// Adds members to a group of a [`ClapParser`].
struct ClapGroup<'a> {
    parser: &'a mut ClapParser,
    heading: Option<String>,
    exclusive: Option<String>,
}

impl ArgumentSink for ClapGroup<'_> {
    fn add_argument(&mut self, spec: &ArgSpec) -> Result<(), AssembleError> {
        let (mut arg, field) = self.parser.build_arg(spec)?;
        if let Some(heading) = &self.heading {
            arg = arg.help_heading(heading.clone());
        }
        if let Some(group) = &self.exclusive {
            arg = arg.group(group.clone());
        }
        self.parser.push(arg, field)
    }
}

impl ArgumentSink for ClapParser {
    fn add_argument(&mut self, spec: &ArgSpec) -> Result<(), AssembleError> {
        let (arg, field) = self.build_arg(spec)?;
        self.push(arg, field)
    }
}

impl ParserBuilder for ClapParser {
    fn add_argument_group(
        &mut self,
        name: &str,
        spec: &GroupSpec,
    ) -> Result<Box<dyn ArgumentSink + '_>, AssembleError> {
        let heading = spec.title.clone().unwrap_or_else(|| name.to_string());
        Ok(Box::new(ClapGroup {
            parser: self,
            heading: Some(heading),
            exclusive: None,
        }))
    }

    fn add_mutually_exclusive_group(
        &mut self,
        name: &str,
        spec: &GroupSpec,
    ) -> Result<Box<dyn ArgumentSink + '_>, AssembleError> {
        let id = group_id(name);
        self.groups.push(
            ArgGroup::new(id.clone())
                .multiple(false)
                .required(spec.required),
        );
        Ok(Box::new(ClapGroup {
            parser: self,
            heading: spec.title.clone(),
            exclusive: Some(id),
        }))
    }

    fn add_subparsers(
        &mut self,
        spec: &SubparsersSpec,
    ) -> Result<&mut dyn SubparserSink, AssembleError> {
        if self.subparsers.is_some() {
            return Err(AssembleError::Builder(
                "cannot have multiple subparser collections".to_string(),
            ));
        }
        let subs = self.subparsers.insert(ClapSubparsers {
            spec: spec.clone(),
            children: Vec::new(),
        });
        Ok(subs)
    }

    fn set_defaults(&mut self, defaults: Map<String, Value>) {
        self.defaults.extend(defaults);
    }
}

impl SubparserSink for ClapSubparsers {
    fn add_parser(
        &mut self,
        name: &str,
        display: &DisplayMeta,
    ) -> Result<&mut dyn ParserBuilder, AssembleError> {
        if self.children.iter().any(|(n, _)| n == name) {
            return Err(AssembleError::Builder(format!(
                "subcommand {} added twice",
                name
            )));
        }
        let index = self.children.len();
        self.children
            .push((name.to_string(), ClapParser::new(display)));
        Ok(&mut self.children[index].1)
    }
}

impl RootParser for ClapParser {
    fn new(display: &DisplayMeta) -> Self {
        ClapParser::new(display)
    }

    fn parse<I, T>(&self, argv: I) -> Result<Namespace, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let name = self.program_name();
        let args: Vec<OsString> = std::iter::once(OsString::from(name.clone()))
            .chain(argv.into_iter().map(Into::into))
            .collect();

        let matches = self.build(name).try_get_matches_from(args)?;
        let mut ns = Namespace::new();
        self.collect(&matches, &mut ns);
        Ok(ns)
    }
}
