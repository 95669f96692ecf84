//! The parser-builder capability the assembler drives.
//!
//! The engine never parses anything itself. It replays declarations through
//! these traits, and the builder decides what an argument, a group or a
//! sub-parser means. [`ClapParser`](crate::ClapParser) is the bundled
//! implementation.

use std::ffi::OsString;

use serde_json::{Map, Value};

use crate::args::{ArgSpec, GroupSpec, SubparsersSpec};
use crate::display::DisplayMeta;
use crate::error::AssembleError;
use crate::namespace::Namespace;

/// Anything arguments can be added to: a parser or one of its groups.
pub trait ArgumentSink {
    fn add_argument(&mut self, spec: &ArgSpec) -> Result<(), AssembleError>;
}

/// A parser under construction.
pub trait ParserBuilder: ArgumentSink {
    /// Opens a plain group; members added through the handle belong to it.
    fn add_argument_group(
        &mut self,
        name: &str,
        spec: &GroupSpec,
    ) -> Result<Box<dyn ArgumentSink + '_>, AssembleError>;

    /// Opens a group whose members exclude each other.
    fn add_mutually_exclusive_group(
        &mut self,
        name: &str,
        spec: &GroupSpec,
    ) -> Result<Box<dyn ArgumentSink + '_>, AssembleError>;

    /// Creates the sub-parser collection. Called at most once per parser.
    fn add_subparsers(
        &mut self,
        spec: &SubparsersSpec,
    ) -> Result<&mut dyn SubparserSink, AssembleError>;

    /// Values placed in the namespace whenever this parser is selected.
    fn set_defaults(&mut self, defaults: Map<String, Value>);
}

/// The sub-parser collection of a parser.
pub trait SubparserSink {
    /// Creates the child parser for subcommand `name`.
    fn add_parser(
        &mut self,
        name: &str,
        display: &DisplayMeta,
    ) -> Result<&mut dyn ParserBuilder, AssembleError>;
}

/// A top-level parser that can be created from display metadata and run.
pub trait RootParser: ParserBuilder + Sized {
    fn new(display: &DisplayMeta) -> Self;

    /// Parses `argv`, which does not include the program name.
    fn parse<I, T>(&self, argv: I) -> Result<Namespace, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone;
}
