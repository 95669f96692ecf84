//! Help display metadata passed through to parser builders.

use serde::{Deserialize, Serialize};

/// Help formatter selection.
///
/// The names follow the usual formatter families; how each one renders is up
/// to the parser builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatter {
    #[default]
    Default,
    /// Keep description and epilog line breaks
    RawDescription,
    /// Keep line breaks in all help text
    RawText,
    /// Append each argument's default to its help
    ArgumentDefaults,
}

/// Program name, usage, description, epilog and formatter of one parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMeta {
    pub prog: Option<String>,
    pub usage: Option<String>,
    pub description: Option<String>,
    pub epilog: Option<String>,
    pub formatter: Formatter,
}

impl DisplayMeta {
    /// Metadata whose description is the first paragraph of `doc`.
    pub fn from_doc(doc: Option<&str>) -> Self {
        let description = clean_text(doc.unwrap_or_default());
        Self {
            description: (!description.is_empty()).then_some(description),
            ..Self::default()
        }
    }
}

/// Returns the first paragraph of `text` with its lines joined by spaces.
///
/// ```rust
/// use cliadapt::clean_text;
///
/// let doc = "
///     Adds a task.
///     Tasks start open.
///
///     Second paragraph is dropped.
/// ";
/// assert_eq!(clean_text(doc), "Adds a task. Tasks start open.");
/// ```
pub fn clean_text(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .take_while(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
