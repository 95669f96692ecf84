//! Registry-wide settings.
//!
//! Settings are plain serde data so an application can keep them alongside
//! the rest of its configuration:
//!
//! ```rust
//! use cliadapt::{MissingExtension, Settings};
//!
//! let settings: Settings = serde_json::from_str(r#"{ "missing_extension": "fail" }"#).unwrap();
//! assert_eq!(settings.missing_extension, MissingExtension::Fail);
//! assert_eq!(settings.debug_key, "debug");
//! ```

use serde::{Deserialize, Serialize};

/// What to do when an extension turns out to be unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingExtension {
    /// Leave the subcommand out.
    #[default]
    Skip,
    /// Fail parser assembly.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Namespace entry that, when truthy, makes target failures propagate.
    pub debug_key: String,
    pub missing_extension: MissingExtension,
    /// Prefix of the hidden namespace keys naming the selected subcommand.
    pub backref_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_key: "debug".to_string(),
            missing_extension: MissingExtension::Skip,
            backref_prefix: "_adaptor_".to_string(),
        }
    }
}

impl Settings {
    pub fn debug_key(mut self, key: impl Into<String>) -> Self {
        self.debug_key = key.into();
        self
    }

    pub fn missing_extension(mut self, policy: MissingExtension) -> Self {
        self.missing_extension = policy;
        self
    }

    pub fn backref_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.backref_prefix = prefix.into();
        self
    }
}
