//! Engine participants: who plays, how to launch them, and how to configure them.

use std::{fmt::Display, hash::Hash, path::PathBuf};

/// Typed value of a UCI option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionValue {
    /// `check` options.
    Bool(bool),
    /// `spin` options.
    Int(i64),
    /// `string` and `combo` options.
    Str(String),
}

impl Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value.into())
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Int(value.into())
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_owned())
    }
}

/// A named, configured engine instance.
///
/// Immutable once built, and shared read-only (behind an `Arc`) by every game it plays.
/// Two participants are the same if they have the same name.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Name written in the PGN headers and used as report row key.
    pub name: String,
    /// Engine executable.
    pub path_to_exe: PathBuf,
    /// Command line arguments given to the executable.
    pub args: Vec<String>,
    /// UCI options sent before the game starts, in order.
    pub options: Vec<(String, OptionValue)>,
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Participant {}

impl Hash for Participant {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Participant {
    /// Participant launching `path_to_exe` without arguments nor options.
    pub fn new(name: impl Into<String>, path_to_exe: impl Into<PathBuf>) -> Participant {
        Participant {
            name: name.into(),
            path_to_exe: path_to_exe.into(),
            args: vec![],
            options: vec![],
        }
    }

    /// Set the command line arguments.
    #[must_use]
    pub fn with_args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Append one UCI option.
    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.push((name.into(), value.into()));
        self
    }
}

impl Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
