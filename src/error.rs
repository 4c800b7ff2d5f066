//! Error taxonomy for the bridge. Only [`BridgeError::FileOpen`] is recovered inside the
//! producer loop; every other kind ends the run and is returned to the caller.

use std::fmt;
use std::io;

use thiserror::Error;

/// Syntax class of a rejected filename pattern. `code()` is stable and used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatternErrorKind {
    Collate,
    /// Unknown named or unicode character class.
    CharacterType,
    Escape,
    Backreference,
    /// Malformed or unclosed bracket expression.
    Bracket,
    /// Unbalanced group.
    Paren,
    /// Unclosed repetition bound.
    Brace,
    /// Invalid repetition bound (e.g. `{3,1}`).
    BadBrace,
    /// Invalid range inside a bracket expression.
    Range,
    /// Repetition operator with nothing to repeat.
    BadRepeat,
    /// Nesting or compiled size limit exceeded.
    Complexity,
    Other,
}

impl PatternErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            PatternErrorKind::Collate => "error_collate",
            PatternErrorKind::CharacterType => "error_ctype",
            PatternErrorKind::Escape => "error_escape",
            PatternErrorKind::Backreference => "error_backref",
            PatternErrorKind::Bracket => "error_brack",
            PatternErrorKind::Paren => "error_paren",
            PatternErrorKind::Brace => "error_brace",
            PatternErrorKind::BadBrace => "error_badbrace",
            PatternErrorKind::Range => "error_range",
            PatternErrorKind::BadRepeat => "error_badrepeat",
            PatternErrorKind::Complexity => "error_complexity",
            PatternErrorKind::Other => "error_other",
        }
    }
}

impl fmt::Display for PatternErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigErrorReason {
    Missing,
    InvalidValue,
}

impl fmt::Display for ConfigErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorReason::Missing => f.write_str("missing"),
            ConfigErrorReason::InvalidValue => f.write_str("invalid value"),
        }
    }
}

/// A missing or invalid configuration parameter, with the offending key and value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("configuration parameter '{key}': {reason} '{value}'")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: ConfigErrorReason,
}

impl ConfigError {
    pub fn missing(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: String::new(),
            reason: ConfigErrorReason::Missing,
        }
    }

    pub fn invalid(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
            reason: ConfigErrorReason::InvalidValue,
        }
    }
}

/// Coarse failure category reported upward together with a numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Config,
    PatternCompile,
    Scan,
    FileOpen,
    Allocation,
    Emission,
    Schema,
    State,
}

impl FailureKind {
    pub fn code(self) -> u32 {
        match self {
            FailureKind::Config => 1,
            FailureKind::PatternCompile => 2,
            FailureKind::Scan => 3,
            FailureKind::FileOpen => 4,
            FailureKind::Allocation => 5,
            FailureKind::Emission => 6,
            FailureKind::Schema => 7,
            FailureKind::State => 8,
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("bad filename_rgx '{pattern}' ({kind}): {detail}")]
    PatternCompile {
        pattern: String,
        kind: PatternErrorKind,
        detail: String,
    },

    #[error("could not open directory {path}: {source}")]
    Scan {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to open file {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not allocate {size} bytes to read {path}")]
    Allocation { path: String, size: u64 },

    #[error("pipeline rejected a group of {records} records: {reason}")]
    Emission { records: usize, reason: String },

    #[error("record layout rejected: {0}")]
    Schema(String),

    #[error("connector state: {0}")]
    State(String),
}

impl BridgeError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            BridgeError::Config(_) => FailureKind::Config,
            BridgeError::PatternCompile { .. } => FailureKind::PatternCompile,
            BridgeError::Scan { .. } => FailureKind::Scan,
            BridgeError::FileOpen { .. } => FailureKind::FileOpen,
            BridgeError::Allocation { .. } => FailureKind::Allocation,
            BridgeError::Emission { .. } => FailureKind::Emission,
            BridgeError::Schema(_) => FailureKind::Schema,
            BridgeError::State(_) => FailureKind::State,
        }
    }

    pub fn code(&self) -> u32 {
        self.failure_kind().code()
    }

    /// True for the one kind the producer skips past instead of stopping.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BridgeError::FileOpen { .. })
    }
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
