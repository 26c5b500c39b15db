//! Error types for dapsql operations.
//!
//! - [`ConfigError`] - the configuration document as a whole is unusable.
//! - [`SpecError`] - a single declaration inside the dataset cannot be compiled.
//! - [`DapsqlError`] - the crate-level error wrapping both, plus database and
//!   I/O failures.
//!
//! Configuration and declaration errors carry a stable [`ErrorCode`]:
//! - `E1xx` - configuration document errors
//! - `E2xx` - declaration errors

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Error codes for configuration and declaration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Configuration Errors (E1xx)
    // =========================================================================
    /// The configuration file could not be read.
    E100,

    /// The configuration text is not a well-formed document.
    E101,

    /// The document root is not a mapping.
    E102,

    /// The `dataset` section does not hold exactly one root declaration.
    E103,

    /// The dataset root is not declared with type `Dataset`.
    E104,

    /// The `database` section is malformed.
    E105,

    /// The `dataset` section is not a mapping.
    E106,

    // =========================================================================
    // Declaration Errors (E2xx)
    // =========================================================================
    /// A declaration is neither a type name nor a mapping.
    E200,

    /// A mapping declaration has no `type`.
    E201,

    /// `attributes` is present but is not a mapping.
    E202,

    /// `children` is present but is not a mapping.
    E203,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E101").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The configuration document is unreadable or structurally wrong.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("configuration must be a mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("dataset must be a mapping, found {0}")]
    DatasetNotAMapping(&'static str),

    #[error("dataset must contain exactly 1 root declaration, found {0}")]
    DatasetRootCount(usize),

    #[error("dataset root `{name}` must be declared with type Dataset")]
    DatasetRootType { name: String },

    #[error("invalid database configuration: {0}")]
    Database(String),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Read { .. } => ErrorCode::E100,
            ConfigError::Parse(_) => ErrorCode::E101,
            ConfigError::NotAMapping(_) => ErrorCode::E102,
            ConfigError::DatasetNotAMapping(_) => ErrorCode::E106,
            ConfigError::DatasetRootCount(_) => ErrorCode::E103,
            ConfigError::DatasetRootType { .. } => ErrorCode::E104,
            ConfigError::Database(_) => ErrorCode::E105,
        }
    }
}

/// A declaration inside the dataset cannot be compiled.
///
/// `path` is the dotted path of the offending declaration from the dataset
/// root, e.g. `station.observations.time`.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("declaration `{path}` must be a type name or a mapping, found {found}")]
    InvalidDeclaration { path: String, found: &'static str },

    #[error("declaration `{path}` is missing `type`")]
    MissingType { path: String },

    #[error("attributes of `{path}` must be a mapping, found {found}")]
    InvalidAttributes { path: String, found: &'static str },

    #[error("children of `{path}` must be a mapping, found {found}")]
    InvalidChildren { path: String, found: &'static str },
}

impl SpecError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SpecError::InvalidDeclaration { .. } => ErrorCode::E200,
            SpecError::MissingType { .. } => ErrorCode::E201,
            SpecError::InvalidAttributes { .. } => ErrorCode::E202,
            SpecError::InvalidChildren { .. } => ErrorCode::E203,
        }
    }

    /// Dotted path of the offending declaration.
    pub fn path(&self) -> &str {
        match self {
            SpecError::InvalidDeclaration { path, .. }
            | SpecError::MissingType { path }
            | SpecError::InvalidAttributes { path, .. }
            | SpecError::InvalidChildren { path, .. } => path,
        }
    }
}

/// The main error type for dapsql operations.
#[derive(Debug, Error)]
pub enum DapsqlError {
    #[error("[{code}] configuration error: {0}", code = .0.code())]
    Config(#[from] ConfigError),

    #[error("[{code}] specification error: {0}", code = .0.code())]
    Spec(#[from] SpecError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
