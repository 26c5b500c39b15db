//! Configuration documents.
//!
//! A configuration document is a mapping with an optional `database` section
//! and, for any compilable document, a `dataset` section:
//!
//! ```yaml
//! database:
//!   dsn: postgresql://localhost/crmp
//! dataset:
//!   station:
//!     type: Dataset
//!     children:
//!       observations:
//!         type: Sequence
//!         data: SQL{{ SELECT * FROM observations }}
//!         children:
//!           time: String
//! ```
//!
//! This module reads documents from YAML and extracts the [`DbConfig`].

use std::{fs, path::Path};

use log::{debug, info};

use crate::{error::ConfigError, value::Value};

/// Connection settings for the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbConfig {
    dsn: String,
}

impl DbConfig {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self { dsn: dsn.into() }
    }

    /// The connection string identifying the store.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Extract the `database` section of a document.
    ///
    /// An absent or null section yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Database`] if the section is present but is not
    /// a mapping with a string `dsn`.
    pub fn from_document(document: &Value) -> Result<Option<Self>, ConfigError> {
        let section = match document.get("database") {
            None | Some(Value::Null) => return Ok(None),
            Some(section) => section,
        };
        let map = section.as_mapping().ok_or_else(|| {
            ConfigError::Database(format!(
                "expected a mapping, found {}",
                section.kind_name()
            ))
        })?;
        match map.get("dsn") {
            Some(Value::String(dsn)) => Ok(Some(Self::new(dsn.clone()))),
            Some(other) => Err(ConfigError::Database(format!(
                "`dsn` must be a string, found {}",
                other.kind_name()
            ))),
            None => Err(ConfigError::Database("missing `dsn`".to_string())),
        }
    }
}

/// Parse a YAML configuration document.
///
/// Blank text and a null document both parse to an empty mapping.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed YAML and
/// [`ConfigError::NotAMapping`] if the document root is not a mapping.
pub fn parse_document(text: &str) -> Result<Value, ConfigError> {
    if text.trim().is_empty() {
        return Ok(Value::empty_mapping());
    }
    match serde_yaml::from_str(text)? {
        Value::Null => Ok(Value::empty_mapping()),
        document @ Value::Mapping(_) => Ok(document),
        other => Err(ConfigError::NotAMapping(other.kind_name())),
    }
}

/// Read and parse a YAML configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read, otherwise the
/// errors of [`parse_document`].
pub fn load_document(path: impl AsRef<Path>) -> Result<Value, ConfigError> {
    let path = path.as_ref();
    info!(path = path.display().to_string(); "Loading configuration");

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse_document(&text)?;

    debug!(path = path.display().to_string(); "Configuration parsed");
    Ok(document)
}
