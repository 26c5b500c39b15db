//! Data bindings attached to model nodes.
//!
//! A declared `data` value is classified once, at compile time, into a
//! [`DataBinding`]. The binding and the database configuration it needs are
//! kept together as a [`DataSource`]; opening the actual row stream is the
//! resolver's job and happens only when a consumer asks for rows.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    config::DbConfig,
    value::{QueryFn, Value},
};

/// `SQL{{ <body> }}`, with insignificant surrounding whitespace. The body may
/// span lines.
static SQL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*SQL\{\{(.*)\}\}\s*$").expect("SQL marker pattern is valid")
});

/// Extract the query body from a `SQL{{ ... }}` string.
///
/// Returns `None` when `text` does not carry the marker.
///
/// ```
/// # use dapsql::binding::query_text;
/// assert_eq!(query_text("SQL{{ SELECT 1 }}"), Some("SELECT 1"));
/// assert_eq!(query_text("giraffe"), None);
/// ```
pub fn query_text(text: &str) -> Option<&str> {
    SQL_MARKER
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str().trim())
}

/// The four categories a declared data value can fall into.
#[derive(Debug, Clone, PartialEq)]
pub enum DataBinding {
    /// A single value, yielded once.
    Atomic(Value),
    /// The body of a `SQL{{ ... }}` string, executed as a literal query.
    QueryText(String),
    /// A function invoked with a database session.
    Callable(QueryFn),
    /// Values yielded in order.
    Iterable(Vec<Value>),
}

impl DataBinding {
    /// Classify a raw declared value.
    ///
    /// Checked in order: callable, marked query text, plain text, sequence,
    /// anything else. Mappings and null count as atomic values.
    pub fn classify(raw: &Value) -> Self {
        match raw {
            Value::Query(query) => DataBinding::Callable(query.clone()),
            Value::String(text) => match query_text(text) {
                Some(body) => DataBinding::QueryText(body.to_string()),
                None => DataBinding::Atomic(raw.clone()),
            },
            Value::Sequence(values) => DataBinding::Iterable(values.clone()),
            other => DataBinding::Atomic(other.clone()),
        }
    }

    /// Returns `true` if resolving this binding opens a database session.
    pub fn needs_session(&self) -> bool {
        matches!(self, DataBinding::QueryText(_) | DataBinding::Callable(_))
    }
}

/// A binding together with the database it resolves against.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    binding: DataBinding,
    db: Option<DbConfig>,
}

impl DataSource {
    pub fn new(binding: DataBinding, db: Option<DbConfig>) -> Self {
        Self { binding, db }
    }

    pub fn binding(&self) -> &DataBinding {
        &self.binding
    }

    pub fn db(&self) -> Option<&DbConfig> {
        self.db.as_ref()
    }
}
