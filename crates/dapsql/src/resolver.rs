//! Turning data bindings into row streams.
//!
//! Resolution is where a binding first touches the database: a callable is
//! invoked with a fresh session, and marked query text is executed literally.
//! Each call opens at most one session and runs at most one query. Failures
//! come back exactly as the database or the callable reported them, after
//! the session has been rolled back, and nothing is retried.

use std::{fmt, iter};

use log::{debug, trace};

use crate::{
    binding::{DataBinding, DataSource},
    config::DbConfig,
    session::session_scope,
    value::Value,
};

/// A single-pass stream of values for one bound node.
pub struct RowStream {
    inner: Box<dyn Iterator<Item = Value> + Send>,
}

impl RowStream {
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: Box::new(values.into_iter()),
        }
    }
}

impl Iterator for RowStream {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl fmt::Debug for RowStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStream").finish_non_exhaustive()
    }
}

/// Resolve a binding into a stream.
///
/// - [`DataBinding::Callable`]: invoked with a session; its rows are streamed.
/// - [`DataBinding::QueryText`]: executed in a session; its rows are streamed.
/// - [`DataBinding::Iterable`]: its values are streamed in order.
/// - [`DataBinding::Atomic`]: streamed as a single value.
///
/// Query results are fetched and committed before the stream is returned.
///
/// # Errors
///
/// Returns [`sqlx::Error::Configuration`] if the binding needs a database and
/// `db` is `None`; otherwise the unmodified error from the session, the query
/// or the callable.
pub fn resolve(binding: &DataBinding, db: Option<&DbConfig>) -> Result<RowStream, sqlx::Error> {
    trace!(binding:?; "Resolving data binding");
    match binding {
        DataBinding::Callable(query) => {
            let rows = session_scope(dsn(db)?, |session| query.call(session))?;
            debug!(rows_count = rows.len(); "Callable binding resolved");
            Ok(RowStream::new(rows))
        }
        DataBinding::QueryText(body) => {
            let rows = session_scope(dsn(db)?, |session| session.query(body))?;
            debug!(rows_count = rows.len(); "Query binding resolved");
            Ok(RowStream::new(rows))
        }
        DataBinding::Iterable(values) => Ok(RowStream::new(values.clone())),
        DataBinding::Atomic(value) => Ok(RowStream::new(iter::once(value.clone()))),
    }
}

/// Resolve the data source attached to a model node.
pub fn open(source: &DataSource) -> Result<RowStream, sqlx::Error> {
    resolve(source.binding(), source.db())
}

fn dsn(db: Option<&DbConfig>) -> Result<&str, sqlx::Error> {
    db.map(DbConfig::dsn)
        .ok_or_else(|| sqlx::Error::Configuration("no database configured for binding".into()))
}
