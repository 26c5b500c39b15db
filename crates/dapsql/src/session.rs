//! Transactional database sessions.
//!
//! Connection pools are process-wide and keyed by the exact dsn string. A pool
//! is created on first use and reused by every later session for that dsn.
//! The registry is a mutex-guarded map: a lookup holds the lock, but
//! connecting a new pool does not, and the insert keeps whichever pool got
//! there first, so concurrent first users of a dsn all end up sharing one
//! pool.
//!
//! sqlx is asynchronous; sessions drive it on a shared runtime and block the
//! calling thread for the full round trip. Do not call into this module from
//! inside an async runtime.
//!
//! Connections use sqlx's `Any` driver, so the dsn scheme picks the backend
//! (`postgres://...`, `sqlite://...`).

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    panic::{self, AssertUnwindSafe},
    sync::{LazyLock, Mutex, MutexGuard, OnceLock, PoisonError},
};

use log::{debug, trace, warn};
use sqlx::{
    Any, AnyPool, Column, Row, Transaction, ValueRef,
    any::{AnyPoolOptions, AnyRow},
};
use tokio::runtime::{Builder, Runtime};

use crate::value::{Mapping, Value};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

static POOLS: LazyLock<Mutex<HashMap<String, AnyPool>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        Builder::new_multi_thread()
            .enable_all()
            .thread_name("dapsql-db")
            .build()
            .expect("database runtime")
    })
}

fn block_on<F: Future>(future: F) -> F::Output {
    runtime().block_on(future)
}

fn pools() -> MutexGuard<'static, HashMap<String, AnyPool>> {
    POOLS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Get the pool for `dsn`, connecting it on first use.
///
/// # Errors
///
/// Returns the connection error if a new pool cannot be connected.
pub fn pool(dsn: &str) -> Result<AnyPool, sqlx::Error> {
    if let Some(pool) = pools().get(dsn) {
        return Ok(pool.clone());
    }

    sqlx::any::install_default_drivers();
    debug!("Creating connection pool");
    let created = block_on(AnyPoolOptions::new().connect(dsn))?;

    Ok(pools().entry(dsn.to_string()).or_insert(created).clone())
}

/// Close and forget the pool for `dsn`.
///
/// Closing waits for checked-out connections to be returned. Returns `false`
/// if no pool existed.
pub fn close_pool(dsn: &str) -> bool {
    let Some(pool) = pools().remove(dsn) else {
        return false;
    };
    block_on(pool.close());
    debug!("Connection pool closed");
    true
}

/// An open transaction on a pooled connection.
///
/// Obtained only through [`session_scope`], which decides whether the
/// transaction commits or rolls back.
pub struct Session {
    tx: Transaction<'static, Any>,
}

impl Session {
    /// Run a literal query and return its rows.
    ///
    /// Each row is a [`Value::Mapping`] from column name to value, in column
    /// order.
    ///
    /// # Errors
    ///
    /// Returns the database error, or [`sqlx::Error::ColumnDecode`] for a
    /// column whose type has no [`Value`] counterpart.
    pub fn query(&mut self, sql: &str) -> Result<Vec<Value>, sqlx::Error> {
        trace!(sql; "Running query");
        let rows = block_on(sqlx::query(sql).fetch_all(&mut *self.tx))?;
        debug!(rows_count = rows.len(); "Query returned");
        rows.iter().map(row_to_value).collect()
    }

    /// Run a literal statement and return the number of affected rows.
    pub fn execute(&mut self, sql: &str) -> Result<u64, sqlx::Error> {
        trace!(sql; "Executing statement");
        let result = block_on(sqlx::query(sql).execute(&mut *self.tx))?;
        Ok(result.rows_affected())
    }

    fn rollback(self) {
        match block_on(self.tx.rollback()) {
            Ok(()) => debug!("Session rolled back"),
            Err(rollback_err) => warn!(rollback_error:err = rollback_err; "Rollback failed"),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Run `f` inside a transaction on the pool for `dsn`.
///
/// If `f` returns `Ok` the transaction is committed. If it returns `Err` the
/// transaction is rolled back and that same error is returned; a failing
/// rollback is logged, never substituted. If `f` panics the transaction is
/// rolled back and the panic resumes. Either way the connection goes back to
/// the pool.
///
/// # Errors
///
/// Returns connection and commit failures converted into `E`, or the error
/// returned by `f`.
pub fn session_scope<T, E, F>(dsn: &str, f: F) -> Result<T, E>
where
    F: FnOnce(&mut Session) -> Result<T, E>,
    E: From<sqlx::Error>,
{
    let pool = pool(dsn)?;
    let tx = block_on(pool.begin())?;
    let mut session = Session { tx };

    // The connection must not be dropped while unwinding: returning it to
    // the pool needs the runtime.
    match panic::catch_unwind(AssertUnwindSafe(|| f(&mut session))) {
        Ok(Ok(value)) => {
            block_on(session.tx.commit())?;
            debug!("Session committed");
            Ok(value)
        }
        Ok(Err(err)) => {
            session.rollback();
            Err(err)
        }
        Err(payload) => {
            session.rollback();
            panic::resume_unwind(payload)
        }
    }
}

fn row_to_value(row: &AnyRow) -> Result<Value, sqlx::Error> {
    let mut record = Mapping::with_capacity(row.len());
    for column in row.columns() {
        let value = column_value(row, column.ordinal())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(Value::Mapping(record))
}

fn column_value(row: &AnyRow, index: usize) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }
    if let Ok(value) = row.try_get::<i64, _>(index) {
        return Ok(Value::Integer(value));
    }
    if let Ok(value) = row.try_get::<f64, _>(index) {
        return Ok(Value::Float(value));
    }
    // Single-precision columns (`real`, `float4`) only decode as f32.
    if let Ok(value) = row.try_get::<f32, _>(index) {
        return Ok(Value::Float(f64::from(value)));
    }
    if let Ok(value) = row.try_get::<bool, _>(index) {
        return Ok(Value::Bool(value));
    }
    if let Ok(value) = row.try_get::<String, _>(index) {
        return Ok(Value::String(value));
    }
    Err(sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source: "column type has no document value counterpart".into(),
    })
}
