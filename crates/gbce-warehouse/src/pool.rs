//! `DuckDB` connection pool.
//!
//! Every pooled connection is cloned from a single root connection, so the
//! whole process shares one database instance and one set of constraints.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ::duckdb::Connection;

struct PoolInner {
    db_path: PathBuf,
    max_idle: usize,
    root: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
}

/// A pool of connections sharing one `DuckDB` database.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Open the database file and build a pool around it.
    ///
    /// # Arguments
    /// * `path` - Path to the `DuckDB` database file
    /// * `max_idle` - Maximum number of idle connections kept for reuse
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn open(path: impl Into<PathBuf>, max_idle: usize) -> Result<Self, ::duckdb::Error> {
        let db_path = path.into();
        let root = Connection::open(db_path.as_path())?;
        configure_connection(&root)?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                db_path,
                max_idle: max_idle.max(1),
                root: Mutex::new(root),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Take an idle connection, or clone a new one from the root.
    ///
    /// # Errors
    /// Returns an error if a new connection cannot be cloned or configured.
    pub fn acquire(&self) -> Result<PooledConnection, ::duckdb::Error> {
        let reused = lock(&self.inner.idle).pop();

        let connection = match reused {
            Some(connection) => connection,
            None => {
                let connection = lock(&self.inner.root).try_clone()?;
                configure_connection(&connection)?;
                connection
            }
        };

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
        })
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.inner.db_path.as_path()
    }

    /// Number of connections currently parked in the pool.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        lock(&self.inner.idle).len()
    }
}

/// A pooled connection that returns to the pool when dropped.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("pooled connection unexpectedly missing")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
            .as_mut()
            .expect("pooled connection unexpectedly missing")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let mut idle = lock(&self.pool.idle);
        if idle.len() < self.pool.max_idle {
            idle.push(connection);
        }
    }
}

// Poisoning is ignored: the guarded values hold no partially updated state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}
