//! Scoped database sessions
//!
//! A [`Session`] owns the single connection to the catalog. Nothing is bound
//! globally: store functions take `&Session`, and query builders borrow it,
//! so no query can outlive the scope that opened the connection.

use futures::future::BoxFuture;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::credentials::Credentials;
use crate::error::{Result, StoreError};
use crate::schema;

/// SQL dialect of the connected database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Local single-file database (test mode)
    Sqlite,
    /// Networked server
    MySql,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Sqlite => write!(f, "sqlite"),
            Backend::MySql => write!(f, "mysql"),
        }
    }
}

/// An open connection to the catalog
#[derive(Debug)]
pub struct Session {
    pool: AnyPool,
    backend: Backend,
}

impl Session {
    /// Load the credentials file at `credentials_path` and connect
    pub async fn open(credentials_path: impl AsRef<Path>) -> Result<Self> {
        let credentials = Credentials::load(credentials_path)?;
        Self::connect(&credentials).await
    }

    /// Connect with already resolved credentials
    #[instrument(skip(credentials), fields(backend = %credentials.backend()))]
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .connect(&credentials.connection_url())
            .await?;

        info!("Connected to catalog");
        Ok(Self {
            pool,
            backend: credentials.backend(),
        })
    }

    /// Private in-memory SQLite catalog with all tables created
    pub async fn in_memory() -> Result<Self> {
        sqlx::any::install_default_drivers();

        // The database lives as long as its only connection.
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let session = Self {
            pool,
            backend: Backend::Sqlite,
        };
        session.create_tables().await?;
        Ok(session)
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub(crate) fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Create the six catalog tables if they do not exist yet
    #[instrument(skip(self), fields(backend = %self.backend))]
    pub async fn create_tables(&self) -> Result<()> {
        for statement in schema::create_statements(self.backend) {
            debug!(sql = %statement, "Executing DDL");
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        info!("Catalog tables ready");
        Ok(())
    }

    /// Release the connection
    pub async fn close(self) {
        self.pool.close().await;
        debug!("Session closed");
    }
}

/// Run `scope` inside a session opened from the credentials file
///
/// The session is closed when `scope` finishes, whether it succeeded or not.
///
/// ```no_run
/// use samadhi_store::{with_session, Entity, Sample, StoreError};
///
/// # async fn demo() -> Result<(), StoreError> {
/// let count = with_session("~/.samadhi", |session| {
///     Box::pin(async move { Sample::select(session).count().await })
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_session<T, E, F>(credentials_path: impl AsRef<Path>, scope: F) -> std::result::Result<T, E>
where
    E: From<StoreError>,
    F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, std::result::Result<T, E>>,
{
    let session = Session::open(credentials_path).await?;
    let outcome = scope(&session).await;
    session.close().await;
    outcome
}
