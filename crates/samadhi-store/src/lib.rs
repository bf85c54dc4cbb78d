//! SAMADhi record store
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Persists and queries the SAMADhi catalog: datasets pulled from the grid
//! catalog, the samples processed from them, the files inside each sample,
//! and the physics results (grouped by analysis) built on top of samples.
//!
//! # Overview
//!
//! - **Credentials**: the `~/.samadhi` JSON file selecting a local SQLite
//!   file (test mode) or a MySQL server
//! - **Session**: one scoped connection; every store call takes `&Session`
//! - **Schema**: declarative table definitions rendered per backend
//! - **Entities**: validated constructors, field updates via `save`,
//!   relationships and the effective-luminosity derivation
//! - **Query**: the filtered, ordered `Select` builder
//!
//! # Example
//!
//! ```no_run
//! use samadhi_store::{with_session, Dataset, Entity, StoreError, WildcardPattern};
//!
//! # async fn demo() -> Result<(), StoreError> {
//! let names = with_session("~/.samadhi", |session| {
//!     Box::pin(async move {
//!         let datasets = Dataset::select(session)
//!             .where_like("name", &WildcardPattern::new("ttbar_*"))
//!             .order_by_id()
//!             .fetch_all()
//!             .await?;
//!         Ok::<_, StoreError>(datasets.into_iter().map(|d| d.name).collect::<Vec<_>>())
//!     })
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod entity;
pub mod error;
pub mod query;
pub mod schema;
pub mod session;
pub mod validation;

pub use credentials::{Credentials, CredentialsError, DEFAULT_CREDENTIALS_PATH};
pub use entity::{
    luminosity_step, now_timestamp, Analysis, DataType, Dataset, Entity, File, LuminositySource,
    NewAnalysis, NewDataset, NewFile, NewPhysicsResult, NewSample, PhysicsResult, Sample,
    SampleResult, SampleType,
};
pub use error::{Result, StoreError};
pub use query::{Select, SqlValue, WildcardPattern};
pub use session::{with_session, Backend, Session};
pub use validation::ValidationError;
