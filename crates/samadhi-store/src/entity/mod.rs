//! Catalog record types
//!
//! Each record type has a read-side struct decoded from its table (for
//! example [`Dataset`]) and a `New*` builder that validates mandatory fields
//! and enumerated values before inserting (for example [`NewDataset`]).
//! Shared behaviour (lookup by id, saving mutated fields, deletion) lives on
//! the [`Entity`] trait.

mod analysis;
mod dataset;
mod file;
mod physics_result;
mod sample;
mod sample_result;

pub use analysis::{Analysis, NewAnalysis};
pub use dataset::{DataType, Dataset, NewDataset};
pub use file::{File, NewFile};
pub use physics_result::{NewPhysicsResult, PhysicsResult};
pub use sample::{luminosity_step, LuminositySource, NewSample, Sample, SampleType};
pub use sample_result::SampleResult;

use sqlx::any::AnyRow;
use sqlx::FromRow;
use std::future::Future;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::query::{arguments, execute, Select, SqlValue};
use crate::schema::TableDef;
use crate::session::{Backend, Session};
use crate::validation::ValidationError;

/// Format used for every stored timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in [`TIMESTAMP_FORMAT`]
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A record type stored in one catalog table with an integer primary key
pub trait Entity: for<'r> FromRow<'r, AnyRow> + Send + Sync + Unpin + 'static {
    /// Human-readable type name used in messages
    const NAME: &'static str;
    const TABLE: &'static TableDef;
    const ID_COLUMN: &'static str;

    fn id(&self) -> i64;

    /// Values of every column except the primary key, in table order
    fn row_values(&self) -> Vec<(&'static str, SqlValue)>;

    /// Re-check enumerated fields before an update is written
    fn check(&self) -> std::result::Result<(), ValidationError> {
        Ok(())
    }

    /// Start a query over the whole table
    fn select(session: &Session) -> Select<'_, Self>
    where
        Self: Sized,
    {
        Select::new(session)
    }

    /// Query restricted to one id
    fn by_id(session: &Session, id: i64) -> Select<'_, Self>
    where
        Self: Sized,
    {
        Select::new(session).with_id(id)
    }

    /// Fetch the record with primary key `id`
    fn get(session: &Session, id: i64) -> impl Future<Output = Result<Self>> + Send + '_
    where
        Self: Sized,
    {
        async move {
            Self::by_id(session, id)
                .fetch_optional()
                .await?
                .ok_or(StoreError::NotFound {
                    entity: Self::NAME,
                    id,
                })
        }
    }

    /// Write every field of this record back to its row
    fn save<'s>(&self, session: &'s Session) -> impl Future<Output = Result<()>> + Send + 's
    where
        Self: Sized,
    {
        let id = self.id();
        let checked = self.check();
        let values = self.row_values();
        async move {
            checked?;
            update_row(session, Self::TABLE, Self::ID_COLUMN, id, values).await?;
            info!(entity = Self::NAME, id, "Record saved");
            Ok::<_, StoreError>(())
        }
    }

    /// Delete this record's row
    fn delete<'s>(&self, session: &'s Session) -> impl Future<Output = Result<()>> + Send + 's
    where
        Self: Sized,
    {
        let id = self.id();
        async move {
            let removed = Self::by_id(session, id).delete().await?;
            if removed == 0 {
                return Err(StoreError::NotFound {
                    entity: Self::NAME,
                    id,
                });
            }
            info!(entity = Self::NAME, id, "Record deleted");
            Ok(())
        }
    }
}

/// Insert one row and return the id the database assigned to it
///
/// The id comes back with the statement itself: SQLite through
/// `RETURNING`, MySQL through the reported last insert id.
pub(crate) async fn insert_row(
    session: &Session,
    table: &'static TableDef,
    values: Vec<(&'static str, SqlValue)>,
) -> Result<i64> {
    let id_column = table
        .auto_id()
        .ok_or(StoreError::MissingInsertId(table.name))?;
    let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        columns.join(", "),
        placeholders
    );
    let params: Vec<SqlValue> = values.into_iter().map(|(_, v)| v).collect();

    let id = match session.backend() {
        Backend::Sqlite => {
            let sql = format!("{sql} RETURNING {id_column}");
            debug!(sql = %sql, "Executing statement");
            sqlx::query_scalar_with::<_, i64, _>(&sql, arguments(params)?)
                .fetch_one(session.pool())
                .await?
        }
        Backend::MySql => execute(session, &sql, params)
            .await?
            .last_insert_id()
            .ok_or(StoreError::MissingInsertId(table.name))?,
    };
    debug!(table = table.name, id, "Row inserted");
    Ok(id)
}

async fn update_row(
    session: &Session,
    table: &'static TableDef,
    id_column: &'static str,
    id: i64,
    values: Vec<(&'static str, SqlValue)>,
) -> Result<()> {
    let assignments: Vec<String> = values
        .iter()
        .map(|(column, _)| format!("{column} = ?"))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table.name,
        assignments.join(", "),
        id_column
    );

    let mut params: Vec<SqlValue> = values.into_iter().map(|(_, v)| v).collect();
    params.push(SqlValue::from(id));
    // MySQL reports zero affected rows when nothing changed, so the count
    // says nothing about whether the row exists.
    execute(session, &sql, params).await?;
    Ok(())
}
