use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{info, instrument};

use super::{insert_row, now_timestamp, Analysis, Entity, Sample, SampleResult};
use crate::error::Result;
use crate::query::SqlValue;
use crate::schema::{self, TableDef};
use crate::session::Session;
use crate::validation::{require_text, ValidationError};

/// A physics result (plots, fits, tables) built from one or more samples
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PhysicsResult {
    #[sqlx(rename = "result_id")]
    pub id: i64,
    pub path: String,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Link to the logbook entry
    pub elog: Option<String>,
    pub creation_time: String,
    pub analysis_id: Option<i64>,
}

impl Entity for PhysicsResult {
    const NAME: &'static str = "Result";
    const TABLE: &'static TableDef = &schema::RESULT;
    const ID_COLUMN: &'static str = "result_id";

    fn id(&self) -> i64 {
        self.id
    }

    fn row_values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("path", SqlValue::from(self.path.as_str())),
            ("author", SqlValue::from(&self.author)),
            ("description", SqlValue::from(&self.description)),
            ("elog", SqlValue::from(&self.elog)),
            ("creation_time", SqlValue::from(self.creation_time.as_str())),
            ("analysis_id", SqlValue::from(self.analysis_id)),
        ]
    }
}

impl PhysicsResult {
    /// Samples this result was built from, by id
    pub async fn samples(&self, session: &Session) -> Result<Vec<Sample>> {
        Sample::select(session)
            .linked_through(SampleResult::TABLE, "result_id", self.id)
            .order_by_id()
            .fetch_all()
            .await
    }

    pub async fn analysis(&self, session: &Session) -> Result<Option<Analysis>> {
        match self.analysis_id {
            Some(id) => Analysis::by_id(session, id).fetch_optional().await,
            None => Ok(None),
        }
    }

    pub async fn attach_sample(&self, session: &Session, sample: &Sample) -> Result<SampleResult> {
        SampleResult::create(session, sample.id, self.id).await
    }
}

/// Fields for a new [`PhysicsResult`]; only `path` is mandatory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPhysicsResult {
    pub path: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub elog: Option<String>,
    /// Defaults to the creation instant
    pub creation_time: Option<String>,
    pub analysis_id: Option<i64>,
}

impl NewPhysicsResult {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        require_text("Result", "path", &self.path)?;
        Ok(())
    }

    #[instrument(skip(self, session), fields(path = ?self.path))]
    pub async fn create(self, session: &Session) -> Result<PhysicsResult> {
        self.validate()?;
        let creation_time = self.creation_time.unwrap_or_else(now_timestamp);
        let id = insert_row(
            session,
            &schema::RESULT,
            vec![
                ("path", SqlValue::from(self.path)),
                ("author", SqlValue::from(self.author)),
                ("description", SqlValue::from(self.description)),
                ("elog", SqlValue::from(self.elog)),
                ("creation_time", SqlValue::from(creation_time)),
                ("analysis_id", SqlValue::from(self.analysis_id)),
            ],
        )
        .await?;
        info!(id, "Result created");
        PhysicsResult::get(session, id).await
    }
}
