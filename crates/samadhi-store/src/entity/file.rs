use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{info, instrument};

use super::{insert_row, Entity, Sample};
use crate::error::Result;
use crate::query::SqlValue;
use crate::schema::{self, TableDef};
use crate::session::Session;
use crate::validation::{require, require_text, ValidationError};

/// One file of a sample
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct File {
    pub id: i64,
    /// Logical file name (`/store/...`)
    pub lfn: String,
    /// Physical file name (`root://...`, `srm://...`)
    pub pfn: String,
    pub nevents: i64,
    pub event_weight_sum: f64,
    pub extras_event_weight_sum: Option<String>,
    pub sample_id: i64,
}

impl Entity for File {
    const NAME: &'static str = "File";
    const TABLE: &'static TableDef = &schema::FILE;
    const ID_COLUMN: &'static str = "id";

    fn id(&self) -> i64 {
        self.id
    }

    fn row_values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("lfn", SqlValue::from(self.lfn.as_str())),
            ("pfn", SqlValue::from(self.pfn.as_str())),
            ("nevents", SqlValue::from(self.nevents)),
            ("event_weight_sum", SqlValue::from(self.event_weight_sum)),
            ("extras_event_weight_sum", SqlValue::from(&self.extras_event_weight_sum)),
            ("sample_id", SqlValue::from(self.sample_id)),
        ]
    }
}

impl File {
    pub async fn sample(&self, session: &Session) -> Result<Sample> {
        Sample::get(session, self.sample_id).await
    }
}

/// Fields for a new [`File`]
///
/// `lfn`, `pfn`, `nevents`, `event_weight_sum` and `sample_id` are mandatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFile {
    pub lfn: Option<String>,
    pub pfn: Option<String>,
    pub nevents: Option<i64>,
    pub event_weight_sum: Option<f64>,
    pub extras_event_weight_sum: Option<String>,
    pub sample_id: Option<i64>,
}

impl NewFile {
    pub fn new(
        lfn: impl Into<String>,
        pfn: impl Into<String>,
        nevents: i64,
        event_weight_sum: f64,
        sample_id: i64,
    ) -> Self {
        Self {
            lfn: Some(lfn.into()),
            pfn: Some(pfn.into()),
            nevents: Some(nevents),
            event_weight_sum: Some(event_weight_sum),
            extras_event_weight_sum: None,
            sample_id: Some(sample_id),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        require_text("File", "lfn", &self.lfn)?;
        require_text("File", "pfn", &self.pfn)?;
        require("File", "event_weight_sum", &self.event_weight_sum)?;
        require("File", "nevents", &self.nevents)?;
        require("File", "sample_id", &self.sample_id)?;
        Ok(())
    }

    #[instrument(skip(self, session), fields(lfn = ?self.lfn))]
    pub async fn create(self, session: &Session) -> Result<File> {
        self.validate()?;
        let id = insert_row(
            session,
            &schema::FILE,
            vec![
                ("lfn", SqlValue::from(self.lfn)),
                ("pfn", SqlValue::from(self.pfn)),
                ("nevents", SqlValue::from(self.nevents)),
                ("event_weight_sum", SqlValue::from(self.event_weight_sum)),
                ("extras_event_weight_sum", SqlValue::from(self.extras_event_weight_sum)),
                ("sample_id", SqlValue::from(self.sample_id)),
            ],
        )
        .await?;
        info!(id, "File created");
        File::get(session, id).await
    }
}
