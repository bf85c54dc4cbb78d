use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{info, instrument};

use super::{insert_row, Entity, PhysicsResult};
use crate::error::Result;
use crate::query::SqlValue;
use crate::schema::{self, TableDef};
use crate::session::Session;

/// A physics analysis grouping results
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Analysis {
    #[sqlx(rename = "analysis_id")]
    pub id: i64,
    /// CADI line (analysis tracking reference)
    pub cadiline: Option<String>,
    pub contact: Option<String>,
    pub description: Option<String>,
}

impl Entity for Analysis {
    const NAME: &'static str = "Analysis";
    const TABLE: &'static TableDef = &schema::ANALYSIS;
    const ID_COLUMN: &'static str = "analysis_id";

    fn id(&self) -> i64 {
        self.id
    }

    fn row_values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("cadiline", SqlValue::from(&self.cadiline)),
            ("contact", SqlValue::from(&self.contact)),
            ("description", SqlValue::from(&self.description)),
        ]
    }
}

impl Analysis {
    /// Results belonging to this analysis, by id
    pub async fn results(&self, session: &Session) -> Result<Vec<PhysicsResult>> {
        PhysicsResult::select(session)
            .where_eq("analysis_id", self.id)
            .order_by_id()
            .fetch_all()
            .await
    }

    pub async fn result_count(&self, session: &Session) -> Result<i64> {
        PhysicsResult::select(session)
            .where_eq("analysis_id", self.id)
            .count()
            .await
    }
}

/// Fields for a new [`Analysis`]; none are mandatory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAnalysis {
    pub cadiline: Option<String>,
    pub contact: Option<String>,
    pub description: Option<String>,
}

impl NewAnalysis {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    #[instrument(skip(self, session))]
    pub async fn create(self, session: &Session) -> Result<Analysis> {
        let id = insert_row(
            session,
            &schema::ANALYSIS,
            vec![
                ("cadiline", SqlValue::from(self.cadiline)),
                ("contact", SqlValue::from(self.contact)),
                ("description", SqlValue::from(self.description)),
            ],
        )
        .await?;
        info!(id, "Analysis created");
        Analysis::get(session, id).await
    }
}
