use serde::Serialize;
use tracing::{info, instrument};

use crate::error::Result;
use crate::query::{execute, SqlValue};
use crate::schema;
use crate::session::Session;

/// Association between a sample and a result built from it
///
/// The pair is the primary key; inserting it twice is rejected by the
/// database (see [`crate::StoreError::is_unique_violation`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SampleResult {
    pub sample_id: i64,
    pub result_id: i64,
}

impl SampleResult {
    pub const TABLE: &'static str = schema::SAMPLE_RESULT.name;

    #[instrument(skip(session))]
    pub async fn create(session: &Session, sample_id: i64, result_id: i64) -> Result<Self> {
        execute(
            session,
            "INSERT INTO sampleresult (result_id, sample_id) VALUES (?, ?)",
            vec![SqlValue::from(result_id), SqlValue::from(sample_id)],
        )
        .await?;
        info!("Sample attached to result");
        Ok(Self {
            sample_id,
            result_id,
        })
    }

    pub async fn exists(session: &Session, sample_id: i64, result_id: i64) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sampleresult WHERE result_id = ? AND sample_id = ?",
        )
        .bind(result_id)
        .bind(sample_id)
        .fetch_one(session.pool())
        .await?;
        Ok(count > 0)
    }

    /// Remove the association; returns whether it existed
    #[instrument(skip(self, session))]
    pub async fn delete(self, session: &Session) -> Result<bool> {
        let result = execute(
            session,
            "DELETE FROM sampleresult WHERE result_id = ? AND sample_id = ?",
            vec![SqlValue::from(self.result_id), SqlValue::from(self.sample_id)],
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::entity::{NewPhysicsResult, NewSample};

    #[tokio::test]
    async fn test_create_exists_delete() {
        let session = Session::in_memory().await.unwrap();
        let sample = NewSample::new("s", "/p", "PAT", 1).create(&session).await.unwrap();
        let result = NewPhysicsResult::at("/r").create(&session).await.unwrap();

        assert!(!SampleResult::exists(&session, sample.id, result.id).await.unwrap());
        let link = SampleResult::create(&session, sample.id, result.id).await.unwrap();
        assert!(SampleResult::exists(&session, sample.id, result.id).await.unwrap());

        let duplicate = SampleResult::create(&session, sample.id, result.id).await.unwrap_err();
        assert!(duplicate.is_unique_violation());

        assert!(link.delete(&session).await.unwrap());
        assert!(!link.delete(&session).await.unwrap());
        assert!(!SampleResult::exists(&session, sample.id, result.id).await.unwrap());
    }
}
