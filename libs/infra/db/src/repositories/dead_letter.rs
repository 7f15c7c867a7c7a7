use chrono::Utc;
use libsql::params;
use tracing::instrument;

use crate::client::LogStoreClient;
use crate::errors::StoreError;

/// Last-resort sink for log rows the storage worker could not persist
/// even after retrying individually (e.g. a constraint violation the
/// partition schema can't relax). Nothing reads this table back into the
/// hot path; it exists purely so an acknowledged queue item is never
/// silently lost.
pub struct DeadLetterRepository {
    client: LogStoreClient,
}

impl DeadLetterRepository {
    pub fn new(client: LogStoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, raw_payload))]
    pub async fn record(&self, project_id: Option<&str>, reason: &str, raw_payload: &[u8]) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "INSERT INTO dead_letter_logs (project_id, reason, raw_payload, failed_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                project_id.map(str::to_string),
                reason.to_string(),
                raw_payload.to_vec(),
                Utc::now().to_rfc3339()
            ],
        )
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }
}
