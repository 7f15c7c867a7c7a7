use logflux_db::{LogStoreClient, StoreError};

/// Enumerates known project ids without a dependency on the Identity DB
/// (account/project CRUD is an external collaborator, out of scope here).
/// `log_locations` is the one base table every persisted log touches
/// regardless of which monthly partition it landed in, so a `DISTINCT`
/// scan over it is the cheapest available stand-in for a project
/// registry. A project with zero persisted logs is invisible to this
/// worker — acceptable, since there is nothing yet to aggregate for it.
pub async fn list(db: &LogStoreClient) -> Result<Vec<String>, StoreError> {
    let conn = db.connection()?;
    let mut rows = conn
        .query("SELECT DISTINCT project_id FROM log_locations", ())
        .await
        .map_err(StoreError::Query)?;

    let mut project_ids = Vec::new();
    while let Some(row) = rows.next().await.map_err(StoreError::Query)? {
        project_ids.push(row.get(0).map_err(|e| StoreError::Mapping(e.to_string()))?);
    }
    Ok(project_ids)
}
