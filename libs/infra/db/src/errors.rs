use thiserror::Error;

/// Error catalog for the log store. Each variant carries a bracketed code
/// so operators can grep logs for a specific failure class without
/// parsing the message body.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("[STORE_NET_FAULT]: database link unavailable -> {0}")]
    Connection(String),

    #[error("[STORE_CONFIG_FAULT]: store misconfigured -> {0}")]
    Configuration(String),

    #[error("[STORE_QUERY_FAULT]: query rejected -> {0}")]
    Query(#[from] libsql::Error),

    #[error("[STORE_MAPPING_FAULT]: row did not map to the expected shape -> {0}")]
    Mapping(String),

    #[error("[STORE_NOT_FOUND]: no row matched the requested identifier")]
    NotFound,

    #[error("[STORE_INTEGRITY_FAULT]: row failed a constraint and was routed to the dead letter table -> {0}")]
    Integrity(String),
}
