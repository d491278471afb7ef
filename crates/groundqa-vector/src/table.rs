//! LanceDB connection and housekeeping helpers.

use anyhow::{Context, Result};
use lancedb::{connect, Connection};
use std::path::Path;

pub async fn open_db(path: &Path) -> Result<Connection> {
    Ok(connect(path.to_string_lossy().as_ref()).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

/// Delete the whole index directory so the next ingestion starts fresh.
pub fn remove_index_dir(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(path).with_context(|| format!("failed to remove index at {}", path.display()))?;
    tracing::info!(path = %path.display(), "removed existing index");
    Ok(true)
}
