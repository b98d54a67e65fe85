use rusqlite::Connection;
use tracing::{info, warn};

use crate::common::StoreResult;

/// Create the routing table.
///
/// Column names and types match databases written by earlier versions of the
/// bot, so an existing `forwarding.db` keeps working.
pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sources (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            source_channel  TEXT NOT NULL,
            target_channel  TEXT
        );
        ",
    )?;

    let dropped = dedupe_sources(conn)?;
    if dropped > 0 {
        warn!("Dropped {} duplicate source rows", dropped);
    }

    conn.execute_batch(
        "
        CREATE UNIQUE INDEX IF NOT EXISTS idx_sources_source_channel
            ON sources(source_channel);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

/// Keep one row per source channel: a paired row over an unpaired one, then
/// the newest.
///
/// Older databases had no unique index and could hold duplicates.
fn dedupe_sources(conn: &Connection) -> StoreResult<usize> {
    let dropped = conn.execute(
        "
        DELETE FROM sources
        WHERE EXISTS (
            SELECT 1 FROM sources AS keep
            WHERE keep.source_channel = sources.source_channel
              AND keep.id <> sources.id
              AND (
                  (keep.target_channel IS NOT NULL AND sources.target_channel IS NULL)
                  OR ((keep.target_channel IS NULL) = (sources.target_channel IS NULL)
                      AND keep.id > sources.id)
              )
        )
        ",
        [],
    )?;
    Ok(dropped)
}
