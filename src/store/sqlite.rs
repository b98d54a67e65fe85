//! SQLite-backed route store.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, Row};
use serenity::model::id::ChannelId;
use tracing::info;

use crate::common::{StoreError, StoreResult};
use crate::store::{migrations, Route, RouteStore, UpsertOutcome};

pub struct SqliteRouteStore {
    conn: Mutex<Connection>,
}

impl SqliteRouteStore {
    /// Open (or create) the database at `path`. `":memory:"` opens a
    /// private in-memory database.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        migrations::run(&conn)?;

        info!("Route database opened at {} (journal mode {})", path.display(), mode);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }

    fn query_routes(conn: &Connection, sql: &str) -> StoreResult<Vec<Route>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(source, target)| to_route(&source, target.as_deref()))
            .collect()
    }
}

impl RouteStore for SqliteRouteStore {
    fn get(&self, source: ChannelId) -> StoreResult<Option<Route>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT source_channel, target_channel FROM sources WHERE source_channel = ?1",
                    [source.to_string()],
                    read_row,
                )
                .optional()?;

            row.map(|(source, target)| to_route(&source, target.as_deref()))
                .transpose()
        })
    }

    fn list(&self) -> StoreResult<Vec<Route>> {
        self.with_conn(|conn| {
            Self::query_routes(
                conn,
                "SELECT source_channel, target_channel FROM sources ORDER BY id",
            )
        })
    }

    fn list_paired(&self) -> StoreResult<Vec<Route>> {
        self.with_conn(|conn| {
            Self::query_routes(
                conn,
                "SELECT source_channel, target_channel FROM sources
                 WHERE target_channel IS NOT NULL ORDER BY id",
            )
        })
    }

    fn upsert_source(&self, source: ChannelId) -> StoreResult<UpsertOutcome> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO sources (source_channel) VALUES (?1)",
                [source.to_string()],
            )?;

            Ok(if inserted == 0 {
                UpsertOutcome::AlreadyExists
            } else {
                UpsertOutcome::Created
            })
        })
    }

    fn set_target(&self, source: ChannelId, target: ChannelId) -> StoreResult<()> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE sources SET target_channel = ?1 WHERE source_channel = ?2",
                [target.to_string(), source.to_string()],
            )?;

            if updated == 0 {
                return Err(StoreError::UnknownSource { source_id: source });
            }
            Ok(())
        })
    }

    fn remove(&self, source: ChannelId) -> StoreResult<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM sources WHERE source_channel = ?1",
                [source.to_string()],
            )?;

            if deleted == 0 {
                return Err(StoreError::UnknownSource { source_id: source });
            }
            Ok(())
        })
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<(String, Option<String>)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn to_route(source: &str, target: Option<&str>) -> StoreResult<Route> {
    Ok(Route {
        source: parse_channel_id(source)?,
        target: target.map(parse_channel_id).transpose()?,
    })
}

fn parse_channel_id(value: &str) -> StoreResult<ChannelId> {
    match value.trim().parse::<u64>() {
        Ok(id) if id != 0 => Ok(ChannelId::new(id)),
        _ => Err(StoreError::CorruptId {
            value: value.to_string(),
        }),
    }
}
