//! Connection bootstrap for the organizer store.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a 5s busy timeout.
//! - Returned connections are at the latest schema version.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the store file at `path` and provisions its schema.
///
/// Logs one `db_open` start event and one ok/error event with the elapsed
/// time.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens a private in-memory store with the schema provisioned.
///
/// Contents vanish when the connection drops.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let outcome = connect()
        .map_err(|err| ("connect", DbError::from(err)))
        .and_then(|mut conn| match prepare(&mut conn) {
            Ok(()) => Ok(conn),
            Err(err) => Err(("provision", err)),
        });

    let elapsed_ms = started.elapsed().as_millis();
    match outcome {
        Ok(conn) => {
            info!("event=db_open module=db status=ok mode={mode} duration_ms={elapsed_ms}");
            Ok(conn)
        }
        Err((stage, err)) => {
            error!(
                "event=db_open module=db status=error mode={mode} stage={stage} duration_ms={elapsed_ms} error={err}"
            );
            Err(err)
        }
    }
}

fn prepare(conn: &mut Connection) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
