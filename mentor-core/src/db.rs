use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

/// Opens (or creates) the client-state database at `path`, configures WAL mode,
/// and applies schema migrations.
///
/// `busy_timeout` is set through the `Connection` method rather than a PRAGMA
/// string so it takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL
/// configuration fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Reads the value stored under `key`, or `None` if the key was never written.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn get_value(
    conn: &Connection,
    key: &str,
) -> Result<Option<String>, tokio_rusqlite::Error> {
    let key = key.to_owned();

    conn.call(move |db| {
        let value = db
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                rusqlite::params![&key],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok::<_, rusqlite::Error>(value)
    })
    .await
}

/// Stores `value` under `key` unless the key already holds a value.
///
/// Returns whichever value is stored after the call. When two clients race to
/// create the same key, both observe the winner's value.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the `BEGIN IMMEDIATE` transaction fails.
pub async fn put_value_if_absent(
    conn: &Connection,
    key: &str,
    value: &str,
) -> Result<String, tokio_rusqlite::Error> {
    let key = key.to_owned();
    let value = value.to_owned();

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO client_state (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO NOTHING",
            rusqlite::params![&key, &value, now_secs()],
        )?;
        let stored: String = tx.query_row(
            "SELECT value FROM client_state WHERE key = ?1",
            rusqlite::params![&key],
            |r| r.get(0),
        )?;
        tx.commit()?;
        Ok::<_, rusqlite::Error>(stored)
    })
    .await
}
