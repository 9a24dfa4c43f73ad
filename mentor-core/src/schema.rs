/// DDL for the table tracking the applied schema version.
///
/// Run on every open before the version is read; `IF NOT EXISTS` keeps it
/// idempotent.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 schema.
///
/// `client_state` is a plain key-value table for values that must survive
/// restarts of the client (currently only the user identity). Rows are
/// written once and never updated.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS client_state (
        key         TEXT    PRIMARY KEY,
        value       TEXT    NOT NULL,
        updated_at  INTEGER NOT NULL
    ) STRICT;
";

/// Applies forward-only migrations up to the latest schema version.
///
/// Safe to call on every startup. Each version step runs inside a
/// `BEGIN IMMEDIATE` transaction together with its `schema_version` row.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
