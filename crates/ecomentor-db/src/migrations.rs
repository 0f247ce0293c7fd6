use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Every column a `users` row is expected to carry, with the declaration used
/// when it has to be added to an older table.
pub const USER_COLUMNS: &[(&str, &str)] = &[
    ("password", "TEXT NOT NULL DEFAULT ''"),
    ("last_completions", "TEXT NOT NULL DEFAULT '{}'"),
    ("badge", "TEXT NOT NULL DEFAULT 'EcoNovice'"),
    ("co2_saved", "REAL NOT NULL DEFAULT 0"),
    ("last_update", "TEXT"),
    ("co2_goal", "INTEGER NOT NULL DEFAULT 10"),
    ("level", "INTEGER NOT NULL DEFAULT 1"),
    ("xp", "INTEGER NOT NULL DEFAULT 0"),
    ("active_challenge_id", "INTEGER"),
    ("active_challenge_date", "TEXT"),
    ("optional_challenge_id", "INTEGER"),
    ("completed_easy", "INTEGER NOT NULL DEFAULT 0"),
    ("completed_medium", "INTEGER NOT NULL DEFAULT 0"),
    ("completed_hard", "INTEGER NOT NULL DEFAULT 0"),
];

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);

        CREATE TABLE IF NOT EXISTS users (
            name        TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS challenges (
            id          INTEGER PRIMARY KEY,
            title       TEXT NOT NULL,
            ecoImpact   REAL NOT NULL,
            category    TEXT NOT NULL,
            difficulty  TEXT NOT NULL
        );
        ",
    )?;

    let added = backfill_user_columns(conn)?;
    if added > 0 {
        info!("Back-filled {} missing users column(s)", added);
    }

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (normalize legacy users rows)");
        conn.execute_batch(
            "
            UPDATE users SET last_completions = '{}'
                WHERE last_completions IS NULL OR TRIM(last_completions) = '';
            UPDATE users SET co2_saved = 0 WHERE co2_saved IS NULL;
            UPDATE users SET co2_saved = ROUND(co2_saved, 1);
            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

/// Add any expected `users` column the table is missing. Returns how many
/// columns were added.
fn backfill_user_columns(conn: &Connection) -> Result<usize> {
    let existing = table_columns(conn, "users")?;

    let mut added = 0;
    for (name, decl) in USER_COLUMNS {
        if existing.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            continue;
        }
        conn.execute_batch(&format!("ALTER TABLE users ADD COLUMN {} {};", name, decl))?;
        added += 1;
    }
    Ok(added)
}

pub(crate) fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}
