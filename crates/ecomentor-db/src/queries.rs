use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use tracing::{info, warn};

use ecomentor_engine::profile::DEFAULT_CO2_GOAL;
use ecomentor_engine::{
    Challenge, CompletionHistory, DailyAssignment, Difficulty, Repository, UserProfile,
};

use crate::Database;
use crate::coerce;

const DATE_FORMAT: &str = "%Y-%m-%d";

impl Database {
    // -- Challenges --

    pub fn upsert_challenge(&self, challenge: &Challenge) -> Result<()> {
        self.with_conn(|conn| write_challenge(conn, challenge))
    }

    /// Load a JSON catalog (array of challenge objects) into the store.
    /// A missing file counts as an empty catalog; rows that cannot be read are
    /// skipped. Returns the number of rows written.
    pub fn import_catalog(&self, path: &Path) -> Result<usize> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Catalog file {} not found, nothing imported", path.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let rows: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .with_context(|| format!("catalog file {} is not a JSON array", path.display()))?;

        let challenges: Vec<Challenge> = rows
            .iter()
            .filter_map(|row| {
                let field = |key: &str| row.get(key).map(coerce::from_json).unwrap_or(Value::Null);
                challenge_from_cells(
                    field("id"),
                    field("title"),
                    field("ecoImpact"),
                    field("category"),
                    field("difficulty"),
                )
            })
            .collect();

        self.with_conn(|conn| {
            for challenge in &challenges {
                write_challenge(conn, challenge)?;
            }
            Ok(())
        })?;

        info!(
            "Imported {} of {} challenges from {}",
            challenges.len(),
            rows.len(),
            path.display()
        );
        Ok(challenges.len())
    }

    // -- Users --

    /// Insert a new user unless the name is taken. The check and the insert
    /// run in one immediate transaction. Returns false when the name exists.
    pub fn create_user(&self, user: &UserProfile) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
            let taken: i64 = tx.query_row(
                "SELECT COUNT(*) FROM users WHERE name = ?1",
                [&user.name],
                |r| r.get(0),
            )?;
            if taken > 0 {
                return Ok(false);
            }
            write_user(&tx, user)?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn user_exists(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM users WHERE name = ?1", [name], |r| r.get(0))?;
            Ok(count > 0)
        })
    }
}

impl Repository for Database {
    fn get_user(&self, name: &str) -> Result<Option<UserProfile>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users WHERE name = ?1")?;
            let mut rows = stmt.query([name])?;
            match rows.next()? {
                Some(row) => Ok(Some(user_from_row(row)?)),
                None => Ok(None),
            }
        })
    }

    fn upsert_user(&self, user: &UserProfile) -> Result<()> {
        self.with_conn(|conn| write_user(conn, user))
    }

    fn delete_user(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM users WHERE name = ?1", [name])?;
            Ok(removed > 0)
        })
    }

    fn list_challenges(&self) -> Result<Vec<Challenge>> {
        self.with_conn(query_challenges)
    }
}

fn user_from_row(row: &Row<'_>) -> Result<UserProfile> {
    let cell = |col: &str| -> Result<Value> { Ok(row.get::<_, Value>(col)?) };

    let name = coerce::text(&cell("name")?).unwrap_or_default();
    let history = coerce::text(&cell("last_completions")?)
        .map(|raw| CompletionHistory::from_json_lenient(&raw))
        .unwrap_or_default();

    let active_id = coerce::id_ref(&cell("active_challenge_id")?);
    let active_date = coerce::date(&cell("active_challenge_date")?);
    let assignment = match (active_id, active_date) {
        (Some(daily), Some(date)) => Some(DailyAssignment {
            date,
            daily,
            optional: coerce::id_ref(&cell("optional_challenge_id")?),
        }),
        _ => None,
    };

    let co2_saved = coerce::real(&cell("co2_saved")?)
        .filter(|v| *v >= 0.0)
        .map(|v| (v * 10.0).round() / 10.0)
        .unwrap_or(0.0);

    Ok(UserProfile {
        password_hash: coerce::text(&cell("password")?).unwrap_or_default(),
        xp: coerce::count(&cell("xp")?, 0u64),
        level: coerce::count(&cell("level")?, 1u32).max(1),
        co2_saved,
        co2_goal: coerce::count(&cell("co2_goal")?, DEFAULT_CO2_GOAL).max(1),
        completed_easy: coerce::count(&cell("completed_easy")?, 0u32),
        completed_medium: coerce::count(&cell("completed_medium")?, 0u32),
        completed_hard: coerce::count(&cell("completed_hard")?, 0u32),
        history,
        assignment,
        last_update: coerce::date(&cell("last_update")?),
        name,
    })
}

/// Whole-row overwrite keyed by name; inserts when the row does not exist yet.
fn write_user(conn: &Connection, user: &UserProfile) -> Result<()> {
    let co2_saved = (user.co2_saved * 10.0).round() / 10.0;
    let xp = i64::try_from(user.xp).context("xp out of range")?;
    let assignment = user.assignment;
    let active_id = assignment.map(|a| a.daily);
    let active_date = assignment.map(|a| a.date.format(DATE_FORMAT).to_string());
    let optional_id = assignment.and_then(|a| a.optional);
    let last_update = user.last_update.map(|d| d.format(DATE_FORMAT).to_string());
    let badge = user.badge().to_string();
    let history = user.history.to_json();

    let params = rusqlite::params![
        &user.name,
        &user.password_hash,
        &history,
        &badge,
        co2_saved,
        &last_update,
        user.co2_goal,
        user.level,
        xp,
        active_id,
        &active_date,
        optional_id,
        user.completed_easy,
        user.completed_medium,
        user.completed_hard,
    ];

    let updated = conn.execute(
        "UPDATE users SET
            password = ?2, last_completions = ?3, badge = ?4, co2_saved = ?5,
            last_update = ?6, co2_goal = ?7, level = ?8, xp = ?9,
            active_challenge_id = ?10, active_challenge_date = ?11, optional_challenge_id = ?12,
            completed_easy = ?13, completed_medium = ?14, completed_hard = ?15
         WHERE name = ?1",
        params,
    )?;

    if updated == 0 {
        conn.execute(
            "INSERT INTO users (
                name, password, last_completions, badge, co2_saved,
                last_update, co2_goal, level, xp,
                active_challenge_id, active_challenge_date, optional_challenge_id,
                completed_easy, completed_medium, completed_hard
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params,
        )?;
    }

    Ok(())
}

fn write_challenge(conn: &Connection, challenge: &Challenge) -> Result<()> {
    let params = rusqlite::params![
        challenge.id,
        &challenge.title,
        challenge.eco_impact,
        &challenge.category,
        challenge.difficulty.as_str(),
    ];

    let updated = conn.execute(
        "UPDATE challenges SET title = ?2, ecoImpact = ?3, category = ?4, difficulty = ?5
         WHERE id = ?1",
        params,
    )?;
    if updated == 0 {
        conn.execute(
            "INSERT INTO challenges (id, title, ecoImpact, category, difficulty)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params,
        )?;
    }
    Ok(())
}

/// Read the catalog, skipping rows that cannot be interpreted.
fn query_challenges(conn: &Connection) -> Result<Vec<Challenge>> {
    let mut stmt =
        conn.prepare("SELECT id, title, ecoImpact, category, difficulty FROM challenges ORDER BY id")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, Value>(0)?,
                row.get::<_, Value>(1)?,
                row.get::<_, Value>(2)?,
                row.get::<_, Value>(3)?,
                row.get::<_, Value>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .filter_map(|(id, title, impact, category, difficulty)| {
            challenge_from_cells(id, title, impact, category, difficulty)
        })
        .collect())
}

/// Interpret one catalog row. `None` (with a warning) when the id, difficulty
/// or impact cannot be read.
fn challenge_from_cells(
    id: Value,
    title: Value,
    impact: Value,
    category: Value,
    difficulty: Value,
) -> Option<Challenge> {
    let Some(id) = coerce::id_ref(&id) else {
        warn!("Skipping challenge row with invalid id {:?}", id);
        return None;
    };
    let difficulty = match coerce::text(&difficulty).map(|d| d.parse::<Difficulty>()) {
        Some(Ok(d)) => d,
        _ => {
            warn!("Skipping challenge {} with unknown difficulty {:?}", id, difficulty);
            return None;
        }
    };
    let Some(eco_impact) = coerce::real(&impact).filter(|v| *v > 0.0) else {
        warn!("Skipping challenge {} with invalid ecoImpact {:?}", id, impact);
        return None;
    };

    Some(Challenge {
        id,
        title: coerce::text(&title).unwrap_or_default(),
        category: coerce::text(&category).unwrap_or_default(),
        eco_impact,
        difficulty,
    })
}
