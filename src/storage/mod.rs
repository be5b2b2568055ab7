//! SQLite staging layer -- schema, pool, readings round-trip.
//!
//! The labeling core never touches storage; this is the optional
//! database leg of the ingest path.

pub mod schema;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::data::{Observation, SensorTable};

/// Connection pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

/// Open (or create) the SQLite database and return a connection pool.
pub fn open_pool(path: &str) -> Result<Pool> {
    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA temp_store = MEMORY;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = R2D2Pool::new(manager)?;

    // Run migrations on a single connection
    let conn = pool.get()?;
    schema::migrate(&conn)?;

    Ok(pool)
}

/// Replace the staged readings with the given table. Returns the number
/// of rows written.
pub fn seed_readings(pool: &Pool, table: &SensorTable) -> Result<usize> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM readings", [])?;
    tx.execute("DELETE FROM reading_columns", [])?;

    {
        let mut stmt =
            tx.prepare("INSERT INTO reading_columns (name, position) VALUES (?1, ?2)")?;
        for (i, name) in table.feature_columns.iter().enumerate() {
            stmt.execute(params![name, i as i64])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO readings (machine_id, ts, values_json) VALUES (?1, ?2, ?3)",
        )?;
        for row in &table.rows {
            let values_json = serde_json::to_string(&row.values)?;
            stmt.execute(params![row.machine_id, row.timestamp.to_rfc3339(), values_json])?;
        }
    }

    tx.commit().context("failed to commit staged readings")?;
    Ok(table.rows.len())
}

/// Load the staged readings back in insertion order.
pub fn load_readings(pool: &Pool) -> Result<SensorTable> {
    let conn = pool.get()?;

    let mut stmt = conn.prepare("SELECT name FROM reading_columns ORDER BY position ASC")?;
    let feature_columns: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<_, _>>()?;

    let mut stmt =
        conn.prepare("SELECT machine_id, ts, values_json FROM readings ORDER BY id ASC")?;
    let rows_iter = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut rows = Vec::new();
    for r in rows_iter {
        let (machine_id, ts, values_json) = r?;
        let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts)
            .with_context(|| format!("bad timestamp '{ts}' in readings table"))?
            .with_timezone(&Utc);
        let values: Vec<f64> = serde_json::from_str(&values_json)
            .with_context(|| format!("bad values_json for reading at {ts}"))?;
        rows.push(Observation {
            machine_id,
            timestamp,
            values,
        });
    }

    Ok(SensorTable {
        feature_columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_table() -> SensorTable {
        SensorTable {
            feature_columns: vec!["axis_1".to_string(), "axis_2".to_string()],
            rows: (0..5i64)
                .map(|i| Observation {
                    machine_id: format!("robot_{}", i % 2 + 1),
                    timestamp: Utc.timestamp_opt(i * 3600, 0).unwrap(),
                    values: vec![i as f64, i as f64 * 10.0],
                })
                .collect(),
        }
    }

    #[test]
    fn test_seed_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("staging.db");
        let pool = open_pool(db_path.to_str().unwrap()).unwrap();

        let table = sample_table();
        let written = seed_readings(&pool, &table).unwrap();
        assert_eq!(written, 5);

        let loaded = load_readings(&pool).unwrap();
        assert_eq!(loaded.feature_columns, table.feature_columns);
        assert_eq!(loaded.rows, table.rows);
    }

    #[test]
    fn test_reseeding_replaces_previous_stage() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("staging.db");
        let pool = open_pool(db_path.to_str().unwrap()).unwrap();

        seed_readings(&pool, &sample_table()).unwrap();
        let mut smaller = sample_table();
        smaller.rows.truncate(2);
        seed_readings(&pool, &smaller).unwrap();

        let loaded = load_readings(&pool).unwrap();
        assert_eq!(loaded.rows.len(), 2);
    }
}
