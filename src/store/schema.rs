//! Table definitions.

use rusqlite::Connection;

use crate::store::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS census_tracts (
    census_tract    TEXT PRIMARY KEY NOT NULL,
    inclusion_score REAL NOT NULL CHECK (inclusion_score BETWEEN 0 AND 100),
    growth_score    REAL NOT NULL CHECK (growth_score BETWEEN 0 AND 100),
    economy_score   REAL NOT NULL CHECK (economy_score BETWEEN 0 AND 100),
    community_score REAL NOT NULL CHECK (community_score BETWEEN 0 AND 100),
    median_income   REAL NOT NULL CHECK (median_income >= 0),
    income_group    TEXT NOT NULL CHECK (income_group IN ('low', 'high')),
    description     TEXT NOT NULL DEFAULT ''
);
"#;

/// Create tables if they do not exist yet.
pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
