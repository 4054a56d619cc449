//! Census tract rows and queries.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, ErrorCode, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::security::sanitize;
use crate::store::{StoreError, TractStore};

/// Longest accepted tract id (2-digit state + 3-digit county + 6-digit tract).
pub const TRACT_ID_LEN: usize = 11;

const COLUMNS: &str = "census_tract, inclusion_score, growth_score, economy_score, \
                       community_score, median_income, income_group, description";

/// Income bracket a tract is compared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeGroup {
    Low,
    High,
}

impl IncomeGroup {
    pub const ALL: [IncomeGroup; 2] = [IncomeGroup::Low, IncomeGroup::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeGroup::Low => "low",
            IncomeGroup::High => "high",
        }
    }
}

impl fmt::Display for IncomeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown income group '{0}'")]
pub struct ParseIncomeGroupError(String);

impl FromStr for IncomeGroup {
    type Err = ParseIncomeGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(IncomeGroup::Low),
            "high" => Ok(IncomeGroup::High),
            _ => Err(ParseIncomeGroupError(s.to_string())),
        }
    }
}

impl ToSql for IncomeGroup {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for IncomeGroup {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// One census tract with its inclusive-growth scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensusTract {
    pub census_tract: String,
    pub inclusion_score: f64,
    pub growth_score: f64,
    pub economy_score: f64,
    pub community_score: f64,
    pub median_income: f64,
    pub income_group: IncomeGroup,
    #[serde(default)]
    pub description: String,
}

impl CensusTract {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            census_tract: row.get("census_tract")?,
            inclusion_score: row.get("inclusion_score")?,
            growth_score: row.get("growth_score")?,
            economy_score: row.get("economy_score")?,
            community_score: row.get("community_score")?,
            median_income: row.get("median_income")?,
            income_group: row.get("income_group")?,
            description: row.get("description")?,
        })
    }

    /// Sanitize text fields and check bounds. Consumes the raw record.
    fn into_clean(self) -> Result<Self, StoreError> {
        let census_tract = sanitize(self.census_tract.trim());
        if census_tract.is_empty() || census_tract.chars().count() > TRACT_ID_LEN {
            return Err(StoreError::InvalidRecord(format!(
                "census_tract '{census_tract}' must be 1 to {TRACT_ID_LEN} characters"
            )));
        }

        for (name, score) in [
            ("inclusion_score", self.inclusion_score),
            ("growth_score", self.growth_score),
            ("economy_score", self.economy_score),
            ("community_score", self.community_score),
        ] {
            if !(0.0..=100.0).contains(&score) {
                return Err(StoreError::InvalidRecord(format!(
                    "{census_tract}: {name} {score} outside [0, 100]"
                )));
            }
        }

        if !self.median_income.is_finite() || self.median_income < 0.0 {
            return Err(StoreError::InvalidRecord(format!(
                "{census_tract}: median_income {} must be a non-negative number",
                self.median_income
            )));
        }

        Ok(Self {
            census_tract,
            description: sanitize(&self.description),
            ..self
        })
    }
}

/// Average scores of one income group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeGroupSummary {
    pub group: IncomeGroup,
    pub tract_count: u64,
    pub avg_inclusion_score: f64,
    pub avg_growth_score: f64,
}

impl TractStore {
    /// All tracts ordered by id.
    pub fn get_all(&self) -> Result<Vec<CensusTract>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {COLUMNS} FROM census_tracts ORDER BY census_tract"
            ))?;
            let rows = stmt
                .query_map([], CensusTract::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_by_id(&self, census_tract: &str) -> Result<CensusTract, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {COLUMNS} FROM census_tracts WHERE census_tract = ?1"
            ))?;
            match stmt.query_row(params![census_tract], CensusTract::from_row) {
                Ok(tract) => Ok(tract),
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    Err(StoreError::NotFound(census_tract.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Sanitize and write a new tract, returning the row as stored.
    ///
    /// Seeding only; the API never writes.
    pub fn insert(&self, record: CensusTract) -> Result<CensusTract, StoreError> {
        let tract = record.into_clean()?;

        self.with_conn(|conn| {
            let result = conn.execute(
                &format!("INSERT INTO census_tracts ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    tract.census_tract,
                    tract.inclusion_score,
                    tract.growth_score,
                    tract.economy_score,
                    tract.community_score,
                    tract.median_income,
                    tract.income_group,
                    tract.description,
                ],
            );

            match result {
                Ok(_) => {
                    debug!(census_tract = %tract.census_tract, "Inserted census tract");
                    Ok(())
                }
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation
                        && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                {
                    Err(StoreError::DuplicateKey(tract.census_tract.clone()))
                }
                Err(e) => Err(e.into()),
            }
        })?;

        Ok(tract)
    }

    /// Ids currently stored.
    pub fn ids(&self) -> Result<BTreeSet<String>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("SELECT census_tract FROM census_tracts")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<BTreeSet<String>, _>>()?;
            Ok(ids)
        })
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM census_tracts", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    /// Per income group averages. Both groups are always present; an empty
    /// group averages to zero.
    pub fn income_summary(&self) -> Result<Vec<IncomeGroupSummary>, StoreError> {
        let mut summaries: Vec<IncomeGroupSummary> = IncomeGroup::ALL
            .iter()
            .map(|&group| IncomeGroupSummary {
                group,
                tract_count: 0,
                avg_inclusion_score: 0.0,
                avg_growth_score: 0.0,
            })
            .collect();

        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT income_group, COUNT(*), AVG(inclusion_score), AVG(growth_score) \
                 FROM census_tracts GROUP BY income_group",
            )?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let group: IncomeGroup = row.get(0)?;
                let count: i64 = row.get(1)?;
                if let Some(summary) = summaries.iter_mut().find(|s| s.group == group) {
                    summary.tract_count = count as u64;
                    summary.avg_inclusion_score = row.get(2)?;
                    summary.avg_growth_score = row.get(3)?;
                }
            }
            Ok(())
        })?;

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tract(id: &str, inclusion: f64, group: IncomeGroup) -> CensusTract {
        CensusTract {
            census_tract: id.to_string(),
            inclusion_score: inclusion,
            growth_score: 50.0,
            economy_score: 40.0,
            community_score: 60.0,
            median_income: 52_000.0,
            income_group: group,
            description: "Test tract".to_string(),
        }
    }

    #[test]
    fn insert_then_read_back() {
        let store = TractStore::open_in_memory().unwrap();
        store.insert(tract("06037102107", 23.0, IncomeGroup::Low)).unwrap();

        let read = store.get_by_id("06037102107").unwrap();
        assert_eq!(read, tract("06037102107", 23.0, IncomeGroup::Low));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn get_all_orders_by_id() {
        let store = TractStore::open_in_memory().unwrap();
        for id in ["06085511712", "06001400300", "06037102107"] {
            store.insert(tract(id, 50.0, IncomeGroup::High)).unwrap();
        }

        let ids: Vec<String> = store.get_all().unwrap().into_iter().map(|t| t.census_tract).collect();
        assert_eq!(ids, vec!["06001400300", "06037102107", "06085511712"]);
    }

    #[test]
    fn missing_id_is_not_found() {
        let store = TractStore::open_in_memory().unwrap();
        match store.get_by_id("06037123456") {
            Err(StoreError::NotFound(id)) => assert_eq!(id, "06037123456"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = TractStore::open_in_memory().unwrap();
        store.insert(tract("06037102107", 23.0, IncomeGroup::Low)).unwrap();

        let err = store.insert(tract("06037102107", 99.0, IncomeGroup::High)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(id) if id == "06037102107"));
        assert_eq!(store.get_by_id("06037102107").unwrap().inclusion_score, 23.0);
    }

    #[test]
    fn script_in_description_is_stripped_on_insert() {
        let store = TractStore::open_in_memory().unwrap();
        let mut record = tract("06037102107", 23.0, IncomeGroup::Low);
        record.description = "<script>alert(1)</script>Downtown".to_string();

        let stored = store.insert(record).unwrap();
        assert_eq!(stored.description, "Downtown");
        assert!(!store.get_by_id("06037102107").unwrap().description.contains("<script"));
    }

    #[test]
    fn out_of_range_scores_are_invalid() {
        let store = TractStore::open_in_memory().unwrap();

        let too_high = tract("06037102107", 100.5, IncomeGroup::Low);
        assert!(matches!(store.insert(too_high), Err(StoreError::InvalidRecord(_))));

        let mut negative_income = tract("06037102107", 10.0, IncomeGroup::Low);
        negative_income.median_income = -1.0;
        assert!(matches!(store.insert(negative_income), Err(StoreError::InvalidRecord(_))));

        let nan = tract("06037102107", f64::NAN, IncomeGroup::Low);
        assert!(matches!(store.insert(nan), Err(StoreError::InvalidRecord(_))));

        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn overlong_or_empty_ids_are_invalid() {
        let store = TractStore::open_in_memory().unwrap();
        assert!(matches!(
            store.insert(tract("060371021070", 10.0, IncomeGroup::Low)),
            Err(StoreError::InvalidRecord(_))
        ));
        assert!(matches!(
            store.insert(tract("<script></script>", 10.0, IncomeGroup::Low)),
            Err(StoreError::InvalidRecord(_))
        ));
    }

    #[test]
    fn income_summary_reports_both_groups() {
        let store = TractStore::open_in_memory().unwrap();
        store.insert(tract("06037102107", 20.0, IncomeGroup::Low)).unwrap();
        store.insert(tract("06065045117", 30.0, IncomeGroup::Low)).unwrap();

        let summary = store.income_summary().unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].group, IncomeGroup::Low);
        assert_eq!(summary[0].tract_count, 2);
        assert_eq!(summary[0].avg_inclusion_score, 25.0);
        assert_eq!(summary[1].group, IncomeGroup::High);
        assert_eq!(summary[1].tract_count, 0);
        assert_eq!(summary[1].avg_inclusion_score, 0.0);
    }

    #[test]
    fn income_group_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<IncomeGroup>().unwrap(), IncomeGroup::High);
        assert!("middle".parse::<IncomeGroup>().is_err());
    }
}
