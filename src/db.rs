use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::backup::Backup;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{ActivityType, CalculationRecord, NewCalculation};
use crate::store::{CalculationStore, ChangeFeed, ChangeKind, StoreChange};

pub const DB_FILE: &str = "microcalc.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS calculations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    revenue TEXT NOT NULL,
    activity_type TEXT NOT NULL,
    contributions TEXT NOT NULL,
    net_income TEXT NOT NULL,
    period_label TEXT NOT NULL,
    year INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_calculations_year ON calculations(year, timestamp);
";

const COLUMNS: &str =
    "id, timestamp, revenue, activity_type, contributions, net_income, period_label, year";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn decimal_at(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn record_from_row(row: &Row) -> rusqlite::Result<CalculationRecord> {
    let millis: i64 = row.get(1)?;
    let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(1, millis))?;
    let tag: String = row.get(3)?;
    Ok(CalculationRecord {
        id: row.get(0)?,
        timestamp,
        revenue: decimal_at(row, 2)?,
        activity_type: ActivityType::from_tag(&tag),
        contributions: decimal_at(row, 4)?,
        net_income: decimal_at(row, 5)?,
        period_label: row.get(6)?,
        year: row.get(7)?,
    })
}

/// SQLite-backed store. One connection behind a mutex serializes every
/// statement, so concurrent saves never interleave.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::new(),
        })
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        log::debug!("Opening calculation store at {}", db_path.display());
        Self::new(get_connection(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Copy the whole database to `dest` using SQLite's online backup.
    pub fn backup_to(&self, dest: &Path) -> Result<()> {
        let conn = self.conn.lock()?;
        let mut dest_conn = Connection::open(dest)?;
        let backup = Backup::new(&conn, &mut dest_conn)?;
        backup.run_to_completion(100, std::time::Duration::from_millis(10), None)?;
        log::info!("Backed up calculations to {}", dest.display());
        Ok(())
    }

    fn query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<CalculationRecord>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl CalculationStore for SqliteStore {
    fn insert(&self, calc: NewCalculation) -> Result<CalculationRecord> {
        let conn = self.conn.lock()?;
        let revenue = calc.revenue.to_string();
        let contributions = calc.contributions.to_string();
        let net_income = calc.net_income.to_string();
        let millis = calc.timestamp.timestamp_millis();
        let tag = calc.activity_type.as_tag();

        let id = match calc.id {
            Some(id) => {
                conn.execute(
                    &format!("INSERT OR REPLACE INTO calculations ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                    params![id, millis, revenue, tag, contributions, net_income, calc.period_label, calc.year],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO calculations (timestamp, revenue, activity_type, contributions, net_income, period_label, year) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![millis, revenue, tag, contributions, net_income, calc.period_label, calc.year],
                )?;
                conn.last_insert_rowid()
            }
        };

        self.feed.publish(ChangeKind::Inserted(id));
        log::debug!("Inserted calculation {id}");
        Ok(calc.with_id(id))
    }

    fn list_all(&self) -> Result<Vec<CalculationRecord>> {
        self.query(
            &format!("SELECT {COLUMNS} FROM calculations ORDER BY timestamp DESC, id DESC"),
            &[],
        )
    }

    fn list_by_year(&self, year: i32) -> Result<Vec<CalculationRecord>> {
        self.query(
            &format!("SELECT {COLUMNS} FROM calculations WHERE year = ?1 ORDER BY timestamp DESC, id DESC"),
            &[&year],
        )
    }

    fn get_by_id(&self, id: i64) -> Result<Option<CalculationRecord>> {
        let conn = self.conn.lock()?;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM calculations WHERE id = ?1"),
                [id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn delete_by_id(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock()?;
        let removed = conn.execute("DELETE FROM calculations WHERE id = ?1", [id])? > 0;
        if removed {
            self.feed.publish(ChangeKind::Deleted(id));
            log::debug!("Deleted calculation {id}");
        }
        Ok(removed)
    }

    fn delete_all(&self) -> Result<usize> {
        let conn = self.conn.lock()?;
        let removed = conn.execute("DELETE FROM calculations", [])?;
        if removed > 0 {
            self.feed.publish(ChangeKind::Cleared);
        }
        log::info!("Cleared {removed} calculation(s)");
        Ok(removed)
    }

    fn subscribe(&self) -> Receiver<StoreChange> {
        self.feed.subscribe()
    }

    fn version(&self) -> u64 {
        self.feed.version()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn calc(revenue: Decimal, activity: ActivityType, year: i32, month: u32) -> NewCalculation {
        let at = Utc.with_ymd_and_hms(year, month, 10, 8, 0, 0).unwrap();
        NewCalculation::compute(revenue, activity, false, &at)
    }

    #[test]
    fn test_init_db_creates_table() {
        let (_dir, store) = test_store();
        let conn = store.conn.lock().unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(tables, vec!["calculations".to_string()]);
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, store) = test_store();
        init_db(&store.conn.lock().unwrap()).unwrap();
    }

    #[test]
    fn test_round_trip_keeps_exact_decimals() {
        let (_dir, store) = test_store();
        let input = calc(dec!(1234.56), ActivityType::LiberalProfession, 2024, 2);
        let saved = store.insert(input.clone()).unwrap();
        let fetched = store.get_by_id(saved.id).unwrap().unwrap();
        assert_eq!(fetched, input.with_id(saved.id));
        assert_eq!(fetched.contributions, dec!(271.6032));
        assert_eq!(fetched.period_label, "Février 2024");
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(calc(dec!(500), ActivityType::Sales, 2024, 4)).unwrap().id
        };
        let store = SqliteStore::open(&path).unwrap();
        let fetched = store.get_by_id(id).unwrap().unwrap();
        assert_eq!(fetched.revenue, dec!(500));
        assert_eq!(fetched.activity_type, ActivityType::Sales);
    }

    #[test]
    fn test_list_by_year_filters_and_orders() {
        let (_dir, store) = test_store();
        let older = store.insert(calc(dec!(100), ActivityType::Services, 2024, 1)).unwrap();
        store.insert(calc(dec!(200), ActivityType::Services, 2023, 11)).unwrap();
        let newer = store.insert(calc(dec!(300), ActivityType::Services, 2024, 6)).unwrap();

        let year: Vec<i64> = store.list_by_year(2024).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(year, vec![newer.id, older.id]);

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_unknown_tag_reads_as_services() {
        let (_dir, store) = test_store();
        let saved = store.insert(calc(dec!(10), ActivityType::Sales, 2024, 1)).unwrap();
        store
            .conn
            .lock()
            .unwrap()
            .execute("UPDATE calculations SET activity_type = 'artisanat' WHERE id = ?1", [saved.id])
            .unwrap();
        let fetched = store.get_by_id(saved.id).unwrap().unwrap();
        assert_eq!(fetched.activity_type, ActivityType::Services);
    }

    #[test]
    fn test_corrupt_decimal_is_a_storage_error() {
        let (_dir, store) = test_store();
        let saved = store.insert(calc(dec!(10), ActivityType::Sales, 2024, 1)).unwrap();
        store
            .conn
            .lock()
            .unwrap()
            .execute("UPDATE calculations SET revenue = 'abc' WHERE id = ?1", [saved.id])
            .unwrap();
        let err = store.list_all().unwrap_err();
        assert!(matches!(err, crate::error::MicrocalcError::Storage(_)));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let (_dir, store) = test_store();
        assert!(!store.delete_by_id(99).unwrap());
        assert_eq!(store.get_by_id(99).unwrap(), None);
    }

    #[test]
    fn test_delete_one_and_all() {
        let (_dir, store) = test_store();
        let a = store.insert(calc(dec!(1), ActivityType::Sales, 2024, 1)).unwrap();
        store.insert(calc(dec!(2), ActivityType::Sales, 2024, 2)).unwrap();
        assert!(store.delete_by_id(a.id).unwrap());
        assert_eq!(store.list_all().unwrap().len(), 1);
        assert_eq!(store.delete_all().unwrap(), 1);
        assert_eq!(store.delete_all().unwrap(), 0);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let (_dir, store) = test_store();
        let a = store.insert(calc(dec!(1), ActivityType::Sales, 2024, 1)).unwrap();
        store.delete_all().unwrap();
        let b = store.insert(calc(dec!(1), ActivityType::Sales, 2024, 1)).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_explicit_id_replaces_row() {
        let (_dir, store) = test_store();
        let a = store.insert(calc(dec!(1), ActivityType::Sales, 2024, 1)).unwrap();
        let mut again = calc(dec!(2), ActivityType::Services, 2024, 3);
        again.id = Some(a.id);
        store.insert(again).unwrap();
        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].revenue, dec!(2));
    }

    #[test]
    fn test_concurrent_inserts_and_notifications() {
        let (_dir, store) = test_store();
        let store = Arc::new(store);
        let rx = store.subscribe();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..10 {
                        store
                            .insert(calc(Decimal::from(i * 10 + j + 1), ActivityType::Sales, 2024, 5))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.list_all().unwrap().len(), 40);
        let versions: Vec<u64> = rx.try_iter().map(|c| c.version).collect();
        assert_eq!(versions, (1..=40).collect::<Vec<u64>>());
        assert_eq!(store.version(), 40);
    }

    #[test]
    fn test_backup_copies_records() {
        let (dir, store) = test_store();
        store.insert(calc(dec!(42), ActivityType::Sales, 2024, 1)).unwrap();
        let dest = dir.path().join("backup.db");
        store.backup_to(&dest).unwrap();
        let copy = SqliteStore::open(&dest).unwrap();
        assert_eq!(copy.list_all().unwrap().len(), 1);
    }
}
