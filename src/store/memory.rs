use std::sync::mpsc::Receiver;
use std::sync::RwLock;

use crate::error::{MicrocalcError, Result};
use crate::models::{CalculationRecord, NewCalculation};
use crate::store::{CalculationStore, ChangeFeed, ChangeKind, StoreChange};

/// Non-persistent store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    feed: ChangeFeed,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    records: Vec<CalculationRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(records: &mut [CalculationRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

impl CalculationStore for MemoryStore {
    fn insert(&self, calc: NewCalculation) -> Result<CalculationRecord> {
        let mut state = self.state.write()?;
        let id = match calc.id {
            Some(id) => {
                state.records.retain(|r| r.id != id);
                id
            }
            None => state
                .next_id
                .checked_add(1)
                .ok_or(MicrocalcError::IdsExhausted)?,
        };
        state.next_id = state.next_id.max(id);
        let record = calc.with_id(id);
        state.records.push(record.clone());
        self.feed.publish(ChangeKind::Inserted(id));
        log::debug!("Inserted calculation {id}");
        Ok(record)
    }

    fn list_all(&self) -> Result<Vec<CalculationRecord>> {
        let mut records = self.state.read()?.records.clone();
        newest_first(&mut records);
        Ok(records)
    }

    fn list_by_year(&self, year: i32) -> Result<Vec<CalculationRecord>> {
        let mut records: Vec<CalculationRecord> = self
            .state
            .read()?
            .records
            .iter()
            .filter(|r| r.year == year)
            .cloned()
            .collect();
        newest_first(&mut records);
        Ok(records)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<CalculationRecord>> {
        Ok(self.state.read()?.records.iter().find(|r| r.id == id).cloned())
    }

    fn delete_by_id(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write()?;
        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        let removed = state.records.len() < before;
        if removed {
            self.feed.publish(ChangeKind::Deleted(id));
            log::debug!("Deleted calculation {id}");
        }
        Ok(removed)
    }

    fn delete_all(&self) -> Result<usize> {
        let mut state = self.state.write()?;
        let removed = state.records.len();
        state.records.clear();
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

    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::ActivityType;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
    }

    fn calc(revenue: Decimal, when: DateTime<Utc>) -> NewCalculation {
        NewCalculation::compute(revenue, ActivityType::Sales, false, &when)
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.insert(calc(dec!(100), at(2024, 1, 1))).unwrap();
        let b = store.insert(calc(dec!(100), at(2024, 1, 1))).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_round_trip() {
        let store = MemoryStore::new();
        let input = calc(dec!(1234.56), at(2024, 5, 2));
        let saved = store.insert(input.clone()).unwrap();
        let fetched = store.get_by_id(saved.id).unwrap().unwrap();
        assert_eq!(fetched, input.with_id(saved.id));
    }

    #[test]
    fn test_explicit_id_replaces() {
        let store = MemoryStore::new();
        let first = store.insert(calc(dec!(100), at(2024, 1, 1))).unwrap();
        let mut replacement = calc(dec!(200), at(2024, 1, 2));
        replacement.id = Some(first.id);
        store.insert(replacement).unwrap();
        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].revenue, dec!(200));

        let next = store.insert(calc(dec!(1), at(2024, 1, 3))).unwrap();
        assert!(next.id > first.id);
    }

    #[test]
    fn test_id_exhaustion_is_an_error() {
        let store = MemoryStore::new();
        let mut last = calc(dec!(1), at(2024, 1, 1));
        last.id = Some(i64::MAX);
        store.insert(last).unwrap();
        let err = store.insert(calc(dec!(2), at(2024, 1, 2))).unwrap_err();
        assert!(matches!(err, MicrocalcError::IdsExhausted));
        assert_eq!(store.list_all().unwrap().len(), 1);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_list_by_year_newest_first() {
        let store = MemoryStore::new();
        store.insert(calc(dec!(1), at(2023, 12, 31))).unwrap();
        let jan = store.insert(calc(dec!(2), at(2024, 1, 15))).unwrap();
        let mar = store.insert(calc(dec!(3), at(2024, 3, 15))).unwrap();

        let ids: Vec<i64> = store.list_by_year(2024).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![mar.id, jan.id]);
        assert_eq!(store.list_by_year(2023).unwrap().len(), 1);
        assert!(store.list_by_year(2022).unwrap().is_empty());
    }

    #[test]
    fn test_missing_id() {
        let store = MemoryStore::new();
        assert_eq!(store.get_by_id(42).unwrap(), None);
        assert!(!store.delete_by_id(42).unwrap());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_delete_all_is_idempotent() {
        let store = MemoryStore::new();
        store.insert(calc(dec!(1), at(2024, 1, 1))).unwrap();
        assert_eq!(store.delete_all().unwrap(), 1);
        assert_eq!(store.delete_all().unwrap(), 0);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_subscriber_sees_changes_in_order() {
        let store = MemoryStore::new();
        let rx = store.subscribe();
        let rec = store.insert(calc(dec!(1), at(2024, 1, 1))).unwrap();
        store.insert(calc(dec!(2), at(2024, 1, 2))).unwrap();
        store.delete_by_id(rec.id).unwrap();
        store.delete_all().unwrap();
        store.delete_all().unwrap();
        let kinds: Vec<ChangeKind> = rx.try_iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Inserted(rec.id),
                ChangeKind::Inserted(rec.id + 1),
                ChangeKind::Deleted(rec.id),
                ChangeKind::Cleared,
            ]
        );
    }

    #[test]
    fn test_concurrent_inserts_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let rx = store.subscribe();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..25 {
                        store
                            .insert(calc(Decimal::from(i * 100 + j + 1), at(2024, 1, 1)))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 200);
        let mut ids: Vec<i64> = all.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);

        let versions: Vec<u64> = rx.try_iter().map(|c| c.version).collect();
        assert_eq!(versions, (1..=200).collect::<Vec<u64>>());
    }
}
