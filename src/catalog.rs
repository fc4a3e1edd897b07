//! In-memory satellite catalog
//!
//! Keys are issued in ascending order and never reused, so iteration in key
//! order is load order. Records are validated before any mutation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::sgp4::Sgp4;
use crate::tle::ElementRecord;

/// Opaque handle for a loaded satellite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SatKey(u64);

impl SatKey {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for SatKey {
    fn from(value: u64) -> Self {
        SatKey(value)
    }
}

impl fmt::Display for SatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    record: ElementRecord,
    sgp4: Option<Arc<Sgp4>>,
}

#[derive(Debug)]
struct Inner {
    next_key: u64,
    entries: BTreeMap<SatKey, Entry>,
    by_id: HashMap<u32, SatKey>,
}

/// Loaded element sets plus their initialized propagator state.
#[derive(Debug)]
pub struct Catalog {
    inner: RwLock<Inner>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_key: 1,
                entries: BTreeMap::new(),
                by_id: HashMap::new(),
            }),
        }
    }

    // Every critical section leaves both maps consistent, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a copy of `record` under a fresh key.
    pub fn insert(&self, record: &ElementRecord) -> Result<SatKey> {
        self.insert_with(record, |_| Ok(None))
    }

    /// Insert that runs `init` after all checks and commits only if it succeeds.
    pub(crate) fn insert_with<F>(&self, record: &ElementRecord, init: F) -> Result<SatKey>
    where
        F: FnOnce(&ElementRecord) -> Result<Option<Arc<Sgp4>>>,
    {
        record.validate_identity()?;
        let mut inner = self.write();
        if inner.by_id.contains_key(&record.satellite_id()) {
            return Err(Error::DuplicateKey {
                satellite_id: record.satellite_id(),
            });
        }
        record.validate_elements()?;
        let sgp4 = init(record)?;

        let key = SatKey(inner.next_key);
        inner.next_key += 1;
        inner.by_id.insert(record.satellite_id(), key);
        inner.entries.insert(
            key,
            Entry {
                record: record.clone(),
                sgp4,
            },
        );
        debug!(%key, satellite_id = record.satellite_id(), "inserted satellite");
        Ok(key)
    }

    /// Replaces the record under a live key. Initialized coefficients are kept.
    pub fn update(&self, key: SatKey, record: &ElementRecord) -> Result<()> {
        record.validate()?;
        let mut inner = self.write();
        let Some(previous_id) = inner.entries.get(&key).map(|e| e.record.satellite_id()) else {
            return Ok(());
        };
        let new_id = record.satellite_id();
        if new_id != previous_id {
            if inner.by_id.contains_key(&new_id) {
                return Err(Error::DuplicateKey { satellite_id: new_id });
            }
            inner.by_id.remove(&previous_id);
            inner.by_id.insert(new_id, key);
        }
        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.record = record.clone();
        }
        Ok(())
    }

    /// Removing a dead key is a no-op.
    pub fn remove(&self, key: SatKey) {
        let mut inner = self.write();
        if let Some(entry) = inner.entries.remove(&key) {
            inner.by_id.remove(&entry.record.satellite_id());
            debug!(%key, "removed satellite");
        }
    }

    pub fn count(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    pub fn list_keys(&self) -> Vec<SatKey> {
        self.read().entries.keys().copied().collect()
    }

    pub fn contains(&self, key: SatKey) -> bool {
        self.read().entries.contains_key(&key)
    }

    pub fn get(&self, key: SatKey) -> Result<ElementRecord> {
        self.read()
            .entries
            .get(&key)
            .map(|entry| entry.record.clone())
            .ok_or(Error::BadKey { key })
    }

    pub fn key_of(&self, satellite_id: u32) -> Option<SatKey> {
        self.read().by_id.get(&satellite_id).copied()
    }

    pub(crate) fn coefficients(&self, key: SatKey) -> Result<(ElementRecord, Option<Arc<Sgp4>>)> {
        self.read()
            .entries
            .get(&key)
            .map(|entry| (entry.record.clone(), entry.sgp4.clone()))
            .ok_or(Error::BadKey { key })
    }

    /// Attaches coefficients to a live key unless another caller got there first.
    pub(crate) fn store_coefficients(&self, key: SatKey, sgp4: Arc<Sgp4>) -> Arc<Sgp4> {
        let mut inner = self.write();
        match inner.entries.get_mut(&key) {
            Some(entry) => entry.sgp4.get_or_insert(sgp4).clone(),
            None => sgp4,
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<(SatKey, ElementRecord, Option<Arc<Sgp4>>)> {
        self.read()
            .entries
            .iter()
            .map(|(key, entry)| (*key, entry.record.clone(), entry.sgp4.clone()))
            .collect()
    }

    /// Writes every record as a TLE line pair, in key order.
    pub fn write_catalog<W: Write>(&self, writer: &mut W) -> Result<()> {
        let records: Vec<ElementRecord> = self
            .read()
            .entries
            .values()
            .map(|entry| entry.record.clone())
            .collect();
        for record in &records {
            let (line1, line2) = record.lines()?;
            writeln!(writer, "{line1}")?;
            writeln!(writer, "{line2}")?;
        }
        Ok(())
    }

    pub fn write_catalog_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_catalog(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_1: &str = "1 25544U 98067A   24340.99323416 +.00018216  00000 0  32316-3 0 0999";
    const LINE_2: &str = "2 25544  51.6388 184.2057 0007028 306.7642 201.1123 15.5026597648519";

    fn record(satellite_id: u32) -> ElementRecord {
        let mut record = ElementRecord::parse(LINE_1, LINE_2).unwrap();
        record.set_satellite_id(satellite_id).unwrap();
        record
    }

    #[test]
    fn test_insert_and_get() {
        let catalog = Catalog::new();
        let key = catalog.insert(&record(25544)).unwrap();
        assert_eq!(catalog.count(), 1);
        assert_eq!(catalog.get(key).unwrap().satellite_id(), 25544);
        assert_eq!(catalog.key_of(25544), Some(key));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let catalog = Catalog::new();
        catalog.insert(&record(25544)).unwrap();
        let err = catalog.insert(&record(25544)).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { satellite_id: 25544 }));
        assert_eq!(catalog.count(), 1);
    }

    #[test]
    fn test_duplicate_checked_before_elements() {
        let catalog = Catalog::new();
        catalog.insert(&record(1)).unwrap();
        let mut value = serde_json::to_value(record(1)).unwrap();
        value["eccentricity"] = serde_json::json!(1.5);
        let bad: ElementRecord = serde_json::from_value(value).unwrap();
        assert!(matches!(catalog.insert(&bad), Err(Error::DuplicateKey { .. })));

        let mut value = serde_json::to_value(record(2)).unwrap();
        value["eccentricity"] = serde_json::json!(1.5);
        let bad: ElementRecord = serde_json::from_value(value).unwrap();
        assert!(matches!(
            catalog.insert(&bad),
            Err(Error::BadElement { field: "eccentricity", .. })
        ));
    }

    #[test]
    fn test_keys_ascend_and_are_not_reused() {
        let catalog = Catalog::new();
        let a = catalog.insert(&record(1)).unwrap();
        let b = catalog.insert(&record(2)).unwrap();
        catalog.remove(a);
        let c = catalog.insert(&record(1)).unwrap();
        assert!(a < b && b < c);
        assert_eq!(catalog.list_keys(), vec![b, c]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let catalog = Catalog::new();
        let key = catalog.insert(&record(7)).unwrap();
        catalog.remove(key);
        catalog.remove(key);
        catalog.remove(SatKey::from(999));
        assert!(catalog.is_empty());
        assert!(matches!(catalog.get(key), Err(Error::BadKey { .. })));
        assert_eq!(catalog.key_of(7), None);
    }

    #[test]
    fn test_update_dead_key_is_noop() {
        let catalog = Catalog::new();
        catalog.update(SatKey::from(42), &record(5)).unwrap();
        assert_eq!(catalog.count(), 0);
    }

    #[test]
    fn test_update_replaces_record() {
        let catalog = Catalog::new();
        let key = catalog.insert(&record(5)).unwrap();
        let mut changed = record(5);
        changed.set_eccentricity(0.01).unwrap();
        catalog.update(key, &changed).unwrap();
        assert_eq!(catalog.get(key).unwrap().eccentricity(), 0.01);
    }

    #[test]
    fn test_failed_init_leaves_no_entry() {
        let catalog = Catalog::new();
        let err = catalog
            .insert_with(&record(9), |_| Err(Error::DegenerateOrbit { reason: "test" }))
            .unwrap_err();
        assert_eq!(err.code(), "degenerate_orbit");
        assert_eq!(catalog.count(), 0);
        assert_eq!(catalog.key_of(9), None);
        assert!(catalog.insert(&record(9)).is_ok());
    }

    #[test]
    fn test_write_catalog_in_key_order() {
        let catalog = Catalog::new();
        catalog.insert(&record(25544)).unwrap();
        catalog.insert(&record(5)).unwrap();
        let mut out = Vec::new();
        catalog.write_catalog(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], LINE_1);
        assert_eq!(lines[1], LINE_2);
        assert!(lines[2].starts_with("1 00005U"));
        assert!(lines[3].starts_with("2 00005 "));
    }
}
