//! # In-Memory Store
//!
//! Thread-safe, cloneable store backed by `parking_lot::RwLock`. Clones share
//! the same tables.
//!
//! All operations are synchronous under the hood: the lock is never held
//! across an `.await`, so the async trait methods just take the lock, do the
//! work and return. `parking_lot::RwLock` is non-poisonable, so a panicking
//! writer does not permanently corrupt the store.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use fleet_core::DroneId;
use fleet_state::{BatteryLog, Drone, DroneState, NewBatteryLog, NewDrone};

use crate::{BatchSave, DroneStore, LogStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    drones: BTreeMap<DroneId, Drone>,
    last_drone_id: i64,
    logs: Vec<BatteryLog>,
}

impl Tables {
    fn create(&mut self, new: NewDrone) -> Result<Drone, StoreError> {
        if self
            .drones
            .values()
            .any(|d| d.serial_number() == &new.serial_number)
        {
            return Err(StoreError::Duplicate {
                field: "serial number",
                value: new.serial_number.to_string(),
            });
        }
        let id = DroneId::new(self.last_drone_id + 1)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.last_drone_id = id.get();
        let drone = Drone::register(id, new);
        self.drones.insert(id, drone.clone());
        Ok(drone)
    }

    /// Compare-and-swap one drone. Nothing changes on error.
    fn save(&mut self, drone: &Drone) -> Result<Drone, StoreError> {
        let stored = self
            .drones
            .get(&drone.id())
            .ok_or(StoreError::NotFound(drone.id()))?;
        if stored.version() != drone.version() {
            return Err(StoreError::Conflict {
                id: drone.id(),
                expected: drone.version(),
                actual: stored.version(),
            });
        }
        self.check_new_medications(drone, stored)?;
        let saved = drone.clone().next_version();
        self.drones.insert(saved.id(), saved.clone());
        Ok(saved)
    }

    /// Medications are append-only, so everything past the stored count is
    /// new. New items must not reuse a code or name held anywhere in the
    /// fleet, this drone included, nor repeat one another.
    fn check_new_medications(&self, drone: &Drone, stored: &Drone) -> Result<(), StoreError> {
        let kept = stored.medications().len();
        let added = drone.medications().get(kept..).unwrap_or_default();

        let mut codes: HashSet<&str> = HashSet::new();
        let mut names: HashSet<&str> = HashSet::new();
        for m in self.drones.values().flat_map(|d| d.medications()) {
            codes.insert(m.code.as_str());
            names.insert(m.name.as_str());
        }

        for m in added {
            if !codes.insert(m.code.as_str()) {
                return Err(StoreError::Duplicate {
                    field: "medication code",
                    value: m.code.to_string(),
                });
            }
            if !names.insert(m.name.as_str()) {
                return Err(StoreError::Duplicate {
                    field: "medication name",
                    value: m.name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn append_log(&mut self, entry: NewBatteryLog) -> BatteryLog {
        let id = self.logs.len() as i64 + 1;
        let log = BatteryLog::stamped(id, entry, Utc::now());
        self.logs.push(log.clone());
        log
    }
}

/// In-memory [`DroneStore`] and [`LogStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered drones.
    pub fn len(&self) -> usize {
        self.tables.read().drones.len()
    }

    /// Whether no drone is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DroneStore for MemoryStore {
    async fn create_drone(&self, new: NewDrone) -> Result<Drone, StoreError> {
        self.tables.write().create(new)
    }

    async fn get_drone(&self, id: DroneId) -> Result<Drone, StoreError> {
        self.tables
            .read()
            .drones
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn save_drone(&self, drone: &Drone) -> Result<Drone, StoreError> {
        self.tables.write().save(drone)
    }

    async fn save_drones(&self, drones: &[Drone]) -> Result<BatchSave, StoreError> {
        let mut tables = self.tables.write();
        let mut batch = BatchSave::default();
        for drone in drones {
            match tables.save(drone) {
                Ok(saved) => batch.saved.push(saved),
                Err(err) => batch.failed.push((drone.id(), err)),
            }
        }
        Ok(batch)
    }

    async fn save_drained(&self, drones: &[Drone]) -> Result<BatchSave, StoreError> {
        let mut tables = self.tables.write();
        let mut batch = BatchSave::default();
        for drone in drones {
            match tables.save(drone) {
                Ok(saved) => {
                    batch.logs.push(tables.append_log(NewBatteryLog::for_drone(&saved)));
                    batch.saved.push(saved);
                }
                Err(err) => batch.failed.push((drone.id(), err)),
            }
        }
        Ok(batch)
    }

    async fn list_drones(&self) -> Result<Vec<Drone>, StoreError> {
        Ok(self.tables.read().drones.values().cloned().collect())
    }

    async fn list_drones_by_state(&self, state: DroneState) -> Result<Vec<Drone>, StoreError> {
        Ok(self
            .tables
            .read()
            .drones
            .values()
            .filter(|d| d.state() == state)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn create_log(&self, entry: NewBatteryLog) -> Result<BatteryLog, StoreError> {
        Ok(self.tables.write().append_log(entry))
    }

    async fn list_logs(&self) -> Result<Vec<BatteryLog>, StoreError> {
        Ok(self.tables.read().logs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{BatteryLevel, DroneModel, MedicationCode, MedicationName, SerialNumber, Weight};
    use fleet_state::MedicationItem;

    fn new_drone(serial: &str) -> NewDrone {
        NewDrone::new(
            SerialNumber::new(serial).unwrap(),
            DroneModel::Middleweight,
            Weight::grams(300),
        )
    }

    fn item(code: &str, name: &str, grams: u32) -> MedicationItem {
        MedicationItem {
            name: MedicationName::new(name).unwrap(),
            code: MedicationCode::new(code).unwrap(),
            weight: Weight::grams(grams),
            image: None,
        }
    }

    // -- Drone tests ---------------------------------------------------------

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.create_drone(new_drone("SN-MEM-000001")).await.unwrap();
        let b = store.create_drone(new_drone("SN-MEM-000002")).await.unwrap();
        assert_eq!(a.id().get(), 1);
        assert_eq!(b.id().get(), 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_serial_is_rejected() {
        let store = MemoryStore::new();
        store.create_drone(new_drone("SN-MEM-000001")).await.unwrap();
        let err = store.create_drone(new_drone("SN-MEM-000001")).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Duplicate {
                field: "serial number",
                value: "SN-MEM-000001".into(),
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_drone() {
        let store = MemoryStore::new();
        let id = DroneId::new(9).unwrap();
        assert_eq!(store.get_drone(id).await.unwrap_err(), StoreError::NotFound(id));
    }

    #[tokio::test]
    async fn save_bumps_version_and_stale_save_conflicts() {
        let store = MemoryStore::new();
        let read = store.create_drone(new_drone("SN-MEM-000001")).await.unwrap();

        let mut first = read.clone();
        first.load(item("A1", "alpha", 100)).unwrap();
        let saved = store.save_drone(&first).await.unwrap();
        assert_eq!(saved.version(), 1);

        let mut second = read;
        second.load(item("B2", "beta", 100)).unwrap();
        let err = store.save_drone(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, actual: 1, .. }));

        let current = store.get_drone(saved.id()).await.unwrap();
        assert_eq!(current.medications().len(), 1);
        assert_eq!(current.current_payload(), Weight::grams(100));
    }

    #[tokio::test]
    async fn medication_codes_and_names_are_fleet_unique() {
        let store = MemoryStore::new();
        let mut a = store.create_drone(new_drone("SN-MEM-000001")).await.unwrap();
        let mut b = store.create_drone(new_drone("SN-MEM-000002")).await.unwrap();

        a.load(item("A1", "alpha", 50)).unwrap();
        let a = store.save_drone(&a).await.unwrap();

        let mut same_code = b.clone();
        same_code.load(item("A1", "other", 50)).unwrap();
        assert!(matches!(
            store.save_drone(&same_code).await,
            Err(StoreError::Duplicate { field: "medication code", .. })
        ));

        b.load(item("B1", "alpha", 50)).unwrap();
        assert!(matches!(
            store.save_drone(&b).await,
            Err(StoreError::Duplicate { field: "medication name", .. })
        ));

        // Stored items are not re-checked; only the appended one is.
        let mut again = a;
        again.load(item("A2", "alpha2", 50)).unwrap();
        assert!(store.save_drone(&again).await.is_ok());
    }

    #[tokio::test]
    async fn same_drone_cannot_reuse_its_own_code_or_name() {
        let store = MemoryStore::new();
        let mut d = store.create_drone(new_drone("SN-MEM-000001")).await.unwrap();
        d.load(item("A1", "alpha", 50)).unwrap();
        let d = store.save_drone(&d).await.unwrap();

        let mut same_code = d.clone();
        same_code.load(item("A1", "other", 50)).unwrap();
        assert_eq!(
            store.save_drone(&same_code).await.unwrap_err(),
            StoreError::Duplicate {
                field: "medication code",
                value: "A1".into(),
            }
        );

        let mut same_name = d.clone();
        same_name.load(item("A2", "alpha", 50)).unwrap();
        assert!(matches!(
            store.save_drone(&same_name).await,
            Err(StoreError::Duplicate { field: "medication name", .. })
        ));

        let mut twice = d.clone();
        twice.load(item("B1", "beta", 50)).unwrap();
        twice.load(item("B1", "gamma", 50)).unwrap();
        assert!(store.save_drone(&twice).await.is_err());

        let stored = store.get_drone(d.id()).await.unwrap();
        assert_eq!(stored.medications().len(), 1);
        assert_eq!(stored.current_payload(), Weight::grams(50));
        assert_eq!(stored.version(), d.version());
    }

    #[tokio::test]
    async fn batch_reports_per_drone_failures() {
        let store = MemoryStore::new();
        let a = store.create_drone(new_drone("SN-MEM-000001")).await.unwrap();
        let b = store.create_drone(new_drone("SN-MEM-000002")).await.unwrap();
        // Make `b` stale.
        store.save_drone(&b).await.unwrap();

        let batch = store.save_drones(&[a.clone(), b.clone()]).await.unwrap();
        assert_eq!(batch.saved.len(), 1);
        assert_eq!(batch.saved[0].id(), a.id());
        assert_eq!(batch.failed.len(), 1);
        assert_eq!(batch.failed[0].0, b.id());
        assert!(matches!(batch.failed[0].1, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn drained_batch_logs_only_saved_drones() {
        let store = MemoryStore::new();
        let a = store
            .create_drone(new_drone("SN-MEM-000001").with_battery(BatteryLevel::new(60).unwrap()))
            .await
            .unwrap();
        let b = store.create_drone(new_drone("SN-MEM-000002")).await.unwrap();
        // Make `b` stale.
        store.save_drone(&b).await.unwrap();

        let batch = store.save_drained(&[a.clone(), b.clone()]).await.unwrap();
        assert_eq!(batch.saved.len(), 1);
        assert_eq!(batch.failed.len(), 1);
        assert_eq!(batch.logs.len(), 1);
        assert_eq!(batch.logs[0].drone_id, a.id());
        assert_eq!(batch.logs[0].battery.percent(), 60);

        let logs = store.list_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].drone_id, a.id());
    }

    #[tokio::test]
    async fn list_by_state_filters() {
        let store = MemoryStore::new();
        store.create_drone(new_drone("SN-MEM-000001")).await.unwrap();
        store
            .create_drone(new_drone("SN-MEM-000002").with_state(DroneState::Delivering))
            .await
            .unwrap();
        let idle = store.list_drones_by_state(DroneState::Idle).await.unwrap();
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].serial_number().as_str(), "SN-MEM-000001");
        assert_eq!(store.list_drones().await.unwrap().len(), 2);
    }

    // -- Log tests -----------------------------------------------------------

    #[tokio::test]
    async fn logs_keep_creation_order() {
        let store = MemoryStore::new();
        let d = store
            .create_drone(new_drone("SN-MEM-000001").with_battery(BatteryLevel::new(40).unwrap()))
            .await
            .unwrap();
        store.create_log(NewBatteryLog::for_drone(&d)).await.unwrap();
        store.create_log(NewBatteryLog::for_drone(&d)).await.unwrap();
        let logs = store.list_logs().await.unwrap();
        assert_eq!(logs.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(logs.iter().all(|l| l.battery.percent() == 40));
    }

    #[tokio::test]
    async fn clones_share_tables() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.create_drone(new_drone("SN-MEM-000001")).await.unwrap();
        assert_eq!(clone.len(), 1);
    }
}
