//! Row types for SQLx mapping and their conversion into domain records.
//!
//! A row that no longer satisfies the domain's validation is reported as a
//! backend error rather than patched up.

use chrono::{DateTime, Utc};

use fleet_core::{
    BatteryLevel, DroneId, DroneModel, MedicationCode, MedicationName, SerialNumber, Weight,
};
use fleet_state::{BatteryLog, Drone, DroneParts, Medication};

use crate::StoreError;

pub(crate) const DRONE_COLUMNS: &str =
    "id, serial_number, model, weight_limit, battery, state, version";

pub(crate) const MEDICATION_COLUMNS: &str = "code, name, weight, image, drone_id";

pub(crate) const LOG_COLUMNS: &str = "id, drone_id, battery, drone_state, created_at";

fn corrupt(table: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("corrupt {table} row: {detail}"))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DroneRow {
    pub id: i64,
    pub serial_number: String,
    pub model: String,
    pub weight_limit: i32,
    pub battery: i16,
    pub state: String,
    pub version: i64,
}

impl DroneRow {
    pub fn into_drone(self, medications: Vec<Medication>) -> Result<Drone, StoreError> {
        let parts = DroneParts {
            id: DroneId::new(self.id).map_err(|e| corrupt("drones", e))?,
            serial_number: SerialNumber::new(self.serial_number)
                .map_err(|e| corrupt("drones", e))?,
            model: self.model.parse::<DroneModel>().map_err(|e| corrupt("drones", e))?,
            weight_limit: Weight::limit(i64::from(self.weight_limit))
                .map_err(|e| corrupt("drones", e))?,
            battery: BatteryLevel::new(i64::from(self.battery))
                .map_err(|e| corrupt("drones", e))?,
            state: self.state.parse().map_err(|e| corrupt("drones", e))?,
            medications,
            version: u64::try_from(self.version).map_err(|e| corrupt("drones", e))?,
        };
        Drone::restore(parts).map_err(|e| corrupt("drones", e))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MedicationRow {
    pub code: String,
    pub name: String,
    pub weight: i32,
    pub image: Option<String>,
    pub drone_id: i64,
}

impl MedicationRow {
    pub fn into_medication(self) -> Result<Medication, StoreError> {
        Ok(Medication {
            name: MedicationName::new(self.name).map_err(|e| corrupt("medications", e))?,
            code: MedicationCode::new(self.code).map_err(|e| corrupt("medications", e))?,
            weight: Weight::item(i64::from(self.weight)).map_err(|e| corrupt("medications", e))?,
            image: self.image,
            drone_id: DroneId::new(self.drone_id).map_err(|e| corrupt("medications", e))?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LogRow {
    pub id: i64,
    pub drone_id: i64,
    pub battery: i16,
    pub drone_state: String,
    pub created_at: DateTime<Utc>,
}

impl LogRow {
    pub fn into_log(self) -> Result<BatteryLog, StoreError> {
        Ok(BatteryLog {
            id: self.id,
            drone_id: DroneId::new(self.drone_id).map_err(|e| corrupt("battery_logs", e))?,
            battery: BatteryLevel::new(i64::from(self.battery))
                .map_err(|e| corrupt("battery_logs", e))?,
            drone_state: self
                .drone_state
                .parse()
                .map_err(|e| corrupt("battery_logs", e))?,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_state::DroneState;

    fn drone_row() -> DroneRow {
        DroneRow {
            id: 3,
            serial_number: "SN-PG-0000003".into(),
            model: "Cruiserweight".into(),
            weight_limit: 300,
            battery: 80,
            state: "LOADING".into(),
            version: 5,
        }
    }

    fn medication_row(code: &str, weight: i32) -> MedicationRow {
        MedicationRow {
            code: code.into(),
            name: format!("name_{code}"),
            weight,
            image: Some("https://img.example/box.png".into()),
            drone_id: 3,
        }
    }

    #[test]
    fn drone_row_round_trips_into_domain() {
        let meds = vec![
            medication_row("A1", 100).into_medication().unwrap(),
            medication_row("B2", 120).into_medication().unwrap(),
        ];
        let drone = drone_row().into_drone(meds).unwrap();
        assert_eq!(drone.id().get(), 3);
        assert_eq!(drone.state(), DroneState::Loading);
        assert_eq!(drone.current_payload(), Weight::grams(220));
        assert_eq!(drone.version(), 5);
    }

    #[test]
    fn unknown_state_is_corrupt() {
        let mut row = drone_row();
        row.state = "OPERATIONAL".into();
        let err = row.into_drone(Vec::new()).unwrap_err();
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("OPERATIONAL")));
    }

    #[test]
    fn overloaded_drone_is_corrupt() {
        let meds = vec![medication_row("A1", 400).into_medication().unwrap()];
        assert!(drone_row().into_drone(meds).is_err());
    }

    #[test]
    fn log_row_parses_state() {
        let log = LogRow {
            id: 1,
            drone_id: 3,
            battery: 39,
            drone_state: "IDLE".into(),
            created_at: Utc::now(),
        }
        .into_log()
        .unwrap();
        assert_eq!(log.drone_state, DroneState::Idle);
        assert_eq!(log.battery.percent(), 39);
    }
}
