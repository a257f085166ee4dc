//! # Postgres Store
//!
//! [`PgStore`] persists drones to the `drones` table and their medications to
//! `medications`, one row per item, ordered by load position. Battery log
//! records go to `battery_logs`.
//!
//! A drone save is one `UPDATE ... WHERE id = $n AND version = $m` plus an
//! `INSERT` for each medication past the stored count, all in one
//! transaction. Zero
//! updated rows means the drone is missing or stale. Batch saves share one
//! transaction and give each drone its own savepoint, so one refused drone
//! does not undo the others. A drained drone's battery log row is written in
//! the same savepoint as the drone.

mod rows;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;

use fleet_core::{DroneId, Weight};
use fleet_state::{BatteryLog, Drone, DroneState, Medication, NewBatteryLog, NewDrone};

use crate::{BatchSave, DroneStore, LogStore, StoreError};

use rows::{DroneRow, LogRow, MedicationRow, DRONE_COLUMNS, LOG_COLUMNS, MEDICATION_COLUMNS};

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Connect to Postgres and run the embedded migrations.
pub async fn init_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(pool)
}

/// Postgres-backed [`DroneStore`] and [`LogStore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool. Migrations must already have run.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn medications_by_drone(
        &self,
        ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Medication>>, StoreError> {
        let sql = format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications \
             WHERE drone_id = ANY($1) ORDER BY drone_id, position"
        );
        let rows = sqlx::query_as::<_, MedicationRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<i64, Vec<Medication>> = HashMap::new();
        for row in rows {
            let drone_id = row.drone_id;
            grouped
                .entry(drone_id)
                .or_default()
                .push(row.into_medication()?);
        }
        Ok(grouped)
    }

    async fn assemble(&self, rows: Vec<DroneRow>) -> Result<Vec<Drone>, StoreError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut medications = self.medications_by_drone(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let meds = medications.remove(&row.id).unwrap_or_default();
                row.into_drone(meds)
            })
            .collect()
    }
}

fn grams(w: Weight) -> i32 {
    i32::try_from(w.as_grams()).unwrap_or(i32::MAX)
}

fn version(v: u64) -> Result<i64, StoreError> {
    i64::try_from(v).map_err(|_| StoreError::Backend(format!("version {v} out of range")))
}

/// Map a unique violation to [`StoreError::Duplicate`]; anything else is a
/// backend failure.
fn unique_violation(err: sqlx::Error, field: &'static str, value: &str) -> StoreError {
    let is_unique = matches!(
        &err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    );
    if is_unique {
        StoreError::Duplicate {
            field,
            value: value.to_string(),
        }
    } else {
        err.into()
    }
}

fn medication_violation(err: sqlx::Error, m: &Medication) -> StoreError {
    let is_name = matches!(
        &err,
        sqlx::Error::Database(db) if db.constraint() == Some("medications_name_key")
    );
    if is_name {
        unique_violation(err, "medication name", m.name.as_str())
    } else {
        unique_violation(err, "medication code", m.code.as_str())
    }
}

/// Medications past the `stored` count, with their load positions.
fn appended(drone: &Drone, stored: i64) -> impl Iterator<Item = (usize, &Medication)> {
    let skip = usize::try_from(stored).unwrap_or_default();
    drone.medications().iter().enumerate().skip(skip)
}

async fn insert_log(conn: &mut PgConnection, entry: NewBatteryLog) -> Result<BatteryLog, StoreError> {
    let sql = format!(
        "INSERT INTO battery_logs (drone_id, battery, drone_state) \
         VALUES ($1, $2, $3) RETURNING {LOG_COLUMNS}"
    );
    let row = sqlx::query_as::<_, LogRow>(&sql)
        .bind(entry.drone_id.get())
        .bind(i16::from(entry.battery.percent()))
        .bind(entry.drone_state.name())
        .fetch_one(&mut *conn)
        .await?;
    row.into_log()
}

/// Compare-and-swap one drone on an open connection (transaction or
/// savepoint). The caller commits.
async fn save_on(conn: &mut PgConnection, drone: &Drone) -> Result<Drone, StoreError> {
    let id = drone.id().get();
    let result = sqlx::query(
        "UPDATE drones SET weight_limit = $1, battery = $2, state = $3, version = $4, \
         updated_at = now() WHERE id = $5 AND version = $6",
    )
    .bind(grams(drone.weight_limit()))
    .bind(i16::from(drone.battery().percent()))
    .bind(drone.state().name())
    .bind(version(drone.version() + 1)?)
    .bind(id)
    .bind(version(drone.version())?)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM drones WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match actual {
            None => StoreError::NotFound(drone.id()),
            Some(actual) => StoreError::Conflict {
                id: drone.id(),
                expected: drone.version(),
                actual: u64::try_from(actual).unwrap_or_default(),
            },
        });
    }

    let stored: i64 = sqlx::query_scalar("SELECT count(*) FROM medications WHERE drone_id = $1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    // Unique keys on code and name reject a clash with any stored item,
    // this drone's own included.
    for (position, m) in appended(drone, stored) {
        sqlx::query(
            "INSERT INTO medications (code, name, weight, image, drone_id, position) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(m.code.as_str())
        .bind(m.name.as_str())
        .bind(grams(m.weight))
        .bind(m.image.as_deref())
        .bind(id)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut *conn)
        .await
        .map_err(|e| medication_violation(e, m))?;
    }

    Ok(drone.clone().next_version())
}

#[async_trait]
impl DroneStore for PgStore {
    async fn create_drone(&self, new: NewDrone) -> Result<Drone, StoreError> {
        let sql = format!(
            "INSERT INTO drones (serial_number, model, weight_limit, battery, state, version) \
             VALUES ($1, $2, $3, $4, $5, 0) RETURNING {DRONE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DroneRow>(&sql)
            .bind(new.serial_number.as_str())
            .bind(new.model.as_str())
            .bind(grams(new.weight_limit))
            .bind(i16::from(new.battery.percent()))
            .bind(new.state.name())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "serial number", new.serial_number.as_str()))?;
        row.into_drone(Vec::new())
    }

    async fn get_drone(&self, id: DroneId) -> Result<Drone, StoreError> {
        let sql = format!("SELECT {DRONE_COLUMNS} FROM drones WHERE id = $1");
        let row = sqlx::query_as::<_, DroneRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        let mut drones = self.assemble(vec![row]).await?;
        drones.pop().ok_or(StoreError::NotFound(id))
    }

    async fn save_drone(&self, drone: &Drone) -> Result<Drone, StoreError> {
        let mut tx = self.pool.begin().await?;
        let saved = save_on(&mut tx, drone).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn save_drones(&self, drones: &[Drone]) -> Result<BatchSave, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut batch = BatchSave::default();
        for drone in drones {
            let mut savepoint = tx.begin().await?;
            match save_on(&mut savepoint, drone).await {
                Ok(saved) => {
                    savepoint.commit().await?;
                    batch.saved.push(saved);
                }
                Err(StoreError::Backend(msg)) => return Err(StoreError::Backend(msg)),
                Err(err) => {
                    savepoint.rollback().await?;
                    batch.failed.push((drone.id(), err));
                }
            }
        }
        tx.commit().await?;
        Ok(batch)
    }

    async fn save_drained(&self, drones: &[Drone]) -> Result<BatchSave, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut batch = BatchSave::default();
        for drone in drones {
            let mut savepoint = tx.begin().await?;
            match save_on(&mut savepoint, drone).await {
                Ok(saved) => {
                    let log = insert_log(&mut savepoint, NewBatteryLog::for_drone(&saved)).await?;
                    savepoint.commit().await?;
                    batch.saved.push(saved);
                    batch.logs.push(log);
                }
                Err(StoreError::Backend(msg)) => return Err(StoreError::Backend(msg)),
                Err(err) => {
                    savepoint.rollback().await?;
                    batch.failed.push((drone.id(), err));
                }
            }
        }
        tx.commit().await?;
        Ok(batch)
    }

    async fn list_drones(&self) -> Result<Vec<Drone>, StoreError> {
        let sql = format!("SELECT {DRONE_COLUMNS} FROM drones ORDER BY id");
        let rows = sqlx::query_as::<_, DroneRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        self.assemble(rows).await
    }

    async fn list_drones_by_state(&self, state: DroneState) -> Result<Vec<Drone>, StoreError> {
        let sql = format!("SELECT {DRONE_COLUMNS} FROM drones WHERE state = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, DroneRow>(&sql)
            .bind(state.name())
            .fetch_all(&self.pool)
            .await?;
        self.assemble(rows).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl LogStore for PgStore {
    async fn create_log(&self, entry: NewBatteryLog) -> Result<BatteryLog, StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert_log(&mut conn, entry).await
    }

    async fn list_logs(&self) -> Result<Vec<BatteryLog>, StoreError> {
        let sql = format!("SELECT {LOG_COLUMNS} FROM battery_logs ORDER BY id");
        sqlx::query_as::<_, LogRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LogRow::into_log)
            .collect()
    }
}
