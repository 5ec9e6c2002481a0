//! Plant store service.
//!
//! [`PlantStore`] owns the connection pool and is constructed once at
//! startup, then cloned into whatever needs it (HTTP handlers, CLI commands).
//! Every operation is a single statement against one row or a read of the
//! table, so each call observes the last completed write.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use plantcare_db::models::Plant;
use plantcare_db::pool;
use plantcare_db::queries::plants::{self as plant_queries, NewPlantRow};

use crate::error::StoreError;
use crate::input::{NewPlant, PlantPatch, ReminderUpdate};
use crate::schedule::{WateringStatus, classify_status, compute_next_watering};

/// Watering status of a single plant on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantStatusReport {
    pub plant_id: i64,
    pub next_watering: NaiveDate,
    pub today: NaiveDate,
    pub status: WateringStatus,
    pub message: String,
}

impl PlantStatusReport {
    pub fn for_plant(plant: &Plant, today: NaiveDate) -> Self {
        let status = classify_status(plant.next_watering, today);
        Self {
            plant_id: plant.id,
            next_watering: plant.next_watering,
            today,
            status,
            message: status.message(plant.next_watering),
        }
    }
}

/// A plant that needs water, paired with how late it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuePlant {
    pub plant: Plant,
    pub status: WateringStatus,
    pub message: String,
}

/// Handle to the persisted plant records.
#[derive(Debug, Clone)]
pub struct PlantStore {
    pool: PgPool,
}

impl PlantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for provisioning tasks that bypass the store.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool. Outstanding clones of the store become unusable.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Check that the database answers.
    pub async fn ping(&self) -> Result<(), StoreError> {
        pool::ping(&self.pool).await?;
        Ok(())
    }

    /// All plants, in insertion order.
    pub async fn list(&self) -> Result<Vec<Plant>, StoreError> {
        let plants = plant_queries::list_plants(&self.pool).await?;
        debug!(count = plants.len(), "listed plants");
        Ok(plants)
    }

    pub async fn get(&self, id: i64) -> Result<Plant, StoreError> {
        plant_queries::get_plant(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    /// Validate `new`, derive its next watering date, and persist it.
    pub async fn create(&self, new: &NewPlant) -> Result<Plant, StoreError> {
        let valid = new.validate()?;
        let next_watering = compute_next_watering(valid.last_watered, valid.watering_frequency)?;

        let row = NewPlantRow {
            name: valid.name,
            species: valid.species,
            last_watered: valid.last_watered,
            watering_frequency: valid.watering_frequency,
            light_pref: valid.light_pref,
            notes: valid.notes,
            image_url: valid.image_url,
            next_watering,
        };
        let plant = plant_queries::insert_plant(&self.pool, &row).await?;

        info!(id = plant.id, name = %plant.name, next_watering = %plant.next_watering, "plant created");
        Ok(plant)
    }

    /// Merge `patch` into the stored plant. Fields absent from the patch keep
    /// their stored values.
    pub async fn update(&self, id: i64, patch: &PlantPatch) -> Result<(), StoreError> {
        let changes = patch.to_changes()?;
        if changes.is_empty() {
            self.get(id).await?;
            debug!(id, "empty update");
            return Ok(());
        }
        if !plant_queries::update_plant(&self.pool, id, &changes).await? {
            warn!(id, "update for unknown plant");
            return Err(StoreError::NotFound(id));
        }
        info!(id, "plant updated");
        Ok(())
    }

    /// Overwrite only the next-watering reminder. Returns the stored date.
    pub async fn update_reminder(
        &self,
        id: i64,
        reminder: &ReminderUpdate,
    ) -> Result<NaiveDate, StoreError> {
        let next_watering = reminder.date()?;
        if !plant_queries::update_next_watering(&self.pool, id, next_watering).await? {
            warn!(id, "reminder for unknown plant");
            return Err(StoreError::NotFound(id));
        }
        info!(id, %next_watering, "reminder updated");
        Ok(next_watering)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if !plant_queries::delete_plant(&self.pool, id).await? {
            warn!(id, "delete for unknown plant");
            return Err(StoreError::NotFound(id));
        }
        info!(id, "plant deleted");
        Ok(())
    }

    /// Watering status of one plant as of `today`.
    pub async fn status(&self, id: i64, today: NaiveDate) -> Result<PlantStatusReport, StoreError> {
        let plant = self.get(id).await?;
        Ok(PlantStatusReport::for_plant(&plant, today))
    }

    /// Plants due today or overdue as of `today`, most overdue first.
    pub async fn due(&self, today: NaiveDate) -> Result<Vec<DuePlant>, StoreError> {
        let plants = plant_queries::list_plants_due_by(&self.pool, today).await?;
        Ok(plants
            .into_iter()
            .map(|plant| {
                let status = classify_status(plant.next_watering, today);
                let message = status.message(plant.next_watering);
                DuePlant {
                    plant,
                    status,
                    message,
                }
            })
            .collect())
    }
}
