//! Database query functions for the `plants` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::Plant;

/// Parameters for inserting a new plant row. `next_watering` is computed by
/// the caller; the database only stores it.
#[derive(Debug, Clone)]
pub struct NewPlantRow<'a> {
    pub name: &'a str,
    pub species: Option<&'a str>,
    pub last_watered: NaiveDate,
    pub watering_frequency: i32,
    pub light_pref: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub next_watering: NaiveDate,
}

/// Column changes for a merge update.
///
/// `None` leaves a column untouched. Nullable columns take a nested option:
/// `Some(None)` clears the column, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default)]
pub struct PlantChanges<'a> {
    pub name: Option<&'a str>,
    pub species: Option<Option<&'a str>>,
    pub last_watered: Option<NaiveDate>,
    pub watering_frequency: Option<i32>,
    pub light_pref: Option<Option<&'a str>>,
    pub notes: Option<Option<&'a str>>,
    pub image_url: Option<Option<&'a str>>,
    pub next_watering: Option<NaiveDate>,
}

impl PlantChanges<'_> {
    /// True when no column would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.species.is_none()
            && self.last_watered.is_none()
            && self.watering_frequency.is_none()
            && self.light_pref.is_none()
            && self.notes.is_none()
            && self.image_url.is_none()
            && self.next_watering.is_none()
    }
}

/// Insert a new plant. Returns the inserted row with its assigned id.
pub async fn insert_plant(pool: &PgPool, new: &NewPlantRow<'_>) -> Result<Plant> {
    let plant = sqlx::query_as::<_, Plant>(
        "INSERT INTO plants (name, species, last_watered, watering_frequency, \
         light_pref, notes, image_url, next_watering) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.species)
    .bind(new.last_watered)
    .bind(new.watering_frequency)
    .bind(new.light_pref)
    .bind(new.notes)
    .bind(new.image_url)
    .bind(new.next_watering)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert plant {:?}", new.name))?;

    Ok(plant)
}

/// Insert a plant only when no plant with the same name exists.
///
/// Returns `None` when a plant with that name was already present.
pub async fn insert_plant_unless_named(
    pool: &PgPool,
    new: &NewPlantRow<'_>,
) -> Result<Option<Plant>> {
    let plant = sqlx::query_as::<_, Plant>(
        "INSERT INTO plants (name, species, last_watered, watering_frequency, \
         light_pref, notes, image_url, next_watering) \
         SELECT $1, $2, $3, $4, $5, $6, $7, $8 \
         WHERE NOT EXISTS (SELECT 1 FROM plants WHERE name = $1) \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.species)
    .bind(new.last_watered)
    .bind(new.watering_frequency)
    .bind(new.light_pref)
    .bind(new.notes)
    .bind(new.image_url)
    .bind(new.next_watering)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to insert plant {:?}", new.name))?;

    Ok(plant)
}

/// Fetch a plant by its id.
pub async fn get_plant(pool: &PgPool, id: i64) -> Result<Option<Plant>> {
    let plant = sqlx::query_as::<_, Plant>("SELECT * FROM plants WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch plant {id}"))?;

    Ok(plant)
}

/// List all plants in insertion order.
pub async fn list_plants(pool: &PgPool) -> Result<Vec<Plant>> {
    let plants = sqlx::query_as::<_, Plant>("SELECT * FROM plants ORDER BY id")
        .fetch_all(pool)
        .await
        .context("failed to list plants")?;

    Ok(plants)
}

/// Number of plants on record.
pub async fn plant_count(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plants")
        .fetch_one(pool)
        .await
        .context("failed to count plants")?;

    Ok(count)
}

/// List plants whose next watering falls on or before `date`, earliest first.
pub async fn list_plants_due_by(pool: &PgPool, date: NaiveDate) -> Result<Vec<Plant>> {
    let plants = sqlx::query_as::<_, Plant>(
        "SELECT * FROM plants WHERE next_watering <= $1 ORDER BY next_watering, id",
    )
    .bind(date)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list plants due by {date}"))?;

    Ok(plants)
}

/// Apply a merge update in a single statement.
///
/// Returns `false` when no plant has the given id.
pub async fn update_plant(pool: &PgPool, id: i64, changes: &PlantChanges<'_>) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE plants SET \
         name = COALESCE($2, name), \
         species = CASE WHEN $3 THEN $4 ELSE species END, \
         last_watered = COALESCE($5, last_watered), \
         watering_frequency = COALESCE($6, watering_frequency), \
         light_pref = CASE WHEN $7 THEN $8 ELSE light_pref END, \
         notes = CASE WHEN $9 THEN $10 ELSE notes END, \
         image_url = CASE WHEN $11 THEN $12 ELSE image_url END, \
         next_watering = COALESCE($13, next_watering) \
         WHERE id = $1",
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.species.is_some())
    .bind(changes.species.flatten())
    .bind(changes.last_watered)
    .bind(changes.watering_frequency)
    .bind(changes.light_pref.is_some())
    .bind(changes.light_pref.flatten())
    .bind(changes.notes.is_some())
    .bind(changes.notes.flatten())
    .bind(changes.image_url.is_some())
    .bind(changes.image_url.flatten())
    .bind(changes.next_watering)
    .execute(pool)
    .await
    .with_context(|| format!("failed to update plant {id}"))?;

    Ok(result.rows_affected() > 0)
}

/// Overwrite only the next-watering reminder of a plant.
///
/// Returns `false` when no plant has the given id.
pub async fn update_next_watering(pool: &PgPool, id: i64, next_watering: NaiveDate) -> Result<bool> {
    let result = sqlx::query("UPDATE plants SET next_watering = $1 WHERE id = $2")
        .bind(next_watering)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to update reminder for plant {id}"))?;

    Ok(result.rows_affected() > 0)
}

/// Delete a plant by its id.
///
/// Returns `false` when no plant has the given id.
pub async fn delete_plant(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM plants WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete plant {id}"))?;

    Ok(result.rows_affected() > 0)
}
