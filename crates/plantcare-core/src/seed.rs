//! Sample data for a fresh installation.
//!
//! Seeding is an explicit provisioning step (`plantcare seed` or
//! `plantcare db-init --seed`). A sample is inserted only when no plant with
//! its name exists, so running the step again changes nothing.

use chrono::NaiveDate;
use tracing::{debug, info};

use plantcare_db::queries::plants::{self as plant_queries, NewPlantRow};

use crate::error::StoreError;
use crate::schedule::{compute_next_watering, parse_date};
use crate::store::PlantStore;

/// A built-in sample plant.
#[derive(Debug, Clone, Copy)]
pub struct SamplePlant {
    pub name: &'static str,
    pub species: &'static str,
    pub last_watered: &'static str,
    pub watering_frequency: i32,
    pub light_pref: &'static str,
    pub notes: &'static str,
    pub image_url: &'static str,
}

pub const SAMPLE_PLANTS: &[SamplePlant] = &[
    SamplePlant {
        name: "Pothos",
        species: "Epipremnum aureum",
        last_watered: "2023-10-20",
        watering_frequency: 7,
        light_pref: "bright-indirect",
        notes: "Easy to care for, loves humidity.",
        image_url: "https://upload.wikimedia.org/wikipedia/commons/thumb/e/e0/Golden_Pothos_plant_in_a_pot.jpg/800px-Golden_Pothos_plant_in_a_pot.jpg",
    },
    SamplePlant {
        name: "Fiddle Leaf Fig",
        species: "Ficus lyrata",
        last_watered: "2023-10-15",
        watering_frequency: 10,
        light_pref: "bright-indirect",
        notes: "Needs consistent watering, avoid drafts.",
        image_url: "https://upload.wikimedia.org/wikipedia/commons/thumb/c/cf/Fiddle_Leaf_Fig_%28Ficus_lyrata%29_-_Botanical_Garden%2C_Singapore_-_2015-08-04.jpg/800px-Fiddle_Leaf_Fig_%28Ficus_lyrata%29_-_Botanical_Garden%2C_Singapore_-_2015-08-04.jpg",
    },
    SamplePlant {
        name: "Snake Plant",
        species: "Sansevieria trifasciata",
        last_watered: "2023-10-01",
        watering_frequency: 14,
        light_pref: "low-light",
        notes: "Very forgiving, tolerates neglect.",
        image_url: "https://upload.wikimedia.org/wikipedia/commons/thumb/3/3d/Sansevieria_trifasciata_%27Laurentii%27_on_display_at_the_Conservatory_of_Flowers.jpg/800px-Sansevieria_trifasciata_%28Laurentii%29_on_display_at_the_Conservatory_of_Flowers.jpg",
    },
];

impl SamplePlant {
    fn last_watered_date(&self) -> Result<NaiveDate, StoreError> {
        Ok(parse_date(self.last_watered)?)
    }
}

/// Insert every sample plant that is not already present by name.
///
/// Returns the number of plants inserted.
pub async fn seed_sample_plants(store: &PlantStore) -> Result<u64, StoreError> {
    let mut inserted = 0;
    for sample in SAMPLE_PLANTS {
        let last_watered = sample.last_watered_date()?;
        let row = NewPlantRow {
            name: sample.name,
            species: Some(sample.species),
            last_watered,
            watering_frequency: sample.watering_frequency,
            light_pref: Some(sample.light_pref),
            notes: Some(sample.notes),
            image_url: Some(sample.image_url),
            next_watering: compute_next_watering(last_watered, sample.watering_frequency)?,
        };
        match plant_queries::insert_plant_unless_named(store.pool(), &row).await? {
            Some(plant) => {
                debug!(id = plant.id, name = sample.name, "sample plant inserted");
                inserted += 1;
            }
            None => debug!(name = sample.name, "sample plant already present"),
        }
    }
    info!(inserted, "seeding complete");
    Ok(inserted)
}
