//! Plant-care domain logic: the watering scheduler, validated input schema,
//! the plant store service, and sample-data seeding.

pub mod error;
pub mod input;
pub mod schedule;
pub mod seed;
pub mod store;

pub use error::StoreError;
pub use input::{NewPlant, PlantPatch, ReminderUpdate};
pub use schedule::{ScheduleError, WateringStatus, classify_status, compute_next_watering};
pub use store::{DuePlant, PlantStatusReport, PlantStore};
