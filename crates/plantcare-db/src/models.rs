use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row in the `plants` table.
///
/// Serialized with camelCase keys, which is the shape the HTTP API and the
/// browser page exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: i64,
    pub name: String,
    pub species: Option<String>,
    pub last_watered: NaiveDate,
    /// Days between waterings. Always positive.
    pub watering_frequency: i32,
    /// Free-form light preference such as `bright-indirect` or `low-light`.
    pub light_pref: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    /// Date of the next scheduled watering. Derived from `last_watered` at
    /// creation, independently adjustable afterwards.
    pub next_watering: NaiveDate,
}
