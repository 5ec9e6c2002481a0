//! Request bodies accepted by the store.
//!
//! Every body rejects unknown fields at deserialization time. Required fields
//! are modelled as `Option` so that a missing value surfaces as
//! [`StoreError::Validation`] instead of a generic decode failure.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use plantcare_db::queries::plants::PlantChanges;

use crate::error::StoreError;
use crate::schedule::parse_date;

/// Body of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPlant {
    pub name: Option<String>,
    pub species: Option<String>,
    pub last_watered: Option<String>,
    pub watering_frequency: Option<i32>,
    pub light_pref: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

/// A [`NewPlant`] whose required fields are present and well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNewPlant<'a> {
    pub name: &'a str,
    pub species: Option<&'a str>,
    pub last_watered: NaiveDate,
    pub watering_frequency: i32,
    pub light_pref: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

impl NewPlant {
    /// Check required fields and parse the last-watered date.
    ///
    /// Blank optional fields are treated as absent.
    pub fn validate(&self) -> Result<ValidNewPlant<'_>, StoreError> {
        let name = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let last_watered = self
            .last_watered
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if last_watered.is_none() {
            missing.push("lastWatered");
        }
        if self.watering_frequency.is_none() {
            missing.push("wateringFrequency");
        }
        let (Some(name), Some(last_watered), Some(watering_frequency)) =
            (name, last_watered, self.watering_frequency)
        else {
            return Err(StoreError::validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        };

        check_frequency(watering_frequency)?;

        Ok(ValidNewPlant {
            name,
            species: non_blank(self.species.as_deref()),
            last_watered: parse_date(last_watered)?,
            watering_frequency,
            light_pref: non_blank(self.light_pref.as_deref()),
            notes: non_blank(self.notes.as_deref()),
            image_url: non_blank(self.image_url.as_deref()),
        })
    }
}

/// Body of a merge update.
///
/// Required fields: absent or `null` keeps the stored value. Optional text
/// fields: absent keeps the stored value, `null` or a blank string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlantPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub species: Option<Option<String>>,
    #[serde(default)]
    pub last_watered: Option<String>,
    #[serde(default)]
    pub watering_frequency: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub light_pref: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub next_watering: Option<String>,
}

impl PlantPatch {
    /// Validate the patch and translate it into column changes.
    pub fn to_changes(&self) -> Result<PlantChanges<'_>, StoreError> {
        let name = match self.name.as_deref().map(str::trim) {
            Some("") => return Err(StoreError::validation("name cannot be blank")),
            other => other,
        };
        if let Some(freq) = self.watering_frequency {
            check_frequency(freq)?;
        }

        Ok(PlantChanges {
            name,
            species: clearable(&self.species),
            last_watered: self.last_watered.as_deref().map(parse_date).transpose()?,
            watering_frequency: self.watering_frequency,
            light_pref: clearable(&self.light_pref),
            notes: clearable(&self.notes),
            image_url: clearable(&self.image_url),
            next_watering: self.next_watering.as_deref().map(parse_date).transpose()?,
        })
    }
}

/// Body of a reminder update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReminderUpdate {
    pub next_watering: Option<String>,
}

impl ReminderUpdate {
    pub fn new(next_watering: impl Into<String>) -> Self {
        Self {
            next_watering: Some(next_watering.into()),
        }
    }

    /// The requested reminder date.
    pub fn date(&self) -> Result<NaiveDate, StoreError> {
        match self.next_watering.as_deref().map(str::trim) {
            None | Some("") => Err(StoreError::validation("nextWatering date is required")),
            Some(raw) => Ok(parse_date(raw)?),
        }
    }
}

fn check_frequency(days: i32) -> Result<(), StoreError> {
    if days <= 0 {
        return Err(StoreError::validation(format!(
            "wateringFrequency must be a positive number of days, got {days}"
        )));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn clearable(value: &Option<Option<String>>) -> Option<Option<&str>> {
    value.as_ref().map(|inner| non_blank(inner.as_deref()))
}

/// Distinguish an explicit `null` from an absent key: with `#[serde(default)]`
/// an absent key stays `None`, while any present value becomes `Some(..)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
