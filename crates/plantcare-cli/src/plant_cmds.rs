//! CLI handlers for `plantcare plant` subcommands.
//!
//! Implements:
//! - `plantcare plant list`    -- list all plants in table format
//! - `plantcare plant show`    -- show one plant with its watering status
//! - `plantcare plant add`     -- create a plant
//! - `plantcare plant update`  -- merge-update a plant
//! - `plantcare plant remind`  -- move the next-watering reminder
//! - `plantcare plant remove`  -- delete a plant
//! - `plantcare plant due`     -- list plants due today or overdue

use anyhow::Result;
use chrono::NaiveDate;

use plantcare_core::schedule::{self, DATE_FORMAT, classify_status};
use plantcare_core::{NewPlant, PlantPatch, PlantStore, ReminderUpdate};
use plantcare_db::models::Plant;

use crate::PlantCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlantCommands` variant to the appropriate handler.
pub async fn run_plant_command(command: PlantCommands, store: &PlantStore) -> Result<()> {
    match command {
        PlantCommands::List => cmd_list(store).await,
        PlantCommands::Show { id } => cmd_show(store, id).await,
        PlantCommands::Add {
            name,
            species,
            last_watered,
            every,
            light,
            notes,
            image_url,
        } => {
            let last_watered = last_watered
                .unwrap_or_else(|| schedule::today().format(DATE_FORMAT).to_string());
            let new = NewPlant {
                name: Some(name),
                species,
                last_watered: Some(last_watered),
                watering_frequency: Some(every),
                light_pref: light,
                notes,
                image_url,
            };
            cmd_add(store, &new).await
        }
        PlantCommands::Update {
            id,
            name,
            species,
            last_watered,
            every,
            light,
            notes,
            image_url,
            next_watering,
        } => {
            // On the command line an empty string is the way to clear a field.
            let patch = PlantPatch {
                name,
                species: species.map(Some),
                last_watered,
                watering_frequency: every,
                light_pref: light.map(Some),
                notes: notes.map(Some),
                image_url: image_url.map(Some),
                next_watering,
            };
            cmd_update(store, id, &patch).await
        }
        PlantCommands::Remind { id, date } => cmd_remind(store, id, &date).await,
        PlantCommands::Remove { id } => cmd_remove(store, id).await,
        PlantCommands::Due { today } => {
            let today = match today.as_deref() {
                Some(raw) => schedule::parse_date(raw)?,
                None => schedule::today(),
            };
            cmd_due(store, today).await
        }
    }
}

// -----------------------------------------------------------------------
// plantcare plant list
// -----------------------------------------------------------------------

async fn cmd_list(store: &PlantStore) -> Result<()> {
    let plants = store.list().await?;

    if plants.is_empty() {
        println!("No plants found. Use `plantcare plant add` to create one.");
        return Ok(());
    }

    print!("{}", format_table(&plants, schedule::today()));
    Ok(())
}

/// Render plants as a fixed-width table with a status column.
fn format_table(plants: &[Plant], today: NaiveDate) -> String {
    let id_w = plants
        .iter()
        .map(|p| p.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);
    let name_w = plants.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);

    let mut out = format!(
        "{:<id_w$}  {:<name_w$}  {:<10}  {:<5}  {:<10}  STATUS\n",
        "ID", "NAME", "WATERED", "EVERY", "NEXT",
    );
    for p in plants {
        let status = classify_status(p.next_watering, today);
        out.push_str(&format!(
            "{:<id_w$}  {:<name_w$}  {:<10}  {:<5}  {:<10}  {}\n",
            p.id,
            p.name,
            p.last_watered.format(DATE_FORMAT),
            format!("{}d", p.watering_frequency),
            p.next_watering.format(DATE_FORMAT),
            status,
        ));
    }
    out
}

// -----------------------------------------------------------------------
// plantcare plant show
// -----------------------------------------------------------------------

async fn cmd_show(store: &PlantStore, id: i64) -> Result<()> {
    let plant = store.get(id).await?;
    print_plant(&plant, schedule::today());
    Ok(())
}

fn print_plant(plant: &Plant, today: NaiveDate) {
    let status = classify_status(plant.next_watering, today);
    println!("Name:          {}", plant.name);
    println!("ID:            {}", plant.id);
    println!(
        "Species:       {}",
        plant.species.as_deref().unwrap_or("N/A")
    );
    println!("Last watered:  {}", plant.last_watered.format(DATE_FORMAT));
    println!("Every:         {} day(s)", plant.watering_frequency);
    println!(
        "Light:         {}",
        plant.light_pref.as_deref().unwrap_or("N/A")
    );
    println!(
        "Notes:         {}",
        plant.notes.as_deref().unwrap_or("No specific notes.")
    );
    if let Some(url) = &plant.image_url {
        println!("Image:         {url}");
    }
    println!("Next watering: {}", plant.next_watering.format(DATE_FORMAT));
    println!("Status:        {}", status.message(plant.next_watering));
}

// -----------------------------------------------------------------------
// plantcare plant add / update / remind / remove
// -----------------------------------------------------------------------

async fn cmd_add(store: &PlantStore, new: &NewPlant) -> Result<()> {
    let plant = store.create(new).await?;
    println!("Plant created:");
    print_plant(&plant, schedule::today());
    Ok(())
}

async fn cmd_update(store: &PlantStore, id: i64, patch: &PlantPatch) -> Result<()> {
    store.update(id, patch).await?;
    println!("Plant {id} updated.");
    Ok(())
}

async fn cmd_remind(store: &PlantStore, id: i64, date: &str) -> Result<()> {
    let next = store.update_reminder(id, &ReminderUpdate::new(date)).await?;
    println!(
        "Reminder for plant {id} set to {}.",
        next.format(DATE_FORMAT)
    );
    Ok(())
}

async fn cmd_remove(store: &PlantStore, id: i64) -> Result<()> {
    store.delete(id).await?;
    println!("Plant {id} removed.");
    Ok(())
}

// -----------------------------------------------------------------------
// plantcare plant due
// -----------------------------------------------------------------------

async fn cmd_due(store: &PlantStore, today: NaiveDate) -> Result<()> {
    let due = store.due(today).await?;
    if due.is_empty() {
        println!(
            "Nothing to water on {}.",
            today.format(DATE_FORMAT)
        );
        return Ok(());
    }
    for entry in &due {
        println!("{:>4}  {}  {}", entry.plant.id, entry.plant.name, entry.message);
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
