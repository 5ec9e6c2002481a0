mod config;
mod plant_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use plantcare_core::PlantStore;
use plantcare_core::seed;
use plantcare_db::config::DbConfig;
use plantcare_db::pool;
use plantcare_db::queries::plants as plant_queries;

use config::PlantcareConfig;

#[derive(Parser)]
#[command(name = "plantcare", about = "Personal plant-care tracker with watering reminders")]
struct Cli {
    /// Database URL (overrides PLANTCARE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a plantcare config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Address the HTTP server binds to
        #[arg(long, default_value = config::ServerSection::DEFAULT_BIND)]
        bind: String,
        /// Port the HTTP server listens on
        #[arg(long, default_value_t = config::ServerSection::DEFAULT_PORT)]
        port: u16,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and apply migrations
    DbInit {
        /// Also insert the sample plants
        #[arg(long)]
        seed: bool,
    },
    /// Insert the sample plants (skips any that already exist by name)
    Seed,
    /// Run the HTTP API and plant overview page
    Serve {
        /// Address to bind (defaults to the config file, then 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (defaults to the config file, then 3000)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Plant management
    Plant {
        #[command(subcommand)]
        command: PlantCommands,
    },
    /// Print a shell completion script
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PlantCommands {
    /// List all plants with their watering status
    List,
    /// Show one plant
    Show {
        /// Plant ID
        id: i64,
    },
    /// Add a plant
    Add {
        /// Plant name
        name: String,
        /// Watering frequency in days
        #[arg(long)]
        every: i32,
        /// Date last watered, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        last_watered: Option<String>,
        /// Species
        #[arg(long)]
        species: Option<String>,
        /// Light preference, e.g. bright-indirect or low-light
        #[arg(long)]
        light: Option<String>,
        /// Care notes
        #[arg(long)]
        notes: Option<String>,
        /// Image URL
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Update a plant; only the given fields change (pass "" to clear an optional field)
    Update {
        /// Plant ID
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        species: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        last_watered: Option<String>,
        /// Watering frequency in days
        #[arg(long)]
        every: Option<i32>,
        #[arg(long)]
        light: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        next_watering: Option<String>,
    },
    /// Set the next watering reminder
    Remind {
        /// Plant ID
        id: i64,
        /// Reminder date, YYYY-MM-DD
        date: String,
    },
    /// Remove a plant
    Remove {
        /// Plant ID
        id: i64,
    },
    /// List plants due today or overdue
    Due {
        /// Evaluate as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },
}

/// Execute the `plantcare init` command: write config file.
fn cmd_init(db_url: &str, bind: &str, port: u16, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        server: config::ServerSection {
            bind: bind.to_string(),
            port,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server       = {bind}:{port}");
    println!();
    println!("Next: run `plantcare db-init --seed` to create and migrate the database.");

    Ok(())
}

/// Execute the `plantcare db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>, with_seed: bool) -> anyhow::Result<()> {
    let resolved = PlantcareConfig::resolve(cli_db_url)?;

    println!("Initializing plantcare database...");

    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!(
            "Created database {}.",
            resolved.db_config.database_name().unwrap_or_default()
        );
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let store = PlantStore::new(db_pool);
    if with_seed {
        let inserted = seed::seed_sample_plants(&store).await?;
        println!("Seeded {inserted} sample plant(s).");
    }

    let count = plant_queries::plant_count(store.pool()).await?;
    println!("Database ready with {count} plant(s).");

    store.close().await;

    println!("plantcare db-init complete.");
    Ok(())
}

async fn connect(cli_db_url: Option<&str>) -> anyhow::Result<(PlantStore, PlantcareConfig)> {
    let resolved = PlantcareConfig::resolve(cli_db_url)?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    Ok((PlantStore::new(db_pool), resolved))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            bind,
            port,
            force,
        } => {
            cmd_init(&db_url, &bind, port, force)?;
        }
        Commands::DbInit { seed: with_seed } => {
            cmd_db_init(cli.database_url.as_deref(), with_seed).await?;
        }
        Commands::Seed => {
            let (store, _) = connect(cli.database_url.as_deref()).await?;
            let result = seed::seed_sample_plants(&store).await;
            store.close().await;
            println!("Seeded {} sample plant(s).", result?);
        }
        Commands::Serve { bind, port } => {
            let (store, resolved) = connect(cli.database_url.as_deref()).await?;
            let bind = bind.unwrap_or(resolved.server.bind);
            let port = port.unwrap_or(resolved.server.port);
            let result = serve_cmd::run_serve(store.clone(), &bind, port).await;
            store.close().await;
            result?;
        }
        Commands::Plant { command } => {
            let (store, _) = connect(cli.database_url.as_deref()).await?;
            let result = plant_cmds::run_plant_command(command, &store).await;
            store.close().await;
            result?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "plantcare",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_plant_add() {
        let cli = Cli::try_parse_from([
            "plantcare",
            "plant",
            "add",
            "Pothos",
            "--every",
            "7",
            "--last-watered",
            "2023-10-20",
        ])
        .unwrap();
        match cli.command {
            Commands::Plant {
                command:
                    PlantCommands::Add {
                        name,
                        every,
                        last_watered,
                        ..
                    },
            } => {
                assert_eq!(name, "Pothos");
                assert_eq!(every, 7);
                assert_eq!(last_watered.as_deref(), Some("2023-10-20"));
            }
            _ => panic!("expected plant add"),
        }
    }

    #[test]
    fn global_database_url_after_subcommand() {
        let cli = Cli::try_parse_from([
            "plantcare",
            "plant",
            "list",
            "--database-url",
            "postgresql://h:5432/db",
        ])
        .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("postgresql://h:5432/db"));
    }
}
