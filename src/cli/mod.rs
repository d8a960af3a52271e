//! Demo console for evslot.
//!
//! Provides subcommands that drive the library against the configured store:
//! - `stations` - List stations with vacancy (and distance when `--near` is given)
//! - `register` / `login` / `logout` / `whoami` - Account and session handling
//! - `upsert-station` / `delete-station` / `slots` - Admin station management
//! - `book` - Take a slot at a station
//! - `simulate` - Run the departure simulation and print changes

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::{self, ApiError};
use crate::db::{LoginRequest, PowerLevel, RegisterRequest, Role, StationPatch};
use crate::ui::{MapView, StationView};
use crate::utils::geo::GeoPoint;
use crate::AppContext;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "evslot")]
#[command(author, version, about = "EV charging station discovery and slot booking", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "evslot.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Override the store data directory
    #[arg(long, env = "EVSLOT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stations with live availability
    Stations {
        /// Filter by name or address
        #[arg(short, long, default_value = "")]
        query: String,
        /// Only show stations of this power level (slow, fast, ultra)
        #[arg(short, long)]
        power: Option<PowerLevel>,
        /// Your position as "lat,lng"; enables distances and nearest-first order
        #[arg(long, value_parser = parse_point)]
        near: Option<GeoPoint>,
    },

    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "user")]
        role: Role,
    },

    /// Log in and become the current session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "user")]
        role: Role,
    },

    /// Clear the current session
    Logout,

    /// Show the current session
    Whoami,

    /// Create a station, or update one when --id matches (admin)
    UpsertStation {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        #[arg(long)]
        power: Option<PowerLevel>,
    },

    /// Delete a station (admin)
    DeleteStation {
        id: String,
    },

    /// Set slot capacity and nominal duration for a station (admin)
    Slots {
        id: String,
        #[arg(long)]
        total: u32,
        #[arg(long, default_value = "60")]
        duration: u32,
    },

    /// Book one slot at a station
    Book {
        id: String,
    },

    /// Run the departure simulation, printing every change
    Simulate {
        /// Stop after this many changes (default: run until Ctrl+C)
        #[arg(long)]
        ticks: Option<u32>,
    },
}

/// Parse "lat,lng" into a validated point
pub fn parse_point(raw: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got '{}'", raw))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;
    GeoPoint::new(lat, lng).map_err(|e| e.to_string())
}

fn print_station(view: &StationView) {
    let station = &view.station;
    let distance = view
        .distance_label
        .as_ref()
        .map(|d| format!(" • {}", d))
        .unwrap_or_default();
    println!(
        "{}  {} [{}]  {}",
        station.id, station.name, station.power, view.availability
    );
    println!("    {}{}  {}", station.address, distance, station.phone);
    println!("    {}", view.slot_summary());
}

/// Execute a subcommand against the application context
pub async fn run(ctx: &AppContext, command: Commands) -> Result<(), ApiError> {
    let store = &ctx.store;

    match command {
        Commands::Stations { query, power, near } => {
            if near.is_some() {
                ctx.set_user_position(near);
            }
            let views = ctx.station_views(&query, power);
            if views.is_empty() {
                println!("No stations found.");
                return Ok(());
            }
            for view in &views {
                print_station(view);
            }
            let stations: Vec<_> = views.into_iter().map(|v| v.station).collect();
            if let MapView::Schematic(text) = ctx.refresh_map(&stations) {
                println!();
                println!("{}", text);
            }
        }

        Commands::Register {
            name,
            email,
            password,
            role,
        } => {
            let user = api::auth::register(
                store,
                RegisterRequest {
                    name: name.trim().to_string(),
                    email: email.trim().to_string(),
                    password,
                    role,
                },
            )?;
            println!("Registered {} ({}). You can login now.", user.email, user.role);
        }

        Commands::Login {
            email,
            password,
            role,
        } => {
            let user = api::auth::login(
                store,
                LoginRequest {
                    email: email.trim().to_string(),
                    password,
                    role,
                },
            )?;
            println!("Login successful. Welcome, {}.", user.name);
        }

        Commands::Logout => {
            api::auth::logout(store)?;
            println!("Logged out.");
        }

        Commands::Whoami => match ctx.session() {
            Some(session) => println!("{} ({}) [{}]", session.name, session.role, session.id),
            None => println!("Not logged in."),
        },

        Commands::UpsertStation {
            id,
            name,
            address,
            phone,
            lat,
            lng,
            power,
        } => {
            api::auth::require_role(store, Role::Admin)?;
            let station = api::stations::upsert(
                store,
                StationPatch {
                    id,
                    name: name.map(|s| s.trim().to_string()),
                    address: address.map(|s| s.trim().to_string()),
                    phone: phone.map(|s| s.trim().to_string()),
                    lat,
                    lng,
                    power,
                    ..Default::default()
                },
            )?;
            println!("Saved station {} ({}).", station.name, station.id);
        }

        Commands::DeleteStation { id } => {
            api::auth::require_role(store, Role::Admin)?;
            api::stations::delete(store, &id)?;
            println!("Deleted station {}.", id);
        }

        Commands::Slots {
            id,
            total,
            duration,
        } => {
            api::auth::require_role(store, Role::Admin)?;
            let station = api::stations::set_slot_config(store, &id, total, duration)?;
            let view = StationView::new(station, None);
            println!("{}: {} ({})", view.station.name, view.slot_summary(), view.availability);
        }

        Commands::Book { id } => {
            api::auth::require_role(store, Role::User)?;
            let station = api::booking::book(store, &id)?;
            let view = StationView::new(station, None);
            println!(
                "Slot booked successfully at {}: {}",
                view.station.name,
                view.vacancy_detail()
            );
        }

        Commands::Simulate { ticks } => {
            simulate(ctx, ticks).await;
        }
    }

    Ok(())
}

async fn simulate(ctx: &AppContext, ticks: Option<u32>) {
    if !ctx.config.simulation.enabled {
        println!("Simulation is disabled in the configuration.");
        return;
    }

    let ticker = ctx.ticker();
    let mut updates = ticker.subscribe();
    ticker.start();
    println!(
        "Simulating departures every {}s (Ctrl+C to stop)",
        ctx.config.simulation.interval_seconds
    );

    let mut seen = 0u32;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                for station in &snapshot {
                    let view = StationView::new(station.clone(), None);
                    println!("{}: {}", view.station.name, view.vacancy_detail());
                }
                println!();

                seen += 1;
                if ticks.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    ticker.stop();
}
