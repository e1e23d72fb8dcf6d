//! Operator tool for the airline booking store.
//!
//! Applies migrations, provisions airlines, and runs the public read
//! queries against PostgreSQL. Connection settings come from `AIRLINE_*`
//! environment variables or the configuration file; `--database-url`
//! overrides them.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use airline_backend::config::BookingSettings;
use airline_backend::domain::ports::{
    BookingQuery, CatalogRepository, InventoryQuery, SearchFlightsRequest,
};
use airline_backend::domain::{
    Airline, AirlineName, BookingService, FlightKey, FlightNumber, InventoryService,
};
use airline_backend::outbound::persistence::{
    DbPool, DieselCatalogRepository, DieselIdentityRepository, DieselTicketLedger,
    run_pending_migrations,
};
use airline_backend::telemetry::init_tracing;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig as _;
use tokio::runtime::Builder;
use tracing::info;

/// `airline-admin` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "airline-admin",
    about = "Operate the airline booking store",
    version
)]
struct CliArgs {
    /// Database connection URL. Overrides `AIRLINE_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Provision a new airline.
    AddAirline {
        /// Airline name.
        name: String,
    },
    /// Print the seats left on a flight.
    Seats {
        /// Operating airline.
        airline: String,
        /// Flight number within the airline.
        flight_num: String,
    },
    /// Search upcoming flights.
    Search {
        /// Departure airport or city substring.
        #[arg(long = "from")]
        source: Option<String>,
        /// Arrival airport or city substring.
        #[arg(long = "to")]
        destination: Option<String>,
        /// First departure day (inclusive), `YYYY-MM-DD`.
        #[arg(long = "start")]
        start_date: Option<NaiveDate>,
        /// Last departure day (inclusive), `YYYY-MM-DD`.
        #[arg(long = "end")]
        end_date: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let mut settings = BookingSettings::load_from_iter([OsString::from("airline-admin")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    if let Some(url) = args.database_url {
        settings.database_url = Some(url);
    }
    let pool_config = settings
        .pool_config()
        .ok_or_else(|| eyre!("no database URL: set AIRLINE_DATABASE_URL or --database-url"))?;

    if matches!(args.command, Command::Migrate) {
        let url = pool_config.database_url().to_owned();
        let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
            .await
            .wrap_err("migration task panicked")??;
        info!(count = applied.len(), "migrations applied");
        for version in applied {
            println!("applied {version}");
        }
        return Ok(());
    }

    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("failed to create database pool")?;
    let catalog = Arc::new(DieselCatalogRepository::new(pool.clone()));

    match args.command {
        Command::Migrate => Ok(()),
        Command::AddAirline { name } => {
            let name = AirlineName::new(name)?;
            catalog
                .insert_airline(&Airline { name: name.clone() })
                .await
                .wrap_err_with(|| format!("failed to add airline {name}"))?;
            info!(airline = %name, "airline provisioned");
            println!("added {name}");
            Ok(())
        }
        Command::Seats {
            airline,
            flight_num,
        } => {
            let key = FlightKey::new(AirlineName::new(airline)?, FlightNumber::new(flight_num)?);
            let booking = BookingService::new(
                Arc::new(DieselTicketLedger::new(pool.clone())),
                catalog,
                Arc::new(DieselIdentityRepository::new(pool)),
                Arc::new(DefaultClock),
                settings.booking_policy(),
            );
            let seats = booking.available_seats(&key).await?;
            println!("{key}: {seats} seats available");
            Ok(())
        }
        Command::Search {
            source,
            destination,
            start_date,
            end_date,
        } => {
            let inventory = InventoryService::new(catalog, Arc::new(DefaultClock));
            let flights = inventory
                .search_flights(SearchFlightsRequest {
                    source,
                    destination,
                    start_date,
                    end_date,
                })
                .await?;
            for flight in flights {
                println!(
                    "{} {} -> {} departs {} status {}",
                    flight.key(),
                    flight.departure_airport(),
                    flight.arrival_airport(),
                    flight.departure_time().to_rfc3339(),
                    flight.status()
                );
            }
            Ok(())
        }
    }
}
