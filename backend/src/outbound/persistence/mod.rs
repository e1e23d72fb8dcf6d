//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the driven ports backed by PostgreSQL via
//! `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types; business rules stay in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Row locks for allocation**: ticket allocation locks the flight row with
//!   `SELECT ... FOR UPDATE`, so concurrent purchases of one flight serialise
//!   while purchases of different flights proceed in parallel.
//!
//! # Example
//!
//! ```ignore
//! use airline_backend::outbound::persistence::{DbPool, DieselTicketLedger, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/airline")).await?;
//! let ledger = DieselTicketLedger::new(pool);
//! ```

mod diesel_catalog_repository;
mod diesel_identity_repository;
mod diesel_ticket_ledger;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_catalog_repository::DieselCatalogRepository;
pub use diesel_identity_repository::DieselIdentityRepository;
pub use diesel_ticket_ledger::DieselTicketLedger;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
