//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`TicketLedger`]) are implemented by outbound
//! adapters. Driving ports (`*Command`, `*Query`, [`ActorDirectory`]) are
//! implemented by the domain services and called by whatever surface hosts
//! the engine.

mod macros;
pub(crate) use macros::define_port_error;

mod approval_command;
mod booking_command;
mod booking_query;
mod catalog_repository;
mod identity_repository;
mod inventory_command;
mod inventory_query;
mod registration_command;
mod ticket_ledger;

pub use approval_command::ApprovalCommand;
pub use booking_command::{BookingCommand, PurchaseTicketRequest, PurchaseTicketResponse};
pub use booking_query::BookingQuery;
#[cfg(test)]
pub use catalog_repository::MockCatalogRepository;
pub use catalog_repository::{CatalogRepository, CatalogRepositoryError};
#[cfg(test)]
pub use identity_repository::MockIdentityRepository;
pub use identity_repository::{IdentityRepository, IdentityRepositoryError};
pub use inventory_command::{
    CreateAirplaneRequest, CreateAirportRequest, CreateFlightRequest, InventoryCommand,
};
pub use inventory_query::{FlightStatusRequest, InventoryQuery, SearchFlightsRequest};
pub use registration_command::{
    ActorDirectory, AuthenticatedIdentity, RegisterAgentRequest, RegistrationCommand,
};
#[cfg(test)]
pub use ticket_ledger::MockTicketLedger;
pub use ticket_ledger::{TicketLedger, TicketLedgerError};
