//! Port for issuing tickets and reading seat inventory.
//!
//! `allocate` is the single write path for tickets. Implementations must run
//! the capacity check, ticket insert, and purchase insert as one atomic unit
//! serialised per flight: either both rows exist afterwards or neither does.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AllocationOutcome, CustomerEmail, Flight, FlightKey, SeatInventory, TicketAllocation};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ticket ledger adapters.
    pub enum TicketLedgerError {
        /// The flight does not exist.
        FlightNotFound { flight: String } => "flight {flight} not found",
        /// The flight is cancelled.
        FlightCancelled { flight: String } => "flight {flight} is cancelled",
        /// No seats remain.
        SoldOut { flight: String } => "flight {flight} is sold out",
        /// The purchasing customer does not exist.
        CustomerNotFound { customer: String } => "customer {customer} not found",
        /// The idempotency key was already used for a different request.
        IdempotencyConflict { key: String } =>
            "idempotency key {key} was used for a different purchase",
        /// A uniqueness race lost against a concurrent allocation; retryable.
        AllocationConflict { message: String } => "ticket allocation conflict: {message}",
        /// Ledger connection could not be established.
        Connection { message: String } => "ticket ledger connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "ticket ledger query failed: {message}",
    }
}

/// Port for the booking engine's ticket storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketLedger: Send + Sync {
    /// Issue one ticket and its purchase atomically.
    async fn allocate(
        &self,
        allocation: &TicketAllocation,
    ) -> Result<AllocationOutcome, TicketLedgerError>;

    /// Capacity and issued count for a flight, or `None` if it does not exist.
    async fn seat_inventory(
        &self,
        flight: &FlightKey,
    ) -> Result<Option<SeatInventory>, TicketLedgerError>;

    /// Flights the customer holds tickets for, ordered by departure. When
    /// `departing_after` is set only later departures are returned.
    async fn customer_flights(
        &self,
        customer: &CustomerEmail,
        departing_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Flight>, TicketLedgerError>;
}
