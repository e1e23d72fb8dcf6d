//! Domain primitives, aggregates, and services of the booking engine.
//!
//! Purpose: define strongly typed entities for the identity store, the
//! inventory catalog, and the booking engine, and the services that enforce
//! their invariants. Adapters depend on this module; it never depends on
//! them.
//!
//! Public surface:
//! - Error / ErrorCode / ErrorCategory: stable failure taxonomy.
//! - ActorContext: explicit actor identity passed into every privileged call.
//! - SeatInventory: the capacity decision shared by all ledger adapters.
//! - BookingService, InventoryService, ApprovalService, RegistrationService:
//!   implementations of the driving ports.

pub mod accounts;
pub mod approval_service;
pub mod authorization;
pub mod booking;
pub mod booking_service;
pub mod error;
pub mod idempotency;
pub mod identity;
pub mod inventory;
pub mod inventory_service;
pub mod ports;
pub mod registration_service;

mod store_errors;

pub use self::accounts::{
    AgentApproval, BookingAgent, Customer, PostalAddress, StaffBootstrap, StaffMember,
    StaffRegistration, TravelDocument,
};
pub use self::approval_service::ApprovalService;
pub use self::booking::{
    AllocationOutcome, Purchase, PurchaseStamp, ReservationRefusal, SeatInventory,
    TicketAllocation, TicketId,
};
pub use self::booking_service::{BookingPolicy, BookingService};
pub use self::error::{Error, ErrorCategory, ErrorCode, ErrorValidationError};
pub use self::identity::{
    Actor, ActorContext, ActorRole, AgentEmail, AirlineName, ApprovalState, BookingAgentId,
    CustomerEmail, IdentityValidationError, Permission, StaffUsername,
};
pub use self::inventory::{
    AIRPORT_SEARCH_LIMIT, Airline, Airplane, AirplaneId, Airport, AirportName, Flight,
    FlightDraft, FlightKey, FlightNumber, FlightSearch, FlightStatus, InventoryValidationError,
    Price, SeatCapacity,
};
pub use self::inventory_service::InventoryService;
pub use self::registration_service::RegistrationService;
