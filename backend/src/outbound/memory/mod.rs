//! Single-process store implementing every driven port.
//!
//! All tables live behind one [`Mutex`] and every port call holds it for the
//! whole operation. That gives the same all-or-nothing behaviour the
//! PostgreSQL adapter gets from transactions, and serialises allocations
//! globally rather than per flight.
//!
//! A poisoned lock is reported as the port's `Query` error; the tables are
//! never observed half-written because no operation panics while mutating.

mod catalog;
mod identity;
mod ledger;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::idempotency::PurchaseFingerprint;
use crate::domain::{
    AgentEmail, AirlineName, Airplane, AirplaneId, Airport, AirportName, BookingAgent,
    BookingAgentId, Customer, CustomerEmail, Flight, FlightKey, StaffMember, StaffUsername,
    TicketId,
};

/// Purchase row as kept by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredPurchase {
    customer: CustomerEmail,
    booking_agent: Option<BookingAgentId>,
    purchase_date: NaiveDate,
    fingerprint: Option<PurchaseFingerprint>,
}

#[derive(Debug, Default)]
struct Tables {
    airlines: BTreeSet<AirlineName>,
    airports: BTreeMap<AirportName, Airport>,
    airplanes: BTreeMap<(AirlineName, AirplaneId), Airplane>,
    flights: BTreeMap<FlightKey, Flight>,
    customers: BTreeMap<CustomerEmail, Customer>,
    agents: BTreeMap<AgentEmail, BookingAgent>,
    staff: BTreeMap<StaffUsername, StaffMember>,
    tickets: BTreeMap<TicketId, FlightKey>,
    purchases: BTreeMap<TicketId, StoredPurchase>,
    stamps: BTreeMap<Uuid, TicketId>,
    last_ticket_id: i64,
}

impl Tables {
    fn issued_for(&self, flight: &FlightKey) -> i64 {
        let issued = self.tickets.values().filter(|key| *key == flight).count();
        i64::try_from(issued).unwrap_or(i64::MAX)
    }

    fn next_ticket_id(&mut self) -> TicketId {
        self.last_ticket_id += 1;
        TicketId::new(self.last_ticket_id)
    }
}

/// In-memory implementation of the ticket ledger, catalog and identity
/// ports. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, String> {
        self.tables
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }

    /// Number of tickets issued for `flight`.
    pub fn issued_tickets(&self, flight: &FlightKey) -> i64 {
        self.lock()
            .map(|tables| tables.issued_for(flight))
            .unwrap_or_default()
    }

    /// Total tickets across all flights.
    pub fn ticket_count(&self) -> usize {
        self.lock()
            .map(|tables| tables.tickets.len())
            .unwrap_or_default()
    }

    /// Tickets with no purchase row. Always zero unless an allocation was
    /// torn.
    pub fn orphan_tickets(&self) -> usize {
        self.lock()
            .map(|tables| {
                tables
                    .tickets
                    .keys()
                    .filter(|id| !tables.purchases.contains_key(id))
                    .count()
            })
            .unwrap_or_default()
    }

    /// Booking agent credited on a ticket, if any.
    pub fn seller_of(&self, ticket: TicketId) -> Option<BookingAgentId> {
        self.lock()
            .ok()
            .and_then(|tables| tables.purchases.get(&ticket).and_then(|p| p.booking_agent))
    }

    /// Date recorded on a ticket's purchase.
    pub fn purchase_date_of(&self, ticket: TicketId) -> Option<NaiveDate> {
        self.lock()
            .ok()
            .and_then(|tables| tables.purchases.get(&ticket).map(|p| p.purchase_date))
    }
}
