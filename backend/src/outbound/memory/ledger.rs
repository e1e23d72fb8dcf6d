//! `TicketLedger` over the in-memory tables.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::idempotency::{StampComparison, compare_fingerprints};
use crate::domain::ports::{TicketLedger, TicketLedgerError};
use crate::domain::{
    AllocationOutcome, CustomerEmail, Flight, FlightKey, ReservationRefusal, SeatInventory,
    TicketAllocation,
};

use super::{InMemoryStore, StoredPurchase, Tables};

fn inventory_of(tables: &Tables, flight: &Flight) -> Result<SeatInventory, TicketLedgerError> {
    let airplane = tables
        .airplanes
        .get(&(flight.airline().clone(), flight.airplane_id()))
        .ok_or_else(|| {
            TicketLedgerError::query(format!(
                "airplane {} of flight {} is missing",
                flight.airplane_id(),
                flight.key()
            ))
        })?;
    Ok(SeatInventory::new(
        airplane.seats,
        tables.issued_for(flight.key()),
    ))
}

fn allocate_locked(
    tables: &mut Tables,
    allocation: &TicketAllocation,
) -> Result<AllocationOutcome, TicketLedgerError> {
    let key = &allocation.flight;
    let flight = tables
        .flights
        .get(key)
        .ok_or_else(|| TicketLedgerError::flight_not_found(key.to_string()))?;

    if let Some(stamp) = &allocation.stamp
        && let Some(ticket_id) = tables.stamps.get(stamp.key.as_uuid()).copied()
    {
        let stored = tables
            .purchases
            .get(&ticket_id)
            .and_then(|purchase| purchase.fingerprint.as_ref())
            .ok_or_else(|| TicketLedgerError::query("idempotency key stored without fingerprint"))?;
        return match compare_fingerprints(stored, &stamp.fingerprint) {
            StampComparison::Replay => Ok(AllocationOutcome::Replayed(ticket_id)),
            StampComparison::Conflict => Err(TicketLedgerError::idempotency_conflict(
                stamp.key.to_string(),
            )),
        };
    }

    inventory_of(tables, flight)?
        .check_reservation(flight.status())
        .map_err(|refusal| match refusal {
            ReservationRefusal::FlightCancelled => {
                TicketLedgerError::flight_cancelled(key.to_string())
            }
            ReservationRefusal::SoldOut => TicketLedgerError::sold_out(key.to_string()),
        })?;
    if !tables.customers.contains_key(&allocation.customer) {
        return Err(TicketLedgerError::customer_not_found(
            allocation.customer.as_str(),
        ));
    }

    let ticket_id = tables.next_ticket_id();
    tables.tickets.insert(ticket_id, key.clone());
    tables.purchases.insert(
        ticket_id,
        StoredPurchase {
            customer: allocation.customer.clone(),
            booking_agent: allocation.booking_agent,
            purchase_date: allocation.purchase_date,
            fingerprint: allocation.stamp.as_ref().map(|s| s.fingerprint.clone()),
        },
    );
    if let Some(stamp) = &allocation.stamp {
        tables.stamps.insert(*stamp.key.as_uuid(), ticket_id);
    }
    Ok(AllocationOutcome::Issued(ticket_id))
}

#[async_trait]
impl TicketLedger for InMemoryStore {
    async fn allocate(
        &self,
        allocation: &TicketAllocation,
    ) -> Result<AllocationOutcome, TicketLedgerError> {
        let mut tables = self.lock().map_err(TicketLedgerError::query)?;
        allocate_locked(&mut tables, allocation)
    }

    async fn seat_inventory(
        &self,
        flight: &FlightKey,
    ) -> Result<Option<SeatInventory>, TicketLedgerError> {
        let tables = self.lock().map_err(TicketLedgerError::query)?;
        tables
            .flights
            .get(flight)
            .map(|found| inventory_of(&tables, found))
            .transpose()
    }

    async fn customer_flights(
        &self,
        customer: &CustomerEmail,
        departing_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Flight>, TicketLedgerError> {
        let tables = self.lock().map_err(TicketLedgerError::query)?;
        let held: BTreeSet<&FlightKey> = tables
            .purchases
            .iter()
            .filter(|(_, purchase)| &purchase.customer == customer)
            .filter_map(|(ticket_id, _)| tables.tickets.get(ticket_id))
            .collect();
        let mut flights: Vec<Flight> = held
            .into_iter()
            .filter_map(|key| tables.flights.get(key))
            .filter(|found| departing_after.is_none_or(|after| found.departure_time() > after))
            .cloned()
            .collect();
        flights.sort_by(|a, b| {
            a.departure_time()
                .cmp(&b.departure_time())
                .then_with(|| a.key().cmp(b.key()))
        });
        Ok(flights)
    }
}
