//! Booking engine service.
//!
//! Validation and authorization run before any write. The write itself is a
//! single [`TicketLedger::allocate`] call, which the adapters make atomic and
//! serialise per flight. Allocation conflicts (lost uniqueness races) are
//! retried a bounded number of times and then surfaced.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::authorization::{AgentGrant, require_customer, require_selling_agent};
use crate::domain::idempotency::{PurchaseFingerprint, PurchaseSubject};
use crate::domain::ports::{
    BookingCommand, BookingQuery, CatalogRepository, IdentityRepository, PurchaseTicketRequest,
    PurchaseTicketResponse, TicketLedger, TicketLedgerError,
};
use crate::domain::store_errors::{map_catalog_error, map_identity_error, map_ledger_error};
use crate::domain::{
    Actor, ActorContext, AllocationOutcome, BookingAgentId, Error, ErrorCode, Flight, FlightKey,
    PurchaseStamp, TicketAllocation,
};

/// Default number of retries after an allocation conflict.
pub const DEFAULT_ALLOCATION_RETRY_LIMIT: u32 = 3;

/// Tunables for the booking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    allocation_retry_limit: u32,
}

impl BookingPolicy {
    pub const fn new(allocation_retry_limit: u32) -> Self {
        Self {
            allocation_retry_limit,
        }
    }

    /// Retries allowed after the first allocation attempt.
    pub const fn allocation_retry_limit(&self) -> u32 {
        self.allocation_retry_limit
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOCATION_RETRY_LIMIT)
    }
}

/// Who is selling: `None` for a customer buying for themself, or the
/// approved agent selling on the customer's behalf.
fn seller_of<'a>(
    actor: &'a ActorContext,
    request: &PurchaseTicketRequest,
) -> Result<Option<AgentGrant<'a>>, Error> {
    match actor.actor() {
        Actor::Customer { email } if email == &request.customer => Ok(None),
        Actor::Customer { .. } => Err(Error::permission_denied(
            "customers may only purchase tickets for themselves",
        )),
        Actor::BookingAgent { .. } => require_selling_agent(actor).map(Some),
        Actor::AirlineStaff { .. } => Err(Error::permission_denied(
            "airline staff cannot purchase tickets",
        )),
    }
}

/// Booking engine implementing [`BookingCommand`] and [`BookingQuery`].
#[derive(Clone)]
pub struct BookingService<L, C, I> {
    ledger: Arc<L>,
    catalog: Arc<C>,
    identities: Arc<I>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl<L, C, I> BookingService<L, C, I> {
    /// Create a booking service over the given ports.
    pub fn new(
        ledger: Arc<L>,
        catalog: Arc<C>,
        identities: Arc<I>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            ledger,
            catalog,
            identities,
            clock,
            policy,
        }
    }
}

impl<L, C, I> BookingService<L, C, I>
where
    L: TicketLedger,
    C: CatalogRepository,
    I: IdentityRepository,
{
    /// Require the agent to have a work-for relation with the flight's airline.
    async fn ensure_agent_sells_for(
        &self,
        grant: &AgentGrant<'_>,
        flight: &Flight,
    ) -> Result<(), Error> {
        let agent = self
            .identities
            .find_agent(grant.email)
            .await
            .map_err(map_identity_error)?
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::AgentNotFound,
                    format!("booking agent {} not found", grant.email),
                )
            })?;
        if agent.works_for(flight.airline()) {
            return Ok(());
        }
        Err(Error::new(
            ErrorCode::AgentNotAuthorizedForAirline,
            format!(
                "booking agent {} does not work for {}",
                grant.email,
                flight.airline()
            ),
        ))
    }

    async fn ensure_customer_exists(&self, request: &PurchaseTicketRequest) -> Result<(), Error> {
        let found = self
            .identities
            .find_customer(&request.customer)
            .await
            .map_err(map_identity_error)?;
        if found.is_none() {
            return Err(Error::new(
                ErrorCode::CustomerNotFound,
                format!("customer {} not found", request.customer),
            ));
        }
        Ok(())
    }

    async fn load_flight(&self, key: &FlightKey) -> Result<Flight, Error> {
        self.catalog
            .find_flight(key)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(|| Error::new(ErrorCode::FlightNotFound, format!("flight {key} not found")))
    }

    fn stamp_for(
        request: &PurchaseTicketRequest,
        booking_agent: Option<BookingAgentId>,
    ) -> Result<Option<PurchaseStamp>, Error> {
        let Some(key) = request.idempotency_key else {
            return Ok(None);
        };
        let fingerprint = PurchaseFingerprint::of(&PurchaseSubject {
            flight: &request.flight,
            customer: &request.customer,
            booking_agent,
        })
        .map_err(|err| Error::internal(format!("fingerprint purchase request: {err}")))?;
        Ok(Some(PurchaseStamp { key, fingerprint }))
    }

    async fn allocate_with_retry(
        &self,
        allocation: &TicketAllocation,
    ) -> Result<AllocationOutcome, Error> {
        let mut retries_left = self.policy.allocation_retry_limit();
        loop {
            match self.ledger.allocate(allocation).await {
                Ok(outcome) => return Ok(outcome),
                Err(TicketLedgerError::AllocationConflict { message }) if retries_left > 0 => {
                    retries_left -= 1;
                    warn!(
                        flight = %allocation.flight,
                        retries_left,
                        %message,
                        "ticket allocation conflict; retrying"
                    );
                }
                Err(error) => return Err(map_ledger_error(error)),
            }
        }
    }
}

#[async_trait]
impl<L, C, I> BookingCommand for BookingService<L, C, I>
where
    L: TicketLedger,
    C: CatalogRepository,
    I: IdentityRepository,
{
    async fn purchase_ticket(
        &self,
        actor: &ActorContext,
        request: PurchaseTicketRequest,
    ) -> Result<PurchaseTicketResponse, Error> {
        let agent = seller_of(actor, &request)?;
        self.ensure_customer_exists(&request).await?;
        let flight = self.load_flight(&request.flight).await?;
        if let Some(grant) = &agent {
            self.ensure_agent_sells_for(grant, &flight).await?;
        }
        let booking_agent = agent.map(|grant| grant.agent_id);

        let allocation = TicketAllocation {
            stamp: Self::stamp_for(&request, booking_agent)?,
            flight: request.flight,
            customer: request.customer,
            booking_agent,
            purchase_date: self.clock.utc().date_naive(),
        };

        let outcome = self.allocate_with_retry(&allocation).await.inspect_err(|err| {
            warn!(
                flight = %allocation.flight,
                actor = %actor.identity_key(),
                code = ?err.code(),
                "ticket purchase refused"
            );
        })?;

        let replayed = matches!(outcome, AllocationOutcome::Replayed(_));
        info!(
            flight = %allocation.flight,
            customer = %allocation.customer,
            ticket_id = %outcome.ticket_id(),
            replayed,
            "ticket purchased"
        );

        Ok(PurchaseTicketResponse {
            ticket_id: outcome.ticket_id(),
            replayed,
        })
    }
}

#[async_trait]
impl<L, C, I> BookingQuery for BookingService<L, C, I>
where
    L: TicketLedger,
    C: CatalogRepository,
    I: IdentityRepository,
{
    async fn available_seats(&self, flight: &FlightKey) -> Result<i64, Error> {
        let inventory = self
            .ledger
            .seat_inventory(flight)
            .await
            .map_err(map_ledger_error)?
            .ok_or_else(|| {
                Error::new(ErrorCode::FlightNotFound, format!("flight {flight} not found"))
            })?;
        let available = inventory.available();
        if available < 0 {
            warn!(%flight, available, "flight is oversold");
        }
        Ok(available)
    }

    async fn customer_flights(
        &self,
        actor: &ActorContext,
        upcoming_only: bool,
    ) -> Result<Vec<Flight>, Error> {
        let email = require_customer(actor)?;
        let departing_after = upcoming_only.then(|| self.clock.utc());
        self.ledger
            .customer_flights(email, departing_after)
            .await
            .map_err(map_ledger_error)
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
