//! PostgreSQL-backed `TicketLedger` implementation using Diesel ORM.
//!
//! # Capacity protection
//!
//! `allocate` runs in one transaction that takes `SELECT ... FOR UPDATE` on
//! the flight row before counting tickets. Concurrent purchases of the same
//! flight therefore queue behind each other, and each one sees every ticket
//! committed before it acquired the lock. Purchases of different flights do
//! not contend.
//!
//! The idempotency stamp is checked under the same lock, so a retried
//! request for the same flight finds the committed purchase rather than
//! racing it. A key reused across flights is caught by the unique index on
//! `purchases.idempotency_key` and reported as an allocation conflict; the
//! service retries and the retry sees the committed stamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::idempotency::{PurchaseFingerprint, StampComparison, compare_fingerprints};
use crate::domain::ports::{TicketLedger, TicketLedgerError};
use crate::domain::{
    AllocationOutcome, CustomerEmail, Flight, FlightKey, FlightStatus, PurchaseStamp,
    ReservationRefusal, SeatCapacity, SeatInventory, TicketAllocation, TicketId,
};

use super::error_mapping::{
    DieselFailure, classify_diesel_error, map_corrupt_row_with, map_pool_error_with,
};
use super::models::{FlightRow, NewPurchaseRow, NewTicketRow};
use super::pool::{DbPool, PoolError};
use super::schema::{airplane, flight, purchases, ticket};

const PURCHASES_CUSTOMER_FKEY: &str = "purchases_customer_fkey";

/// Diesel-backed ticket ledger.
#[derive(Clone)]
pub struct DieselTicketLedger {
    pool: DbPool,
}

impl DieselTicketLedger {
    /// Create a ledger over the given connection pool.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use airline_backend::outbound::persistence::{DbPool, DieselTicketLedger, PoolConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/airline")).await?;
    /// let ledger = DieselTicketLedger::new(pool);
    /// # let _ = ledger;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TicketLedgerError {
    map_pool_error_with(error, TicketLedgerError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> TicketLedgerError {
    match classify_diesel_error(error, "ticket ledger") {
        DieselFailure::Connection => TicketLedgerError::connection("database connection error"),
        DieselFailure::Serialization => {
            TicketLedgerError::allocation_conflict("serialization failure")
        }
        DieselFailure::UniqueViolation { .. } => {
            TicketLedgerError::allocation_conflict("concurrent ticket or stamp insert")
        }
        failure @ DieselFailure::ForeignKeyViolation { .. } => {
            if failure.violates(PURCHASES_CUSTOMER_FKEY) {
                TicketLedgerError::customer_not_found("referenced customer")
            } else {
                TicketLedgerError::query("foreign key violation")
            }
        }
        DieselFailure::Query(message) => TicketLedgerError::query(message),
    }
}

/// Failure inside the allocation transaction: either a business refusal
/// decided under the lock or a driver error.
#[derive(Debug)]
enum AllocationFailure {
    Refused(TicketLedgerError),
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for AllocationFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

impl AllocationFailure {
    fn into_port_error(self, allocation: &TicketAllocation) -> TicketLedgerError {
        match self {
            Self::Refused(error) => error,
            Self::Database(error) => match map_diesel_error(error) {
                TicketLedgerError::CustomerNotFound { .. } => {
                    TicketLedgerError::customer_not_found(allocation.customer.as_str())
                }
                other => other,
            },
        }
    }
}

fn refusal_error(refusal: ReservationRefusal, flight: &FlightKey) -> TicketLedgerError {
    match refusal {
        ReservationRefusal::FlightCancelled => TicketLedgerError::flight_cancelled(flight.to_string()),
        ReservationRefusal::SoldOut => TicketLedgerError::sold_out(flight.to_string()),
    }
}

/// Capacity and issued count for a flight flown by `airplane_id`.
async fn load_inventory(
    conn: &mut AsyncPgConnection,
    key: &FlightKey,
    airplane_id: i32,
) -> Result<SeatInventory, AllocationFailure> {
    let seats: i32 = airplane::table
        .filter(airplane::airline_name.eq(key.airline.as_str()))
        .filter(airplane::airplane_id.eq(airplane_id))
        .select(airplane::seats)
        .first(conn)
        .await?;
    let issued: i64 = ticket::table
        .filter(ticket::airline_name.eq(key.airline.as_str()))
        .filter(ticket::flight_num.eq(key.flight_num.as_str()))
        .count()
        .get_result(conn)
        .await?;
    let capacity = SeatCapacity::new(seats).map_err(|err| {
        AllocationFailure::Refused(TicketLedgerError::query(format!(
            "corrupt airplane capacity for {key}: {err}"
        )))
    })?;
    Ok(SeatInventory::new(capacity, issued))
}

/// Look up an earlier purchase carrying the same idempotency key.
async fn replay_stamp(
    conn: &mut AsyncPgConnection,
    stamp: &PurchaseStamp,
) -> Result<Option<AllocationOutcome>, AllocationFailure> {
    let stored: Option<(i64, Option<String>)> = purchases::table
        .filter(purchases::idempotency_key.eq(stamp.key.as_uuid()))
        .select((purchases::ticket_id, purchases::request_fingerprint))
        .first(conn)
        .await
        .optional()?;
    let Some((ticket_id, fingerprint)) = stored else {
        return Ok(None);
    };
    let stored_fingerprint = fingerprint
        .as_deref()
        .map(PurchaseFingerprint::from_hex)
        .transpose()
        .map_err(|err| {
            AllocationFailure::Refused(TicketLedgerError::query(format!(
                "corrupt purchase fingerprint: {err}"
            )))
        })?
        .ok_or_else(|| {
            AllocationFailure::Refused(TicketLedgerError::query(
                "idempotency key stored without fingerprint",
            ))
        })?;
    match compare_fingerprints(&stored_fingerprint, &stamp.fingerprint) {
        StampComparison::Replay => Ok(Some(AllocationOutcome::Replayed(TicketId::new(ticket_id)))),
        StampComparison::Conflict => Err(AllocationFailure::Refused(
            TicketLedgerError::idempotency_conflict(stamp.key.to_string()),
        )),
    }
}

async fn allocate_locked(
    conn: &mut AsyncPgConnection,
    allocation: &TicketAllocation,
) -> Result<AllocationOutcome, AllocationFailure> {
    let key = &allocation.flight;
    let locked: Option<(String, i32)> = flight::table
        .filter(flight::airline_name.eq(key.airline.as_str()))
        .filter(flight::flight_num.eq(key.flight_num.as_str()))
        .select((flight::status, flight::airplane_id))
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let Some((status_label, airplane_id)) = locked else {
        return Err(AllocationFailure::Refused(
            TicketLedgerError::flight_not_found(key.to_string()),
        ));
    };

    if let Some(stamp) = &allocation.stamp
        && let Some(outcome) = replay_stamp(conn, stamp).await?
    {
        return Ok(outcome);
    }

    let status: FlightStatus = status_label.parse().map_err(|err| {
        AllocationFailure::Refused(TicketLedgerError::query(format!(
            "corrupt status for {key}: {err}"
        )))
    })?;
    load_inventory(conn, key, airplane_id)
        .await?
        .check_reservation(&status)
        .map_err(|refusal| AllocationFailure::Refused(refusal_error(refusal, key)))?;

    let ticket_id: i64 = diesel::insert_into(ticket::table)
        .values(&NewTicketRow {
            airline_name: key.airline.as_str(),
            flight_num: key.flight_num.as_str(),
        })
        .returning(ticket::ticket_id)
        .get_result(conn)
        .await?;

    diesel::insert_into(purchases::table)
        .values(&NewPurchaseRow {
            ticket_id,
            customer_email: allocation.customer.as_str(),
            booking_agent_id: allocation.booking_agent.map(i32::from),
            purchase_date: allocation.purchase_date,
            idempotency_key: allocation.stamp.as_ref().map(|s| *s.key.as_uuid()),
            request_fingerprint: allocation.stamp.as_ref().map(|s| s.fingerprint.to_hex()),
        })
        .execute(conn)
        .await?;

    Ok(AllocationOutcome::Issued(TicketId::new(ticket_id)))
}

#[async_trait]
impl TicketLedger for DieselTicketLedger {
    async fn allocate(
        &self,
        allocation: &TicketAllocation,
    ) -> Result<AllocationOutcome, TicketLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction::<_, AllocationFailure, _>(|conn| {
                async move { allocate_locked(conn, allocation).await }.scope_boxed()
            })
            .await
            .map_err(|failure| failure.into_port_error(allocation))?;

        debug!(flight = %allocation.flight, ?outcome, "ticket allocation committed");
        Ok(outcome)
    }

    async fn seat_inventory(
        &self,
        flight_key: &FlightKey,
    ) -> Result<Option<SeatInventory>, TicketLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let airplane_id: Option<i32> = flight::table
            .filter(flight::airline_name.eq(flight_key.airline.as_str()))
            .filter(flight::flight_num.eq(flight_key.flight_num.as_str()))
            .select(flight::airplane_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(airplane_id) = airplane_id else {
            return Ok(None);
        };

        load_inventory(&mut conn, flight_key, airplane_id)
            .await
            .map(Some)
            .map_err(|failure| match failure {
                AllocationFailure::Refused(error) => error,
                AllocationFailure::Database(error) => map_diesel_error(error),
            })
    }

    async fn customer_flights(
        &self,
        customer: &CustomerEmail,
        departing_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Flight>, TicketLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = purchases::table
            .inner_join(ticket::table)
            .inner_join(
                flight::table.on(flight::airline_name
                    .eq(ticket::airline_name)
                    .and(flight::flight_num.eq(ticket::flight_num))),
            )
            .filter(purchases::customer_email.eq(customer.as_str()))
            .select(FlightRow::as_select())
            .distinct()
            .order((
                flight::departure_time.asc(),
                flight::airline_name.asc(),
                flight::flight_num.asc(),
            ))
            .into_boxed();
        if let Some(after) = departing_after {
            query = query.filter(flight::departure_time.gt(after));
        }

        let rows: Vec<FlightRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| {
                Flight::try_from(row)
                    .map_err(|err| map_corrupt_row_with(err, TicketLedgerError::query))
            })
            .collect()
    }
}
