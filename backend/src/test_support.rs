//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and when the `test-support` feature is enabled.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    ActorContext, AgentEmail, AirlineName, AirplaneId, AirportName, ApprovalState, BookingAgentId,
    CustomerEmail, Flight, FlightDraft, FlightKey, FlightNumber, FlightStatus, Permission,
    StaffUsername,
};

/// Clock whose current instant is set by the test.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    pub fn advance_hours(&self, hours: i64) {
        *self.lock_clock() += Duration::hours(hours);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Noon UTC on 2026-03-01, the reference "now" of the test suites.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Builders for domain values with known-valid literals.
///
/// Each helper panics on invalid input; they are intended for fixtures only.
pub mod fixtures {
    use super::*;

    pub fn airline(name: &str) -> AirlineName {
        AirlineName::new(name).unwrap_or_else(|err| panic!("airline {name}: {err}"))
    }

    pub fn customer_email(email: &str) -> CustomerEmail {
        CustomerEmail::new(email).unwrap_or_else(|err| panic!("customer {email}: {err}"))
    }

    pub fn agent_email(email: &str) -> AgentEmail {
        AgentEmail::new(email).unwrap_or_else(|err| panic!("agent {email}: {err}"))
    }

    pub fn agent_id(id: i32) -> BookingAgentId {
        BookingAgentId::new(id).unwrap_or_else(|err| panic!("agent id {id}: {err}"))
    }

    pub fn username(name: &str) -> StaffUsername {
        StaffUsername::new(name).unwrap_or_else(|err| panic!("username {name}: {err}"))
    }

    pub fn airport(name: &str) -> AirportName {
        AirportName::new(name).unwrap_or_else(|err| panic!("airport {name}: {err}"))
    }

    pub fn airplane_id(id: i32) -> AirplaneId {
        AirplaneId::new(id).unwrap_or_else(|err| panic!("airplane {id}: {err}"))
    }

    pub fn flight_key(airline_name: &str, number: &str) -> FlightKey {
        let number = FlightNumber::new(number).unwrap_or_else(|err| panic!("flight {number}: {err}"));
        FlightKey::new(airline(airline_name), number)
    }

    /// A three-hour upcoming flight from JFK to LAX departing `departure`.
    pub fn flight(key: FlightKey, departure: DateTime<Utc>, airplane: i32) -> Flight {
        Flight::new(FlightDraft {
            key,
            departure_airport: airport("JFK"),
            departure_time: departure,
            arrival_airport: airport("LAX"),
            arrival_time: departure + Duration::hours(3),
            price: 250,
            status: FlightStatus::Upcoming,
            airplane_id: airplane_id(airplane),
        })
        .unwrap_or_else(|err| panic!("flight fixture: {err}"))
    }

    pub fn customer_actor(email: &str) -> ActorContext {
        ActorContext::customer(customer_email(email))
    }

    pub fn agent_actor(email: &str, id: i32, approval: ApprovalState) -> ActorContext {
        ActorContext::booking_agent(agent_email(email), agent_id(id), approval)
    }

    pub fn staff_actor(
        name: &str,
        airline_name: &str,
        approval: ApprovalState,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> ActorContext {
        ActorContext::airline_staff(username(name), airline(airline_name), approval, permissions)
    }

    /// Approved Admin of `airline_name`.
    pub fn admin_actor(name: &str, airline_name: &str) -> ActorContext {
        staff_actor(name, airline_name, ApprovalState::Approved, [Permission::Admin])
    }
}
