//! Internal Diesel row structs and their conversions to domain types.
//!
//! Rows are implementation details of the persistence layer and never leave
//! it. Reads re-validate every value through the domain constructors; a
//! stored value that no longer validates surfaces as [`CorruptRow`].

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    AgentEmail, Airplane, AirplaneId, Airport, AirportName, AirlineName, ApprovalState,
    BookingAgent, BookingAgentId, Customer, CustomerEmail, Flight, FlightDraft, FlightKey,
    FlightNumber, Permission, PostalAddress, SeatCapacity, StaffMember, StaffUsername,
    TravelDocument,
};

use super::schema::{
    airline, airline_staff, airplane, airport, booking_agent, booking_agent_work_for, customer,
    flight, permission, purchases, ticket,
};

/// A stored value failed domain validation on the way out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt {table} row: {message}")]
pub(crate) struct CorruptRow {
    table: &'static str,
    message: String,
}

impl CorruptRow {
    fn new(table: &'static str, error: impl std::fmt::Display) -> Self {
        Self {
            table,
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = airline)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AirlineRow {
    pub airline_name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = airport)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AirportRow {
    pub airport_name: String,
    pub airport_city: String,
}

impl From<&Airport> for AirportRow {
    fn from(value: &Airport) -> Self {
        Self {
            airport_name: value.name.as_str().to_owned(),
            airport_city: value.city.clone(),
        }
    }
}

impl TryFrom<AirportRow> for Airport {
    type Error = CorruptRow;

    fn try_from(row: AirportRow) -> Result<Self, Self::Error> {
        Airport::new(row.airport_name, row.airport_city).map_err(|e| CorruptRow::new("airport", e))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = airplane)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AirplaneRow {
    pub airline_name: String,
    pub airplane_id: i32,
    pub seats: i32,
}

impl From<&Airplane> for AirplaneRow {
    fn from(value: &Airplane) -> Self {
        Self {
            airline_name: value.airline.as_str().to_owned(),
            airplane_id: value.airplane_id.get(),
            seats: value.seats.get(),
        }
    }
}

impl TryFrom<AirplaneRow> for Airplane {
    type Error = CorruptRow;

    fn try_from(row: AirplaneRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn std::fmt::Display| CorruptRow::new("airplane", e);
        Ok(Airplane {
            airline: AirlineName::new(row.airline_name).map_err(|e| corrupt(&e))?,
            airplane_id: AirplaneId::new(row.airplane_id).map_err(|e| corrupt(&e))?,
            seats: SeatCapacity::new(row.seats).map_err(|e| corrupt(&e))?,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = flight)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FlightRow {
    pub airline_name: String,
    pub flight_num: String,
    pub departure_airport: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_airport: String,
    pub arrival_time: DateTime<Utc>,
    pub price: i64,
    pub status: String,
    pub airplane_id: i32,
}

impl From<&Flight> for FlightRow {
    fn from(value: &Flight) -> Self {
        Self {
            airline_name: value.airline().as_str().to_owned(),
            flight_num: value.key().flight_num.as_str().to_owned(),
            departure_airport: value.departure_airport().as_str().to_owned(),
            departure_time: value.departure_time(),
            arrival_airport: value.arrival_airport().as_str().to_owned(),
            arrival_time: value.arrival_time(),
            price: value.price().get(),
            status: value.status().as_str().to_owned(),
            airplane_id: value.airplane_id().get(),
        }
    }
}

impl TryFrom<FlightRow> for Flight {
    type Error = CorruptRow;

    fn try_from(row: FlightRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn std::fmt::Display| CorruptRow::new("flight", e);
        let key = flight_key(row.airline_name, row.flight_num).map_err(|e| corrupt(&e))?;
        Flight::new(FlightDraft {
            key,
            departure_airport: AirportName::new(row.departure_airport).map_err(|e| corrupt(&e))?,
            departure_time: row.departure_time,
            arrival_airport: AirportName::new(row.arrival_airport).map_err(|e| corrupt(&e))?,
            arrival_time: row.arrival_time,
            price: row.price,
            status: row.status.parse().map_err(|e| corrupt(&e))?,
            airplane_id: AirplaneId::new(row.airplane_id).map_err(|e| corrupt(&e))?,
        })
        .map_err(|e| corrupt(&e))
    }
}

fn flight_key(airline_name: String, flight_num: String) -> Result<FlightKey, CorruptRow> {
    Ok(FlightKey::new(
        AirlineName::new(airline_name).map_err(|e| CorruptRow::new("flight", e))?,
        FlightNumber::new(flight_num).map_err(|e| CorruptRow::new("flight", e))?,
    ))
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = customer)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CustomerRow {
    pub email: String,
    pub name: String,
    pub building_number: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone_number: Option<String>,
    pub passport_number: Option<String>,
    pub passport_expiration: Option<NaiveDate>,
    pub passport_country: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl From<&Customer> for CustomerRow {
    fn from(value: &Customer) -> Self {
        let address = value.address.as_ref();
        let passport = value.passport.as_ref();
        Self {
            email: value.email.as_str().to_owned(),
            name: value.name.clone(),
            building_number: address.map(|a| a.building_number.clone()),
            street: address.map(|a| a.street.clone()),
            city: address.map(|a| a.city.clone()),
            state: address.map(|a| a.state.clone()),
            phone_number: value.phone_number.clone(),
            passport_number: passport.map(|p| p.passport_number.clone()),
            passport_expiration: passport.map(|p| p.passport_expiration),
            passport_country: passport.map(|p| p.passport_country.clone()),
            date_of_birth: value.date_of_birth,
        }
    }
}

impl TryFrom<CustomerRow> for Customer {
    type Error = CorruptRow;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let address = match (row.building_number, row.street, row.city, row.state) {
            (Some(building_number), Some(street), Some(city), Some(state)) => Some(PostalAddress {
                building_number,
                street,
                city,
                state,
            }),
            _ => None,
        };
        let passport = match (
            row.passport_number,
            row.passport_expiration,
            row.passport_country,
        ) {
            (Some(passport_number), Some(passport_expiration), Some(passport_country)) => {
                Some(TravelDocument {
                    passport_number,
                    passport_expiration,
                    passport_country,
                })
            }
            _ => None,
        };
        Ok(Customer {
            email: CustomerEmail::new(row.email).map_err(|e| CorruptRow::new("customer", e))?,
            name: row.name,
            phone_number: row.phone_number,
            address,
            passport,
            date_of_birth: row.date_of_birth,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = booking_agent)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingAgentRow {
    pub email: String,
    pub booking_agent_id: i32,
    pub approved: bool,
}

impl From<&BookingAgent> for BookingAgentRow {
    fn from(value: &BookingAgent) -> Self {
        Self {
            email: value.email.as_str().to_owned(),
            booking_agent_id: value.agent_id.get(),
            approved: value.approval.is_approved(),
        }
    }
}

/// Combine an agent row with its affiliation rows.
pub(crate) fn booking_agent_from_rows(
    row: BookingAgentRow,
    airlines: impl IntoIterator<Item = String>,
) -> Result<BookingAgent, CorruptRow> {
    let corrupt = |e: &dyn std::fmt::Display| CorruptRow::new("booking_agent", e);
    let airlines = airlines
        .into_iter()
        .map(|name| AirlineName::new(name).map_err(|e| corrupt(&e)))
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(BookingAgent {
        email: AgentEmail::new(row.email).map_err(|e| corrupt(&e))?,
        agent_id: BookingAgentId::new(row.booking_agent_id).map_err(|e| corrupt(&e))?,
        approval: ApprovalState::from_flag(row.approved),
        airlines,
    })
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = booking_agent_work_for)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WorkForRow {
    pub email: String,
    pub airline_name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = airline_staff)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StaffRow {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub airline_name: String,
    pub approved: bool,
}

impl From<&StaffMember> for StaffRow {
    fn from(value: &StaffMember) -> Self {
        Self {
            username: value.username.as_str().to_owned(),
            first_name: value.first_name.clone(),
            last_name: value.last_name.clone(),
            date_of_birth: value.date_of_birth,
            airline_name: value.airline.as_str().to_owned(),
            approved: value.approval.is_approved(),
        }
    }
}

/// Combine a staff row with its permission labels.
pub(crate) fn staff_member_from_rows(
    row: StaffRow,
    permissions: impl IntoIterator<Item = String>,
) -> Result<StaffMember, CorruptRow> {
    let corrupt = |e: &dyn std::fmt::Display| CorruptRow::new("airline_staff", e);
    let permissions = permissions
        .into_iter()
        .map(|label| label.parse::<Permission>().map_err(|e| corrupt(&e)))
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(StaffMember {
        username: StaffUsername::new(row.username).map_err(|e| corrupt(&e))?,
        airline: AirlineName::new(row.airline_name).map_err(|e| corrupt(&e))?,
        first_name: row.first_name,
        last_name: row.last_name,
        date_of_birth: row.date_of_birth,
        approval: ApprovalState::from_flag(row.approved),
        permissions,
    })
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = permission)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PermissionRow {
    pub username: String,
    pub permission_type: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ticket)]
pub(crate) struct NewTicketRow<'a> {
    pub airline_name: &'a str,
    pub flight_num: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = purchases)]
pub(crate) struct NewPurchaseRow<'a> {
    pub ticket_id: i64,
    pub customer_email: &'a str,
    pub booking_agent_id: Option<i32>,
    pub purchase_date: NaiveDate,
    pub idempotency_key: Option<Uuid>,
    pub request_fingerprint: Option<String>,
}
