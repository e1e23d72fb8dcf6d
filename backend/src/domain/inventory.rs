//! Inventory catalog: airlines, airports, airplanes, and flights.
//!
//! Flights never store their remaining capacity. Capacity comes from the
//! assigned airplane and availability is derived from issued tickets at read
//! time (see [`crate::domain::SeatInventory`]).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::identity::AirlineName;

/// Maximum number of airports returned by a name-or-city lookup.
pub const AIRPORT_SEARCH_LIMIT: usize = 10;

/// Maximum length of a flight number.
pub const FLIGHT_NUMBER_MAX: usize = 20;

/// Validation errors for catalog entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryValidationError {
    EmptyField { field: &'static str },
    FieldTooLong { field: &'static str, max: usize },
    NonPositiveSeats { seats: i32 },
    NonPositiveAirplaneId { id: i32 },
    NegativePrice { price: i64 },
    InvalidTimeRange,
    EmptyStatus,
}

impl fmt::Display for InventoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::FieldTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::NonPositiveSeats { seats } => {
                write!(f, "seat capacity must be positive, got {seats}")
            }
            Self::NonPositiveAirplaneId { id } => {
                write!(f, "airplane id must be positive, got {id}")
            }
            Self::NegativePrice { price } => write!(f, "price must not be negative, got {price}"),
            Self::InvalidTimeRange => write!(f, "departure time must be before arrival time"),
            Self::EmptyStatus => write!(f, "flight status must not be empty"),
        }
    }
}

impl std::error::Error for InventoryValidationError {}

fn non_blank(value: String, field: &'static str, max: usize) -> Result<String, InventoryValidationError> {
    if value.trim().is_empty() {
        return Err(InventoryValidationError::EmptyField { field });
    }
    if value.chars().count() > max {
        return Err(InventoryValidationError::FieldTooLong { field, max });
    }
    Ok(value)
}

/// An airline, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    pub name: AirlineName,
}

/// Airport name; the unique key of an airport.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AirportName(String);

impl AirportName {
    pub fn new(value: impl Into<String>) -> Result<Self, InventoryValidationError> {
        non_blank(value.into(), "airport name", 50).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AirportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AirportName> for String {
    fn from(value: AirportName) -> Self {
        value.0
    }
}

impl TryFrom<String> for AirportName {
    type Error = InventoryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// An airport and the city it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    pub name: AirportName,
    pub city: String,
}

impl Airport {
    /// Validate and construct an airport.
    pub fn new(name: impl Into<String>, city: impl Into<String>) -> Result<Self, InventoryValidationError> {
        Ok(Self {
            name: AirportName::new(name)?,
            city: non_blank(city.into(), "airport city", 50)?,
        })
    }

    /// Case-insensitive substring match on name or city.
    ///
    /// # Examples
    /// ```
    /// use airline_backend::domain::Airport;
    ///
    /// let jfk = Airport::new("JFK", "New York").expect("valid airport");
    /// assert!(jfk.matches_term("york"));
    /// assert!(jfk.matches_term("jf"));
    /// assert!(!jfk.matches_term("Boston"));
    /// ```
    pub fn matches_term(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.as_str().to_lowercase().contains(&needle)
            || self.city.to_lowercase().contains(&needle)
    }
}

/// Airplane identifier, unique within its airline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct AirplaneId(i32);

impl AirplaneId {
    pub fn new(value: i32) -> Result<Self, InventoryValidationError> {
        if value <= 0 {
            return Err(InventoryValidationError::NonPositiveAirplaneId { id: value });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<AirplaneId> for i32 {
    fn from(value: AirplaneId) -> Self {
        value.0
    }
}

impl TryFrom<i32> for AirplaneId {
    type Error = InventoryValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for AirplaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positive seat count of an airplane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct SeatCapacity(i32);

impl SeatCapacity {
    /// # Examples
    /// ```
    /// use airline_backend::domain::SeatCapacity;
    ///
    /// assert!(SeatCapacity::new(180).is_ok());
    /// assert!(SeatCapacity::new(0).is_err());
    /// ```
    pub fn new(seats: i32) -> Result<Self, InventoryValidationError> {
        if seats <= 0 {
            return Err(InventoryValidationError::NonPositiveSeats { seats });
        }
        Ok(Self(seats))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<SeatCapacity> for i32 {
    fn from(value: SeatCapacity) -> Self {
        value.0
    }
}

impl TryFrom<i32> for SeatCapacity {
    type Error = InventoryValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// An airplane of one airline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airplane {
    pub airline: AirlineName,
    pub airplane_id: AirplaneId,
    pub seats: SeatCapacity,
}

/// Flight number, unique within its airline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlightNumber(String);

impl FlightNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, InventoryValidationError> {
        let value = non_blank(value.into(), "flight number", FLIGHT_NUMBER_MAX)?;
        if value.trim() != value {
            return Err(InventoryValidationError::EmptyField {
                field: "flight number",
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FlightNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<FlightNumber> for String {
    fn from(value: FlightNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for FlightNumber {
    type Error = InventoryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Identity of a flight: `(airline, flight_num)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightKey {
    pub airline: AirlineName,
    pub flight_num: FlightNumber,
}

impl FlightKey {
    pub fn new(airline: AirlineName, flight_num: FlightNumber) -> Self {
        Self { airline, flight_num }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.airline, self.flight_num)
    }
}

/// Flight status. Known labels are recognised; any other non-empty label is
/// kept verbatim. Transitions are unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FlightStatus {
    Upcoming,
    Delayed,
    OnTime,
    Departed,
    Cancelled,
    Other(String),
}

impl FlightStatus {
    /// Stored label.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Upcoming => "Upcoming",
            Self::Delayed => "Delayed",
            Self::OnTime => "On Time",
            Self::Departed => "Departed",
            Self::Cancelled => "Cancelled",
            Self::Other(label) => label.as_str(),
        }
    }

    /// Only cancelled flights refuse new purchases.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl FromStr for FlightStatus {
    type Err = InventoryValidationError;

    /// # Examples
    /// ```
    /// use airline_backend::domain::FlightStatus;
    ///
    /// assert_eq!("on time".parse::<FlightStatus>().ok(), Some(FlightStatus::OnTime));
    /// assert_eq!(
    ///     "Boarding".parse::<FlightStatus>().ok(),
    ///     Some(FlightStatus::Other("Boarding".to_owned()))
    /// );
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if label.is_empty() {
            return Err(InventoryValidationError::EmptyStatus);
        }
        let status = match label.to_lowercase().as_str() {
            "upcoming" => Self::Upcoming,
            "delayed" => Self::Delayed,
            "on time" | "ontime" | "on_time" => Self::OnTime,
            "departed" => Self::Departed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(label.to_owned()),
        };
        Ok(status)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FlightStatus> for String {
    fn from(value: FlightStatus) -> Self {
        match value {
            FlightStatus::Other(label) => label,
            known => known.as_str().to_owned(),
        }
    }
}

impl TryFrom<String> for FlightStatus {
    type Error = InventoryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Non-negative ticket price in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Price(i64);

impl Price {
    pub fn new(value: i64) -> Result<Self, InventoryValidationError> {
        if value < 0 {
            return Err(InventoryValidationError::NegativePrice { price: value });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<Price> for i64 {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl TryFrom<i64> for Price {
    type Error = InventoryValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A scheduled flight.
///
/// ## Invariants
/// - `departure_time < arrival_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    key: FlightKey,
    departure_airport: AirportName,
    departure_time: DateTime<Utc>,
    arrival_airport: AirportName,
    arrival_time: DateTime<Utc>,
    price: Price,
    status: FlightStatus,
    airplane_id: AirplaneId,
}

/// Unvalidated flight fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDraft {
    pub key: FlightKey,
    pub departure_airport: AirportName,
    pub departure_time: DateTime<Utc>,
    pub arrival_airport: AirportName,
    pub arrival_time: DateTime<Utc>,
    pub price: i64,
    pub status: FlightStatus,
    pub airplane_id: AirplaneId,
}

impl Flight {
    /// Validate a draft into a flight.
    pub fn new(draft: FlightDraft) -> Result<Self, InventoryValidationError> {
        if draft.departure_time >= draft.arrival_time {
            return Err(InventoryValidationError::InvalidTimeRange);
        }
        Ok(Self {
            key: draft.key,
            departure_airport: draft.departure_airport,
            departure_time: draft.departure_time,
            arrival_airport: draft.arrival_airport,
            arrival_time: draft.arrival_time,
            price: Price::new(draft.price)?,
            status: draft.status,
            airplane_id: draft.airplane_id,
        })
    }

    pub fn key(&self) -> &FlightKey {
        &self.key
    }

    pub fn airline(&self) -> &AirlineName {
        &self.key.airline
    }

    pub fn departure_airport(&self) -> &AirportName {
        &self.departure_airport
    }

    pub fn departure_time(&self) -> DateTime<Utc> {
        self.departure_time
    }

    pub fn arrival_airport(&self) -> &AirportName {
        &self.arrival_airport
    }

    pub fn arrival_time(&self) -> DateTime<Utc> {
        self.arrival_time
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn status(&self) -> &FlightStatus {
        &self.status
    }

    pub fn airplane_id(&self) -> AirplaneId {
        self.airplane_id
    }

    /// Copy of this flight carrying a new status.
    pub fn with_status(mut self, status: FlightStatus) -> Self {
        self.status = status;
        self
    }
}

/// Conjunction of optional flight filters.
///
/// Start and end dates are inclusive calendar days in UTC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearch {
    pub airline: Option<AirlineName>,
    pub flight_num: Option<FlightNumber>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub departing_after: Option<DateTime<Utc>>,
    pub include_cancelled: bool,
}

impl FlightSearch {
    /// Source term with surrounding whitespace removed; blank terms are absent.
    pub fn source_term(&self) -> Option<&str> {
        self.source.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Destination term with surrounding whitespace removed.
    pub fn destination_term(&self) -> Option<&str> {
        self.destination
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Departure bounds as `[lower, upper)`.
    ///
    /// # Examples
    /// ```
    /// use airline_backend::domain::FlightSearch;
    /// use chrono::{NaiveDate, TimeZone, Utc};
    ///
    /// let search = FlightSearch {
    ///     end_date: NaiveDate::from_ymd_opt(2026, 3, 1),
    ///     ..FlightSearch::default()
    /// };
    /// let (lower, upper) = search.departure_window();
    /// assert!(lower.is_none());
    /// assert_eq!(upper, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).single());
    /// ```
    pub fn departure_window(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let from_date = self
            .start_date
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc());
        let lower = match (from_date, self.departing_after) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let upper = self
            .end_date
            .and_then(|date| date.checked_add_days(Days::new(1)))
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc());
        (lower, upper)
    }

    /// Evaluate the filters against a flight and its resolved endpoints.
    pub fn matches(&self, flight: &Flight, departure: &Airport, arrival: &Airport) -> bool {
        if !self.include_cancelled && flight.status().is_cancelled() {
            return false;
        }
        if self.airline.as_ref().is_some_and(|a| a != flight.airline()) {
            return false;
        }
        if self
            .flight_num
            .as_ref()
            .is_some_and(|n| n != &flight.key().flight_num)
        {
            return false;
        }
        if self.source_term().is_some_and(|t| !departure.matches_term(t)) {
            return false;
        }
        if self.destination_term().is_some_and(|t| !arrival.matches_term(t)) {
            return false;
        }
        let (lower, upper) = self.departure_window();
        if lower.is_some_and(|l| flight.departure_time() < l) {
            return false;
        }
        if upper.is_some_and(|u| flight.departure_time() >= u) {
            return false;
        }
        true
    }
}
