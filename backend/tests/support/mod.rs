//! Shared helpers for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`. This
//! module wires the domain services over one [`InMemoryStore`] and seeds the
//! small catalog most suites start from: the JFK and LAX airports, and
//! airplane 1 for every provisioned airline.

use std::sync::Arc;

use airline_backend::domain::ports::{
    CatalogRepository, CreateAirplaneRequest, CreateFlightRequest, InventoryCommand,
    RegisterAgentRequest, RegistrationCommand,
};
use airline_backend::domain::{
    ActorContext, Airline, Airport, ApprovalService, BookingPolicy, BookingService, Customer,
    FlightKey, InventoryService, RegistrationService,
};
use airline_backend::outbound::memory::InMemoryStore;
use airline_backend::test_support::{MutableClock, fixtures, reference_now};
use chrono::Duration;

pub type Booking = BookingService<InMemoryStore, InMemoryStore, InMemoryStore>;

/// Domain services sharing one in-memory store and one test clock.
pub struct AirlineWorld {
    pub store: InMemoryStore,
    pub clock: Arc<MutableClock>,
    pub booking: Arc<Booking>,
    pub inventory: InventoryService<InMemoryStore>,
    pub approvals: ApprovalService<InMemoryStore>,
    pub registrations: RegistrationService<InMemoryStore, InMemoryStore>,
}

impl AirlineWorld {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        let clock = Arc::new(MutableClock::new(reference_now()));
        let booking = Arc::new(BookingService::new(
            Arc::clone(&shared),
            Arc::clone(&shared),
            Arc::clone(&shared),
            clock.clone(),
            BookingPolicy::default(),
        ));
        Self {
            inventory: InventoryService::new(Arc::clone(&shared), clock.clone()),
            approvals: ApprovalService::new(Arc::clone(&shared)),
            registrations: RegistrationService::new(Arc::clone(&shared), shared),
            booking,
            clock,
            store,
        }
    }

    /// Services over a store that already holds the JFK and LAX airports.
    pub async fn empty() -> Self {
        let world = Self::new();
        for (name, city) in [("JFK", "New York"), ("LAX", "Los Angeles")] {
            world
                .store
                .insert_airport(&Airport::new(name, city).expect("airport"))
                .await
                .expect("airport insert");
        }
        world
    }

    /// Provision each `(airline, seats)` pair with airplane 1 of that size.
    pub async fn with_airlines(airlines: &[(&str, i32)]) -> Self {
        let world = Self::empty().await;
        for &(name, seats) in airlines {
            world.add_airline(name, seats).await;
        }
        world
    }

    /// Provision `name` with airplane 1 holding `seats` seats.
    pub async fn add_airline(&self, name: &str, seats: i32) {
        self.store
            .insert_airline(&Airline {
                name: fixtures::airline(name),
            })
            .await
            .expect("airline insert");
        self.inventory
            .create_airplane(
                &Self::admin_of(name),
                CreateAirplaneRequest {
                    airplane_id: 1,
                    seats,
                },
            )
            .await
            .expect("airplane create");
    }

    /// Schedule `flight_num` for `airline` on airplane 1, departing a day
    /// after the reference instant.
    pub async fn seed_flight(&self, airline: &str, flight_num: &str) -> FlightKey {
        let departure = reference_now() + Duration::days(1);
        let flight = self
            .inventory
            .create_flight(
                &Self::admin_of(airline),
                CreateFlightRequest {
                    flight_num: fixtures::flight_key(airline, flight_num).flight_num,
                    departure_airport: fixtures::airport("JFK"),
                    departure_time: departure,
                    arrival_airport: fixtures::airport("LAX"),
                    arrival_time: departure + Duration::hours(5),
                    price: 320,
                    airplane_id: fixtures::airplane_id(1),
                },
            )
            .await
            .expect("flight create");
        flight.key().clone()
    }

    /// Register a customer and return their actor context.
    pub async fn seed_customer(&self, email: &str) -> ActorContext {
        let customer = self
            .registrations
            .register_customer(Customer::new(fixtures::customer_email(email), "Traveller"))
            .await
            .expect("customer registration");
        ActorContext::customer(customer.email)
    }

    /// Register a booking agent; it stays pending with no airlines.
    pub async fn seed_agent(&self, email: &str, agent_id: i32) {
        self.registrations
            .register_agent(RegisterAgentRequest {
                email: fixtures::agent_email(email),
                agent_id: fixtures::agent_id(agent_id),
            })
            .await
            .expect("agent registration");
    }

    /// Approved Admin actor of `airline`.
    pub fn admin_of(airline: &str) -> ActorContext {
        fixtures::admin_actor(&format!("admin-{}", airline.to_lowercase()), airline)
    }
}
