//! Diesel table definitions for the booking schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Airlines, provisioned by the operator.
    airline (airline_name) {
        airline_name -> Varchar,
    }
}

diesel::table! {
    /// Airports keyed by name.
    airport (airport_name) {
        airport_name -> Varchar,
        airport_city -> Varchar,
    }
}

diesel::table! {
    /// Airplanes; `seats` is the capacity of every flight flown with it.
    airplane (airline_name, airplane_id) {
        airline_name -> Varchar,
        airplane_id -> Int4,
        seats -> Int4,
    }
}

diesel::table! {
    /// Scheduled flights. Locked `FOR UPDATE` during ticket allocation.
    flight (airline_name, flight_num) {
        airline_name -> Varchar,
        flight_num -> Varchar,
        departure_airport -> Varchar,
        departure_time -> Timestamptz,
        arrival_airport -> Varchar,
        arrival_time -> Timestamptz,
        price -> Int8,
        status -> Varchar,
        airplane_id -> Int4,
    }
}

diesel::table! {
    /// Customer accounts.
    customer (email) {
        email -> Varchar,
        name -> Varchar,
        building_number -> Nullable<Varchar>,
        street -> Nullable<Varchar>,
        city -> Nullable<Varchar>,
        state -> Nullable<Varchar>,
        phone_number -> Nullable<Varchar>,
        passport_number -> Nullable<Varchar>,
        passport_expiration -> Nullable<Date>,
        passport_country -> Nullable<Varchar>,
        date_of_birth -> Nullable<Date>,
    }
}

diesel::table! {
    /// Booking agent accounts.
    booking_agent (email) {
        email -> Varchar,
        booking_agent_id -> Int4,
        approved -> Bool,
    }
}

diesel::table! {
    /// Agent to airline affiliations.
    booking_agent_work_for (email, airline_name) {
        email -> Varchar,
        airline_name -> Varchar,
    }
}

diesel::table! {
    /// Airline staff accounts.
    airline_staff (username) {
        username -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        date_of_birth -> Nullable<Date>,
        airline_name -> Varchar,
        approved -> Bool,
    }
}

diesel::table! {
    /// Staff permission grants.
    permission (username, permission_type) {
        username -> Varchar,
        permission_type -> Varchar,
    }
}

diesel::table! {
    /// Issued tickets; ids come from a sequence.
    ticket (ticket_id) {
        ticket_id -> Int8,
        airline_name -> Varchar,
        flight_num -> Varchar,
    }
}

diesel::table! {
    /// One purchase per ticket, with the optional idempotency stamp.
    purchases (ticket_id) {
        ticket_id -> Int8,
        customer_email -> Varchar,
        booking_agent_id -> Nullable<Int4>,
        purchase_date -> Date,
        idempotency_key -> Nullable<Uuid>,
        request_fingerprint -> Nullable<Varchar>,
    }
}

diesel::joinable!(airplane -> airline (airline_name));
diesel::joinable!(airline_staff -> airline (airline_name));
diesel::joinable!(booking_agent_work_for -> booking_agent (email));
diesel::joinable!(permission -> airline_staff (username));
diesel::joinable!(purchases -> ticket (ticket_id));
diesel::joinable!(purchases -> customer (customer_email));

diesel::allow_tables_to_appear_in_same_query!(
    airline,
    airport,
    airplane,
    flight,
    customer,
    booking_agent,
    booking_agent_work_for,
    airline_staff,
    permission,
    ticket,
    purchases,
);
