//! Booking and inventory consistency engine for an airline ticketing portal.
//!
//! The [`domain`] module holds the entities, invariants, and services. The
//! [`outbound`] module provides the PostgreSQL and in-memory adapters behind
//! the domain's driven ports. [`config`] and [`telemetry`] carry the process
//! ambient concerns shared by the `airline-admin` binary and embedders.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
