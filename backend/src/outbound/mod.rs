//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed stores using Diesel ORM
//! - **memory**: a single-process store guarded by one mutex, used by tests
//!   and by embedders that do not need durability
//!
//! Adapters translate between domain types and storage representations. The
//! seat-capacity decision itself stays in the domain; both adapters call the
//! same [`SeatInventory::check_reservation`](crate::domain::SeatInventory::check_reservation)
//! while holding their per-flight serialisation point.

pub mod memory;
pub mod persistence;
