//! The read-only transit snapshot consumed by the engine.
//!
//! A snapshot is immutable for the whole lifetime of a search : real-time
//! updates build a *new* snapshot upstream of this crate, and in-flight
//! searches keep using the one they captured at start.

pub mod constrained;
pub mod network;
pub mod pattern;
pub mod provider;
pub mod slack;
pub mod timetable;
pub mod transfer;
pub mod trip;

/// A stop is nothing more than an index in `[0, nb_of_stops)`. Name
/// resolution is an external lookup.
pub type StopIndex = usize;

/// A route pairs one [`pattern::Pattern`] with one
/// [`timetable::Timetable`].
pub type RouteIndex = usize;

pub use constrained::{
    ConstrainedTransfer, ConstrainedTransfersForRoute, TransferConstraint, TransferForPattern,
    TransferPoint,
};
pub use network::{NetworkBuildError, NetworkBuilder, TransitNetwork};
pub use pattern::{FlowDirection, Pattern, TransitMode};
pub use provider::TransitData;
pub use slack::SlackProvider;
pub use timetable::Timetable;
pub use transfer::Transfer;
pub use trip::{TripRef, TripSchedule};
