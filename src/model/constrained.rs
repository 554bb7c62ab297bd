//! Constrained transfers : explicit rules overriding the default
//! transfer behavior between two specific trips, routes, stops or
//! stations.

use std::fmt::{Display, Formatter};

use crate::model::{RouteIndex, StopIndex, TripRef};
use crate::time::PositiveDuration;

/// The rule attached to a constrained transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferConstraint {
    /// The connection is held : boarding is possible at the source trip
    /// arrival time, without any slack.
    Guaranteed,
    /// The rider stays in the vehicle ; no board/transfer cost applies.
    StaySeated,
    /// The connection needs at least this much time, which *replaces*
    /// the regular board/alight/transfer slacks.
    MinTransferTime(PositiveDuration),
    /// The connection must not be used, even if it is feasible in time.
    NotAllowed,
}

impl TransferConstraint {
    pub fn is_not_allowed(self) -> bool {
        matches!(self, TransferConstraint::NotAllowed)
    }

    /// Guaranteed and stay-seated transfers are "facilitated" : they may
    /// connect with zero slack.
    pub fn is_facilitated(self) -> bool {
        matches!(
            self,
            TransferConstraint::Guaranteed | TransferConstraint::StaySeated
        )
    }
}

impl Display for TransferConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferConstraint::Guaranteed => write!(f, "guaranteed"),
            TransferConstraint::StaySeated => write!(f, "stay-seated"),
            TransferConstraint::MinTransferTime(d) => write!(f, "min-transfer-time {}", d),
            TransferConstraint::NotAllowed => write!(f, "not-allowed"),
        }
    }
}

/// One end of a constrained transfer.
///
/// The more specific the point, the higher it ranks when several
/// constraints could apply to the same board event :
/// trip > route-stop > route-station > stop > station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPoint {
    Trip { trip: TripRef, stop_position: usize },
    RouteStop { route: RouteIndex, stop: StopIndex },
    RouteStation { route: RouteIndex, station: usize },
    Stop(StopIndex),
    Station(usize),
}

impl TransferPoint {
    pub fn specificity_ranking(self) -> u8 {
        match self {
            TransferPoint::Trip { .. } => 50,
            TransferPoint::RouteStop { .. } => 40,
            TransferPoint::RouteStation { .. } => 30,
            TransferPoint::Stop(_) => 20,
            TransferPoint::Station(_) => 10,
        }
    }

    /// Does this point designate the given transit arrival ?
    ///
    /// `source_station` must be the station of `source_stop`, when there
    /// is one.
    pub fn matches_arrival(
        self,
        source_trip: TripRef,
        source_stop: StopIndex,
        source_stop_position: usize,
        source_station: Option<usize>,
    ) -> bool {
        match self {
            TransferPoint::Trip {
                trip,
                stop_position,
            } => trip == source_trip && stop_position == source_stop_position,
            TransferPoint::RouteStop { route, stop } => {
                route == source_trip.route && stop == source_stop
            }
            TransferPoint::RouteStation { route, station } => {
                route == source_trip.route && Some(station) == source_station
            }
            TransferPoint::Stop(stop) => stop == source_stop,
            TransferPoint::Station(station) => Some(station) == source_station,
        }
    }
}

/// A constrained transfer as loaded into the snapshot, before indexing.
#[derive(Debug, Clone, Copy)]
pub struct ConstrainedTransfer {
    pub from: TransferPoint,
    pub to: TransferPoint,
    pub constraint: TransferConstraint,
}

/// One indexed constraint entry at a stop position of a route.
///
/// `matching_point` is the *other* end of the transfer, to be matched
/// against the transit arrival the rider comes from ; `own_trip` is set
/// when this route's own end was trip-specific, restricting the entry to
/// that trip of the timetable.
#[derive(Debug, Clone, Copy)]
pub struct TransferForPattern {
    pub(crate) matching_point: TransferPoint,
    pub(crate) own_trip: Option<usize>,
    pub(crate) constraint: TransferConstraint,
    pub(crate) specificity: u8,
}

impl TransferForPattern {
    pub fn constraint(&self) -> TransferConstraint {
        self.constraint
    }
}

/// All constrained transfers touching one route, keyed by stop position.
///
/// Used in the forward search on the *target* route of a transfer (the
/// one being boarded), and in the reverse search on the *source* route.
/// Entries at each position are sorted by decreasing specificity of
/// their matching point, so the first match wins.
#[derive(Debug, Clone, Default)]
pub struct ConstrainedTransfersForRoute {
    pub(crate) by_stop_position: Vec<Vec<TransferForPattern>>,
}

impl ConstrainedTransfersForRoute {
    pub(crate) fn new(nb_of_positions: usize) -> Self {
        Self {
            by_stop_position: vec![Vec::new(); nb_of_positions],
        }
    }

    pub(crate) fn insert(&mut self, stop_position: usize, transfer: TransferForPattern) {
        self.by_stop_position[stop_position].push(transfer);
    }

    pub(crate) fn sort_by_specificity(&mut self) {
        for transfers in &mut self.by_stop_position {
            transfers.sort_by(|a, b| b.specificity.cmp(&a.specificity));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_stop_position.iter().all(Vec::is_empty)
    }

    pub fn transfer_exists(&self, stop_position: usize) -> bool {
        !self.by_stop_position[stop_position].is_empty()
    }

    pub fn transfers_at(&self, stop_position: usize) -> &[TransferForPattern] {
        &self.by_stop_position[stop_position]
    }
}
