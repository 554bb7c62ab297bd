//! Boarding search honoring constrained transfers.
//!
//! When the stop being boarded at carries constrained transfers, this
//! search runs *before* the regular trip search : it scans candidate
//! trips, resolves the most specific constraint matching the transit
//! arrival the rider comes from, and either produces a boarding event
//! carrying the constraint, blocks boarding entirely (not-allowed), or
//! gives up so the regular search takes over.

use crate::engine::calculator::SearchDirection;
use crate::engine::trip_search::{first_boardable_index, BoardAlightEvent};
use crate::model::{
    ConstrainedTransfersForRoute, Pattern, StopIndex, Timetable, TransferConstraint,
    TransferForPattern, TransitData, TripRef,
};
use crate::time::Time;

/// The bounded-scan horizon : after this many candidate trips without a
/// constraint match, the search gives up and the regular search takes
/// over.
pub const ABORT_SEARCH_AFTER_NB_OF_TRIPS: usize = 5;

/// The transit arrival a constrained transfer starts from.
#[derive(Debug, Clone, Copy)]
pub struct TransitArrivalSource {
    pub trip: TripRef,
    pub stop: StopIndex,
    /// The alighting position of `trip`'s pattern at `stop`.
    pub stop_position: usize,
    /// The trip's own arrival time, without alight slack.
    pub slack_free_arrival_time: Time,
}

/// Outcome of a constrained boarding search.
#[derive(Debug, Clone, Copy)]
pub enum ConstrainedBoarding {
    Board(BoardAlightEvent),
    /// A not-allowed constraint covering every trip : the caller must
    /// not board here at all, not even through the regular search.
    NotAllowed,
}

pub struct ConstrainedBoardingSearch<'a> {
    direction: SearchDirection,
    transfers: &'a ConstrainedTransfersForRoute,
}

impl<'a> ConstrainedBoardingSearch<'a> {
    pub fn new(direction: SearchDirection, transfers: &'a ConstrainedTransfersForRoute) -> Self {
        Self {
            direction,
            transfers,
        }
    }

    pub fn transfer_exists(&self, stop_position: usize) -> bool {
        self.transfers.transfer_exists(stop_position)
    }

    /// Search a boarding at `stop_position`, reached from `source`.
    ///
    /// Candidate trips are scanned from the first one compatible with a
    /// zero-connection transfer. For each, the most specific matching
    /// constraint decides : facilitated constraints board right away, a
    /// minimum-transfer-time constraint boards once the required time
    /// fits, a trip-specific not-allowed skips to the next trip (which
    /// boards as a regular transfer), and a blanket not-allowed blocks
    /// the stop. The scan aborts after
    /// [`ABORT_SEARCH_AFTER_NB_OF_TRIPS`] trips without any match.
    pub fn find<D: TransitData>(
        &self,
        data: &D,
        timetable: Timetable<'_>,
        _pattern: &Pattern,
        stop_position: usize,
        source: &TransitArrivalSource,
    ) -> Option<ConstrainedBoarding> {
        let source_station = data.station_of(source.stop);
        let matching: Vec<&TransferForPattern> = self
            .transfers
            .transfers_at(stop_position)
            .iter()
            .filter(|entry| {
                entry.matching_point.matches_arrival(
                    source.trip,
                    source.stop,
                    source.stop_position,
                    source_station,
                )
            })
            .collect();
        if matching.is_empty() {
            return None;
        }

        let zero_connection_limit = source.slack_free_arrival_time;
        let mut use_next_normal_trip = false;
        let mut nb_of_normal_trips = 0;

        for trip_index in self.trip_scan(timetable, stop_position, zero_connection_limit) {
            let board_time = self
                .direction
                .board_time_of(timetable.trip(trip_index), stop_position);
            // entries are sorted by decreasing specificity, the first
            // applicable one wins
            let entry = matching
                .iter()
                .find(|entry| entry.own_trip.map_or(true, |trip| trip == trip_index));
            let Some(entry) = entry else {
                if use_next_normal_trip {
                    return Some(ConstrainedBoarding::Board(BoardAlightEvent {
                        trip_index,
                        stop_position,
                        time: board_time,
                        earliest_board_time: zero_connection_limit,
                        constraint: None,
                    }));
                }
                nb_of_normal_trips += 1;
                if nb_of_normal_trips >= ABORT_SEARCH_AFTER_NB_OF_TRIPS {
                    return None;
                }
                continue;
            };
            match entry.constraint {
                TransferConstraint::NotAllowed => {
                    if entry.own_trip.is_some() {
                        use_next_normal_trip = true;
                        continue;
                    }
                    return Some(ConstrainedBoarding::NotAllowed);
                }
                TransferConstraint::Guaranteed | TransferConstraint::StaySeated => {
                    return Some(ConstrainedBoarding::Board(BoardAlightEvent {
                        trip_index,
                        stop_position,
                        time: board_time,
                        earliest_board_time: zero_connection_limit,
                        constraint: Some(entry.constraint),
                    }));
                }
                TransferConstraint::MinTransferTime(min_time) => {
                    let required = self.direction.plus(zero_connection_limit, min_time);
                    if self.direction.is_before_or_equal(required, board_time) {
                        return Some(ConstrainedBoarding::Board(BoardAlightEvent {
                            trip_index,
                            stop_position,
                            time: board_time,
                            earliest_board_time: required,
                            constraint: Some(entry.constraint),
                        }));
                    }
                }
            }
        }
        None
    }

    fn trip_scan(
        &self,
        timetable: Timetable<'_>,
        stop_position: usize,
        limit_time: Time,
    ) -> Box<dyn Iterator<Item = usize>> {
        let first = first_boardable_index(self.direction, timetable, stop_position, limit_time);
        match self.direction {
            SearchDirection::Forward => Box::new(first..timetable.nb_of_trips()),
            SearchDirection::Reverse => Box::new((0..first).rev()),
        }
    }
}
