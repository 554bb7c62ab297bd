//! Board/alight trip search over one timetable.
//!
//! All searches come in a forward and a symmetric reverse flavor,
//! selected by the [`SearchDirection`]. Finding nothing is a valid
//! outcome (`None`), never an error : the caller treats it as "nothing
//! to relax here".

use std::fmt::{Display, Formatter};

use crate::engine::calculator::SearchDirection;
use crate::model::{Pattern, StopIndex, Timetable, TransferConstraint, TripSchedule};
use crate::time::Time;

/// A successful board (forward) or alight (reverse) event.
#[derive(Debug, Clone, Copy)]
pub struct BoardAlightEvent {
    pub trip_index: usize,
    pub stop_position: usize,
    /// The trip time at the event : a departure forward, an arrival in
    /// reverse.
    pub time: Time,
    /// The earliest (latest, in reverse) time the rider could have
    /// boarded, used for wait-cost accounting.
    pub earliest_board_time: Time,
    pub constraint: Option<TransferConstraint>,
}

/// Index of the first trip boardable at/after `limit_time` at
/// `position` (forward), ignoring permissions. May equal the trip count.
pub(crate) fn first_boardable_index(
    direction: SearchDirection,
    timetable: Timetable<'_>,
    position: usize,
    limit_time: Time,
) -> usize {
    match direction {
        SearchDirection::Forward => timetable
            .trips()
            .partition_point(|trip| trip.departure_time(position) < limit_time),
        SearchDirection::Reverse => timetable
            .trips()
            .partition_point(|trip| trip.arrival_time(position) <= limit_time),
    }
}

/// The earliest trip departing at/after `limit_time` at `position`
/// (forward), or the latest trip arriving at/before it (reverse).
///
/// Skips the search entirely when the pattern disallows boarding at
/// `position`. `bound`, when set, restricts the result to trips strictly
/// better-ordered than the given index (the trip currently ridden), so a
/// pattern scan can back up to an earlier trip but never to a later one.
/// Ties are broken by trip order.
pub fn search_for_trip(
    direction: SearchDirection,
    timetable: Timetable<'_>,
    pattern: &Pattern,
    position: usize,
    limit_time: Time,
    bound: Option<usize>,
) -> Option<BoardAlightEvent> {
    if !direction.can_board(pattern, position) {
        return None;
    }
    let trip_index = match direction {
        SearchDirection::Forward => {
            let index = first_boardable_index(direction, timetable, position, limit_time);
            if index >= timetable.nb_of_trips() || bound.is_some_and(|b| index >= b) {
                return None;
            }
            index
        }
        SearchDirection::Reverse => {
            let index = first_boardable_index(direction, timetable, position, limit_time)
                .checked_sub(1)?;
            if bound.is_some_and(|b| index <= b) {
                return None;
            }
            index
        }
    };
    Some(BoardAlightEvent {
        trip_index,
        stop_position: position,
        time: direction.board_time_of(timetable.trip(trip_index), position),
        earliest_board_time: limit_time,
        constraint: None,
    })
}

/// The unique trip departing within one iteration step of `limit_time`.
///
/// Used by the first round of every iteration but the first one : the
/// access must depart within the time slice of the iteration for the
/// departure time to be a valid pareto criterion across iterations.
pub fn search_for_exact_trip(
    direction: SearchDirection,
    timetable: Timetable<'_>,
    pattern: &Pattern,
    position: usize,
    limit_time: Time,
    iteration_step: i32,
) -> Option<BoardAlightEvent> {
    let event = search_for_trip(direction, timetable, pattern, position, limit_time, None)?;
    let offset = direction.duration(limit_time, event.time);
    debug_assert!(offset >= 0);
    if offset < iteration_step {
        Some(event)
    } else {
        None
    }
}

/// Board/alight positions of one ride within its pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardAlightPositions {
    pub board_position: usize,
    pub alight_position: usize,
}

/// Locate the board/alight positions of a ride of `trip` from
/// `from_stop` to `to_stop`, given only the approximate boarding time.
///
/// Needed because a pattern may visit the same stop several times
/// (loops) : among the occurrences whose departure does not exceed
/// `latest_departure_time`, the one closest to it wins, and occurrences
/// tying on departure time prefer the shortest ride span, so riding an
/// unnecessary loop never happens. An anchor falling exactly between two
/// departures resolves to the earlier one, since the later departure
/// would exceed it.
///
/// Fails when `from_stop` and `to_stop` cannot be located consistently
/// within the pattern, e.g. when the caller passes the same stop for
/// both ends. This signals a caller error, fatal for the query.
pub fn find_positions_forward_approximate(
    pattern: &Pattern,
    trip: &TripSchedule,
    from_stop: StopIndex,
    to_stop: StopIndex,
    latest_departure_time: Time,
) -> Result<BoardAlightPositions, NoStopMatch> {
    let no_match = || NoStopMatch { from_stop, to_stop };
    if from_stop == to_stop {
        return Err(no_match());
    }
    let mut best: Option<(BoardAlightPositions, Time)> = None;
    for board_position in 0..pattern.nb_of_positions() {
        if pattern.stop_at(board_position) != from_stop || !pattern.can_board(board_position) {
            continue;
        }
        let departure = trip.departure_time(board_position);
        if departure > latest_departure_time {
            continue;
        }
        let alight_position = match (board_position + 1..pattern.nb_of_positions())
            .find(|&position| {
                pattern.stop_at(position) == to_stop && pattern.can_alight(position)
            }) {
            Some(position) => position,
            None => continue,
        };
        let candidate = BoardAlightPositions {
            board_position,
            alight_position,
        };
        let better = match best {
            None => true,
            Some((incumbent, incumbent_departure)) => {
                departure > incumbent_departure
                    || (departure == incumbent_departure
                        && span(candidate) < span(incumbent))
            }
        };
        if better {
            best = Some((candidate, departure));
        }
    }
    best.map(|(positions, _)| positions).ok_or_else(no_match)
}

/// The reverse twin of
/// [`find_positions_forward_approximate`] : anchored on the approximate
/// arrival time at `to_stop`, never exceeded.
pub fn find_positions_reverse_approximate(
    pattern: &Pattern,
    trip: &TripSchedule,
    from_stop: StopIndex,
    to_stop: StopIndex,
    latest_arrival_time: Time,
) -> Result<BoardAlightPositions, NoStopMatch> {
    let no_match = || NoStopMatch { from_stop, to_stop };
    if from_stop == to_stop {
        return Err(no_match());
    }
    let mut best: Option<(BoardAlightPositions, Time)> = None;
    for alight_position in 0..pattern.nb_of_positions() {
        if pattern.stop_at(alight_position) != to_stop || !pattern.can_alight(alight_position) {
            continue;
        }
        let arrival = trip.arrival_time(alight_position);
        if arrival > latest_arrival_time {
            continue;
        }
        let board_position = match (0..alight_position)
            .rev()
            .find(|&position| {
                pattern.stop_at(position) == from_stop && pattern.can_board(position)
            }) {
            Some(position) => position,
            None => continue,
        };
        let candidate = BoardAlightPositions {
            board_position,
            alight_position,
        };
        let better = match best {
            None => true,
            Some((incumbent, incumbent_arrival)) => {
                arrival > incumbent_arrival
                    || (arrival == incumbent_arrival && span(candidate) < span(incumbent))
            }
        };
        if better {
            best = Some((candidate, arrival));
        }
    }
    best.map(|(positions, _)| positions).ok_or_else(no_match)
}

fn span(positions: BoardAlightPositions) -> usize {
    positions.alight_position - positions.board_position
}

/// `from_stop`/`to_stop` could not be located consistently within the
/// pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoStopMatch {
    pub from_stop: StopIndex,
    pub to_stop: StopIndex,
}

impl std::error::Error for NoStopMatch {}

impl Display for NoStopMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.from_stop == self.to_stop {
            write!(
                f,
                "Trip search requires two distinct stop anchors, got stop {} twice.",
                self.from_stop
            )
        } else {
            write!(
                f,
                "No consistent match for a ride from stop {} to stop {} in this pattern.",
                self.from_stop, self.to_stop
            )
        }
    }
}
