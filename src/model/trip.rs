//! Trip schedules : the timetable of one vehicle along its pattern.

use crate::model::RouteIndex;
use crate::time::Time;

/// Identifies one trip within the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TripRef {
    pub route: RouteIndex,
    pub trip: usize,
}

/// The immutable schedule of one trip : an `(arrival, departure)` pair
/// per position of its pattern.
///
/// Built once per transit snapshot and read-only during a search ; a
/// real-time update replaces the whole snapshot, never a single trip.
#[derive(Debug, Clone)]
pub struct TripSchedule {
    pub(crate) arrival_times: Vec<Time>,
    pub(crate) departure_times: Vec<Time>,
    pub(crate) trip_sort_index: usize,
    pub(crate) transit_reluctance_index: usize,
    pub(crate) wheelchair_accessible: bool,
}

impl TripSchedule {
    pub fn nb_of_positions(&self) -> usize {
        self.arrival_times.len()
    }

    /// Panics if `position` is out of bounds.
    pub fn arrival_time(&self, position: usize) -> Time {
        self.arrival_times[position]
    }

    /// Panics if `position` is out of bounds.
    pub fn departure_time(&self, position: usize) -> Time {
        self.departure_times[position]
    }

    /// Ordering key within the timetable, shared by every search that
    /// compares boardings of different trips.
    pub fn trip_sort_index(&self) -> usize {
        self.trip_sort_index
    }

    /// Lookup key into the transit-reluctance factor table.
    pub fn transit_reluctance_index(&self) -> usize {
        self.transit_reluctance_index
    }

    pub fn wheelchair_accessible(&self) -> bool {
        self.wheelchair_accessible
    }
}
