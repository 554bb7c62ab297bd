//! The timetable of one route : its trips, ordered by departure.

use crate::model::TripSchedule;

/// A read-only view over the trips of one route.
///
/// Trips are ordered by time : for any position `p` and trips `i < j`,
/// `trip(i).departure_time(p) <= trip(j).departure_time(p)`. The snapshot
/// builder enforces this, so both the forward and the reverse trip search
/// may binary search on any position.
#[derive(Debug, Clone, Copy)]
pub struct Timetable<'a> {
    pub(crate) trips: &'a [TripSchedule],
}

impl<'a> Timetable<'a> {
    pub fn nb_of_trips(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Panics if `trip_index` is out of bounds.
    pub fn trip(&self, trip_index: usize) -> &'a TripSchedule {
        &self.trips[trip_index]
    }

    pub fn trips(&self) -> &'a [TripSchedule] {
        self.trips
    }
}
