//! The read-only contract between a transit snapshot and the engine.

use crate::model::{
    ConstrainedTransfersForRoute, Pattern, RouteIndex, SlackProvider, StopIndex, Timetable,
    Transfer,
};
use crate::time::Calendar;

/// Everything the engine reads from a transit snapshot.
///
/// Implementations must be consistent : a search assumes well-formed
/// data (every pattern position resolves to a stop below
/// [`nb_of_stops`](Self::nb_of_stops), every trip has as many times as
/// its pattern has positions, timetables are ordered by time). The
/// snapshot builder checks all of this eagerly, so a violation observed
/// during a search is a defect, not a recoverable condition.
pub trait TransitData {
    /// An upper bound on the stop indices ; per-stop search state is
    /// sized with it.
    fn nb_of_stops(&self) -> usize;

    fn nb_of_routes(&self) -> usize;

    /// Panics if `route` is out of bounds.
    fn pattern(&self, route: RouteIndex) -> &Pattern;

    /// Panics if `route` is out of bounds.
    fn timetable(&self, route: RouteIndex) -> Timetable<'_>;

    /// The routes whose pattern visits `stop`, each returned once.
    fn routes_visiting(&self, stop: StopIndex) -> &[RouteIndex];

    /// Outgoing foot transfers, for the forward search.
    fn transfers_from(&self, stop: StopIndex) -> &[Transfer];

    /// Incoming foot transfers, for the reverse search.
    fn transfers_to(&self, stop: StopIndex) -> &[Transfer];

    /// The station grouping `stop`, if any. Used to match station-level
    /// constrained-transfer points.
    fn station_of(&self, stop: StopIndex) -> Option<usize>;

    fn slack(&self) -> &SlackProvider;

    /// Constrained transfers whose *target* is `route`, keyed by the
    /// boarding stop position. `None` when the route has none.
    fn constrained_transfers_to_route(
        &self,
        route: RouteIndex,
    ) -> Option<&ConstrainedTransfersForRoute>;

    /// Constrained transfers whose *source* is `route`, keyed by the
    /// alighting stop position. Used by the reverse search.
    fn constrained_transfers_from_route(
        &self,
        route: RouteIndex,
    ) -> Option<&ConstrainedTransfersForRoute>;

    /// The valid-data time bounds of this snapshot.
    fn calendar(&self) -> &Calendar;
}
