//! Rider-facing journeys, reconstructed from the internal arrival chain.
//!
//! Whatever the search direction, a [`Path`] always reads forward :
//! access, rides and transfers in boarding order, egress. Stop positions
//! of transit legs are not stored in the arrival records ; they are
//! recovered here with the approximate-time trip search, which handles
//! patterns visiting a stop more than once.

use crate::access::AccessEgress;
use crate::cost::RaptorCost;
use crate::engine::arrivals::{ArrivalId, ArrivedBy, Arrivals, StopArrival};
use crate::engine::calculator::SearchDirection;
use crate::engine::trip_search::{
    find_positions_forward_approximate, find_positions_reverse_approximate,
};
use crate::model::{StopIndex, TransferConstraint, TransitData, TripRef};
use crate::time::{PositiveDuration, Time};

#[derive(Debug, Clone)]
pub enum PathLeg {
    Access {
        leg: AccessEgress,
        departure_time: Time,
        arrival_time: Time,
    },
    Transit {
        trip: TripRef,
        board_stop: StopIndex,
        board_position: usize,
        board_time: Time,
        alight_stop: StopIndex,
        alight_position: usize,
        alight_time: Time,
        constraint: Option<TransferConstraint>,
    },
    Transfer {
        from_stop: StopIndex,
        to_stop: StopIndex,
        departure_time: Time,
        arrival_time: Time,
        duration: PositiveDuration,
    },
    Egress {
        leg: AccessEgress,
        departure_time: Time,
        arrival_time: Time,
    },
}

/// One optimal journey.
#[derive(Debug, Clone)]
pub struct Path {
    pub legs: Vec<PathLeg>,
    pub departure_time: Time,
    pub arrival_time: Time,
    pub num_transfers: usize,
    pub cost: RaptorCost,
}

impl Path {
    pub fn duration(&self) -> i32 {
        self.arrival_time - self.departure_time
    }

    pub fn transit_duration(&self) -> i32 {
        self.legs
            .iter()
            .map(|leg| match leg {
                PathLeg::Transit {
                    board_time,
                    alight_time,
                    ..
                } => alight_time - board_time,
                _ => 0,
            })
            .sum()
    }

    pub fn street_duration(&self) -> i32 {
        self.legs
            .iter()
            .map(|leg| match leg {
                PathLeg::Access {
                    leg: street_leg, ..
                }
                | PathLeg::Egress {
                    leg: street_leg, ..
                } => street_leg.duration.seconds_i32(),
                PathLeg::Transfer { duration, .. } => duration.seconds_i32(),
                PathLeg::Transit { .. } => 0,
            })
            .sum()
    }

    pub fn wait_duration(&self) -> i32 {
        self.duration() - self.transit_duration() - self.street_duration()
    }

    /// Result-set dominance : arriving earlier, riding less, costing
    /// less are better ; so is departing *later*, the criterion that
    /// lets range-raptor iterations coexist without duplicates.
    pub fn dominates_or_equal(&self, other: &Path) -> bool {
        self.arrival_time <= other.arrival_time
            && self.num_transfers <= other.num_transfers
            && self.cost <= other.cost
            && self.departure_time >= other.departure_time
    }
}

/// The final arrival of one harvested journey : the last stop arrival
/// plus the egress leg completing it.
#[derive(Debug, Clone)]
pub struct DestinationArrival {
    pub prev: ArrivalId,
    pub egress: AccessEgress,
    pub egress_departure_time: Time,
    pub arrival_time: Time,
    pub cost: RaptorCost,
    pub num_rides: u8,
}

/// Reconstruct the rider-facing path of `destination`.
///
/// Panics when a transit leg cannot be located within its pattern : the
/// arrival chain is produced by the same search that recorded the trip,
/// so a mismatch is a defect, not an input error.
pub fn build_path<D: TransitData>(
    data: &D,
    arrivals: &Arrivals,
    destination: &DestinationArrival,
    direction: SearchDirection,
) -> Path {
    let mut records: Vec<&StopArrival> = Vec::new();
    let mut cursor = Some(destination.prev);
    while let Some(id) = cursor {
        let record = arrivals.get(id);
        records.push(record);
        cursor = record.prev;
    }
    match direction {
        SearchDirection::Forward => {
            // collected destination-first, the rider reads origin-first
            records.reverse();
            build_forward(data, &records, destination)
        }
        // a reverse chain already walks origin-to-destination
        SearchDirection::Reverse => build_reverse(data, &records, destination),
    }
}

fn build_forward<D: TransitData>(
    data: &D,
    records: &[&StopArrival],
    destination: &DestinationArrival,
) -> Path {
    let mut legs: Vec<PathLeg> = Vec::with_capacity(records.len() + 1);
    let mut prev_stop: Option<StopIndex> = None;

    for record in records {
        match &record.arrived_by {
            ArrivedBy::Access {
                leg,
                departure_time,
            } => {
                legs.push(PathLeg::Access {
                    leg: leg.clone(),
                    departure_time: *departure_time,
                    arrival_time: record.arrival_time,
                });
            }
            ArrivedBy::Transit {
                trip,
                entry_stop,
                entry_time,
                constraint,
            } => {
                let pattern = data.pattern(trip.route);
                let schedule = data.timetable(trip.route).trip(trip.trip);
                let positions = find_positions_forward_approximate(
                    pattern,
                    schedule,
                    *entry_stop,
                    record.stop,
                    *entry_time,
                )
                .unwrap_or_else(|err| panic!("broken arrival chain : {}", err));
                legs.push(PathLeg::Transit {
                    trip: *trip,
                    board_stop: *entry_stop,
                    board_position: positions.board_position,
                    board_time: schedule.departure_time(positions.board_position),
                    alight_stop: record.stop,
                    alight_position: positions.alight_position,
                    alight_time: schedule.arrival_time(positions.alight_position),
                    constraint: *constraint,
                });
            }
            ArrivedBy::Transfer { duration } => {
                legs.push(PathLeg::Transfer {
                    from_stop: prev_stop.expect("transfer without a predecessor"),
                    to_stop: record.stop,
                    departure_time: record.arrival_time - duration.seconds_i32(),
                    arrival_time: record.arrival_time,
                    duration: *duration,
                });
            }
        }
        prev_stop = Some(record.stop);
    }

    shift_access_departure(data, &mut legs);

    legs.push(PathLeg::Egress {
        leg: destination.egress.clone(),
        departure_time: destination.egress_departure_time,
        arrival_time: destination.arrival_time,
    });

    let departure_time = match legs.first() {
        Some(PathLeg::Access { departure_time, .. }) => *departure_time,
        _ => destination.arrival_time,
    };
    Path {
        departure_time,
        arrival_time: destination.arrival_time,
        num_transfers: usize::from(destination.num_rides.saturating_sub(1)),
        cost: destination.cost,
        legs,
    }
}

/// Time-shift the access leg to depart as late as its first boarding
/// allows, within its opening hours.
fn shift_access_departure<D: TransitData>(data: &D, legs: &mut [PathLeg]) {
    let (board_time, slack_index) = match legs.get(1) {
        Some(PathLeg::Transit {
            trip, board_time, ..
        }) => (*board_time, data.pattern(trip.route).slack_index()),
        _ => return,
    };
    let board_slack = data.slack().board_slack(slack_index);
    if let Some(PathLeg::Access {
        leg,
        departure_time,
        arrival_time,
    }) = legs.get_mut(0)
    {
        let ideal = board_time - board_slack.seconds_i32() - leg.duration.seconds_i32();
        if let Some(shifted) = leg.latest_departure_time(ideal) {
            if shifted > *departure_time {
                *departure_time = shifted;
                *arrival_time = shifted + leg.duration.seconds_i32();
            }
        }
    }
}

fn build_reverse<D: TransitData>(
    data: &D,
    records: &[&StopArrival],
    destination: &DestinationArrival,
) -> Path {
    let mut legs: Vec<PathLeg> = Vec::with_capacity(records.len() + 1);

    // the harvest-side leg is the rider's access
    let access_departure = destination.arrival_time;
    legs.push(PathLeg::Access {
        leg: destination.egress.clone(),
        departure_time: access_departure,
        arrival_time: access_departure + destination.egress.duration.seconds_i32(),
    });

    let mut last_alight: Option<(Time, usize)> = None;
    for (index, record) in records.iter().enumerate() {
        match &record.arrived_by {
            ArrivedBy::Transit {
                trip,
                entry_stop,
                entry_time,
                constraint,
            } => {
                let pattern = data.pattern(trip.route);
                let schedule = data.timetable(trip.route).trip(trip.trip);
                let positions = find_positions_reverse_approximate(
                    pattern,
                    schedule,
                    record.stop,
                    *entry_stop,
                    *entry_time,
                )
                .unwrap_or_else(|err| panic!("broken arrival chain : {}", err));
                let alight_time = schedule.arrival_time(positions.alight_position);
                legs.push(PathLeg::Transit {
                    trip: *trip,
                    board_stop: record.stop,
                    board_position: positions.board_position,
                    board_time: schedule.departure_time(positions.board_position),
                    alight_stop: *entry_stop,
                    alight_position: positions.alight_position,
                    alight_time,
                    constraint: *constraint,
                });
                last_alight = Some((alight_time, pattern.slack_index()));
            }
            ArrivedBy::Transfer { duration } => {
                let (alight_time, _) =
                    last_alight.expect("transfer without a preceding ride");
                let to_stop = records
                    .get(index + 1)
                    .map(|next| next.stop)
                    .expect("transfer without a predecessor");
                legs.push(PathLeg::Transfer {
                    from_stop: record.stop,
                    to_stop,
                    departure_time: alight_time,
                    arrival_time: alight_time + duration.seconds_i32(),
                    duration: *duration,
                });
            }
            // the seed record : the rider's egress leg
            ArrivedBy::Access { leg, .. } => {
                let (alight_time, slack_index) =
                    last_alight.expect("reverse journey without any ride");
                let alight_slack = data.slack().alight_slack(slack_index);
                let departure_time = alight_time + alight_slack.seconds_i32();
                legs.push(PathLeg::Egress {
                    leg: leg.clone(),
                    departure_time,
                    arrival_time: departure_time + leg.duration.seconds_i32(),
                });
            }
        }
    }

    let arrival_time = match legs.last() {
        Some(PathLeg::Egress { arrival_time, .. }) => *arrival_time,
        _ => access_departure,
    };
    Path {
        departure_time: access_departure,
        arrival_time,
        num_transfers: usize::from(destination.num_rides.saturating_sub(1)),
        cost: destination.cost,
        legs,
    }
}
