//! Generalized-cost calculation.
//!
//! The [`DefaultCostCalculator`] implements the base cost model ; a
//! [`CostCalculator`] composes it with a fixed, ordered pipeline of
//! additive [`CostAdjustment`]s (wheelchair, unpreferred routes /
//! agencies / modes, transit-group priority). Each adjustment forwards
//! the base result and adds a surcharge from a static classification of
//! the pattern/trip, so composition order never changes the total.

use serde::Deserialize;

use crate::cost::{to_raptor_cost, CostFactor, RaptorCost};
use crate::model::{Pattern, RouteIndex, StopIndex, TransferConstraint, TransitMode, TripSchedule};
use crate::time::Time;

/// Factors of the base cost model, in domain units (seconds and
/// dimensionless reluctances). Converted to fixed point once, at
/// construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct CostCalculatorParams {
    /// Cost of boarding a vehicle, in seconds.
    pub board_cost: u32,
    /// Extra cost of every boarding after the first one, in seconds.
    pub transfer_cost: u32,
    /// Reluctance applied to waiting time.
    pub wait_factor: f64,
    /// Reluctance applied to in-vehicle time, looked up by the trip's
    /// transit-reluctance index.
    pub transit_reluctance_factors: Vec<f64>,
    /// Extra boarding/alighting cost per stop, in centi-seconds.
    /// `None` disables per-stop costs entirely.
    pub stop_transfer_cost: Option<Vec<RaptorCost>>,
}

impl Default for CostCalculatorParams {
    fn default() -> Self {
        Self {
            board_cost: 60,
            transfer_cost: 120,
            wait_factor: 0.8,
            transit_reluctance_factors: vec![1.0],
            stop_transfer_cost: None,
        }
    }
}

/// The base cost model.
#[derive(Debug, Clone)]
pub struct DefaultCostCalculator {
    board_cost_only: RaptorCost,
    board_and_transfer_cost: RaptorCost,
    transfer_cost_only: RaptorCost,
    wait_factor: CostFactor,
    transit_factors: Vec<CostFactor>,
    min_transit_factor: CostFactor,
    stop_transfer_cost: Option<Vec<RaptorCost>>,
}

impl DefaultCostCalculator {
    pub fn new(params: &CostCalculatorParams) -> Self {
        let transit_factors: Vec<CostFactor> = params
            .transit_reluctance_factors
            .iter()
            .map(|&factor| CostFactor::new(factor))
            .collect();
        assert!(
            !transit_factors.is_empty(),
            "at least one transit reluctance factor is required"
        );
        let min_transit_factor = transit_factors
            .iter()
            .copied()
            .reduce(|a, b| if b.is_less_than(a) { b } else { a })
            .unwrap();
        Self {
            board_cost_only: to_raptor_cost(params.board_cost as i32),
            board_and_transfer_cost: to_raptor_cost((params.board_cost + params.transfer_cost) as i32),
            transfer_cost_only: to_raptor_cost(params.transfer_cost as i32),
            wait_factor: CostFactor::new(params.wait_factor),
            transit_factors,
            min_transit_factor,
            stop_transfer_cost: params.stop_transfer_cost.clone(),
        }
    }

    fn stop_cost(&self, stop: StopIndex) -> RaptorCost {
        match &self.stop_transfer_cost {
            Some(table) => table[stop],
            None => 0,
        }
    }

    fn transit_factor(&self, index: usize) -> CostFactor {
        *self
            .transit_factors
            .get(index)
            .unwrap_or(&self.transit_factors[0])
    }

    /// The cost of boarding `trip` at `board_time`, coming from an
    /// arrival at `prev_arrival_time`.
    ///
    /// A regular transfer bills the waiting time at the wait factor plus
    /// the board cost (and, past the first boarding, the transfer cost
    /// and the per-stop cost). A stay-seated transfer bills the waiting
    /// time at the transit reluctance instead ; the result may be
    /// negative when the boarding occurs before the previous arrival,
    /// which is accepted. A guaranteed transfer bills the waiting time
    /// only. A not-allowed transfer must have been filtered upstream by
    /// the trip search and never reaches this call.
    pub fn boarding_cost(
        &self,
        first_boarding: bool,
        prev_arrival_time: Time,
        board_stop: StopIndex,
        board_time: Time,
        trip: &TripSchedule,
        constraint: Option<TransferConstraint>,
    ) -> RaptorCost {
        let wait_time = board_time - prev_arrival_time;
        match constraint {
            Some(TransferConstraint::StaySeated) => self
                .transit_factor(trip.transit_reluctance_index())
                .cost(wait_time),
            Some(TransferConstraint::Guaranteed) => self.wait_factor.cost(wait_time),
            Some(TransferConstraint::NotAllowed) => {
                debug_assert!(false, "boarding cost requested for a not-allowed transfer");
                self.regular_boarding_cost(first_boarding, wait_time, board_stop)
            }
            Some(TransferConstraint::MinTransferTime(_)) | None => {
                self.regular_boarding_cost(first_boarding, wait_time, board_stop)
            }
        }
    }

    fn regular_boarding_cost(
        &self,
        first_boarding: bool,
        wait_time: i32,
        board_stop: StopIndex,
    ) -> RaptorCost {
        let board = if first_boarding {
            self.board_cost_only
        } else {
            self.board_and_transfer_cost + self.stop_cost(board_stop)
        };
        self.wait_factor.cost(wait_time) + board
    }

    /// A cost usable only to compare boardings of the *same* trip at
    /// different stops within one round : boarding earlier along the
    /// trip is cheaper. Never meaningful standalone.
    pub fn on_trip_relative_riding_cost(
        &self,
        board_time: Time,
        transit_reluctance_index: usize,
    ) -> RaptorCost {
        self.transit_factor(transit_reluctance_index).cost(-board_time)
    }

    /// The accumulated cost at alighting : the boarding cost, the ride
    /// billed at the transit reluctance, the alight slack billed as
    /// waiting, and the per-stop cost of the alighting stop.
    ///
    /// The per-stop addend is provisional : it is taken back by
    /// [`cost_egress`](Self::cost_egress) when the arrival turns out to
    /// be a final on-street egress rather than a transfer.
    pub fn transit_arrival_cost(
        &self,
        board_cost: RaptorCost,
        alight_slack: i32,
        transit_time: i32,
        transit_reluctance_index: usize,
        to_stop: StopIndex,
    ) -> RaptorCost {
        board_cost
            + self.transit_factor(transit_reluctance_index).cost(transit_time)
            + self.wait_factor.cost(alight_slack)
            + self.stop_cost(to_stop)
    }

    pub fn wait_cost(&self, seconds: i32) -> RaptorCost {
        self.wait_factor.cost(seconds)
    }

    /// An admissible lower bound on the cost of any journey with the
    /// given travel time and number of transfers : it never
    /// overestimates.
    pub fn calculate_min_cost(&self, min_travel_time: i32, min_num_transfers: usize) -> RaptorCost {
        self.board_cost_only
            + self.board_and_transfer_cost * (min_num_transfers as i32)
            + self.min_transit_factor.cost(min_travel_time)
    }

    /// The cost of ending the journey with `egress`.
    ///
    /// An egress arriving on board pays the transfer cost (a vehicle was
    /// boarded). An on-street egress takes back the provisional per-stop
    /// charge of [`transit_arrival_cost`](Self::transit_arrival_cost),
    /// when a stop-cost table is present.
    pub fn cost_egress(&self, egress: &crate::access::AccessEgress) -> RaptorCost {
        if egress.num_rides > 0 {
            egress.cost + self.transfer_cost_only
        } else if self.stop_transfer_cost.is_some() {
            egress.cost - self.stop_cost(egress.stop)
        } else {
            egress.cost
        }
    }
}

/// One additive surcharge, applied from a static classification of the
/// pattern/trip.
#[derive(Debug, Clone)]
pub enum CostAdjustment {
    /// Surcharge for boarding a trip that is not wheelchair accessible.
    Wheelchair { inaccessible_trip_cost: RaptorCost },
    UnpreferredRoutes {
        routes: Vec<RouteIndex>,
        cost: RaptorCost,
    },
    UnpreferredAgencies {
        agencies: Vec<usize>,
        cost: RaptorCost,
    },
    UnpreferredModes {
        modes: Vec<TransitMode>,
        cost: RaptorCost,
    },
    /// Surcharge for riding a pattern outside the preferred transit
    /// groups.
    TransitGroupPriority {
        preferred_mask: u32,
        cost: RaptorCost,
    },
}

impl CostAdjustment {
    fn boarding_surcharge(
        &self,
        route: RouteIndex,
        pattern: &Pattern,
        trip: &TripSchedule,
    ) -> RaptorCost {
        match self {
            CostAdjustment::Wheelchair {
                inaccessible_trip_cost,
            } if !trip.wheelchair_accessible() => *inaccessible_trip_cost,
            CostAdjustment::UnpreferredRoutes { routes, cost } if routes.contains(&route) => *cost,
            CostAdjustment::UnpreferredAgencies { agencies, cost }
                if agencies.contains(&pattern.agency()) =>
            {
                *cost
            }
            CostAdjustment::UnpreferredModes { modes, cost }
                if modes.contains(&pattern.mode()) =>
            {
                *cost
            }
            _ => 0,
        }
    }

    fn transit_arrival_surcharge(&self, pattern: &Pattern) -> RaptorCost {
        match self {
            CostAdjustment::TransitGroupPriority {
                preferred_mask,
                cost,
            } if pattern.priority_group_mask() & !preferred_mask != 0 => *cost,
            _ => 0,
        }
    }
}

/// The cost calculator used by a search : the base model plus its
/// adjustment pipeline, applied in a fixed order for reproducible costs.
#[derive(Debug, Clone)]
pub struct CostCalculator {
    base: DefaultCostCalculator,
    adjustments: Vec<CostAdjustment>,
}

impl CostCalculator {
    pub fn new(params: &CostCalculatorParams) -> Self {
        Self::with_adjustments(params, Vec::new())
    }

    pub fn with_adjustments(
        params: &CostCalculatorParams,
        adjustments: Vec<CostAdjustment>,
    ) -> Self {
        Self {
            base: DefaultCostCalculator::new(params),
            adjustments,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn boarding_cost(
        &self,
        first_boarding: bool,
        prev_arrival_time: Time,
        board_stop: StopIndex,
        board_time: Time,
        route: RouteIndex,
        pattern: &Pattern,
        trip: &TripSchedule,
        constraint: Option<TransferConstraint>,
    ) -> RaptorCost {
        let mut cost = self.base.boarding_cost(
            first_boarding,
            prev_arrival_time,
            board_stop,
            board_time,
            trip,
            constraint,
        );
        for adjustment in &self.adjustments {
            cost += adjustment.boarding_surcharge(route, pattern, trip);
        }
        cost
    }

    pub fn on_trip_relative_riding_cost(
        &self,
        board_time: Time,
        transit_reluctance_index: usize,
    ) -> RaptorCost {
        self.base
            .on_trip_relative_riding_cost(board_time, transit_reluctance_index)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn transit_arrival_cost(
        &self,
        board_cost: RaptorCost,
        alight_slack: i32,
        transit_time: i32,
        transit_reluctance_index: usize,
        pattern: &Pattern,
        to_stop: StopIndex,
    ) -> RaptorCost {
        let mut cost = self.base.transit_arrival_cost(
            board_cost,
            alight_slack,
            transit_time,
            transit_reluctance_index,
            to_stop,
        );
        for adjustment in &self.adjustments {
            cost += adjustment.transit_arrival_surcharge(pattern);
        }
        cost
    }

    pub fn wait_cost(&self, seconds: i32) -> RaptorCost {
        self.base.wait_cost(seconds)
    }

    pub fn calculate_min_cost(&self, min_travel_time: i32, min_num_transfers: usize) -> RaptorCost {
        self.base.calculate_min_cost(min_travel_time, min_num_transfers)
    }

    pub fn cost_egress(&self, egress: &crate::access::AccessEgress) -> RaptorCost {
        self.base.cost_egress(egress)
    }
}

impl Default for CostCalculator {
    fn default() -> Self {
        Self::new(&CostCalculatorParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessEgress;
    use crate::time::{parse_time, PositiveDuration};

    fn trip(reluctance_index: usize, accessible: bool) -> TripSchedule {
        TripSchedule {
            arrival_times: vec![0, 0],
            departure_times: vec![0, 0],
            trip_sort_index: 0,
            transit_reluctance_index: reluctance_index,
            wheelchair_accessible: accessible,
        }
    }

    fn params() -> CostCalculatorParams {
        CostCalculatorParams {
            board_cost: 60,
            transfer_cost: 120,
            wait_factor: 0.8,
            transit_reluctance_factors: vec![1.0],
            stop_transfer_cost: Some(vec![0, 0, 3_000, 0, 6_000]),
        }
    }

    // The reference journey : access arrives at 10:03:15, BUS 10:04 ->
    // 10:35 with 15s alight slack alighting at stop 2 (per-stop cost
    // 30s). Expected leg cost : 30s + (60 + 0.8 * 60 + 31 * 60) seconds.
    #[test]
    fn first_transit_leg_cost() {
        let calculator = DefaultCostCalculator::new(&params());
        let prev_arrival = parse_time("10:03:15").unwrap();
        let board_time = parse_time("10:04:00").unwrap();
        let alight_time = parse_time("10:35:00").unwrap();

        let board_cost =
            calculator.boarding_cost(true, prev_arrival, 1, board_time, &trip(0, true), None);
        assert_eq!(to_raptor_cost(60) + calculator.wait_cost(45), board_cost);

        let arrival_cost =
            calculator.transit_arrival_cost(board_cost, 15, alight_time - board_time, 0, 2);
        assert_eq!(3_000 + to_raptor_cost(60 + 1_860) + 80 * 60, arrival_cost);
    }

    #[test]
    fn later_boardings_pay_transfer_and_stop_cost() {
        let calculator = DefaultCostCalculator::new(&params());
        let cost = calculator.boarding_cost(false, 1_000, 2, 1_100, &trip(0, true), None);
        // 0.8 * 100s wait + (60 + 120)s board-and-transfer + 30s stop cost
        assert_eq!(80 * 100 + to_raptor_cost(180) + 3_000, cost);
    }

    #[test]
    fn stay_seated_bills_wait_at_transit_reluctance_and_may_go_negative() {
        let calculator = DefaultCostCalculator::new(&CostCalculatorParams {
            transit_reluctance_factors: vec![1.0, 2.0],
            ..params()
        });
        let constraint = Some(TransferConstraint::StaySeated);
        let cost =
            calculator.boarding_cost(false, 1_000, 2, 1_060, &trip(1, true), constraint);
        assert_eq!(CostFactor::new(2.0).cost(60), cost);

        // boarding before the previous arrival is accepted, not an error
        let negative =
            calculator.boarding_cost(false, 1_000, 2, 940, &trip(1, true), constraint);
        assert_eq!(CostFactor::new(2.0).cost(-60), negative);
    }

    #[test]
    fn guaranteed_bills_wait_only() {
        let calculator = DefaultCostCalculator::new(&params());
        let cost = calculator.boarding_cost(
            false,
            1_000,
            2,
            1_100,
            &trip(0, true),
            Some(TransferConstraint::Guaranteed),
        );
        assert_eq!(80 * 100, cost);
    }

    #[test]
    fn relative_riding_cost_orders_boardings_of_one_trip() {
        let calculator = DefaultCostCalculator::new(&params());
        let early = calculator.on_trip_relative_riding_cost(600, 0);
        let late = calculator.on_trip_relative_riding_cost(900, 0);
        assert!(late < early);
    }

    #[test]
    fn min_cost_is_a_lower_bound() {
        let calculator = DefaultCostCalculator::new(&CostCalculatorParams {
            transit_reluctance_factors: vec![1.0, 0.5],
            ..params()
        });
        // board + 2 * (board + transfer) + 0.5 * travel
        assert_eq!(
            to_raptor_cost(60) + 2 * to_raptor_cost(180) + CostFactor::new(0.5).cost(1_000),
            calculator.calculate_min_cost(1_000, 2)
        );
    }

    #[test]
    fn egress_cost_cases() {
        let calculator = DefaultCostCalculator::new(&params());
        let on_street = AccessEgress::walk(2, PositiveDuration::from_seconds(300));
        // the provisional stop cost of stop 2 is taken back
        assert_eq!(on_street.cost - 3_000, calculator.cost_egress(&on_street));

        let on_board = AccessEgress::flex(2, PositiveDuration::from_seconds(300), 1);
        assert_eq!(
            on_board.cost + to_raptor_cost(120),
            calculator.cost_egress(&on_board)
        );

        let no_table = DefaultCostCalculator::new(&CostCalculatorParams {
            stop_transfer_cost: None,
            ..params()
        });
        assert_eq!(on_street.cost, no_table.cost_egress(&on_street));
        // rides > 0 pays the transfer cost even without a stop-cost table
        assert_eq!(
            on_board.cost + to_raptor_cost(120),
            no_table.cost_egress(&on_board)
        );
    }

    #[test]
    fn adjustments_add_deterministic_surcharges() {
        let calculator = CostCalculator::with_adjustments(
            &params(),
            vec![
                CostAdjustment::Wheelchair {
                    inaccessible_trip_cost: to_raptor_cost(600),
                },
                CostAdjustment::UnpreferredModes {
                    modes: vec![TransitMode::Bus],
                    cost: to_raptor_cost(300),
                },
            ],
        );
        let pattern = Pattern {
            stops: vec![0, 1],
            flows: vec![
                crate::model::FlowDirection::BoardOnly,
                crate::model::FlowDirection::AlightOnly,
            ],
            slack_index: 0,
            priority_group_mask: 0,
            mode: TransitMode::Bus,
            agency: 0,
        };
        let accessible = trip(0, true);
        let inaccessible = trip(0, false);

        let base =
            calculator.boarding_cost(true, 0, 0, 100, 0, &pattern, &accessible, None);
        let surcharged =
            calculator.boarding_cost(true, 0, 0, 100, 0, &pattern, &inaccessible, None);
        // bus surcharge on both, wheelchair only on the inaccessible trip
        assert_eq!(base + to_raptor_cost(600), surcharged);
    }
}
