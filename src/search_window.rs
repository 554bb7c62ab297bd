//! Dynamic search-window calculation.
//!
//! The range-raptor outer loop needs a departure-time window. When the
//! request does not fix one, it is derived from heuristic minimum
//! travel and wait times, scaled by configurable coefficients and
//! rounded to a step granularity.

use serde::Deserialize;

use crate::time::{PositiveDuration, Time};

/// Coefficients of the dynamic search-window formula.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SearchWindowParams {
    pub min_transit_time_coefficient: f64,
    pub min_wait_time_coefficient: f64,
    pub min_window: PositiveDuration,
    pub max_window: PositiveDuration,
    pub step_minutes: u32,
}

impl Default for SearchWindowParams {
    fn default() -> Self {
        Self {
            min_transit_time_coefficient: 0.5,
            min_wait_time_coefficient: 0.5,
            min_window: PositiveDuration::from_hms(0, 40, 0),
            max_window: PositiveDuration::from_hms(24, 0, 0),
            step_minutes: 1,
        }
    }
}

/// The resolved window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub earliest_departure_time: Time,
    /// Unset when the request only fixed an earliest departure : the
    /// window alone bounds the opposite direction.
    pub latest_arrival_time: Option<Time>,
    pub search_window: PositiveDuration,
}

/// Derives the search window from heuristics and request times.
///
/// Usage : construct, feed [`with_heuristics`](Self::with_heuristics)
/// and at least one of
/// [`with_earliest_departure_time`](Self::with_earliest_departure_time) /
/// [`with_latest_arrival_time`](Self::with_latest_arrival_time), then
/// [`calculate`](Self::calculate).
#[derive(Debug, Clone)]
pub struct SearchWindowCalculator {
    params: SearchWindowParams,
    heuristics: Option<(i32, i32)>,
    earliest_departure_time: Option<Time>,
    latest_arrival_time: Option<Time>,
}

impl SearchWindowCalculator {
    pub fn new(params: SearchWindowParams) -> Self {
        Self {
            params,
            heuristics: None,
            earliest_departure_time: None,
            latest_arrival_time: None,
        }
    }

    /// The heuristic minimum transit time and minimum wait time of the
    /// request, in seconds.
    pub fn with_heuristics(mut self, min_transit_time: i32, min_wait_time: i32) -> Self {
        self.heuristics = Some((min_transit_time, min_wait_time));
        self
    }

    pub fn with_earliest_departure_time(mut self, time: Time) -> Self {
        self.earliest_departure_time = Some(time);
        self
    }

    pub fn with_latest_arrival_time(mut self, time: Time) -> Self {
        self.latest_arrival_time = Some(time);
        self
    }

    /// Panics if called before heuristics were supplied, or without any
    /// time anchor : both are caller defects, not recoverable
    /// conditions.
    pub fn calculate(self) -> SearchWindow {
        let (min_transit_time, min_wait_time) = self
            .heuristics
            .expect("search window calculation requires heuristics");

        let window = match (self.earliest_departure_time, self.latest_arrival_time) {
            (Some(earliest_departure), Some(latest_arrival)) => {
                // both ends fixed : the window is simply what fits
                // between them, the coefficient formula does not apply
                let seconds = latest_arrival - earliest_departure - min_transit_time;
                self.round_to_step(seconds.max(0))
            }
            (_, _) => self.dynamic_window(min_transit_time, min_wait_time),
        };

        let earliest_departure_time = match (self.earliest_departure_time, self.latest_arrival_time)
        {
            (Some(earliest_departure), _) => earliest_departure,
            (None, Some(latest_arrival)) => {
                latest_arrival - (window.seconds_i32() + self.ceil_to_step(min_transit_time))
            }
            (None, None) => panic!("search window calculation requires a time anchor"),
        };

        SearchWindow {
            earliest_departure_time,
            latest_arrival_time: self.latest_arrival_time,
            search_window: window,
        }
    }

    fn dynamic_window(&self, min_transit_time: i32, min_wait_time: i32) -> PositiveDuration {
        let raw = self.params.min_window.seconds_i32() as f64
            + self.params.min_transit_time_coefficient * f64::from(min_transit_time)
            + self.params.min_wait_time_coefficient * f64::from(min_wait_time);
        let clamped = (raw as i32)
            .max(self.params.min_window.seconds_i32())
            .min(self.params.max_window.seconds_i32());
        self.round_to_step(clamped)
    }

    /// Round to the nearest multiple of the step, half-up at the
    /// boundary : with a 60s step, 29s rounds to 0 and 30s to 60.
    fn round_to_step(&self, seconds: i32) -> PositiveDuration {
        let step = self.step_seconds();
        PositiveDuration::from_seconds((((seconds + step / 2) / step) * step) as u32)
    }

    fn ceil_to_step(&self, seconds: i32) -> i32 {
        let step = self.step_seconds();
        ((seconds + step - 1) / step) * step
    }

    fn step_seconds(&self) -> i32 {
        (self.params.step_minutes * 60) as i32
    }
}
