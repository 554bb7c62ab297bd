//! A round-based RAPTOR / range-raptor / multicriteria range-raptor
//! engine for scheduled public transit.
//!
//! The crate computes optimal journeys over an immutable transit
//! snapshot (see [`model::TransitData`]) augmented with street access
//! and egress legs. The standard profile keeps one best arrival time
//! per stop and round ; the multicriteria profile keeps a pareto set
//! over arrival time, number of rides, generalized cost and transit
//! groups. Both run as a range-raptor sweep over a departure-time
//! window, forward or in reverse.
//!
//! ```
//! use raptor::model::NetworkBuilder;
//! use raptor::{solve, AccessEgress, CostCalculator, PositiveDuration, SearchParams};
//!
//! let network = NetworkBuilder::new(3)
//!     .route(&[0, 1, 2], |route| {
//!         route.trip("10:00:00 10:05:00 10:10:00");
//!     })
//!     .build()
//!     .unwrap();
//!
//! let access = vec![AccessEgress::walk(0, PositiveDuration::from_seconds(60))];
//! let egress = vec![AccessEgress::walk(2, PositiveDuration::from_seconds(60))];
//! let params = SearchParams::depart_after(raptor::parse_time("09:55:00").unwrap());
//!
//! let response = solve(
//!     &network,
//!     &CostCalculator::default(),
//!     access,
//!     egress,
//!     &params,
//! )
//! .unwrap();
//! assert_eq!(1, response.paths.len());
//! ```

pub mod access;
pub mod cost;
pub mod cost_calculator;
pub mod engine;
pub mod model;
pub mod path;
pub mod request;
pub mod search_window;
pub mod solver;
pub mod time;

pub use access::{AccessEgress, AccessPaths, EgressPaths, OpeningHours};
pub use cost::{to_domain_cost, to_raptor_cost, RaptorCost};
pub use cost_calculator::{CostAdjustment, CostCalculator, CostCalculatorParams};
pub use engine::{Heuristics, SearchDirection};
pub use path::{Path, PathLeg};
pub use request::{Profile, RequestError, SearchParams};
pub use search_window::{SearchWindow, SearchWindowCalculator, SearchWindowParams};
pub use solver::{compute_heuristics, solve, RaptorResponse};
pub use time::{parse_time, Calendar, PositiveDuration, Time};

pub use chrono;
pub use tracing;
