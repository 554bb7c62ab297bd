//! The round-based search engine.

pub mod arrivals;
pub mod calculator;
pub mod constrained_boarding;
pub mod heuristics;
pub mod mc_worker;
pub mod pareto;
pub mod round_tracker;
pub mod std_worker;
pub mod trip_search;
pub mod worker;

pub use calculator::SearchDirection;
pub use heuristics::Heuristics;
pub use mc_worker::McWorkerState;
pub use round_tracker::RoundTracker;
pub use std_worker::StdWorkerState;
pub use worker::{RangeRaptorWorker, WorkerState};
