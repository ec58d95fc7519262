//! Resource- and timing-constrained operation scheduling for data-flow
//! graphs.
//!
//! Given an ordered sequence of operation instances with value dependencies,
//! per-kind latencies (cycles), combinational delays (time units), and
//! per-kind instance limits, [`schedule`] assigns every statement a start
//! cycle respecting data dependencies, per-kind capacity, and a clock period
//! bounding the combinational delay chained within any single cycle.
//!
//! The run is a pipeline of passes over one mutable [`Dfg`]: dependency
//! extraction, topological normalization, ASAP, ALAP, and a list scheduler
//! that uses ALAP mobility as priority.

pub mod alap;
pub mod asap;
pub mod config;
pub mod graph;
pub mod logging;
pub mod models;
pub mod parse;
pub mod scheduler;
pub mod topo;

pub use config::SchedConfig;
pub use graph::Dfg;
pub use models::{Op, Stmt};
pub use parse::{parse_problem, ParseError, Problem};
pub use scheduler::{schedule, ListScheduler, ScheduleError};
pub use topo::TopoError;
