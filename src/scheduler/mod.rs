//! Scheduling passes and the top-level driver.
//!
//! The driver runs dependency extraction, topological normalization, the
//! ASAP and ALAP passes, and the resource-and-timing-constrained list
//! scheduler, in that order, over one mutable graph.

mod core;
mod ready;

pub use self::core::{ListScheduler, ScheduleError};

use crate::alap::schedule_alap;
use crate::asap::schedule_asap;
use crate::config::SchedConfig;
use crate::graph::Dfg;
use crate::log_debug;
use crate::models::Op;
use crate::topo;

/// Schedule every statement of the graph, mutating start cycles in place.
///
/// Both the ALAP pass and the list scheduler overwrite `start_cycle`; only
/// the list-scheduler values survive, with the ALAP results serving as
/// priorities. Returns the final latency in cycles.
pub fn schedule(dfg: &mut Dfg, ops: &[Op], config: &SchedConfig) -> Result<i32, ScheduleError> {
    for stmt in &dfg.stmts {
        if stmt.op >= ops.len() {
            return Err(ScheduleError::UnknownOp(stmt.idx, stmt.op));
        }
    }

    let (mut deps, mut uses) = dfg.deps_and_uses();
    topo::normalize(dfg, &mut deps, &mut uses)?;

    let asap_latency = schedule_asap(dfg, ops, &deps);
    log_debug!(config.verbosity, "asap latency: {}", asap_latency);
    let alap_latency = schedule_alap(dfg, ops, &uses, asap_latency);
    log_debug!(config.verbosity, "alap latency: {}", alap_latency);

    let mut scheduler = ListScheduler::new(dfg, ops, &deps, &uses, config)?;
    scheduler.run(dfg)
}
