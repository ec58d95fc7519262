//! As-soon-as-possible pass: minimum start cycles under dependencies alone.

use crate::graph::Dfg;
use crate::models::Op;

/// Assign every statement its earliest start cycle and return the total
/// latency of the resulting schedule.
///
/// Statements must already be in topological index order. Statements with no
/// dependencies start at cycle 1, even in a disconnected graph.
pub fn schedule_asap(dfg: &mut Dfg, ops: &[Op], deps: &[Vec<usize>]) -> i32 {
    for stmt in &mut dfg.stmts {
        stmt.start_cycle = 0;
    }

    let mut total_latency = 0;
    for i in 0..dfg.stmts.len() {
        let mut start = 1;
        for &j in &deps[i] {
            let pred = &dfg.stmts[j];
            let completion = pred.start_cycle + ops[pred.op].extra_cycles();
            start = start.max(completion + 1);
        }
        dfg.stmts[i].start_cycle = start;
        total_latency = total_latency.max(start + ops[dfg.stmts[i].op].extra_cycles());
    }
    total_latency
}
