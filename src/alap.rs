//! As-late-as-possible pass: latest start cycles at the ASAP latency.

use crate::graph::Dfg;
use crate::models::Op;

/// Assign every statement its latest start cycle such that total latency
/// stays at `asap_latency`, then shift so the minimum start cycle is 1.
///
/// Scans statements in reverse topological order: sinks are pinned against
/// the final cycle, interior statements against their earliest successor.
/// Returns the realized latency, which equals `asap_latency`.
pub fn schedule_alap(dfg: &mut Dfg, ops: &[Op], uses: &[Vec<usize>], asap_latency: i32) -> i32 {
    for stmt in &mut dfg.stmts {
        stmt.start_cycle = 0;
    }

    // Tracked across sinks and interior statements alike so renormalization
    // can never push a start cycle below 1.
    let mut earliest = asap_latency;

    for i in (0..dfg.stmts.len()).rev() {
        let op = &ops[dfg.stmts[i].op];
        let start = if uses[i].is_empty() {
            asap_latency - op.extra_cycles()
        } else {
            let mut latest = asap_latency;
            for &s in &uses[i] {
                latest = latest.min(dfg.stmts[s].start_cycle - op.occupancy());
            }
            latest
        };
        dfg.stmts[i].start_cycle = start;
        earliest = earliest.min(start);
    }

    let shift = earliest - 1;
    let mut latency = 0;
    for stmt in &mut dfg.stmts {
        stmt.start_cycle -= shift;
        debug_assert!(stmt.start_cycle >= 1);
        latency = latency.max(stmt.start_cycle + ops[stmt.op].extra_cycles());
    }
    latency
}
