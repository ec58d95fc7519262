//! Resource- and timing-constrained list scheduler.
//!
//! Places statements cycle by cycle in ALAP-priority order, threading three
//! interacting constraints: dependency readiness, per-kind capacity, and the
//! combinational delay accumulated along chains packed into a single cycle.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::config::SchedConfig;
use crate::graph::Dfg;
use crate::models::Op;
use crate::topo::TopoError;
use crate::{log_checks, log_debug, log_placements};

use super::ready::ReadyQueue;

/// Errors that can occur during scheduling.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("dependency cycle prevents a topological order")]
    DependencyCycle,
    #[error("operation {0} has limit 0 but is required by at least one statement")]
    ZeroLimit(String),
    #[error("operation {0} has delay {1} exceeding the clock period {2}")]
    DelayExceedsClock(String, f64, f64),
    #[error("statement {0} references operation index {1} outside the catalog")]
    UnknownOp(usize, usize),
    #[error("failed to schedule statements: {0:?}")]
    Unschedulable(Vec<usize>),
}

impl From<TopoError> for ScheduleError {
    fn from(err: TopoError) -> Self {
        match err {
            TopoError::Cycle => ScheduleError::DependencyCycle,
        }
    }
}

/// Whether a producer's output is consumable within its own start cycle.
///
/// True only for single-cycle unlimited kinds contributing real combinational
/// delay. Zero-delay and multi-cycle kinds register their outputs, which are
/// sampled at the following cycle boundary.
fn chains_same_cycle(op: &Op) -> bool {
    op.is_unlimited() && op.delay > 0.0 && op.latency <= 1
}

/// Accumulated combinational delay feeding each statement, per cycle.
#[derive(Debug, Default)]
struct DelayLedger {
    chains: FxHashMap<i32, FxHashMap<usize, f64>>,
}

impl DelayLedger {
    /// Chain delay already feeding `stmt` within `cycle`.
    fn inherited(&self, cycle: i32, stmt: usize) -> f64 {
        self.chains
            .get(&cycle)
            .and_then(|per_stmt| per_stmt.get(&stmt))
            .copied()
            .unwrap_or(0.0)
    }

    /// Raise the recorded chain delay for `stmt` at `cycle` to at least `delay`.
    fn raise(&mut self, cycle: i32, stmt: usize, delay: f64) {
        let slot = self
            .chains
            .entry(cycle)
            .or_default()
            .entry(stmt)
            .or_insert(0.0);
        if delay > *slot {
            *slot = delay;
        }
    }
}

#[derive(Debug, Default)]
struct DrainOutcome {
    placed: bool,
    saturated: bool,
}

/// List scheduler over a normalized graph.
///
/// Consumes the ALAP start cycles left in the graph as priorities, zeroes
/// every start cycle, then places statements cycle by cycle.
pub struct ListScheduler<'a> {
    ops: &'a [Op],
    deps: &'a [Vec<usize>],
    uses: &'a [Vec<usize>],
    clock_period: f64,
    verbosity: u8,
    priority: Vec<i32>,
    scheduled: FxHashSet<usize>,
    pending: FxHashSet<usize>,
    ready: ReadyQueue,
    delays: DelayLedger,
}

impl<'a> ListScheduler<'a> {
    /// Create a scheduler over a graph whose start cycles hold ALAP results.
    ///
    /// Fails fast on inputs the main loop could never place: a zero-limit
    /// kind with statements, or an unlimited kind whose delay alone exceeds
    /// the clock period.
    pub fn new(
        dfg: &mut Dfg,
        ops: &'a [Op],
        deps: &'a [Vec<usize>],
        uses: &'a [Vec<usize>],
        config: &SchedConfig,
    ) -> Result<Self, ScheduleError> {
        check_feasible(dfg, ops, config.clock_period)?;

        let priority: Vec<i32> = dfg.stmts.iter().map(|s| s.start_cycle).collect();
        for stmt in &mut dfg.stmts {
            stmt.start_cycle = 0;
        }

        let mut ready = ReadyQueue::new();
        let mut pending: FxHashSet<usize> = (0..dfg.stmts.len()).collect();
        for (i, stmt) in dfg.stmts.iter().enumerate() {
            if deps[i].is_empty() {
                pending.remove(&i);
                ready.push(i, priority[i], ops[stmt.op].delay);
            }
        }

        Ok(Self {
            ops,
            deps,
            uses,
            clock_period: config.clock_period,
            verbosity: config.verbosity,
            priority,
            scheduled: FxHashSet::default(),
            pending,
            ready,
            delays: DelayLedger::default(),
        })
    }

    /// Run the main loop; returns the achieved latency.
    pub fn run(&mut self, dfg: &mut Dfg) -> Result<i32, ScheduleError> {
        let total = dfg.stmts.len();
        // Every statement waits at most the sum of all occupancies plus one
        // defer cycle; anything beyond that is a stuck schedule.
        let horizon: i64 = dfg
            .stmts
            .iter()
            .map(|s| i64::from(self.ops[s.op].occupancy()))
            .sum::<i64>()
            + total as i64
            + 1;

        let mut cycle: i32 = 1;
        while self.scheduled.len() < total {
            if i64::from(cycle) > horizon {
                let left: Vec<usize> = (0..total)
                    .filter(|&i| dfg.stmts[i].start_cycle == 0)
                    .collect();
                return Err(ScheduleError::Unschedulable(left));
            }

            log_debug!(
                self.verbosity,
                "cycle {}: {} ready, {} pending",
                cycle,
                self.ready.len(),
                self.pending.len()
            );

            // Promote before draining so statements becoming ready at the
            // cycle boundary compete on priority, then alternate until the
            // cycle makes no more progress; a consumer of a combinational
            // value placed this cycle can still be packed into it.
            loop {
                let promoted = self.promote(dfg, cycle);
                let outcome = self.drain(dfg, cycle);
                if outcome.saturated || (!outcome.placed && promoted == 0) {
                    break;
                }
            }

            cycle += 1;
        }

        let mut latency = 0;
        for stmt in &dfg.stmts {
            latency = latency.max(stmt.start_cycle + self.ops[stmt.op].extra_cycles());
        }
        Ok(latency)
    }

    /// Pop ready candidates in priority order, placing each that fits the
    /// cycle. Candidates that do not fit are carried over; a saturated
    /// limited kind stops the whole drain for this cycle.
    fn drain(&mut self, dfg: &mut Dfg, cycle: i32) -> DrainOutcome {
        let ops = self.ops;
        let uses = self.uses;
        let mut outcome = DrainOutcome::default();
        let mut deferred: Vec<usize> = Vec::new();

        while let Some(i) = self.ready.pop() {
            let op_idx = dfg.stmts[i].op;
            let op = &ops[op_idx];

            if op.is_unlimited() {
                let inherited = self.delays.inherited(cycle, i);
                if inherited + op.delay <= self.clock_period {
                    self.place(dfg, i, cycle);
                    outcome.placed = true;
                    // Chained delay flows forward within the same cycle.
                    for &s in &uses[i] {
                        self.delays.raise(cycle, s, inherited + op.delay);
                    }
                } else {
                    log_checks!(
                        self.verbosity,
                        "  defer stmt {}: chain {:.2}+{:.2} exceeds clock {:.2}",
                        i,
                        inherited,
                        op.delay,
                        self.clock_period
                    );
                    deferred.push(i);
                }
            } else {
                let used = self.in_flight(dfg, cycle, op_idx);
                if used < op.limit {
                    self.place(dfg, i, cycle);
                    outcome.placed = true;
                    // Unlimited successors inherit this cell's output delay
                    // on the cycle its result settles.
                    let settles = cycle + op.latency - 1;
                    for &s in &uses[i] {
                        if ops[dfg.stmts[s].op].is_unlimited() {
                            self.delays.raise(settles, s, op.delay);
                        }
                    }
                } else {
                    log_checks!(
                        self.verbosity,
                        "  defer stmt {}: {} of {} {} units in flight",
                        i,
                        used,
                        op.limit,
                        op.name
                    );
                    deferred.push(i);
                    outcome.saturated = true;
                    break;
                }
            }
        }

        for i in deferred {
            self.ready.push(i, self.priority[i], ops[dfg.stmts[i].op].delay);
        }
        outcome
    }

    fn place(&mut self, dfg: &mut Dfg, i: usize, cycle: i32) {
        dfg.stmts[i].start_cycle = cycle;
        self.scheduled.insert(i);
        log_placements!(
            self.verbosity,
            "cycle {}: place stmt {} ({})",
            cycle,
            i,
            self.ops[dfg.stmts[i].op].name
        );
    }

    /// Instances of kind `op_idx` in flight at `cycle` among placed statements.
    fn in_flight(&self, dfg: &Dfg, cycle: i32, op_idx: usize) -> i32 {
        let latency = self.ops[op_idx].latency;
        let mut count = 0;
        for stmt in &dfg.stmts {
            if stmt.start_cycle == 0 || stmt.op != op_idx {
                continue;
            }
            if cycle >= stmt.start_cycle && cycle < stmt.start_cycle + latency {
                count += 1;
            }
        }
        count
    }

    /// Move pending statements whose every input settles by `cycle` into the
    /// ready queue; returns how many moved.
    fn promote(&mut self, dfg: &Dfg, cycle: i32) -> usize {
        let ops = self.ops;
        let deps = self.deps;

        let mut newly: Vec<usize> = Vec::new();
        for &i in &self.pending {
            let combinational_consumer = ops[dfg.stmts[i].op].is_unlimited();
            let settled = deps[i].iter().all(|&j| {
                if !self.scheduled.contains(&j) {
                    return false;
                }
                let pred = &dfg.stmts[j];
                let pred_op = &ops[pred.op];
                if combinational_consumer && chains_same_cycle(pred_op) {
                    pred.start_cycle <= cycle
                } else {
                    pred.start_cycle + pred_op.occupancy() <= cycle
                }
            });
            if settled {
                newly.push(i);
            }
        }

        for &i in &newly {
            self.pending.remove(&i);
            self.ready.push(i, self.priority[i], ops[dfg.stmts[i].op].delay);
            log_debug!(self.verbosity, "  ready: stmt {}", i);
        }
        newly.len()
    }
}

fn check_feasible(dfg: &Dfg, ops: &[Op], clock_period: f64) -> Result<(), ScheduleError> {
    for stmt in &dfg.stmts {
        let op = ops
            .get(stmt.op)
            .ok_or(ScheduleError::UnknownOp(stmt.idx, stmt.op))?;
        if op.limit == 0 {
            return Err(ScheduleError::ZeroLimit(op.name.clone()));
        }
        if op.is_unlimited() && op.delay > clock_period {
            return Err(ScheduleError::DelayExceedsClock(
                op.name.clone(),
                op.delay,
                clock_period,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::schedule;

    fn build(kinds: &[usize], edges: &[(usize, usize)]) -> Dfg {
        let mut dfg = Dfg::new();
        for &k in kinds {
            dfg.add_stmt(k);
        }
        for &(from, to) in edges {
            dfg.add_edge(from, to);
        }
        dfg
    }

    fn starts(dfg: &Dfg) -> Vec<i32> {
        dfg.stmts.iter().map(|s| s.start_cycle).collect()
    }

    #[test]
    fn test_zero_limit_rejected() {
        let ops = vec![Op::new("div", 8, 0.0, 0)];
        let mut dfg = build(&[0], &[]);
        let result = schedule(&mut dfg, &ops, &SchedConfig::new(10.0));
        assert!(matches!(result, Err(ScheduleError::ZeroLimit(name)) if name == "div"));
    }

    #[test]
    fn test_unused_zero_limit_kind_is_tolerated() {
        let ops = vec![Op::new("add", 1, 0.0, -1), Op::new("div", 8, 0.0, 0)];
        let mut dfg = build(&[0], &[]);
        let latency = schedule(&mut dfg, &ops, &SchedConfig::new(10.0)).unwrap();
        assert_eq!(latency, 1);
    }

    #[test]
    fn test_delay_exceeding_clock_rejected() {
        let ops = vec![Op::new("add", 1, 12.0, -1)];
        let mut dfg = build(&[0], &[]);
        let result = schedule(&mut dfg, &ops, &SchedConfig::new(10.0));
        assert!(matches!(
            result,
            Err(ScheduleError::DelayExceedsClock(name, _, _)) if name == "add"
        ));
    }

    #[test]
    fn test_unknown_op_index_rejected() {
        let ops = vec![Op::new("add", 1, 0.0, -1)];
        let mut dfg = build(&[3], &[]);
        let result = schedule(&mut dfg, &ops, &SchedConfig::new(10.0));
        assert!(matches!(result, Err(ScheduleError::UnknownOp(0, 3))));
    }

    #[test]
    fn test_limited_consumer_waits_full_producer_latency() {
        // mul holds its consumer until the cycle after it completes.
        let ops = vec![Op::new("mul", 2, 3.0, 1), Op::new("add", 1, 2.0, -1)];
        let mut dfg = build(&[0, 1], &[(0, 1)]);

        let latency = schedule(&mut dfg, &ops, &SchedConfig::new(10.0)).unwrap();

        assert_eq!(starts(&dfg), vec![1, 3]);
        assert_eq!(latency, 3);
    }

    #[test]
    fn test_resource_cap_holds_every_cycle() {
        let ops = vec![Op::new("mul", 2, 0.0, 1)];
        let mut dfg = build(&[0, 0, 0, 0], &[]);

        let latency = schedule(&mut dfg, &ops, &SchedConfig::new(10.0)).unwrap();
        assert_eq!(latency, 8);

        for cycle in 1..=latency {
            let in_flight = dfg
                .stmts
                .iter()
                .filter(|s| cycle >= s.start_cycle && cycle < s.start_cycle + ops[s.op].latency)
                .count();
            assert!(in_flight <= 1, "cycle {}: {} in flight", cycle, in_flight);
        }
    }

    #[test]
    fn test_saturation_stalls_other_kinds_for_the_cycle() {
        // The saturated high-priority mul stops the drain, so the lone add
        // waits for the next cycle even though its unit is free.
        let ops = vec![Op::new("mul", 2, 0.0, 1), Op::new("add", 1, 0.0, 1)];
        let mut dfg = build(&[0, 0, 1], &[]);

        let latency = schedule(&mut dfg, &ops, &SchedConfig::new(10.0)).unwrap();

        let mul_starts: Vec<i32> = dfg
            .stmts
            .iter()
            .filter(|s| s.op == 0)
            .map(|s| s.start_cycle)
            .collect();
        assert_eq!(mul_starts, vec![1, 3]);
        assert_eq!(latency, 4);
    }

    #[test]
    fn test_combinational_pair_shares_cycle_within_budget() {
        let ops = vec![Op::new("add", 1, 4.0, -1)];
        let mut dfg = build(&[0, 0], &[(0, 1)]);

        let latency = schedule(&mut dfg, &ops, &SchedConfig::new(10.0)).unwrap();

        assert_eq!(starts(&dfg), vec![1, 1]);
        assert_eq!(latency, 1);
    }

    #[test]
    fn test_combinational_fanout_accumulates_along_paths_not_width() {
        // One producer feeding two consumers: each path carries 8.0, which
        // fits, even though the three cells together exceed the period.
        let ops = vec![Op::new("add", 1, 4.0, -1)];
        let mut dfg = build(&[0, 0, 0], &[(0, 1), (0, 2)]);

        let latency = schedule(&mut dfg, &ops, &SchedConfig::new(10.0)).unwrap();

        assert_eq!(starts(&dfg), vec![1, 1, 1]);
        assert_eq!(latency, 1);
    }

    #[test]
    fn test_zero_delay_combinational_does_not_chain() {
        // With no combinational delay the kind registers its output; the
        // consumer waits for the next cycle.
        let ops = vec![Op::new("add", 1, 0.0, -1)];
        let mut dfg = build(&[0, 0], &[(0, 1)]);

        let latency = schedule(&mut dfg, &ops, &SchedConfig::new(10.0)).unwrap();

        assert_eq!(starts(&dfg), vec![1, 2]);
        assert_eq!(latency, 2);
    }

    #[test]
    fn test_chain_splits_where_budget_runs_out() {
        // Five 3.0-delay cells against a 10.0 period: three fit in a cycle.
        let ops = vec![Op::new("add", 1, 3.0, -1)];
        let mut dfg = build(
            &[0, 0, 0, 0, 0],
            &[(0, 1), (1, 2), (2, 3), (3, 4)],
        );

        let latency = schedule(&mut dfg, &ops, &SchedConfig::new(10.0)).unwrap();

        assert_eq!(starts(&dfg), vec![1, 1, 1, 2, 2]);
        assert_eq!(latency, 2);
    }

    #[test]
    fn test_priority_prefers_tight_chain_over_loose_leaf() {
        // One adder unit: the three-deep chain has no mobility and wins each
        // cycle; the independent leaf slips to the end.
        let ops = vec![Op::new("add", 1, 0.0, 1)];
        let mut dfg = build(&[0, 0, 0, 0], &[(0, 1), (1, 2)]);

        let latency = schedule(&mut dfg, &ops, &SchedConfig::new(10.0)).unwrap();

        assert_eq!(starts(&dfg), vec![1, 2, 3, 4]);
        assert_eq!(latency, 4);
    }
}
