//! Core data types for the scheduling problem.

/// One kind of operation in the catalog.
///
/// A negative `limit` marks a purely combinational kind: any number of
/// instances may execute in one cycle, bounded instead by chained `delay`
/// against the clock period. A non-negative `limit` caps the number of
/// in-flight instances per cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Op {
    /// Unique kind name, used for resource accounting.
    pub name: String,
    /// Cycles one instance occupies; 0 and 1 both mean single-cycle.
    pub latency: i32,
    /// Combinational delay contributed within a cycle, in time units.
    pub delay: f64,
    /// Maximum simultaneous in-flight instances per cycle; negative means unlimited.
    pub limit: i32,
}

impl Op {
    pub fn new(name: &str, latency: i32, delay: f64, limit: i32) -> Self {
        Self {
            name: name.to_string(),
            latency,
            delay,
            limit,
        }
    }

    /// Whether instances are bounded by chained delay rather than a count.
    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.limit < 0
    }

    /// Cycles beyond the start cycle that an instance stays in flight.
    #[inline]
    pub fn extra_cycles(&self) -> i32 {
        (self.latency - 1).max(0)
    }

    /// Cycles a consumer waits after a registered producer starts.
    #[inline]
    pub fn occupancy(&self) -> i32 {
        self.latency.max(1)
    }
}

/// One operation instance in the data-flow graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    /// Position in the graph's ordered sequence; rewritten by normalization.
    pub idx: usize,
    /// Index of this statement's kind in the op catalog.
    pub op: usize,
    /// Assigned start cycle; 0 means unscheduled.
    pub start_cycle: i32,
}

impl Stmt {
    pub fn new(idx: usize, op: usize) -> Self {
        Self {
            idx,
            op,
            start_cycle: 0,
        }
    }
}
