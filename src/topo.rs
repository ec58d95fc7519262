//! Topological normalization of the statement sequence.
//!
//! Reorders statements so that index order is a topological order of the
//! dependency DAG, rewriting `deps`, `uses`, the graph's edges, and each
//! statement's stored `idx` to match the new positions.

use std::collections::VecDeque;

use crate::graph::Dfg;
use crate::models::Stmt;

/// Error types for topological normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopoError {
    /// The dependency relation contains a cycle.
    Cycle,
}

impl std::fmt::Display for TopoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopoError::Cycle => {
                write!(f, "dependency cycle prevents a topological order")
            }
        }
    }
}

impl std::error::Error for TopoError {}

/// Check whether every dependency already precedes its consumer.
pub fn is_topological(dfg: &Dfg, deps: &[Vec<usize>]) -> bool {
    dfg.stmts
        .iter()
        .all(|stmt| deps[stmt.idx].iter().all(|&dep| dep < stmt.idx))
}

/// Reorder statements into topological order using Kahn's algorithm with
/// FIFO tie-breaking.
///
/// No-op when the current order is already topological. On success the
/// statement sequence, `deps`, `uses`, the stored edges, and every
/// statement's `idx` all reflect the new positions.
pub fn normalize(
    dfg: &mut Dfg,
    deps: &mut Vec<Vec<usize>>,
    uses: &mut Vec<Vec<usize>>,
) -> Result<(), TopoError> {
    if is_topological(dfg, deps) {
        return Ok(());
    }

    let count = dfg.stmts.len();

    let mut incoming: Vec<usize> = deps.iter().map(|d| d.len()).collect();
    let mut queue: VecDeque<usize> = (0..count).filter(|&i| incoming[i] == 0).collect();

    let mut order: Vec<usize> = Vec::with_capacity(count);
    while let Some(current) = queue.pop_front() {
        order.push(current);
        for &successor in &uses[current] {
            incoming[successor] -= 1;
            if incoming[successor] == 0 {
                queue.push_back(successor);
            }
        }
    }

    if order.len() < count {
        return Err(TopoError::Cycle);
    }

    // position[old] = new
    let mut position = vec![0usize; count];
    for (new_idx, &old_idx) in order.iter().enumerate() {
        position[old_idx] = new_idx;
    }

    let mut reordered: Vec<Stmt> = order.iter().map(|&old| dfg.stmts[old].clone()).collect();
    for (new_idx, stmt) in reordered.iter_mut().enumerate() {
        stmt.idx = new_idx;
    }
    dfg.stmts = reordered;

    *deps = order
        .iter()
        .map(|&old| deps[old].iter().map(|&d| position[d]).collect())
        .collect();
    *uses = order
        .iter()
        .map(|&old| uses[old].iter().map(|&u| position[u]).collect())
        .collect();
    dfg.remap_edges(&position);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_out_of_order() -> (Dfg, Vec<Vec<usize>>, Vec<Vec<usize>>) {
        // Statement 0 reads statement 2's value; 2 reads 1's.
        let mut dfg = Dfg::new();
        let a = dfg.add_stmt(0);
        let b = dfg.add_stmt(0);
        let c = dfg.add_stmt(0);
        dfg.add_edge(b, c);
        dfg.add_edge(c, a);
        let (deps, uses) = dfg.deps_and_uses();
        (dfg, deps, uses)
    }

    #[test]
    fn test_already_topological_is_untouched() {
        let mut dfg = Dfg::new();
        let a = dfg.add_stmt(0);
        let b = dfg.add_stmt(1);
        dfg.add_edge(a, b);
        let (mut deps, mut uses) = dfg.deps_and_uses();
        let deps_before = deps.clone();
        let uses_before = uses.clone();

        normalize(&mut dfg, &mut deps, &mut uses).unwrap();

        assert_eq!(deps, deps_before);
        assert_eq!(uses, uses_before);
        assert_eq!(dfg.stmts[0].op, 0);
        assert_eq!(dfg.stmts[1].op, 1);
    }

    #[test]
    fn test_reorders_reversed_chain() {
        let (mut dfg, mut deps, mut uses) = chain_out_of_order();
        assert!(!is_topological(&dfg, &deps));

        normalize(&mut dfg, &mut deps, &mut uses).unwrap();

        assert!(is_topological(&dfg, &deps));
        for (i, stmt) in dfg.stmts.iter().enumerate() {
            assert_eq!(stmt.idx, i);
        }
        // Every dependency now precedes its consumer.
        for (i, d) in deps.iter().enumerate() {
            for &j in d {
                assert!(j < i);
            }
        }
        // deps and uses stay transposes of each other.
        for (i, d) in deps.iter().enumerate() {
            for &j in d {
                assert!(uses[j].contains(&i));
            }
        }
    }

    #[test]
    fn test_rewritten_edges_reextract_consistently() {
        let (mut dfg, mut deps, mut uses) = chain_out_of_order();
        normalize(&mut dfg, &mut deps, &mut uses).unwrap();

        let (deps_again, uses_again) = dfg.deps_and_uses();
        assert_eq!(deps, deps_again);
        assert_eq!(uses, uses_again);
    }

    #[test]
    fn test_normalization_idempotent() {
        let (mut dfg, mut deps, mut uses) = chain_out_of_order();
        normalize(&mut dfg, &mut deps, &mut uses).unwrap();

        let stmts_before: Vec<usize> = dfg.stmts.iter().map(|s| s.idx).collect();
        let deps_before = deps.clone();
        let uses_before = uses.clone();

        normalize(&mut dfg, &mut deps, &mut uses).unwrap();

        let stmts_after: Vec<usize> = dfg.stmts.iter().map(|s| s.idx).collect();
        assert_eq!(stmts_before, stmts_after);
        assert_eq!(deps_before, deps);
        assert_eq!(uses_before, uses);
    }

    #[test]
    fn test_fifo_tie_break_is_deterministic() {
        // Two independent roots feeding one sink; roots keep their relative
        // order because the zero-degree queue is FIFO.
        let mut dfg = Dfg::new();
        let sink = dfg.add_stmt(0);
        let r1 = dfg.add_stmt(0);
        let r2 = dfg.add_stmt(0);
        dfg.add_edge(r1, sink);
        dfg.add_edge(r2, sink);
        let (mut deps, mut uses) = dfg.deps_and_uses();

        normalize(&mut dfg, &mut deps, &mut uses).unwrap();

        assert_eq!(dfg.stmts.len(), 3);
        assert_eq!(deps[2], vec![0, 1]);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let mut dfg = Dfg::new();
        let a = dfg.add_stmt(0);
        let b = dfg.add_stmt(0);
        dfg.add_edge(a, b);
        dfg.add_edge(b, a);
        let (mut deps, mut uses) = dfg.deps_and_uses();

        let result = normalize(&mut dfg, &mut deps, &mut uses);
        assert_eq!(result, Err(TopoError::Cycle));
    }
}
